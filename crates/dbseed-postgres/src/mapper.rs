use std::collections::BTreeMap;

use dbseed_core::{Column, ForeignKeyRef};

use crate::queries::{RawColumn, RawForeignKey};

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<Column> {
    raw.into_iter()
        .map(|column| {
            // Serial columns predate identity columns but are equally
            // database-assigned.
            let serial_default = column
                .column_default
                .as_deref()
                .is_some_and(|default| default.starts_with("nextval("));
            Column {
                name: column.name,
                data_type: column.data_type,
                is_nullable: column.is_nullable == "YES",
                is_identity: column.is_identity == "YES" || serial_default,
            }
        })
        .collect()
}

pub fn map_foreign_keys(raw: Vec<RawForeignKey>) -> BTreeMap<String, ForeignKeyRef> {
    raw.into_iter()
        .map(|fk| {
            (
                fk.column,
                ForeignKeyRef {
                    referenced_table: fk.referenced_table,
                    referenced_column: fk.referenced_column,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_defaults_count_as_identity() {
        let columns = map_columns(vec![
            RawColumn {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                is_nullable: "NO".to_string(),
                is_identity: "NO".to_string(),
                column_default: Some("nextval('users_id_seq'::regclass)".to_string()),
            },
            RawColumn {
                name: "name".to_string(),
                data_type: "text".to_string(),
                is_nullable: "YES".to_string(),
                is_identity: "NO".to_string(),
                column_default: None,
            },
        ]);

        assert!(columns[0].is_identity);
        assert!(!columns[0].is_nullable);
        assert!(!columns[1].is_identity);
        assert!(columns[1].is_nullable);
    }

    #[test]
    fn foreign_keys_key_on_local_column() {
        let fks = map_foreign_keys(vec![RawForeignKey {
            column: "customer_id".to_string(),
            referenced_table: "customers".to_string(),
            referenced_column: "id".to_string(),
        }]);

        assert_eq!(fks["customer_id"].referenced_table, "customers");
        assert_eq!(fks["customer_id"].referenced_column, "id");
    }
}
