use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column metadata as far as seeding needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared SQL type (e.g. `integer`, `character varying`, `timestamp`).
    pub data_type: String,
    pub is_nullable: bool,
    /// Database-assigned columns (identity/serial) are never drafted.
    pub is_identity: bool,
}

/// Single-column foreign-key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Descriptor for one table in the seeding set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Primary-key columns in key order; empty when the table has none.
    pub primary_key: Vec<String>,
    /// Local column name -> referenced table/column.
    pub foreign_keys: BTreeMap<String, ForeignKeyRef>,
}

impl Table {
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Position of a column within the primary key, if it is part of it.
    pub fn primary_key_position(&self, column: &str) -> Option<usize> {
        self.primary_key.iter().position(|pk| pk == column)
    }
}

/// Quote an identifier for inclusion in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn primary_key_position_follows_key_order() {
        let table = Table {
            name: "order_lines".to_string(),
            columns: Vec::new(),
            primary_key: vec!["order_id".to_string(), "line_no".to_string()],
            foreign_keys: BTreeMap::new(),
        };
        assert_eq!(table.primary_key_position("line_no"), Some(1));
        assert_eq!(table.primary_key_position("sku"), None);
    }
}
