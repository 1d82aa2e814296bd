use std::collections::BTreeMap;

use rand::Rng;

use crate::value::ScalarValue;

/// Primary-key value for one inserted row: a single scalar or a composite
/// tuple matching the table's key arity.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Single(ScalarValue),
    Composite(Vec<ScalarValue>),
}

impl KeyValue {
    /// The key part for one named position of a composite key; a single key
    /// ignores the position.
    pub fn part(&self, position: usize) -> Option<&ScalarValue> {
        match self {
            KeyValue::Single(value) => Some(value),
            KeyValue::Composite(parts) => parts.get(position),
        }
    }
}

/// Per-table registry of primary-key values generated so far in the run.
///
/// Entries only grow: keys are appended after the owning table's batch has
/// been persisted, and the whole pool is dropped at run end.
#[derive(Debug, Default)]
pub struct KeyPool {
    keys: BTreeMap<String, Vec<KeyValue>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a table has a (possibly empty) entry.
    pub fn register(&mut self, table: &str) {
        self.keys.entry(table.to_string()).or_default();
    }

    pub fn append(&mut self, table: &str, keys: Vec<KeyValue>) {
        self.keys.entry(table.to_string()).or_default().extend(keys);
    }

    /// Draw one key uniformly at random, or `None` while the table has no
    /// persisted keys.
    pub fn sample(&self, table: &str, rng: &mut impl Rng) -> Option<&KeyValue> {
        let keys = self.keys.get(table)?;
        if keys.is_empty() {
            return None;
        }
        keys.get(rng.random_range(0..keys.len()))
    }

    pub fn len(&self, table: &str) -> usize {
        self.keys.get(table).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sample_on_empty_pool_is_none() {
        let mut pool = KeyPool::new();
        pool.register("orders");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(pool.sample("orders", &mut rng).is_none());
        assert!(pool.sample("unknown", &mut rng).is_none());
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut pool = KeyPool::new();
        pool.append(
            "orders",
            vec![
                KeyValue::Single(ScalarValue::Int(1)),
                KeyValue::Single(ScalarValue::Int(2)),
            ],
        );
        pool.append("orders", vec![KeyValue::Single(ScalarValue::Int(3))]);
        assert_eq!(pool.len("orders"), 3);
        assert_eq!(
            pool.keys["orders"][2],
            KeyValue::Single(ScalarValue::Int(3))
        );
    }

    #[test]
    fn sample_only_returns_appended_keys() {
        let mut pool = KeyPool::new();
        let keys: Vec<KeyValue> = (0..5).map(|i| KeyValue::Single(ScalarValue::Int(i))).collect();
        pool.append("customers", keys.clone());

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let sampled = pool.sample("customers", &mut rng).unwrap();
            assert!(keys.contains(sampled));
        }
    }

    #[test]
    fn composite_part_lookup() {
        let key = KeyValue::Composite(vec![ScalarValue::Int(9), ScalarValue::Int(3)]);
        assert_eq!(key.part(1), Some(&ScalarValue::Int(3)));
        assert_eq!(key.part(5), None);

        let single = KeyValue::Single(ScalarValue::Int(4));
        assert_eq!(single.part(0), Some(&ScalarValue::Int(4)));
    }
}
