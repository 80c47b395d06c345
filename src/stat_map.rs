use std::collections::HashMap;

/// Named-counter accumulator backing per-player derived stats.
///
/// Reads never fail: a missing key reads as the supplied default (zero for
/// `get`). Insertion order is irrelevant; report generation sorts on its own
/// terms.
#[derive(Debug, Clone, Default)]
pub struct StatMap {
    entries: HashMap<String, f64>,
}

impl StatMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> f64 {
        self.get_or(key, 0.0)
    }

    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.entries.get(key).copied().unwrap_or(default)
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.entries.insert(key.to_owned(), value);
    }

    pub fn increment(&mut self, key: &str) {
        self.increment_by(key, 1.0);
    }

    pub fn increment_by(&mut self, key: &str, amount: f64) {
        *self.entries.entry(key.to_owned()).or_insert(0.0) += amount;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::StatMap;

    #[test]
    fn missing_keys_read_as_default() {
        let map = StatMap::new();
        assert_eq!(map.get("Kill"), 0.0);
        assert_eq!(map.get_or("Death", 1.0), 1.0);
    }

    #[test]
    fn increment_accumulates() {
        let mut map = StatMap::new();
        map.increment("Revive");
        map.increment("Revive");
        map.increment_by("Revive", 3.0);
        assert_eq!(map.get("Revive"), 5.0);
    }

    #[test]
    fn set_overwrites() {
        let mut map = StatMap::new();
        map.increment("Kill");
        map.set("Kill", 10.0);
        assert_eq!(map.get("Kill"), 10.0);
    }
}
