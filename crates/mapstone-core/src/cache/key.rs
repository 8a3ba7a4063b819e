use crate::value::Value;
use std::hash::{Hash, Hasher};
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

///
/// CacheKey
///
/// Executor cache key accumulated from the statement id, paging offsets,
/// final SQL text, and bound parameter values. Equality compares every
/// accumulated part; the digest is a stable xxh3 over the part hashes.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheKey {
    parts: Vec<u64>,
}

impl CacheKey {
    #[must_use]
    pub const fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn update_str(&mut self, text: &str) {
        self.parts.push(xxh3_64(text.as_bytes()));
    }

    pub fn update_u64(&mut self, value: u64) {
        self.parts.push(xxh3_64(&value.to_le_bytes()));
    }

    pub fn update_value(&mut self, value: &Value) {
        self.parts.push(value.stable_hash());
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for part in &self.parts {
            hasher.update(&part.to_le_bytes());
        }
        hasher.digest()
    }
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_update_sequences_compare_equal() {
        let mut a = CacheKey::new();
        let mut b = CacheKey::new();
        for key in [&mut a, &mut b] {
            key.update_str("app.users.findById");
            key.update_value(&Value::I64(42));
        }

        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn order_of_updates_matters() {
        let mut a = CacheKey::new();
        a.update_u64(1);
        a.update_u64(2);
        let mut b = CacheKey::new();
        b.update_u64(2);
        b.update_u64(1);

        assert_ne!(a, b);
    }
}
