//! Lowercase string sets used for materialised relationship views.

use std::collections::BTreeSet;
use std::collections::btree_set;

/// Set of lowercase keys (emails or slugs).
///
/// ## Invariants
/// - Every stored key is lowercase and non-empty; empty input is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(BTreeSet<String>);

impl KeySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, returning `true` when it was not already present.
    pub fn insert(&mut self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref().trim().to_lowercase();
        if key.is_empty() {
            return false;
        }
        self.0.insert(key)
    }

    /// Remove a key, returning `true` when it was present.
    pub fn remove(&mut self, key: impl AsRef<str>) -> bool {
        self.0.remove(&key.as_ref().trim().to_lowercase())
    }

    /// Check membership, ignoring case.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.0.contains(&key.as_ref().trim().to_lowercase())
    }

    /// Replace the whole set with `keys`.
    pub fn replace<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.0.clear();
        self.extend(keys);
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate keys in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    /// Collect the keys into an owned vector, ascending.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<K: AsRef<str>> Extend<K> for KeySet {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: AsRef<str>> FromIterator<K> for KeySet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn keys_are_lowercased_and_deduplicated() {
        let set: KeySet = ["A@X.com", "a@x.com", " b@x.com "].into_iter().collect();
        assert_eq!(set.to_vec(), vec!["a@x.com".to_owned(), "b@x.com".to_owned()]);
    }

    #[rstest]
    fn empty_keys_are_ignored() {
        let mut set = KeySet::new();
        assert!(!set.insert(""));
        assert!(!set.insert("   "));
        assert!(set.is_empty());
    }

    #[rstest]
    fn replace_discards_previous_members() {
        let mut set: KeySet = ["a", "b"].into_iter().collect();
        set.replace(["b", "c"]);
        assert_eq!(set.to_vec(), vec!["b".to_owned(), "c".to_owned()]);
    }

    #[rstest]
    fn membership_ignores_case() {
        let mut set = KeySet::new();
        set.insert("Some-Slug");
        assert!(set.contains("some-slug"));
        assert!(set.remove("SOME-SLUG"));
        assert!(!set.contains("some-slug"));
        assert_eq!(set.len(), 0);
    }
}
