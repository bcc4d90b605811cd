//! Canonical cache keys for id sets.

use std::collections::BTreeSet;

/// Sorts, deduplicates and comma-joins ids so that every permutation of the
/// same set addresses the same cache entry.
pub fn canonical_key<I, S>(ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = ids
        .into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    unique.into_iter().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_sorted() {
        assert_eq!(canonical_key(["3", "1", "2"]), "1,2,3");
    }

    #[test]
    fn test_key_deduplicates() {
        assert_eq!(canonical_key(vec!["b", "a", "b"]), "a,b");
    }

    #[test]
    fn test_key_empty() {
        assert_eq!(canonical_key(Vec::<String>::new()), "");
    }
}
