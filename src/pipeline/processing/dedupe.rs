use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::domain::RawRow;

/// Rows left after exact-duplicate removal
#[derive(Debug, Clone)]
pub struct DedupeOutcome {
    pub rows: Vec<RawRow>,
    pub duplicates_removed: usize,
}

/// Content fingerprint of a raw row.
///
/// Every field is length-prefixed so that `["a,b", "c"]` and `["a", "b,c"]`
/// never collide.
pub fn row_fingerprint(fields: &[String]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Drop rows whose every field matches an earlier row. First occurrence wins
/// and relative order is preserved.
pub fn dedupe_rows(rows: Vec<RawRow>) -> DedupeOutcome {
    let mut seen = HashSet::with_capacity(rows.len());
    let total = rows.len();

    let rows: Vec<RawRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row_fingerprint(&row.fields)))
        .collect();

    DedupeOutcome {
        duplicates_removed: total - rows.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, fields: &[&str]) -> RawRow {
        RawRow {
            line,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_exact_duplicates_removed() {
        let rows = vec![
            row(1, &["Engineer", "100000", "USD"]),
            row(2, &["Engineer", "100000", "USD"]),
            row(3, &["Engineer", "100001", "USD"]),
        ];

        let outcome = dedupe_rows(rows);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].line, 1);
        assert_eq!(outcome.rows[1].line, 3);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let rows = vec![
            row(1, &["a", "1"]),
            row(2, &["b", "2"]),
            row(3, &["a", "1"]),
            row(4, &["b", "2"]),
            row(5, &["c", "3"]),
        ];

        let once = dedupe_rows(rows);
        let twice = dedupe_rows(once.rows.clone());
        assert_eq!(once.rows.len(), 3);
        assert_eq!(twice.rows.len(), once.rows.len());
        assert_eq!(twice.duplicates_removed, 0);
    }

    #[test]
    fn test_fingerprint_field_boundaries() {
        let a = row_fingerprint(&["a,b".to_string(), "c".to_string()]);
        let b = row_fingerprint(&["a".to_string(), "b,c".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
