//! Identifier generation for users and documents

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Millisecond timestamp as a string, used for local user ids
#[must_use]
pub fn timestamp_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Random lowercase base36 suffix
#[must_use]
pub fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

/// Identifier pair stamped on a new document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStamp {
    pub id: String,
    pub document_number: String,
}

/// Issues `DOC-<millis>-<suffix>` ids and `INS-<millis>` numbers
///
/// The millisecond component is strictly increasing within one generator,
/// so two documents issued in the same millisecond still get distinct numbers.
#[derive(Debug, Default)]
pub struct DocumentIdGenerator {
    last_millis: i64,
}

impl DocumentIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> DocumentStamp {
        let millis = now.timestamp_millis().max(self.last_millis + 1);
        self.last_millis = millis;

        DocumentStamp {
            id: format!("DOC-{millis}-{}", random_suffix()),
            document_number: format!("INS-{millis}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_same_instant_yields_distinct_stamps() {
        let mut generator = DocumentIdGenerator::new();
        let now = Utc::now();

        let first = generator.next(now);
        let second = generator.next(now);

        assert_ne!(first.id, second.id);
        assert_ne!(first.document_number, second.document_number);
        assert!(first.id.starts_with("DOC-"));
        assert!(second.document_number.starts_with("INS-"));
    }

    #[test]
    fn test_timestamp_id_is_numeric() {
        assert!(timestamp_id().chars().all(|c| c.is_ascii_digit()));
    }
}
