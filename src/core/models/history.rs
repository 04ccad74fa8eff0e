use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// One line of the credits history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Local time with second precision, `YYYY-MM-DD-HH-MM-SS`
    pub timestamp: String,
    pub credits_left: u64,
}

impl HistoryRecord {
    pub fn new(at: NaiveDateTime, credits_left: u64) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            credits_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn timestamp_has_second_precision() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 42)
            .unwrap();
        let record = HistoryRecord::new(at, 1234);
        assert_eq!(record.timestamp, "2025-03-07-09-05-42");
    }

    #[test]
    fn serializes_expected_keys() {
        let record = HistoryRecord {
            timestamp: "2025-03-07-09-05-42".to_string(),
            credits_left: 77,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2025-03-07-09-05-42","credits_left":77}"#
        );
    }
}
