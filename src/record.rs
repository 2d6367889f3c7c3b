use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Object metadata as reported by a backend, before any filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawObjectMetadata {
    pub name: String,
    pub content_type: String,
    pub owner: String,
    pub size: u64,
    pub content_encoding: String,
    pub created: DateTime<Utc>,
}

/// One listed object, handed to the consumer by value.
///
/// `created_at` has second precision: backends report sub-second times but
/// listing filters and consumers only ever see whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    name: String,
    content_type: String,
    owner: String,
    size: u64,
    content_encoding: String,
    created_at: DateTime<Utc>,
}

impl ObjectRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_encoding(&self) -> &str {
        &self.content_encoding
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<RawObjectMetadata> for ObjectRecord {
    fn from(raw: RawObjectMetadata) -> Self {
        ObjectRecord {
            name: raw.name,
            content_type: raw.content_type,
            owner: raw.owner,
            size: raw.size,
            content_encoding: raw.content_encoding,
            created_at: raw.created.trunc_subsecs(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn conversion_truncates_to_seconds() {
        let created = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        let raw = RawObjectMetadata {
            name: "2024/report.json".into(),
            content_type: "application/json".into(),
            owner: "user-1".into(),
            size: 42,
            content_encoding: String::new(),
            created,
        };

        let record = ObjectRecord::from(raw);
        assert_eq!(record.name(), "2024/report.json");
        assert_eq!(record.content_type(), "application/json");
        assert_eq!(record.owner(), "user-1");
        assert_eq!(record.size(), 42);
        assert_eq!(record.content_encoding(), "");
        assert_eq!(record.created_at().timestamp(), 1_700_000_000);
        assert_eq!(record.created_at().timestamp_subsec_nanos(), 0);
    }
}
