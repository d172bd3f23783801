use serde::{Deserialize, Serialize};

pub(crate) mod idle;

/// A single key value pair as exchanged on the bulk endpoints.
///
/// Serializes to `{"Key": .., "Value": ..}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    /// Key of the pair.
    pub key: String,
    /// Value of the pair.
    pub value: String,
}

impl Record {
    /// Construct a new record.
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Record {
        Record {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Health report returned by `GET /status`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Always `ok` while the service answers.
    pub status: String,
    /// Human readable description.
    pub message: String,
    /// Time of the report, RFC 3339.
    pub ts: String,
    /// Version of the server.
    pub version: String,
}

impl Status {
    /// Status report stamped with the current time.
    pub fn now() -> Status {
        Status {
            status: "ok".to_owned(),
            message: "kvd is serving requests".to_owned(),
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}
