/// All backend entity identifiers are opaque strings (UUIDs on the server).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
