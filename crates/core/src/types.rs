/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Placeholder id carried by signals that do not point at a single row
/// (friend and friend-request refreshes).
pub const NO_ENTITY_ID: DbId = 0;
