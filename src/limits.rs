/// Hard cap on records held by a single collection.
pub const MAX_RECORDS_PER_COLLECTION: usize = 100_000;

/// Hard cap on the byte length of any string field value.
pub const MAX_STRING_LEN: usize = 4_096;

/// Cascade recursion bound; a schema declaring a reference cycle hits
/// this instead of recursing forever.
pub const MAX_CASCADE_DEPTH: usize = 32;

/// Registry app-name length cap.
pub const MAX_APP_NAME_LEN: usize = 64;

/// Registry app-count cap.
pub const MAX_APPS: usize = 64;
