#[derive(Debug)]
pub enum EngineError {
    UnknownCollection(String),
    NotFound {
        collection: String,
        id: String,
    },
    DanglingReference {
        collection: String,
        field: String,
        id: String,
    },
    Validation {
        field: String,
        reason: String,
    },
    LimitExceeded(&'static str),
    Storage(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownCollection(name) => write!(f, "unknown collection: {name}"),
            EngineError::NotFound { collection, id } => {
                write!(f, "not found in {collection}: {id}")
            }
            EngineError::DanglingReference {
                collection,
                field,
                id,
            } => {
                write!(f, "dangling reference {collection}.{field} -> {id}")
            }
            EngineError::Validation { field, reason } => {
                write!(f, "invalid value for {field}: {reason}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Write-through to the persistence gateway failed after the in-memory
/// mutation already committed. Reported, never rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub collection: String,
    pub detail: String,
}

impl std::fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to persist {}: {}", self.collection, self.detail)
    }
}
