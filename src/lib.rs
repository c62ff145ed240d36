//! In-memory relational data engine for small admin applications:
//! typed collections with referential integrity, declarative cascade
//! policies, one generic query pipeline, and pure aggregation views
//! behind a load/save persistence boundary.

pub mod domains;
pub mod engine;
pub mod export;
pub mod limits;
pub mod model;
pub mod persist;
pub mod registry;
pub mod schema;

pub use engine::{
    Committed, Engine, EngineError, PersistenceWarning, QuerySpec, SortDir, SortSpec, Store,
    aggregate,
};
pub use model::{Collection, FieldAccess, Record, Value};
pub use persist::{Gateway, MemoryGateway, Snapshot};
pub use registry::AppRegistry;
pub use schema::{CollectionDef, DerivedDef, FieldDef, FieldKind, OnDelete, ReferenceDef, Schema};
