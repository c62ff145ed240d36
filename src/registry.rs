use std::sync::Arc;

use dashmap::DashMap;

use crate::engine::{Engine, EngineError};
use crate::limits::{MAX_APPS, MAX_APP_NAME_LEN};
use crate::persist::Gateway;
use crate::schema::Schema;

/// Holds one engine per named application (coworking, real-estate, …),
/// opened lazily on first request and cached.
#[derive(Default)]
pub struct AppRegistry {
    engines: DashMap<String, Arc<Engine>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the engine for `name`, opening it against the given schema
    /// and gateway if this is the first request. Repeat lookups return
    /// the same engine.
    pub async fn get_or_open(
        &self,
        name: &str,
        schema: Arc<Schema>,
        gateway: Arc<dyn Gateway>,
    ) -> Result<Arc<Engine>, EngineError> {
        if let Some(engine) = self.engines.get(name) {
            return Ok(engine.value().clone());
        }
        if name.is_empty() || name.len() > MAX_APP_NAME_LEN {
            return Err(EngineError::LimitExceeded("bad app name length"));
        }
        if self.engines.len() >= MAX_APPS {
            return Err(EngineError::LimitExceeded("too many apps"));
        }

        let engine = Arc::new(Engine::open(schema, gateway).await?);
        self.engines.insert(name.to_string(), engine.clone());
        Ok(engine)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Engine>> {
        self.engines.get(name).map(|e| e.value().clone())
    }

    /// Drop a cached engine; its gateway retains whatever was saved.
    pub fn close(&self, name: &str) -> bool {
        self.engines.remove(name).is_some()
    }
}
