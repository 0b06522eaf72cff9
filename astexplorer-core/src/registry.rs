use crate::capability::ParserCapability;
use crate::error::ParseError;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Named entry points installed by the module loader.
///
/// Written once per load, read on every parse. Lookups of a name that was
/// never registered fail with [`ParseError::EntryPointNotRegistered`].
#[derive(Debug, Default)]
pub struct EntryPointRegistry {
    slots: RwLock<HashMap<String, Arc<dyn ParserCapability>>>,
}

impl EntryPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `capability` under `name`, returning whatever it replaced.
    pub fn register(
        &self,
        name: &str,
        capability: Arc<dyn ParserCapability>,
    ) -> Option<Arc<dyn ParserCapability>> {
        let mut slots = match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = slots.insert(name.to_string(), capability);
        if previous.is_some() {
            tracing::warn!("Entry point `{}` re-registered", name);
        } else {
            tracing::debug!("Entry point `{}` registered", name);
        }
        previous
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn ParserCapability>, ParseError> {
        let slots = match self.slots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::EntryPointNotRegistered {
                name: name.to_string(),
            })
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }
}
