//! 🗂️ Session Registry
//!
//! One engine per session id for multi-session deployments. Sessions are
//! fully isolated: each engine gets its own copy of the default settings,
//! so a threshold change in one session never leaks into another.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::EngineSettings;
use crate::engine::RoundEngine;

pub struct SessionRegistry {
    /// Per-session engines, keyed by caller-chosen id.
    sessions: HashMap<String, RoundEngine>,
    /// Settings template copied into every new engine.
    defaults: EngineSettings,
}

impl SessionRegistry {
    pub fn new(defaults: EngineSettings) -> Self {
        Self {
            sessions: HashMap::new(),
            defaults,
        }
    }

    pub fn new_default() -> Self {
        Self::new(EngineSettings::default())
    }

    /// Get the engine for a session, creating it on first use.
    pub fn session(&mut self, id: &str) -> &mut RoundEngine {
        let defaults = &self.defaults;
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            info!("🆕 Session created: {}", id);
            RoundEngine::with_settings(defaults.clone())
        })
    }

    pub fn get(&self, id: &str) -> Option<&RoundEngine> {
        self.sessions.get(id)
    }

    /// Drop a session entirely. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let existed = self.sessions.remove(id).is_some();
        if existed {
            debug!("🗑️ Session removed: {}", id);
        }
        existed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new_default()
    }
}
