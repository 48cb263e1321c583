//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use math_drill_core::{ports::StorageService, QuestionGenerator, WeaknessAnalyzer};
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StorageService>,
    pub config: Arc<Config>,
    pub generator: QuestionGenerator,
    pub analyzer: WeaknessAnalyzer,
    /// Held while the streak or a leaderboard is read, changed and written back.
    pub profile_writes: Arc<Mutex<()>>,
}

impl AppState {
    /// Wires the core components to a storage adapter, using the policies from `config`.
    pub fn new(store: Arc<dyn StorageService>, config: Arc<Config>) -> Self {
        Self {
            store,
            generator: QuestionGenerator::default(),
            analyzer: WeaknessAnalyzer::new(config.analyzer.clone()),
            config,
            profile_writes: Arc::new(Mutex::new(())),
        }
    }
}
