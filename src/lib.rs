// Library crate - exports detection core, providers and the HTTP layer

pub mod api;
pub mod config;
pub mod errors;
pub mod provider;
pub mod runner;
pub mod trading_core;
pub mod types;

// Re-export commonly used types
pub use errors::{DetectError, DetectResult};
pub use runner::{PatternRunner, RunnerConfig};
pub use trading_core::{Direction, FlatScanner, PatternResult};
pub use types::*;
