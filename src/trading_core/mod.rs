//! Trading Core - flat-top / flat-bottom breakout detection
//!
//! - Level tracking primitives and direction handling
//! - Scan state machine (SEEKING -> LEVEL_CONFIRMED -> TRIGGERED)
//! - Pattern results in their wire shape

pub mod level;
pub mod pattern;
pub mod state_machine;

// Re-export commonly used types
pub use level::{Direction, Level, PRICE_EPSILON};
pub use pattern::PatternResult;
pub use state_machine::{Breakout, FlatScanner, ScanState, StateTransition};
