//! Pattern scan result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one flat-top or flat-bottom scan.
///
/// Serialized in the flat wire shape where `entry_price`, `stop_price` and
/// `trigger_time` are all null unless `triggered` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "PatternResultBody", try_from = "PatternResultBody")]
pub enum PatternResult {
    NotTriggered,
    Triggered {
        entry_price: f64,
        stop_price: f64,
        trigger_time: DateTime<Utc>,
    },
}

impl PatternResult {
    pub fn is_triggered(&self) -> bool {
        matches!(self, PatternResult::Triggered { .. })
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            PatternResult::Triggered { entry_price, .. } => Some(*entry_price),
            PatternResult::NotTriggered => None,
        }
    }

    pub fn stop_price(&self) -> Option<f64> {
        match self {
            PatternResult::Triggered { stop_price, .. } => Some(*stop_price),
            PatternResult::NotTriggered => None,
        }
    }

    pub fn trigger_time(&self) -> Option<DateTime<Utc>> {
        match self {
            PatternResult::Triggered { trigger_time, .. } => Some(*trigger_time),
            PatternResult::NotTriggered => None,
        }
    }
}

/// Wire shape of [`PatternResult`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternResultBody {
    pub triggered: bool,
    pub entry_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub trigger_time: Option<DateTime<Utc>>,
}

impl From<PatternResult> for PatternResultBody {
    fn from(result: PatternResult) -> Self {
        Self {
            triggered: result.is_triggered(),
            entry_price: result.entry_price(),
            stop_price: result.stop_price(),
            trigger_time: result.trigger_time(),
        }
    }
}

impl TryFrom<PatternResultBody> for PatternResult {
    type Error = String;

    fn try_from(body: PatternResultBody) -> Result<Self, Self::Error> {
        match (body.triggered, body.entry_price, body.stop_price, body.trigger_time) {
            (false, None, None, None) => Ok(PatternResult::NotTriggered),
            (true, Some(entry_price), Some(stop_price), Some(trigger_time)) => {
                Ok(PatternResult::Triggered {
                    entry_price,
                    stop_price,
                    trigger_time,
                })
            }
            (triggered, ..) => Err(format!(
                "inconsistent pattern result: triggered={} with mismatched price/time fields",
                triggered
            )),
        }
    }
}
