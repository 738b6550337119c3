//! Horizontal level tracking primitives
//!
//! A flat top is a run of equal highs, a flat bottom a run of equal lows.
//! `Direction` folds the top/bottom asymmetry into a handful of comparisons so
//! the scanner is written once.

use serde::{Deserialize, Serialize};

use crate::types::Candle;

/// Absolute tolerance for comparing two prices
pub const PRICE_EPSILON: f64 = 1e-9;

/// Which side of the range the scan tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Resistance from repeated highs, upward breakout
    Top,
    /// Support from repeated lows, downward breakout
    Bottom,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Top => write!(f, "Flat-Top"),
            Direction::Bottom => write!(f, "Flat-Bottom"),
        }
    }
}

impl Direction {
    /// Price that forms the level (high for top, low for bottom)
    pub fn extreme(&self, candle: &Candle) -> f64 {
        match self {
            Direction::Top => candle.high,
            Direction::Bottom => candle.low,
        }
    }

    /// Price on the other side of the bar, used for the stop
    pub fn opposite(&self, candle: &Candle) -> f64 {
        match self {
            Direction::Top => candle.low,
            Direction::Bottom => candle.high,
        }
    }

    /// True when `price` lies strictly past `reference` in the breakout direction
    pub fn is_beyond(&self, price: f64, reference: f64) -> bool {
        match self {
            Direction::Top => price > reference + PRICE_EPSILON,
            Direction::Bottom => price < reference - PRICE_EPSILON,
        }
    }

    /// The more distant of two stop candidates (lowest low / highest high)
    pub fn furthest_opposite(&self, a: f64, b: f64) -> f64 {
        match self {
            Direction::Top => a.min(b),
            Direction::Bottom => a.max(b),
        }
    }
}

pub fn same_price(a: f64, b: f64) -> bool {
    (a - b).abs() < PRICE_EPSILON
}

/// A price revisited by consecutive extremes during one scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub price: f64,
    pub touch_count: u32,
    pub first_touch_index: usize,
    pub last_touch_index: usize,
}

impl Level {
    pub fn new(price: f64, index: usize) -> Self {
        Self {
            price,
            touch_count: 1,
            first_touch_index: index,
            last_touch_index: index,
        }
    }

    pub fn touch(&mut self, index: usize) {
        self.touch_count += 1;
        self.last_touch_index = index;
    }

    /// Two touches make a level
    pub fn is_confirmed(&self) -> bool {
        self.touch_count >= 2
    }
}
