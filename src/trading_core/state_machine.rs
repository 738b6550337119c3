//! Flat-Top / Flat-Bottom scan state machine
//!
//! One left-to-right pass over a day's candles:
//! 1. SEEKING - track the running extreme and count how often it is hit
//! 2. LEVEL_CONFIRMED - second touch freezes the level; track the stop candidate
//! 3. TRIGGERED - first close beyond the level; terminal
//!
//! Running out of candles in either of the first two states means no pattern.
//! Once a level is confirmed the scan never goes back to SEEKING.

use chrono::{DateTime, Utc};
use std::ops::ControlFlow;
use tracing::debug;

use super::level::{same_price, Direction, Level};
use super::pattern::PatternResult;
use crate::types::Candle;

/// A confirmed level broken by a candle close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakout {
    pub level: Level,
    pub entry_price: f64,
    pub stop_price: f64,
    pub trigger_index: usize,
    pub trigger_time: DateTime<Utc>,
}

/// Scan state, threaded through the fold over candles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanState {
    /// Looking for a repeated extreme; `None` before the first candle
    Seeking(Option<Level>),
    /// Level frozen; waiting for a close beyond it
    LevelConfirmed {
        level: Level,
        /// Furthest opposite extreme since the last touch, if any candle
        /// has closed inside the level since then
        stop_candidate: Option<f64>,
    },
    /// Terminal
    Triggered(Breakout),
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Seeking(_) => write!(f, "SEEKING"),
            ScanState::LevelConfirmed { .. } => write!(f, "LEVEL_CONFIRMED"),
            ScanState::Triggered(_) => write!(f, "TRIGGERED"),
        }
    }
}

/// State transition events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateTransition {
    LevelConfirmed { price: f64, index: usize },
    Triggered(Breakout),
}

impl Default for ScanState {
    fn default() -> Self {
        ScanState::Seeking(None)
    }
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Triggered(_))
    }

    /// Consume one candle and return the next state
    pub fn advance(
        self,
        direction: Direction,
        index: usize,
        candle: &Candle,
    ) -> (ScanState, Option<StateTransition>) {
        match self {
            ScanState::Seeking(None) => {
                let level = Level::new(direction.extreme(candle), index);
                (ScanState::Seeking(Some(level)), None)
            }
            ScanState::Seeking(Some(level)) => seek(direction, level, index, candle),
            ScanState::LevelConfirmed {
                level,
                stop_candidate,
            } => watch_for_breakout(direction, level, stop_candidate, index, candle),
            ScanState::Triggered(_) => (self, None),
        }
    }

    /// Collapse a finished scan into its result
    pub fn into_result(self) -> PatternResult {
        match self {
            ScanState::Triggered(breakout) => PatternResult::Triggered {
                entry_price: breakout.entry_price,
                stop_price: breakout.stop_price,
                trigger_time: breakout.trigger_time,
            },
            ScanState::Seeking(_) | ScanState::LevelConfirmed { .. } => {
                PatternResult::NotTriggered
            }
        }
    }
}

fn seek(
    direction: Direction,
    mut level: Level,
    index: usize,
    candle: &Candle,
) -> (ScanState, Option<StateTransition>) {
    let extreme = direction.extreme(candle);

    if same_price(extreme, level.price) {
        level.touch(index);
        if level.is_confirmed() {
            return (
                ScanState::LevelConfirmed {
                    level,
                    stop_candidate: None,
                },
                Some(StateTransition::LevelConfirmed {
                    price: level.price,
                    index,
                }),
            );
        }
        return (ScanState::Seeking(Some(level)), None);
    }

    if direction.is_beyond(extreme, level.price) {
        // Old extreme never qualified; drop it
        return (ScanState::Seeking(Some(Level::new(extreme, index))), None);
    }

    (ScanState::Seeking(Some(level)), None)
}

fn watch_for_breakout(
    direction: Direction,
    mut level: Level,
    stop_candidate: Option<f64>,
    index: usize,
    candle: &Candle,
) -> (ScanState, Option<StateTransition>) {
    if direction.is_beyond(candle.close, level.price) {
        let breakout = Breakout {
            level,
            entry_price: level.price,
            stop_price: stop_candidate.unwrap_or_else(|| direction.opposite(candle)),
            trigger_index: index,
            trigger_time: candle.timestamp,
        };
        return (
            ScanState::Triggered(breakout),
            Some(StateTransition::Triggered(breakout)),
        );
    }

    if same_price(direction.extreme(candle), level.price) {
        // Retest of the level; stop is measured from the latest touch
        level.touch(index);
        return (
            ScanState::LevelConfirmed {
                level,
                stop_candidate: None,
            },
            None,
        );
    }

    let opposite = direction.opposite(candle);
    let stop_candidate = Some(match stop_candidate {
        Some(current) => direction.furthest_opposite(current, opposite),
        None => opposite,
    });

    (
        ScanState::LevelConfirmed {
            level,
            stop_candidate,
        },
        None,
    )
}

/// Runs the state machine for one direction over a candle slice
#[derive(Debug, Clone, Copy)]
pub struct FlatScanner {
    direction: Direction,
}

impl FlatScanner {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    pub fn top() -> Self {
        Self::new(Direction::Top)
    }

    pub fn bottom() -> Self {
        Self::new(Direction::Bottom)
    }

    /// Fold the candles through the state machine, stopping at the first breakout
    pub fn run(&self, candles: &[Candle]) -> ScanState {
        let direction = self.direction;
        let flow = candles
            .iter()
            .enumerate()
            .try_fold(ScanState::default(), |state, (index, candle)| {
                let (next, transition) = state.advance(direction, index, candle);
                if let Some(transition) = transition {
                    log_transition(direction, &transition);
                }
                if next.is_terminal() {
                    ControlFlow::Break(next)
                } else {
                    ControlFlow::Continue(next)
                }
            });

        match flow {
            ControlFlow::Break(state) | ControlFlow::Continue(state) => state,
        }
    }

    pub fn scan(&self, candles: &[Candle]) -> PatternResult {
        self.run(candles).into_result()
    }
}

fn log_transition(direction: Direction, transition: &StateTransition) {
    match transition {
        StateTransition::LevelConfirmed { price, index } => {
            debug!("{} level {:.4} confirmed at candle {}", direction, price, index);
        }
        StateTransition::Triggered(breakout) => {
            debug!(
                "{} breakout at {} level={:.4}, stop={:.4}",
                direction,
                breakout.trigger_time.to_rfc3339(),
                breakout.entry_price,
                breakout.stop_price
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::Rng;

    fn t(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap() + Duration::minutes(i as i64)
    }

    /// Build candles from (high, low, close) triples at consecutive minutes
    fn candles(bars: &[(f64, f64, f64)]) -> Vec<Candle> {
        bars.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                open: close,
                high,
                low,
                close,
                volume: 100.0,
                timestamp: t(i),
            })
            .collect()
    }

    #[test]
    fn test_flat_top_example() {
        let bars = candles(&[
            (100.0, 99.0, 100.0),
            (105.0, 104.0, 105.0),
            (105.0, 104.0, 105.0),
            (103.0, 101.0, 103.0),
            (107.0, 104.0, 108.0),
        ]);

        let result = FlatScanner::top().scan(&bars);
        assert_eq!(
            result,
            PatternResult::Triggered {
                entry_price: 105.0,
                stop_price: 101.0,
                trigger_time: t(4),
            }
        );
    }

    #[test]
    fn test_level_confirmed_on_second_touch() {
        let bars = candles(&[
            (100.0, 99.0, 100.0),
            (105.0, 104.0, 105.0),
            (105.0, 104.0, 105.0),
        ]);

        match FlatScanner::top().run(&bars) {
            ScanState::LevelConfirmed {
                level,
                stop_candidate,
            } => {
                assert_eq!(level.price, 105.0);
                assert_eq!(level.touch_count, 2);
                assert_eq!(level.first_touch_index, 1);
                assert_eq!(level.last_touch_index, 2);
                assert_eq!(stop_candidate, None);
            }
            other => panic!("expected LEVEL_CONFIRMED, got {}", other),
        }
    }

    #[test]
    fn test_immediate_breakout_uses_breakout_candle_low() {
        let bars = candles(&[
            (105.0, 103.0, 104.0),
            (105.0, 102.0, 104.0),
            (108.0, 104.5, 107.0),
        ]);

        let result = FlatScanner::top().scan(&bars);
        assert_eq!(result.entry_price(), Some(105.0));
        assert_eq!(result.stop_price(), Some(104.5));
        assert_eq!(result.trigger_time(), Some(t(2)));
    }

    #[test]
    fn test_immediate_breakdown_uses_breakdown_candle_high() {
        let bars = candles(&[
            (101.0, 95.0, 96.0),
            (100.0, 95.0, 96.0),
            (99.0, 92.0, 93.0),
        ]);

        let result = FlatScanner::bottom().scan(&bars);
        assert_eq!(
            result,
            PatternResult::Triggered {
                entry_price: 95.0,
                stop_price: 99.0,
                trigger_time: t(2),
            }
        );
    }

    #[test]
    fn test_first_candle_counts_as_touch() {
        let bars = candles(&[(50.0, 49.0, 49.5), (50.0, 48.0, 49.0)]);
        let state = FlatScanner::top().run(&bars);
        assert!(matches!(state, ScanState::LevelConfirmed { .. }));
    }

    #[test]
    fn test_flat_bottom_breakdown() {
        let bars = candles(&[
            (102.0, 100.0, 101.0),
            (101.5, 95.0, 96.0),
            (99.0, 96.0, 98.0),
            (100.5, 95.0, 97.0),
            (98.0, 96.5, 97.5),
            (101.0, 97.0, 100.0),
            (97.0, 93.0, 94.0),
        ]);

        let result = FlatScanner::bottom().scan(&bars);
        assert_eq!(
            result,
            PatternResult::Triggered {
                entry_price: 95.0,
                stop_price: 101.0,
                trigger_time: t(6),
            }
        );
    }

    #[test]
    fn test_wick_beyond_level_does_not_trigger() {
        let bars = candles(&[
            (105.0, 100.0, 104.0),
            (105.0, 101.0, 104.0),
            // wick to 106 but closes back under the level
            (106.0, 102.0, 104.5),
            (104.0, 103.0, 103.5),
        ]);

        let state = FlatScanner::top().run(&bars);
        match state {
            ScanState::LevelConfirmed {
                level,
                stop_candidate,
            } => {
                // higher wick did not restart the search
                assert_eq!(level.price, 105.0);
                assert_eq!(stop_candidate, Some(102.0));
            }
            other => panic!("expected LEVEL_CONFIRMED, got {}", other),
        }
        assert_eq!(state.into_result(), PatternResult::NotTriggered);
    }

    #[test]
    fn test_close_equal_to_level_is_not_breakout() {
        let bars = candles(&[
            (105.0, 100.0, 104.0),
            (105.0, 101.0, 104.0),
            (105.5, 102.0, 105.0),
        ]);
        assert_eq!(FlatScanner::top().scan(&bars), PatternResult::NotTriggered);
    }

    #[test]
    fn test_higher_extreme_resets_unconfirmed_level() {
        let bars = candles(&[
            (100.0, 98.0, 99.0),
            (102.0, 99.0, 101.0),
            // back to 100 is not a touch of the discarded level
            (100.0, 97.0, 99.0),
            (102.0, 100.0, 101.0),
            (101.0, 99.5, 100.0),
            (104.0, 101.0, 103.0),
        ]);

        let result = FlatScanner::top().scan(&bars);
        assert_eq!(
            result,
            PatternResult::Triggered {
                entry_price: 102.0,
                stop_price: 99.5,
                trigger_time: t(5),
            }
        );
    }

    #[test]
    fn test_retest_moves_stop_reference() {
        let bars = candles(&[
            (105.0, 103.0, 104.0),
            (105.0, 103.0, 104.0),
            (104.0, 100.0, 101.0),
            // third touch
            (105.0, 102.0, 104.0),
            (104.5, 102.5, 103.0),
            (106.0, 103.0, 105.5),
        ]);

        let state = FlatScanner::top().run(&bars);
        match state {
            ScanState::Triggered(breakout) => {
                assert_eq!(breakout.level.touch_count, 3);
                assert_eq!(breakout.level.last_touch_index, 3);
                assert_eq!(breakout.stop_price, 102.5);
                assert_eq!(breakout.trigger_index, 5);
            }
            other => panic!("expected TRIGGERED, got {}", other),
        }
    }

    #[test]
    fn test_first_pattern_wins() {
        let bars = candles(&[
            (105.0, 103.0, 104.0),
            (105.0, 103.0, 104.0),
            (106.0, 104.0, 105.5),
            (106.0, 104.0, 105.5),
            (108.0, 105.0, 107.5),
        ]);

        let result = FlatScanner::top().scan(&bars);
        assert_eq!(result.entry_price(), Some(105.0));
        assert_eq!(result.trigger_time(), Some(t(2)));
        assert_eq!(result.stop_price(), Some(104.0));
    }

    #[test]
    fn test_empty_and_single_candle_series() {
        assert_eq!(FlatScanner::top().scan(&[]), PatternResult::NotTriggered);
        assert_eq!(FlatScanner::bottom().scan(&[]), PatternResult::NotTriggered);

        let one = candles(&[(100.0, 99.0, 99.5)]);
        assert_eq!(FlatScanner::top().scan(&one), PatternResult::NotTriggered);
        assert_eq!(FlatScanner::bottom().scan(&one), PatternResult::NotTriggered);
    }

    #[test]
    fn test_monotonic_series_never_trigger() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut price = 100.0;
            let mut rising = Vec::new();
            for _ in 0..rng.gen_range(2..200) {
                price += rng.gen_range(0.01..2.0);
                rising.push((price, price - 1.0, price - 0.5));
            }
            let falling: Vec<_> = rising.iter().rev().copied().collect();

            for series in [candles(&rising), candles(&falling)] {
                assert!(!FlatScanner::top().scan(&series).is_triggered());
                assert!(!FlatScanner::bottom().scan(&series).is_triggered());
            }
        }
    }

    #[test]
    fn test_top_ignores_lows_outside_stop_window() {
        let base = [
            (100.0, 99.0, 100.0),
            (105.0, 104.0, 105.0),
            (105.0, 104.0, 105.0),
            (103.0, 101.0, 103.0),
            (107.0, 104.0, 108.0),
        ];
        let expected = FlatScanner::top().scan(&candles(&base));

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut mutated = base;
            // lows before the level's last touch play no part in a top scan
            for bar in mutated.iter_mut().take(3) {
                bar.1 = rng.gen_range(50.0..bar.2);
            }
            assert_eq!(FlatScanner::top().scan(&candles(&mutated)), expected);
        }
    }

    #[test]
    fn test_bottom_ignores_highs() {
        let base = [
            (102.0, 100.0, 101.0),
            (101.5, 95.0, 96.0),
            (99.0, 95.0, 98.0),
            (99.0, 96.0, 98.0),
            (97.0, 93.0, 94.0),
        ];
        let expected = FlatScanner::bottom().scan(&candles(&base));
        assert!(expected.is_triggered());

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut mutated = base;
            for bar in mutated.iter_mut().take(3) {
                bar.0 = rng.gen_range(bar.2..150.0);
            }
            let result = FlatScanner::bottom().scan(&candles(&mutated));
            assert_eq!(result.entry_price(), expected.entry_price());
            assert_eq!(result.trigger_time(), expected.trigger_time());
        }
    }

    #[test]
    fn test_scan_is_deterministic() {
        let bars = candles(&[
            (100.0, 99.0, 100.0),
            (105.0, 104.0, 105.0),
            (105.0, 104.0, 105.0),
            (103.0, 101.0, 103.0),
            (107.0, 104.0, 108.0),
        ]);
        let scanner = FlatScanner::top();
        assert_eq!(scanner.run(&bars), scanner.run(&bars));
    }
}
