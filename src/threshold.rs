//! Horizontal threshold lines and edge-triggered crossing detection.

use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Bar, Error, Price, Result, Timestamp};

/// Stable handle of a [`Line`] inside a [`ThresholdMonitor`].
///
/// Ids are never reused within one monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineId(u64);

impl Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a threshold line represents to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Support,
    Resistance,
    StopLoss,
    AlertAbove,
    AlertBelow,
}

impl LineKind {
    /// Whether a crossing in `direction` is worth notifying for this kind.
    ///
    /// Price alerts are one-directional; the other kinds care about both.
    #[must_use]
    pub fn watches(self, direction: Side) -> bool {
        match self {
            Self::AlertAbove => direction == Side::Above,
            Self::AlertBelow => direction == Side::Below,
            Self::Support | Self::Resistance | Self::StopLoss => true,
        }
    }
}

/// Position of a close relative to a line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Above,
    Below,
}

impl Side {
    /// `Above` iff `close > level`; touching the level counts as below.
    #[inline]
    #[must_use]
    pub fn of(close: Price, level: Price) -> Self {
        if close > level { Self::Above } else { Self::Below }
    }
}

/// A user-defined horizontal level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    id: LineId,
    kind: LineKind,
    level: Price,
    last_side: Option<Side>,
}

impl Line {
    #[must_use]
    pub fn id(&self) -> LineId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    #[must_use]
    pub fn level(&self) -> Price {
        self.level
    }

    /// Side of the most recent close, `None` until a bar has been seen.
    #[must_use]
    pub fn last_side(&self) -> Option<Side> {
        self.last_side
    }
}

/// A close moved to the other side of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossingEvent {
    pub line_id: LineId,
    pub kind: LineKind,
    pub level: Price,
    pub direction: Side,
    pub timestamp: Timestamp,
    pub close: Price,
}

impl CrossingEvent {
    /// Whether the line's kind wants to be notified about this crossing.
    #[must_use]
    pub fn is_watched(&self) -> bool {
        self.kind.watches(self.direction)
    }
}

/// Owns the threshold lines and detects crossings bar by bar.
///
/// Detection is edge-triggered: a line fires once when the close changes
/// side, and not again until it changes side back.
#[derive(Debug, Clone, Default)]
pub struct ThresholdMonitor {
    lines: BTreeMap<LineId, Line>,
    next_id: u64,
}

fn check_level(level: Price) -> Result<Price> {
    if level.is_finite() && level > 0.0 {
        Ok(level)
    } else {
        Err(Error::invalid(
            "line",
            format!("level must be positive and finite, got {level}"),
        ))
    }
}

impl ThresholdMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line with an unknown side.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `level` is not positive and finite.
    pub fn add_line(&mut self, kind: LineKind, level: Price) -> Result<LineId> {
        let level = check_level(level)?;
        let id = LineId(self.next_id);
        self.next_id += 1;

        self.lines.insert(
            id,
            Line {
                id,
                kind,
                level,
                last_side: None,
            },
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// [`Error::UnknownLine`] if `id` is not present.
    pub fn remove_line(&mut self, id: LineId) -> Result<Line> {
        self.lines.remove(&id).ok_or(Error::UnknownLine(id))
    }

    /// Moves a line. Its side becomes unknown until the next bar or a
    /// [`prime_line`](Self::prime_line) against the latest bar.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownLine`] if `id` is not present, or
    /// [`Error::InvalidParameter`] if `level` is not positive and finite.
    pub fn set_level(&mut self, id: LineId, level: Price) -> Result<()> {
        let level = check_level(level)?;
        let line = self.lines.get_mut(&id).ok_or(Error::UnknownLine(id))?;
        line.level = level;
        line.last_side = None;
        Ok(())
    }

    /// Records the side of `bar` for one line without firing.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownLine`] if `id` is not present.
    pub fn prime_line(&mut self, id: LineId, bar: &Bar) -> Result<()> {
        let line = self.lines.get_mut(&id).ok_or(Error::UnknownLine(id))?;
        line.last_side = Some(Side::of(bar.close, line.level));
        Ok(())
    }

    /// Forgets every line's side.
    pub fn reset_sides(&mut self) {
        for line in self.lines.values_mut() {
            line.last_side = None;
        }
    }

    /// Records each line's side for `bar` without firing.
    pub fn prime(&mut self, bar: &Bar) {
        for line in self.lines.values_mut() {
            line.last_side = Some(Side::of(bar.close, line.level));
        }
    }

    /// Evaluates every line against `bar` and returns the crossings, in
    /// line id order.
    pub fn on_new_bar(&mut self, bar: &Bar) -> Vec<CrossingEvent> {
        let mut events = Vec::new();

        for line in self.lines.values_mut() {
            let current = Side::of(bar.close, line.level);

            if let Some(previous) = line.last_side
                && previous != current
            {
                info!(
                    line = %line.id,
                    kind = ?line.kind,
                    level = line.level,
                    direction = ?current,
                    close = bar.close,
                    timestamp = bar.timestamp,
                    "threshold crossed"
                );
                events.push(CrossingEvent {
                    line_id: line.id,
                    kind: line.kind,
                    level: line.level,
                    direction: current,
                    timestamp: bar.timestamp,
                    close: bar.close,
                });
            }

            line.last_side = Some(current);
        }

        events
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::bar;

    fn run(monitor: &mut ThresholdMonitor, closes: &[f64]) -> Vec<(usize, CrossingEvent)> {
        closes
            .iter()
            .zip(1..)
            .enumerate()
            .flat_map(|(i, (&close, t))| {
                monitor
                    .on_new_bar(&bar(close, t))
                    .into_iter()
                    .map(move |event| (i, event))
            })
            .collect()
    }

    mod crossings {
        use super::*;

        #[test]
        fn fires_once_per_side_change() {
            let mut monitor = ThresholdMonitor::new();
            let id = monitor.add_line(LineKind::Resistance, 100.0).unwrap();

            let events = run(&mut monitor, &[98.0, 99.0, 101.0, 102.0, 100.0, 99.0]);

            let summary: Vec<_> = events.iter().map(|(i, e)| (*i, e.direction)).collect();
            assert_eq!(summary, vec![(2, Side::Above), (4, Side::Below)]);
            assert_eq!(events[0].1.line_id, id);
            assert_eq!(events[0].1.close, 101.0);
            assert_eq!(events[1].1.timestamp, 5);
        }

        #[test]
        fn first_bar_only_initializes() {
            let mut monitor = ThresholdMonitor::new();
            monitor.add_line(LineKind::Support, 50.0).unwrap();
            assert!(monitor.on_new_bar(&bar(80.0, 1)).is_empty());
            assert_eq!(monitor.lines().next().unwrap().last_side(), Some(Side::Above));
        }

        #[test]
        fn staying_on_one_side_never_fires() {
            let mut monitor = ThresholdMonitor::new();
            monitor.add_line(LineKind::StopLoss, 10.0).unwrap();
            assert!(run(&mut monitor, &[11.0, 12.0, 15.0, 10.5]).is_empty());
        }

        #[test]
        fn every_line_is_evaluated() {
            let mut monitor = ThresholdMonitor::new();
            let low = monitor.add_line(LineKind::Support, 95.0).unwrap();
            let high = monitor.add_line(LineKind::AlertAbove, 105.0).unwrap();

            let events = run(&mut monitor, &[100.0, 110.0, 90.0]);
            let ids: Vec<_> = events.iter().map(|(i, e)| (*i, e.line_id)).collect();
            assert_eq!(ids, vec![(1, high), (2, low), (2, high)]);
        }
    }

    mod editing {
        use super::*;

        #[test]
        fn rejects_bad_levels() {
            let mut monitor = ThresholdMonitor::new();
            assert!(monitor.add_line(LineKind::Support, 0.0).is_err());
            assert!(monitor.add_line(LineKind::Support, -3.0).is_err());
            assert!(monitor.add_line(LineKind::Support, f64::NAN).is_err());
            assert!(monitor.is_empty());
        }

        #[test]
        fn unknown_ids_error() {
            let mut monitor = ThresholdMonitor::new();
            let id = monitor.add_line(LineKind::Support, 10.0).unwrap();
            monitor.remove_line(id).unwrap();

            assert!(matches!(monitor.remove_line(id), Err(Error::UnknownLine(i)) if i == id));
            assert!(matches!(monitor.set_level(id, 12.0), Err(Error::UnknownLine(_))));
        }

        #[test]
        fn ids_are_not_reused() {
            let mut monitor = ThresholdMonitor::new();
            let first = monitor.add_line(LineKind::Support, 10.0).unwrap();
            monitor.remove_line(first).unwrap();
            let second = monitor.add_line(LineKind::Support, 10.0).unwrap();
            assert_ne!(first, second);
        }

        #[test]
        fn moving_a_line_resets_its_side() {
            let mut monitor = ThresholdMonitor::new();
            let id = monitor.add_line(LineKind::Resistance, 100.0).unwrap();
            monitor.on_new_bar(&bar(90.0, 1));

            monitor.set_level(id, 80.0).unwrap();
            assert_eq!(monitor.line(id).unwrap().last_side(), None);
            // Close is now above the moved line, but that is not a crossing.
            assert!(monitor.on_new_bar(&bar(90.0, 2)).is_empty());
            assert_eq!(monitor.on_new_bar(&bar(70.0, 3)).len(), 1);
        }

        #[test]
        fn priming_a_moved_line_judges_the_next_bar_against_it() {
            let mut monitor = ThresholdMonitor::new();
            let id = monitor.add_line(LineKind::AlertAbove, 95.0).unwrap();
            let other = monitor.add_line(LineKind::Support, 50.0).unwrap();
            monitor.on_new_bar(&bar(100.0, 1));

            monitor.set_level(id, 105.0).unwrap();
            monitor.prime_line(id, &bar(100.0, 1)).unwrap();
            assert_eq!(monitor.line(id).unwrap().last_side(), Some(Side::Below));
            assert_eq!(monitor.line(other).unwrap().last_side(), Some(Side::Above));

            let events = monitor.on_new_bar(&bar(110.0, 2));
            assert_eq!(events.len(), 1);
            assert_eq!((events[0].line_id, events[0].direction), (id, Side::Above));

            monitor.remove_line(other).unwrap();
            assert!(matches!(
                monitor.prime_line(other, &bar(1.0, 3)),
                Err(Error::UnknownLine(i)) if i == other
            ));
        }

        #[test]
        fn prime_sets_sides_silently() {
            let mut monitor = ThresholdMonitor::new();
            let id = monitor.add_line(LineKind::Support, 100.0).unwrap();
            monitor.on_new_bar(&bar(120.0, 1));

            monitor.reset_sides();
            assert_eq!(monitor.line(id).unwrap().last_side(), None);
            monitor.prime(&bar(80.0, 2));
            assert_eq!(monitor.line(id).unwrap().last_side(), Some(Side::Below));
            assert!(monitor.on_new_bar(&bar(85.0, 3)).is_empty());
        }
    }

    mod kinds {
        use super::*;

        #[test]
        fn alerts_watch_one_direction() {
            assert!(LineKind::AlertAbove.watches(Side::Above));
            assert!(!LineKind::AlertAbove.watches(Side::Below));
            assert!(LineKind::AlertBelow.watches(Side::Below));
            assert!(!LineKind::AlertBelow.watches(Side::Above));
            for kind in [LineKind::Support, LineKind::Resistance, LineKind::StopLoss] {
                assert!(kind.watches(Side::Above) && kind.watches(Side::Below));
            }
        }
    }
}
