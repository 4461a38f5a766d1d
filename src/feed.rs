//! Inbound bar feeds and the update queue in front of the pipeline.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::{Bar, BarSeries, CrossingEvent, Error, Pipeline, Result, Timeframe};

/// Source of bars: a full series per timeframe, then live appends.
pub trait BarFeed {
    type Appends: Iterator<Item = Bar>;

    /// Full series for `timeframe`.
    ///
    /// # Errors
    ///
    /// Feed specific; [`FixtureFeed`] reports [`Error::UnknownTimeframe`]
    /// when it has no series for `timeframe`.
    fn snapshot(&mut self, timeframe: Timeframe) -> Result<BarSeries>;

    /// Live bars following the last snapshot, oldest first.
    fn subscribe_append(&mut self) -> Self::Appends;
}

/// Deterministic in-memory feed for tests and demos.
///
/// Every call to [`subscribe_append`](BarFeed::subscribe_append) replays the
/// same appends.
#[derive(Debug, Clone, Default)]
pub struct FixtureFeed {
    snapshots: HashMap<Timeframe, BarSeries>,
    appends: Vec<Bar>,
}

impl FixtureFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_snapshot(mut self, timeframe: Timeframe, series: BarSeries) -> Self {
        self.snapshots.insert(timeframe, series);
        self
    }

    #[must_use]
    pub fn with_appends(mut self, appends: Vec<Bar>) -> Self {
        self.appends = appends;
        self
    }
}

impl BarFeed for FixtureFeed {
    type Appends = std::vec::IntoIter<Bar>;

    fn snapshot(&mut self, timeframe: Timeframe) -> Result<BarSeries> {
        self.snapshots
            .get(&timeframe)
            .cloned()
            .ok_or_else(|| Error::UnknownTimeframe(timeframe.label().to_owned()))
    }

    fn subscribe_append(&mut self) -> Self::Appends {
        self.appends.clone().into_iter()
    }
}

/// One unit of work for [`Pipeline::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Replaces the whole series, e.g. on a timeframe change.
    Snapshot {
        timeframe: Timeframe,
        series: BarSeries,
    },
    /// A new bar after the current tail.
    Append(Bar),
}

/// FIFO of feed events where a newer snapshot supersedes everything still
/// pending, so stale work for a replaced series is never computed.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    pending: VecDeque<FeedEvent>,
    undelivered: Vec<CrossingEvent>,
}

impl UpdateQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: FeedEvent) {
        if matches!(event, FeedEvent::Snapshot { .. }) && !self.pending.is_empty() {
            debug!(superseded = self.pending.len(), "snapshot supersedes pending events");
            self.pending.clear();
        }
        self.pending.push_back(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Feeds pending events to `pipeline` in order and returns the
    /// crossings they produced.
    ///
    /// # Errors
    ///
    /// The first error from [`Pipeline::update`]. The failing event is
    /// dropped and later events stay queued. Crossings produced before the
    /// failure are returned by the next successful call.
    pub fn apply(&mut self, pipeline: &mut Pipeline) -> Result<Vec<CrossingEvent>> {
        while let Some(event) = self.pending.pop_front() {
            let crossings = pipeline.update(event)?;
            self.undelivered.extend(crossings);
        }

        Ok(std::mem::take(&mut self.undelivered))
    }
}
