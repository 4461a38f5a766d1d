//! The single entry point that turns feed events into enriched series,
//! summary statistics and crossing events.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Bar, BarFeed, BarSeries, CrossingEvent, EngineConfig, EnrichedSeries, Error, FeedEvent,
    IndicatorEngine, IndicatorKind, IndicatorSpec, Line, LineId, LineKind, Price, RenderMode,
    Result, SummaryStats, ThresholdMonitor, Timeframe, summarize,
};

/// Owns the series, the indicator engine and the threshold lines, and keeps
/// them consistent across [`update`](Self::update) calls.
///
/// Readers get immutable snapshots: [`enriched`](Self::enriched) hands out
/// an `Arc` that later updates never modify.
///
/// # Example
///
/// ```
/// use chartlab_ta::{Bar, BarSeries, FeedEvent, LineKind, Pipeline, Side, Timeframe};
///
/// let bar = |close, t| Bar::new(t, close, close, close, close, 10).unwrap();
/// let mut pipeline = Pipeline::default();
/// pipeline.add_line(LineKind::AlertAbove, 100.0).unwrap();
///
/// let series = BarSeries::new(vec![bar(98.0, 1), bar(99.0, 2)]).unwrap();
/// pipeline
///     .update(FeedEvent::Snapshot { timeframe: Timeframe::Min1, series })
///     .unwrap();
///
/// let crossings = pipeline.update(FeedEvent::Append(bar(101.0, 3))).unwrap();
/// assert_eq!(crossings.len(), 1);
/// assert_eq!(crossings[0].direction, Side::Above);
/// assert_eq!(pipeline.enriched().len(), 3);
/// ```
#[derive(Debug)]
pub struct Pipeline {
    engine: IndicatorEngine,
    monitor: ThresholdMonitor,
    enriched: Arc<EnrichedSeries>,
    summary: SummaryStats,
    timeframe: Timeframe,
    render_mode: RenderMode,
}

impl Default for Pipeline {
    /// Default indicator set, no lines.
    fn default() -> Self {
        Self::new(&IndicatorSpec::defaults())
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(specs: &[IndicatorSpec]) -> Self {
        let mut engine = IndicatorEngine::new(specs);
        let enriched = engine.recompute(&BarSeries::default());
        let timeframe = Timeframe::default();

        Self {
            engine,
            monitor: ThresholdMonitor::new(),
            enriched: Arc::new(enriched),
            summary: SummaryStats::default(),
            timeframe,
            render_mode: RenderMode::select(timeframe),
        }
    }

    /// Builds a pipeline with the configured indicators, timeframe and lines.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for an invalid indicator entry or line
    /// level.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut pipeline = Self::new(&config.indicator_specs()?);
        pipeline.timeframe = config.timeframe;
        pipeline.render_mode = RenderMode::select(config.timeframe);

        for line in &config.lines {
            pipeline.add_line(line.kind, line.level)?;
        }

        Ok(pipeline)
    }

    /// Applies one feed event and returns the crossings it produced.
    ///
    /// A snapshot recomputes everything and re-initializes line sides from
    /// the new last bar, so it never fires. An append extends the series
    /// incrementally and evaluates the lines against the new bar.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfOrderBar`] or [`Error::InvalidBar`] for a rejected
    /// append. Nothing changes in that case.
    pub fn update(&mut self, event: FeedEvent) -> Result<Vec<CrossingEvent>> {
        match event {
            FeedEvent::Snapshot { timeframe, series } => {
                self.replace(timeframe, &series);
                Ok(Vec::new())
            }
            FeedEvent::Append(bar) => self.append(bar),
        }
    }

    fn replace(&mut self, timeframe: Timeframe, series: &BarSeries) {
        self.enriched = Arc::new(self.engine.recompute(series));
        self.summary = summarize(&self.enriched);

        if timeframe != self.timeframe {
            self.timeframe = timeframe;
            self.render_mode = RenderMode::select(timeframe);
            debug!(%timeframe, render_mode = ?self.render_mode, "timeframe changed");
        }

        self.monitor.reset_sides();
        if let Some(last) = series.last() {
            self.monitor.prime(last);
        }
    }

    fn append(&mut self, bar: Bar) -> Result<Vec<CrossingEvent>> {
        if let Err(err) = self.engine.append(Arc::make_mut(&mut self.enriched), bar) {
            warn!(timestamp = bar.timestamp, error = %err, "rejected bar");
            return Err(err);
        }
        self.summary = summarize(&self.enriched);

        Ok(self.monitor.on_new_bar(&bar))
    }

    /// Replaces the indicator set and recomputes the current series.
    pub fn set_indicators(&mut self, specs: &[IndicatorSpec]) {
        self.engine = IndicatorEngine::new(specs);
        self.enriched = Arc::new(self.engine.recompute(self.enriched.series()));
    }

    /// Shows or hides every configured indicator of `kind`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownIndicator`] if no configured spec has `kind`.
    pub fn set_indicator_enabled(&mut self, kind: IndicatorKind, enabled: bool) -> Result<()> {
        let mut specs = self.engine.specs().to_vec();
        let mut found = false;
        for spec in specs.iter_mut().filter(|spec| spec.kind == kind) {
            found = true;
            spec.enabled = enabled;
        }

        if !found {
            return Err(Error::UnknownIndicator(kind));
        }
        if specs != self.engine.specs() {
            self.set_indicators(&specs);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// See [`ThresholdMonitor::add_line`].
    pub fn add_line(&mut self, kind: LineKind, level: Price) -> Result<LineId> {
        self.monitor.add_line(kind, level)
    }

    /// # Errors
    ///
    /// See [`ThresholdMonitor::remove_line`].
    pub fn remove_line(&mut self, id: LineId) -> Result<Line> {
        self.monitor.remove_line(id)
    }

    /// Moves a line and records its side against the current last bar, so
    /// the move never fires and the next append is judged against the new
    /// level.
    ///
    /// # Errors
    ///
    /// See [`ThresholdMonitor::set_level`].
    pub fn set_line_level(&mut self, id: LineId, level: Price) -> Result<()> {
        self.monitor.set_level(id, level)?;
        if let Some(last) = self.enriched.series().last() {
            self.monitor.prime_line(id, last)?;
        }
        Ok(())
    }

    /// Loads `timeframe` from `feed` and replays its appends.
    ///
    /// # Errors
    ///
    /// The feed's snapshot error, or the first rejected append.
    pub fn load<F: BarFeed>(
        &mut self,
        feed: &mut F,
        timeframe: Timeframe,
    ) -> Result<Vec<CrossingEvent>> {
        let series = feed.snapshot(timeframe)?;
        let mut crossings = self.update(FeedEvent::Snapshot { timeframe, series })?;

        for bar in feed.subscribe_append() {
            crossings.extend(self.update(FeedEvent::Append(bar))?);
        }

        Ok(crossings)
    }

    /// Snapshot of the current bars and indicator columns.
    #[must_use]
    pub fn enriched(&self) -> Arc<EnrichedSeries> {
        Arc::clone(&self.enriched)
    }

    #[must_use]
    pub fn summary(&self) -> SummaryStats {
        self.summary
    }

    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    #[must_use]
    pub fn specs(&self) -> &[IndicatorSpec] {
        self.engine.specs()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.monitor.lines()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{
        FixtureFeed, LineEntry, Side, SmaConfig,
        test_util::{bar, bars, nz, ohlc},
    };

    fn snapshot(timeframe: Timeframe, closes: &[f64]) -> FeedEvent {
        FeedEvent::Snapshot {
            timeframe,
            series: BarSeries::new(bars(closes)).unwrap(),
        }
    }

    fn append_closes(pipeline: &mut Pipeline, closes: &[f64], first_ts: u64) -> Vec<(usize, Side)> {
        closes
            .iter()
            .zip(first_ts..)
            .enumerate()
            .flat_map(|(i, (&close, t))| {
                pipeline
                    .update(FeedEvent::Append(bar(close, t)))
                    .unwrap()
                    .into_iter()
                    .map(move |e| (i, e.direction))
            })
            .collect()
    }

    mod updates {
        use super::*;

        #[test]
        fn appends_fire_edge_triggered_crossings() {
            let mut pipeline = Pipeline::default();
            pipeline.add_line(LineKind::Resistance, 100.0).unwrap();
            pipeline.update(snapshot(Timeframe::Hour1, &[])).unwrap();

            let crossings =
                append_closes(&mut pipeline, &[98.0, 99.0, 101.0, 102.0, 100.0, 99.0], 1);
            assert_eq!(crossings, vec![(2, Side::Above), (4, Side::Below)]);
        }

        #[test]
        fn snapshot_reinitializes_sides_without_firing() {
            let mut pipeline = Pipeline::default();
            let id = pipeline.add_line(LineKind::Support, 100.0).unwrap();
            pipeline.update(snapshot(Timeframe::Hour1, &[90.0, 95.0])).unwrap();
            assert_eq!(pipeline.monitor.line(id).unwrap().last_side(), Some(Side::Below));

            // New series ends above the line: no event, side follows the tail.
            let events = pipeline.update(snapshot(Timeframe::Day1, &[120.0, 130.0])).unwrap();
            assert!(events.is_empty());
            assert_eq!(pipeline.monitor.line(id).unwrap().last_side(), Some(Side::Above));

            let events = append_closes(&mut pipeline, &[90.0], 3);
            assert_eq!(events, vec![(0, Side::Below)]);
        }

        #[test]
        fn rejected_append_changes_nothing() {
            let mut pipeline = Pipeline::default();
            pipeline.add_line(LineKind::StopLoss, 5.0).unwrap();
            pipeline.update(snapshot(Timeframe::Hour1, &[10.0, 11.0])).unwrap();
            let before = pipeline.enriched();
            let summary = pipeline.summary();

            let err = pipeline.update(FeedEvent::Append(bar(1.0, 2))).unwrap_err();
            assert!(matches!(err, Error::OutOfOrderBar { last: 2, got: 2 }));
            let err = pipeline
                .update(FeedEvent::Append(ohlc(3.0, 2.0, 1.0, 3.0, 3)))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidBar { .. }));

            assert_eq!(*pipeline.enriched(), *before);
            assert_eq!(pipeline.summary(), summary);
        }

        #[test]
        fn crossing_right_after_a_move_fires() {
            let mut pipeline = Pipeline::default();
            pipeline.update(snapshot(Timeframe::Hour1, &[98.0, 100.0])).unwrap();
            let id = pipeline.add_line(LineKind::AlertAbove, 95.0).unwrap();
            pipeline.set_line_level(id, 105.0).unwrap();

            let crossings = pipeline.update(FeedEvent::Append(bar(110.0, 3))).unwrap();
            assert_eq!(crossings.len(), 1);
            assert_eq!(crossings[0].line_id, id);
            assert_eq!(crossings[0].direction, Side::Above);
            assert_eq!(crossings[0].level, 105.0);
        }

        #[test]
        fn moving_a_line_before_any_bar_leaves_its_side_unknown() {
            let mut pipeline = Pipeline::default();
            let id = pipeline.add_line(LineKind::Resistance, 100.0).unwrap();
            pipeline.set_line_level(id, 90.0).unwrap();
            assert_eq!(pipeline.monitor.line(id).unwrap().last_side(), None);
        }

        #[test]
        fn held_snapshot_is_not_mutated() {
            let mut pipeline = Pipeline::default();
            pipeline.update(snapshot(Timeframe::Hour1, &[1.0, 2.0])).unwrap();
            let held = pipeline.enriched();

            pipeline.update(FeedEvent::Append(bar(3.0, 3))).unwrap();
            assert_eq!(held.len(), 2);
            assert_eq!(pipeline.enriched().len(), 3);
        }

        #[test]
        fn summary_tracks_the_tail() {
            let mut pipeline = Pipeline::default();
            pipeline.update(snapshot(Timeframe::Hour1, &[10.0, 12.0])).unwrap();
            assert_eq!(pipeline.summary().change, Some(2.0));

            pipeline.update(FeedEvent::Append(bar(11.0, 3))).unwrap();
            assert_eq!(pipeline.summary().last_close, Some(11.0));
            assert_eq!(pipeline.summary().change, Some(-1.0));
        }
    }

    mod render_mode {
        use super::*;

        #[test]
        fn follows_snapshot_timeframe() {
            let mut pipeline = Pipeline::default();
            pipeline.update(snapshot(Timeframe::Min1, &[1.0])).unwrap();
            assert_eq!(pipeline.render_mode(), RenderMode::Candlestick);

            pipeline.update(snapshot(Timeframe::Year1, &[1.0])).unwrap();
            assert_eq!(pipeline.render_mode(), RenderMode::Line);
            assert_eq!(pipeline.timeframe(), Timeframe::Year1);

            pipeline.update(FeedEvent::Append(bar(2.0, 2))).unwrap();
            assert_eq!(pipeline.render_mode(), RenderMode::Line);
        }
    }

    mod configuration {
        use super::*;

        #[test]
        fn toggling_an_indicator_recomputes_columns() {
            let mut pipeline = Pipeline::default();
            pipeline.update(snapshot(Timeframe::Hour1, &[1.0, 2.0, 3.0])).unwrap();
            assert_eq!(pipeline.enriched().columns().len(), 6);

            pipeline.set_indicator_enabled(IndicatorKind::Obv, true).unwrap();
            let enriched = pipeline.enriched();
            assert_eq!(enriched.columns().len(), 7);
            let obv = enriched.column(IndicatorKind::Obv).unwrap();
            assert_eq!(obv.values().len(), 3);
        }

        #[test]
        fn toggling_an_unknown_indicator_errors() {
            let mut pipeline = Pipeline::new(&[]);
            assert!(matches!(
                pipeline.set_indicator_enabled(IndicatorKind::Vwap, true),
                Err(Error::UnknownIndicator(IndicatorKind::Vwap))
            ));
        }

        #[test]
        fn replacing_indicators_keeps_the_series() {
            let mut pipeline = Pipeline::default();
            pipeline.update(snapshot(Timeframe::Hour1, &[1.0, 2.0, 3.0])).unwrap();

            let sma = IndicatorKind::Sma(SmaConfig::close(nz(2)));
            pipeline.set_indicators(&[IndicatorSpec::new(sma)]);
            let enriched = pipeline.enriched();
            assert_eq!(enriched.len(), 3);
            assert_eq!(enriched.columns().len(), 1);
            assert_eq!(
                enriched.column(sma).unwrap().last().and_then(|v| v.as_scalar()),
                Some(2.5)
            );
        }

        #[test]
        fn from_config_installs_lines_and_timeframe() {
            let config = EngineConfig {
                timeframe: Timeframe::Week1,
                lines: vec![LineEntry {
                    kind: LineKind::AlertBelow,
                    level: 50.0,
                }],
                ..EngineConfig::default()
            };
            let pipeline = Pipeline::from_config(&config).unwrap();
            assert_eq!(pipeline.render_mode(), RenderMode::Area);
            assert_eq!(pipeline.lines().count(), 1);
            assert_eq!(pipeline.specs(), IndicatorSpec::defaults().as_slice());
        }

        #[test]
        fn from_config_rejects_bad_line() {
            let config = EngineConfig {
                lines: vec![LineEntry {
                    kind: LineKind::Support,
                    level: -1.0,
                }],
                ..EngineConfig::default()
            };
            assert!(matches!(
                Pipeline::from_config(&config),
                Err(Error::InvalidParameter { .. })
            ));
        }

        #[test]
        fn moving_a_line_does_not_fire_on_the_next_bar() {
            let mut pipeline = Pipeline::default();
            let id = pipeline.add_line(LineKind::Resistance, 100.0).unwrap();
            pipeline.update(snapshot(Timeframe::Hour1, &[90.0])).unwrap();

            pipeline.set_line_level(id, 80.0).unwrap();
            assert!(append_closes(&mut pipeline, &[90.0], 2).is_empty());
            pipeline.remove_line(id).unwrap();
            assert!(append_closes(&mut pipeline, &[70.0], 3).is_empty());
        }
    }

    mod feed {
        use super::*;

        #[test]
        fn load_applies_snapshot_then_appends() {
            let mut feed = FixtureFeed::new()
                .with_snapshot(Timeframe::Min15, BarSeries::new(bars(&[98.0, 99.0])).unwrap())
                .with_appends(vec![bar(101.0, 3), bar(97.0, 4)]);

            let mut pipeline = Pipeline::default();
            pipeline.add_line(LineKind::Resistance, 100.0).unwrap();
            let crossings = pipeline.load(&mut feed, Timeframe::Min15).unwrap();

            let directions: Vec<_> = crossings.iter().map(|c| c.direction).collect();
            assert_eq!(directions, vec![Side::Above, Side::Below]);
            assert_eq!(pipeline.enriched().len(), 4);
            assert_eq!(pipeline.render_mode(), RenderMode::Candlestick);
        }

        #[test]
        fn load_surfaces_missing_timeframe() {
            let mut pipeline = Pipeline::default();
            assert!(matches!(
                pipeline.load(&mut FixtureFeed::new(), Timeframe::All),
                Err(Error::UnknownTimeframe(_))
            ));
        }
    }
}
