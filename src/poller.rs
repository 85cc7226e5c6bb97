use crate::client::StatsSource;
use crate::errors::Result;
use crate::models::EventAggregateRecord;
use crate::render::{ChartRenderer, RenderController};
use crate::reshape::reshape;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

pub const UPDATE_INTERVAL: Duration = Duration::from_millis(60_000);

/// Asks the poller for a fresh load. Requests made while one is already
/// queued are folded into it.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: mpsc::Sender<()>,
}

impl ReloadHandle {
    pub fn request(&self) {
        // Full means a reload is already queued.
        let _ = self.tx.try_send(());
    }
}

type LoadResult = (u64, Result<Vec<EventAggregateRecord>>);

/// Periodically rebuilds the chart from `/api/stats`.
///
/// At most one load is in flight. Starting a load aborts the previous one, and
/// a result that arrives after a newer load started is dropped, so the chart
/// always reflects the most recently requested data.
pub struct Poller<R: ChartRenderer> {
    source: Arc<dyn StatsSource>,
    controller: RenderController<R>,
    interval: Duration,
    requests: mpsc::Receiver<()>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    done_tx: mpsc::Sender<LoadResult>,
    done_rx: mpsc::Receiver<LoadResult>,
}

impl<R: ChartRenderer> Poller<R> {
    pub fn new(source: Arc<dyn StatsSource>, renderer: R, interval: Duration) -> (Self, ReloadHandle) {
        let (tx, requests) = mpsc::channel(1);
        let (done_tx, done_rx) = mpsc::channel(4);
        let poller = Self {
            source,
            controller: RenderController::new(renderer),
            interval,
            requests,
            generation: 0,
            in_flight: None,
            done_tx,
            done_rx,
        };
        (poller, ReloadHandle { tx })
    }

    pub fn controller(&self) -> &RenderController<R> {
        &self.controller
    }

    /// Loads now and then on every tick or reload request until `shutdown`
    /// resolves. Gives back the render controller so the caller decides what
    /// happens to the last chart.
    pub async fn run<F>(mut self, shutdown: F) -> RenderController<R>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_ms = self.interval.as_millis() as u64, "polling started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.start_load(),
                Some(()) = self.requests.recv() => self.start_load(),
                Some((generation, result)) = self.done_rx.recv() => {
                    self.finish_load(generation, result).await;
                }
            }
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        info!("polling stopped");
        self.controller
    }

    /// Runs one load to completion without the timer.
    pub async fn reload(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        self.generation += 1;
        let result = self.source.fetch_stats().await;
        self.apply(result).await;
    }

    /// Serves a queued reload request, if any.
    pub async fn run_pending(&mut self) {
        if self.requests.try_recv().is_ok() {
            self.reload().await;
        }
    }

    fn start_load(&mut self) {
        if let Some(task) = self.in_flight.take() {
            debug!(generation = self.generation, "superseding in-flight load");
            task.abort();
        }
        self.generation += 1;

        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let done = self.done_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = source.fetch_stats().await;
            let _ = done.send((generation, result)).await;
        }));
    }

    /// Applies a finished load unless a newer one has started since.
    async fn finish_load(&mut self, generation: u64, result: Result<Vec<EventAggregateRecord>>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale load");
            return;
        }
        self.in_flight = None;
        self.apply(result).await;
    }

    async fn apply(&mut self, result: Result<Vec<EventAggregateRecord>>) {
        match result {
            Ok(records) => {
                let series = reshape(&records);
                if let Err(err) = self.controller.render(&series).await {
                    error!("error rendering chart: {err}");
                }
            }
            Err(err) => {
                error!("error loading data: {err}");
                self.controller.dispose().await;
            }
        }
    }
}
