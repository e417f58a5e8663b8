//! Dashboard engine - background polling and lifecycle.
//!
//! The engine wraps a [`PollLoop`] in a tokio task that refreshes once
//! immediately, then on a fixed period and whenever view parameters change
//! in a way that needs a new request. Each refresh runs as its own task, so
//! parameter changes are taken while a slow request is still outstanding;
//! the poll loop discards the late response.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::adapters::HttpServiceSource;
use crate::application::{CycleOutcome, DashboardView, PollLoop, PollOptions};
use crate::config::Config;
use crate::domain::SortSpec;
use crate::error::Result;
use crate::ports::ServiceSource;

/// Background driver for a [`PollLoop`].
///
/// # Usage Pattern
/// Call [`start`](Self::start) from inside a tokio runtime, read
/// [`view`](Self::view) whenever [`subscribe`](Self::subscribe) reports a
/// change, and [`stop`](Self::stop) (or drop the engine) on teardown.
pub struct DashboardEngine<S: ServiceSource + 'static> {
    poll: Arc<PollLoop<S>>,
    refresh_interval: Duration,
    wake: Arc<Notify>,
    updates: watch::Sender<u64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DashboardEngine<HttpServiceSource> {
    /// Create an engine polling the HTTP endpoint named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpServiceSource::new(&config.endpoint, config.request_timeout())?;
        Ok(Self::new(source, config.poll_options(), config.refresh_interval()))
    }
}

impl<S: ServiceSource + 'static> DashboardEngine<S> {
    /// Create a stopped engine.
    pub fn new(source: S, options: PollOptions, refresh_interval: Duration) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            poll: Arc::new(PollLoop::new(source, options)),
            refresh_interval,
            wake: Arc::new(Notify::new()),
            updates,
            task: Mutex::new(None),
        }
    }

    /// Get the refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Start polling. Does nothing if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        info!(
            interval_secs = self.refresh_interval.as_secs(),
            mode = ?self.poll.mode(),
            "Starting dashboard polling"
        );
        *task = Some(tokio::spawn(drive(
            self.poll.clone(),
            self.refresh_interval,
            self.wake.clone(),
            self.updates.clone(),
        )));
    }

    /// Stop polling. In-flight requests are abandoned; held data is kept.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Stopped dashboard polling");
        }
    }

    /// Check if the polling task is running.
    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Subscribe to view changes. The value is a change counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Current display-ready view.
    pub fn view(&self) -> DashboardView {
        self.poll.view()
    }

    pub fn set_sort(&self, sort: SortSpec) {
        let refetch = self.poll.set_sort(sort);
        self.after_change(refetch);
    }

    pub fn set_page(&self, page: usize) {
        let refetch = self.poll.set_page(page);
        self.after_change(refetch);
    }

    pub fn set_page_size(&self, page_size: usize) {
        let refetch = self.poll.set_page_size(page_size);
        self.after_change(refetch);
    }

    fn after_change(&self, refetch: bool) {
        if refetch {
            self.wake.notify_one();
        }
        // Client-side sorting/paging changes the view without a fetch.
        self.updates.send_modify(|v| *v += 1);
    }
}

impl<S: ServiceSource + 'static> Drop for DashboardEngine<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

/// Driver loop: tick or wake, then spawn a cycle. Dropping the loop (on
/// abort) drops the `JoinSet`, which aborts any cycle still in flight.
async fn drive<S: ServiceSource + 'static>(
    poll: Arc<PollLoop<S>>,
    period: Duration,
    wake: Arc<Notify>,
    updates: watch::Sender<u64>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => debug!("Refresh tick"),
            _ = wake.notified() => debug!("Refresh requested"),
            Some(_) = cycles.join_next() => continue,
        }

        let poll = poll.clone();
        let wake = wake.clone();
        let updates = updates.clone();
        cycles.spawn(async move {
            let before = poll.state().change_stamp();
            if poll.refresh().await == CycleOutcome::Reissue {
                wake.notify_one();
            }
            if poll.state().change_stamp() != before {
                updates.send_modify(|v| *v += 1);
            }
        });
    }
}
