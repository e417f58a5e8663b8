//! Poll loop - fetches service data and reconciles it into held state.
//!
//! A `PollLoop` owns the last-known-good records and page metadata. Each
//! call to [`PollLoop::refresh`] performs one `Fetching -> Succeeded | Failed`
//! cycle. Parameter changes bump a generation counter; a response that
//! arrives for an older generation is discarded instead of applied.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    validate_list, validate_one, validate_page, PageMeta, PageRequest, ServiceRecord, SortSpec,
};
use crate::error::{Error, Result};
use crate::ports::{ListQuery, ServiceSource};

/// Where sorting and paging happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PagingMode {
    /// Fetch the whole listing and sort/page it locally.
    #[default]
    Client,
    /// Send sort/page parameters and receive one page plus totals.
    Server,
}

/// Phase of the most recent cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
    Succeeded,
    Failed,
}

/// What a single refresh cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New data differed from the held data and replaced it.
    Replaced,
    /// New data equalled the held data; nothing was replaced.
    Unchanged,
    /// Parameters changed while the request was in flight; result dropped.
    Discarded,
    /// The requested page was past the end; the page was clamped and a new
    /// request should be issued.
    Reissue,
    /// The cycle failed; held data was kept.
    Failed,
}

/// User-visible error flag of the last failed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorStatus {
    /// Short message for display.
    pub message: String,
    /// Full error text.
    pub detail: String,
}

impl From<&Error> for ErrorStatus {
    fn from(err: &Error) -> Self {
        Self {
            message: err.user_message().to_string(),
            detail: err.to_string(),
        }
    }
}

/// State held by the poll loop.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// Last-known-good records. In server mode only the current page.
    pub records: Vec<ServiceRecord>,
    /// Page metadata reported by the server (server mode only).
    pub meta: Option<PageMeta>,
    pub phase: Phase,
    pub error: Option<ErrorStatus>,
    /// Bumped every time `records` or `meta` is replaced.
    pub revision: u64,
    /// When held data was last confirmed by a successful cycle.
    pub updated_at: Option<DateTime<Utc>>,
}

impl PollState {
    /// What a front-end redraws on: data revision, error flag, loaded-ness.
    pub fn change_stamp(&self) -> (u64, Option<ErrorStatus>, bool) {
        (self.revision, self.error.clone(), self.updated_at.is_some())
    }
}

/// Parameters the user currently wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Desired {
    sort: SortSpec,
    page: PageRequest,
    generation: u64,
}

/// Construction options for a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub mode: PagingMode,
    /// Upper bound for a single request.
    pub request_timeout: Duration,
    pub sort: SortSpec,
    pub page: PageRequest,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            mode: PagingMode::Client,
            request_timeout: Duration::from_secs(10),
            sort: SortSpec::default(),
            page: PageRequest::default(),
        }
    }
}

enum Decoded {
    Listing(Vec<ServiceRecord>, Option<PageMeta>),
    OutOfRange(PageMeta),
}

/// Fetches and reconciles service listings from a [`ServiceSource`].
pub struct PollLoop<S: ServiceSource> {
    source: S,
    mode: PagingMode,
    request_timeout: Duration,
    state: RwLock<PollState>,
    desired: RwLock<Desired>,
}

impl<S: ServiceSource> PollLoop<S> {
    /// Create a poll loop in the `Idle` phase with no held data.
    pub fn new(source: S, options: PollOptions) -> Self {
        Self {
            source,
            mode: options.mode,
            request_timeout: options.request_timeout,
            state: RwLock::new(PollState::default()),
            desired: RwLock::new(Desired {
                sort: options.sort,
                page: PageRequest::new(options.page.page, options.page.page_size),
                generation: 0,
            }),
        }
    }

    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    /// Snapshot of the held state.
    pub fn state(&self) -> PollState {
        self.state.read().clone()
    }

    pub fn sort(&self) -> SortSpec {
        self.desired.read().sort
    }

    pub fn page_request(&self) -> PageRequest {
        self.desired.read().page
    }

    /// Parameters the next request will carry.
    pub fn query(&self) -> ListQuery {
        let desired = self.desired.read();
        ListQuery::new(desired.sort, desired.page)
    }

    /// Change the sort order. Resets to the first page.
    ///
    /// Returns true when the change requires a new fetch (server mode).
    pub fn set_sort(&self, sort: SortSpec) -> bool {
        self.update_desired(|d| {
            d.sort = sort;
            d.page.page = 1;
        })
    }

    /// Jump to a page (1-based; 0 is lifted to 1).
    ///
    /// Returns true when the change requires a new fetch (server mode).
    pub fn set_page(&self, page: usize) -> bool {
        self.update_desired(|d| d.page.page = page.max(1))
    }

    /// Change the page size. Resets to the first page.
    ///
    /// Returns true when the change requires a new fetch (server mode).
    pub fn set_page_size(&self, page_size: usize) -> bool {
        self.update_desired(|d| d.page = PageRequest::new(1, page_size))
    }

    fn update_desired(&self, apply: impl FnOnce(&mut Desired)) -> bool {
        let mut desired = self.desired.write();
        let before = *desired;
        apply(&mut desired);
        if desired.sort == before.sort && desired.page == before.page {
            return false;
        }
        desired.generation += 1;
        debug!(
            generation = desired.generation,
            sort = %desired.sort.field,
            direction = desired.sort.direction.as_str(),
            page = desired.page.page,
            page_size = desired.page.page_size,
            "View parameters changed"
        );
        self.mode == PagingMode::Server
    }

    /// Run one fetch-validate-reconcile cycle.
    pub async fn refresh(&self) -> CycleOutcome {
        let (query, generation) = {
            let desired = self.desired.read();
            (ListQuery::new(desired.sort, desired.page), desired.generation)
        };
        self.state.write().phase = Phase::Fetching;

        let sent = match self.mode {
            PagingMode::Client => None,
            PagingMode::Server => Some(&query),
        };
        let fetched = self.with_timeout(self.source.fetch_list(sent)).await;

        if self.mode == PagingMode::Server && self.desired.read().generation != generation {
            debug!(generation, "Discarding response for outdated parameters");
            return CycleOutcome::Discarded;
        }

        match fetched.and_then(|raw| self.decode(&raw, query.page)) {
            Ok(Decoded::Listing(records, meta)) => self.reconcile(records, meta),
            Ok(Decoded::OutOfRange(meta)) => self.reissue(meta, generation),
            Err(err) => self.fail(&err),
        }
    }

    /// Fetch and validate a single service for a detail view.
    ///
    /// Held state is left untouched.
    pub async fn fetch_detail(&self, port: u16) -> Result<ServiceRecord> {
        let raw = self.with_timeout(self.source.fetch_one(port)).await?;
        validate_one(&raw)
    }

    async fn with_timeout(
        &self,
        request: impl std::future::Future<Output = Result<Value>>,
    ) -> Result<Value> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(Error::Transport(format!(
                "request timed out after {}s",
                self.request_timeout.as_secs_f64()
            ))),
        }
    }

    fn decode(&self, raw: &Value, requested: PageRequest) -> Result<Decoded> {
        match self.mode {
            PagingMode::Client => Ok(Decoded::Listing(validate_list(raw)?, None)),
            PagingMode::Server => {
                let envelope = validate_page(raw, requested)?;
                envelope.meta.check(envelope.items.len())?;
                if envelope.meta.is_out_of_range() {
                    return Ok(Decoded::OutOfRange(envelope.meta));
                }
                Ok(Decoded::Listing(envelope.items, Some(envelope.meta)))
            }
        }
    }

    fn reconcile(&self, records: Vec<ServiceRecord>, meta: Option<PageMeta>) -> CycleOutcome {
        let mut state = self.state.write();
        state.phase = Phase::Succeeded;
        state.error = None;
        state.updated_at = Some(Utc::now());

        if state.records == records && state.meta == meta {
            debug!(count = records.len(), "Service listing unchanged");
            return CycleOutcome::Unchanged;
        }

        state.records = records;
        state.meta = meta;
        state.revision += 1;
        info!(
            count = state.records.len(),
            revision = state.revision,
            "Service listing updated"
        );
        CycleOutcome::Replaced
    }

    fn reissue(&self, meta: PageMeta, generation: u64) -> CycleOutcome {
        let mut desired = self.desired.write();
        let clamped = desired.page.clamp(meta.total);
        if desired.generation != generation || clamped.page == desired.page.page {
            drop(desired);
            return self.fail(&Error::PaginationInconsistency(format!(
                "page {} is past the last page {}",
                meta.page,
                meta.page_count()
            )));
        }

        debug!(
            requested = desired.page.page,
            clamped = clamped.page,
            "Requested page out of range, clamping"
        );
        desired.page.page = clamped.page;
        desired.generation += 1;
        CycleOutcome::Reissue
    }

    fn fail(&self, err: &Error) -> CycleOutcome {
        warn!(error = %err, "Service refresh failed");
        let mut state = self.state.write();
        state.phase = Phase::Failed;
        state.error = Some(ErrorStatus::from(err));
        CycleOutcome::Failed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::domain::{SortDirection, SortField};

    /// Mock source replaying scripted responses, each after an optional delay.
    #[derive(Clone, Default)]
    pub(crate) struct MockSource {
        responses: Arc<Mutex<VecDeque<(Duration, Result<Value>)>>>,
        pub(crate) queries: Arc<Mutex<Vec<Option<ListQuery>>>>,
        detail: Arc<Mutex<Option<Value>>>,
    }

    impl MockSource {
        pub(crate) fn push(&self, response: Result<Value>) {
            self.push_delayed(Duration::ZERO, response);
        }

        pub(crate) fn push_delayed(&self, delay: Duration, response: Result<Value>) {
            self.responses.lock().push_back((delay, response));
        }

        pub(crate) fn set_detail(&self, value: Value) {
            *self.detail.lock() = Some(value);
        }
    }

    impl ServiceSource for MockSource {
        async fn fetch_list(&self, query: Option<&ListQuery>) -> Result<Value> {
            self.queries.lock().push(query.copied());
            let next = self.responses.lock().pop_front();
            let (delay, response) =
                next.unwrap_or_else(|| (Duration::ZERO, Err(Error::Transport("no response".into()))));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            response
        }

        async fn fetch_one(&self, port: u16) -> Result<Value> {
            self.detail
                .lock()
                .clone()
                .ok_or_else(|| Error::Transport(format!("404 for port {}", port)))
        }
    }

    fn client_loop() -> (PollLoop<MockSource>, MockSource) {
        let source = MockSource::default();
        (PollLoop::new(source.clone(), PollOptions::default()), source)
    }

    fn server_loop() -> (PollLoop<MockSource>, MockSource) {
        let source = MockSource::default();
        let options = PollOptions {
            mode: PagingMode::Server,
            ..PollOptions::default()
        };
        (PollLoop::new(source.clone(), options), source)
    }

    fn listing() -> Value {
        json!([
            {"port": 27017, "status": "LISTEN", "process": "mongod"},
            {"port": 3000, "status": "LISTEN", "process": "node"}
        ])
    }

    #[tokio::test]
    async fn test_initially_idle() {
        let (poll, _) = client_loop();
        let state = poll.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.records.is_empty());
        assert_eq!(state.revision, 0);
    }

    #[tokio::test]
    async fn test_success_replaces_state() {
        let (poll, source) = client_loop();
        source.push(Ok(listing()));

        assert_eq!(poll.refresh().await, CycleOutcome::Replaced);
        let state = poll.state();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.records.len(), 2);
        assert!(state.updated_at.is_some());
        // Client mode sends no parameters.
        assert_eq!(source.queries.lock().as_slice(), &[None]);
    }

    #[tokio::test]
    async fn test_identical_payloads_replace_once() {
        let (poll, source) = client_loop();
        source.push(Ok(listing()));
        source.push(Ok(listing()));

        assert_eq!(poll.refresh().await, CycleOutcome::Replaced);
        assert_eq!(poll.refresh().await, CycleOutcome::Unchanged);
        assert_eq!(poll.state().revision, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let (poll, source) = client_loop();
        source.push(Ok(listing()));
        source.push(Err(Error::Transport("connection refused".into())));

        poll.refresh().await;
        assert_eq!(poll.refresh().await, CycleOutcome::Failed);

        let state = poll.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.revision, 1);
        let error = state.error.unwrap();
        assert_eq!(error.message, "Failed to load services");
        assert!(error.detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_invalid_payload_fails_and_keeps_data() {
        let (poll, source) = client_loop();
        source.push(Ok(listing()));
        source.push(Ok(json!([{"port": 1}])));

        poll.refresh().await;
        assert_eq!(poll.refresh().await, CycleOutcome::Failed);
        let state = poll.state();
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.error.unwrap().message, "Invalid data from server");
    }

    #[tokio::test]
    async fn test_success_clears_error() {
        let (poll, source) = client_loop();
        source.push(Err(Error::Transport("down".into())));
        source.push(Ok(listing()));

        poll.refresh().await;
        assert!(poll.state().error.is_some());
        poll.refresh().await;
        assert!(poll.state().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_request_times_out() {
        let (poll, source) = client_loop();
        source.push_delayed(Duration::from_secs(60), Ok(listing()));

        assert_eq!(poll.refresh().await, CycleOutcome::Failed);
        let detail = poll.state().error.unwrap().detail;
        assert!(detail.contains("timed out"), "{detail}");
    }

    #[tokio::test]
    async fn test_server_mode_sends_query_and_keeps_meta() {
        let (poll, source) = server_loop();
        source.push(Ok(json!({
            "data": [{"port": 80, "status": "LISTEN"}],
            "total": 1, "page": 1, "page_size": 20
        })));

        assert_eq!(poll.refresh().await, CycleOutcome::Replaced);
        assert_eq!(
            source.queries.lock().as_slice(),
            &[Some(ListQuery::default())]
        );
        assert_eq!(
            poll.state().meta,
            Some(PageMeta {
                total: 1,
                page: 1,
                page_size: 20
            })
        );
    }

    #[tokio::test]
    async fn test_server_mode_inconsistent_meta_fails() {
        let (poll, source) = server_loop();
        source.push(Ok(json!({
            "data": [{"port": 80, "status": "LISTEN"}, {"port": 81, "status": "LISTEN"}],
            "total": 1, "page": 1, "page_size": 20
        })));

        assert_eq!(poll.refresh().await, CycleOutcome::Failed);
        assert!(poll.state().error.unwrap().detail.contains("exceed total"));
    }

    #[tokio::test]
    async fn test_server_mode_out_of_range_reissues() {
        let (poll, source) = server_loop();
        poll.set_page(4);
        source.push(Ok(json!({"data": [], "total": 45, "page": 4, "page_size": 20})));

        assert_eq!(poll.refresh().await, CycleOutcome::Reissue);
        assert_eq!(poll.page_request().page, 3);
        // Nothing stale was rendered.
        assert_eq!(poll.state().revision, 0);
    }

    #[tokio::test]
    async fn test_server_mode_emptied_listing_returns_to_first_page() {
        let (poll, source) = server_loop();
        poll.set_page(3);
        source.push(Ok(json!({"data": [], "total": 0, "page": 3, "page_size": 20})));
        source.push(Ok(json!({"data": [], "total": 0, "page": 1, "page_size": 20})));

        assert_eq!(poll.refresh().await, CycleOutcome::Reissue);
        assert_eq!(poll.page_request().page, 1);

        assert_eq!(poll.refresh().await, CycleOutcome::Replaced);
        let view = poll.view();
        assert_eq!(view.page, 1);
        assert_eq!(view.total, 0);
        assert!(view.rows.is_empty());
    }

    #[tokio::test]
    async fn test_reissue_clamps_with_requested_page_size() {
        let (poll, source) = server_loop();
        poll.set_page_size(10);
        poll.set_page(5);
        // 30 items end at page 3 of 10, not page 2 of the server's 20.
        source.push(Ok(json!({"data": [], "total": 30, "page": 5, "page_size": 20})));

        assert_eq!(poll.refresh().await, CycleOutcome::Reissue);
        assert_eq!(poll.page_request(), PageRequest::new(3, 10));
    }

    #[tokio::test]
    async fn test_server_ignoring_clamp_is_inconsistent() {
        let (poll, source) = server_loop();
        source.push(Ok(json!({"data": [], "total": 45, "page": 4, "page_size": 20})));

        // Requested page 1, server claims page 4: clamping cannot help.
        assert_eq!(poll.refresh().await, CycleOutcome::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let (poll, source) = server_loop();
        source.push_delayed(
            Duration::from_secs(5),
            Ok(json!({"data": [{"port": 1, "status": "LISTEN"}], "total": 1})),
        );

        let (outcome, needs_fetch) = tokio::join!(poll.refresh(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            poll.set_sort(SortSpec::descending(SortField::Pid))
        });

        assert!(needs_fetch);
        assert_eq!(outcome, CycleOutcome::Discarded);
        assert!(poll.state().records.is_empty());
    }

    #[tokio::test]
    async fn test_parameter_changes_reset_page() {
        let (poll, _) = server_loop();
        assert!(poll.set_page(3));
        assert!(poll.set_sort(SortSpec::new(SortField::User, SortDirection::Descending)));
        assert_eq!(poll.page_request().page, 1);

        poll.set_page(2);
        assert!(poll.set_page_size(50));
        assert_eq!(poll.page_request(), PageRequest::new(1, 50));

        // Same parameters again: nothing to refetch.
        assert!(!poll.set_page_size(50));
    }

    #[tokio::test]
    async fn test_client_mode_changes_need_no_fetch() {
        let (poll, _) = client_loop();
        assert!(!poll.set_sort(SortSpec::descending(SortField::Port)));
        assert!(!poll.set_page(2));
        assert_eq!(poll.page_request().page, 2);
    }

    #[tokio::test]
    async fn test_fetch_detail() {
        let (poll, source) = client_loop();
        source.set_detail(json!({"port": 6379, "status": "LISTEN", "process": "redis-server"}));

        let record = poll.fetch_detail(6379).await.unwrap();
        assert_eq!(record.recognized().map(|r| r.label), Some("Redis"));
        assert_eq!(poll.state().phase, Phase::Idle);

        source.set_detail(json!({"port": 6379}));
        assert!(matches!(
            poll.fetch_detail(6379).await,
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
