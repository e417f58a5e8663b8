//! Derived, display-ready view of the poll loop's held state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::poll_loop::{ErrorStatus, PagingMode, Phase, PollLoop};
use crate::domain::{
    page_count, paginate, sort_services, PageRequest, RecognitionRule, ServiceRecord, SortSpec,
};
use crate::ports::ServiceSource;

/// One displayed row: a record and the rule it was recognized by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRow {
    #[serde(flatten)]
    pub record: ServiceRecord,
    pub recognized: Option<&'static RecognitionRule>,
}

impl ServiceRow {
    pub fn new(record: ServiceRecord) -> Self {
        let recognized = record.recognized();
        Self { record, recognized }
    }
}

/// Everything a front-end needs to draw the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub rows: Vec<ServiceRow>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub sort: SortSpec,
    pub mode: PagingMode,
    pub phase: Phase,
    pub error: Option<ErrorStatus>,
    pub revision: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DashboardView {
    /// True until the first cycle has finished.
    pub fn is_loading(&self) -> bool {
        self.updated_at.is_none() && self.error.is_none()
    }
}

impl<S: ServiceSource> PollLoop<S> {
    /// Compute the current view without touching held state.
    ///
    /// Client mode sorts and pages the held listing locally, pulling an
    /// out-of-range page back to the last one. Server mode shows the held
    /// page as delivered.
    pub fn view(&self) -> DashboardView {
        let state = self.state();
        let sort = self.sort();
        let request = self.page_request();

        let (records, total, page, page_size) = match (self.mode(), state.meta) {
            (PagingMode::Client, _) => {
                let sorted = sort_services(&state.records, sort);
                let request = request.clamp(sorted.len());
                let result = paginate(&sorted, request);
                (result.items, result.total, result.page, result.page_size)
            }
            (PagingMode::Server, Some(meta)) => (state.records, meta.total, meta.page, meta.page_size),
            (PagingMode::Server, None) => {
                let PageRequest { page, page_size } = request;
                (state.records, 0, page, page_size)
            }
        };

        DashboardView {
            rows: records.into_iter().map(ServiceRow::new).collect(),
            total,
            page,
            page_size,
            page_count: page_count(total, page_size),
            sort,
            mode: self.mode(),
            phase: state.phase,
            error: state.error,
            revision: state.revision,
            updated_at: state.updated_at,
        }
    }
}
