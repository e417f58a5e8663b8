//! Domain layer - Pure business logic and data models.
//!
//! This module contains the service record model and the algorithms applied
//! to it: validation, recognition, sorting and pagination. Nothing here does
//! I/O, so every piece can be tested in isolation.

mod page;
mod recognition;
mod service;
mod sort;
mod validate;

// Re-export all domain types
pub use page::{
    page_count, paginate, PageMeta, PageRequest, PageResult, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES,
};
pub use recognition::{classify, RecognitionRule, RECOGNIZED_SERVICES};
pub use service::ServiceRecord;
pub use sort::{sort_services, SortDirection, SortField, SortSpec};
pub use validate::{validate_list, validate_one, validate_page, PageEnvelope};
