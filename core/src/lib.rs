//! servicedash Core Library
//!
//! Client-side engine for a local services dashboard. Provides functionality to:
//! - Validate service records received from a local HTTP endpoint
//! - Recognize well-known services (Docker, Redis, PostgreSQL, ...)
//! - Sort and paginate listings locally, or delegate both to the server
//! - Poll the endpoint on a timer while keeping the last good data on failure
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Poll loop and derived view
//! - `engine`: Background polling task and its lifecycle

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    classify, page_count, paginate, sort_services, validate_list, validate_one, validate_page,
    PageEnvelope, PageMeta, PageRequest, PageResult, RecognitionRule, ServiceRecord,
    SortDirection, SortField, SortSpec, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES,
    RECOGNIZED_SERVICES,
};

// Re-export other commonly used types
pub use adapters::HttpServiceSource;
pub use application::{
    CycleOutcome, DashboardView, ErrorStatus, PagingMode, Phase, PollLoop, PollOptions,
    PollState, ServiceRow,
};
pub use config::{Config, ConfigKey, ConfigStore};
pub use engine::DashboardEngine;
pub use error::{Error, Result};
pub use ports::{ListQuery, ServiceSource};
