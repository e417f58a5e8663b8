//! Service source port (interface).

use serde_json::Value;

use crate::domain::{PageRequest, SortSpec};
use crate::error::Result;

/// Sort and page parameters sent to a server that pages on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ListQuery {
    pub sort: SortSpec,
    pub page: PageRequest,
}

impl ListQuery {
    pub fn new(sort: SortSpec, page: PageRequest) -> Self {
        Self { sort, page }
    }

    /// Query-string pairs in the order the services endpoint expects them.
    pub fn to_params(&self) -> [(&'static str, String); 4] {
        [
            ("sort_by", self.sort.field.as_str().to_string()),
            ("sort_order", self.sort.direction.as_str().to_string()),
            ("page", self.page.page.to_string()),
            ("page_size", self.page.page_size.to_string()),
        ]
    }
}

/// Port for reading service data.
///
/// Implementations only transport and decode; they hand back raw JSON and
/// leave shape checking to the domain validator.
pub trait ServiceSource: Send + Sync {
    /// Fetch the service listing.
    ///
    /// With `None` the whole listing is requested as a bare array. With a
    /// query the server is asked for one sorted page wrapped in
    /// `{data, total, page, page_size}`.
    fn fetch_list(
        &self,
        query: Option<&ListQuery>,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;

    /// Fetch a single service by port.
    fn fetch_one(&self, port: u16) -> impl std::future::Future<Output = Result<Value>> + Send;
}
