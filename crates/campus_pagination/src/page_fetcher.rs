use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    collection::Collection, fetch_error::FetchError, managed_context::ManagedContext,
    page_request::PageRequest, page_response::PageResponse,
};

/// Which collection to read, as seen from which managed school/branch/course.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListScope {
    pub collection: Collection,
    #[serde(default)]
    pub context: ManagedContext,
}

impl ListScope {
    pub fn new(collection: Collection) -> Self {
        ListScope {
            collection,
            context: ManagedContext::default(),
        }
    }

    pub fn with_context(mut self, context: ManagedContext) -> Self {
        self.context = context;
        self
    }
}

/// Performs exactly one network call per page. Never retries.
#[async_trait]
pub trait PageFetcher<T: Send>: Send + Sync {
    async fn fetch_page(
        &self,
        scope: &ListScope,
        request: &PageRequest,
    ) -> Result<PageResponse<T>, FetchError>;
}
