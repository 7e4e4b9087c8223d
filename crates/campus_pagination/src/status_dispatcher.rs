use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    fetch_error::FetchError,
    page_fetcher::ListScope,
    request_pacer::{PacingPolicy, RequestPacer},
    session::SessionAccessor,
};

/// Body of `PATCH /<collection>/<id>/status`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub is_active: bool,
    pub updated_by: String,
}

/// `id` is sent as a single path segment.
#[async_trait]
pub trait StatusSender: Send + Sync {
    async fn send_status(
        &self,
        scope: &ListScope,
        id: &str,
        update: &StatusUpdate,
    ) -> Result<(), FetchError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum StatusError {
    #[error("No signed-in user to attribute the status change to")]
    NoSession,

    #[error("Invalid id {0:?}")]
    InvalidId(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

// Blank ids and dot segments would address the collection itself or its parent.
fn check_id(id: &str) -> Result<(), StatusError> {
    match id.trim() {
        "" | "." | ".." => Err(StatusError::InvalidId(id.to_string())),
        _ => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct BulkStatusReport {
    pub updated: Vec<String>,
    pub failed: Vec<(String, FetchError)>,
}

impl BulkStatusReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Activates or deactivates entities on behalf of the current user.
pub struct StatusDispatcher<S, A> {
    sender: S,
    session: A,
    pacer: RequestPacer,
}

impl<S, A> StatusDispatcher<S, A>
where
    S: StatusSender,
    A: SessionAccessor,
{
    pub fn new(sender: S, session: A, pacing: PacingPolicy) -> Self {
        StatusDispatcher {
            sender,
            session,
            pacer: RequestPacer::new(pacing),
        }
    }

    fn status_update(&self, is_active: bool) -> Result<StatusUpdate, StatusError> {
        let updated_by = self
            .session
            .current_user_id()
            .ok_or(StatusError::NoSession)?;

        Ok(StatusUpdate {
            is_active,
            updated_by,
        })
    }

    pub async fn set_status(
        &self,
        scope: &ListScope,
        id: &str,
        is_active: bool,
    ) -> Result<(), StatusError> {
        check_id(id)?;
        let update = self.status_update(is_active)?;
        self.sender.send_status(scope, id, &update).await?;

        info!("{} {} set to active={}", scope.collection, id, is_active);
        Ok(())
    }

    /// Sends one request per id, sequentially and paced. A failing id is
    /// recorded and the remaining ids are still sent.
    pub async fn set_status_bulk(
        &self,
        scope: &ListScope,
        ids: &[String],
        is_active: bool,
    ) -> Result<BulkStatusReport, StatusError> {
        for id in ids {
            check_id(id)?;
        }
        let update = self.status_update(is_active)?;
        let mut report = BulkStatusReport::default();

        for (index, id) in ids.iter().enumerate() {
            self.pacer.before_request(index).await;

            match self.sender.send_status(scope, id, &update).await {
                Ok(()) => report.updated.push(id.clone()),
                Err(err) => {
                    warn!("Status update for {} {} failed: {}", scope.collection, id, err);
                    report.failed.push((id.clone(), err));
                }
            }
        }

        info!(
            "Bulk status update on {}: {} updated, {} failed",
            scope.collection,
            report.updated.len(),
            report.failed.len()
        );

        Ok(report)
    }
}
