//! Per-view request sequencing with a stale-response guard.
//!
//! A view owns one [`ViewController`]. Every trigger gets the next request id
//! and moves the view to `Loading` before any network work starts; a result is
//! only written back if its request id is still the latest one issued.
//! Superseded calls are left to finish and their results are dropped.

use std::{future::Future, sync::Arc};

use shared::{domain::VerificationQuery, error::VerificationError, protocol::VerificationResult};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::VerificationApi;

pub const GENERIC_FAILURE_MESSAGE: &str = "Error fetching news. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRequest {
    LoadAll,
    Check(VerificationQuery),
}

impl ViewRequest {
    fn name(&self) -> &'static str {
        match self {
            ViewRequest::LoadAll => "load_all",
            ViewRequest::Check(VerificationQuery::Text(_)) => "check_text",
            ViewRequest::Check(VerificationQuery::Document(_)) => "check_document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Succeeded(VerificationResult),
    Failed(VerificationError),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RequestState::Failed(_))
    }

    /// Text shown to the user for a failed request. Transport and shape
    /// failures are deliberately not distinguished here.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            RequestState::Failed(_) => Some(GENERIC_FAILURE_MESSAGE),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSnapshot {
    /// Id of the request that produced `state`; `0` before the first trigger.
    pub request_id: u64,
    pub state: RequestState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied { request_id: u64 },
    Discarded { request_id: u64, superseded_by: u64 },
}

impl Completion {
    pub fn request_id(&self) -> u64 {
        match self {
            Completion::Applied { request_id } | Completion::Discarded { request_id, .. } => {
                *request_id
            }
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, Completion::Applied { .. })
    }
}

pub struct ViewController<A: VerificationApi> {
    api: Arc<A>,
    slot: Arc<watch::Sender<ViewSnapshot>>,
}

impl<A: VerificationApi> Clone for ViewController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<A: VerificationApi + 'static> ViewController<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (slot, _initial_rx) = watch::channel(ViewSnapshot::default());
        Self {
            api,
            slot: Arc::new(slot),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.slot.borrow().clone()
    }

    pub fn state(&self) -> RequestState {
        self.slot.borrow().state.clone()
    }

    pub fn latest_request_id(&self) -> u64 {
        self.slot.borrow().request_id
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.slot.subscribe()
    }

    /// Starts a request. The view is `Loading` for the new request id by the
    /// time this returns; the returned future performs the call and applies
    /// its result if nothing newer has been triggered meanwhile.
    pub fn dispatch(
        &self,
        request: ViewRequest,
    ) -> impl Future<Output = Completion> + Send + 'static {
        let mut request_id = 0;
        self.slot.send_modify(|snapshot| {
            snapshot.request_id += 1;
            request_id = snapshot.request_id;
            snapshot.state = RequestState::Loading;
        });
        debug!(request_id, request = request.name(), "view request started");

        let api = Arc::clone(&self.api);
        let slot = Arc::clone(&self.slot);
        async move {
            let outcome = execute(api.as_ref(), request).await;
            apply_if_current(&slot, request_id, outcome)
        }
    }

    pub fn spawn(&self, request: ViewRequest) -> JoinHandle<Completion> {
        tokio::spawn(self.dispatch(request))
    }

    pub async fn run(&self, request: ViewRequest) -> Completion {
        self.dispatch(request).await
    }
}

async fn execute<A: VerificationApi + ?Sized>(
    api: &A,
    request: ViewRequest,
) -> Result<VerificationResult, VerificationError> {
    match request {
        ViewRequest::LoadAll => api.fetch_all().await.map(VerificationResult::ArticleList),
        ViewRequest::Check(query) => api.check(query).await.map(VerificationResult::CheckOutcome),
    }
}

fn apply_if_current(
    slot: &watch::Sender<ViewSnapshot>,
    request_id: u64,
    outcome: Result<VerificationResult, VerificationError>,
) -> Completion {
    if let Err(err) = &outcome {
        warn!(
            request_id,
            kind = ?err.kind(),
            status = ?err.status(),
            error = %err,
            "view request failed"
        );
    }

    let mut latest = request_id;
    // Compare and write under the channel's lock so a trigger cannot slip in
    // between the check and the update.
    let applied = slot.send_if_modified(|snapshot| {
        if snapshot.request_id != request_id {
            latest = snapshot.request_id;
            return false;
        }
        snapshot.state = match outcome {
            Ok(result) => RequestState::Succeeded(result),
            Err(err) => RequestState::Failed(err),
        };
        true
    });

    if applied {
        info!(request_id, "view request completed");
        Completion::Applied { request_id }
    } else {
        debug!(request_id, superseded_by = latest, "discarding stale response");
        Completion::Discarded {
            request_id,
            superseded_by: latest,
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
