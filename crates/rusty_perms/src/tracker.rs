//! Pending permission request tracking
//!
//! This module manages the lifecycle of in-flight batch permission requests,
//! tracking each by a [`RequestId`] and routing the final status map back to
//! the caller's [`ResponseDestination`] once the platform dialog completes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   begin()   │ → Allocate id, store destination + empty partial map
//! └──────┬──────┘
//!        │
//!        ├─ record_settled(): merge one status into the partial map
//!        │
//!        ↓
//! ┌──────────────────┐
//! │ finalize()/fail()│ → Remove entry, deliver map or error
//! └──────────────────┘
//! ```
//!
//! Identifiers come from a monotonically increasing counter. When the counter
//! wraps, ids still pending are skipped, so two live requests never share an id.
//!
//! # Example
//!
//! ```
//! use rusty_perms::catalog::Permission;
//! use rusty_perms::status::AuthorizationStatus;
//! use rusty_perms::tracker::{Delivery, RequestTracker};
//! use tokio::sync::oneshot;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let tracker = RequestTracker::new();
//!
//! let (tx, rx) = oneshot::channel::<Delivery>();
//! let id = tracker.begin(Box::new(tx)).await;
//!
//! // ... platform dialog runs ...
//!
//! tracker
//!     .record_settled(id, Permission::Camera, AuthorizationStatus::Granted)
//!     .await
//!     .unwrap();
//! tracker.finalize(id).await;
//!
//! let reply = rx.await.unwrap().unwrap();
//! assert_eq!(
//!     reply.statuses().unwrap()[&Permission::Camera],
//!     AuthorizationStatus::Granted
//! );
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, warn};

use crate::catalog::Permission;
use crate::error::PermissionError;
use crate::status::{AuthorizationStatus, Reply, StatusMap};

/// Outcome delivered to a response destination
pub type Delivery = Result<Reply, PermissionError>;

/// Identifier of one pending batch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u32);

impl RequestId {
    /// Wrap a raw identifier
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw identifier, as handed to the host platform
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the reply to one call goes
///
/// Supplied by the caller and consumed by exactly one delivery.
pub trait ResponseDestination: Send + 'static {
    /// Hand over the outcome
    fn deliver(self: Box<Self>, outcome: Delivery);
}

impl ResponseDestination for oneshot::Sender<Delivery> {
    fn deliver(self: Box<Self>, outcome: Delivery) {
        if self.send(outcome).is_err() {
            error!("Response receiver dropped before delivery");
        }
    }
}

/// Destination backed by a closure
pub struct FnDestination<F>(F);

impl<F> ResponseDestination for FnDestination<F>
where
    F: FnOnce(Delivery) + Send + 'static,
{
    fn deliver(self: Box<Self>, outcome: Delivery) {
        (self.0)(outcome)
    }
}

/// Box a closure as a [`ResponseDestination`]
pub fn destination_fn<F>(f: F) -> Box<dyn ResponseDestination>
where
    F: FnOnce(Delivery) + Send + 'static,
{
    Box::new(FnDestination(f))
}

struct PendingRequest {
    destination: Box<dyn ResponseDestination>,
    statuses: StatusMap,
}

struct TrackerState {
    pending: HashMap<RequestId, PendingRequest>,
    last_id: u32,
}

impl TrackerState {
    fn next_id(&mut self) -> RequestId {
        loop {
            self.last_id = self.last_id.checked_add(1).unwrap_or(1);
            let id = RequestId(self.last_id);
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Tracks pending permission requests awaiting platform results
///
/// Cloning shares the same pending table.
///
/// # Thread Safety
///
/// The table is protected by a Tokio Mutex. Destinations are invoked after the
/// lock is released.
#[derive(Clone)]
pub struct RequestTracker {
    inner: Arc<Mutex<TrackerState>>,
}

impl RequestTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerState {
                pending: HashMap::new(),
                last_id: 0,
            })),
        }
    }

    /// Start tracking a request
    ///
    /// Allocates an id unique among pending requests and stores `destination`
    /// alongside an empty partial result map.
    pub async fn begin(&self, destination: Box<dyn ResponseDestination>) -> RequestId {
        let mut state = self.inner.lock().await;
        let id = state.next_id();
        state.pending.insert(
            id,
            PendingRequest {
                destination,
                statuses: StatusMap::new(),
            },
        );
        debug!("Tracking permission request id={}", id);
        id
    }

    /// Merge one resolved permission into the pending batch
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Status recorded
    /// - `Err(PermissionError::RequestNotFound)` - No pending request with this id
    pub async fn record_settled(
        &self,
        id: RequestId,
        permission: Permission,
        status: AuthorizationStatus,
    ) -> Result<(), PermissionError> {
        let mut state = self.inner.lock().await;
        let request = state
            .pending
            .get_mut(&id)
            .ok_or(PermissionError::RequestNotFound { request_id: id.get() })?;
        request.statuses.insert(permission, status);
        Ok(())
    }

    /// Deliver the accumulated map and discard the entry
    ///
    /// Finalizing an id that is no longer pending is a no-op.
    ///
    /// # Returns
    ///
    /// * `true` - The map was handed to the destination
    /// * `false` - No pending request with this id
    pub async fn finalize(&self, id: RequestId) -> bool {
        let removed = self.inner.lock().await.pending.remove(&id);
        match removed {
            Some(request) => {
                debug!("Sending runtime request result for id={}", id);
                request.destination.deliver(Ok(Reply::Statuses(request.statuses)));
                true
            }
            None => false,
        }
    }

    /// Deliver `error` and discard the entry, resolved or not
    ///
    /// The pending entry's destination is preferred. If the id is not pending,
    /// the error goes to `fallback` instead, when one is given.
    pub async fn fail(
        &self,
        id: RequestId,
        error: PermissionError,
        fallback: Option<Box<dyn ResponseDestination>>,
    ) {
        let removed = self.inner.lock().await.pending.remove(&id);
        warn!("Permission request id={} failed: {}", id, error);
        match (removed, fallback) {
            (Some(request), _) => request.destination.deliver(Err(error)),
            (None, Some(fallback)) => fallback.deliver(Err(error)),
            (None, None) => debug!("No destination for failed request id={}", id),
        }
    }

    /// Whether `id` is pending
    pub async fn contains(&self, id: RequestId) -> bool {
        self.inner.lock().await.pending.contains_key(&id)
    }

    /// Number of pending requests
    pub async fn len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    /// Whether nothing is pending
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn set_last_id(&self, last_id: u32) {
        self.inner.lock().await.last_id = last_id;
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
