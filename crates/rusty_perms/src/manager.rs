//! Permission subsystem entry point
//!
//! [`PermissionManager`] is constructed once at application start and shared by
//! reference with every caller. It owns the collaborators of the authorization
//! engine and runs the batch request flow:
//!
//! ```text
//! request_permissions(names, destination)
//!   │
//!   ├─ classify every name ──────────────── UnknownPermission → destination
//!   ├─ partition into settled / to_prompt
//!   ├─ check to_prompt version windows ──── VersionUnsupported → destination
//!   ├─ nothing to prompt ────────────────── settled map → destination
//!   │
//!   ├─ tracker.begin(destination) → id
//!   ├─ merge settled, set requested flags
//!   └─ host.prompt_for(ids, id)
//!
//! on_request_permission_result(id, platform_ids, granted)
//!   ├─ map ids back, apply version remap, derive statuses
//!   └─ tracker.finalize(id) ─────────────── full map → destination
//! ```
//!
//! Every call delivers exactly one reply to its destination, success or error.
//!
//! # Example
//!
//! ```
//! use rusty_perms::prelude::*;
//! use std::sync::Arc;
//!
//! struct AllGranted;
//!
//! impl HostPermissions for AllGranted {
//!     fn currently_granted(&self, _platform_id: &str) -> bool {
//!         true
//!     }
//!
//!     fn would_show_rationale(&self, _platform_id: &str) -> bool {
//!         false
//!     }
//!
//!     fn prompt_for(
//!         &self,
//!         _platform_ids: &[&'static str],
//!         _request_id: RequestId,
//!     ) -> Result<(), PermissionError> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), PermissionError> {
//! let versions = Versions { runtime: 33, target: 34, minimum: 23 };
//! let manager = PermissionManager::new(
//!     PermissionOptions::default(),
//!     Arc::new(AllGranted),
//!     Arc::new(versions),
//! )?;
//!
//! let statuses = manager.request(&["CAMERA"]).await?;
//! assert_eq!(statuses[&Permission::Camera], AuthorizationStatus::Granted);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use crate::action::Action;
use crate::catalog::Permission;
use crate::classifier::{denied_status, StatusClassifier};
use crate::error::PermissionError;
use crate::host::{BridgeProfile, HostPermissions};
use crate::options::PermissionOptions;
use crate::status::{AuthorizationStatus, Reply, StatusMap};
use crate::store::{FileFlagStore, FlagStore, MemoryFlagStore};
use crate::tracker::{Delivery, RequestId, RequestTracker, ResponseDestination};
use crate::version::{BuildOsVersion, DeviceOsVersion, VersionSource};

/// What happened to a call by the time it returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The reply was already delivered
    Completed,
    /// An error was already delivered
    Failed,
    /// A prompt was issued; the reply follows the completion callback for this id
    Pending(RequestId),
}

impl Dispatch {
    /// The pending request id, if a prompt was issued
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Dispatch::Pending(id) => Some(*id),
            _ => None,
        }
    }
}

/// A classified batch split by whether the user must be asked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    /// Permissions returned as classified, without prompting
    pub settled: StatusMap,
    /// Permissions to present to the user, in catalog order
    pub to_prompt: Vec<Permission>,
}

impl BatchPlan {
    /// Split classified statuses into settled and to-prompt
    ///
    /// `GRANTED` is always settled. `NOT_REQUESTED` is always prompted. Denied
    /// statuses are prompted again when `reprompt_denied` is set.
    pub fn partition(statuses: StatusMap, reprompt_denied: bool) -> Self {
        let mut plan = BatchPlan::default();
        for (permission, status) in statuses {
            let prompt = if status.is_granted() {
                false
            } else if status.is_denied() {
                reprompt_denied
            } else {
                true
            };
            if prompt {
                plan.to_prompt.push(permission);
            } else {
                plan.settled.insert(permission, status);
            }
        }
        plan
    }
}

/// The runtime permission subsystem
pub struct PermissionManager {
    host: Arc<dyn HostPermissions>,
    store: Arc<dyn FlagStore>,
    versions: Arc<dyn VersionSource>,
    classifier: StatusClassifier,
    tracker: RequestTracker,
    bridge: BridgeProfile,
    options: PermissionOptions,
}

impl PermissionManager {
    /// Create the subsystem from options
    ///
    /// Opens a [`FileFlagStore`] when `options.flag_store_path` is set, otherwise
    /// keeps flags in a [`MemoryFlagStore`]. A flag file with corrupt contents
    /// is logged and treated as empty.
    ///
    /// # Returns
    ///
    /// * `Ok(PermissionManager)` - Ready to serve requests
    /// * `Err(PermissionError::FlagStore)` - The flag file exists but could not be read
    pub fn new(
        options: PermissionOptions,
        host: Arc<dyn HostPermissions>,
        versions: Arc<dyn VersionSource>,
    ) -> Result<Self, PermissionError> {
        let store: Arc<dyn FlagStore> = match &options.flag_store_path {
            Some(path) => Arc::new(
                FileFlagStore::open(path).map_err(|e| PermissionError::FlagStore(e.to_string()))?,
            ),
            None => Arc::new(MemoryFlagStore::new()),
        };
        Ok(Self::with_store(options, host, store, versions))
    }

    /// Create the subsystem with a caller-supplied flag store
    ///
    /// `options.flag_store_path` is ignored.
    pub fn with_store(
        options: PermissionOptions,
        host: Arc<dyn HostPermissions>,
        store: Arc<dyn FlagStore>,
        versions: Arc<dyn VersionSource>,
    ) -> Self {
        let bridge = match &options.bridge_version {
            Some(version) => BridgeProfile::for_version(version.clone()),
            None => BridgeProfile::Modern,
        };
        let host = bridge.wrap(host);
        let classifier = StatusClassifier::new(host.clone(), store.clone(), versions.clone());

        info!(
            "Permission subsystem ready (bridge: {:?}, reprompt_denied: {})",
            bridge, options.reprompt_denied
        );

        Self {
            host,
            store,
            versions,
            classifier,
            tracker: RequestTracker::new(),
            bridge,
            options,
        }
    }

    /// Options the subsystem was built with
    pub fn options(&self) -> &PermissionOptions {
        &self.options
    }

    /// Negotiated host bridge profile
    pub fn bridge(&self) -> &BridgeProfile {
        &self.bridge
    }

    /// Number of prompts awaiting their completion callback
    pub async fn pending_requests(&self) -> usize {
        self.tracker.len().await
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Current status of one permission, without prompting
    pub fn authorization_status(&self, name: &str) -> Result<AuthorizationStatus, PermissionError> {
        self.classifier.classify_name(name)
    }

    /// Current statuses of several permissions, without prompting
    ///
    /// Fails on the first unknown name with no partial result.
    pub fn authorization_statuses<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<StatusMap, PermissionError> {
        self.classifier.classify_all(names)
    }

    /// Description of the device's runtime platform version
    pub fn device_os_version(&self) -> DeviceOsVersion {
        self.versions.snapshot().device_os()
    }

    /// Description of the platform versions the app was built against
    pub fn build_os_version(&self) -> BuildOsVersion {
        self.versions.snapshot().build_os()
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Classify and partition a batch, enforcing version windows on what must be prompted
    ///
    /// Performs no writes and issues no prompt.
    pub fn plan<S: AsRef<str>>(&self, names: &[S]) -> Result<BatchPlan, PermissionError> {
        let statuses = self.classifier.classify_all(names)?;
        let plan = BatchPlan::partition(statuses, self.options.reprompt_denied);

        let runtime = self.versions.device_runtime_version();
        if let Some(permission) = plan
            .to_prompt
            .iter()
            .find(|permission| !permission.supports_runtime(runtime))
        {
            return Err(PermissionError::VersionUnsupported {
                permission: permission.name().to_string(),
                device_version: runtime,
                min_version: permission.min_version(),
                max_version: permission.max_version(),
            });
        }

        Ok(plan)
    }

    /// Request a batch of permissions, prompting for those that need it
    ///
    /// The reply is a [`Reply::Statuses`] map covering every requested
    /// permission. It is delivered before this returns unless the result is
    /// [`Dispatch::Pending`], in which case it follows the host's completion
    /// callback.
    pub async fn request_permissions<S: AsRef<str>>(
        &self,
        names: &[S],
        destination: Box<dyn ResponseDestination>,
    ) -> Dispatch {
        let plan = match self.plan(names) {
            Ok(plan) => plan,
            Err(e) => {
                debug!("Rejecting permission batch: {}", e);
                destination.deliver(Err(e));
                return Dispatch::Failed;
            }
        };

        if plan.to_prompt.is_empty() {
            debug!("Nothing to prompt; returning {} settled statuses", plan.settled.len());
            destination.deliver(Ok(Reply::Statuses(plan.settled)));
            return Dispatch::Completed;
        }

        let id = self.tracker.begin(destination).await;
        match self.issue_prompt(id, plan).await {
            Ok(()) => Dispatch::Pending(id),
            Err(e) => {
                self.tracker.fail(id, e, None).await;
                Dispatch::Failed
            }
        }
    }

    async fn issue_prompt(&self, id: RequestId, plan: BatchPlan) -> Result<(), PermissionError> {
        for (permission, status) in plan.settled {
            self.tracker.record_settled(id, permission, status).await?;
        }

        for &permission in &plan.to_prompt {
            if let Err(e) = self.store.set_requested(permission).await {
                let error = PermissionError::PersistenceWrite {
                    permission: permission.name().to_string(),
                    reason: e.to_string(),
                };
                warn!("{}", error);
            }
        }

        let platform_ids: Vec<&'static str> = plan
            .to_prompt
            .iter()
            .map(|permission| permission.platform_id())
            .collect();
        debug!(
            "Requesting runtime permissions id={}: {:?}",
            id, platform_ids
        );
        self.host.prompt_for(&platform_ids, id)
    }

    /// Request one permission
    ///
    /// Behaves like a one-element batch, but the reply is a bare
    /// [`Reply::Status`].
    pub async fn request_runtime_permission(
        &self,
        name: &str,
        destination: Box<dyn ResponseDestination>,
    ) -> Dispatch {
        let permission = match Permission::resolve(name) {
            Ok(permission) => permission,
            Err(e) => {
                destination.deliver(Err(e));
                return Dispatch::Failed;
            }
        };
        let destination = Box::new(SingleStatus {
            permission,
            inner: destination,
        });
        self.request_permissions(&[permission.name()], destination)
            .await
    }

    /// Request microphone access (`RECORD_AUDIO`)
    pub async fn request_microphone_authorization(
        &self,
        destination: Box<dyn ResponseDestination>,
    ) -> Dispatch {
        self.request_runtime_permission(Permission::RecordAudio.name(), destination)
            .await
    }

    /// Request a batch and wait for its status map
    ///
    /// If a prompt is issued, this waits until the host's completion callback
    /// reaches [`on_request_permission_result`](Self::on_request_permission_result)
    /// from another task.
    pub async fn request<S: AsRef<str>>(&self, names: &[S]) -> Result<StatusMap, PermissionError> {
        let (tx, rx) = oneshot::channel::<Delivery>();
        self.request_permissions(names, Box::new(tx)).await;
        match rx.await.map_err(|_| PermissionError::ChannelClosed)?? {
            Reply::Statuses(statuses) => Ok(statuses),
            other => Err(PermissionError::HostContract(format!(
                "expected a status map, got {:?}",
                other
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------

    /// Reconcile the host's dialog result for `request_id`
    ///
    /// `platform_ids` and `granted` are parallel. On success the pending request
    /// is finalized and its destination receives the full status map. On
    /// failure the destination receives the error instead; either way the
    /// pending entry is released.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Reply delivered
    /// * `Err(PermissionError::RequestNotFound)` - Stray or duplicate callback, dropped
    /// * `Err(PermissionError::HostContract)` - Array lengths differ
    /// * `Err(PermissionError::UnknownPermission)` - A platform id is not in the catalog
    pub async fn on_request_permission_result<S: AsRef<str>>(
        &self,
        request_id: RequestId,
        platform_ids: &[S],
        granted: &[bool],
    ) -> Result<(), PermissionError> {
        if !self.tracker.contains(request_id).await {
            let error = PermissionError::RequestNotFound {
                request_id: request_id.get(),
            };
            warn!("Dropping permission result: {}", error);
            return Err(error);
        }

        debug!(
            "Received runtime permission result id={} ({} permissions)",
            request_id,
            platform_ids.len()
        );

        match self.reconcile(request_id, platform_ids, granted).await {
            Ok(()) => {
                if self.tracker.finalize(request_id).await {
                    Ok(())
                } else {
                    let error = PermissionError::RequestNotFound {
                        request_id: request_id.get(),
                    };
                    warn!("Dropping duplicate permission result: {}", error);
                    Err(error)
                }
            }
            Err(e) => {
                self.tracker.fail(request_id, e.clone(), None).await;
                Err(e)
            }
        }
    }

    async fn reconcile<S: AsRef<str>>(
        &self,
        request_id: RequestId,
        platform_ids: &[S],
        granted: &[bool],
    ) -> Result<(), PermissionError> {
        if platform_ids.len() != granted.len() {
            return Err(PermissionError::HostContract(format!(
                "{} permission ids but {} grant results",
                platform_ids.len(),
                granted.len()
            )));
        }

        let runtime = self.versions.device_runtime_version();
        for (platform_id, &was_granted) in platform_ids.iter().zip(granted) {
            let platform_id = platform_id.as_ref();
            let prompted = Permission::from_platform_id(platform_id)
                .ok_or_else(|| PermissionError::unknown(platform_id))?;
            let permission = prompted.attributed_on(runtime);

            let status = if was_granted {
                AuthorizationStatus::Granted
            } else {
                denied_status(
                    self.host.would_show_rationale(platform_id),
                    self.store.was_requested(prompted) || self.store.was_requested(permission),
                )
            };
            trace!(
                "Result for {} attributed to {}: {}",
                prompted,
                permission,
                status
            );
            self.tracker
                .record_settled(request_id, permission, status)
                .await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Run a typed bridge action, delivering exactly one reply
    pub async fn execute(
        &self,
        action: Action,
        destination: Box<dyn ResponseDestination>,
    ) -> Dispatch {
        debug!("Executing action {}", action.name());
        match action {
            Action::GetPermissionAuthorizationStatus { permission } => deliver_now(
                destination,
                self.authorization_status(&permission).map(Reply::Status),
            ),
            Action::GetPermissionsAuthorizationStatus { permissions } => deliver_now(
                destination,
                self.authorization_statuses(permissions.as_slice())
                    .map(Reply::Statuses),
            ),
            Action::RequestRuntimePermission { permission } => {
                self.request_runtime_permission(&permission, destination)
                    .await
            }
            Action::RequestRuntimePermissions { permissions } => {
                self.request_permissions(permissions.as_slice(), destination)
                    .await
            }
            Action::RequestMicrophoneAuthorization => {
                self.request_microphone_authorization(destination).await
            }
            Action::GetDeviceOsVersion => deliver_now(
                destination,
                Ok(Reply::DeviceOsVersion(self.device_os_version())),
            ),
            Action::GetBuildOsVersion => deliver_now(
                destination,
                Ok(Reply::BuildOsVersion(self.build_os_version())),
            ),
        }
    }

    /// Parse and run a raw bridge action
    ///
    /// A malformed action is delivered as [`PermissionError::InvalidAction`].
    pub async fn handle_action(
        &self,
        name: &str,
        args: &serde_json::Value,
        destination: Box<dyn ResponseDestination>,
    ) -> Dispatch {
        match Action::parse(name, args) {
            Ok(action) => self.execute(action, destination).await,
            Err(e) => {
                warn!("{}", e);
                destination.deliver(Err(e));
                Dispatch::Failed
            }
        }
    }
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager")
            .field("bridge", &self.bridge)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn deliver_now(destination: Box<dyn ResponseDestination>, outcome: Delivery) -> Dispatch {
    let dispatch = if outcome.is_ok() {
        Dispatch::Completed
    } else {
        Dispatch::Failed
    };
    destination.deliver(outcome);
    dispatch
}

/// Narrows a one-element batch reply to a bare status
struct SingleStatus {
    permission: Permission,
    inner: Box<dyn ResponseDestination>,
}

impl ResponseDestination for SingleStatus {
    fn deliver(self: Box<Self>, outcome: Delivery) {
        let SingleStatus { permission, inner } = *self;
        let outcome = outcome.and_then(|reply| match reply {
            Reply::Statuses(statuses) => statuses
                .get(&permission)
                .copied()
                .or_else(|| match statuses.len() {
                    // attributed to another permission by the version remap
                    1 => statuses.values().next().copied(),
                    _ => None,
                })
                .map(Reply::Status)
                .ok_or_else(|| {
                    PermissionError::HostContract(format!("no result for {}", permission))
                }),
            other => Ok(other),
        });
        inner.deliver(outcome);
    }
}
