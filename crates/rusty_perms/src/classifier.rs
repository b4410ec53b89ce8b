//! Authorization status classification
//!
//! Classification maps the host's view of one permission onto the four
//! [`AuthorizationStatus`] values. The rules are evaluated in order and the
//! first match wins:
//!
//! 1. **Granted** - the platform grants the permission outright
//! 2. **Implicitly granted** - the permission's minimum version is newer than the
//!    device but not newer than the app's target, so the device does not enforce it
//! 3. **No rationale** - `DENIED_ALWAYS` if the requested flag is set, otherwise
//!    `NOT_REQUESTED`
//! 4. **Rationale** - `DENIED_ONCE`
//!
//! The pure rule lives in [`classify`]; [`StatusClassifier`] gathers the inputs
//! from the host, the flag store, and the version source.
//!
//! # Example
//!
//! ```
//! use rusty_perms::catalog::Permission;
//! use rusty_perms::classifier::{classify, ClassifyContext};
//! use rusty_perms::status::AuthorizationStatus;
//!
//! let ctx = ClassifyContext {
//!     currently_granted: false,
//!     would_show_rationale: false,
//!     requested_flag: false,
//!     target_version: 33,
//!     runtime_version: 28,
//! };
//!
//! // Device predates activity recognition, app targets it: implicitly granted.
//! assert_eq!(
//!     classify(Permission::ActivityRecognition, &ctx),
//!     AuthorizationStatus::Granted
//! );
//! assert_eq!(classify(Permission::ReadSms, &ctx), AuthorizationStatus::NotRequested);
//! ```

use std::sync::Arc;
use tracing::trace;

use crate::catalog::Permission;
use crate::error::PermissionError;
use crate::host::HostPermissions;
use crate::status::{AuthorizationStatus, StatusMap};
use crate::store::FlagStore;
use crate::version::{VersionSource, Versions};

/// Inputs to a single classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyContext {
    /// Platform reports the permission as granted
    pub currently_granted: bool,
    /// Platform would show a rationale before prompting
    pub would_show_rationale: bool,
    /// Permission was previously presented to the user
    pub requested_flag: bool,
    /// App's declared target platform version
    pub target_version: u32,
    /// Device's runtime platform version
    pub runtime_version: u32,
}

/// Classify one permission
pub fn classify(permission: Permission, ctx: &ClassifyContext) -> AuthorizationStatus {
    if ctx.currently_granted
        || is_implicitly_granted(permission, ctx.target_version, ctx.runtime_version)
    {
        return AuthorizationStatus::Granted;
    }
    denied_status(ctx.would_show_rationale, ctx.requested_flag)
}

/// Whether the device's platform predates a permission the app was built for
pub fn is_implicitly_granted(
    permission: Permission,
    target_version: u32,
    runtime_version: u32,
) -> bool {
    match permission.min_version() {
        Some(min) => min > runtime_version && min <= target_version,
        None => false,
    }
}

/// Status of a permission the platform does not grant
///
/// Shared by classification and by completion handling, where the dialog's
/// deny flag stands in for "not currently granted".
pub fn denied_status(would_show_rationale: bool, requested_flag: bool) -> AuthorizationStatus {
    match (would_show_rationale, requested_flag) {
        (true, _) => AuthorizationStatus::DeniedOnce,
        (false, true) => AuthorizationStatus::DeniedAlways,
        (false, false) => AuthorizationStatus::NotRequested,
    }
}

/// Classifies permissions against live host state
#[derive(Clone)]
pub struct StatusClassifier {
    host: Arc<dyn HostPermissions>,
    store: Arc<dyn FlagStore>,
    versions: Arc<dyn VersionSource>,
}

impl StatusClassifier {
    /// Create a classifier over the given collaborators
    pub fn new(
        host: Arc<dyn HostPermissions>,
        store: Arc<dyn FlagStore>,
        versions: Arc<dyn VersionSource>,
    ) -> Self {
        Self {
            host,
            store,
            versions,
        }
    }

    /// Current version snapshot
    pub fn versions(&self) -> Versions {
        self.versions.snapshot()
    }

    /// Gather the classification inputs for `permission`
    pub fn context_for(&self, permission: Permission, versions: &Versions) -> ClassifyContext {
        let platform_id = permission.platform_id();
        ClassifyContext {
            currently_granted: self.host.currently_granted(platform_id),
            would_show_rationale: self.host.would_show_rationale(platform_id),
            requested_flag: self.store.was_requested(permission),
            target_version: versions.target,
            runtime_version: versions.runtime,
        }
    }

    /// Classify one catalog permission
    pub fn classify(&self, permission: Permission) -> AuthorizationStatus {
        let versions = self.versions();
        self.classify_with(permission, &versions)
    }

    fn classify_with(&self, permission: Permission, versions: &Versions) -> AuthorizationStatus {
        let ctx = self.context_for(permission, versions);
        let status = classify(permission, &ctx);
        trace!(
            "Authorisation for {} is {} (granted={}, rationale={}, requested={})",
            permission,
            status,
            ctx.currently_granted,
            ctx.would_show_rationale,
            ctx.requested_flag
        );
        status
    }

    /// Classify one permission by logical name
    pub fn classify_name(&self, name: &str) -> Result<AuthorizationStatus, PermissionError> {
        Ok(self.classify(Permission::resolve(name)?))
    }

    /// Classify a batch of logical names
    ///
    /// Every name is resolved before the host is consulted; the first unknown
    /// name fails the whole batch with no partial result.
    pub fn classify_all<S: AsRef<str>>(&self, names: &[S]) -> Result<StatusMap, PermissionError> {
        let permissions = resolve_all(names)?;
        let versions = self.versions();
        Ok(permissions
            .into_iter()
            .map(|permission| (permission, self.classify_with(permission, &versions)))
            .collect())
    }
}

/// Resolve every name, failing on the first unknown one
pub fn resolve_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Permission>, PermissionError> {
    names
        .iter()
        .map(|name| Permission::resolve(name.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFlagStore;
    use crate::tracker::RequestId;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(granted: bool, rationale: bool, requested: bool) -> ClassifyContext {
        ClassifyContext {
            currently_granted: granted,
            would_show_rationale: rationale,
            requested_flag: requested,
            target_version: 33,
            runtime_version: 33,
        }
    }

    #[test]
    fn test_granted_wins_over_everything() {
        for &permission in Permission::ALL {
            for rationale in [false, true] {
                for requested in [false, true] {
                    assert_eq!(
                        classify(permission, &ctx(true, rationale, requested)),
                        AuthorizationStatus::Granted
                    );
                }
            }
        }
    }

    #[test]
    fn test_denied_states() {
        let p = Permission::ReadSms;
        assert_eq!(
            classify(p, &ctx(false, false, false)),
            AuthorizationStatus::NotRequested
        );
        assert_eq!(
            classify(p, &ctx(false, false, true)),
            AuthorizationStatus::DeniedAlways
        );
        assert_eq!(
            classify(p, &ctx(false, true, false)),
            AuthorizationStatus::DeniedOnce
        );
        assert_eq!(
            classify(p, &ctx(false, true, true)),
            AuthorizationStatus::DeniedOnce
        );
    }

    #[test]
    fn test_implicit_grant_window() {
        // min 29: device 28, target 29 -> implicit
        assert!(is_implicitly_granted(Permission::ActivityRecognition, 29, 28));
        // device already enforces it
        assert!(!is_implicitly_granted(Permission::ActivityRecognition, 33, 29));
        // app was not built for it
        assert!(!is_implicitly_granted(Permission::ActivityRecognition, 28, 27));
        // no minimum version
        assert!(!is_implicitly_granted(Permission::Camera, 33, 23));
    }

    #[test]
    fn test_implicit_grant_ignores_platform_denial() {
        let context = ClassifyContext {
            currently_granted: false,
            would_show_rationale: true,
            requested_flag: true,
            target_version: 31,
            runtime_version: 30,
        };
        assert_eq!(
            classify(Permission::BluetoothScan, &context),
            AuthorizationStatus::Granted
        );
    }

    struct ScriptedHost {
        granted: HashSet<&'static str>,
        rationale: HashSet<&'static str>,
        queries: AtomicUsize,
    }

    impl HostPermissions for ScriptedHost {
        fn currently_granted(&self, platform_id: &str) -> bool {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.granted.contains(platform_id)
        }

        fn would_show_rationale(&self, platform_id: &str) -> bool {
            self.rationale.contains(platform_id)
        }

        fn prompt_for(
            &self,
            _platform_ids: &[&'static str],
            _request_id: RequestId,
        ) -> Result<(), PermissionError> {
            Ok(())
        }
    }

    fn classifier(host: Arc<ScriptedHost>, store: MemoryFlagStore) -> StatusClassifier {
        StatusClassifier::new(
            host,
            Arc::new(store),
            Arc::new(Versions {
                runtime: 30,
                target: 33,
                minimum: 23,
            }),
        )
    }

    fn host() -> Arc<ScriptedHost> {
        Arc::new(ScriptedHost {
            granted: HashSet::from([Permission::Camera.platform_id()]),
            rationale: HashSet::from([Permission::RecordAudio.platform_id()]),
            queries: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_classify_all() {
        let classifier = classifier(host(), MemoryFlagStore::with_requested([Permission::ReadSms]));

        let statuses = classifier
            .classify_all(&["CAMERA", "RECORD_AUDIO", "READ_SMS", "READ_CONTACTS", "BLUETOOTH_SCAN"])
            .unwrap();

        assert_eq!(statuses[&Permission::Camera], AuthorizationStatus::Granted);
        assert_eq!(statuses[&Permission::RecordAudio], AuthorizationStatus::DeniedOnce);
        assert_eq!(statuses[&Permission::ReadSms], AuthorizationStatus::DeniedAlways);
        assert_eq!(statuses[&Permission::ReadContacts], AuthorizationStatus::NotRequested);
        // runtime 30 < min 31 <= target 33
        assert_eq!(statuses[&Permission::BluetoothScan], AuthorizationStatus::Granted);
    }

    #[test]
    fn test_classify_all_unknown_aborts_before_host_queries() {
        let host = host();
        let classifier = classifier(host.clone(), MemoryFlagStore::new());

        let err = classifier.classify_all(&["CAMERA", "BOGUS"]).unwrap_err();

        assert_eq!(err, PermissionError::unknown("BOGUS"));
        assert_eq!(host.queries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_classify_name() {
        let classifier = classifier(host(), MemoryFlagStore::new());
        assert_eq!(
            classifier.classify_name("CAMERA").unwrap(),
            AuthorizationStatus::Granted
        );
        assert!(classifier.classify_name("camera").is_err());
    }
}
