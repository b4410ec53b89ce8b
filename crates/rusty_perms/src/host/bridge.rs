//! Host-bridge capability negotiation
//!
//! Bridges older than 5.0.0 predate runtime permissions entirely. Rather than
//! probing the host on every call, the bridge version is negotiated once when the
//! subsystem starts and the host is wrapped in a profile matching its
//! capabilities:
//!
//! | Bridge version | `currently_granted` | `prompt_for` |
//! |----------------|---------------------|--------------|
//! | `>= 5.0.0`     | delegated to host   | delegated to host |
//! | `< 5.0.0`      | always `true`       | `UnsupportedBridge` |
//!
//! # Example
//!
//! ```
//! use rusty_perms::host::BridgeProfile;
//!
//! let profile = BridgeProfile::for_version(semver::Version::new(4, 1, 1));
//! assert!(!profile.capabilities().runtime_permissions);
//!
//! let profile = BridgeProfile::for_version(semver::Version::new(6, 2, 0));
//! assert!(profile.capabilities().runtime_permissions);
//! ```

use std::sync::Arc;
use tracing::warn;

use super::HostPermissions;
use crate::error::PermissionError;
use crate::tracker::RequestId;

/// First bridge version exposing runtime permission APIs
pub const RUNTIME_PERMISSIONS_SINCE: semver::Version = semver::Version::new(5, 0, 0);

/// Capabilities available on the negotiated bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeCapabilities {
    /// Whether the bridge can query and request runtime permissions
    pub runtime_permissions: bool,
}

/// The negotiated bridge, selected once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeProfile {
    /// Bridge with runtime permission support
    Modern,
    /// Bridge without runtime permission support
    Legacy {
        /// Version reported by the bridge
        version: semver::Version,
    },
}

impl BridgeProfile {
    /// Select the profile for a bridge version
    pub fn for_version(version: semver::Version) -> Self {
        if version < RUNTIME_PERMISSIONS_SINCE {
            BridgeProfile::Legacy { version }
        } else {
            BridgeProfile::Modern
        }
    }

    /// Capabilities of this profile
    pub fn capabilities(&self) -> BridgeCapabilities {
        BridgeCapabilities {
            runtime_permissions: matches!(self, BridgeProfile::Modern),
        }
    }

    /// Wrap `host` so its behavior matches this profile
    pub fn wrap(&self, host: Arc<dyn HostPermissions>) -> Arc<dyn HostPermissions> {
        match self {
            BridgeProfile::Modern => host,
            BridgeProfile::Legacy { version } => {
                warn!(
                    "Host bridge v{} does not support runtime permissions; all permissions report GRANTED",
                    version
                );
                Arc::new(LegacyHost {
                    version: version.to_string(),
                })
            }
        }
    }
}

/// Host stand-in for bridges without runtime permissions
///
/// Those platforms grant everything at install time, so every permission reads
/// as granted and a prompt can never be issued.
#[derive(Debug)]
struct LegacyHost {
    version: String,
}

impl HostPermissions for LegacyHost {
    fn currently_granted(&self, _platform_id: &str) -> bool {
        true
    }

    fn would_show_rationale(&self, _platform_id: &str) -> bool {
        false
    }

    fn prompt_for(
        &self,
        _platform_ids: &[&'static str],
        _request_id: RequestId,
    ) -> Result<(), PermissionError> {
        Err(PermissionError::UnsupportedBridge {
            version: self.version.clone(),
            capability: "requestPermissions".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DenyingHost;

    impl HostPermissions for DenyingHost {
        fn currently_granted(&self, _platform_id: &str) -> bool {
            false
        }

        fn would_show_rationale(&self, _platform_id: &str) -> bool {
            true
        }

        fn prompt_for(
            &self,
            _platform_ids: &[&'static str],
            _request_id: RequestId,
        ) -> Result<(), PermissionError> {
            Ok(())
        }
    }

    #[test]
    fn test_for_version_modern() {
        let profile = BridgeProfile::for_version(semver::Version::new(12, 0, 1));
        assert_eq!(profile, BridgeProfile::Modern);
        assert!(profile.capabilities().runtime_permissions);
    }

    #[test]
    fn test_for_version_boundary() {
        assert_eq!(
            BridgeProfile::for_version(semver::Version::new(5, 0, 0)),
            BridgeProfile::Modern
        );
        assert!(matches!(
            BridgeProfile::for_version(semver::Version::new(4, 9, 9)),
            BridgeProfile::Legacy { .. }
        ));
        assert!(matches!(
            BridgeProfile::for_version(semver::Version::parse("5.0.0-beta.1").unwrap()),
            BridgeProfile::Legacy { .. }
        ));
    }

    #[test]
    fn test_modern_wrap_delegates() {
        let host = BridgeProfile::Modern.wrap(Arc::new(DenyingHost));
        assert!(!host.currently_granted("android.permission.CAMERA"));
        assert!(host.would_show_rationale("android.permission.CAMERA"));
    }

    #[test]
    fn test_legacy_wrap_grants_and_refuses_prompts() {
        let profile = BridgeProfile::for_version(semver::Version::new(4, 1, 1));
        let host = profile.wrap(Arc::new(DenyingHost));

        assert!(host.currently_granted("android.permission.CAMERA"));
        assert!(!host.would_show_rationale("android.permission.CAMERA"));

        let err = host
            .prompt_for(&["android.permission.CAMERA"], RequestId::new(1))
            .unwrap_err();
        assert_eq!(
            err,
            PermissionError::UnsupportedBridge {
                version: "4.1.1".to_string(),
                capability: "requestPermissions".to_string(),
            }
        );
    }
}
