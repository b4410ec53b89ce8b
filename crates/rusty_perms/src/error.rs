//! Error types for the rusty_perms subsystem
//!
//! This module defines the error hierarchy for the rusty_perms crate using `thiserror`.
//! All subsystem operations that can fail return `Result<T, PermissionError>`.
//!
//! # Error Variants
//!
//! - [`PermissionError::UnknownPermission`]: Name absent from the permission catalog
//! - [`PermissionError::VersionUnsupported`]: Permission requested outside its platform window
//! - [`PermissionError::RequestNotFound`]: Completion or finalize for an unknown request id
//! - [`PermissionError::PersistenceWrite`]: Requested-flag write failed (non-fatal)
//! - [`PermissionError::HostContract`]: Host platform violated its callback contract
//! - [`PermissionError::Host`]: Host platform failed to issue a prompt
//! - [`PermissionError::UnsupportedBridge`]: Host bridge lacks a required capability
//! - [`PermissionError::InvalidAction`]: Unknown bridge action or malformed arguments
//! - [`PermissionError::ChannelClosed`]: Response destination dropped before delivery
//!
//! Errors are `Clone` so a single failure can be both logged and delivered to the
//! response destination of the request that caused it.
//!
//! # Example
//!
//! ```rust
//! use rusty_perms::error::PermissionError;
//! use rusty_perms::catalog::Permission;
//!
//! fn lookup(name: &str) -> Result<Permission, PermissionError> {
//!     Permission::resolve(name)
//! }
//!
//! assert!(matches!(
//!     lookup("BOGUS"),
//!     Err(PermissionError::UnknownPermission { .. })
//! ));
//! ```

use thiserror::Error;

/// The main error type for all rusty_perms operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The logical permission name is not in the catalog
    ///
    /// Surfaced synchronously, before any state is mutated.
    #[error("Permission name '{name}' is not a valid permission")]
    UnknownPermission {
        /// The name that failed to resolve
        name: String,
    },

    /// The permission cannot be requested on the running device
    ///
    /// Raised before any prompt is issued when the device runtime version falls
    /// below the permission's minimum or above its maximum.
    #[error(
        "Permission {permission} not supported for device runtime version {device_version} (supported: {})",
        describe_window(.min_version, .max_version)
    )]
    VersionUnsupported {
        /// Logical name of the permission
        permission: String,
        /// Runtime platform version of the device
        device_version: u32,
        /// Minimum platform version the permission requires, if any
        min_version: Option<u32>,
        /// Maximum platform version the permission supports, if any
        max_version: Option<u32>,
    },

    /// No pending request exists for the given identifier
    ///
    /// Usually a late or duplicate completion callback from the host.
    #[error("No pending permission request found for id={request_id}")]
    RequestNotFound {
        /// The identifier that was looked up
        request_id: u32,
    },

    /// Writing the persisted requested flag failed
    #[error("Failed to set permission requested flag for {permission}: {reason}")]
    PersistenceWrite {
        /// Logical name of the permission whose flag could not be written
        permission: String,
        /// Description of the underlying store failure
        reason: String,
    },

    /// The persisted flag store could not be opened
    #[error("Failed to open flag store: {0}")]
    FlagStore(String),

    /// The host platform broke its callback contract
    #[error("Host contract violation: {0}")]
    HostContract(String),

    /// The host platform reported a failure
    #[error("Host platform error: {0}")]
    Host(String),

    /// The negotiated host bridge does not support a capability
    #[error("Host bridge v{version} does not support {capability}")]
    UnsupportedBridge {
        /// Negotiated bridge version
        version: String,
        /// The missing capability (e.g. "requestPermissions")
        capability: String,
    },

    /// A bridge action could not be parsed
    #[error("Invalid action '{action}': {reason}")]
    InvalidAction {
        /// Action name as received from the bridge
        action: String,
        /// What was wrong with it
        reason: String,
    },

    /// The response destination went away before a reply could be delivered
    #[error("Response channel closed")]
    ChannelClosed,
}

impl PermissionError {
    /// Shorthand for [`PermissionError::UnknownPermission`]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownPermission { name: name.into() }
    }

    /// Shorthand for [`PermissionError::InvalidAction`]
    pub fn invalid_action(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

fn describe_window(min: &Option<u32>, max: &Option<u32>) -> String {
    match (*min, *max) {
        (Some(min), Some(max)) => format!("{}..={}", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "any".to_string(),
    }
}
