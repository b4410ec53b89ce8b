//! Host platform abstraction
//!
//! This module provides the [`HostPermissions`] trait, the boundary between the
//! authorization engine and the operating system's permission machinery. The
//! host answers two synchronous questions per platform identifier (is it granted,
//! would a rationale be shown) and accepts fire-and-forget prompt requests.
//!
//! # Completion
//!
//! Every successful [`HostPermissions::prompt_for`] call obliges the host to
//! eventually report exactly one result for that request id by calling
//! [`PermissionManager::on_request_permission_result`](crate::manager::PermissionManager::on_request_permission_result)
//! with parallel lists of platform identifiers and grant flags.
//!
//! # Bridge Versions
//!
//! Not every host bridge exposes runtime permissions. [`BridgeProfile`] is
//! negotiated once at startup from the bridge's semantic version and wraps the
//! host accordingly; see [`bridge`] for details.
//!
//! # Example
//!
//! ```
//! use rusty_perms::host::HostPermissions;
//! use rusty_perms::error::PermissionError;
//! use rusty_perms::tracker::RequestId;
//!
//! struct EverythingGranted;
//!
//! impl HostPermissions for EverythingGranted {
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
//! ```

use crate::error::PermissionError;
use crate::tracker::RequestId;

pub mod bridge;

pub use bridge::{BridgeCapabilities, BridgeProfile};

/// Host platform permission queries and prompting
///
/// Query methods must be non-blocking; they are called on the caller's thread
/// during classification.
pub trait HostPermissions: Send + Sync {
    /// Whether the platform currently grants the permission outright
    fn currently_granted(&self, platform_id: &str) -> bool;

    /// Whether the platform would show an explanatory rationale before prompting
    fn would_show_rationale(&self, platform_id: &str) -> bool;

    /// Ask the platform to prompt for `platform_ids`, tagged with `request_id`
    ///
    /// Returns once the prompt is issued. The result arrives later through the
    /// completion callback.
    fn prompt_for(
        &self,
        platform_ids: &[&'static str],
        request_id: RequestId,
    ) -> Result<(), PermissionError>;
}
