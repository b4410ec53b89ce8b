//! Request flow example driving the permission subsystem with a simulated host.
//!
//! This example shows how to:
//! - Configure the subsystem with `PermissionOptions::builder()`
//! - Implement `HostPermissions` for a platform
//! - Route the platform dialog's result back through `on_request_permission_result`
//! - Dispatch raw bridge actions and print their JSON replies
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=rusty_perms=debug cargo run --example request_flow --package rusty_perms
//! ```

use rusty_perms::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// A platform dialog waiting to be answered
struct DialogEvent {
    platform_ids: Vec<&'static str>,
    request_id: RequestId,
}

/// Simulated platform: grants camera up front and queues every prompt as a dialog
struct SimulatedHost {
    granted: HashSet<&'static str>,
    dialogs: mpsc::UnboundedSender<DialogEvent>,
}

impl HostPermissions for SimulatedHost {
    fn currently_granted(&self, platform_id: &str) -> bool {
        self.granted.contains(platform_id)
    }

    fn would_show_rationale(&self, _platform_id: &str) -> bool {
        false
    }

    fn prompt_for(
        &self,
        platform_ids: &[&'static str],
        request_id: RequestId,
    ) -> Result<(), PermissionError> {
        self.dialogs
            .send(DialogEvent {
                platform_ids: platform_ids.to_vec(),
                request_id,
            })
            .map_err(|_| PermissionError::Host("dialog queue closed".to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rusty_perms=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    println!("=== Rusty Perms Request Flow Example ===\n");

    let flag_dir = tempfile::tempdir()?;
    let options = PermissionOptions::builder()
        .flag_store_path(flag_dir.path().join("permission_flags.json"))
        .build();

    let (dialog_tx, mut dialog_rx) = mpsc::unbounded_channel();
    let host = Arc::new(SimulatedHost {
        granted: HashSet::from([Permission::Camera.platform_id()]),
        dialogs: dialog_tx,
    });
    let versions = Versions {
        runtime: 30,
        target: 34,
        minimum: 24,
    };
    let manager = Arc::new(PermissionManager::new(options, host, Arc::new(versions))?);

    // The "user" grants location and denies everything else.
    let ui = {
        let manager = manager.clone();
        tokio::spawn(async move {
            while let Some(dialog) = dialog_rx.recv().await {
                let granted: Vec<bool> = dialog
                    .platform_ids
                    .iter()
                    .map(|id| id.ends_with("LOCATION"))
                    .collect();
                println!("Dialog {} answered: {:?}", dialog.request_id, granted);
                if let Err(e) = manager
                    .on_request_permission_result(
                        dialog.request_id,
                        dialog.platform_ids.as_slice(),
                        &granted,
                    )
                    .await
                {
                    eprintln!("Dialog result rejected: {}", e);
                }
            }
        })
    };

    println!("Device: {}", json!(manager.device_os_version()));
    println!("Build:  {}\n", json!(manager.build_os_version()));

    let batch = ["CAMERA", "ACCESS_FINE_LOCATION", "READ_SMS", "BLUETOOTH_SCAN"];
    println!("Before: {}", Reply::Statuses(manager.authorization_statuses(&batch)?).to_json());

    let statuses = manager.request(&batch).await?;
    println!("After:  {}\n", Reply::Statuses(statuses).to_json());

    let actions = [
        ("getPermissionAuthorizationStatus", json!(["READ_SMS"])),
        ("requestMicrophoneAuthorization", json!([])),
        ("requestRuntimePermissions", json!([["CAMERA", "NOT_A_PERMISSION"]])),
        ("isRoamingEnabled", json!([])),
    ];
    for (name, args) in actions {
        let (tx, rx) = oneshot::channel::<Delivery>();
        manager.handle_action(name, &args, Box::new(tx)).await;
        match rx.await? {
            Ok(reply) => println!("{} -> {}", name, reply.to_json()),
            Err(e) => println!("{} -> error: {}", name, e),
        }
    }

    drop(manager);
    ui.abort();
    Ok(())
}
