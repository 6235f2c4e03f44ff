//! Basic server example wiring a permissions manager to an in-process host.
//!
//! This example shows how to:
//! - Configure options with `ReplicationOptions::builder()`
//! - Register and initialize the generic mapping provider
//! - Drive the manager with `HostEvent`s through `run`
//! - Drain tagged replies from a `QueuedReplyChannel`
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=replicated_permissions=debug cargo run --example basic_server --package replicated_permissions
//! ```

use replicated_permissions::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A connected player as the host sees it.
struct ServerPlayer {
    id: PlayerId,
    name: String,
    nodes: Vec<String>,
}

impl Player for ServerPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_admin_override(&self) -> bool {
        false
    }

    fn has_permission(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    fn kick(&self, reason: &str) {
        println!("Kicked {}: {}", self.name, reason);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replicated_permissions=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    println!("=== Replicated Permissions Basic Server ===\n");

    let data_dir = tempfile::tempdir()?;
    let options = ReplicationOptions::builder()
        .plugin_name("ExampleServer")
        .data_dir(data_dir.path())
        .build();
    println!("Data directory: {}", options.data_dir.display());

    // Register the generic provider and govern one mod with a minimum version
    let (channel, mut outbound) = QueuedReplyChannel::new();
    let generic = Arc::new(GenericMappingProvider::new());
    let mut manager = PermissionsManager::new(options, Arc::new(channel));
    manager.register_provider(generic.clone());
    manager.init_providers();
    generic.add_mod("examplemod");
    generic.set_min_mod_version("examplemod", ModVersion::new(1.0));

    let manager = Arc::new(manager);
    let (events, rx) = mpsc::unbounded_channel();
    let runner = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.run(rx).await })
    };

    let alice: Arc<dyn Player> = Arc::new(ServerPlayer {
        id: PlayerId::random(),
        name: "alice".to_string(),
        nodes: vec!["mod.examplemod.fly".to_string()],
    });
    let bob: Arc<dyn Player> = Arc::new(ServerPlayer {
        id: PlayerId::random(),
        name: "bob".to_string(),
        nodes: Vec::new(),
    });

    let query = PermissionsContainer::new("examplemod", ModVersion::new(1.2), ["fly", "build"])?;
    let outdated = PermissionsContainer::new("examplemod", ModVersion::new(0.9), ["fly"])?;

    events.send(HostEvent::ChannelRegistered(alice.clone()))?;
    events.send(HostEvent::Query {
        player: alice.clone(),
        payload: query.encode()?,
    })?;
    events.send(HostEvent::ChannelRegistered(bob.clone()))?;
    events.send(HostEvent::Query {
        player: bob.clone(),
        payload: outdated.encode()?,
    })?;
    events.send(HostEvent::Disconnected(bob.id()))?;
    drop(events);
    runner.await?;

    // Every reply is the permissions tag byte followed by the encoded container
    while let Ok(message) = outbound.try_recv() {
        let reply = PermissionsContainer::decode(&message.payload[1..])?;
        println!("Reply to {}: {}", message.player, reply);
    }

    for version in manager.monitor().history_store().versions("examplemod") {
        println!("Recorded examplemod version {version}");
    }

    Ok(())
}
