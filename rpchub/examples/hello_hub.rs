//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! # Hello Hub
//!
//! A server and two clients in one process.
//!
//! - The server shares a `Client` target with `getRandomNumberSlot`.
//! - Each peer is a `Player` object the client can call into.
//! - The server broadcasts a message of the day to every client.
//! - One client pushes its state with a sync pass.
//!
//! ## Running This Example
//!
//! ```bash
//! RUST_LOG=rpchub=debug cargo run --example hello_hub
//! ```

use std::error::Error;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use rpchub::args;
use rpchub::dispatch::DispatchTarget;
use rpchub::hub::{Hub, HubConfig, SyncSource};
use rpchub::protocol::ValidateToken;
use rpchub::server::{Peer, Server, ServerConfig, ServerEvent};
use tracing_subscriber::EnvFilter;

/// Server-side state for one connected client.
struct Player {
    hub: Hub,
    score: AtomicI64,
    name: parking_lot::Mutex<String>,
}

impl Peer for Player {
    fn new(hub: Hub) -> Self {
        Player {
            hub,
            score: AtomicI64::new(0),
            name: parking_lot::Mutex::new(String::from("anonymous")),
        }
    }

    fn hub(&self) -> &Hub {
        &self.hub
    }

    fn target(self: Arc<Self>) -> Option<DispatchTarget> {
        let scorer: Weak<Player> = Arc::downgrade(&self);
        let namer = Weak::clone(&scorer);
        Some(
            DispatchTarget::new("Player")
                .method("setScore", move |score: i64| {
                    if let Some(player) = scorer.upgrade() {
                        player.score.store(score, Ordering::Relaxed);
                    }
                })
                .method("setName", move |name: String| {
                    if let Some(player) = namer.upgrade() {
                        *player.name.lock() = name;
                    }
                }),
        )
    }
}

fn client(token: &ValidateToken, name: &str) -> Hub {
    let hub = Hub::new(
        HubConfig::default()
            .with_name(name)
            .with_validate_token(token.clone())
            .with_auto_reconnect(true),
    );
    let label = name.to_string();
    hub.register_target(DispatchTarget::new("Chat").method("motd", move |text: String| {
        println!("[{label}] message of the day: {text}");
    }));
    hub
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let token = ValidateToken::new("hello hub");

    let server: Server<Player> = Server::new(
        ServerConfig::default().with_hub_config(HubConfig::default().with_validate_token(token.clone())),
    );
    let slots = Arc::new(AtomicI64::new(0));
    server.add_shared_target(DispatchTarget::new("Client").method("getRandomNumberSlot", move || {
        slots.fetch_add(1, Ordering::Relaxed) % 6
    }));
    let mut events = server.subscribe();
    let address = server.listen("127.0.0.1:0").await?.to_string();

    let alice = client(&token, "alice");
    let bob = client(&token, "bob");
    alice.connect_to_server(Some(address.clone())).await?;
    bob.connect_to_server(Some(address)).await?;

    for _ in 0..2 {
        if let Ok(ServerEvent::PeerConnected { peer, address }) = events.recv().await {
            println!("server: {peer} connected from {address}");
        }
    }

    let slot = alice.call("Client", "getRandomNumberSlot", args![]).await?;
    println!("alice got slot {slot:?}");
    let slot: i64 = bob.remote("Client").call_as("getRandomNumberSlot", args![]).await?;
    println!("bob got slot {slot}");

    let score = Arc::new(AtomicI64::new(42));
    alice.register_syncable(
        SyncSource::new("Player")
            .attribute("score", {
                let score = Arc::clone(&score);
                move || score.load(Ordering::Relaxed)
            })
            .attribute("name", || "alice"),
    );
    let pushed = alice.sync()?;
    println!("alice pushed {pushed} attributes in one write");

    let delivered = server.broadcast("Chat", "motd", args!["welcome to rpchub"]);
    println!("server: broadcast to {delivered} peers");

    tokio::time::sleep(Duration::from_millis(200)).await;
    for player in server.peers() {
        println!(
            "server: {} has score {}",
            player.name.lock(),
            player.score.load(Ordering::Relaxed)
        );
    }

    alice.disconnect_from_server();
    bob.disconnect_from_server();
    server.shutdown();
    Ok(())
}
