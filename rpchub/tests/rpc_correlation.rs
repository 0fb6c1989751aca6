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

//! Request/response correlation over TCP.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rpchub::args;
use rpchub::dispatch::DispatchTarget;
use rpchub::hub::{Hub, HubConfig};
use rpchub::serialization::{JsonSerializer, Serializer};
use rpchub::server::{Server, ServerConfig};
use rpchub::{CallError, HubError, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> (Server<Hub>, String) {
    let server: Server<Hub> = Server::new(ServerConfig::default());
    let slot = Arc::new(AtomicU64::new(40));
    server.add_shared_target(
        DispatchTarget::new("Client")
            .method("getRandomNumberSlot", move || slot.fetch_add(1, Ordering::Relaxed) as i64)
            .method("add", |a: i64, b: i64| a + b)
            .method("greet", |name: String| format!("hello, {name}"))
            .method("forget", |_key: String| {}),
    );
    let address = server.listen("127.0.0.1:0").await.unwrap();
    (server, address.to_string())
}

async fn connect(address: &str) -> Hub {
    let hub = Hub::new(HubConfig::default().with_name("client"));
    hub.connect_to_server(Some(address.to_string())).await.unwrap();
    hub
}

#[tokio::test]
async fn test_get_random_number_slot_wire_format() {
    let (_server, address) = start_server().await;
    let mut stream = TcpStream::connect(&address).await.unwrap();

    stream
        .write_all(br#"{"type":"request","id":1,"class":"Client","method":"getRandomNumberSlot"}"#)
        .await
        .unwrap();

    let serializer = JsonSerializer::new();
    let mut buffer = Vec::new();
    let fields = loop {
        let mut chunk = [0u8; 512];
        let n = timeout(WAIT, stream.read(&mut chunk)).await.unwrap().unwrap();
        assert!(n > 0, "server closed the connection");
        buffer.extend_from_slice(&chunk[..n]);
        let mut decoded = serializer.decode(&mut buffer);
        if let Some(first) = decoded.pop() {
            break first.unwrap();
        }
    };

    assert_eq!(fields.get("type"), Some(&Value::String("response".to_string())));
    assert_eq!(fields.get("id"), Some(&Value::Int(1)));
    assert_eq!(fields.get("class"), Some(&Value::String("Client".to_string())));
    assert_eq!(fields.get("return"), Some(&Value::Int(40)));
    assert!(!fields.contains_key("method"));
}

#[tokio::test]
async fn test_call_resolves_and_clears_pending() {
    let (_server, address) = start_server().await;
    let client = connect(&address).await;

    let slot = client.call("Client", "getRandomNumberSlot", args![]).await.unwrap();
    assert_eq!(slot, Some(Value::Int(40)));
    assert_eq!(client.pending_calls(), 0);

    let greeting: String = client.remote("Client").call_as("greet", args!["ada"]).await.unwrap();
    assert_eq!(greeting, "hello, ada");
}

#[tokio::test]
async fn test_void_result_has_no_value() {
    let (_server, address) = start_server().await;
    let client = connect(&address).await;

    let ret = client.call("Client", "forget", args!["key"]).await.unwrap();
    assert_eq!(ret, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_match_their_responses() {
    let (server, address) = start_server().await;
    let mut offsets = DispatchTarget::new("Offsets");
    for n in 0..16_i64 {
        offsets.add_method(format!("add{n}"), move |a: i64| a + 100 * n);
    }
    server.add_shared_target(offsets);
    let client = connect(&address).await;

    // One in-flight call per method; overlapping calls to the same method
    // are dropped by the receiving hub.
    let mut tasks = Vec::new();
    for n in 0..16_i64 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let method = format!("add{n}");
            let sum = client.call("Offsets", &method, args![n]).await.unwrap();
            (n, sum)
        }));
    }
    for task in tasks {
        let (n, sum) = timeout(WAIT, task).await.unwrap().unwrap();
        assert_eq!(sum, Some(Value::Int(101 * n)));
    }
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn test_sequential_calls_to_one_method() {
    let (_server, address) = start_server().await;
    let client = connect(&address).await;

    for i in 0..32_i64 {
        let sum = timeout(WAIT, client.call("Client", "add", args![i, i])).await.unwrap().unwrap();
        assert_eq!(sum, Some(Value::Int(2 * i)));
    }
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn test_callback_delivery() {
    let (_server, address) = start_server().await;
    let client = connect(&address).await;

    let (sender, receiver) = tokio::sync::oneshot::channel();
    let outcome = client
        .call_with("Client", "add", args![20, 22], move |result| {
            let _ = sender.send(result);
        })
        .unwrap();
    assert!(outcome.id().is_some());

    let result = timeout(WAIT, receiver).await.unwrap().unwrap();
    assert_eq!(result, Ok(Some(Value::Int(42))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_wait_outside_the_runtime() {
    let (_server, address) = start_server().await;
    let client = connect(&address).await;

    let reply = client.invoke("Client", "greet", args!["bob"]).unwrap();
    let result = tokio::task::spawn_blocking(move || reply.blocking_wait())
        .await
        .unwrap();
    assert_eq!(result, Ok(Some(Value::String("hello, bob".to_string()))));
}

#[tokio::test]
async fn test_unanswered_call_times_out() {
    let (_server, address) = start_server().await;
    let client = connect(&address).await;

    let result = client
        .call_timeout("Missing", "method", args![], Duration::from_millis(200))
        .await;
    assert!(matches!(result, Err(HubError::Call(CallError::Timeout { .. }))));
    assert_eq!(client.pending_calls(), 0);

    // The connection is still usable afterwards.
    let sum = client.call("Client", "add", args![1, 2]).await.unwrap();
    assert_eq!(sum, Some(Value::Int(3)));
}

#[tokio::test]
async fn test_bad_argument_type_is_dropped() {
    let (server, address) = start_server().await;
    let client = connect(&address).await;

    let result = client
        .call_timeout("Client", "add", args!["one", 2], Duration::from_millis(200))
        .await;
    assert!(matches!(result, Err(HubError::Call(CallError::Timeout { .. }))));

    let peer = server.peers().pop().unwrap();
    assert_eq!(peer.metrics().dispatch_failures(), 1);
}
