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

//! Shared-secret message tokens between two hubs.

use rpchub::args;
use rpchub::dispatch::DispatchTarget;
use rpchub::hub::{Hub, HubConfig};
use rpchub::protocol::ValidateToken;
use rpchub::transport::MemoryTransport;
use rpchub::{CallError, HubError, Value};
use tokio::time::Duration;

fn connect(client: HubConfig, server: HubConfig) -> (Hub, Hub) {
    let (left, right) = MemoryTransport::pair_default();
    let client = Hub::new(client.with_name("client"));
    let server = Hub::new(server.with_name("server"));
    server.register_target(DispatchTarget::new("Vault").method("open", |pin: i64| pin == 1234));
    client.attach(left);
    server.attach(right);
    (client, server)
}

fn with_secret(secret: &str) -> HubConfig {
    HubConfig::default().with_validate_token(ValidateToken::new(secret))
}

#[tokio::test]
async fn test_matching_secrets_accept_messages() {
    let (client, server) = connect(with_secret("s3cret"), with_secret("s3cret"));

    let opened = client.call("Vault", "open", args![1234]).await.unwrap();
    assert_eq!(opened, Some(Value::Bool(true)));
    assert_eq!(server.metrics().auth_failures(), 0);
    assert_eq!(client.metrics().auth_failures(), 0);
}

#[tokio::test]
async fn test_mismatched_secret_is_dropped_without_response() {
    let (client, server) = connect(with_secret("alpha"), with_secret("beta"));

    let result = client
        .call_timeout("Vault", "open", args![1234], Duration::from_millis(200))
        .await;
    assert!(matches!(result, Err(HubError::Call(CallError::Timeout { .. }))));
    assert_eq!(server.metrics().auth_failures(), 1);
    assert_eq!(server.metrics().responses_sent(), 0);
}

#[tokio::test]
async fn test_unsigned_message_is_rejected() {
    let (client, server) = connect(HubConfig::default(), with_secret("s3cret"));

    let result = client
        .call_timeout("Vault", "open", args![1], Duration::from_millis(200))
        .await;
    assert!(result.is_err());
    assert_eq!(server.metrics().auth_failures(), 1);
    assert!(server.is_connected());
}

#[tokio::test]
async fn test_signed_floats_survive_the_wire() {
    let (client, server) = connect(with_secret("s3cret"), with_secret("s3cret"));
    server.register_target(DispatchTarget::new("Lab").method("echo", |x: f64| x));

    for value in [2.2957142857142854, 1.0715660391465826e-75, 0.1 + 0.2, f64::MIN] {
        let echoed = client
            .call_timeout("Lab", "echo", args![value], Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(echoed, Some(Value::Float(value)));
    }
    assert_eq!(server.metrics().auth_failures(), 0);
    assert_eq!(client.metrics().auth_failures(), 0);
}
