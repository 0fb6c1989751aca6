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

//! Transaction batching and the sync pass, observed on the raw wire.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use rpchub::args;
use rpchub::hub::{Hub, HubConfig, SendOutcome, SyncSource};
use rpchub::protocol::{FieldMap, Message, MessageKind};
use rpchub::serialization::{JsonSerializer, Serializer};
use rpchub::transport::MemoryTransport;
use rpchub::{HubError, Value};
use tokio::io::{AsyncReadExt, ReadHalf};
use tokio::time::{Duration, timeout};

/// The far end of a memory connection, read one write at a time.
struct Wire {
    reader: ReadHalf<MemoryTransport>,
    _writer: tokio::io::WriteHalf<MemoryTransport>,
}

impl Wire {
    /// Reads exactly one write made by the hub.
    async fn next_write(&mut self) -> Vec<FieldMap> {
        let mut chunk = vec![0u8; 64 * 1024];
        let n = timeout(Duration::from_secs(5), self.reader.read(&mut chunk))
            .await
            .expect("no write arrived")
            .unwrap();
        let mut bytes = chunk[..n].to_vec();
        let decoded = JsonSerializer::new().decode(&mut bytes);
        assert!(bytes.is_empty(), "a write held a partial message");
        decoded.into_iter().map(Result::unwrap).collect()
    }

    /// Asserts that the hub writes nothing for a while.
    async fn assert_quiet(&mut self) {
        let mut chunk = vec![0u8; 1024];
        let read = timeout(Duration::from_millis(150), self.reader.read(&mut chunk)).await;
        assert!(read.is_err(), "unexpected write");
    }
}

fn attached(hub: &Hub) -> Wire {
    let (near, far) = MemoryTransport::pair_default();
    hub.attach(near);
    let (reader, writer) = tokio::io::split(far);
    Wire {
        reader,
        _writer: writer,
    }
}

fn request(fields: &FieldMap) -> Message {
    let message = Message::from_fields(fields).unwrap();
    assert_eq!(message.kind, MessageKind::Request);
    message
}

#[tokio::test]
async fn test_commit_is_one_write_in_call_order() {
    let hub = Hub::new(HubConfig::default());
    let mut wire = attached(&hub);

    hub.begin_transaction();
    for i in 0..5 {
        assert_eq!(hub.send("Board", "place", args![i]).unwrap(), SendOutcome::Buffered);
    }
    assert_eq!(hub.buffered(), 5);
    assert_eq!(hub.commit().unwrap(), 5);
    assert!(!hub.in_transaction());

    let batch = wire.next_write().await;
    assert_eq!(batch.len(), 5);
    let mut last_id = None;
    for (i, fields) in batch.iter().enumerate() {
        let message = request(fields);
        assert_eq!(message.method.as_deref(), Some("place"));
        assert_eq!(message.args.get(0), Some(&Value::Int(i as i64)));
        assert!(last_id < Some(message.id));
        last_id = Some(message.id);
    }
    wire.assert_quiet().await;
    timeout(Duration::from_secs(5), async {
        while hub.metrics().frames_written() != 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rollback_writes_nothing() {
    let hub = Hub::new(HubConfig::default());
    let mut wire = attached(&hub);

    hub.begin_transaction();
    hub.send("Board", "place", args![1]).unwrap();
    hub.send("Board", "place", args![2]).unwrap();
    assert_eq!(hub.rollback(), 2);
    wire.assert_quiet().await;

    hub.send("Board", "marker", args![]).unwrap();
    let next = wire.next_write().await;
    assert_eq!(next.len(), 1);
    assert_eq!(request(&next[0]).method.as_deref(), Some("marker"));
}

#[tokio::test]
async fn test_begin_is_idempotent_and_empty_commit_is_silent() {
    let hub = Hub::new(HubConfig::default());
    let mut wire = attached(&hub);

    hub.begin_transaction();
    hub.send("Board", "place", args![1]).unwrap();
    hub.begin_transaction();
    assert_eq!(hub.buffered(), 1);
    assert_eq!(hub.commit().unwrap(), 1);
    assert_eq!(wire.next_write().await.len(), 1);

    hub.begin_transaction();
    assert_eq!(hub.commit().unwrap(), 0);
    assert!(!hub.in_transaction());
    wire.assert_quiet().await;
}

#[tokio::test]
async fn test_buffered_call_cannot_be_awaited() {
    let hub = Hub::new(HubConfig::default());
    let _wire = attached(&hub);

    hub.begin_transaction();
    assert!(matches!(hub.invoke("Board", "score", args![]), Err(HubError::Batched)));
    hub.rollback();
}

#[tokio::test]
async fn test_sync_pushes_attributes_as_one_batch() {
    let hub = Hub::new(HubConfig::default());
    let score = Arc::new(AtomicI64::new(7));
    hub.register_syncable(
        SyncSource::new("Player")
            .attribute("score", {
                let score = Arc::clone(&score);
                move || score.load(Ordering::Relaxed)
            })
            .attribute("name", || "ada"),
    );
    let mut wire = attached(&hub);

    // Attaching runs a sync pass.
    let initial = wire.next_write().await;
    assert_eq!(initial.len(), 2);

    score.store(9, Ordering::Relaxed);
    assert_eq!(hub.sync().unwrap(), 2);
    let batch = wire.next_write().await;
    let setters: Vec<_> = batch.iter().map(request).collect();
    assert_eq!(setters[0].class, "Player");
    assert_eq!(setters[0].method.as_deref(), Some("setScore"));
    assert_eq!(setters[0].args.get(0), Some(&Value::Int(9)));
    assert_eq!(setters[1].method.as_deref(), Some("setName"));
    assert_eq!(setters[1].args.get(0), Some(&Value::String("ada".to_string())));
}

#[tokio::test]
async fn test_commit_while_disconnected_keeps_buffer_for_next_connection() {
    let hub = Hub::new(HubConfig::default());

    hub.begin_transaction();
    hub.send("Board", "place", args![3]).unwrap();
    assert!(matches!(hub.commit(), Err(HubError::NotConnected)));
    assert_eq!(hub.buffered(), 1);

    let mut wire = attached(&hub);
    let flushed = wire.next_write().await;
    assert_eq!(flushed.len(), 1);
    assert_eq!(request(&flushed[0]).args.get(0), Some(&Value::Int(3)));
    assert_eq!(hub.buffered(), 0);
}
