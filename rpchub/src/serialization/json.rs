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

//! JSON serializer implementation.
//!
//! Messages are JSON objects and a batch is a JSON array of objects. On the
//! stream, payloads are simply adjacent top-level values, which
//! `serde_json`'s stream deserializer splits apart.

use serde::Deserialize;

use crate::protocol::FieldMap;
use crate::serialization::{DeserializationError, SerializationError, Serializer};

/// One top-level JSON value on the stream.
#[derive(Deserialize)]
#[serde(untagged)]
enum Frame {
    Batch(Vec<FieldMap>),
    Single(FieldMap),
}

impl Frame {
    fn into_messages(self) -> Vec<FieldMap> {
        match self {
            Frame::Batch(messages) => messages,
            Frame::Single(message) => vec![message],
        }
    }
}

/// JSON serializer, the default wire encoding of a hub.
///
/// # Examples
///
/// ```rust
/// use rpchub::args;
/// use rpchub::protocol::Message;
/// use rpchub::serialization::{JsonSerializer, Serializer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = JsonSerializer::default();
/// let first = Message::request(1, "Client", "ping", args![]).to_fields();
/// let second = Message::request(2, "Client", "ping", args![]).to_fields();
///
/// // Two messages written back to back arrive in one read.
/// let mut buffer = serializer.serialize(&first)?;
/// buffer.extend(serializer.serialize(&second)?);
///
/// let decoded = serializer.deserialize(&buffer)?;
/// assert_eq!(decoded, vec![first, second]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Creates a new JSON serializer producing compact output.
    #[must_use]
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Configures the serializer to produce pretty-printed JSON.
    #[must_use]
    pub fn with_pretty_print(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Configures the serializer to produce compact JSON.
    ///
    /// This is the default behavior.
    #[must_use]
    pub fn with_compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    fn encode<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        if self.pretty {
            serde_json::to_vec_pretty(value).map_err(Into::into)
        } else {
            serde_json::to_vec(value).map_err(Into::into)
        }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, message: &FieldMap) -> Result<Vec<u8>, SerializationError> {
        self.encode(message)
    }

    fn serialize_batch(&self, messages: &[FieldMap]) -> Result<Vec<u8>, SerializationError> {
        self.encode(messages)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<FieldMap>, DeserializationError> {
        let mut messages = Vec::new();
        for frame in serde_json::Deserializer::from_slice(bytes).into_iter::<Frame>() {
            messages.extend(frame?.into_messages());
        }
        Ok(messages)
    }

    fn decode(&self, buffer: &mut Vec<u8>) -> Vec<Result<FieldMap, DeserializationError>> {
        let mut decoded = Vec::new();
        let consumed = {
            let mut stream = serde_json::Deserializer::from_slice(buffer.as_slice()).into_iter::<Frame>();
            loop {
                match stream.next() {
                    None => break buffer.len(),
                    Some(Ok(frame)) => decoded.extend(frame.into_messages().into_iter().map(Ok)),
                    Some(Err(err)) if err.is_eof() => break stream.byte_offset(),
                    Some(Err(err)) => {
                        decoded.push(Err(err.into()));
                        break buffer.len();
                    }
                }
            }
        };
        buffer.drain(..consumed);
        decoded
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::protocol::{Message, ValidateToken, Value};

    fn request(id: u64) -> FieldMap {
        Message::request(id, "Client", "add", args![id as i64, "x"]).to_fields()
    }

    #[test]
    fn test_json_round_trip() {
        let serializer = JsonSerializer::default();
        let message = request(1);
        let bytes = serializer.serialize(&message).unwrap();
        assert_eq!(serializer.deserialize(&bytes).unwrap(), vec![message]);
    }

    #[test]
    fn test_json_void_and_null_returns_stay_distinct() {
        let serializer = JsonSerializer::default();
        let void = Message::response(1, "C", None).to_fields();
        let null = Message::response(2, "C", Some(Value::Null)).to_fields();

        let mut bytes = serializer.serialize(&void).unwrap();
        bytes.extend(serializer.serialize(&null).unwrap());
        let decoded = serializer.deserialize(&bytes).unwrap();

        assert!(!decoded[0].contains_key("return"));
        assert_eq!(decoded[1].get("return"), Some(&Value::Null));
    }

    #[test]
    fn test_json_batch_is_one_array() {
        let serializer = JsonSerializer::default();
        let batch = vec![request(1), request(2), request(3)];
        let bytes = serializer.serialize_batch(&batch).unwrap();

        assert_eq!(bytes.first(), Some(&b'['));
        assert_eq!(serializer.deserialize(&bytes).unwrap(), batch);
    }

    #[test]
    fn test_decode_adjacent_objects_and_batches() {
        let serializer = JsonSerializer::default();
        let mut buffer = serializer.serialize(&request(1)).unwrap();
        buffer.extend(serializer.serialize_batch(&[request(2), request(3)]).unwrap());
        buffer.extend(serializer.serialize(&request(4)).unwrap());

        let decoded: Vec<_> = serializer
            .decode(&mut buffer)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(decoded, vec![request(1), request(2), request(3), request(4)]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_keeps_incomplete_tail() {
        let serializer = JsonSerializer::default();
        let first = serializer.serialize(&request(1)).unwrap();
        let second = serializer.serialize(&request(2)).unwrap();
        let split = second.len() / 2;

        let mut buffer = first.clone();
        buffer.extend_from_slice(&second[..split]);
        let decoded = serializer.decode(&mut buffer);
        assert_eq!(decoded.len(), 1);
        assert_eq!(buffer, &second[..split]);

        buffer.extend_from_slice(&second[split..]);
        let decoded = serializer.decode(&mut buffer);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].as_ref().unwrap(), &request(2));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_drops_malformed_input() {
        let serializer = JsonSerializer::default();
        let mut buffer = serializer.serialize(&request(1)).unwrap();
        buffer.extend_from_slice(b"not json {\"id\": 2}");

        let decoded = serializer.decode(&mut buffer);
        assert_eq!(decoded.len(), 2);
        assert!(decoded[0].is_ok());
        assert!(decoded[1].is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_rejects_non_object_values() {
        let serializer = JsonSerializer::default();
        let mut buffer = b"\"just a string\" ".to_vec();
        let decoded = serializer.decode(&mut buffer);
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].is_err());
    }

    #[test]
    fn test_deserialize_incomplete_payload_fails() {
        let serializer = JsonSerializer::default();
        let bytes = serializer.serialize(&request(1)).unwrap();
        assert!(serializer.deserialize(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_pretty_print_still_decodes() {
        let serializer = JsonSerializer::new().with_pretty_print();
        let mut buffer = serializer.serialize(&request(5)).unwrap();
        assert!(buffer.contains(&b'\n'));
        let decoded = serializer.decode(&mut buffer);
        assert_eq!(decoded[0].as_ref().unwrap(), &request(5));
    }

    #[test]
    fn test_floats_round_trip_exactly() {
        let serializer = JsonSerializer::default();
        let token = ValidateToken::new("s3cret");
        for i in 1..2000 {
            let value = f64::from(i) / 7.0 + 0.01;
            let mut message = Message::request(1, "Lab", "echo", args![value]).to_fields();
            token.sign(&mut message);

            let bytes = serializer.serialize(&message).unwrap();
            let decoded = serializer.deserialize(&bytes).unwrap();
            assert_eq!(decoded, vec![message], "{value} changed on the wire");
            assert!(token.verify(&decoded[0]).is_ok());
        }
    }

    #[test]
    fn test_json_name() {
        assert_eq!(JsonSerializer::default().name(), "json");
    }
}
