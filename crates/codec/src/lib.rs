//! Codec crate
//!
//! Encodes Arrow schemas and record batches as the base64 IPC blobs the
//! query engine's JVM SDK reads, and decodes the blobs the engine sends
//! back. One blob is exactly one standalone IPC message: a 4-byte
//! metadata-length prefix, the flatbuffer metadata, then the body.
//!
//! The Rust IPC writer frames every message with a 4-byte continuation
//! marker (0xFFFFFFFF) ahead of the length prefix. The JVM reader on the
//! other side rejects that marker on standalone messages, so [`encode_schema`]
//! and [`encode_record_batch`] strip the first 4 bytes before base64.
//! This offset is a fixed wire contract, not a tuning knob.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::buffer::Buffer;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::ipc::convert::fb_to_schema;
use arrow::ipc::reader::read_record_batch;
use arrow::ipc::writer::{
    write_message, DictionaryTracker, EncodedData, IpcDataGenerator, IpcWriteOptions,
};
use arrow::ipc::root_as_message;

/// Arrow IPC continuation marker (private in the `arrow` crate).
const CONTINUATION_MARKER: [u8; 4] = [0xff; 4];
use arrow::record_batch::RecordBatch;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use floe_common::{Error, Result};

/// Serialize a schema as a standalone IPC message blob.
pub fn encode_schema(schema: &Schema) -> Result<String> {
    let options = IpcWriteOptions::default();
    let generator = IpcDataGenerator::default();
    let mut tracker = DictionaryTracker::new(true);
    let encoded = generator.schema_to_bytes_with_dictionary_tracker(schema, &mut tracker, &options);
    encode_message(encoded, &options)
}

/// Serialize a record batch as a standalone IPC message blob.
///
/// The batch always travels next to its encoded schema, so the blob holds
/// only the record batch message. Dictionary-encoded columns would need
/// extra dictionary messages and cannot be expressed as one standalone
/// message; they are rejected here.
pub fn encode_record_batch(batch: &RecordBatch) -> Result<String> {
    let options = IpcWriteOptions::default();
    let generator = IpcDataGenerator::default();
    let mut tracker = DictionaryTracker::new(true);
    let (dictionaries, encoded) = generator.encoded_batch(batch, &mut tracker, &options)?;
    if !dictionaries.is_empty() {
        return Err(Error::Codec(
            "dictionary-encoded columns cannot travel as a standalone record batch message"
                .to_string(),
        ));
    }
    encode_message(encoded, &options)
}

/// Parse a schema out of an encoded blob.
pub fn decode_schema(blob: &str) -> Result<SchemaRef> {
    let bytes = BASE64.decode(blob)?;
    let (metadata, _) = message_frame(&bytes)?;
    let message = root_as_message(metadata)
        .map_err(|e| Error::Codec(format!("invalid message flatbuffer: {e}")))?;
    let fb_schema = message
        .header_as_schema()
        .ok_or_else(|| Error::Codec("message does not carry a schema".to_string()))?;
    Ok(Arc::new(fb_to_schema(fb_schema)))
}

/// Parse a record batch out of an encoded blob against a known schema.
///
/// Schema and records always travel as a matched pair on this protocol,
/// so the caller supplies the schema and any schema information inside
/// the blob itself is ignored.
pub fn decode_record_batch(schema: SchemaRef, blob: &str) -> Result<RecordBatch> {
    let bytes = BASE64.decode(blob)?;
    let (metadata, body) = message_frame(&bytes)?;
    let message = root_as_message(metadata)
        .map_err(|e| Error::Codec(format!("invalid message flatbuffer: {e}")))?;
    let fb_batch = message
        .header_as_record_batch()
        .ok_or_else(|| Error::Codec("message does not carry a record batch".to_string()))?;
    let body = Buffer::from(body.to_vec());
    let batch = read_record_batch(&body, fb_batch, schema, &HashMap::new(), None, &message.version())?;
    Ok(batch)
}

/// Project columns out of a name -> array map in schema order.
///
/// Every schema column must be present in the map and all columns must
/// agree on length; either violation is a `SchemaMismatch` and no batch
/// is built.
pub fn build_record_batch(
    schema: SchemaRef,
    columns: &HashMap<String, ArrayRef>,
) -> Result<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let array = columns.get(field.name()).ok_or_else(|| {
            Error::schema_mismatch(format!(
                "column '{}' is missing from the supplied values",
                field.name()
            ))
        })?;
        arrays.push(Arc::clone(array));
    }
    if let Some(first) = arrays.first() {
        if arrays.iter().any(|a| a.len() != first.len()) {
            return Err(Error::schema_mismatch(
                "column lengths disagree across the batch",
            ));
        }
    }
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Frame one encoded message and base64 it without the continuation marker.
fn encode_message(encoded: EncodedData, options: &IpcWriteOptions) -> Result<String> {
    let mut frame = Vec::new();
    write_message(&mut frame, encoded, options)?;
    if frame.len() < 8 || frame[..4] != CONTINUATION_MARKER {
        return Err(Error::Codec(
            "ipc writer produced a frame without a continuation marker".to_string(),
        ));
    }
    Ok(BASE64.encode(&frame[4..]))
}

/// Split raw message bytes into (flatbuffer metadata, body).
///
/// Inbound blobs normally start directly at the metadata-length prefix,
/// but a leading continuation marker is tolerated.
fn message_frame(bytes: &[u8]) -> Result<(&[u8], &[u8])> {
    let mut offset = 0usize;
    if bytes.len() >= 4 && bytes[..4] == CONTINUATION_MARKER {
        offset = 4;
    }
    if bytes.len() < offset + 4 {
        return Err(Error::Codec("truncated message header".to_string()));
    }
    let metadata_len = i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]);
    if metadata_len <= 0 {
        return Err(Error::Codec(format!(
            "invalid metadata length: {metadata_len}"
        )));
    }
    let metadata_end = offset + 4 + metadata_len as usize;
    if bytes.len() < metadata_end {
        return Err(Error::Codec("truncated message metadata".to_string()));
    }
    Ok((&bytes[offset + 4..metadata_end], &bytes[metadata_end..]))
}
