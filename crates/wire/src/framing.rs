// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing shared by the robot and control channels.

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame accepted on read, to bound memory against a misbehaving peer.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge(u32),
    #[error("connection closed mid-frame")]
    ConnectionClosed,
    #[error("json encode/decode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a value to raw JSON bytes. No length prefix — callers that
/// write to a stream go through [`write_message`].
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a value from raw JSON bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write `payload` with a 4-byte big-endian length prefix.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge(u32::MAX))?;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed payload. Returns [`ProtocolError::ConnectionClosed`]
/// if the peer closes before a length prefix arrives (clean EOF between frames).
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(ProtocolError::ConnectionClosed),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Encode and write a typed message in one step.
pub async fn write_typed<W: AsyncWrite + Unpin, T: Serialize>(writer: &mut W, value: &T) -> Result<(), ProtocolError> {
    let bytes = encode(value)?;
    write_message(writer, &bytes).await
}

/// Read and decode a typed message in one step.
pub async fn read_typed<R: AsyncRead + Unpin, T: DeserializeOwned>(reader: &mut R) -> Result<T, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Request;

    #[test]
    fn encode_returns_json_without_length_prefix() {
        let encoded = encode(&Request::Metrics).expect("encode failed");
        let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
        assert!(json_str.starts_with('{'), "should be JSON object: {json_str}");
    }

    #[tokio::test]
    async fn read_write_message_roundtrip() {
        let original = b"hello world";
        let mut buffer = Vec::new();
        write_message(&mut buffer, original).await.expect("write failed");
        assert_eq!(buffer.len(), 4 + original.len());

        let mut cursor = std::io::Cursor::new(buffer);
        let read_back = read_message(&mut cursor).await.expect("read failed");
        assert_eq!(read_back, original);
    }

    #[tokio::test]
    async fn write_message_adds_big_endian_length_prefix() {
        let data = b"test data";
        let mut buffer = Vec::new();
        write_message(&mut buffer, data).await.expect("write failed");

        let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
        assert_eq!(len, data.len());
        assert_eq!(&buffer[4..], data);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_on_read() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buffer);
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
    }

    #[tokio::test]
    async fn eof_before_length_prefix_is_connection_closed() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));
    }

    #[tokio::test]
    async fn typed_roundtrip_preserves_value() {
        let mut buffer = Vec::new();
        write_typed(&mut buffer, &Request::Metrics).await.unwrap();
        let mut cursor = std::io::Cursor::new(buffer);
        let back: Request = read_typed(&mut cursor).await.unwrap();
        assert_eq!(back, Request::Metrics);
    }
}
