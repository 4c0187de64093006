// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame encoding and the [`Messenger`] send/recv helpers.

use crate::channel::{ChannelKind, ChannelReader, ChannelWriter};
use crate::message::{Envelope, Identity, Message, MessageKind};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame. Job payloads travel through storage, not
/// the socket, so anything near this limit is a protocol violation.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Errors of the sheep message channel.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("channel i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode message: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("unexpected message type `{received}`, expected one of [{expected}]")]
    UnexpectedType { received: String, expected: String },
    #[error("peer closed the channel")]
    Closed,
    #[error("frame of {0} bytes exceeds the frame size limit")]
    FrameTooLarge(usize),
}

/// Write one frame: 4-byte big-endian length prefix + payload.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), MessageError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(MessageError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame written by [`write_frame`].
///
/// A clean close before the length prefix reads as [`MessageError::Closed`];
/// a close mid-frame is an i/o error.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, MessageError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(MessageError::Closed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(MessageError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Encode a message to its payload frame bytes.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, MessageError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode a payload frame back into a message.
pub fn decode_message(payload: &[u8]) -> Result<Message, MessageError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Static helpers for sending and receiving messages through channels.
pub struct Messenger;

impl Messenger {
    /// Encode the given message and send it to the given channel.
    ///
    /// Dealer-side sends carry the channel's own identity frame ahead of the
    /// payload so the router can route replies. Router-side replies go out
    /// as a bare payload frame on the connection named by `respond_to`.
    pub async fn send(
        writer: &mut ChannelWriter,
        message: &Message,
        respond_to: Option<&Envelope>,
    ) -> Result<(), MessageError> {
        let payload = encode_message(message)?;
        match writer.kind() {
            ChannelKind::Dealer => {
                let identity = writer.identity().as_bytes().to_vec();
                write_frame(writer.inner(), &identity).await?;
                write_frame(writer.inner(), &payload).await?;
            }
            ChannelKind::Router => {
                if let Some(env) = respond_to {
                    if env.identity.is_empty() {
                        tracing::warn!(
                            kind = %message.kind(),
                            "router reply without a routing identity"
                        );
                    }
                }
                write_frame(writer.inner(), &payload).await?;
            }
        }
        Ok(())
    }

    /// Receive, decode and return one message from the given channel.
    ///
    /// On router channels the leading identity frame is consumed into the
    /// envelope. With a non-empty `expected`, a decoded message of any other
    /// kind fails with [`MessageError::UnexpectedType`].
    pub async fn recv(
        reader: &mut ChannelReader,
        expected: &[MessageKind],
    ) -> Result<Envelope, MessageError> {
        let identity = match reader.kind() {
            ChannelKind::Router => Identity::new(read_frame(reader.inner()).await?),
            ChannelKind::Dealer => Identity::default(),
        };
        let payload = read_frame(reader.inner()).await?;
        let message = decode_message(&payload)?;

        if !expected.is_empty() && !expected.contains(&message.kind()) {
            return Err(MessageError::UnexpectedType {
                received: message.kind().to_string(),
                expected: expected
                    .iter()
                    .map(MessageKind::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(Envelope { message, identity })
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
