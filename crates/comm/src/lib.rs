// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message protocol between the shepherd engine and sheep runners.
//!
//! Wire format: every logical message is one JSON payload frame, each frame
//! being a 4-byte length prefix (big-endian) followed by the payload bytes.
//! On the router (worker) side an identity frame precedes the payload, so
//! replies can be routed back to the engine connection they came from.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod channel;
mod message;
mod wire;

pub use channel::{Channel, ChannelKind, ChannelReader, ChannelWriter, RouterListener};
pub use message::{Envelope, Identity, Message, MessageKind};
pub use wire::{
    decode_message, encode_message, read_frame, write_frame, MessageError, Messenger,
    MAX_FRAME_LEN,
};
