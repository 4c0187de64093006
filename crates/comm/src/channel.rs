// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dealer/router channel endpoints over TCP.
//!
//! The engine side is the dealer: it connects to a sheep's port and stamps
//! every outbound message with its identity. The runner side is the router:
//! it listens, reads the identity frame ahead of each payload and uses it to
//! address replies. Splitting a channel lets writes (feeder) and reads
//! (listener) be owned independently.

use crate::message::{Envelope, Identity, Message, MessageKind};
use crate::wire::{MessageError, Messenger};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

/// Which end of the dealer/router pair a channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Dealer,
    Router,
}

/// Read half of a channel.
pub struct ChannelReader {
    kind: ChannelKind,
    inner: OwnedReadHalf,
}

impl ChannelReader {
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub(crate) fn inner(&mut self) -> &mut OwnedReadHalf {
        &mut self.inner
    }

    /// Receive one message, checking it against the expected kinds.
    pub async fn recv(&mut self, expected: &[MessageKind]) -> Result<Envelope, MessageError> {
        Messenger::recv(self, expected).await
    }
}

/// Write half of a channel.
pub struct ChannelWriter {
    kind: ChannelKind,
    identity: Identity,
    inner: OwnedWriteHalf,
}

impl ChannelWriter {
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// The identity stamped on dealer-side sends.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub(crate) fn inner(&mut self) -> &mut OwnedWriteHalf {
        &mut self.inner
    }

    /// Send one message; router-side replies are routed by `respond_to`.
    pub async fn send(
        &mut self,
        message: &Message,
        respond_to: Option<&Envelope>,
    ) -> Result<(), MessageError> {
        Messenger::send(self, message, respond_to).await
    }
}

/// A bidirectional channel endpoint.
pub struct Channel {
    reader: ChannelReader,
    writer: ChannelWriter,
}

impl Channel {
    /// Connect a dealer channel to a listening router.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        identity: Identity,
    ) -> Result<Self, MessageError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream, ChannelKind::Dealer, identity))
    }

    fn from_stream(stream: TcpStream, kind: ChannelKind, identity: Identity) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: ChannelReader { kind, inner: read },
            writer: ChannelWriter { kind, identity, inner: write },
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.reader.kind
    }

    /// Split into independently owned read and write halves.
    pub fn split(self) -> (ChannelReader, ChannelWriter) {
        (self.reader, self.writer)
    }

    /// Send one message on this channel.
    pub async fn send(
        &mut self,
        message: &Message,
        respond_to: Option<&Envelope>,
    ) -> Result<(), MessageError> {
        self.writer.send(message, respond_to).await
    }

    /// Receive one message from this channel.
    pub async fn recv(&mut self, expected: &[MessageKind]) -> Result<Envelope, MessageError> {
        self.reader.recv(expected).await
    }
}

/// Router-side listener for incoming dealer connections.
pub struct RouterListener {
    inner: TcpListener,
}

impl RouterListener {
    /// Bind on the given address.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, MessageError> {
        Ok(Self { inner: TcpListener::bind(addr).await? })
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, MessageError> {
        Ok(self.inner.local_addr()?)
    }

    /// Accept the next dealer connection as a router channel.
    pub async fn accept(&self) -> Result<Channel, MessageError> {
        let (stream, _) = self.inner.accept().await?;
        stream.set_nodelay(true)?;
        Ok(Channel::from_stream(stream, ChannelKind::Router, Identity::default()))
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
