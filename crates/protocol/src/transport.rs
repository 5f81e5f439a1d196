// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! ZeroMQ ROUTER/DEALER transport for the control connection.
//!
//! The dispatcher binds a `RouterSocket`; each sheep connects a
//! `DealerSocket`. ROUTER prepends the sending peer's routing id to every
//! inbound multipart message and requires it as the first frame of every
//! outbound one, so a dispatcher-side message on the wire is
//! `[routing_id, header, payload]` while a sheep only ever sees
//! `[header, payload]`.

use crate::error::ProtocolError;
use crate::message::{Message, MessageHeader};
use bytes::Bytes;
use zeromq::{DealerSocket, RouterSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// A sheep's ZeroMQ routing id, opaque to everything above this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingId(pub Bytes);

/// Dispatcher-side half of the control connection: one ROUTER socket
/// shared by every connected sheep.
pub struct Listener {
    socket: RouterSocket,
}

impl Listener {
    pub async fn bind(addr: &str) -> Result<Self, ProtocolError> {
        let mut socket = RouterSocket::new();
        socket
            .bind(addr)
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        Ok(Self { socket })
    }

    /// Receive the next message from any connected sheep.
    pub async fn recv(&mut self) -> Result<(RoutingId, Message), ProtocolError> {
        let zmq_msg = self
            .socket
            .recv()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        let frames: Vec<Bytes> = zmq_msg.into_vec().into_iter().collect();
        if frames.len() != 3 {
            return Err(ProtocolError::Malformed(format!(
                "expected 3 frames [routing_id, header, payload], got {}",
                frames.len()
            )));
        }
        let routing_id = RoutingId(frames[0].clone());
        let message = Message::unpack(&[frames[1].to_vec(), frames[2].to_vec()])?;
        Ok((routing_id, message))
    }

    /// Send a message to a specific sheep by its routing id.
    pub async fn send(
        &mut self,
        to: &RoutingId,
        header: MessageHeader,
        payload: Vec<u8>,
    ) -> Result<(), ProtocolError> {
        let zmq_msg = ZmqMessage::try_from(vec![
            to.0.clone(),
            Bytes::from(header.pack()),
            Bytes::from(payload),
        ])
        .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        self.socket
            .send(zmq_msg)
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))
    }
}

/// Sheep-side half of the control connection. Used by the integration
/// test harness under the `test-support` feature to stand in for a real
/// sheep process during engine tests.
#[cfg(any(test, feature = "test-support"))]
pub struct DealerConnection {
    socket: DealerSocket,
}

#[cfg(any(test, feature = "test-support"))]
impl DealerConnection {
    pub async fn connect(addr: &str) -> Result<Self, ProtocolError> {
        let mut socket = DealerSocket::new();
        socket
            .connect(addr)
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        Ok(Self { socket })
    }

    pub async fn send(&mut self, header: MessageHeader, payload: Vec<u8>) -> Result<(), ProtocolError> {
        let zmq_msg = ZmqMessage::try_from(vec![Bytes::from(header.pack()), Bytes::from(payload)])
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        self.socket
            .send(zmq_msg)
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))
    }

    pub async fn recv(&mut self) -> Result<Message, ProtocolError> {
        let zmq_msg = self
            .socket
            .recv()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        let frames: Vec<Vec<u8>> = zmq_msg.into_vec().into_iter().map(|b| b.to_vec()).collect();
        Message::unpack(&frames)
    }
}
