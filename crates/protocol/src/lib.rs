// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Wire protocol and ZeroMQ transport for the dispatcher <-> sheep
//! control connection.

pub mod error;
pub mod message;
pub mod transport;

pub use error::ProtocolError;
pub use message::{
    DonePayload, ErrorMessagePayload, IdentifyPayload, InputPayload, Message, MessageHeader,
    OpCode, PROTOCOL_VERSION,
};
pub use transport::{Listener, RoutingId};

#[cfg(any(test, feature = "test-support"))]
pub use transport::DealerConnection;
