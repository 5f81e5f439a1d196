// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Process-startup failures: everything that can go wrong before the
//! HTTP listener is accepting connections. Distinct from `ShepherdError`,
//! which covers request-time failures once the daemon is running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] shepherd_core::ConfigError),

    #[error("failed to bind sheep {sheep_id} listener at {endpoint}: {source}")]
    ListenerBind {
        sheep_id: String,
        endpoint: String,
        #[source]
        source: shepherd_protocol::ProtocolError,
    },

    #[error("failed to bind HTTP listener at {addr}: {source}")]
    HttpBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}
