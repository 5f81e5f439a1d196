// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Wire format for the dispatcher <-> sheep control connection.
//!
//! Each message is a ZeroMQ multipart frame pair `[header, payload]`. The
//! header is a small fixed-layout byte buffer; the payload is JSON,
//! shaped differently per opcode. Job ids here are caller-chosen strings
//! rather than integers, so the header carries a length-prefixed id
//! instead of a fixed-width one.

use crate::error::ProtocolError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use shepherd_core::JobId;
use std::io::Cursor;

/// Wire protocol version. Bumped whenever the header layout changes.
pub const PROTOCOL_VERSION: u8 = 1;

/// Control-connection opcodes.
///
/// `Identify` is sheep -> dispatcher only, sent once on connect.
/// `Input` is dispatcher -> sheep: "process this job".
/// `Done`/`Error` are sheep -> dispatcher: the job's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Identify = 1,
    Input = 2,
    Done = 3,
    Error = 4,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(OpCode::Identify),
            2 => Ok(OpCode::Input),
            3 => Ok(OpCode::Done),
            4 => Ok(OpCode::Error),
            other => Err(ProtocolError::InvalidOpCode(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Fixed-ish-layout header: `[VERSION:1][OPCODE:1][JOB_ID_LEN:2][JOB_ID bytes]`.
/// An empty job id (len 0) is valid for `Identify`, which precedes any job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub opcode: OpCode,
    pub job_id: Option<JobId>,
}

impl MessageHeader {
    pub fn pack(&self) -> Vec<u8> {
        let job_id_bytes = self
            .job_id
            .as_ref()
            .map(|id| id.as_str().as_bytes())
            .unwrap_or(&[]);
        let mut buf = Vec::with_capacity(4 + job_id_bytes.len());
        // write_all on a Vec<u8> never fails; these unwraps cannot panic in practice.
        buf.write_u8(PROTOCOL_VERSION).unwrap_or(());
        buf.write_u8(self.opcode.as_u8()).unwrap_or(());
        buf.write_u16::<BigEndian>(job_id_bytes.len() as u16).unwrap_or(());
        buf.extend_from_slice(job_id_bytes);
        buf
    }

    pub fn unpack(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < 4 {
            return Err(ProtocolError::HeaderTooShort {
                expected: 4,
                got: data.len(),
            });
        }
        let mut cursor = Cursor::new(data);
        let version = cursor.read_u8()?;
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got: version,
            });
        }
        let op_raw = cursor.read_u8()?;
        let opcode = OpCode::from_u8(op_raw)?;
        let job_id_len = cursor.read_u16::<BigEndian>()? as usize;
        let remaining = &data[4..];
        if remaining.len() < job_id_len {
            return Err(ProtocolError::HeaderTooShort {
                expected: 4 + job_id_len,
                got: data.len(),
            });
        }
        let job_id = if job_id_len == 0 {
            None
        } else {
            let text = std::str::from_utf8(&remaining[..job_id_len])
                .map_err(|_| ProtocolError::Malformed("job id is not valid utf-8".into()))?;
            Some(JobId::parse(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?)
        };
        Ok(Self { opcode, job_id })
    }
}

/// A complete decoded message: header plus its JSON payload bytes.
#[derive(Debug, Clone)]
pub struct Message {
    pub header: MessageHeader,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(header: MessageHeader, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    pub fn unpack(frames: &[Vec<u8>]) -> Result<Self, ProtocolError> {
        let [header_frame, payload_frame] = frames else {
            return Err(ProtocolError::Malformed(format!(
                "expected 2 frames, got {}",
                frames.len()
            )));
        };
        let header = MessageHeader::unpack(header_frame)?;
        Ok(Self {
            header,
            payload: payload_frame.clone(),
        })
    }
}

/// Sent once by a sheep immediately after connecting, identifying itself
/// and announcing the GPU count it can offer the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub sheep_id: String,
    pub available_gpus: u32,
}

/// Sent by the dispatcher to hand a sheep a job to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPayload {
    /// Root path (mounted or staged) under which the sheep should read its
    /// input and write its output, matching the storage adapter's staging
    /// layout for this job.
    pub io_data_root: String,
}

/// Sent by a sheep when a job completed without error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonePayload {
    pub output_key: String,
}

/// Sent by a sheep when a job raised an exception, or by either side to
/// report a protocol-level problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessagePayload {
    pub short_message: String,
    pub long_trace: String,
    pub exception_type: String,
}
