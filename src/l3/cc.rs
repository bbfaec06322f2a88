//! Call Control messages, GSM 04.08 §9.3.
//!
//! The BTS core relays CC transparently between the air interface and the
//! core network; it only needs to recognise message boundaries, not
//! interpret call state, so this catalogue covers the handful of messages
//! referenced elsewhere in the stack (RR channel release timing waits for
//! `ReleaseComplete`) rather than the full CC state machine.

use crate::error::{BtsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcMessageType {
    Setup,
    Connect,
    ReleaseComplete,
}

impl CcMessageType {
    pub fn to_byte(self) -> u8 {
        match self {
            CcMessageType::Setup => 0x05,
            CcMessageType::Connect => 0x07,
            CcMessageType::ReleaseComplete => 0x2a,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            0x05 => CcMessageType::Setup,
            0x07 => CcMessageType::Connect,
            0x2a => CcMessageType::ReleaseComplete,
            other => return Err(BtsError::UnknownMessageType { pd: 0x03, mti: other }),
        })
    }
}

/// Opaque CC payload: carried as-is, since the BTS has no business
/// interpreting dialled digits or bearer capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcPayload(pub Vec<u8>);

impl CcPayload {
    pub fn encode(&self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(CcPayload(bytes.to_vec()))
    }
}
