//! # Error taxonomy
//!
//! Mirrors the fault classes of the radio-protocol stack: bit/byte bounds
//! faults, malformed L3 messages, LAPDm protocol errors, and RACH admission
//! failures. Message-level faults are always returned as `Err`, never
//! panics; `debug_assert!` catches internal invariant violations in debug
//! builds without changing control flow in release (see `BitVector`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BtsError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BtsError {
    /// Access past the logical size or allocation bound of a BitVector/ByteVector.
    #[error("bit/byte bounds fault: {0}")]
    BitBoundsFault(String),

    /// The frame is shorter than the header it claims to carry.
    #[error("frame too short: need {need} bytes, have {have}")]
    FrameTooShort { need: usize, have: usize },

    /// Parse failure distinct from "message not for me" (§4.2).
    #[error("malformed L3 message: {reason}")]
    MalformedL3 { reason: String },

    /// The (PD, MTI) pair does not match any known message.
    #[error("unknown L3 message type: PD=0x{pd:02x} MTI=0x{mti:02x}")]
    UnknownMessageType { pd: u8, mti: u8 },

    /// A mandatory information element was absent.
    #[error("mandatory IE missing: {name}")]
    MandatoryIeMissing { name: &'static str },

    /// An information element carried a value the spec forbids.
    #[error("reserved IE value in {name}: 0x{value:02x}")]
    ReservedIeValue { name: &'static str, value: u8 },

    /// Unexpected frame/event in the current LAPDm state, or an
    /// unrecoverable frame-number gap.
    #[error("LAPDm protocol error: {detail}")]
    LapdmProtocolError { detail: String },

    /// RACH aged past `sMaxAge` before it could be serviced.
    #[error("RACH discarded: older than sMaxAge")]
    RachTooOld,

    /// RACH arrived while the BTS is in hold-off.
    #[error("RACH rejected: BTS hold-off")]
    RachRejectedHoldoff,

    /// RACH timing error exceeded `GSM.MS.TA.Max`.
    #[error("RACH rejected: timing error {te} exceeds MS.TA.Max {max}")]
    RachTimingExceeded { te: i32, max: i32 },
}
