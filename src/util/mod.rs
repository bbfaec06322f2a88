//! # Utility Modules
//!
//! Small helpers shared across the radio-protocol stack that don't belong
//! to any one subsystem.

pub mod hex;

pub use hex::{decode_hex, encode_hex, format_hex_compact, hex_to_bytes, pretty_hex};
