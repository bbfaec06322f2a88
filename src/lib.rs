//! # gsm-bts-core
//!
//! Layered GSM radio-protocol stack core for a base station controller:
//! bit-addressable primitives, the LAPDm link layer, L3 message codecs for
//! RR/MM/CC/SS/SMS/GPRS, TDMA mapping, CCCH scheduling, RR channel
//! lifecycle, and SACCH-driven measurement/handover.
//!
//! ## Usage
//!
//! ```rust
//! use gsm_bts_core::{init_logger, log_info};
//!
//! init_logger();
//! log_info("bts core initialized");
//! ```

pub mod bitvec;
pub mod bts;
pub mod ccch;
pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod instrumentation;
pub mod l1;
pub mod l2;
pub mod l3;
pub mod lapdm;
pub mod logging;
pub mod measurement;
pub mod rr_frontend;
pub mod tdma;
pub mod time;
pub mod util;

pub use crate::error::BtsError;
pub use crate::logging::{init_logger, log_info};
