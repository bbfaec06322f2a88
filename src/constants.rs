//! GSM protocol constants
//!
//! Timer defaults, channel-request decode masks, and wire-format constants
//! drawn from GSM 04.06, 04.08, and 05.08. These are the compile-time
//! defaults; `BtsConfig` (see `config`) can override the timer values at
//! startup.

use std::time::Duration;

// ---------------------------------------------------------------------
// LAPDm timers, GSM 04.06 §5.8
// ---------------------------------------------------------------------

/// T200 initial value for SDCCH, GSM 04.06 Table 3.
pub const T200_SDCCH: Duration = Duration::from_millis(900);
/// T200 initial value for FACCH.
pub const T200_FACCH: Duration = Duration::from_millis(900);
/// T200 initial value for SACCH.
pub const T200_SACCH: Duration = Duration::from_millis(3600);

/// N200 retransmission limit for SDCCH.
pub const N200_SDCCH: u32 = 23;
/// N200 retransmission limit for SACCH.
pub const N200_SACCH: u32 = 5;
/// N200 retransmission limit for FACCH.
pub const N200_FACCH: u32 = 34;

/// N201 max I-frame payload, in bytes, for SDCCH/FACCH (GSM 04.06 §5.8.3).
pub const N201_DCCH: usize = 20;
/// N201 max I-frame payload, in bytes, for SACCH.
pub const N201_SACCH: usize = 18;

// ---------------------------------------------------------------------
// RR channel-lifecycle timers, GSM 04.08 / 05.08
// ---------------------------------------------------------------------

/// T3101: initial assignment, armed when an Immediate Assignment is sent.
pub const T3101_DEFAULT: Duration = Duration::from_secs(4);
/// T3109: radio link loss hold-off. Must exceed RADIO_LINK_TIMEOUT * 0.48s.
pub const T3109_DEFAULT: Duration = Duration::from_secs(30);
/// T3111: post-release hold-off, nominally 2*T200.
pub const T3111_DEFAULT: Duration = Duration::from_millis(2 * 900);
/// T3113: paging response timeout.
pub const T3113_DEFAULT: Duration = Duration::from_secs(10);
/// T3122: RACH congestion back-off, MS-side, encoded 1-255s in Immediate
/// Assignment Reject. No longer independently configurable (spec §9).
pub const T3122_DEFAULT_SECS: u8 = 5;

/// One GSM TDMA frame period.
pub const FRAME_PERIOD_US: u64 = 4615;

/// Default radio-link-timeout: consecutive bad SACCH periods tolerated
/// before T3109 is armed, GSM 05.08 §5.2.
pub const RADIO_LINK_TIMEOUT_DEFAULT: i32 = 15;

// ---------------------------------------------------------------------
// Handover defaults, GSM 05.08
// ---------------------------------------------------------------------

pub const HANDOVER_MARGIN_DEFAULT: i32 = 10;
pub const HANDOVER_RXLEV_TARGET_DEFAULT: i32 = -85;
pub const HANDOVER_HISTORY_DEFAULT: usize = 4;
pub const HANDOVER_HISTORY_MAX_DEFAULT: usize = 32;
pub const HANDOVER_PENALTY_TIME_DEFAULT_SECS: u64 = 20;

/// "No neighbour data available" sentinel in a Measurement Report.
pub const NO_NCELL_SENTINEL: u8 = 7;
/// Reserved neighbour frequency index, must be dropped.
pub const RESERVED_FREQ_INDEX: u8 = 31;

// ---------------------------------------------------------------------
// RACH / MS power defaults
// ---------------------------------------------------------------------

pub const MS_TA_MAX_DEFAULT: i32 = 62;
pub const RACH_TX_INTEGER_DEFAULT: u32 = 10;
/// `sMaxAge`: how long a RACH response may sit queued (or a triaged burst
/// sit undetected) before it's discarded as stale -- two 51-multiframe
/// periods, GSM 05.02 §6.5.3.
pub const RACH_S_MAX_AGE: Duration = Duration::from_millis((51 * FRAME_PERIOD_US / 1000) * 2);

// ---------------------------------------------------------------------
// GSM time, GSM 05.02 §4.3
// ---------------------------------------------------------------------

/// Hyperframe modulus: 26 * 51 * 2048.
pub const GSM_HYPERFRAME: u32 = 26 * 51 * 2048;

// ---------------------------------------------------------------------
// CBCH / SMSCB, GSM 04.12 §3.3.1
// ---------------------------------------------------------------------

pub const SMSCB_PAGE_LEN: usize = 88;
pub const SMSCB_BLOCK_LEN: usize = 22;
pub const SMSCB_BLOCKS_PER_PAGE: usize = 4;
