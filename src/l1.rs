//! Layer 1 collaborator interface.
//!
//! Everything below the radio-resource/LAPDm boundary -- channel coding,
//! interleaving, burst formatting, ciphering -- lives outside this crate's
//! scope (it is the FEC/RF front-end's job). `L1Link` is the trait a
//! logical channel holds onto to push frames down and learn about link
//! quality without knowing anything about the underlying hardware.

use crate::bitvec::BitVector;
use crate::error::Result;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L1DecoderStats {
    pub frames_good: u64,
    pub frames_bad: u64,
    pub fer_percent: u8,
}

/// What a logical channel's L1 collaborator exposes upward. Production
/// implementations wrap the actual transceiver; tests use an in-memory
/// loopback (`LoopbackL1`) so the channel/LAPDm machinery can run without
/// real radio hardware.
pub trait L1Link: Send {
    /// Push one 184-bit-equivalent radio block down to the air interface.
    fn write_high_side(&mut self, frame: &BitVector) -> Result<()>;

    /// Upcall: a decoded 184-bit radio block received from the air
    /// interface, if one is waiting. The channel's service loop polls this
    /// once per frame period and feeds whatever comes back into its LAPDm
    /// entities via `LogicalChannel::l2_receive_frame`.
    fn read_low_side(&mut self) -> Option<BitVector>;

    fn decoder_stats(&self) -> L1DecoderStats;

    /// True while a handover to another cell is in progress on this
    /// channel; LAPDm suppresses idle filling while this holds so the MS
    /// doesn't see a spurious idle frame mid-handover.
    fn handover_pending(&self) -> bool;
}

/// In-memory stand-in used by tests and by the `sim` feature's fake-RACH
/// path: frames written "down" are simply recorded for inspection, and
/// frames queued with `push_received` stand in for the air interface
/// delivering an uplink block.
#[derive(Default)]
pub struct LoopbackL1 {
    pub sent: Vec<BitVector>,
    pub received: VecDeque<BitVector>,
    pub handover_pending: bool,
}

impl LoopbackL1 {
    /// Test/sim support: queue a block as though it had just arrived from
    /// the air interface, to be drained by the next `read_low_side` call.
    pub fn push_received(&mut self, frame: BitVector) {
        self.received.push_back(frame);
    }
}

impl L1Link for LoopbackL1 {
    fn write_high_side(&mut self, frame: &BitVector) -> Result<()> {
        self.sent.push(frame.clone());
        Ok(())
    }

    fn read_low_side(&mut self) -> Option<BitVector> {
        self.received.pop_front()
    }

    fn decoder_stats(&self) -> L1DecoderStats {
        L1DecoderStats {
            frames_good: self.sent.len() as u64,
            frames_bad: 0,
            fer_percent: 0,
        }
    }

    fn handover_pending(&self) -> bool {
        self.handover_pending
    }
}
