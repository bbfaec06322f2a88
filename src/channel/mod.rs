//! Logical channel container, GSM 04.08 §3 / GSM 05.08 §5.
//!
//! A logical channel bundles its L1 collaborator with the LAPDm entities
//! that run on it (SAPI0 for RR/MM/CC, SAPI3 for SMS) and the RR
//! channel-lifecycle timers that govern when it can be recycled back into
//! the free pool. One channel owns exactly one OS thread in the full
//! system; this struct is the state that thread's loop operates on.

use crate::constants::{T3101_DEFAULT, T3109_DEFAULT, T3111_DEFAULT, T3113_DEFAULT};
use crate::error::{BtsError, Result};
use crate::instrumentation;
use crate::l1::L1Link;
use crate::l2::{L2Frame, Primitive, Sapi};
use crate::lapdm::{ChannelKind, LapdmEntity};
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLifecycleState {
    Idle,
    WaitingForAssignmentAck,
    Active,
    WaitingForRelease,
    Recycling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    T3101,
    T3109,
    T3111,
    T3113,
}

struct TimerState {
    deadline: Option<Instant>,
}

/// A channel's RR-layer lifecycle timers, each independently armed and
/// cleared as the channel moves through assignment/release.
pub struct ChannelTimers {
    timers: Mutex<[TimerState; 4]>,
}

impl ChannelTimers {
    fn index(kind: TimerKind) -> usize {
        match kind {
            TimerKind::T3101 => 0,
            TimerKind::T3109 => 1,
            TimerKind::T3111 => 2,
            TimerKind::T3113 => 3,
        }
    }

    fn default_duration(kind: TimerKind) -> Duration {
        match kind {
            TimerKind::T3101 => T3101_DEFAULT,
            TimerKind::T3109 => T3109_DEFAULT,
            TimerKind::T3111 => T3111_DEFAULT,
            TimerKind::T3113 => T3113_DEFAULT,
        }
    }

    pub fn new() -> Self {
        ChannelTimers {
            timers: Mutex::new([
                TimerState { deadline: None },
                TimerState { deadline: None },
                TimerState { deadline: None },
                TimerState { deadline: None },
            ]),
        }
    }

    pub fn arm(&self, kind: TimerKind) {
        let mut g = self.timers.lock().unwrap();
        g[Self::index(kind)].deadline = Some(Instant::now() + Self::default_duration(kind));
    }

    pub fn clear(&self, kind: TimerKind) {
        self.timers.lock().unwrap()[Self::index(kind)].deadline = None;
    }

    pub fn expired(&self, kind: TimerKind) -> bool {
        matches!(self.timers.lock().unwrap()[Self::index(kind)].deadline, Some(d) if Instant::now() >= d)
    }
}

impl Default for ChannelTimers {
    fn default() -> Self {
        Self::new()
    }
}

/// Radio-link-failure counter, GSM 05.08 §5.2: a running total that climbs
/// on each bad SACCH block and decays on good ones, armed against
/// RADIO-LINK-TIMEOUT*4 (four SACCH multiframes per "radio link timeout"
/// unit).
pub struct RadioLinkCounter {
    value: AtomicI32,
    ceiling: i32,
}

impl RadioLinkCounter {
    pub fn new(radio_link_timeout: i32) -> Self {
        let ceiling = radio_link_timeout * 4;
        RadioLinkCounter {
            value: AtomicI32::new(ceiling),
            ceiling,
        }
    }

    /// Records one SACCH period's outcome; returns `true` once the counter
    /// has run out and T3109 should be armed.
    pub fn record(&self, decodable: bool) -> bool {
        if decodable {
            let v = self.value.load(Ordering::Relaxed);
            if v < self.ceiling {
                self.value.store((v + 2).min(self.ceiling), Ordering::Relaxed);
            }
            false
        } else {
            let v = self.value.fetch_sub(1, Ordering::Relaxed) - 1;
            v <= 0
        }
    }

    pub fn reset(&self) {
        self.value.store(self.ceiling, Ordering::Relaxed);
    }
}

pub struct LogicalChannel {
    pub sapi0: LapdmEntity,
    pub sapi3: LapdmEntity,
    pub l1: Mutex<Box<dyn L1Link>>,
    pub timers: ChannelTimers,
    pub radio_link: RadioLinkCounter,
    state: Mutex<ChannelLifecycleState>,
    recyclable: std::sync::atomic::AtomicBool,
    sequence: AtomicU32,
}

impl LogicalChannel {
    pub fn new(kind: ChannelKind, l1: Box<dyn L1Link>, radio_link_timeout: i32) -> Self {
        LogicalChannel {
            sapi0: LapdmEntity::new(crate::l2::Sapi::RrMmCc, kind),
            sapi3: LapdmEntity::new(crate::l2::Sapi::Sms, kind),
            l1: Mutex::new(l1),
            timers: ChannelTimers::new(),
            radio_link: RadioLinkCounter::new(radio_link_timeout),
            state: Mutex::new(ChannelLifecycleState::Idle),
            recyclable: std::sync::atomic::AtomicBool::new(true),
            sequence: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> ChannelLifecycleState {
        *self.state.lock().unwrap()
    }

    pub fn set_state(&self, new_state: ChannelLifecycleState) {
        *self.state.lock().unwrap() = new_state;
        if new_state == ChannelLifecycleState::Idle {
            self.recyclable.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_recyclable(&self) -> bool {
        self.recyclable.load(Ordering::Relaxed)
    }

    pub fn mark_not_recyclable(&self) {
        self.recyclable.store(false, Ordering::Relaxed);
    }

    /// `l2_send_frame`: push an already-built L2 frame straight to L1,
    /// bumping the diagnostic sequence counter.
    pub fn l2_send_frame(&self, frame: &L2Frame) -> Result<()> {
        self.sequence.fetch_add(1, Ordering::Relaxed);
        let bv = frame.to_bitvector()?;
        self.l1.lock().unwrap().write_high_side(&bv)
    }

    /// `l2_send_message`: hand an L3 payload to the appropriate SAPI's
    /// LAPDm entity, segmenting it if needed, and push the resulting
    /// I-frame(s) to L1 in order.
    pub fn l2_send_message(&self, sapi: crate::l2::Sapi, l3_payload: Vec<u8>) -> Result<()> {
        let entity = match sapi {
            crate::l2::Sapi::RrMmCc => &self.sapi0,
            crate::l2::Sapi::Sms => &self.sapi3,
        };
        let frames = entity.send_data(l3_payload)?;
        for frame in &frames {
            self.l2_send_frame(frame)?;
        }
        Ok(())
    }

    /// `l2_send_primitive`: the UI/idle-fill path for when nothing is
    /// queued -- used by the owning thread's per-frame service loop.
    pub fn l2_send_primitive(&self, primitive: Primitive) -> Result<()> {
        if primitive != Primitive::L2Data {
            return Err(BtsError::LapdmProtocolError {
                detail: "only L2Data (idle fill) is a bare primitive send".into(),
            });
        }
        let frame = self.sapi0.idle_fill();
        self.l2_send_frame(&frame)
    }

    /// Arms the timers appropriate to a freshly issued Immediate
    /// Assignment, per GSM 04.08 §3.3.1.
    pub fn on_assignment_sent(&self) {
        self.timers.arm(TimerKind::T3101);
        self.set_state(ChannelLifecycleState::WaitingForAssignmentAck);
        self.mark_not_recyclable();
    }

    /// Called once per SACCH measurement period; records radio-link health
    /// and arms T3109 if the link has failed, per GSM 05.08 §5.2-5.3.
    pub fn on_sacch_period(&self, decodable: bool) {
        if self.radio_link.record(decodable) {
            instrumentation::incr("channel_radio_link_failures");
            self.timers.arm(TimerKind::T3109);
        }
    }

    /// Bottom-up path: an inbound L2 frame arrived from L1. Dispatches by
    /// SAPI to the matching LAPDm entity, transmits any reply the entity
    /// produces (UA, RR, REJ, ...), and returns whatever L3 payload should
    /// be indicated upstream to the control plane.
    pub fn l2_receive_frame(&self, frame: &L2Frame) -> Result<Option<Vec<u8>>> {
        let entity = match frame.address.sapi {
            Sapi::RrMmCc => &self.sapi0,
            Sapi::Sms => &self.sapi3,
        };
        let (indication, reply) = entity.receive(frame)?;
        if let Some(reply) = &reply {
            self.l2_send_frame(reply)?;
        }
        Ok(indication)
    }

    /// Called once per frame period by the channel's owning thread: drains
    /// one decoded block from L1's upcall, if any is waiting, and feeds it
    /// through `l2_receive_frame`.
    pub fn service_rx_once(&self) -> Result<Option<Vec<u8>>> {
        let maybe_bv = self.l1.lock().unwrap().read_low_side();
        let Some(bv) = maybe_bv else {
            return Ok(None);
        };
        let frame = L2Frame::from_bitvector(&bv, Primitive::L2Data)?;
        self.l2_receive_frame(&frame)
    }

    /// Polls both SAPIs' T200 retransmission timers, pushing any
    /// retransmitted frame straight back out to L1.
    pub fn service_timers(&self) -> Result<()> {
        for entity in [&self.sapi0, &self.sapi3] {
            if let Some(frame) = entity.poll_t200()? {
                self.l2_send_frame(&frame)?;
            }
        }
        Ok(())
    }
}
