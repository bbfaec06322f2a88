//! The BTS context: the one piece of shared state every worker thread
//! holds a reference to, replacing the original implementation's file-scope
//! global singletons (`gBTS`, `gReports`, ...) with an explicit struct that
//! gets constructed once at startup and handed around as `Arc<BtsContext>`.

use crate::ccch::CcchScheduler;
use crate::channel::LogicalChannel;
use crate::config::BtsConfig;
use crate::l3::ie::Lai;
use crate::measurement::MeasurementEngine;
use crate::tdma::{ChannelCombination, FrameRole, MultiframeMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

/// Everything a worker thread needs: the configuration it was started
/// with, the channel pool, the CCCH queues, and per-channel measurement
/// state. Individual fields are independently locked so two unrelated
/// subsystems (say, paging and a channel's SACCH processing) never
/// contend on the same mutex.
pub struct BtsContext {
    pub config: BtsConfig,
    pub lai: Lai,
    pub channels: Vec<LogicalChannel>,
    pub ccch: Mutex<CcchScheduler>,
    pub measurements: RwLock<Vec<Mutex<MeasurementEngine>>>,
    multiframe: MultiframeMap,
    fn_counter: AtomicU32,
    hold_off: AtomicBool,
    shutdown: AtomicBool,
}

impl BtsContext {
    pub fn new(config: BtsConfig, lai: Lai, channels: Vec<LogicalChannel>) -> Self {
        let measurement_slots = channels.iter().map(|_| Mutex::new(MeasurementEngine::new())).collect();
        BtsContext {
            config,
            lai,
            channels,
            ccch: Mutex::new(CcchScheduler::new(crate::constants::RACH_S_MAX_AGE)),
            measurements: RwLock::new(measurement_slots),
            multiframe: MultiframeMap::for_combination(ChannelCombination::CombinationIV),
            fn_counter: AtomicU32::new(0),
            hold_off: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    /// First channel in `Idle` state and still recyclable, or `None` if the
    /// pool is exhausted. Linear scan: the channel counts this stack deals
    /// with (tens, not thousands) don't justify a free-list.
    pub fn allocate_channel(&self) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| c.state() == crate::channel::ChannelLifecycleState::Idle && c.is_recyclable())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn set_hold_off(&self, hold_off: bool) {
        self.hold_off.store(hold_off, Ordering::Relaxed);
    }

    pub fn is_hold_off(&self) -> bool {
        self.hold_off.load(Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Drains exactly one CCCH block's worth of work for the current frame,
    /// leaving idle-filler framing to the caller (this stack carries no
    /// `PagingRequestType1` filler encoder). The slot's paging-vs-access-
    /// grant role comes from the precomputed 51-multiframe table and
    /// `BS_AG_BLKS_RES`, GSM 05.02 §6.5.3; any RACH response that aged out
    /// releases its preallocated channel back to the pool as it is dropped.
    pub fn service_ccch_once(&self) -> Option<Vec<u8>> {
        let fn_mod_51 = self.fn_counter.fetch_add(1, Ordering::Relaxed) % 51;
        let block_idx = match self.multiframe.role_at(fn_mod_51) {
            FrameRole::Ccch(idx) => idx,
            _ => return None,
        };
        let is_paging_slot = block_idx >= self.config.ccch.agch_reserved_blocks;
        let hold_off = self.is_hold_off();
        let channels = &self.channels;
        self.ccch.lock().unwrap().service_one_block(is_paging_slot, hold_off, |channel_idx| {
            if let Some(chan) = channels.get(channel_idx) {
                chan.set_state(crate::channel::ChannelLifecycleState::Idle);
            }
        })
    }

    /// Spawns the fixed set of long-lived worker threads this BTS core
    /// runs: one CCCH-servicing thread and one LAPDm receive/T200-polling
    /// thread per logical channel. Each polls `shutdown` once per frame
    /// rather than blocking on anything that would survive past
    /// `request_shutdown`.
    pub fn run(self: Arc<Self>) -> Vec<thread::JoinHandle<()>> {
        let mut handles = Vec::new();

        let ccch_ctx = self.clone();
        handles.push(thread::spawn(move || {
            while !ccch_ctx.is_shutting_down() {
                ccch_ctx.service_ccch_once();
                thread::sleep(Duration::from_micros(crate::constants::FRAME_PERIOD_US));
            }
        }));

        for idx in 0..self.channels.len() {
            let rx_ctx = self.clone();
            handles.push(thread::spawn(move || {
                while !rx_ctx.is_shutting_down() {
                    let _ = rx_ctx.channels[idx].service_rx_once();
                    let _ = rx_ctx.channels[idx].service_timers();
                    thread::sleep(Duration::from_micros(crate::constants::FRAME_PERIOD_US));
                }
            }));
        }

        handles
    }
}
