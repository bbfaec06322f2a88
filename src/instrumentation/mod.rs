//! Process-wide statistics counters
//!
//! The original source accumulates free-form named counters through a
//! global `gReports.incr("OpenBTS.GSM.RR.RACH.TA.All", ...)` call. A fixed,
//! known set of counters lets us replace that with plain `AtomicU64` fields
//! behind a `lazy_static` singleton instead of a lock-guarded map — lock-free
//! on the increment path, which matters since these are touched from every
//! CCCH tick and every LAPDm state transition.

use lazy_static::lazy_static;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Counters {
    pub rach_accepted: AtomicU64,
    pub rach_rejected_holdoff: AtomicU64,
    pub rach_rejected_timing: AtomicU64,
    pub rach_rejected_too_old: AtomicU64,
    pub rach_rejected_congestion: AtomicU64,

    pub ccch_slots_filled: AtomicU64,
    pub ccch_slots_idle: AtomicU64,
    pub paging_sent: AtomicU64,
    pub paging_retired: AtomicU64,
    pub gprs_imm_assign_sent: AtomicU64,
    pub gprs_imm_assign_moved_to_paging: AtomicU64,

    pub lapdm_t200_expirations: AtomicU64,
    pub lapdm_abnormal_releases: AtomicU64,
    pub lapdm_contention_rejections: AtomicU64,

    pub channel_t3101_expirations: AtomicU64,
    pub channel_t3109_expirations: AtomicU64,
    pub channel_radio_link_failures: AtomicU64,

    pub measurement_reports_processed: AtomicU64,
    pub handovers_triggered: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CountersSnapshot {
        let g = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            rach_accepted: g(&self.rach_accepted),
            rach_rejected_holdoff: g(&self.rach_rejected_holdoff),
            rach_rejected_timing: g(&self.rach_rejected_timing),
            rach_rejected_too_old: g(&self.rach_rejected_too_old),
            rach_rejected_congestion: g(&self.rach_rejected_congestion),
            ccch_slots_filled: g(&self.ccch_slots_filled),
            ccch_slots_idle: g(&self.ccch_slots_idle),
            paging_sent: g(&self.paging_sent),
            paging_retired: g(&self.paging_retired),
            gprs_imm_assign_sent: g(&self.gprs_imm_assign_sent),
            gprs_imm_assign_moved_to_paging: g(&self.gprs_imm_assign_moved_to_paging),
            lapdm_t200_expirations: g(&self.lapdm_t200_expirations),
            lapdm_abnormal_releases: g(&self.lapdm_abnormal_releases),
            lapdm_contention_rejections: g(&self.lapdm_contention_rejections),
            channel_t3101_expirations: g(&self.channel_t3101_expirations),
            channel_t3109_expirations: g(&self.channel_t3109_expirations),
            channel_radio_link_failures: g(&self.channel_radio_link_failures),
            measurement_reports_processed: g(&self.measurement_reports_processed),
            handovers_triggered: g(&self.handovers_triggered),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CountersSnapshot {
    pub rach_accepted: u64,
    pub rach_rejected_holdoff: u64,
    pub rach_rejected_timing: u64,
    pub rach_rejected_too_old: u64,
    pub rach_rejected_congestion: u64,
    pub ccch_slots_filled: u64,
    pub ccch_slots_idle: u64,
    pub paging_sent: u64,
    pub paging_retired: u64,
    pub gprs_imm_assign_sent: u64,
    pub gprs_imm_assign_moved_to_paging: u64,
    pub lapdm_t200_expirations: u64,
    pub lapdm_abnormal_releases: u64,
    pub lapdm_contention_rejections: u64,
    pub channel_t3101_expirations: u64,
    pub channel_t3109_expirations: u64,
    pub channel_radio_link_failures: u64,
    pub measurement_reports_processed: u64,
    pub handovers_triggered: u64,
}

lazy_static! {
    static ref COUNTERS: Counters = Counters::default();
}

/// Increment a named counter by one. Panics on an unrecognized name in
/// debug builds only (a typo here is a programming error, not user input).
pub fn incr(name: &str) {
    let c: &AtomicU64 = match name {
        "rach_accepted" => &COUNTERS.rach_accepted,
        "rach_rejected_holdoff" => &COUNTERS.rach_rejected_holdoff,
        "rach_rejected_timing" => &COUNTERS.rach_rejected_timing,
        "rach_rejected_too_old" => &COUNTERS.rach_rejected_too_old,
        "rach_rejected_congestion" => &COUNTERS.rach_rejected_congestion,
        "ccch_slots_filled" => &COUNTERS.ccch_slots_filled,
        "ccch_slots_idle" => &COUNTERS.ccch_slots_idle,
        "paging_sent" => &COUNTERS.paging_sent,
        "paging_retired" => &COUNTERS.paging_retired,
        "gprs_imm_assign_sent" => &COUNTERS.gprs_imm_assign_sent,
        "gprs_imm_assign_moved_to_paging" => &COUNTERS.gprs_imm_assign_moved_to_paging,
        "lapdm_t200_expirations" => &COUNTERS.lapdm_t200_expirations,
        "lapdm_abnormal_releases" => &COUNTERS.lapdm_abnormal_releases,
        "lapdm_contention_rejections" => &COUNTERS.lapdm_contention_rejections,
        "channel_t3101_expirations" => &COUNTERS.channel_t3101_expirations,
        "channel_t3109_expirations" => &COUNTERS.channel_t3109_expirations,
        "channel_radio_link_failures" => &COUNTERS.channel_radio_link_failures,
        "measurement_reports_processed" => &COUNTERS.measurement_reports_processed,
        "handovers_triggered" => &COUNTERS.handovers_triggered,
        other => {
            debug_assert!(false, "unknown counter: {other}");
            return;
        }
    };
    c.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> CountersSnapshot {
    COUNTERS.snapshot()
}

#[cfg(any(test, feature = "sim"))]
pub fn reset_for_test() {
    let fields = [
        &COUNTERS.rach_accepted,
        &COUNTERS.rach_rejected_holdoff,
        &COUNTERS.rach_rejected_timing,
        &COUNTERS.rach_rejected_too_old,
        &COUNTERS.rach_rejected_congestion,
        &COUNTERS.ccch_slots_filled,
        &COUNTERS.ccch_slots_idle,
        &COUNTERS.paging_sent,
        &COUNTERS.paging_retired,
        &COUNTERS.gprs_imm_assign_sent,
        &COUNTERS.gprs_imm_assign_moved_to_paging,
        &COUNTERS.lapdm_t200_expirations,
        &COUNTERS.lapdm_abnormal_releases,
        &COUNTERS.lapdm_contention_rejections,
        &COUNTERS.channel_t3101_expirations,
        &COUNTERS.channel_t3109_expirations,
        &COUNTERS.channel_radio_link_failures,
        &COUNTERS.measurement_reports_processed,
        &COUNTERS.handovers_triggered,
    ];
    for f in fields {
        f.store(0, Ordering::Relaxed);
    }
}
