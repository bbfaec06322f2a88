//! SACCH measurement engine, GSM 05.08 §8 (cell selection/handover) and
//! §6.6.2 (SACCH measurement processing).
//!
//! Every SACCH period's Measurement Report feeds a bounded rolling history
//! per cell (serving plus up to six neighbours); handover decisions look
//! at the averaged history rather than any single noisy sample.

use crate::constants::{
    HANDOVER_HISTORY_DEFAULT, HANDOVER_HISTORY_MAX_DEFAULT, HANDOVER_MARGIN_DEFAULT,
    HANDOVER_PENALTY_TIME_DEFAULT_SECS, HANDOVER_RXLEV_TARGET_DEFAULT, NO_NCELL_SENTINEL,
};
use crate::time::Time;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// One measurement-report data point, GSM 04.08 §10.5.2.20. `frame` is the
/// absolute frame number the report arrived in (used for age-based
/// eviction); `valid` marks a decodable-but-out-of-range or otherwise
/// untrustworthy point, which is skipped (not counted) by averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSample {
    pub frame: u32,
    pub rxlev: i32,
    pub rxqual: u8,
    pub valid: bool,
}

/// Bounded history for one cell; pushes evict the oldest sample once full,
/// and any sample older than `(capacity+1)*2*52` frames (~16s) is evicted
/// regardless of how full the deque is, GSM 05.08 §8.
pub struct CellHistory {
    samples: VecDeque<CellSample>,
    capacity: usize,
    max_age_frames: i64,
}

impl CellHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(HANDOVER_HISTORY_MAX_DEFAULT);
        CellHistory {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            max_age_frames: (capacity as i64 + 1) * 2 * 52,
        }
    }

    /// `now_frame` is the current absolute frame number, used to evict
    /// samples that have aged out even if the deque isn't at capacity.
    pub fn push(&mut self, sample: CellSample, now_frame: u32) {
        let now = Time::new(now_frame, 0);
        while let Some(front) = self.samples.front() {
            if now.delta(&Time::new(front.frame, 0)) > self.max_age_frames {
                self.samples.pop_front();
            } else {
                break;
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mean RXLEV of the valid samples currently in history; invalid points
    /// are skipped, not counted, per the averaging rule.
    pub fn average_rxlev(&self) -> Option<i32> {
        let mut sum = 0i64;
        let mut count = 0i64;
        for s in self.samples.iter().filter(|s| s.valid) {
            sum += s.rxlev as i64;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some((sum / count) as i32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A neighbour cell identified by its (BCCH ARFCN, BSIC) pair -- two real
/// neighbours can share a BCCH ARFCN under frequency reuse and are only
/// distinguished by BSIC, so ARFCN alone cannot key the neighbour map. The
/// reserved frequency index (31) and the "no neighbour data" sentinel (7 in
/// the count field) are filtered out before a sample ever reaches history.
pub type NeighbourId = (u16, u8);

/// A neighbour's rolling history plus how many reports in a row it has
/// shown up in. `neighbour_find_best` won't consider a neighbour until
/// this reaches `Handover.RXLEV_DL.History` -- a single strong report
/// from a cell we've barely heard shouldn't trigger a handover.
struct NeighbourRecord {
    history: CellHistory,
    consecutive_count: u32,
}

pub struct MeasurementEngine {
    serving: CellHistory,
    neighbours: HashMap<NeighbourId, NeighbourRecord>,
    handover_margin: i32,
    rxlev_target: i32,
    history_required: u32,
    penalty_until: HashMap<NeighbourId, Instant>,
    penalty_time: Duration,
}

impl MeasurementEngine {
    pub fn new() -> Self {
        MeasurementEngine {
            serving: CellHistory::new(HANDOVER_HISTORY_DEFAULT),
            neighbours: HashMap::new(),
            handover_margin: HANDOVER_MARGIN_DEFAULT,
            rxlev_target: HANDOVER_RXLEV_TARGET_DEFAULT,
            history_required: HANDOVER_HISTORY_DEFAULT as u32,
            penalty_until: HashMap::new(),
            penalty_time: Duration::from_secs(HANDOVER_PENALTY_TIME_DEFAULT_SECS),
        }
    }

    pub fn record_serving(&mut self, sample: CellSample) {
        let now_frame = sample.frame;
        self.serving.push(sample, now_frame);
    }

    pub fn record_neighbour(&mut self, id: NeighbourId, count_field: u8, sample: CellSample) {
        if count_field == NO_NCELL_SENTINEL {
            return;
        }
        let now_frame = sample.frame;
        let record = self.neighbours.entry(id).or_insert_with(|| NeighbourRecord {
            history: CellHistory::new(HANDOVER_HISTORY_MAX_DEFAULT),
            consecutive_count: 0,
        });
        record.history.push(sample, now_frame);
        record.consecutive_count = record.consecutive_count.saturating_add(1);
    }

    /// Call once per SACCH period for a neighbour that had no report this
    /// time (distinct from the `NO_NCELL` sentinel, which means no
    /// neighbour data at all): breaks its consecutive-report streak.
    pub fn record_neighbour_missed(&mut self, id: NeighbourId) {
        if let Some(record) = self.neighbours.get_mut(&id) {
            record.consecutive_count = 0;
        }
    }

    pub fn penalize(&mut self, id: NeighbourId) {
        self.penalty_until.insert(id, Instant::now() + self.penalty_time);
    }

    fn is_penalized(&self, id: NeighbourId) -> bool {
        matches!(self.penalty_until.get(&id), Some(until) if Instant::now() < *until)
    }

    /// GSM 05.08 §8: finds the best neighbour whose averaged RXLEV beats the
    /// serving cell's by at least `handover_margin`, excluding any cell
    /// still under a handover-failure penalty.
    pub fn neighbour_find_best(&self) -> Option<NeighbourId> {
        let serving_avg = self.serving.average_rxlev()?;
        self.neighbours
            .iter()
            .filter(|(id, record)| record.consecutive_count >= self.history_required && !self.is_penalized(**id))
            .filter_map(|(id, record)| record.history.average_rxlev().map(|avg| (*id, avg)))
            .filter(|(_, avg)| *avg >= serving_avg + self.handover_margin)
            .max_by_key(|(_, avg)| *avg)
            .map(|(id, _)| id)
    }

    /// True once the serving cell's averaged RXLEV has dropped below the
    /// configured target, independent of any neighbour being better --
    /// this is the "power budget" trigger, distinct from margin-based
    /// inter-cell handover.
    pub fn serving_below_target(&self) -> bool {
        self.serving
            .average_rxlev()
            .map(|avg| avg < self.rxlev_target)
            .unwrap_or(false)
    }
}

impl Default for MeasurementEngine {
    fn default() -> Self {
        Self::new()
    }
}
