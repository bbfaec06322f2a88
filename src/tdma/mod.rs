//! TDMA multiframe mapping tables, GSM 05.02 §6.3/§6.5.
//!
//! The 51-multiframe carries CCCH/BCCH/SDCCH traffic; which logical
//! channel owns a given absolute frame number depends only on `FN mod 51`
//! and the channel combination configured for timeslot 0. This module
//! builds the lookup tables once (combination I, IV, and V -- the three
//! combinations this stack's CCCH scheduler needs) rather than re-deriving
//! them per frame.

/// Channel combinations on a BCCH/CCCH-bearing timeslot, GSM 05.02 Table 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCombination {
    /// Combination I: BCCH + CCCH only (no SDCCH), used on small cells.
    CombinationI,
    /// Combination IV: BCCH + CCCH, non-combined.
    CombinationIV,
    /// Combination V: BCCH + CCCH + SDCCH/4 + SACCH/4, combined control
    /// channel configuration.
    CombinationV,
}

/// What a given 51-multiframe slot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRole {
    Fcch,
    Sch,
    Bcch,
    /// CCCH paging/access-grant block, with its 0-based block index within
    /// the 51-multiframe (used to compute the paging group).
    Ccch(u8),
    /// SDCCH/4 and its companion SACCH/4, only present on combination V.
    Sdcch4(u8),
    Sacch4(u8),
    Idle,
}

/// 51-entry reverse index: `FN mod 51` -> role. Built once per combination
/// rather than recomputed per lookup.
pub struct MultiframeMap {
    roles: [FrameRole; 51],
}

impl MultiframeMap {
    pub fn for_combination(combination: ChannelCombination) -> Self {
        let mut roles = [FrameRole::Idle; 51];
        match combination {
            ChannelCombination::CombinationI | ChannelCombination::CombinationIV => {
                roles[0] = FrameRole::Fcch;
                roles[1] = FrameRole::Sch;
                roles[2] = FrameRole::Bcch;
                roles[3] = FrameRole::Bcch;
                roles[4] = FrameRole::Bcch;
                roles[5] = FrameRole::Bcch;
                let mut block = 0u8;
                let mut fn_ = 6usize;
                while fn_ + 4 <= 51 {
                    if fn_ == 10 || fn_ == 20 || fn_ == 30 || fn_ == 40 {
                        fn_ += 1;
                        continue;
                    }
                    for i in 0..4 {
                        roles[fn_ + i] = FrameRole::Ccch(block);
                    }
                    block += 1;
                    fn_ += 4;
                }
            }
            ChannelCombination::CombinationV => {
                roles[0] = FrameRole::Fcch;
                roles[1] = FrameRole::Sch;
                roles[2] = FrameRole::Bcch;
                roles[3] = FrameRole::Bcch;
                roles[4] = FrameRole::Bcch;
                roles[5] = FrameRole::Bcch;
                for i in 0..4 {
                    roles[6 + i] = FrameRole::Ccch(0);
                }
                for sub in 0..4u8 {
                    let base = 12 + sub as usize * 4;
                    for i in 0..4 {
                        roles[base + i] = FrameRole::Sdcch4(sub);
                    }
                }
                for i in 0..4 {
                    roles[28 + i] = FrameRole::Sacch4(0);
                }
                roles[32] = FrameRole::Fcch;
                roles[33] = FrameRole::Sch;
                for i in 0..4 {
                    roles[34 + i] = FrameRole::Ccch(1);
                }
                for i in 0..4 {
                    roles[38 + i] = FrameRole::Sacch4(1);
                }
            }
        }
        MultiframeMap { roles }
    }

    pub fn role_at(&self, fn_mod_51: u32) -> FrameRole {
        self.roles[(fn_mod_51 % 51) as usize]
    }

    /// Number of distinct CCCH blocks this combination exposes per
    /// 51-multiframe; the paging/access-grant scheduler distributes work
    /// round-robin across them.
    pub fn ccch_block_count(&self) -> u8 {
        self.roles
            .iter()
            .filter_map(|r| match r {
                FrameRole::Ccch(idx) => Some(*idx),
                _ => None,
            })
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }
}
