//! GSM frame-number time, GSM 05.02 §4.3
//!
//! `Time` is a `(FN, TN)` pair where `FN` counts modulo the 26*51*2048
//! hyperframe and `TN` is the timeslot 0..7. Arithmetic wraps at the
//! hyperframe boundary and comparisons use a signed half-modulus delta so
//! that a frame number just after rollover still compares correctly against
//! one just before it.

use crate::constants::GSM_HYPERFRAME;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    fn_: u32,
    tn: u8,
}

impl Time {
    pub fn new(fn_: u32, tn: u8) -> Self {
        debug_assert!(tn < 8);
        Time {
            fn_: fn_ % GSM_HYPERFRAME,
            tn: tn % 8,
        }
    }

    pub fn fn_(&self) -> u32 {
        self.fn_
    }

    pub fn tn(&self) -> u8 {
        self.tn
    }

    /// Frame number modulo a TDMA repeat length (26, 51, 52, 102, 104).
    pub fn fn_mod(&self, modulus: u32) -> u32 {
        self.fn_ % modulus
    }

    /// Signed frame delta `self - other`, taking the hyperframe rollover
    /// into account: the result is always in `(-HYPERFRAME/2, HYPERFRAME/2]`.
    pub fn delta(&self, other: &Time) -> i64 {
        let h = GSM_HYPERFRAME as i64;
        let raw = self.fn_ as i64 - other.fn_ as i64;
        let half = h / 2;
        ((raw + half).rem_euclid(h)) - half
    }

    /// `self + d`, `d` may be negative, wrapping at the hyperframe.
    pub fn advance(&self, d: i64) -> Time {
        let h = GSM_HYPERFRAME as i64;
        let new_fn = (self.fn_ as i64 + d).rem_euclid(h) as u32;
        Time {
            fn_: new_fn,
            tn: self.tn,
        }
    }

    pub fn with_tn(&self, tn: u8) -> Time {
        Time::new(self.fn_, tn)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.fn_, self.tn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn delta_basic() {
        let a = Time::new(100, 0);
        let b = Time::new(150, 0);
        assert_eq!(b.delta(&a), 50);
        assert_eq!(a.delta(&b), -50);
    }

    #[test]
    fn rollover_delta() {
        let near_end = Time::new(GSM_HYPERFRAME - 5, 0);
        let after_wrap = near_end.advance(10);
        assert_eq!(after_wrap.fn_(), 5);
        assert_eq!(after_wrap.delta(&near_end), 10);
        assert_eq!(near_end.delta(&after_wrap), -10);
    }

    proptest! {
        #[test]
        fn advance_then_delta_is_identity(a in 0u32..GSM_HYPERFRAME, d in 1i64..(GSM_HYPERFRAME as i64/2)) {
            let t = Time::new(a, 0);
            let advanced = t.advance(d);
            prop_assert_eq!(advanced.delta(&t), d);
            let back = t.advance(-d);
            prop_assert_eq!(back.delta(&t), -d);
        }
    }
}
