//! Runtime configuration, loaded from a TOML file at startup.
//!
//! Every field mirrors a compile-time default in [`crate::constants`]; the
//! file only needs to mention the values an operator wants to override.

use crate::constants::{
    HANDOVER_HISTORY_DEFAULT, HANDOVER_MARGIN_DEFAULT, HANDOVER_PENALTY_TIME_DEFAULT_SECS,
    HANDOVER_RXLEV_TARGET_DEFAULT, MS_TA_MAX_DEFAULT, RACH_TX_INTEGER_DEFAULT,
    RADIO_LINK_TIMEOUT_DEFAULT, T3101_DEFAULT, T3109_DEFAULT, T3111_DEFAULT, T3113_DEFAULT,
    T3122_DEFAULT_SECS,
};
use crate::error::{BtsError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

fn default_secs_t3101() -> u64 {
    T3101_DEFAULT.as_secs()
}
fn default_secs_t3109() -> u64 {
    T3109_DEFAULT.as_secs()
}
fn default_secs_t3111_ms() -> u64 {
    T3111_DEFAULT.as_millis() as u64
}
fn default_secs_t3113() -> u64 {
    T3113_DEFAULT.as_secs()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimersConfig {
    pub t3101_secs: u64,
    pub t3109_secs: u64,
    pub t3111_millis: u64,
    pub t3113_secs: u64,
    pub t3122_secs: u8,
    pub radio_link_timeout: i32,
}

impl Default for TimersConfig {
    fn default() -> Self {
        TimersConfig {
            t3101_secs: default_secs_t3101(),
            t3109_secs: default_secs_t3109(),
            t3111_millis: default_secs_t3111_ms(),
            t3113_secs: default_secs_t3113(),
            t3122_secs: T3122_DEFAULT_SECS,
            radio_link_timeout: RADIO_LINK_TIMEOUT_DEFAULT,
        }
    }
}

impl TimersConfig {
    pub fn t3101(&self) -> Duration {
        Duration::from_secs(self.t3101_secs)
    }
    pub fn t3109(&self) -> Duration {
        Duration::from_secs(self.t3109_secs)
    }
    pub fn t3111(&self) -> Duration {
        Duration::from_millis(self.t3111_millis)
    }
    pub fn t3113(&self) -> Duration {
        Duration::from_secs(self.t3113_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandoverConfig {
    pub margin_db: i32,
    pub rxlev_target: i32,
    pub history_len: usize,
    pub penalty_time_secs: u64,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        HandoverConfig {
            margin_db: HANDOVER_MARGIN_DEFAULT,
            rxlev_target: HANDOVER_RXLEV_TARGET_DEFAULT,
            history_len: HANDOVER_HISTORY_DEFAULT,
            penalty_time_secs: HANDOVER_PENALTY_TIME_DEFAULT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RachConfig {
    pub tx_integer: u32,
    pub ms_ta_max: i32,
}

impl Default for RachConfig {
    fn default() -> Self {
        RachConfig {
            tx_integer: RACH_TX_INTEGER_DEFAULT,
            ms_ta_max: MS_TA_MAX_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CcchConfig {
    /// `BS_AG_BLKS_RES`, GSM 05.02 §6.5.3: how many of each 51-multiframe's
    /// CCCH blocks, counting from the first, are reserved for access-grant
    /// traffic and never carry paging -- the rest are paging-eligible.
    pub agch_reserved_blocks: u8,
}

impl Default for CcchConfig {
    fn default() -> Self {
        CcchConfig { agch_reserved_blocks: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Fraction of physical channels held back for SDCCH even under TCH
    /// pressure, GSM 05.08's "SDCCH reserve" operator knob.
    pub sdcch_reserve_percent: u8,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        ChannelsConfig {
            sdcch_reserve_percent: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BtsConfig {
    pub timers: TimersConfig,
    pub handover: HandoverConfig,
    pub rach: RachConfig,
    pub channels: ChannelsConfig,
    pub ccch: CcchConfig,
}

impl BtsConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<BtsConfig> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| BtsError::MalformedL3 {
            reason: format!("reading config {}: {e}", path.as_ref().display()),
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<BtsConfig> {
        toml::from_str(text).map_err(|e| BtsError::MalformedL3 {
            reason: format!("parsing config: {e}"),
        })
    }
}
