//! Supplementary Services messages, GSM 04.08 §9.4 / GSM 04.80.
//!
//! Like CC, SS is relayed opaquely between the MS and the core network;
//! the BTS only needs the transaction identifier from the common L3
//! header to route it to the right channel.

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsPayload(pub Vec<u8>);

impl SsPayload {
    pub fn encode(&self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(SsPayload(bytes.to_vec()))
    }
}
