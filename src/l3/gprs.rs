//! GPRS Mobility/Session Management pass-through, GSM 04.08 §9 / GSM 04.64.
//!
//! GPRS signalling runs over RLC/MAC rather than LAPDm; this stack's scope
//! stops at recognising the two GPRS protocol discriminators and handing
//! their payload upstream unparsed; imm_assign_reject constants in
//! `src/ccch` do the only GPRS-facing work the CCCH scheduler needs.

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GprsDiscriminator {
    Mm,
    Sm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GprsPayload {
    pub discriminator: GprsDiscriminator,
    pub body: Vec<u8>,
}

impl GprsPayload {
    pub fn encode(&self) -> Vec<u8> {
        self.body.clone()
    }

    pub fn decode(discriminator: GprsDiscriminator, bytes: &[u8]) -> Result<Self> {
        Ok(GprsPayload {
            discriminator,
            body: bytes.to_vec(),
        })
    }
}
