//! Layer 3 message framing, GSM 04.08 §10.
//!
//! Every L3 message starts with a protocol-discriminator octet (PD in the
//! low nibble, a skip indicator or transaction identifier in the high
//! nibble) followed by a message-type octet. CC/SS/GPRS-SM messages extend
//! the transaction identifier into a second octet when TI=7; RR/MM/GPRS-MM
//! never do.

pub mod cc;
pub mod gprs;
pub mod ie;
pub mod mm;
pub mod rr;
pub mod smscb;
pub mod ss;

use crate::error::{BtsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolDiscriminator {
    Gcc,
    Bcc,
    RadioResource,
    MobilityManagement,
    CallControl,
    Sms,
    SupplementaryServices,
    NonCallSs,
    LocationServices,
    GprsMm,
    GprsSm,
    Rsvd,
}

impl ProtocolDiscriminator {
    pub fn from_bits(v: u8) -> Result<Self> {
        use ProtocolDiscriminator::*;
        Ok(match v & 0x0f {
            0x0 => Gcc,
            0x1 => Bcc,
            0x3 => CallControl,
            0x5 => MobilityManagement,
            0x6 => RadioResource,
            0x8 => GprsMm,
            0x9 => Sms,
            0xa => GprsSm,
            0xb => NonCallSs,
            0xd => LocationServices,
            other => {
                return Err(BtsError::UnknownMessageType { pd: other, mti: 0 });
            }
        })
    }

    pub fn to_bits(self) -> u8 {
        use ProtocolDiscriminator::*;
        match self {
            Gcc => 0x0,
            Bcc => 0x1,
            CallControl => 0x3,
            MobilityManagement => 0x5,
            RadioResource => 0x6,
            GprsMm => 0x8,
            Sms => 0x9,
            GprsSm => 0xa,
            NonCallSs => 0xb,
            LocationServices => 0xd,
            SupplementaryServices => 0xb,
            Rsvd => 0xf,
        }
    }

    /// CC, SS and GPRS-SM carry a transaction identifier; RR/MM/GPRS-MM do
    /// not (their high nibble is a fixed skip indicator of 0).
    pub fn has_transaction_identifier(self) -> bool {
        matches!(
            self,
            ProtocolDiscriminator::CallControl
                | ProtocolDiscriminator::NonCallSs
                | ProtocolDiscriminator::SupplementaryServices
                | ProtocolDiscriminator::GprsSm
        )
    }
}

/// Transaction identifier: 3 bits plus a flag octet extension when the
/// 3-bit field is all-ones (GSM 04.08 §10.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionId {
    pub flag: bool,
    pub value: u8,
}

const TI_EXTENDED: u8 = 0x7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L3Header {
    pub pd: ProtocolDiscriminator,
    pub ti: Option<TransactionId>,
    pub message_type: u8,
}

impl L3Header {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3);
        let high_nibble = match self.ti {
            Some(ti) if ti.value >= TI_EXTENDED => (TI_EXTENDED << 1) | (ti.flag as u8),
            Some(ti) => (ti.value << 1) | (ti.flag as u8),
            None => 0,
        };
        out.push((high_nibble << 4) | self.pd.to_bits());
        if let Some(ti) = self.ti {
            if ti.value >= TI_EXTENDED {
                out.push(ti.value);
            }
        }
        out.push(self.message_type);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<(L3Header, usize)> {
        if bytes.is_empty() {
            return Err(BtsError::FrameTooShort { need: 2, have: 0 });
        }
        let pd = ProtocolDiscriminator::from_bits(bytes[0])?;
        let high_nibble = bytes[0] >> 4;
        let mut consumed = 1;
        let ti = if pd.has_transaction_identifier() {
            let flag = high_nibble & 1 == 1;
            let value3 = high_nibble >> 1;
            let value = if value3 == TI_EXTENDED {
                let ext = *bytes
                    .get(1)
                    .ok_or(BtsError::FrameTooShort { need: 2, have: 1 })?;
                consumed += 1;
                ext
            } else {
                value3
            };
            Some(TransactionId { flag, value })
        } else {
            None
        };
        let message_type = *bytes
            .get(consumed)
            .ok_or(BtsError::FrameTooShort { need: consumed + 1, have: consumed })?;
        consumed += 1;
        Ok((
            L3Header {
                pd,
                ti,
                message_type,
            },
            consumed,
        ))
    }
}
