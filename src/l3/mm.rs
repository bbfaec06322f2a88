//! Mobility Management messages, GSM 04.08 §9.2.

use crate::error::{BtsError, Result};
use crate::l3::ie::{Cursor, Lai, MobileIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmMessageType {
    LocationUpdatingRequest,
    LocationUpdatingAccept,
    LocationUpdatingReject,
    CmServiceRequest,
    TmsiReallocationComplete,
}

impl MmMessageType {
    pub fn to_byte(self) -> u8 {
        match self {
            MmMessageType::LocationUpdatingRequest => 0x08,
            MmMessageType::LocationUpdatingAccept => 0x02,
            MmMessageType::LocationUpdatingReject => 0x04,
            MmMessageType::CmServiceRequest => 0x24,
            MmMessageType::TmsiReallocationComplete => 0x05,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            0x08 => MmMessageType::LocationUpdatingRequest,
            0x02 => MmMessageType::LocationUpdatingAccept,
            0x04 => MmMessageType::LocationUpdatingReject,
            0x24 => MmMessageType::CmServiceRequest,
            0x05 => MmMessageType::TmsiReallocationComplete,
            other => return Err(BtsError::UnknownMessageType { pd: 0x05, mti: other }),
        })
    }
}

/// Location Updating Reject cause, GSM 04.08 §10.5.3.6 (the subset this
/// stack issues on its own; most MM rejects are relayed from the core
/// network unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LurRejectCause {
    ImsiUnknownInHlr,
    IllegalMs,
    ImsiUnknownInVlr,
    ImeiNotAccepted,
    IllegalMe,
    PlmnNotAllowed,
    LocationAreaNotAllowed,
    RoamingNotAllowed,
    NetworkFailure,
    CongestionSdn,
    ServiceOptionNotSupported,
}

impl LurRejectCause {
    pub const DEFAULT: LurRejectCause = LurRejectCause::ImsiUnknownInVlr;

    pub fn to_byte(self) -> u8 {
        match self {
            LurRejectCause::ImsiUnknownInHlr => 0x02,
            LurRejectCause::IllegalMs => 0x03,
            LurRejectCause::ImsiUnknownInVlr => 0x04,
            LurRejectCause::ImeiNotAccepted => 0x05,
            LurRejectCause::IllegalMe => 0x06,
            LurRejectCause::PlmnNotAllowed => 0x0b,
            LurRejectCause::LocationAreaNotAllowed => 0x0c,
            LurRejectCause::RoamingNotAllowed => 0x0d,
            LurRejectCause::NetworkFailure => 0x11,
            LurRejectCause::CongestionSdn => 0x16,
            LurRejectCause::ServiceOptionNotSupported => 0x20,
        }
    }

    pub fn from_byte(b: u8) -> Self {
        match b {
            0x02 => LurRejectCause::ImsiUnknownInHlr,
            0x03 => LurRejectCause::IllegalMs,
            0x04 => LurRejectCause::ImsiUnknownInVlr,
            0x05 => LurRejectCause::ImeiNotAccepted,
            0x06 => LurRejectCause::IllegalMe,
            0x0b => LurRejectCause::PlmnNotAllowed,
            0x0c => LurRejectCause::LocationAreaNotAllowed,
            0x0d => LurRejectCause::RoamingNotAllowed,
            0x16 => LurRejectCause::CongestionSdn,
            0x20 => LurRejectCause::ServiceOptionNotSupported,
            _ => LurRejectCause::NetworkFailure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationUpdatingType {
    Normal,
    Periodic,
    ImsiAttach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdatingRequest {
    pub lu_type: LocationUpdatingType,
    pub lai: Lai,
    pub identity: MobileIdentity,
}

impl LocationUpdatingRequest {
    pub fn encode(&self) -> Vec<u8> {
        let type_bits = match self.lu_type {
            LocationUpdatingType::Normal => 0,
            LocationUpdatingType::Periodic => 1,
            LocationUpdatingType::ImsiAttach => 2,
        };
        let mut out = Vec::new();
        out.push(type_bits); // ciphering-key-sequence nibble left as zero: no A5 state here
        out.extend_from_slice(&self.lai.encode());
        out.extend_from_slice(&self.identity.encode());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let type_byte = c.take_u8()?;
        let lu_type = match type_byte & 0x07 {
            0 => LocationUpdatingType::Normal,
            1 => LocationUpdatingType::Periodic,
            2 => LocationUpdatingType::ImsiAttach,
            other => {
                return Err(BtsError::MalformedL3 {
                    reason: format!("unknown location updating type {other}"),
                })
            }
        };
        let lai = Lai::decode(c.take_v(5)?)?;
        let identity = MobileIdentity::decode(c.take_rest())?;
        Ok(LocationUpdatingRequest { lu_type, lai, identity })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdatingAccept {
    pub lai: Lai,
    pub new_tmsi: Option<u32>,
}

impl LocationUpdatingAccept {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.lai.encode().to_vec();
        if let Some(tmsi) = self.new_tmsi {
            out.extend_from_slice(&MobileIdentity::Tmsi(tmsi).encode());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let lai = Lai::decode(c.take_v(5)?)?;
        let new_tmsi = if c.is_empty() {
            None
        } else {
            match MobileIdentity::decode(c.take_rest())? {
                MobileIdentity::Tmsi(t) => Some(t),
                _ => None,
            }
        };
        Ok(LocationUpdatingAccept { lai, new_tmsi })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationUpdatingReject {
    pub cause: LurRejectCause,
}

impl LocationUpdatingReject {
    pub fn encode(&self) -> Vec<u8> {
        vec![self.cause.to_byte()]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        Ok(LocationUpdatingReject {
            cause: LurRejectCause::from_byte(c.take_u8()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmServiceRequest {
    pub service_type: u8,
    pub identity: MobileIdentity,
}

impl CmServiceRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.service_type & 0x0f];
        out.extend_from_slice(&self.identity.encode());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let service_type = c.take_u8()? & 0x0f;
        let identity = MobileIdentity::decode(c.take_rest())?;
        Ok(CmServiceRequest { service_type, identity })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmsiReallocationComplete;

impl TmsiReallocationComplete {
    pub fn encode(&self) -> Vec<u8> {
        Vec::new()
    }

    pub fn decode(_bytes: &[u8]) -> Result<Self> {
        Ok(TmsiReallocationComplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lai() -> Lai {
        Lai { mcc: 310, mnc: 70, mnc_is_three_digit: false, lac: 0x2233 }
    }

    #[test]
    fn location_updating_request_roundtrips() {
        let req = LocationUpdatingRequest {
            lu_type: LocationUpdatingType::ImsiAttach,
            lai: sample_lai(),
            identity: MobileIdentity::Imsi("310070123456789".into()),
        };
        let encoded = req.encode();
        assert_eq!(LocationUpdatingRequest::decode(&encoded).unwrap(), req);
    }

    #[test]
    fn location_updating_accept_with_tmsi_roundtrips() {
        let acc = LocationUpdatingAccept {
            lai: sample_lai(),
            new_tmsi: Some(0xaabbccdd),
        };
        let encoded = acc.encode();
        assert_eq!(LocationUpdatingAccept::decode(&encoded).unwrap(), acc);
    }

    #[test]
    fn location_updating_accept_without_tmsi_roundtrips() {
        let acc = LocationUpdatingAccept {
            lai: sample_lai(),
            new_tmsi: None,
        };
        let encoded = acc.encode();
        assert_eq!(LocationUpdatingAccept::decode(&encoded).unwrap(), acc);
    }

    #[test]
    fn reject_default_cause_is_imsi_unknown_in_vlr() {
        assert_eq!(LurRejectCause::DEFAULT, LurRejectCause::ImsiUnknownInVlr);
        assert_eq!(LurRejectCause::DEFAULT.to_byte(), 0x04);
    }

    #[test]
    fn reject_unknown_byte_falls_back_to_network_failure() {
        assert_eq!(LurRejectCause::from_byte(0xff), LurRejectCause::NetworkFailure);
    }

    #[test]
    fn cm_service_request_roundtrips() {
        let req = CmServiceRequest {
            service_type: 1,
            identity: MobileIdentity::Tmsi(42),
        };
        let encoded = req.encode();
        assert_eq!(CmServiceRequest::decode(&encoded).unwrap(), req);
    }

    #[test]
    fn message_type_roundtrips() {
        for mt in [
            MmMessageType::LocationUpdatingRequest,
            MmMessageType::LocationUpdatingAccept,
            MmMessageType::LocationUpdatingReject,
            MmMessageType::CmServiceRequest,
            MmMessageType::TmsiReallocationComplete,
        ] {
            assert_eq!(MmMessageType::from_byte(mt.to_byte()).unwrap(), mt);
        }
    }
}
