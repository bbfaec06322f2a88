//! Radio Resource management messages, GSM 04.08 §9.1.

use crate::l3::ie::{push_tlv, Cursor, Lai};
use crate::error::{BtsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RrMessageType {
    ImmediateAssignment,
    ImmediateAssignmentReject,
    PagingRequestType1,
    ChannelRelease,
    MeasurementReport,
    HandoverCommand,
}

impl RrMessageType {
    pub fn to_byte(self) -> u8 {
        match self {
            RrMessageType::PagingRequestType1 => 0x21,
            RrMessageType::ImmediateAssignment => 0x3f,
            RrMessageType::ImmediateAssignmentReject => 0x3a,
            RrMessageType::ChannelRelease => 0x0d,
            RrMessageType::MeasurementReport => 0x15,
            RrMessageType::HandoverCommand => 0x2b,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            0x21 => RrMessageType::PagingRequestType1,
            0x3f => RrMessageType::ImmediateAssignment,
            0x3a => RrMessageType::ImmediateAssignmentReject,
            0x0d => RrMessageType::ChannelRelease,
            0x15 => RrMessageType::MeasurementReport,
            0x2b => RrMessageType::HandoverCommand,
            other => {
                return Err(BtsError::UnknownMessageType { pd: 0x06, mti: other });
            }
        })
    }
}

/// Request Reference, GSM 04.08 §10.5.2.30: the echoed RA octet plus the
/// (T1',T3,T2) access frame number the RACH burst was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestReference {
    pub ra: u8,
    pub t1p: u8,
    pub t3: u8,
    pub t2: u8,
}

impl RequestReference {
    pub fn encode(&self) -> [u8; 3] {
        let frame = ((self.t1p as u32 & 0x1f) << 19) | ((self.t3 as u32 & 0x3f) << 13) | ((self.t2 as u32 & 0x1f) << 8);
        let frame_bytes = frame.to_be_bytes();
        [self.ra, frame_bytes[1], frame_bytes[2]]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 3 {
            return Err(BtsError::MalformedL3 {
                reason: "request reference must be 3 octets".into(),
            });
        }
        let frame = u32::from_be_bytes([0, bytes[1], bytes[2], 0]);
        Ok(RequestReference {
            ra: bytes[0],
            t1p: ((frame >> 19) & 0x1f) as u8,
            t3: ((frame >> 13) & 0x3f) as u8,
            t2: ((frame >> 8) & 0x1f) as u8,
        })
    }
}

/// Channel description, GSM 04.08 §10.5.2.5 -- the assigned timeslot,
/// channel type and absolute RF channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescription {
    pub channel_type: u8,
    pub tn: u8,
    pub tsc: u8,
    pub arfcn: u16,
}

impl ChannelDescription {
    pub fn encode(&self) -> [u8; 3] {
        let b0 = (self.channel_type << 3) | self.tn;
        let b1 = (self.tsc << 5) | ((self.arfcn >> 8) as u8 & 0x03);
        let b2 = (self.arfcn & 0xff) as u8;
        [b0, b1, b2]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 3 {
            return Err(BtsError::MalformedL3 {
                reason: "channel description must be 3 octets".into(),
            });
        }
        Ok(ChannelDescription {
            channel_type: bytes[0] >> 3,
            tn: bytes[0] & 0x07,
            tsc: bytes[1] >> 5,
            arfcn: (((bytes[1] & 0x03) as u16) << 8) | bytes[2] as u16,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateAssignment {
    pub channel: ChannelDescription,
    pub request: RequestReference,
    pub timing_advance: u8,
}

const IEI_TIMING_ADVANCE: u8 = 0x00;

impl ImmediateAssignment {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(0x2d); // page mode + dedicated mode indicator, BTS-internal use only
        out.extend_from_slice(&self.channel.encode());
        out.extend_from_slice(&self.request.encode());
        out.push(self.timing_advance);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let _mode = c.take_u8()?;
        let channel = ChannelDescription::decode(c.take_v(3)?)?;
        let request = RequestReference::decode(c.take_v(3)?)?;
        let timing_advance = c.take_u8()?;
        Ok(ImmediateAssignment {
            channel,
            request,
            timing_advance,
        })
    }
}

/// Immediate Assignment Reject, GSM 04.08 §9.1.20: carries a wait indicator
/// (T3122 seconds) and the echoed request reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateAssignmentReject {
    pub request: RequestReference,
    pub wait_indication_secs: u8,
}

impl ImmediateAssignmentReject {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(0x2d);
        out.extend_from_slice(&self.request.encode());
        out.push(self.wait_indication_secs);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let _mode = c.take_u8()?;
        let request = RequestReference::decode(c.take_v(3)?)?;
        let wait_indication_secs = c.take_u8()?;
        Ok(ImmediateAssignmentReject {
            request,
            wait_indication_secs,
        })
    }
}

/// Paging Request Type 1, GSM 04.08 §9.1.22: up to two mobile identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingRequestType1 {
    pub identities: Vec<crate::l3::ie::MobileIdentity>,
}

impl PagingRequestType1 {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(0x00); // page group / channels needed, left to the caller's framing
        if let Some(first) = self.identities.first() {
            out.extend_from_slice(&first.encode());
        }
        if let Some(second) = self.identities.get(1) {
            push_tlv(&mut out, 0x17, &second.encode());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        let _group = c.take_u8()?;
        let first = c.take_lv()?;
        let mut identities = vec![crate::l3::ie::MobileIdentity::decode(first)?];
        if let Some(second) = c.take_optional_tlv(0x17)? {
            identities.push(crate::l3::ie::MobileIdentity::decode(second)?);
        }
        Ok(PagingRequestType1 { identities })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRelease {
    pub cause: u8,
}

impl ChannelRelease {
    pub fn encode(&self) -> Vec<u8> {
        vec![self.cause]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut c = Cursor::new(bytes);
        Ok(ChannelRelease { cause: c.take_u8()? })
    }
}

/// One serving- or neighbour-cell measurement result as it appears packed
/// inside a Measurement Report, GSM 04.08 §10.5.2.20.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementReport {
    pub rxlev_full_serving: u8,
    pub rxqual_full_serving: u8,
    pub ncell_count: u8,
}

impl MeasurementReport {
    pub fn encode(&self) -> Vec<u8> {
        vec![
            (self.rxlev_full_serving & 0x3f) | ((self.ncell_count > 0) as u8) << 6,
            self.rxqual_full_serving & 0x07,
            self.ncell_count,
        ]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 3 {
            return Err(BtsError::FrameTooShort { need: 3, have: bytes.len() });
        }
        Ok(MeasurementReport {
            rxlev_full_serving: bytes[0] & 0x3f,
            rxqual_full_serving: bytes[1] & 0x07,
            ncell_count: bytes[2],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoverCommand {
    pub target: ChannelDescription,
    pub power_command: u8,
}

impl HandoverCommand {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.target.encode().to_vec();
        out.push(self.power_command);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(BtsError::FrameTooShort { need: 4, have: bytes.len() });
        }
        Ok(HandoverCommand {
            target: ChannelDescription::decode(&bytes[0..3])?,
            power_command: bytes[3],
        })
    }
}

/// Full Location Area Identification as broadcast on BCCH, used by RR to
/// construct System Information (kept here since it is an RR-layer IE, not
/// carried in MM messages directly).
pub fn encode_lai(lai: &Lai) -> [u8; 5] {
    lai.encode()
}
