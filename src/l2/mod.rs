//! LAPDm L2 frame format, GSM 04.06.
//!
//! A frame is an 184-bit (23-octet) buffer: 1 octet address, 1 octet
//! control, 1 octet length indicator, up to 20 octets of information. The
//! primitive tag travels alongside the frame but is never itself put on the
//! air; it is how the LAPDm entity and its upstream/downstream neighbours
//! talk about what a frame *means* (an establish request vs a plain data
//! transfer vs a handover-access burst).

pub mod cbch;

use crate::bitvec::{BitVector, BitVectorBuilder};
use crate::error::{BtsError, Result};

/// Header + payload size, GSM 04.06 §3.
pub const L2_HEADER_LEN: usize = 3;
pub const L2_FRAME_LEN: usize = 23;
pub const L2_PAYLOAD_LEN: usize = L2_FRAME_LEN - L2_HEADER_LEN;

/// SAPI values used on the Dm channel. SAPI 1 (packet data) is out of scope
/// here; GPRS runs over RLC/MAC, not LAPDm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sapi {
    RrMmCc = 0,
    Sms = 3,
}

impl Sapi {
    pub fn from_bits(v: u8) -> Result<Sapi> {
        match v {
            0 => Ok(Sapi::RrMmCc),
            3 => Ok(Sapi::Sms),
            other => Err(BtsError::LapdmProtocolError {
                detail: format!("unsupported SAPI {other}"),
            }),
        }
    }
}

/// Command/response bit. On the downlink the BTS sends commands with C/R=1
/// when addressing the MS and responses with C/R=0; the MS does the
/// opposite. `LapdmEntity` tracks its own role and flips this per GSM
/// 04.06 §3.3.2 rather than exposing it to callers directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CR {
    Command,
    Response,
}

/// The 1-octet address field: SAPI in bits 8..3, C/R in bit 2, EA in bit 1.
/// EA is always 1 -- LAPDm never extends addressing past one octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2Address {
    pub sapi: Sapi,
    pub cr: CR,
}

impl L2Address {
    pub fn encode(&self) -> u8 {
        let sapi_bits = match self.sapi {
            Sapi::RrMmCc => 0u8,
            Sapi::Sms => 3u8,
        };
        let cr_bit = match self.cr {
            CR::Command => 1u8,
            CR::Response => 0u8,
        };
        (sapi_bits << 2) | (cr_bit << 1) | 1
    }

    pub fn decode(byte: u8) -> Result<L2Address> {
        if byte & 1 != 1 {
            return Err(BtsError::LapdmProtocolError {
                detail: "EA bit clear in non-extended address octet".into(),
            });
        }
        let sapi = Sapi::from_bits((byte >> 2) & 0x3f)?;
        let cr = if (byte >> 1) & 1 == 1 {
            CR::Command
        } else {
            CR::Response
        };
        Ok(L2Address { sapi, cr })
    }
}

/// U-frame 5-bit modifier codes, GSM 04.06 Table 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UType {
    Sabm,
    Disc,
    Ua,
    Dm,
    Ui,
}

impl UType {
    fn m_field(self) -> u8 {
        match self {
            UType::Sabm => 0b00111,
            UType::Disc => 0b00010,
            UType::Ua => 0b01100,
            UType::Dm => 0b00011,
            UType::Ui => 0b00000,
        }
    }

    fn from_m_field(m: u8) -> Result<UType> {
        match m {
            0b00111 => Ok(UType::Sabm),
            0b00010 => Ok(UType::Disc),
            0b01100 => Ok(UType::Ua),
            0b00011 => Ok(UType::Dm),
            0b00000 => Ok(UType::Ui),
            other => Err(BtsError::LapdmProtocolError {
                detail: format!("unknown U-frame modifier 0b{other:05b}"),
            }),
        }
    }
}

/// The control octet, decoded into one of the three HDLC frame formats
/// LAPDm uses. RNR (S-format receiver-not-ready) is never sent; a k=1
/// window has no use for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlField {
    Info { ns: u8, nr: u8, p: bool },
    Supervisory { nr: u8, reject: bool, pf: bool },
    Unnumbered { utype: UType, pf: bool },
}

impl ControlField {
    pub fn encode(&self) -> u8 {
        match *self {
            ControlField::Info { ns, nr, p } => {
                ((nr & 0x7) << 5) | ((p as u8) << 4) | ((ns & 0x7) << 1)
            }
            ControlField::Supervisory { nr, reject, pf } => {
                let stype = if reject { 0b01 } else { 0b00 };
                ((nr & 0x7) << 5) | ((pf as u8) << 4) | (stype << 2) | 0b01
            }
            ControlField::Unnumbered { utype, pf } => {
                let m = utype.m_field();
                let m_high = (m >> 2) & 0x7;
                let m_low = m & 0x3;
                (m_high << 5) | ((pf as u8) << 4) | (m_low << 2) | 0b11
            }
        }
    }

    pub fn decode(byte: u8) -> Result<ControlField> {
        if byte & 1 == 0 {
            let ns = (byte >> 1) & 0x7;
            let p = (byte >> 4) & 1 == 1;
            let nr = (byte >> 5) & 0x7;
            Ok(ControlField::Info { ns, nr, p })
        } else if byte & 0b11 == 0b01 {
            let stype = (byte >> 2) & 0x3;
            let pf = (byte >> 4) & 1 == 1;
            let nr = (byte >> 5) & 0x7;
            Ok(ControlField::Supervisory {
                nr,
                reject: stype == 0b01,
                pf,
            })
        } else {
            let m_low = (byte >> 2) & 0x3;
            let m_high = (byte >> 5) & 0x7;
            let m = (m_high << 2) | m_low;
            let pf = (byte >> 4) & 1 == 1;
            Ok(ControlField::Unnumbered {
                utype: UType::from_m_field(m)?,
                pf,
            })
        }
    }
}

/// Length indicator octet: `L` (6-bit length), `M` (more-data), `EL`
/// (extended length, always 1 -- LAPDm never extends past one octet here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthIndicator {
    pub length: u8,
    pub more: bool,
}

impl LengthIndicator {
    pub fn encode(&self) -> u8 {
        ((self.length & 0x3f) << 2) | ((self.more as u8) << 1) | 1
    }

    pub fn decode(byte: u8) -> Result<LengthIndicator> {
        if byte & 1 != 1 {
            return Err(BtsError::LapdmProtocolError {
                detail: "EL bit clear in length-indicator octet".into(),
            });
        }
        Ok(LengthIndicator {
            length: (byte >> 2) & 0x3f,
            more: (byte >> 1) & 1 == 1,
        })
    }
}

/// Service primitives exchanged between LAPDm and its upper (L3) and lower
/// (L1) neighbours. These never appear on the air; they are the internal
/// vocabulary of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    PhConnect,
    L2Data,
    L3Data,
    L3UnitData,
    L3EstablishRequest,
    L3EstablishIndication,
    L3EstablishConfirm,
    L3ReleaseRequest,
    L3ReleaseIndication,
    L3ReleaseConfirm,
    L3HardReleaseRequest,
    HandoverAccess,
    MdlErrorIndication,
}

/// A single LAPDm frame: its primitive tag plus the raw 23-octet buffer
/// content (header fields kept structured, payload kept as bytes).
#[derive(Debug, Clone)]
pub struct L2Frame {
    pub primitive: Primitive,
    pub address: L2Address,
    pub control: ControlField,
    pub payload: Vec<u8>,
    /// Length indicator M-bit: another segment of the same L3 message
    /// follows in a subsequent frame, GSM 04.06 §5.4.1.
    pub more: bool,
}

impl L2Frame {
    pub fn new(primitive: Primitive, address: L2Address, control: ControlField, payload: Vec<u8>) -> Self {
        L2Frame {
            primitive,
            address,
            control,
            payload,
            more: false,
        }
    }

    /// Marks this frame as a non-final segment of a multi-frame L3 message.
    pub fn with_more(mut self, more: bool) -> Self {
        self.more = more;
        self
    }

    /// Packs the frame into a full 23-octet BitVector, idle-filling any
    /// unused payload octets with `0x2b` (the GSM 04.06 §5.4.2.2 filler).
    pub fn to_bitvector(&self) -> Result<BitVector> {
        if self.payload.len() > L2_PAYLOAD_LEN {
            return Err(BtsError::FrameTooShort {
                need: self.payload.len(),
                have: L2_PAYLOAD_LEN,
            });
        }
        let li = LengthIndicator {
            length: self.payload.len() as u8,
            more: self.more,
        };
        let mut b = BitVectorBuilder::with_capacity(L2_FRAME_LEN);
        b.append_byte(self.address.encode());
        b.append_byte(self.control.encode());
        b.append_byte(li.encode());
        b.append_bytes(&self.payload);
        for _ in self.payload.len()..L2_PAYLOAD_LEN {
            b.append_byte(0x2b);
        }
        Ok(b.freeze())
    }

    pub fn from_bitvector(bv: &BitVector, primitive: Primitive) -> Result<L2Frame> {
        if bv.size_bytes() < L2_HEADER_LEN {
            return Err(BtsError::FrameTooShort {
                need: L2_HEADER_LEN,
                have: bv.size_bytes(),
            });
        }
        let address = L2Address::decode(bv.byte_at(0)?)?;
        let control = ControlField::decode(bv.byte_at(1)?)?;
        let li = LengthIndicator::decode(bv.byte_at(2)?)?;
        let len = li.length as usize;
        if len > L2_PAYLOAD_LEN || bv.size_bytes() < L2_HEADER_LEN + len {
            return Err(BtsError::MalformedL3 {
                reason: format!("length indicator {len} exceeds frame capacity"),
            });
        }
        let mut payload = Vec::with_capacity(len);
        for i in 0..len {
            payload.push(bv.byte_at(L2_HEADER_LEN + i)?);
        }
        Ok(L2Frame {
            primitive,
            address,
            control,
            payload,
            more: li.more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrips() {
        for sapi in [Sapi::RrMmCc, Sapi::Sms] {
            for cr in [CR::Command, CR::Response] {
                let a = L2Address { sapi, cr };
                let decoded = L2Address::decode(a.encode()).unwrap();
                assert_eq!(decoded, a);
            }
        }
    }

    #[test]
    fn sabm_control_byte_matches_known_value() {
        let c = ControlField::Unnumbered {
            utype: UType::Sabm,
            pf: false,
        };
        assert_eq!(c.encode(), 0x2f);
        let c_p = ControlField::Unnumbered {
            utype: UType::Sabm,
            pf: true,
        };
        assert_eq!(c_p.encode(), 0x3f);
    }

    #[test]
    fn control_field_roundtrips() {
        let fields = [
            ControlField::Info { ns: 3, nr: 5, p: true },
            ControlField::Info { ns: 0, nr: 0, p: false },
            ControlField::Supervisory { nr: 2, reject: false, pf: true },
            ControlField::Supervisory { nr: 7, reject: true, pf: false },
            ControlField::Unnumbered { utype: UType::Disc, pf: true },
            ControlField::Unnumbered { utype: UType::Ua, pf: false },
            ControlField::Unnumbered { utype: UType::Dm, pf: true },
            ControlField::Unnumbered { utype: UType::Ui, pf: false },
        ];
        for f in fields {
            assert_eq!(ControlField::decode(f.encode()).unwrap(), f);
        }
    }

    #[test]
    fn length_indicator_roundtrips() {
        for len in [0u8, 1, 20, 63] {
            let li = LengthIndicator { length: len, more: len % 2 == 0 };
            let decoded = LengthIndicator::decode(li.encode()).unwrap();
            assert_eq!(decoded, li);
        }
    }

    #[test]
    fn frame_roundtrips_through_bitvector() {
        let frame = L2Frame::new(
            Primitive::L3Data,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Info { ns: 1, nr: 2, p: false },
            vec![0x01, 0x02, 0x03],
        );
        let bv = frame.to_bitvector().unwrap();
        assert_eq!(bv.size_bytes(), L2_FRAME_LEN);
        let back = L2Frame::from_bitvector(&bv, Primitive::L3Data).unwrap();
        assert_eq!(back.address, frame.address);
        assert_eq!(back.control, frame.control);
        assert_eq!(back.payload, frame.payload);
    }

    #[test]
    fn idle_fill_uses_gsm_filler_octet() {
        let frame = L2Frame::new(
            Primitive::L2Data,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Response },
            ControlField::Unnumbered { utype: UType::Ui, pf: false },
            vec![],
        );
        let bv = frame.to_bitvector().unwrap();
        for i in L2_HEADER_LEN..L2_FRAME_LEN {
            assert_eq!(bv.byte_at(i).unwrap(), 0x2b);
        }
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let frame = L2Frame::new(
            Primitive::L3Data,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Ui, pf: false },
            vec![0u8; L2_PAYLOAD_LEN + 1],
        );
        assert!(frame.to_bitvector().is_err());
    }
}
