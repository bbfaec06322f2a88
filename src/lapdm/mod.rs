//! LAPDm data-link entity, GSM 04.06.
//!
//! One entity exists per (logical channel, SAPI) pair. It is driven from
//! two directions: `l2dl_write_high_side` for frames/primitives coming
//! down from L3, and `l2dl_write_low_side` for frames coming up from L1.
//! Acknowledgement waits block the calling thread on a condvar rather than
//! polling -- the entity's worker thread is the only writer of `state`, so
//! a waiting thread just parks until it's notified or T200 fires.

use crate::constants::{
    N200_FACCH, N200_SACCH, N200_SDCCH, N201_DCCH, N201_SACCH, T200_FACCH, T200_SACCH, T200_SDCCH,
};
use crate::error::{BtsError, Result};
use crate::l2::{CR, ControlField, L2Address, L2Frame, Primitive, Sapi, UType};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapdmState {
    LinkReleased,
    AwaitingEstablish,
    ContentionResolution,
    LinkEstablished,
    AwaitingRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Sdcch,
    Facch,
    Sacch,
}

impl ChannelKind {
    fn t200(self) -> Duration {
        match self {
            ChannelKind::Sdcch => T200_SDCCH,
            ChannelKind::Facch => T200_FACCH,
            ChannelKind::Sacch => T200_SACCH,
        }
    }

    fn n200(self) -> u32 {
        match self {
            ChannelKind::Sdcch => N200_SDCCH,
            ChannelKind::Facch => N200_FACCH,
            ChannelKind::Sacch => N200_SACCH,
        }
    }

    fn n201(self) -> usize {
        match self {
            ChannelKind::Sdcch | ChannelKind::Facch => N201_DCCH,
            ChannelKind::Sacch => N201_SACCH,
        }
    }
}

struct Inner {
    state: LapdmState,
    vs: u8,
    va: u8,
    vr: u8,
    n200_count: u32,
    t200_deadline: Option<Instant>,
    outstanding: Option<L2Frame>,
    contention_fingerprint: Option<Vec<u8>>,
}

/// A LAPDm data-link entity for one SAPI on one logical channel.
pub struct LapdmEntity {
    sapi: Sapi,
    kind: ChannelKind,
    inner: Mutex<Inner>,
    ack_cv: Condvar,
}

impl LapdmEntity {
    pub fn new(sapi: Sapi, kind: ChannelKind) -> Self {
        LapdmEntity {
            sapi,
            kind,
            inner: Mutex::new(Inner {
                state: LapdmState::LinkReleased,
                vs: 0,
                va: 0,
                vr: 0,
                n200_count: 0,
                t200_deadline: None,
                outstanding: None,
                contention_fingerprint: None,
            }),
            ack_cv: Condvar::new(),
        }
    }

    pub fn state(&self) -> LapdmState {
        self.inner.lock().unwrap().state
    }

    /// The L3 payload sent in our own SABM, kept so the channel owner can
    /// compare it against whatever the MS echoes back and detect a
    /// contention-resolution collision with another mobile.
    pub fn contention_fingerprint(&self) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().contention_fingerprint.clone()
    }

    fn address(&self, cr: CR) -> L2Address {
        L2Address { sapi: self.sapi, cr }
    }

    /// `L3_ESTABLISH_REQUEST`: send SABM with the first L3 message as its
    /// payload (contention resolution piggybacks on this frame) and start
    /// T200.
    pub fn establish(&self, l3_payload: Vec<u8>) -> Result<L2Frame> {
        let mut g = self.inner.lock().unwrap();
        if g.state != LapdmState::LinkReleased {
            return Err(BtsError::LapdmProtocolError {
                detail: "establish requested while link not released".into(),
            });
        }
        let frame = L2Frame::new(
            Primitive::L3EstablishRequest,
            self.address(CR::Command),
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            l3_payload.clone(),
        );
        g.state = LapdmState::ContentionResolution;
        g.contention_fingerprint = Some(l3_payload);
        g.n200_count = 0;
        g.t200_deadline = Some(Instant::now() + self.kind.t200());
        g.outstanding = Some(frame.clone());
        Ok(frame)
    }

    /// Network-initiated establishment on a SAPI that doesn't need
    /// contention resolution (SAPI3, or SAPI0 once the MS is already
    /// uniquely identified by the channel it was assigned on): sends a
    /// bare SABM and waits for the plain UA.
    pub fn establish_no_contention(&self) -> Result<L2Frame> {
        let mut g = self.inner.lock().unwrap();
        if g.state != LapdmState::LinkReleased {
            return Err(BtsError::LapdmProtocolError {
                detail: "establish requested while link not released".into(),
            });
        }
        let frame = L2Frame::new(
            Primitive::L3EstablishRequest,
            self.address(CR::Command),
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            Vec::new(),
        );
        g.state = LapdmState::AwaitingEstablish;
        g.n200_count = 0;
        g.t200_deadline = Some(Instant::now() + self.kind.t200());
        g.outstanding = Some(frame.clone());
        Ok(frame)
    }

    /// `L2DL` downward path: queue an L3 message as one or more I-frames,
    /// segmenting it to N201 octets per frame (GSM 04.06 §4.4) and setting
    /// the M-bit on every segment but the last. Each segment consumes one
    /// V(S) value. Returns the frames ready to push to L1 in order; only
    /// the last segment is tracked for T200/retransmission, matching this
    /// entity's stop-and-wait acknowledgement model.
    pub fn send_data(&self, l3_payload: Vec<u8>) -> Result<Vec<L2Frame>> {
        let mut g = self.inner.lock().unwrap();
        if g.state != LapdmState::LinkEstablished {
            return Err(BtsError::LapdmProtocolError {
                detail: "send_data while link not established".into(),
            });
        }
        let n201 = self.kind.n201();
        let chunks: Vec<&[u8]> = if l3_payload.is_empty() {
            vec![&l3_payload[..]]
        } else {
            l3_payload.chunks(n201).collect()
        };
        let last = chunks.len() - 1;
        let mut frames = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            let ns = g.vs;
            let nr = g.vr;
            let frame = L2Frame::new(
                Primitive::L3Data,
                self.address(CR::Command),
                ControlField::Info { ns, nr, p: false },
                chunk.to_vec(),
            )
            .with_more(i != last);
            g.vs = g.vs.wrapping_add(1) % 8;
            frames.push(frame);
        }
        g.outstanding = frames.last().cloned();
        g.t200_deadline = Some(Instant::now() + self.kind.t200());
        Ok(frames)
    }

    /// A frame with no queued data: idle filling, GSM 04.06 §5.4.2.2. SAPI0
    /// sends an unnumbered-information filler; this never touches V(S)/V(R).
    pub fn idle_fill(&self) -> L2Frame {
        L2Frame::new(
            Primitive::L2Data,
            self.address(CR::Response),
            ControlField::Unnumbered { utype: UType::Ui, pf: false },
            Vec::new(),
        )
    }

    /// `L2DL` upward path: a frame arrived from L1. Returns any L3 payload
    /// that should be indicated upstream, and may produce a reply frame
    /// (UA, RR) that the caller is responsible for transmitting.
    pub fn receive(&self, frame: &L2Frame) -> Result<(Option<Vec<u8>>, Option<L2Frame>)> {
        let mut g = self.inner.lock().unwrap();
        match frame.control {
            ControlField::Unnumbered { utype: UType::Sabm, .. } => {
                // GSM 04.06 §5.4.1.4 contention resolution: while waiting for
                // our own SABM to come back, a second SABM with a different
                // payload belongs to another mobile that collided with us on
                // this channel and must be silently dropped, not accepted.
                if g.state == LapdmState::ContentionResolution {
                    if let Some(fingerprint) = &g.contention_fingerprint {
                        if *fingerprint != frame.payload {
                            return Ok((None, None));
                        }
                    }
                }
                let reply = L2Frame::new(
                    Primitive::PhConnect,
                    self.address(CR::Response),
                    ControlField::Unnumbered { utype: UType::Ua, pf: true },
                    frame.payload.clone(),
                );
                g.state = LapdmState::LinkEstablished;
                g.vs = 0;
                g.va = 0;
                g.vr = 0;
                drop(g);
                self.ack_cv.notify_all();
                let indication = if frame.payload.is_empty() {
                    None
                } else {
                    Some(frame.payload.clone())
                };
                Ok((indication, Some(reply)))
            }
            ControlField::Unnumbered { utype: UType::Disc, .. } => {
                let reply = L2Frame::new(
                    Primitive::L3ReleaseIndication,
                    self.address(CR::Response),
                    ControlField::Unnumbered { utype: UType::Ua, pf: true },
                    Vec::new(),
                );
                g.state = LapdmState::LinkReleased;
                g.t200_deadline = None;
                drop(g);
                self.ack_cv.notify_all();
                Ok((None, Some(reply)))
            }
            ControlField::Unnumbered { utype: UType::Ua, .. } => {
                if g.state == LapdmState::ContentionResolution || g.state == LapdmState::AwaitingEstablish {
                    g.state = LapdmState::LinkEstablished;
                    g.t200_deadline = None;
                    g.outstanding = None;
                } else if g.state == LapdmState::AwaitingRelease {
                    g.state = LapdmState::LinkReleased;
                    g.t200_deadline = None;
                }
                drop(g);
                self.ack_cv.notify_all();
                Ok((None, None))
            }
            ControlField::Unnumbered { utype: UType::Dm, .. } => {
                // GSM 04.06 rel-8 §5.4.1.2: DM reports that the peer never
                // accepted our SABM. Reset T200 and raise
                // L3_RELEASE_INDICATION upward, but the link's state is
                // unchanged -- DM does not release an established link.
                g.t200_deadline = None;
                g.outstanding = None;
                g.n200_count = 0;
                drop(g);
                self.ack_cv.notify_all();
                Ok((None, Some(self.mdl_error_frame())))
            }
            ControlField::Unnumbered { utype: UType::Ui, .. } => Ok((None, None)),
            ControlField::Info { ns, nr, .. } => {
                if g.state != LapdmState::LinkEstablished {
                    return Ok((None, None));
                }
                self.advance_va(&mut g, nr);
                if ns == g.vr {
                    g.vr = (g.vr + 1) % 8;
                    let ack = L2Frame::new(
                        Primitive::L2Data,
                        self.address(CR::Response),
                        ControlField::Supervisory { nr: g.vr, reject: false, pf: false },
                        Vec::new(),
                    );
                    return Ok((Some(frame.payload.clone()), Some(ack)));
                }
                // N(S) != V(R): out-of-sequence I-frame, GSM 04.06 §5.7.3.
                // Reject so the peer resends starting at our V(R).
                let reject = L2Frame::new(
                    Primitive::L2Data,
                    self.address(CR::Response),
                    ControlField::Supervisory { nr: g.vr, reject: true, pf: false },
                    Vec::new(),
                );
                Ok((None, Some(reject)))
            }
            ControlField::Supervisory { nr, reject, .. } => {
                self.advance_va(&mut g, nr);
                if reject {
                    g.vs = g.va;
                }
                Ok((None, None))
            }
        }
    }

    fn advance_va(&self, g: &mut Inner, nr: u8) {
        if g.outstanding.is_some() && nr != g.va {
            g.va = nr;
            g.outstanding = None;
            g.t200_deadline = None;
            g.n200_count = 0;
        }
    }

    fn mdl_error_frame(&self) -> L2Frame {
        L2Frame::new(
            Primitive::MdlErrorIndication,
            self.address(CR::Response),
            ControlField::Unnumbered { utype: UType::Dm, pf: false },
            Vec::new(),
        )
    }

    /// Called periodically (e.g. once per TDMA frame) by the channel's
    /// owning thread. Returns a frame to retransmit if T200 expired and
    /// N200 hasn't yet been exhausted, or signals abnormal release by
    /// returning `Err` once N200 is exceeded.
    pub fn poll_t200(&self) -> Result<Option<L2Frame>> {
        let mut g = self.inner.lock().unwrap();
        let Some(deadline) = g.t200_deadline else {
            return Ok(None);
        };
        if Instant::now() < deadline {
            return Ok(None);
        }
        g.n200_count += 1;
        if g.n200_count > self.kind.n200() {
            g.state = LapdmState::LinkReleased;
            g.t200_deadline = None;
            g.outstanding = None;
            drop(g);
            self.ack_cv.notify_all();
            return Err(BtsError::LapdmProtocolError {
                detail: "N200 exceeded, abnormal release".into(),
            });
        }
        g.t200_deadline = Some(Instant::now() + self.kind.t200());
        Ok(g.outstanding.clone())
    }

    /// Blocks the calling thread until the link reaches `LinkEstablished`
    /// (or is released, which is reported as an error) or `timeout`
    /// elapses.
    pub fn wait_for_ack(&self, timeout: Duration) -> Result<()> {
        let g = self.inner.lock().unwrap();
        let (g, result) = self
            .ack_cv
            .wait_timeout_while(g, timeout, |inner| {
                inner.state == LapdmState::ContentionResolution
                    || inner.state == LapdmState::AwaitingEstablish
            })
            .unwrap();
        if result.timed_out() {
            return Err(BtsError::LapdmProtocolError {
                detail: "wait_for_ack timed out".into(),
            });
        }
        if g.state != LapdmState::LinkEstablished {
            return Err(BtsError::LapdmProtocolError {
                detail: "link released while waiting for ack".into(),
            });
        }
        Ok(())
    }

    /// Test-support hook, mirroring `LoopbackL1`: forces the next
    /// `poll_t200` call to see an expired timer without waiting out the
    /// real T200 duration.
    pub fn force_t200_expired_for_test(&self) {
        let mut g = self.inner.lock().unwrap();
        g.t200_deadline = Some(Instant::now() - Duration::from_millis(1));
    }

    /// `L3_RELEASE_REQUEST`: send DISC and await UA/DM.
    pub fn release(&self) -> Result<L2Frame> {
        let mut g = self.inner.lock().unwrap();
        let frame = L2Frame::new(
            Primitive::L3ReleaseRequest,
            self.address(CR::Command),
            ControlField::Unnumbered { utype: UType::Disc, pf: true },
            Vec::new(),
        );
        g.state = LapdmState::AwaitingRelease;
        g.n200_count = 0;
        g.t200_deadline = Some(Instant::now() + self.kind.t200());
        g.outstanding = Some(frame.clone());
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn establish_then_sabm_ua_brings_link_up() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sdcch);
        let sabm = entity.establish(vec![0xaa]).unwrap();
        assert_eq!(entity.state(), LapdmState::ContentionResolution);

        let peer_ua = L2Frame::new(
            Primitive::PhConnect,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Response },
            ControlField::Unnumbered { utype: UType::Ua, pf: true },
            sabm.payload.clone(),
        );
        let (_, reply) = entity.receive(&peer_ua).unwrap();
        assert!(reply.is_none());
        assert_eq!(entity.state(), LapdmState::LinkEstablished);
    }

    #[test]
    fn no_contention_establish_waits_for_bare_ua() {
        let entity = LapdmEntity::new(Sapi::Sms, ChannelKind::Sdcch);
        entity.establish_no_contention().unwrap();
        assert_eq!(entity.state(), LapdmState::AwaitingEstablish);
        let ua = L2Frame::new(
            Primitive::PhConnect,
            L2Address { sapi: Sapi::Sms, cr: CR::Response },
            ControlField::Unnumbered { utype: UType::Ua, pf: true },
            vec![],
        );
        entity.receive(&ua).unwrap();
        assert_eq!(entity.state(), LapdmState::LinkEstablished);
    }

    #[test]
    fn incoming_sabm_replies_with_ua_and_establishes() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sdcch);
        let sabm = L2Frame::new(
            Primitive::L3EstablishIndication,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            vec![0x01, 0x02],
        );
        let (indication, reply) = entity.receive(&sabm).unwrap();
        assert_eq!(indication, Some(vec![0x01, 0x02]));
        let reply = reply.unwrap();
        assert_eq!(reply.control, ControlField::Unnumbered { utype: UType::Ua, pf: true });
        assert_eq!(entity.state(), LapdmState::LinkEstablished);
    }

    #[test]
    fn data_transfer_increments_sequence_numbers() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Facch);
        let sabm = L2Frame::new(
            Primitive::L3EstablishIndication,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            vec![],
        );
        entity.receive(&sabm).unwrap();
        let frames1 = entity.send_data(vec![0x10]).unwrap();
        assert_eq!(frames1.len(), 1);
        assert_eq!(frames1[0].control, ControlField::Info { ns: 0, nr: 0, p: false });
        assert!(!frames1[0].more);
        let frames2 = entity.send_data(vec![0x20]).unwrap();
        assert_eq!(frames2[0].control, ControlField::Info { ns: 1, nr: 0, p: false });
    }

    #[test]
    fn oversized_payload_segments_into_multiple_i_frames_with_m_bit() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sdcch);
        let sabm = L2Frame::new(
            Primitive::L3EstablishIndication,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            vec![],
        );
        entity.receive(&sabm).unwrap();
        let payload = vec![0xab; crate::constants::N201_DCCH * 2 + 3];
        let frames = entity.send_data(payload.clone()).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].more);
        assert!(frames[1].more);
        assert!(!frames[2].more);
        let reassembled: Vec<u8> = frames.iter().flat_map(|f| f.payload.clone()).collect();
        assert_eq!(reassembled, payload);
        assert_eq!(frames[0].control, ControlField::Info { ns: 0, nr: 0, p: false });
        assert_eq!(frames[1].control, ControlField::Info { ns: 1, nr: 0, p: false });
        assert_eq!(frames[2].control, ControlField::Info { ns: 2, nr: 0, p: false });
    }

    #[test]
    fn colliding_sabm_with_different_payload_is_dropped_during_contention_resolution() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sdcch);
        entity.establish(vec![0xaa]).unwrap();
        assert_eq!(entity.state(), LapdmState::ContentionResolution);

        let colliding_sabm = L2Frame::new(
            Primitive::L3EstablishIndication,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            vec![0xbb],
        );
        let (indication, reply) = entity.receive(&colliding_sabm).unwrap();
        assert!(indication.is_none());
        assert!(reply.is_none());
        assert_eq!(entity.state(), LapdmState::ContentionResolution);
    }

    #[test]
    fn out_of_sequence_i_frame_is_rejected() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sdcch);
        let sabm = L2Frame::new(
            Primitive::L3EstablishIndication,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            vec![],
        );
        entity.receive(&sabm).unwrap();
        let skipped = L2Frame::new(
            Primitive::L3Data,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Info { ns: 1, nr: 0, p: false },
            vec![0x99],
        );
        let (indication, reply) = entity.receive(&skipped).unwrap();
        assert!(indication.is_none());
        match reply.unwrap().control {
            ControlField::Supervisory { nr, reject, .. } => {
                assert!(reject);
                assert_eq!(nr, 0);
            }
            other => panic!("expected REJ, got {other:?}"),
        }
    }

    #[test]
    fn disc_releases_link() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sdcch);
        let sabm = L2Frame::new(
            Primitive::L3EstablishIndication,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Sabm, pf: true },
            vec![],
        );
        entity.receive(&sabm).unwrap();
        let disc = L2Frame::new(
            Primitive::L3ReleaseRequest,
            L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
            ControlField::Unnumbered { utype: UType::Disc, pf: true },
            vec![],
        );
        let (_, reply) = entity.receive(&disc).unwrap();
        assert!(reply.is_some());
        assert_eq!(entity.state(), LapdmState::LinkReleased);
    }

    #[test]
    fn t200_expiry_retransmits_until_n200_then_releases() {
        let entity = LapdmEntity::new(Sapi::RrMmCc, ChannelKind::Sacch);
        entity.establish(vec![0xff]).unwrap();
        {
            let mut g = entity.inner.lock().unwrap();
            g.t200_deadline = Some(Instant::now() - Duration::from_millis(1));
        }
        let retransmit = entity.poll_t200().unwrap();
        assert!(retransmit.is_some());

        for _ in 0..(N200_SACCH) {
            let mut g = entity.inner.lock().unwrap();
            g.t200_deadline = Some(Instant::now() - Duration::from_millis(1));
        }
        let result = entity.poll_t200();
        assert!(result.is_err());
        assert_eq!(entity.state(), LapdmState::LinkReleased);
    }
}
