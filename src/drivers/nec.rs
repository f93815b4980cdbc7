//! NEC infrared frame decoder.
//!
//! Pure timing logic: feed it the level that just *ended* and how long it
//! lasted, then call [`NecDecoder::finish`] once the line has been idle for
//! [`FRAME_GAP_US`].  The receiver module is active-low, so a "mark"
//! (carrier present) reads as a low level.
//!
//! A well-formed NEC frame yields a [`Protocol::Nec`] signal whose code is
//! the 32 data bits in transmission order (first bit most significant), the
//! same layout the remote's keymap is written in.  Repeat frames are
//! swallowed.  Any other burst long enough to look intentional is reported
//! as [`Protocol::Unknown`] with a stable hash of its timings so the
//! dispatcher can log it.

use crate::app::keymap::{DecodedSignal, Protocol};

/// Idle time that terminates a burst.
pub const FRAME_GAP_US: u32 = 15_000;

const LEADER_MARK_US: u32 = 9_000;
const LEADER_SPACE_US: u32 = 4_500;
const REPEAT_SPACE_US: u32 = 2_250;
const BIT_MARK_US: u32 = 560;
const ZERO_SPACE_US: u32 = 560;
const ONE_SPACE_US: u32 = 1_690;

/// Bursts shorter than this are treated as line noise.
pub const MIN_UNKNOWN_EDGES: usize = 12;

const MAX_PULSES: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub mark: bool,
    pub duration_us: u32,
}

/// ±25 %.
fn near(actual: u32, nominal: u32) -> bool {
    let tol = nominal / 4;
    actual >= nominal - tol && actual <= nominal + tol
}

#[derive(Debug, Default)]
pub struct NecDecoder {
    pulses: heapless::Vec<Pulse, MAX_PULSES>,
    overflowed: bool,
}

impl NecDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed level.  `mark` is true for carrier-on periods.
    pub fn push(&mut self, mark: bool, duration_us: u32) {
        // Leading spaces are just idle line.
        if self.pulses.is_empty() && !mark {
            return;
        }
        if self.pulses.push(Pulse { mark, duration_us }).is_err() {
            self.overflowed = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// Close the current burst and classify it.
    pub fn finish(&mut self) -> Option<DecodedSignal> {
        let result = if self.overflowed {
            Some(self.unknown())
        } else {
            self.classify()
        };
        self.pulses.clear();
        self.overflowed = false;
        result
    }

    fn classify(&self) -> Option<DecodedSignal> {
        let p = &self.pulses;
        if p.len() >= 2 && p[0].mark && near(p[0].duration_us, LEADER_MARK_US) {
            if near(p[1].duration_us, REPEAT_SPACE_US) {
                log::trace!("nec: repeat frame");
                return None;
            }
            if near(p[1].duration_us, LEADER_SPACE_US) {
                if let Some(code) = Self::data_bits(&p[2..]) {
                    if Self::checksum_ok(code) {
                        return Some(DecodedSignal::nec(code));
                    }
                    log::debug!("nec: checksum mismatch on {:#010X}", code);
                }
            }
        }
        if p.len() + 1 >= MIN_UNKNOWN_EDGES {
            Some(self.unknown())
        } else {
            None
        }
    }

    /// 32 mark/space pairs followed by the stop mark.
    fn data_bits(rest: &[Pulse]) -> Option<u64> {
        if rest.len() < 65 {
            return None;
        }
        let mut code: u64 = 0;
        for pair in rest[..64].chunks_exact(2) {
            let (mark, space) = (pair[0], pair[1]);
            if !mark.mark || !near(mark.duration_us, BIT_MARK_US) {
                return None;
            }
            let bit = if near(space.duration_us, ONE_SPACE_US) {
                1
            } else if near(space.duration_us, ZERO_SPACE_US) {
                0
            } else {
                return None;
            };
            code = (code << 1) | bit;
        }
        near(rest[64].duration_us, BIT_MARK_US).then_some(code)
    }

    /// Command byte followed by its complement in the low half.
    fn checksum_ok(code: u64) -> bool {
        let cmd = ((code >> 8) & 0xFF) as u8;
        let inv = (code & 0xFF) as u8;
        cmd == !inv
    }

    /// FNV-1a over the raw durations.
    fn unknown(&self) -> DecodedSignal {
        let mut hash: u32 = 0x811C_9DC5;
        for pulse in &self.pulses {
            for b in pulse.duration_us.to_le_bytes() {
                hash ^= u32::from(b);
                hash = hash.wrapping_mul(0x0100_0193);
            }
        }
        DecodedSignal {
            protocol: Protocol::Unknown,
            code: u64::from(hash),
        }
    }
}

/// Expand a 32-bit NEC code into the mark/space sequence a remote would
/// send.  Used by host-side receivers and tests.
pub fn encode(code: u32) -> heapless::Vec<Pulse, MAX_PULSES> {
    let mut out = heapless::Vec::new();
    let mut put = |mark: bool, duration_us: u32| {
        let _ = out.push(Pulse { mark, duration_us });
    };
    put(true, LEADER_MARK_US);
    put(false, LEADER_SPACE_US);
    for i in (0..32).rev() {
        put(true, BIT_MARK_US);
        let one = (code >> i) & 1 == 1;
        put(false, if one { ONE_SPACE_US } else { ZERO_SPACE_US });
    }
    put(true, BIT_MARK_US);
    out
}
