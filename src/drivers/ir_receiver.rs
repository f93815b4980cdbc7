//! IR receiver: GPIO edge capture plus NEC decoding.
//!
//! The edge ISR (see [`hw_init`](super::hw_init)) timestamps every level
//! change and pushes it into [`IR_EDGES`].  The main loop drains the ring
//! in [`IrReceiver::try_decode`], reconstructs pulse durations, and hands
//! them to the [`NecDecoder`].  A decoded frame is held until
//! [`resume`](crate::app::ports::DecoderPort::resume) is called; edges keep
//! queueing meanwhile.

use core::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

use log::warn;

use super::nec::{FRAME_GAP_US, NecDecoder};
use crate::app::keymap::DecodedSignal;
use crate::app::ports::DecoderPort;

/// Enough for one full NEC frame plus a repeat.  Power of two, below 256.
pub const EDGE_QUEUE_DEPTH: usize = 128;

/// Level after the edge lives in the top bit of a slot.
const LEVEL_BIT: u64 = 1 << 63;

/// A level change on the receiver line.  `high` is the level *after* the
/// edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub at_us: u64,
    pub high: bool,
}

impl Edge {
    fn pack(self) -> u64 {
        (self.at_us & !LEVEL_BIT) | if self.high { LEVEL_BIT } else { 0 }
    }

    fn unpack(raw: u64) -> Self {
        Self { at_us: raw & !LEVEL_BIT, high: raw & LEVEL_BIT != 0 }
    }
}

// ── Lock-free SPSC ring ───────────────────────────────────────
//
// The GPIO ISR is the only producer, the main loop the only consumer.
// Nothing here takes a lock, so `push` is legal in interrupt context.

pub struct EdgeRing {
    head: AtomicU8,
    tail: AtomicU8,
    dropped: AtomicU32,
    slots: [AtomicU64; EDGE_QUEUE_DEPTH],
}

impl EdgeRing {
    pub const fn new() -> Self {
        Self {
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
            dropped: AtomicU32::new(0),
            slots: [const { AtomicU64::new(0) }; EDGE_QUEUE_DEPTH],
        }
    }

    /// Producer side.  Returns `false` and counts a drop when full.
    pub fn push(&self, edge: Edge) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let next = (head + 1) % EDGE_QUEUE_DEPTH as u8;

        if next == tail {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.slots[head as usize].store(edge.pack(), Ordering::Relaxed);
        self.head.store(next, Ordering::Release);
        true
    }

    /// Consumer side.
    pub fn pop(&self) -> Option<Edge> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let raw = self.slots[tail as usize].load(Ordering::Relaxed);
        self.tail.store((tail + 1) % EDGE_QUEUE_DEPTH as u8, Ordering::Release);
        Some(Edge::unpack(raw))
    }

    /// Edges lost since the last call.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl Default for EdgeRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Filled by the GPIO ISR.
pub static IR_EDGES: EdgeRing = EdgeRing::new();

/// ISR entry point.  Never blocks; a full ring drops the edge.
pub fn record_edge(at_us: u64, high: bool) {
    IR_EDGES.push(Edge { at_us, high });
}

pub struct IrReceiver {
    edges: &'static EdgeRing,
    now_us: fn() -> u64,
    decoder: NecDecoder,
    last_edge_us: Option<u64>,
    pending: Option<DecodedSignal>,
}

impl IrReceiver {
    pub fn new(edges: &'static EdgeRing, now_us: fn() -> u64) -> Self {
        Self {
            edges,
            now_us,
            decoder: NecDecoder::new(),
            last_edge_us: None,
            pending: None,
        }
    }

    fn take_edge(&mut self, edge: Edge) {
        if let Some(prev) = self.last_edge_us {
            let elapsed = edge.at_us.saturating_sub(prev);
            if elapsed > u64::from(FRAME_GAP_US) {
                self.pending = self.decoder.finish();
            } else {
                // Line idles high, so a rising edge closes a mark.
                self.decoder.push(edge.high, elapsed as u32);
            }
        }
        self.last_edge_us = Some(edge.at_us);
    }
}

impl DecoderPort for IrReceiver {
    fn try_decode(&mut self) -> Option<DecodedSignal> {
        if self.pending.is_some() {
            return self.pending;
        }

        let dropped = self.edges.take_dropped();
        if dropped > 0 {
            warn!("IR: {} edges dropped, discarding burst", dropped);
            let _ = self.decoder.finish();
            self.last_edge_us = None;
        }

        while self.pending.is_none() {
            match self.edges.pop() {
                Some(edge) => self.take_edge(edge),
                None => break,
            }
        }

        if self.pending.is_none() && !self.decoder.is_empty() {
            let now = (self.now_us)();
            let idle = self.last_edge_us.is_none_or(|t| now.saturating_sub(t) > u64::from(FRAME_GAP_US));
            if idle {
                self.pending = self.decoder.finish();
            }
        }

        self.pending
    }

    fn resume(&mut self) {
        self.pending = None;
    }
}

/// Push a whole NEC frame into `queue` starting at `start_us`.  Returns the
/// timestamp of the final edge.
#[cfg(not(target_os = "espidf"))]
pub fn inject_frame(ring: &EdgeRing, code: u32, start_us: u64) -> u64 {
    let mut t = start_us;
    // Carrier on pulls the line low.
    ring.push(Edge { at_us: t, high: false });
    for pulse in super::nec::encode(code) {
        t += u64::from(pulse.duration_us);
        ring.push(Edge { at_us: t, high: pulse.mark });
    }
    t
}
