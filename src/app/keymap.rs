//! Remote key map.
//!
//! Static table from NEC codes of the 24-key RGB remote to logical keys.
//! Only NEC frames are accepted; anything else is reported back as a
//! protocol mismatch so the caller can log it without dispatching.
//!
//! The digit row is decoded by the receiver but has no function here and
//! resolves as unrecognized like any foreign code.

/// Protocol family of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Nec,
    /// Burst that did not match any supported framing.
    Unknown,
}

/// One frame from the decoder collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSignal {
    pub protocol: Protocol,
    pub code: u64,
}

impl DecodedSignal {
    pub const fn nec(code: u64) -> Self {
        Self { protocol: Protocol::Nec, code }
    }
}

/// Physical keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteKey {
    Up,
    Down,
    On,
    Off,
    /// Red colour key.
    Red,
    /// Green colour key.
    Green,
    /// Blue colour key.
    Blue,
    /// White colour key.
    White,
    Flash,
    Strobe,
    Fade,
    Smooth,
}

/// The protocol family the controller accepts.
pub const ACCEPTED_PROTOCOL: Protocol = Protocol::Nec;

/// Code → key table.
pub static KEYMAP: [(u64, RemoteKey); 12] = [
    (0xF7_00FF, RemoteKey::Up),
    (0xF7_807F, RemoteKey::Down),
    (0xF7_C03F, RemoteKey::On),
    (0xF7_40BF, RemoteKey::Off),
    (0xF7_20DF, RemoteKey::Red),
    (0xF7_A05F, RemoteKey::Green),
    (0xF7_609F, RemoteKey::Blue),
    (0xF7_E01F, RemoteKey::White),
    (0xF7_D02F, RemoteKey::Flash),
    (0xF7_F00F, RemoteKey::Strobe),
    (0xF7_C837, RemoteKey::Fade),
    (0xF7_E817, RemoteKey::Smooth),
];

/// Outcome of looking a frame up in the key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Key(RemoteKey),
    /// Accepted protocol, unknown code.
    Unrecognized(u64),
    /// Frame from another protocol family.
    ProtocolMismatch(Protocol),
}

/// Resolve a decoded frame against [`KEYMAP`].
pub fn resolve(signal: DecodedSignal) -> Lookup {
    if signal.protocol != ACCEPTED_PROTOCOL {
        return Lookup::ProtocolMismatch(signal.protocol);
    }
    KEYMAP
        .iter()
        .find(|(code, _)| *code == signal.code)
        .map_or(Lookup::Unrecognized(signal.code), |&(_, key)| Lookup::Key(key))
}

/// Reverse lookup, used by tests and the IR simulator.
pub fn code_for(key: RemoteKey) -> u64 {
    KEYMAP
        .iter()
        .find(|(_, k)| *k == key)
        .map_or(0, |&(code, _)| code)
}
