//! Logical commands dispatched in normal operation.
//!
//! Keys mean different things depending on who owns dispatch: in normal
//! mode they map to the [`Command`]s below, inside a calibration or
//! env-select session the session interprets the raw [`RemoteKey`].

use super::keymap::RemoteKey;

/// Normal-mode commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Nudge the damper towards open by one step.
    StepUp,
    /// Nudge the damper towards closed by one step.
    StepDown,
    /// Drive to the stored open limit.
    Open,
    /// Drive to the stored closed limit.
    Close,
    ConnectivityOn,
    ConnectivityOff,
    /// Choose whether cloud readings are polled.
    EnvToggle,
    /// Start the limit calibration session.
    Calibrate,
}

impl Command {
    /// Map a key to its normal-mode command.  Keys reserved for sessions
    /// return `None`.
    pub fn from_key(key: RemoteKey) -> Option<Self> {
        match key {
            RemoteKey::Up => Some(Self::StepUp),
            RemoteKey::Down => Some(Self::StepDown),
            RemoteKey::Green => Some(Self::Open),
            RemoteKey::Red => Some(Self::Close),
            RemoteKey::On => Some(Self::ConnectivityOn),
            RemoteKey::Off => Some(Self::ConnectivityOff),
            RemoteKey::White => Some(Self::EnvToggle),
            RemoteKey::Blue => Some(Self::Calibrate),
            RemoteKey::Flash | RemoteKey::Strobe | RemoteKey::Fade | RemoteKey::Smooth => None,
        }
    }
}

/// Answer keys of the env-control selector: ON enables polling, OFF
/// disables it.  Everything else keeps the selector waiting.
pub fn env_choice(key: RemoteKey) -> Option<bool> {
    match key {
        RemoteKey::On => Some(true),
        RemoteKey::Off => Some(false),
        _ => None,
    }
}
