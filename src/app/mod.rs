//! Application core — pure domain logic, zero I/O.
//!
//! Key mapping, damper positioning, the calibration and env-select
//! sessions, connectivity policy, and LED state.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod actuator;
pub mod calibration;
pub mod commands;
pub mod connectivity;
pub mod events;
pub mod indicator;
pub mod keymap;
pub mod ports;
pub mod service;
pub mod telemetry;
