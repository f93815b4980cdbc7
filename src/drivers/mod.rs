//! Board drivers, hardware initialisation, and the IR decoder.

pub mod hw_init;
pub mod ir_receiver;
pub mod nec;
pub mod relay;
pub mod servo;
pub mod status_led;
pub mod watchdog;
