//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements               | Connects to              |
//! |--------------|--------------------------|--------------------------|
//! | `hardware`   | Servo/Relay/Indicator    | LEDC PWM, GPIO           |
//! |              | ClockPort                | via `time`               |
//! | `log_sink`   | EventSink                | Serial log output        |
//! | `nvs`        | LimitStorePort           | NVS / in-memory store    |
//! |              | ConfigPort               |                          |
//! | `thingspeak` | TelemetryPort            | ThingSpeak HTTPS API     |
//! | `time`       | ClockPort                | ESP32 system timer, TWDT |
//! | `wifi`       | ConnectivityPort         | ESP-IDF WiFi STA         |
//!
//! The decoder port is implemented by
//! [`IrReceiver`](crate::drivers::ir_receiver::IrReceiver).

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod thingspeak;
pub mod time;
pub mod wifi;
