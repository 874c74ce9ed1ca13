//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                  |
//! |------------|--------------------|------------------------------|
//! | `hap`      | AccessoryServer    | external HAP bridge component|
//! |            | NotifyPort         |                              |
//! | `hardware` | ActuatorPort       | ESP32 GPIO, LEDC PWM         |
//! |            | LightSensorPort    | ESP32 ADC (photocell)        |
//! | `log_sink` | EventSink          | Serial log output            |
//! | `time`     | ClockPort          | ESP32 system timer           |

pub mod hap;
pub mod hardware;
pub mod log_sink;
pub mod time;
