//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements            | Connects to                 |
//! |------------------|-----------------------|-----------------------------|
//! | `control_server` | ControlEndpoint       | axum HTTP listener          |
//! | `log_sink`       | EventSink             | `log` facade                |
//! | `report_sink`    | EventSink             | status service (rate-gated) |
//! | `rpi`            | embedded-hal pins     | rppal GPIO (feature `rpi`)  |
//! | `status_client`  | report + power poll   | status service HTTP API     |
//! | `time`           | Clock, DelayNs        | `std::time::Instant`        |

pub mod control_server;
pub mod log_sink;
pub mod report_sink;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod status_client;
pub mod time;
