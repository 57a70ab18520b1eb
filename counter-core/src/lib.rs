//! Counter Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert die Capability-Traits (WiFi, Broker, OTA, LED, Clock)
//! und die Logik, die darauf aufbaut. Dadurch laufen alle Tests auf dem Host.

#![no_std]
#![cfg_attr(not(feature = "defmt"), allow(unused_variables))]

// Muss vor den anderen Modulen stehen, damit die Log-Makros sichtbar sind
#[macro_use]
mod fmt;

pub mod broker;
pub mod config;
pub mod event_loop;
pub mod link;
pub mod logic;
pub mod ota;
pub mod retry;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use broker::{LoggingMessageHandler, reconnect};
pub use config::{BrokerCredentials, OtaConfig, StationConfig};
pub use event_loop::{EventLoop, EventLoopConfig, TickReport};
pub use link::bootstrap_link;
pub use logic::{PublishSchedule, format_counter, progress_percent};
pub use ota::{LoggingOtaHandler, OtaListener, OtaRequest, run_session};
pub use retry::{Attempts, RetryExhausted, RetryPolicy, Retried, retry_with_delay};
pub use traits::{
    BrokerClient, Clock, FirmwareSink, FirmwareSinkError, LedError, LedWriter, MessageHandler,
    OtaEventHandler, OtaService, Restart, WifiStation,
};
pub use types::{BrokerState, LedState, LinkError, OtaError, PublishCounter};
