// Library-Root: Hardware- und Netzwerk-Anbindung für den ESP32-C6
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

pub mod config;
pub mod hal;
pub mod tasks;

use counter_core::{EventLoop, LoggingOtaHandler};

use crate::hal::{EmbassyClock, GpioLedWriter};
use crate::tasks::{EspBrokerClient, EspOtaService};

/// Event-Loop mit den Implementierungen dieser Firmware
pub type CounterLoop = EventLoop<
    'static,
    EspBrokerClient,
    EspOtaService,
    LoggingOtaHandler,
    GpioLedWriter,
    EmbassyClock,
>;
