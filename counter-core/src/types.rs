//! Core Types für Zähler, LED-Zustand und Fehlerklassen
//!
//! Datenstrukturen ohne Hardware-Dependencies

use core::sync::atomic::{AtomicBool, Ordering};

/// 8-Bit Publish-Zähler (0..=255, danach wieder 0)
///
/// Gehört ausschließlich dem Event-Loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishCounter(u8);

impl PublishCounter {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn starting_at(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Erhöht den Zähler (255 → 0) und liefert den neuen Wert
    pub fn advance(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

/// LED-Zustand, geteilt zwischen Button-Interrupt und Event-Loop
///
/// Nur der Interrupt-Handler ruft `toggle()` auf (Read-Modify-Write).
/// Der Event-Loop liest ausschließlich mit `is_on()`.
#[derive(Debug, Default)]
pub struct LedState {
    on: AtomicBool,
}

impl LedState {
    /// Startzustand nach Boot: aus
    pub const fn new() -> Self {
        Self {
            on: AtomicBool::new(false),
        }
    }

    /// Invertiert den Zustand. Nur aus dem Interrupt-Kontext aufrufen.
    pub fn toggle(&self) {
        self.on.fetch_xor(true, Ordering::AcqRel);
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}

/// Verbindungsstatus des Broker-Clients
///
/// Die numerischen Codes entsprechen der üblichen MQTT-Client-Konvention
/// (negativ = Transport, positiv = CONNACK-Ablehnung).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BrokerState {
    ConnectionTimeout,
    ConnectionLost,
    ConnectFailed,
    Disconnected,
    Connected,
    BadProtocol,
    BadClientId,
    Unavailable,
    BadCredentials,
    Unauthorized,
}

impl BrokerState {
    pub const fn code(self) -> i8 {
        match self {
            BrokerState::ConnectionTimeout => -4,
            BrokerState::ConnectionLost => -3,
            BrokerState::ConnectFailed => -2,
            BrokerState::Disconnected => -1,
            BrokerState::Connected => 0,
            BrokerState::BadProtocol => 1,
            BrokerState::BadClientId => 2,
            BrokerState::Unavailable => 3,
            BrokerState::BadCredentials => 4,
            BrokerState::Unauthorized => 5,
        }
    }
}

/// Fehlerklassen einer OTA-Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtaError {
    /// Shared Secret stimmt nicht
    Auth,
    /// Update konnte nicht gestartet werden (Header, Partition, Größe)
    Begin,
    /// Verbindungsaufbau zum Uploader fehlgeschlagen
    Connect,
    /// Abbruch während der Übertragung
    Receive,
    /// Abschluss/Aktivierung des neuen Images fehlgeschlagen
    End,
}

impl OtaError {
    pub const fn code(self) -> u8 {
        match self {
            OtaError::Auth => 0,
            OtaError::Begin => 1,
            OtaError::Connect => 2,
            OtaError::Receive => 3,
            OtaError::End => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OtaError::Auth => "Auth Failed",
            OtaError::Begin => "Begin Failed",
            OtaError::Connect => "Connect Failed",
            OtaError::Receive => "Receive Failed",
            OtaError::End => "End Failed",
        }
    }
}

/// Fehler beim Aufbau der WLAN-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    ConfigRejected,
    StartFailed,
    AssociationFailed,
    AddressTimeout,
}
