//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware- und Netzwerk-Zugriff
//! ohne konkrete Implementierung.
//!
//! # Implementierungen
//! - **Production:** `counter-firmware` (esp-hal, esp-radio, embassy-net, rust-mqtt)
//! - **Testing:** Mocks in `counter-tests`

use core::net::Ipv4Addr;

use crate::config::{BrokerCredentials, OtaConfig, StationConfig};
use crate::types::{BrokerState, LinkError, OtaError};

/// Fehler-Typ für LED-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    WriteFailed,
}

/// Trait für den LED-Ausgang
///
/// # Fehlerbehandlung
/// Gibt `LedError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
pub trait LedWriter {
    /// Setzt den Ausgang auf High (`true`) oder Low (`false`)
    fn write(&mut self, on: bool) -> Result<(), LedError>;
}

/// Monotone Zeitbasis in Millisekunden plus asynchrones Warten
///
/// Tests nutzen eine virtuelle Uhr, bei der `delay_ms` die Zeit vorstellt.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now_ms(&self) -> u64;

    async fn delay_ms(&mut self, ms: u64);
}

/// Kompletter Neustart des Geräts
///
/// Auf echter Hardware kehrt `restart()` nie zurück.
pub trait Restart {
    fn restart(&mut self);
}

/// WLAN im Station-Modus ("establish link")
#[allow(async_fn_in_trait)]
pub trait WifiStation {
    /// Verbindet mit dem Access Point und wartet auf die IPv4-Adresse
    async fn connect(&mut self, config: &StationConfig<'_>) -> Result<Ipv4Addr, LinkError>;
}

/// Empfänger für eingehende Broker-Nachrichten
pub trait MessageHandler {
    fn on_message(&mut self, topic: &str, payload: &[u8]);
}

/// Publish/Subscribe-Client ("connect/publish/poll")
#[allow(async_fn_in_trait)]
pub trait BrokerClient {
    fn connected(&self) -> bool;

    /// Ein einzelner Verbindungsversuch
    async fn connect(&mut self, credentials: &BrokerCredentials<'_>) -> Result<(), BrokerState>;

    /// Bedient die Client-I/O: eingehende Nachrichten und Keep-Alive
    async fn poll<H: MessageHandler>(&mut self, handler: &mut H);

    async fn publish(&mut self, topic: &str, payload: &[u8], retain: bool)
    -> Result<(), BrokerState>;
}

/// Callbacks einer OTA-Session
pub trait OtaEventHandler {
    fn on_start(&mut self);
    fn on_end(&mut self);
    fn on_progress(&mut self, progress: u32, total: u32);
    fn on_error(&mut self, error: OtaError);
}

/// OTA-Dienst ("begin OTA listener and poll it")
#[allow(async_fn_in_trait)]
pub trait OtaService {
    /// Einmalig vor dem Event-Loop
    fn begin(&mut self, config: &OtaConfig<'_>);

    /// Einmal pro Loop-Durchlauf. Ohne wartenden Uploader kehrt der Aufruf
    /// sofort zurück, eine angenommene Session läuft bis zum Ende durch.
    async fn handle<H: OtaEventHandler>(&mut self, config: &OtaConfig<'_>, handler: &mut H);
}

/// Fehler beim Schreiben des neuen Images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirmwareSinkError {
    NoPartition,
    ImageTooLarge,
    Flash,
}

/// Ziel für ein empfangenes Firmware-Image (z.B. die nächste OTA-Partition)
pub trait FirmwareSink {
    fn begin(&mut self, size: u32) -> Result<(), FirmwareSinkError>;
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FirmwareSinkError>;
    /// Aktiviert das geschriebene Image für den nächsten Boot
    fn finalize(&mut self) -> Result<(), FirmwareSinkError>;
}
