//! Verhaltens-Konstanten und Konfigurations-Typen
//!
//! Hardware-spezifische Werte (Pins, Buffer-Größen, Credentials aus `.env`)
//! liegen in `counter-firmware/src/config.rs`. Hier steht nur, was die
//! Logik selbst braucht und in Host-Tests geprüft wird.

/// Topic, auf das der Zähler published wird
pub const PUBLISH_TOPIC: &str = "hass/test";

/// Mindestabstand zwischen zwei Publishes in Millisekunden
pub const PUBLISH_INTERVAL_MS: u64 = 2000;

/// Wartezeit zwischen zwei Broker-Verbindungsversuchen
pub const MQTT_RECONNECT_DELAY_MS: u64 = 5000;

/// Wartezeit nach fehlgeschlagenem WLAN-Connect, bevor neu gestartet wird
pub const WIFI_RESTART_DELAY_MS: u64 = 5000;

/// Standard-Port des MQTT Brokers (unverschlüsselt)
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Standard-Port für OTA-Sessions
pub const DEFAULT_OTA_PORT: u16 = 3232;

/// Chunk-Größe beim Empfang eines Firmware-Images
pub const OTA_CHUNK_SIZE: usize = 1024;

/// Zugangsdaten für den WLAN Access Point (Station-Modus)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

/// Anmeldedaten für den MQTT Broker
///
/// Die Client-ID ist der Hostname des Geräts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerCredentials<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Parameter des OTA Listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtaConfig<'a> {
    pub port: u16,
    pub hostname: &'a str,
    pub password: &'a str,
}

/// Parst einen Port aus einer optionalen Build-Zeit-Variable
///
/// `None` liefert `default`. Ein ungültiger Wert bricht im const-Kontext
/// den Build ab, statt still einen falschen Port zu verwenden.
///
/// ```
/// # use counter_core::config::parse_port;
/// const PORT: u16 = parse_port(Some("8883"), 1883);
/// assert_eq!(PORT, 8883);
/// assert_eq!(parse_port(None, 1883), 1883);
/// ```
pub const fn parse_port(value: Option<&str>, default: u16) -> u16 {
    let bytes = match value {
        Some(value) => value.as_bytes(),
        None => return default,
    };
    if bytes.is_empty() {
        panic!("port must not be empty");
    }

    let mut port: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        if digit < b'0' || digit > b'9' {
            panic!("port must be decimal");
        }
        port = port * 10 + (digit - b'0') as u32;
        if port > u16::MAX as u32 {
            panic!("port out of range");
        }
        i += 1;
    }
    port as u16
}
