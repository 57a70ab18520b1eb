// Projekt-Konfiguration: Konstanten, Hardware-Zuordnungen und Credentials

use counter_core::config::{DEFAULT_MQTT_PORT, DEFAULT_OTA_PORT, parse_port};

// Verhaltens-Konstanten (Intervall, Delays, Topic) liegen in counter-core
pub use counter_core::config::{OTA_CHUNK_SIZE, WIFI_RESTART_DELAY_MS};

// ============================================================================
// Geräte-Identität
// ============================================================================

/// Hostname: mDNS-Name, OTA-Kennung und MQTT Client ID
/// Wird aus DEVICE_HOSTNAME geladen, `HOSTNAME` ist meist schon vom Build-Rechner belegt
pub const HOSTNAME: &str = match option_env!("DEVICE_HOSTNAME") {
    Some(hostname) => hostname,
    None => "hass-counter",
};

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Timeout für einen Verbindungsversuch zum Access Point
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Timeout bis DHCP eine Adresse liefert
pub const DHCP_TIMEOUT_SECS: u64 = 10;

/// Wartezeit vor dem Re-Connect nach Verbindungsverlust (Supervisor)
pub const WIFI_RECONNECT_DELAY_SECS: u64 = 5;

/// Heap-Größe für WiFi (Bytes)
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

/// Sockets im embassy-net Stack: MQTT (1) + OTA (1) + mDNS (1) + DNS/DHCP
pub const NET_SOCKET_COUNT: usize = 6;

// ============================================================================
// MQTT Konfiguration
// ============================================================================

/// MQTT Broker: IPv4-Adresse oder Hostname
pub const MQTT_BROKER: &str = env!(
    "MQTT_BROKER",
    "MQTT Broker nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// MQTT Broker Port (Standard: 1883)
pub const MQTT_PORT: u16 = parse_port(option_env!("MQTT_PORT"), DEFAULT_MQTT_PORT);

/// MQTT Benutzername (leer = ohne Authentifizierung)
pub const MQTT_USER: &str = match option_env!("MQTT_USER") {
    Some(user) => user,
    None => "",
};

/// MQTT Passwort
pub const MQTT_PASSWORD: &str = match option_env!("MQTT_PASSWORD") {
    Some(password) => password,
    None => "",
};

/// MQTT Keep-Alive in Sekunden, PINGREQ nach der Hälfte
pub const MQTT_KEEP_ALIVE_SECS: u16 = 15;

/// MQTT Buffer-Größe in Bytes (Senden und Empfangen je)
pub const MQTT_BUFFER_SIZE: usize = 1024;

/// TCP Buffer-Größe für den MQTT-Socket (RX und TX je)
pub const MQTT_TCP_BUFFER_SIZE: usize = 2048;

/// TCP Timeout für den MQTT-Socket
pub const MQTT_SOCKET_TIMEOUT_SECS: u64 = 10;

/// Maximale Wartezeit auf eine bereits angekündigte eingehende Nachricht
pub const MQTT_RECEIVE_TIMEOUT_MS: u64 = 500;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// OTA Konfiguration
// ============================================================================

/// OTA Port (Standard: 3232)
pub const OTA_PORT: u16 = parse_port(option_env!("OTA_PORT"), DEFAULT_OTA_PORT);

/// Shared Secret für OTA-Sessions
pub const OTA_PASSWORD: &str = env!(
    "OTA_PASSWORD",
    "OTA Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wie lange `handle()` pro Durchlauf auf einen Uploader wartet
pub const OTA_ACCEPT_WINDOW_MS: u64 = 5;

/// TCP Timeout während einer laufenden Session
pub const OTA_SOCKET_TIMEOUT_SECS: u64 = 10;

/// TCP Buffer-Größe für den OTA-Socket (RX und TX je)
pub const OTA_TCP_BUFFER_SIZE: usize = 4096;

/// Wartezeit zwischen erfolgreichem Update und Neustart
pub const OTA_RESTART_DELAY_MS: u64 = 1000;

// ============================================================================
// mDNS-Konfiguration
// ============================================================================

/// mDNS TTL (Time To Live) in Sekunden
pub const MDNS_TTL_SECS: u32 = 120;

/// mDNS Reconnect Delay in Sekunden
pub const MDNS_RECONNECT_DELAY_SECS: u64 = 5;

/// mDNS Port (Standard: 5353, RFC 6762)
pub const MDNS_PORT: u16 = 5353;

/// mDNS IPv4 Multicast-Adresse (224.0.0.251)
pub const MDNS_MULTICAST_ADDR: [u8; 4] = [224, 0, 0, 251];

/// UDP Buffer-Größen für mDNS (TX, RX in Bytes)
pub const MDNS_UDP_BUFFER_SIZE: usize = 512;

/// mDNS Receive/Send Buffer-Größen in Bytes (Standard MTU)
pub const MDNS_PACKET_BUFFER_SIZE: usize = 1500;
