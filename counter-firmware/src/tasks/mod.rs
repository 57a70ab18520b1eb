// Task-Modul: Netzwerk-Dienste
//
// Wifi, MQTT und OTA implementieren die counter-core Traits und werden vom
// Event-Loop in `main` gepollt. Netzwerk-Stack, Link-Supervisor und mDNS
// laufen als eigene Embassy Tasks.

pub mod mdns;
pub mod mqtt;
pub mod ota;
pub mod wifi;

pub use mdns::mdns_responder_task;
pub use mqtt::EspBrokerClient;
pub use ota::{EspOtaService, FlashFirmwareSink};
pub use wifi::{EspStation, link_supervisor_task, net_task};
