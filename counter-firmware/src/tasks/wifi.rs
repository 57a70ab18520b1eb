// WiFi - Station-Verbindung, Netzwerk-Task und Link-Supervisor
use core::net::Ipv4Addr;

use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer, with_timeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};

use counter_core::{LinkError, StationConfig, WifiStation};

use crate::config::{DHCP_TIMEOUT_SECS, WIFI_CONNECT_TIMEOUT_SECS, WIFI_RECONNECT_DELAY_SECS};

/// WLAN-Station für den Bootstrap beim Start
///
/// Nach dem Bootstrap wird der Controller an `link_supervisor_task`
/// übergeben (`into_controller`).
pub struct EspStation {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl EspStation {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self { controller, stack }
    }

    pub fn into_controller(self) -> WifiController<'static> {
        self.controller
    }
}

impl WifiStation for EspStation {
    async fn connect(&mut self, config: &StationConfig<'_>) -> Result<Ipv4Addr, LinkError> {
        if !matches!(self.controller.is_started(), Ok(true)) {
            info!("WiFi: Configuring and starting...");
            let client_config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(config.ssid.into())
                    .with_password(config.password.into()),
            );
            self.controller.set_config(&client_config).map_err(|e| {
                error!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
                LinkError::ConfigRejected
            })?;
            self.controller.start_async().await.map_err(|e| {
                error!("WiFi: Failed to start: {}", Debug2Format(&e));
                LinkError::StartFailed
            })?;
        }

        info!("WiFi: Connecting to '{}'...", config.ssid);
        match with_timeout(
            Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
            self.controller.connect_async(),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("WiFi: Connection failed: {}", Debug2Format(&e));
                return Err(LinkError::AssociationFailed);
            }
            Err(_) => {
                error!("WiFi: Connection timed out");
                return Err(LinkError::AssociationFailed);
            }
        }

        wait_for_address(self.stack, Duration::from_secs(DHCP_TIMEOUT_SECS)).await
    }
}

/// Wartet auf die IPv4-Adresse vom DHCP
async fn wait_for_address(stack: Stack<'static>, timeout: Duration) -> Result<Ipv4Addr, LinkError> {
    let address = with_timeout(timeout, async {
        loop {
            if let Some(config) = stack.config_v4() {
                break config.address.address();
            }
            Timer::after(Duration::from_millis(100)).await;
        }
    })
    .await
    .map_err(|_| {
        error!("WiFi: No address from DHCP");
        LinkError::AddressTimeout
    })?;

    if let Some(config) = stack.config_v4() {
        info!("  Gateway: {}", Debug2Format(&config.gateway));
        info!("  DNS:     {}", Debug2Format(&config.dns_servers));
    }
    Ok(address)
}

/// Link Supervisor Task
///
/// Läuft nach dem Bootstrap. Bei Verbindungsverlust wird alle
/// `WIFI_RECONNECT_DELAY_SECS` ein neuer Verbindungsversuch gestartet,
/// DHCP läuft im Netzwerk-Stack automatisch neu.
#[embassy_executor::task]
pub async fn link_supervisor_task(mut controller: WifiController<'static>) {
    loop {
        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("WiFi: Disconnected from AP, will retry...");

        loop {
            Timer::after(Duration::from_secs(WIFI_RECONNECT_DELAY_SECS)).await;
            match with_timeout(
                Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
                controller.connect_async(),
            )
            .await
            {
                Ok(Ok(())) => {
                    info!("WiFi: Reconnected");
                    break;
                }
                Ok(Err(e)) => warn!("WiFi: Reconnect failed: {}", Debug2Format(&e)),
                Err(_) => warn!("WiFi: Reconnect timed out"),
            }
        }
    }
}

/// Network Task
///
/// Prozessiert Netzwerk-Pakete für den embassy-net Stack
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
