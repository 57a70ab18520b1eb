//! Network Bootstrap - WLAN-Verbindung beim Boot
//!
//! Blockiert bis die Station verbunden ist und eine IP-Adresse hat.
//! Schlägt ein Versuch fehl, wird nach `WIFI_RESTART_DELAY_MS` das komplette
//! Gerät neu gestartet (kein Soft-Retry, kein Backoff).

use core::net::Ipv4Addr;

use crate::config::StationConfig;
use crate::retry::{RetryExhausted, RetryPolicy, Retried, retry_with_delay};
use crate::traits::{Clock, Restart, WifiStation};

/// Baut die WLAN-Verbindung auf
///
/// Ablauf pro Fehlschlag: loggen, `policy.delay_ms` warten, `restart()`,
/// dann der nächste Versuch. Auf Hardware kehrt `restart()` nicht zurück,
/// in Tests zählt ein Mock nur mit.
///
/// # Returns
/// - `Ok(Retried { value: ip, .. })` - verbunden, `ip` ist die DHCP-Adresse
/// - `Err(RetryExhausted)` - nur mit begrenzter Policy möglich
pub async fn bootstrap_link<W, R, C>(
    station: &mut W,
    restart: &mut R,
    config: &StationConfig<'_>,
    policy: RetryPolicy,
    clock: &mut C,
) -> Result<Retried<Ipv4Addr>, RetryExhausted>
where
    W: WifiStation,
    R: Restart,
    C: Clock,
{
    info!("WiFi: Connecting to '{}'...", config.ssid);

    let result = retry_with_delay(
        policy,
        clock,
        async |attempt| {
            if attempt > 1 {
                restart.restart();
            }
            station.connect(config).await
        },
        |attempt, err| error!("WiFi: Connection Failed! Rebooting... ({}, attempt {})", err, attempt),
    )
    .await;

    if let Ok(link) = &result {
        info!("Ready");
        info!("IP address: {}", ::defmt::Debug2Format(&link.value));
    }
    result
}
