//! Broker Connection Manager
//!
//! Blockierender Reconnect mit fester Wartezeit und Logging eingehender
//! Nachrichten.

use crate::config::BrokerCredentials;
use crate::retry::{RetryExhausted, RetryPolicy, retry_with_delay};
use crate::traits::{BrokerClient, Clock, MessageHandler};

/// Verbindet den Client neu, bis der Broker die Verbindung annimmt
///
/// Während des Wartens steht der komplette Event-Loop (auch OTA).
/// Mit `RetryPolicy::unbounded` kehrt die Funktion erst bei Erfolg zurück.
///
/// # Returns
/// Anzahl der Verbindungsversuche (0 wenn bereits verbunden)
pub async fn reconnect<B, C>(
    client: &mut B,
    credentials: &BrokerCredentials<'_>,
    policy: RetryPolicy,
    clock: &mut C,
) -> Result<u32, RetryExhausted>
where
    B: BrokerClient,
    C: Clock,
{
    if client.connected() {
        return Ok(0);
    }

    let retried = retry_with_delay(
        policy,
        clock,
        async |_| {
            info!("MQTT: Attempting connection to MQTT broker");
            client.connect(credentials).await
        },
        |_, state| {
            warn!(
                "MQTT: Failed, return code='{}', trying again in {} s.",
                state.code(),
                policy.delay_ms / 1000
            )
        },
    )
    .await?;

    info!("MQTT: Connected");
    Ok(retried.attempts)
}

/// Loggt eingehende Nachrichten unverändert (Topic + Payload-Bytes)
///
/// Es wird kein Topic abonniert, daher wird dieser Handler aktuell nie
/// aufgerufen. Er bleibt registriert, damit ein späteres Subscribe sofort
/// sichtbar wird.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMessageHandler;

impl MessageHandler for LoggingMessageHandler {
    fn on_message(&mut self, topic: &str, payload: &[u8]) {
        info!("MQTT: Message arrived [{}] {=[u8]:a}", topic, payload);
    }
}
