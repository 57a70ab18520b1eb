//! Event Loop - Single-threaded Polling
//!
//! Jeder Durchlauf arbeitet strikt in dieser Reihenfolge:
//! 1. OTA bedienen
//! 2. Broker-Verbindung prüfen, ggf. blockierend neu verbinden
//! 3. Broker-I/O bedienen (eingehende Nachrichten, Keep-Alive)
//! 4. Alle `publish_interval_ms` den Zähler erhöhen und publishen (retain)
//! 5. LED-Ausgang aus dem LED-Zustand setzen
//!
//! Der LED-Zustand wird parallel vom Button-Interrupt verändert und hier
//! nur gelesen.

use crate::broker::{LoggingMessageHandler, reconnect};
use crate::config::{
    BrokerCredentials, MQTT_RECONNECT_DELAY_MS, PUBLISH_INTERVAL_MS, PUBLISH_TOPIC,
};
use crate::logic::{PublishSchedule, format_counter};
use crate::ota::OtaListener;
use crate::retry::{RetryExhausted, RetryPolicy};
use crate::traits::{BrokerClient, Clock, LedWriter, OtaEventHandler, OtaService};
use crate::types::{LedState, PublishCounter};

/// Parameter des Event-Loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLoopConfig<'a> {
    pub topic: &'a str,
    pub credentials: BrokerCredentials<'a>,
    pub publish_interval_ms: u64,
    pub reconnect: RetryPolicy,
}

impl<'a> EventLoopConfig<'a> {
    /// Produktions-Werte: `hass/test`, 2000 ms, unbegrenzter Reconnect alle 5 s
    pub const fn new(credentials: BrokerCredentials<'a>) -> Self {
        Self {
            topic: PUBLISH_TOPIC,
            credentials,
            publish_interval_ms: PUBLISH_INTERVAL_MS,
            reconnect: RetryPolicy::unbounded(MQTT_RECONNECT_DELAY_MS),
        }
    }
}

/// Was ein einzelner Durchlauf getan hat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Reconnect-Versuche in diesem Durchlauf (0 = war verbunden)
    pub reconnect_attempts: u32,
    /// Publizierter Zählerwert, falls das Intervall abgelaufen war
    pub published: Option<u8>,
    /// Ob der Publish vom Client angenommen wurde
    pub publish_ok: bool,
    /// Auf die LED geschriebener Pegel
    pub led_on: bool,
}

pub struct EventLoop<'a, B, S, H, L, C> {
    config: EventLoopConfig<'a>,
    broker: B,
    ota: OtaListener<'a, S, H>,
    messages: LoggingMessageHandler,
    led: L,
    led_state: &'a LedState,
    clock: C,
    counter: PublishCounter,
    schedule: PublishSchedule,
}

impl<'a, B, S, H, L, C> EventLoop<'a, B, S, H, L, C>
where
    B: BrokerClient,
    S: OtaService,
    H: OtaEventHandler,
    L: LedWriter,
    C: Clock,
{
    pub fn new(
        config: EventLoopConfig<'a>,
        broker: B,
        ota: OtaListener<'a, S, H>,
        led: L,
        led_state: &'a LedState,
        clock: C,
    ) -> Self {
        Self {
            schedule: PublishSchedule::new(config.publish_interval_ms),
            config,
            broker,
            ota,
            messages: LoggingMessageHandler,
            led,
            led_state,
            clock,
            counter: PublishCounter::new(),
        }
    }

    /// Erster Verbindungsaufbau zum Broker vor dem Loop
    pub async fn connect(&mut self) -> Result<u32, RetryExhausted> {
        reconnect(
            &mut self.broker,
            &self.config.credentials,
            self.config.reconnect,
            &mut self.clock,
        )
        .await
    }

    /// Ein Durchlauf des Loops
    ///
    /// Nur mit begrenzter Reconnect-Policy kann `Err` zurückkommen; dann
    /// entfallen Schritte 3 bis 5 für diesen Durchlauf.
    pub async fn tick(&mut self) -> Result<TickReport, RetryExhausted> {
        let mut report = TickReport::default();

        self.ota.handle().await;

        if !self.broker.connected() {
            report.reconnect_attempts = reconnect(
                &mut self.broker,
                &self.config.credentials,
                self.config.reconnect,
                &mut self.clock,
            )
            .await?;
        }

        self.broker.poll(&mut self.messages).await;

        if self.schedule.due(self.clock.now_ms()) {
            let value = self.counter.advance();
            let payload = format_counter(value);
            match self
                .broker
                .publish(self.config.topic, payload.as_bytes(), true)
                .await
            {
                Ok(()) => {
                    info!("MQTT: Published message: {}", payload.as_str());
                    report.publish_ok = true;
                }
                Err(state) => error!("MQTT: Failed publish (state {})", state.code()),
            }
            report.published = Some(value);
        }

        let on = self.led_state.is_on();
        if let Err(_e) = self.led.write(on) {
            error!("Failed to write to LED");
        }
        report.led_on = on;

        Ok(report)
    }

    /// Läuft bis Reset oder Stromausfall
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(exhausted) = self.tick().await {
                error!(
                    "MQTT: Giving up reconnect after {} attempts",
                    exhausted.attempts
                );
            }
        }
    }

    pub fn counter(&self) -> PublishCounter {
        self.counter
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    pub fn ota(&self) -> &OtaListener<'a, S, H> {
        &self.ota
    }

    pub fn led(&self) -> &L {
        &self.led
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
