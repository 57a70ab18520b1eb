//! Retry mit fester Wartezeit
//!
//! Beide blockierenden Schleifen der Firmware (WLAN-Bootstrap und
//! Broker-Reconnect) laufen hierüber. Produktion nutzt `Attempts::Unbounded`,
//! Tests begrenzen die Versuche.

use crate::traits::Clock;

/// Maximale Anzahl Versuche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attempts {
    Unbounded,
    /// Mindestens ein Versuch findet immer statt
    AtMost(u32),
}

impl Attempts {
    /// Darf Versuch Nummer `attempt` (1-basiert) noch stattfinden?
    pub const fn allows(self, attempt: u32) -> bool {
        match self {
            Attempts::Unbounded => true,
            Attempts::AtMost(max) => attempt <= max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    pub delay_ms: u64,
    pub attempts: Attempts,
}

impl RetryPolicy {
    pub const fn unbounded(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            attempts: Attempts::Unbounded,
        }
    }

    pub const fn bounded(delay_ms: u64, max_attempts: u32) -> Self {
        Self {
            delay_ms,
            attempts: Attempts::AtMost(max_attempts),
        }
    }
}

/// Ergebnis eines erfolgreichen Versuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Alle erlaubten Versuche sind fehlgeschlagen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryExhausted {
    pub attempts: u32,
}

/// Führt `op` aus, bis es gelingt oder die Policy keine Versuche mehr erlaubt
///
/// Nach jedem Fehlschlag wird `on_failure` mit Versuchsnummer und Fehler
/// aufgerufen und dann `policy.delay_ms` gewartet. Nach dem letzten
/// erlaubten Versuch wird nicht mehr gewartet.
pub async fn retry_with_delay<T, E, C>(
    policy: RetryPolicy,
    clock: &mut C,
    mut op: impl AsyncFnMut(u32) -> Result<T, E>,
    mut on_failure: impl FnMut(u32, &E),
) -> Result<Retried<T>, RetryExhausted>
where
    C: Clock,
{
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match op(attempt).await {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    attempts: attempt,
                });
            }
            Err(err) => {
                on_failure(attempt, &err);
                if !policy.attempts.allows(attempt.saturating_add(1)) {
                    return Err(RetryExhausted { attempts: attempt });
                }
                clock.delay_ms(policy.delay_ms).await;
            }
        }
    }
}
