//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use core::fmt::Write;

use heapless::String;

/// Formatiert den Zählerwert als Dezimal-String ohne führende Nullen
///
/// # Beispiele
///
/// ```
/// # use counter_core::format_counter;
/// assert_eq!(format_counter(0).as_str(), "0");
/// assert_eq!(format_counter(255).as_str(), "255");
/// ```
pub fn format_counter(value: u8) -> String<3> {
    let mut text = String::new();
    // u8 hat höchstens 3 Stellen, das Schreiben kann nicht überlaufen
    let _ = write!(text, "{}", value);
    text
}

/// Fortschritt einer OTA-Übertragung in Prozent (0..=100)
///
/// Bei `total == 0` gibt es nichts zu übertragen, das gilt als fertig.
pub fn progress_percent(progress: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    let percent = u64::from(progress.min(total)) * 100 / u64::from(total);
    percent as u32
}

/// Zeitsteuerung für periodische Publishes
///
/// Merkt sich den Zeitpunkt des letzten Publishes (Start: 0 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishSchedule {
    interval_ms: u64,
    last_ms: u64,
}

impl PublishSchedule {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: 0,
        }
    }

    /// Prüft ob das Intervall abgelaufen ist und merkt sich dann `now_ms`
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub const fn last_ms(&self) -> u64 {
        self.last_ms
    }
}
