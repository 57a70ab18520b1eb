// Zeitbasis und Neustart auf Basis von embassy-time und esp-hal

use counter_core::{Clock, Restart};
use embassy_time::{Instant, Timer};

/// Monotone Uhr seit Boot
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    async fn delay_ms(&mut self, ms: u64) {
        Timer::after_millis(ms).await;
    }
}

/// Software-Reset des Chips, kehrt nicht zurück
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareRestart;

impl Restart for SoftwareRestart {
    fn restart(&mut self) {
        defmt::warn!("System: Restarting");
        esp_hal::system::software_reset()
    }
}
