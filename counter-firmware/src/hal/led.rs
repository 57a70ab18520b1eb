// LED Writer für eine einfache LED an einem GPIO-Ausgang

use counter_core::{LedError, LedWriter};
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::GPIO2;

/// LED an GPIO2, aktiv High
pub struct GpioLedWriter {
    pin: Output<'static>,
}

impl GpioLedWriter {
    /// Konfiguriert den Pin als Ausgang und treibt ihn sofort Low
    pub fn new(gpio2: GPIO2<'static>) -> Self {
        let pin = Output::new(gpio2, Level::Low, OutputConfig::default());
        Self { pin }
    }
}

impl LedWriter for GpioLedWriter {
    fn write(&mut self, on: bool) -> Result<(), LedError> {
        // GPIO-Schreiben kann nicht fehlschlagen
        self.pin.set_level(Level::from(on));
        Ok(())
    }
}
