// Hardware Abstraction Layer (HAL) Module
//
// Implementierungen der counter-core Traits für den ESP32-C6.

pub mod button;
pub mod clock;
pub mod led;

pub use button::{LED_STATE, init_button};
pub use clock::{EmbassyClock, SoftwareRestart};
pub use led::GpioLedWriter;
