// Button an GPIO9 mit Interrupt-Handler
//
// Der Handler läuft im Interrupt-Kontext und toggelt nur `LED_STATE`.
// Der Event-Loop liest den Zustand und schreibt den Ausgang.

use core::cell::RefCell;

use counter_core::LedState;
use critical_section::Mutex;
use esp_hal::gpio::{Event, Input, InputConfig, Io, Pull};
use esp_hal::handler;
use esp_hal::peripherals::{GPIO9, IO_MUX};

/// LED-Zustand, geteilt zwischen Interrupt-Handler und Event-Loop
pub static LED_STATE: LedState = LedState::new();

/// Button-Pin, damit der Handler das Interrupt-Flag löschen kann
static BUTTON: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));

/// Richtet GPIO9 als Eingang mit Pull-up ein und aktiviert den Interrupt
/// auf steigende Flanke
///
/// # Returns
/// Referenz auf den LED-Zustand für den Event-Loop
pub fn init_button(io_mux: IO_MUX<'static>, gpio9: GPIO9<'static>) -> &'static LedState {
    let mut io = Io::new(io_mux);
    io.set_interrupt_handler(button_interrupt);

    let mut button = Input::new(gpio9, InputConfig::default().with_pull(Pull::Up));

    critical_section::with(|cs| {
        button.listen(Event::RisingEdge);
        BUTTON.borrow_ref_mut(cs).replace(button);
    });

    &LED_STATE
}

#[handler]
fn button_interrupt() {
    critical_section::with(|cs| {
        let mut button = BUTTON.borrow_ref_mut(cs);
        if let Some(button) = button.as_mut() {
            if button.is_interrupt_set() {
                LED_STATE.toggle();
                button.clear_interrupt();
            }
        }
    });
}
