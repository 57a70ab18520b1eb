// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, StackResources};
use static_cell::StaticCell;

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

use counter_core::{
    BrokerCredentials, EventLoop, EventLoopConfig, LoggingOtaHandler, OtaConfig, OtaListener,
    RetryPolicy, StationConfig, bootstrap_link,
};
use hass_counter::CounterLoop;
use hass_counter::config::{
    EXTRA_HEAP_SIZE, HOSTNAME, MQTT_BROKER, MQTT_PASSWORD, MQTT_PORT, MQTT_TCP_BUFFER_SIZE,
    MQTT_USER, NET_SOCKET_COUNT, OTA_PASSWORD, OTA_PORT, OTA_TCP_BUFFER_SIZE, WIFI_HEAP_SIZE,
    WIFI_PASSWORD, WIFI_RESTART_DELAY_MS, WIFI_SSID,
};
use hass_counter::hal::{EmbassyClock, GpioLedWriter, SoftwareRestart, init_button};
use hass_counter::tasks::{
    EspBrokerClient, EspOtaService, EspStation, FlashFirmwareSink, link_supervisor_task,
    mdns_responder_task, net_task,
};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Ablauf:
/// 1. Hardware: LED aus, Button-Interrupt aktiv
/// 2. WLAN-Bootstrap (Neustart bis verbunden)
/// 3. OTA-Listener starten
/// 4. Mit dem Broker verbinden, dann Event-Loop für immer
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (36 KB) = 100 KB total
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    info!("Booting '{}'", HOSTNAME);

    // LED Low nach Boot, Button toggelt den LED-Zustand im Interrupt
    let led = GpioLedWriter::new(peripherals.GPIO2);
    let led_state = init_button(peripherals.IO_MUX, peripherals.GPIO9);

    // WiFi Hardware initialisieren
    static RADIO_INIT: StaticCell<esp_radio::Controller> = StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    static RESOURCES: StaticCell<StackResources<NET_SOCKET_COUNT>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    // WLAN-Bootstrap: jeder Fehlschlag führt nach 5 s zum Neustart
    let mut station = EspStation::new(wifi_controller, stack);
    let mut clock = EmbassyClock;
    let station_config = StationConfig {
        ssid: WIFI_SSID,
        password: WIFI_PASSWORD,
    };
    if let Err(exhausted) = bootstrap_link(
        &mut station,
        &mut SoftwareRestart,
        &station_config,
        RetryPolicy::unbounded(WIFI_RESTART_DELAY_MS),
        &mut clock,
    )
    .await
    {
        error!("WiFi: Gave up after {} attempts", exhausted.attempts);
        esp_hal::system::software_reset();
    }

    spawner
        .spawn(link_supervisor_task(station.into_controller()))
        .unwrap();
    spawner.spawn(mdns_responder_task(stack, HOSTNAME)).unwrap();

    // Ein Image nach OTA-Update bestätigen, sonst Rollback beim nächsten Reset
    let mut sink = FlashFirmwareSink::new(peripherals.FLASH);
    sink.confirm_running_image();

    static OTA_RX: StaticCell<[u8; OTA_TCP_BUFFER_SIZE]> = StaticCell::new();
    static OTA_TX: StaticCell<[u8; OTA_TCP_BUFFER_SIZE]> = StaticCell::new();
    let ota_service = EspOtaService::new(
        stack,
        OTA_RX.init([0; OTA_TCP_BUFFER_SIZE]),
        OTA_TX.init([0; OTA_TCP_BUFFER_SIZE]),
        sink,
    );
    let ota = OtaListener::begin(
        ota_service,
        OtaConfig {
            port: OTA_PORT,
            hostname: HOSTNAME,
            password: OTA_PASSWORD,
        },
        LoggingOtaHandler::new(),
    );

    static MQTT_RX: StaticCell<[u8; MQTT_TCP_BUFFER_SIZE]> = StaticCell::new();
    static MQTT_TX: StaticCell<[u8; MQTT_TCP_BUFFER_SIZE]> = StaticCell::new();
    let broker = EspBrokerClient::new(
        stack,
        MQTT_RX.init([0; MQTT_TCP_BUFFER_SIZE]),
        MQTT_TX.init([0; MQTT_TCP_BUFFER_SIZE]),
        MQTT_BROKER,
        MQTT_PORT,
    );

    let loop_config = EventLoopConfig::new(BrokerCredentials {
        client_id: HOSTNAME,
        username: MQTT_USER,
        password: MQTT_PASSWORD,
    });

    // Socket- und MQTT-Buffer liegen im Event-Loop, daher statisch statt auf dem Stack
    static EVENT_LOOP: StaticCell<CounterLoop> = StaticCell::new();
    let event_loop = EVENT_LOOP.init(EventLoop::new(
        loop_config,
        broker,
        ota,
        led,
        led_state,
        clock,
    ));

    if let Ok(attempts) = event_loop.connect().await {
        info!("MQTT: Connected after {} attempt(s)", attempts);
    }

    event_loop.run().await
}
