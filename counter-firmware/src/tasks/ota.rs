// OTA - TCP-Listener und Flash-Ziel für neue Firmware-Images
//
// Das Session-Protokoll selbst liegt in counter-core (`run_session`).
// Hier passiert nur der Socket-Lebenszyklus und das Schreiben in die
// nächste OTA-Partition.

use defmt::{Debug2Format, info, warn};
use embassy_net::Stack;
use embassy_net::tcp::{State, TcpSocket};
use embassy_time::{Duration, Timer, with_timeout};
use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::ota::OtaImageState;
use esp_bootloader_esp_idf::ota_updater::OtaUpdater;
use esp_bootloader_esp_idf::partitions::PARTITION_TABLE_MAX_LEN;
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;

use counter_core::ota::run_session;
use counter_core::{
    FirmwareSink, FirmwareSinkError, OtaConfig, OtaError, OtaEventHandler, OtaService,
};

use crate::config::{
    OTA_ACCEPT_WINDOW_MS, OTA_CHUNK_SIZE, OTA_RESTART_DELAY_MS, OTA_SOCKET_TIMEOUT_SECS,
};

/// Schreibt Images in die jeweils inaktive OTA-Partition
///
/// Die Partitionstabelle wird bei jedem Zugriff neu gelesen, der
/// `OtaUpdater` lebt nur für die Dauer eines Aufrufs.
pub struct FlashFirmwareSink {
    flash: FlashStorage<'static>,
    table: [u8; PARTITION_TABLE_MAX_LEN],
}

impl FlashFirmwareSink {
    pub fn new(flash: FLASH<'static>) -> Self {
        Self {
            flash: FlashStorage::new(flash),
            table: [0; PARTITION_TABLE_MAX_LEN],
        }
    }

    fn updater(&mut self) -> Result<OtaUpdater<'_, FlashStorage<'static>>, FirmwareSinkError> {
        OtaUpdater::new(&mut self.flash, &mut self.table).map_err(|e| {
            warn!("OTA: Partition table unusable: {}", Debug2Format(&e));
            FirmwareSinkError::NoPartition
        })
    }

    /// Markiert das laufende Image als gültig
    ///
    /// Nach einem Update bootet der Bootloader das neue Image im Zustand
    /// `New`/`PendingVerify`. Ohne Bestätigung rollt er beim nächsten
    /// Reset zurück.
    pub fn confirm_running_image(&mut self) {
        let Ok(mut ota) = self.updater() else {
            return;
        };
        match ota.current_ota_state() {
            Ok(OtaImageState::New | OtaImageState::PendingVerify) => {
                match ota.set_current_ota_state(OtaImageState::Valid) {
                    Ok(()) => info!("OTA: Running image marked valid"),
                    Err(e) => warn!("OTA: Cannot confirm image: {}", Debug2Format(&e)),
                }
            }
            Ok(_) => {}
            // Kein OTA-Datenbereich (z.B. per espflash direkt geflasht)
            Err(e) => info!("OTA: No OTA state: {}", Debug2Format(&e)),
        }
    }
}

impl FirmwareSink for FlashFirmwareSink {
    fn begin(&mut self, size: u32) -> Result<(), FirmwareSinkError> {
        let mut ota = self.updater()?;
        let (region, _) = ota
            .next_partition()
            .map_err(|_| FirmwareSinkError::NoPartition)?;
        let capacity = region.capacity();
        if size as usize > capacity {
            warn!("OTA: Image of {} bytes exceeds slot of {}", size, capacity);
            return Err(FirmwareSinkError::ImageTooLarge);
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FirmwareSinkError> {
        let mut ota = self.updater()?;
        let (mut region, _) = ota
            .next_partition()
            .map_err(|_| FirmwareSinkError::NoPartition)?;
        region
            .write(offset, data)
            .map_err(|_| FirmwareSinkError::Flash)
    }

    fn finalize(&mut self) -> Result<(), FirmwareSinkError> {
        let mut ota = self.updater()?;
        ota.activate_next_partition()
            .map_err(|_| FirmwareSinkError::Flash)?;
        ota.set_current_ota_state(OtaImageState::New)
            .map_err(|_| FirmwareSinkError::Flash)
    }
}

/// OTA-Dienst auf einem einzelnen TCP-Socket
///
/// `handle()` blockiert höchstens `OTA_ACCEPT_WINDOW_MS`, solange kein
/// Uploader verbunden ist. Nach erfolgreichem Update startet das Gerät neu.
pub struct EspOtaService {
    socket: TcpSocket<'static>,
    port: u16,
    sink: FlashFirmwareSink,
    chunk: [u8; OTA_CHUNK_SIZE],
}

impl EspOtaService {
    pub fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8],
        tx_buffer: &'static mut [u8],
        sink: FlashFirmwareSink,
    ) -> Self {
        Self {
            socket: TcpSocket::new(stack, rx_buffer, tx_buffer),
            port: 0,
            sink,
            chunk: [0; OTA_CHUNK_SIZE],
        }
    }

    async fn serve<H: OtaEventHandler>(&mut self, config: &OtaConfig<'_>, handler: &mut H) {
        info!(
            "OTA: Uploader connected from {}",
            Debug2Format(&self.socket.remote_endpoint())
        );
        self.socket
            .set_timeout(Some(Duration::from_secs(OTA_SOCKET_TIMEOUT_SECS)));

        let result = run_session(
            &mut self.socket,
            &mut self.sink,
            config.password,
            handler,
            &mut self.chunk,
        )
        .await;

        match result {
            Ok(size) => {
                let _ = self.socket.flush().await;
                self.socket.close();
                info!("OTA: {} bytes written, restarting...", size);
                Timer::after_millis(OTA_RESTART_DELAY_MS).await;
                esp_hal::system::software_reset();
            }
            Err(_) => {
                let _ = with_timeout(Duration::from_millis(100), self.socket.flush()).await;
                self.socket.abort();
                self.socket.set_timeout(None);
            }
        }
    }
}

impl OtaService for EspOtaService {
    fn begin(&mut self, config: &OtaConfig<'_>) {
        self.port = config.port;
    }

    async fn handle<H: OtaEventHandler>(&mut self, config: &OtaConfig<'_>, handler: &mut H) {
        match self.socket.state() {
            State::Closed => {
                match with_timeout(
                    Duration::from_millis(OTA_ACCEPT_WINDOW_MS),
                    self.socket.accept(self.port),
                )
                .await
                {
                    // Socket bleibt im Listen-Zustand
                    Err(_) => {}
                    Ok(Err(e)) => {
                        warn!("OTA: Accept failed: {}", Debug2Format(&e));
                        handler.on_error(OtaError::Connect);
                        self.socket.abort();
                    }
                    Ok(Ok(())) => self.serve(config, handler).await,
                }
            }
            State::Listen | State::SynReceived => {}
            State::Established | State::CloseWait => self.serve(config, handler).await,
            // Reste einer abgebrochenen Verbindung
            _ => self.socket.abort(),
        }
    }
}
