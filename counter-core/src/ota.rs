//! OTA Listener und Session-Protokoll
//!
//! Der Transport (TCP-Socket) und das Schreiben ins Flash sind über
//! `embedded_io_async` bzw. `FirmwareSink` abstrahiert. Das Protokoll:
//!
//! ```text
//! Uploader → Gerät:  OTA <size> <secret>\n
//! Gerät → Uploader:  OK\n            (oder ERR <code>\n)
//! Uploader → Gerät:  <size> Bytes Image
//! Gerät → Uploader:  OK\n            (Image aktiviert, Neustart folgt)
//! ```

use core::fmt::Write as _;

use embedded_io_async::{Read, Write};
use heapless::String;

use crate::config::OtaConfig;
use crate::logic::progress_percent;
use crate::traits::{FirmwareSink, OtaEventHandler, OtaService};
use crate::types::OtaError;

/// Maximale Länge der Header-Zeile inkl. `\n`
pub const OTA_HEADER_MAX_LEN: usize = 96;

/// Bestätigung an den Uploader
pub const OTA_REPLY_OK: &[u8] = b"OK\n";

/// Geparster Session-Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtaRequest<'a> {
    pub size: u32,
    pub secret: &'a str,
}

impl<'a> OtaRequest<'a> {
    /// Parst `OTA <size> <secret>` (ohne oder mit abschließendem `\r\n`)
    ///
    /// Ungültiger Header oder Größe 0 → `OtaError::Begin`
    pub fn parse(line: &'a [u8]) -> Result<Self, OtaError> {
        let line = core::str::from_utf8(line).map_err(|_| OtaError::Begin)?;
        let line = line.trim_end_matches(['\r', '\n']);
        let rest = line.strip_prefix("OTA ").ok_or(OtaError::Begin)?;
        let (size, secret) = rest.split_once(' ').unwrap_or((rest, ""));
        let size: u32 = size.parse().map_err(|_| OtaError::Begin)?;
        if size == 0 {
            return Err(OtaError::Begin);
        }
        Ok(Self { size, secret })
    }

    /// Vergleicht das mitgesendete Secret mit dem konfigurierten Passwort
    pub fn authorize(&self, password: &str) -> Result<u32, OtaError> {
        if self.secret == password {
            Ok(self.size)
        } else {
            Err(OtaError::Auth)
        }
    }
}

/// Führt eine komplette OTA-Session über einen verbundenen Transport aus
///
/// Ruft die Callbacks des `handler` in der Reihenfolge start → progress* → end
/// auf, oder genau einmal `on_error` mit der Fehlerklasse. Im Fehlerfall
/// bekommt der Uploader best-effort `ERR <code>\n`.
///
/// # Parameter
/// - `transport`: verbundener Socket zum Uploader
/// - `sink`: Ziel für das Image (nächste OTA-Partition)
/// - `password`: erwartetes Shared Secret
/// - `chunk`: Empfangspuffer, bestimmt die Chunk-Größe
///
/// # Returns
/// Größe des übertragenen Images
pub async fn run_session<T, S, H>(
    transport: &mut T,
    sink: &mut S,
    password: &str,
    handler: &mut H,
    chunk: &mut [u8],
) -> Result<u32, OtaError>
where
    T: Read + Write,
    S: FirmwareSink,
    H: OtaEventHandler,
{
    match receive_image(transport, sink, password, handler, chunk).await {
        Ok(size) => {
            handler.on_end();
            Ok(size)
        }
        Err(err) => {
            handler.on_error(err);
            let mut reply: String<8> = String::new();
            let _ = write!(reply, "ERR {}\n", err.code());
            let _ = transport.write_all(reply.as_bytes()).await;
            let _ = transport.flush().await;
            Err(err)
        }
    }
}

async fn receive_image<T, S, H>(
    transport: &mut T,
    sink: &mut S,
    password: &str,
    handler: &mut H,
    chunk: &mut [u8],
) -> Result<u32, OtaError>
where
    T: Read + Write,
    S: FirmwareSink,
    H: OtaEventHandler,
{
    let mut header = [0u8; OTA_HEADER_MAX_LEN];
    let len = read_header(transport, &mut header).await?;
    let request = OtaRequest::parse(&header[..len])?;
    let size = request.authorize(password)?;

    sink.begin(size).map_err(|err| {
        warn!("OTA: Image rejected: {}", err);
        OtaError::Begin
    })?;

    transport
        .write_all(OTA_REPLY_OK)
        .await
        .map_err(|_| OtaError::Connect)?;
    transport.flush().await.map_err(|_| OtaError::Connect)?;
    handler.on_start();

    let mut received: u32 = 0;
    while received < size {
        let want = chunk.len().min((size - received) as usize);
        let n = transport
            .read(&mut chunk[..want])
            .await
            .map_err(|_| OtaError::Receive)?;
        if n == 0 {
            return Err(OtaError::Receive);
        }
        sink.write(received, &chunk[..n]).map_err(|err| {
            warn!("OTA: Flash write at {} failed: {}", received, err);
            OtaError::Receive
        })?;
        received += n as u32;
        handler.on_progress(received, size);
    }

    sink.finalize().map_err(|err| {
        warn!("OTA: Activating image failed: {}", err);
        OtaError::End
    })?;

    // Image ist aktiviert - eine verlorene Bestätigung ändert daran nichts
    let _ = transport.write_all(OTA_REPLY_OK).await;
    let _ = transport.flush().await;
    Ok(size)
}

/// Liest die Header-Zeile byteweise, damit keine Image-Bytes verloren gehen
async fn read_header<T: Read>(
    transport: &mut T,
    buf: &mut [u8; OTA_HEADER_MAX_LEN],
) -> Result<usize, OtaError> {
    let mut len = 0;
    loop {
        if len == buf.len() {
            return Err(OtaError::Begin);
        }
        let n = transport
            .read(&mut buf[len..len + 1])
            .await
            .map_err(|_| OtaError::Connect)?;
        if n == 0 {
            return Err(OtaError::Connect);
        }
        if buf[len] == b'\n' {
            return Ok(len);
        }
        len += 1;
    }
}

/// OTA Listener: Konfiguration + Dienst + Callbacks
pub struct OtaListener<'a, S, H> {
    service: S,
    config: OtaConfig<'a>,
    handler: H,
}

impl<'a, S, H> OtaListener<'a, S, H>
where
    S: OtaService,
    H: OtaEventHandler,
{
    /// Startet den Listener (einmalig nach dem WLAN-Bootstrap)
    pub fn begin(mut service: S, config: OtaConfig<'a>, handler: H) -> Self {
        service.begin(&config);
        info!(
            "OTA: Listening on port {} as '{}'",
            config.port, config.hostname
        );
        Self {
            service,
            config,
            handler,
        }
    }

    /// Einmal pro Loop-Durchlauf aufrufen
    pub async fn handle(&mut self) {
        self.service.handle(&self.config, &mut self.handler).await;
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Callbacks, die nur loggen
///
/// Fortschritt wird nur bei Änderung des Prozentwerts geloggt.
#[derive(Debug, Default)]
pub struct LoggingOtaHandler {
    last_percent: Option<u32>,
}

impl LoggingOtaHandler {
    pub const fn new() -> Self {
        Self { last_percent: None }
    }

    /// Zuletzt geloggter Fortschritt (`None` vor dem ersten Chunk)
    pub fn last_percent(&self) -> Option<u32> {
        self.last_percent
    }
}

impl OtaEventHandler for LoggingOtaHandler {
    fn on_start(&mut self) {
        self.last_percent = None;
        info!("OTA: Start");
    }

    fn on_end(&mut self) {
        info!("OTA: End");
    }

    fn on_progress(&mut self, progress: u32, total: u32) {
        let percent = progress_percent(progress, total);
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            info!("OTA: Progress: {}%", percent);
        }
    }

    fn on_error(&mut self, error: OtaError) {
        error!("OTA: Error[{}]: {}", error.code(), error.as_str());
    }
}
