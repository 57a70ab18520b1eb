//! Mock-Implementierungen der counter-core Traits für Host-Tests
//!
//! Alle Mocks, deren Reihenfolge relevant ist, schreiben in ein gemeinsames
//! `Journal`. Zeit ist virtuell: `delay_ms` stellt die Uhr sofort vor.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;

use counter_core::{
    BrokerClient, BrokerCredentials, BrokerState, Clock, FirmwareSink, FirmwareSinkError,
    LedError, LedWriter, LinkError, MessageHandler, OtaConfig, OtaError, OtaEventHandler,
    OtaService, Restart, StationConfig, WifiStation,
};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

// ============================================================================
// Journal
// ============================================================================

/// Beobachtbare Aktionen, in der Reihenfolge ihres Auftretens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OtaHandle,
    Connect { at_ms: u64 },
    Poll,
    Publish { payload: String, retain: bool },
    LedWrite(bool),
    Restart,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn publishes(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Publish { payload, .. } => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| matches(e)).count()
    }
}

// ============================================================================
// Virtuelle Uhr
// ============================================================================

/// Gemeinsame virtuelle Zeit in Millisekunden
#[derive(Debug, Clone, Default)]
pub struct VirtualTime(Rc<Cell<u64>>);

impl VirtualTime {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

#[derive(Debug, Default)]
pub struct MockClock {
    pub time: VirtualTime,
    pub delays: Vec<u64>,
}

impl MockClock {
    pub fn new(time: VirtualTime) -> Self {
        Self {
            time,
            delays: Vec::new(),
        }
    }

    pub fn total_delay_ms(&self) -> u64 {
        self.delays.iter().sum()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.time.now()
    }

    async fn delay_ms(&mut self, ms: u64) {
        self.delays.push(ms);
        self.time.advance(ms);
    }
}

// ============================================================================
// Broker
// ============================================================================

/// Broker mit vorgegebenen Ergebnissen für connect/publish
///
/// Leere Warteschlangen bedeuten Erfolg.
#[derive(Debug)]
pub struct ScriptedBroker {
    pub journal: Journal,
    pub time: VirtualTime,
    pub connected: bool,
    pub connect_results: VecDeque<Result<(), BrokerState>>,
    pub publish_results: VecDeque<Result<(), BrokerState>>,
    pub inbound: VecDeque<(String, Vec<u8>)>,
    pub last_credentials: Option<(String, String, String)>,
}

impl ScriptedBroker {
    pub fn new(journal: Journal, time: VirtualTime) -> Self {
        Self {
            journal,
            time,
            connected: false,
            connect_results: VecDeque::new(),
            publish_results: VecDeque::new(),
            inbound: VecDeque::new(),
            last_credentials: None,
        }
    }

    pub fn failing_connects(mut self, failures: usize, state: BrokerState) -> Self {
        for _ in 0..failures {
            self.connect_results.push_back(Err(state));
        }
        self
    }
}

impl BrokerClient for ScriptedBroker {
    fn connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self, credentials: &BrokerCredentials<'_>) -> Result<(), BrokerState> {
        self.journal.push(Event::Connect {
            at_ms: self.time.now(),
        });
        self.last_credentials = Some((
            credentials.client_id.to_string(),
            credentials.username.to_string(),
            credentials.password.to_string(),
        ));
        let result = self.connect_results.pop_front().unwrap_or(Ok(()));
        self.connected = result.is_ok();
        result
    }

    async fn poll<H: MessageHandler>(&mut self, handler: &mut H) {
        self.journal.push(Event::Poll);
        while let Some((topic, payload)) = self.inbound.pop_front() {
            handler.on_message(&topic, &payload);
        }
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), BrokerState> {
        assert_eq!(topic, "hass/test");
        self.journal.push(Event::Publish {
            payload: String::from_utf8(payload.to_vec()).unwrap(),
            retain,
        });
        self.publish_results.pop_front().unwrap_or(Ok(()))
    }
}

/// Sammelt eingehende Nachrichten
#[derive(Debug, Default)]
pub struct RecordingMessageHandler {
    pub messages: Vec<(String, Vec<u8>)>,
}

impl MessageHandler for RecordingMessageHandler {
    fn on_message(&mut self, topic: &str, payload: &[u8]) {
        self.messages.push((topic.to_string(), payload.to_vec()));
    }
}

// ============================================================================
// LED
// ============================================================================

#[derive(Debug)]
pub struct RecordingLed {
    pub journal: Journal,
    pub level: Option<bool>,
    pub fail_next_write: bool,
}

impl RecordingLed {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            level: None,
            fail_next_write: false,
        }
    }
}

impl LedWriter for RecordingLed {
    fn write(&mut self, on: bool) -> Result<(), LedError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(LedError::WriteFailed);
        }
        self.journal.push(Event::LedWrite(on));
        self.level = Some(on);
        Ok(())
    }
}

// ============================================================================
// WLAN
// ============================================================================

#[derive(Debug)]
pub struct ScriptedStation {
    pub journal: Journal,
    pub results: VecDeque<Result<Ipv4Addr, LinkError>>,
    pub attempts: Vec<String>,
}

impl ScriptedStation {
    pub fn new(journal: Journal, results: Vec<Result<Ipv4Addr, LinkError>>) -> Self {
        Self {
            journal,
            results: results.into(),
            attempts: Vec::new(),
        }
    }
}

impl WifiStation for ScriptedStation {
    async fn connect(&mut self, config: &StationConfig<'_>) -> Result<Ipv4Addr, LinkError> {
        self.attempts.push(config.ssid.to_string());
        self.results
            .pop_front()
            .unwrap_or(Err(LinkError::AssociationFailed))
    }
}

/// Zählt Neustarts statt neu zu starten
#[derive(Debug)]
pub struct CountingRestart {
    pub journal: Journal,
    pub count: u32,
}

impl CountingRestart {
    pub fn new(journal: Journal) -> Self {
        Self { journal, count: 0 }
    }
}

impl Restart for CountingRestart {
    fn restart(&mut self) {
        self.journal.push(Event::Restart);
        self.count += 1;
    }
}

// ============================================================================
// OTA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaEvent {
    Start,
    Progress(u32, u32),
    End,
    Error(OtaError),
}

#[derive(Debug, Default)]
pub struct RecordingOtaHandler {
    pub events: Vec<OtaEvent>,
}

impl OtaEventHandler for RecordingOtaHandler {
    fn on_start(&mut self) {
        self.events.push(OtaEvent::Start);
    }

    fn on_end(&mut self) {
        self.events.push(OtaEvent::End);
    }

    fn on_progress(&mut self, progress: u32, total: u32) {
        self.events.push(OtaEvent::Progress(progress, total));
    }

    fn on_error(&mut self, error: OtaError) {
        self.events.push(OtaEvent::Error(error));
    }
}

/// OTA-Dienst ohne Netzwerk
///
/// Eine optional vorbereitete Fehlerklasse wird beim nächsten `handle()`
/// an den Handler gemeldet.
#[derive(Debug)]
pub struct MockOtaService {
    pub journal: Journal,
    pub begun_on_port: Option<u16>,
    pub handle_calls: u32,
    pub pending_error: Option<OtaError>,
}

impl MockOtaService {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            begun_on_port: None,
            handle_calls: 0,
            pending_error: None,
        }
    }
}

impl OtaService for MockOtaService {
    fn begin(&mut self, config: &OtaConfig<'_>) {
        self.begun_on_port = Some(config.port);
    }

    async fn handle<H: OtaEventHandler>(&mut self, _config: &OtaConfig<'_>, handler: &mut H) {
        self.journal.push(Event::OtaHandle);
        self.handle_calls += 1;
        if let Some(error) = self.pending_error.take() {
            handler.on_error(error);
        }
    }
}

/// In-Memory Verbindung zum Uploader
///
/// `input` wird in Stücken von höchstens `max_read` Bytes geliefert, danach
/// EOF. Alles Geschriebene landet in `output`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub input: Vec<u8>,
    pub position: usize,
    pub max_read: usize,
    pub fail_read_at: Option<usize>,
    pub output: Vec<u8>,
}

impl MemoryTransport {
    pub fn new(input: Vec<u8>, max_read: usize) -> Self {
        Self {
            input,
            max_read,
            ..Self::default()
        }
    }

    pub fn output_str(&self) -> &str {
        std::str::from_utf8(&self.output).unwrap()
    }
}

impl ErrorType for MemoryTransport {
    type Error = ErrorKind;
}

impl Read for MemoryTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_read_at == Some(self.position) {
            return Err(ErrorKind::ConnectionReset);
        }
        let remaining = &self.input[self.position..];
        let n = remaining.len().min(buf.len()).min(self.max_read);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl Write for MemoryTransport {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Firmware-Ziel im RAM mit fester Kapazität
#[derive(Debug)]
pub struct MemorySink {
    pub capacity: u32,
    pub image: Vec<u8>,
    pub expected: Option<u32>,
    pub finalized: bool,
    pub fail_finalize: bool,
}

impl MemorySink {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            image: Vec::new(),
            expected: None,
            finalized: false,
            fail_finalize: false,
        }
    }
}

impl FirmwareSink for MemorySink {
    fn begin(&mut self, size: u32) -> Result<(), FirmwareSinkError> {
        if size > self.capacity {
            return Err(FirmwareSinkError::ImageTooLarge);
        }
        self.expected = Some(size);
        self.image.clear();
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FirmwareSinkError> {
        assert_eq!(offset as usize, self.image.len(), "writes must be sequential");
        self.image.extend_from_slice(data);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), FirmwareSinkError> {
        if self.fail_finalize {
            return Err(FirmwareSinkError::Flash);
        }
        self.finalized = true;
        Ok(())
    }
}
