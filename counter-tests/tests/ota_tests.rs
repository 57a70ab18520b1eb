//! Integration Tests für OTA-Sessions
//!
//! Uploader und Flash sind durch `MemoryTransport` und `MemorySink` ersetzt.

mod common;

use common::{MemorySink, MemoryTransport, OtaEvent, RecordingOtaHandler};
use counter_core::{LoggingOtaHandler, OtaError, OtaEventHandler, run_session};
use embassy_futures::block_on;

const SECRET: &str = "ota-secret";
const IMAGE: &[u8] = b"0123456789";

fn upload(header: &str, body: &[u8]) -> Vec<u8> {
    let mut input = header.as_bytes().to_vec();
    input.extend_from_slice(body);
    input
}

struct Session {
    result: Result<u32, OtaError>,
    transport: MemoryTransport,
    sink: MemorySink,
    handler: RecordingOtaHandler,
}

fn run(transport: MemoryTransport, sink: MemorySink) -> Session {
    let mut transport = transport;
    let mut sink = sink;
    let mut handler = RecordingOtaHandler::default();
    let mut chunk = [0u8; 4];
    let result = block_on(run_session(
        &mut transport,
        &mut sink,
        SECRET,
        &mut handler,
        &mut chunk,
    ));
    Session {
        result,
        transport,
        sink,
        handler,
    }
}

#[test]
fn test_successful_update() {
    let transport = MemoryTransport::new(upload("OTA 10 ota-secret\n", IMAGE), 3);
    let session = run(transport, MemorySink::with_capacity(1024));

    assert_eq!(session.result, Ok(10));
    assert_eq!(
        session.handler.events,
        vec![
            OtaEvent::Start,
            OtaEvent::Progress(3, 10),
            OtaEvent::Progress(6, 10),
            OtaEvent::Progress(9, 10),
            OtaEvent::Progress(10, 10),
            OtaEvent::End,
        ]
    );
    assert_eq!(session.sink.image, IMAGE);
    assert!(session.sink.finalized);
    assert_eq!(session.transport.output_str(), "OK\nOK\n");
}

#[test]
fn test_wrong_secret_is_auth_error() {
    let transport = MemoryTransport::new(upload("OTA 10 guess\n", IMAGE), 64);
    let session = run(transport, MemorySink::with_capacity(1024));

    assert_eq!(session.result, Err(OtaError::Auth));
    assert_eq!(session.handler.events, vec![OtaEvent::Error(OtaError::Auth)]);
    assert_eq!(session.sink.expected, None);
    assert_eq!(session.transport.output_str(), "ERR 0\n");
}

#[test]
fn test_oversized_image_is_begin_error() {
    let transport = MemoryTransport::new(upload("OTA 10 ota-secret\n", IMAGE), 64);
    let session = run(transport, MemorySink::with_capacity(8));

    assert_eq!(session.result, Err(OtaError::Begin));
    assert_eq!(
        session.handler.events,
        vec![OtaEvent::Error(OtaError::Begin)]
    );
    assert_eq!(session.transport.output_str(), "ERR 1\n");
}

#[test]
fn test_malformed_header_is_begin_error() {
    for header in ["HELLO\n", "OTA abc ota-secret\n", "OTA 0 ota-secret\n"] {
        let transport = MemoryTransport::new(upload(header, IMAGE), 64);
        let session = run(transport, MemorySink::with_capacity(1024));
        assert_eq!(session.result, Err(OtaError::Begin), "header {:?}", header);
    }
}

#[test]
fn test_overlong_header_is_begin_error() {
    let header = "X".repeat(200);
    let transport = MemoryTransport::new(header.into_bytes(), 64);
    let session = run(transport, MemorySink::with_capacity(1024));

    assert_eq!(session.result, Err(OtaError::Begin));
}

#[test]
fn test_disconnect_during_header_is_connect_error() {
    let transport = MemoryTransport::new(b"OTA 10 ota-sec".to_vec(), 64);
    let session = run(transport, MemorySink::with_capacity(1024));

    assert_eq!(session.result, Err(OtaError::Connect));
    assert_eq!(
        session.handler.events,
        vec![OtaEvent::Error(OtaError::Connect)]
    );
    assert_eq!(session.transport.output_str(), "ERR 2\n");
}

#[test]
fn test_truncated_image_is_receive_error() {
    let transport = MemoryTransport::new(upload("OTA 10 ota-secret\n", &IMAGE[..6]), 3);
    let session = run(transport, MemorySink::with_capacity(1024));

    assert_eq!(session.result, Err(OtaError::Receive));
    assert_eq!(
        session.handler.events,
        vec![
            OtaEvent::Start,
            OtaEvent::Progress(3, 10),
            OtaEvent::Progress(6, 10),
            OtaEvent::Error(OtaError::Receive),
        ]
    );
    assert!(!session.sink.finalized);
    assert_eq!(session.transport.output_str(), "OK\nERR 3\n");
}

#[test]
fn test_read_error_during_image_is_receive_error() {
    let header = "OTA 10 ota-secret\n";
    let mut transport = MemoryTransport::new(upload(header, IMAGE), 4);
    transport.fail_read_at = Some(header.len() + 4);
    let session = run(transport, MemorySink::with_capacity(1024));

    assert_eq!(session.result, Err(OtaError::Receive));
    assert_eq!(session.sink.image, &IMAGE[..4]);
}

#[test]
fn test_finalize_failure_is_end_error() {
    let transport = MemoryTransport::new(upload("OTA 10 ota-secret\n", IMAGE), 64);
    let mut sink = MemorySink::with_capacity(1024);
    sink.fail_finalize = true;
    let session = run(transport, sink);

    assert_eq!(session.result, Err(OtaError::End));
    assert_eq!(
        session.handler.events.last(),
        Some(&OtaEvent::Error(OtaError::End))
    );
    assert!(!session.handler.events.contains(&OtaEvent::End));
    assert_eq!(session.transport.output_str(), "OK\nERR 4\n");
}

#[test]
fn test_error_codes_and_labels() {
    let expected = [
        (OtaError::Auth, 0, "Auth Failed"),
        (OtaError::Begin, 1, "Begin Failed"),
        (OtaError::Connect, 2, "Connect Failed"),
        (OtaError::Receive, 3, "Receive Failed"),
        (OtaError::End, 4, "End Failed"),
    ];
    for (error, code, label) in expected {
        assert_eq!(error.code(), code);
        assert_eq!(error.as_str(), label);
    }
}

#[test]
fn test_logging_handler_survives_full_session() {
    let mut transport = MemoryTransport::new(upload("OTA 10 ota-secret\n", IMAGE), 64);
    let mut sink = MemorySink::with_capacity(1024);
    let mut handler = LoggingOtaHandler::new();
    let mut chunk = [0u8; 8];

    let result = block_on(run_session(
        &mut transport,
        &mut sink,
        SECRET,
        &mut handler,
        &mut chunk,
    ));

    assert_eq!(result, Ok(10));
    assert_eq!(handler.last_percent(), Some(100));
    assert_eq!(sink.image, IMAGE);

    // Neue Session setzt den Fortschritt zurück, Fehler lassen ihn stehen
    handler.on_start();
    assert_eq!(handler.last_percent(), None);
    handler.on_progress(5, 10);
    handler.on_error(OtaError::Receive);
    assert_eq!(handler.last_percent(), Some(50));
}
