//! Integration Tests für den WLAN-Bootstrap

mod common;

use std::net::Ipv4Addr;

use common::{CountingRestart, Event, Journal, MockClock, ScriptedStation, VirtualTime};
use counter_core::{LinkError, RetryExhausted, RetryPolicy, Retried, StationConfig, bootstrap_link};
use embassy_futures::block_on;

const STATION: StationConfig<'static> = StationConfig {
    ssid: "HomeNet",
    password: "wifi-pass",
};

const ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

#[test]
fn test_bootstrap_first_attempt() {
    let journal = Journal::new();
    let mut station = ScriptedStation::new(journal.clone(), vec![Ok(ADDRESS)]);
    let mut restart = CountingRestart::new(journal.clone());
    let mut clock = MockClock::new(VirtualTime::default());

    let result = block_on(bootstrap_link(
        &mut station,
        &mut restart,
        &STATION,
        RetryPolicy::unbounded(5000),
        &mut clock,
    ));

    assert_eq!(
        result,
        Ok(Retried {
            value: ADDRESS,
            attempts: 1
        })
    );
    assert_eq!(restart.count, 0);
    assert!(clock.delays.is_empty());
    assert_eq!(station.attempts, vec!["HomeNet"]);
}

#[test]
fn test_bootstrap_restarts_before_each_retry() {
    let journal = Journal::new();
    let mut station = ScriptedStation::new(
        journal.clone(),
        vec![
            Err(LinkError::AssociationFailed),
            Err(LinkError::AddressTimeout),
            Ok(ADDRESS),
        ],
    );
    let mut restart = CountingRestart::new(journal.clone());
    let mut clock = MockClock::new(VirtualTime::default());

    let result = block_on(bootstrap_link(
        &mut station,
        &mut restart,
        &STATION,
        RetryPolicy::unbounded(5000),
        &mut clock,
    ));

    assert_eq!(result.map(|link| link.attempts), Ok(3));
    assert_eq!(restart.count, 2);
    assert_eq!(clock.delays, vec![5000, 5000]);
    assert_eq!(journal.events(), vec![Event::Restart, Event::Restart]);
}

#[test]
fn test_bootstrap_bounded_gives_up_without_final_restart() {
    let journal = Journal::new();
    let mut station = ScriptedStation::new(journal.clone(), vec![]);
    let mut restart = CountingRestart::new(journal);
    let mut clock = MockClock::new(VirtualTime::default());

    let result = block_on(bootstrap_link(
        &mut station,
        &mut restart,
        &STATION,
        RetryPolicy::bounded(5000, 2),
        &mut clock,
    ));

    assert_eq!(result, Err(RetryExhausted { attempts: 2 }));
    assert_eq!(restart.count, 1);
    assert_eq!(clock.delays, vec![5000]);
}
