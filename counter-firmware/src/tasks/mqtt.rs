// MQTT Client - BrokerClient-Implementierung auf Basis von rust-mqtt
//
// Der TCP-Socket lebt so lange wie der Client. rust-mqtt bekommt für jede
// Operation eine kurzlebige Sicht (`&mut TcpSocket`) auf denselben Socket,
// damit der Event-Loop zwischen connect/poll/publish frei wechseln kann.

use core::net::Ipv4Addr;

use defmt::{Debug2Format, info, warn};
use embassy_net::tcp::{State, TcpSocket};
use embassy_net::{IpAddress, Stack, dns::DnsQueryType};
use embassy_time::{Duration, Instant, with_timeout};

use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

use counter_core::{BrokerClient, BrokerCredentials, BrokerState, MessageHandler};

use crate::config::{
    DNS_TIMEOUT_SECS, MQTT_BUFFER_SIZE, MQTT_KEEP_ALIVE_SECS, MQTT_RECEIVE_TIMEOUT_MS,
    MQTT_SOCKET_TIMEOUT_SECS,
};

/// Maximale Anzahl MQTT v5 Properties pro Paket
const MAX_PROPERTIES: usize = 5;

type Session<'a> = MqttClient<'a, &'a mut TcpSocket<'static>, MAX_PROPERTIES, CountingRng>;

/// MQTT Client über einen dauerhaft reservierten TCP-Socket
///
/// Zu groß für den Stack, daher in `main` per `StaticCell` angelegt.
pub struct EspBrokerClient {
    stack: Stack<'static>,
    socket: TcpSocket<'static>,
    send_buf: [u8; MQTT_BUFFER_SIZE],
    recv_buf: [u8; MQTT_BUFFER_SIZE],
    broker: &'static str,
    port: u16,
    connected: bool,
    last_io: Instant,
}

impl EspBrokerClient {
    /// # Parameter
    /// - `stack`: embassy-net Stack
    /// - `rx_buffer`, `tx_buffer`: TCP-Buffer für den Socket
    /// - `broker`: IPv4-Adresse oder Hostname des Brokers
    /// - `port`: TCP-Port des Brokers
    pub fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8],
        tx_buffer: &'static mut [u8],
        broker: &'static str,
        port: u16,
    ) -> Self {
        Self {
            stack,
            socket: TcpSocket::new(stack, rx_buffer, tx_buffer),
            send_buf: [0; MQTT_BUFFER_SIZE],
            recv_buf: [0; MQTT_BUFFER_SIZE],
            broker,
            port,
            connected: false,
            last_io: Instant::now(),
        }
    }

    /// Verbindung als verloren markieren und Socket zurücksetzen
    fn drop_connection(&mut self) {
        self.connected = false;
        self.socket.abort();
    }

    fn keep_alive_due(&self) -> bool {
        let half = Duration::from_secs(u64::from(MQTT_KEEP_ALIVE_SECS) / 2);
        Instant::now().saturating_duration_since(self.last_io) >= half
    }
}

impl BrokerClient for EspBrokerClient {
    fn connected(&self) -> bool {
        self.connected && self.socket.state() == State::Established
    }

    async fn connect(&mut self, credentials: &BrokerCredentials<'_>) -> Result<(), BrokerState> {
        self.drop_connection();

        let address = resolve_broker(self.stack, self.broker).await.map_err(|e| {
            warn!("MQTT: Cannot resolve '{}': {}", self.broker, e);
            BrokerState::ConnectFailed
        })?;

        self.socket
            .set_timeout(Some(Duration::from_secs(MQTT_SOCKET_TIMEOUT_SECS)));
        self.socket
            .connect((address, self.port))
            .await
            .map_err(|e| {
                warn!("MQTT: TCP connect failed: {}", Debug2Format(&e));
                BrokerState::ConnectFailed
            })?;

        let mut config = client_config();
        config.add_client_id(credentials.client_id);
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        if !credentials.username.is_empty() {
            config.add_username(credentials.username);
            if !credentials.password.is_empty() {
                config.add_password(credentials.password);
            }
        }

        let result = {
            let mut client = session(
                &mut self.socket,
                &mut self.send_buf,
                &mut self.recv_buf,
                config,
            );
            client.connect_to_broker().await
        };

        match result {
            Ok(()) => {
                self.connected = true;
                self.last_io = Instant::now();
                Ok(())
            }
            Err(reason) => {
                warn!(
                    "MQTT: Broker refused connection: {}",
                    describe_reason(&reason)
                );
                self.drop_connection();
                Err(broker_state(reason))
            }
        }
    }

    async fn poll<H: MessageHandler>(&mut self, handler: &mut H) {
        if !self.connected() {
            self.connected = false;
            return;
        }

        if self.socket.can_recv() {
            let result = {
                let mut client = session(
                    &mut self.socket,
                    &mut self.send_buf,
                    &mut self.recv_buf,
                    client_config(),
                );
                match with_timeout(
                    Duration::from_millis(MQTT_RECEIVE_TIMEOUT_MS),
                    client.receive_message(),
                )
                .await
                {
                    Ok(Ok((topic, payload))) => {
                        handler.on_message(topic, payload);
                        Ok(())
                    }
                    Ok(Err(reason)) => Err(Some(reason)),
                    Err(_) => Err(None),
                }
            };

            match result {
                Ok(()) => self.last_io = Instant::now(),
                Err(reason) => {
                    warn!(
                        "MQTT: Receive failed: {}",
                        reason.as_ref().map_or("timeout", describe_reason)
                    );
                    self.drop_connection();
                    return;
                }
            }
        }

        if self.keep_alive_due() {
            let result = {
                let mut client = session(
                    &mut self.socket,
                    &mut self.send_buf,
                    &mut self.recv_buf,
                    client_config(),
                );
                client.send_ping().await
            };
            match result {
                Ok(()) => self.last_io = Instant::now(),
                Err(reason) => {
                    warn!("MQTT: Ping failed: {}", describe_reason(&reason));
                    self.drop_connection();
                }
            }
        }
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), BrokerState> {
        if !self.connected() {
            return Err(BrokerState::Disconnected);
        }

        let result = {
            let mut client = session(
                &mut self.socket,
                &mut self.send_buf,
                &mut self.recv_buf,
                client_config(),
            );
            client
                .send_message(topic, payload, QualityOfService::QoS0, retain)
                .await
        };

        match result {
            // Veröffentlicht, nur niemand hört zu
            Ok(()) | Err(ReasonCode::NoMatchingSubscribers) => {
                self.last_io = Instant::now();
                Ok(())
            }
            Err(reason) => {
                warn!("MQTT: Publish failed: {}", describe_reason(&reason));
                self.drop_connection();
                Err(BrokerState::ConnectionLost)
            }
        }
    }
}

fn client_config<'a>() -> ClientConfig<'a, MAX_PROPERTIES, CountingRng> {
    let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
    config.max_packet_size = MQTT_BUFFER_SIZE as u32;
    config
}

fn session<'a>(
    socket: &'a mut TcpSocket<'static>,
    send_buf: &'a mut [u8],
    recv_buf: &'a mut [u8],
    config: ClientConfig<'a, MAX_PROPERTIES, CountingRng>,
) -> Session<'a> {
    let send_len = send_buf.len();
    let recv_len = recv_buf.len();
    MqttClient::new(socket, send_buf, send_len, recv_buf, recv_len, config)
}

/// Übersetzt einen rust-mqtt Reason Code in den Client-Status
fn broker_state(reason: ReasonCode) -> BrokerState {
    match reason {
        ReasonCode::UnsupportedProtocolVersion => BrokerState::BadProtocol,
        ReasonCode::ClientIdNotValid => BrokerState::BadClientId,
        ReasonCode::ServerUnavailable | ReasonCode::ServerBusy => BrokerState::Unavailable,
        ReasonCode::BadUserNameOrPassword => BrokerState::BadCredentials,
        ReasonCode::NotAuthorized | ReasonCode::Banned => BrokerState::Unauthorized,
        ReasonCode::NetworkError => BrokerState::ConnectionLost,
        _ => BrokerState::ConnectFailed,
    }
}

fn describe_reason(reason: &ReasonCode) -> &'static str {
    match *reason {
        ReasonCode::UnspecifiedError => "Unspecified error",
        ReasonCode::MalformedPacket => "Malformed packet",
        ReasonCode::ProtocolError => "Protocol error",
        ReasonCode::UnsupportedProtocolVersion => "Unsupported protocol version",
        ReasonCode::ClientIdNotValid => "Client identifier not valid",
        ReasonCode::BadUserNameOrPassword => "Bad username or password",
        ReasonCode::NotAuthorized => "Not authorized",
        ReasonCode::ServerUnavailable => "Server unavailable",
        ReasonCode::ServerBusy => "Server busy",
        ReasonCode::Banned => "Client banned",
        ReasonCode::PacketTooLarge => "Packet too large",
        ReasonCode::NetworkError => "Network error",
        _ => "Unknown reason code",
    }
}

/// Broker-Adresse: IPv4-Literal direkt, sonst DNS A-Record
async fn resolve_broker(stack: Stack<'static>, broker: &str) -> Result<Ipv4Addr, ResolveError> {
    if let Ok(address) = broker.parse::<Ipv4Addr>() {
        return Ok(address);
    }

    info!("MQTT: Resolving '{}'...", broker);
    let result = with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(broker, DnsQueryType::A),
    )
    .await;

    match result {
        Ok(Ok(addrs)) => addrs
            .iter()
            .find_map(|addr| match addr {
                IpAddress::Ipv4(ipv4) => Some(*ipv4),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .ok_or(ResolveError::NoAddress),
        Ok(Err(_)) => Err(ResolveError::QueryFailed),
        Err(_) => Err(ResolveError::Timeout),
    }
}

#[derive(Debug)]
enum ResolveError {
    NoAddress,
    QueryFailed,
    Timeout,
}

impl defmt::Format for ResolveError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ResolveError::NoAddress => defmt::write!(fmt, "no IPv4 address"),
            ResolveError::QueryFailed => defmt::write!(fmt, "DNS failed"),
            ResolveError::Timeout => defmt::write!(fmt, "DNS timeout"),
        }
    }
}

impl core::fmt::Debug for EspBrokerClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EspBrokerClient")
            .field("broker", &self.broker)
            .field("port", &self.port)
            .field("connected", &self.connected)
            .finish()
    }
}
