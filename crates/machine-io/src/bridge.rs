use crate::metrics::{record_position, record_stats, BRIDGE_CONNECTED};
use crate::protocol::{ErrorMsg, HelloMsg, IncomingMessage, ProtocolError, StateMsg};
use machine_core::{MachineSystem, Point};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub struct BridgeConfig {
    pub bind_addr: String,
    pub poll_interval: Duration,
    pub require_handshake: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7100".to_string(),
            poll_interval: Duration::from_millis(5),
            require_handshake: false,
        }
    }
}

/// Per-connection state. Dropped with the client.
#[derive(Debug, Default)]
pub struct Session {
    sequence: u64,
    handshake_seen: bool,
    capabilities: Vec<String>,
    client_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handshake_seen(&self) -> bool {
        self.handshake_seen
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn note_handshake(&mut self, hello: &HelloMsg) {
        self.handshake_seen = true;
        self.capabilities = hello.capabilities.clone();
        self.client_id = hello.client_id.clone();
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }
}

fn lock(system: &Mutex<MachineSystem>) -> MutexGuard<'_, MachineSystem> {
    system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serve one host at a time until `stop` is raised.
pub fn run_bridge(
    system: Arc<Mutex<MachineSystem>>,
    config: BridgeConfig,
    stop: Arc<AtomicBool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind_addr)?;
    listener.set_nonblocking(true)?;

    info!(
        addr = %config.bind_addr,
        handshake = config.require_handshake,
        "Bridge listening"
    );

    let mut client: Option<TcpStream> = None;
    let mut recv_buf: Vec<u8> = Vec::with_capacity(4096);
    let mut send_buf: Vec<u8> = Vec::new();
    let mut send_offset: usize = 0;
    let mut session = Session::new();

    while !stop.load(Ordering::Relaxed) {
        if client.is_none() {
            match listener.accept() {
                Ok((stream, addr)) => match stream.set_nonblocking(true) {
                    Ok(()) => {
                        info!(client_addr = %addr, "Bridge client connected");
                        client = Some(stream);
                        BRIDGE_CONNECTED.set(1.0);
                    }
                    Err(err) => warn!(error = %err, "Could not make client nonblocking"),
                },
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(err) => {
                    warn!("Bridge accept error: {}", err);
                }
            }
        }

        let mut drop_client = false;
        if let Some(stream) = client.as_mut() {
            let mut temp = [0u8; 1024];
            match stream.read(&mut temp) {
                Ok(0) => {
                    info!("Bridge client disconnected");
                    drop_client = true;
                }
                Ok(n) => {
                    recv_buf.extend_from_slice(&temp[..n]);
                    while let Some(pos) = recv_buf.iter().position(|b| *b == b'\n') {
                        let line = recv_buf.drain(..=pos).collect::<Vec<u8>>();
                        let Ok(text) = std::str::from_utf8(&line) else {
                            warn!("Dropping non-UTF-8 line");
                            continue;
                        };
                        let trimmed = text.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        let reply = handle_line(trimmed, &system, &config, &mut session);
                        send_buf.extend_from_slice(reply.as_bytes());
                        send_buf.push(b'\n');
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(err) => {
                    warn!(error = %err, "Bridge read error");
                    drop_client = true;
                }
            }

            if !drop_client && send_offset < send_buf.len() {
                match stream.write(&send_buf[send_offset..]) {
                    Ok(0) => {
                        info!("Bridge client disconnected");
                        drop_client = true;
                    }
                    Ok(n) => {
                        send_offset += n;
                        if send_offset >= send_buf.len() {
                            send_buf.clear();
                            send_offset = 0;
                        }
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(err) => {
                        warn!(error = %err, "Bridge write error");
                        drop_client = true;
                    }
                }
            }
        }

        if drop_client {
            client = None;
            recv_buf.clear();
            send_buf.clear();
            send_offset = 0;
            session = Session::new();
            BRIDGE_CONNECTED.set(0.0);
        }

        std::thread::sleep(config.poll_interval);
    }

    info!("Bridge stopped");
    Ok(())
}

/// Parse and apply one request line, returning the JSON reply.
pub fn handle_line(
    line: &str,
    system: &Mutex<MachineSystem>,
    config: &BridgeConfig,
    session: &mut Session,
) -> String {
    let sequence = session.next_sequence();
    let reply = IncomingMessage::parse(line)
        .and_then(|msg| handle_incoming(msg, sequence, system, config, session))
        .and_then(|state| serde_json::to_string(&state).map_err(ProtocolError::from));

    match reply {
        Ok(text) => text,
        Err(err) => {
            warn!(sequence, error = %err, "Rejected bridge message");
            serde_json::to_string(&ErrorMsg::new(sequence, &err))
                .unwrap_or_else(|_| String::from(r#"{"type":"error"}"#))
        }
    }
}

#[instrument(skip(system, config, session), fields(command = msg.name()))]
fn handle_incoming(
    msg: IncomingMessage,
    sequence: u64,
    system: &Mutex<MachineSystem>,
    config: &BridgeConfig,
    session: &mut Session,
) -> Result<StateMsg, ProtocolError> {
    if let IncomingMessage::Hello(hello) = &msg {
        if !hello.protocol_version.is_supported() {
            return Err(ProtocolError::UnsupportedVersion(hello.protocol_version));
        }
        session.note_handshake(hello);
        info!(
            client_id = ?hello.client_id,
            capabilities = ?hello.capabilities,
            "Bridge handshake received"
        );
    } else if config.require_handshake && !session.handshake_seen {
        return Err(ProtocolError::NoHandshake(msg.name()));
    }

    let mut system = lock(system);
    let before = system.stats();
    let mut with_snapshot = false;

    match msg {
        IncomingMessage::Hello(_) => {}
        IncomingMessage::ChooseMachine { machine } => system.choose_machine(machine),
        IncomingMessage::SetFrameRate { rate } => system.set_frame_rate(rate),
        IncomingMessage::RequestFrame { frame } => {
            let time = system.request_frame(frame);
            debug!(frame, time, "Frame served");
        }
        IncomingMessage::SetLocation { x, y } => system.set_location(Point::new(x, y)),
        IncomingMessage::SetFlags { flags } => system.set_development_flags(flags),
        IncomingMessage::Snapshot => with_snapshot = true,
    }

    record_stats(before, system.stats());
    record_position(system.machine_number(), system.frame(), system.machine_time());

    let mut state = StateMsg::from_system(sequence, &system);
    if with_snapshot {
        state.snapshot = Some(system.snapshot());
        state.events = system.drain_events();
    }
    Ok(state)
}
