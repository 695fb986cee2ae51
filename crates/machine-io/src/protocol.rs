//! Newline-delimited JSON spoken between a host and the bridge.

use machine_core::{FrameEvent, MachineSnapshot, MachineSystem, SeekStats};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const fn v1() -> Self {
        Self { major: 1, minor: 0 }
    }

    pub fn is_supported(&self) -> bool {
        self.major == 1
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no \"type\" field")]
    MissingType,
    #[error("unknown message type {0:?}")]
    UnknownType(String),
    #[error("unsupported protocol version {}.{}", .0.major, .0.minor)]
    UnsupportedVersion(ProtocolVersion),
    #[error("{0} received before hello")]
    NoHandshake(&'static str),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HelloMsg {
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

const MESSAGE_TYPES: &[&str] = &[
    "hello",
    "choose_machine",
    "set_frame_rate",
    "request_frame",
    "set_location",
    "set_flags",
    "snapshot",
];

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    Hello(HelloMsg),
    ChooseMachine { machine: i32 },
    SetFrameRate { rate: f64 },
    RequestFrame { frame: u32 },
    SetLocation { x: i32, y: i32 },
    SetFlags { flags: u8 },
    Snapshot,
}

impl IncomingMessage {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let msg_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(ProtocolError::MissingType)?;
        if !MESSAGE_TYPES.contains(&msg_type) {
            return Err(ProtocolError::UnknownType(msg_type.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hello(_) => "hello",
            Self::ChooseMachine { .. } => "choose_machine",
            Self::SetFrameRate { .. } => "set_frame_rate",
            Self::RequestFrame { .. } => "request_frame",
            Self::SetLocation { .. } => "set_location",
            Self::SetFlags { .. } => "set_flags",
            Self::Snapshot => "snapshot",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StateMsg {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub protocol_version: ProtocolVersion,
    pub sequence: u64,
    pub machine: i32,
    pub frame: u32,
    pub time: f64,
    pub frame_rate: f64,
    pub stats: SeekStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MachineSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<FrameEvent>,
}

impl StateMsg {
    pub fn from_system(sequence: u64, system: &MachineSystem) -> Self {
        Self {
            msg_type: "state",
            protocol_version: ProtocolVersion::v1(),
            sequence,
            machine: system.machine_number(),
            frame: system.frame(),
            time: system.machine_time(),
            frame_rate: system.frame_rate(),
            stats: system.stats(),
            snapshot: None,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorMsg {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub protocol_version: ProtocolVersion,
    pub sequence: u64,
    pub message: String,
}

impl ErrorMsg {
    pub fn new(sequence: u64, error: &ProtocolError) -> Self {
        Self {
            msg_type: "error",
            protocol_version: ProtocolVersion::v1(),
            sequence,
            message: error.to_string(),
        }
    }
}
