pub mod bridge;
pub mod metrics;
pub mod protocol;

pub use bridge::{handle_line, run_bridge, BridgeConfig, Session};
pub use metrics::{init_metrics, record_position, record_stats, serve_metrics};
pub use protocol::{ErrorMsg, HelloMsg, IncomingMessage, ProtocolError, ProtocolVersion, StateMsg};
