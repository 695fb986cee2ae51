//! Prometheus metrics for the machine kernel and its host bridge.

use machine_core::SeekStats;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Seek Metrics
// ============================================================================

/// Frame requests served
pub static FRAME_REQUESTS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "machine_frame_requests_total",
        "Frame requests served by the machine system",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Backward seeks that replayed from frame zero
pub static REWINDS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "machine_rewinds_total",
        "Backward seeks that replayed from frame zero",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Frames simulated, including replayed ones
pub static FRAMES_STEPPED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "machine_frames_stepped_total",
        "Frames simulated, including replays after a rewind",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

// ============================================================================
// Machine Event Metrics
// ============================================================================

pub static TRIGGERS_FIRED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "machine_triggers_fired_total",
        "Openables opened by a cam",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static NOTES_PLAYED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "machine_notes_played_total",
        "Music box notes played",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

// ============================================================================
// State Metrics
// ============================================================================

/// Current machine frame
pub static CURRENT_FRAME: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new("machine_frame", "Current machine frame").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Current machine time in seconds
pub static MACHINE_TIME_S: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new("machine_time_seconds", "Current machine time in seconds").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Selected machine number
pub static MACHINE_NUMBER: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new("machine_number", "Selected machine number").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Bridge client connection status (1 = connected, 0 = disconnected)
pub static BRIDGE_CONNECTED: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        "machine_bridge_connected",
        "Bridge client connection status (1=connected, 0=disconnected)",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Add the growth between two stat readings to the counters.
pub fn record_stats(before: SeekStats, after: SeekStats) {
    FRAME_REQUESTS.inc_by(after.requests.saturating_sub(before.requests));
    REWINDS.inc_by(after.rewinds.saturating_sub(before.rewinds));
    FRAMES_STEPPED.inc_by(after.frames_stepped.saturating_sub(before.frames_stepped));
    TRIGGERS_FIRED.inc_by(after.triggers.saturating_sub(before.triggers));
    NOTES_PLAYED.inc_by(after.notes.saturating_sub(before.notes));
}

pub fn record_position(machine: i32, frame: u32, time: f64) {
    MACHINE_NUMBER.set(f64::from(machine));
    CURRENT_FRAME.set(f64::from(frame));
    MACHINE_TIME_S.set(time);
}

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let mut buffer = Vec::new();

                    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }

                    let mut response = Response::from_data(buffer);
                    if let Ok(header) = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        encoder.format_type().as_bytes(),
                    ) {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once any frame has been served
                    if FRAME_REQUESTS.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = FRAME_REQUESTS.get();
    let _ = REWINDS.get();
    let _ = FRAMES_STEPPED.get();
    let _ = TRIGGERS_FIRED.get();
    let _ = NOTES_PLAYED.get();
    let _ = CURRENT_FRAME.get();
    let _ = MACHINE_TIME_S.get();
    let _ = MACHINE_NUMBER.get();
    let _ = BRIDGE_CONNECTED.get();
}
