use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, Output};
use std::thread;
use std::time::Duration;

fn bin_path() -> String {
    // Prefer the test-built binary when available to avoid extra cargo builds.
    std::env::var("CARGO_BIN_EXE_machine-demo").unwrap_or_else(|_| {
        let candidates = [
            "../../target/release/machine-demo",
            "target/release/machine-demo",
            "../../target/debug/machine-demo",
            "target/debug/machine-demo",
        ];
        for candidate in candidates {
            if Path::new(candidate).exists() {
                return candidate.to_string();
            }
        }
        panic!("Failed to locate machine-demo binary");
    })
}

fn run_demo(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run machine-demo")
}

fn read_records(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .expect("record file should exist")
        .lines()
        .map(|line| serde_json::from_str(line).expect("record line should be JSON"))
        .collect()
}

fn machine_events<'a>(
    records: &'a [serde_json::Value],
    event_type: &'a str,
) -> impl Iterator<Item = &'a serde_json::Value> + 'a {
    records
        .iter()
        .filter(|r| r["kind"] == "machine_event")
        .map(|r| &r["details"])
        .filter(move |d| d["type"] == event_type)
}

#[test]
fn script_records_triggers_and_captures() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("session.jsonl");
    let capture = dir.path().join("frame.json");
    let script = format!("machine 1 frame 300 capture {} exit", capture.display());

    let output = run_demo(&[
        "--script",
        &script,
        "--record",
        record.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");

    let records = read_records(&record);
    assert_eq!(records.first().unwrap()["kind"], "session_start");
    assert_eq!(records.last().unwrap()["kind"], "session_end");
    assert_eq!(records.last().unwrap()["details"]["frame"], 300);

    let triggers: Vec<_> = machine_events(&records, "triggered").collect();
    assert_eq!(triggers.len(), 2);
    let frame = triggers[0]["frame"].as_u64().unwrap();
    assert!((220..=240).contains(&frame), "trigger at {frame}");

    let capture: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&capture).unwrap()).unwrap();
    assert_eq!(capture["frame"], 300);
    let draw = capture["draw"].as_array().unwrap();
    assert_eq!(draw.len(), 9);
    assert_eq!(draw.last().unwrap()["layer"], "last");
    assert_eq!(draw[0]["state"]["kind"], "lid_box");
    assert_eq!(draw[0]["state"]["open"], true);
}

#[test]
fn music_box_plays_loaded_song() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("notes.jsonl");
    let song = Path::new(env!("CARGO_MANIFEST_DIR")).join("songs/scale.json");

    let output = run_demo(&[
        "--machine",
        "2",
        "--song",
        song.to_str().unwrap(),
        "--frames",
        "200",
        "--record",
        record.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");

    let records = read_records(&record);
    let pitches: Vec<_> = machine_events(&records, "note")
        .map(|d| d["pitch"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        pitches,
        vec!["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]
    );
}

#[test]
fn bad_script_fails() {
    let output = run_demo(&["--script", "frame soon"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("frame"), "{stderr}");
}

struct DemoProcess {
    child: Child,
    addr: String,
}

impl DemoProcess {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .expect("Failed to bind ephemeral port for integration test");
        let addr = listener
            .local_addr()
            .expect("Failed to resolve bound address");
        let bind_addr = format!("127.0.0.1:{}", addr.port());
        drop(listener);

        let child = Command::new(bin_path())
            .args(["--bind", &bind_addr])
            .env("RUST_LOG", "warn")
            .spawn()
            .expect("Failed to start machine-demo");

        // Loop until port is open (up to 5s)
        let start = std::time::Instant::now();
        while start.elapsed().as_secs() < 5 {
            if TcpStream::connect(&bind_addr).is_ok() {
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }
        // The probe connection above may hold the single client slot briefly
        thread::sleep(Duration::from_millis(300));

        Self {
            child,
            addr: bind_addr,
        }
    }
}

impl Drop for DemoProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn bridge_serves_frame_requests() {
    let demo = DemoProcess::start();

    let mut stream = TcpStream::connect(&demo.addr).expect("Failed to connect to bridge");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut send = |line: serde_json::Value| -> serde_json::Value {
        writeln!(stream, "{line}").unwrap();
        let mut reply = String::new();
        reader.read_line(&mut reply).unwrap();
        serde_json::from_str(&reply).unwrap()
    };

    let hello = send(serde_json::json!({
        "type": "hello",
        "protocol_version": { "major": 1, "minor": 0 },
        "client_id": "integration-test"
    }));
    assert_eq!(hello["type"], "state");

    let state = send(serde_json::json!({ "type": "request_frame", "frame": 120 }));
    assert_eq!(state["frame"], 120);
    assert_eq!(state["time"], 4.0);

    let snapshot = send(serde_json::json!({ "type": "snapshot" }));
    let parts = snapshot["snapshot"]["parts"].as_array().unwrap();
    assert_eq!(parts[7]["state"]["kind"], "cam");
    assert_eq!(parts[7]["state"]["rotation"], 0.25);
}
