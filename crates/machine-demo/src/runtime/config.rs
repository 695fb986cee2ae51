use crate::script::parse_flags;
use machine_core::Point;
use std::path::PathBuf;

/// Last frame reached by `--play` when `--frames` is not given.
pub const DEFAULT_PLAY_FRAMES: u32 = 900;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub machine: i32,
    pub frame_rate: f64,
    pub crank_speed: f64,
    pub song_path: Option<PathBuf>,
    pub location: Option<Point>,
    pub frames: Option<u32>,
    pub play: bool,
    pub script: Option<String>,
    pub record_path: Option<PathBuf>,
    pub json_logs: bool,
    pub log_dir: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub bind_addr: Option<String>,
    pub require_handshake: bool,
    pub flags: u8,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            machine: 1,
            frame_rate: 30.0,
            crank_speed: 0.25,
            song_path: None,
            location: None,
            frames: None,
            play: false,
            script: None,
            record_path: None,
            json_logs: false,
            log_dir: None,
            metrics_addr: None,
            bind_addr: None,
            require_handshake: false,
            flags: 0,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--machine" => {
                    if i + 1 < args.len() {
                        cfg.machine = args[i + 1].parse().unwrap_or(cfg.machine);
                        i += 1;
                    }
                }
                "--frame-rate" => {
                    if i + 1 < args.len() {
                        cfg.frame_rate = args[i + 1]
                            .parse::<f64>()
                            .ok()
                            .filter(|r| r.is_finite() && *r > 0.0)
                            .unwrap_or(cfg.frame_rate);
                        i += 1;
                    }
                }
                "--crank-speed" => {
                    if i + 1 < args.len() {
                        cfg.crank_speed = args[i + 1].parse().unwrap_or(cfg.crank_speed);
                        i += 1;
                    }
                }
                "--song" => {
                    if i + 1 < args.len() {
                        cfg.song_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--location" => {
                    if i + 1 < args.len() {
                        cfg.location = parse_point(&args[i + 1]);
                        i += 1;
                    }
                }
                "--frames" => {
                    if i + 1 < args.len() {
                        cfg.frames = args[i + 1].parse::<u32>().ok();
                        i += 1;
                    }
                }
                "--play" => {
                    cfg.play = true;
                }
                "--script" => {
                    if i + 1 < args.len() {
                        cfg.script = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--record" => {
                    if i + 1 < args.len() {
                        cfg.record_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--log-dir" => {
                    if i + 1 < args.len() {
                        cfg.log_dir = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--bind" => {
                    if i + 1 < args.len() {
                        cfg.bind_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--require-handshake" => {
                    cfg.require_handshake = true;
                }
                "--flags" => {
                    if i + 1 < args.len() {
                        cfg.flags = parse_flags(&args[i + 1]).unwrap_or(cfg.flags);
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"machine-demo - Headless viewer for the machine simulation kernel

USAGE:
    machine-demo [OPTIONS]

OPTIONS:
    --machine <N>           Machine to build (1 or 2; others fall back to 1) [default: 1]
    --frame-rate <FPS>      Frames per second [default: 30]
    --crank-speed <TURNS>   Crank speed in turns per second [default: 0.25]
    --song <PATH>           JSON song for the music box (machine 2)
    --location <X,Y>        Machine origin [default: 200,500]
    --frames <N>            Seek to frame N, or stop --play there
    --play                  Step frames in real time [default end: 900]
    --script <TASKS>        Run a task script, e.g. "machine 2 frame 10 capture exit"
    --record <PATH>         Append machine events to a JSONL file
    --json-logs             Output logs in JSON format (for log aggregation)
    --log-dir <DIR>         Also write JSON logs to DIR/machine-demo.log
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    --bind <ADDR>           Serve the host bridge on a TCP address (e.g., 127.0.0.1:7100)
    --require-handshake     Require a hello before bridge commands
    --flags <BITS>          Development flags, decimal or 0x hex
    -h, --help              Print this help message

SCRIPT TASKS:
    machine <N>             Select a machine and rewind it to frame 0
    frame <N>               Seek to frame N
    rate <FPS>              Change the frame rate
    location <X> <Y>        Move the machine origin
    flags <BITS>            Set development flags
    capture [PATH]          Write the current display list as JSON (stdout without PATH)
    exit                    Stop, including a running bridge

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,machine_core=trace)

EXAMPLES:
    # Watch machine 1 for 30 seconds
    machine-demo --play

    # Jump to the music box tune and record what plays
    machine-demo --machine 2 --frames 600 --record events.jsonl

    # Drive from an editor over TCP
    machine-demo --bind 127.0.0.1:7100 --metrics-addr 0.0.0.0:9090
"#
        );
    }
}

pub fn parse_point(text: &str) -> Option<Point> {
    let (x, y) = text.split_once(',')?;
    Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}
