//! CLI client for the `plexusd` daemon.
//!
//! Examples:
//!   plexus-cli status
//!   plexus-cli freeze
//!   plexus-cli load 0.1,0.2,0.3 --target 1,0,1
//!   plexus-cli output
//!   plexus-cli add 16
//!   plexus-cli snapshot
//!
//! By default it talks to 127.0.0.1:9877; override with `--addr host:port`.

use plexus::network::Diagnostics;
use plexus::neuron::{NeuronId, Potential, Weight};
use plexus::observer::NeuronView;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Request {
    GetState,
    Freeze,
    Resume,
    Load {
        input: Vec<Potential>,
        #[serde(default)]
        target: Option<Vec<Potential>>,
    },
    GetOutput,
    AddNeurons { count: usize },
    ResetTopology,
    Rewire,
    Snapshot,
    SetTickInterval { ms: u64 },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Response {
    State(StateSnapshot),
    Output { values: Vec<Potential> },
    Snapshot(GraphView),
    Success { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateSnapshot {
    frozen: bool,
    mode: String,
    tick_interval_ms: u64,
    output: Vec<Potential>,
    last_wave_output: Vec<Potential>,
    diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphView {
    neurons: Vec<NeuronView>,
    edges: Vec<(NeuronId, NeuronId, Weight)>,
}

fn usage() -> ! {
    eprintln!("plexus-cli (talks to plexusd @ 127.0.0.1:9877 by default)");
    eprintln!("Usage: plexus-cli [--addr host:port] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  status                          Show daemon state");
    eprintln!("  freeze | resume                 Pause or continue propagation");
    eprintln!("  load <v,v,..> [--target v,..]   Write sensory input (and motor target)");
    eprintln!("  output                          Read motor potentials");
    eprintln!("  add <count>                     Grow the network by <count> neurons");
    eprintln!("  reset                           Break every subscription");
    eprintln!("  rewire                          Subscribe neurons that have no inputs");
    eprintln!("  snapshot                        Dump neurons and edges as JSON");
    eprintln!("  interval <0-60000>              Set tick interval in milliseconds");
    eprintln!("  shutdown                        Stop the daemon");
    process::exit(1);
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut addr = "127.0.0.1:9877".to_string();
    if args.len() >= 2 && args[0] == "--addr" {
        addr = args[1].clone();
        args.drain(0..2);
    }

    if args.is_empty() {
        usage();
    }

    (addr, args)
}

fn parse_vector(raw: &str) -> Result<Vec<Potential>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Potential>().map_err(|e| format!("bad value {s:?}: {e}")))
        .collect()
}

fn send_request(addr: &str, req: &Request) -> Result<Response, String> {
    let mut stream = TcpStream::connect(addr).map_err(|e| format!("connect: {e}"))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .map_err(|e| format!("set_read_timeout: {e}"))?;
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| format!("clone: {e}"))?);

    let line = serde_json::to_string(req).map_err(|e| format!("serialize: {e}"))?;
    stream
        .write_all(line.as_bytes())
        .and_then(|_| stream.write_all(b"\n"))
        .map_err(|e| format!("send: {e}"))?;

    let mut resp_line = String::new();
    reader
        .read_line(&mut resp_line)
        .map_err(|e| format!("recv: {e}"))?;
    serde_json::from_str(&resp_line).map_err(|e| format!("parse response: {e}"))
}

fn print_state(s: StateSnapshot) {
    let d = &s.diagnostics;
    println!(
        "mode={:<6} frozen={} interval={}ms fires={} waves={} queue={}",
        s.mode, s.frozen, s.tick_interval_ms, d.fire_counter, d.wave_counter, d.pending_queue,
    );
    println!(
        "network: neurons={} conns={} initiated={} avg_|w|={:.3}",
        d.neuron_count, d.connection_count, d.initiated_neurons, d.avg_abs_weight,
    );
    println!("output: {:?}", s.output);
    println!("last wave: {:?}", s.last_wave_output);
}

fn main() {
    let (addr, args) = parse_args();
    let cmd = &args[0];

    let make_error = |msg: &str| -> ! {
        eprintln!("{}", msg);
        process::exit(1);
    };

    let req = match cmd.as_str() {
        "status" => Request::GetState,
        "freeze" => Request::Freeze,
        "resume" => Request::Resume,
        "load" => {
            if args.len() < 2 {
                usage();
            }
            let input = parse_vector(&args[1]).unwrap_or_else(|e| make_error(&e));
            let target = match args.get(2).map(String::as_str) {
                Some("--target") => {
                    let raw = args
                        .get(3)
                        .unwrap_or_else(|| make_error("--target needs a vector"));
                    Some(parse_vector(raw).unwrap_or_else(|e| make_error(&e)))
                }
                Some(other) => make_error(&format!("unexpected argument {other:?}")),
                None => None,
            };
            Request::Load { input, target }
        }
        "output" => Request::GetOutput,
        "add" => {
            if args.len() < 2 {
                usage();
            }
            let count: usize = args[1]
                .parse()
                .unwrap_or_else(|_| make_error("count must be a non-negative number"));
            Request::AddNeurons { count }
        }
        "reset" => Request::ResetTopology,
        "rewire" => Request::Rewire,
        "snapshot" => Request::Snapshot,
        "interval" => {
            if args.len() < 2 {
                usage();
            }
            let ms: u64 = args[1]
                .parse()
                .unwrap_or_else(|_| make_error("interval must be a number (0-60000)"));
            Request::SetTickInterval { ms }
        }
        "shutdown" => Request::Shutdown,
        _ => usage(),
    };

    match send_request(&addr, &req) {
        Ok(Response::State(s)) => print_state(s),
        Ok(Response::Output { values }) => println!("{values:?}"),
        Ok(Response::Snapshot(view)) => match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("{json}"),
            Err(e) => make_error(&format!("serialize snapshot: {e}")),
        },
        Ok(Response::Success { message }) => println!("{message}"),
        Ok(Response::Error { message }) => {
            eprintln!("Error: {message}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed: {e}");
            process::exit(1);
        }
    }
}
