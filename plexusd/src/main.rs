//! Plexus Daemon - Background network propagation service
//!
//! This daemon runs continuously in the background, managing:
//! - One network and its propagation scheduler
//! - Control requests from clients (load, freeze, grow, reset)
//! - Read-only snapshots for visualizers
//!
//! Settings: `config.json` in the OS data directory, overridden by
//! `PLEXUS_MODE`, `PLEXUS_SEED` and `PLEXUS_ADDR`.

use std::sync::Arc;
use std::time::Duration;

use plexus::network::{Diagnostics, Network};
use plexus::neuron::{NeuronId, Potential, Weight};
use plexus::observer::{NetworkAdapter, NeuronView};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::time;
use tracing::{error, info};

mod error;
mod paths;
mod settings;

use error::DaemonError;
use paths::AppPaths;
use settings::Settings;

// ═══════════════════════════════════════════════════════════════════════════
// Protocol Messages
// ═══════════════════════════════════════════════════════════════════════════

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

// ═══════════════════════════════════════════════════════════════════════════
// Daemon State
// ═══════════════════════════════════════════════════════════════════════════

struct DaemonState {
    network: Network,
    tick_interval_ms: u64,
}

impl DaemonState {
    fn new(network: Network) -> Self {
        let tick_interval_ms = network.config().tick_interval_ms;
        Self {
            network,
            tick_interval_ms,
        }
    }

    fn tick(&mut self) {
        // A frozen network returns immediately.
        self.network.tick();
    }

    fn get_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            frozen: self.network.is_frozen(),
            mode: format!("{:?}", self.network.config().mode).to_lowercase(),
            tick_interval_ms: self.tick_interval_ms,
            output: self.network.output(),
            last_wave_output: self.network.last_output().to_vec(),
            diagnostics: self.network.diagnostics(),
        }
    }

    fn graph_view(&self) -> GraphView {
        let snapshot = NetworkAdapter::new(&self.network).snapshot();
        GraphView {
            edges: snapshot.edge_list(),
            neurons: snapshot.neurons,
        }
    }

    /// Apply one mutating request. Runs under the write lock, so never
    /// concurrently with a tick.
    fn apply(&mut self, request: Request) -> Response {
        match request {
            Request::Freeze => {
                self.network.freeze();
                success("Frozen")
            }
            Request::Resume => {
                self.network.resume();
                success("Resumed")
            }
            Request::Load { input, target } => {
                match self.network.load(&input, target.as_deref()) {
                    Ok(()) => success("Loaded"),
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            Request::AddNeurons { count } => {
                let added = self.network.add_neurons(count);
                success(format!("Added neurons {}..{}", added.start, added.end))
            }
            Request::ResetTopology => {
                self.network.reset_topology();
                success("All subscriptions broken")
            }
            Request::Rewire => {
                let wired = self.network.wire();
                success(format!("Wired {} neurons", wired))
            }
            Request::SetTickInterval { ms } => {
                let clamped = ms.clamp(0, 60_000);
                self.tick_interval_ms = clamped;
                info!("Tick interval set to {} ms", clamped);
                success(format!("Tick interval set to {} ms", clamped))
            }
            Request::GetState => Response::State(self.get_snapshot()),
            Request::GetOutput => Response::Output {
                values: self.network.output(),
            },
            Request::Snapshot => Response::Snapshot(self.graph_view()),
            Request::Shutdown => Response::Error {
                message: "Shutdown is handled by the connection loop".to_string(),
            },
        }
    }
}

fn success(message: impl Into<String>) -> Response {
    Response::Success {
        message: message.into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Client Handler
// ═══════════════════════════════════════════════════════════════════════════

async fn handle_client(
    stream: TcpStream,
    state: Arc<RwLock<DaemonState>>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let request: Request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let resp = Response::Error {
                    message: format!("Invalid request: {}", e),
                };
                writer
                    .write_all(serde_json::to_string(&resp)?.as_bytes())
                    .await?;
                writer.write_all(b"\n").await?;
                continue;
            }
        };

        let response = match request {
            Request::GetState => Response::State(state.read().await.get_snapshot()),
            Request::Snapshot => Response::Snapshot(state.read().await.graph_view()),
            Request::Shutdown => {
                let mut s = state.write().await;
                s.network.freeze();
                info!("Shutdown requested");
                tokio::spawn(async {
                    // Give the response a moment to flush before exiting.
                    time::sleep(Duration::from_millis(50)).await;
                    std::process::exit(0);
                });
                success("Shutting down")
            }
            other => {
                let mut s = state.write().await;
                s.apply(other)
            }
        };

        writer
            .write_all(serde_json::to_string(&response)?.as_bytes())
            .await?;
        writer.write_all(b"\n").await?;
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let paths = AppPaths::new()?;
    info!("Data directory: {:?}", paths.data_dir());

    let mut settings = Settings::load(&paths.config_file())?;
    settings.apply_env()?;

    let network = Network::new(settings.network)?;
    let state = Arc::new(RwLock::new(DaemonState::new(network)));

    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C: stopping");
                std::process::exit(0);
            }
        });
    }

    let listener = TcpListener::bind(&settings.listen_addr).await?;
    info!("Plexus daemon listening on {}", settings.listen_addr);

    // Scheduler task
    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        loop {
            let interval = {
                let s = state_clone.read().await;
                s.tick_interval_ms
            };

            // Cooperative throttle between ticks.
            if interval == 0 {
                tokio::task::yield_now().await;
            } else {
                time::sleep(Duration::from_millis(interval)).await;
            }

            let mut s = state_clone.write().await;
            s.tick();
        }
    });

    // Accept client connections
    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Client connected: {}", addr);
        let state_clone = Arc::clone(&state);

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, state_clone).await {
                error!("Client handler error: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus::config::NetworkConfig;

    fn state() -> DaemonState {
        let cfg = NetworkConfig::with_size(50, 5, 5)
            .with_connectivity(0.1)
            .with_seed(61);
        DaemonState::new(Network::new(cfg).unwrap())
    }

    #[test]
    fn requests_parse_from_tagged_json() {
        let req: Request = serde_json::from_str(r#"{"type":"Load","input":[0.1,0.2]}"#).unwrap();
        match req {
            Request::Load { input, target } => {
                assert_eq!(input, vec![0.1, 0.2]);
                assert!(target.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }
        let req: Request = serde_json::from_str(r#"{"type":"AddNeurons","count":3}"#).unwrap();
        assert!(matches!(req, Request::AddNeurons { count: 3 }));
    }

    #[test]
    fn load_shape_mismatch_is_an_error_response() {
        let mut s = state();
        let resp = s.apply(Request::Load {
            input: vec![0.5; 2],
            target: None,
        });
        assert!(matches!(resp, Response::Error { .. }));

        let resp = s.apply(Request::Load {
            input: vec![0.5; 5],
            target: Some(vec![1.0; 5]),
        });
        assert!(matches!(resp, Response::Success { .. }));
    }

    #[test]
    fn ticks_respect_freeze() {
        let mut s = state();
        s.apply(Request::Freeze);
        for _ in 0..10 {
            s.tick();
        }
        assert_eq!(s.network.fire_counter(), 0);

        s.apply(Request::Resume);
        for _ in 0..10 {
            s.tick();
        }
        match s.apply(Request::GetState) {
            Response::State(snap) => {
                assert!(!snap.frozen);
                assert_eq!(snap.mode, "wave");
                assert!(snap.diagnostics.wave_counter > 0);
                assert_eq!(snap.output.len(), 5);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn topology_requests_round_trip() {
        let mut s = state();
        s.apply(Request::ResetTopology);
        match s.apply(Request::Snapshot) {
            Response::Snapshot(view) => {
                assert!(view.edges.is_empty());
                assert_eq!(view.neurons.len(), 50);
            }
            other => panic!("unexpected response {:?}", other),
        }
        s.apply(Request::Rewire);
        s.apply(Request::AddNeurons { count: 5 });
        assert_eq!(s.network.len(), 55);
        assert!(s.network.diagnostics().connection_count > 0);
    }

    #[tokio::test]
    async fn client_speaks_line_delimited_json() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(RwLock::new(state()));

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            handle_client(stream, server_state).await.unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"type\":\"GetOutput\"}\nnot json\n")
            .await
            .unwrap();

        let first: Response = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(matches!(first, Response::Output { ref values } if values.len() == 5));
        let second: Response = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert!(matches!(second, Response::Error { .. }));
    }
}
