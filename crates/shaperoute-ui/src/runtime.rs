//! Effect runtime.
//!
//! Executes [`Command`]s as spawned tasks and feeds their completions back
//! through one channel, so the orchestrator sees every message in arrival
//! order on a single consumer. Must be driven from inside a tokio runtime.

use crate::message::{Command, Message};
use crate::orchestrator::Orchestrator;
use crate::track_sink::TrackSink;
use shaperoute_communication::{Geocoder, RouteBackend};
use shaperoute_core::{ClientError, SaveError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// The outside world as seen by the runtime.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn RouteBackend>,
    pub geocoder: Arc<dyn Geocoder>,
    pub sink: Arc<dyn TrackSink>,
}

pub struct Runtime {
    orchestrator: Orchestrator,
    services: Services,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    /// Spawned effects whose completion has not been applied yet.
    pending: usize,
}

impl Runtime {
    pub fn new(orchestrator: Orchestrator, services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            services,
            tx,
            rx,
            pending: 0,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Number of effects still running.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Apply a user message and start whatever effects it asks for.
    pub fn dispatch(&mut self, message: Message) {
        for command in self.orchestrator.update(message) {
            self.execute(command);
        }
    }

    /// Wait for the next effect completion and apply it.
    ///
    /// Returns `false` when nothing is running.
    pub async fn step(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(message) => {
                self.pending -= 1;
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Apply completions until no effect is running.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn execute(&mut self, command: Command) {
        debug!("Executing {:?}", CommandKind(&command));
        self.pending += 1;
        let tx = self.tx.clone();
        let services = self.services.clone();
        let abandoned = Abandoned::of(&command);

        tokio::spawn(async move {
            // Every effect posts exactly one completion, even if it panics.
            let message = match tokio::spawn(run(services, command)).await {
                Ok(message) => message,
                Err(e) => {
                    error!("{:?} did not complete: {}", abandoned, e);
                    abandoned.into_message(e.to_string())
                }
            };
            if tx.send(message).is_err() {
                warn!("Runtime dropped before an effect completed");
            }
        });
    }
}

async fn run(services: Services, command: Command) -> Message {
    match command {
        Command::LoadShapes => Message::ShapesLoaded(services.backend.list_shapes().await),
        Command::Geocode { seq, query } => Message::LocationResolved {
            seq,
            result: services.geocoder.search(&query).await,
        },
        Command::GenerateRoute { seq, request } => Message::RouteGenerated {
            seq,
            result: services.backend.generate_route(&request).await,
        },
        Command::DownloadTrack { file_name, request } => Message::TrackDownloaded {
            result: services.backend.fetch_track_file(&request).await,
            file_name,
        },
        Command::SaveTrack { file_name, bytes } => {
            let len = bytes.len();
            Message::TrackSaved {
                bytes: len,
                result: services.sink.save(&file_name, bytes).await,
            }
        }
    }
}

/// Enough of a command to report its failure after the effect is gone.
#[derive(Debug, Clone, PartialEq)]
enum Abandoned {
    LoadShapes,
    Geocode { seq: u64 },
    GenerateRoute { seq: u64 },
    DownloadTrack { file_name: String },
    SaveTrack { file_name: String, bytes: usize },
}

impl Abandoned {
    fn of(command: &Command) -> Self {
        match command {
            Command::LoadShapes => Self::LoadShapes,
            Command::Geocode { seq, .. } => Self::Geocode { seq: *seq },
            Command::GenerateRoute { seq, .. } => Self::GenerateRoute { seq: *seq },
            Command::DownloadTrack { file_name, .. } => Self::DownloadTrack {
                file_name: file_name.clone(),
            },
            Command::SaveTrack { file_name, bytes } => Self::SaveTrack {
                file_name: file_name.clone(),
                bytes: bytes.len(),
            },
        }
    }

    fn into_message(self, reason: String) -> Message {
        match self {
            Self::LoadShapes => Message::ShapesLoaded(Err(ClientError::network(reason))),
            Self::Geocode { seq } => Message::LocationResolved {
                seq,
                result: Err(ClientError::network(reason)),
            },
            Self::GenerateRoute { seq } => Message::RouteGenerated {
                seq,
                result: Err(ClientError::network(reason)),
            },
            Self::DownloadTrack { file_name } => Message::TrackDownloaded {
                file_name,
                result: Err(ClientError::network(reason)),
            },
            Self::SaveTrack { file_name, bytes } => Message::TrackSaved {
                bytes,
                result: Err(SaveError::Write {
                    path: file_name,
                    reason,
                }),
            },
        }
    }
}

/// Logs a command without dumping track payloads.
struct CommandKind<'a>(&'a Command);

impl std::fmt::Debug for CommandKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Command::SaveTrack { file_name, bytes } => f
                .debug_struct("SaveTrack")
                .field("file_name", file_name)
                .field("bytes", &bytes.len())
                .finish(),
            other => std::fmt::Debug::fmt(other, f),
        }
    }
}
