//! Background model loading
//!
//! Parsing a large OBJ can take a while, so models are loaded on a worker
//! thread and handed back to the event loop through a channel. Every
//! request gets a generation number; only the result of the most recent
//! request is delivered, results of superseded requests are dropped when
//! they arrive. Running workers are never cancelled.

use std::path::{Path, PathBuf};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use super::model::{load_model, ModelData};
use crate::{
    config::ImportSettings,
    error::{Result, StudioError},
};

/// Outcome of the most recent load request
#[derive(Debug)]
pub enum LoadEvent {
    Loaded(ModelData),
    Failed { path: PathBuf, error: StudioError },
}

struct LoadOutcome {
    generation: u64,
    path: PathBuf,
    result: Result<ModelData>,
}

pub struct ModelLoader {
    import: ImportSettings,
    sender: UnboundedSender<LoadOutcome>,
    receiver: UnboundedReceiver<LoadOutcome>,
    next_generation: u64,
    pending: Option<(u64, PathBuf)>,
}

impl ModelLoader {
    pub fn new(import: ImportSettings) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            import,
            sender,
            receiver,
            next_generation: 0,
            pending: None,
        }
    }

    /// Starts loading `path` in the background and supersedes any earlier
    /// request. Returns the generation of the new request.
    pub fn request(&mut self, path: impl AsRef<Path>) -> u64 {
        let path = path.as_ref().to_path_buf();
        self.next_generation += 1;
        let generation = self.next_generation;

        if let Some((_, previous)) = &self.pending {
            log::debug!(
                "Load of {} superseded by {}",
                previous.display(),
                path.display()
            );
        }
        self.pending = Some((generation, path.clone()));

        let sender = self.sender.clone();
        let import = self.import.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("model-loader-{}", generation))
            .spawn(move || {
                let result = load_model(&path, &import);
                // The receiver only goes away with the loader itself
                let _ = sender.unbounded_send(LoadOutcome {
                    generation,
                    path,
                    result,
                });
            });

        if let Err(err) = spawned {
            log::error!("Failed to spawn model loader thread: {}", err);
            let path = self
                .pending
                .as_ref()
                .map(|(_, p)| p.clone())
                .unwrap_or_default();
            let _ = self.sender.unbounded_send(LoadOutcome {
                generation,
                path: path.clone(),
                result: Err(StudioError::io(path, err)),
            });
        }

        generation
    }

    /// Drains finished loads without blocking. Returns the result of the
    /// latest request once it is available.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        let mut delivered = None;

        while let Ok(outcome) = self.receiver.try_recv() {
            let is_latest = matches!(self.pending, Some((generation, _)) if generation == outcome.generation);
            if !is_latest {
                log::debug!(
                    "Discarding stale load of {} (generation {})",
                    outcome.path.display(),
                    outcome.generation
                );
                continue;
            }

            self.pending = None;
            delivered = Some(match outcome.result {
                Ok(model) => LoadEvent::Loaded(model),
                Err(error) => LoadEvent::Failed {
                    path: outcome.path,
                    error,
                },
            });
        }

        delivered
    }

    /// Blocks until the latest request finishes
    pub fn wait(&mut self) -> Result<LoadEvent> {
        use futures::StreamExt;

        if self.pending.is_none() {
            return Err(StudioError::LoaderDisconnected);
        }
        loop {
            if let Some(event) = self.poll() {
                return Ok(event);
            }
            let outcome = futures::executor::block_on(self.receiver.next())
                .ok_or(StudioError::LoaderDisconnected)?;
            let is_latest = matches!(self.pending, Some((generation, _)) if generation == outcome.generation);
            if is_latest {
                self.pending = None;
                return Ok(match outcome.result {
                    Ok(model) => LoadEvent::Loaded(model),
                    Err(error) => LoadEvent::Failed {
                        path: outcome.path,
                        error,
                    },
                });
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}
