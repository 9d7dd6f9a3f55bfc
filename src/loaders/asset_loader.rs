//! Asynchronous, name-addressed asset loading.
//!
//! A load request resolves the asset name to a path, fetches it off the
//! caller's thread and reports exactly one [`LoadCompletion`] through the
//! registered [`CompletionSender`]. Completions arrive on the channel in the
//! order the loads finished, not the order they were issued.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;

use crate::asset::AssetHandle;
use crate::error::LoadError;

/// Fixed `<directory>/<name>.<extension>` naming template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    directory: PathBuf,
    extension: String,
}

impl AssetPath {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    /// Path for `name`; names must be non-empty single path components
    /// without surrounding whitespace
    pub fn resolve(&self, name: &str) -> Result<PathBuf, LoadError> {
        if name.is_empty()
            || name != name.trim()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return Err(LoadError::InvalidName(name.to_string()));
        }
        Ok(self.directory.join(format!("{}.{}", name, self.extension)))
    }
}

impl Default for AssetPath {
    fn default() -> Self {
        Self::new("assets", "glb")
    }
}

/// Blocking fetch-and-decode of one asset
pub trait AssetSource: Send + Sync + 'static {
    fn fetch(&self, name: &str, path: &Path) -> Result<AssetHandle, LoadError>;
}

/// Identifies one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub name: String,
    pub result: Result<AssetHandle, LoadError>,
}

/// Creates a linked sender/receiver pair for load completions
pub fn completion_channel() -> (CompletionSender, LoadCompletions) {
    let (tx, rx) = mpsc::unbounded();
    (CompletionSender(tx), LoadCompletions(rx))
}

/// Sending half handed to loaders
#[derive(Debug, Clone)]
pub struct CompletionSender(UnboundedSender<LoadCompletion>);

impl CompletionSender {
    /// Deliver a completion; returns false once the receiver is gone
    pub fn complete(&self, completion: LoadCompletion) -> bool {
        self.0.unbounded_send(completion).is_ok()
    }
}

/// Receiving half drained by the session
#[derive(Debug)]
pub struct LoadCompletions(UnboundedReceiver<LoadCompletion>);

impl LoadCompletions {
    /// Next completion if one has already arrived
    pub fn try_next(&mut self) -> Option<LoadCompletion> {
        self.0.try_next().ok().flatten()
    }

    /// Every completion that has already arrived, in arrival order
    pub fn drain(&mut self) -> Vec<LoadCompletion> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait for the next completion; `None` once every sender is dropped
    pub async fn next(&mut self) -> Option<LoadCompletion> {
        self.0.next().await
    }
}

/// Issues asset loads; completions go to the registered sender
pub trait AssetLoader {
    /// Register the completion destination, replacing any earlier one
    fn register(&mut self, completions: CompletionSender);

    /// Start loading `name`; never blocks and never cancels earlier loads
    fn load(&mut self, name: &str) -> LoadTicket;
}

/// Loader running each request on its own worker thread
pub struct ThreadedLoader<S: AssetSource> {
    source: Arc<S>,
    paths: AssetPath,
    completions: Option<CompletionSender>,
    next_ticket: u64,
}

impl<S: AssetSource> ThreadedLoader<S> {
    pub fn new(source: S, paths: AssetPath) -> Self {
        Self {
            source: Arc::new(source),
            paths,
            completions: None,
            next_ticket: 1,
        }
    }

    pub fn paths(&self) -> &AssetPath {
        &self.paths
    }
}

impl<S: AssetSource> AssetLoader for ThreadedLoader<S> {
    fn register(&mut self, completions: CompletionSender) {
        self.completions = Some(completions);
    }

    fn load(&mut self, name: &str) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        let Some(sender) = self.completions.clone() else {
            log::warn!("Load of {:?} issued with no completion receiver registered", name);
            return ticket;
        };
        let name = name.to_string();

        let path = match self.paths.resolve(&name) {
            Ok(path) => path,
            Err(e) => {
                sender.complete(LoadCompletion {
                    ticket,
                    name,
                    result: Err(e),
                });
                return ticket;
            }
        };

        log::info!("Loading asset {:?} from {:?}", name, path);
        let source = Arc::clone(&self.source);
        let worker_sender = sender.clone();
        let worker_name = name.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("asset-load-{}", ticket.0))
            .spawn(move || {
                let result = source.fetch(&worker_name, &path);
                let delivered = worker_sender.complete(LoadCompletion {
                    ticket,
                    name: worker_name,
                    result,
                });
                if !delivered {
                    log::debug!("Load {:?} finished after its receiver closed", ticket);
                }
            });

        if let Err(e) = spawned {
            sender.complete(LoadCompletion {
                ticket,
                name,
                result: Err(LoadError::Worker(e.to_string())),
            });
        }
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ObjectGraph;
    use futures::executor::block_on;
    use std::sync::mpsc;
    use std::sync::Mutex;

    struct MemorySource;

    impl AssetSource for MemorySource {
        fn fetch(&self, name: &str, path: &Path) -> Result<AssetHandle, LoadError> {
            if name == "Missing" {
                return Err(LoadError::NotFound(path.to_path_buf()));
            }
            Ok(AssetHandle::new(name, ObjectGraph::new(vec![], vec![], vec![]), vec![]))
        }
    }

    /// Blocks each fetch until the test releases that name
    struct GatedSource {
        gates: Mutex<Vec<(String, mpsc::Receiver<()>)>>,
    }

    impl AssetSource for GatedSource {
        fn fetch(&self, name: &str, _path: &Path) -> Result<AssetHandle, LoadError> {
            let gate = {
                let mut gates = self.gates.lock().unwrap();
                let idx = gates.iter().position(|(n, _)| n == name).unwrap();
                gates.remove(idx).1
            };
            gate.recv().unwrap();
            Ok(AssetHandle::new(name, ObjectGraph::new(vec![], vec![], vec![]), vec![]))
        }
    }

    #[test]
    fn test_resolve_uses_template() {
        let paths = AssetPath::new("fbx", "fbx");
        assert_eq!(
            paths.resolve("Samba Dancing").unwrap(),
            PathBuf::from("fbx").join("Samba Dancing.fbx")
        );
    }

    #[test]
    fn test_resolve_rejects_bad_names() {
        let paths = AssetPath::default();
        for bad in ["", "   ", "..", "../secret", "a/b", "a\\b", "  Walk", "Walk\n"] {
            assert!(matches!(paths.resolve(bad), Err(LoadError::InvalidName(_))), "{bad:?}");
        }
    }

    #[test]
    fn test_load_delivers_one_completion() {
        let (tx, mut rx) = completion_channel();
        let mut loader = ThreadedLoader::new(MemorySource, AssetPath::default());
        loader.register(tx);

        let ticket = loader.load("Walk");
        drop(loader);

        let completion = block_on(rx.next()).unwrap();
        assert_eq!(completion.ticket, ticket);
        assert_eq!(completion.result.unwrap().name(), "Walk");
        assert!(block_on(rx.next()).is_none());
    }

    #[test]
    fn test_failure_is_scoped_to_request() {
        let (tx, mut rx) = completion_channel();
        let mut loader = ThreadedLoader::new(MemorySource, AssetPath::default());
        loader.register(tx);

        let missing = loader.load("Missing");
        let invalid = loader.load("");
        drop(loader);

        let mut completions = vec![block_on(rx.next()).unwrap(), block_on(rx.next()).unwrap()];
        completions.sort_by_key(|c| c.ticket);

        assert_eq!(completions[0].ticket, missing);
        assert!(matches!(completions[0].result, Err(LoadError::NotFound(_))));
        assert_eq!(completions[1].ticket, invalid);
        assert!(matches!(completions[1].result, Err(LoadError::InvalidName(_))));
    }

    #[test]
    fn test_completions_arrive_in_completion_order() {
        let (release_walk, walk_gate) = mpsc::channel();
        let (release_run, run_gate) = mpsc::channel();
        let source = GatedSource {
            gates: Mutex::new(vec![("Walk".into(), walk_gate), ("Run".into(), run_gate)]),
        };
        let (tx, mut rx) = completion_channel();
        let mut loader = ThreadedLoader::new(source, AssetPath::default());
        loader.register(tx);

        let walk = loader.load("Walk");
        let run = loader.load("Run");

        release_run.send(()).unwrap();
        let first = block_on(rx.next()).unwrap();
        release_walk.send(()).unwrap();
        let second = block_on(rx.next()).unwrap();

        assert_eq!(first.ticket, run);
        assert_eq!(second.ticket, walk);
    }

    #[test]
    fn test_unregistered_loader_drops_request() {
        let mut loader = ThreadedLoader::new(MemorySource, AssetPath::default());
        let a = loader.load("Walk");
        let b = loader.load("Walk");
        assert_ne!(a, b);
    }

    #[test]
    fn test_closed_receiver_is_silent() {
        let (tx, rx) = completion_channel();
        drop(rx);
        assert!(!tx.complete(LoadCompletion {
            ticket: LoadTicket(1),
            name: "Walk".into(),
            result: Err(LoadError::InvalidName(String::new())),
        }));
    }

    #[test]
    fn test_drain_empties_ready_completions() {
        let (tx, mut rx) = completion_channel();
        for i in 0..3 {
            tx.complete(LoadCompletion {
                ticket: LoadTicket(i),
                name: format!("a{i}"),
                result: Err(LoadError::InvalidName(String::new())),
            });
        }

        let drained = rx.drain();
        assert_eq!(drained.iter().map(|c| c.ticket.0).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(rx.try_next().is_none());
    }
}
