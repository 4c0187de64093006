//! Shared harness for the engine specs.

use shepherd_comm::{Message, MessageError, Messenger, RouterListener};
use shepherd_core::constants::DEFAULT_PAYLOAD_PATH;
use shepherd_core::{JobId, JobStatus, SystemClock};
use shepherd_engine::{
    BareSheepConfig, DummySheepConfig, SheepConfig, Shepherd, ShepherdConfig,
};
use shepherd_storage::{FsStorage, Storage};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const SPEC_WAIT: Duration = Duration::from_secs(15);

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// One engine, its store, and the scratch space they live in.
pub struct Flock {
    pub temp: TempDir,
    pub storage: Arc<FsStorage>,
    pub shepherd: Arc<Shepherd<FsStorage, SystemClock>>,
}

fn build_flock(temp: TempDir, sheep: indexmap::IndexMap<String, SheepConfig>) -> Flock {
    init_tracing();
    let storage_root = temp.path().join("storage");
    std::fs::create_dir_all(&storage_root).unwrap();
    let storage = Arc::new(FsStorage::new(&storage_root));

    let config = ShepherdConfig {
        data_root: temp.path().join("data"),
        debug: false,
        status_workers: 1,
        registry: None,
        sheep,
    };
    let shepherd = Arc::new(Shepherd::new(&config, storage.clone(), SystemClock).unwrap());
    shepherd.start();
    Flock { temp, storage, shepherd }
}

/// Engine with a single dummy (in-process doubling) sheep.
pub fn dummy_flock() -> Flock {
    let mut sheep = indexmap::IndexMap::new();
    sheep.insert("sheep_a".to_string(), SheepConfig::Dummy(DummySheepConfig { port: 0 }));
    build_flock(TempDir::new().unwrap(), sheep)
}

/// Engine with a single bare sheep on the given port.
///
/// The runner command is a stand-in process (the protocol peer in these
/// specs is a [`TestWorker`] already bound on `port`); `models` name the
/// model directories to create under the sheep's working directory.
pub fn bare_flock(port: u16, command: &str, models: &[(&str, &str)]) -> Flock {
    let temp = TempDir::new().unwrap();
    let working_dir = temp.path().join("models");
    std::fs::create_dir_all(&working_dir).unwrap();
    for (name, version) in models {
        let dir = working_dir.join(name).join(version);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), b"runner: test\n").unwrap();
    }

    let mut sheep = indexmap::IndexMap::new();
    sheep.insert(
        "sheep_a".to_string(),
        SheepConfig::Bare(BareSheepConfig {
            port,
            devices: vec![],
            working_dir,
            stdout_file: None,
            stderr_file: None,
            command: command.to_string(),
        }),
    );
    build_flock(temp, sheep)
}

impl Flock {
    pub async fn seed_payload(&self, job_id: &str, payload: &[u8]) {
        let id = JobId::new(job_id);
        self.storage.init_job(&id).await.unwrap();
        self.storage.put_file(&id, DEFAULT_PAYLOAD_PATH, payload).await.unwrap();
    }

    /// Wait until the job settles, then return its stored status.
    pub async fn wait_done(&self, job_id: &str) -> JobStatus {
        let id = JobId::new(job_id);
        tokio::time::timeout(SPEC_WAIT, self.shepherd.wait_job_done(&id))
            .await
            .expect("job did not settle in time")
            .unwrap();
        self.storage.get_job_status(&id).await.unwrap().expect("settled job must have a status")
    }
}

/// How a [`TestWorker`] answers input messages.
#[derive(Clone, Copy, PartialEq)]
pub enum WorkerReply {
    /// Acknowledge every job with `Done`.
    Done,
    /// Never reply (simulates a hung or crashed runner).
    Silent,
}

/// Router-side worker standing in for a runner on a fixed port.
///
/// Records the job ids it receives, in arrival order.
pub struct TestWorker {
    pub port: u16,
    pub seen: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl TestWorker {
    pub async fn spawn(reply: WorkerReply) -> Self {
        let listener = RouterListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_task = seen.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok(channel) = listener.accept().await else { break };
                let (mut reader, mut writer) = channel.split();
                loop {
                    let envelope = match Messenger::recv(&mut reader, &[]).await {
                        Ok(envelope) => envelope,
                        Err(MessageError::Closed) => break,
                        Err(_) => break,
                    };
                    let job_id = envelope.message.job_id().clone();
                    seen_task.lock().unwrap().push(job_id.to_string());
                    if reply == WorkerReply::Done {
                        let done = Message::Done { job_id };
                        if Messenger::send(&mut writer, &done, Some(&envelope)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self { port, seen, handle }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for TestWorker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
