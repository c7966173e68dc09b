#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evalcmp_core::api::{
    AppConfig, Catalog, CatalogError, CompletedFile, RunOutcome, RunnerPlugin, RunnerSession,
    RunnerStartArgs, ScoredRow, Services, SheetCodec, SheetError, Signal, TaskEvent, TaskManager,
    TaskStatus, Workbook,
};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream};
use tokio::sync::{broadcast, mpsc, watch};

/// Spreadsheet codec backed by an in-memory path → rows map.
#[derive(Default)]
pub struct MemoryCodec {
    files: Mutex<HashMap<PathBuf, Vec<ScoredRow>>>,
    encoded: Mutex<Vec<Workbook>>,
}

impl MemoryCodec {
    pub fn put(&self, path: impl Into<PathBuf>, rows: Vec<ScoredRow>) {
        self.files.lock().unwrap().insert(path.into(), rows);
    }

    pub fn last_encoded(&self) -> Option<Workbook> {
        self.encoded.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SheetCodec for MemoryCodec {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read_rows(&self, path: &Path) -> Result<Vec<ScoredRow>, SheetError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SheetError::FileMissing(path.to_path_buf()))
    }

    async fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>, SheetError> {
        self.encoded.lock().unwrap().push(workbook.clone());
        serde_json::to_vec(workbook).map_err(|e| SheetError::Encode(e.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    pub entries: Mutex<Vec<CompletedFile>>,
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list(&self) -> Result<Vec<CompletedFile>, CatalogError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn get(&self, id: &str) -> Result<Option<CompletedFile>, CatalogError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn upsert_by_name(&self, file: CompletedFile) -> Result<(), CatalogError> {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|f| f.name != file.name);
        entries.push(file);
        Ok(())
    }

    async fn remove_many(&self, ids: &[String]) -> Result<usize, CatalogError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|f| !ids.contains(&f.id));
        Ok(before - entries.len())
    }
}

/// Test-side end of a fake scorer process.
pub struct FakeControl {
    pub args: RunnerStartArgs,
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    exit: Arc<watch::Sender<Option<i32>>>,
    pub signals: Arc<Mutex<Vec<Signal>>>,
}

impl FakeControl {
    pub async fn stdout_line(&mut self, line: &str) {
        if let Some(w) = self.stdout.as_mut() {
            w.write_all(format!("{line}\n").as_bytes()).await.unwrap();
        }
    }

    pub async fn stderr_line(&mut self, line: &str) {
        if let Some(w) = self.stderr.as_mut() {
            w.write_all(format!("{line}\n").as_bytes()).await.unwrap();
        }
    }

    /// Close both pipes, then exit with `code`.
    pub fn finish(mut self, code: i32) {
        self.stdout.take();
        self.stderr.take();
        let _ = self.exit.send(Some(code));
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }
}

struct FakeSession {
    stdout: Option<DuplexStream>,
    stderr: Option<DuplexStream>,
    exit_tx: Arc<watch::Sender<Option<i32>>>,
    exit_rx: watch::Receiver<Option<i32>>,
    signals: Arc<Mutex<Vec<Signal>>>,
    ignore_term: bool,
}

#[async_trait]
impl RunnerSession for FakeSession {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()> {
        self.signals.lock().unwrap().push(signal);
        match signal {
            Signal::Term if self.ignore_term => {}
            Signal::Term => {
                let _ = self.exit_tx.send(Some(143));
            }
            Signal::Kill => {
                let _ = self.exit_tx.send(Some(137));
            }
        }
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<RunOutcome> {
        let code = *self.exit_rx.wait_for(|v| v.is_some()).await?;
        Ok(RunOutcome {
            exit_code: code.unwrap_or(-1),
            duration_ms: None,
        })
    }
}

/// Runner whose sessions are driven from the test through [`FakeControl`].
pub struct FakeRunner {
    controls: mpsc::UnboundedSender<FakeControl>,
    pub ignore_term: bool,
    pub fail_spawn: bool,
}

impl FakeRunner {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakeControl>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                controls: tx,
                ignore_term: false,
                fail_spawn: false,
            },
            rx,
        )
    }
}

#[async_trait]
impl RunnerPlugin for FakeRunner {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> anyhow::Result<Box<dyn RunnerSession>> {
        if self.fail_spawn {
            anyhow::bail!("No such file or directory (os error 2)");
        }
        let (out_w, out_r) = tokio::io::duplex(64 * 1024);
        let (err_w, err_r) = tokio::io::duplex(64 * 1024);
        let (exit_tx, exit_rx) = watch::channel(None);
        let exit_tx = Arc::new(exit_tx);
        let signals = Arc::new(Mutex::new(Vec::new()));

        let _ = self.controls.send(FakeControl {
            args: args.clone(),
            stdout: Some(out_w),
            stderr: Some(err_w),
            exit: exit_tx.clone(),
            signals: signals.clone(),
        });
        Ok(Box::new(FakeSession {
            stdout: Some(out_r),
            stderr: Some(err_r),
            exit_tx,
            exit_rx,
            signals,
            ignore_term: self.ignore_term,
        }))
    }
}

pub struct Harness {
    pub manager: TaskManager,
    pub codec: Arc<MemoryCodec>,
    pub catalog: Arc<MemoryCatalog>,
    pub controls: mpsc::UnboundedReceiver<FakeControl>,
    pub dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}

pub fn harness_with(tweak: impl FnOnce(&mut FakeRunner)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let (mut runner, controls) = FakeRunner::new();
    tweak(&mut runner);

    let mut cfg = AppConfig::default();
    cfg.scorer.stop_grace_ms = 100;
    cfg.storage.model_output_dir = dir.path().join("model_outputs").display().to_string();

    let codec = Arc::new(MemoryCodec::default());
    let catalog = Arc::new(MemoryCatalog::default());
    let services = Services {
        runner: Arc::new(runner),
        codec: codec.clone(),
        catalog: catalog.clone(),
    };
    Harness {
        manager: TaskManager::new(&cfg, services),
        codec,
        catalog,
        controls,
        dir,
    }
}

impl Harness {
    pub async fn next_control(&mut self) -> FakeControl {
        tokio::time::timeout(Duration::from_secs(5), self.controls.recv())
            .await
            .expect("runner was not started")
            .expect("runner dropped")
    }
}

/// A row carrying every required column.
pub fn row(id: u64, parent: &str, sub: &str) -> ScoredRow {
    ScoredRow::new()
        .with("id", id)
        .with("instruction", format!("q{id}"))
        .with("reference", "ref")
        .with("parent_class", parent)
        .with("subclass", sub)
        .with("model_ans", "ans")
        .with("source", "unit")
}

pub fn scored_row(id: u64, parent: &str, sub: &str, score: f64) -> ScoredRow {
    row(id, parent, sub).with("score", json!(score))
}

pub async fn next_event(
    rx: &mut broadcast::Receiver<TaskEvent>,
    name: &str,
) -> TaskEvent {
    let fut = async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.event_name() == name => return ev,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event channel closed: {e}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

pub async fn wait_for_status(manager: &TaskManager, id: &str, status: TaskStatus) {
    let fut = async {
        loop {
            if manager.get_task(id).await.unwrap().status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .unwrap_or_else(|_| panic!("task never reached {status}"));
}
