use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::progress::LineBuffer;
use crate::util::RingBytes;

/// 一行子进程输出，标明来源流
#[derive(Debug)]
pub struct LineTap {
    pub line: String,
    pub stream: LineStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStream {
    Stdout,
    Stderr,
}

impl LineStream {
    fn label(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

pub type PumpHandle = JoinHandle<Result<u64, RunnerError>>;

pub fn pump_stdout<R>(rd: R, ring: Option<Arc<RingBytes>>, line_tx: mpsc::Sender<LineTap>) -> PumpHandle
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(pump_lines(rd, LineStream::Stdout, ring, line_tx))
}

pub fn pump_stderr<R>(rd: R, ring: Option<Arc<RingBytes>>, line_tx: mpsc::Sender<LineTap>) -> PumpHandle
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(pump_lines(rd, LineStream::Stderr, ring, line_tx))
}

/// Split `rd` into lines until EOF; returns the byte count read.
///
/// Reading continues after the receiver is dropped so the child never
/// blocks on a full pipe. A trailing line without `\n` is flushed at EOF.
async fn pump_lines<R>(
    mut rd: R,
    stream: LineStream,
    ring: Option<Arc<RingBytes>>,
    line_tx: mpsc::Sender<LineTap>,
) -> Result<u64, RunnerError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; 16 * 1024];
    let mut lines = LineBuffer::new();
    let mut total = 0u64;

    loop {
        let n = rd
            .read(&mut chunk)
            .await
            .map_err(|source| RunnerError::StreamIo {
                stream: stream.label(),
                source,
            })?;
        if n == 0 {
            break;
        }
        total += n as u64;
        if let Some(ring) = &ring {
            ring.push(&chunk[..n]);
        }
        for line in lines.push(&chunk[..n]) {
            let _ = line_tx.send(LineTap { line, stream }).await;
        }
    }

    if let Some(line) = lines.finish() {
        let _ = line_tx.send(LineTap { line, stream }).await;
    }
    Ok(total)
}
