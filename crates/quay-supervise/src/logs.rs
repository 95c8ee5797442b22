//! Cancellable, bounded log streaming

use std::future::Future;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the line buffer between the producer task and the
/// consumer. Producers `try_send` and drop lines beyond this rather
/// than block a lagging consumer.
pub const LOG_BUFFER_LINES: usize = 100;

const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A lazy sequence of log lines produced by a background task.
///
/// Infinite while following, finite otherwise. [`LogStream::cancel`]
/// (or dropping the stream) signals the producer to terminate the
/// underlying read or child process, after which the sequence ends.
#[derive(Debug)]
pub struct LogStream {
    rx: mpsc::Receiver<String>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LogStream {
    /// Spawn a producer task. The factory receives the bounded line
    /// sender and the stop signal receiver.
    pub fn spawn<F, Fut>(factory: F) -> Self
    where
        F: FnOnce(mpsc::Sender<String>, watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LOG_BUFFER_LINES);
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(factory(tx, stop_rx));
        Self { rx, stop, task }
    }

    /// Next log line, or `None` once the stream has ended
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Signal the producer to stop; the stream ends shortly after
    pub fn cancel(&self) {
        let _ = self.stop.send(true);
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
        self.task.abort();
    }
}

/// Produce the last `tail` lines of a file, then (when following) poll
/// for appended lines until cancelled. Handles truncation by rereading
/// from the start of the file.
pub(crate) async fn tail_file(
    path: PathBuf,
    tail: usize,
    follow: bool,
    tx: mpsc::Sender<String>,
    mut stop: watch::Receiver<bool>,
) {
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(_) => return,
    };
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(tail);
    for line in &lines[start..] {
        let _ = tx.try_send((*line).to_string());
    }
    if !follow {
        return;
    }

    let mut offset = content.len() as u64;
    let mut carry = String::new();
    loop {
        tokio::select! {
            _ = stop.changed() => return,
            _ = tokio::time::sleep(FOLLOW_POLL_INTERVAL) => {}
        }
        if *stop.borrow() {
            return;
        }

        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(_) => continue,
        };
        let len = match file.metadata().await {
            Ok(meta) => meta.len(),
            Err(_) => continue,
        };
        if len < offset {
            // File truncated or rotated; start over.
            offset = 0;
            carry.clear();
        }
        if len == offset {
            continue;
        }
        if file.seek(SeekFrom::Start(offset)).await.is_err() {
            continue;
        }
        let mut appended = String::new();
        if file.read_to_string(&mut appended).await.is_err() {
            continue;
        }
        offset = len;
        carry.push_str(&appended);
        while let Some(pos) = carry.find('\n') {
            let line = carry[..pos].to_string();
            carry.drain(..=pos);
            let _ = tx.try_send(line);
        }
    }
}
