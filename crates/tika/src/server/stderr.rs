//! Background capture of a server process's standard error.
//!
//! The stream is drained continuously so a chatty JVM never blocks on a full
//! pipe. Lines are forwarded to `tracing` and the most recent ones are kept
//! for error reports.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Upper bound on retained stderr text.
const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// How long `finish` waits for the stream to reach EOF after the process died.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct Tail {
    lines: VecDeque<String>,
    bytes: usize,
}

impl Tail {
    fn push(&mut self, line: String) {
        self.bytes += line.len();
        self.lines.push_back(line);
        while self.bytes > MAX_CAPTURED_BYTES && self.lines.len() > 1 {
            if let Some(dropped) = self.lines.pop_front() {
                self.bytes -= dropped.len();
            }
        }
    }

    fn contents(&self) -> String {
        self.lines.iter().map(String::as_str).collect()
    }
}

#[derive(Debug)]
pub(crate) struct StderrCapture {
    tail: Arc<Mutex<Tail>>,
    task: JoinHandle<()>,
}

impl StderrCapture {
    pub(crate) fn spawn<R>(stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let tail = Arc::new(Mutex::new(Tail::default()));
        let sink = Arc::clone(&tail);
        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf).into_owned();
                        tracing::debug!(target: "tika::server::stderr", "{}", line.trim_end());
                        sink.lock().push(line);
                    }
                    Err(e) => {
                        tracing::debug!("Stopped reading server stderr: {}", e);
                        break;
                    }
                }
            }
        });
        Self { tail, task }
    }

    /// Text captured so far, without waiting for EOF.
    pub(crate) fn snapshot(&self) -> String {
        self.tail.lock().contents()
    }

    /// Wait briefly for the stream to close, then return everything captured.
    pub(crate) async fn finish(self) -> String {
        let Self { tail, mut task } = self;
        if tokio::time::timeout(DRAIN_TIMEOUT, &mut task).await.is_err() {
            // A grandchild may still hold the pipe open.
            task.abort();
        }
        let contents = tail.lock().contents();
        contents
    }
}
