//! Tika Server process management.
//!
//! Launches `java -jar tika-server.jar -p <port>`, waits for it to answer
//! `/version`, and tears it down again. There is no need for a [`Server`] when
//! a Tika Server is already running; point a [`Client`] at its URL instead.
//!
//! # Example
//!
//! ```no_run
//! use tika::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> tika::Result<()> {
//!     let server = Server::new("tika-server-1.14.jar", ServerConfig::default())?;
//!     server.start().await?;
//!
//!     let version = server.client().version().await?;
//!     println!("{}", version);
//!
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Failure reporting
//!
//! When the process never becomes ready, it is killed and the returned
//! `TikaError::Startup` holds both the last readiness failure and whatever the
//! process wrote to stderr. The JVM's own output is usually the only clue to
//! why it did not come up.
//!
//! # Process spawning
//!
//! The command is built by a [`CommandFactory`] passed in at construction.
//! [`SystemCommand`] runs the real program; tests substitute their own.

mod readiness;
mod stderr;

pub use readiness::{POLL_INTERVAL, wait_for_ready};

use crate::client::Client;
use crate::core::config::ServerConfig;
use crate::error::{Result, TikaError};
use reqwest::Url;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use stderr::StderrCapture;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Per-attempt timeout for readiness requests.
const READY_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Builds the command that runs the server.
///
/// `program` is the configured Java runtime and `args` the full argument list
/// (`-D` properties, `-jar <archive>`, `-p <port>`). Implemented for closures
/// with the matching signature.
pub trait CommandFactory: Send + Sync {
    fn command(&self, program: &str, args: &[String]) -> Command;
}

impl<F> CommandFactory for F
where
    F: Fn(&str, &[String]) -> Command + Send + Sync,
{
    fn command(&self, program: &str, args: &[String]) -> Command {
        self(program, args)
    }
}

/// Runs `program` with `args` as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommand;

impl CommandFactory for SystemCommand {
    fn command(&self, program: &str, args: &[String]) -> Command {
        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

/// Lifecycle of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Created, `start` not called yet.
    Idle,
    Starting,
    Ready,
    /// Startup failed; the process has been killed.
    Failed,
    Stopped,
}

struct Running {
    child: Child,
    stderr: Option<StderrCapture>,
}

struct Inner {
    state: ServerState,
    running: Option<Running>,
}

/// A Tika Server process owned by this handle.
///
/// Create one with [`Server::new`], launch it with [`Server::start`] and shut
/// it down with [`Server::stop`]. The process is also killed when the handle
/// is dropped.
pub struct Server {
    archive: PathBuf,
    config: ServerConfig,
    url: String,
    command_factory: Arc<dyn CommandFactory>,
    inner: RwLock<Inner>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("archive", &self.archive)
            .field("url", &self.url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Create a server handle for the archive at `archive`.
    ///
    /// # Errors
    ///
    /// Returns `TikaError::Validation` if `archive` is empty or does not exist,
    /// or if `hostname` and `port` do not form a valid URL.
    pub fn new(archive: impl AsRef<Path>, config: ServerConfig) -> Result<Self> {
        Self::with_command_factory(archive, config, Arc::new(SystemCommand))
    }

    /// Like [`new`](Self::new), with a custom [`CommandFactory`].
    pub fn with_command_factory(
        archive: impl AsRef<Path>,
        config: ServerConfig,
        command_factory: Arc<dyn CommandFactory>,
    ) -> Result<Self> {
        let archive = archive.as_ref();
        if archive.as_os_str().is_empty() {
            return Err(TikaError::validation("no jar file specified"));
        }
        if !archive.exists() {
            return Err(TikaError::validation(format!(
                "jar file not found: {}",
                archive.display()
            )));
        }

        let url = server_url(&config.hostname, config.port)?;

        Ok(Self {
            archive: archive.to_path_buf(),
            config,
            url,
            command_factory,
            inner: RwLock::new(Inner {
                state: ServerState::Idle,
                running: None,
            }),
        })
    }

    /// URL of this server, e.g. `http://localhost:9998`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// A client for this server.
    pub fn client(&self) -> Client {
        Client::new(&self.url)
    }

    pub async fn state(&self) -> ServerState {
        self.inner.read().await.state
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == ServerState::Ready
    }

    /// Stderr written by the running process so far.
    pub async fn captured_stderr(&self) -> String {
        let inner = self.inner.read().await;
        inner
            .running
            .as_ref()
            .and_then(|running| running.stderr.as_ref())
            .map(StderrCapture::snapshot)
            .unwrap_or_default()
    }

    /// Arguments passed to the Java runtime.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .config
            .java_props
            .iter()
            .map(|(key, value)| format!("-D{}={}", key, value))
            .collect();
        args.push("-jar".to_string());
        args.push(self.archive.to_string_lossy().into_owned());
        args.push("-p".to_string());
        args.push(self.config.port.to_string());
        args
    }

    /// Start the server process and wait until it is ready.
    ///
    /// Waits at most `startup_timeout_secs` from the configuration.
    pub async fn start(&self) -> Result<()> {
        self.start_with_cancellation(CancellationToken::new()).await
    }

    /// Like [`start`](Self::start), but also gives up once `cancel` fires.
    ///
    /// # Errors
    ///
    /// - `TikaError::InvalidState` if the server is already running
    /// - `TikaError::Validation` if the archive no longer exists
    /// - `TikaError::Startup` if the process could not be spawned, exited
    ///   early, or did not become ready in time
    pub async fn start_with_cancellation(&self, cancel: CancellationToken) -> Result<()> {
        let mut inner = self.inner.write().await;
        if matches!(inner.state, ServerState::Starting | ServerState::Ready) {
            return Err(TikaError::InvalidState(format!(
                "server at {} is already started",
                self.url
            )));
        }
        if !self.archive.exists() {
            return Err(TikaError::validation(format!(
                "jar file not found: {}",
                self.archive.display()
            )));
        }

        let http = reqwest::Client::builder().timeout(READY_REQUEST_TIMEOUT).build()?;
        let ready_client = Client::with_http_client(http, &self.url);

        let args = self.launch_args();
        let mut command = self.command_factory.command(&self.config.java_path, &args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                inner.state = ServerState::Failed;
                return Err(TikaError::Startup {
                    message: format!("failed to spawn {}: {}", self.config.java_path, e),
                    stderr: String::new(),
                    source: Some(Box::new(e)),
                });
            }
        };
        let stderr = child.stderr.take().map(StderrCapture::spawn);
        inner.state = ServerState::Starting;
        tracing::info!(
            url = %self.url,
            archive = %self.archive.display(),
            pid = child.id(),
            "Launched Tika server, waiting for readiness"
        );

        let timeout = self.config.startup_timeout();

        let outcome = tokio::select! {
            ready = wait_for_ready(&ready_client, timeout, &cancel) => ready,
            status = child.wait() => Err(early_exit(status)),
        };

        match outcome {
            Ok(()) => {
                inner.running = Some(Running { child, stderr });
                inner.state = ServerState::Ready;
                Ok(())
            }
            Err(err) => {
                if !matches!(child.try_wait(), Ok(Some(_)))
                    && let Err(kill_err) = child.kill().await
                {
                    tracing::warn!("Failed to kill Tika server after failed startup: {}", kill_err);
                }
                let captured = match stderr {
                    Some(capture) => capture.finish().await,
                    None => String::new(),
                };
                inner.state = ServerState::Failed;
                tracing::warn!(url = %self.url, "Tika server failed to start: {}", err);
                Err(attach_stderr(err, captured))
            }
        }
    }

    /// Kill the server process and wait for it to exit.
    ///
    /// Stopping an already stopped (or failed) server is a no-op.
    ///
    /// # Errors
    ///
    /// - `TikaError::InvalidState` if `start` was never called
    /// - `TikaError::Io` if the process could not be killed or waited on
    pub async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.state {
            ServerState::Idle => {
                return Err(TikaError::InvalidState(
                    "stop called on a server that was never started; call start first".to_string(),
                ));
            }
            ServerState::Stopped | ServerState::Failed => return Ok(()),
            ServerState::Starting | ServerState::Ready => {}
        }

        inner.state = ServerState::Stopped;
        let Some(Running { mut child, stderr }) = inner.running.take() else {
            return Ok(());
        };

        let result = match child.try_wait() {
            Ok(Some(status)) => {
                tracing::info!(url = %self.url, %status, "Tika server had already exited");
                Ok(())
            }
            _ => child.kill().await.map_err(TikaError::Io),
        };

        if let Some(capture) = stderr {
            capture.finish().await;
        }
        tracing::info!(url = %self.url, "Stopped Tika server");
        result
    }
}

fn server_url(hostname: &str, port: u16) -> Result<String> {
    let raw = format!("http://{}:{}", hostname, port);
    let url = Url::parse(&raw).map_err(|e| TikaError::validation_with_source(format!("invalid url {:?}", raw), e))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(TikaError::validation(format!("invalid url {:?}: missing host", raw)));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn early_exit(status: std::io::Result<ExitStatus>) -> TikaError {
    match status {
        Ok(status) => TikaError::startup(format!("server process exited before becoming ready ({})", status), ""),
        Err(e) => TikaError::Startup {
            message: format!("failed to wait for server process: {}", e),
            stderr: String::new(),
            source: Some(Box::new(e)),
        },
    }
}

fn attach_stderr(err: TikaError, captured: String) -> TikaError {
    match err {
        TikaError::Startup {
            message,
            mut stderr,
            source,
        } => {
            stderr.push_str(&captured);
            TikaError::Startup {
                message,
                stderr,
                source,
            }
        }
        other => TikaError::Startup {
            message: other.to_string(),
            stderr: captured,
            source: Some(Box::new(other)),
        },
    }
}
