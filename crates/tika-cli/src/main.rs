//! Tika command-line interface.
//!
//! Runs one action against a Tika Server, either one already running at
//! `--server-url` or one started from `--server-jar` for the duration of the
//! command. Results go to stdout, logs to stderr (filtered with `RUST_LOG`).

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tika::{Client, Server, ServerConfig};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Extract plain text
    Parse,
    /// Detect the MIME type
    Detect,
    /// Identify the language
    Language,
    /// Extract metadata
    Meta,
    /// Print the server version
    Version,
    /// List the parser tree as JSON
    Parsers,
    /// List known MIME types as JSON
    #[value(name = "mimetypes")]
    MimeTypes,
    /// List the detector tree as JSON
    Detectors,
}

impl Action {
    fn needs_input(self) -> bool {
        matches!(self, Action::Parse | Action::Detect | Action::Language | Action::Meta)
    }
}

#[derive(Debug, Parser)]
#[command(name = "tika")]
#[command(version, about = "Extract text and metadata with Apache Tika Server", long_about = None)]
struct Cli {
    #[arg(value_enum)]
    action: Action,

    /// Path to the file to process
    #[arg(long)]
    filename: Option<PathBuf>,

    /// Single metadata field to get with `meta`
    #[arg(long, conflicts_with = "recursive")]
    field: Option<String>,

    /// Run `parse` or `meta` over embedded documents too, one entry per document
    #[arg(long)]
    recursive: bool,

    /// Server archive to start for this command; takes precedence over --server-url
    #[arg(long)]
    server_jar: Option<PathBuf>,

    /// URL of a running Tika Server
    #[arg(long)]
    server_url: Option<String>,

    /// Download this server version first (to --server-jar, or tika-server-<VERSION>.jar)
    #[arg(long)]
    download_version: Option<String>,

    /// Server configuration file (.toml, .yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut cli = Cli::parse();

    if cli.action.needs_input() && cli.filename.is_none() {
        bail!("you must provide an input file with --filename for `{}`", action_name(cli.action));
    }

    if let Some(version) = cli.download_version.as_deref() {
        let jar = cli
            .server_jar
            .get_or_insert_with(|| PathBuf::from(tika::download::default_archive_name(version)));
        tika::download_server(version, jar.as_path())
            .await
            .with_context(|| format!("failed to download Tika Server {}", version))?;
    }

    let server = match cli.server_jar.as_deref() {
        Some(jar) => {
            let config = load_config(cli.config.as_deref())?;
            let server = Server::new(jar, config)?;
            server.start().await.context("could not start server")?;
            Some(server)
        }
        None => None,
    };

    let url = match (&server, cli.server_url.as_deref()) {
        (Some(server), _) => server.url().to_string(),
        (None, Some(url)) => url.to_string(),
        (None, None) => bail!("no server specified: set --server-url, --server-jar and/or --download-version"),
    };

    let result = run(&cli, &Client::new(url), &mut tokio::io::stdout()).await;

    if let Some(server) = server
        && let Err(e) = server.stop().await
    {
        tracing::warn!("Failed to stop Tika server: {}", e);
    }

    result.with_context(|| format!("tika {} failed", action_name(cli.action)))
}

fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    match path {
        Some(path) => Ok(ServerConfig::from_file(path)?),
        None => Ok(ServerConfig::discover()?.unwrap_or_default()),
    }
}

fn action_name(action: Action) -> String {
    action
        .to_possible_value()
        .map(|value| value.get_name().to_string())
        .unwrap_or_default()
}

async fn open_input(cli: &Cli) -> Result<tokio::fs::File> {
    let path = cli.filename.as_deref().context("no input file")?;
    tokio::fs::File::open(path)
        .await
        .with_context(|| format!("error opening {}", path.display()))
}

async fn run<W>(cli: &Cli, client: &Client, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = match cli.action {
        Action::Parse if cli.recursive => client.parse_recursive(open_input(cli).await?).await?.join("\n"),
        Action::Parse => {
            let mut stream = client.parse_stream(open_input(cli).await?).await?;
            stream.copy_to(out).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
            return Ok(());
        }
        Action::Detect => client.detect(open_input(cli).await?).await?,
        Action::Language => client.language(open_input(cli).await?).await?,
        Action::Meta => match (&cli.field, cli.recursive) {
            (Some(field), _) => client.meta_field(open_input(cli).await?, field).await?,
            (None, true) => to_string_pretty(&client.meta_recursive(open_input(cli).await?).await?)?,
            (None, false) => client.meta(open_input(cli).await?).await?,
        },
        Action::Version => client.version().await?,
        Action::Parsers => to_string_pretty(&client.parsers().await?)?,
        Action::MimeTypes => to_string_pretty(&client.mime_types().await?)?,
        Action::Detectors => to_string_pretty(&client.detectors().await?)?,
    };

    out.write_all(body.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}
