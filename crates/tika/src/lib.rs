//! tika - Async client for Apache Tika Server
//!
//! Talks to a Tika Server over HTTP to extract text and metadata from
//! documents, detect MIME types and languages, and list the server's parsers,
//! detectors and MIME types. It can also download a server archive and run it
//! as a child process.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tika::{Server, ServerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> tika::Result<()> {
//! tika::download_server("1.14", "tika-server-1.14.jar").await?;
//!
//! let server = Server::new("tika-server-1.14.jar", ServerConfig::default())?;
//! server.start().await?;
//!
//! let client = server.client();
//! let file = tokio::fs::File::open("document.pdf").await?;
//! println!("{}", client.parse(file).await?);
//!
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Server** (`server`): process launch, readiness polling, shutdown
//! - **Client** (`client`): one method per Tika endpoint over a generic `call`
//! - **Metadata** (`metadata`): normalization of `/rmeta` responses
//! - **Capabilities** (`capabilities`): parser and detector trees, MIME registry
//! - **Download** (`download`): archive download with checksum validation
//! - **Core** (`core`): configuration loading

#![deny(unsafe_code)]

pub mod capabilities;
pub mod client;
pub mod core;
pub mod download;
pub mod error;
pub mod metadata;
pub mod server;

pub use error::{ClientError, Result, TikaError};

pub use capabilities::{Detector, DetectorIter, MimeType, MimeTypeRegistry, Parser, ParserIter};
pub use client::{Client, ContentStream, RecursiveContentType, Translator};
pub use core::config::ServerConfig;
pub use download::{ArchiveSpec, Checksum, download_archive, download_server};
pub use metadata::{
    FieldValue, MetadataDocument, RecursiveMetadata, XTIKA_CONTENT, content_of, normalize_recursive_metadata,
};
pub use server::{CommandFactory, Server, ServerState, SystemCommand, wait_for_ready};

pub use tokio_util::sync::CancellationToken;
