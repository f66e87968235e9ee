//! Download of Tika Server archives with checksum validation.
//!
//! Released archives are fetched from Maven Central and checked against a
//! pinned hash before they are used. A file already present at the target path
//! is kept when its hash matches, so repeated downloads are cheap.
//!
//! # Example
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> tika::Result<()> {
//!     tika::download_server("1.14", "tika-server-1.14.jar").await?;
//!     Ok(())
//! }
//! ```

use crate::client::Client;
use crate::error::{Result, TikaError};
use sha2::{Digest, Sha512};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Tika Server 1.14, the version with a pinned checksum.
pub const VERSION_1_14: &str = "1.14";

/// Versions with a pinned archive hash: `(version, algorithm, hex digest)`.
const PINNED_ARCHIVES: &[(&str, HashAlgorithm, &str)] =
    &[(VERSION_1_14, HashAlgorithm::Md5, "39055fc71358d774b9da066f80b1141c")];

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashAlgorithm {
    Md5,
    Sha512,
}

/// Expected digest of an archive, as lowercase or uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    Md5(String),
    Sha512(String),
}

impl Checksum {
    fn algorithm(&self) -> HashAlgorithm {
        match self {
            Checksum::Md5(_) => HashAlgorithm::Md5,
            Checksum::Sha512(_) => HashAlgorithm::Sha512,
        }
    }

    /// Expected digest in lowercase hex.
    pub fn expected(&self) -> String {
        match self {
            Checksum::Md5(hex) | Checksum::Sha512(hex) => hex.trim().to_ascii_lowercase(),
        }
    }

    fn from_pinned(algorithm: HashAlgorithm, hex: &str) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Checksum::Md5(hex.to_string()),
            HashAlgorithm::Sha512 => Checksum::Sha512(hex.to_string()),
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checksum::Md5(_) => write!(f, "md5:{}", self.expected()),
            Checksum::Sha512(_) => write!(f, "sha512:{}", self.expected()),
        }
    }
}

/// Where to fetch an archive from and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub url: String,
    pub checksum: Checksum,
}

impl ArchiveSpec {
    /// Location and checksum of a released Tika Server version.
    ///
    /// # Errors
    ///
    /// Returns `TikaError::UnsupportedVersion` if no hash is pinned for `version`.
    pub fn for_version(version: &str) -> Result<Self> {
        let (_, algorithm, hex) = PINNED_ARCHIVES
            .iter()
            .find(|(pinned, _, _)| *pinned == version)
            .ok_or_else(|| TikaError::UnsupportedVersion(version.to_string()))?;

        Ok(Self {
            url: maven_url(version),
            checksum: Checksum::from_pinned(*algorithm, hex),
        })
    }
}

/// Versions accepted by [`download_server`].
pub fn supported_versions() -> Vec<&'static str> {
    PINNED_ARCHIVES.iter().map(|(version, _, _)| *version).collect()
}

/// Default file name of a downloaded archive, e.g. `tika-server-1.14.jar`.
pub fn default_archive_name(version: &str) -> String {
    format!("tika-server-{}.jar", version)
}

fn maven_url(version: &str) -> String {
    format!(
        "https://repo1.maven.org/maven2/org/apache/tika/tika-server/{v}/tika-server-{v}.jar",
        v = version
    )
}

/// Download Tika Server `version` to `path`, validating its checksum.
///
/// Does nothing if `path` already holds a matching archive.
///
/// # Errors
///
/// - `TikaError::UnsupportedVersion` if `version` has no pinned checksum
/// - `TikaError::Client` / `TikaError::Transport` if the download fails
/// - `TikaError::Checksum` if the downloaded file does not match; it is removed
pub async fn download_server(version: &str, path: impl AsRef<Path>) -> Result<()> {
    let spec = ArchiveSpec::for_version(version)?;
    download_archive(&spec, path).await
}

/// Download the archive described by `spec` to `path`.
///
/// See [`download_server`] for the error cases.
pub async fn download_archive(spec: &ArchiveSpec, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if tokio::fs::try_exists(path).await? {
        let actual = file_digest(path, spec.checksum.algorithm()).await?;
        if actual == spec.checksum.expected() {
            tracing::info!("Archive {} already present with matching checksum", path.display());
            return Ok(());
        }
        tracing::warn!(
            expected = %spec.checksum,
            actual = %actual,
            "Existing archive {} does not match, downloading again",
            path.display()
        );
        tokio::fs::remove_file(path).await?;
    }

    tracing::info!(url = %spec.url, "Downloading Tika server archive to {}", path.display());
    if let Err(err) = fetch(&spec.url, path).await {
        remove_partial(path).await;
        return Err(err);
    }

    let actual = file_digest(path, spec.checksum.algorithm()).await?;
    let expected = spec.checksum.expected();
    if actual != expected {
        tracing::warn!(expected = %expected, actual = %actual, "Downloaded archive failed checksum validation");
        tokio::fs::remove_file(path).await?;
        return Err(TikaError::Checksum {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    tracing::info!("Downloaded {}", path.display());
    Ok(())
}

async fn fetch(url: &str, path: &Path) -> Result<()> {
    let client = Client::new(url);
    let mut stream = client.call_stream(None, "GET", "", None).await?;
    let mut file = tokio::fs::File::create(path).await?;
    let written = stream.copy_to(&mut file).await?;
    file.sync_all().await?;
    tracing::debug!(bytes = written, "Saved archive");
    Ok(())
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("Failed to remove partial download {}: {}", path.display(), e);
    }
}

async fn file_digest(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || digest_file(&path, algorithm))
        .await
        .map_err(|e| TikaError::Io(std::io::Error::other(e)))?
}

fn digest_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    match algorithm {
        HashAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                context.consume(&buf[..n]);
            }
            Ok(format!("{:x}", context.compute()))
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}
