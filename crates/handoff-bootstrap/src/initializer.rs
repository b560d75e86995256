//! The initialization procedure run by the module host.
//!
//! [`ModuleInitializer`] is the single seam between the bootstrap protocol and
//! whatever the shared module actually is. [`ArtifactInitializer`] is the
//! shipped implementation: it loads a WebAssembly artifact from disk, checks
//! its header, and publishes the bytes through a write-once [`ModuleSlot`].

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::debug;

use crate::INITIALIZER_TARGET;

/// WebAssembly binary magic number.
const WASM_MAGIC: [u8; 4] = *b"\0asm";

/// WebAssembly binary format version 1, as stored in the header.
const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Boxed future returned by [`ModuleInitializer::initialize`].
pub type InitFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ModuleInitError>> + Send + 'a>>;

/// Errors raised by an initialization attempt.
///
/// The display text is what every caller receives as the failure message.
#[derive(Debug, Clone, Error)]
pub enum ModuleInitError {
    /// The artifact could not be read.
    #[error("failed to read module artifact '{path}': {source}")]
    Read {
        /// Artifact path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The artifact is shorter than a module header.
    #[error("module artifact '{path}' is truncated ({len} bytes)")]
    Truncated {
        /// Artifact path.
        path: Utf8PathBuf,
        /// Bytes present.
        len: usize,
    },
    /// The artifact does not start with the WebAssembly magic number.
    #[error("module artifact '{path}' is not a WebAssembly binary")]
    InvalidMagic {
        /// Artifact path.
        path: Utf8PathBuf,
    },
    /// The artifact uses an unsupported binary format version.
    #[error("module artifact '{path}' has unsupported version {version:?}")]
    UnsupportedVersion {
        /// Artifact path.
        path: Utf8PathBuf,
        /// Raw version bytes from the header.
        version: [u8; 4],
    },
    /// The module slot was already filled.
    #[error("module slot is already populated")]
    AlreadyLoaded,
    /// The initialization task stopped without reporting a result.
    #[error("module initialization aborted: {message}")]
    Aborted {
        /// Description of the abort.
        message: String,
    },
    /// An initializer-specific failure, reported verbatim.
    #[error("{message}")]
    Failed {
        /// Failure message.
        message: String,
    },
}

impl ModuleInitError {
    /// Builds a failure reported to callers exactly as `message`.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Builds an abort error.
    #[must_use]
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }
}

/// One-shot initialization procedure for the shared module.
///
/// The host calls [`initialize`](Self::initialize) at most once per protocol
/// instance.
pub trait ModuleInitializer: Send + Sync + 'static {
    /// Brings the module into a usable state.
    fn initialize(&self) -> InitFuture<'_>;
}

impl<T> ModuleInitializer for Arc<T>
where
    T: ModuleInitializer + ?Sized,
{
    fn initialize(&self) -> InitFuture<'_> {
        (**self).initialize()
    }
}

/// A validated module image.
#[derive(Clone, PartialEq, Eq)]
pub struct LoadedModule {
    path: Utf8PathBuf,
    bytes: Vec<u8>,
}

impl LoadedModule {
    /// Path the module was loaded from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Raw module bytes, header included.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoadedModule")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Write-once cell holding the loaded module.
///
/// Clones share the same cell. The cell is filled before the host reports
/// `Ready`, so a caller that has seen a successful result always observes a
/// complete module.
#[derive(Debug, Clone, Default)]
pub struct ModuleSlot {
    cell: Arc<OnceCell<LoadedModule>>,
}

impl ModuleSlot {
    /// Returns the module once it has been published.
    #[must_use]
    pub fn get(&self) -> Option<&LoadedModule> {
        self.cell.get()
    }

    fn publish(&self, module: LoadedModule) -> Result<(), ModuleInitError> {
        self.cell
            .set(module)
            .map_err(|_| ModuleInitError::AlreadyLoaded)
    }
}

/// Loads a WebAssembly artifact from disk.
#[derive(Debug, Clone)]
pub struct ArtifactInitializer {
    path: Utf8PathBuf,
    slot: ModuleSlot,
}

impl ArtifactInitializer {
    /// Creates an initializer for the artifact at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: ModuleSlot::default(),
        }
    }

    /// Artifact location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Slot that receives the module once loaded.
    #[must_use]
    pub fn slot(&self) -> ModuleSlot {
        self.slot.clone()
    }

    async fn load(&self) -> Result<(), ModuleInitError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ModuleInitError::Read {
                path: self.path.clone(),
                source: Arc::new(source),
            })?;
        validate_header(&self.path, &bytes)?;
        debug!(
            target: INITIALIZER_TARGET,
            path = %self.path,
            len = bytes.len(),
            "validated module artifact"
        );
        self.slot.publish(LoadedModule {
            path: self.path.clone(),
            bytes,
        })
    }
}

impl ModuleInitializer for ArtifactInitializer {
    fn initialize(&self) -> InitFuture<'_> {
        Box::pin(self.load())
    }
}

fn validate_header(path: &Utf8Path, bytes: &[u8]) -> Result<(), ModuleInitError> {
    let truncated = || ModuleInitError::Truncated {
        path: path.to_path_buf(),
        len: bytes.len(),
    };
    let (magic, rest) = bytes.split_first_chunk::<4>().ok_or_else(truncated)?;
    let version = rest.first_chunk::<4>().ok_or_else(truncated)?;

    if *magic != WASM_MAGIC {
        return Err(ModuleInitError::InvalidMagic {
            path: path.to_path_buf(),
        });
    }
    if *version != WASM_VERSION {
        return Err(ModuleInitError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: *version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    const EMPTY_MODULE: &[u8] = b"\0asm\x01\0\0\0";

    struct Artifact {
        dir: TempDir,
    }

    impl Artifact {
        fn write(&self, bytes: &[u8]) -> ArtifactInitializer {
            let path = self.dir.path().join("module.wasm");
            std::fs::write(&path, bytes).expect("write artifact");
            ArtifactInitializer::new(Utf8PathBuf::from_path_buf(path).expect("utf8 path"))
        }
    }

    #[fixture]
    fn artifact() -> Artifact {
        Artifact {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn publishes_valid_module(artifact: Artifact) {
        let initializer = artifact.write(EMPTY_MODULE);
        let slot = initializer.slot();
        assert!(slot.get().is_none());

        initializer.initialize().await.expect("initialize");

        let module = slot.get().expect("module published");
        assert_eq!(module.bytes(), EMPTY_MODULE);
        assert_eq!(module.path(), initializer.path());
    }

    #[rstest]
    #[case(b"\0as".as_slice())]
    #[case(b"\0asm\x01".as_slice())]
    #[tokio::test]
    async fn rejects_truncated_artifact(artifact: Artifact, #[case] bytes: &[u8]) {
        let initializer = artifact.write(bytes);
        let error = initializer.initialize().await.expect_err("truncated");
        assert!(matches!(error, ModuleInitError::Truncated { .. }));
        assert!(initializer.slot().get().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_wrong_magic(artifact: Artifact) {
        let initializer = artifact.write(b"\x7fELF\x01\0\0\0");
        let error = initializer.initialize().await.expect_err("not wasm");
        assert!(matches!(error, ModuleInitError::InvalidMagic { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_unknown_version(artifact: Artifact) {
        let initializer = artifact.write(b"\0asm\x02\0\0\0");
        let error = initializer.initialize().await.expect_err("bad version");
        assert!(matches!(
            error,
            ModuleInitError::UnsupportedVersion { version: [2, 0, 0, 0], .. }
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_artifact_is_a_read_error(artifact: Artifact) {
        let path = Utf8PathBuf::from_path_buf(artifact.dir.path().join("absent.wasm"))
            .expect("utf8 path");
        let error = ArtifactInitializer::new(path)
            .initialize()
            .await
            .expect_err("missing");
        assert!(matches!(error, ModuleInitError::Read { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn second_load_does_not_replace_module(artifact: Artifact) {
        let initializer = artifact.write(EMPTY_MODULE);
        initializer.initialize().await.expect("first load");
        let error = initializer.initialize().await.expect_err("second load");
        assert!(matches!(error, ModuleInitError::AlreadyLoaded));
    }

    #[rstest]
    fn failed_message_is_reported_verbatim() {
        assert_eq!(ModuleInitError::failed("X").to_string(), "X");
    }
}
