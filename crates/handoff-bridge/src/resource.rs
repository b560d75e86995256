//! Scoped resource handles granted to external viewers.
//!
//! A [`ResourceHandle`] is the only thing a viewer ever receives: a canonical
//! path and `file://` URI under one of the authorized roots, together with an
//! [`AccessGrant`] describing the narrowest access the bridge requests.
//! Resolution goes through a [`cap_std::fs::Dir`] capability for the matching
//! root, so a path is only grantable when it is reachable from that root.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::Dir;
use handoff_config::Config;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Tracing target for resource resolution.
const RESOURCE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resource");

/// Access level carried by a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// The viewer may read the resource but never modify it.
    ReadOnly,
}

/// Temporary, revocable permission attached to a [`ResourceHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGrant {
    mode: AccessMode,
    persistable: bool,
    ttl: Duration,
}

impl AccessGrant {
    /// Builds a read-only, non-persistable grant valid for `ttl`.
    #[must_use]
    pub const fn read_only(ttl: Duration) -> Self {
        Self {
            mode: AccessMode::ReadOnly,
            persistable: false,
            ttl,
        }
    }

    /// Access level granted.
    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether the viewer may keep the grant beyond the launch.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        self.persistable
    }

    /// Requested lifetime of the grant; launch and chooser commands receive
    /// it through the `{ttl}` placeholder.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Opaque reference to a local file that a viewer may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    path: Utf8PathBuf,
    uri: Url,
    root: Utf8PathBuf,
    grant: AccessGrant,
}

impl ResourceHandle {
    /// Assembles a handle from its parts.
    #[must_use]
    pub fn new(path: Utf8PathBuf, uri: Url, root: Utf8PathBuf, grant: AccessGrant) -> Self {
        Self {
            path,
            uri,
            root,
            grant,
        }
    }

    /// Canonical filesystem path of the resource.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// `file://` URI handed to viewers.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Authorized root the resource was resolved under.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        self.root.as_path()
    }

    /// Access requested on behalf of the viewer.
    #[must_use]
    pub const fn grant(&self) -> &AccessGrant {
        &self.grant
    }
}

/// Reasons a path cannot be turned into a [`ResourceHandle`].
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The path does not exist or could not be inspected.
    #[error("cannot access '{path}': {source}")]
    Unreadable {
        /// Path as requested.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The path names something other than a regular file.
    #[error("'{path}' is not a regular file")]
    NotAFile {
        /// Canonical path.
        path: Utf8PathBuf,
    },
    /// The path lies outside every authorized root.
    #[error("'{path}' is outside every authorized root")]
    OutsideAuthorizedRoots {
        /// Canonical path.
        path: Utf8PathBuf,
    },
    /// The path cannot be expressed as a `file://` URI.
    #[error("'{path}' cannot be expressed as a file URI")]
    InvalidUri {
        /// Canonical path.
        path: Utf8PathBuf,
    },
}

impl ResolveError {
    fn unreadable(path: &Utf8Path, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }
}

/// Scoped-permission grant primitive consumed by the bridge.
pub trait ResourceResolver {
    /// Resolves `path` into a handle a viewer may be given.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the path is missing, not a regular
    /// file, or outside the resolver's authority.
    fn resolve(&self, path: &Utf8Path) -> Result<ResourceHandle, ResolveError>;
}

#[derive(Debug)]
struct AuthorizedRoot {
    path: Utf8PathBuf,
    dir: Dir,
}

/// Resolver that only grants files beneath a set of authorized roots.
#[derive(Debug)]
pub struct ScopedResolver {
    roots: Vec<AuthorizedRoot>,
    ttl: Duration,
}

impl ScopedResolver {
    /// Creates a resolver with no roots; every path is rejected until
    /// [`ScopedResolver::authorize`] is called.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            roots: Vec::new(),
            ttl,
        }
    }

    /// Creates a resolver for `roots`, skipping any that cannot be opened.
    #[must_use]
    pub fn with_roots(roots: &[Utf8PathBuf], ttl: Duration) -> Self {
        let mut resolver = Self::new(ttl);
        for root in roots {
            if let Err(error) = resolver.authorize(root) {
                warn!(
                    target: RESOURCE_TARGET,
                    root = %root,
                    %error,
                    "skipping unavailable authorized root"
                );
            }
        }
        resolver
    }

    /// Creates a resolver from the configured roots and grant lifetime.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_roots(&config.authorized_roots(), config.grant_ttl())
    }

    /// Adds `root` to the set of authorized directories.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unreadable`] when the directory cannot be
    /// canonicalised or opened.
    pub fn authorize(&mut self, root: &Utf8Path) -> Result<(), ResolveError> {
        let canonical = root
            .canonicalize_utf8()
            .map_err(|source| ResolveError::unreadable(root, source))?;
        let dir = Dir::open_ambient_dir(canonical.as_std_path(), cap_std::ambient_authority())
            .map_err(|source| ResolveError::unreadable(root, source))?;
        self.roots.push(AuthorizedRoot {
            path: canonical,
            dir,
        });
        Ok(())
    }

    /// Iterates over the canonical authorized roots.
    pub fn roots(&self) -> impl Iterator<Item = &Utf8Path> {
        self.roots.iter().map(|root| root.path.as_path())
    }
}

impl ResourceResolver for ScopedResolver {
    fn resolve(&self, path: &Utf8Path) -> Result<ResourceHandle, ResolveError> {
        let canonical = path
            .canonicalize_utf8()
            .map_err(|source| ResolveError::unreadable(path, source))?;

        let (root, relative) = self
            .roots
            .iter()
            .find_map(|root| {
                canonical
                    .strip_prefix(&root.path)
                    .ok()
                    .map(|relative| (root, relative))
            })
            .ok_or_else(|| ResolveError::OutsideAuthorizedRoots {
                path: canonical.clone(),
            })?;

        if relative.as_str().is_empty() {
            return Err(ResolveError::NotAFile { path: canonical });
        }

        let metadata = root
            .dir
            .metadata(relative.as_std_path())
            .map_err(|source| ResolveError::unreadable(path, source))?;
        if !metadata.is_file() {
            return Err(ResolveError::NotAFile { path: canonical });
        }

        let uri = Url::from_file_path(canonical.as_std_path()).map_err(|()| {
            ResolveError::InvalidUri {
                path: canonical.clone(),
            }
        })?;

        debug!(
            target: RESOURCE_TARGET,
            path = %canonical,
            root = %root.path,
            ttl_secs = self.ttl.as_secs(),
            "resolved resource handle"
        );

        Ok(ResourceHandle::new(
            canonical,
            uri,
            root.path.clone(),
            AccessGrant::read_only(self.ttl),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    struct Roots {
        authorized: TempDir,
        outside: TempDir,
    }

    impl Roots {
        fn authorized_path(&self, name: &str) -> Utf8PathBuf {
            utf8(self.authorized.path().join(name))
        }

        fn outside_path(&self, name: &str) -> Utf8PathBuf {
            utf8(self.outside.path().join(name))
        }

        fn resolver(&self) -> ScopedResolver {
            ScopedResolver::with_roots(&[utf8(self.authorized.path().to_path_buf())], TTL)
        }
    }

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path).expect("temp paths are UTF-8")
    }

    #[fixture]
    fn roots() -> Roots {
        Roots {
            authorized: TempDir::new().expect("authorized temp dir"),
            outside: TempDir::new().expect("outside temp dir"),
        }
    }

    #[rstest]
    fn resolves_file_inside_root(roots: Roots) {
        let file = roots.authorized_path("report.pdf");
        fs::write(&file, b"%PDF-1.7").expect("write file");

        let handle = roots.resolver().resolve(&file).expect("resolve");

        assert_eq!(handle.uri().scheme(), "file");
        assert!(handle.path().ends_with("report.pdf"));
        assert_eq!(handle.grant().mode(), AccessMode::ReadOnly);
        assert!(!handle.grant().is_persistable());
        assert_eq!(handle.grant().ttl(), TTL);
    }

    #[rstest]
    fn rejects_missing_file(roots: Roots) {
        let file = roots.authorized_path("missing.pdf");
        let error = roots.resolver().resolve(&file).expect_err("missing file");
        assert!(matches!(error, ResolveError::Unreadable { .. }));
    }

    #[rstest]
    fn rejects_file_outside_roots(roots: Roots) {
        let file = roots.outside_path("secret.pdf");
        fs::write(&file, b"%PDF-1.7").expect("write file");

        let error = roots.resolver().resolve(&file).expect_err("outside root");
        assert!(matches!(error, ResolveError::OutsideAuthorizedRoots { .. }));
    }

    #[rstest]
    fn rejects_directories(roots: Roots) {
        let nested = roots.authorized_path("nested");
        fs::create_dir(&nested).expect("create dir");

        let error = roots.resolver().resolve(&nested).expect_err("directory");
        assert!(matches!(error, ResolveError::NotAFile { .. }));
    }

    #[rstest]
    fn rejects_root_itself(roots: Roots) {
        let root = utf8(roots.authorized.path().to_path_buf());
        let error = roots.resolver().resolve(&root).expect_err("root");
        assert!(matches!(error, ResolveError::NotAFile { .. }));
    }

    #[cfg(unix)]
    #[rstest]
    fn rejects_symlink_escaping_root(roots: Roots) {
        let target = roots.outside_path("secret.pdf");
        fs::write(&target, b"%PDF-1.7").expect("write file");
        let link = roots.authorized_path("link.pdf");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        let error = roots.resolver().resolve(&link).expect_err("escaping link");
        assert!(matches!(error, ResolveError::OutsideAuthorizedRoots { .. }));
    }

    #[rstest]
    fn resolver_without_roots_rejects_everything(roots: Roots) {
        let file = roots.authorized_path("report.pdf");
        fs::write(&file, b"%PDF-1.7").expect("write file");

        let error = ScopedResolver::new(TTL)
            .resolve(&file)
            .expect_err("no roots");
        assert!(matches!(error, ResolveError::OutsideAuthorizedRoots { .. }));
    }

    #[rstest]
    fn unavailable_roots_are_skipped(roots: Roots) {
        let missing = roots.authorized_path("does-not-exist");
        let resolver = ScopedResolver::with_roots(&[missing], TTL);
        assert_eq!(resolver.roots().count(), 0);
    }
}
