//! Resource resolution module
//!
//! Maps request-independent resource paths to byte streams and defines the
//! closed set of ways loading the index page can fail.

use crate::config::IndexConfig;
use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Resolves deployed static resources by path.
pub trait ResourceResolver {
    /// Open the resource at `path`, or `Ok(None)` when nothing is deployed there.
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>>;
}

/// Resolver backed by a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// Create a resolver rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("resource root is not a directory: {}", root.display()),
            ));
        }
        Ok(Self { root })
    }
}

impl ResourceResolver for DirectoryResolver {
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + '_>>> {
        let candidate = self.root.join(path.trim_start_matches('/'));

        // File not found is the common "not deployed" case, not an error
        let canonical = match candidate.canonicalize() {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if !canonical.starts_with(&self.root) || !canonical.is_file() {
            return Ok(None);
        }

        let reader: Box<dyn Read + '_> = Box::new(File::open(canonical)?);
        Ok(Some(reader))
    }
}

/// Turn the index configuration into a resolution capability.
///
/// `Ok(None)` when no resource root is configured, `Err` when the configured
/// root cannot be used.
pub fn resolve_context(config: &IndexConfig) -> io::Result<Option<DirectoryResolver>> {
    config
        .resource_root
        .as_deref()
        .map(DirectoryResolver::new)
        .transpose()
}

/// Why the index page could not be loaded
#[derive(Debug)]
pub enum LoadError {
    /// No resolution capability is available
    ContextUnavailable,
    /// The capability exists but holds no `index.html`
    NotDeployed,
    /// Opening or reading the resource failed
    Read(io::Error),
    /// Obtaining the capability itself failed
    Context(io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextUnavailable => f.write_str("ServletContext is null"),
            Self::NotDeployed => {
                f.write_str("No index.html deployed as static file in application")
            }
            Self::Read(e) => write!(f, "Could not read index.html: {e}"),
            Self::Context(e) => write!(f, "Could not get ServletContext: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) | Self::Context(e) => Some(e),
            Self::ContextUnavailable | Self::NotDeployed => None,
        }
    }
}
