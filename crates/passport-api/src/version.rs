//! # Version File
//!
//! Reads the service version from a file and checks it is a semantic
//! version (optionally `v`-prefixed) before it is reported by the healthcheck.

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

/// `v?MAJOR.MINOR.PATCH(-prerelease)?(+build)?`
const SEMVER_PATTERN: &str = r"^v?(?:0|[1-9][0-9]*)\.(?:0|[1-9][0-9]*)\.(?:0|[1-9][0-9]*)(?:-[0-9a-z-]+(?:\.[0-9a-z-]+)*)?(?:\+[0-9a-z-]+(?:\.[0-9a-z-]+)*)?$";

/// Failure to load a version file.
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("reading version file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("string in version file is not a valid version number: {0:?}")]
    Invalid(String),

    #[error("compiling version pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Read `path`, trim it, and return the contents if they are a valid version.
pub fn parse_version_file(path: impl AsRef<Path>) -> Result<String, VersionError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| VersionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_version(&raw)
}

/// Validate a version string. Surrounding whitespace is ignored.
pub fn parse_version(raw: &str) -> Result<String, VersionError> {
    let version = raw.trim();
    if Regex::new(SEMVER_PATTERN)?.is_match(version) {
        Ok(version.to_string())
    } else {
        Err(VersionError::Invalid(version.to_string()))
    }
}
