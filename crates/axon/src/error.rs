// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Only conditions that must carry a reason up to the hosting process use
//! `Error`; everything recoverable inside the fabric surfaces as `Option`
//! or `bool` at the call site (a missing class, a duplicate reader, a
//! rejected timer period).

use std::fmt;

/// Errors surfaced by configuration loading and the module controller.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    /// Configuration or graph file not found at the given path.
    ConfigFileNotFound(String),
    /// Configuration or graph file failed to parse.
    ParseError(String),

    // ========================================================================
    // Registry and loader
    // ========================================================================
    /// No factory registered for the requested class name.
    ClassNotFound(String),
    /// Artifact could not be mapped or its registration entry point is missing.
    LibraryLoadFailed(String),

    // ========================================================================
    // Arguments and state
    // ========================================================================
    /// Caller passed a value outside the accepted range.
    InvalidArgument(String),
    /// Operation is not valid in the current lifecycle state.
    InvalidState(String),

    // ========================================================================
    // I/O
    // ========================================================================
    /// I/O error with underlying cause.
    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigFileNotFound(path) => write!(f, "config file not found: {}", path),
            Error::ParseError(msg) => write!(f, "parse error: {}", msg),
            Error::ClassNotFound(name) => write!(f, "class not found: {}", name),
            Error::LibraryLoadFailed(path) => write!(f, "library load failed: {}", path),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
