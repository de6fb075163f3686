//! Utility functions for error handling
//!
//! File access helpers used by the loaders, with errors that name the file
//! and what it was needed for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{QuantError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(QuantError::MissingInput(format!(
            "{} not found (needed for {purpose})",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(QuantError::MissingInput(format!(
            "{} is not a file (expected for {purpose})",
            path.display()
        )));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => format!("failed to open file for {purpose}"),
        };
        QuantError::Io(io::Error::new(
            e.kind(),
            format!("{}: {context}: {e}", path.display()),
        ))
    })
}

/// Check if a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(QuantError::MissingInput(format!(
            "directory {} not found (needed for {purpose})",
            path.display()
        )));
    }

    fs::read_dir(path).map(|_| ()).map_err(|e| {
        QuantError::Io(io::Error::new(
            e.kind(),
            format!("{}: failed to access directory for {purpose}: {e}", path.display()),
        ))
    })
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::InvalidData => "file is not valid UTF-8".to_string(),
            _ => format!("failed to read file content for {purpose}"),
        };
        QuantError::Io(io::Error::new(
            e.kind(),
            format!("{}: {context}: {e}", path.display()),
        ))
    })?;
    Ok(content)
}
