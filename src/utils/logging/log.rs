//! Logging utilities
//!
//! This module provides standardized logging functions for operations.

use std::path::Path;

use crate::diagnostics::Diagnostics;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path of the file or directory being operated on
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path of the file or directory that was operated on
/// * `items` - Number of rows or records handled
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(
    operation: &str,
    path: &Path,
    items: usize,
    elapsed: Option<std::time::Duration>,
) {
    if let Some(duration) = elapsed {
        log::info!(
            "Successfully {} {} items at {} in {:?}",
            operation,
            items,
            path.display(),
            duration
        );
    } else {
        log::info!(
            "Successfully {} {} items at {}",
            operation,
            items,
            path.display()
        );
    }
}

/// Log an operation warning with consistent format
///
/// # Arguments
/// * `message` - Warning message
/// * `path` - Optional path related to the warning
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}

/// Log the diagnostics of one animal, as a warning if records were dropped
pub fn log_animal_diagnostics(animal_id: &str, diagnostics: &Diagnostics) {
    if diagnostics.is_clean() {
        log::info!("Animal {animal_id}: {diagnostics}");
        return;
    }
    log_warning(&format!("Animal {animal_id}: {diagnostics}"), None);
    if !diagnostics.unresolved_regions.is_empty() {
        log::debug!(
            "Animal {animal_id}: regions not in atlas: {:?}",
            diagnostics.unresolved_regions
        );
    }
    if !diagnostics.unknown_channels.is_empty() {
        log::debug!(
            "Animal {animal_id}: unmapped channels: {:?}",
            diagnostics.unknown_channels
        );
    }
}
