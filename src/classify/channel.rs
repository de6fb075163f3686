//! Classification string parsing

use crate::config::QuantConfig;
use crate::diagnostics::DropReason;

/// Splits `"<object_type>: <channel>"` and maps the channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelClassifier<'a> {
    config: &'a QuantConfig,
}

impl<'a> ChannelClassifier<'a> {
    /// Create a classifier over a validated configuration
    #[must_use]
    pub fn new(config: &'a QuantConfig) -> Self {
        Self { config }
    }

    /// Split a classification string on its first colon
    ///
    /// Strings without a colon are an object type with no channel.
    #[must_use]
    pub fn split(raw: &str) -> (&str, &str) {
        match raw.split_once(':') {
            Some((object_type, channel)) => (object_type.trim(), channel.trim()),
            None => (raw.trim(), ""),
        }
    }

    /// Canonical channel of a classification string
    ///
    /// # Errors
    ///
    /// - [`DropReason::WrongObjectType`] if the object type is not the configured one
    /// - [`DropReason::UnknownChannel`] if the channel is not mapped
    pub fn classify(&self, raw: &str) -> Result<&'a str, DropReason> {
        let (object_type, channel) = Self::split(raw);
        if object_type != self.config.object_type.trim() {
            return Err(DropReason::WrongObjectType);
        }
        self.config
            .canonical_channel(channel)
            .ok_or(DropReason::UnknownChannel)
    }
}
