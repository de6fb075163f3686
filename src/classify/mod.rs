//! Hemisphere & channel classification
//!
//! Turns the raw classification string and hemisphere field (or coordinate)
//! of a record into the canonical channel and hemisphere labels.

pub mod channel;
pub mod hemisphere;

pub use channel::ChannelClassifier;
pub use hemisphere::HemisphereClassifier;
