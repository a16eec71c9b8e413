//! The void: decides which inbound messages get deleted and when.
//!
//! Inbound message → [`classifier`] (reads the config store and the
//! [`relay_cache`]) → [`scheduler`] when deletion applies. Log routing
//! requests go through [`resolver`] independently.

pub mod classifier;
pub mod error;
pub mod relay_cache;
pub mod resolver;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod test_support;

pub use {
    classifier::{Classifier, ConfigSnapshot, Decision},
    error::{Error, Result},
    relay_cache::RelayCache,
    resolver::{LogDestination, OverrideResolver, UserOverrideMatch},
    scheduler::{DeleteOutcome, DeleteScheduler},
    service::{VoidService, VoidSettings},
};
