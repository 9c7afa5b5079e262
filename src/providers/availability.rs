//! Availability resolution: which catalog providers can actually be used.
//!
//! Resolution runs once per process. Each distinct credential reference is
//! looked up exactly once in the [`CredentialSource`]; providers whose
//! credential is missing, blank, or still set to its own key name (an
//! unconfigured placeholder) are left out. An empty result is the only fatal
//! error in the dispatch core.

use std::collections::HashMap;

use tracing::{error, info};

use super::catalog::{Catalog, Provider};
use crate::{CharlaError, Result};

/// Key-value lookup for provider credentials.
pub trait CredentialSource {
    /// Return the raw value configured for `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Credentials read from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Whether `value` is a usable credential for the reference named `key`.
pub fn is_valid_credential(key: &str, value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != key
}

/// The subset of the catalog with usable credentials.
///
/// Immutable once resolved; share it behind an `Arc` across conversations.
#[derive(Debug, Clone)]
pub struct Availability {
    providers: Vec<Provider>,
    credentials: HashMap<String, String>,
}

impl Availability {
    /// Resolve the availability set for `catalog`.
    ///
    /// Returns [`CharlaError::NoCredentials`] when no provider qualifies.
    pub fn resolve(catalog: &Catalog, source: &dyn CredentialSource) -> Result<Self> {
        let mut looked_up: HashMap<&str, Option<String>> = HashMap::new();
        let mut providers = Vec::new();
        let mut credentials = HashMap::new();

        for provider in catalog.iter() {
            let key = provider.credential.as_str();
            let value = looked_up
                .entry(key)
                .or_insert_with(|| source.lookup(key).filter(|v| is_valid_credential(key, v)));

            if let Some(value) = value {
                credentials
                    .entry(key.to_string())
                    .or_insert_with(|| value.trim().to_string());
                providers.push(provider.clone());
            }
        }

        if providers.is_empty() {
            error!("no provider credentials configured");
            return Err(CharlaError::NoCredentials);
        }

        let ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
        info!(count = ids.len(), providers = ?ids, "availability set resolved");

        Ok(Self {
            providers,
            credentials,
        })
    }

    /// Available provider ids, in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.id.as_str())
    }

    /// First available provider in catalog order.
    ///
    /// A resolved set is never empty, so this is always a real id.
    pub fn primary(&self) -> &str {
        self.providers.first().map_or("", |p| p.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// The resolved credential for `provider`.
    pub fn credential(&self, provider: &Provider) -> Option<&str> {
        self.credentials.get(&provider.credential).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
