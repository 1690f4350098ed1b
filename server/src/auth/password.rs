use std::sync::{Arc, OnceLock};

use crate::error::Result;

const DECOY_PASSWORD: &str = "canteen-decoy-password";

/// bcrypt hashing at a fixed cost.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    decoy: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(err) => {
                log::warn!("Stored password hash could not be checked: {}", err);
                false
            }
        }
    }

    /// Spends one full verification against a decoy hash at the configured
    /// cost, so an unknown account takes as long to reject as a wrong
    /// password. Always false.
    pub fn verify_absent(&self, password: &str) -> bool {
        let decoy = self.decoy.get_or_init(|| {
            bcrypt::hash(DECOY_PASSWORD, self.cost).unwrap_or_else(|err| {
                log::warn!("Decoy password hash unavailable: {}", err);
                String::new()
            })
        });
        let _ = bcrypt::verify(password, decoy);
        false
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        self.decoy.get().is_some()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
