//! Admin mode toggle.
//!
//! This is a UI convenience switch guarded by a shared plaintext password. It
//! is not an access-control mechanism and must not be used to protect
//! anything sensitive: anyone who can run the binary can read the password
//! from the config file or pass `--admin` with it.

use thiserror::Error;

use crate::palette::Session;

/// Password used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("Incorrect password")]
    IncorrectPassword,
}

#[derive(Debug, Clone)]
pub struct AdminGate {
    password: String,
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_PASSWORD)
    }
}

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Flip admin mode when `attempt` matches. Returns the new state.
    pub fn toggle(&self, session: &mut Session, attempt: &str) -> Result<bool, AdminError> {
        if attempt != self.password {
            return Err(AdminError::IncorrectPassword);
        }
        session.admin = !session.admin;
        Ok(session.admin)
    }

    /// Enter admin mode (no-op if already active).
    pub fn unlock(&self, session: &mut Session, attempt: &str) -> Result<(), AdminError> {
        if attempt != self.password {
            return Err(AdminError::IncorrectPassword);
        }
        session.admin = true;
        Ok(())
    }
}
