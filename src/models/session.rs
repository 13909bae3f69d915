//! Per-invocation caller context.
//!
//! Built once in `run()` from the global flags and the configuration, then
//! passed by reference to every handler and query that needs tenant scoping
//! or permission checks.

use crate::errors::{AppError, AppResult};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
pub enum Role {
    Admin,
    #[default]
    Trainer,
    Athlete,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub org_id: Option<String>,
    pub actor_id: Option<String>,
    pub role: Role,
}

impl Session {
    pub fn new(org_id: Option<String>, actor_id: Option<String>, role: Role) -> Self {
        Self {
            org_id,
            actor_id,
            role,
        }
    }

    pub fn ensure_can_write(&self) -> AppResult<()> {
        if self.role == Role::Athlete {
            return Err(AppError::Forbidden(
                "athletes cannot create or modify appointments".into(),
            ));
        }
        Ok(())
    }

    /// Athlete id the caller is restricted to, if any.
    pub fn athlete_scope(&self) -> AppResult<Option<&str>> {
        match self.role {
            Role::Athlete => self.actor_id.as_deref().map(Some).ok_or_else(|| {
                AppError::Forbidden("athlete role requires --as <athlete id>".into())
            }),
            Role::Admin | Role::Trainer => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn athlete_cannot_write() {
        let s = Session::new(None, Some("ath-1".into()), Role::Athlete);
        assert!(matches!(s.ensure_can_write(), Err(AppError::Forbidden(_))));
        assert_eq!(s.athlete_scope().unwrap(), Some("ath-1"));
    }

    #[test]
    fn athlete_without_identity_is_rejected() {
        let s = Session::new(None, None, Role::Athlete);
        assert!(s.athlete_scope().is_err());
    }
}
