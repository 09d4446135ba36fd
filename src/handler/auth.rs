use super::core::HandlerUnit;
use crate::error::HandlerResult;
use crate::outcome::Outcome;
use std::collections::HashMap;
use std::sync::Arc;

/// Answer of an authentication handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Credentials accepted.
    Accept,
    /// Credentials refused; the host asks the client again.
    Retry,
    /// The handler could not decide.
    Error,
}

impl From<AuthVerdict> for Outcome {
    fn from(verdict: AuthVerdict) -> Self {
        match verdict {
            AuthVerdict::Accept => Outcome::Proceed,
            AuthVerdict::Retry => Outcome::NoAction,
            AuthVerdict::Error => Outcome::Aborted,
        }
    }
}

/// Authentication handler.
///
/// The credentials arrive as the `user` and `pw` directive parameters. The
/// provided `handle` accepts everything.
pub trait AuthHandler {
    fn handle(&mut self, _unit: &mut HandlerUnit<'_>) -> HandlerResult<AuthVerdict> {
        Ok(AuthVerdict::Accept)
    }
}

/// Checks `user`/`pw` against a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: Arc<HashMap<String, String>>,
}

impl StaticCredentials {
    pub fn new<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: Arc::new(
                users
                    .into_iter()
                    .map(|(u, p)| (u.into(), p.into()))
                    .collect(),
            ),
        }
    }

    /// Whether `user` exists and `password` matches it.
    #[must_use]
    pub fn verify(&self, user: &str, password: &str) -> bool {
        self.users
            .get(user)
            .is_some_and(|stored| stored.as_bytes() == password.as_bytes())
    }
}

impl AuthHandler for StaticCredentials {
    fn handle(&mut self, unit: &mut HandlerUnit<'_>) -> HandlerResult<AuthVerdict> {
        let (Some(user), Some(password)) = (unit.param("user"), unit.param("pw")) else {
            return Ok(AuthVerdict::Retry);
        };
        if self.verify(user, password) {
            Ok(AuthVerdict::Accept)
        } else {
            Ok(AuthVerdict::Retry)
        }
    }
}
