//! Explicit session context for authenticated calls.
//!
//! Anything that talks to the remote API on a user's behalf receives a
//! [`SessionContext`] value instead of looking a token up from ambient storage.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl SessionContext {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: Some(token.into()),
            role,
        }
    }

    /// A context with no credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The token, if the session is logged in
    pub fn require_user(&self) -> Result<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Unauthorized("login required".into()))
    }

    /// The token, if the session is logged in with the admin role
    pub fn require_admin(&self) -> Result<&str> {
        let token = self.require_user()?;
        if self.role != Role::Admin {
            return Err(Error::Unauthorized("admin role required".into()));
        }
        Ok(token)
    }

    /// `Authorization` header value for API requests
    pub fn bearer_header(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.require_user()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_rejected() {
        let ctx = SessionContext::anonymous();
        assert!(matches!(ctx.require_user(), Err(Error::Unauthorized(_))));
        assert!(ctx.bearer_header().is_err());

        let blank = SessionContext::new("  ", Role::Admin);
        assert!(blank.require_admin().is_err());
    }

    #[test]
    fn test_user_cannot_pass_admin_guard() {
        let ctx = SessionContext::new("tok123", Role::User);
        assert_eq!(ctx.require_user().unwrap(), "tok123");
        assert!(matches!(ctx.require_admin(), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_admin_session() {
        let ctx = SessionContext::new("tok456", Role::Admin);
        assert_eq!(ctx.require_admin().unwrap(), "tok456");
        assert_eq!(ctx.bearer_header().unwrap(), "Bearer tok456");
    }
}
