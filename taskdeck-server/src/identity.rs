//! Identity boundary: turns an incoming request into an [`OwnerId`].
//!
//! Session issuance lives elsewhere. The server only needs the capability
//! "given a request, return the authenticated owner or nothing", expressed
//! by [`OwnerResolver`]. [`BearerSessions`] implements it with a static table
//! of bearer tokens loaded from configuration.

use std::collections::HashMap;

use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use taskdeck_proto::task::OwnerId;

/// Resolves the caller's identity from request metadata.
pub trait OwnerResolver: Send + Sync {
    /// Returns the authenticated owner, or `None` if the request carries no
    /// valid session.
    fn resolve_owner(&self, parts: &Parts) -> Option<OwnerId>;
}

/// Static bearer-token table.
#[derive(Debug, Default, Clone)]
pub struct BearerSessions {
    tokens: HashMap<String, OwnerId>,
}

impl BearerSessions {
    /// Creates an empty table; every request is rejected until a token is added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `token` to `owner`, replacing any previous mapping for the token.
    pub fn insert(&mut self, token: impl Into<String>, owner: OwnerId) -> Option<OwnerId> {
        self.tokens.insert(token.into(), owner)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_session(mut self, token: impl Into<String>, owner: OwnerId) -> Self {
        self.insert(token, owner);
        self
    }

    /// Number of known tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no token is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Looks up the owner for a raw token.
    #[must_use]
    pub fn owner_for(&self, token: &str) -> Option<&OwnerId> {
        self.tokens.get(token)
    }
}

impl OwnerResolver for BearerSessions {
    fn resolve_owner(&self, parts: &Parts) -> Option<OwnerId> {
        let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = header.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        self.owner_for(token.trim()).cloned()
    }
}
