//! Revoked bearer tokens

use dashmap::DashSet;

/// Raw token strings invalidated by logout.
///
/// Held in memory only: the list grows for the life of the process and is
/// empty again after a restart.
#[derive(Debug, Default)]
pub struct RevocationList {
    tokens: DashSet<String>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.insert(token.to_string());
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
