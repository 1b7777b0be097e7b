//! Permission grammar.
//!
//! A grant is written `"<action>:<scope>"`:
//!
//! | scope               | meaning                                          |
//! |---------------------|--------------------------------------------------|
//! | `sys-all`           | the system resource (drive root)                 |
//! | `all`               | every resource                                   |
//! | `<name>`            | resources with that name                         |
//! | `own-<name>`        | resources with that name the user owns           |
//! | `own-all`           | every resource the user owns                     |
//! | `<userId>-<name>`   | a resource named `<name>` shared with `<userId>` |
//!
//! The shared scope binds on the acting user's id. It reads exactly like a
//! named scope, so parsing never yields [`Scope::Shared`]; only the engine
//! builds one. Grants compare case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// The verb half of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// Wildcard, only meaningful inside a grant
    All,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::All => "all",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "all" => Ok(Action::All),
            _ => Err(AuthzError::InvalidAction(s.to_string())),
        }
    }
}

/// The object half of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    SystemAll,
    All,
    OwnAll,
    Own(String),
    Named(String),
    Shared { user_id: String, resource: String },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::SystemAll => f.write_str("sys-all"),
            Scope::All => f.write_str("all"),
            Scope::OwnAll => f.write_str("own-all"),
            Scope::Own(name) => write!(f, "own-{}", name),
            Scope::Named(name) => f.write_str(name),
            Scope::Shared { user_id, resource } => write!(f, "{}-{}", user_id, resource),
        }
    }
}

impl FromStr for Scope {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AuthzError::InvalidGrant("empty scope".to_string()));
        }

        let lowered = s.to_ascii_lowercase();
        Ok(match lowered.as_str() {
            "sys-all" => Scope::SystemAll,
            "all" => Scope::All,
            "own-all" => Scope::OwnAll,
            _ => match s.get(..4) {
                Some(prefix) if prefix.eq_ignore_ascii_case("own-") && s.len() > 4 => {
                    Scope::Own(s[4..].to_string())
                }
                _ => Scope::Named(s.to_string()),
            },
        })
    }
}

/// A structured `{action, scope}` permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grant {
    pub action: Action,
    pub scope: Scope,
}

impl Grant {
    pub fn new(action: Action, scope: Scope) -> Self {
        Self { action, scope }
    }

    /// Normalized form used for set membership.
    pub fn key(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.scope)
    }
}

impl FromStr for Grant {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, scope) = s
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidGrant(s.to_string()))?;

        let action = action
            .parse::<Action>()
            .map_err(|_| AuthzError::InvalidGrant(s.to_string()))?;
        let scope = scope
            .parse::<Scope>()
            .map_err(|_| AuthzError::InvalidGrant(s.to_string()))?;

        Ok(Self { action, scope })
    }
}

impl Serialize for Grant {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Grant {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!("read".parse::<Action>().unwrap(), Action::Read);
        assert_eq!("DELETE".parse::<Action>().unwrap(), Action::Delete);
        assert_eq!("all".parse::<Action>().unwrap(), Action::All);
        assert!("write".parse::<Action>().is_err());
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("sys-all".parse::<Scope>().unwrap(), Scope::SystemAll);
        assert_eq!("all".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!("own-all".parse::<Scope>().unwrap(), Scope::OwnAll);
        assert_eq!(
            "own-report".parse::<Scope>().unwrap(),
            Scope::Own("report".to_string())
        );
        assert_eq!(
            "reportA".parse::<Scope>().unwrap(),
            Scope::Named("reportA".to_string())
        );
        // "own-" alone is a resource literally named "own-"
        assert_eq!("own-".parse::<Scope>().unwrap(), Scope::Named("own-".to_string()));
        assert!("".parse::<Scope>().is_err());
    }

    #[test]
    fn test_grant_display_matches_wire_format() {
        let grant = Grant::new(Action::Read, Scope::Own("notes".into()));
        assert_eq!(grant.to_string(), "read:own-notes");

        let shared = Grant::new(
            Action::Update,
            Scope::Shared {
                user_id: "u7".into(),
                resource: "Plan".into(),
            },
        );
        assert_eq!(shared.to_string(), "update:u7-Plan");
        assert_eq!(shared.key(), "update:u7-plan");
    }

    #[test]
    fn test_grant_parsing() {
        let grant: Grant = "all:all".parse().unwrap();
        assert_eq!(grant, Grant::new(Action::All, Scope::All));

        let grant: Grant = "create:sys-all".parse().unwrap();
        assert_eq!(grant.scope, Scope::SystemAll);

        // Names may themselves contain colons after the first separator
        let grant: Grant = "read:a:b".parse().unwrap();
        assert_eq!(grant.scope, Scope::Named("a:b".into()));

        assert!("readall".parse::<Grant>().is_err());
        assert!("fly:all".parse::<Grant>().is_err());
        assert!("read:".parse::<Grant>().is_err());
    }

    #[test]
    fn test_grant_serde() {
        let grant = Grant::new(Action::Delete, Scope::OwnAll);
        let json = serde_json::to_string(&grant).unwrap();
        assert_eq!(json, "\"delete:own-all\"");
        let back: Grant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grant);
    }
}
