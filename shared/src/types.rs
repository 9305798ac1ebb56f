//! Common types used across the harvest tooling

use serde::{Deserialize, Serialize};

/// Response envelope used by the facility API.
///
/// Endpoints answer either with the bare resource or with `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// Reference to whoever performed an action.
///
/// The API is inconsistent here: sometimes an id, sometimes a display name,
/// sometimes a small user object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ActorRef {
    User { id: i64, name: Option<String> },
    Id(i64),
    Name(String),
}

impl std::fmt::Display for ActorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRef::User { name: Some(name), .. } => write!(f, "{}", name),
            ActorRef::User { id, name: None } => write!(f, "user #{}", id),
            ActorRef::Id(id) => write!(f, "user #{}", id),
            ActorRef::Name(name) => write!(f, "{}", name),
        }
    }
}
