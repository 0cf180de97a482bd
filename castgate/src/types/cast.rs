use serde::{Deserialize, Serialize};

use super::user::ProviderUser;

/// A single cast as returned by the hub feed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cast {
    pub hash: String,
    #[serde(default)]
    pub thread_hash: Option<String>,
    #[serde(default)]
    pub parent_hash: Option<String>,
    pub author: ProviderUser,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub embeds: Vec<CastEmbed>,
    #[serde(default)]
    pub reactions: ReactionCounts,
    #[serde(default)]
    pub replies: ReplyCount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastEmbed {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactionCounts {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub recasts: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyCount {
    #[serde(default)]
    pub count: u64,
}

/// A page of feed casts plus the cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub casts: Vec<Cast>,
    pub next_cursor: Option<String>,
}

/// Reference to a cast created by a publish call.
#[derive(Debug, Clone, Deserialize)]
pub struct CastRef {
    pub hash: String,
}

/// Reaction kinds accepted by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Recast,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Recast => "recast",
        }
    }
}
