use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rest::HubClient;
use crate::types::{Cast, CastRef, FeedPage, Profile, ProviderUser, ReactionKind};

// Wire envelopes, kept private to this module.

#[derive(Debug, Deserialize)]
struct FeedResponse {
    casts: Vec<Cast>,
    #[serde(default)]
    next: Option<NextCursor>,
}

#[derive(Debug, Deserialize)]
struct NextCursor {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BulkUsersResponse {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

#[derive(Debug, Serialize)]
struct PublishBody<'a> {
    signer_uuid: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    cast: CastRef,
}

#[derive(Debug, Serialize)]
struct ReactionBody<'a> {
    signer_uuid: &'a str,
    reaction_type: &'static str,
    target: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReactionResponse {
    #[serde(default)]
    success: bool,
}

impl HubClient {
    // --- Reads ---

    /// GET /farcaster/feed - Latest casts, optionally resuming from a cursor.
    pub async fn fetch_feed(&self, limit: u8, cursor: Option<&str>) -> Result<FeedPage> {
        let limit_str = limit.to_string();
        let mut query = vec![("limit", limit_str.as_str())];
        if let Some(c) = cursor {
            query.push(("cursor", c));
        }
        let resp: FeedResponse = self.get("/farcaster/feed", &query).await?;
        Ok(FeedPage {
            casts: resp.casts,
            next_cursor: resp.next.and_then(|n| n.cursor),
        })
    }

    /// GET /farcaster/user/bulk - Look up a single user by fid.
    pub async fn fetch_user(&self, fid: u64) -> Result<Option<Profile>> {
        let fids = fid.to_string();
        let resp: BulkUsersResponse = self
            .get("/farcaster/user/bulk", &[("fids", fids.as_str())])
            .await?;
        Ok(resp.users.into_iter().next().map(Profile::from))
    }

    /// GET /farcaster/feed/user/casts - Casts authored by a user.
    pub async fn fetch_user_casts(&self, fid: u64, limit: u8) -> Result<Vec<Cast>> {
        let fid_str = fid.to_string();
        let limit_str = limit.to_string();
        let resp: FeedResponse = self
            .get(
                "/farcaster/feed/user/casts",
                &[("fid", fid_str.as_str()), ("limit", limit_str.as_str())],
            )
            .await?;
        Ok(resp.casts)
    }

    /// GET /farcaster/user/search - Search users by handle or name.
    pub async fn search_users(&self, query: &str) -> Result<Vec<Profile>> {
        let resp: SearchResponse = self.get("/farcaster/user/search", &[("q", query)]).await?;
        Ok(resp.result.users.into_iter().map(Profile::from).collect())
    }

    // --- Capability-token writes ---

    /// POST /farcaster/cast - Publish a cast on the user's behalf.
    ///
    /// `signer` is the opaque capability token from sign-in; it is passed
    /// through without interpretation.
    pub async fn publish_cast(
        &self,
        signer: &str,
        text: &str,
        parent: Option<&str>,
    ) -> Result<CastRef> {
        let body = PublishBody {
            signer_uuid: signer,
            text,
            parent,
        };
        let resp: PublishResponse = self.post("/farcaster/cast", &body).await?;
        Ok(resp.cast)
    }

    /// POST /farcaster/reaction - Like or recast a cast on the user's behalf.
    pub async fn react(&self, signer: &str, kind: ReactionKind, target: &str) -> Result<bool> {
        let body = ReactionBody {
            signer_uuid: signer,
            reaction_type: kind.as_str(),
            target,
        };
        let resp: ReactionResponse = self.post("/farcaster/reaction", &body).await?;
        Ok(resp.success)
    }
}
