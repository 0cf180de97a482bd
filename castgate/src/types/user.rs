use serde::{Deserialize, Serialize};

/// User object as delivered by the provider, both in the sign-in message
/// payload and in hub user endpoints. Field names match the provider API
/// (snake_case); the bio lives nested under `profile.bio.text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub fid: u64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub pfp_url: Option<String>,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub verifications: Vec<String>,
    #[serde(default)]
    pub custody_address: Option<String>,
    #[serde(default)]
    pub signer_uuid: Option<String>,
    #[serde(default)]
    pub profile: Option<ProviderUserProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderUserProfile {
    #[serde(default)]
    pub bio: Option<ProviderBio>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderBio {
    #[serde(default)]
    pub text: Option<String>,
}

/// The authenticated identity held by a session: the provider user flattened
/// into the fields the client actually uses. Replaced wholesale on re-auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub fid: u64,
    pub username: String,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
    pub bio: Option<String>,
    pub follower_count: u64,
    pub following_count: u64,
    pub verifications: Vec<String>,
    pub custody_address: Option<String>,
    /// Opaque capability token enabling write actions on the user's behalf.
    /// Never interpreted locally, never persisted.
    pub signer_uuid: Option<String>,
}

impl Profile {
    /// Display name with the username as fallback.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

impl From<ProviderUser> for Profile {
    fn from(user: ProviderUser) -> Self {
        let bio = user.profile.and_then(|p| p.bio).and_then(|b| b.text);
        Profile {
            fid: user.fid,
            username: user.username,
            display_name: user.display_name,
            pfp_url: user.pfp_url,
            bio,
            follower_count: user.follower_count,
            following_count: user.following_count,
            verifications: user.verifications,
            custody_address: user.custody_address,
            signer_uuid: user.signer_uuid,
        }
    }
}
