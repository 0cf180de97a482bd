pub mod address;
pub mod cast;
pub mod member;
pub mod price;
pub mod user;

pub use address::Address;
pub use cast::{Cast, CastEmbed, CastRef, FeedPage, ReactionCounts, ReactionKind, ReplyCount};
pub use member::{GoldenCast, UserRow};
pub use price::TokenPrice;
pub use user::{Profile, ProviderBio, ProviderUser, ProviderUserProfile};
