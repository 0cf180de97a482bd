//! One-shot hub reads: the `feed` and `search` commands.

use castgate::Cast;

use crate::client;
use crate::error::GiltError;

/// Print one page of the global feed, or a single user's casts with `fid`.
pub async fn run_feed(limit: u8, cursor: Option<&str>, fid: Option<u64>) -> Result<(), GiltError> {
    let hub = client::hub_from_env()?;
    match fid {
        Some(fid) => {
            let casts = hub.fetch_user_casts(fid, limit).await?;
            if casts.is_empty() {
                println!("no casts for fid {fid}");
            }
            for cast in &casts {
                print_cast(cast);
            }
        }
        None => {
            let page = hub.fetch_feed(limit, cursor).await?;
            for cast in &page.casts {
                print_cast(cast);
            }
            if let Some(next) = page.next_cursor {
                println!("next: --cursor {next}");
            }
        }
    }
    Ok(())
}

/// Search hub users and print the matches.
pub async fn run_search(query: &str) -> Result<(), GiltError> {
    let hub = client::hub_from_env()?;
    let users = hub.search_users(query).await?;
    if users.is_empty() {
        println!("no users match \"{query}\"");
        return Ok(());
    }
    for user in &users {
        println!(
            "fid:{:<9} @{:<20} {}  followers:{}",
            user.fid,
            user.username,
            user.display_name.as_deref().unwrap_or("-"),
            user.follower_count
        );
    }
    Ok(())
}

pub fn print_cast(cast: &Cast) {
    println!("{}", format_cast(cast));
}

/// One line per cast: short timestamp, author, flattened text, counts.
pub fn format_cast(cast: &Cast) -> String {
    let mut text = cast.text.replace(['\n', '\r'], " ");
    if text.chars().count() > 100 {
        text = text.chars().take(97).collect();
        text.push_str("...");
    }
    let ts = cast.timestamp.get(..16).unwrap_or(&cast.timestamp);
    format!(
        "{}  @{}  {}  likes:{} recasts:{} replies:{}",
        ts,
        cast.author.username,
        text,
        cast.reactions.likes,
        cast.reactions.recasts,
        cast.replies.count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use castgate::types::cast::{ReactionCounts, ReplyCount};
    use castgate::ProviderUser;

    fn cast(text: &str) -> Cast {
        let author: ProviderUser =
            serde_json::from_str(r#"{ "fid": 7, "username": "herald" }"#).unwrap();
        Cast {
            hash: "0xabc".into(),
            thread_hash: None,
            parent_hash: None,
            author,
            text: text.into(),
            timestamp: "2026-03-01T09:30:00.000Z".into(),
            embeds: vec![],
            reactions: ReactionCounts {
                likes: 3,
                recasts: 1,
            },
            replies: ReplyCount { count: 2 },
        }
    }

    #[test]
    fn test_format_cast_single_line() {
        let line = format_cast(&cast("hello\nworld"));
        assert_eq!(
            line,
            "2026-03-01T09:30  @herald  hello world  likes:3 recasts:1 replies:2"
        );
    }

    #[test]
    fn test_format_cast_truncates_long_text() {
        let line = format_cast(&cast(&"x".repeat(300)));
        assert!(line.contains("..."));
        assert!(line.len() < 200);
    }

    #[test]
    fn test_format_cast_short_timestamp_kept_whole() {
        let mut c = cast("hi");
        c.timestamp = "yesterday".into();
        assert!(format_cast(&c).starts_with("yesterday  @herald"));
    }
}
