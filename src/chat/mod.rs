//! Live-chat vote ingestion
//!
//! Turns chat lines into weight-1 votes. Fetching the messages is left to an
//! external connector, which posts them to `/chat`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::votes::{VoteChoice, VoteCollector};

/// One chat line from a live stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub text: String,
}

impl ChatMessage {
    /// Channel id when present, else display name
    pub fn voter_key(&self) -> Option<&str> {
        [self.channel_id.as_deref(), self.display_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
    }
}

/// Map a chat token to a vote. The whole message must be the token.
pub fn parse_vote_action(text: &str) -> Option<VoteChoice> {
    match text.trim().to_lowercase().as_str() {
        "forward" | "f" | "\u{2b06}" | "\u{2b06}\u{fe0f}" => Some(VoteChoice::Forward),
        "left" | "l" | "\u{2b05}" | "\u{2b05}\u{fe0f}" => Some(VoteChoice::Left),
        "right" | "r" | "\u{27a1}" | "\u{27a1}\u{fe0f}" => Some(VoteChoice::Right),
        "shoot" | "s" | "\u{1f52b}" | "\u{1f4a5}" => Some(VoteChoice::Shoot),
        _ => None,
    }
}

/// Cast the vote carried by `message`, if any
pub fn ingest(votes: &VoteCollector, message: &ChatMessage) -> Option<VoteChoice> {
    let choice = parse_vote_action(&message.text)?;
    let voter = message.voter_key()?;
    if !votes.add_vote(voter, choice, 1) {
        return None;
    }
    debug!(voter = %voter, ?choice, "Chat vote");
    Some(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(channel: Option<&str>, name: Option<&str>, text: &str) -> ChatMessage {
        ChatMessage {
            channel_id: channel.map(str::to_string),
            display_name: name.map(str::to_string),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_tokens() {
        assert_eq!(parse_vote_action(" Forward "), Some(VoteChoice::Forward));
        assert_eq!(parse_vote_action("L"), Some(VoteChoice::Left));
        assert_eq!(parse_vote_action("➡️"), Some(VoteChoice::Right));
        assert_eq!(parse_vote_action("➡"), Some(VoteChoice::Right));
        assert_eq!(parse_vote_action("💥"), Some(VoteChoice::Shoot));
        assert_eq!(parse_vote_action("s"), Some(VoteChoice::Shoot));
        assert_eq!(parse_vote_action("go left"), None);
        assert_eq!(parse_vote_action(""), None);
    }

    #[test]
    fn test_channel_id_is_the_voter_key() {
        let votes = VoteCollector::new();
        ingest(&votes, &msg(Some("UC1"), Some("Ann"), "f"));
        ingest(&votes, &msg(Some("UC1"), Some("Ann (alt)"), "shoot"));
        assert_eq!(votes.unique_voters(), 1);
        assert_eq!(votes.resolve_winner(), Some(VoteChoice::Shoot));
    }

    #[test]
    fn test_falls_back_to_display_name() {
        let votes = VoteCollector::new();
        assert_eq!(
            ingest(&votes, &msg(None, Some("Ann"), "left")),
            Some(VoteChoice::Left)
        );
        assert_eq!(ingest(&votes, &msg(Some(" "), None, "left")), None);
        assert_eq!(ingest(&votes, &msg(None, Some("Bo"), "hello")), None);
        assert_eq!(votes.unique_voters(), 1);
    }
}
