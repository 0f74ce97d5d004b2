//! Cosmetic class chat.
//!
//! Pure flavor: nothing in here touches scoring or progression. Replies
//! come from the external generator when it is reachable and fall back to
//! a fixed line when it is not.

use serde::{Deserialize, Serialize};

use crate::bots::Classmate;
use crate::constants::CHAT_FEED_CAP;
use crate::profile::PlayerStats;

/// Canned ambient lines classmates drop between real messages.
pub(crate) const AMBIENT_LINES: [&str; 5] = [
    "Cordoba looks amazing, have you seen the visuals?",
    "Anyone know the answer to the Al-Zahrawi question?",
    "My score is about to pass yours, watch out!",
    "Damascus mission done, on to North Africa!",
    "Keep going everyone, our class has got this!",
];

const SYSTEM_SENDER_ID: &str = "system";
const SYSTEM_SENDER_NAME: &str = "Temporal System";
const PLAYER_SENDER_ID: &str = "me";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub at_ms: u64,
    pub is_me: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Bounded message log, oldest dropped first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatFeed {
    messages: Vec<ChatMessage>,
    next_serial: u64,
}

impl ChatFeed {
    fn next_id(&mut self, prefix: &str) -> String {
        let serial = self.next_serial;
        self.next_serial += 1;
        format!("{prefix}-{serial}")
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > CHAT_FEED_CAP {
            let overflow = self.messages.len() - CHAT_FEED_CAP;
            self.messages.drain(..overflow);
        }
    }

    pub fn push_system(&mut self, text: &str, now_ms: u64) {
        let id = self.next_id("sys");
        self.push(ChatMessage {
            id,
            sender_id: SYSTEM_SENDER_ID.to_string(),
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            text: text.to_string(),
            at_ms: now_ms,
            is_me: false,
            avatar_url: None,
        });
    }

    pub fn push_player(&mut self, player: &PlayerStats, text: &str, now_ms: u64) {
        let id = self.next_id("me");
        self.push(ChatMessage {
            id,
            sender_id: PLAYER_SENDER_ID.to_string(),
            sender_name: player.name.clone(),
            text: text.to_string(),
            at_ms: now_ms,
            is_me: true,
            avatar_url: player.avatar_url.clone(),
        });
    }

    pub fn push_classmate(&mut self, mate: &Classmate, text: &str, now_ms: u64) {
        let id = self.next_id("bot");
        self.push(ChatMessage {
            id,
            sender_id: mate.id.clone(),
            sender_name: mate.name.clone(),
            text: text.to_string(),
            at_ms: now_ms,
            is_me: false,
            avatar_url: Some(mate.avatar_url.clone()),
        });
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
