use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::RwLock;

use crate::models::UserProfile;

type ProfileMap = Arc<RwLock<HashMap<ChatId, UserProfile>>>;

/// Per-user state store, shared between the message dispatcher and the
/// reminder task. The lock serializes access; profiles live for the process
/// lifetime only.
#[derive(Clone, Default)]
pub struct BotState {
    profiles: ProfileMap,
}

impl BotState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the user's profile, creating a blank one on first
    /// contact.
    pub async fn get_profile(&self, chat_id: ChatId) -> UserProfile {
        {
            let profiles = self.profiles.read().await;
            if let Some(profile) = profiles.get(&chat_id) {
                return profile.clone();
            }
        }

        let mut profiles = self.profiles.write().await;
        profiles.entry(chat_id).or_default().clone()
    }

    /// Commits a handler's working copy. `reminded_today` is owned by the
    /// reminder task and written in place; a handler copy taken before a
    /// reminder fired would carry a stale flag, so the stored value wins.
    pub async fn save_profile(&self, chat_id: ChatId, mut profile: UserProfile) {
        let mut profiles = self.profiles.write().await;
        if let Some(stored) = profiles.get(&chat_id) {
            profile.reminded_today = stored.reminded_today;
        }
        profiles.insert(chat_id, profile);
        log::debug!("💾 Profile saved for chat {}", chat_id);
    }

    /// Records that today's reminder went out. Only the reminder task calls
    /// this; the flag never travels through handler copies.
    pub async fn mark_reminded(&self, chat_id: ChatId) {
        let mut profiles = self.profiles.write().await;
        if let Some(profile) = profiles.get_mut(&chat_id) {
            profile.reminded_today = true;
        }
    }

    pub async fn all_profiles(&self) -> HashMap<ChatId, UserProfile> {
        self.profiles.read().await.clone()
    }

    /// Daily rollover: everyone becomes eligible for a reminder again.
    pub async fn reset_reminder_flags(&self) {
        let mut profiles = self.profiles.write().await;
        for profile in profiles.values_mut() {
            profile.reminded_today = false;
        }
        log::info!("🔄 Reminder flags reset for {} users", profiles.len());
    }
}
