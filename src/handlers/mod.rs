pub mod commands;
pub mod messages;
pub mod utils;

pub use commands::command_handler;
pub use messages::message_handler;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use teloxide::prelude::*;
use tokio::time;

use crate::bot_state::BotState;
use crate::llm::Generator;
use crate::models::UserProfile;
use crate::teacher::prompts;

pub type SharedGenerator = Arc<dyn Generator>;

/// True when this profile should receive its daily reminder now.
/// Times are compared in UTC.
pub fn reminder_due(profile: &UserProfile, now: DateTime<Utc>) -> bool {
    match profile.reminder_time {
        Some(time) => !profile.reminded_today && now.time() >= time,
        None => false,
    }
}

/// Background loop: once the UTC date rolls over, every user becomes
/// eligible again; each tick sends at most one reminder per due user.
/// Missed ticks are skipped, never backfilled.
pub async fn reminder_task(bot: Bot, state: BotState, generator: SharedGenerator) {
    let mut interval = time::interval(time::Duration::from_secs(60));
    let mut last_rollover: NaiveDate = Utc::now().date_naive();

    loop {
        interval.tick().await;
        let now = Utc::now();

        if now.date_naive() > last_rollover {
            state.reset_reminder_flags().await;
            last_rollover = now.date_naive();
        }

        for (chat_id, profile) in state.all_profiles().await {
            if !reminder_due(&profile, now) {
                continue;
            }

            let reminder = generator
                .generate(
                    "You are a succinct, encouraging foreign language teacher.",
                    &prompts::daily_reminder(&profile),
                    &[],
                )
                .await;

            match reminder {
                Ok(text) => {
                    if let Err(e) = bot.send_message(chat_id, text).await {
                        log::error!("❌ Failed to deliver reminder to {}: {}", chat_id, e);
                        continue;
                    }
                    // Written in place: an in-flight handler commit for the
                    // same chat cannot clobber the flag.
                    state.mark_reminded(chat_id).await;
                    log::info!("⏰ Reminder sent to {}", chat_id);
                }
                // Not marked as reminded: the next tick of the same day retries.
                Err(e) => log::error!("❌ Reminder generation failed for {}: {}", chat_id, e),
            }
        }
    }
}
