use async_trait::async_trait;
use strum::Display;
use teloxide::{
    prelude::*,
    types::{ChatId, InputFile},
};

use crate::{
    errors::HandlerResult,
    temp_file::ClipFile,
    video::VideoInfo,
};

/// Fixed texts shown to requesters. Nothing else reaches the chat.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    #[strum(to_string = "Usage:\n/clip https://www.youtube.com/watch?v=dQw4w9WgXcQ 00:00:00 00:00:05")]
    Usage,
    #[strum(to_string = "Clipping...")]
    Clipping,
    #[strum(to_string = "Too many requests, please wait a few minutes and try again")]
    RateLimited,
    #[strum(to_string = "Something went wrong somehow, please try again later")]
    Failed,
}

pub fn greeting(name: Option<&str>) -> String {
    match name {
        Some(name) => format!(
            "Hi {}! Send me a YT link and a time range and I'll clip it for you!",
            name
        ),
        None => "Hi! Send me a YT link and a time range and I'll clip it for you!".to_string(),
    }
}

/// Outgoing side of a conversation with one requester
#[async_trait]
pub trait Replier: Send + Sync {
    async fn send_text(&self, text: &str) -> HandlerResult;

    async fn send_video(&self, clip: &ClipFile) -> HandlerResult;

    async fn reply(&self, reply: Reply) -> HandlerResult {
        self.send_text(&reply.to_string()).await
    }
}

pub struct TelegramReplier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReplier {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Replier for TelegramReplier {
    async fn send_text(&self, text: &str) -> HandlerResult {
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn send_video(&self, clip: &ClipFile) -> HandlerResult {
        let mut request = self
            .bot
            .send_video(self.chat_id, InputFile::file(clip.path()))
            .supports_streaming(true);

        match VideoInfo::from_file(clip.path()).await {
            Ok(info) => {
                request = request.width(info.width).height(info.height);
                if info.duration > 0.0 {
                    request = request.duration(info.duration.round() as u32);
                }
            }
            Err(e) => log::warn!("Could not read video info of {}: {}", clip.path().display(), e),
        }

        request.await?;
        Ok(())
    }
}
