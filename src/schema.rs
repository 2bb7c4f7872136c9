use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};

use crate::{
    commands,
    errors::{BotError, HandlerResult},
    rate_limit::RateLimiter,
    reply::TelegramReplier,
    runner::ClipRunner,
};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Show the greeting and usage
    Start(String),
    /// Show usage
    Help,
    /// Clip a video: /clip <url> <start> <end>
    Clip(String),
}

pub fn schema() -> UpdateHandler<BotError> {
    use dptree::case;

    Update::filter_message().branch(
        teloxide::filter_command::<Command, _>()
            // Deep-link payloads (`/start <payload>`) are accepted and ignored
            .branch(case![Command::Start(payload)].endpoint(start))
            .branch(case![Command::Help].endpoint(help))
            .branch(case![Command::Clip(args)].endpoint(clip)),
    )
}

async fn start(bot: Bot, msg: Message) -> HandlerResult {
    let replier = TelegramReplier::new(bot, msg.chat.id);
    let name = msg.from.as_ref().map(|user| user.first_name.as_str());
    commands::start(&replier, name).await
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    let replier = TelegramReplier::new(bot, msg.chat.id);
    commands::help(&replier).await
}

async fn clip(
    bot: Bot,
    msg: Message,
    args: String,
    limiter: Arc<RateLimiter>,
    runner: Arc<ClipRunner>,
) -> HandlerResult {
    let replier = TelegramReplier::new(bot, msg.chat.id);
    let now = chrono::Utc::now().timestamp();
    commands::clip(
        &replier,
        msg.chat.id.into(),
        &args,
        now,
        &limiter,
        &runner,
    )
    .await
}
