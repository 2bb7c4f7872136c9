mod commands;
mod config;
mod errors;
mod rate_limit;
mod reply;
mod request;
mod runner;
mod schema;
mod shutdown;
mod temp_file;
#[cfg(test)]
mod test_log;
mod validator;
mod video;

use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use crate::{
    config::{Config, config_path},
    errors::BotError,
    rate_limit::RateLimiter,
    runner::ClipRunner,
    schema::{Command, schema},
    temp_file::ScratchDir,
    video::YtDlp,
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();

    let path = config_path();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(BotError::ConfigMissing(path)) => {
            log::error!("API key not found, please enter it in {}", path.display());
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let scratch = match ScratchDir::create() {
        Ok(scratch) => scratch,
        Err(e) => {
            log::error!("Failed to create scratch directory: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Scratch directory: {}", scratch.path().display());

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.threshold,
        config.rate_limit.minutes,
    ));
    log::info!(
        "Rate limit: {} requests per {} minutes",
        limiter.threshold(),
        limiter.window_minutes()
    );

    let runner = Arc::new(ClipRunner::new(
        Arc::new(YtDlp::default()),
        scratch.path(),
        config.jobs.max_concurrent,
        config.jobs.timeout(),
    ));

    log::info!("Starting clip bot...");
    let bot = Bot::new(config.api_key());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![limiter, runner])
        .enable_ctrlc_handler()
        .build();

    // Service managers stop us with SIGTERM, which must still clean up the scratch dir
    #[cfg(unix)]
    {
        let token = dispatcher.shutdown_token();
        if let Err(e) = shutdown::on_terminate(move || shutdown::stop_dispatcher(token)) {
            log::warn!("Failed to install SIGTERM handler: {}", e);
        }
    }

    dispatcher.dispatch().await;

    if let Err(e) = scratch.close() {
        log::error!("Failed to remove scratch directory: {}", e);
    }
}
