use crate::{
    commands::help,
    errors::HandlerResult,
    rate_limit::RateLimiter,
    reply::{Replier, Reply},
    request::{ClipRequest, RequesterId},
    runner::ClipRunner,
};

/// `/clip <url> <start> <end>`
///
/// Malformed input gets the usage text, throttled requesters get a fixed
/// notice and job failures a generic retry message. Only a failure to talk to
/// the chat itself is returned as an error.
pub async fn clip(
    replier: &dyn Replier,
    requester: RequesterId,
    args: &str,
    now: i64,
    limiter: &RateLimiter,
    runner: &ClipRunner,
) -> HandlerResult {
    let request = match ClipRequest::parse(args, requester) {
        Ok(request) => request,
        Err(reason) => {
            log::debug!("Malformed clip request from {}: {}", requester, reason);
            return help(replier).await;
        }
    };

    if limiter.exceeds_limit(requester, now).await {
        log::warn!("Rate limited requester {}", requester);
        return replier.reply(Reply::RateLimited).await;
    }

    replier.reply(Reply::Clipping).await?;

    let clip = match runner.run(&request).await {
        Ok(clip) => clip,
        Err(e) => {
            log::error!(
                "Clip of {} [{} - {}] for {} failed: {}",
                request.url,
                request.start_time,
                request.end_time,
                requester,
                e
            );
            return replier.reply(Reply::Failed).await;
        }
    };

    let delivered = replier.send_video(&clip).await;
    clip.remove().await;

    if let Err(e) = delivered {
        log::error!("Delivering clip to {} failed: {}", requester, e);
        return replier.reply(Reply::Failed).await;
    }

    Ok(())
}
