use crate::{
    errors::HandlerResult,
    reply::{Replier, Reply},
};

pub async fn help(replier: &dyn Replier) -> HandlerResult {
    replier.reply(Reply::Usage).await
}
