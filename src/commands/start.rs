use crate::{
    commands::help,
    errors::HandlerResult,
    reply::{Replier, greeting},
};

pub async fn start(replier: &dyn Replier, name: Option<&str>) -> HandlerResult {
    replier.send_text(&greeting(name)).await?;
    help(replier).await
}
