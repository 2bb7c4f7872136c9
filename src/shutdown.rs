use std::time::Duration;

use teloxide::dispatching::ShutdownToken;

/// Run `hook` once the process receives SIGTERM.
///
/// The handler is installed before this returns, so from then on SIGTERM no
/// longer terminates the process on its own.
#[cfg(unix)]
pub fn on_terminate<F, Fut>(hook: F) -> std::io::Result<tokio::task::JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    Ok(tokio::spawn(async move {
        if sigterm.recv().await.is_some() {
            log::info!("Received SIGTERM, shutting down");
            hook().await;
        }
    }))
}

/// Ask the dispatcher to stop and wait for in-flight updates to finish.
/// Retries while the dispatcher has not started yet.
pub async fn stop_dispatcher(token: ShutdownToken) {
    loop {
        match token.shutdown() {
            Ok(done) => {
                done.await;
                log::info!("Dispatcher stopped");
                return;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
}
