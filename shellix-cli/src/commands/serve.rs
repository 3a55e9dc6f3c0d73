use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use shellix::ShellixRuntime;
use shellix_shared::constants::envs;

use crate::telegram::{self, BotClient, Update};

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bot token from @BotFather
    #[arg(long, env = envs::TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub api_url: String,

    /// Long-poll timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub poll_timeout: u64,
}

pub async fn execute(args: ServeArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let token = match args.token.filter(|t| !t.trim().is_empty()) {
        Some(token) => token,
        None => anyhow::bail!("Token not found: set {} or pass --token", envs::TOKEN),
    };

    let runtime = Arc::new(global.create_runtime()?);
    let poll_timeout = Duration::from_secs(args.poll_timeout);
    let client = Arc::new(BotClient::new(&args.api_url, &token, poll_timeout)?);
    let username = client.get_me().await?;
    tracing::info!(
        bot = %username,
        engine = %runtime.options().engine_bin,
        "Shellix bot started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut offset = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
            polled = client.get_updates(offset, poll_timeout) => match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        tokio::spawn(dispatch(runtime.clone(), client.clone(), update));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Polling failed, retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }
    Ok(())
}

/// Serve one update. Failures are logged; nothing is retried.
async fn dispatch(runtime: Arc<ShellixRuntime>, client: Arc<BotClient>, update: Update) {
    let Some(routed) = telegram::route(&update) else {
        tracing::trace!(update_id = update.update_id, "Ignoring update");
        return;
    };

    if let Some(callback_id) = &routed.callback_id {
        if let Err(e) = client.answer_callback(callback_id).await {
            tracing::warn!(error = %e, "Failed to answer callback");
        }
    }

    let reply = runtime.handle(&routed.user, routed.request).await;
    if let Err(e) = client.deliver(routed.chat_id, &reply).await {
        tracing::error!(
            user_id = %routed.user,
            chat_id = routed.chat_id,
            error = %e,
            "Failed to deliver reply"
        );
    }
}
