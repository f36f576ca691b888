//! `tallybot run` — Start the bot.
//!
//! Wires the Telegram channel, history store, and mailer into the
//! conversation engine, then drives the engine from the inbound message
//! stream until the process is stopped. Each message is handled to
//! completion (including any mail delivery it triggers) before the next one
//! is read, so events for a session never interleave.

use std::sync::Arc;

use tallybot_channels::{TelegramChannel, TelegramConfig};
use tallybot_config::AppConfig;
use tallybot_core::channel::Channel;
use tallybot_core::event::InboundEvent;
use tallybot_engine::{Engine, Outbound};
use tallybot_history::FileHistory;
use tallybot_mail::{SmtpConfig, SmtpMailer};
use tracing::{debug, info, warn};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Missing credentials are fatal at startup, never a runtime surprise.
    let Some(bot_token) = config.bot_token.clone() else {
        return Err(
            "No bot token configured. Set BOT_TOKEN or add bot_token to config.toml \
             (run `tallybot onboard` to create one)."
                .into(),
        );
    };

    println!("🧾 TallyBot — Starting");
    println!("   SMTP relay: {}:{}", config.smtp.host, config.smtp.port);
    println!("   History:    {}", config.history_path().display());

    let channel = Arc::new(TelegramChannel::new(TelegramConfig {
        bot_token,
        allowed_users: config.telegram.allowed_users.clone(),
        poll_timeout_secs: config.telegram.poll_timeout_secs,
    }));
    let history = Arc::new(FileHistory::new(config.history_path()));
    let mailer = Arc::new(SmtpMailer::new(SmtpConfig {
        host: config.smtp.host.clone(),
        port: config.smtp.port,
        sender: config.smtp.sender.clone(),
    }));

    let mut engine = Engine::new(history, mailer);
    let mut inbound = channel.start().await?;

    info!("TallyBot running, waiting for messages");

    while let Some(received) = inbound.recv().await {
        let msg = match received {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Inbound channel error");
                continue;
            }
        };

        if !channel.is_allowed(&msg.sender_id) {
            debug!(sender_id = %msg.sender_id, "Dropping message from disallowed sender");
            continue;
        }

        let Some(event) = InboundEvent::parse(&msg.content) else {
            debug!(sender_id = %msg.sender_id, "Dropping unrecognized command");
            continue;
        };
        for outbound in engine.handle(&msg.sender_id, event).await {
            let result = match outbound {
                Outbound::Text(text) => channel.send(&msg.chat_id, &text).await,
                Outbound::Document { filename, bytes } => {
                    channel.send_document(&msg.chat_id, &bytes, &filename).await
                }
            };
            if let Err(e) = result {
                warn!(chat_id = %msg.chat_id, error = %e, "Failed to deliver reply");
            }
        }
    }

    info!("Inbound stream closed, shutting down");
    channel.stop().await?;

    Ok(())
}
