use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use premarket_bot::app::{AppContext, DailyUpdateJob};
use premarket_bot::chat::ChatSink;
use premarket_bot::clock::SystemClock;
use premarket_bot::commands::parse_command;
use premarket_bot::config::Config;
use premarket_bot::discord::{DiscordGateway, DiscordRestClient, IncomingMessage};
use premarket_bot::event::{AppEvent, GatewayStatus, SchedulerState};
use premarket_bot::scheduler::{DailySchedule, DailyScheduler};

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn log_event(event: &AppEvent) {
    match event {
        AppEvent::Scheduler(SchedulerState::Waiting { until }) => {
            tracing::debug!(until = %until, "scheduler waiting");
        }
        AppEvent::Scheduler(state) => tracing::debug!(?state, "scheduler state"),
        AppEvent::DailyUpdateCompleted { elapsed_ms } => {
            tracing::info!(elapsed_ms, "daily update posted");
        }
        AppEvent::Gateway(GatewayStatus::Reconnecting { attempt, delay_ms }) => {
            tracing::warn!(attempt, delay_ms, "gateway reconnecting");
        }
        AppEvent::Gateway(status) => tracing::info!(?status, "gateway status"),
        AppEvent::LoggedIn { user } => tracing::info!(user = %user, "logged in"),
        AppEvent::CommandReceived {
            command,
            channel_id,
        } => tracing::debug!(command = %command, channel_id = %channel_id, "command received"),
        AppEvent::LogMessage(msg) => tracing::debug!("{}", msg),
        AppEvent::Error(msg) => tracing::error!("{}", msg),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure .env defines DISCORD_BOT_TOKEN and PREMARKET_CHANNEL_ID");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let schedule = DailySchedule::from_config(&config.schedule)?;
    tracing::info!(
        timezone = %config.schedule.timezone,
        daily_time = %config.schedule.daily_time,
        channel_id = config.discord.premarket_channel_id,
        polygon = config.market.polygon_api_key.is_some(),
        "Starting premarket-bot"
    );

    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(256);
    let (message_tx, mut message_rx) = mpsc::channel::<IncomingMessage>(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let rest = Arc::new(DiscordRestClient::new(
        &config.discord.api_base_url,
        &config.discord.bot_token,
        Duration::from_secs(config.http.timeout_secs.max(1)),
    )?);
    let gateway = DiscordGateway::new(rest.clone(), &config.discord.bot_token);
    let prefix = config.discord.command_prefix.clone();
    let chat: Arc<dyn ChatSink> = rest;
    let ctx = Arc::new(
        AppContext::from_config(config, chat).context("failed to build application context")?,
    );

    // Event log
    tokio::spawn(async move {
        while let Some(event) = app_rx.recv().await {
            log_event(&event);
        }
    });

    // Daily scheduler
    let scheduler = DailyScheduler::new(schedule, Arc::new(SystemClock));
    let job = Arc::new(DailyUpdateJob::new(ctx.clone()));
    let scheduler_events = app_tx.clone();
    let scheduler_shutdown = shutdown_rx.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(job, scheduler_events, scheduler_shutdown).await;
    });

    // Gateway
    let gateway_events = app_tx.clone();
    let gateway_shutdown = shutdown_rx.clone();
    let gateway_handle = tokio::spawn(async move {
        if let Err(e) = gateway
            .connect_and_run(message_tx, gateway_events, gateway_shutdown)
            .await
        {
            tracing::error!(error = %format!("{:#}", e), "gateway task failed");
        }
    });

    // Ctrl+C handler
    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = ctrl_c_shutdown.send(true);
    });

    let mut shutdown = shutdown_rx.clone();
    loop {
        tokio::select! {
            msg = message_rx.recv() => {
                let Some(msg) = msg else { break };
                let Some(command) = parse_command(&prefix, &msg.content) else {
                    continue;
                };
                let _ = app_tx
                    .send(AppEvent::CommandReceived {
                        command: command.name().to_string(),
                        channel_id: msg.channel_id.to_string(),
                    })
                    .await;
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    ctx.handle_command(msg.channel_id, command).await;
                });
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(scheduler_handle, gateway_handle);
    tracing::info!("premarket-bot stopped");
    Ok(())
}
