use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use futures::StreamExt;
use poise::serenity_prelude::{self as serenity, Client, ClientBuilder};
use time::OffsetDateTime;
use tracing::Instrument;

use crate::{
    commands,
    constants::freefire::{
        DEFAULT_CONFIG_PATH, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_INFO_API_URL,
        DEFAULT_PROFILE_API_URL,
    },
    cooldown::Cooldowns,
    event_handler,
    freefire::FreeFireClient,
    guild_config::GuildConfigStore,
    Data, Error,
};

const COOLDOWN_PRUNE_INTERVAL: Duration = Duration::from_secs(900);

struct Settings {
    token: String,
    prefix: String,
    info_api_url: String,
    profile_api_url: String,
    config_path: String,
    http_timeout: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Unset or empty means the default.
fn parse_http_timeout(secs: Option<String>) -> anyhow::Result<Duration> {
    let secs = match secs.as_deref().map(str::trim) {
        Some(secs) if !secs.is_empty() => secs
            .parse::<u64>()
            .with_context(|| format!("invalid HTTP_TIMEOUT_SECS: {secs}"))?,
        _ => DEFAULT_HTTP_TIMEOUT_SECS,
    };

    Ok(Duration::from_secs(secs))
}

fn init_settings() -> anyhow::Result<Settings> {
    let token = std::env::var("DISCORD_TOKEN").context("missing DISCORD_TOKEN")?;
    let http_timeout = parse_http_timeout(std::env::var("HTTP_TIMEOUT_SECS").ok())?;

    let settings = Settings {
        token,
        prefix: env_or("BOT_PREFIX", "!"),
        info_api_url: env_or("INFO_API_URL", DEFAULT_INFO_API_URL),
        profile_api_url: env_or("PROFILE_API_URL", DEFAULT_PROFILE_API_URL),
        config_path: env_or("INFO_CONFIG_PATH", DEFAULT_CONFIG_PATH),
        http_timeout,
    };

    tracing::info!(
        prefix = %settings.prefix,
        info_api_url = %settings.info_api_url,
        profile_api_url = %settings.profile_api_url,
        config_path = %settings.config_path,
        "loaded settings"
    );

    Ok(settings)
}

fn init_ff_client(settings: &Settings) -> anyhow::Result<FreeFireClient> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.http_timeout)
        .build()?;

    Ok(FreeFireClient::new(
        client,
        &settings.info_api_url,
        &settings.profile_api_url,
    ))
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command = ctx.command().qualified_name.clone();
            tracing::error!(err = ?error, command = %command, "an error occurred when running command");

            let _ = ctx
                .say("something went wrong while running that command.")
                .await
                .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"));
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!(err = ?e, "an error occurred when handling framework error");
            }
        }
    }
}

async fn init_discord_client(settings: &Settings, data: Data) -> anyhow::Result<Client> {
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::info::info(),
                commands::info_channel::info_channel(),
                commands::help::help(),
                commands::status::status(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(settings.prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands)
                    .await
                    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when registering commands"))?;

                Ok(data)
            }.in_current_span())
        })
        .build();

    let client = ClientBuilder::new(&settings.token, intents)
        .framework(framework)
        .activity(serenity::ActivityData {
            name: "free fire stats".into(),
            kind: serenity::ActivityType::Watching,
            state: None,
            url: None,
        })
        .await?;

    Ok(client)
}

fn spawn_background_tasks(data: &Data) {
    let cooldowns = data.cooldowns.clone();

    tracing::info!("initialized cooldown pruner!");

    tokio::spawn(
        async move {
            let interval = tokio::time::interval(COOLDOWN_PRUNE_INTERVAL);
            let task = futures::stream::unfold(interval, move |mut interval| {
                let cooldowns = cooldowns.clone();

                async move {
                    interval.tick().await;

                    let pruned = cooldowns.prune(OffsetDateTime::now_utc()).await;
                    if pruned > 0 {
                        tracing::debug!(pruned, "pruned idle cooldown entries");
                    }

                    Some(((), interval))
                }
            });

            task.for_each(|_| async {}).await;
        }
        .in_current_span(),
    );
}

pub async fn init() -> anyhow::Result<Client> {
    tracing::info!("initializing... please wait warmly.");

    let settings = init_settings()?;
    let ff_client = init_ff_client(&settings)?;
    let guild_config = Arc::new(GuildConfigStore::load(&settings.config_path));

    if !std::path::Path::new(&settings.config_path).exists() {
        tracing::info!(path = %settings.config_path, "writing default config");
        guild_config.save().await?;
    }

    let cooldowns = Arc::new(Cooldowns::new());

    let data = Data {
        ff_client,
        guild_config,
        cooldowns,
    };

    let client = init_discord_client(&settings, data.clone()).await?;
    spawn_background_tasks(&data);

    tracing::info!("finished initializing!");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn http_timeout_defaults_when_unset_or_empty() {
        let default = Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS);

        assert_eq!(parse_http_timeout(None).unwrap(), default);
        assert_eq!(parse_http_timeout(Some(String::new())).unwrap(), default);
        assert_eq!(parse_http_timeout(Some(String::from("  "))).unwrap(), default);
    }

    #[test]
    fn http_timeout_is_parsed_or_rejected() {
        assert_eq!(
            parse_http_timeout(Some(String::from("5"))).unwrap(),
            Duration::from_secs(5)
        );
        assert!(parse_http_timeout(Some(String::from("soon"))).is_err());
    }
}
