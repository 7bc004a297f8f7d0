use std::sync::Arc;

use constants::STARTUP_TIME;
use cooldown::Cooldowns;
use freefire::FreeFireClient;
use guild_config::GuildConfigStore;
use poise::serenity_prelude as serenity;

#[derive(Clone)]
struct Data {
    ff_client: FreeFireClient,
    guild_config: Arc<GuildConfigStore>,
    cooldowns: Arc<Cooldowns>,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

mod commands;
mod constants;
mod cooldown;
mod freefire;
mod guild_config;
mod init;
mod models;
mod player_card;
mod telemetry;

#[tracing::instrument(skip_all)]
async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        let configured_guilds = data.guild_config.guild_count().await;

        tracing::info!(
            user = %data_about_bot.user.name,
            guilds = data_about_bot.guilds.len(),
            configured_guilds,
            "connected to discord!"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = &*STARTUP_TIME;

    let telemetry = telemetry::init_telemetry()?;

    let result = match init::init().await {
        Ok(mut client) => client
            .start()
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "the discord client stopped with an error"))
            .map_err(anyhow::Error::from),
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when initializing");
            Err(e)
        }
    };

    telemetry.shutdown();

    result
}
