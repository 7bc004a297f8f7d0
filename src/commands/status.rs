use std::time::UNIX_EPOCH;

use crate::{
    commands::get_bot_avatar,
    constants::{version::get_version, POISE_VERSION, STARTUP_TIME},
    Context, Error,
};
use poise::serenity_prelude as serenity;

/// get the bot's status.
#[poise::command(slash_command, prefix_command)]
#[tracing::instrument(skip_all)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guilds = ctx.data().guild_config.guild_count().await;
    let tracked_users = ctx.data().cooldowns.tracked_users().await;
    let uptime = STARTUP_TIME
        .duration_since(UNIX_EPOCH)
        .map(|d| format!("<t:{}:R>", d.as_secs()))
        .unwrap_or_else(|_| String::from("unknown"));

    ctx.send(poise::CreateReply::default().embed(
        serenity::CreateEmbed::new()
        .field(
            "about the bot",
            "looks up Free Fire player stats and profile cards, using the [poise](https://github.com/serenity-rs/poise) framework.",
            false
        )
        .field("version", get_version(), false)
        .field("rust", format!("[{0}](https://releases.rs/docs/{0})", rustc_version_runtime::version()), true)
        .field("poise", format!("[{0}](https://docs.rs/crate/poise/{0})", POISE_VERSION), true)
        .field("configured servers", guilds.to_string(), true)
        .field("users on cooldown", tracked_users.to_string(), true)
        .field("uptime", uptime, true)
        .thumbnail(get_bot_avatar(ctx))
    ))
    .await
    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}
