use poise::serenity_prelude::{CreateEmbed, GuildChannel};

use crate::{cooldown::MAX_TRACKED_AGE, Context, Error};

/// manage where the info command can be used.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "infochannel",
    required_permissions = "MANAGE_CHANNELS",
    subcommand_required,
    subcommands("add", "remove", "list", "clear", "cooldown", "limit")
)]
pub async fn info_channel(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// allow the info command in a channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
#[tracing::instrument(skip_all)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "channel to allow (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let channel_id = channel.map_or(ctx.channel_id(), |c| c.id);

    let added = ctx
        .data()
        .guild_config
        .add_channel(guild_id, channel_id)
        .await?;

    let content = if added {
        tracing::info!(guild = %guild_id, channel = %channel_id, "allowed info channel");
        format!("the info command can now be used in <#{channel_id}>.")
    } else {
        format!("<#{channel_id}> is already allowed.")
    };

    ctx.say(content)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// stop allowing the info command in a channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
#[tracing::instrument(skip_all)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "channel to remove (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let channel_id = channel.map_or(ctx.channel_id(), |c| c.id);

    let removed = ctx
        .data()
        .guild_config
        .remove_channel(guild_id, channel_id)
        .await?;

    let content = if !removed {
        format!("<#{channel_id}> wasn't in the list.")
    } else if ctx.data().guild_config.channels(guild_id).await.is_empty() {
        tracing::info!(guild = %guild_id, channel = %channel_id, "removed last info channel");
        format!("removed <#{channel_id}>. no channels are left, so the info command works everywhere again.")
    } else {
        tracing::info!(guild = %guild_id, channel = %channel_id, "removed info channel");
        format!("removed <#{channel_id}>.")
    };

    ctx.say(content)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// show the allowed channels and the limits for this server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
#[tracing::instrument(skip_all)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let config = &ctx.data().guild_config;

    let channels = config.channels(guild_id).await;
    let limits = config.limits_for(guild_id).await;

    let channels_str = if channels.is_empty() {
        String::from("all channels")
    } else {
        channels
            .iter()
            .map(|c| format!("<#{c}>"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let daily_limit_str = match limits.daily_limit {
        0 => String::from("unlimited"),
        n => format!("{n} lookups per user"),
    };

    ctx.send(
        poise::CreateReply::default().embed(
            CreateEmbed::default()
                .title("info command settings")
                .field("allowed channels", channels_str, false)
                .field("cooldown", format!("{}s", limits.cooldown.as_secs()), true)
                .field("daily limit", daily_limit_str, true),
        ),
    )
    .await
    .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// allow the info command in every channel again.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
#[tracing::instrument(skip_all)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let cleared = ctx.data().guild_config.clear_channels(guild_id).await?;

    let content = if cleared == 0 {
        String::from("there were no channel restrictions to clear.")
    } else {
        tracing::info!(guild = %guild_id, cleared, "cleared info channels");
        format!("cleared {cleared} channel(s). the info command works everywhere now.")
    };

    ctx.say(content)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// set the per-user cooldown, or reset it to the default.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
#[tracing::instrument(skip_all)]
pub async fn cooldown(
    ctx: Context<'_>,
    #[description = "cooldown in seconds (leave empty to reset)"]
    #[max = 86400]
    seconds: Option<u64>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    if seconds.is_some_and(|s| s > MAX_TRACKED_AGE.as_secs()) {
        ctx.say(format!(
            "the cooldown can be at most {}s.",
            MAX_TRACKED_AGE.as_secs()
        ))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

        return Ok(());
    }

    let config = &ctx.data().guild_config;
    config.set_cooldown(guild_id, seconds).await?;

    let effective = config.limits_for(guild_id).await.cooldown.as_secs();
    tracing::info!(guild = %guild_id, cooldown = effective, "updated info cooldown");

    let content = match seconds {
        Some(_) => format!("the cooldown is now {effective}s."),
        None => format!("reset the cooldown to the default of {effective}s."),
    };

    ctx.say(content)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

/// set how many lookups a user gets per day (0 for unlimited), or reset it to the default.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
#[tracing::instrument(skip_all)]
pub async fn limit(
    ctx: Context<'_>,
    #[description = "lookups per user per day (leave empty to reset)"] count: Option<u32>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let config = &ctx.data().guild_config;
    config.set_daily_limit(guild_id, count).await?;

    let effective = config.limits_for(guild_id).await.daily_limit;
    tracing::info!(guild = %guild_id, daily_limit = effective, "updated info daily limit");

    let content = match (count, effective) {
        (_, 0) => String::from("users can now look up players without a daily limit."),
        (Some(_), n) => format!("users can now do {n} lookups per day."),
        (None, n) => format!("reset the daily limit to the default of {n} lookups."),
    };

    ctx.say(content)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}
