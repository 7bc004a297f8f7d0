use poise::serenity_prelude::{CreateAllowedMentions, CreateAttachment};
use time::OffsetDateTime;

use crate::{
    cooldown::Rejection,
    freefire::FetchError,
    models::player::{Uid, MIN_UID_DIGITS},
    player_card::PlayerCard,
    Context, Error,
};

fn invalid_uid_message() -> String {
    format!("Invalid UID! It must:\n- Be only numbers\n- Have at least {MIN_UID_DIGITS} digits")
}

fn rejection_message(rejection: &Rejection) -> String {
    match rejection {
        Rejection::Cooldown { remaining_secs } => {
            format!("Please wait {remaining_secs}s before using this command again")
        }
        Rejection::DailyLimit { limit } => {
            format!("You have reached the daily limit of {limit} lookups. Try again tomorrow.")
        }
    }
}

fn fetch_error_message(uid: &Uid, error: &FetchError) -> String {
    match error {
        FetchError::NotFound => format!("Player with UID `{uid}` not found."),
        FetchError::Status(_) => String::from("API error. Try again later."),
        e => format!("Unexpected error: `{e}`"),
    }
}

fn ephemeral(content: impl Into<String>) -> poise::CreateReply {
    poise::CreateReply::default()
        .ephemeral(true)
        .content(content)
}

/// displays account and guild stats for a Free Fire player.
#[poise::command(slash_command, prefix_command, guild_only)]
#[tracing::instrument(skip_all, fields(uid = %uid))]
pub async fn info(
    ctx: Context<'_>,
    #[description = "Free Fire UID of the player"] uid: String,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let uid = match uid.parse::<Uid>() {
        Ok(uid) => uid,
        Err(e) => {
            tracing::debug!(err = %e, "rejected malformed uid");

            ctx.send(
                poise::CreateReply::default()
                    .reply(true)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(false))
                    .content(invalid_uid_message()),
            )
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

            return Ok(());
        }
    };

    let data = ctx.data();

    if !data
        .guild_config
        .is_channel_allowed(guild_id, ctx.channel_id())
        .await
    {
        ctx.send(ephemeral("This command is not allowed in this channel."))
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

        return Ok(());
    }

    let limits = data.guild_config.limits_for(guild_id).await;

    if let Err(rejection) = data
        .cooldowns
        .check_and_record(ctx.author().id, OffsetDateTime::now_utc(), limits)
        .await
    {
        ctx.send(ephemeral(rejection_message(&rejection)))
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

        return Ok(());
    }

    ctx.defer_or_broadcast()
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when deferring"))?;

    let info = match data.ff_client.get_player_info(&uid).await {
        Ok(info) => info,
        Err(e) => {
            ctx.say(fetch_error_message(&uid, &e))
                .await
                .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

            return Ok(());
        }
    };

    ctx.send(poise::CreateReply::default().embed(PlayerCard::new(&uid, &info).into_embed()))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    if let Err(e) = send_profile_image(ctx, &uid).await {
        tracing::warn!(err = ?e, "profile image generation failed");
    }

    Ok(())
}

async fn send_profile_image(ctx: Context<'_>, uid: &Uid) -> Result<(), Error> {
    let Some(image) = ctx.data().ff_client.get_profile_image(uid).await? else {
        return Ok(());
    };

    ctx.send(
        poise::CreateReply::default()
            .content("**Character Profile:**")
            .attachment(CreateAttachment::bytes(image, format!("profile_{uid}.png"))),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    fn uid() -> Uid {
        "1234567890".parse().unwrap()
    }

    #[test]
    fn invalid_uid_lists_both_rules() {
        assert_eq!(
            invalid_uid_message(),
            "Invalid UID! It must:\n- Be only numbers\n- Have at least 6 digits"
        );
    }

    #[test]
    fn rejections_explain_the_wait() {
        assert_eq!(
            rejection_message(&Rejection::Cooldown { remaining_secs: 12 }),
            "Please wait 12s before using this command again"
        );
        assert_eq!(
            rejection_message(&Rejection::DailyLimit { limit: 30 }),
            "You have reached the daily limit of 30 lookups. Try again tomorrow."
        );
    }

    #[test]
    fn missing_players_name_the_uid() {
        assert_eq!(
            fetch_error_message(&uid(), &FetchError::NotFound),
            "Player with UID `1234567890` not found."
        );
    }

    #[test]
    fn bad_statuses_ask_to_retry() {
        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY] {
            assert_eq!(
                fetch_error_message(&uid(), &FetchError::Status(status)),
                "API error. Try again later."
            );
        }
    }

    #[test]
    fn decode_failures_are_shown_verbatim() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let expected = format!("Unexpected error: `couldn't decode stats response: {err}`");

        assert_eq!(
            fetch_error_message(&uid(), &FetchError::Decode(err)),
            expected
        );
    }

    #[test]
    fn transport_failures_are_shown_verbatim() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        let expected = format!("Unexpected error: `{err}`");

        assert_eq!(
            fetch_error_message(&uid(), &FetchError::Request(err)),
            expected
        );
    }
}
