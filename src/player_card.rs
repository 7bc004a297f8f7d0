use std::fmt::Display;

use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter, Timestamp};
use thousands::Separable;
use time::{macros::format_description, OffsetDateTime};

use crate::{
    constants::freefire::{EMBED_COLOUR, EMBED_FOOTER, FREE_FIRE_ICON_URL},
    models::player::{PlayerInfo, Uid},
};

const NOT_AVAILABLE: &str = "N/A";
const NOT_RANKED: &str = "Not Ranked";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardField {
    pub name: &'static str,
    pub value: String,
}

/// The rendered contents of a player lookup, before it becomes an embed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerCard {
    pub title: String,
    pub show_thumbnail: bool,
    pub fields: Vec<CardField>,
}

impl PlayerCard {
    pub fn new(uid: &Uid, info: &PlayerInfo) -> Self {
        let basic = info.basic_info.clone().unwrap_or_default();
        let nickname = basic.nickname.as_deref().filter(|n| !n.is_empty());

        let mut fields = vec![
            CardField {
                name: "📋 ACCOUNT INFORMATION",
                value: format!(
                    "**Name:** {}\n**UID:** `{uid}`\n**Level:** {}\n**Experience:** {}\n**Region:** {}\n**Honor Score:** {}",
                    or_na(nickname),
                    or_na(basic.level),
                    or_na(basic.exp.map(|exp| exp.separate_with_commas())),
                    or_na(basic.region.as_deref()),
                    or_na(info.credit_score_info.as_ref().and_then(|c| c.credit_score)),
                ),
            },
            CardField {
                name: "🏆 RANK STATISTICS",
                value: format!(
                    "**Battle Royale Rank:** {}\n**Clash Squad Rank:** {}\n**BP Badges:** {}",
                    rank(basic.show_br_rank, basic.ranking_points),
                    rank(basic.show_cs_rank, basic.cs_ranking_points),
                    or_na(basic.badge_cnt),
                ),
            },
            CardField {
                name: "📅 ACCOUNT ACTIVITY",
                value: format!(
                    "**Created At:** {}\n**Last Login:** {}\n**Recent OB:** {}",
                    format_unix(basic.create_at),
                    format_unix(basic.last_login_at),
                    or_na(basic.release_version.as_deref()),
                ),
            },
        ];

        let signature = info
            .social_info
            .as_ref()
            .and_then(|s| s.signature.as_deref())
            .filter(|s| !s.is_empty() && *s != "None");

        if let Some(signature) = signature {
            fields.push(CardField {
                name: "💬 SIGNATURE",
                value: format!("*{signature}*"),
            });
        }

        if let Some(clan) = &info.clan_basic_info {
            let mut value = format!(
                "**Name:** {}\n**ID:** `{}`\n**Level:** {}\n**Members:** {}/{}",
                or_na(clan.clan_name.as_deref()),
                or_na(clan.clan_id),
                or_na(clan.clan_level),
                or_na(clan.member_num),
                or_na(clan.capacity),
            );

            if let Some(captain) = &info.captain_basic_info {
                value.push_str(&format!(
                    "\n**Leader:** {} (UID: `{}`)",
                    or_na(captain.nickname.as_deref()),
                    or_na(captain.account_id),
                ));
            }

            fields.push(CardField {
                name: "🏰 GUILD INFORMATION",
                value,
            });
        }

        Self {
            title: format!(
                "🎮 {}'s Free Fire Stats",
                nickname.unwrap_or("Unknown Player")
            ),
            show_thumbnail: nickname.is_some(),
            fields,
        }
    }

    pub fn into_embed(self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(self.title)
            .colour(EMBED_COLOUR)
            .timestamp(Timestamp::now())
            .footer(CreateEmbedFooter::new(EMBED_FOOTER).icon_url(FREE_FIRE_ICON_URL));

        if self.show_thumbnail {
            embed = embed.thumbnail(FREE_FIRE_ICON_URL);
        }

        for field in self.fields {
            embed = embed.field(field.name, field.value, false);
        }

        embed
    }
}

fn or_na(value: Option<impl Display>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |v| v.to_string())
}

fn rank(shown: bool, points: Option<i64>) -> String {
    if shown {
        or_na(points)
    } else {
        NOT_RANKED.to_owned()
    }
}

/// Zero means the API doesn't know, same as a missing value.
fn format_unix(timestamp: Option<i64>) -> String {
    timestamp
        .filter(|ts| *ts != 0)
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .and_then(|dt| {
            dt.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .ok()
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
}
