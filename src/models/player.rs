use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

pub const MIN_UID_DIGITS: usize = 6;

/// A Free Fire account id, as typed by the user.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Uid(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UidError {
    #[error("uid must only contain digits")]
    NotNumeric,

    #[error("uid must have at least {MIN_UID_DIGITS} digits")]
    TooShort,
}

impl FromStr for Uid {
    type Err = UidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UidError::NotNumeric);
        }

        if s.len() < MIN_UID_DIGITS {
            return Err(UidError::TooShort);
        }

        Ok(Uid(s.to_owned()))
    }
}

impl Uid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    #[serde(default, deserialize_with = "non_empty")]
    pub basic_info: Option<BasicInfo>,

    #[serde(default, deserialize_with = "non_empty")]
    pub captain_basic_info: Option<CaptainBasicInfo>,

    #[serde(default, deserialize_with = "non_empty")]
    pub clan_basic_info: Option<ClanBasicInfo>,

    #[serde(default, deserialize_with = "non_empty")]
    pub credit_score_info: Option<CreditScoreInfo>,

    #[serde(default, deserialize_with = "non_empty")]
    pub social_info: Option<SocialInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub level: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub exp: Option<i64>,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub ranking_points: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub show_br_rank: bool,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub cs_ranking_points: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub show_cs_rank: bool,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub badge_cnt: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub create_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub last_login_at: Option<i64>,
    pub release_version: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainBasicInfo {
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub account_id: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanBasicInfo {
    pub clan_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub clan_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub clan_level: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub member_num: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub capacity: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScoreInfo {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub credit_score: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialInfo {
    pub signature: Option<String>,
}

/// `null` and `{}` both mean the section is missing.
fn non_empty<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// The stats API is inconsistent about quoting numbers, so accept both.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "True" | "1"),
        _ => false,
    })
}
