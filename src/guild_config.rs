//! Per-guild settings for the `info` command, persisted as a JSON document.
//!
//! Guilds list the channels the command may be used in and can override the
//! global cooldown and daily limit. IDs are stored as strings. Keys this
//! module doesn't know about are carried through untouched, since the file
//! is shared with other tooling.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use poise::serenity_prelude::{ChannelId, GuildId};
use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Map, Value};
use tokio::sync::RwLock;

use crate::{
    constants::freefire::{DEFAULT_COOLDOWN_SECS, DEFAULT_DAILY_LIMIT},
    cooldown::Limits,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't write the config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("couldn't serialize the config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildConfigFile {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,

    #[serde(default)]
    pub global_settings: GlobalSettings,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Kept for compatibility with existing files. Guilds without a channel
    /// list are unrestricted regardless of this flag.
    #[serde(default)]
    pub default_all_channels: bool,

    #[serde(default = "default_cooldown")]
    pub default_cooldown: u64,

    #[serde(default = "default_daily_limit")]
    pub default_daily_limit: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_all_channels: false,
            default_cooldown: DEFAULT_COOLDOWN_SECS,
            default_daily_limit: DEFAULT_DAILY_LIMIT,
            extra: Map::new(),
        }
    }
}

fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

fn default_daily_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub info_channels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ServerOverrides>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GuildConfigFile {
    /// A guild with no usable channel IDs listed may use the command
    /// anywhere.
    pub fn is_channel_allowed(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        let channels = self.channels(guild_id);
        channels.is_empty() || channels.contains(&channel_id)
    }

    pub fn limits_for(&self, guild_id: GuildId) -> Limits {
        let overrides = self
            .servers
            .get(&guild_id.to_string())
            .and_then(|entry| entry.config.as_ref());

        let cooldown = overrides
            .and_then(|o| o.cooldown)
            .unwrap_or(self.global_settings.default_cooldown);
        let daily_limit = overrides
            .and_then(|o| o.daily_limit)
            .unwrap_or(self.global_settings.default_daily_limit);

        Limits {
            cooldown: Duration::from_secs(cooldown),
            daily_limit,
        }
    }

    pub fn channels(&self, guild_id: GuildId) -> Vec<ChannelId> {
        self.servers
            .get(&guild_id.to_string())
            .map(|entry| {
                entry
                    .info_channels
                    .iter()
                    .filter_map(|c| parse_channel_id(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn entry_mut(&mut self, guild_id: GuildId) -> &mut ServerEntry {
        self.servers.entry(guild_id.to_string()).or_default()
    }

    fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;

        Ok(buf)
    }
}

fn parse_channel_id(id: &str) -> Option<ChannelId> {
    id.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
}

/// Shared handle to the config document and the file backing it.
pub struct GuildConfigStore {
    path: PathBuf,
    file: RwLock<GuildConfigFile>,
}

impl GuildConfigStore {
    /// Reads the config at `path`. Missing or unreadable files fall back to
    /// the defaults, so this never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = read_config_file(&path);

        Self {
            path,
            file: RwLock::new(file),
        }
    }

    pub async fn is_channel_allowed(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        self.file
            .read()
            .await
            .is_channel_allowed(guild_id, channel_id)
    }

    pub async fn limits_for(&self, guild_id: GuildId) -> Limits {
        self.file.read().await.limits_for(guild_id)
    }

    pub async fn channels(&self, guild_id: GuildId) -> Vec<ChannelId> {
        self.file.read().await.channels(guild_id)
    }

    pub async fn guild_count(&self) -> usize {
        self.file.read().await.servers.len()
    }

    /// Returns `false` if the channel was already allowed.
    pub async fn add_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, ConfigError> {
        let mut file = self.file.write().await;
        let mut next = file.clone();
        let entry = next.entry_mut(guild_id);

        if entry
            .info_channels
            .iter()
            .any(|c| parse_channel_id(c) == Some(channel_id))
        {
            return Ok(false);
        }

        entry.info_channels.push(channel_id.to_string());
        self.persist(&next).await?;
        *file = next;

        Ok(true)
    }

    /// Returns `false` if the channel wasn't in the list.
    pub async fn remove_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<bool, ConfigError> {
        let mut file = self.file.write().await;
        let mut next = file.clone();

        let Some(entry) = next.servers.get_mut(&guild_id.to_string()) else {
            return Ok(false);
        };

        let before = entry.info_channels.len();
        entry
            .info_channels
            .retain(|c| parse_channel_id(c) != Some(channel_id));

        if entry.info_channels.len() == before {
            return Ok(false);
        }

        self.persist(&next).await?;
        *file = next;

        Ok(true)
    }

    /// Removes every channel restriction for the guild, returning how many
    /// channels were listed.
    pub async fn clear_channels(&self, guild_id: GuildId) -> Result<usize, ConfigError> {
        let mut file = self.file.write().await;
        let mut next = file.clone();

        let Some(entry) = next.servers.get_mut(&guild_id.to_string()) else {
            return Ok(0);
        };

        let cleared = std::mem::take(&mut entry.info_channels).len();
        if cleared > 0 {
            self.persist(&next).await?;
            *file = next;
        }

        Ok(cleared)
    }

    /// `None` resets the guild to the global default.
    pub async fn set_cooldown(
        &self,
        guild_id: GuildId,
        cooldown_secs: Option<u64>,
    ) -> Result<(), ConfigError> {
        let mut file = self.file.write().await;
        let mut next = file.clone();
        next.entry_mut(guild_id)
            .config
            .get_or_insert_with(Default::default)
            .cooldown = cooldown_secs;

        self.persist(&next).await?;
        *file = next;

        Ok(())
    }

    /// `None` resets the guild to the global default.
    pub async fn set_daily_limit(
        &self,
        guild_id: GuildId,
        daily_limit: Option<u32>,
    ) -> Result<(), ConfigError> {
        let mut file = self.file.write().await;
        let mut next = file.clone();
        next.entry_mut(guild_id)
            .config
            .get_or_insert_with(Default::default)
            .daily_limit = daily_limit;

        self.persist(&next).await?;
        *file = next;

        Ok(())
    }

    pub async fn save(&self) -> Result<(), ConfigError> {
        let file = self.file.write().await;
        self.persist(&file).await
    }

    /// Callers hold the write lock, which keeps concurrent saves from
    /// clobbering each other's temp file.
    async fn persist(&self, file: &GuildConfigFile) -> Result<(), ConfigError> {
        let json = file.to_pretty_json().inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when serializing config"),
        )?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await.inspect_err(
            |e| tracing::error!(err = ?e, path = %tmp.display(), "an error occurred when writing config"),
        )?;
        tokio::fs::rename(&tmp, &self.path).await.inspect_err(
            |e| tracing::error!(err = ?e, path = %self.path.display(), "an error occurred when replacing config"),
        )?;

        tracing::debug!(path = %self.path.display(), "saved config");

        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.to_path_buf().into_os_string();
    backup.push(".bak");
    PathBuf::from(backup)
}

fn read_config_file(path: &Path) -> GuildConfigFile {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file found, using defaults.");
            return GuildConfigFile::default();
        }
        Err(e) => {
            tracing::error!(err = ?e, path = %path.display(), "an error occurred when reading config, using defaults");
            return GuildConfigFile::default();
        }
    };

    match serde_json::from_str::<GuildConfigFile>(&text) {
        Ok(file) => {
            tracing::info!(path = %path.display(), guilds = file.servers.len(), "loaded config");
            file
        }
        Err(e) => {
            tracing::error!(err = ?e, path = %path.display(), "an error occurred when parsing config, using defaults");

            // the next save overwrites the file, so keep what was there
            let backup = backup_path(path);
            match std::fs::write(&backup, &text) {
                Ok(()) => tracing::warn!(path = %backup.display(), "backed up unparsable config"),
                Err(e) => tracing::error!(err = ?e, path = %backup.display(), "an error occurred when backing up config"),
            }

            GuildConfigFile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    const GUILD: GuildId = GuildId::new(111_111_111_111);
    const OTHER_GUILD: GuildId = GuildId::new(222_222_222_222);
    const CHANNEL: ChannelId = ChannelId::new(333_333_333_333);
    const OTHER_CHANNEL: ChannelId = ChannelId::new(444_444_444_444);

    fn parse(value: Value) -> GuildConfigFile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let file = parse(json!({ "servers": {} }));

        assert_eq!(file.global_settings, GlobalSettings::default());

        let file = parse(json!({ "global_settings": { "default_cooldown": 5 } }));

        assert!(file.servers.is_empty());
        assert_eq!(file.global_settings.default_cooldown, 5);
        assert_eq!(file.global_settings.default_daily_limit, DEFAULT_DAILY_LIMIT);
        assert!(!file.global_settings.default_all_channels);
    }

    #[test]
    fn unconfigured_guilds_allow_every_channel() {
        let file = parse(json!({
            "servers": { "111111111111": { "info_channels": [] } }
        }));

        assert!(file.is_channel_allowed(GUILD, CHANNEL));
        assert!(file.is_channel_allowed(OTHER_GUILD, CHANNEL));
    }

    #[test]
    fn restricted_guilds_only_allow_listed_channels() {
        let file = parse(json!({
            "servers": { "111111111111": { "info_channels": ["333333333333"] } }
        }));

        assert!(file.is_channel_allowed(GUILD, CHANNEL));
        assert!(!file.is_channel_allowed(GUILD, OTHER_CHANNEL));
        assert!(file.is_channel_allowed(OTHER_GUILD, OTHER_CHANNEL));
    }

    #[test]
    fn guild_overrides_take_precedence() {
        let file = parse(json!({
            "servers": {
                "111111111111": { "info_channels": [], "config": { "cooldown": 5 } },
                "222222222222": { "info_channels": [] }
            },
            "global_settings": { "default_cooldown": 60, "default_daily_limit": 10 }
        }));

        assert_eq!(
            file.limits_for(GUILD),
            Limits {
                cooldown: Duration::from_secs(5),
                daily_limit: 10,
            }
        );
        assert_eq!(
            file.limits_for(OTHER_GUILD),
            Limits {
                cooldown: Duration::from_secs(60),
                daily_limit: 10,
            }
        );
    }

    #[test]
    fn channels_skips_garbage_ids() {
        let file = parse(json!({
            "servers": {
                "111111111111": { "info_channels": ["333333333333", "general", "0"] }
            }
        }));

        assert_eq!(file.channels(GUILD), vec![CHANNEL]);
        assert!(file.channels(OTHER_GUILD).is_empty());
    }

    #[test]
    fn garbage_only_lists_leave_every_channel_open() {
        let file = parse(json!({
            "servers": { "111111111111": { "info_channels": ["general", "0"] } }
        }));

        assert!(file.channels(GUILD).is_empty());
        assert!(file.is_channel_allowed(GUILD, CHANNEL));
        assert!(file.is_channel_allowed(GUILD, OTHER_CHANNEL));
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = GuildConfigStore::load(dir.path().join("info_channels.json"));

        assert_eq!(store.guild_count().await, 0);
        assert_eq!(
            store.limits_for(GUILD).await,
            Limits {
                cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
                daily_limit: DEFAULT_DAILY_LIMIT,
            }
        );
    }

    #[tokio::test]
    async fn malformed_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info_channels.json");
        std::fs::write(&path, "{ \"servers\": [unclosed").unwrap();

        let store = GuildConfigStore::load(&path);

        assert_eq!(*store.file.read().await, GuildConfigFile::default());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("info_channels.json.bak")).unwrap(),
            "{ \"servers\": [unclosed"
        );
    }

    #[tokio::test]
    async fn wrongly_typed_file_is_backed_up_before_saving() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info_channels.json");
        let original = r#"{ "servers": { "111111111111": { "info_channels": [333333333333] } } }"#;
        std::fs::write(&path, original).unwrap();

        let store = GuildConfigStore::load(&path);
        store.add_channel(GUILD, OTHER_CHANNEL).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("info_channels.json.bak")).unwrap(),
            original
        );
        assert!(!GuildConfigStore::load(&path).is_channel_allowed(GUILD, CHANNEL).await);
    }

    #[tokio::test]
    async fn failed_writes_leave_the_config_untouched() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let path = missing.join("info_channels.json");
        let store = GuildConfigStore::load(&path);

        assert!(store.add_channel(GUILD, CHANNEL).await.is_err());
        assert!(store.set_cooldown(GUILD, Some(5)).await.is_err());
        assert!(store.set_daily_limit(GUILD, Some(1)).await.is_err());
        assert_eq!(*store.file.read().await, GuildConfigFile::default());

        std::fs::create_dir(&missing).unwrap();

        assert!(store.add_channel(GUILD, CHANNEL).await.unwrap());
        assert!(path.exists());

        std::fs::remove_dir_all(&missing).unwrap();

        assert!(store.remove_channel(GUILD, CHANNEL).await.is_err());
        assert!(store.clear_channels(GUILD).await.is_err());
        assert_eq!(store.channels(GUILD).await, vec![CHANNEL]);

        std::fs::create_dir(&missing).unwrap();

        assert!(store.remove_channel(GUILD, CHANNEL).await.unwrap());
        assert!(GuildConfigStore::load(&path).channels(GUILD).await.is_empty());
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info_channels.json");
        let store = GuildConfigStore::load(&path);

        assert!(store.add_channel(GUILD, CHANNEL).await.unwrap());
        assert!(!store.add_channel(GUILD, CHANNEL).await.unwrap());
        assert!(store.add_channel(GUILD, OTHER_CHANNEL).await.unwrap());
        assert!(store.remove_channel(GUILD, OTHER_CHANNEL).await.unwrap());
        assert!(!store.remove_channel(GUILD, OTHER_CHANNEL).await.unwrap());
        store.set_cooldown(GUILD, Some(12)).await.unwrap();

        let reloaded = GuildConfigStore::load(&path);

        assert_eq!(reloaded.channels(GUILD).await, vec![CHANNEL]);
        assert!(!reloaded.is_channel_allowed(GUILD, OTHER_CHANNEL).await);
        assert_eq!(
            reloaded.limits_for(GUILD).await.cooldown,
            Duration::from_secs(12)
        );
        assert!(!dir.path().join("info_channels.json.tmp").exists());
    }

    #[tokio::test]
    async fn resetting_overrides_falls_back_to_globals() {
        let dir = tempdir().unwrap();
        let store = GuildConfigStore::load(dir.path().join("info_channels.json"));

        store.set_daily_limit(GUILD, Some(3)).await.unwrap();
        assert_eq!(store.limits_for(GUILD).await.daily_limit, 3);

        store.set_daily_limit(GUILD, None).await.unwrap();
        assert_eq!(
            store.limits_for(GUILD).await.daily_limit,
            DEFAULT_DAILY_LIMIT
        );
    }

    #[tokio::test]
    async fn clear_channels_lifts_the_restriction() {
        let dir = tempdir().unwrap();
        let store = GuildConfigStore::load(dir.path().join("info_channels.json"));

        store.add_channel(GUILD, CHANNEL).await.unwrap();
        store.add_channel(GUILD, OTHER_CHANNEL).await.unwrap();

        assert_eq!(store.clear_channels(GUILD).await.unwrap(), 2);
        assert!(store.is_channel_allowed(GUILD, ChannelId::new(5)).await);
        assert_eq!(store.clear_channels(OTHER_GUILD).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_keeps_unknown_keys_and_four_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info_channels.json");
        let original = json!({
            "servers": {
                "111111111111": {
                    "info_channels": ["333333333333"],
                    "config": { "cooldown": 10, "note": "kept" },
                    "welcome_channel": "999"
                }
            },
            "global_settings": {
                "default_all_channels": true,
                "default_cooldown": 30,
                "default_daily_limit": 30,
                "theme": "dark"
            },
            "version": 2
        });
        std::fs::write(&path, serde_json::to_string(&original).unwrap()).unwrap();

        GuildConfigStore::load(&path).save().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let saved: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(saved, original);
        assert!(text.contains("\n    \"global_settings\": {"));
    }
}
