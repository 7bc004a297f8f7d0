pub const DEFAULT_INFO_API_URL: &str = "http://raw.thug4ff.com/info";
pub const DEFAULT_PROFILE_API_URL: &str = "http://profile.thug4ff.com/api/profile";
pub const DEFAULT_CONFIG_PATH: &str = "info_channels.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_DAILY_LIMIT: u32 = 30;

pub const EMBED_COLOUR: u32 = 0x00ffaa;
pub const FREE_FIRE_ICON_URL: &str = "https://i.imgur.com/6eQEsZP.png";
pub const EMBED_FOOTER: &str = "Free Fire Stats";
