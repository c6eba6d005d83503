use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::noticias;

const DEFAULT_ENV_PREFIX: &str = "REEL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            site: default_site(),
            limit: default_limit(),
            user_agent: default_user_agent(),
            share_base_url: default_share_base_url(),
        }
    }
}

fn default_api_url() -> String {
    noticias::API_BASE.to_string()
}

fn default_site() -> String {
    noticias::DEFAULT_SITE.to_string()
}

fn default_limit() -> usize {
    25
}

fn default_user_agent() -> String {
    "reel-tui/0.1 (+https://noticias.lat)".to_string()
}

fn default_share_base_url() -> String {
    "https://noticias.lat".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

fn default_theme() -> String {
    "default".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    #[serde(default = "default_mpv_path")]
    pub mpv_path: String,
    #[serde(default = "default_loop_videos")]
    pub loop_videos: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mpv_path: default_mpv_path(),
            loop_videos: default_loop_videos(),
        }
    }
}

fn default_mpv_path() -> String {
    "mpv".into()
}

fn default_loop_videos() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Wheel accumulation threshold; one browser-style notch (60) clears it.
    #[serde(default = "default_wheel_threshold")]
    pub wheel_threshold: f32,
    /// How much one terminal scroll event contributes to the wheel buffer.
    #[serde(default = "default_wheel_tick_delta")]
    pub wheel_tick_delta: f32,
    /// Vertical drag distance (in rows) that counts as a swipe.
    #[serde(default = "default_swipe_threshold_rows")]
    pub swipe_threshold_rows: u16,
    #[serde(default = "default_cooldown", with = "humantime_serde")]
    pub cooldown: Duration,
    #[serde(default = "default_hint_timeout", with = "humantime_serde")]
    pub hint_timeout: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_threshold: default_wheel_threshold(),
            wheel_tick_delta: default_wheel_tick_delta(),
            swipe_threshold_rows: default_swipe_threshold_rows(),
            cooldown: default_cooldown(),
            hint_timeout: default_hint_timeout(),
        }
    }
}

fn default_wheel_threshold() -> f32 {
    50.0
}

fn default_wheel_tick_delta() -> f32 {
    60.0
}

fn default_swipe_threshold_rows() -> u16 {
    3
}

fn default_cooldown() -> Duration {
    Duration::from_millis(500)
}

fn default_hint_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    cfg = merge_config(cfg, load_env(prefix)?);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.feed.api_url.is_empty() && other.feed.api_url != default_api_url() {
        base.feed.api_url = other.feed.api_url;
    }
    if !other.feed.site.is_empty() && other.feed.site != default_site() {
        base.feed.site = other.feed.site;
    }
    if other.feed.limit != 0 && other.feed.limit != default_limit() {
        base.feed.limit = other.feed.limit;
    }
    if !other.feed.user_agent.is_empty() && other.feed.user_agent != default_user_agent() {
        base.feed.user_agent = other.feed.user_agent;
    }
    if !other.feed.share_base_url.is_empty()
        && other.feed.share_base_url != default_share_base_url()
    {
        base.feed.share_base_url = other.feed.share_base_url;
    }

    if !other.ui.theme.is_empty() && other.ui.theme != default_theme() {
        base.ui.theme = other.ui.theme;
    }

    if !other.player.mpv_path.is_empty() && other.player.mpv_path != default_mpv_path() {
        base.player.mpv_path = other.player.mpv_path;
    }
    if other.player.loop_videos != default_loop_videos() {
        base.player.loop_videos = other.player.loop_videos;
    }

    if other.input.wheel_threshold != 0.0
        && other.input.wheel_threshold != default_wheel_threshold()
    {
        base.input.wheel_threshold = other.input.wheel_threshold;
    }
    if other.input.wheel_tick_delta != 0.0
        && other.input.wheel_tick_delta != default_wheel_tick_delta()
    {
        base.input.wheel_tick_delta = other.input.wheel_tick_delta;
    }
    if other.input.swipe_threshold_rows != 0
        && other.input.swipe_threshold_rows != default_swipe_threshold_rows()
    {
        base.input.swipe_threshold_rows = other.input.swipe_threshold_rows;
    }
    if other.input.cooldown != default_cooldown() {
        base.input.cooldown = other.input.cooldown;
    }
    if other.input.hint_timeout != default_hint_timeout() {
        base.input.hint_timeout = other.input.hint_timeout;
    }

    base
}

fn load_env(prefix: &str) -> Result<Config> {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    if map.is_empty() {
        return Ok(Config::default());
    }

    let mut cfg = Config::default();

    for (key, value) in map {
        apply_env_value(&mut cfg, &key, value);
    }

    Ok(cfg)
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "feed.api_url" => cfg.feed.api_url = value,
        "feed.site" => cfg.feed.site = value,
        "feed.limit" => {
            if let Ok(parsed) = value.parse::<usize>() {
                cfg.feed.limit = parsed;
            }
        }
        "feed.user_agent" => cfg.feed.user_agent = value,
        "feed.share_base_url" => cfg.feed.share_base_url = value,
        "ui.theme" => cfg.ui.theme = value,
        "player.mpv_path" => cfg.player.mpv_path = value,
        "player.loop_videos" => {
            cfg.player.loop_videos = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        "input.wheel_threshold" => {
            if let Ok(parsed) = value.parse::<f32>() {
                cfg.input.wheel_threshold = parsed;
            }
        }
        "input.wheel_tick_delta" => {
            if let Ok(parsed) = value.parse::<f32>() {
                cfg.input.wheel_tick_delta = parsed;
            }
        }
        "input.swipe_threshold_rows" => {
            if let Ok(parsed) = value.parse::<u16>() {
                cfg.input.swipe_threshold_rows = parsed;
            }
        }
        "input.cooldown" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.input.cooldown = duration;
            }
        }
        "input.hint_timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.input.hint_timeout = duration;
            }
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reel").join("config.yaml"))
}
