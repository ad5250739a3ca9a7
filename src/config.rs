//! Application-level configuration loading, including the voting deck and timing knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::session::SessionDelays;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PLANNING_POKER_BACK_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Card values offered to voters, in display order. `SKIP` is a sentinel and never
    /// part of the deck.
    pub deck: Vec<String>,
    /// Seconds the shared reveal countdown runs before votes become visible.
    pub countdown_secs: u64,
    /// Grace period between marking a room `deleting` and removing its nodes, giving
    /// subscribed clients a chance to observe the flag.
    pub delete_grace: Duration,
    /// Grace period between marking a participant kicked and removing their node.
    pub kick_grace: Duration,
    /// Delay clients should wait before redirecting after a deletion notice.
    pub deleted_redirect: Duration,
    /// Redirect delay when the viewer initiated the deletion themselves (no notice shown).
    pub self_deleted_redirect: Duration,
    /// Redirect delay after a kick notice, longer so the message can be read.
    pub kicked_redirect: Duration,
    /// Age beyond which an untouched room is eligible for the idle sweep.
    pub idle_threshold: Duration,
    /// Minimum interval between two idle-room sweeps.
    pub sweep_cooldown: Duration,
    /// Maximum length of the shared story text.
    pub max_story_len: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        deck = ?config.deck,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// True when `value` is one of the configured deck cards.
    pub fn is_deck_value(&self, value: &str) -> bool {
        self.deck.iter().any(|card| card == value)
    }

    /// Bundle the client-facing redirect delays for the session state machine.
    pub fn session_delays(&self) -> SessionDelays {
        SessionDelays {
            deleted_redirect: self.deleted_redirect,
            self_deleted_redirect: self.self_deleted_redirect,
            kicked_redirect: self.kicked_redirect,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deck: default_deck(),
            countdown_secs: 3,
            delete_grace: Duration::from_millis(1000),
            kick_grace: Duration::from_millis(1000),
            deleted_redirect: Duration::from_millis(500),
            self_deleted_redirect: Duration::from_millis(100),
            kicked_redirect: Duration::from_millis(2000),
            idle_threshold: Duration::from_secs(4 * 60 * 60),
            sweep_cooldown: Duration::from_secs(4 * 60 * 60),
            max_story_len: 500,
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Durations are expressed in milliseconds except for the sweep settings, which use
/// hours to match how operators think about room retention.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_deck")]
    deck: Vec<String>,
    #[serde(default = "default_countdown_secs")]
    countdown_secs: u64,
    #[serde(default = "default_grace_ms")]
    delete_grace_ms: u64,
    #[serde(default = "default_grace_ms")]
    kick_grace_ms: u64,
    #[serde(default = "default_deleted_redirect_ms")]
    deleted_redirect_ms: u64,
    #[serde(default = "default_self_deleted_redirect_ms")]
    self_deleted_redirect_ms: u64,
    #[serde(default = "default_kicked_redirect_ms")]
    kicked_redirect_ms: u64,
    #[serde(default = "default_idle_hours")]
    idle_threshold_hours: u64,
    #[serde(default = "default_idle_hours")]
    sweep_cooldown_hours: u64,
    #[serde(default = "default_max_story_len")]
    max_story_len: usize,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            deck: raw.deck,
            countdown_secs: raw.countdown_secs,
            delete_grace: Duration::from_millis(raw.delete_grace_ms),
            kick_grace: Duration::from_millis(raw.kick_grace_ms),
            deleted_redirect: Duration::from_millis(raw.deleted_redirect_ms),
            self_deleted_redirect: Duration::from_millis(raw.self_deleted_redirect_ms),
            kicked_redirect: Duration::from_millis(raw.kicked_redirect_ms),
            idle_threshold: Duration::from_secs(raw.idle_threshold_hours * 60 * 60),
            sweep_cooldown: Duration::from_secs(raw.sweep_cooldown_hours * 60 * 60),
            max_story_len: raw.max_story_len,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in Fibonacci deck shipped with the binary.
fn default_deck() -> Vec<String> {
    ["1", "2", "3", "5", "8", "13", "21", "?"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn default_countdown_secs() -> u64 {
    3
}

fn default_grace_ms() -> u64 {
    1000
}

fn default_deleted_redirect_ms() -> u64 {
    500
}

fn default_self_deleted_redirect_ms() -> u64 {
    100
}

fn default_kicked_redirect_ms() -> u64 {
    2000
}

fn default_idle_hours() -> u64 {
    4
}

fn default_max_story_len() -> usize {
    500
}
