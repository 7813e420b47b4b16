use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hotels::types::BookingQuery;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
    pub hotels: HotelsConfig,
    pub telegram: TelegramConfig,
    pub alert: AlertConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub targets: Vec<String>,
    pub check_in_ms: i64,
    pub check_out_ms: i64,
    pub adults: u32,
    pub children: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                "2 Room Apartment Ground Floor".to_string(),
                "Cozy 2 Room Apartment".to_string(),
            ],
            check_in_ms: 1_763_856_000_000,  // 23 Nov 2025
            check_out_ms: 1_764_201_600_000, // 27 Nov 2025
            adults: 2,
            children: 0,
        }
    }
}

impl WatchConfig {
    pub fn query(&self) -> BookingQuery {
        BookingQuery {
            check_in: self.check_in_ms,
            check_out: self.check_out_ms,
            adults: self.adults,
            children: self.children,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HotelsConfig {
    pub base_url: String,
    pub origin: String,
    /// Public `x-wix-instance` credential of the booking site.
    pub site_instance: String,
    pub booking_url: String,
    pub timeout_secs: u64,
}

impl Default for HotelsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hotels.wixapps.net".to_string(),
            origin: "https://hotels.wixapps.net".to_string(),
            site_instance: concat!(
                "tMyA8veD0LlWINpkMjEVGWoPRCGrS_hx98scw60rUf4.eyJpbnN0YW5jZUlkIjoiNjU1ZjBlNzEtOTVmOC00YzYwLWIxM2ItYTYxOGNmNDAxN2FmIiwi",
                "YXBwRGVmSWQiOiIxMzVhYWQ4Ni05MTI1LTYwNzQtNzM0Ni0yOWRjNmEzYzliY2YiLCJtZXRh",
                "U2l0ZUlkIjoiZGJkZmVmNWUtZWY3YS00YmFiLWFlOWMtYTI5ZWQ3YmQ0N2ExIiwic2lnbkRh",
                "dGUiOiIyMDI1LTA2LTE3VDA4OjM4OjQwLjEwMVoiLCJ2ZW5kb3JQcm9kdWN0SWQiOiJob3Rl",
                "bHMiLCJkZW1vTW9kZSI6ZmFsc2UsIm9yaWdpbkluc3RhbmNlSWQiOiI4MDBiYzdlMC1hNTgx",
                "LTRkYzQtODdjNi1kYTNiNzUyMzI0OTEiLCJhaWQiOiJmYTVjMjAyZi0zNDNiLTQyZjAtOWI1",
                "MC0wNDNhMWM3MzJmZjMiLCJiaVRva2VuIjoiYmU4MGUxMmYtN2E4Mi0wN2NiLTFmYTctMDQ4",
                "NjE4ZmQ1MDBlIiwic2l0ZU93bmVySWQiOiIxOTMxYTIxNC0wNDIyLTQ2MzYtOTdkMS04MDJl",
                "MjkzYzUyMmUiLCJicyI6IjNvMXNaeWphTGNqa2pwSnRRaTNlZVl4Q01YUGRtXzkyem4xVFdY",
                "eE1sSzgiLCJzY2QiOiIyMDIyLTAxLTIwVDE1OjUyOjEyLjkzNFoifQ",
            )
            .to_string(),
            booking_url: "https://www.henrysinterlaken.com/zimmer-buchen/rooms/".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_message_chars: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.telegram.org".to_string(),
            timeout_secs: 15,
            max_message_chars: 4096,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub property_name: String,
    pub phone: String,
    pub email: String,
    pub signature: String,
    /// Also tell the chat when the search request fails for a reason other than expired tokens.
    pub notify_on_fetch_error: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            property_name: "Henry's Apartments Interlaken".to_string(),
            phone: "+41 (0) 79 855 38 00".to_string(),
            email: "henrysinterlaken@gmail.com".to_string(),
            signature: "Monitored by GitHub Actions".to_string(),
            notify_on_fetch_error: false,
        }
    }
}

impl Config {
    /// Load `config.toml` (or `$ROOM_WATCH_CONFIG`). A missing file means built-in defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var("ROOM_WATCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Credentials supplied by the hosting platform's secret store.
#[derive(Clone)]
pub struct Secrets {
    pub bot_token: String,
    pub chat_id: String,
    pub xsrf_token: String,
    pub bsession: String,
}

#[derive(Debug, Error, PartialEq)]
#[error("missing environment variables: {}", .0.join(", "))]
pub struct MissingSecrets(pub Vec<&'static str>);

impl Secrets {
    pub fn from_env() -> Result<Self, MissingSecrets> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Empty values count as missing. Every missing name is reported, not just the first.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MissingSecrets>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut take = |name: &'static str| match lookup(name) {
            Some(v) if !v.is_empty() => v,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let secrets = Secrets {
            bot_token: take("BOT_TOKEN"),
            chat_id: take("CHAT_ID"),
            xsrf_token: take("XSRF_TOKEN"),
            bsession: take("BSESSION"),
        };

        if missing.is_empty() {
            Ok(secrets)
        } else {
            Err(MissingSecrets(missing))
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("xsrf_token", &"<redacted>")
            .field("bsession", &"<redacted>")
            .finish()
    }
}

pub fn is_dry_run() -> bool {
    std::env::var("DRY_RUN")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}
