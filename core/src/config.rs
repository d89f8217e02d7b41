/*
    album-anniversaries | Rust CLI tool to surface album release anniversaries.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const PAGE_SIZE: u32 = 50;
pub const DEFAULT_FAN_OUT: usize = 5;
pub const DEFAULT_QUEUE_DELAY: Duration = Duration::from_millis(100);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which of the user's artists to look up albums for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistSource {
    Top,
    Followed,
}

impl ArtistSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Some(ArtistSource::Top),
            "followed" => Some(ArtistSource::Followed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_base: String,
    pub cache_enabled: bool, // Off in production
    pub artist_source: ArtistSource,
    pub fan_out: usize,         // Concurrent album requests and batch size
    pub queue_delay: Duration, // Pause between queue submissions
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cache_enabled: true,
            artist_source: ArtistSource::Top,
            fan_out: DEFAULT_FAN_OUT,
            queue_delay: DEFAULT_QUEUE_DELAY,
        }
    }
}

impl SyncConfig {
    /// Reads `ANNIVERSARY_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup("ANNIVERSARY_ENV") {
            config.cache_enabled = !env.trim().eq_ignore_ascii_case("production");
        }

        if let Some(source) = lookup("ANNIVERSARY_ARTIST_SOURCE") {
            config.artist_source = ArtistSource::parse(&source).ok_or(ConfigError::Invalid {
                key: "ANNIVERSARY_ARTIST_SOURCE",
                value: source.clone(),
                reason: "expected 'top' or 'followed'",
            })?;
        }

        if let Some(fan_out) = lookup("ANNIVERSARY_FAN_OUT") {
            config.fan_out = match fan_out.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ANNIVERSARY_FAN_OUT",
                        value: fan_out,
                        reason: "expected a positive integer",
                    })
                }
            };
        }

        if let Some(delay) = lookup("ANNIVERSARY_QUEUE_DELAY_MS") {
            let millis = delay.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "ANNIVERSARY_QUEUE_DELAY_MS",
                value: delay.clone(),
                reason: "expected milliseconds",
            })?;
            config.queue_delay = Duration::from_millis(millis);
        }

        if let Some(base) = lookup("ANNIVERSARY_API_BASE") {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    pub fn artists_url(&self) -> String {
        match self.artist_source {
            ArtistSource::Top => format!("{}/me/top/artists?limit={}", self.api_base, PAGE_SIZE),
            ArtistSource::Followed => format!(
                "{}/me/following?type=artist&limit={}",
                self.api_base, PAGE_SIZE
            ),
        }
    }

    pub fn albums_url(&self, artist_id: &str) -> String {
        format!(
            "{}/artists/{}/albums?include_groups=album&limit={}",
            self.api_base, artist_id, PAGE_SIZE
        )
    }

    pub fn tracks_url(&self, album_id: &str) -> String {
        format!("{}/albums/{}/tracks?limit={}", self.api_base, album_id, PAGE_SIZE)
    }

    pub fn queue_url(&self, track_uri: &str) -> String {
        format!(
            "{}/me/player/queue?uri={}",
            self.api_base,
            urlencoding::encode(track_uri)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert!(config.cache_enabled);
        assert_eq!(config.fan_out, 5);
    }

    #[test]
    fn test_production_disables_cache() {
        let config = SyncConfig::from_lookup(lookup(&[("ANNIVERSARY_ENV", "Production")])).unwrap();
        assert!(!config.cache_enabled);

        let config = SyncConfig::from_lookup(lookup(&[("ANNIVERSARY_ENV", "development")])).unwrap();
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("ANNIVERSARY_ARTIST_SOURCE", "followed"),
            ("ANNIVERSARY_FAN_OUT", "3"),
            ("ANNIVERSARY_QUEUE_DELAY_MS", "0"),
            ("ANNIVERSARY_API_BASE", "http://localhost:9000/v1/"),
        ]))
        .unwrap();
        assert_eq!(config.artist_source, ArtistSource::Followed);
        assert_eq!(config.fan_out, 3);
        assert_eq!(config.queue_delay, Duration::ZERO);
        assert_eq!(
            config.artists_url(),
            "http://localhost:9000/v1/me/following?type=artist&limit=50"
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(SyncConfig::from_lookup(lookup(&[("ANNIVERSARY_FAN_OUT", "0")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("ANNIVERSARY_FAN_OUT", "many")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("ANNIVERSARY_ARTIST_SOURCE", "liked")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("ANNIVERSARY_QUEUE_DELAY_MS", "-1")])).is_err());
    }

    #[test]
    fn test_endpoint_urls() {
        let config = SyncConfig::default();
        assert_eq!(
            config.albums_url("abc"),
            "https://api.spotify.com/v1/artists/abc/albums?include_groups=album&limit=50"
        );
        assert_eq!(
            config.tracks_url("xyz"),
            "https://api.spotify.com/v1/albums/xyz/tracks?limit=50"
        );
        assert_eq!(
            config.queue_url("spotify:track:123"),
            "https://api.spotify.com/v1/me/player/queue?uri=spotify%3Atrack%3A123"
        );
    }
}
