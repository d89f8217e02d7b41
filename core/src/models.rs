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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const PLACEHOLDER_COVER_URL: &str = "https://via.placeholder.com/300";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// An album as the rest of the app sees it, detached from the Web API shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub artist_id: String,
    pub name: String,
    pub release_date: String,          // YYYY-MM-DD, YYYY-MM or YYYY
    pub release_date_precision: String, // "day", "month" or "year"
    pub images: Vec<Image>,            // Largest first
    pub external_url: String,
}

impl Album {
    /// Largest cover available, or a placeholder.
    pub fn cover_url(&self) -> &str {
        self.images
            .first()
            .map(|image| image.url.as_str())
            .unwrap_or(PLACEHOLDER_COVER_URL)
    }

    pub fn alt_text(&self) -> String {
        if self.name.trim().is_empty() {
            "Album cover".to_string()
        } else {
            format!("Album cover for {}", self.name)
        }
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.release_date, self.name)?;
        if !self.external_url.is_empty() {
            write!(f, " -> {}", self.external_url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub href: String,
    pub name: String,
    pub popularity: u32, // 0-100
    pub images: Vec<Image>,
    pub external_url: String,
    pub albums: Vec<Album>, // Empty until synchronized
}

impl Artist {
    /// Copy of this artist keeping only the albums that match, or `None`
    /// when nothing is left.
    pub fn with_albums_matching<F>(&self, mut keep: F) -> Option<Artist>
    where
        F: FnMut(&Album) -> bool,
    {
        let albums: Vec<Album> = self.albums.iter().filter(|a| keep(a)).cloned().collect();
        if albums.is_empty() {
            return None;
        }
        Some(Artist {
            albums,
            ..self.clone()
        })
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (popularity {}/100, {} albums)",
            self.name,
            self.popularity,
            self.albums.len()
        )
    }
}

/// Result of queueing every track of an album.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueReport {
    pub album_id: String,
    pub tracks_queued: usize,
}

// Web API payloads. Only the fields the app reads are declared.

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct FollowedArtists {
    pub artists: Page<ApiArtist>,
}

#[derive(Debug, Deserialize)]
pub struct ApiArtist {
    pub id: String,
    #[serde(default)]
    pub href: String,
    pub name: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

impl From<ApiArtist> for Artist {
    fn from(raw: ApiArtist) -> Self {
        let external_url = spotify_url(&raw.external_urls);
        Artist {
            id: raw.id,
            href: raw.href,
            name: raw.name,
            popularity: raw.popularity,
            images: raw.images,
            external_url,
            albums: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiAlbum {
    pub id: String,
    pub name: String,
    pub release_date: String,
    #[serde(default = "default_precision")]
    pub release_date_precision: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

impl ApiAlbum {
    pub fn into_album(self, artist_id: &str) -> Album {
        let external_url = spotify_url(&self.external_urls);
        Album {
            id: self.id,
            artist_id: artist_id.to_string(),
            name: self.name,
            release_date: self.release_date,
            release_date_precision: self.release_date_precision,
            images: self.images,
            external_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiTrack {
    pub uri: String,
}

fn default_precision() -> String {
    "day".to_string()
}

fn spotify_url(urls: &HashMap<String, String>) -> String {
    urls.get("spotify").cloned().unwrap_or_default()
}
