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

use crate::clock::{Clock, SystemClock};
use crate::config::{ArtistSource, SyncConfig};
use crate::dates::DateWindow;
use crate::fetcher::{CachingFetcher, FetchError, HttpSource};
use crate::models::{Album, ApiAlbum, ApiArtist, ApiTrack, Artist, FollowedArtists, Page, QueueReport};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Unexpected payload from {url}: {message}")]
    Payload { url: String, message: String },
    #[error("No active Spotify device found. Start playing music on Spotify first.")]
    NoActiveDevice,
    #[error("Permission denied. Make sure queue permissions were granted.")]
    PermissionDenied,
}

fn decode<T: DeserializeOwned>(url: &str, value: &Value) -> Result<T, SyncError> {
    T::deserialize(value).map_err(|e| SyncError::Payload {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// What subscribers see: the artists published so far and whether the
/// load has finished.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogSnapshot {
    pub artists: Vec<Artist>,
    pub done: bool,
}

/// Shared view of the synchronized artists.
///
/// Readers get snapshots or a change feed; only the synchronizer writes.
pub struct ArtistStore {
    tx: watch::Sender<CatalogSnapshot>,
}

impl ArtistStore {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(CatalogSnapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.tx.subscribe()
    }

    fn begin(&self) {
        self.tx.send_replace(CatalogSnapshot::default());
    }

    fn publish(&self, batch: Vec<Artist>) {
        self.tx.send_modify(|snapshot| snapshot.artists.extend(batch));
    }

    fn finish(&self) {
        self.tx.send_modify(|snapshot| snapshot.done = true);
    }
}

/// The lists the app shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Week,  // Anniversary in the past 7 days
    Month, // Anniversary in the past 30 days
    Year,  // Released in the past 365 days
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Week => "This Week",
            Section::Month => "This Month",
            Section::Year => "Last Year",
        }
    }

    pub fn matches(&self, window: &DateWindow, album: &Album) -> bool {
        let result = match self {
            Section::Week => window.is_week_anniversary(album),
            Section::Month => window.is_month_anniversary(album),
            Section::Year => window.is_released_past_year(album),
        };
        result.unwrap_or(false)
    }

    /// Copies of `artists` holding only this section's albums. Artists with
    /// nothing left are dropped.
    pub fn filter(&self, artists: &[Artist], window: &DateWindow) -> Vec<Artist> {
        artists
            .iter()
            .filter_map(|artist| artist.with_albums_matching(|album| self.matches(window, album)))
            .collect()
    }
}

fn qualifying_albums(albums: Vec<Album>, window: &DateWindow) -> Vec<Album> {
    albums
        .into_iter()
        .filter(|album| match window.is_recent(album) {
            Ok(keep) => keep,
            Err(e) => {
                debug!("Skipping album {} ({}): {}", album.id, album.name, e);
                false
            }
        })
        .collect()
}

fn keep_qualifying(
    chunk: Vec<(Artist, Result<Vec<Album>, SyncError>)>,
    window: &DateWindow,
) -> Vec<Artist> {
    chunk
        .into_iter()
        .filter_map(|(mut artist, albums)| match albums {
            Ok(albums) => {
                artist.albums = qualifying_albums(albums, window);
                (!artist.albums.is_empty()).then_some(artist)
            }
            Err(e) => {
                warn!("Skipping artist {} ({}): {}", artist.name, artist.id, e);
                None
            }
        })
        .collect()
}

fn queue_error(e: FetchError) -> SyncError {
    match e.status() {
        Some(404) => SyncError::NoActiveDevice,
        Some(403) => SyncError::PermissionDenied,
        _ => SyncError::Fetch(e),
    }
}

/// Pulls the user's artists and their albums and keeps the ones with a
/// recent release or anniversary.
pub struct CatalogSynchronizer {
    config: SyncConfig,
    source: Arc<dyn HttpSource>,
    clock: Arc<dyn Clock>,
    fetcher: CachingFetcher,
    store: ArtistStore,
}

impl CatalogSynchronizer {
    pub fn new(source: Arc<dyn HttpSource>, config: SyncConfig) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), config)
    }

    pub fn with_clock(source: Arc<dyn HttpSource>, clock: Arc<dyn Clock>, config: SyncConfig) -> Self {
        let fetcher = CachingFetcher::with_clock(source.clone(), clock.clone(), config.cache_enabled);
        Self {
            config,
            source,
            clock,
            fetcher,
            store: ArtistStore::new(),
        }
    }

    pub fn store(&self) -> &ArtistStore {
        &self.store
    }

    /// A classifier pinned to the current time.
    pub fn window(&self) -> DateWindow {
        DateWindow::at(self.clock.local_now())
    }

    pub async fn fetch_artists(&self, bypass: bool) -> Result<Vec<Artist>, SyncError> {
        let url = self.config.artists_url();
        let value = self.fetcher.fetch(&url, bypass).await?;

        let raw: Vec<ApiArtist> = match self.config.artist_source {
            ArtistSource::Top => decode::<Page<ApiArtist>>(&url, &value)?.items,
            ArtistSource::Followed => decode::<FollowedArtists>(&url, &value)?.artists.items,
        };
        Ok(raw.into_iter().map(Artist::from).collect())
    }

    pub async fn fetch_albums(&self, artist_id: &str) -> Result<Vec<Album>, SyncError> {
        let url = self.config.albums_url(artist_id);
        let value = self.fetcher.fetch(&url, false).await?;

        let page: Page<ApiAlbum> = decode(&url, &value)?;
        Ok(page
            .items
            .into_iter()
            .map(|raw| raw.into_album(artist_id))
            .collect())
    }

    /// Loads every artist's albums and publishes the artists that have
    /// something to show, in batches, as their albums arrive.
    ///
    /// A failing artist is logged and left out. Only a failure to list the
    /// artists themselves fails the whole load.
    pub async fn load_artists_with_albums(&self, bypass: bool) -> Result<CatalogSnapshot, SyncError> {
        self.store.begin();
        let window = self.window();

        let artists = match self.fetch_artists(bypass).await {
            Ok(artists) => artists,
            Err(e) => {
                self.store.finish();
                return Err(e);
            }
        };
        info!("Loading albums for {} artists", artists.len());

        let fan_out = self.config.fan_out.max(1);
        let mut resolved = stream::iter(artists)
            .map(|artist| async move {
                let albums = self.fetch_albums(&artist.id).await;
                (artist, albums)
            })
            .buffer_unordered(fan_out)
            .ready_chunks(fan_out);

        // Chunks are cut before filtering: a qualifying artist never waits on unrelated ones.
        while let Some(chunk) = resolved.next().await {
            let batch = keep_qualifying(chunk, &window);
            if batch.is_empty() {
                continue;
            }
            info!("Publishing {} artists", batch.len());
            self.store.publish(batch);
        }

        self.store.finish();
        Ok(self.store.snapshot())
    }

    /// Queues every track of an album, one request at a time.
    pub async fn add_album_to_queue(&self, album_id: &str) -> Result<QueueReport, SyncError> {
        let url = self.config.tracks_url(album_id);
        let value = self.fetcher.fetch(&url, false).await?;
        let tracks: Page<ApiTrack> = decode(&url, &value)?;

        let mut report = QueueReport {
            album_id: album_id.to_string(),
            tracks_queued: 0,
        };

        for (i, track) in tracks.items.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.queue_delay).await;
            }
            self.source
                .post(&self.config.queue_url(&track.uri))
                .await
                .map_err(queue_error)?;
            report.tracks_queued += 1;
            debug!("Queued {}", track.uri);
        }

        info!("Queued {} tracks from album {}", report.tracks_queued, album_id);
        Ok(report)
    }

    /// Forgets everything fetched so far, e.g. on logout.
    pub fn reset(&self) {
        self.fetcher.clear();
        self.store.begin();
    }
}
