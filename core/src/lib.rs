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

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod dates;
pub mod fetcher;
pub mod http;
pub mod models;

#[cfg(test)]
mod testing;

// Re-export key items for convenience
pub use auth::get_access_token;
pub use catalog::{CatalogSnapshot, CatalogSynchronizer, Section, SyncError};
pub use config::SyncConfig;
pub use dates::DateWindow;
pub use fetcher::{CachingFetcher, FetchError, HttpSource};
pub use http::SpotifyHttp;
pub use models::{Album, Artist, QueueReport};
