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

use rspotify::{prelude::*, scopes, AuthCodeSpotify, Config, Credentials, OAuth};
use thiserror::Error;

/// Pre-issued token that skips the OAuth flow entirely.
pub const ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to initialize Spotify client: {0}")]
    ClientConfig(String),
    #[error("Spotify authentication failed: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Spotify authorization finished without an access token")]
    MissingToken,
}

/// Returns a bearer token for the Web API.
///
/// `SPOTIFY_ACCESS_TOKEN` wins when set. Otherwise the Authorization Code
/// flow runs (see [`get_spotify_client`]) and its token is handed back.
pub async fn get_access_token() -> Result<String, AuthError> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    let spotify = get_spotify_client().await?;
    let token = spotify
        .token
        .lock()
        .await
        .map_err(|_| AuthError::ClientConfig("Token store is unavailable".to_string()))?;

    match &*token {
        Some(token) => Ok(token.access_token.clone()),
        None => Err(AuthError::MissingToken),
    }
}

/// Initializes and authenticates a Spotify client using the Authorization Code Flow.
///
/// Credentials come from `RSPOTIFY_CLIENT_ID`, `RSPOTIFY_CLIENT_SECRET` and
/// `RSPOTIFY_REDIRECT_URI`. The token is cached on disk and refreshed by rspotify.
///
/// If a valid token is not cached, the user is asked (via stdout) to visit a URL
/// to authorize the application.
pub async fn get_spotify_client() -> Result<AuthCodeSpotify, AuthError> {
    let creds = Credentials::from_env().ok_or_else(|| {
        AuthError::ClientConfig("Missing RSPOTIFY_CLIENT_ID or RSPOTIFY_CLIENT_SECRET".to_string())
    })?;

    // - user-top-read / user-follow-read: the artists whose albums we list.
    // - user-modify-playback-state: adding album tracks to the queue.
    let scopes = scopes!(
        "user-read-private",
        "user-read-email",
        "user-top-read",
        "user-follow-read",
        "user-modify-playback-state"
    );

    let oauth = OAuth::from_env(scopes)
        .ok_or_else(|| AuthError::ClientConfig("Missing RSPOTIFY_REDIRECT_URI".to_string()))?;

    let config = Config {
        token_cached: true,
        token_refreshing: true,
        ..Default::default()
    };

    let spotify = AuthCodeSpotify::with_config(creds, oauth, config);
    let url = spotify.get_authorize_url(false)?;
    spotify.prompt_for_token(&url).await?;

    Ok(spotify)
}
