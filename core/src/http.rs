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

use crate::fetcher::{FetchError, HttpSource};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde_json::Value;

/// Bearer-token transport for the Spotify Web API.
pub struct SpotifyHttp {
    client: Client,
    access_token: String,
}

impl SpotifyHttp {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
        }
    }
}

fn transport(url: &str, e: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[async_trait]
impl HttpSource for SpotifyHttp {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport(url, e))?;

        check_status(url, response)?
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn post(&self, url: &str) -> Result<(), FetchError> {
        debug!("POST {}", url);
        // The queue endpoint rejects body-less POSTs without a Content-Length.
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .body("")
            .send()
            .await
            .map_err(|e| transport(url, e))?;

        check_status(url, response)?;
        Ok(())
    }
}
