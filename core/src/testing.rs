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

//! Test doubles for time and the network.

use crate::clock::Clock;
use crate::fetcher::{FetchError, HttpSource};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

const BASE_EPOCH_MS: i64 = 1_735_689_600_000;

/// A clock that only moves when told to.
pub struct ManualClock {
    base_local: NaiveDateTime,
    offset_ms: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(
            NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    pub fn at(local: NaiveDateTime) -> Self {
        Self {
            base_local: local,
            offset_ms: AtomicI64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn epoch_millis(&self) -> i64 {
        BASE_EPOCH_MS + self.offset_ms.load(Ordering::SeqCst)
    }

    fn local_now(&self) -> NaiveDateTime {
        self.base_local + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// Canned responses keyed by URL. Every call yields once before answering
/// so concurrent callers get a chance to overlap. URLs given a delay sleep
/// on the tokio clock first.
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    gets: Mutex<Vec<String>>,
    resolved: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Instant)>>,
    post_failure: Mutex<Option<FetchError>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            resolved: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
            post_failure: Mutex::new(None),
        }
    }

    pub fn respond(&self, url: &str, value: Value) {
        self.responses.lock().unwrap().insert(url.to_string(), Ok(value));
    }

    pub fn fail(&self, url: &str, error: FetchError) {
        self.responses.lock().unwrap().insert(url.to_string(), Err(error));
    }

    pub fn delay(&self, url: &str, by: Duration) {
        self.delays.lock().unwrap().insert(url.to_string(), by);
    }

    pub fn fail_posts(&self, error: FetchError) {
        *self.post_failure.lock().unwrap() = Some(error);
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.gets.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn is_resolved(&self, url: &str) -> bool {
        self.resolved.lock().unwrap().iter().any(|u| u == url)
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn post_times(&self) -> Vec<Instant> {
        self.posts.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl HttpSource for ScriptedSource {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.gets.lock().unwrap().push(url.to_string());
        let delay = self.delays.lock().unwrap().get(url).copied();
        match delay {
            Some(by) => tokio::time::sleep(by).await,
            None => tokio::task::yield_now().await,
        }

        self.resolved.lock().unwrap().push(url.to_string());
        let responses = self.responses.lock().unwrap();
        responses.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        })
    }

    async fn post(&self, url: &str) -> Result<(), FetchError> {
        self.posts.lock().unwrap().push((url.to_string(), Instant::now()));
        tokio::task::yield_now().await;

        match self.post_failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
