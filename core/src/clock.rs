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

use chrono::{Local, NaiveDateTime, Utc};

/// Source of "now" for cache expiry and date-window classification.
///
/// Both readings come from the same clock so tests can move time forward
/// once and observe the effect on cache entries and anniversary windows.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn epoch_millis(&self) -> i64;

    /// Current local wall-clock time.
    fn local_now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
