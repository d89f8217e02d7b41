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

use crate::models::Album;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

pub const DAY_MILLIS: i64 = 86_400_000;
pub const WEEK_DAYS: i64 = 7;
pub const MONTH_DAYS: i64 = 30;
pub const YEAR_DAYS: i64 = 365;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Malformed release date: {value:?}")]
    Malformed { value: String },
    #[error("Release date {value:?} cannot be moved onto year {year}")]
    OutOfRange { value: String, year: i32 },
}

/// How much of a release date the Web API actually knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePrecision {
    Day,
    Month,
    Year,
}

impl DatePrecision {
    /// Unknown values are treated as day precision.
    pub fn from_api(value: &str) -> Self {
        match value {
            "year" => DatePrecision::Year,
            "month" => DatePrecision::Month,
            _ => DatePrecision::Day,
        }
    }
}

/// A release date parsed according to its precision.
///
/// Month and year precision dates are anchored to the first day of the
/// period so they can still take part in the past-year check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseDate {
    date: NaiveDate,
    precision: DatePrecision,
}

impl ReleaseDate {
    pub fn parse(value: &str, precision: &str) -> Result<Self, DateError> {
        let precision = DatePrecision::from_api(precision);
        let date = match precision {
            DatePrecision::Day => parse_day(value)?,
            DatePrecision::Month => parse_day(&format!("{}-01", value)).map_err(|_| malformed(value))?,
            DatePrecision::Year => parse_day(&format!("{}-01-01", value)).map_err(|_| malformed(value))?,
        };
        Ok(Self { date, precision })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn precision(&self) -> DatePrecision {
        self.precision
    }

    /// Only day precision dates carry a real month/day to celebrate.
    pub fn supports_anniversary(&self) -> bool {
        self.precision == DatePrecision::Day
    }
}

/// Parses a `YYYY-MM-DD` string as a wall-clock calendar date.
pub fn parse_day(value: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| malformed(value))
}

fn malformed(value: &str) -> DateError {
    DateError::Malformed {
        value: value.to_string(),
    }
}

fn local_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn millis_since(instant: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - instant).num_milliseconds()
}

/// Moves the release month/day onto `year`.
///
/// Feb 29 onto a common year rolls over to Mar 1, the same way plain
/// calendar arithmetic does.
fn anniversary_in(release: NaiveDate, year: i32) -> Option<NaiveDate> {
    release
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// The latest occurrence of the release month/day at or before `now`.
///
/// Only looks back one year.
pub fn most_recent_anniversary(
    release: NaiveDate,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, DateError> {
    let year = now.year();
    let out_of_range = |year: i32| DateError::OutOfRange {
        value: release.to_string(),
        year,
    };

    let this_year = anniversary_in(release, year).ok_or_else(|| out_of_range(year))?;
    let candidate = local_midnight(this_year);
    if candidate <= now {
        return Ok(candidate);
    }

    let last_year = anniversary_in(release, year - 1).ok_or_else(|| out_of_range(year - 1))?;
    Ok(local_midnight(last_year))
}

fn anniversary_within(
    release: NaiveDate,
    now: NaiveDateTime,
    window_days: i64,
) -> Result<bool, DateError> {
    let diff = millis_since(most_recent_anniversary(release, now)?, now);
    Ok(diff > 0 && diff < window_days * DAY_MILLIS)
}

fn released_within(release: NaiveDate, now: NaiveDateTime, window_days: i64) -> bool {
    let diff = millis_since(local_midnight(release), now);
    diff > 0 && diff < window_days * DAY_MILLIS
}

/// True when the release month/day came around in the open interval
/// `(now - window_days, now)`.
pub fn had_birthday_in_past_days(
    release_date: &str,
    now: NaiveDateTime,
    window_days: i64,
) -> Result<bool, DateError> {
    anniversary_within(parse_day(release_date)?, now, window_days)
}

pub fn had_birthday_past_week(release_date: &str, now: NaiveDateTime) -> Result<bool, DateError> {
    had_birthday_in_past_days(release_date, now, WEEK_DAYS)
}

pub fn had_birthday_past_month(release_date: &str, now: NaiveDateTime) -> Result<bool, DateError> {
    had_birthday_in_past_days(release_date, now, MONTH_DAYS)
}

/// True for releases strictly in the past and less than 365 days old.
pub fn released_past_year(release_date: &str, now: NaiveDateTime) -> Result<bool, DateError> {
    Ok(released_within(parse_day(release_date)?, now, YEAR_DAYS))
}

/// Classifies albums against a single reading of "now".
///
/// Build one per batch so every album in the batch is judged against the
/// same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    now: NaiveDateTime,
}

impl DateWindow {
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }

    fn anniversary(&self, album: &Album, window_days: i64) -> Result<bool, DateError> {
        let release = ReleaseDate::parse(&album.release_date, &album.release_date_precision)?;
        if !release.supports_anniversary() {
            return Ok(false);
        }
        anniversary_within(release.date(), self.now, window_days)
    }

    pub fn is_week_anniversary(&self, album: &Album) -> Result<bool, DateError> {
        self.anniversary(album, WEEK_DAYS)
    }

    pub fn is_month_anniversary(&self, album: &Album) -> Result<bool, DateError> {
        self.anniversary(album, MONTH_DAYS)
    }

    pub fn is_released_past_year(&self, album: &Album) -> Result<bool, DateError> {
        let release = ReleaseDate::parse(&album.release_date, &album.release_date_precision)?;
        Ok(released_within(release.date(), self.now, YEAR_DAYS))
    }

    /// Anything worth keeping after a sync: a month anniversary or a
    /// release from the past year.
    pub fn is_recent(&self, album: &Album) -> Result<bool, DateError> {
        Ok(self.is_month_anniversary(album)? || self.is_released_past_year(album)?)
    }
}
