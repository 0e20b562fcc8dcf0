// src/data/datetime.rs

//! Datetime handling for accounting logs: parsing the fixed timestamp
//! formats, and resolving user-level date intents into a [`DateWindow`].
//!
//! Accounting logs carry local wall-clock times with no zone offset, so
//! naive chrono types are used throughout ([`DateTimeA`]).
//!
//! [`DateWindow`]: self::DateWindow
//! [`DateTimeA`]: self::DateTimeA

use crate::error::{QhError, QhResult};

#[doc(hidden)]
pub use ::chrono::{Duration, NaiveDate, NaiveDateTime};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// datetime parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A datetime from an `A`ccounting log; local wall-clock, no zone.
pub type DateTimeA = NaiveDateTime;
pub type DateTimeAOpt = Option<DateTimeA>;

/// chrono strftime pattern of the leading timestamp field of every
/// accounting log line, e.g. `04/13/2023 00:01:02`.
pub const DT_PATTERN_HEADER: &str = "%m/%d/%Y %H:%M:%S";

/// chrono strftime pattern of a user-supplied date argument.
pub const DT_PATTERN_DATE: &str = "%Y-%m-%d";

/// chrono strftime pattern of a daily log file name, e.g. `20230413`.
pub const DT_PATTERN_FILESTAMP: &str = "%Y%m%d";

/// Parse the leading timestamp field of a log line.
pub fn datetime_from_header(data: &str) -> DateTimeAOpt {
    NaiveDateTime::parse_from_str(data, DT_PATTERN_HEADER).ok()
}

/// Parse a user-supplied date argument; `YYYY-MM-DD` or the bare
/// filestamp form `YYYYMMDD`.
pub fn date_from_str(data: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(data, DT_PATTERN_DATE)
        .or_else(|_| NaiveDate::parse_from_str(data, DT_PATTERN_FILESTAMP))
        .ok()
}

/// The daily log file name for `date`, i.e. `20230413`.
pub fn filestamp(date: &NaiveDate) -> String {
    date.format(DT_PATTERN_FILESTAMP)
        .to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateWindow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Streaming direction over a file or a window of files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// oldest record first, top of file to bottom
    Forward,
    /// newest record first, bottom of file to top
    Reverse,
}

/// A resolved, inclusive `[start, end]` pair of calendar dates plus a
/// streaming [`Direction`]. Produced once per query by [`resolve_window`],
/// never mutated.
///
/// [`Direction`]: self::Direction
/// [`resolve_window`]: self::resolve_window
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
    direction: Direction,
}

impl DateWindow {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Count of calendar days covered, at least 1.
    pub fn num_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Every date in the window, ordered per the window's direction:
    /// oldest→newest for [`Forward`], newest→oldest for [`Reverse`].
    ///
    /// [`Forward`]: Direction::Forward
    /// [`Reverse`]: Direction::Reverse
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = Vec::with_capacity(self.num_days() as usize);
        let mut date = self.start;
        while date <= self.end {
            dates.push(date);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        if self.direction == Direction::Reverse {
            dates.reverse();
        }

        dates
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "[{} … {}] {:?}",
            self.start.format(DT_PATTERN_DATE),
            self.end.format(DT_PATTERN_DATE),
            self.direction,
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// window resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resolve user-level date intents into a concrete [`DateWindow`].
///
/// An explicit `range` wins and is used as-is (validated `start <= end`).
/// Otherwise the window ends on `anchor` (default: `today`) and reaches
/// back `days_back` days: `[anchor - days_back, anchor]` inclusive, so
/// `days_back=0` is the single anchor day and `days_back=4` from
/// 2025-03-01 spans 2025-02-25 through 2025-03-01.
///
/// Fails with [`QhError::InvalidWindow`] when start is after end or any
/// requested date lies in the future of `today`; no I/O has happened yet
/// at that point.
///
/// [`DateWindow`]: self::DateWindow
/// [`QhError::InvalidWindow`]: crate::error::QhError::InvalidWindow
pub fn resolve_window(
    anchor: Option<NaiveDate>,
    days_back: Option<u32>,
    range: Option<(NaiveDate, NaiveDate)>,
    direction: Direction,
    today: NaiveDate,
) -> QhResult<DateWindow> {
    let (start, end) = match range {
        Some((start, end)) => (start, end),
        None => {
            let anchor = anchor.unwrap_or(today);
            let days_back = days_back.unwrap_or(0);
            let start = anchor - Duration::days(days_back as i64);
            (start, anchor)
        }
    };
    if start > end {
        return Err(QhError::InvalidWindow(format!(
            "start {} is after end {}",
            start.format(DT_PATTERN_DATE),
            end.format(DT_PATTERN_DATE),
        )));
    }
    if end > today || start > today {
        return Err(QhError::InvalidWindow(format!(
            "window [{} … {}] is future-dated (today is {})",
            start.format(DT_PATTERN_DATE),
            end.format(DT_PATTERN_DATE),
            today.format(DT_PATTERN_DATE),
        )));
    }

    Ok(DateWindow {
        start,
        end,
        direction,
    })
}
