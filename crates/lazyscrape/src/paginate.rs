// ABOUTME: Pagination driver: page range parsing and the fetch-extract loop with its stop rules.
// ABOUTME: Stops on a short page, past the end index, or at a hard safety limit on page count.

//! Page-by-page extraction.
//!
//! A [`PageRange`] is written `start,end,step[,pagesize]`, where `-1` for
//! `end` or `pagesize` means unbounded. The loop always processes the start
//! page, then advances by `step` and checks, in order:
//!
//! 1. the page had fewer items than `pagesize` ([`StopReason::ShortPage`]);
//! 2. the index moved past `end`, or past `i64::MAX`
//!    ([`StopReason::EndReached`]);
//! 3. the number of processed pages hit the safety limit
//!    ([`StopReason::SafetyLimit`]).

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::{Result, ScrapeError};

/// Default cap on pages fetched in one run.
pub const DEFAULT_MAX_PAGES: usize = 1000;

const UNBOUNDED: i64 = -1;

/// Numeric page index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: i64,
    /// Last index to fetch, inclusive. `None` is unbounded.
    pub end: Option<i64>,
    /// Always positive.
    pub step: i64,
    /// A page with fewer items than this ends the run.
    pub page_size: Option<usize>,
}

impl PageRange {
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(ScrapeError::page_range(
                spec,
                format!("expected start,end,step[,pagesize], got {} parts", parts.len()),
            ));
        }

        let mut numbers = Vec::with_capacity(parts.len());
        for part in &parts {
            let n = part.parse::<i64>().map_err(|_| {
                ScrapeError::page_range(spec, format!("'{part}' is not an integer"))
            })?;
            numbers.push(n);
        }

        let (start, end, step) = (numbers[0], numbers[1], numbers[2]);
        if step <= 0 {
            return Err(ScrapeError::page_range(spec, "step must be positive"));
        }
        if end < UNBOUNDED {
            return Err(ScrapeError::page_range(spec, "end must be -1 or an index"));
        }
        let page_size = match numbers.get(3).copied() {
            None | Some(UNBOUNDED) => None,
            Some(n) => Some(usize::try_from(n).map_err(|_| {
                ScrapeError::page_range(spec, "pagesize must be -1 or a count")
            })?),
        };

        Ok(Self {
            start,
            end: (end != UNBOUNDED).then_some(end),
            step,
            page_size,
        })
    }
}

impl FromStr for PageRange {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageRange::parse(s)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.start,
            self.end.unwrap_or(UNBOUNDED),
            self.step
        )?;
        if let Some(size) = self.page_size {
            write!(f, ",{size}")?;
        }
        Ok(())
    }
}

/// A page range bound to the request parameter that carries the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page_key: String,
    pub range: PageRange,
}

impl Pagination {
    pub fn new(page_key: impl Into<String>, range: PageRange) -> Self {
        Self {
            page_key: page_key.into(),
            range,
        }
    }
}

/// Why a paginated run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ShortPage,
    EndReached,
    SafetyLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::ShortPage => "short page",
            StopReason::EndReached => "end of range",
            StopReason::SafetyLimit => "safety page limit",
        })
    }
}

/// Accumulated result of a paginated run.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated {
    pub data: Dataset,
    pub pages: usize,
    pub stop: StopReason,
}

/// Run `page` for each index of `pagination.range` until a stop rule fires.
///
/// An error from `page` aborts the run and is returned as is; data from
/// earlier pages is dropped.
pub fn paginate<F>(pagination: &Pagination, max_pages: usize, mut page: F) -> Result<Paginated>
where
    F: FnMut(i64) -> Result<Dataset>,
{
    let range = pagination.range;
    let max_pages = max_pages.max(1);
    let mut current = range.start;
    let mut pages = 0usize;
    let mut data: Option<Dataset> = None;

    let stop = loop {
        let found = page(current)?;
        let count = found.len();
        pages += 1;
        match data.as_mut() {
            Some(acc) => acc.extend(found)?,
            None => data = Some(found),
        }
        let next = current.checked_add(range.step);

        if range.page_size.is_some_and(|size| count < size) {
            break StopReason::ShortPage;
        }
        // No representable next index: the range is exhausted.
        let Some(next) = next else {
            break StopReason::EndReached;
        };
        current = next;
        if range.end.is_some_and(|end| current > end) {
            break StopReason::EndReached;
        }
        if pages >= max_pages {
            break StopReason::SafetyLimit;
        }
    };

    match stop {
        StopReason::SafetyLimit => warn!(
            page_key = %pagination.page_key,
            pages,
            next = current,
            "pagination stopped at safety limit"
        ),
        _ => info!(page_key = %pagination.page_key, pages, reason = %stop, "pagination finished"),
    }

    Ok(Paginated {
        data: data.unwrap_or_default(),
        pages,
        stop,
    })
}
