//! Campaign week calendar.
//!
//! # Invariants
//! - Week numbers are contiguous and start at 1.
//! - Weeks are 7 days long except the last, which ends at the campaign end date.
//! - A calendar is regenerated wholesale, never edited week by week.
//! - A campaign spans at most `MAX_CAMPAIGN_WEEKS` weeks.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One day in epoch milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const DAYS_PER_WEEK: i64 = 7;
/// Longest accepted campaign, ten years of weeks.
pub const MAX_CAMPAIGN_WEEKS: u32 = 520;

/// One generated campaign week. Dates are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub week_number: u32,
    pub start_date: i64,
    pub end_date: i64,
    pub label: String,
}

/// Rejected campaign date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDateRange {
    EndBeforeStart { start_date: i64, end_date: i64 },
    TooLong { start_date: i64, end_date: i64 },
}

impl Display for InvalidDateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndBeforeStart {
                start_date,
                end_date,
            } => write!(
                f,
                "campaign end date {end_date} is before start date {start_date}"
            ),
            Self::TooLong {
                start_date,
                end_date,
            } => write!(
                f,
                "campaign range {start_date}..={end_date} exceeds {MAX_CAMPAIGN_WEEKS} weeks"
            ),
        }
    }
}

impl Error for InvalidDateRange {}

/// Generates the week calendar for an inclusive `[start_date, end_date]` range.
///
/// Week `n` starts at `start_date + (n - 1) * 7 days`; the final week is
/// truncated at `end_date`. A single-day range yields one week.
pub fn generate_weeks(start_date: i64, end_date: i64) -> Result<Vec<Week>, InvalidDateRange> {
    if end_date < start_date {
        return Err(InvalidDateRange::EndBeforeStart {
            start_date,
            end_date,
        });
    }
    let too_long = InvalidDateRange::TooLong {
        start_date,
        end_date,
    };

    let span = end_date.checked_sub(start_date).ok_or(too_long)?;
    let days_inclusive = span / DAY_MS + 1;
    let week_count = (days_inclusive + DAYS_PER_WEEK - 1) / DAYS_PER_WEEK;
    let week_count = u32::try_from(week_count)
        .ok()
        .filter(|count| *count <= MAX_CAMPAIGN_WEEKS)
        .ok_or(too_long)?;

    let weeks = (0..week_count)
        .map(|index| {
            let week_start = start_date + i64::from(index) * DAYS_PER_WEEK * DAY_MS;
            let week_end = week_start
                .saturating_add((DAYS_PER_WEEK - 1) * DAY_MS)
                .min(end_date);
            let week_number = index + 1;
            Week {
                week_number,
                start_date: week_start,
                end_date: week_end,
                label: format!("Week {week_number}"),
            }
        })
        .collect();

    Ok(weeks)
}
