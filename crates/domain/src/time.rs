//! Time and timestamp helpers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// UTC timestamp used for frame arrival, capture and storage times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole years elapsed between `birthdate` and `on`.
///
/// One year less when the birthday has not been reached yet in the year of
/// `on`; never negative.
#[must_use]
pub fn age_in_years(birthdate: NaiveDate, on: NaiveDate) -> u32 {
    let mut years = on.year() - birthdate.year();
    if (on.month(), on.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}
