use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How much of a release date the catalog knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// Release date as a full date, missing month and day set to the 1st.
///
/// Without a precision it is inferred from the number of components.
///
/// ```
/// use chrono::NaiveDate;
/// use core_catalog::{normalize_release_date, DatePrecision};
///
/// let date = normalize_release_date("1999-07", Some(DatePrecision::Month)).unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(1999, 7, 1).unwrap());
/// ```
pub fn normalize_release_date(
    date: &str,
    precision: Option<DatePrecision>,
) -> Result<NaiveDate, String> {
    let parts: Vec<&str> = date.trim().split('-').collect();
    let precision = precision.unwrap_or(match parts.len() {
        1 => DatePrecision::Year,
        2 => DatePrecision::Month,
        _ => DatePrecision::Day,
    });

    let component = |index: usize, name: &str| -> Result<u32, String> {
        parts
            .get(index)
            .ok_or_else(|| format!("release date {:?} has no {}", date, name))?
            .parse::<u32>()
            .map_err(|e| format!("invalid {} in release date {:?}: {}", name, date, e))
    };

    let year = parts[0]
        .parse::<i32>()
        .map_err(|e| format!("invalid year in release date {:?}: {}", date, e))?;
    let month = if precision >= DatePrecision::Month {
        component(1, "month")?
    } else {
        1
    };
    let day = if precision == DatePrecision::Day {
        component(2, "day")?
    } else {
        1
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("release date {:?} is not a calendar date", date))
}
