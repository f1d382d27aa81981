//! Date and time formatting for portal fields and the DVIC report.
//!
//! The portal date transform deliberately decomposes the ISO string
//! numerically instead of going through a calendar type: parsing
//! `YYYY-MM-DD` into a date object and re-formatting it shifts the day
//! across timezones, which corrupted real submissions. These functions must
//! stay string-level.

use crate::error::AutoDvicError;

/// AM/PM half of a 12-hour clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    /// Before noon
    Am,
    /// Noon and after
    Pm,
}

impl Meridiem {
    /// Uppercase suffix as the portal expects it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

/// Convert an ISO `YYYY-MM-DD` date to the portal's `MM/DD/YYYY` format.
///
/// # Errors
/// Returns error if the input does not split into three numeric parts.
pub fn portal_date(iso: &str) -> Result<String, AutoDvicError> {
    let (year, month, day) = split_iso_date(iso)?;
    Ok(format!("{month:02}/{day:02}/{year:04}"))
}

/// Convert an ISO `YYYY-MM-DD` date to the `MM-DD-YYYY` token used in
/// report filenames.
///
/// # Errors
/// Returns error if the input does not split into three numeric parts.
pub fn filename_date(iso: &str) -> Result<String, AutoDvicError> {
    let (year, month, day) = split_iso_date(iso)?;
    Ok(format!("{month:02}-{day:02}-{year:04}"))
}

/// Convert a 24-hour `HH:MM` time to the portal's compact `HHMMam/pm`
/// token, e.g. `13:05` becomes `0105PM` and `00:30` becomes `1230AM`.
///
/// # Errors
/// Returns error if the input does not split into numeric hour and minute
/// parts, or if either is out of range.
pub fn portal_time(hhmm: &str) -> Result<String, AutoDvicError> {
    let (hour12, minute, meridiem) = split_24h_time(hhmm)?;
    Ok(format!("{hour12:02}{minute:02}{}", meridiem.as_str()))
}

/// Convert a 24-hour `HH:MM` time to the report's `HH:MM` 12-hour reading
/// plus the AM/PM flag, e.g. `13:05` becomes `("01:05", Pm)`.
///
/// # Errors
/// Returns error if the input does not split into numeric hour and minute
/// parts, or if either is out of range.
pub fn report_time(hhmm: &str) -> Result<(String, Meridiem), AutoDvicError> {
    let (hour12, minute, meridiem) = split_24h_time(hhmm)?;
    Ok((format!("{hour12:02}:{minute:02}"), meridiem))
}

fn split_iso_date(iso: &str) -> Result<(u32, u32, u32), AutoDvicError> {
    let parts: Vec<&str> = iso.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(AutoDvicError::Validation(format!(
            "invalid date '{iso}': expected YYYY-MM-DD"
        )));
    };

    let parse = |part: &str, what: &str| {
        part.parse::<u32>().map_err(|_| {
            AutoDvicError::Validation(format!("invalid date '{iso}': non-numeric {what}"))
        })
    };

    let (year, month, day) = (parse(year, "year")?, parse(month, "month")?, parse(day, "day")?);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(AutoDvicError::Validation(format!(
            "invalid date '{iso}': month or day out of range"
        )));
    }
    Ok((year, month, day))
}

fn split_24h_time(hhmm: &str) -> Result<(u32, u32, Meridiem), AutoDvicError> {
    let Some((hour, minute)) = hhmm.split_once(':') else {
        return Err(AutoDvicError::Validation(format!(
            "invalid time '{hhmm}': expected HH:MM"
        )));
    };

    let parse = |part: &str, what: &str| {
        part.parse::<u32>().map_err(|_| {
            AutoDvicError::Validation(format!("invalid time '{hhmm}': non-numeric {what}"))
        })
    };

    let (hour, minute) = (parse(hour, "hour")?, parse(minute, "minute")?);
    if hour > 23 || minute > 59 {
        return Err(AutoDvicError::Validation(format!(
            "invalid time '{hhmm}': hour or minute out of range"
        )));
    }

    let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    Ok((hour12, minute, meridiem))
}
