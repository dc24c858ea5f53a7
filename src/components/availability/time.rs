use chrono::{NaiveDate, TimeZone, Utc};
use tracing::debug;

use crate::utils::time::today_in;

/// Parse a wire time in `HH:MM` or `HH:MM:SS` format
///
/// Both hour and minute need exactly two digits. Seconds are accepted and
/// dropped.
pub fn parse_wire_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    if parts.iter().any(|p| p.len() != 2 || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    if parts.len() == 3 && parts[2].parse::<u32>().ok()? > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Strict 24-hour `HH:MM` check
pub fn is_valid_time(value: &str) -> bool {
    value.len() == 5 && parse_wire_time(value).is_some()
}

/// Minutes since midnight of a valid `HH:MM` value
pub fn minutes_of_day(value: &str) -> Option<u32> {
    if !is_valid_time(value) {
        return None;
    }
    parse_wire_time(value).map(|(h, m)| h * 60 + m)
}

/// Format minutes since midnight as `HH:MM`
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

/// Turn raw keystrokes into a time-shaped string
///
/// Keeps at most four digits and puts a colon after the second once a third
/// digit exists. Re-feeding the output gives the same output.
pub fn format_partial_time(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).take(4).collect();
    if digits.len() >= 3 {
        format!("{}:{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

/// Converts clock times between the UTC wire format and a display zone
///
/// The offset is the one the zone has on `reference_date`, so DST changes on
/// other dates are not reflected.
#[derive(Debug, Clone)]
pub struct TimeCodec<Tz: TimeZone> {
    zone: Tz,
    reference_date: NaiveDate,
}

impl<Tz: TimeZone> TimeCodec<Tz> {
    /// Create a codec for a zone on a fixed reference date
    pub fn new(zone: Tz, reference_date: NaiveDate) -> Self {
        Self {
            zone,
            reference_date,
        }
    }

    /// Create a codec using today's date in the zone as reference
    pub fn for_today(zone: Tz) -> Self {
        let reference_date = today_in(&zone);
        Self::new(zone, reference_date)
    }

    /// The display zone
    pub fn zone(&self) -> &Tz {
        &self.zone
    }

    /// Shift a UTC `HH:MM[:SS]` time into the display zone
    ///
    /// Input that does not look like a time is returned unchanged.
    pub fn convert_utc_to_local_hhmm(&self, wire_time: &str) -> String {
        let Some((hour, minute)) = parse_wire_time(wire_time) else {
            return wire_time.to_string();
        };
        let Some(naive) = self.reference_date.and_hms_opt(hour, minute, 0) else {
            return wire_time.to_string();
        };

        Utc.from_utc_datetime(&naive)
            .with_timezone(&self.zone)
            .naive_local()
            .format("%H:%M")
            .to_string()
    }

    /// Shift a display-zone `HH:MM[:SS]` time back to UTC
    ///
    /// Input that does not look like a time, or that falls into a DST gap on
    /// the reference date, is returned unchanged.
    pub fn local_to_utc_hhmm(&self, local_time: &str) -> String {
        let Some((hour, minute)) = parse_wire_time(local_time) else {
            return local_time.to_string();
        };
        let Some(naive) = self.reference_date.and_hms_opt(hour, minute, 0) else {
            return local_time.to_string();
        };

        match self.zone.from_local_datetime(&naive).earliest() {
            Some(local) => local.naive_utc().format("%H:%M").to_string(),
            None => {
                debug!("Local time {} does not exist on {}", local_time, self.reference_date);
                local_time.to_string()
            }
        }
    }
}
