use chrono::{Datelike, NaiveDate, TimeZone, Utc};

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse date string in YYYY-MM-DD format
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).ok()
}

/// Format a date as YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Day of week with 0 = Sunday .. 6 = Saturday
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Today's civil date in the given zone
pub fn today_in<Tz: TimeZone>(zone: &Tz) -> NaiveDate {
    Utc::now().with_timezone(zone).date_naive()
}

/// The seven dates of the Sunday-to-Saturday week containing `date`
pub fn week_dates(date: NaiveDate) -> [NaiveDate; 7] {
    // Calculate Sunday of the current week
    let sunday = date
        .checked_sub_signed(chrono::Duration::days(day_of_week(date) as i64))
        .unwrap_or(date);

    let mut dates = [sunday; 7];
    for (offset, slot) in dates.iter_mut().enumerate() {
        *slot = sunday
            .checked_add_signed(chrono::Duration::days(offset as i64))
            .unwrap_or(sunday);
    }
    dates
}

/// Get date range for the week containing `date` (Sunday to Saturday)
pub fn get_weekly_date_range(date: NaiveDate) -> (String, String) {
    let dates = week_dates(date);
    (format_date(dates[0]), format_date(dates[6]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-06-02"),
            NaiveDate::from_ymd_opt(2025, 6, 2)
        );
        assert_eq!(parse_date(" 2025-06-02 "), NaiveDate::from_ymd_opt(2025, 6, 2));
        assert_eq!(parse_date("2025-13-01"), None);
        assert_eq!(parse_date("02.06.2025"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_day_of_week() {
        // Sunday, 2025-06-01
        assert_eq!(day_of_week(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()), 0);
        // Monday, 2025-06-02
        assert_eq!(day_of_week(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()), 1);
        // Saturday, 2025-06-07
        assert_eq!(day_of_week(NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()), 6);
    }

    #[test]
    fn test_get_weekly_date_range() {
        // Sunday, 2025-06-01
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let (start, end) = get_weekly_date_range(sunday);
        assert_eq!(start, "2025-06-01");
        assert_eq!(end, "2025-06-07");

        // Wednesday, 2025-06-04
        let wednesday = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let (start, end) = get_weekly_date_range(wednesday);
        assert_eq!(start, "2025-06-01");
        assert_eq!(end, "2025-06-07");

        // Saturday, 2025-06-07
        let saturday = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        let (start, end) = get_weekly_date_range(saturday);
        assert_eq!(start, "2025-06-01");
        assert_eq!(end, "2025-06-07");
    }

    #[test]
    fn test_week_dates_cross_month() {
        // Tuesday, 2025-07-01
        let dates = week_dates(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(format_date(dates[0]), "2025-06-29");
        assert_eq!(format_date(dates[6]), "2025-07-05");
        for (i, d) in dates.iter().enumerate() {
            assert_eq!(day_of_week(*d) as usize, i);
        }
    }
}
