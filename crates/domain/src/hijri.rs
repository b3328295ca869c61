//! Hijri (AH) calendar dates and conversion to the Gregorian calendar.
//!
//! Uses the civil tabular Islamic calendar: a 30-year cycle with leap years
//! at cycle years 2, 5, 7, 10, 13, 16, 18, 21, 24, 26 and 29, months
//! alternating 30/29 days, and 1 Muharram 1 AH fixed at Julian day number
//! 1,948,440 (Friday, 16 July 622 CE Julian). Round-trips through the
//! Gregorian calendar are exact; agreement with observation-based calendars
//! such as Umm al-Qura is within one day.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use silat_core::{AppError, AppResult};

/// Julian day number of 1 Muharram 1 AH in the civil tabular calendar.
const HIJRI_EPOCH_JDN: i64 = 1_948_440;

/// Offset between `chrono` days-from-CE and Julian day numbers.
const JDN_CE_OFFSET: i64 = 1_721_425;

/// Largest Hijri year accepted on any boundary.
const MAX_HIJRI_YEAR: i32 = 9999;

const MONTH_NAMES_ARABIC: [&str; 12] = [
    "محرم",
    "صفر",
    "ربيع الأول",
    "ربيع الآخر",
    "جمادى الأولى",
    "جمادى الآخرة",
    "رجب",
    "شعبان",
    "رمضان",
    "شوال",
    "ذو القعدة",
    "ذو الحجة",
];

/// A validated date in the Hijri (AH) calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HijriDate {
    year: i32,
    month: u32,
    day: u32,
}

impl HijriDate {
    /// Creates a validated Hijri date.
    pub fn new(year: i32, month: u32, day: u32) -> AppResult<Self> {
        if !(1..=MAX_HIJRI_YEAR).contains(&year) {
            return Err(AppError::Conversion(format!(
                "hijri year {year} is outside the supported range 1..={MAX_HIJRI_YEAR}"
            )));
        }

        if !(1..=12).contains(&month) {
            return Err(AppError::Conversion(format!(
                "hijri month {month} is outside the range 1..=12"
            )));
        }

        let month_days = days_in_month(year, month);
        if !(1..=month_days).contains(&day) {
            return Err(AppError::Conversion(format!(
                "hijri day {day} is outside the range 1..={month_days} for month {month} of year {year}"
            )));
        }

        Ok(Self { year, month, day })
    }

    /// Converts a Gregorian date to its Hijri representation.
    pub fn from_gregorian(date: NaiveDate) -> AppResult<Self> {
        let jdn = i64::from(date.num_days_from_ce()) + JDN_CE_OFFSET;
        if jdn < HIJRI_EPOCH_JDN {
            return Err(AppError::Conversion(format!(
                "gregorian date '{date}' predates the Hijri epoch"
            )));
        }

        let days = jdn - HIJRI_EPOCH_JDN;
        let mut year = i32::try_from((30 * days + 10_646) / 10_631).map_err(|_| {
            AppError::Conversion(format!("gregorian date '{date}' overflows the Hijri calendar"))
        })?;

        while year_start_jdn(year) > jdn {
            year -= 1;
        }
        while year_start_jdn(year + 1) <= jdn {
            year += 1;
        }

        if year > MAX_HIJRI_YEAR {
            return Err(AppError::Conversion(format!(
                "gregorian date '{date}' is past hijri year {MAX_HIJRI_YEAR}"
            )));
        }

        let mut remaining = jdn - year_start_jdn(year);
        let mut month = 1;
        while remaining >= i64::from(days_in_month(year, month)) {
            remaining -= i64::from(days_in_month(year, month));
            month += 1;
        }

        Self::new(year, month, u32::try_from(remaining + 1).unwrap_or(1))
    }

    /// Converts this Hijri date to the Gregorian calendar.
    pub fn to_gregorian(&self) -> AppResult<NaiveDate> {
        let jdn = self.to_jdn();
        let days_from_ce = i32::try_from(jdn - JDN_CE_OFFSET).map_err(|_| {
            AppError::Conversion(format!("hijri date '{self}' overflows the Gregorian calendar"))
        })?;

        NaiveDate::from_num_days_from_ce_opt(days_from_ce).ok_or_else(|| {
            AppError::Conversion(format!(
                "hijri date '{self}' has no Gregorian representation"
            ))
        })
    }

    /// Returns the Hijri year (AH).
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month, 1 = Muharram.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the day of the month.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Renders the date with its Arabic month name and the AH suffix.
    ///
    /// Presentation only; comparisons always go through the Gregorian
    /// representation.
    #[must_use]
    pub fn format_arabic(&self) -> String {
        let name = MONTH_NAMES_ARABIC[(self.month - 1) as usize];
        format!("{} {} {} هـ", self.day, name, self.year)
    }

    /// Returns whether a Hijri year is a leap year of the 30-year cycle.
    #[must_use]
    pub fn is_leap_year(year: i32) -> bool {
        is_leap_year(year)
    }

    /// Returns the number of days in a Hijri month.
    ///
    /// Odd months have 30 days, even months 29; Dhu al-Hijjah gains a 30th
    /// day in leap years.
    #[must_use]
    pub fn days_in_month(year: i32, month: u32) -> u32 {
        days_in_month(year, month)
    }

    fn to_jdn(self) -> i64 {
        let year = i64::from(self.year);
        HIJRI_EPOCH_JDN
            + 354 * (year - 1)
            + (11 * (year - 1) + 14) / 30
            + days_before_month(self.month)
            + i64::from(self.day)
            - 1
    }
}

impl Display for HijriDate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{:04}-{:02}-{:02}",
            self.year, self.month, self.day
        )
    }
}

impl FromStr for HijriDate {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, '-');
        let year = parts.next();
        let month = parts.next();
        let day = parts.next();

        let (Some(year), Some(month), Some(day)) = (year, month, day) else {
            return Err(AppError::Validation(format!(
                "hijri date '{value}' is not in YYYY-MM-DD format"
            )));
        };

        let parsed = (
            year.parse::<i32>(),
            month.parse::<u32>(),
            day.parse::<u32>(),
        );
        let (Ok(year), Ok(month), Ok(day)) = parsed else {
            return Err(AppError::Validation(format!(
                "hijri date '{value}' contains non-numeric components"
            )));
        };

        Self::new(year, month, day)
    }
}

impl TryFrom<String> for HijriDate {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HijriDate> for String {
    fn from(value: HijriDate) -> Self {
        value.to_string()
    }
}

/// Returns whether a string is a well-formed, in-range Hijri date.
#[must_use]
pub fn is_valid_hijri_date(value: &str) -> bool {
    value.parse::<HijriDate>().is_ok()
}

fn is_leap_year(year: i32) -> bool {
    (11 * i64::from(year) + 14).rem_euclid(30) < 11
}

fn days_in_month(year: i32, month: u32) -> u32 {
    if month % 2 == 1 || (month == 12 && is_leap_year(year)) {
        30
    } else {
        29
    }
}

fn days_before_month(month: u32) -> i64 {
    i64::from(29 * (month - 1) + month / 2)
}

fn year_start_jdn(year: i32) -> i64 {
    let year = i64::from(year);
    HIJRI_EPOCH_JDN + 354 * (year - 1) + (11 * (year - 1) + 14) / 30
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::{HijriDate, is_valid_hijri_date};

    fn gregorian(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    #[test]
    fn epoch_maps_to_july_622() {
        let epoch = HijriDate::new(1, 1, 1).and_then(|date| date.to_gregorian());
        assert_eq!(epoch.ok(), Some(gregorian(622, 7, 19)));
    }

    #[test]
    fn year_1446_starts_in_july_2024() {
        let new_year = HijriDate::new(1446, 1, 1).and_then(|date| date.to_gregorian());
        assert_eq!(new_year.ok(), Some(gregorian(2024, 7, 8)));

        let converted = HijriDate::from_gregorian(gregorian(2024, 7, 8));
        assert_eq!(converted.ok(), HijriDate::new(1446, 1, 1).ok());
    }

    #[test]
    fn leap_years_follow_the_thirty_year_cycle() {
        assert!(HijriDate::is_leap_year(2));
        assert!(HijriDate::is_leap_year(1442));
        assert!(!HijriDate::is_leap_year(1));
        assert!(!HijriDate::is_leap_year(1443));
    }

    #[test]
    fn dhu_al_hijjah_has_thirty_days_only_in_leap_years() {
        assert_eq!(HijriDate::days_in_month(1442, 12), 30);
        assert_eq!(HijriDate::days_in_month(1443, 12), 29);
        assert_eq!(HijriDate::days_in_month(1443, 11), 30);
    }

    #[test]
    fn validates_wire_format_strings() {
        assert!(is_valid_hijri_date("1446-07-01"));
        assert!(!is_valid_hijri_date("1446-13-01"));
        assert!(!is_valid_hijri_date("1446-07-32"));
        assert!(!is_valid_hijri_date("1446/07/01"));
        assert!(!is_valid_hijri_date("ramadan-1446"));
    }

    #[test]
    fn rejects_day_thirty_of_month_twelve_in_common_years() {
        assert!(HijriDate::new(1443, 12, 30).is_err());
        assert!(HijriDate::new(1442, 12, 30).is_ok());
    }

    #[test]
    fn rejects_dates_before_the_epoch() {
        let result = HijriDate::from_gregorian(gregorian(600, 1, 1));
        assert!(result.is_err());
    }

    #[test]
    fn formats_arabic_month_names() {
        let date = HijriDate::new(1446, 9, 15).ok();
        assert_eq!(
            date.map(|value| value.format_arabic()),
            Some("15 رمضان 1446 هـ".to_owned())
        );
    }

    #[test]
    fn display_uses_padded_wire_format() {
        let date = HijriDate::new(7, 3, 9).ok();
        assert_eq!(date.map(|value| value.to_string()), Some("0007-03-09".to_owned()));
    }

    proptest! {
        #[test]
        fn gregorian_roundtrip_is_exact(offset in 0i64..700_000) {
            let date = gregorian(622, 7, 19) + chrono::Days::new(offset as u64);
            let hijri = HijriDate::from_gregorian(date);
            prop_assert!(hijri.is_ok());
            let restored = hijri.and_then(|value| value.to_gregorian());
            prop_assert_eq!(restored.ok(), Some(date));
        }

        #[test]
        fn hijri_roundtrip_is_exact(year in 1i32..5000, month in 1u32..=12, day in 1u32..=29) {
            let date = HijriDate::new(year, month, day);
            prop_assert!(date.is_ok());
            let restored = date
                .and_then(|value| value.to_gregorian())
                .and_then(HijriDate::from_gregorian);
            prop_assert_eq!(restored.ok(), HijriDate::new(year, month, day).ok());
        }
    }
}
