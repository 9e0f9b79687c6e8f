//! Input formatting and display helpers shared by the wizard steps.
//!
//! The `format_*` functions take whatever the user has typed so far and
//! return the progressively formatted value, so they are safe to call on
//! every keystroke.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// `chrono` pattern for the `MM/DD/YYYY` dates the wizard captures.
pub const US_DATE_FORMAT: &str = "%m/%d/%Y";

static US_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));

fn digits(raw: &str, max: usize) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(max).collect()
}

/// Format a tax id as `XXX-XX-XXXX`.
pub fn format_tax_id(raw: &str) -> String {
    let d = digits(raw, 9);
    match d.len() {
        0..=3 => d,
        4..=5 => format!("{}-{}", &d[..3], &d[3..]),
        _ => format!("{}-{}-{}", &d[..3], &d[3..5], &d[5..]),
    }
}

/// Format a US phone number as `(XXX) XXX-XXXX`.
pub fn format_phone(raw: &str) -> String {
    let d = digits(raw, 10);
    match d.len() {
        0..=3 => d,
        4..=6 => format!("({}) {}", &d[..3], &d[3..]),
        _ => format!("({}) {}-{}", &d[..3], &d[3..6], &d[6..]),
    }
}

/// Format a ZIP code as `XXXXX` or `XXXXX-XXXX`.
pub fn format_zip_code(raw: &str) -> String {
    let d = digits(raw, 9);
    if d.len() <= 5 {
        d
    } else {
        format!("{}-{}", &d[..5], &d[5..])
    }
}

/// Format a date being typed as `MM/DD/YYYY`.
pub fn format_date_input(raw: &str) -> String {
    let d = digits(raw, 8);
    if d.len() >= 4 {
        format!("{}/{}/{}", &d[..2], &d[2..4], &d[4..])
    } else if d.len() >= 2 {
        format!("{}/{}", &d[..2], &d[2..])
    } else {
        d
    }
}

/// Parse a complete `MM/DD/YYYY` date. Rejects partial input and impossible dates.
pub fn parse_us_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if !US_DATE_RE.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, US_DATE_FORMAT).ok()
}

/// Long-form date for summaries, e.g. `July 4, 1990`.
pub fn format_date_display(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Hide everything but the last four digits of a tax id.
pub fn mask_tax_id(tax_id: &str) -> String {
    let d = digits(tax_id, 9);
    if d.len() == 9 {
        format!("***-**-{}", &d[5..])
    } else {
        "***-**-****".to_string()
    }
}

/// Whole years between `date_of_birth` and `today`. Negative for future dates.
pub fn calculate_age(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Body-mass index from imperial measurements.
pub fn bmi(height_feet: u8, height_inches: u8, weight_pounds: u16) -> Option<f64> {
    let inches = f64::from(height_feet) * 12.0 + f64::from(height_inches);
    if inches <= 0.0 {
        return None;
    }
    Some(703.0 * f64::from(weight_pounds) / (inches * inches))
}

/// Display band for a BMI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    HealthyWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::HealthyWeight
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::HealthyWeight => "Healthy Weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tax_id_formats_progressively() {
        assert_eq!(format_tax_id("12"), "12");
        assert_eq!(format_tax_id("1234"), "123-4");
        assert_eq!(format_tax_id("123456"), "123-45-6");
        assert_eq!(format_tax_id("123-45-6789"), "123-45-6789");
        assert_eq!(format_tax_id("1234567890123"), "123-45-6789");
    }

    #[test]
    fn phone_formats_progressively() {
        assert_eq!(format_phone("256"), "256");
        assert_eq!(format_phone("25655"), "(256) 55");
        assert_eq!(format_phone("2565551234"), "(256) 555-1234");
        assert_eq!(format_phone("+1 (256) 555-1234"), "(125) 655-5123");
    }

    #[test]
    fn zip_formats_five_or_nine() {
        assert_eq!(format_zip_code("35630"), "35630");
        assert_eq!(format_zip_code("356301234"), "35630-1234");
        assert_eq!(format_zip_code("35a63"), "3563");
    }

    #[test]
    fn date_input_formats_like_the_form() {
        assert_eq!(format_date_input("0"), "0");
        assert_eq!(format_date_input("07"), "07/");
        assert_eq!(format_date_input("0704"), "07/04/");
        assert_eq!(format_date_input("07041990"), "07/04/1990");
        assert_eq!(format_date_input("070419901"), "07/04/1990");
    }

    #[test]
    fn parse_us_date_requires_full_valid_date() {
        assert_eq!(parse_us_date("07/04/1990"), Some(date(1990, 7, 4)));
        assert_eq!(parse_us_date("7/4/1990"), None);
        assert_eq!(parse_us_date("02/30/2000"), None);
        assert_eq!(parse_us_date("1990-07-04"), None);
    }

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_tax_id("123-45-6789"), "***-**-6789");
        assert_eq!(mask_tax_id("123"), "***-**-****");
    }

    #[test]
    fn age_accounts_for_birthday_not_yet_reached() {
        let today = date(2026, 6, 15);
        assert_eq!(calculate_age(date(2000, 6, 15), today), 26);
        assert_eq!(calculate_age(date(2000, 6, 16), today), 25);
        assert_eq!(calculate_age(date(2027, 1, 1), today), -1);
    }

    #[test]
    fn bmi_bands() {
        let value = bmi(5, 9, 170).unwrap();
        assert!((value - 25.1).abs() < 0.1);
        assert_eq!(BmiCategory::from_bmi(value), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(22.0).label(), "Healthy Weight");
        assert_eq!(BmiCategory::from_bmi(17.0), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(31.0), BmiCategory::Obese);
        assert!(bmi(0, 0, 150).is_none());
    }

    #[test]
    fn display_date() {
        assert_eq!(format_date_display(date(1990, 7, 4)), "July 4, 1990");
    }
}
