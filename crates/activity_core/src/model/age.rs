//! Civil age derivation from a date of birth.

use chrono::{Datelike, NaiveDate};

/// Returns the civil age of someone born on `birth_date`, evaluated on `today`.
///
/// The age is the year difference, minus one when `today` falls before the
/// birthday in the current year. Returns `None` when `birth_date` is after
/// `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> Option<i32> {
    if birth_date > today {
        return None;
    }

    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    Some(age)
}

#[cfg(test)]
mod tests {
    use super::age_on;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn day_before_birthday_is_one_year_younger() {
        assert_eq!(age_on(date(2000, 6, 15), date(2024, 6, 14)), Some(23));
    }

    #[test]
    fn birthday_itself_counts_the_new_year() {
        assert_eq!(age_on(date(2000, 6, 15), date(2024, 6, 15)), Some(24));
    }

    #[test]
    fn earlier_month_is_not_yet_birthday() {
        assert_eq!(age_on(date(1990, 12, 1), date(2024, 3, 31)), Some(33));
    }

    #[test]
    fn born_today_is_zero() {
        assert_eq!(age_on(date(2024, 1, 1), date(2024, 1, 1)), Some(0));
    }

    #[test]
    fn leap_day_birthday_turns_over_on_march_first() {
        assert_eq!(age_on(date(2004, 2, 29), date(2023, 2, 28)), Some(18));
        assert_eq!(age_on(date(2004, 2, 29), date(2023, 3, 1)), Some(19));
    }

    #[test]
    fn future_birth_date_has_no_age() {
        assert_eq!(age_on(date(2030, 1, 1), date(2024, 1, 1)), None);
    }
}
