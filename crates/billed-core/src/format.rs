use chrono::{Datelike, NaiveDate};

const MONTHS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Juin", "Juil", "Aoû", "Sep", "Oct", "Nov", "Déc",
];

/// Render a store date ("2004-04-04") as the short French display form
/// ("4 Avr. 04"). A malformed date is the caller's problem: list rendering
/// keeps the raw value instead of dropping the record.
pub fn format_date(raw: &str) -> Result<String, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
    let month = MONTHS[date.month0() as usize];
    Ok(format!("{} {}. {:02}", date.day(), month, date.year() % 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_french_form() {
        assert_eq!(format_date("2004-04-04").unwrap(), "4 Avr. 04");
        assert_eq!(format_date("2001-01-01").unwrap(), "1 Jan. 01");
        assert_eq!(format_date("2022-12-31").unwrap(), "31 Déc. 22");
    }

    #[test]
    fn no_leading_zero_on_the_day() {
        assert_eq!(format_date("2003-03-03").unwrap(), "3 Mar. 03");
    }

    #[test]
    fn malformed_dates_error_out() {
        assert!(format_date("").is_err());
        assert!(format_date("04/04/2004").is_err());
        assert!(format_date("not-a-date").is_err());
    }
}
