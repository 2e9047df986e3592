use crate::error::{CompareError, Result};

/// Parses a locale-formatted quantity into a whole count.
///
/// Every occurrence of `thousands` is dropped, wherever it appears. A single
/// `decimal` separator is allowed; only the first fractional digit decides
/// rounding (5-9 rounds up, 0-4 truncates), the remaining fractional digits
/// must be digits but are otherwise ignored.
pub fn parse_int(text: &str, thousands: Option<char>, decimal: Option<char>) -> Result<i64> {
    let grouped: String = match thousands {
        Some(sep) => text.split(sep).collect(),
        None => text.to_string(),
    };

    let mut integer = grouped.as_str();
    let mut round = 0i64;
    if let Some(sep) = decimal {
        if let Some(pos) = grouped.find(sep) {
            if grouped.rfind(sep) != Some(pos) {
                return Err(CompareError::malformed_number(
                    text,
                    "more than one decimal separator",
                ));
            }
            let fraction = &grouped[pos + sep.len_utf8()..];
            if !fraction.chars().all(|c| c.is_ascii_digit()) {
                return Err(CompareError::malformed_number(
                    text,
                    "non-digit character in decimal part",
                ));
            }
            match fraction.chars().next() {
                Some('5'..='9') => round = 1,
                Some(_) => {}
                None => {
                    return Err(CompareError::malformed_number(
                        text,
                        "missing digits after decimal separator",
                    ))
                }
            }
            integer = &grouped[..pos];
        }
    }

    if integer.is_empty() {
        return Err(CompareError::malformed_number(text, "missing integer digits"));
    }
    if !integer.chars().all(|c| c.is_ascii_digit()) {
        return Err(CompareError::malformed_number(
            text,
            "non-digit character in integer part",
        ));
    }
    let value: i64 = integer
        .parse()
        .map_err(|_| CompareError::malformed_number(text, "value out of range"))?;
    value
        .checked_add(round)
        .ok_or_else(|| CompareError::malformed_number(text, "value out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us(text: &str) -> Result<i64> {
        parse_int(text, Some(','), Some('.'))
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(us("1,234,567").unwrap(), 1_234_567);
        assert_eq!(us("1,234,567.1234").unwrap(), 1_234_567);
        assert_eq!(us("12,34,5").unwrap(), 12_345);
    }

    #[test]
    fn rounds_on_first_decimal_digit_only() {
        assert_eq!(us("1.4999").unwrap(), 1);
        assert_eq!(us("1.5000").unwrap(), 2);
        assert_eq!(us("1.6000").unwrap(), 2);
        assert_eq!(us("1.6999").unwrap(), 2);
        assert_eq!(us("0.9").unwrap(), 1);
    }

    #[test]
    fn european_locale() {
        assert_eq!(parse_int("1.234,5", Some('.'), Some(',')).unwrap(), 1235);
        assert_eq!(parse_int("980", Some('.'), Some(',')).unwrap(), 980);
    }

    #[test]
    fn no_separators_configured() {
        assert_eq!(parse_int("4200", None, None).unwrap(), 4200);
        assert!(parse_int("4,200", None, None).is_err());
        assert!(parse_int("4.2", None, None).is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            us("1.2.3"),
            Err(CompareError::MalformedNumber { .. })
        ));
        assert!(us("12a").is_err());
        assert!(us("1.2x").is_err());
        assert!(us("-5").is_err());
        assert!(us("").is_err());
        assert!(us(".5").is_err());
        assert!(us("5.").is_err());
        assert!(us(" 5").is_err());
        assert!(us("99999999999999999999").is_err());
    }
}
