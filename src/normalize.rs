//! Free-text normalization for operator-entered money amounts and dates.
//!
//! Money formatting follows the pt-BR convention: `.` for thousands,
//! `,` for decimals (`1.234,56`). Dates display day-first (`15/03/2025`)
//! but parse in either ISO or day-first form.

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::str::FromStr;

/// Parses a money amount out of arbitrary text. Never fails: anything that
/// cannot be read as a number comes back as zero, and callers re-prompt when
/// the result is not meaningfully positive.
pub fn parse_money(text: &str) -> BigDecimal {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return BigDecimal::zero();
    }

    let has_comma = cleaned.contains(',');
    let has_dot = cleaned.contains('.');

    let normalized = if has_comma && has_dot {
        // Both separators: `.` groups thousands, `,` marks decimals.
        cleaned.replace('.', "").replace(',', ".")
    } else {
        // A single separator is the decimal mark whichever character it is.
        cleaned.replace(',', ".")
    };

    BigDecimal::from_str(&normalized).unwrap_or_else(|_| BigDecimal::zero())
}

/// Formats an amount with two fraction digits, `.` thousands and `,` decimals.
pub fn format_money(amount: &BigDecimal) -> String {
    let scaled = amount.with_scale_round(2, bigdecimal::RoundingMode::HalfUp);
    let raw = scaled.to_string();

    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", raw),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (unsigned, "00".to_string()),
    };

    let mut grouped = String::new();
    for (pos, digit) in int_part.chars().enumerate() {
        if pos > 0 && (int_part.len() - pos) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}{},{}", sign, grouped, frac_part)
}

/// Accepts ISO `YYYY-MM-DD` or day-first `DD/MM/YYYY`; anything else is None.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_money_plain_and_decorated() {
        assert_eq!(parse_money("25.90"), dec("25.90"));
        assert_eq!(parse_money("25,90"), dec("25.90"));
        assert_eq!(parse_money("R$ 25,90"), dec("25.90"));
        assert_eq!(parse_money("1.234,56"), dec("1234.56"));
        assert_eq!(parse_money("  85  "), dec("85"));
    }

    #[test]
    fn test_parse_money_garbage_is_zero() {
        assert_eq!(parse_money(""), BigDecimal::zero());
        assert_eq!(parse_money("abc"), BigDecimal::zero());
        assert_eq!(parse_money("..,,"), BigDecimal::zero());
    }

    #[test]
    fn test_format_money_grouping() {
        assert_eq!(format_money(&dec("0")), "0,00");
        assert_eq!(format_money(&dec("25.9")), "25,90");
        assert_eq!(format_money(&dec("1234.56")), "1.234,56");
        assert_eq!(format_money(&dec("1234567.5")), "1.234.567,50");
    }

    #[test]
    fn test_money_round_trip() {
        for sample in ["0", "1234.56", "0.10", "45", "149.99"] {
            let amount = dec(sample);
            assert_eq!(parse_money(&format_money(&amount)), amount);
        }
    }

    #[test]
    fn test_parse_date_dual_format() {
        let iso = parse_date("2025-03-15");
        let br = parse_date("15/03/2025");
        assert_eq!(iso, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(iso, br);
    }

    #[test]
    fn test_parse_date_rejects_other_shapes() {
        assert_eq!(parse_date("15-03-2025"), None);
        assert_eq!(parse_date("2025/03/15"), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2025-02-30"), None);
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(format_date(date), "15/03/2025");
    }
}
