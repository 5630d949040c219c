//! Due-date advancement across package billing cycles.

use chrono::{Duration, NaiveDate};

pub const DEFAULT_CYCLE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalMode {
    /// Advance by the package's own cycle length.
    SameCycle,
    /// Operator supplied the new due date outright.
    ExplicitDate(NaiveDate),
}

/// Billing cycle length derived from the package name. Matching is on cycle
/// keywords so operator-named packages ("Netflix monthly", "Plano 3 meses")
/// still resolve; anything unrecognized bills monthly.
pub fn cycle_days(package: &str) -> i64 {
    let p = package.to_lowercase();

    if p.contains("semiannual") || p.contains("semestral") || p.contains("6 m") {
        180
    } else if p.contains("annual") || p.contains("anual") || p.contains("year") || p.contains("ano")
    {
        365
    } else if p.contains("quarter") || p.contains("trimestral") || p.contains("3 m") {
        90
    } else if p.contains("month") || p.contains("mensal") || p.contains("1 m") || p.contains("mês")
    {
        DEFAULT_CYCLE_DAYS
    } else {
        DEFAULT_CYCLE_DAYS
    }
}

/// Computes the next due date.
///
/// Same-cycle renewal bases itself on the current due date while the
/// subscription is still active, but on today once it is overdue: renewing an
/// expired subscription must not grant the overdue days for free.
pub fn next_due_date(
    current_due: NaiveDate,
    package: &str,
    mode: RenewalMode,
    today: NaiveDate,
) -> NaiveDate {
    match mode {
        RenewalMode::SameCycle => renew_by_days(current_due, cycle_days(package), today),
        RenewalMode::ExplicitDate(date) => date,
    }
}

/// Same-cycle rule with a caller-chosen day count (the 30/60/90/365 renewal
/// buttons).
pub fn renew_by_days(current_due: NaiveDate, days: i64, today: NaiveDate) -> NaiveDate {
    let base = if current_due >= today {
        current_due
    } else {
        today
    };
    base + Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cycle_days_lookup() {
        assert_eq!(cycle_days("monthly"), 30);
        assert_eq!(cycle_days("Netflix monthly"), 30);
        assert_eq!(cycle_days("quarterly"), 90);
        assert_eq!(cycle_days("semiannual"), 180);
        assert_eq!(cycle_days("annual"), 365);
        assert_eq!(cycle_days("Plano 1 mês"), 30);
        assert_eq!(cycle_days("Plano 3 meses"), 90);
    }

    #[test]
    fn test_cycle_days_unrecognized_defaults_to_monthly() {
        assert_eq!(cycle_days("Combo Streaming"), 30);
        assert_eq!(cycle_days(""), 30);
    }

    #[test]
    fn test_same_cycle_renewal_before_due() {
        // Not yet overdue: the new period starts where the old one ends.
        let new_due = next_due_date(
            date(2025, 1, 10),
            "monthly",
            RenewalMode::SameCycle,
            date(2025, 1, 5),
        );
        assert_eq!(new_due, date(2025, 2, 9));
    }

    #[test]
    fn test_same_cycle_renewal_overdue_starts_today() {
        // Overdue: base is today, not the stale due date.
        let new_due = next_due_date(
            date(2025, 1, 1),
            "monthly",
            RenewalMode::SameCycle,
            date(2025, 1, 20),
        );
        assert_eq!(new_due, date(2025, 2, 19));
    }

    #[test]
    fn test_renewal_on_due_day_counts_as_active() {
        let new_due = next_due_date(
            date(2025, 1, 10),
            "monthly",
            RenewalMode::SameCycle,
            date(2025, 1, 10),
        );
        assert_eq!(new_due, date(2025, 2, 9));
    }

    #[test]
    fn test_explicit_date_taken_verbatim() {
        let new_due = next_due_date(
            date(2025, 1, 1),
            "annual",
            RenewalMode::ExplicitDate(date(2025, 3, 1)),
            date(2025, 2, 1),
        );
        assert_eq!(new_due, date(2025, 3, 1));
    }

    #[test]
    fn test_renew_by_days() {
        assert_eq!(
            renew_by_days(date(2025, 1, 10), 60, date(2025, 1, 5)),
            date(2025, 3, 11)
        );
        assert_eq!(
            renew_by_days(date(2025, 1, 1), 30, date(2025, 1, 20)),
            date(2025, 2, 19)
        );
    }
}
