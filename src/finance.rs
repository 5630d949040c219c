//! Month-bounded revenue aggregation over a repository snapshot.

use crate::models::Client;
use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, Duration, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    /// Sum of prices for clients whose due date falls in the month.
    pub projected: BigDecimal,
    /// Sum of prices for clients marked paid with a payment date in the month.
    pub recognized: BigDecimal,
}

/// Inclusive first and last day of the month containing `today`.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);

    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };

    let last = next_month
        .map(|d| d - Duration::days(1))
        .unwrap_or(first);

    (first, last)
}

/// Pure over the given snapshot; no state is persisted.
pub fn monthly_revenue(clients: &[Client], today: NaiveDate) -> MonthlyRevenue {
    let (start, end) = month_bounds(today);

    let mut projected = BigDecimal::zero();
    let mut recognized = BigDecimal::zero();

    for client in clients {
        if client.due_date >= start && client.due_date <= end {
            projected += &client.price;
        }

        if client.is_paid() {
            if let Some(paid_on) = client.payment_date {
                if paid_on >= start && paid_on <= end {
                    recognized += &client.price;
                }
            }
        }
    }

    MonthlyRevenue {
        projected,
        recognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn client(price: &str, due: NaiveDate, paid_on: Option<NaiveDate>) -> Client {
        Client {
            id: 0,
            owner_id: 1,
            name: "c".to_string(),
            phone: "11999999999".to_string(),
            package: "monthly".to_string(),
            price: dec(price),
            due_date: due,
            server: "s1".to_string(),
            extra_notes: None,
            payment_status: if paid_on.is_some() { "paid" } else { "pending" }.to_string(),
            payment_date: paid_on,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(
            month_bounds(date(2025, 6, 10)),
            (date(2025, 6, 1), date(2025, 6, 30))
        );
        assert_eq!(
            month_bounds(date(2025, 12, 31)),
            (date(2025, 12, 1), date(2025, 12, 31))
        );
        assert_eq!(
            month_bounds(date(2024, 2, 15)),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn test_projected_and_recognized() {
        let today = date(2025, 6, 10);
        let clients = vec![
            client("30", date(2025, 6, 5), None),
            client("45", date(2025, 6, 20), Some(date(2025, 6, 3))),
            client("90", date(2025, 6, 28), None),
        ];

        let revenue = monthly_revenue(&clients, today);
        assert_eq!(revenue.projected, dec("165"));
        assert_eq!(revenue.recognized, dec("45"));
    }

    #[test]
    fn test_out_of_month_due_dates_excluded() {
        let today = date(2025, 6, 10);
        let clients = vec![
            client("30", date(2025, 5, 31), None),
            client("45", date(2025, 7, 1), None),
        ];

        let revenue = monthly_revenue(&clients, today);
        assert_eq!(revenue.projected, BigDecimal::zero());
    }

    #[test]
    fn test_payment_outside_month_not_recognized() {
        let today = date(2025, 6, 10);
        // Due this month but paid back in May: projected yes, recognized no.
        let clients = vec![client("30", date(2025, 6, 5), Some(date(2025, 5, 28)))];

        let revenue = monthly_revenue(&clients, today);
        assert_eq!(revenue.projected, dec("30"));
        assert_eq!(revenue.recognized, BigDecimal::zero());
    }
}
