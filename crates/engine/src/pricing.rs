//! Buy-out pricing.
//!
//! Converting an in-progress rental into a purchase credits the rental cost
//! already incurred against the outright price. The computation is pure; the
//! ops layer feeds it from the rental and good rows.

use chrono::NaiveDate;

/// Day count of a rental contract, inclusive of both endpoints.
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Inputs for a buy-out quote.
#[derive(Clone, Copy, Debug)]
pub struct BuyoutTerms {
    /// Outright price per unit.
    pub price_buy: i64,
    /// Per-day rate, when the good has one.
    pub price_per_day: Option<i64>,
    pub quantity: i64,
    /// Contracted day count; caps the elapsed occupancy when known.
    pub contracted_days: Option<i64>,
    /// Previously agreed rental total, used for interpolation when there is
    /// no per-day rate.
    pub agreed_total_price: i64,
    /// Day count the agreed total covers.
    pub agreed_total_days: i64,
}

impl BuyoutTerms {
    /// The amount a buy-out purchase charges.
    ///
    /// `elapsed_days` is whole days of occupancy since the rental actually
    /// started; it is floored at 1 and capped at the contracted day count
    /// when one is known. Rental cost is `rate × days × quantity` when a
    /// per-day rate exists, otherwise a linear share of the agreed total.
    /// Never negative.
    pub fn payable(&self, elapsed_days: i64) -> i64 {
        let mut days = elapsed_days.max(1);
        if let Some(cap) = self.contracted_days {
            days = days.min(cap.max(1));
        }

        let purchase_price = self.price_buy * self.quantity;
        let rental_cost = match self.price_per_day {
            Some(rate) => rate * days * self.quantity,
            None if self.agreed_total_days > 0 => {
                self.agreed_total_price * days.min(self.agreed_total_days)
                    / self.agreed_total_days
            }
            None => 0,
        };

        (purchase_price - rental_cost).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_rate_credits_elapsed_days() {
        let terms = BuyoutTerms {
            price_buy: 10_000,
            price_per_day: Some(500),
            quantity: 1,
            contracted_days: Some(10),
            agreed_total_price: 0,
            agreed_total_days: 10,
        };
        // 4 days of a 10-day rental at 500/day.
        assert_eq!(terms.payable(4), 8_000);
    }

    #[test]
    fn interpolates_agreed_total_without_daily_rate() {
        let terms = BuyoutTerms {
            price_buy: 10_000,
            price_per_day: None,
            quantity: 1,
            contracted_days: None,
            agreed_total_price: 3_000,
            agreed_total_days: 10,
        };
        // 25 days elapsed, agreed 3000 over 10: the share tops out at the
        // full agreed total.
        assert_eq!(terms.payable(25), 7_000);
    }

    #[test]
    fn elapsed_days_floor_at_one() {
        let terms = BuyoutTerms {
            price_buy: 10_000,
            price_per_day: Some(500),
            quantity: 2,
            contracted_days: Some(10),
            agreed_total_price: 0,
            agreed_total_days: 10,
        };
        assert_eq!(terms.payable(0), 18_000);
        assert_eq!(terms.payable(-3), 18_000);
    }

    #[test]
    fn contracted_days_cap_elapsed() {
        let terms = BuyoutTerms {
            price_buy: 10_000,
            price_per_day: Some(500),
            quantity: 1,
            contracted_days: Some(10),
            agreed_total_price: 0,
            agreed_total_days: 10,
        };
        // 30 days elapsed still only credits the contracted 10.
        assert_eq!(terms.payable(30), 5_000);
    }

    #[test]
    fn payable_never_negative() {
        let terms = BuyoutTerms {
            price_buy: 1_000,
            price_per_day: Some(500),
            quantity: 1,
            contracted_days: Some(30),
            agreed_total_price: 0,
            agreed_total_days: 30,
        };
        assert_eq!(terms.payable(10), 0);
    }

    #[test]
    fn rental_days_are_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(rental_days(start, start), 1);
        assert_eq!(
            rental_days(start, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()),
            10
        );
    }
}
