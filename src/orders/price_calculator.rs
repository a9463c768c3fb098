use rust_decimal::Decimal;

/// Order totals from snapshotted unit prices
pub struct PriceCalculator;

impl PriceCalculator {
    /// `quantity × unit_price`
    pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    /// Sum of `(quantity, unit_price)` lines, rounded to cents
    pub fn order_total(lines: &[(i32, Decimal)]) -> Decimal {
        lines
            .iter()
            .map(|(quantity, price)| Self::line_total(*quantity, *price))
            .sum::<Decimal>()
            .round_dp(2)
    }

    /// Amount sent to the payment gateway: whole currency units × 100
    pub fn gateway_amount(total: Decimal) -> Option<i64> {
        use rust_decimal::prelude::ToPrimitive;
        (total * Decimal::from(100)).round().to_i64()
    }
}
