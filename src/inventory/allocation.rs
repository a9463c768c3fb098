// Splitting a sale across dealer stock

use serde::Serialize;

/// Units of one vehicle held by one dealer
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct DealerStock {
    pub dealer_id: i32,
    pub quantity: i32,
}

/// Units to take from one dealer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reduction {
    pub dealer_id: i32,
    pub quantity: i32,
}

/// Total stock cannot cover the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub required: i32,
    /// Summed across dealers, so it may exceed `i32::MAX`
    pub available: i64,
}

impl Shortfall {
    pub fn missing(&self) -> i64 {
        i64::from(self.required) - self.available
    }
}

/// Plan how `required` units are taken from dealer stock.
///
/// The order's own dealer is drained first, then the other dealers from the
/// largest holding down (ties by lower dealer id). Either the whole quantity
/// is covered or nothing is planned.
pub fn plan_reduction(
    preferred_dealer: i32,
    required: i32,
    stocks: &[DealerStock],
) -> Result<Vec<Reduction>, Shortfall> {
    if required <= 0 {
        return Ok(Vec::new());
    }

    let available: i64 = stocks.iter().map(|s| i64::from(s.quantity.max(0))).sum();
    if available < i64::from(required) {
        return Err(Shortfall { required, available });
    }

    let mut ordered: Vec<DealerStock> = stocks.iter().copied().filter(|s| s.quantity > 0).collect();
    ordered.sort_by(|a, b| {
        let a_first = a.dealer_id == preferred_dealer;
        let b_first = b.dealer_id == preferred_dealer;
        b_first
            .cmp(&a_first)
            .then(b.quantity.cmp(&a.quantity))
            .then(a.dealer_id.cmp(&b.dealer_id))
    });

    let mut remaining = required;
    let mut plan = Vec::new();
    for stock in ordered {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(stock.quantity);
        plan.push(Reduction {
            dealer_id: stock.dealer_id,
            quantity: take,
        });
        remaining -= take;
    }
    Ok(plan)
}
