//! Money arithmetic for checkout and subscriptions.
//!
//! Everything here is pure so the rules can be tested without a database.
//! Amounts are rounded to cents with banker's rounding.

use crate::entities::coupon::{self, CouponKind};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

const CENTS: u32 = 2;

fn cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointNearestEven)
}

/// Sum of the sell prices of the purchasable lines.
pub fn cart_total<I>(sell_prices: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    cents(sell_prices.into_iter().sum())
}

/// Discount a coupon grants on `total`, never more than the total itself.
pub fn discount_for(coupon: &coupon::Model, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let raw = match coupon.kind {
        CouponKind::Fixed => coupon.value,
        CouponKind::Percent => total * coupon.value.min(dec!(100)) / dec!(100),
    };

    cents(raw.max(Decimal::ZERO).min(total))
}

/// Splits `final_amount` across lines in proportion to their prices.
///
/// Each share is floored to cents and the leftover cents go to the lines
/// with the largest fractional parts, earlier lines first on ties. The
/// parts add up to `final_amount` and none is negative.
pub fn allocate_discount(prices: &[Decimal], total: Decimal, final_amount: Decimal) -> Vec<Decimal> {
    if total <= Decimal::ZERO || final_amount <= Decimal::ZERO {
        return vec![Decimal::ZERO; prices.len()];
    }

    let exact: Vec<Decimal> = prices
        .iter()
        .map(|price| (*price).max(Decimal::ZERO) * final_amount / total)
        .collect();
    let mut shares: Vec<Decimal> = exact
        .iter()
        .map(|share| share.round_dp_with_strategy(CENTS, RoundingStrategy::ToZero))
        .collect();

    let cent = Decimal::new(1, CENTS);
    let mut leftover = cents(final_amount) - shares.iter().copied().sum::<Decimal>();
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| (exact[b] - shares[b]).cmp(&(exact[a] - shares[a])).then(a.cmp(&b)));
    for index in order {
        if leftover < cent {
            break;
        }
        shares[index] += cent;
        leftover -= cent;
    }
    shares
}

/// Author's cut of a net sale amount. Never negative.
pub fn royalty_share(net_amount: Decimal, percent: Decimal) -> Decimal {
    cents(net_amount * percent / dec!(100)).max(Decimal::ZERO)
}
