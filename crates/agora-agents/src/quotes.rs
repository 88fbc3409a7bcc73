//! Quote generation from reservation prices.
//!
//! An agent's reservation price for a pair is the unit price (in the pair's
//! numeraire) at which it is indifferent to a marginal exchange. Asks and
//! bids are spread symmetrically around it.

use agora_types::{ExchangeRegime, Inventory, PairType, QuoteKey, QuoteSet};

use crate::utility::Utility;

/// Scenario parameters that shape quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteParams {
    /// Relative half-width between ask and bid.
    pub spread: f64,
    /// Floor for zero quantities and vanishing denominators.
    pub epsilon: f64,
    /// Conversion between money units and utility units.
    pub money_scale: f64,
}

/// Quantity as `f64`, floored at `epsilon` only when the holding is zero.
fn floored(quantity: u32, epsilon: f64) -> f64 {
    if quantity == 0 {
        epsilon
    } else {
        f64::from(quantity)
    }
}

/// Reservation price for one pair type.
///
/// Goods-for-goods pairs use the marginal rate of substitution
/// `MU_A / MU_B`; goods-for-money pairs use `MU_good / lambda`, scaled by
/// `money_scale`. Past satiation the price clamps to zero.
pub fn reservation_price(
    inventory: &Inventory,
    utility: &dyn Utility,
    lambda_money: f64,
    pair: PairType,
    params: &QuoteParams,
) -> f64 {
    let eps = params.epsilon;
    let a = floored(inventory.a, eps);
    let b = floored(inventory.b, eps);
    let price = match pair {
        PairType::AForB => {
            utility.marginal_utility_a(a, b) / utility.marginal_utility_b(a, b).max(eps)
        }
        PairType::AForMoney => {
            utility.marginal_utility_a(a, b) / lambda_money.max(eps) * params.money_scale
        }
        PairType::BForMoney => {
            utility.marginal_utility_b(a, b) / lambda_money.max(eps) * params.money_scale
        }
    };
    if price.is_nan() { 0.0 } else { price.max(0.0) }
}

/// Build the full quote set for every pair the regime permits.
pub fn generate_quotes(
    inventory: &Inventory,
    utility: &dyn Utility,
    lambda_money: f64,
    regime: ExchangeRegime,
    params: &QuoteParams,
) -> QuoteSet {
    let mut quotes = QuoteSet::new();
    for pair in regime.permitted_pairs() {
        let price = reservation_price(inventory, utility, lambda_money, pair, params);
        quotes.insert(QuoteKey::ask(pair), price * (1.0 + params.spread));
        quotes.insert(QuoteKey::bid(pair), price * (1.0 - params.spread));
    }
    quotes
}

/// Copy of `quotes` restricted to the pairs the regime permits.
pub fn filter_quotes(quotes: &QuoteSet, regime: ExchangeRegime) -> QuoteSet {
    let mut filtered = quotes.clone();
    filtered.retain_regime(regime);
    filtered
}
