//! Trade matching: the fast surplus estimator and the exact
//! compensating-block search.
//!
//! The estimator only ranks partners during search. Execution always goes
//! through [`propose_trade`], which evaluates exact utility changes at
//! integer quantities and returns the first block and price at which both
//! sides strictly gain.

use std::collections::BTreeSet;

use agora_agents::Agent;
use agora_types::{AgentId, ExchangeRegime, InventoryDelta, PairType, QuoteSet};

use crate::config::ScenarioParams;

/// A mutually improving trade found by the block search.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeProposal {
    /// Agent receiving the sold good.
    pub buyer: AgentId,
    /// Agent handing over the sold good.
    pub seller: AgentId,
    /// Exchange pair.
    pub pair_type: PairType,
    /// Units of the sold good.
    pub quantity: u32,
    /// Units of the numeraire paid.
    pub payment: u32,
    /// Effective unit price.
    pub price: f64,
    /// Signed change to the buyer's inventory.
    pub buyer_delta: InventoryDelta,
    /// Signed change to the seller's inventory.
    pub seller_delta: InventoryDelta,
    /// Buyer's utility gain.
    pub buyer_surplus: f64,
    /// Seller's utility gain.
    pub seller_surplus: f64,
}

impl TradeProposal {
    /// Combined utility gain of both sides.
    pub const fn total_surplus(&self) -> f64 {
        self.buyer_surplus + self.seller_surplus
    }
}

// ---------------------------------------------------------------------------
// Fast estimator
// ---------------------------------------------------------------------------

/// Best positive quote overlap between two agents for one pair type,
/// trying both directions. `None` when neither direction overlaps.
pub fn estimate_surplus(own: &QuoteSet, other: &QuoteSet, pair: PairType) -> Option<f64> {
    let selling = other.bid(pair).zip(own.ask(pair)).map(|(bid, ask)| bid - ask);
    let buying = own.bid(pair).zip(other.ask(pair)).map(|(bid, ask)| bid - ask);
    [selling, buying]
        .into_iter()
        .flatten()
        .filter(|overlap| *overlap > 0.0)
        .max_by(f64::total_cmp)
}

/// Best estimate across the permitted pair types; ties go to the lower
/// pair priority.
pub fn best_estimate(
    own: &QuoteSet,
    other: &QuoteSet,
    regime: ExchangeRegime,
) -> Option<(PairType, f64)> {
    let mut best: Option<(PairType, f64)> = None;
    for pair in regime.permitted_pairs() {
        let Some(surplus) = estimate_surplus(own, other, pair) else {
            continue;
        };
        if best.is_none_or(|(_, current)| surplus > current) {
            best = Some((pair, surplus));
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Compensating-block search
// ---------------------------------------------------------------------------

/// Saturating float-to-integer conversion for prices and payments.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Utility change from applying `delta`, or `None` if infeasible.
///
/// Goods are valued at true integer quantities; money enters linearly as
/// `lambda * dM / money_scale`.
#[allow(clippy::cast_precision_loss)]
fn utility_change(agent: &Agent, delta: &InventoryDelta, money_scale: f64) -> Option<f64> {
    let after = agent.inventory.apply(delta)?;
    let utility = agent.utility();
    let before_goods =
        utility.utility_of_goods(f64::from(agent.inventory.a), f64::from(agent.inventory.b));
    let after_goods = utility.utility_of_goods(f64::from(after.a), f64::from(after.b));
    let money = if delta.m == 0 {
        0.0
    } else {
        agent.lambda_money * delta.m as f64 / money_scale
    };
    let change = after_goods - before_goods + money;
    change.is_finite().then_some(change)
}

/// Candidate payments for a block of `quantity` units, ascending.
///
/// Prices span `[lo, hi]` clipped to payments the buyer can afford:
/// every price with an integer payment (subsampled to
/// `max_integer_prices`) plus `price_samples` evenly spaced prices, each
/// rounded to `floor(price * q + 0.5)` and de-duplicated.
fn candidate_payments(
    lo: f64,
    hi: f64,
    quantity: u32,
    budget: u32,
    params: &ScenarioParams,
) -> BTreeSet<u32> {
    let mut payments = BTreeSet::new();
    if budget == 0 {
        return payments;
    }
    let q = f64::from(quantity);
    let budget_f = f64::from(budget);

    let k_lo = (lo * q).ceil().max(1.0);
    let k_hi = (hi * q).floor().min(budget_f);
    if k_lo <= k_hi {
        let first = to_u32(k_lo);
        let last = to_u32(k_hi);
        let count = last.saturating_sub(first).saturating_add(1);
        let cap = params.max_integer_prices.max(1);
        if count <= cap {
            payments.extend(first..=last);
        } else if cap == 1 {
            payments.insert(first);
        } else {
            let span = f64::from(last.saturating_sub(first));
            let steps = f64::from(cap.saturating_sub(1));
            for i in 0..cap {
                let offset = to_u32((span * f64::from(i) / steps).round());
                payments.insert(first.saturating_add(offset));
            }
        }
    }

    let p_lo = lo.max(0.5 / q);
    let p_hi = hi.min(budget_f / q);
    if p_lo <= p_hi {
        let samples = params.price_samples.max(1);
        for i in 0..samples {
            let price = if samples == 1 {
                p_lo
            } else {
                (p_hi - p_lo).mul_add(f64::from(i) / f64::from(samples.saturating_sub(1)), p_lo)
            };
            let payment = to_u32(price.mul_add(q, 0.5).floor());
            if (1..=budget).contains(&payment) {
                payments.insert(payment);
            }
        }
    }
    payments
}

/// Search one direction: `seller` hands over the pair's sold good, `buyer`
/// pays in its numeraire.
///
/// Blocks run `1..=d_a_max` (stopping once the seller cannot deliver) and,
/// within a block, prices run ascending. The first combination where both
/// gains exceed `epsilon` wins.
pub fn find_compensating_block(
    seller: &Agent,
    buyer: &Agent,
    pair: PairType,
    params: &ScenarioParams,
) -> Option<TradeProposal> {
    let lo = seller.quotes.ask(pair)?;
    let hi = buyer.quotes.bid(pair)?;
    if hi < lo {
        return None;
    }
    let sold = pair.sold();
    let numeraire = pair.numeraire();
    let budget = buyer.inventory.get(numeraire);

    for quantity in 1..=params.d_a_max {
        if seller.inventory.get(sold) < quantity {
            break;
        }
        for payment in candidate_payments(lo, hi, quantity, budget, params) {
            let give = InventoryDelta::single(sold, i64::from(quantity).saturating_neg());
            let take = InventoryDelta::single(numeraire, i64::from(payment));
            let Some(seller_delta) = give.checked_add(&take) else {
                continue;
            };
            let Some(buyer_delta) = seller_delta.checked_neg() else {
                continue;
            };
            let Some(seller_surplus) = utility_change(seller, &seller_delta, params.money_scale)
            else {
                continue;
            };
            let Some(buyer_surplus) = utility_change(buyer, &buyer_delta, params.money_scale) else {
                continue;
            };
            if seller_surplus > params.epsilon && buyer_surplus > params.epsilon {
                return Some(TradeProposal {
                    buyer: buyer.id,
                    seller: seller.id,
                    pair_type: pair,
                    quantity,
                    payment,
                    price: f64::from(payment) / f64::from(quantity),
                    buyer_delta,
                    seller_delta,
                    buyer_surplus,
                    seller_surplus,
                });
            }
        }
    }
    None
}

/// Search both directions of one pair type, larger quote overlap first.
pub fn propose_for_pair(
    first: &Agent,
    second: &Agent,
    pair: PairType,
    params: &ScenarioParams,
) -> Option<TradeProposal> {
    let mut directions: Vec<(f64, &Agent, &Agent)> = [(first, second), (second, first)]
        .into_iter()
        .filter_map(|(seller, buyer)| {
            let overlap = buyer.quotes.bid(pair)? - seller.quotes.ask(pair)?;
            (overlap >= 0.0).then_some((overlap, seller, buyer))
        })
        .collect();
    directions.sort_by(|x, y| y.0.total_cmp(&x.0).then_with(|| x.1.id.cmp(&y.1.id)));
    directions
        .into_iter()
        .find_map(|(_, seller, buyer)| find_compensating_block(seller, buyer, pair, params))
}

/// Best mutually improving trade between two agents across every permitted
/// pair type: highest total surplus, then lowest pair priority.
///
/// `None` means no mutually improving block exists at any sampled price.
pub fn propose_trade(
    first: &Agent,
    second: &Agent,
    params: &ScenarioParams,
) -> Option<TradeProposal> {
    params
        .exchange_regime
        .permitted_pairs()
        .into_iter()
        .filter_map(|pair| propose_for_pair(first, second, pair, params))
        .min_by(|x, y| {
            y.total_surplus()
                .total_cmp(&x.total_surplus())
                .then_with(|| x.pair_type.priority().cmp(&y.pair_type.priority()))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_agents::{Ces, Linear, UtilityForm};
    use agora_types::{Inventory, Position, QuoteKey};

    use super::*;

    fn agent(
        id: u32,
        inventory: Inventory,
        utility: UtilityForm,
        params: &ScenarioParams,
    ) -> Agent {
        let mut agent = Agent::new(AgentId::new(id), Position::new(0, 0), inventory, utility, 1.0);
        agent.refresh_quotes(params.exchange_regime, &params.quote_params());
        agent
    }

    fn complementary() -> UtilityForm {
        UtilityForm::Ces(Ces { rho: -1.0, w_a: 0.5, w_b: 0.5 })
    }

    #[test]
    fn estimator_takes_best_positive_direction() {
        let mut own = QuoteSet::new();
        own.insert(QuoteKey::ask(PairType::AForB), 1.0);
        own.insert(QuoteKey::bid(PairType::AForB), 0.5);
        let mut other = QuoteSet::new();
        other.insert(QuoteKey::ask(PairType::AForB), 3.0);
        other.insert(QuoteKey::bid(PairType::AForB), 2.5);
        let surplus = estimate_surplus(&own, &other, PairType::AForB).unwrap();
        assert!((surplus - 1.5).abs() < 1e-12);
        assert!(estimate_surplus(&own, &own, PairType::AForB).is_none());
        assert!(estimate_surplus(&own, &other, PairType::AForMoney).is_none());
    }

    #[test]
    fn complementary_endowments_trade() {
        let params = ScenarioParams::default();
        let rich_a = agent(0, Inventory::new(10, 0, 0), complementary(), &params);
        let rich_b = agent(1, Inventory::new(0, 10, 0), complementary(), &params);
        let proposal = propose_trade(&rich_a, &rich_b, &params).unwrap();
        assert_eq!(proposal.seller, AgentId::new(0));
        assert_eq!(proposal.buyer, AgentId::new(1));
        assert_eq!(proposal.pair_type, PairType::AForB);
        assert!(proposal.seller_surplus > params.epsilon);
        assert!(proposal.buyer_surplus > params.epsilon);
        assert!(proposal.seller_delta.checked_add(&proposal.buyer_delta).unwrap().is_zero());
        assert_eq!(proposal.quantity, 1);
        assert_eq!(proposal.payment, 1);
    }

    #[test]
    fn identical_agents_find_nothing() {
        let params = ScenarioParams::default();
        let u = UtilityForm::cobb_douglas(0.5, 0.5);
        let a = agent(0, Inventory::new(5, 5, 0), u, &params);
        let b = agent(1, Inventory::new(5, 5, 0), u, &params);
        assert!(propose_trade(&a, &b, &params).is_none());
    }

    #[test]
    fn buyer_without_numeraire_cannot_pay() {
        let params = ScenarioParams::default();
        let a = agent(0, Inventory::new(10, 0, 0), complementary(), &params);
        let b = agent(1, Inventory::new(0, 0, 0), complementary(), &params);
        assert!(propose_trade(&a, &b, &params).is_none());
    }

    #[test]
    fn money_trade_between_linear_agents() {
        let params = ScenarioParams {
            exchange_regime: ExchangeRegime::MoneyOnly,
            ..ScenarioParams::default()
        };
        let seller = agent(0, Inventory::new(5, 0, 0), linear(1.0, 1.0), &params);
        let buyer = agent(1, Inventory::new(0, 0, 20), linear(4.0, 1.0), &params);
        let proposal = propose_trade(&seller, &buyer, &params).unwrap();
        assert_eq!(proposal.pair_type, PairType::AForMoney);
        assert_eq!(proposal.seller, AgentId::new(0));
        // Seller values A at 1, buyer at 4: the first strictly improving
        // payment for one unit is 2.
        assert_eq!(proposal.quantity, 1);
        assert_eq!(proposal.payment, 2);
        assert_eq!(proposal.buyer_delta.m, -2);
    }

    fn linear(v_a: f64, v_b: f64) -> UtilityForm {
        UtilityForm::Linear(Linear { v_a, v_b })
    }

    fn mixed() -> ScenarioParams {
        ScenarioParams {
            exchange_regime: ExchangeRegime::Mixed,
            ..ScenarioParams::default()
        }
    }

    #[test]
    fn equal_surplus_prefers_money_pair() {
        // Money and B are worth 1 to both sides, so paying 2 units of
        // either for one A yields the same gains: +1 each.
        let params = mixed();
        let seller = agent(0, Inventory::new(5, 5, 5), linear(1.0, 1.0), &params);
        let buyer = agent(1, Inventory::new(5, 5, 5), linear(3.0, 1.0), &params);
        let barter = propose_for_pair(&seller, &buyer, PairType::AForB, &params).unwrap();
        let money = propose_for_pair(&seller, &buyer, PairType::AForMoney, &params).unwrap();
        assert!((barter.total_surplus() - money.total_surplus()).abs() < 1e-12);

        let chosen = propose_trade(&seller, &buyer, &params).unwrap();
        assert_eq!(chosen.pair_type, PairType::AForMoney);
        assert_eq!(chosen.payment, 2);
        assert_eq!(chosen.seller, AgentId::new(0));
    }

    #[test]
    fn larger_total_surplus_wins_across_pairs() {
        // The buyer values B at half a unit of money, so paying in B is
        // cheaper for it than paying in money.
        let params = mixed();
        let seller = agent(0, Inventory::new(5, 5, 5), linear(1.0, 1.0), &params);
        let buyer = agent(1, Inventory::new(5, 5, 5), linear(3.0, 0.5), &params);
        let money = propose_for_pair(&seller, &buyer, PairType::AForMoney, &params).unwrap();
        let chosen = propose_trade(&seller, &buyer, &params).unwrap();
        assert_eq!(chosen.pair_type, PairType::AForB);
        assert!(chosen.total_surplus() > money.total_surplus());
        assert!((chosen.total_surplus() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn equal_estimates_keep_the_money_pair() {
        let mut own = QuoteSet::new();
        let mut other = QuoteSet::new();
        for pair in [PairType::AForB, PairType::AForMoney] {
            own.insert(QuoteKey::ask(pair), 1.0);
            other.insert(QuoteKey::bid(pair), 2.0);
        }
        let (pair, surplus) = best_estimate(&own, &other, ExchangeRegime::Mixed).unwrap();
        assert_eq!(pair, PairType::AForMoney);
        assert!((surplus - 1.0).abs() < 1e-12);

        // A strictly larger barter overlap still wins.
        other.insert(QuoteKey::bid(PairType::AForB), 2.5);
        let (pair, _) = best_estimate(&own, &other, ExchangeRegime::Mixed).unwrap();
        assert_eq!(pair, PairType::AForB);
    }

    #[test]
    fn candidate_payments_respect_cap_and_budget() {
        let params = ScenarioParams {
            max_integer_prices: 4,
            price_samples: 3,
            ..ScenarioParams::default()
        };
        let payments = candidate_payments(0.0, 1e9, 1, 100, &params);
        assert!(payments.iter().all(|p| (1..=100).contains(p)));
        assert!(payments.contains(&1));
        assert!(payments.contains(&100));
        assert!(payments.len() <= 7);
        assert!(candidate_payments(0.0, 5.0, 2, 0, &params).is_empty());
    }

    #[test]
    fn inverted_interval_yields_nothing() {
        let params = ScenarioParams::default();
        let u = UtilityForm::cobb_douglas(0.5, 0.5);
        let mut seller = agent(0, Inventory::new(5, 5, 0), u, &params);
        let buyer = seller.clone();
        seller.quotes.insert(QuoteKey::ask(PairType::AForB), 10.0);
        assert!(find_compensating_block(&seller, &buyer, PairType::AForB, &params).is_none());
    }
}
