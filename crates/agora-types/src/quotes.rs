//! Quote keys and quote sets.
//!
//! A quote is an agent's posted unit price for one side of one exchange
//! pair, expressed in units of the pair's numeraire. Keys render as
//! `ask_A_in_B`, `bid_B_in_M` and so on.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::enums::{ExchangeRegime, PairType, QuoteSide};

/// Identifies one quote: a side of an exchange pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuoteKey {
    /// Ask or bid.
    pub side: QuoteSide,
    /// The exchange pair quoted.
    pub pair: PairType,
}

impl QuoteKey {
    /// Ask key for a pair.
    pub const fn ask(pair: PairType) -> Self {
        Self {
            side: QuoteSide::Ask,
            pair,
        }
    }

    /// Bid key for a pair.
    pub const fn bid(pair: PairType) -> Self {
        Self {
            side: QuoteSide::Bid,
            pair,
        }
    }
}

impl core::fmt::Display for QuoteKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let side = match self.side {
            QuoteSide::Ask => "ask",
            QuoteSide::Bid => "bid",
        };
        write!(
            f,
            "{side}_{}_in_{}",
            self.pair.sold().label(),
            self.pair.numeraire().label()
        )
    }
}

/// Error returned when a quote key string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quote key: {0}")]
pub struct ParseQuoteKeyError(pub String);

impl FromStr for QuoteKey {
    type Err = ParseQuoteKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, rest) = s
            .split_once('_')
            .ok_or_else(|| ParseQuoteKeyError(s.to_owned()))?;
        let side = match side {
            "ask" => QuoteSide::Ask,
            "bid" => QuoteSide::Bid,
            _ => return Err(ParseQuoteKeyError(s.to_owned())),
        };
        let pair = match rest {
            "A_in_M" => PairType::AForMoney,
            "B_in_M" => PairType::BForMoney,
            "A_in_B" => PairType::AForB,
            _ => return Err(ParseQuoteKeyError(s.to_owned())),
        };
        Ok(Self { side, pair })
    }
}

impl Serialize for QuoteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuoteKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An agent's posted quotes, keyed in deterministic order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteSet(pub BTreeMap<QuoteKey, f64>);

impl QuoteSet {
    /// An empty quote set.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a quote.
    pub fn insert(&mut self, key: QuoteKey, price: f64) {
        self.0.insert(key, price);
    }

    /// Look up a quote.
    pub fn get(&self, key: QuoteKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    /// The ask for a pair, if quoted.
    pub fn ask(&self, pair: PairType) -> Option<f64> {
        self.get(QuoteKey::ask(pair))
    }

    /// The bid for a pair, if quoted.
    pub fn bid(&self, pair: PairType) -> Option<f64> {
        self.get(QuoteKey::bid(pair))
    }

    /// Drop quotes for pairs the regime does not permit.
    pub fn retain_regime(&mut self, regime: ExchangeRegime) {
        self.0.retain(|key, _| regime.permits(key.pair));
    }

    /// Number of quotes held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no quotes are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate quotes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuoteKey, &f64)> {
        self.0.iter()
    }
}
