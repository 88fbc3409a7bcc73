//! Enumeration types for the Agora simulation.
//!
//! Goods, exchange pair types, exchange regimes, quote sides, tick modes,
//! and the reasons attached to pairing events.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Goods
// ---------------------------------------------------------------------------

/// A holdable quantity in an agent's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Good {
    /// Good A.
    A,
    /// Good B.
    B,
    /// Money, the medium of exchange.
    Money,
}

impl Good {
    /// Short label used in quote keys (`A`, `B`, `M`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Money => "M",
        }
    }
}

// ---------------------------------------------------------------------------
// Exchange pairs
// ---------------------------------------------------------------------------

/// An ordered exchange pair: the sold good and the good it is paid in.
///
/// The derived `Ord` follows the liquidity priority: money-denominated
/// pairs rank ahead of direct barter when everything else ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairType {
    /// Good A sold for money.
    AForMoney,
    /// Good B sold for money.
    BForMoney,
    /// Good A sold for good B.
    AForB,
}

impl PairType {
    /// Every pair type, in priority order.
    pub const ALL: [Self; 3] = [Self::AForMoney, Self::BForMoney, Self::AForB];

    /// Tie-break priority: lower wins.
    pub const fn priority(self) -> u8 {
        match self {
            Self::AForMoney => 0,
            Self::BForMoney => 1,
            Self::AForB => 2,
        }
    }

    /// The good handed over by the seller.
    pub const fn sold(self) -> Good {
        match self {
            Self::AForMoney | Self::AForB => Good::A,
            Self::BForMoney => Good::B,
        }
    }

    /// The good the buyer pays with.
    pub const fn numeraire(self) -> Good {
        match self {
            Self::AForMoney | Self::BForMoney => Good::Money,
            Self::AForB => Good::B,
        }
    }

    /// Whether money changes hands in this pair.
    pub const fn involves_money(self) -> bool {
        matches!(self.numeraire(), Good::Money)
    }
}

impl core::fmt::Display for PairType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}<->{}", self.sold().label(), self.numeraire().label())
    }
}

/// Which exchange pairs are currently permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeRegime {
    /// Goods-for-goods only.
    #[default]
    BarterOnly,
    /// Goods-for-money only.
    MoneyOnly,
    /// All pairs.
    Mixed,
}

impl ExchangeRegime {
    /// The permitted pair types, in priority order.
    pub fn permitted_pairs(self) -> Vec<PairType> {
        PairType::ALL
            .into_iter()
            .filter(|pair| self.permits(*pair))
            .collect()
    }

    /// Whether the regime permits the given pair type.
    pub const fn permits(self, pair: PairType) -> bool {
        match self {
            Self::BarterOnly => matches!(pair, PairType::AForB),
            Self::MoneyOnly => pair.involves_money(),
            Self::Mixed => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Side of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSide {
    /// Minimum unit price the agent accepts as seller.
    Ask,
    /// Maximum unit price the agent pays as buyer.
    Bid,
}

// ---------------------------------------------------------------------------
// Tick modes
// ---------------------------------------------------------------------------

/// Activities permitted during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickMode {
    /// Foraging only; no partner search or trade.
    Forage,
    /// Trading only; no resource targets.
    Trade,
    /// Both foraging and trading.
    #[default]
    Both,
}

impl TickMode {
    /// Whether partner search, pairing and trade run.
    pub const fn allows_trade(self) -> bool {
        matches!(self, Self::Trade | Self::Both)
    }

    /// Whether resource targeting and foraging run.
    pub const fn allows_forage(self) -> bool {
        matches!(self, Self::Forage | Self::Both)
    }
}

// ---------------------------------------------------------------------------
// Pairing reasons
// ---------------------------------------------------------------------------

/// Why a pair was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingReason {
    /// Both agents ranked each other first.
    MutualConsent,
    /// Committed by the global greedy pass.
    GreedyFallback,
}

/// Why a pair was dissolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpairReason {
    /// The compensating-block search found no mutually improving trade.
    TradeFailed,
    /// The tick mode no longer permits trading.
    ModeChange,
    /// The integrity check found an asymmetric or dangling pairing.
    IntegrityRepair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_pairs_rank_ahead_of_barter() {
        assert!(PairType::AForMoney < PairType::AForB);
        assert!(PairType::BForMoney < PairType::AForB);
        assert!(PairType::AForMoney.priority() < PairType::BForMoney.priority());
    }

    #[test]
    fn regime_filters_pairs() {
        assert_eq!(ExchangeRegime::BarterOnly.permitted_pairs(), vec![PairType::AForB]);
        assert_eq!(
            ExchangeRegime::MoneyOnly.permitted_pairs(),
            vec![PairType::AForMoney, PairType::BForMoney]
        );
        assert_eq!(ExchangeRegime::Mixed.permitted_pairs().len(), 3);
    }

    #[test]
    fn pair_type_goods() {
        assert_eq!(PairType::AForB.sold(), Good::A);
        assert_eq!(PairType::AForB.numeraire(), Good::B);
        assert_eq!(PairType::BForMoney.sold(), Good::B);
        assert!(PairType::BForMoney.involves_money());
        assert!(!PairType::AForB.involves_money());
        assert_eq!(PairType::AForMoney.to_string(), "A<->M");
    }

    #[test]
    fn tick_mode_gates() {
        assert!(TickMode::Both.allows_trade() && TickMode::Both.allows_forage());
        assert!(!TickMode::Forage.allows_trade());
        assert!(!TickMode::Trade.allows_forage());
    }

    #[test]
    fn regime_parses_snake_case() {
        let regime: Result<ExchangeRegime, _> = serde_json::from_str("\"money_only\"");
        assert_eq!(regime.ok(), Some(ExchangeRegime::MoneyOnly));
    }
}
