//! Price moves relative to the first observation of this session.

use crypto_analytics_core::AssetSnapshot;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Moves within this many percent either way count as flat.
pub const NEUTRAL_THRESHOLD_PCT: Decimal = dec!(0.001);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

/// One symbol's move since it was first observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionChange {
    pub symbol: String,
    pub first_price: Decimal,
    pub current_price: Decimal,
    /// `None` when the first observed price was zero.
    pub change_pct: Option<Decimal>,
    pub direction: Direction,
}

/// Remembers the first price seen per symbol.
#[derive(Debug, Default)]
pub struct SessionTracker {
    baseline: HashMap<String, Decimal>,
}

impl SessionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records first sightings and returns each snapshot's session change, in input order.
    pub fn observe(&mut self, snapshots: &[AssetSnapshot]) -> Vec<SessionChange> {
        snapshots
            .iter()
            .map(|snapshot| {
                let current = snapshot.current_price();
                let first = *self
                    .baseline
                    .entry(snapshot.symbol().to_string())
                    .or_insert(current);
                session_change(snapshot.symbol(), first, current)
            })
            .collect()
    }

    #[must_use]
    pub fn baseline(&self, symbol: &str) -> Option<Decimal> {
        self.baseline.get(&symbol.trim().to_uppercase()).copied()
    }

    #[must_use]
    pub fn tracked(&self) -> usize {
        self.baseline.len()
    }

    pub fn reset(&mut self) {
        self.baseline.clear();
    }
}

fn session_change(symbol: &str, first: Decimal, current: Decimal) -> SessionChange {
    let change_pct = if first.is_zero() {
        None
    } else {
        (current - first)
            .checked_div(first)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    };

    let direction = match change_pct {
        Some(pct) if pct > NEUTRAL_THRESHOLD_PCT => Direction::Up,
        Some(pct) if pct < -NEUTRAL_THRESHOLD_PCT => Direction::Down,
        _ => Direction::Neutral,
    };

    SessionChange {
        symbol: symbol.to_string(),
        first_price: first,
        current_price: current,
        change_pct,
        direction,
    }
}
