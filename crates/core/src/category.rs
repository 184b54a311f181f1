//! Static asset classification.
//!
//! Membership sets are checked in a fixed priority order and the first match
//! wins: Layer 1, Stablecoin, DeFi, Meme, NFT/Gaming, then Unknown.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const LAYER1: &[&str] = &["BTC", "ETH", "BNB", "SOL", "ADA", "AVAX"];
const STABLECOIN: &[&str] = &["USDT", "USDC", "FDUSD", "DAI"];
const DEFI: &[&str] = &["UNI", "AAVE", "CAKE"];
const MEME: &[&str] = &["DOGE", "SHIB", "PEPE"];
const NFT_GAMING: &[&str] = &["AXS", "MANA", "SAND"];

/// Sector an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Layer 1")]
    Layer1,
    #[serde(rename = "Layer 2")]
    Layer2,
    #[serde(rename = "DeFi")]
    DeFi,
    #[serde(rename = "NFT/Gaming")]
    NftGaming,
    Meme,
    Stablecoin,
    Unknown,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 7] = [
        Category::Layer1,
        Category::Layer2,
        Category::DeFi,
        Category::NftGaming,
        Category::Meme,
        Category::Stablecoin,
        Category::Unknown,
    ];

    /// Human-readable label, also used as the storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Layer1 => "Layer 1",
            Category::Layer2 => "Layer 2",
            Category::DeFi => "DeFi",
            Category::NftGaming => "NFT/Gaming",
            Category::Meme => "Meme",
            Category::Stablecoin => "Stablecoin",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Invalid category: '{}'", s))
    }
}

/// Classifies a ticker symbol into its category.
///
/// Pure and total: the input is trimmed and compared case-insensitively, and
/// anything outside the static sets is [`Category::Unknown`].
#[must_use]
pub fn classify(symbol: &str) -> Category {
    let symbol = symbol.trim().to_uppercase();
    let symbol = symbol.as_str();

    // Priority order matters only for overlapping sets.
    let ordered: [(&[&str], Category); 5] = [
        (LAYER1, Category::Layer1),
        (STABLECOIN, Category::Stablecoin),
        (DEFI, Category::DeFi),
        (MEME, Category::Meme),
        (NFT_GAMING, Category::NftGaming),
    ];

    ordered
        .iter()
        .find(|(members, _)| members.contains(&symbol))
        .map_or(Category::Unknown, |(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_sets() {
        assert_eq!(classify("BTC"), Category::Layer1);
        assert_eq!(classify("AVAX"), Category::Layer1);
        assert_eq!(classify("USDC"), Category::Stablecoin);
        assert_eq!(classify("AAVE"), Category::DeFi);
        assert_eq!(classify("PEPE"), Category::Meme);
        assert_eq!(classify("SAND"), Category::NftGaming);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("XRP"), Category::Unknown);
        assert_eq!(classify(""), Category::Unknown);
        assert_eq!(classify("BTCUSDT"), Category::Unknown);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify("doge"), Category::Meme);
        assert_eq!(classify(" eth "), Category::Layer1);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for symbol in ["BTC", "USDT", "UNI", "SHIB", "MANA", "LINK"] {
            assert_eq!(classify(symbol), classify(symbol));
        }
    }

    #[test]
    fn test_sets_do_not_overlap() {
        // Priority only decides overlaps; none exist today, so every member
        // must classify to its own set.
        for s in LAYER1 {
            assert_eq!(classify(s), Category::Layer1);
        }
        for s in STABLECOIN {
            assert_eq!(classify(s), Category::Stablecoin);
        }
        for s in DEFI {
            assert_eq!(classify(s), Category::DeFi);
        }
        for s in MEME {
            assert_eq!(classify(s), Category::Meme);
        }
        for s in NFT_GAMING {
            assert_eq!(classify(s), Category::NftGaming);
        }
    }

    #[test]
    fn test_category_label_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()).unwrap(), category);
        }
    }

    #[test]
    fn test_category_from_str_invalid() {
        let result = Category::from_str("Layer 3");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid category"));
    }

    #[test]
    fn test_category_serde_uses_label() {
        let json = serde_json::to_string(&Category::NftGaming).unwrap();
        assert_eq!(json, "\"NFT/Gaming\"");
    }
}
