//! Integer coin amounts.
//!
//! Chain JSON carries amounts as decimal strings; they are held as `u128`
//! base units here, which covers 18-decimal denominations with room to spare.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An integer amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

impl Coin {
    pub fn new<S: Into<String>>(denom: S, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero<S: Into<String>>(denom: S) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Sum of every entry of `denom` in `coins`.
pub fn amount_of(coins: &[Coin], denom: &str) -> u128 {
    coins
        .iter()
        .filter(|coin| coin.denom == denom)
        .fold(0u128, |acc, coin| acc.saturating_add(coin.amount))
}

/// Merge duplicate denominations, dropping zero entries. Output is sorted by denom.
pub fn normalize_coins(coins: &[Coin]) -> Vec<Coin> {
    let mut merged: BTreeMap<&str, u128> = BTreeMap::new();
    for coin in coins {
        let entry = merged.entry(coin.denom.as_str()).or_insert(0);
        *entry = entry.saturating_add(coin.amount);
    }
    merged
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(denom, amount)| Coin::new(denom, amount))
        .collect()
}

/// Per-denom `max(0, a - b)` over the denominations present in `a`.
pub fn saturating_sub_coins(a: &[Coin], b: &[Coin]) -> Vec<Coin> {
    normalize_coins(a)
        .into_iter()
        .map(|coin| {
            let sub = amount_of(b, &coin.denom);
            Coin::new(coin.denom, coin.amount.saturating_sub(sub))
        })
        .filter(|coin| !coin.is_zero())
        .collect()
}

/// Serde adapter for amounts encoded as decimal strings (numbers are accepted too).
pub mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(text) => text
                .trim()
                .parse::<u128>()
                .map_err(|_| de::Error::custom(format!("invalid integer amount: {text}"))),
            RawAmount::Number(value) => Ok(value as u128),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_of_sums_duplicate_denoms() {
        let coins = vec![
            Coin::new("uatom", 10),
            Coin::new("uosmo", 3),
            Coin::new("uatom", 5),
        ];
        assert_eq!(amount_of(&coins, "uatom"), 15);
        assert_eq!(amount_of(&coins, "ujuno"), 0);
    }

    #[test]
    fn saturating_sub_clamps_at_zero() {
        let vesting = vec![Coin::new("uatom", 100), Coin::new("uosmo", 10)];
        let delegated = vec![Coin::new("uatom", 40), Coin::new("uosmo", 25)];
        let result = saturating_sub_coins(&vesting, &delegated);
        assert_eq!(result, vec![Coin::new("uatom", 60)]);
    }

    #[test]
    fn amounts_serialize_as_strings() {
        let coin = Coin::new("uatom", 1_000_000_000_000_000_000_000);
        let json = serde_json::to_string(&coin).unwrap();
        assert_eq!(json, r#"{"denom":"uatom","amount":"1000000000000000000000"}"#);

        let parsed: Coin = serde_json::from_str(r#"{"denom":"uatom","amount":42}"#).unwrap();
        assert_eq!(parsed.amount, 42);
        assert!(serde_json::from_str::<Coin>(r#"{"denom":"uatom","amount":"1.5"}"#).is_err());
    }
}
