//! Account kinds and vesting schedule arithmetic.
//!
//! Only the three vesting variants expose a [`VestingSchedule`]; base and
//! module accounts have nothing locked.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::coin::{normalize_coins, saturating_sub_coins, Coin};

/// An on-chain account as returned by the auth module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub kind: AccountKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountKind {
    Base,
    Module { name: String },
    ContinuousVesting(ContinuousVestingAccount),
    DelayedVesting(DelayedVestingAccount),
    PeriodicVesting(PeriodicVestingAccount),
}

impl AccountKind {
    pub fn vesting_schedule(&self) -> Option<&dyn VestingSchedule> {
        match self {
            AccountKind::Base | AccountKind::Module { .. } => None,
            AccountKind::ContinuousVesting(account) => Some(account),
            AccountKind::DelayedVesting(account) => Some(account),
            AccountKind::PeriodicVesting(account) => Some(account),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AccountKind::Base => "base",
            AccountKind::Module { .. } => "module",
            AccountKind::ContinuousVesting(_) => "continuous_vesting",
            AccountKind::DelayedVesting(_) => "delayed_vesting",
            AccountKind::PeriodicVesting(_) => "periodic_vesting",
        }
    }
}

/// Fields common to every vesting account. Times are unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseVesting {
    pub original_vesting: Vec<Coin>,
    pub delegated_free: Vec<Coin>,
    pub delegated_vesting: Vec<Coin>,
    pub end_time: i64,
}

/// Locked and unlocked portions of the original vesting amount at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingPosition {
    pub vesting: Vec<Coin>,
    pub vested: Vec<Coin>,
}

pub trait VestingSchedule {
    fn base(&self) -> &BaseVesting;

    /// Coins unlocked by `at` (unix seconds).
    fn vested_coins(&self, at: i64) -> Vec<Coin>;

    /// Coins still locked at `at`.
    fn vesting_coins(&self, at: i64) -> Vec<Coin> {
        saturating_sub_coins(&self.base().original_vesting, &self.vested_coins(at))
    }

    fn position_at(&self, at: i64) -> VestingPosition {
        VestingPosition {
            vesting: self.vesting_coins(at),
            vested: self.vested_coins(at),
        }
    }
}

/// Unlocks linearly between `start_time` and `end_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousVestingAccount {
    pub base: BaseVesting,
    pub start_time: i64,
}

impl VestingSchedule for ContinuousVestingAccount {
    fn base(&self) -> &BaseVesting {
        &self.base
    }

    fn vested_coins(&self, at: i64) -> Vec<Coin> {
        if at <= self.start_time {
            return Vec::new();
        }
        if at >= self.base.end_time {
            return normalize_coins(&self.base.original_vesting);
        }

        let elapsed = (at - self.start_time) as u128;
        let duration = (self.base.end_time - self.start_time) as u128;
        normalize_coins(&self.base.original_vesting)
            .into_iter()
            .map(|coin| {
                let vested = mul_div_floor(coin.amount, elapsed, duration);
                Coin::new(coin.denom, vested)
            })
            .filter(|coin| !coin.is_zero())
            .collect()
    }
}

/// Unlocks everything at `end_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedVestingAccount {
    pub base: BaseVesting,
}

impl VestingSchedule for DelayedVestingAccount {
    fn base(&self) -> &BaseVesting {
        &self.base
    }

    fn vested_coins(&self, at: i64) -> Vec<Coin> {
        if at >= self.base.end_time {
            normalize_coins(&self.base.original_vesting)
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingPeriod {
    /// Period length in seconds.
    pub length: i64,
    pub amount: Vec<Coin>,
}

/// Unlocks each period's amount once the period has fully elapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicVestingAccount {
    pub base: BaseVesting,
    pub start_time: i64,
    pub periods: Vec<VestingPeriod>,
}

impl VestingSchedule for PeriodicVestingAccount {
    fn base(&self) -> &BaseVesting {
        &self.base
    }

    fn vested_coins(&self, at: i64) -> Vec<Coin> {
        if at <= self.start_time {
            return Vec::new();
        }
        if at >= self.base.end_time {
            return normalize_coins(&self.base.original_vesting);
        }

        let mut vested = Vec::new();
        let mut period_end = self.start_time;
        for period in &self.periods {
            period_end = period_end.saturating_add(period.length);
            if at < period_end {
                break;
            }
            vested.extend(period.amount.iter().cloned());
        }
        normalize_coins(&vested)
    }
}

fn mul_div_floor(amount: u128, numerator: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return amount;
    }
    let product = BigUint::from(amount) * BigUint::from(numerator);
    (product / BigUint::from(denominator))
        .to_u128()
        .unwrap_or(u128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(amount: u128, end_time: i64) -> BaseVesting {
        BaseVesting {
            original_vesting: vec![Coin::new("uatom", amount)],
            delegated_free: Vec::new(),
            delegated_vesting: Vec::new(),
            end_time,
        }
    }

    #[test]
    fn continuous_vesting_is_linear() {
        let account = ContinuousVestingAccount {
            base: base(1_000, 2_000),
            start_time: 1_000,
        };

        assert!(account.vested_coins(500).is_empty());
        assert_eq!(account.vested_coins(1_250), vec![Coin::new("uatom", 250)]);
        assert_eq!(account.vesting_coins(1_250), vec![Coin::new("uatom", 750)]);
        assert_eq!(account.vested_coins(2_500), vec![Coin::new("uatom", 1_000)]);
        assert!(account.vesting_coins(2_500).is_empty());
    }

    #[test]
    fn continuous_vesting_rounds_vested_down() {
        let account = ContinuousVestingAccount {
            base: base(10, 1_003),
            start_time: 1_000,
        };
        let position = account.position_at(1_001);
        assert_eq!(position.vested, vec![Coin::new("uatom", 3)]);
        assert_eq!(position.vesting, vec![Coin::new("uatom", 7)]);
    }

    #[test]
    fn delayed_vesting_unlocks_at_end() {
        let account = DelayedVestingAccount {
            base: base(500, 3_000),
        };
        assert_eq!(account.vesting_coins(2_999), vec![Coin::new("uatom", 500)]);
        assert_eq!(account.vested_coins(3_000), vec![Coin::new("uatom", 500)]);
    }

    #[test]
    fn periodic_vesting_unlocks_completed_periods() {
        let account = PeriodicVestingAccount {
            base: base(300, 1_300),
            start_time: 1_000,
            periods: vec![
                VestingPeriod {
                    length: 100,
                    amount: vec![Coin::new("uatom", 100)],
                },
                VestingPeriod {
                    length: 100,
                    amount: vec![Coin::new("uatom", 100)],
                },
                VestingPeriod {
                    length: 100,
                    amount: vec![Coin::new("uatom", 100)],
                },
            ],
        };

        assert!(account.vested_coins(1_099).is_empty());
        assert_eq!(account.vested_coins(1_100), vec![Coin::new("uatom", 100)]);
        assert_eq!(account.vested_coins(1_250), vec![Coin::new("uatom", 200)]);
        assert_eq!(account.vesting_coins(1_250), vec![Coin::new("uatom", 100)]);
        assert_eq!(account.vested_coins(1_300), vec![Coin::new("uatom", 300)]);
    }

    #[test]
    fn only_vesting_variants_expose_a_schedule() {
        assert!(AccountKind::Base.vesting_schedule().is_none());
        assert!(AccountKind::Module {
            name: "distribution".to_string()
        }
        .vesting_schedule()
        .is_none());
        let delayed = AccountKind::DelayedVesting(DelayedVestingAccount {
            base: base(1, 10),
        });
        assert!(delayed.vesting_schedule().is_some());
        assert_eq!(delayed.type_name(), "delayed_vesting");
    }
}
