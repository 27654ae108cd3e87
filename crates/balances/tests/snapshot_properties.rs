use cosmex_balances::{compute_snapshot, BalanceSources};
use cosmex_types::{
    AccountInfo, AccountKind, BaseVesting, Coin, ContinuousVestingAccount, Dec, DecCoin,
    Delegation, DelegatorRewards, UnbondingDelegation, UnbondingEntry,
};
use proptest::prelude::*;
use std::collections::HashMap;

const DENOM: &str = "uatom";
const MAX: u128 = 1_000_000_000_000;

fn dec_amount() -> impl Strategy<Value = Dec> {
    (0u64..1_000_000, 0u64..1_000_000_000_000_000_000)
        .prop_map(|(int, frac)| format!("{int}.{frac:018}").parse().unwrap())
}

fn sources() -> impl Strategy<Value = BalanceSources> {
    (
        prop::option::of(0..MAX),
        prop::collection::vec(0..MAX, 0..4),
        prop::collection::vec(0..MAX, 0..4),
        prop::collection::vec(dec_amount(), 0..4),
        prop::collection::vec(dec_amount(), 0..3),
    )
        .prop_map(|(bank, delegations, unbonding, rewards, commission)| BalanceSources {
            bank: bank.map(|a| vec![Coin::new(DENOM, a)]).unwrap_or_default(),
            delegations: delegations
                .into_iter()
                .map(|amount| Delegation {
                    delegator_address: "cosmos1holder".to_string(),
                    validator_address: "cosmosvaloper1v".to_string(),
                    shares: Dec::from_int(amount),
                    balance: Some(Coin::new(DENOM, amount)),
                })
                .collect(),
            unbonding: vec![UnbondingDelegation {
                delegator_address: "cosmos1holder".to_string(),
                validator_address: "cosmosvaloper1v".to_string(),
                entries: unbonding
                    .into_iter()
                    .enumerate()
                    .map(|(i, amount)| UnbondingEntry {
                        creation_height: i as u64,
                        completion_time: None,
                        initial_balance: amount,
                        balance: amount,
                    })
                    .collect(),
            }],
            rewards: DelegatorRewards {
                rewards: Vec::new(),
                total: rewards.into_iter().map(|a| DecCoin::new(DENOM, a)).collect(),
            },
            commission: commission.into_iter().map(|a| DecCoin::new(DENOM, a)).collect(),
            pools: HashMap::new(),
        })
}

fn account() -> impl Strategy<Value = AccountInfo> {
    prop_oneof![
        Just(AccountInfo {
            address: "cosmos1holder".to_string(),
            kind: AccountKind::Base,
        }),
        (0..MAX, 0..MAX).prop_map(|(original, delegated_vesting)| AccountInfo {
            address: "cosmos1holder".to_string(),
            kind: AccountKind::ContinuousVesting(ContinuousVestingAccount {
                base: BaseVesting {
                    original_vesting: vec![Coin::new(DENOM, original)],
                    delegated_free: Vec::new(),
                    delegated_vesting: vec![Coin::new(DENOM, delegated_vesting)],
                    end_time: 2_000,
                },
                start_time: 1_000,
            }),
        }),
    ]
}

proptest! {
    #[test]
    fn total_is_exact_sum_of_components(
        sources in sources(),
        account in account(),
        as_of in 0i64..3_000,
    ) {
        let snapshot = compute_snapshot(&sources, &account, as_of, DENOM);
        let sum: u128 = snapshot.components().iter().map(|coin| coin.amount).sum();
        prop_assert_eq!(snapshot.total.amount, sum);
        prop_assert!(snapshot.components().iter().all(|coin| coin.denom == DENOM));
    }

    #[test]
    fn accounts_without_vesting_report_zero_vesting(sources in sources(), as_of in 0i64..3_000) {
        let account = AccountInfo {
            address: "cosmos1holder".to_string(),
            kind: AccountKind::Base,
        };
        let snapshot = compute_snapshot(&sources, &account, as_of, DENOM);
        prop_assert_eq!(snapshot.vesting.amount, 0);
        prop_assert_eq!(snapshot.vested.amount, 0);
        prop_assert_eq!(snapshot.available.amount, sources.bank.first().map_or(0, |c| c.amount));
    }

    #[test]
    fn vesting_never_exceeds_locked_minus_delegated(account in account(), as_of in 0i64..3_000) {
        let snapshot = compute_snapshot(&BalanceSources::default(), &account, as_of, DENOM);
        if let Some(schedule) = account.kind.vesting_schedule() {
            let locked: u128 = schedule.vesting_coins(as_of).iter().map(|c| c.amount).sum();
            let delegated: u128 = schedule.base().delegated_vesting.iter().map(|c| c.amount).sum();
            prop_assert_eq!(snapshot.vesting.amount, locked.saturating_sub(delegated));
        }
    }
}
