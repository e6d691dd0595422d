#![cfg(feature = "runtime-benchmarks")]

use crate::*;
use alloc::vec;
use frame::deps::frame_benchmarking::{account, v2::*};
use frame::deps::frame_system::RawOrigin;
use frame::prelude::*;
use pallet_rule_executor::{ActionsOf, BalanceOf, BenchmarkHelper, TriggersOf};
use primitives::AssetKind;

const DEPOSIT: u32 = 1_000;

type Helper<T> = <T as pallet_rule_executor::Config>::BenchmarkHelper;

#[benchmarks]
mod benches {
  use super::*;

  fn collateral_asset<T: Config>() -> AssetKind {
    Helper::<T>::single_asset_action()
      .inputs
      .first()
      .copied()
      .unwrap_or_default()
  }

  fn balance<T: Config>(amount: u32) -> BalanceOf<T> {
    BalanceOf::<T>::from(amount)
  }

  fn rule_parts<T: Config>() -> (TriggersOf<T>, ActionsOf<T>) {
    (
      BoundedVec::truncate_from(vec![Helper::<T>::passing_trigger()]),
      BoundedVec::truncate_from(vec![Helper::<T>::single_asset_action()]),
    )
  }

  /// Floor reachable by two deposits, cap well above it.
  fn constraints<T: Config>() -> ConstraintsOf<T> {
    Constraints {
      min_per_sub: balance::<T>(1),
      max_per_sub: balance::<T>(DEPOSIT),
      min_total: balance::<T>(DEPOSIT * 2),
      max_total: balance::<T>(DEPOSIT * 10),
      deadline: 100u32.into(),
      lock_in: 10u32.into(),
    }
  }

  fn setup_trade<T: Config>() -> TradeIdOf<T> {
    let manager: T::AccountId = account("manager", 0, 0);
    let (triggers, actions) = rule_parts::<T>();
    Pallet::<T>::do_create_trade(&manager, triggers, actions, constraints::<T>()).unwrap()
  }

  fn subscribe<T: Config>(trade_id: TradeIdOf<T>, who: &T::AccountId) -> u32 {
    let asset = collateral_asset::<T>();
    Helper::<T>::fund(&asset, who, balance::<T>(DEPOSIT));
    Pallet::<T>::do_deposit(who, trade_id, asset, balance::<T>(DEPOSIT)).unwrap()
  }

  #[benchmark]
  fn create_trade() {
    let caller: T::AccountId = whitelisted_caller();
    let (triggers, actions) = rule_parts::<T>();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), triggers, actions, constraints::<T>());

    assert_eq!(Trades::<T>::iter().count(), 1);
  }

  // worst case: the deposit crosses the floor and activates the rule
  #[benchmark]
  fn deposit() {
    let trade_id = setup_trade::<T>();
    subscribe::<T>(trade_id, &account("subscriber", 0, 0));
    let caller: T::AccountId = whitelisted_caller();
    let asset = collateral_asset::<T>();
    Helper::<T>::fund(&asset, &caller, balance::<T>(DEPOSIT));

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), trade_id, asset, balance::<T>(DEPOSIT));

    assert_eq!(SubscriptionCount::<T>::get(trade_id), 2);
  }

  // worst case: the withdrawal drops below the floor and deactivates the rule
  #[benchmark]
  fn withdraw() {
    let trade_id = setup_trade::<T>();
    subscribe::<T>(trade_id, &account("subscriber", 0, 0));
    let caller: T::AccountId = whitelisted_caller();
    let idx = subscribe::<T>(trade_id, &caller);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), trade_id, idx);

    assert_eq!(
      Subscriptions::<T>::get(trade_id, idx).map(|s| s.status),
      Some(SubscriptionStatus::Cancelled)
    );
  }

  #[benchmark]
  fn cancel_trade() {
    let trade_id = setup_trade::<T>();
    subscribe::<T>(trade_id, &account("subscriber", 0, 0));
    let manager: T::AccountId = account("manager", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(manager), trade_id);

    assert_eq!(
      Trades::<T>::get(trade_id).map(|t| t.status),
      Some(TradeStatus::Cancelled)
    );
  }

  #[benchmark]
  fn redeem_from_cancelled() {
    let trade_id = setup_trade::<T>();
    let caller: T::AccountId = whitelisted_caller();
    let idx = subscribe::<T>(trade_id, &caller);
    Pallet::<T>::do_cancel_trade(&account("manager", 0, 0), trade_id).unwrap();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), trade_id, idx);

    assert_eq!(
      Subscriptions::<T>::get(trade_id, idx).map(|s| s.status),
      Some(SubscriptionStatus::Redeemed)
    );
  }

  // worst case: the first redemption also redeems the rule outputs
  #[benchmark]
  fn redeem_from_executed() {
    let trade_id = setup_trade::<T>();
    subscribe::<T>(trade_id, &account("subscriber", 0, 0));
    let caller: T::AccountId = whitelisted_caller();
    let idx = subscribe::<T>(trade_id, &caller);
    let rule_id = Trades::<T>::get(trade_id).map(|t| t.rule_id).unwrap();
    pallet_rule_executor::Pallet::<T>::do_execute_rule(&account("keeper", 0, 0), rule_id).unwrap();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), trade_id, idx);

    assert_eq!(
      Trades::<T>::get(trade_id).map(|t| t.status),
      Some(TradeStatus::Executed)
    );
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
