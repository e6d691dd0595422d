#![cfg(feature = "runtime-benchmarks")]

use crate::*;
use alloc::vec;
use frame::deps::frame_benchmarking::{account, v2::*};
use frame::deps::frame_system::RawOrigin;
use frame::prelude::*;
use primitives::AssetKind;

const COLLATERAL: u32 = 1_000;
const REWARD: u32 = 500;

#[benchmarks]
mod benches {
  use super::*;

  fn make_triggers<T: Config>(count: u32) -> TriggersOf<T> {
    let trigger = T::BenchmarkHelper::passing_trigger();
    BoundedVec::truncate_from(vec![trigger; count as usize])
  }

  fn make_actions<T: Config>(count: u32) -> ActionsOf<T> {
    let action = T::BenchmarkHelper::single_asset_action();
    BoundedVec::truncate_from(vec![action; count as usize])
  }

  fn collateral_asset<T: Config>() -> AssetKind {
    T::BenchmarkHelper::single_asset_action()
      .inputs
      .first()
      .copied()
      .unwrap_or_default()
  }

  fn amounts<T: Config>(amount: u32) -> AmountsOf<T> {
    BoundedVec::truncate_from(vec![T::Balance::from(amount)])
  }

  /// Create a rule with reward and collateral in place, optionally active.
  fn setup_rule<T: Config>(
    owner: &T::AccountId,
    triggers: u32,
    actions: u32,
    activate: bool,
  ) -> RuleIdOf<T> {
    T::BenchmarkHelper::fund(&AssetKind::Native, owner, T::Balance::from(REWARD * 4));
    T::BenchmarkHelper::fund(&collateral_asset::<T>(), owner, T::Balance::from(COLLATERAL));
    let rule_id = Pallet::<T>::do_create_rule(
      owner,
      make_triggers::<T>(triggers),
      make_actions::<T>(actions),
      T::Balance::from(REWARD),
    )
    .unwrap();
    Pallet::<T>::do_add_collateral(owner, rule_id, &amounts::<T>(COLLATERAL)).unwrap();
    if activate {
      Pallet::<T>::do_activate_rule(owner, rule_id).unwrap();
    }
    rule_id
  }

  #[benchmark]
  fn create_rule(t: Linear<1, { T::MaxTriggers::get() }>, a: Linear<1, { T::MaxActions::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    T::BenchmarkHelper::fund(&AssetKind::Native, &caller, T::Balance::from(REWARD * 2));
    let triggers = make_triggers::<T>(t);
    let actions = make_actions::<T>(a);

    #[extrinsic_call]
    _(
      RawOrigin::Signed(caller),
      triggers,
      actions,
      T::Balance::from(REWARD),
    );

    assert_eq!(RuleCount::<T>::get(), 1);
  }

  #[benchmark]
  fn activate_rule() {
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&caller, 1, 1, false);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id);

    assert_eq!(Rules::<T>::get(rule_id).map(|r| r.status), Some(RuleStatus::Active));
  }

  #[benchmark]
  fn deactivate_rule() {
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&caller, 1, 1, true);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id);

    assert_eq!(Rules::<T>::get(rule_id).map(|r| r.status), Some(RuleStatus::Inactive));
  }

  #[benchmark]
  fn add_collateral() {
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&caller, 1, 1, false);
    T::BenchmarkHelper::fund(&collateral_asset::<T>(), &caller, T::Balance::from(COLLATERAL));

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id, amounts::<T>(COLLATERAL));

    let rule = Rules::<T>::get(rule_id).unwrap();
    assert_eq!(rule.collateral_amounts[0], T::Balance::from(COLLATERAL * 2));
  }

  #[benchmark]
  fn reduce_collateral() {
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&caller, 1, 1, false);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id, amounts::<T>(COLLATERAL));

    let rule = Rules::<T>::get(rule_id).unwrap();
    assert!(rule.collateral_amounts[0].is_zero());
  }

  #[benchmark]
  fn increase_reward() {
    let owner: T::AccountId = account("owner", 0, 0);
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&owner, 1, 1, true);
    T::BenchmarkHelper::fund(&AssetKind::Native, &caller, T::Balance::from(REWARD * 2));

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()), rule_id, T::Balance::from(REWARD));

    assert_eq!(
      RewardContributions::<T>::get(rule_id, caller),
      T::Balance::from(REWARD)
    );
  }

  #[benchmark]
  fn withdraw_reward_contribution() {
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&caller, 1, 1, true);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()), rule_id);

    assert!(RewardContributions::<T>::get(rule_id, caller).is_zero());
  }

  #[benchmark]
  fn execute_rule(t: Linear<1, { T::MaxTriggers::get() }>, a: Linear<1, { T::MaxActions::get() }>) {
    let owner: T::AccountId = account("owner", 0, 0);
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&owner, t, a, true);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id);

    assert_eq!(Rules::<T>::get(rule_id).map(|r| r.status), Some(RuleStatus::Executed));
  }

  #[benchmark]
  fn cancel_rule() {
    let caller: T::AccountId = whitelisted_caller();
    let rule_id = setup_rule::<T>(&caller, 1, 1, true);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id);

    assert_eq!(Rules::<T>::get(rule_id).map(|r| r.status), Some(RuleStatus::Cancelled));
  }

  #[benchmark]
  fn redeem_balance() {
    let caller: T::AccountId = whitelisted_caller();
    let keeper: T::AccountId = account("keeper", 0, 0);
    let rule_id = setup_rule::<T>(&caller, 1, 1, true);
    Pallet::<T>::do_execute_rule(&keeper, rule_id).unwrap();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), rule_id);

    assert_eq!(Rules::<T>::get(rule_id).map(|r| r.status), Some(RuleStatus::Redeemed));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
