#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn create_rule(triggers: u32, actions: u32) -> Weight;
  fn activate_rule() -> Weight;
  fn deactivate_rule() -> Weight;
  fn add_collateral() -> Weight;
  fn reduce_collateral() -> Weight;
  fn increase_reward() -> Weight;
  fn withdraw_reward_contribution() -> Weight;
  fn execute_rule(triggers: u32, actions: u32) -> Weight;
  fn cancel_rule() -> Weight;
  fn redeem_balance() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config + crate::Config> WeightInfo for SubstrateWeight<T> {
  fn create_rule(triggers: u32, actions: u32) -> Weight {
    // whitelist lookup + validation per trigger/action
    let checks = u64::from(triggers.saturating_add(actions));
    Weight::from_parts(30_000_000u64.saturating_add(checks.saturating_mul(4_000_000)), 3000)
      .saturating_add(T::DbWeight::get().reads(checks.saturating_add(2)))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn activate_rule() -> Weight {
    Weight::from_parts(12_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn deactivate_rule() -> Weight {
    Weight::from_parts(12_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn add_collateral() -> Weight {
    let assets = u64::from(primitives::params::MAX_ACTION_ASSETS);
    Weight::from_parts(20_000_000u64.saturating_add(assets.saturating_mul(10_000_000)), 2400)
      .saturating_add(T::DbWeight::get().reads(assets.saturating_mul(2).saturating_add(2)))
      .saturating_add(T::DbWeight::get().writes(assets.saturating_mul(2).saturating_add(2)))
  }

  fn reduce_collateral() -> Weight {
    let assets = u64::from(primitives::params::MAX_ACTION_ASSETS);
    Weight::from_parts(20_000_000u64.saturating_add(assets.saturating_mul(10_000_000)), 2400)
      .saturating_add(T::DbWeight::get().reads(assets.saturating_mul(2).saturating_add(2)))
      .saturating_add(T::DbWeight::get().writes(assets.saturating_mul(2).saturating_add(2)))
  }

  fn increase_reward() -> Weight {
    Weight::from_parts(20_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(5))
  }

  fn withdraw_reward_contribution() -> Weight {
    Weight::from_parts(20_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(5))
  }

  fn execute_rule(triggers: u32, actions: u32) -> Weight {
    // executors are external; reserve a conservative budget for each of them
    let triggers = u64::from(triggers);
    let actions = u64::from(actions);
    let assets = u64::from(primitives::params::MAX_ACTION_ASSETS);
    Weight::from_parts(
      40_000_000u64
        .saturating_add(triggers.saturating_mul(15_000_000))
        .saturating_add(actions.saturating_mul(80_000_000)),
      4000u64.saturating_add(actions.saturating_mul(512)),
    )
    .saturating_add(T::DbWeight::get().reads(
      4u64.saturating_add(triggers.saturating_mul(2)).saturating_add(actions.saturating_mul(assets.saturating_add(8))),
    ))
    .saturating_add(T::DbWeight::get().writes(
      6u64.saturating_add(actions.saturating_mul(assets.saturating_add(8))),
    ))
  }

  fn cancel_rule() -> Weight {
    let assets = u64::from(primitives::params::MAX_ACTION_ASSETS);
    Weight::from_parts(25_000_000u64.saturating_add(assets.saturating_mul(10_000_000)), 2400)
      .saturating_add(T::DbWeight::get().reads(assets.saturating_mul(2).saturating_add(2)))
      .saturating_add(T::DbWeight::get().writes(assets.saturating_mul(2).saturating_add(2)))
  }

  fn redeem_balance() -> Weight {
    let assets = u64::from(primitives::params::MAX_ACTION_ASSETS);
    Weight::from_parts(25_000_000u64.saturating_add(assets.saturating_mul(10_000_000)), 2400)
      .saturating_add(T::DbWeight::get().reads(assets.saturating_mul(2).saturating_add(2)))
      .saturating_add(T::DbWeight::get().writes(assets.saturating_mul(2).saturating_add(2)))
  }
}

impl WeightInfo for () {
  fn create_rule(triggers: u32, actions: u32) -> Weight {
    let checks = u64::from(triggers.saturating_add(actions));
    Weight::from_parts(30_000_000u64.saturating_add(checks.saturating_mul(4_000_000)), 3000)
  }
  fn activate_rule() -> Weight { Weight::from_parts(12_000_000, 1200) }
  fn deactivate_rule() -> Weight { Weight::from_parts(12_000_000, 1200) }
  fn add_collateral() -> Weight { Weight::from_parts(100_000_000, 2400) }
  fn reduce_collateral() -> Weight { Weight::from_parts(100_000_000, 2400) }
  fn increase_reward() -> Weight { Weight::from_parts(20_000_000, 1800) }
  fn withdraw_reward_contribution() -> Weight { Weight::from_parts(20_000_000, 1800) }
  fn execute_rule(triggers: u32, actions: u32) -> Weight {
    Weight::from_parts(
      40_000_000u64
        .saturating_add(u64::from(triggers).saturating_mul(15_000_000))
        .saturating_add(u64::from(actions).saturating_mul(80_000_000)),
      4000,
    )
  }
  fn cancel_rule() -> Weight { Weight::from_parts(105_000_000, 2400) }
  fn redeem_balance() -> Weight { Weight::from_parts(105_000_000, 2400) }
}
