#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

/// Pool-side cost only; the nested rule executor work is added by the pallet.
pub trait WeightInfo {
  fn create_trade() -> Weight;
  fn deposit() -> Weight;
  fn withdraw() -> Weight;
  fn cancel_trade() -> Weight;
  fn redeem_from_cancelled() -> Weight;
  fn redeem_from_executed() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn create_trade() -> Weight {
    Weight::from_parts(18_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn deposit() -> Weight {
    Weight::from_parts(30_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(6))
  }

  fn withdraw() -> Weight {
    Weight::from_parts(30_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(6))
  }

  fn cancel_trade() -> Weight {
    Weight::from_parts(12_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  fn redeem_from_cancelled() -> Weight {
    Weight::from_parts(25_000_000, 1600)
      .saturating_add(T::DbWeight::get().reads(4))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn redeem_from_executed() -> Weight {
    Weight::from_parts(30_000_000, 1600)
      .saturating_add(T::DbWeight::get().reads(5))
      .saturating_add(T::DbWeight::get().writes(5))
  }
}

impl WeightInfo for () {
  fn create_trade() -> Weight { Weight::from_parts(18_000_000, 1500) }
  fn deposit() -> Weight { Weight::from_parts(30_000_000, 2000) }
  fn withdraw() -> Weight { Weight::from_parts(30_000_000, 2000) }
  fn cancel_trade() -> Weight { Weight::from_parts(12_000_000, 1200) }
  fn redeem_from_cancelled() -> Weight { Weight::from_parts(25_000_000, 1600) }
  fn redeem_from_executed() -> Weight { Weight::from_parts(30_000_000, 1600) }
}
