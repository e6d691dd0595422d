use crate as pallet_trade_pool;
use frame::prelude::*;
use pallet_rule_executor::{Action, ActionExecutor, ActionRuntimeParams, AssetOps, Trigger, TriggerEvaluator};
use polkadot_sdk::{
  frame_support::{
    PalletId, construct_runtime,
    traits::{ConstU32, ConstU128, Currency, ExistenceRequirement, Get},
  },
  sp_runtime::{
    BuildStorage, TokenError,
    traits::{BlakeTwo256, IdentityLookup},
  },
};
use primitives::{AssetKind, WhitelistName, pallet_ids, whitelists};

use alloc::{collections::BTreeMap, vec, vec::Vec};
use core::cell::RefCell;

type Block = polkadot_sdk::frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;
pub type Balance = u128;
pub type ImplId = u32;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
pub const MANAGER: AccountId = 10;
pub const KEEPER: AccountId = 20;

pub const USDC: AssetKind = AssetKind::Fungible(1);
pub const DOT: AssetKind = AssetKind::Fungible(2);
pub const WETH: AssetKind = AssetKind::Fungible(3);

/// Converts inputs into outputs 1:1.
pub const IDENTITY: ImplId = 1;
/// Converts its single input into 90% of it in the output asset.
pub const SKIM: ImplId = 2;
/// Splits its single input evenly across two output assets.
pub const SPLIT: ImplId = 3;

/// Always satisfied.
pub const ALWAYS: ImplId = 10;
/// Satisfied while the mocked price is below the trigger threshold.
pub const PRICE_BELOW: ImplId = 11;

construct_runtime!(
  pub enum Test {
    System: polkadot_sdk::frame_system,
    Balances: polkadot_sdk::pallet_balances,
    RuleExecutor: pallet_rule_executor,
    TradePool: pallet_trade_pool,
  }
);

impl polkadot_sdk::frame_system::Config for Test {
  type BaseCallFilter = polkadot_sdk::frame_support::traits::Everything;
  type BlockWeights = ();
  type BlockLength = ();
  type DbWeight = ();
  type RuntimeOrigin = RuntimeOrigin;
  type RuntimeCall = RuntimeCall;
  type Nonce = u64;
  type Hash = polkadot_sdk::sp_core::H256;
  type Hashing = BlakeTwo256;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Block = Block;
  type RuntimeEvent = RuntimeEvent;
  type BlockHashCount = polkadot_sdk::frame_support::traits::ConstU64<250>;
  type Version = ();
  type PalletInfo = PalletInfo;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
  type OnNewAccount = ();
  type OnKilledAccount = ();
  type SystemWeightInfo = ();
  type SS58Prefix = ();
  type OnSetCode = ();
  type MaxConsumers = ConstU32<16>;
  type RuntimeTask = ();
  type ExtensionsWeightInfo = ();
  type SingleBlockMigrations = ();
  type MultiBlockMigrator = ();
  type PreInherents = ();
  type PostInherents = ();
  type PostTransactions = ();
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ConstU32<50>;
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type RuntimeEvent = RuntimeEvent;
  type DustRemoval = ();
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = RuntimeHoldReason;
  type RuntimeFreezeReason = RuntimeFreezeReason;
  type DoneSlashHandler = ();
}

pub struct RuleExecutorPalletId;
impl Get<PalletId> for RuleExecutorPalletId {
  fn get() -> PalletId {
    PalletId(*pallet_ids::RULE_EXECUTOR_PALLET_ID)
  }
}

pub struct TradePoolPalletId;
impl Get<PalletId> for TradePoolPalletId {
  fn get() -> PalletId {
    PalletId(*pallet_ids::TRADE_POOL_PALLET_ID)
  }
}

pub struct TriggerList;
impl Get<WhitelistName> for TriggerList {
  fn get() -> WhitelistName {
    whitelists::TRIGGERS
  }
}

pub struct ActionList;
impl Get<WhitelistName> for ActionList {
  fn get() -> WhitelistName {
    whitelists::ACTIONS
  }
}

thread_local! {
  static ASSET_BALANCES: RefCell<BTreeMap<(AccountId, AssetKind), Balance>> =
    RefCell::new(BTreeMap::new());

  static ALLOWANCES: RefCell<BTreeMap<(AccountId, AccountId, AssetKind), Balance>> =
    RefCell::new(BTreeMap::new());

  static PRICE: RefCell<u128> = const { RefCell::new(0) };

  /// When set, the next pull calls back into the trade pool.
  static REENTER_ON_PULL: RefCell<bool> = const { RefCell::new(false) };
}

pub fn reset_mock_adapters() {
  ASSET_BALANCES.with(|b| b.borrow_mut().clear());
  ALLOWANCES.with(|a| a.borrow_mut().clear());
  PRICE.with(|p| *p.borrow_mut() = 0);
  REENTER_ON_PULL.with(|r| *r.borrow_mut() = false);
}

pub fn set_asset_balance(who: AccountId, asset: AssetKind, amount: Balance) {
  ASSET_BALANCES.with(|b| {
    b.borrow_mut().insert((who, asset), amount);
  });
}

pub fn asset_balance(who: AccountId, asset: AssetKind) -> Balance {
  MockAssetOps::balance(&asset, &who)
}

pub fn set_price(price: u128) {
  PRICE.with(|p| *p.borrow_mut() = price);
}

pub fn reenter_on_next_pull() {
  REENTER_ON_PULL.with(|r| *r.borrow_mut() = true);
}

fn spender_of(executor: ImplId) -> AccountId {
  1_000 + executor as AccountId
}

fn mint(asset: &AssetKind, to: &AccountId, amount: Balance) {
  match asset {
    AssetKind::Native => {
      let _ = <Balances as Currency<AccountId>>::deposit_creating(to, amount);
    }
    _ => ASSET_BALANCES.with(|b| {
      let mut map = b.borrow_mut();
      let bal = map.get(&(*to, *asset)).copied().unwrap_or(0);
      map.insert((*to, *asset), bal + amount);
    }),
  }
}

fn transfer(asset: &AssetKind, from: &AccountId, to: &AccountId, amount: Balance) -> DispatchResult {
  match asset {
    AssetKind::Native => <Balances as Currency<AccountId>>::transfer(
      from,
      to,
      amount,
      ExistenceRequirement::AllowDeath,
    ),
    _ => ASSET_BALANCES.with(|b| {
      let mut map = b.borrow_mut();
      let src = map.get(&(*from, *asset)).copied().unwrap_or(0);
      if src < amount {
        return Err(DispatchError::Token(TokenError::FundsUnavailable));
      }
      map.insert((*from, *asset), src - amount);
      let dst = map.get(&(*to, *asset)).copied().unwrap_or(0);
      map.insert((*to, *asset), dst + amount);
      Ok(())
    }),
  }
}

fn transfer_from(
  asset: &AssetKind,
  owner: &AccountId,
  spender: &AccountId,
  amount: Balance,
) -> DispatchResult {
  ALLOWANCES.with(|a| {
    let mut map = a.borrow_mut();
    let granted = map.get(&(*owner, *spender, *asset)).copied().unwrap_or(0);
    if granted < amount {
      return Err(DispatchError::Other("AllowanceExceeded"));
    }
    map.insert((*owner, *spender, *asset), granted - amount);
    Ok(())
  })?;
  transfer(asset, owner, spender, amount)
}

pub struct MockAssetOps;

impl AssetOps<AccountId, Balance> for MockAssetOps {
  fn approve(
    asset: &AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    amount: Balance,
  ) -> DispatchResult {
    ALLOWANCES.with(|a| {
      a.borrow_mut().insert((*owner, *spender, *asset), amount);
    });
    Ok(())
  }

  fn pull(asset: &AssetKind, from: &AccountId, into: &AccountId, amount: Balance) -> DispatchResult {
    if REENTER_ON_PULL.with(|r| r.replace(false)) {
      TradePool::do_cancel_trade(&MANAGER, Default::default())?;
    }
    transfer(asset, from, into, amount)
  }

  fn push(asset: &AssetKind, from: &AccountId, to: &AccountId, amount: Balance) -> DispatchResult {
    transfer(asset, from, to, amount)
  }

  fn balance(asset: &AssetKind, who: &AccountId) -> Balance {
    match asset {
      AssetKind::Native => <Balances as Currency<AccountId>>::free_balance(who),
      _ => ASSET_BALANCES.with(|b| b.borrow().get(&(*who, *asset)).copied().unwrap_or(0)),
    }
  }
}

pub struct MockTriggers;

impl TriggerEvaluator<ImplId> for MockTriggers {
  fn validate(trigger: &Trigger<ImplId>) -> bool {
    matches!(trigger.evaluator, ALWAYS | PRICE_BELOW)
  }

  fn check(trigger: &Trigger<ImplId>) -> (bool, u128) {
    match trigger.evaluator {
      ALWAYS => (true, 0),
      PRICE_BELOW => {
        let price = PRICE.with(|p| *p.borrow());
        (price < trigger.value, price)
      }
      _ => (false, 0),
    }
  }
}

pub struct MockActions;

impl ActionExecutor<AccountId, ImplId, Balance> for MockActions {
  fn spender(executor: &ImplId) -> AccountId {
    spender_of(*executor)
  }

  fn validate(action: &Action<ImplId>) -> bool {
    match action.executor {
      IDENTITY => action.inputs.len() == action.outputs.len(),
      SKIM => action.inputs.len() == 1 && action.outputs.len() == 1,
      SPLIT => action.inputs.len() == 1 && action.outputs.len() == 2,
      _ => false,
    }
  }

  fn perform(
    caller: &AccountId,
    action: &Action<ImplId>,
    params: ActionRuntimeParams<Balance>,
  ) -> Result<Vec<Balance>, DispatchError> {
    let spender = spender_of(action.executor);
    for (asset, amount) in action.inputs.iter().zip(params.input_amounts.iter()) {
      transfer_from(asset, caller, &spender, *amount)?;
    }
    let outputs: Vec<Balance> = match action.executor {
      IDENTITY => params.input_amounts.clone(),
      SKIM => vec![params.input_amounts[0] * 9 / 10],
      SPLIT => vec![params.input_amounts[0] / 2; 2],
      _ => return Err(DispatchError::Other("UnknownExecutor")),
    };
    for (asset, amount) in action.outputs.iter().zip(outputs.iter()) {
      mint(asset, caller, *amount);
    }
    Ok(outputs)
  }
}

impl pallet_rule_executor::Config for Test {
  type Balance = Balance;
  type ImplementationId = ImplId;
  type AssetOps = MockAssetOps;
  type Triggers = MockTriggers;
  type Actions = MockActions;
  type Whitelist = ();
  type TriggerWhitelist = TriggerList;
  type ActionWhitelist = ActionList;
  type PalletId = RuleExecutorPalletId;
  type MaxTriggers = ConstU32<4>;
  type MaxActions = ConstU32<4>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

impl pallet_trade_pool::Config for Test {
  type PalletId = TradePoolPalletId;
  type WeightInfo = ();
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_rule_executor::BenchmarkHelper<AccountId, ImplId, Balance> for MockBenchmarkHelper {
  fn passing_trigger() -> Trigger<ImplId> {
    Trigger {
      evaluator: ALWAYS,
      op: pallet_rule_executor::Comparison::GreaterThan,
      value: 0,
      params: Default::default(),
    }
  }

  fn single_asset_action() -> Action<ImplId> {
    Action {
      executor: IDENTITY,
      inputs: vec![USDC].try_into().unwrap(),
      outputs: vec![USDC].try_into().unwrap(),
      data: Default::default(),
    }
  }

  fn fund(asset: &AssetKind, who: &AccountId, amount: Balance) {
    mint(asset, who, amount);
  }
}

pub const TEST_INITIAL_BALANCE: Balance = 10_000_000;

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = polkadot_sdk::frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ALICE, TEST_INITIAL_BALANCE),
      (BOB, TEST_INITIAL_BALANCE),
      (CHARLIE, TEST_INITIAL_BALANCE),
      (MANAGER, TEST_INITIAL_BALANCE),
      (KEEPER, TEST_INITIAL_BALANCE),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    reset_mock_adapters();
  });
  ext
}
