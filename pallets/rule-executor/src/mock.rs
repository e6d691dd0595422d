use crate as pallet_rule_executor;
use crate::{Action, ActionExecutor, ActionRuntimeParams, AssetOps, Trigger, TriggerEvaluator, Whitelist};
use frame::prelude::*;
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

pub const USDC: AssetKind = AssetKind::Fungible(1);
pub const DOT: AssetKind = AssetKind::Fungible(2);
pub const WETH: AssetKind = AssetKind::Fungible(3);

/// Moves every input to its spender and credits the same amounts as outputs.
pub const IDENTITY: ImplId = 1;
/// Single input, single output, output is twice the input.
pub const DOUBLER: ImplId = 2;
/// Fails static validation.
pub const BROKEN_ACTION: ImplId = 3;
/// Reports no output amounts at all.
pub const SILENT: ImplId = 4;
/// Calls back into the rule executor while being performed.
pub const REENTRANT: ImplId = 5;

/// Passes and reports the trigger's own threshold as observed value.
pub const ALWAYS: ImplId = 10;
/// Compares the mocked price feed against the trigger threshold.
pub const PRICE_FEED: ImplId = 11;
/// Fails static validation.
pub const BROKEN_TRIGGER: ImplId = 12;

pub const UNLISTED: ImplId = 99;

construct_runtime!(
  pub enum Test {
    System: polkadot_sdk::frame_system,
    Balances: polkadot_sdk::pallet_balances,
    RuleExecutor: pallet_rule_executor,
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

  static LAST_PARAMS: RefCell<Option<ActionRuntimeParams<Balance>>> = const { RefCell::new(None) };
}

pub fn reset_mock_adapters() {
  ASSET_BALANCES.with(|b| b.borrow_mut().clear());
  ALLOWANCES.with(|a| a.borrow_mut().clear());
  PRICE.with(|p| *p.borrow_mut() = 0);
  LAST_PARAMS.with(|p| *p.borrow_mut() = None);
}

pub fn set_asset_balance(who: AccountId, asset: AssetKind, amount: Balance) {
  ASSET_BALANCES.with(|b| {
    b.borrow_mut().insert((who, asset), amount);
  });
}

pub fn asset_balance(who: AccountId, asset: AssetKind) -> Balance {
  MockAssetOps::balance(&asset, &who)
}

pub fn allowance(owner: AccountId, spender: AccountId, asset: AssetKind) -> Balance {
  ALLOWANCES.with(|a| a.borrow().get(&(owner, spender, asset)).copied().unwrap_or(0))
}

pub fn set_price(price: u128) {
  PRICE.with(|p| *p.borrow_mut() = price);
}

pub fn last_action_params() -> Option<ActionRuntimeParams<Balance>> {
  LAST_PARAMS.with(|p| p.borrow().clone())
}

pub fn spender_of(executor: ImplId) -> AccountId {
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

/// Spend an allowance previously granted through `approve`.
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
    matches!(trigger.evaluator, ALWAYS | PRICE_FEED | UNLISTED)
  }

  fn check(trigger: &Trigger<ImplId>) -> (bool, u128) {
    match trigger.evaluator {
      ALWAYS => (true, trigger.value),
      PRICE_FEED => {
        let price = PRICE.with(|p| *p.borrow());
        (trigger.op.holds(price, trigger.value), price)
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
      IDENTITY | REENTRANT => !action.inputs.is_empty() && action.inputs.len() == action.outputs.len(),
      DOUBLER => action.inputs.len() == 1 && action.outputs.len() == 1,
      SILENT | UNLISTED => true,
      _ => false,
    }
  }

  fn perform(
    caller: &AccountId,
    action: &Action<ImplId>,
    params: ActionRuntimeParams<Balance>,
  ) -> Result<Vec<Balance>, DispatchError> {
    LAST_PARAMS.with(|p| *p.borrow_mut() = Some(params.clone()));
    let spender = spender_of(action.executor);
    match action.executor {
      IDENTITY => {
        for (asset, amount) in action.inputs.iter().zip(params.input_amounts.iter()) {
          transfer_from(asset, caller, &spender, *amount)?;
        }
        for (asset, amount) in action.outputs.iter().zip(params.input_amounts.iter()) {
          mint(asset, caller, *amount);
        }
        Ok(params.input_amounts)
      }
      DOUBLER => {
        let amount_in = params.input_amounts.first().copied().unwrap_or(0);
        transfer_from(&action.inputs[0], caller, &spender, amount_in)?;
        let amount_out = amount_in * 2;
        mint(&action.outputs[0], caller, amount_out);
        Ok(vec![amount_out])
      }
      SILENT => Ok(Vec::new()),
      REENTRANT => {
        RuleExecutor::do_increase_reward(caller, Default::default(), 1)?;
        Ok(params.input_amounts)
      }
      _ => Err(DispatchError::Other("UnknownExecutor")),
    }
  }
}

pub struct MockWhitelist;

impl Whitelist<ImplId> for MockWhitelist {
  fn is_whitelisted(list: &WhitelistName, implementation: &ImplId) -> bool {
    if *list == whitelists::TRIGGERS {
      matches!(*implementation, ALWAYS | PRICE_FEED | BROKEN_TRIGGER)
    } else if *list == whitelists::ACTIONS {
      matches!(*implementation, IDENTITY..=REENTRANT)
    } else {
      false
    }
  }
}

impl pallet_rule_executor::Config for Test {
  type Balance = Balance;
  type ImplementationId = ImplId;
  type AssetOps = MockAssetOps;
  type Triggers = MockTriggers;
  type Actions = MockActions;
  type Whitelist = MockWhitelist;
  type TriggerWhitelist = TriggerList;
  type ActionWhitelist = ActionList;
  type PalletId = RuleExecutorPalletId;
  type MaxTriggers = ConstU32<4>;
  type MaxActions = ConstU32<4>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, ImplId, Balance> for MockBenchmarkHelper {
  fn passing_trigger() -> Trigger<ImplId> {
    Trigger {
      evaluator: ALWAYS,
      op: crate::Comparison::GreaterThan,
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
