//! Adapter traits for the rule executor
//!
//! Asset custody, trigger evaluation, action execution and authorization are external
//! collaborators. The pallet only sees them through these traits, so the runtime decides which
//! concrete trigger/action implementations exist and how each asset class is moved.

use crate::types::{Action, ActionRuntimeParams, ObservedValue, Trigger};
use alloc::vec::Vec;
use frame::prelude::*;
use primitives::{AssetKind, WhitelistName};

/// Asset movements for native, fungible and non-fungible handles.
///
/// Every method must either move exactly the requested amount or fail; the pallet never
/// inspects balances to detect a silent short transfer.
pub trait AssetOps<AccountId, Balance> {
  /// Allow `spender` to move up to `amount` of `asset` out of `owner`.
  fn approve(
    asset: &AssetKind,
    owner: &AccountId,
    spender: &AccountId,
    amount: Balance,
  ) -> DispatchResult;

  /// Take `amount` of `asset` from a depositor into a custodian account.
  fn pull(asset: &AssetKind, from: &AccountId, into: &AccountId, amount: Balance) -> DispatchResult;

  /// Pay `amount` of `asset` out of a custodian account.
  fn push(asset: &AssetKind, from: &AccountId, to: &AccountId, amount: Balance) -> DispatchResult;

  fn balance(asset: &AssetKind, who: &AccountId) -> Balance;
}

/// Condition checker addressed by `Trigger::evaluator`.
pub trait TriggerEvaluator<ImplId> {
  /// Static validation of the condition payload, run once at rule creation.
  fn validate(trigger: &Trigger<ImplId>) -> bool;

  /// Evaluate the condition now. The observed value is forwarded to the action chain.
  fn check(trigger: &Trigger<ImplId>) -> (bool, ObservedValue);
}

/// Asset transformer addressed by `Action::executor`.
pub trait ActionExecutor<AccountId, ImplId, Balance> {
  /// Account that receives the input approvals before `perform` is invoked.
  fn spender(executor: &ImplId) -> AccountId;

  /// Static validation of the instruction payload, run once at rule creation.
  fn validate(action: &Action<ImplId>) -> bool;

  /// Consume the approved inputs of `caller` and credit the outputs back to `caller`.
  ///
  /// Returns one realized amount per declared output asset.
  fn perform(
    caller: &AccountId,
    action: &Action<ImplId>,
    params: ActionRuntimeParams<Balance>,
  ) -> Result<Vec<Balance>, DispatchError>;
}

/// Authorization service keeping named lists of accepted implementations.
pub trait Whitelist<ImplId> {
  fn is_whitelisted(list: &WhitelistName, implementation: &ImplId) -> bool;
}

/// No-op `AssetOps` for configurations where assets are tracked elsewhere.
impl<AccountId, Balance: Default> AssetOps<AccountId, Balance> for () {
  fn approve(_: &AssetKind, _: &AccountId, _: &AccountId, _: Balance) -> DispatchResult {
    Ok(())
  }

  fn pull(_: &AssetKind, _: &AccountId, _: &AccountId, _: Balance) -> DispatchResult {
    Ok(())
  }

  fn push(_: &AssetKind, _: &AccountId, _: &AccountId, _: Balance) -> DispatchResult {
    Ok(())
  }

  fn balance(_: &AssetKind, _: &AccountId) -> Balance {
    Balance::default()
  }
}

/// Rejects every trigger; rules cannot be created without a real evaluator.
impl<ImplId> TriggerEvaluator<ImplId> for () {
  fn validate(_: &Trigger<ImplId>) -> bool {
    false
  }

  fn check(_: &Trigger<ImplId>) -> (bool, ObservedValue) {
    (false, 0)
  }
}

/// Open whitelist: every implementation is accepted.
impl<ImplId> Whitelist<ImplId> for () {
  fn is_whitelisted(_: &WhitelistName, _: &ImplId) -> bool {
    true
  }
}
