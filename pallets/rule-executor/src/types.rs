use alloc::vec::Vec;
use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use polkadot_sdk::frame_support::pallet_prelude::{BoundedVec, ConstU32};
use scale_info::TypeInfo;
use primitives::params::{MAX_ACTION_ASSETS, MAX_PAYLOAD_LEN};

pub use primitives::AssetKind;

/// Value observed by a trigger evaluator while checking its condition (e.g. a price).
pub type ObservedValue = u128;

/// Opaque payload interpreted only by the trigger/action implementation it is addressed to.
pub type Payload = BoundedVec<u8, ConstU32<MAX_PAYLOAD_LEN>>;

/// Assets declared on one side of an action.
pub type ActionAssets = BoundedVec<AssetKind, ConstU32<MAX_ACTION_ASSETS>>;

/// One amount per declared asset of an action side.
pub type AssetAmounts<Balance> = BoundedVec<Balance, ConstU32<MAX_ACTION_ASSETS>>;

#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum Comparison {
  LessThan,
  GreaterThan,
}

impl Comparison {
  pub fn holds(&self, observed: ObservedValue, threshold: ObservedValue) -> bool {
    match self {
      Comparison::LessThan => observed < threshold,
      Comparison::GreaterThan => observed > threshold,
    }
  }
}

/// A condition checked by an external evaluator.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct Trigger<ImplId> {
  pub evaluator: ImplId,
  pub op: Comparison,
  pub value: ObservedValue,
  pub params: Payload,
}

/// An asset transformation performed by an external executor.
///
/// `outputs` of one action must equal `inputs` of the next one in a rule.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub struct Action<ImplId> {
  pub executor: ImplId,
  pub inputs: ActionAssets,
  pub outputs: ActionAssets,
  pub data: Payload,
}

#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum RuleStatus {
  Inactive,
  Active,
  Executed,
  Redeemed,
  Cancelled,
}

impl RuleStatus {
  /// Collateral and rewards can still move in and out.
  pub fn is_open(&self) -> bool {
    matches!(self, RuleStatus::Inactive | RuleStatus::Active)
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, RuleStatus::Redeemed | RuleStatus::Cancelled)
  }
}

#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen)]
pub struct Rule<AccountId, Balance, BlockNumber, Triggers, Actions> {
  pub owner: AccountId,
  pub triggers: Triggers,
  pub actions: Actions,
  pub status: RuleStatus,
  /// One counter per input asset of the first action
  pub collateral_amounts: AssetAmounts<Balance>,
  /// One amount per output asset of the last action, filled on execution
  pub output_amounts: AssetAmounts<Balance>,
  pub reward: Balance,
  pub created_at: BlockNumber,
}

/// What an action executor receives when it is performed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionRuntimeParams<Balance> {
  pub observed_value: ObservedValue,
  pub input_amounts: Vec<Balance>,
}
