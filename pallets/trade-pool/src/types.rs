use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

/// Admission limits of a trade, fixed at creation.
///
/// `deadline` and `lock_in` are informational: they are stored and exposed to
/// off-chain tooling but never enforced by the pool itself.
#[derive(
  Clone,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub struct Constraints<Balance, BlockNumber> {
  /// Lower bound of a single deposit call
  pub min_per_sub: Balance,
  /// Upper bound of a single deposit call
  pub max_per_sub: Balance,
  /// Pooled collateral at which the underlying rule is activated
  pub min_total: Balance,
  /// Pooled collateral cap
  pub max_total: Balance,
  pub deadline: BlockNumber,
  pub lock_in: BlockNumber,
}

impl<Balance: PartialOrd + Default, BlockNumber> Constraints<Balance, BlockNumber> {
  pub fn is_consistent(&self) -> bool {
    self.min_per_sub > Balance::default()
      && self.min_per_sub <= self.max_per_sub
      && self.min_total <= self.max_total
  }

  /// Per-call bound; repeated deposits by one subscriber are not summed.
  pub fn admits(&self, amount: &Balance) -> bool {
    self.min_per_sub <= *amount && *amount <= self.max_per_sub
  }
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
pub enum TradeStatus {
  Active,
  Executed,
  Cancelled,
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
pub enum SubscriptionStatus {
  Active,
  /// Withdrawn before execution
  Cancelled,
  Redeemed,
}

#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen)]
pub struct Trade<AccountId, Balance, BlockNumber, RuleId> {
  pub manager: AccountId,
  pub rule_id: RuleId,
  /// Cached view; refreshed on cancellation and on the first executed redemption
  pub status: TradeStatus,
  pub constraints: Constraints<Balance, BlockNumber>,
  /// Sum of the amounts of all active subscriptions
  pub total: Balance,
  pub created_at: BlockNumber,
}

#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen)]
pub struct Subscription<AccountId, Balance> {
  pub subscriber: AccountId,
  pub amount: Balance,
  pub status: SubscriptionStatus,
}
