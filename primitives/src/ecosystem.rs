//! Ecosystem Constants for the conditional execution protocol
//!
//! This module centralizes system-level constants: pallet IDs used to derive custodian
//! accounts, the names of the implementation whitelists, and the structural limits shared
//! by the rule executor and the trade pool.

/// Balance type alias for consistency across ecosystem
pub type Balance = u128;

/// Name of a whitelist kept by the authorization service.
pub type WhitelistName = [u8; 8];

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// These IDs are used by Polkadot SDK's `PalletId::into_account_truncating()`
/// to deterministically generate custodian accounts.
pub mod pallet_ids {
  /// Rule Executor pallet ID (custodian of all rule collateral and rewards)
  pub const RULE_EXECUTOR_PALLET_ID: &[u8; 8] = b"py/rlexe";

  /// Trade Pool pallet ID (owner of pooled rules)
  pub const TRADE_POOL_PALLET_ID: &[u8; 8] = b"py/trdpl";
}

/// Whitelists consulted before a trigger or action implementation is accepted.
pub mod whitelists {
  use super::WhitelistName;

  /// Trigger evaluator implementations
  pub const TRIGGERS: WhitelistName = *b"triggers";

  /// Action executor implementations
  pub const ACTIONS: WhitelistName = *b"actions0";
}

/// Structural limits of rules.
pub mod params {
  /// Maximum number of input (or output) assets a single action can declare.
  pub const MAX_ACTION_ASSETS: u32 = 8;

  /// Maximum length of an opaque trigger condition or action instruction payload.
  pub const MAX_PAYLOAD_LEN: u32 = 256;
}
