use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

/// Tagged reference to an asset custodied or moved by the rule engine.
///
/// This enum is the single asset handle shared by the rule executor, the trade pool
/// and every trigger/action implementation plugged into them.
///
/// - `Native`: The system's native token (managed by pallet-balances).
/// - `Fungible(u32)`: A fungible token (managed by pallet-assets).
/// - `NonFungible`: A single item of a non-fungible collection (managed by pallet-nfts).
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Default,
  Encode,
  Eq,
  MaxEncodedLen,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  Serialize,
  Deserialize,
)]
pub enum AssetKind {
  /// Native token managed by pallet-balances
  #[default]
  Native,
  /// Fungible token identified by its asset id
  Fungible(u32),
  /// Non-fungible item; always moved as exactly one unit
  NonFungible { collection: u32, item: u32 },
}

impl From<u32> for AssetKind {
  fn from(asset_id: u32) -> Self {
    AssetKind::Fungible(asset_id)
  }
}

/// Helper trait to inspect AssetKind properties
pub trait AssetInspector {
  fn is_native(&self) -> bool;
  fn is_fungible(&self) -> bool;
  fn is_non_fungible(&self) -> bool;
  fn fungible_id(&self) -> Option<u32>;
  fn nft_id(&self) -> Option<(u32, u32)>;

  /// Whether `amount` is a movable quantity of this asset.
  ///
  /// Non-fungible handles only accept a single unit; zero is always accepted and
  /// never results in a transfer.
  fn accepts_amount(&self, amount: u128) -> bool;
}

impl AssetInspector for AssetKind {
  fn is_native(&self) -> bool {
    matches!(self, AssetKind::Native)
  }

  fn is_fungible(&self) -> bool {
    matches!(self, AssetKind::Native | AssetKind::Fungible(_))
  }

  fn is_non_fungible(&self) -> bool {
    matches!(self, AssetKind::NonFungible { .. })
  }

  fn fungible_id(&self) -> Option<u32> {
    match self {
      AssetKind::Fungible(id) => Some(*id),
      _ => None,
    }
  }

  fn nft_id(&self) -> Option<(u32, u32)> {
    match self {
      AssetKind::NonFungible { collection, item } => Some((*collection, *item)),
      _ => None,
    }
  }

  fn accepts_amount(&self, amount: u128) -> bool {
    match self {
      AssetKind::NonFungible { .. } => amount <= 1,
      _ => true,
    }
  }
}
