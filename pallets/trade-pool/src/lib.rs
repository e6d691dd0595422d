//! Trade Pool Pallet
//!
//! Lets many parties co-fund the collateral of a single rule of the rule executor. A trade wraps
//! one rule owned by this pallet's account; each deposit is an independent subscription that is
//! forwarded into the rule's collateral within the same dispatchable. The rule is activated once
//! the pooled collateral reaches the trade's floor and deactivated again when withdrawals drop it
//! below that floor.
//!
//! Once the rule is executed, subscribers redeem a share of the output proportional to their
//! deposit. If the manager cancels the trade instead, the collateral comes back to the pool
//! account and subscribers reclaim exactly what they put in.
//!
//! The pool never holds assets between operations except after cancellation or execution, when
//! it keeps what is still owed to subscribers (plus rounding dust).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod types;
pub use types::*;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub(crate) const LOG_TARGET: &str = "runtime::trade-pool";

#[frame::pallet]
pub mod pallet {
  use super::{LOG_TARGET, WeightInfo};
  use crate::types::*;
  use alloc::vec::Vec;
  use frame::prelude::*;
  use pallet_rule_executor::{
    ActionsOf, AmountsOf, AssetOps, BalanceOf, RuleIdOf, RuleOf, RuleStatus, TriggersOf,
    WeightInfo as RuleWeightInfo,
  };
  use polkadot_sdk::{
    frame_support::PalletId,
    sp_runtime::{
      ArithmeticError,
      traits::{AccountIdConversion, CheckedAdd, Hash as HashT, SaturatedConversion, Zero},
    },
  };
  use primitives::{AssetInspector, AssetKind};
  use sp_arithmetic::{Rounding, helpers_128bit::multiply_by_rational_with_rounding};

  #[pallet::config]
  pub trait Config: frame_system::Config + pallet_rule_executor::Config {
    /// Derives the pool account that owns every pooled rule
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    type WeightInfo: WeightInfo;
  }

  pub type TradeIdOf<T> = <T as frame_system::Config>::Hash;
  pub type ConstraintsOf<T> = Constraints<BalanceOf<T>, BlockNumberFor<T>>;
  pub type TradeOf<T> = Trade<
    <T as frame_system::Config>::AccountId,
    BalanceOf<T>,
    BlockNumberFor<T>,
    RuleIdOf<T>,
  >;
  pub type SubscriptionOf<T> = Subscription<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn trade)]
  pub type Trades<T: Config> = StorageMap<_, Blake2_128Concat, TradeIdOf<T>, TradeOf<T>, OptionQuery>;

  /// Subscriptions of a trade by their permanent index
  #[pallet::storage]
  #[pallet::getter(fn subscription)]
  pub type Subscriptions<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    TradeIdOf<T>,
    Twox64Concat,
    u32,
    SubscriptionOf<T>,
    OptionQuery,
  >;

  /// Next subscription index per trade
  #[pallet::storage]
  #[pallet::getter(fn subscription_count)]
  pub type SubscriptionCount<T: Config> =
    StorageMap<_, Blake2_128Concat, TradeIdOf<T>, u32, ValueQuery>;

  #[pallet::storage]
  pub type OperationLock<T> = StorageValue<_, bool, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    TradeCreated {
      trade_id: TradeIdOf<T>,
      rule_id: RuleIdOf<T>,
      manager: T::AccountId,
    },
    Deposited {
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
      subscriber: T::AccountId,
      amount: BalanceOf<T>,
      activated: bool,
    },
    Withdrawn {
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
      subscriber: T::AccountId,
      amount: BalanceOf<T>,
      deactivated: bool,
    },
    TradeCancelled {
      trade_id: TradeIdOf<T>,
      returned: BalanceOf<T>,
    },
    RedeemedCancelled {
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
      subscriber: T::AccountId,
      amount: BalanceOf<T>,
    },
    RedeemedExecuted {
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
      subscriber: T::AccountId,
      asset: AssetKind,
      payout: BalanceOf<T>,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    TradeNotFound,
    SubscriptionNotFound,
    NotManager,
    NotSubscriber,
    /// The trade's rule is no longer open for deposits or withdrawals
    TradeNotActive,
    TradeNotCancelled,
    TradeNotExecuted,
    SubscriptionNotActive,
    InvalidConstraints,
    /// The first action needs an input and the last action exactly one output
    UnsupportedRule,
    WrongCollateralType,
    AmountOutOfRange,
    CollateralCapExceeded,
    DuplicateTrade,
    Reentrancy,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create a rule owned by the pool and open it for subscriptions.
    #[pallet::call_index(0)]
    #[pallet::weight(
      <T as Config>::WeightInfo::create_trade().saturating_add(
        <T as pallet_rule_executor::Config>::WeightInfo::create_rule(
          triggers.len() as u32,
          actions.len() as u32,
        ),
      )
    )]
    pub fn create_trade(
      origin: OriginFor<T>,
      triggers: TriggersOf<T>,
      actions: ActionsOf<T>,
      constraints: ConstraintsOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_create_trade(&who, triggers, actions, constraints).map(|_| ())
    }

    #[pallet::call_index(1)]
    #[pallet::weight(
      <T as Config>::WeightInfo::deposit()
        .saturating_add(<T as pallet_rule_executor::Config>::WeightInfo::add_collateral())
        .saturating_add(<T as pallet_rule_executor::Config>::WeightInfo::activate_rule())
    )]
    pub fn deposit(
      origin: OriginFor<T>,
      trade_id: TradeIdOf<T>,
      asset: AssetKind,
      amount: BalanceOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_deposit(&who, trade_id, asset, amount).map(|_| ())
    }

    #[pallet::call_index(2)]
    #[pallet::weight(
      <T as Config>::WeightInfo::withdraw()
        .saturating_add(<T as pallet_rule_executor::Config>::WeightInfo::reduce_collateral())
        .saturating_add(<T as pallet_rule_executor::Config>::WeightInfo::deactivate_rule())
    )]
    pub fn withdraw(
      origin: OriginFor<T>,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_withdraw(&who, trade_id, subscription_idx)
    }

    #[pallet::call_index(3)]
    #[pallet::weight(
      <T as Config>::WeightInfo::cancel_trade()
        .saturating_add(<T as pallet_rule_executor::Config>::WeightInfo::cancel_rule())
    )]
    pub fn cancel_trade(origin: OriginFor<T>, trade_id: TradeIdOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_cancel_trade(&who, trade_id)
    }

    #[pallet::call_index(4)]
    #[pallet::weight(<T as Config>::WeightInfo::redeem_from_cancelled())]
    pub fn redeem_from_cancelled(
      origin: OriginFor<T>,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_redeem_from_cancelled(&who, trade_id, subscription_idx)
    }

    /// The first redemption of an executed trade also pulls the rule outputs into the pool.
    #[pallet::call_index(5)]
    #[pallet::weight(
      <T as Config>::WeightInfo::redeem_from_executed()
        .saturating_add(<T as pallet_rule_executor::Config>::WeightInfo::redeem_balance())
    )]
    pub fn redeem_from_executed(
      origin: OriginFor<T>,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_redeem_from_executed(&who, trade_id, subscription_idx)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Owner of every pooled rule and holder of redeemable balances.
    pub fn account_id() -> T::AccountId {
      <T as Config>::PalletId::get().into_account_truncating()
    }

    pub fn trade_id_of(manager: &T::AccountId, rule_id: &RuleIdOf<T>) -> TradeIdOf<T> {
      T::Hashing::hash_of(&(manager, rule_id))
    }

    /// All subscriptions of a trade in index order.
    pub fn subscriptions(trade_id: TradeIdOf<T>) -> Vec<SubscriptionOf<T>> {
      (0..SubscriptionCount::<T>::get(trade_id))
        .filter_map(|idx| Subscriptions::<T>::get(trade_id, idx))
        .collect()
    }

    /// Status derived from the cached trade status and the live rule status.
    pub fn trade_status(trade_id: TradeIdOf<T>) -> Option<TradeStatus> {
      let trade = Trades::<T>::get(trade_id)?;
      if trade.status != TradeStatus::Active {
        return Some(trade.status);
      }
      let rule = pallet_rule_executor::Rules::<T>::get(trade.rule_id)?;
      Some(Self::derive_status(&trade, &rule))
    }

    pub fn do_create_trade(
      manager: &T::AccountId,
      triggers: TriggersOf<T>,
      actions: ActionsOf<T>,
      constraints: ConstraintsOf<T>,
    ) -> Result<TradeIdOf<T>, DispatchError> {
      Self::non_reentrant(|| {
        ensure!(
          constraints.is_consistent(),
          Error::<T>::InvalidConstraints
        );
        ensure!(
          actions.first().is_none_or(|a| !a.inputs.is_empty())
            && actions.last().is_none_or(|a| a.outputs.len() == 1),
          Error::<T>::UnsupportedRule
        );

        let pool = Self::account_id();
        let rule_id = pallet_rule_executor::Pallet::<T>::do_create_rule(
          &pool,
          triggers,
          actions,
          Zero::zero(),
        )?;
        let trade_id = Self::trade_id_of(manager, &rule_id);
        ensure!(
          !Trades::<T>::contains_key(trade_id),
          Error::<T>::DuplicateTrade
        );

        Trades::<T>::insert(
          trade_id,
          Trade {
            manager: manager.clone(),
            rule_id,
            status: TradeStatus::Active,
            constraints,
            total: Zero::zero(),
            created_at: frame_system::Pallet::<T>::block_number(),
          },
        );
        log::debug!(
          target: LOG_TARGET,
          "trade {:?} created by {:?} over rule {:?}",
          trade_id,
          manager,
          rule_id
        );
        Self::deposit_event(Event::TradeCreated {
          trade_id,
          rule_id,
          manager: manager.clone(),
        });
        Ok(trade_id)
      })
    }

    /// Returns the index of the new subscription.
    pub fn do_deposit(
      who: &T::AccountId,
      trade_id: TradeIdOf<T>,
      asset: AssetKind,
      amount: BalanceOf<T>,
    ) -> Result<u32, DispatchError> {
      Self::non_reentrant(|| {
        let mut trade = Trades::<T>::get(trade_id).ok_or(Error::<T>::TradeNotFound)?;
        let rule = Self::open_rule(&trade)?;
        let collateral = pallet_rule_executor::Pallet::<T>::collateral_assets(&rule);
        ensure!(
          collateral.first() == Some(&asset),
          Error::<T>::WrongCollateralType
        );
        ensure!(
          trade.constraints.admits(&amount)
            && asset.accepts_amount(amount.saturated_into::<u128>()),
          Error::<T>::AmountOutOfRange
        );
        let total = trade
          .total
          .checked_add(&amount)
          .ok_or(ArithmeticError::Overflow)?;
        ensure!(
          total <= trade.constraints.max_total,
          Error::<T>::CollateralCapExceeded
        );

        let pool = Self::account_id();
        let amounts = Self::first_slot(collateral.len(), amount);
        // the engine pulls from the pool account, so its checks run ahead of the subscriber's pull
        pallet_rule_executor::Pallet::<T>::ensure_collateral_accepted(&pool, trade.rule_id, &amounts)?;
        T::AssetOps::pull(&asset, who, &pool, amount)?;
        pallet_rule_executor::Pallet::<T>::do_add_collateral(&pool, trade.rule_id, &amounts)?;

        let activated = rule.status == RuleStatus::Inactive && total >= trade.constraints.min_total;
        if activated {
          pallet_rule_executor::Pallet::<T>::do_activate_rule(&pool, trade.rule_id)?;
          log::debug!(target: LOG_TARGET, "trade {:?} reached its floor", trade_id);
        }

        let subscription_idx = SubscriptionCount::<T>::get(trade_id);
        Subscriptions::<T>::insert(
          trade_id,
          subscription_idx,
          Subscription {
            subscriber: who.clone(),
            amount,
            status: SubscriptionStatus::Active,
          },
        );
        SubscriptionCount::<T>::insert(trade_id, subscription_idx.saturating_add(1));
        trade.total = total;
        Trades::<T>::insert(trade_id, trade);

        Self::deposit_event(Event::Deposited {
          trade_id,
          subscription_idx,
          subscriber: who.clone(),
          amount,
          activated,
        });
        Ok(subscription_idx)
      })
    }

    pub fn do_withdraw(
      who: &T::AccountId,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut trade = Trades::<T>::get(trade_id).ok_or(Error::<T>::TradeNotFound)?;
        let mut subscription = Self::active_subscription(who, trade_id, subscription_idx)?;
        let rule = Self::open_rule(&trade)?;
        let collateral = pallet_rule_executor::Pallet::<T>::collateral_assets(&rule);
        let asset = collateral.first().copied().ok_or(Error::<T>::UnsupportedRule)?;

        let pool = Self::account_id();
        let amount = subscription.amount;
        let amounts = Self::first_slot(collateral.len(), amount);
        pallet_rule_executor::Pallet::<T>::do_reduce_collateral(&pool, trade.rule_id, &amounts)?;
        if !amount.is_zero() {
          T::AssetOps::push(&asset, &pool, who, amount)?;
        }

        let total = trade.total.saturating_sub(amount);
        let deactivated = rule.status == RuleStatus::Active && total < trade.constraints.min_total;
        if deactivated {
          pallet_rule_executor::Pallet::<T>::do_deactivate_rule(&pool, trade.rule_id)?;
          log::debug!(target: LOG_TARGET, "trade {:?} fell below its floor", trade_id);
        }

        subscription.status = SubscriptionStatus::Cancelled;
        Subscriptions::<T>::insert(trade_id, subscription_idx, subscription);
        trade.total = total;
        Trades::<T>::insert(trade_id, trade);

        Self::deposit_event(Event::Withdrawn {
          trade_id,
          subscription_idx,
          subscriber: who.clone(),
          amount,
          deactivated,
        });
        Ok(())
      })
    }

    pub fn do_cancel_trade(who: &T::AccountId, trade_id: TradeIdOf<T>) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut trade = Trades::<T>::get(trade_id).ok_or(Error::<T>::TradeNotFound)?;
        ensure!(trade.manager == *who, Error::<T>::NotManager);
        Self::open_rule(&trade)?;

        // collateral flows back to the rule owner, which is the pool account
        pallet_rule_executor::Pallet::<T>::do_cancel_rule(&Self::account_id(), trade.rule_id)?;
        trade.status = TradeStatus::Cancelled;
        let returned = trade.total;
        Trades::<T>::insert(trade_id, trade);

        log::debug!(target: LOG_TARGET, "trade {:?} cancelled", trade_id);
        Self::deposit_event(Event::TradeCancelled { trade_id, returned });
        Ok(())
      })
    }

    pub fn do_redeem_from_cancelled(
      who: &T::AccountId,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut trade = Trades::<T>::get(trade_id).ok_or(Error::<T>::TradeNotFound)?;
        ensure!(
          trade.status == TradeStatus::Cancelled,
          Error::<T>::TradeNotCancelled
        );
        let mut subscription = Self::active_subscription(who, trade_id, subscription_idx)?;
        let rule = pallet_rule_executor::Rules::<T>::get(trade.rule_id)
          .ok_or(pallet_rule_executor::Error::<T>::RuleNotFound)?;
        let asset = pallet_rule_executor::Pallet::<T>::collateral_assets(&rule)
          .first()
          .copied()
          .ok_or(Error::<T>::UnsupportedRule)?;

        let amount = subscription.amount;
        subscription.status = SubscriptionStatus::Redeemed;
        Subscriptions::<T>::insert(trade_id, subscription_idx, subscription);
        trade.total = trade.total.saturating_sub(amount);
        Trades::<T>::insert(trade_id, trade);

        if !amount.is_zero() {
          T::AssetOps::push(&asset, &Self::account_id(), who, amount)?;
        }
        Self::deposit_event(Event::RedeemedCancelled {
          trade_id,
          subscription_idx,
          subscriber: who.clone(),
          amount,
        });
        Ok(())
      })
    }

    pub fn do_redeem_from_executed(
      who: &T::AccountId,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut trade = Trades::<T>::get(trade_id).ok_or(Error::<T>::TradeNotFound)?;
        let mut subscription = Self::active_subscription(who, trade_id, subscription_idx)?;
        let rule = pallet_rule_executor::Rules::<T>::get(trade.rule_id)
          .ok_or(pallet_rule_executor::Error::<T>::RuleNotFound)?;
        ensure!(
          Self::derive_status(&trade, &rule) == TradeStatus::Executed,
          Error::<T>::TradeNotExecuted
        );

        if rule.status == RuleStatus::Executed {
          pallet_rule_executor::Pallet::<T>::do_redeem_balance(&Self::account_id(), trade.rule_id)?;
          trade.status = TradeStatus::Executed;
          Trades::<T>::insert(trade_id, &trade);
          log::debug!(target: LOG_TARGET, "trade {:?} outputs pulled into the pool", trade_id);
        }

        let asset = pallet_rule_executor::Pallet::<T>::output_assets(&rule)
          .first()
          .copied()
          .ok_or(Error::<T>::UnsupportedRule)?;
        let payout = Self::payout(&rule, subscription.amount)?;

        subscription.status = SubscriptionStatus::Redeemed;
        Subscriptions::<T>::insert(trade_id, subscription_idx, subscription);

        if !payout.is_zero() {
          T::AssetOps::push(&asset, &Self::account_id(), who, payout)?;
        }
        Self::deposit_event(Event::RedeemedExecuted {
          trade_id,
          subscription_idx,
          subscriber: who.clone(),
          asset,
          payout,
        });
        Ok(())
      })
    }

    /// `amount * output / collateral`, rounded down. The remainder stays in the pool account.
    pub fn payout(rule: &RuleOf<T>, amount: BalanceOf<T>) -> Result<BalanceOf<T>, DispatchError> {
      let output: u128 = rule
        .output_amounts
        .first()
        .copied()
        .unwrap_or_default()
        .saturated_into();
      let collateral: u128 = rule
        .collateral_amounts
        .first()
        .copied()
        .unwrap_or_default()
        .saturated_into();
      let share = multiply_by_rational_with_rounding(
        amount.saturated_into(),
        output,
        collateral,
        Rounding::Down,
      )
      .ok_or(ArithmeticError::DivisionByZero)?;
      Ok(share.saturated_into())
    }

    fn non_reentrant<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
      ensure!(!OperationLock::<T>::get(), Error::<T>::Reentrancy);
      OperationLock::<T>::put(true);
      let result = f();
      OperationLock::<T>::kill();
      result
    }

    fn derive_status(trade: &TradeOf<T>, rule: &RuleOf<T>) -> TradeStatus {
      match (trade.status, rule.status) {
        (TradeStatus::Active, RuleStatus::Executed | RuleStatus::Redeemed) => TradeStatus::Executed,
        (TradeStatus::Active, RuleStatus::Cancelled) => TradeStatus::Cancelled,
        (status, _) => status,
      }
    }

    /// The trade's rule, provided the trade still accepts deposits and withdrawals.
    fn open_rule(trade: &TradeOf<T>) -> Result<RuleOf<T>, DispatchError> {
      let rule = pallet_rule_executor::Rules::<T>::get(trade.rule_id)
        .ok_or(pallet_rule_executor::Error::<T>::RuleNotFound)?;
      ensure!(
        trade.status == TradeStatus::Active && rule.status.is_open(),
        Error::<T>::TradeNotActive
      );
      Ok(rule)
    }

    fn active_subscription(
      who: &T::AccountId,
      trade_id: TradeIdOf<T>,
      subscription_idx: u32,
    ) -> Result<SubscriptionOf<T>, DispatchError> {
      let subscription = Subscriptions::<T>::get(trade_id, subscription_idx)
        .ok_or(Error::<T>::SubscriptionNotFound)?;
      ensure!(subscription.subscriber == *who, Error::<T>::NotSubscriber);
      ensure!(
        subscription.status == SubscriptionStatus::Active,
        Error::<T>::SubscriptionNotActive
      );
      Ok(subscription)
    }

    /// Collateral vector moving `amount` of the first input asset only.
    fn first_slot(slots: usize, amount: BalanceOf<T>) -> AmountsOf<T> {
      let mut amounts = alloc::vec![BalanceOf::<T>::zero(); slots];
      if let Some(first) = amounts.first_mut() {
        *first = amount;
      }
      BoundedVec::truncate_from(amounts)
    }
  }
}
