//! Rule Executor Pallet
//!
//! Conditional execution engine. A rule is an ordered list of triggers (conditions checked by
//! whitelisted evaluators) and an ordered chain of actions (asset transformations performed by
//! whitelisted executors). The pallet custodies the collateral feeding the first action and a
//! crowdfunded reward, and lets anyone execute an active rule once all of its triggers pass.
//!
//! ## Lifecycle
//! `Inactive -> Active -> Executed -> Redeemed`, with `Cancelled` reachable from `Inactive` and
//! `Active`. Rules are never removed from storage; terminal rules stay readable for audit and
//! for the trade pool's proportional payouts.
//!
//! ## Reward
//! The whole reward pool goes to whoever successfully completes `execute_rule`, regardless of who
//! contributed it. Contributors can withdraw their share at any time before execution.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{ActionExecutor, AssetOps, TriggerEvaluator, Whitelist};

pub mod types;
pub use types::*;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub(crate) const LOG_TARGET: &str = "runtime::rule-executor";

/// Supplies runtime-specific implementations so benchmarks can build executable rules.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, ImplId, Balance> {
  /// Whitelisted, valid trigger that is satisfied right now.
  fn passing_trigger() -> Trigger<ImplId>;
  /// Whitelisted action whose single output asset equals its single input asset, so it can be
  /// chained with itself.
  fn single_asset_action() -> Action<ImplId>;
  /// Credit `who` with `amount` of `asset`.
  fn fund(asset: &primitives::AssetKind, who: &AccountId, amount: Balance);
}

#[frame::pallet]
pub mod pallet {
  use super::{ActionExecutor, AssetOps, LOG_TARGET, TriggerEvaluator, WeightInfo, Whitelist};
  use crate::types::*;
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::PalletId,
    sp_runtime::{
      ArithmeticError,
      traits::{AccountIdConversion, CheckedAdd, Hash as HashT, SaturatedConversion, Zero},
    },
  };
  use primitives::{AssetInspector, AssetKind, WhitelistName};

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type Balance: Parameter
      + Member
      + AtLeast32BitUnsigned
      + Default
      + Copy
      + MaybeSerializeDeserialize
      + MaxEncodedLen;

    /// Address of a trigger evaluator or action executor implementation
    type ImplementationId: Parameter + Member + Copy + MaxEncodedLen;

    type AssetOps: AssetOps<Self::AccountId, Self::Balance>;
    type Triggers: TriggerEvaluator<Self::ImplementationId>;
    type Actions: ActionExecutor<Self::AccountId, Self::ImplementationId, Self::Balance>;
    type Whitelist: Whitelist<Self::ImplementationId>;

    /// Whitelist consulted for trigger evaluators
    #[pallet::constant]
    type TriggerWhitelist: Get<WhitelistName>;
    /// Whitelist consulted for action executors
    #[pallet::constant]
    type ActionWhitelist: Get<WhitelistName>;

    /// Derives the custodian account holding collateral and rewards
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    #[pallet::constant]
    type MaxTriggers: Get<u32>;
    #[pallet::constant]
    type MaxActions: Get<u32>;

    type WeightInfo: WeightInfo;
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<
        Self::AccountId,
        Self::ImplementationId,
        Self::Balance,
      >;
  }

  pub type BalanceOf<T> = <T as Config>::Balance;
  pub type RuleIdOf<T> = <T as frame_system::Config>::Hash;
  pub type AmountsOf<T> = AssetAmounts<BalanceOf<T>>;
  pub type TriggerOf<T> = Trigger<<T as Config>::ImplementationId>;
  pub type ActionOf<T> = Action<<T as Config>::ImplementationId>;
  pub type TriggersOf<T> = BoundedVec<TriggerOf<T>, <T as Config>::MaxTriggers>;
  pub type ActionsOf<T> = BoundedVec<ActionOf<T>, <T as Config>::MaxActions>;

  pub type RuleOf<T> = Rule<
    <T as frame_system::Config>::AccountId,
    BalanceOf<T>,
    BlockNumberFor<T>,
    TriggersOf<T>,
    ActionsOf<T>,
  >;

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Rule arena keyed by content hash
  #[pallet::storage]
  #[pallet::getter(fn rules)]
  pub type Rules<T: Config> = StorageMap<_, Blake2_128Concat, RuleIdOf<T>, RuleOf<T>, OptionQuery>;

  /// Native reward contributed per (rule, contributor). Sums to `Rule::reward`.
  #[pallet::storage]
  #[pallet::getter(fn reward_contribution)]
  pub type RewardContributions<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    RuleIdOf<T>,
    Blake2_128Concat,
    T::AccountId,
    BalanceOf<T>,
    ValueQuery,
  >;

  #[pallet::storage]
  #[pallet::getter(fn rule_count)]
  pub type RuleCount<T> = StorageValue<_, u64, ValueQuery>;

  /// Set while a mutating operation is in flight
  #[pallet::storage]
  pub type OperationLock<T> = StorageValue<_, bool, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    RuleCreated {
      rule_id: RuleIdOf<T>,
      owner: T::AccountId,
      reward: BalanceOf<T>,
    },
    RuleActivated {
      rule_id: RuleIdOf<T>,
    },
    RuleDeactivated {
      rule_id: RuleIdOf<T>,
    },
    CollateralAdded {
      rule_id: RuleIdOf<T>,
      amounts: AmountsOf<T>,
    },
    CollateralReduced {
      rule_id: RuleIdOf<T>,
      amounts: AmountsOf<T>,
    },
    RewardIncreased {
      rule_id: RuleIdOf<T>,
      contributor: T::AccountId,
      amount: BalanceOf<T>,
    },
    RewardContributionWithdrawn {
      rule_id: RuleIdOf<T>,
      contributor: T::AccountId,
      amount: BalanceOf<T>,
    },
    RuleExecuted {
      rule_id: RuleIdOf<T>,
      executor: T::AccountId,
      reward: BalanceOf<T>,
      observed_value: ObservedValue,
      outputs: AmountsOf<T>,
    },
    RuleCancelled {
      rule_id: RuleIdOf<T>,
      returned: AmountsOf<T>,
    },
    RuleRedeemed {
      rule_id: RuleIdOf<T>,
      owner: T::AccountId,
      outputs: AmountsOf<T>,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    RuleNotFound,
    NotRuleOwner,
    /// Trigger evaluator or action executor is not on its whitelist
    NotWhitelisted,
    EmptyTriggers,
    EmptyActions,
    InvalidTrigger,
    InvalidAction,
    /// Declared outputs of an action differ from the inputs of the next one
    BrokenActionChain,
    DuplicateRule,
    InvalidRuleStatus,
    /// One amount per collateral asset is required
    CollateralLengthMismatch,
    /// Non-fungible handles move at most one unit
    InvalidAssetAmount,
    InsufficientCollateral,
    AmountZero,
    NoContribution,
    TriggerNotSatisfied,
    /// Executor returned a different number of amounts than it declared outputs
    OutputLengthMismatch,
    Reentrancy,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Register a new rule owned by the caller. `reward` (native) seeds the execution reward.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_rule(triggers.len() as u32, actions.len() as u32))]
    pub fn create_rule(
      origin: OriginFor<T>,
      triggers: TriggersOf<T>,
      actions: ActionsOf<T>,
      reward: BalanceOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_create_rule(&who, triggers, actions, reward).map(|_| ())
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::activate_rule())]
    pub fn activate_rule(origin: OriginFor<T>, rule_id: RuleIdOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_activate_rule(&who, rule_id)
    }

    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::deactivate_rule())]
    pub fn deactivate_rule(origin: OriginFor<T>, rule_id: RuleIdOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_deactivate_rule(&who, rule_id)
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::add_collateral())]
    pub fn add_collateral(
      origin: OriginFor<T>,
      rule_id: RuleIdOf<T>,
      amounts: AmountsOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_add_collateral(&who, rule_id, &amounts)
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::reduce_collateral())]
    pub fn reduce_collateral(
      origin: OriginFor<T>,
      rule_id: RuleIdOf<T>,
      amounts: AmountsOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_reduce_collateral(&who, rule_id, &amounts)
    }

    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::increase_reward())]
    pub fn increase_reward(
      origin: OriginFor<T>,
      rule_id: RuleIdOf<T>,
      amount: BalanceOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_increase_reward(&who, rule_id, amount)
    }

    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::withdraw_reward_contribution())]
    pub fn withdraw_reward_contribution(
      origin: OriginFor<T>,
      rule_id: RuleIdOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_withdraw_reward_contribution(&who, rule_id)
    }

    /// Permissionless. Runs the action chain if every trigger passes and pays the caller the
    /// whole reward pool.
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::execute_rule(T::MaxTriggers::get(), T::MaxActions::get()))]
    pub fn execute_rule(origin: OriginFor<T>, rule_id: RuleIdOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_execute_rule(&who, rule_id)
    }

    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::cancel_rule())]
    pub fn cancel_rule(origin: OriginFor<T>, rule_id: RuleIdOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_cancel_rule(&who, rule_id)
    }

    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::redeem_balance())]
    pub fn redeem_balance(origin: OriginFor<T>, rule_id: RuleIdOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_redeem_balance(&who, rule_id)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Custodian of every rule's collateral, outputs and reward pool.
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn rule_id_of(
      triggers: &TriggersOf<T>,
      actions: &ActionsOf<T>,
      owner: &T::AccountId,
      created_at: BlockNumberFor<T>,
    ) -> RuleIdOf<T> {
      T::Hashing::hash_of(&(triggers, actions, owner, created_at))
    }

    /// Assets accepted as collateral: the inputs of the first action.
    pub fn collateral_assets(rule: &RuleOf<T>) -> &[AssetKind] {
      rule
        .actions
        .first()
        .map(|action| &action.inputs[..])
        .unwrap_or(&[])
    }

    /// Assets produced on execution: the outputs of the last action.
    pub fn output_assets(rule: &RuleOf<T>) -> &[AssetKind] {
      rule
        .actions
        .last()
        .map(|action| &action.outputs[..])
        .unwrap_or(&[])
    }

    /// Evaluate the triggers of a rule without touching state.
    pub fn check_rule(rule_id: RuleIdOf<T>) -> Result<(bool, ObservedValue), DispatchError> {
      let rule = Rules::<T>::get(rule_id).ok_or(Error::<T>::RuleNotFound)?;
      Ok(Self::evaluate_triggers(&rule.triggers))
    }

    pub fn do_create_rule(
      owner: &T::AccountId,
      triggers: TriggersOf<T>,
      actions: ActionsOf<T>,
      reward: BalanceOf<T>,
    ) -> Result<RuleIdOf<T>, DispatchError> {
      Self::non_reentrant(|| {
        ensure!(!triggers.is_empty(), Error::<T>::EmptyTriggers);
        ensure!(!actions.is_empty(), Error::<T>::EmptyActions);
        Self::validate_triggers(&triggers)?;
        Self::validate_actions(&actions)?;
        Self::ensure_action_chain(&actions)?;

        let now = frame_system::Pallet::<T>::block_number();
        let rule_id = Self::rule_id_of(&triggers, &actions, owner, now);
        // identical submissions from the same owner within one block collide
        ensure!(
          !Rules::<T>::contains_key(rule_id),
          Error::<T>::DuplicateRule
        );

        let collateral_slots = actions.first().map(|a| a.inputs.len()).unwrap_or(0);
        let rule = Rule {
          owner: owner.clone(),
          triggers,
          actions,
          status: RuleStatus::Inactive,
          collateral_amounts: BoundedVec::truncate_from(alloc::vec![
            BalanceOf::<T>::zero();
            collateral_slots
          ]),
          output_amounts: BoundedVec::default(),
          reward,
          created_at: now,
        };
        Rules::<T>::insert(rule_id, rule);
        RuleCount::<T>::mutate(|count| *count = count.saturating_add(1));
        if !reward.is_zero() {
          RewardContributions::<T>::insert(rule_id, owner, reward);
          T::AssetOps::pull(&AssetKind::Native, owner, &Self::account_id(), reward)?;
        }

        log::debug!(target: LOG_TARGET, "rule {:?} created by {:?}", rule_id, owner);
        Self::deposit_event(Event::RuleCreated {
          rule_id,
          owner: owner.clone(),
          reward,
        });
        Ok(rule_id)
      })
    }

    pub fn do_activate_rule(who: &T::AccountId, rule_id: RuleIdOf<T>) -> DispatchResult {
      Self::non_reentrant(|| {
        Self::transition(who, rule_id, RuleStatus::Inactive, RuleStatus::Active)?;
        Self::deposit_event(Event::RuleActivated { rule_id });
        Ok(())
      })
    }

    pub fn do_deactivate_rule(who: &T::AccountId, rule_id: RuleIdOf<T>) -> DispatchResult {
      Self::non_reentrant(|| {
        Self::transition(who, rule_id, RuleStatus::Active, RuleStatus::Inactive)?;
        Self::deposit_event(Event::RuleDeactivated { rule_id });
        Ok(())
      })
    }

    /// Runs every check `do_add_collateral` would, without moving anything.
    pub fn ensure_collateral_accepted(
      who: &T::AccountId,
      rule_id: RuleIdOf<T>,
      amounts: &[BalanceOf<T>],
    ) -> DispatchResult {
      ensure!(!OperationLock::<T>::get(), Error::<T>::Reentrancy);
      let rule = Self::owned_open_rule(who, rule_id)?;
      Self::checked_collateral_assets(&rule, amounts)?;
      for (counter, amount) in rule.collateral_amounts.iter().zip(amounts.iter()) {
        counter
          .checked_add(amount)
          .ok_or(ArithmeticError::Overflow)?;
      }
      Ok(())
    }

    pub fn do_add_collateral(
      who: &T::AccountId,
      rule_id: RuleIdOf<T>,
      amounts: &[BalanceOf<T>],
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut rule = Self::owned_open_rule(who, rule_id)?;
        let assets = Self::checked_collateral_assets(&rule, amounts)?;
        for (counter, amount) in rule.collateral_amounts.iter_mut().zip(amounts.iter()) {
          *counter = counter
            .checked_add(amount)
            .ok_or(ArithmeticError::Overflow)?;
        }
        Rules::<T>::insert(rule_id, rule);

        let custodian = Self::account_id();
        for (asset, amount) in assets.iter().zip(amounts.iter()) {
          if !amount.is_zero() {
            T::AssetOps::pull(asset, who, &custodian, *amount)?;
          }
        }
        Self::deposit_event(Event::CollateralAdded {
          rule_id,
          amounts: BoundedVec::truncate_from(amounts.to_vec()),
        });
        Ok(())
      })
    }

    pub fn do_reduce_collateral(
      who: &T::AccountId,
      rule_id: RuleIdOf<T>,
      amounts: &[BalanceOf<T>],
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut rule = Self::owned_open_rule(who, rule_id)?;
        let assets = Self::checked_collateral_assets(&rule, amounts)?;
        // every slot is checked before any of them is touched
        ensure!(
          rule
            .collateral_amounts
            .iter()
            .zip(amounts.iter())
            .all(|(held, requested)| requested <= held),
          Error::<T>::InsufficientCollateral
        );
        for (counter, amount) in rule.collateral_amounts.iter_mut().zip(amounts.iter()) {
          *counter -= *amount;
        }
        Rules::<T>::insert(rule_id, rule);

        let custodian = Self::account_id();
        for (asset, amount) in assets.iter().zip(amounts.iter()) {
          if !amount.is_zero() {
            T::AssetOps::push(asset, &custodian, who, *amount)?;
          }
        }
        Self::deposit_event(Event::CollateralReduced {
          rule_id,
          amounts: BoundedVec::truncate_from(amounts.to_vec()),
        });
        Ok(())
      })
    }

    pub fn do_increase_reward(
      who: &T::AccountId,
      rule_id: RuleIdOf<T>,
      amount: BalanceOf<T>,
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        ensure!(!amount.is_zero(), Error::<T>::AmountZero);
        Rules::<T>::try_mutate(rule_id, |maybe| -> DispatchResult {
          let rule = maybe.as_mut().ok_or(Error::<T>::RuleNotFound)?;
          ensure!(rule.status.is_open(), Error::<T>::InvalidRuleStatus);
          rule.reward = rule
            .reward
            .checked_add(&amount)
            .ok_or(ArithmeticError::Overflow)?;
          Ok(())
        })?;
        RewardContributions::<T>::try_mutate(rule_id, who, |contributed| -> DispatchResult {
          *contributed = contributed
            .checked_add(&amount)
            .ok_or(ArithmeticError::Overflow)?;
          Ok(())
        })?;
        T::AssetOps::pull(&AssetKind::Native, who, &Self::account_id(), amount)?;
        Self::deposit_event(Event::RewardIncreased {
          rule_id,
          contributor: who.clone(),
          amount,
        });
        Ok(())
      })
    }

    pub fn do_withdraw_reward_contribution(
      who: &T::AccountId,
      rule_id: RuleIdOf<T>,
    ) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut rule = Rules::<T>::get(rule_id).ok_or(Error::<T>::RuleNotFound)?;
        ensure!(
          !matches!(rule.status, RuleStatus::Executed | RuleStatus::Redeemed),
          Error::<T>::InvalidRuleStatus
        );
        let amount = RewardContributions::<T>::get(rule_id, who);
        ensure!(!amount.is_zero(), Error::<T>::NoContribution);
        rule.reward = rule.reward.saturating_sub(amount);
        Rules::<T>::insert(rule_id, rule);
        RewardContributions::<T>::remove(rule_id, who);
        T::AssetOps::push(&AssetKind::Native, &Self::account_id(), who, amount)?;
        Self::deposit_event(Event::RewardContributionWithdrawn {
          rule_id,
          contributor: who.clone(),
          amount,
        });
        Ok(())
      })
    }

    pub fn do_execute_rule(who: &T::AccountId, rule_id: RuleIdOf<T>) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut rule = Rules::<T>::get(rule_id).ok_or(Error::<T>::RuleNotFound)?;
        ensure!(
          rule.status == RuleStatus::Active,
          Error::<T>::InvalidRuleStatus
        );
        let (satisfied, observed_value) = Self::evaluate_triggers(&rule.triggers);
        ensure!(satisfied, Error::<T>::TriggerNotSatisfied);

        let outputs = Self::run_action_chain(rule_id, &rule, observed_value)?;
        let reward = rule.reward;
        rule.output_amounts = outputs.clone();
        rule.status = RuleStatus::Executed;
        rule.reward = Zero::zero();
        // contribution entries stay as a record; withdrawals are closed once executed
        Rules::<T>::insert(rule_id, rule);

        if !reward.is_zero() {
          T::AssetOps::push(&AssetKind::Native, &Self::account_id(), who, reward)?;
        }
        log::debug!(
          target: LOG_TARGET,
          "rule {:?} executed by {:?}, reward {:?}",
          rule_id,
          who,
          reward
        );
        Self::deposit_event(Event::RuleExecuted {
          rule_id,
          executor: who.clone(),
          reward,
          observed_value,
          outputs,
        });
        Ok(())
      })
    }

    pub fn do_cancel_rule(who: &T::AccountId, rule_id: RuleIdOf<T>) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut rule = Self::owned_open_rule(who, rule_id)?;
        let assets: Vec<AssetKind> = Self::collateral_assets(&rule).to_vec();
        let returned = rule.collateral_amounts.clone();
        for counter in rule.collateral_amounts.iter_mut() {
          *counter = Zero::zero();
        }
        rule.status = RuleStatus::Cancelled;
        let owner = rule.owner.clone();
        Rules::<T>::insert(rule_id, rule);

        let custodian = Self::account_id();
        for (asset, amount) in assets.iter().zip(returned.iter()) {
          if !amount.is_zero() {
            T::AssetOps::push(asset, &custodian, &owner, *amount)?;
          }
        }
        log::debug!(target: LOG_TARGET, "rule {:?} cancelled", rule_id);
        Self::deposit_event(Event::RuleCancelled { rule_id, returned });
        Ok(())
      })
    }

    pub fn do_redeem_balance(who: &T::AccountId, rule_id: RuleIdOf<T>) -> DispatchResult {
      Self::non_reentrant(|| {
        let mut rule = Rules::<T>::get(rule_id).ok_or(Error::<T>::RuleNotFound)?;
        ensure!(rule.owner == *who, Error::<T>::NotRuleOwner);
        ensure!(
          rule.status == RuleStatus::Executed,
          Error::<T>::InvalidRuleStatus
        );
        rule.status = RuleStatus::Redeemed;
        let assets: Vec<AssetKind> = Self::output_assets(&rule).to_vec();
        let outputs = rule.output_amounts.clone();
        Rules::<T>::insert(rule_id, rule);

        let custodian = Self::account_id();
        for (asset, amount) in assets.iter().zip(outputs.iter()) {
          if !amount.is_zero() {
            T::AssetOps::push(asset, &custodian, who, *amount)?;
          }
        }
        Self::deposit_event(Event::RuleRedeemed {
          rule_id,
          owner: who.clone(),
          outputs,
        });
        Ok(())
      })
    }

    /// Reject any mutating call that starts while another one is still running.
    fn non_reentrant<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
      ensure!(!OperationLock::<T>::get(), Error::<T>::Reentrancy);
      OperationLock::<T>::put(true);
      let result = f();
      OperationLock::<T>::kill();
      result
    }

    fn transition(
      who: &T::AccountId,
      rule_id: RuleIdOf<T>,
      from: RuleStatus,
      to: RuleStatus,
    ) -> DispatchResult {
      Rules::<T>::try_mutate(rule_id, |maybe| -> DispatchResult {
        let rule = maybe.as_mut().ok_or(Error::<T>::RuleNotFound)?;
        ensure!(rule.owner == *who, Error::<T>::NotRuleOwner);
        ensure!(rule.status == from, Error::<T>::InvalidRuleStatus);
        rule.status = to;
        Ok(())
      })?;
      log::trace!(target: LOG_TARGET, "rule {:?}: {:?} -> {:?}", rule_id, from, to);
      Ok(())
    }

    fn owned_open_rule(who: &T::AccountId, rule_id: RuleIdOf<T>) -> Result<RuleOf<T>, DispatchError> {
      let rule = Rules::<T>::get(rule_id).ok_or(Error::<T>::RuleNotFound)?;
      ensure!(rule.owner == *who, Error::<T>::NotRuleOwner);
      ensure!(rule.status.is_open(), Error::<T>::InvalidRuleStatus);
      Ok(rule)
    }

    fn checked_collateral_assets(
      rule: &RuleOf<T>,
      amounts: &[BalanceOf<T>],
    ) -> Result<Vec<AssetKind>, DispatchError> {
      let assets = Self::collateral_assets(rule);
      ensure!(
        assets.len() == amounts.len(),
        Error::<T>::CollateralLengthMismatch
      );
      for (asset, amount) in assets.iter().zip(amounts.iter()) {
        ensure!(
          asset.accepts_amount((*amount).saturated_into::<u128>()),
          Error::<T>::InvalidAssetAmount
        );
      }
      Ok(assets.to_vec())
    }

    fn validate_triggers(triggers: &TriggersOf<T>) -> DispatchResult {
      let list = T::TriggerWhitelist::get();
      for trigger in triggers.iter() {
        ensure!(
          T::Whitelist::is_whitelisted(&list, &trigger.evaluator),
          Error::<T>::NotWhitelisted
        );
        ensure!(T::Triggers::validate(trigger), Error::<T>::InvalidTrigger);
      }
      Ok(())
    }

    fn validate_actions(actions: &ActionsOf<T>) -> DispatchResult {
      let list = T::ActionWhitelist::get();
      for action in actions.iter() {
        ensure!(
          T::Whitelist::is_whitelisted(&list, &action.executor),
          Error::<T>::NotWhitelisted
        );
        ensure!(T::Actions::validate(action), Error::<T>::InvalidAction);
      }
      Ok(())
    }

    fn ensure_action_chain(actions: &ActionsOf<T>) -> DispatchResult {
      for pair in actions.windows(2) {
        ensure!(
          pair[0].outputs == pair[1].inputs,
          Error::<T>::BrokenActionChain
        );
      }
      Ok(())
    }

    /// Triggers are checked in order and the first failing one short-circuits. The observed
    /// value handed to the actions is the one reported by the last trigger checked.
    fn evaluate_triggers(triggers: &TriggersOf<T>) -> (bool, ObservedValue) {
      let mut observed_value: ObservedValue = 0;
      for trigger in triggers.iter() {
        let (valid, value) = T::Triggers::check(trigger);
        observed_value = value;
        if !valid {
          return (false, observed_value);
        }
      }
      (true, observed_value)
    }

    fn run_action_chain(
      rule_id: RuleIdOf<T>,
      rule: &RuleOf<T>,
      observed_value: ObservedValue,
    ) -> Result<AmountsOf<T>, DispatchError> {
      let custodian = Self::account_id();
      let mut amounts: Vec<BalanceOf<T>> = rule.collateral_amounts.to_vec();
      for (step, action) in rule.actions.iter().enumerate() {
        let spender = T::Actions::spender(&action.executor);
        for (asset, amount) in action.inputs.iter().zip(amounts.iter()) {
          if !amount.is_zero() {
            T::AssetOps::approve(asset, &custodian, &spender, *amount)?;
          }
        }
        let params = ActionRuntimeParams {
          observed_value,
          input_amounts: amounts,
        };
        let outputs = T::Actions::perform(&custodian, action, params)?;
        ensure!(
          outputs.len() == action.outputs.len(),
          Error::<T>::OutputLengthMismatch
        );
        log::trace!(
          target: LOG_TARGET,
          "rule {:?} step {} produced {:?}",
          rule_id,
          step,
          outputs
        );
        amounts = outputs;
      }
      Ok(BoundedVec::truncate_from(amounts))
    }
  }
}
