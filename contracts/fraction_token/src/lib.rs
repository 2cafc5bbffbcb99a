#![no_std]

mod error;
mod events;
mod storage;

pub use error::Error;
use events::{ApproveEvent, BurnEvent, MintEvent, TransferEvent};
use storage::{Balance, DataKey};

use soroban_sdk::{contract, contractimpl, log, vec, Address, Env, IntoVal, Symbol};

#[contract]
pub struct FractionToken;

#[contractimpl]
impl FractionToken {
    /// Initialize the token contract
    ///
    /// `engine` is the bond issue contract: the only minter/burner, and the
    /// contract notified before any balance moves between holders.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(
        env: Env,
        admin: Address,
        engine: Address,
        policy_gate: Address,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Engine, &engine);
        env.storage().instance().set(&DataKey::PolicyGate, &policy_gate);

        Ok(())
    }

    /// Mint fractions (engine only)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0 or supply overflow
    pub fn mint(env: Env, bond_id: u32, to: Address, amount: i128) -> Result<(), Error> {
        let engine = Self::engine(&env)?;
        engine.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let new_balance = Self::read_balance(&env, bond_id, &to)
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;
        let new_supply = Self::total_supply(env.clone(), bond_id)
            .checked_add(amount)
            .ok_or(Error::InvalidAmount)?;

        Self::write_balance(&env, bond_id, &to, new_balance);
        env.storage()
            .persistent()
            .set(&DataKey::Supply(bond_id), &new_supply);

        env.events().publish(
            (Symbol::new(&env, "mint"), bond_id),
            MintEvent {
                bond_id,
                to: to.clone(),
                amount,
            },
        );

        Ok(())
    }

    /// Burn fractions (engine only)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientBalance`: Not enough balance
    pub fn burn(env: Env, bond_id: u32, from: Address, amount: i128) -> Result<(), Error> {
        let engine = Self::engine(&env)?;
        engine.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let current_balance = Self::read_balance(&env, bond_id, &from);
        if current_balance < amount {
            return Err(Error::InsufficientBalance);
        }

        let supply = Self::total_supply(env.clone(), bond_id);

        Self::write_balance(&env, bond_id, &from, current_balance - amount);
        env.storage()
            .persistent()
            .set(&DataKey::Supply(bond_id), &(supply - amount));

        env.events().publish(
            (Symbol::new(&env, "burn"), bond_id),
            BurnEvent {
                bond_id,
                from: from.clone(),
                amount,
            },
        );

        Ok(())
    }

    /// Transfer fractions between holders
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `NotWhitelisted` / `NotKyced`: Either party fails the policy gate
    /// - `InsufficientBalance`: Not enough balance
    pub fn transfer(
        env: Env,
        bond_id: u32,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        from.require_auth();

        Self::move_balance(&env, bond_id, &from, &to, amount)
    }

    /// Let `spender` move up to `amount` of the owner's fractions
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount < 0
    pub fn approve(
        env: Env,
        bond_id: u32,
        owner: Address,
        spender: Address,
        amount: i128,
    ) -> Result<(), Error> {
        Self::engine(&env)?;

        if amount < 0 {
            return Err(Error::InvalidAmount);
        }

        owner.require_auth();

        let key = DataKey::Allowance(bond_id, owner.clone(), spender.clone());
        if amount == 0 {
            env.storage().persistent().remove(&key);
        } else {
            env.storage().persistent().set(&key, &amount);
        }

        env.events().publish(
            (Symbol::new(&env, "approve"), bond_id),
            ApproveEvent {
                bond_id,
                owner,
                spender,
                amount,
            },
        );

        Ok(())
    }

    /// Delegated transfer; consumes allowance
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientAllowance`: Spender not approved for amount
    /// - `NotWhitelisted` / `NotKyced`: Either party fails the policy gate
    /// - `InsufficientBalance`: Not enough balance
    pub fn transfer_from(
        env: Env,
        bond_id: u32,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();

        let allowance = Self::allowance(env.clone(), bond_id, from.clone(), spender.clone());
        if amount > 0 && allowance < amount {
            log!(
                &env,
                "fraction allowance too low. Required: {}, Available: {}",
                amount,
                allowance
            );
            return Err(Error::InsufficientAllowance);
        }

        Self::move_balance(&env, bond_id, &from, &to, amount)?;

        let key = DataKey::Allowance(bond_id, from, spender);
        let remaining = allowance - amount;
        if remaining == 0 {
            env.storage().persistent().remove(&key);
        } else {
            env.storage().persistent().set(&key, &remaining);
        }

        Ok(())
    }

    /// Get balance for a holder of a bond
    pub fn balance_of(env: Env, bond_id: u32, holder: Address) -> i128 {
        Self::read_balance(&env, bond_id, &holder)
    }

    /// Outstanding fraction units of a bond
    pub fn total_supply(env: Env, bond_id: u32) -> i128 {
        env.storage()
            .persistent()
            .get::<DataKey, i128>(&DataKey::Supply(bond_id))
            .unwrap_or(0)
    }

    pub fn allowance(env: Env, bond_id: u32, owner: Address, spender: Address) -> i128 {
        env.storage()
            .persistent()
            .get::<DataKey, i128>(&DataKey::Allowance(bond_id, owner, spender))
            .unwrap_or(0)
    }

    /// Whether the policy gate currently admits both parties to a transfer.
    /// Balances and amounts are not considered.
    pub fn can_transfer(env: Env, from: Address, to: Address) -> bool {
        Self::check_policy(&env, &from).is_ok() && Self::check_policy(&env, &to).is_ok()
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn engine(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Engine)
            .ok_or(Error::NotInitialized)
    }

    fn read_balance(env: &Env, bond_id: u32, holder: &Address) -> i128 {
        env.storage()
            .persistent()
            .get::<DataKey, Balance>(&DataKey::Balance(bond_id, holder.clone()))
            .unwrap_or(Balance { amount: 0 })
            .amount
    }

    fn write_balance(env: &Env, bond_id: u32, holder: &Address, amount: i128) {
        let key = DataKey::Balance(bond_id, holder.clone());
        if amount == 0 {
            env.storage().persistent().remove(&key);
        } else {
            env.storage().persistent().set(&key, &Balance { amount });
        }
    }

    fn check_policy(env: &Env, account: &Address) -> Result<(), Error> {
        let gate: Address = env
            .storage()
            .instance()
            .get(&DataKey::PolicyGate)
            .ok_or(Error::NotInitialized)?;

        let whitelisted: bool = env.invoke_contract(
            &gate,
            &Symbol::new(env, "is_whitelisted"),
            vec![env, account.to_val()],
        );
        if !whitelisted {
            return Err(Error::NotWhitelisted);
        }

        let kyced: bool = env.invoke_contract(
            &gate,
            &Symbol::new(env, "is_kyc_approved"),
            vec![env, account.to_val()],
        );
        if !kyced {
            return Err(Error::NotKyced);
        }

        Ok(())
    }

    /// Checks every precondition, lets the engine settle coupon accrual on
    /// the pre-transfer balances, then moves the balance.
    fn move_balance(
        env: &Env,
        bond_id: u32,
        from: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), Error> {
        let engine = Self::engine(env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        Self::check_policy(env, from)?;
        Self::check_policy(env, to)?;

        let from_balance = Self::read_balance(env, bond_id, from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance);
        }

        if from == to {
            return Ok(());
        }

        let to_balance = Self::read_balance(env, bond_id, to);
        let new_to_balance = to_balance.checked_add(amount).ok_or(Error::InvalidAmount)?;

        env.invoke_contract::<()>(
            &engine,
            &Symbol::new(env, "on_transfer"),
            vec![
                env,
                bond_id.into(),
                from.to_val(),
                from_balance.into_val(env),
                to.to_val(),
                to_balance.into_val(env),
            ],
        );

        Self::write_balance(env, bond_id, from, from_balance - amount);
        Self::write_balance(env, bond_id, to, new_to_balance);

        env.events().publish(
            (Symbol::new(env, "transfer"), bond_id),
            TransferEvent {
                bond_id,
                from: from.clone(),
                to: to.clone(),
                amount,
            },
        );

        Ok(())
    }
}
