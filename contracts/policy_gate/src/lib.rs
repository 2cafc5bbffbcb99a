#![no_std]

//! Eligibility gate for bond holders.
//!
//! Keeps two independent per-account predicates, whitelist membership and
//! KYC approval. The bond engine and the fraction token query them at the
//! moment of every purchase or transfer; nothing downstream caches the
//! answer, so a revocation takes effect on the next action.

mod error;
mod events;
mod storage;

pub use error::Error;
use events::{KycEvent, WhitelistEvent};
use storage::DataKey;

use soroban_sdk::{contract, contractimpl, Address, Env, Symbol, Vec};

#[contract]
pub struct PolicyGate;

#[contractimpl]
impl PolicyGate {
    /// Initialize the gate
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);

        Ok(())
    }

    /// Hand administration to another account
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        let admin = Self::admin(&env)?;
        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &new_admin);
        Ok(())
    }

    /// Whitelist a batch of accounts
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `EmptyAccountList`: No accounts given
    pub fn add_to_whitelist(env: Env, accounts: Vec<Address>) -> Result<(), Error> {
        Self::admin(&env)?.require_auth();

        if accounts.is_empty() {
            return Err(Error::EmptyAccountList);
        }

        for account in accounts.iter() {
            env.storage()
                .persistent()
                .set(&DataKey::Whitelisted(account), &true);
        }

        env.events().publish(
            (Symbol::new(&env, "whitelist_added"),),
            WhitelistEvent { accounts },
        );

        Ok(())
    }

    /// Remove a batch of accounts from the whitelist
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `EmptyAccountList`: No accounts given
    pub fn remove_from_whitelist(env: Env, accounts: Vec<Address>) -> Result<(), Error> {
        Self::admin(&env)?.require_auth();

        if accounts.is_empty() {
            return Err(Error::EmptyAccountList);
        }

        for account in accounts.iter() {
            env.storage()
                .persistent()
                .remove(&DataKey::Whitelisted(account));
        }

        env.events().publish(
            (Symbol::new(&env, "whitelist_removed"),),
            WhitelistEvent { accounts },
        );

        Ok(())
    }

    /// Approve or revoke KYC for a batch of accounts
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `EmptyAccountList`: No accounts given
    pub fn set_kyc_status(env: Env, accounts: Vec<Address>, approved: bool) -> Result<(), Error> {
        Self::admin(&env)?.require_auth();

        if accounts.is_empty() {
            return Err(Error::EmptyAccountList);
        }

        for account in accounts.iter() {
            if approved {
                env.storage()
                    .persistent()
                    .set(&DataKey::KycApproved(account), &true);
            } else {
                env.storage()
                    .persistent()
                    .remove(&DataKey::KycApproved(account));
            }
        }

        env.events().publish(
            (Symbol::new(&env, "kyc_updated"),),
            KycEvent { accounts, approved },
        );

        Ok(())
    }

    pub fn is_whitelisted(env: Env, account: Address) -> bool {
        env.storage()
            .persistent()
            .get::<DataKey, bool>(&DataKey::Whitelisted(account))
            .unwrap_or(false)
    }

    pub fn is_kyc_approved(env: Env, account: Address) -> bool {
        env.storage()
            .persistent()
            .get::<DataKey, bool>(&DataKey::KycApproved(account))
            .unwrap_or(false)
    }

    /// True when the account is both whitelisted and KYC approved
    pub fn check(env: Env, account: Address) -> bool {
        Self::is_whitelisted(env.clone(), account.clone()) && Self::is_kyc_approved(env, account)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        Self::admin(&env)
    }

    fn admin(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)
    }
}
