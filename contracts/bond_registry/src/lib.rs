#![no_std]

//! Directory of bond issues.
//!
//! Assigns monotonically increasing bond ids, opens each issue on the bond
//! engine and keeps three indexes: every id ever registered, the ids still
//! active, and the ids per issuer. Decommissioning drops an id from the
//! active index only.

mod error;
mod events;
mod storage;
mod validation;

pub use error::Error;
use events::{BondDecommissionedEvent, BondRegisteredEvent};
use storage::{DataKey, Storage};
use validation::Validator;

use bond_types::{BondDetails, BondParams};
use soroban_sdk::{contract, contractimpl, vec, Address, Env, IntoVal, Symbol, Vec};

#[contract]
pub struct BondRegistry;

#[contractimpl]
impl BondRegistry {
    /// Initialize the registry
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address, engine: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Engine, &engine);

        Ok(())
    }

    /// Register and open a new bond issue; returns its id
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidMaturity` .. `InvalidSupplyCap`: Terms fail validation
    pub fn create_bond_issue(env: Env, params: BondParams) -> Result<u32, Error> {
        let engine = Storage::get_engine(&env)?;

        params.issuer.require_auth();
        Validator::validate_params(&env, &params)?;

        let bond_id = Storage::next_bond_id(&env);
        Storage::advance_bond_id(&env, bond_id)?;

        let terms = params.into_terms(bond_id);
        env.invoke_contract::<()>(
            &engine,
            &Symbol::new(&env, "create_issue"),
            vec![&env, terms.clone().into_val(&env)],
        );

        Storage::set_issuer(&env, bond_id, &terms.issuer);
        Storage::push_to_list(&env, &DataKey::AllBonds, bond_id);
        Storage::push_to_list(&env, &DataKey::ActiveBonds, bond_id);
        Storage::push_to_list(&env, &DataKey::IssuerBonds(terms.issuer.clone()), bond_id);

        env.events().publish(
            (Symbol::new(&env, "bond_registered"), bond_id),
            BondRegisteredEvent {
                bond_id,
                issuer: terms.issuer,
                maturity_timestamp: terms.maturity_timestamp,
            },
        );

        Ok(bond_id)
    }

    /// Close a bond to primary sales and drop it from the active index
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `BondNotFound`: Unknown bond id
    /// - `AlreadyDecommissioned`: Bond no longer active
    pub fn decommission_bond(env: Env, bond_id: u32) -> Result<(), Error> {
        let engine = Storage::get_engine(&env)?;

        let issuer = Storage::get_issuer(&env, bond_id)?;
        issuer.require_auth();

        if !Storage::remove_from_list(&env, &DataKey::ActiveBonds, bond_id) {
            return Err(Error::AlreadyDecommissioned);
        }

        env.invoke_contract::<()>(
            &engine,
            &Symbol::new(&env, "decommission"),
            vec![&env, bond_id.into()],
        );

        env.events().publish(
            (Symbol::new(&env, "bond_decommissioned"), bond_id),
            BondDecommissionedEvent {
                bond_id,
                issuer,
                timestamp: env.ledger().timestamp(),
            },
        );

        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Details of the `index`-th active bond, in registration order
    pub fn get_active_bond_details(env: Env, index: u32) -> Result<BondDetails, Error> {
        let bond_id = Storage::get_list(&env, &DataKey::ActiveBonds)
            .get(index)
            .ok_or(Error::IndexOutOfRange)?;
        Self::fetch_details(&env, bond_id)
    }

    pub fn get_bond_details(env: Env, bond_id: u32) -> Result<BondDetails, Error> {
        Storage::get_issuer(&env, bond_id)?;
        Self::fetch_details(&env, bond_id)
    }

    pub fn get_bonds_by_issuer(env: Env, issuer: Address) -> Vec<u32> {
        Storage::get_list(&env, &DataKey::IssuerBonds(issuer))
    }

    pub fn is_active(env: Env, bond_id: u32) -> bool {
        Storage::get_list(&env, &DataKey::ActiveBonds).contains(bond_id)
    }

    pub fn active_bond_count(env: Env) -> u32 {
        Storage::get_list(&env, &DataKey::ActiveBonds).len()
    }

    /// Every bond ever registered, decommissioned ones included
    pub fn bond_count(env: Env) -> u32 {
        Storage::get_list(&env, &DataKey::AllBonds).len()
    }

    pub fn get_all_bond_ids(env: Env) -> Vec<u32> {
        Storage::get_list(&env, &DataKey::AllBonds)
    }

    /// Engine contract holding every registered issue
    pub fn bond_contract(env: Env) -> Result<Address, Error> {
        Storage::get_engine(&env)
    }

    fn fetch_details(env: &Env, bond_id: u32) -> Result<BondDetails, Error> {
        let engine = Storage::get_engine(env)?;
        Ok(env.invoke_contract(
            &engine,
            &Symbol::new(env, "get_details"),
            vec![env, bond_id.into()],
        ))
    }
}
