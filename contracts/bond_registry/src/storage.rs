use crate::error::Error;
use soroban_sdk::{contracttype, Address, Env, Vec};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Engine,
    Initialized,
    NextBondId,
    AllBonds,              // Vec<u32>, registration order
    ActiveBonds,           // Vec<u32>, decommissioned ids removed
    IssuerBonds(Address),  // issuer -> Vec<u32>
    BondIssuer(u32),       // bond_id -> issuer
}

pub struct Storage;

impl Storage {
    // Config
    pub fn get_engine(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Engine)
            .ok_or(Error::NotInitialized)
    }

    // Bond ID counter; ids start at 1
    pub fn next_bond_id(env: &Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::NextBondId)
            .unwrap_or(1)
    }

    pub fn advance_bond_id(env: &Env, current: u32) -> Result<(), Error> {
        let next = current.checked_add(1).ok_or(Error::ArithmeticOverflow)?;
        env.storage().instance().set(&DataKey::NextBondId, &next);
        Ok(())
    }

    // Bond index lists
    pub fn get_list(env: &Env, key: &DataKey) -> Vec<u32> {
        env.storage()
            .persistent()
            .get(key)
            .unwrap_or(Vec::new(env))
    }

    pub fn push_to_list(env: &Env, key: &DataKey, bond_id: u32) {
        let mut list = Self::get_list(env, key);
        list.push_back(bond_id);
        env.storage().persistent().set(key, &list);
    }

    /// Returns false when the id was not in the list
    pub fn remove_from_list(env: &Env, key: &DataKey, bond_id: u32) -> bool {
        let mut list = Self::get_list(env, key);
        match list.first_index_of(bond_id) {
            Some(index) => {
                list.remove(index);
                env.storage().persistent().set(key, &list);
                true
            }
            None => false,
        }
    }

    // Issuer of record
    pub fn get_issuer(env: &Env, bond_id: u32) -> Result<Address, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::BondIssuer(bond_id))
            .ok_or(Error::BondNotFound)
    }

    pub fn set_issuer(env: &Env, bond_id: u32, issuer: &Address) {
        env.storage()
            .persistent()
            .set(&DataKey::BondIssuer(bond_id), issuer);
    }
}
