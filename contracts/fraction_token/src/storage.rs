use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Balance {
    pub amount: i128,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Engine,
    PolicyGate,
    Initialized,
    Balance(u32, Address),            // (bond_id, holder)
    Supply(u32),                      // bond_id -> outstanding units
    Allowance(u32, Address, Address), // (bond_id, owner, spender)
}
