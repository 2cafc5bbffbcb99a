use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct BondRegisteredEvent {
    pub bond_id: u32,
    pub issuer: Address,
    pub maturity_timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BondDecommissionedEvent {
    pub bond_id: u32,
    pub issuer: Address,
    pub timestamp: u64,
}
