use soroban_sdk::{contracttype, Address, Vec};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WhitelistEvent {
    pub accounts: Vec<Address>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KycEvent {
    pub accounts: Vec<Address>,
    pub approved: bool,
}
