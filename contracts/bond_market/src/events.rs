use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct BondListedEvent {
    pub bond_id: u32,
    pub issuer: Address,
    pub listing_price: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ListingModifiedEvent {
    pub bond_id: u32,
    pub old_price: i128,
    pub new_price: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BondDelistedEvent {
    pub bond_id: u32,
    pub issuer: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BondPurchasedEvent {
    pub bond_id: u32,
    pub buyer: Address,
    pub bond_count: i128,
    pub units: i128,
    pub cost: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BondsExchangedEvent {
    pub bond_id: u32,
    pub from: Address,
    pub to: Address,
    pub fraction_amount: i128,
    pub stablecoin_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct MaturityUpdatedEvent {
    pub bond_id: u32,
    pub matured: bool,
}
