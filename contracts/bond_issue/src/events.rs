use soroban_sdk::{contracttype, Address, BytesN, String};

#[contracttype]
#[derive(Clone, Debug)]
pub struct IssueCreatedEvent {
    pub bond_id: u32,
    pub issuer: Address,
    pub face_value: i128,
    pub coupon_rate_bps: u32,
    pub coupon_frequency: u32,
    pub maturity_timestamp: u64,
    pub max_bond_supply: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PurchasedEvent {
    pub bond_id: u32,
    pub buyer: Address,
    pub units: i128,
    pub cost: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct FractionsIssuedEvent {
    pub bond_id: u32,
    pub to: Address,
    pub units: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct CouponClaimedEvent {
    pub bond_id: u32,
    pub holder: Address,
    pub amount: i128,
    /// Accrual now runs from here
    pub checkpoint: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RedeemedEvent {
    pub bond_id: u32,
    pub holder: Address,
    pub units: i128,
    pub payout: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ReserveEvent {
    pub bond_id: u32,
    pub account: Address,
    pub amount: i128,
    pub reserve: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DecommissionedEvent {
    pub bond_id: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DocumentUpdatedEvent {
    pub bond_id: u32,
    pub uri: String,
    pub hash: BytesN<32>,
}
