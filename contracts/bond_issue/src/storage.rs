use soroban_sdk::{contracttype, Address, BytesN, String};

/// Coupon accrual for one (bond, holder) pair.
///
/// `checkpoint` only ever moves by whole coupon periods while the holder has
/// a balance; `accrued` carries coupons earned but not yet paid.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CouponAccount {
    pub checkpoint: u64,
    pub accrued: i128,
}

/// Offering document attached to an issue: where it lives and the keccak256
/// digest of its content
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondDocument {
    pub uri: String,
    pub hash: BytesN<32>,
    pub updated_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Registry,
    FractionToken,
    PolicyGate,
    Initialized,
    Paused,
    Terms(u32),                 // bond_id -> BondTerms
    State(u32),                 // bond_id -> IssueState
    Coupon(u32, Address),       // (bond_id, holder) -> CouponAccount
    Document(u32),              // bond_id -> BondDocument
}
