use soroban_sdk::{contracttype, Address, Vec};

/// Marketplace view of one bond issue
///
/// Delisting clears `is_listed` and the price but keeps the record, so
/// history stays queryable and the bond can be listed again.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listing {
    pub bond_id: u32,
    pub is_listed: bool,
    /// Engine contract holding the issue
    pub bond_contract: Address,
    pub issuer: Address,
    /// Advertised stablecoin price per whole bond
    pub listing_price: i128,
    pub listing_timestamp: u64,
    /// Advisory cache of the engine's maturity; the engine timestamp decides
    pub matured: bool,
}

/// Aggregate marketplace counters
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketStats {
    /// Listings currently live
    pub total_listed_bonds: u32,
    /// Stablecoin traded through the marketplace, all bonds
    pub total_trading_volume: i128,
}

/// Per-bond trading analytics
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondAnalytics {
    /// Stablecoin per whole bond in the most recent priced trade
    pub last_price: i128,
    pub volume_24h: i128,
    pub window_start: u64,
    pub total_volume: i128,
}

/// One current holder of one bond
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HolderInfo {
    /// When the holder's balance last went from zero to non-zero
    pub entry_timestamp: u64,
    /// Stablecoin this holder traded in this bond since entry
    pub volume: i128,
}

/// Per-account marketplace activity
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserStats {
    pub total_volume: i128,
    /// Every bond the account has held through the marketplace
    pub bonds: Vec<u32>,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Initialized,
    Paused,
    Stats,
    Listing(u32),              // bond_id -> Listing
    Analytics(u32),            // bond_id -> BondAnalytics
    Holders(u32),              // bond_id -> Vec<Address>
    HolderInfo(u32, Address),  // (bond_id, holder) -> HolderInfo
    UserStats(Address),        // account -> UserStats
}
