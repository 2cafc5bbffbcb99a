use bond_types::{ErrorKind, IssueError};
use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-5)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,

    // ============================================
    // POLICY ERRORS (10-15)
    // ============================================
    /// Party is not on the whitelist
    NotWhitelisted = 10,
    /// Party has not passed KYC
    NotKyced = 11,

    // ============================================
    // LISTING ERRORS (20-29)
    // ============================================
    /// No listing was ever created for this bond
    ListingNotFound = 20,
    /// Listing is live; use modify_listing
    AlreadyListed = 21,
    /// Listing exists but has been delisted
    NotListed = 22,
    /// Listing flagged matured; no more sales
    BondMatured = 23,
    /// Bond has not reached maturity
    NotMatured = 24,
    /// Bond contract has no issue under this id
    BondNotFound = 25,
    /// Issue decommissioned; no more primary sales
    IssueInactive = 26,

    // ============================================
    // CAPACITY ERRORS (30-39)
    // ============================================
    /// Purchase would push the issue over its value cap
    CapExceeded = 30,
    /// Bond reserve cannot cover the coupon or principal
    InsufficientReserve = 31,

    // ============================================
    // BALANCE/ALLOWANCE ERRORS (40-49)
    // ============================================
    /// Seller holds fewer fractions than offered
    InsufficientFractionBalance = 40,
    /// Seller has not approved the marketplace for the fractions
    InsufficientFractionAllowance = 41,
    /// Buyer holds less stablecoin than the price
    InsufficientStablecoinBalance = 42,
    /// Buyer has not approved the spender (marketplace for exchanges, bond
    /// contract for purchases) for the price
    InsufficientStablecoinAllowance = 43,

    // ============================================
    // AMOUNT ERRORS (50-59)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 50,
    /// Price must be positive
    InvalidPrice = 51,
    /// Holder has nothing to redeem
    ZeroBalance = 52,
    /// Intermediate value overflowed i128
    ArithmeticOverflow = 53,

    // ============================================
    // OPERATIONAL ERRORS (60-69)
    // ============================================
    /// Contract is paused
    ContractPaused = 60,
    /// Bond contract failed for a reason with no marketplace counterpart
    BondContractFailed = 61,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotWhitelisted | Error::NotKyced => ErrorKind::PolicyDenied,
            Error::AlreadyInitialized
            | Error::NotInitialized
            | Error::AlreadyListed
            | Error::NotListed
            | Error::BondMatured
            | Error::NotMatured
            | Error::IssueInactive
            | Error::ContractPaused
            | Error::BondContractFailed => ErrorKind::StateInvalid,
            Error::ListingNotFound | Error::BondNotFound => ErrorKind::NotFound,
            Error::CapExceeded | Error::InsufficientReserve => ErrorKind::CapacityExceeded,
            Error::InsufficientFractionBalance
            | Error::InsufficientFractionAllowance
            | Error::InsufficientStablecoinBalance
            | Error::InsufficientStablecoinAllowance => ErrorKind::AuthorizationMissing,
            Error::InvalidAmount
            | Error::InvalidPrice
            | Error::ZeroBalance
            | Error::ArithmeticOverflow => ErrorKind::ZeroOrInvalidAmount,
        }
    }
}

/// Carry a bond contract failure over to the marketplace code with the same
/// meaning
impl From<IssueError> for Error {
    fn from(error: IssueError) -> Self {
        match error {
            IssueError::NotWhitelisted => Error::NotWhitelisted,
            IssueError::NotKyced => Error::NotKyced,
            IssueError::IssueNotFound => Error::BondNotFound,
            IssueError::IssueInactive => Error::IssueInactive,
            IssueError::NotMatured => Error::NotMatured,
            IssueError::AlreadyMatured => Error::BondMatured,
            IssueError::CapExceeded => Error::CapExceeded,
            IssueError::InsufficientReserve => Error::InsufficientReserve,
            IssueError::InvalidAmount => Error::InvalidAmount,
            IssueError::ZeroBalance => Error::ZeroBalance,
            IssueError::InsufficientAllowance => Error::InsufficientStablecoinAllowance,
            IssueError::InsufficientBalance => Error::InsufficientStablecoinBalance,
            IssueError::ArithmeticOverflow => Error::ArithmeticOverflow,
            IssueError::ContractPaused => Error::ContractPaused,
            IssueError::AlreadyInitialized
            | IssueError::NotInitialized
            | IssueError::IssueAlreadyExists
            | IssueError::AlreadyDecommissioned
            | IssueError::InvalidTerms
            | IssueError::DocumentNotSet => Error::BondContractFailed,
        }
    }
}
