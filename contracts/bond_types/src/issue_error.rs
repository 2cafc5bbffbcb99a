use crate::ErrorKind;
use soroban_sdk::contracterror;

/// Errors raised by the bond engine.
///
/// Lives here rather than in the engine crate so contracts that call the
/// engine can decode its failures by name. Codes are wire-stable; append new
/// variants inside their block only.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum IssueError {
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
    /// Account is not on the whitelist
    NotWhitelisted = 10,
    /// Account has not passed KYC
    NotKyced = 11,

    // ============================================
    // ISSUE MANAGEMENT ERRORS (20-29)
    // ============================================
    /// Issue not found
    IssueNotFound = 20,
    /// Issue already exists with this ID
    IssueAlreadyExists = 21,
    /// Issue has been decommissioned
    IssueInactive = 22,
    /// Issue not yet matured
    NotMatured = 23,
    /// Issue already matured; no more primary sales
    AlreadyMatured = 24,
    /// Decommission requested twice
    AlreadyDecommissioned = 25,
    /// Terms fail validation
    InvalidTerms = 26,
    /// No offering document attached to the issue
    DocumentNotSet = 27,

    // ============================================
    // CAPACITY ERRORS (30-39)
    // ============================================
    /// Purchase would push outstanding value over max_bond_supply
    CapExceeded = 30,
    /// Reserve cannot cover the payment
    InsufficientReserve = 31,

    // ============================================
    // AMOUNT/BALANCE ERRORS (40-49)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 40,
    /// Holder has no fractions to redeem
    ZeroBalance = 41,
    /// Buyer has not approved enough stablecoin to the engine
    InsufficientAllowance = 42,
    /// Buyer or funder does not hold enough stablecoin
    InsufficientBalance = 43,
    /// Intermediate value overflowed i128
    ArithmeticOverflow = 44,

    // ============================================
    // OPERATIONAL ERRORS (60-69)
    // ============================================
    /// Contract is paused
    ContractPaused = 60,
}

impl IssueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IssueError::NotWhitelisted | IssueError::NotKyced => ErrorKind::PolicyDenied,
            IssueError::AlreadyInitialized
            | IssueError::NotInitialized
            | IssueError::IssueAlreadyExists
            | IssueError::IssueInactive
            | IssueError::NotMatured
            | IssueError::AlreadyMatured
            | IssueError::AlreadyDecommissioned
            | IssueError::ContractPaused => ErrorKind::StateInvalid,
            IssueError::IssueNotFound | IssueError::DocumentNotSet => ErrorKind::NotFound,
            IssueError::CapExceeded | IssueError::InsufficientReserve => {
                ErrorKind::CapacityExceeded
            }
            IssueError::InsufficientAllowance | IssueError::InsufficientBalance => {
                ErrorKind::AuthorizationMissing
            }
            IssueError::InvalidTerms
            | IssueError::InvalidAmount
            | IssueError::ZeroBalance
            | IssueError::ArithmeticOverflow => ErrorKind::ZeroOrInvalidAmount,
        }
    }
}
