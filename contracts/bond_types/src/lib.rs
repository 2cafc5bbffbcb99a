#![no_std]

//! Records shared by the fractional bond contracts.
//!
//! The engine, registry and marketplace all exchange these values across
//! contract boundaries, so they are defined once here and serialized with
//! `#[contracttype]`.

mod issue_error;

pub use issue_error::IssueError;

use soroban_sdk::{contracttype, Address, String};

/// 100% = 10,000 basis points
pub const BASIS_POINTS: i128 = 10_000;

/// Coupon frequency is expressed per 365-day year
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Highest coupon frequency that still leaves a period of at least one
/// second; anything above would make `coupon_period()` zero
pub const MAX_COUPON_FREQUENCY: u32 = SECONDS_PER_YEAR as u32;

/// Length of the rolling marketplace volume bucket
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Immutable terms of one bond series.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondTerms {
    /// Registry-assigned id, never reused
    pub bond_id: u32,
    pub name: String,
    pub symbol: String,
    /// Stablecoin units per whole bond
    pub face_value: i128,
    /// Paid on face value once per coupon period
    pub coupon_rate_bps: u32,
    /// Coupon payments per 365-day year
    pub coupon_frequency: u32,
    pub maturity_timestamp: u64,
    pub issuer: Address,
    /// Token contract backing purchases, coupons and principal
    pub stablecoin: Address,
    /// Fraction units making up one whole bond
    pub tokens_per_bond: i128,
    /// Stablecoin units per fraction unit at issuance
    pub token_price: i128,
    /// Value cap: face_value × maximum whole bonds outstanding
    pub max_bond_supply: i128,
}

impl BondTerms {
    /// Coupon period length in seconds (floor division). Zero only for a
    /// frequency above `MAX_COUPON_FREQUENCY`, which validation rejects.
    pub fn coupon_period(&self) -> u64 {
        SECONDS_PER_YEAR / (self.coupon_frequency as u64)
    }
}

/// Issuer-supplied parameters; the registry turns these into `BondTerms`
/// once it has assigned an id.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondParams {
    pub name: String,
    pub symbol: String,
    pub face_value: i128,
    pub coupon_rate_bps: u32,
    pub coupon_frequency: u32,
    pub maturity_timestamp: u64,
    pub issuer: Address,
    pub stablecoin: Address,
    pub tokens_per_bond: i128,
    pub token_price: i128,
    pub max_bond_supply: i128,
}

impl BondParams {
    pub fn into_terms(self, bond_id: u32) -> BondTerms {
        BondTerms {
            bond_id,
            name: self.name,
            symbol: self.symbol,
            face_value: self.face_value,
            coupon_rate_bps: self.coupon_rate_bps,
            coupon_frequency: self.coupon_frequency,
            maturity_timestamp: self.maturity_timestamp,
            issuer: self.issuer,
            stablecoin: self.stablecoin,
            tokens_per_bond: self.tokens_per_bond,
            token_price: self.token_price,
            max_bond_supply: self.max_bond_supply,
        }
    }
}

/// Mutable lifecycle and cash state of one bond series.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssueState {
    /// Cleared on decommission; primary sales stop
    pub active: bool,
    /// Cumulative stablecoin collected from primary sales
    pub total_raised: i128,
    /// Stablecoin held for this series (coupons and principal are paid from it)
    pub reserve: i128,
    pub creation_timestamp: u64,
    pub decommission_timestamp: Option<u64>,
    pub total_coupons_paid: i128,
    pub total_principal_redeemed: i128,
}

/// Terms and state together, as served to the registry and the UI.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondDetails {
    pub terms: BondTerms,
    pub state: IssueState,
    /// Outstanding fraction units
    pub total_fraction_supply: i128,
}

/// Coarse error taxonomy shared by every contract.
///
/// Callers switch on this first to tell a retryable condition (fund the
/// reserve, raise an allowance) from a permanently invalid request, then on
/// the contract-specific code for detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Whitelist or KYC predicate failed
    PolicyDenied,
    /// Wrong lifecycle state: inactive, not matured, already listed, paused...
    StateInvalid,
    /// Issuance cap or reserve insufficient
    CapacityExceeded,
    /// Missing stablecoin/token balance or allowance
    AuthorizationMissing,
    /// Unknown bond id, listing or holder
    NotFound,
    ZeroOrInvalidAmount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Env};

    fn params(env: &Env, frequency: u32) -> BondParams {
        BondParams {
            name: String::from_str(env, "Test Bond"),
            symbol: String::from_str(env, "TBOND"),
            face_value: 1_000_000_000,
            coupon_rate_bps: 500,
            coupon_frequency: frequency,
            maturity_timestamp: SECONDS_PER_YEAR,
            issuer: Address::generate(env),
            stablecoin: Address::generate(env),
            tokens_per_bond: 1_000,
            token_price: 950_000,
            max_bond_supply: 1_000_000_000_000,
        }
    }

    #[test]
    fn test_into_terms_keeps_params() {
        let env = Env::default();
        let p = params(&env, 2);
        let terms = p.clone().into_terms(7);

        assert_eq!(terms.bond_id, 7);
        assert_eq!(terms.face_value, p.face_value);
        assert_eq!(terms.issuer, p.issuer);
        assert_eq!(terms.max_bond_supply, p.max_bond_supply);
    }

    #[test]
    fn test_coupon_period_floors() {
        let env = Env::default();

        assert_eq!(params(&env, 2).into_terms(1).coupon_period(), 15_768_000);
        assert_eq!(params(&env, 12).into_terms(1).coupon_period(), 2_628_000);
        // 31_536_000 / 7 leaves a remainder that is dropped
        assert_eq!(params(&env, 7).into_terms(1).coupon_period(), 4_505_142);
    }

    #[test]
    fn test_max_frequency_keeps_a_nonzero_period() {
        let env = Env::default();

        let fastest = params(&env, MAX_COUPON_FREQUENCY).into_terms(1);
        assert_eq!(fastest.coupon_period(), 1);
        let too_fast = params(&env, MAX_COUPON_FREQUENCY + 1).into_terms(1);
        assert_eq!(too_fast.coupon_period(), 0);
    }

    #[test]
    fn test_issue_error_kinds() {
        assert_eq!(IssueError::CapExceeded.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(IssueError::DocumentNotSet.kind(), ErrorKind::NotFound);
        assert_eq!(
            IssueError::InsufficientAllowance.kind(),
            ErrorKind::AuthorizationMissing
        );
    }
}
