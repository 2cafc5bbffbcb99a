use bond_types::ErrorKind;
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
    // TERMS VALIDATION ERRORS (10-19)
    // ============================================
    /// Maturity must be in the future
    InvalidMaturity = 10,
    /// At least one coupon per year
    InvalidCouponFrequency = 11,
    /// tokens_per_bond must be positive
    InvalidTokensPerBond = 12,
    /// face_value must be positive
    InvalidFaceValue = 13,
    /// token_price must be positive
    InvalidTokenPrice = 14,
    /// max_bond_supply must cover at least one whole bond
    InvalidSupplyCap = 15,

    // ============================================
    // DIRECTORY ERRORS (20-29)
    // ============================================
    /// No bond registered under this ID
    BondNotFound = 20,
    /// Active index past the end of the active list
    IndexOutOfRange = 21,
    /// Bond already removed from the active list
    AlreadyDecommissioned = 22,
    /// Bond ID counter exhausted
    ArithmeticOverflow = 23,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyInitialized | Error::NotInitialized | Error::AlreadyDecommissioned => {
                ErrorKind::StateInvalid
            }
            Error::BondNotFound | Error::IndexOutOfRange => ErrorKind::NotFound,
            Error::InvalidMaturity
            | Error::InvalidCouponFrequency
            | Error::InvalidTokensPerBond
            | Error::InvalidFaceValue
            | Error::InvalidTokenPrice
            | Error::InvalidSupplyCap
            | Error::ArithmeticOverflow => ErrorKind::ZeroOrInvalidAmount,
        }
    }
}
