use bond_types::ErrorKind;
use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Policy errors
    NotWhitelisted = 3,
    NotKyced = 7,

    // Balance errors
    InsufficientBalance = 4,
    InvalidAmount = 5,
    InsufficientAllowance = 6,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyInitialized | Error::NotInitialized => ErrorKind::StateInvalid,
            Error::NotWhitelisted | Error::NotKyced => ErrorKind::PolicyDenied,
            Error::InsufficientBalance | Error::InsufficientAllowance => {
                ErrorKind::AuthorizationMissing
            }
            Error::InvalidAmount => ErrorKind::ZeroOrInvalidAmount,
        }
    }
}
