use bond_types::ErrorKind;
use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Input errors
    EmptyAccountList = 10,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyInitialized | Error::NotInitialized => ErrorKind::StateInvalid,
            Error::EmptyAccountList => ErrorKind::ZeroOrInvalidAmount,
        }
    }
}
