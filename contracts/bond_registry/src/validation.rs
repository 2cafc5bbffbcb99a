use crate::error::Error;
use bond_types::{BondParams, MAX_COUPON_FREQUENCY};
use soroban_sdk::Env;

pub struct Validator;

impl Validator {
    /// Reject terms no bond issue could honour. Checks run in a fixed
    /// order so callers always see the first offending field.
    pub fn validate_params(env: &Env, params: &BondParams) -> Result<(), Error> {
        if params.maturity_timestamp <= env.ledger().timestamp() {
            return Err(Error::InvalidMaturity);
        }

        // A zero-length period would make accrual divide by zero
        if params.coupon_frequency == 0 || params.coupon_frequency > MAX_COUPON_FREQUENCY {
            return Err(Error::InvalidCouponFrequency);
        }

        if params.tokens_per_bond <= 0 {
            return Err(Error::InvalidTokensPerBond);
        }

        if params.face_value <= 0 {
            return Err(Error::InvalidFaceValue);
        }

        if params.token_price <= 0 {
            return Err(Error::InvalidTokenPrice);
        }

        // Room for at least one whole bond
        if params.max_bond_supply < params.face_value {
            return Err(Error::InvalidSupplyCap);
        }

        Ok(())
    }
}
