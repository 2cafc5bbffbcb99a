use crate::storage::CouponAccount;
use bond_types::{BondTerms, BASIS_POINTS};

/// Coupon owed on `balance` fraction units for one coupon period
///
/// Formula: balance × face_value × coupon_rate_bps / (10,000 × tokens_per_bond)
///
/// Example:
/// - balance: 150 units, face_value: 1,000, rate: 500 bps, tokens_per_bond: 1,000
/// - coupon: 150 × 1,000 × 500 / (10,000 × 1,000) = 7.5
pub fn coupon_per_period(terms: &BondTerms, balance: i128) -> Option<i128> {
    balance
        .checked_mul(terms.face_value)?
        .checked_mul(terms.coupon_rate_bps as i128)?
        .checked_div(BASIS_POINTS.checked_mul(terms.tokens_per_bond)?)
}

/// Principal paid for `balance` fraction units at maturity
///
/// Formula: balance × face_value / tokens_per_bond
pub fn principal(terms: &BondTerms, balance: i128) -> Option<i128> {
    balance
        .checked_mul(terms.face_value)?
        .checked_div(terms.tokens_per_bond)
}

/// Stablecoin cost of a primary purchase: units × token_price
pub fn purchase_cost(terms: &BondTerms, units: i128) -> Option<i128> {
    units.checked_mul(terms.token_price)
}

/// Whole coupon periods left between `now` and maturity; `None` for a
/// zero-length period
pub fn remaining_periods(terms: &BondTerms, now: u64) -> Option<u64> {
    if now >= terms.maturity_timestamp {
        return Some(0);
    }
    (terms.maturity_timestamp - now).checked_div(terms.coupon_period())
}

/// Stablecoin needed to pay principal on `supply` plus every coupon period
/// still to fall due on it
pub fn required_reserve(terms: &BondTerms, supply: i128, now: u64) -> Option<i128> {
    let coupons = coupon_per_period(terms, supply)?
        .checked_mul(remaining_periods(terms, now)? as i128)?;
    principal(terms, supply)?.checked_add(coupons)
}

/// Bring a holder's coupon account up to `now` given the balance held
/// since the last settlement.
///
/// Only whole periods are credited and the checkpoint advances by exactly
/// those periods, so a partly elapsed period keeps counting toward the next
/// boundary. Accrual stops at maturity. A holder with no account (first
/// acquisition) or no balance starts counting from `now`.
pub fn settle(
    terms: &BondTerms,
    account: Option<CouponAccount>,
    balance: i128,
    now: u64,
) -> Option<CouponAccount> {
    let mut account = match account {
        Some(account) => account,
        None => {
            return Some(CouponAccount {
                checkpoint: now,
                accrued: 0,
            })
        }
    };

    if balance == 0 {
        if now > account.checkpoint {
            account.checkpoint = now;
        }
        return Some(account);
    }

    let effective = now.min(terms.maturity_timestamp);
    if effective <= account.checkpoint {
        return Some(account);
    }

    let period = terms.coupon_period();
    let periods = (effective - account.checkpoint).checked_div(period)?;
    if periods == 0 {
        return Some(account);
    }

    let earned = coupon_per_period(terms, balance)?.checked_mul(periods as i128)?;
    account.accrued = account.accrued.checked_add(earned)?;
    account.checkpoint = account.checkpoint.checked_add(periods.checked_mul(period)?)?;

    Some(account)
}
