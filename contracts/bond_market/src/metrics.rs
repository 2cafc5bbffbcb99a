use crate::storage::BondAnalytics;
use bond_types::SECONDS_PER_DAY;
use soroban_sdk::{contracttype, Address};

/// Trading snapshot of one bond
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BondMarketMetrics {
    pub last_price: i128,
    pub volume_24h: i128,
    pub number_of_holders: u32,
    /// Mean seconds the current holders have held their position
    pub average_holding_time: u64,
    pub total_value_locked: i128,
}

/// Portfolio snapshot of one account
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserMetrics {
    /// Bonds with a non-zero balance
    pub bonds_held: u32,
    pub total_volume: i128,
    /// Held bonds whose listing is live and not matured
    pub active_positions: u32,
}

/// One line of an account's portfolio
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Holding {
    pub bond_id: u32,
    pub bond_contract: Address,
    pub balance: i128,
    pub listing_price: i128,
    pub matured: bool,
}

/// Start a fresh 24h bucket once the current one is a day old
pub fn roll_window(analytics: &mut BondAnalytics, now: u64) {
    if now >= analytics.window_start.saturating_add(SECONDS_PER_DAY) {
        analytics.volume_24h = 0;
        analytics.window_start = now;
    }
}

/// Volume of the current bucket as seen at `now`, without writing it back
pub fn volume_24h(analytics: &BondAnalytics, now: u64) -> i128 {
    if now >= analytics.window_start.saturating_add(SECONDS_PER_DAY) {
        0
    } else {
        analytics.volume_24h
    }
}

/// Record a trade of `volume` stablecoin
///
/// `price` is per whole bond; pass `None` for unpriced moves.
pub fn record_trade(
    analytics: &mut BondAnalytics,
    volume: i128,
    price: Option<i128>,
    now: u64,
) -> Option<()> {
    roll_window(analytics, now);
    analytics.volume_24h = analytics.volume_24h.checked_add(volume)?;
    analytics.total_volume = analytics.total_volume.checked_add(volume)?;
    if let Some(price) = price {
        analytics.last_price = price;
    }
    Some(())
}

/// Stablecoin per whole bond implied by paying `amount` for `units`
///
/// Formula: amount × tokens_per_bond / units
///
/// Example:
/// - 50 units for 47.5 with 1,000 units per bond
/// - price: 47.5 × 1,000 / 50 = 950
pub fn price_per_bond(amount: i128, units: i128, tokens_per_bond: i128) -> Option<i128> {
    amount.checked_mul(tokens_per_bond)?.checked_div(units)
}

/// Face value of the outstanding supply: supply × face_value / tokens_per_bond
pub fn total_value_locked(supply: i128, face_value: i128, tokens_per_bond: i128) -> Option<i128> {
    supply.checked_mul(face_value)?.checked_div(tokens_per_bond)
}

/// Mean of `now - entry` over every entry timestamp; 0 with no holders
pub fn average_holding_time<I>(entries: I, now: u64) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut total: u64 = 0;
    let mut count: u64 = 0;
    for entry in entries {
        total = total.saturating_add(now.saturating_sub(entry));
        count += 1;
    }

    if count == 0 {
        0
    } else {
        total / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USD: i128 = 1_000_000;

    fn analytics(window_start: u64, volume_24h: i128) -> BondAnalytics {
        BondAnalytics {
            last_price: 0,
            volume_24h,
            window_start,
            total_volume: volume_24h,
        }
    }

    #[test]
    fn test_window_keeps_volume_within_a_day() {
        let mut a = analytics(1_000, 50 * USD);

        record_trade(&mut a, 10 * USD, Some(950 * USD), 1_000 + SECONDS_PER_DAY - 1).unwrap();
        assert_eq!(a.volume_24h, 60 * USD);
        assert_eq!(a.window_start, 1_000);
        assert_eq!(a.total_volume, 60 * USD);
        assert_eq!(a.last_price, 950 * USD);
    }

    #[test]
    fn test_window_resets_after_a_day() {
        let mut a = analytics(1_000, 50 * USD);
        let later = 1_000 + SECONDS_PER_DAY;

        assert_eq!(volume_24h(&a, later - 1), 50 * USD);
        assert_eq!(volume_24h(&a, later), 0);

        record_trade(&mut a, 10 * USD, None, later).unwrap();
        assert_eq!(a.volume_24h, 10 * USD);
        assert_eq!(a.window_start, later);
        assert_eq!(a.total_volume, 60 * USD);
        // Unpriced trade leaves the last price alone
        assert_eq!(a.last_price, 0);
    }

    #[test]
    fn test_price_per_bond() {
        // 50 units for 47.5
        let price = price_per_bond(47_500_000, 50, 1_000).unwrap();
        assert_eq!(price, 950 * USD);
    }

    #[test]
    fn test_total_value_locked() {
        let tvl = total_value_locked(2_500, 1_000 * USD, 1_000).unwrap();
        assert_eq!(tvl, 2_500 * USD);
        assert_eq!(total_value_locked(i128::MAX, 2, 1), None);
    }

    #[test]
    fn test_average_holding_time() {
        assert_eq!(average_holding_time([0u64; 0], 500), 0);
        assert_eq!(average_holding_time([100, 300], 500), 300);
        // Entries in the future count as zero
        assert_eq!(average_holding_time([600], 500), 0);
    }
}
