#![no_std]

mod error;
mod events;
mod metrics;
mod storage;

pub use error::Error;
pub use metrics::{BondMarketMetrics, Holding, UserMetrics};
pub use storage::{BondAnalytics, HolderInfo, Listing, MarketStats, UserStats};
use events::*;
use storage::DataKey;

use bond_types::{BondDetails, BondTerms, IssueError};
use soroban_sdk::{
    contract, contractimpl, log, token, vec, Address, Env, IntoVal, Symbol, TryFromVal, Val,
    Vec,
};

#[contract]
pub struct BondMarket;

#[contractimpl]
impl BondMarket {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the marketplace
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Paused, &false);
        env.storage().instance().set(
            &DataKey::Stats,
            &MarketStats {
                total_listed_bonds: 0,
                total_trading_volume: 0,
            },
        );

        Ok(())
    }

    /// Pause contract (emergency)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn pause(env: Env) -> Result<(), Error> {
        Self::admin(&env)?.require_auth();

        env.storage().instance().set(&DataKey::Paused, &true);
        Ok(())
    }

    /// Unpause contract
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn unpause(env: Env) -> Result<(), Error> {
        Self::admin(&env)?.require_auth();

        env.storage().instance().set(&DataKey::Paused, &false);
        Ok(())
    }

    // ============================================
    // LISTINGS
    // ============================================

    /// List a bond held by `bond_contract` at `price` per whole bond
    ///
    /// The issuer recorded on the bond must authorize. A delisted bond may
    /// be listed again; a live listing must go through `modify_listing`.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidPrice`: price must be positive
    /// - `BondNotFound`: Bond contract has no such issue
    /// - `AlreadyListed`: Listing is live
    pub fn list_bond(
        env: Env,
        bond_id: u32,
        bond_contract: Address,
        price: i128,
    ) -> Result<(), Error> {
        Self::check_initialized(&env)?;
        Self::check_not_paused(&env)?;

        if price <= 0 {
            return Err(Error::InvalidPrice);
        }

        let terms = Self::bond_terms(&env, &bond_contract, bond_id)?;
        terms.issuer.require_auth();

        let previous = Self::read_listing(&env, bond_id);
        if let Some(ref listing) = previous {
            if listing.is_listed {
                return Err(Error::AlreadyListed);
            }
        }

        let listing = Listing {
            bond_id,
            is_listed: true,
            bond_contract,
            issuer: terms.issuer.clone(),
            listing_price: price,
            listing_timestamp: env.ledger().timestamp(),
            matured: previous.map(|listing| listing.matured).unwrap_or(false),
        };
        Self::write_listing(&env, &listing);

        let mut stats = Self::get_market_stats(env.clone());
        stats.total_listed_bonds += 1;
        env.storage().instance().set(&DataKey::Stats, &stats);

        env.events().publish(
            (Symbol::new(&env, "bond_listed"), bond_id),
            BondListedEvent {
                bond_id,
                issuer: terms.issuer,
                listing_price: price,
            },
        );

        Ok(())
    }

    /// Change the price of a live listing
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidPrice`: price must be positive
    /// - `ListingNotFound`: Bond never listed
    /// - `NotListed`: Listing has been delisted
    pub fn modify_listing(env: Env, bond_id: u32, new_price: i128) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if new_price <= 0 {
            return Err(Error::InvalidPrice);
        }

        let mut listing = Self::live_listing(&env, bond_id)?;
        listing.issuer.require_auth();

        let old_price = listing.listing_price;
        listing.listing_price = new_price;
        Self::write_listing(&env, &listing);

        env.events().publish(
            (Symbol::new(&env, "listing_modified"), bond_id),
            ListingModifiedEvent {
                bond_id,
                old_price,
                new_price,
            },
        );

        Ok(())
    }

    /// Take a listing off the market; the record is kept
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond never listed
    /// - `NotListed`: Already delisted
    pub fn delist_bond(env: Env, bond_id: u32) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        let mut listing = Self::live_listing(&env, bond_id)?;
        listing.issuer.require_auth();

        listing.is_listed = false;
        listing.listing_price = 0;
        Self::write_listing(&env, &listing);

        let mut stats = Self::get_market_stats(env.clone());
        stats.total_listed_bonds = stats.total_listed_bonds.saturating_sub(1);
        env.storage().instance().set(&DataKey::Stats, &stats);

        env.events().publish(
            (Symbol::new(&env, "bond_delisted"), bond_id),
            BondDelistedEvent {
                bond_id,
                issuer: listing.issuer,
            },
        );

        Ok(())
    }

    /// Flag a listing matured or not (admin only)
    ///
    /// Advisory: redemption is always decided by the bond's own maturity
    /// timestamp.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond never listed
    pub fn update_bond_maturity(env: Env, bond_id: u32, matured: bool) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        Self::admin(&env)?.require_auth();

        let mut listing = Self::load_listing(&env, bond_id)?;
        listing.matured = matured;
        Self::write_listing(&env, &listing);

        env.events().publish(
            (Symbol::new(&env, "maturity_updated"), bond_id),
            MaturityUpdatedEvent { bond_id, matured },
        );

        Ok(())
    }

    // ============================================
    // TRADING
    // ============================================

    /// Buy `bond_count` whole bonds from the issue at its issue price;
    /// returns the stablecoin cost
    ///
    /// The buyer approves the bond contract (not the marketplace) for the
    /// cost; the bond contract collects payment and mints the fractions.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: bond_count must be positive
    /// - `ListingNotFound` / `NotListed`: Bond not on sale here
    /// - `BondMatured`: Listing flagged matured, or the bond has matured
    /// - `IssueInactive`: Issue decommissioned
    /// - `NotWhitelisted` / `NotKyced`: Buyer fails the policy gate
    /// - `CapExceeded`: Purchase would exceed the issue's value cap
    /// - `InsufficientStablecoinAllowance` / `InsufficientStablecoinBalance`:
    ///   Buyer cannot pay the bond contract
    pub fn purchase_bond(
        env: Env,
        bond_id: u32,
        buyer: Address,
        bond_count: i128,
    ) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;

        if bond_count <= 0 {
            return Err(Error::InvalidAmount);
        }

        buyer.require_auth();

        let listing = Self::live_listing(&env, bond_id)?;
        if listing.matured {
            return Err(Error::BondMatured);
        }

        let terms = Self::bond_terms(&env, &listing.bond_contract, bond_id)?;
        let units = bond_count
            .checked_mul(terms.tokens_per_bond)
            .ok_or(Error::ArithmeticOverflow)?;

        let cost: i128 = Self::call_bond(
            &env,
            &listing.bond_contract,
            "purchase",
            vec![&env, bond_id.into(), buyer.to_val(), units.into_val(&env)],
        )?;

        let now = env.ledger().timestamp();
        let fractions = Self::fraction_token(&env, &listing.bond_contract);
        Self::sync_holder(&env, bond_id, &fractions, &buyer, now);

        let price = metrics::price_per_bond(cost, units, terms.tokens_per_bond)
            .ok_or(Error::ArithmeticOverflow)?;
        Self::record_volume(&env, bond_id, cost, Some(price), now)?;
        Self::credit_account(&env, bond_id, &buyer, cost)?;

        env.events().publish(
            (Symbol::new(&env, "bond_purchased"), bond_id, buyer.clone()),
            BondPurchasedEvent {
                bond_id,
                buyer,
                bond_count,
                units,
                cost,
            },
        );

        Ok(cost)
    }

    /// Move `fraction_amount` from `from` to `to` and, when
    /// `stablecoin_amount > 0`, the price from `to` back to `from`
    ///
    /// Both legs run through allowances held by the marketplace. A zero
    /// price makes this a gift that touches no stablecoin.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: fraction_amount <= 0 or stablecoin_amount < 0
    /// - `ListingNotFound`: Bond unknown to the marketplace
    /// - `NotWhitelisted` / `NotKyced`: Either party fails the policy gate
    /// - `InsufficientFractionBalance` / `InsufficientFractionAllowance`
    /// - `InsufficientStablecoinBalance` / `InsufficientStablecoinAllowance`
    pub fn exchange_bonds(
        env: Env,
        bond_id: u32,
        from: Address,
        to: Address,
        fraction_amount: i128,
        stablecoin_amount: i128,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if fraction_amount <= 0 || stablecoin_amount < 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();
        if stablecoin_amount > 0 {
            to.require_auth();
        }

        let listing = Self::load_listing(&env, bond_id)?;
        let terms = Self::bond_terms(&env, &listing.bond_contract, bond_id)?;
        let fractions = Self::fraction_token(&env, &listing.bond_contract);
        let this = env.current_contract_address();

        let gate: Address = env.invoke_contract(
            &listing.bond_contract,
            &Symbol::new(&env, "policy_gate"),
            Vec::new(&env),
        );
        Self::check_policy(&env, &gate, &from)?;
        Self::check_policy(&env, &gate, &to)?;

        let seller_balance = Self::fraction_balance(&env, &fractions, bond_id, &from);
        if seller_balance < fraction_amount {
            return Err(Error::InsufficientFractionBalance);
        }
        let seller_allowance: i128 = env.invoke_contract(
            &fractions,
            &Symbol::new(&env, "allowance"),
            vec![&env, bond_id.into(), from.to_val(), this.to_val()],
        );
        if seller_allowance < fraction_amount {
            log!(
                &env,
                "fraction allowance too low. Required: {}, Available: {}",
                fraction_amount,
                seller_allowance
            );
            return Err(Error::InsufficientFractionAllowance);
        }

        let stablecoin = token::Client::new(&env, &terms.stablecoin);
        if stablecoin_amount > 0 {
            if stablecoin.balance(&to) < stablecoin_amount {
                return Err(Error::InsufficientStablecoinBalance);
            }
            let allowance = stablecoin.allowance(&to, &this);
            if allowance < stablecoin_amount {
                log!(
                    &env,
                    "stablecoin allowance too low. Required: {}, Available: {}",
                    stablecoin_amount,
                    allowance
                );
                return Err(Error::InsufficientStablecoinAllowance);
            }
        }

        env.invoke_contract::<()>(
            &fractions,
            &Symbol::new(&env, "transfer_from"),
            vec![
                &env,
                bond_id.into(),
                this.to_val(),
                from.to_val(),
                to.to_val(),
                fraction_amount.into_val(&env),
            ],
        );
        if stablecoin_amount > 0 {
            stablecoin.transfer_from(&this, &to, &from, &stablecoin_amount);
        }

        let now = env.ledger().timestamp();
        Self::sync_holder(&env, bond_id, &fractions, &to, now);
        Self::sync_holder(&env, bond_id, &fractions, &from, now);

        if stablecoin_amount > 0 {
            let price =
                metrics::price_per_bond(stablecoin_amount, fraction_amount, terms.tokens_per_bond)
                    .ok_or(Error::ArithmeticOverflow)?;
            Self::record_volume(&env, bond_id, stablecoin_amount, Some(price), now)?;
            Self::credit_account(&env, bond_id, &from, stablecoin_amount)?;
            Self::credit_account(&env, bond_id, &to, stablecoin_amount)?;
        }

        env.events().publish(
            (Symbol::new(&env, "bonds_exchanged"), bond_id),
            BondsExchangedEvent {
                bond_id,
                from,
                to,
                fraction_amount,
                stablecoin_amount,
            },
        );

        Ok(())
    }

    // ============================================
    // HOLDER PAYOUTS
    // ============================================

    /// Claim the holder's accrued coupon through the bond contract; returns
    /// the amount paid
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond unknown to the marketplace
    /// - `InsufficientReserve`: Bond reserve cannot cover the coupon
    pub fn claim_coupon(env: Env, bond_id: u32, holder: Address) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        holder.require_auth();

        let listing = Self::load_listing(&env, bond_id)?;
        let paid = Self::claim_through(&env, &listing, &holder)?;

        let fractions = Self::fraction_token(&env, &listing.bond_contract);
        Self::sync_holder(&env, bond_id, &fractions, &holder, env.ledger().timestamp());

        Ok(paid)
    }

    /// Redeem the holder's whole position at maturity; returns the
    /// principal paid
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond unknown to the marketplace
    /// - `NotMatured`: Bond contract reports the bond has not matured
    /// - `ZeroBalance`: Holder has nothing to redeem
    /// - `InsufficientReserve`: Bond reserve cannot cover the principal
    pub fn redeem_bond(env: Env, bond_id: u32, holder: Address) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        holder.require_auth();

        let mut listing = Self::load_listing(&env, bond_id)?;
        Self::check_matured(&env, &mut listing)?;

        let fractions = Self::fraction_token(&env, &listing.bond_contract);
        if Self::fraction_balance(&env, &fractions, bond_id, &holder) == 0 {
            return Err(Error::ZeroBalance);
        }

        let payout = Self::redeem_through(&env, &listing, &holder)?;
        Self::sync_holder(&env, bond_id, &fractions, &holder, env.ledger().timestamp());

        Ok(payout)
    }

    /// Claim coupons for many holders at once (admin only); returns the
    /// total paid
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond unknown to the marketplace
    pub fn multi_claim_coupons(
        env: Env,
        bond_id: u32,
        holders: Vec<Address>,
    ) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        Self::admin(&env)?.require_auth();

        let listing = Self::load_listing(&env, bond_id)?;

        let mut total: i128 = 0;
        for holder in holders.iter() {
            let paid = Self::claim_through(&env, &listing, &holder)?;
            total = total.checked_add(paid).ok_or(Error::ArithmeticOverflow)?;
        }

        Ok(total)
    }

    /// Redeem many holders at once (admin only); holders with nothing left
    /// are skipped. Returns the total principal paid.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond unknown to the marketplace
    /// - `NotMatured`: Bond contract reports the bond has not matured
    pub fn multi_redeem_bonds(
        env: Env,
        bond_id: u32,
        holders: Vec<Address>,
    ) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        Self::admin(&env)?.require_auth();

        let mut listing = Self::load_listing(&env, bond_id)?;
        Self::check_matured(&env, &mut listing)?;

        let fractions = Self::fraction_token(&env, &listing.bond_contract);
        let now = env.ledger().timestamp();

        let mut total: i128 = 0;
        for holder in holders.iter() {
            if Self::fraction_balance(&env, &fractions, bond_id, &holder) == 0 {
                continue;
            }
            let payout = Self::redeem_through(&env, &listing, &holder)?;
            total = total.checked_add(payout).ok_or(Error::ArithmeticOverflow)?;
            Self::sync_holder(&env, bond_id, &fractions, &holder, now);
        }

        Ok(total)
    }

    /// Re-read the balances of `accounts` and bring the holder list in line;
    /// returns the number of tracked holders afterwards
    ///
    /// Fraction transfers made directly on the token bypass the marketplace.
    /// Anyone may call this to pick up such moves.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `ListingNotFound`: Bond unknown to the marketplace
    pub fn refresh_holders(env: Env, bond_id: u32, accounts: Vec<Address>) -> Result<u32, Error> {
        Self::check_not_paused(&env)?;

        let listing = Self::load_listing(&env, bond_id)?;
        let fractions = Self::fraction_token(&env, &listing.bond_contract);
        let now = env.ledger().timestamp();

        for account in accounts.iter() {
            Self::sync_holder(&env, bond_id, &fractions, &account, now);
        }

        Ok(Self::read_holders(&env, bond_id).len())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_listing(env: Env, bond_id: u32) -> Result<Listing, Error> {
        Self::load_listing(&env, bond_id)
    }

    pub fn get_market_stats(env: Env) -> MarketStats {
        env.storage()
            .instance()
            .get(&DataKey::Stats)
            .unwrap_or(MarketStats {
                total_listed_bonds: 0,
                total_trading_volume: 0,
            })
    }

    pub fn get_bond_analytics(env: Env, bond_id: u32) -> BondAnalytics {
        Self::read_analytics(&env, bond_id)
    }

    /// Price, volume, holder and value figures for one bond
    ///
    /// Holders are tracked through marketplace operations. Tracked holders
    /// who have since emptied their balance elsewhere are left out; accounts
    /// that received fractions straight from the token only count after
    /// `refresh_holders`.
    ///
    /// # Errors
    /// - `ListingNotFound`: Bond unknown to the marketplace
    pub fn get_bond_market_metrics(env: Env, bond_id: u32) -> Result<BondMarketMetrics, Error> {
        let listing = Self::load_listing(&env, bond_id)?;
        let now = env.ledger().timestamp();

        let analytics = Self::read_analytics(&env, bond_id);
        let fractions = Self::fraction_token(&env, &listing.bond_contract);

        let mut number_of_holders: u32 = 0;
        let mut entries = Vec::<u64>::new(&env);
        for holder in Self::read_holders(&env, bond_id).iter() {
            if Self::fraction_balance(&env, &fractions, bond_id, &holder) == 0 {
                continue;
            }
            number_of_holders += 1;
            if let Some(info) = env
                .storage()
                .persistent()
                .get::<DataKey, HolderInfo>(&DataKey::HolderInfo(bond_id, holder))
            {
                entries.push_back(info.entry_timestamp);
            }
        }
        let average_holding_time = metrics::average_holding_time(entries.iter(), now);

        let details: BondDetails = Self::call_bond(
            &env,
            &listing.bond_contract,
            "get_details",
            vec![&env, bond_id.into()],
        )?;
        let total_value_locked = metrics::total_value_locked(
            details.total_fraction_supply,
            details.terms.face_value,
            details.terms.tokens_per_bond,
        )
        .ok_or(Error::ArithmeticOverflow)?;

        Ok(BondMarketMetrics {
            last_price: analytics.last_price,
            volume_24h: metrics::volume_24h(&analytics, now),
            number_of_holders,
            average_holding_time,
            total_value_locked,
        })
    }

    /// Holdings and trading totals for one account
    pub fn get_user_metrics(env: Env, account: Address) -> UserMetrics {
        let stats = Self::read_user_stats(&env, &account);

        let mut bonds_held: u32 = 0;
        let mut active_positions: u32 = 0;
        for holding in Self::get_user_holdings(env.clone(), account).iter() {
            bonds_held += 1;
            let live = Self::read_listing(&env, holding.bond_id)
                .map(|listing| listing.is_listed && !listing.matured)
                .unwrap_or(false);
            if live {
                active_positions += 1;
            }
        }

        UserMetrics {
            bonds_held,
            total_volume: stats.total_volume,
            active_positions,
        }
    }

    /// Every bond in which the account currently holds fractions
    pub fn get_user_holdings(env: Env, account: Address) -> Vec<Holding> {
        let stats = Self::read_user_stats(&env, &account);

        let mut holdings = Vec::new(&env);
        for bond_id in stats.bonds.iter() {
            let Some(listing) = Self::read_listing(&env, bond_id) else {
                continue;
            };
            let fractions = Self::fraction_token(&env, &listing.bond_contract);
            let balance = Self::fraction_balance(&env, &fractions, bond_id, &account);
            if balance > 0 {
                holdings.push_back(Holding {
                    bond_id,
                    bond_contract: listing.bond_contract,
                    balance,
                    listing_price: listing.listing_price,
                    matured: listing.matured,
                });
            }
        }
        holdings
    }

    pub fn get_all_bond_holders(env: Env, bond_id: u32) -> Vec<Address> {
        Self::read_holders(&env, bond_id)
    }

    pub fn get_holder_info(env: Env, bond_id: u32, holder: Address) -> Option<HolderInfo> {
        env.storage()
            .persistent()
            .get(&DataKey::HolderInfo(bond_id, holder))
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        Self::admin(&env)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn check_initialized(env: &Env) -> Result<(), Error> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    fn check_not_paused(env: &Env) -> Result<(), Error> {
        let paused = env
            .storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Paused)
            .unwrap_or(false);

        if paused {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn admin(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)
    }

    fn read_listing(env: &Env, bond_id: u32) -> Option<Listing> {
        env.storage().persistent().get(&DataKey::Listing(bond_id))
    }

    fn load_listing(env: &Env, bond_id: u32) -> Result<Listing, Error> {
        Self::read_listing(env, bond_id).ok_or(Error::ListingNotFound)
    }

    fn live_listing(env: &Env, bond_id: u32) -> Result<Listing, Error> {
        let listing = Self::load_listing(env, bond_id)?;
        if !listing.is_listed {
            return Err(Error::NotListed);
        }
        Ok(listing)
    }

    fn write_listing(env: &Env, listing: &Listing) {
        env.storage()
            .persistent()
            .set(&DataKey::Listing(listing.bond_id), listing);
    }

    fn read_analytics(env: &Env, bond_id: u32) -> BondAnalytics {
        env.storage()
            .persistent()
            .get(&DataKey::Analytics(bond_id))
            .unwrap_or(BondAnalytics {
                last_price: 0,
                volume_24h: 0,
                window_start: env.ledger().timestamp(),
                total_volume: 0,
            })
    }

    fn read_holders(env: &Env, bond_id: u32) -> Vec<Address> {
        env.storage()
            .persistent()
            .get(&DataKey::Holders(bond_id))
            .unwrap_or(Vec::new(env))
    }

    fn read_user_stats(env: &Env, account: &Address) -> UserStats {
        env.storage()
            .persistent()
            .get(&DataKey::UserStats(account.clone()))
            .unwrap_or(UserStats {
                total_volume: 0,
                bonds: Vec::new(env),
            })
    }

    /// Bring the holder list in line with the account's current balance
    fn sync_holder(env: &Env, bond_id: u32, fractions: &Address, holder: &Address, now: u64) {
        let balance = Self::fraction_balance(env, fractions, bond_id, holder);
        let mut holders = Self::read_holders(env, bond_id);
        let info_key = DataKey::HolderInfo(bond_id, holder.clone());

        match holders.first_index_of(holder.clone()) {
            None if balance > 0 => {
                holders.push_back(holder.clone());
                env.storage().persistent().set(&DataKey::Holders(bond_id), &holders);
                env.storage().persistent().set(
                    &info_key,
                    &HolderInfo {
                        entry_timestamp: now,
                        volume: 0,
                    },
                );

                let mut stats = Self::read_user_stats(env, holder);
                if !stats.bonds.contains(bond_id) {
                    stats.bonds.push_back(bond_id);
                    env.storage()
                        .persistent()
                        .set(&DataKey::UserStats(holder.clone()), &stats);
                }
            }
            Some(index) if balance == 0 => {
                holders.remove(index);
                env.storage().persistent().set(&DataKey::Holders(bond_id), &holders);
                env.storage().persistent().remove(&info_key);
            }
            _ => {}
        }
    }

    fn record_volume(
        env: &Env,
        bond_id: u32,
        volume: i128,
        price: Option<i128>,
        now: u64,
    ) -> Result<(), Error> {
        let mut analytics = Self::read_analytics(env, bond_id);
        metrics::record_trade(&mut analytics, volume, price, now).ok_or(Error::ArithmeticOverflow)?;
        env.storage()
            .persistent()
            .set(&DataKey::Analytics(bond_id), &analytics);

        let mut stats = Self::get_market_stats(env.clone());
        stats.total_trading_volume = stats
            .total_trading_volume
            .checked_add(volume)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().instance().set(&DataKey::Stats, &stats);

        Ok(())
    }

    /// Add traded stablecoin to the account's totals
    fn credit_account(env: &Env, bond_id: u32, account: &Address, volume: i128) -> Result<(), Error> {
        let mut stats = Self::read_user_stats(env, account);
        stats.total_volume = stats
            .total_volume
            .checked_add(volume)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage()
            .persistent()
            .set(&DataKey::UserStats(account.clone()), &stats);

        let info_key = DataKey::HolderInfo(bond_id, account.clone());
        if let Some(mut info) = env
            .storage()
            .persistent()
            .get::<DataKey, HolderInfo>(&info_key)
        {
            info.volume = info.volume.checked_add(volume).ok_or(Error::ArithmeticOverflow)?;
            env.storage().persistent().set(&info_key, &info);
        }

        Ok(())
    }

    /// Refresh the advisory flag from the bond contract, which decides
    fn check_matured(env: &Env, listing: &mut Listing) -> Result<(), Error> {
        let matured: bool = Self::call_bond(
            env,
            &listing.bond_contract,
            "is_matured",
            vec![env, listing.bond_id.into()],
        )?;
        if !matured {
            return Err(Error::NotMatured);
        }

        if !listing.matured {
            listing.matured = true;
            Self::write_listing(env, listing);
            env.events().publish(
                (Symbol::new(env, "maturity_updated"), listing.bond_id),
                MaturityUpdatedEvent {
                    bond_id: listing.bond_id,
                    matured: true,
                },
            );
        }
        Ok(())
    }

    fn check_policy(env: &Env, gate: &Address, account: &Address) -> Result<(), Error> {
        let whitelisted: bool = env.invoke_contract(
            gate,
            &Symbol::new(env, "is_whitelisted"),
            vec![env, account.to_val()],
        );
        if !whitelisted {
            return Err(Error::NotWhitelisted);
        }

        let kyced: bool = env.invoke_contract(
            gate,
            &Symbol::new(env, "is_kyc_approved"),
            vec![env, account.to_val()],
        );
        if !kyced {
            return Err(Error::NotKyced);
        }

        Ok(())
    }

    /// Invoke the bond contract and translate its error codes into ours
    fn call_bond<T>(
        env: &Env,
        bond_contract: &Address,
        func: &str,
        args: Vec<Val>,
    ) -> Result<T, Error>
    where
        T: TryFromVal<Env, Val>,
    {
        let func = Symbol::new(env, func);
        match env.try_invoke_contract::<T, IssueError>(bond_contract, &func, args) {
            Ok(Ok(value)) => Ok(value),
            Err(Ok(error)) => Err(error.into()),
            Ok(Err(_)) | Err(Err(_)) => {
                log!(env, "bond contract call failed: {}", func);
                Err(Error::BondContractFailed)
            }
        }
    }

    fn bond_terms(env: &Env, bond_contract: &Address, bond_id: u32) -> Result<BondTerms, Error> {
        Self::call_bond(env, bond_contract, "get_terms", vec![env, bond_id.into()])
    }

    fn fraction_token(env: &Env, bond_contract: &Address) -> Address {
        env.invoke_contract(
            bond_contract,
            &Symbol::new(env, "fraction_token"),
            Vec::new(env),
        )
    }

    fn fraction_balance(env: &Env, fractions: &Address, bond_id: u32, holder: &Address) -> i128 {
        env.invoke_contract(
            fractions,
            &Symbol::new(env, "balance_of"),
            vec![env, bond_id.into(), holder.to_val()],
        )
    }

    fn claim_through(env: &Env, listing: &Listing, holder: &Address) -> Result<i128, Error> {
        Self::call_bond(
            env,
            &listing.bond_contract,
            "claim_coupon",
            vec![env, listing.bond_id.into(), holder.to_val()],
        )
    }

    fn redeem_through(env: &Env, listing: &Listing, holder: &Address) -> Result<i128, Error> {
        Self::call_bond(
            env,
            &listing.bond_contract,
            "redeem",
            vec![env, listing.bond_id.into(), holder.to_val()],
        )
    }
}
