#![no_std]

mod coupon;
mod events;
mod storage;

pub use bond_types::IssueError as Error;
pub use storage::{BondDocument, CouponAccount};
use coupon::{principal, purchase_cost, settle};
use events::*;
use storage::DataKey;

use bond_types::{BondDetails, BondTerms, IssueState, MAX_COUPON_FREQUENCY};
use soroban_sdk::{
    contract, contractimpl, log, token, vec, Address, Bytes, BytesN, Env, IntoVal, String, Symbol,
};

#[contract]
pub struct BondIssue;

#[contractimpl]
impl BondIssue {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the engine
    ///
    /// `registry` is the only account allowed to open and decommission
    /// issues; `fraction_token` is the shared ledger this engine mints into.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(
        env: Env,
        admin: Address,
        registry: Address,
        fraction_token: Address,
        policy_gate: Address,
    ) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Registry, &registry);
        env.storage()
            .instance()
            .set(&DataKey::FractionToken, &fraction_token);
        env.storage().instance().set(&DataKey::PolicyGate, &policy_gate);
        env.storage().instance().set(&DataKey::Paused, &false);

        Ok(())
    }

    /// Pause every state-changing operation (emergency)
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
    // ISSUE LIFECYCLE (REGISTRY)
    // ============================================

    /// Open a new bond issue under `terms.bond_id`
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `IssueAlreadyExists`: Bond ID already used
    /// - `InvalidTerms`: Terms fail validation
    pub fn create_issue(env: Env, terms: BondTerms) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        Self::registry(&env)?.require_auth();

        let bond_id = terms.bond_id;
        if env.storage().persistent().has(&DataKey::Terms(bond_id)) {
            return Err(Error::IssueAlreadyExists);
        }

        let now = env.ledger().timestamp();
        Self::validate_terms(&terms, now)?;

        let state = IssueState {
            active: true,
            total_raised: 0,
            reserve: 0,
            creation_timestamp: now,
            decommission_timestamp: None,
            total_coupons_paid: 0,
            total_principal_redeemed: 0,
        };

        env.storage().persistent().set(&DataKey::Terms(bond_id), &terms);
        env.storage().persistent().set(&DataKey::State(bond_id), &state);

        env.events().publish(
            (Symbol::new(&env, "issue_created"), bond_id),
            IssueCreatedEvent {
                bond_id,
                issuer: terms.issuer,
                face_value: terms.face_value,
                coupon_rate_bps: terms.coupon_rate_bps,
                coupon_frequency: terms.coupon_frequency,
                maturity_timestamp: terms.maturity_timestamp,
                max_bond_supply: terms.max_bond_supply,
            },
        );

        Ok(())
    }

    /// Stop primary sales for good. Holders keep their coupon and
    /// redemption rights.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `AlreadyDecommissioned`: Issue already inactive
    pub fn decommission(env: Env, bond_id: u32) -> Result<(), Error> {
        Self::check_not_paused(&env)?;
        Self::registry(&env)?.require_auth();

        let terms = Self::load_terms(&env, bond_id)?;
        terms.issuer.require_auth();

        let mut state = Self::load_state(&env, bond_id)?;
        if !state.active {
            return Err(Error::AlreadyDecommissioned);
        }

        let now = env.ledger().timestamp();
        state.active = false;
        state.decommission_timestamp = Some(now);
        env.storage().persistent().set(&DataKey::State(bond_id), &state);

        env.events().publish(
            (Symbol::new(&env, "decommissioned"), bond_id),
            DecommissionedEvent {
                bond_id,
                timestamp: now,
            },
        );

        Ok(())
    }

    // ============================================
    // PRIMARY ISSUANCE
    // ============================================

    /// Buy `units` fractions at the issue price; returns the stablecoin cost
    ///
    /// The buyer must have approved at least the cost to this contract on
    /// the stablecoin. Proceeds go to the bond's reserve.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: units must be positive
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `NotWhitelisted` / `NotKyced`: Buyer fails the policy gate
    /// - `IssueInactive`: Issue decommissioned
    /// - `AlreadyMatured`: Sales closed at maturity
    /// - `CapExceeded`: Would exceed max_bond_supply
    /// - `InsufficientAllowance`: Stablecoin allowance below cost
    /// - `InsufficientBalance`: Stablecoin balance below cost
    pub fn purchase(env: Env, bond_id: u32, buyer: Address, units: i128) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;

        if units <= 0 {
            return Err(Error::InvalidAmount);
        }

        buyer.require_auth();

        let terms = Self::load_terms(&env, bond_id)?;
        Self::check_policy(&env, &buyer)?;

        let mut state = Self::load_state(&env, bond_id)?;
        let now = env.ledger().timestamp();
        Self::check_open_for_sale(&terms, &state, now)?;
        Self::check_cap(&env, &terms, units)?;

        let cost = purchase_cost(&terms, units).ok_or(Error::ArithmeticOverflow)?;

        let this = env.current_contract_address();
        let stablecoin = token::Client::new(&env, &terms.stablecoin);

        let allowance = stablecoin.allowance(&buyer, &this);
        if allowance < cost {
            log!(
                &env,
                "stablecoin allowance too low. Required: {}, Available: {}",
                cost,
                allowance
            );
            return Err(Error::InsufficientAllowance);
        }
        if stablecoin.balance(&buyer) < cost {
            return Err(Error::InsufficientBalance);
        }

        Self::settle_before_mint(&env, &terms, &buyer, now)?;

        stablecoin.transfer_from(&this, &buyer, &this, &cost);
        Self::mint(&env, bond_id, &buyer, units)?;

        state.total_raised = state
            .total_raised
            .checked_add(cost)
            .ok_or(Error::ArithmeticOverflow)?;
        state.reserve = state
            .reserve
            .checked_add(cost)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().persistent().set(&DataKey::State(bond_id), &state);

        env.events().publish(
            (Symbol::new(&env, "purchased"), bond_id, buyer.clone()),
            PurchasedEvent {
                bond_id,
                buyer,
                units,
                cost,
            },
        );

        Ok(cost)
    }

    /// Issuer pre-mint: allot `units` fractions to `to` without payment
    ///
    /// Subject to the same cap, lifecycle and recipient policy checks as a
    /// purchase.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: units must be positive
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `NotWhitelisted` / `NotKyced`: Recipient fails the policy gate
    /// - `IssueInactive` / `AlreadyMatured`: Issue closed for issuance
    /// - `CapExceeded`: Would exceed max_bond_supply
    pub fn issue_fractions(env: Env, bond_id: u32, to: Address, units: i128) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if units <= 0 {
            return Err(Error::InvalidAmount);
        }

        let terms = Self::load_terms(&env, bond_id)?;
        terms.issuer.require_auth();

        Self::check_policy(&env, &to)?;

        let state = Self::load_state(&env, bond_id)?;
        let now = env.ledger().timestamp();
        Self::check_open_for_sale(&terms, &state, now)?;
        Self::check_cap(&env, &terms, units)?;

        Self::settle_before_mint(&env, &terms, &to, now)?;
        Self::mint(&env, bond_id, &to, units)?;

        env.events().publish(
            (Symbol::new(&env, "fractions_issued"), bond_id, to.clone()),
            FractionsIssuedEvent { bond_id, to, units },
        );

        Ok(())
    }

    // ============================================
    // RESERVE MANAGEMENT
    // ============================================

    /// Top up a bond's reserve from any account
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: amount must be positive
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `InsufficientBalance`: Funder lacks the stablecoin
    pub fn fund_reserve(env: Env, bond_id: u32, from: Address, amount: i128) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        let terms = Self::load_terms(&env, bond_id)?;
        let mut state = Self::load_state(&env, bond_id)?;

        let stablecoin = token::Client::new(&env, &terms.stablecoin);
        if stablecoin.balance(&from) < amount {
            return Err(Error::InsufficientBalance);
        }
        stablecoin.transfer(&from, &env.current_contract_address(), &amount);

        state.reserve = state
            .reserve
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().persistent().set(&DataKey::State(bond_id), &state);

        env.events().publish(
            (Symbol::new(&env, "reserve_funded"), bond_id),
            ReserveEvent {
                bond_id,
                account: from,
                amount,
                reserve: state.reserve,
            },
        );

        Ok(())
    }

    /// Move reserve stablecoin back to the issuer
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidAmount`: amount must be positive
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `InsufficientReserve`: Reserve below amount
    pub fn withdraw_reserve(env: Env, bond_id: u32, amount: i128) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let terms = Self::load_terms(&env, bond_id)?;
        terms.issuer.require_auth();

        let mut state = Self::load_state(&env, bond_id)?;
        if state.reserve < amount {
            return Err(Error::InsufficientReserve);
        }

        state.reserve -= amount;
        env.storage().persistent().set(&DataKey::State(bond_id), &state);

        token::Client::new(&env, &terms.stablecoin).transfer(
            &env.current_contract_address(),
            &terms.issuer,
            &amount,
        );

        env.events().publish(
            (Symbol::new(&env, "reserve_withdrawn"), bond_id),
            ReserveEvent {
                bond_id,
                account: terms.issuer,
                amount,
                reserve: state.reserve,
            },
        );

        Ok(())
    }

    // ============================================
    // HOLDER PAYOUTS
    // ============================================

    /// Pay the holder every whole coupon period accrued so far; returns the
    /// amount paid, which may be 0
    ///
    /// Anyone may trigger this; the coupon always goes to the holder.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `InsufficientReserve`: Reserve cannot cover the coupon
    pub fn claim_coupon(env: Env, bond_id: u32, holder: Address) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;

        let terms = Self::load_terms(&env, bond_id)?;
        let mut state = Self::load_state(&env, bond_id)?;

        let now = env.ledger().timestamp();
        let balance = Self::balance_of(&env, bond_id, &holder)?;
        let existing = Self::load_account(&env, bond_id, &holder);
        let had_account = existing.is_some();
        let mut account =
            settle(&terms, existing, balance, now).ok_or(Error::ArithmeticOverflow)?;

        let payment = account.accrued;
        if payment > 0 {
            if state.reserve < payment {
                log!(
                    &env,
                    "reserve too low for coupon. Required: {}, Available: {}",
                    payment,
                    state.reserve
                );
                return Err(Error::InsufficientReserve);
            }

            state.reserve -= payment;
            state.total_coupons_paid = state
                .total_coupons_paid
                .checked_add(payment)
                .ok_or(Error::ArithmeticOverflow)?;
            account.accrued = 0;
            env.storage().persistent().set(&DataKey::State(bond_id), &state);
        }

        // Nothing owed to an unknown account; leave no entry behind
        if had_account || payment > 0 {
            Self::save_account(&env, bond_id, &holder, &account);
        }

        if payment > 0 {
            token::Client::new(&env, &terms.stablecoin).transfer(
                &env.current_contract_address(),
                &holder,
                &payment,
            );
        }

        env.events().publish(
            (Symbol::new(&env, "coupon_claimed"), bond_id, holder.clone()),
            CouponClaimedEvent {
                bond_id,
                holder,
                amount: payment,
                checkpoint: account.checkpoint,
            },
        );

        Ok(payment)
    }

    /// Burn the holder's whole balance at or after maturity and pay its
    /// principal; returns the principal paid
    ///
    /// Coupons accrued up to maturity stay claimable afterwards.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `NotMatured`: Cannot redeem before maturity
    /// - `ZeroBalance`: Holder has nothing to redeem
    /// - `InsufficientReserve`: Reserve cannot cover the principal
    pub fn redeem(env: Env, bond_id: u32, holder: Address) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;

        let terms = Self::load_terms(&env, bond_id)?;
        let mut state = Self::load_state(&env, bond_id)?;

        let now = env.ledger().timestamp();
        if now < terms.maturity_timestamp {
            return Err(Error::NotMatured);
        }

        let balance = Self::balance_of(&env, bond_id, &holder)?;
        if balance == 0 {
            return Err(Error::ZeroBalance);
        }

        let payout = principal(&terms, balance).ok_or(Error::ArithmeticOverflow)?;
        if state.reserve < payout {
            log!(
                &env,
                "reserve too low for principal. Required: {}, Available: {}",
                payout,
                state.reserve
            );
            return Err(Error::InsufficientReserve);
        }

        let account = settle(&terms, Self::load_account(&env, bond_id, &holder), balance, now)
            .ok_or(Error::ArithmeticOverflow)?;
        Self::save_account(&env, bond_id, &holder, &account);

        Self::burn(&env, bond_id, &holder, balance)?;

        state.reserve -= payout;
        state.total_principal_redeemed = state
            .total_principal_redeemed
            .checked_add(payout)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().persistent().set(&DataKey::State(bond_id), &state);

        token::Client::new(&env, &terms.stablecoin).transfer(
            &env.current_contract_address(),
            &holder,
            &payout,
        );

        env.events().publish(
            (Symbol::new(&env, "redeemed"), bond_id, holder.clone()),
            RedeemedEvent {
                bond_id,
                holder,
                units: balance,
                payout,
            },
        );

        Ok(payout)
    }

    // ============================================
    // FRACTION TOKEN HOOK
    // ============================================

    /// Called by the fraction token before it moves a balance, with both
    /// parties' balances as they stood before the move
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `IssueNotFound`: Bond doesn't exist
    pub fn on_transfer(
        env: Env,
        bond_id: u32,
        from: Address,
        from_balance: i128,
        to: Address,
        to_balance: i128,
    ) -> Result<(), Error> {
        Self::fraction_token(env.clone())?.require_auth();

        let terms = Self::load_terms(&env, bond_id)?;
        let now = env.ledger().timestamp();

        let from_account = settle(
            &terms,
            Self::load_account(&env, bond_id, &from),
            from_balance,
            now,
        )
        .ok_or(Error::ArithmeticOverflow)?;
        let to_account = settle(&terms, Self::load_account(&env, bond_id, &to), to_balance, now)
            .ok_or(Error::ArithmeticOverflow)?;

        Self::save_account(&env, bond_id, &from, &from_account);
        Self::save_account(&env, bond_id, &to, &to_account);

        Ok(())
    }

    // ============================================
    // OFFERING DOCUMENTS
    // ============================================

    /// Attach or replace the issue's offering document (issuer only)
    ///
    /// `hash` is the keccak256 digest of the document content.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `IssueNotFound`: Bond doesn't exist
    pub fn set_document(
        env: Env,
        bond_id: u32,
        uri: String,
        hash: BytesN<32>,
    ) -> Result<(), Error> {
        Self::check_not_paused(&env)?;

        let terms = Self::load_terms(&env, bond_id)?;
        terms.issuer.require_auth();

        let document = BondDocument {
            uri: uri.clone(),
            hash: hash.clone(),
            updated_at: env.ledger().timestamp(),
        };
        env.storage()
            .persistent()
            .set(&DataKey::Document(bond_id), &document);

        env.events().publish(
            (Symbol::new(&env, "document_updated"), bond_id),
            DocumentUpdatedEvent { bond_id, uri, hash },
        );

        Ok(())
    }

    pub fn get_document(env: Env, bond_id: u32) -> Result<BondDocument, Error> {
        Self::load_document(&env, bond_id)
    }

    pub fn get_document_uri(env: Env, bond_id: u32) -> Result<String, Error> {
        Ok(Self::load_document(&env, bond_id)?.uri)
    }

    pub fn get_document_hash(env: Env, bond_id: u32) -> Result<BytesN<32>, Error> {
        Ok(Self::load_document(&env, bond_id)?.hash)
    }

    /// True when `content` hashes to the attested digest
    ///
    /// # Errors
    /// - `IssueNotFound`: Bond doesn't exist
    /// - `DocumentNotSet`: No document attached yet
    pub fn verify_document(env: Env, bond_id: u32, content: Bytes) -> Result<bool, Error> {
        let document = Self::load_document(&env, bond_id)?;
        let digest: BytesN<32> = env.crypto().keccak256(&content).into();
        Ok(digest == document.hash)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn get_terms(env: Env, bond_id: u32) -> Result<BondTerms, Error> {
        Self::load_terms(&env, bond_id)
    }

    pub fn get_state(env: Env, bond_id: u32) -> Result<IssueState, Error> {
        Self::load_state(&env, bond_id)
    }

    /// Terms, state and outstanding supply in one read
    pub fn get_details(env: Env, bond_id: u32) -> Result<BondDetails, Error> {
        let terms = Self::load_terms(&env, bond_id)?;
        let state = Self::load_state(&env, bond_id)?;
        let total_fraction_supply = Self::supply_of(&env, bond_id)?;

        Ok(BondDetails {
            terms,
            state,
            total_fraction_supply,
        })
    }

    /// Coupon the holder could claim right now
    pub fn pending_coupon(env: Env, bond_id: u32, holder: Address) -> Result<i128, Error> {
        let terms = Self::load_terms(&env, bond_id)?;
        let balance = Self::balance_of(&env, bond_id, &holder)?;
        let now = env.ledger().timestamp();

        let account = settle(&terms, Self::load_account(&env, bond_id, &holder), balance, now)
            .ok_or(Error::ArithmeticOverflow)?;
        Ok(account.accrued)
    }

    pub fn get_coupon_account(env: Env, bond_id: u32, holder: Address) -> Option<CouponAccount> {
        Self::load_account(&env, bond_id, &holder)
    }

    /// Stablecoin the reserve must hold to pay principal on the current
    /// supply plus every coupon period still to fall due
    pub fn required_reserve(env: Env, bond_id: u32) -> Result<i128, Error> {
        let terms = Self::load_terms(&env, bond_id)?;
        let supply = Self::supply_of(&env, bond_id)?;

        coupon::required_reserve(&terms, supply, env.ledger().timestamp())
            .ok_or(Error::ArithmeticOverflow)
    }

    pub fn coupon_period(env: Env, bond_id: u32) -> Result<u64, Error> {
        Ok(Self::load_terms(&env, bond_id)?.coupon_period())
    }

    pub fn is_matured(env: Env, bond_id: u32) -> Result<bool, Error> {
        let terms = Self::load_terms(&env, bond_id)?;
        Ok(env.ledger().timestamp() >= terms.maturity_timestamp)
    }

    pub fn fraction_token(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::FractionToken)
            .ok_or(Error::NotInitialized)
    }

    pub fn policy_gate(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::PolicyGate)
            .ok_or(Error::NotInitialized)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

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

    fn registry(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Registry)
            .ok_or(Error::NotInitialized)
    }

    fn load_terms(env: &Env, bond_id: u32) -> Result<BondTerms, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Terms(bond_id))
            .ok_or(Error::IssueNotFound)
    }

    fn load_state(env: &Env, bond_id: u32) -> Result<IssueState, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::State(bond_id))
            .ok_or(Error::IssueNotFound)
    }

    fn load_account(env: &Env, bond_id: u32, holder: &Address) -> Option<CouponAccount> {
        env.storage()
            .persistent()
            .get(&DataKey::Coupon(bond_id, holder.clone()))
    }

    fn load_document(env: &Env, bond_id: u32) -> Result<BondDocument, Error> {
        Self::load_terms(env, bond_id)?;
        env.storage()
            .persistent()
            .get(&DataKey::Document(bond_id))
            .ok_or(Error::DocumentNotSet)
    }

    fn save_account(env: &Env, bond_id: u32, holder: &Address, account: &CouponAccount) {
        env.storage()
            .persistent()
            .set(&DataKey::Coupon(bond_id, holder.clone()), account);
    }

    fn validate_terms(terms: &BondTerms, now: u64) -> Result<(), Error> {
        if terms.maturity_timestamp <= now
            || terms.coupon_frequency == 0
            || terms.coupon_frequency > MAX_COUPON_FREQUENCY
            || terms.face_value <= 0
            || terms.tokens_per_bond <= 0
            || terms.token_price <= 0
            || terms.max_bond_supply < terms.face_value
        {
            return Err(Error::InvalidTerms);
        }
        Ok(())
    }

    fn check_open_for_sale(terms: &BondTerms, state: &IssueState, now: u64) -> Result<(), Error> {
        if !state.active {
            return Err(Error::IssueInactive);
        }
        if now >= terms.maturity_timestamp {
            return Err(Error::AlreadyMatured);
        }
        Ok(())
    }

    /// Outstanding value after minting `units` more must stay within
    /// max_bond_supply
    fn check_cap(env: &Env, terms: &BondTerms, units: i128) -> Result<(), Error> {
        let new_supply = Self::supply_of(env, terms.bond_id)?
            .checked_add(units)
            .ok_or(Error::ArithmeticOverflow)?;
        let outstanding = principal(terms, new_supply).ok_or(Error::ArithmeticOverflow)?;

        if outstanding > terms.max_bond_supply {
            log!(
                env,
                "issuance cap reached. Outstanding: {}, Cap: {}",
                outstanding,
                terms.max_bond_supply
            );
            return Err(Error::CapExceeded);
        }
        Ok(())
    }

    fn check_policy(env: &Env, account: &Address) -> Result<(), Error> {
        let gate = Self::policy_gate(env.clone())?;

        let whitelisted: bool = env.invoke_contract(
            &gate,
            &Symbol::new(env, "is_whitelisted"),
            vec![env, account.to_val()],
        );
        if !whitelisted {
            return Err(Error::NotWhitelisted);
        }

        let kyced: bool = env.invoke_contract(
            &gate,
            &Symbol::new(env, "is_kyc_approved"),
            vec![env, account.to_val()],
        );
        if !kyced {
            return Err(Error::NotKyced);
        }

        Ok(())
    }

    /// Mints skip the token's transfer hook, so accrual on the recipient's
    /// existing balance is settled here first.
    fn settle_before_mint(
        env: &Env,
        terms: &BondTerms,
        holder: &Address,
        now: u64,
    ) -> Result<(), Error> {
        let balance = Self::balance_of(env, terms.bond_id, holder)?;
        let account = settle(terms, Self::load_account(env, terms.bond_id, holder), balance, now)
            .ok_or(Error::ArithmeticOverflow)?;
        Self::save_account(env, terms.bond_id, holder, &account);
        Ok(())
    }

    fn balance_of(env: &Env, bond_id: u32, holder: &Address) -> Result<i128, Error> {
        let token = Self::fraction_token(env.clone())?;
        Ok(env.invoke_contract(
            &token,
            &Symbol::new(env, "balance_of"),
            vec![env, bond_id.into(), holder.to_val()],
        ))
    }

    fn supply_of(env: &Env, bond_id: u32) -> Result<i128, Error> {
        let token = Self::fraction_token(env.clone())?;
        Ok(env.invoke_contract(
            &token,
            &Symbol::new(env, "total_supply"),
            vec![env, bond_id.into()],
        ))
    }

    fn mint(env: &Env, bond_id: u32, to: &Address, units: i128) -> Result<(), Error> {
        let token = Self::fraction_token(env.clone())?;
        env.invoke_contract::<()>(
            &token,
            &Symbol::new(env, "mint"),
            vec![env, bond_id.into(), to.to_val(), units.into_val(env)],
        );
        Ok(())
    }

    fn burn(env: &Env, bond_id: u32, from: &Address, units: i128) -> Result<(), Error> {
        let token = Self::fraction_token(env.clone())?;
        env.invoke_contract::<()>(
            &token,
            &Symbol::new(env, "burn"),
            vec![env, bond_id.into(), from.to_val(), units.into_val(env)],
        );
        Ok(())
    }
}

#[cfg(test)]
mod test;
