use super::*;
use bond_types::{ErrorKind, MAX_COUPON_FREQUENCY, SECONDS_PER_YEAR};
use fraction_token::{FractionToken, FractionTokenClient};
use policy_gate::{PolicyGate, PolicyGateClient};
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token::{self, StellarAssetClient},
    vec, Address, Bytes, BytesN, Env, String,
};

// 6-decimal stablecoin
const USD: i128 = 1_000_000;
const START: u64 = 1_000;
const HALF_YEAR: u64 = SECONDS_PER_YEAR / 2;
const BOND_ID: u32 = 1;

struct TestContext<'a> {
    env: Env,
    engine: BondIssueClient<'a>,
    fractions: FractionTokenClient<'a>,
    gate: PolicyGateClient<'a>,
    stablecoin: token::Client<'a>,
    stablecoin_admin: StellarAssetClient<'a>,
    issuer: Address,
    user1: Address,
    user2: Address,
}

impl<'a> TestContext<'a> {
    fn terms(&self) -> BondTerms {
        BondTerms {
            bond_id: BOND_ID,
            name: String::from_str(&self.env, "Municipal 5% 1Y"),
            symbol: String::from_str(&self.env, "MUNI5"),
            face_value: 1_000 * USD,
            coupon_rate_bps: 500,
            coupon_frequency: 2,
            maturity_timestamp: START + SECONDS_PER_YEAR,
            issuer: self.issuer.clone(),
            stablecoin: self.stablecoin.address.clone(),
            tokens_per_bond: 1_000,
            token_price: 950_000,
            max_bond_supply: 1_000_000 * USD,
        }
    }

    /// Fund `user` with stablecoin and approve the engine to pull it
    fn fund(&self, user: &Address, amount: i128) {
        self.stablecoin_admin.mint(user, &amount);
        self.stablecoin.approve(
            user,
            &self.engine.address,
            &amount,
            &(self.env.ledger().sequence() + 10_000),
        );
    }

    fn warp(&self, timestamp: u64) {
        self.env.ledger().set_timestamp(timestamp);
    }
}

fn setup<'a>() -> TestContext<'a> {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(START);

    let admin = Address::generate(&env);
    let registry = Address::generate(&env);
    let issuer = Address::generate(&env);
    let user1 = Address::generate(&env);
    let user2 = Address::generate(&env);

    let sac = env.register_stellar_asset_contract_v2(admin.clone());
    let stablecoin = token::Client::new(&env, &sac.address());
    let stablecoin_admin = StellarAssetClient::new(&env, &sac.address());

    let gate_id = env.register_contract(None, PolicyGate);
    let gate = PolicyGateClient::new(&env, &gate_id);
    gate.initialize(&admin);
    gate.add_to_whitelist(&vec![&env, user1.clone(), user2.clone()]);
    gate.set_kyc_status(&vec![&env, user1.clone(), user2.clone()], &true);

    let engine_id = env.register_contract(None, BondIssue);
    let fractions_id = env.register_contract(None, FractionToken);

    let fractions = FractionTokenClient::new(&env, &fractions_id);
    fractions.initialize(&admin, &engine_id, &gate_id);

    let engine = BondIssueClient::new(&env, &engine_id);
    engine.initialize(&admin, &registry, &fractions_id, &gate_id);

    let ctx = TestContext {
        env,
        engine,
        fractions,
        gate,
        stablecoin,
        stablecoin_admin,
        issuer,
        user1,
        user2,
    };
    ctx.engine.create_issue(&ctx.terms());
    ctx
}

#[test]
fn test_initialize_twice() {
    let ctx = setup();
    let admin = Address::generate(&ctx.env);

    let result = ctx.engine.try_initialize(
        &admin,
        &admin,
        &ctx.fractions.address,
        &ctx.gate.address,
    );
    assert_eq!(result, Err(Ok(Error::AlreadyInitialized)));
}

#[test]
fn test_create_issue_validation() {
    let ctx = setup();

    let result = ctx.engine.try_create_issue(&ctx.terms());
    assert_eq!(result, Err(Ok(Error::IssueAlreadyExists)));

    let mut terms = ctx.terms();
    terms.bond_id = 2;
    terms.maturity_timestamp = START;
    assert_eq!(
        ctx.engine.try_create_issue(&terms),
        Err(Ok(Error::InvalidTerms))
    );

    let mut terms = ctx.terms();
    terms.bond_id = 2;
    terms.coupon_frequency = 0;
    assert_eq!(
        ctx.engine.try_create_issue(&terms),
        Err(Ok(Error::InvalidTerms))
    );

    let mut terms = ctx.terms();
    terms.bond_id = 2;
    terms.tokens_per_bond = 0;
    assert_eq!(
        ctx.engine.try_create_issue(&terms),
        Err(Ok(Error::InvalidTerms))
    );

    // A frequency that floors the period to zero is refused
    let mut terms = ctx.terms();
    terms.bond_id = 2;
    terms.coupon_frequency = MAX_COUPON_FREQUENCY + 1;
    assert_eq!(
        ctx.engine.try_create_issue(&terms),
        Err(Ok(Error::InvalidTerms))
    );

    let state = ctx.engine.get_state(&BOND_ID);
    assert!(state.active);
    assert_eq!(state.creation_timestamp, START);
    assert_eq!(ctx.engine.coupon_period(&BOND_ID), HALF_YEAR);
}

#[test]
fn test_fastest_coupon_frequency_still_pays() {
    let ctx = setup();
    let mut terms = ctx.terms();
    terms.bond_id = 2;
    terms.coupon_frequency = MAX_COUPON_FREQUENCY;
    ctx.engine.create_issue(&terms);
    assert_eq!(ctx.engine.coupon_period(&2), 1);

    ctx.fund(&ctx.user1, 142_500_000);
    ctx.engine.purchase(&2, &ctx.user1, &150);

    // Ten one-second periods of 7.5 each
    ctx.warp(START + 10);
    assert_eq!(ctx.engine.pending_coupon(&2, &ctx.user1), 75 * USD);
    assert_eq!(ctx.engine.claim_coupon(&2, &ctx.user1), 75 * USD);

    ctx.fractions.transfer(&2, &ctx.user1, &ctx.user2, &50);
    assert_eq!(ctx.fractions.balance_of(&2, &ctx.user2), 50);
}

#[test]
fn test_purchase_worked_example() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);

    let cost = ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);
    assert_eq!(cost, 142_500_000); // 142.5

    assert_eq!(ctx.fractions.balance_of(&BOND_ID, &ctx.user1), 150);
    assert_eq!(ctx.stablecoin.balance(&ctx.user1), 1_000 * USD - cost);
    assert_eq!(ctx.stablecoin.balance(&ctx.engine.address), cost);

    let details = ctx.engine.get_details(&BOND_ID);
    assert_eq!(details.total_fraction_supply, 150);
    assert_eq!(details.state.total_raised, cost);
    assert_eq!(details.state.reserve, cost);

    let account = ctx.engine.get_coupon_account(&BOND_ID, &ctx.user1).unwrap();
    assert_eq!(account.checkpoint, START);
    assert_eq!(account.accrued, 0);
}

#[test]
fn test_purchase_rejects_ineligible_buyer() {
    let ctx = setup();
    let outsider = Address::generate(&ctx.env);
    ctx.fund(&outsider, 1_000 * USD);

    let result = ctx.engine.try_purchase(&BOND_ID, &outsider, &150);
    assert_eq!(result, Err(Ok(Error::NotWhitelisted)));

    ctx.gate.add_to_whitelist(&vec![&ctx.env, outsider.clone()]);
    let result = ctx.engine.try_purchase(&BOND_ID, &outsider, &150);
    assert_eq!(result, Err(Ok(Error::NotKyced)));
    assert_eq!(Error::NotKyced.kind(), ErrorKind::PolicyDenied);

    assert_eq!(ctx.stablecoin.balance(&outsider), 1_000 * USD);
    assert_eq!(ctx.fractions.total_supply(&BOND_ID), 0);
}

#[test]
fn test_purchase_requires_allowance_and_balance() {
    let ctx = setup();

    // Approved but unfunded
    ctx.stablecoin.approve(
        &ctx.user1,
        &ctx.engine.address,
        &(1_000 * USD),
        &(ctx.env.ledger().sequence() + 10_000),
    );
    let result = ctx.engine.try_purchase(&BOND_ID, &ctx.user1, &150);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));

    // Funded but under-approved
    ctx.stablecoin_admin.mint(&ctx.user2, &(1_000 * USD));
    ctx.stablecoin.approve(
        &ctx.user2,
        &ctx.engine.address,
        &(100 * USD),
        &(ctx.env.ledger().sequence() + 10_000),
    );
    let result = ctx.engine.try_purchase(&BOND_ID, &ctx.user2, &150);
    assert_eq!(result, Err(Ok(Error::InsufficientAllowance)));
    assert_eq!(Error::InsufficientAllowance.kind(), ErrorKind::AuthorizationMissing);

    let result = ctx.engine.try_purchase(&BOND_ID, &ctx.user2, &0);
    assert_eq!(result, Err(Ok(Error::InvalidAmount)));
}

#[test]
fn test_purchase_cap_boundary() {
    let ctx = setup();

    let mut terms = ctx.terms();
    terms.bond_id = 2;
    // One whole bond may be outstanding
    terms.max_bond_supply = terms.face_value;
    ctx.engine.create_issue(&terms);

    ctx.fund(&ctx.user1, 2_000 * USD);

    let result = ctx.engine.try_purchase(&2, &ctx.user1, &1_001);
    assert_eq!(result, Err(Ok(Error::CapExceeded)));

    ctx.engine.purchase(&2, &ctx.user1, &1_000);
    assert_eq!(ctx.fractions.total_supply(&2), 1_000);

    let result = ctx.engine.try_purchase(&2, &ctx.user1, &1);
    assert_eq!(result, Err(Ok(Error::CapExceeded)));
}

#[test]
fn test_purchase_closed_at_maturity() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);

    ctx.warp(START + SECONDS_PER_YEAR);
    let result = ctx.engine.try_purchase(&BOND_ID, &ctx.user1, &150);
    assert_eq!(result, Err(Ok(Error::AlreadyMatured)));
    assert!(ctx.engine.is_matured(&BOND_ID));
}

#[test]
fn test_claim_coupon_once_per_period() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);

    // Nothing before the first period ends
    ctx.warp(START + HALF_YEAR - 1);
    assert_eq!(ctx.engine.pending_coupon(&BOND_ID, &ctx.user1), 0);
    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &ctx.user1), 0);

    ctx.warp(START + HALF_YEAR);
    assert_eq!(ctx.engine.pending_coupon(&BOND_ID, &ctx.user1), 7_500_000);

    let before = ctx.stablecoin.balance(&ctx.user1);
    let paid = ctx.engine.claim_coupon(&BOND_ID, &ctx.user1);
    assert_eq!(paid, 7_500_000); // 7.5
    assert_eq!(ctx.stablecoin.balance(&ctx.user1), before + paid);

    // Same timestamp, second claim pays nothing
    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &ctx.user1), 0);

    let state = ctx.engine.get_state(&BOND_ID);
    assert_eq!(state.total_coupons_paid, 7_500_000);
    assert_eq!(state.reserve, 142_500_000 - 7_500_000);
}

#[test]
fn test_claim_by_stranger_stores_nothing() {
    let ctx = setup();
    let stranger = Address::generate(&ctx.env);

    ctx.warp(START + HALF_YEAR);
    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &stranger), 0);
    assert_eq!(ctx.engine.get_coupon_account(&BOND_ID, &stranger), None);
    assert_eq!(ctx.engine.get_state(&BOND_ID).total_coupons_paid, 0);
}

#[test]
fn test_accrual_follows_transfers() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);

    // After one full period, move a third of the position
    ctx.warp(START + HALF_YEAR);
    ctx.fractions
        .transfer(&BOND_ID, &ctx.user1, &ctx.user2, &50);

    let account = ctx.engine.get_coupon_account(&BOND_ID, &ctx.user2).unwrap();
    assert_eq!(account.checkpoint, START + HALF_YEAR);

    ctx.warp(START + SECONDS_PER_YEAR);
    // 7.5 on 150 for the first period, 5 on 100 for the second
    assert_eq!(ctx.engine.pending_coupon(&BOND_ID, &ctx.user1), 12_500_000);
    // 2.5 on 50 for the second period only
    assert_eq!(ctx.engine.pending_coupon(&BOND_ID, &ctx.user2), 2_500_000);

    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &ctx.user2), 2_500_000);
    assert_eq!(ctx.stablecoin.balance(&ctx.user2), 2_500_000);
}

#[test]
fn test_claim_blocked_by_thin_reserve() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);

    // Issuer takes every sale proceed out of the reserve
    ctx.engine.withdraw_reserve(&BOND_ID, &142_500_000);
    assert_eq!(ctx.stablecoin.balance(&ctx.issuer), 142_500_000);

    ctx.warp(START + HALF_YEAR);
    let result = ctx.engine.try_claim_coupon(&BOND_ID, &ctx.user1);
    assert_eq!(result, Err(Ok(Error::InsufficientReserve)));
    assert_eq!(Error::InsufficientReserve.kind(), ErrorKind::CapacityExceeded);

    // Still owed once the reserve is topped up
    ctx.stablecoin_admin.mint(&ctx.issuer, &(10 * USD));
    ctx.engine.fund_reserve(&BOND_ID, &ctx.issuer, &(10 * USD));
    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &ctx.user1), 7_500_000);
}

#[test]
fn test_redeem_before_maturity() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);

    ctx.warp(START + SECONDS_PER_YEAR - 1);
    let result = ctx.engine.try_redeem(&BOND_ID, &ctx.user1);
    assert_eq!(result, Err(Ok(Error::NotMatured)));
    assert_eq!(ctx.fractions.balance_of(&BOND_ID, &ctx.user1), 150);
}

#[test]
fn test_redeem_at_maturity_keeps_accrued_coupons() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);

    // Principal 150 + two coupons of 7.5 = 165; sales brought in 142.5
    ctx.stablecoin_admin.mint(&ctx.issuer, &(30 * USD));
    ctx.engine.fund_reserve(&BOND_ID, &ctx.issuer, &(30 * USD));
    assert_eq!(ctx.engine.get_state(&BOND_ID).reserve, 172_500_000);

    ctx.warp(START + SECONDS_PER_YEAR + 100);
    let before = ctx.stablecoin.balance(&ctx.user1);
    let payout = ctx.engine.redeem(&BOND_ID, &ctx.user1);
    assert_eq!(payout, 150 * USD);
    assert_eq!(ctx.stablecoin.balance(&ctx.user1), before + payout);
    assert_eq!(ctx.fractions.balance_of(&BOND_ID, &ctx.user1), 0);
    assert_eq!(ctx.fractions.total_supply(&BOND_ID), 0);

    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &ctx.user1), 15_000_000);

    let state = ctx.engine.get_state(&BOND_ID);
    assert_eq!(state.total_principal_redeemed, 150 * USD);
    assert_eq!(state.total_coupons_paid, 15_000_000);
    assert_eq!(state.reserve, 7_500_000);

    let result = ctx.engine.try_redeem(&BOND_ID, &ctx.user1);
    assert_eq!(result, Err(Ok(Error::ZeroBalance)));
}

#[test]
fn test_redeem_blocked_by_thin_reserve() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);
    ctx.engine.withdraw_reserve(&BOND_ID, &(100 * USD));

    ctx.warp(START + SECONDS_PER_YEAR);
    let result = ctx.engine.try_redeem(&BOND_ID, &ctx.user1);
    assert_eq!(result, Err(Ok(Error::InsufficientReserve)));
    assert_eq!(ctx.fractions.balance_of(&BOND_ID, &ctx.user1), 150);
}

#[test]
fn test_withdraw_more_than_reserve() {
    let ctx = setup();

    let result = ctx.engine.try_withdraw_reserve(&BOND_ID, &1);
    assert_eq!(result, Err(Ok(Error::InsufficientReserve)));

    let result = ctx.engine.try_fund_reserve(&BOND_ID, &ctx.issuer, &USD);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
}

#[test]
fn test_decommission_stops_sales_only() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);

    ctx.warp(START + 10);
    ctx.engine.decommission(&BOND_ID);

    let state = ctx.engine.get_state(&BOND_ID);
    assert!(!state.active);
    assert_eq!(state.decommission_timestamp, Some(START + 10));

    let result = ctx.engine.try_purchase(&BOND_ID, &ctx.user1, &1);
    assert_eq!(result, Err(Ok(Error::IssueInactive)));

    let result = ctx.engine.try_decommission(&BOND_ID);
    assert_eq!(result, Err(Ok(Error::AlreadyDecommissioned)));

    // Coupons keep accruing for existing holders
    ctx.warp(START + HALF_YEAR);
    assert_eq!(ctx.engine.claim_coupon(&BOND_ID, &ctx.user1), 7_500_000);
}

#[test]
fn test_issue_fractions_and_required_reserve() {
    let ctx = setup();

    ctx.engine.issue_fractions(&BOND_ID, &ctx.user1, &2_000);
    assert_eq!(ctx.fractions.balance_of(&BOND_ID, &ctx.user1), 2_000);
    assert_eq!(ctx.engine.get_state(&BOND_ID).total_raised, 0);

    // Two whole bonds: principal 2,000 plus two coupons of 50 per bond
    assert_eq!(ctx.engine.required_reserve(&BOND_ID), 2_200 * USD);

    ctx.warp(START + HALF_YEAR);
    assert_eq!(ctx.engine.required_reserve(&BOND_ID), 2_100 * USD);

    let outsider = Address::generate(&ctx.env);
    let result = ctx.engine.try_issue_fractions(&BOND_ID, &outsider, &10);
    assert_eq!(result, Err(Ok(Error::NotWhitelisted)));
}

#[test]
fn test_pause_blocks_operations() {
    let ctx = setup();
    ctx.fund(&ctx.user1, 1_000 * USD);

    ctx.engine.pause();
    let result = ctx.engine.try_purchase(&BOND_ID, &ctx.user1, &150);
    assert_eq!(result, Err(Ok(Error::ContractPaused)));
    let result = ctx.engine.try_claim_coupon(&BOND_ID, &ctx.user1);
    assert_eq!(result, Err(Ok(Error::ContractPaused)));

    ctx.engine.unpause();
    ctx.engine.purchase(&BOND_ID, &ctx.user1, &150);
}

#[test]
fn test_unknown_bond() {
    let ctx = setup();

    assert_eq!(ctx.engine.try_get_terms(&99), Err(Ok(Error::IssueNotFound)));
    assert_eq!(
        ctx.engine.try_claim_coupon(&99, &ctx.user1),
        Err(Ok(Error::IssueNotFound))
    );
    assert_eq!(Error::IssueNotFound.kind(), ErrorKind::NotFound);
}

#[test]
#[should_panic]
fn test_on_transfer_only_from_fraction_token() {
    let ctx = setup();

    ctx.env.set_auths(&[]);
    ctx.engine
        .on_transfer(&BOND_ID, &ctx.user1, &150, &ctx.user2, &0);
}

#[test]
fn test_offering_document_attestation() {
    let ctx = setup();
    let content = Bytes::from_slice(&ctx.env, b"Municipal 5% 1Y offering circular");
    let hash: BytesN<32> = ctx.env.crypto().keccak256(&content).into();

    assert_eq!(
        ctx.engine.try_get_document_uri(&BOND_ID),
        Err(Ok(Error::DocumentNotSet))
    );
    assert_eq!(
        ctx.engine.try_verify_document(&BOND_ID, &content),
        Err(Ok(Error::DocumentNotSet))
    );
    assert_eq!(Error::DocumentNotSet.kind(), ErrorKind::NotFound);

    let uri = String::from_str(&ctx.env, "ipfs://muni5-circular");
    ctx.warp(START + 10);
    ctx.engine.set_document(&BOND_ID, &uri, &hash);

    assert_eq!(ctx.engine.get_document_uri(&BOND_ID), uri);
    assert_eq!(ctx.engine.get_document_hash(&BOND_ID), hash);
    assert_eq!(ctx.engine.get_document(&BOND_ID).updated_at, START + 10);
    assert!(ctx.engine.verify_document(&BOND_ID, &content));

    let tampered = Bytes::from_slice(&ctx.env, b"Municipal 9% 1Y offering circular");
    assert!(!ctx.engine.verify_document(&BOND_ID, &tampered));

    // Replacing the document re-points verification
    let revised_hash: BytesN<32> = ctx.env.crypto().keccak256(&tampered).into();
    ctx.engine.set_document(&BOND_ID, &uri, &revised_hash);
    assert!(ctx.engine.verify_document(&BOND_ID, &tampered));
    assert!(!ctx.engine.verify_document(&BOND_ID, &content));

    assert_eq!(
        ctx.engine.try_set_document(&7, &uri, &hash),
        Err(Ok(Error::IssueNotFound))
    );
}

#[test]
fn test_set_document_needs_issuer_auth() {
    let ctx = setup();
    let hash = BytesN::from_array(&ctx.env, &[7u8; 32]);
    let uri = String::from_str(&ctx.env, "ipfs://muni5-circular");

    ctx.engine.set_document(&BOND_ID, &uri, &hash);
    let auths = ctx.env.auths();
    assert_eq!(auths.len(), 1);
    assert_eq!(auths[0].0, ctx.issuer);
}
