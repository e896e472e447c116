//! Instruction-level tests against a local bank
//!
//! The launchpad runs as a builtin next to two stand-in liquidity venues: one
//! that takes exactly what it is offered and mints a position, and one that
//! empties the reward source it is handed.

use anchor_lang::error::ERROR_CODE_OFFSET;
use anchor_lang::solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_option::COption,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
};
use anchor_lang::{AccountDeserialize, InstructionData, ToAccountMetas};
use anchor_spl::associated_token::{get_associated_token_address, spl_associated_token_account};
use anchor_spl::token::spl_token;
use ido_launchpad::constants::*;
use ido_launchpad::errors::IdoError;
use ido_launchpad::state::{
    FinancialParameters, IdoPool, Locker, LockerFactory, Timestamps, UserInfo, VenueDescriptor,
};
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    account::Account,
    clock::Clock,
    instruction::InstructionError,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

const SOL: u64 = 1_000_000_000;
const TOKEN: u64 = 1_000_000_000;
const CREATION_FEE: u64 = 1_000 * TOKEN;
const LOCKER_FEE: u64 = SOL / 10;
const CREATOR_SUPPLY: u64 = 10_000 * TOKEN;

const VENUE_ID: Pubkey = Pubkey::new_from_array([0x56; 32]);
const GREEDY_VENUE_ID: Pubkey = Pubkey::new_from_array([0x47; 32]);
const VENUE_FACTORY: Pubkey = Pubkey::new_from_array([0x46; 32]);
const LP_AUTHORITY_SEED: &[u8] = b"lp_authority";

// Anchor's entry wants the account slice to live as long as the accounts
fn process_ido<'a, 'b, 'c>(
    program_id: &'a Pubkey,
    accounts: &'b [AccountInfo<'c>],
    data: &[u8],
) -> ProgramResult {
    let accounts: &'c [AccountInfo<'c>] = Box::leak(accounts.to_vec().into_boxed_slice());
    ido_launchpad::entry(program_id, accounts, data)
}

fn read_amounts(data: &[u8]) -> Result<(u64, u64), ProgramError> {
    if data.len() != 24 || data[..8] != ido_launchpad::venue::add_liquidity_discriminator() {
        return Err(ProgramError::InvalidInstructionData);
    }
    let amount = |range: std::ops::Range<usize>| {
        <[u8; 8]>::try_from(&data[range])
            .map(u64::from_le_bytes)
            .map_err(|_| ProgramError::InvalidInstructionData)
    };
    Ok((amount(8..16)?, amount(16..24)?))
}

/// Venue that takes exactly the offered amounts and mints one position unit
/// per base lamport.
///
/// Remaining accounts: base reserve, reward reserve, position mint authority.
fn process_venue(program_id: &Pubkey, accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
    let (amount_base, amount_reward) = read_amounts(data)?;
    let [
        authority,
        base_source,
        reward_source,
        lp_recipient,
        lp_mint,
        _base_mint,
        _reward_mint,
        _factory,
        base_program,
        reward_program,
        lp_program,
        base_reserve,
        reward_reserve,
        lp_authority,
        ..,
    ] = accounts
    else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };

    invoke(
        &spl_token::instruction::transfer(
            base_program.key,
            base_source.key,
            base_reserve.key,
            authority.key,
            &[],
            amount_base,
        )?,
        accounts,
    )?;
    invoke(
        &spl_token::instruction::transfer(
            reward_program.key,
            reward_source.key,
            reward_reserve.key,
            authority.key,
            &[],
            amount_reward,
        )?,
        accounts,
    )?;

    let (expected_authority, bump) =
        Pubkey::find_program_address(&[LP_AUTHORITY_SEED], program_id);
    if *lp_authority.key != expected_authority {
        return Err(ProgramError::InvalidSeeds);
    }
    invoke_signed(
        &spl_token::instruction::mint_to(
            lp_program.key,
            lp_mint.key,
            lp_recipient.key,
            lp_authority.key,
            &[],
            amount_base,
        )?,
        accounts,
        &[&[LP_AUTHORITY_SEED, &[bump]]],
    )
}

/// Venue that drains the whole reward source and mints nothing
fn process_greedy_venue(
    _program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let (amount_base, _) = read_amounts(data)?;
    let [
        authority,
        base_source,
        reward_source,
        _lp_recipient,
        _lp_mint,
        _base_mint,
        _reward_mint,
        _factory,
        base_program,
        reward_program,
        _lp_program,
        base_reserve,
        reward_reserve,
        ..,
    ] = accounts
    else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };

    let balance = spl_token::state::Account::unpack(&reward_source.try_borrow_data()?)?.amount;
    invoke(
        &spl_token::instruction::transfer(
            base_program.key,
            base_source.key,
            base_reserve.key,
            authority.key,
            &[],
            amount_base,
        )?,
        accounts,
    )?;
    invoke(
        &spl_token::instruction::transfer(
            reward_program.key,
            reward_source.key,
            reward_reserve.key,
            authority.key,
            &[],
            balance,
        )?,
        accounts,
    )
}

fn pda(seeds: &[&[u8]]) -> Pubkey {
    Pubkey::find_program_address(seeds, &ido_launchpad::ID).0
}

fn factory_address() -> Pubkey {
    pda(&[FACTORY_SEED])
}

fn locker_factory_address() -> Pubkey {
    pda(&[LOCKER_FACTORY_SEED])
}

fn pool_address(index: u64) -> Pubkey {
    pda(&[POOL_SEED, factory_address().as_ref(), &index.to_le_bytes()])
}

fn locker_address(id: u64) -> Pubkey {
    pda(&[LOCKER_SEED, locker_factory_address().as_ref(), &id.to_le_bytes()])
}

fn lp_authority() -> Pubkey {
    Pubkey::find_program_address(&[LP_AUTHORITY_SEED], &VENUE_ID).0
}

fn native_mint_account() -> Account {
    let mut data = vec![0u8; spl_token::state::Mint::LEN];
    let mint = spl_token::state::Mint {
        mint_authority: COption::None,
        supply: 0,
        decimals: BASE_DECIMALS,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    spl_token::state::Mint::pack(mint, &mut data).unwrap();
    Account {
        lamports: 1_461_600,
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

async fn send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context.get_new_latest_blockhash().await.unwrap();
    let mut all_signers = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers,
        blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

fn error_code(result: Result<(), BanksClientError>) -> u32 {
    match result.unwrap_err().unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => code,
        other => panic!("unexpected error: {other:?}"),
    }
}

fn code(error: IdoError) -> u32 {
    error as u32 + ERROR_CODE_OFFSET
}

async fn lamports(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    context.banks_client.get_balance(address).await.unwrap()
}

async fn token_balance(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    let account = context.banks_client.get_account(address).await.unwrap().unwrap();
    spl_token::state::Account::unpack(&account.data).unwrap().amount
}

async fn mint_supply(context: &mut ProgramTestContext, mint: Pubkey) -> u64 {
    let account = context.banks_client.get_account(mint).await.unwrap().unwrap();
    spl_token::state::Mint::unpack(&account.data).unwrap().supply
}

async fn fetch<T: AccountDeserialize>(context: &mut ProgramTestContext, address: Pubkey) -> T {
    let account = context.banks_client.get_account(address).await.unwrap().unwrap();
    T::try_deserialize(&mut account.data.as_slice()).unwrap()
}

async fn rent_for(context: &mut ProgramTestContext, size: usize) -> u64 {
    context.banks_client.get_rent().await.unwrap().minimum_balance(size)
}

async fn warp_to(context: &mut ProgramTestContext, unix_timestamp: i64) {
    let mut clock: Clock = context.banks_client.get_sysvar().await.unwrap();
    clock.unix_timestamp = unix_timestamp;
    context.set_sysvar(&clock);
}

async fn create_mint(context: &mut ProgramTestContext, authority: &Pubkey) -> Pubkey {
    let mint = Keypair::new();
    let rent = rent_for(context, spl_token::state::Mint::LEN).await;
    let payer = context.payer.pubkey();
    let instructions = [
        system_instruction::create_account(
            &payer,
            &mint.pubkey(),
            rent,
            spl_token::state::Mint::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_mint(&spl_token::id(), &mint.pubkey(), authority, None, 9)
            .unwrap(),
    ];
    send(context, &instructions, &[&mint]).await.unwrap();
    mint.pubkey()
}

/// Create `wallet`'s associated account for `mint` and mint `amount` into it
/// (the test payer is the mint authority).
async fn fund_token_account(
    context: &mut ProgramTestContext,
    wallet: &Pubkey,
    mint: &Pubkey,
    amount: u64,
) -> Pubkey {
    let payer = context.payer.pubkey();
    let address = get_associated_token_address(wallet, mint);
    let mut instructions = vec![
        spl_associated_token_account::instruction::create_associated_token_account(
            &payer,
            wallet,
            mint,
            &spl_token::id(),
        ),
    ];
    if amount > 0 {
        instructions.push(
            spl_token::instruction::mint_to(&spl_token::id(), mint, &address, &payer, &[], amount)
                .unwrap(),
        );
    }
    send(context, &instructions, &[]).await.unwrap();
    address
}

struct Harness {
    context: ProgramTestContext,
    creator: Keypair,
    contributor: Keypair,
    fee_recipient: Pubkey,
    fee_mint: Pubkey,
    reward_mint: Pubkey,
    lp_mint: Pubkey,
    base_reserve: Pubkey,
    reward_reserve: Pubkey,
    start: i64,
    end: i64,
    unlock: i64,
}

impl Harness {
    /// Registries with a 1000-token creation fee (15% burned) and a 0.1 SOL
    /// locker fee, a creator holding the reward asset, and an empty venue pool.
    async fn new() -> Self {
        let mut program_test = ProgramTest::new(
            "ido_launchpad",
            ido_launchpad::ID,
            processor!(process_ido),
        );
        program_test.add_program("honest_venue", VENUE_ID, processor!(process_venue));
        program_test.add_program("greedy_venue", GREEDY_VENUE_ID, processor!(process_greedy_venue));
        program_test.add_account(spl_token::native_mint::id(), native_mint_account());

        let mut context = program_test.start_with_context().await;
        let creator = Keypair::new();
        let contributor = Keypair::new();
        let fee_recipient = Pubkey::new_unique();
        let payer = context.payer.pubkey();
        send(
            &mut context,
            &[
                system_instruction::transfer(&payer, &creator.pubkey(), 20 * SOL),
                system_instruction::transfer(&payer, &contributor.pubkey(), 20 * SOL),
            ],
            &[],
        )
        .await
        .unwrap();

        let fee_mint = create_mint(&mut context, &payer).await;
        let reward_mint = create_mint(&mut context, &payer).await;
        let lp_mint = create_mint(&mut context, &lp_authority()).await;
        fund_token_account(&mut context, &creator.pubkey(), &fee_mint, CREATION_FEE).await;
        fund_token_account(&mut context, &fee_recipient, &fee_mint, 0).await;
        fund_token_account(&mut context, &creator.pubkey(), &reward_mint, CREATOR_SUPPLY).await;
        let base_reserve =
            fund_token_account(&mut context, &lp_authority(), &spl_token::native_mint::id(), 0).await;
        let reward_reserve = fund_token_account(&mut context, &lp_authority(), &reward_mint, 0).await;

        let registries = [
            Instruction {
                program_id: ido_launchpad::ID,
                accounts: ido_launchpad::accounts::InitializeFactory {
                    owner: payer,
                    ido_factory: factory_address(),
                    system_program: system_program::ID,
                }
                .to_account_metas(None),
                data: ido_launchpad::instruction::InitializeFactory {
                    fee_mint: Some(fee_mint),
                    fee_amount: CREATION_FEE,
                    burn_numerator: 15,
                    burn_denominator: 100,
                    fee_recipient,
                }
                .data(),
            },
            Instruction {
                program_id: ido_launchpad::ID,
                accounts: ido_launchpad::accounts::InitializeLockerFactory {
                    owner: payer,
                    locker_factory: locker_factory_address(),
                    system_program: system_program::ID,
                }
                .to_account_metas(None),
                data: ido_launchpad::instruction::InitializeLockerFactory { fee: LOCKER_FEE }.data(),
            },
        ];
        send(&mut context, &registries, &[]).await.unwrap();

        let clock: Clock = context.banks_client.get_sysvar().await.unwrap();
        let now = clock.unix_timestamp;
        Self {
            context,
            creator,
            contributor,
            fee_recipient,
            fee_mint,
            reward_mint,
            lp_mint,
            base_reserve,
            reward_reserve,
            start: now + 100,
            end: now + 200,
            unlock: now + 300,
        }
    }

    /// 2 SOL hard cap, 1 SOL soft cap, 1000 tokens per SOL, 500 per SOL at
    /// listing, 60% of the raise to liquidity
    fn params() -> FinancialParameters {
        FinancialParameters {
            token_rate: 1_000 * TOKEN,
            listing_rate: 500 * TOKEN,
            soft_cap: SOL,
            hard_cap: 2 * SOL,
            min_invest: 0,
            max_invest: 2 * SOL,
            liquidity_percent: 60,
        }
    }

    async fn create_pool(&mut self, router: Pubkey) -> Pubkey {
        let factory: ido_launchpad::state::IdoFactory =
            fetch(&mut self.context, factory_address()).await;
        let pool = pool_address(factory.pools_created);
        let creator = self.creator.pubkey();
        let ix = Instruction {
            program_id: ido_launchpad::ID,
            accounts: ido_launchpad::accounts::CreatePool {
                creator,
                ido_factory: factory_address(),
                ido_pool: pool,
                reward_mint: self.reward_mint,
                reward_vault: pda(&[REWARD_VAULT_SEED, pool.as_ref()]),
                creator_reward_account: get_associated_token_address(&creator, &self.reward_mint),
                locker_factory: locker_factory_address(),
                fee_mint: Some(self.fee_mint),
                creator_fee_account: Some(get_associated_token_address(&creator, &self.fee_mint)),
                fee_recipient_account: Some(get_associated_token_address(
                    &self.fee_recipient,
                    &self.fee_mint,
                )),
                fee_token_program: Some(spl_token::id()),
                token_program: spl_token::id(),
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ido_launchpad::instruction::CreatePool {
                params: Self::params(),
                timestamps: Timestamps {
                    start: self.start,
                    end: self.end,
                    unlock: self.unlock,
                },
                venue: VenueDescriptor {
                    router,
                    factory: VENUE_FACTORY,
                    wrapped_base: spl_token::native_mint::id(),
                },
                metadata_uri: "https://example.org/sale.json".to_string(),
            }
            .data(),
        };
        let creator = self.creator.insecure_clone();
        send(&mut self.context, &[ix], &[&creator]).await.unwrap();
        pool
    }

    async fn pay(&mut self, pool: Pubkey, amount: u64) -> Result<(), BanksClientError> {
        let contributor = self.contributor.pubkey();
        let ix = Instruction {
            program_id: ido_launchpad::ID,
            accounts: ido_launchpad::accounts::Pay {
                contributor,
                ido_pool: pool,
                user_info: pda(&[USER_INFO_SEED, pool.as_ref(), contributor.as_ref()]),
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ido_launchpad::instruction::Pay { amount }.data(),
        };
        send(&mut self.context, &[ix], &[&self.contributor]).await
    }

    async fn claim(&mut self, pool: Pubkey) -> Result<(), BanksClientError> {
        let contributor = self.contributor.pubkey();
        let ix = Instruction {
            program_id: ido_launchpad::ID,
            accounts: ido_launchpad::accounts::Claim {
                contributor,
                ido_pool: pool,
                user_info: pda(&[USER_INFO_SEED, pool.as_ref(), contributor.as_ref()]),
                reward_mint: self.reward_mint,
                reward_vault: pda(&[REWARD_VAULT_SEED, pool.as_ref()]),
                contributor_reward_account: get_associated_token_address(
                    &contributor,
                    &self.reward_mint,
                ),
                token_program: spl_token::id(),
                associated_token_program: spl_associated_token_account::ID,
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ido_launchpad::instruction::Claim {}.data(),
        };
        send(&mut self.context, &[ix], &[&self.contributor]).await
    }

    async fn refund(&mut self, pool: Pubkey) -> Result<(), BanksClientError> {
        let contributor = self.contributor.pubkey();
        let ix = Instruction {
            program_id: ido_launchpad::ID,
            accounts: ido_launchpad::accounts::Refund {
                contributor,
                ido_pool: pool,
                user_info: pda(&[USER_INFO_SEED, pool.as_ref(), contributor.as_ref()]),
            }
            .to_account_metas(None),
            data: ido_launchpad::instruction::Refund {}.data(),
        };
        send(&mut self.context, &[ix], &[&self.contributor]).await
    }

    async fn reclaim_reserve(&mut self, pool: Pubkey) -> Result<(), BanksClientError> {
        let owner = self.creator.pubkey();
        let ix = Instruction {
            program_id: ido_launchpad::ID,
            accounts: ido_launchpad::accounts::ReclaimReserve {
                owner,
                ido_pool: pool,
                reward_mint: self.reward_mint,
                reward_vault: pda(&[REWARD_VAULT_SEED, pool.as_ref()]),
                owner_reward_account: get_associated_token_address(&owner, &self.reward_mint),
                token_program: spl_token::id(),
                associated_token_program: spl_associated_token_account::ID,
                system_program: system_program::ID,
            }
            .to_account_metas(None),
            data: ido_launchpad::instruction::ReclaimReserve {}.data(),
        };
        send(&mut self.context, &[ix], &[&self.creator]).await
    }

    async fn withdraw(
        &mut self,
        pool: Pubkey,
        router: Pubkey,
        locker_fee: u64,
    ) -> Result<(), BanksClientError> {
        let registry: LockerFactory = fetch(&mut self.context, locker_factory_address()).await;
        let locker = locker_address(registry.lockers_created);
        let owner = self.creator.pubkey();
        let mut accounts = ido_launchpad::accounts::Withdraw {
            owner,
            ido_pool: pool,
            reward_mint: self.reward_mint,
            reward_vault: pda(&[REWARD_VAULT_SEED, pool.as_ref()]),
            owner_reward_account: get_associated_token_address(&owner, &self.reward_mint),
            wrapped_base_mint: spl_token::native_mint::id(),
            pool_wrapped_base: pda(&[WRAPPED_BASE_SEED, pool.as_ref()]),
            lp_mint: self.lp_mint,
            locker_factory: locker_factory_address(),
            locker,
            locker_vault: pda(&[LOCKER_VAULT_SEED, locker.as_ref()]),
            venue_program: router,
            venue_factory: VENUE_FACTORY,
            token_program: spl_token::id(),
            base_token_program: spl_token::id(),
            lp_token_program: spl_token::id(),
            associated_token_program: spl_associated_token_account::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None);
        accounts.extend([
            AccountMeta::new(self.base_reserve, false),
            AccountMeta::new(self.reward_reserve, false),
            AccountMeta::new_readonly(lp_authority(), false),
        ]);
        let ix = Instruction {
            program_id: ido_launchpad::ID,
            accounts,
            data: ido_launchpad::instruction::Withdraw { locker_fee }.data(),
        };
        send(&mut self.context, &[ix], &[&self.creator]).await
    }
}

#[tokio::test]
async fn creation_burns_fee_share_and_escrows_reserve() {
    let mut h = Harness::new().await;
    let fee_supply = mint_supply(&mut h.context, h.fee_mint).await;

    let pool = h.create_pool(VENUE_ID).await;

    let recipient_account = get_associated_token_address(&h.fee_recipient, &h.fee_mint);
    let creator_fee_account = get_associated_token_address(&h.creator.pubkey(), &h.fee_mint);
    assert_eq!(token_balance(&mut h.context, recipient_account).await, 850 * TOKEN);
    assert_eq!(token_balance(&mut h.context, creator_fee_account).await, 0);
    assert_eq!(
        mint_supply(&mut h.context, h.fee_mint).await,
        fee_supply - 150 * TOKEN
    );

    // 2000 tokens of entitlements at the hard cap plus 600 for liquidity
    let vault = pda(&[REWARD_VAULT_SEED, pool.as_ref()]);
    assert_eq!(token_balance(&mut h.context, vault).await, 2_600 * TOKEN);
    let creator_reward = get_associated_token_address(&h.creator.pubkey(), &h.reward_mint);
    assert_eq!(
        token_balance(&mut h.context, creator_reward).await,
        CREATOR_SUPPLY - 2_600 * TOKEN
    );

    let state: IdoPool = fetch(&mut h.context, pool).await;
    assert_eq!(state.reward_reserve, 2_600 * TOKEN);
    assert_eq!(state.index, 0);
}

#[tokio::test]
async fn full_sale_settles_into_venue_and_locker() {
    let mut h = Harness::new().await;
    let pool = h.create_pool(VENUE_ID).await;
    warp_to(&mut h.context, h.start).await;
    h.pay(pool, 2 * SOL).await.unwrap();
    warp_to(&mut h.context, h.end).await;

    let owner = h.creator.pubkey();
    let pool_before = lamports(&mut h.context, pool).await;
    let registry_before = lamports(&mut h.context, locker_factory_address()).await;
    let owner_before = lamports(&mut h.context, owner).await;
    let locker = locker_address(0);
    let locker_rent = rent_for(&mut h.context, Locker::SIZE).await;
    let vault_rent = rent_for(&mut h.context, spl_token::state::Account::LEN).await;

    // Offering twice the fee still moves only the fee
    h.withdraw(pool, VENUE_ID, 2 * LOCKER_FEE).await.unwrap();

    assert_eq!(lamports(&mut h.context, pool).await, pool_before - 2 * SOL);
    assert_eq!(
        lamports(&mut h.context, locker_factory_address()).await,
        registry_before + LOCKER_FEE
    );
    // 0.8 SOL residual, less the locker fee and the rent of the locker and its vault
    assert_eq!(
        lamports(&mut h.context, owner).await,
        owner_before + 8 * SOL / 10 - LOCKER_FEE - locker_rent - vault_rent
    );

    let wrapped = pda(&[WRAPPED_BASE_SEED, pool.as_ref()]);
    assert!(h.context.banks_client.get_account(wrapped).await.unwrap().is_none());
    assert_eq!(token_balance(&mut h.context, h.base_reserve).await, 1_200_000_000);
    assert_eq!(token_balance(&mut h.context, h.reward_reserve).await, 600 * TOKEN);

    let locker_vault = pda(&[LOCKER_VAULT_SEED, locker.as_ref()]);
    assert_eq!(token_balance(&mut h.context, locker_vault).await, 1_200_000_000);
    let record: Locker = fetch(&mut h.context, locker).await;
    assert_eq!(record.beneficiary, owner);
    assert_eq!(record.amount, 1_200_000_000);
    assert_eq!(record.unlock_time, h.unlock);

    // Entitlements stay in the vault; nothing is surplus at the hard cap
    let vault = pda(&[REWARD_VAULT_SEED, pool.as_ref()]);
    assert_eq!(token_balance(&mut h.context, vault).await, 2_000 * TOKEN);
    let owner_reward = get_associated_token_address(&owner, &h.reward_mint);
    assert_eq!(
        token_balance(&mut h.context, owner_reward).await,
        CREATOR_SUPPLY - 2_600 * TOKEN
    );

    let state: IdoPool = fetch(&mut h.context, pool).await;
    assert!(state.settled);
    let registry: LockerFactory = fetch(&mut h.context, locker_factory_address()).await;
    assert_eq!(registry.accrued_fees, LOCKER_FEE);
    assert_eq!(registry.lockers_created, 1);

    h.claim(pool).await.unwrap();
    let contributor_reward = get_associated_token_address(&h.contributor.pubkey(), &h.reward_mint);
    assert_eq!(token_balance(&mut h.context, contributor_reward).await, 2_000 * TOKEN);
    assert_eq!(token_balance(&mut h.context, vault).await, 0);

    let again = h.withdraw(pool, VENUE_ID, LOCKER_FEE).await;
    assert_eq!(error_code(again), code(IdoError::AlreadySettled));
}

#[tokio::test]
async fn short_locker_fee_rolls_back_settlement() {
    let mut h = Harness::new().await;
    let pool = h.create_pool(VENUE_ID).await;
    warp_to(&mut h.context, h.start).await;
    h.pay(pool, 2 * SOL).await.unwrap();
    warp_to(&mut h.context, h.end).await;

    let vault = pda(&[REWARD_VAULT_SEED, pool.as_ref()]);
    let pool_before = lamports(&mut h.context, pool).await;
    let owner_before = lamports(&mut h.context, h.creator.pubkey()).await;
    let registry_before = lamports(&mut h.context, locker_factory_address()).await;

    let result = h.withdraw(pool, VENUE_ID, LOCKER_FEE - 1).await;
    assert_eq!(error_code(result), code(IdoError::InsufficientFee));

    // The venue call ran before the fee check; none of it survives
    assert_eq!(lamports(&mut h.context, pool).await, pool_before);
    assert_eq!(lamports(&mut h.context, h.creator.pubkey()).await, owner_before);
    assert_eq!(
        lamports(&mut h.context, locker_factory_address()).await,
        registry_before
    );
    assert_eq!(token_balance(&mut h.context, vault).await, 2_600 * TOKEN);
    assert_eq!(token_balance(&mut h.context, h.base_reserve).await, 0);
    assert_eq!(token_balance(&mut h.context, h.reward_reserve).await, 0);
    assert_eq!(mint_supply(&mut h.context, h.lp_mint).await, 0);
    let wrapped = pda(&[WRAPPED_BASE_SEED, pool.as_ref()]);
    assert!(h.context.banks_client.get_account(wrapped).await.unwrap().is_none());
    let state: IdoPool = fetch(&mut h.context, pool).await;
    assert!(!state.settled);

    h.withdraw(pool, VENUE_ID, LOCKER_FEE).await.unwrap();
    let state: IdoPool = fetch(&mut h.context, pool).await;
    assert!(state.settled);
}

#[tokio::test]
async fn venue_cannot_take_entitlement_reserve() {
    let mut h = Harness::new().await;
    let pool = h.create_pool(GREEDY_VENUE_ID).await;
    warp_to(&mut h.context, h.start).await;
    h.pay(pool, 2 * SOL).await.unwrap();
    warp_to(&mut h.context, h.end).await;

    let vault = pda(&[REWARD_VAULT_SEED, pool.as_ref()]);
    let pool_before = lamports(&mut h.context, pool).await;

    let result = h.withdraw(pool, GREEDY_VENUE_ID, LOCKER_FEE).await;
    assert_eq!(error_code(result), code(IdoError::VenueOverdraw));

    assert_eq!(token_balance(&mut h.context, vault).await, 2_600 * TOKEN);
    assert_eq!(token_balance(&mut h.context, h.reward_reserve).await, 0);
    assert_eq!(lamports(&mut h.context, pool).await, pool_before);
    let state: IdoPool = fetch(&mut h.context, pool).await;
    assert!(!state.settled);

    // Contributors can still be paid in full
    h.claim(pool).await.unwrap();
    let contributor_reward = get_associated_token_address(&h.contributor.pubkey(), &h.reward_mint);
    assert_eq!(token_balance(&mut h.context, contributor_reward).await, 2_000 * TOKEN);
}

#[tokio::test]
async fn failed_sale_refunds_contributors_and_reserve() {
    let mut h = Harness::new().await;
    let pool = h.create_pool(VENUE_ID).await;
    warp_to(&mut h.context, h.start).await;
    h.pay(pool, SOL / 2).await.unwrap();
    warp_to(&mut h.context, h.end).await;

    let result = h.claim(pool).await;
    assert_eq!(error_code(result), code(IdoError::SoftCapNotReached));
    let result = h.withdraw(pool, VENUE_ID, LOCKER_FEE).await;
    assert_eq!(error_code(result), code(IdoError::SoftCapNotReached));

    let contributor = h.contributor.pubkey();
    let before = lamports(&mut h.context, contributor).await;
    h.refund(pool).await.unwrap();
    assert_eq!(lamports(&mut h.context, contributor).await, before + SOL / 2);

    let user_info: UserInfo = fetch(
        &mut h.context,
        pda(&[USER_INFO_SEED, pool.as_ref(), contributor.as_ref()]),
    )
    .await;
    assert!(user_info.refunded);

    let again = h.refund(pool).await;
    assert_eq!(error_code(again), code(IdoError::AlreadyRefunded));

    h.reclaim_reserve(pool).await.unwrap();
    let creator_reward = get_associated_token_address(&h.creator.pubkey(), &h.reward_mint);
    assert_eq!(token_balance(&mut h.context, creator_reward).await, CREATOR_SUPPLY);
}

#[tokio::test]
async fn payments_respect_window_and_hard_cap() {
    let mut h = Harness::new().await;
    let pool = h.create_pool(VENUE_ID).await;

    let early = h.pay(pool, SOL).await;
    assert_eq!(error_code(early), code(IdoError::WindowNotOpen));

    warp_to(&mut h.context, h.start).await;
    h.pay(pool, 2 * SOL).await.unwrap();
    let over = h.pay(pool, 1).await;
    assert_eq!(error_code(over), code(IdoError::CapacityExceeded));

    let state: IdoPool = fetch(&mut h.context, pool).await;
    assert_eq!(state.total_invested, 2 * SOL);
    assert_eq!(state.total_entitlement, 2_000 * TOKEN);
    assert_eq!(state.contributors, 1);

    warp_to(&mut h.context, h.end).await;
    let late = h.pay(pool, 1).await;
    assert_eq!(error_code(late), code(IdoError::WindowClosed));
}

#[tokio::test]
async fn standalone_locker_holds_position_for_beneficiary() {
    let mut h = Harness::new().await;
    let payer = h.context.payer.pubkey();
    let depositor = h.creator.insecure_clone();
    let beneficiary = Keypair::new();
    send(
        &mut h.context,
        &[system_instruction::transfer(&payer, &beneficiary.pubkey(), SOL)],
        &[],
    )
    .await
    .unwrap();

    let position_mint = create_mint(&mut h.context, &payer).await;
    let depositor_account =
        fund_token_account(&mut h.context, &depositor.pubkey(), &position_mint, 500).await;

    let locker = locker_address(0);
    let locker_vault = pda(&[LOCKER_VAULT_SEED, locker.as_ref()]);
    let lock = |locker_fee: u64| Instruction {
        program_id: ido_launchpad::ID,
        accounts: ido_launchpad::accounts::CreateLocker {
            creator: depositor.pubkey(),
            locker_factory: locker_factory_address(),
            locker,
            lp_mint: position_mint,
            locker_vault,
            creator_lp_account: depositor_account,
            token_program: spl_token::id(),
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: ido_launchpad::instruction::CreateLocker {
            locker_fee,
            amount: 500,
            unlock_time: h.unlock,
            beneficiary: beneficiary.pubkey(),
        }
        .data(),
    };

    let registry_before = lamports(&mut h.context, locker_factory_address()).await;
    let short = send(&mut h.context, &[lock(LOCKER_FEE - 1)], &[&depositor]).await;
    assert_eq!(error_code(short), code(IdoError::InsufficientFee));
    assert_eq!(
        lamports(&mut h.context, locker_factory_address()).await,
        registry_before
    );
    assert_eq!(token_balance(&mut h.context, depositor_account).await, 500);

    send(&mut h.context, &[lock(2 * LOCKER_FEE)], &[&depositor])
        .await
        .unwrap();
    assert_eq!(
        lamports(&mut h.context, locker_factory_address()).await,
        registry_before + LOCKER_FEE
    );
    assert_eq!(token_balance(&mut h.context, locker_vault).await, 500);
    let record: Locker = fetch(&mut h.context, locker).await;
    assert_eq!(record.beneficiary, beneficiary.pubkey());

    let unlock = |signer: &Keypair| Instruction {
        program_id: ido_launchpad::ID,
        accounts: ido_launchpad::accounts::Unlock {
            beneficiary: signer.pubkey(),
            locker,
            lp_mint: position_mint,
            locker_vault,
            beneficiary_lp_account: get_associated_token_address(&signer.pubkey(), &position_mint),
            token_program: spl_token::id(),
            associated_token_program: spl_associated_token_account::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: ido_launchpad::instruction::Unlock {}.data(),
    };

    let early = send(&mut h.context, &[unlock(&beneficiary)], &[&beneficiary]).await;
    assert_eq!(error_code(early), code(IdoError::StillLocked));

    warp_to(&mut h.context, h.unlock).await;
    let stranger = send(&mut h.context, &[unlock(&depositor)], &[&depositor]).await;
    assert_eq!(error_code(stranger), code(IdoError::Unauthorized));

    send(&mut h.context, &[unlock(&beneficiary)], &[&beneficiary])
        .await
        .unwrap();
    let released = get_associated_token_address(&beneficiary.pubkey(), &position_mint);
    assert_eq!(token_balance(&mut h.context, released).await, 500);
    assert_eq!(token_balance(&mut h.context, locker_vault).await, 0);
}
