use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::IdoError;

/// Creation-fee settings, read by value when a pool is created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeConfig {
    pub fee_mint: Option<Pubkey>,
    pub fee_amount: u64,
    pub burn_numerator: u64,
    pub burn_denominator: u64,
    pub fee_recipient: Pubkey,
}

impl FeeConfig {
    pub fn validate(&self) -> Result<()> {
        require!(self.burn_denominator > 0, IdoError::InvalidParameter);
        require!(
            self.burn_numerator <= self.burn_denominator,
            IdoError::InvalidParameter
        );
        require!(
            self.fee_amount == 0 || self.fee_mint.is_some(),
            IdoError::InvalidParameter
        );
        Ok(())
    }

    /// `(burned, forwarded)` parts of one creation fee
    pub fn split(&self) -> Result<(u64, u64)> {
        split_creation_fee(self.fee_amount, self.burn_numerator, self.burn_denominator)
    }
}

/// Pool registry: validates and instantiates sales, charges the creation fee
#[account]
#[derive(Default)]
pub struct IdoFactory {
    /// Administrator allowed to change the fee settings
    pub owner: Pubkey,
    /// Mint of the asset charged on pool creation, if any
    pub fee_mint: Option<Pubkey>,
    /// Fee charged per pool creation, in fee-mint base units
    pub fee_amount: u64,
    /// Burned share of the fee is `burn_numerator / burn_denominator`
    pub burn_numerator: u64,
    pub burn_denominator: u64,
    /// Wallet receiving the non-burned part of the fee
    pub fee_recipient: Pubkey,
    /// Number of pools created, also the seed index of the next pool
    pub pools_created: u64,
    pub bump: u8,
}

impl IdoFactory {
    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        33 + // fee_mint (Option<Pubkey>)
        8 +  // fee_amount
        8 +  // burn_numerator
        8 +  // burn_denominator
        32 + // fee_recipient
        8 +  // pools_created
        1;   // bump

    pub fn initialize(&mut self, owner: Pubkey, config: FeeConfig, bump: u8) -> Result<()> {
        config.validate()?;

        self.owner = owner;
        self.apply(config);
        self.pools_created = 0;
        self.bump = bump;
        Ok(())
    }

    pub fn configure(
        &mut self,
        caller: Pubkey,
        fee_mint: Option<Pubkey>,
        fee_amount: u64,
        burn_numerator: u64,
        burn_denominator: u64,
    ) -> Result<()> {
        self.ensure_owner(caller)?;

        let config = FeeConfig {
            fee_mint,
            fee_amount,
            burn_numerator,
            burn_denominator,
            fee_recipient: self.fee_recipient,
        };
        config.validate()?;
        self.apply(config);
        Ok(())
    }

    pub fn set_fee_recipient(&mut self, caller: Pubkey, recipient: Pubkey) -> Result<()> {
        self.ensure_owner(caller)?;
        self.fee_recipient = recipient;
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Pubkey, new_owner: Pubkey) -> Result<()> {
        self.ensure_owner(caller)?;
        require_keys_neq!(new_owner, Pubkey::default(), IdoError::InvalidParameter);
        self.owner = new_owner;
        Ok(())
    }

    pub fn fee_config(&self) -> FeeConfig {
        FeeConfig {
            fee_mint: self.fee_mint,
            fee_amount: self.fee_amount,
            burn_numerator: self.burn_numerator,
            burn_denominator: self.burn_denominator,
            fee_recipient: self.fee_recipient,
        }
    }

    /// Reserve the index for a new pool
    pub fn next_pool_index(&mut self) -> Result<u64> {
        let index = self.pools_created;
        self.pools_created = index.checked_add(1).ok_or(IdoError::MathOverflow)?;
        Ok(index)
    }

    fn ensure_owner(&self, caller: Pubkey) -> Result<()> {
        require_keys_eq!(caller, self.owner, IdoError::Unauthorized);
        Ok(())
    }

    fn apply(&mut self, config: FeeConfig) {
        self.fee_mint = config.fee_mint;
        self.fee_amount = config.fee_amount;
        self.burn_numerator = config.burn_numerator;
        self.burn_denominator = config.burn_denominator;
        self.fee_recipient = config.fee_recipient;
    }
}

/// Sale economics, fixed at creation
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FinancialParameters {
    /// Reward units (reward-decimal scaled) per 1 SOL contributed
    pub token_rate: u64,
    /// Reward units per 1 SOL provisioned as liquidity
    pub listing_rate: u64,
    pub soft_cap: u64,
    pub hard_cap: u64,
    /// Bounds on a contributor's cumulative investment
    pub min_invest: u64,
    pub max_invest: u64,
    /// Share of the raise committed to liquidity, 0..=100
    pub liquidity_percent: u8,
}

impl FinancialParameters {
    pub const SIZE: usize = 6 * 8 + 1;

    pub fn validate(&self) -> Result<()> {
        require!(self.soft_cap > 0, IdoError::InvalidParameter);
        require!(self.soft_cap <= self.hard_cap, IdoError::InvalidParameter);
        require!(self.min_invest <= self.max_invest, IdoError::InvalidParameter);
        require!(self.max_invest > 0, IdoError::InvalidParameter);
        require!(
            self.liquidity_percent as u64 <= PERCENT_DIVIDER,
            IdoError::InvalidParameter
        );
        require!(self.token_rate > 0, IdoError::InvalidParameter);
        require!(
            self.liquidity_percent == 0 || self.listing_rate > 0,
            IdoError::InvalidParameter
        );
        Ok(())
    }

    /// Reward asset needed to honour every entitlement if the hard cap is hit
    pub fn entitlement_reserve(&self) -> Result<u64> {
        calculate_entitlement(self.hard_cap, self.token_rate)
    }

    /// Reward asset needed to provision liquidity if the hard cap is hit
    pub fn liquidity_reserve(&self) -> Result<u64> {
        let base = calculate_liquidity_base(self.hard_cap, self.liquidity_percent)?;
        calculate_liquidity_reward(base, self.listing_rate)
    }

    /// Total reward asset escrowed into a new pool
    pub fn required_reward_reserve(&self) -> Result<u64> {
        self.entitlement_reserve()?
            .checked_add(self.liquidity_reserve()?)
            .ok_or_else(|| error!(IdoError::MathOverflow))
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamps {
    pub start: i64,
    pub end: i64,
    /// When the settlement's liquidity position becomes withdrawable
    pub unlock: i64,
}

impl Timestamps {
    pub const SIZE: usize = 3 * 8;

    pub fn validate(&self) -> Result<()> {
        require!(self.start < self.end, IdoError::InvalidParameter);
        require!(self.end < self.unlock, IdoError::InvalidParameter);
        Ok(())
    }
}

/// Liquidity venue used at settlement
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VenueDescriptor {
    /// Venue program receiving the `add_liquidity` call
    pub router: Pubkey,
    /// Venue configuration / pool factory account
    pub factory: Pubkey,
    /// Wrapped-SOL mint
    pub wrapped_base: Pubkey,
}

impl VenueDescriptor {
    pub const SIZE: usize = 3 * 32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    Pending,
    Active,
    Closed,
    Settled,
}

/// Amounts moved by one settlement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Lamports provisioned to the venue
    pub liquidity_base: u64,
    /// Reward asset provisioned to the venue
    pub liquidity_reward: u64,
    /// Lamports released to the owner
    pub residual_base: u64,
}

impl Settlement {
    /// Reject a venue call that pulled more from the pool than was offered
    pub fn verify_consumption(&self, base_spent: u64, reward_spent: u64) -> Result<()> {
        require!(base_spent <= self.liquidity_base, IdoError::VenueOverdraw);
        require!(
            reward_spent <= self.liquidity_reward,
            IdoError::VenueOverdraw
        );
        Ok(())
    }
}

/// One token sale
#[account]
pub struct IdoPool {
    pub owner: Pubkey,
    /// Registry that created this pool
    pub factory: Pubkey,
    /// Seed index assigned by the registry
    pub index: u64,
    pub reward_mint: Pubkey,
    /// Token account (PDA) holding the escrowed reward asset
    pub reward_vault: Pubkey,
    pub reward_decimals: u8,
    pub params: FinancialParameters,
    pub timestamps: Timestamps,
    pub venue: VenueDescriptor,
    /// Locker registry used at settlement
    pub locker_factory: Pubkey,
    pub metadata_uri: String,
    /// Lamports accepted so far
    pub total_invested: u64,
    /// Sum of all contributors' entitlements
    pub total_entitlement: u64,
    pub total_claimed: u64,
    pub total_refunded: u64,
    /// Reward asset escrowed at creation
    pub reward_reserve: u64,
    pub contributors: u32,
    pub settled: bool,
    /// Set once the owner recovers the escrow of a failed sale
    pub reserve_reclaimed: bool,
    pub created_at: i64,
    pub settled_at: Option<i64>,
    pub bump: u8,
    pub vault_bump: u8,
}

impl IdoPool {
    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        32 + // factory
        8 +  // index
        32 + // reward_mint
        32 + // reward_vault
        1 +  // reward_decimals
        FinancialParameters::SIZE +
        Timestamps::SIZE +
        VenueDescriptor::SIZE +
        32 + // locker_factory
        4 + MAX_METADATA_URI_LEN + // metadata_uri
        8 +  // total_invested
        8 +  // total_entitlement
        8 +  // total_claimed
        8 +  // total_refunded
        8 +  // reward_reserve
        4 +  // contributors
        1 +  // settled
        1 +  // reserve_reclaimed
        8 +  // created_at
        9 +  // settled_at (Option<i64>)
        1 +  // bump
        1;   // vault_bump

    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        owner: Pubkey,
        factory: Pubkey,
        index: u64,
        reward_mint: Pubkey,
        reward_vault: Pubkey,
        reward_decimals: u8,
        params: FinancialParameters,
        timestamps: Timestamps,
        venue: VenueDescriptor,
        locker_factory: Pubkey,
        metadata_uri: String,
        clock: &Clock,
        bump: u8,
        vault_bump: u8,
    ) -> Result<()> {
        params.validate()?;
        timestamps.validate()?;
        require!(
            metadata_uri.len() <= MAX_METADATA_URI_LEN,
            IdoError::MetadataTooLong
        );

        self.owner = owner;
        self.factory = factory;
        self.index = index;
        self.reward_mint = reward_mint;
        self.reward_vault = reward_vault;
        self.reward_decimals = reward_decimals;
        self.params = params;
        self.timestamps = timestamps;
        self.venue = venue;
        self.locker_factory = locker_factory;
        self.metadata_uri = metadata_uri;
        self.total_invested = 0;
        self.total_entitlement = 0;
        self.total_claimed = 0;
        self.total_refunded = 0;
        self.reward_reserve = params.required_reward_reserve()?;
        self.contributors = 0;
        self.settled = false;
        self.reserve_reclaimed = false;
        self.created_at = clock.unix_timestamp;
        self.settled_at = None;
        self.bump = bump;
        self.vault_bump = vault_bump;
        Ok(())
    }

    pub fn state(&self, now: i64) -> PoolState {
        if self.settled {
            PoolState::Settled
        } else if now < self.timestamps.start {
            PoolState::Pending
        } else if now < self.timestamps.end {
            PoolState::Active
        } else {
            PoolState::Closed
        }
    }

    /// The raise reached the soft cap
    pub fn is_successful(&self) -> bool {
        self.total_invested >= self.params.soft_cap
    }

    /// Entitlements not yet claimed
    pub fn outstanding_entitlement(&self) -> u64 {
        self.total_entitlement.saturating_sub(self.total_claimed)
    }

    /// Reward asset in the vault beyond what contributors can still claim
    pub fn surplus_reward(&self, vault_balance: u64) -> u64 {
        vault_balance.saturating_sub(self.outstanding_entitlement())
    }

    /// Accept `amount` lamports from `user`.
    ///
    /// Bounds apply to the contributor's cumulative investment; the entitlement
    /// is recomputed from that cumulative amount.
    pub fn record_payment(&mut self, user: &mut UserInfo, amount: u64, now: i64) -> Result<()> {
        match self.state(now) {
            PoolState::Pending => return err!(IdoError::WindowNotOpen),
            PoolState::Active => {}
            PoolState::Closed | PoolState::Settled => return err!(IdoError::WindowClosed),
        }
        require!(amount > 0, IdoError::InvalidAmount);

        let total_invested = self
            .total_invested
            .checked_add(amount)
            .ok_or(IdoError::MathOverflow)?;
        require!(
            total_invested <= self.params.hard_cap,
            IdoError::CapacityExceeded
        );

        let invested = user
            .invested_amount
            .checked_add(amount)
            .ok_or(IdoError::MathOverflow)?;
        require!(
            invested >= self.params.min_invest && invested <= self.params.max_invest,
            IdoError::InvalidAmount
        );

        let entitlement = calculate_entitlement(invested, self.params.token_rate)?;
        self.total_entitlement = self
            .total_entitlement
            .checked_sub(user.entitlement)
            .and_then(|total| total.checked_add(entitlement))
            .ok_or(IdoError::MathOverflow)?;

        if user.invested_amount == 0 {
            self.contributors = self
                .contributors
                .checked_add(1)
                .ok_or(IdoError::MathOverflow)?;
        }
        user.invested_amount = invested;
        user.entitlement = entitlement;
        self.total_invested = total_invested;
        Ok(())
    }

    /// Mark `user`'s entitlement as claimed and return it
    pub fn record_claim(&mut self, user: &mut UserInfo, now: i64) -> Result<u64> {
        match self.state(now) {
            PoolState::Pending | PoolState::Active => return err!(IdoError::WindowNotOpen),
            PoolState::Closed | PoolState::Settled => {}
        }
        require!(self.is_successful(), IdoError::SoftCapNotReached);
        require!(!user.claimed, IdoError::AlreadyClaimed);
        require!(user.invested_amount > 0, IdoError::NothingToClaim);

        self.total_claimed = self
            .total_claimed
            .checked_add(user.entitlement)
            .ok_or(IdoError::MathOverflow)?;
        user.claimed = true;
        Ok(user.entitlement)
    }

    /// Mark `user`'s contribution to a failed sale as refunded and return it
    pub fn record_refund(&mut self, user: &mut UserInfo, now: i64) -> Result<u64> {
        match self.state(now) {
            PoolState::Pending | PoolState::Active => return err!(IdoError::WindowNotOpen),
            PoolState::Closed | PoolState::Settled => {}
        }
        require!(!self.is_successful(), IdoError::SoftCapReached);
        require!(!user.refunded, IdoError::AlreadyRefunded);
        require!(user.invested_amount > 0, IdoError::NothingToClaim);

        self.total_refunded = self
            .total_refunded
            .checked_add(user.invested_amount)
            .ok_or(IdoError::MathOverflow)?;
        user.refunded = true;
        Ok(user.invested_amount)
    }

    /// Amounts a settlement by `caller` at `now` would move
    pub fn settlement_plan(&self, caller: Pubkey, now: i64) -> Result<Settlement> {
        require_keys_eq!(caller, self.owner, IdoError::Unauthorized);
        match self.state(now) {
            PoolState::Pending | PoolState::Active => return err!(IdoError::WindowNotOpen),
            PoolState::Settled => return err!(IdoError::AlreadySettled),
            PoolState::Closed => {}
        }
        require!(self.is_successful(), IdoError::SoftCapNotReached);

        let liquidity_base =
            calculate_liquidity_base(self.total_invested, self.params.liquidity_percent)?;
        let liquidity_reward =
            calculate_liquidity_reward(liquidity_base, self.params.listing_rate)?;
        let residual_base = self
            .total_invested
            .checked_sub(liquidity_base)
            .ok_or(IdoError::MathOverflow)?;

        Ok(Settlement {
            liquidity_base,
            liquidity_reward,
            residual_base,
        })
    }

    pub fn mark_settled(&mut self, now: i64) {
        self.settled = true;
        self.settled_at = Some(now);
    }

    /// Allow the owner of a failed sale to take the reward escrow back, once
    pub fn record_reserve_reclaim(&mut self, caller: Pubkey, now: i64) -> Result<()> {
        require_keys_eq!(caller, self.owner, IdoError::Unauthorized);
        match self.state(now) {
            PoolState::Pending | PoolState::Active => return err!(IdoError::WindowNotOpen),
            PoolState::Settled => return err!(IdoError::AlreadySettled),
            PoolState::Closed => {}
        }
        require!(!self.is_successful(), IdoError::SoftCapReached);
        require!(!self.reserve_reclaimed, IdoError::AlreadySettled);

        self.reserve_reclaimed = true;
        Ok(())
    }
}

/// Per-contributor accounting for one pool
#[account]
#[derive(Default)]
pub struct UserInfo {
    pub pool: Pubkey,
    pub contributor: Pubkey,
    /// Cumulative lamports contributed
    pub invested_amount: u64,
    /// Reward asset owed, fixed by the contribution rate
    pub entitlement: u64,
    pub claimed: bool,
    pub refunded: bool,
    pub bump: u8,
}

impl UserInfo {
    pub const SIZE: usize = 8 + // discriminator
        32 + // pool
        32 + // contributor
        8 +  // invested_amount
        8 +  // entitlement
        1 +  // claimed
        1 +  // refunded
        1;   // bump

    /// First contribution creates the record; later ones only re-check it
    pub fn bind(&mut self, pool: Pubkey, contributor: Pubkey, bump: u8) -> Result<()> {
        if self.pool == Pubkey::default() {
            self.pool = pool;
            self.contributor = contributor;
            self.bump = bump;
            return Ok(());
        }
        require_keys_eq!(self.pool, pool, IdoError::InvalidParameter);
        require_keys_eq!(self.contributor, contributor, IdoError::Unauthorized);
        Ok(())
    }
}

/// Locker registry: creates lockers and collects the creation fee in lamports
#[account]
#[derive(Default)]
pub struct LockerFactory {
    pub owner: Pubkey,
    /// Lamports charged per locker
    pub fee: u64,
    /// Fees held by this account and not yet withdrawn
    pub accrued_fees: u64,
    /// Number of lockers created, also the seed index of the next one
    pub lockers_created: u64,
    pub bump: u8,
}

impl LockerFactory {
    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        8 +  // fee
        8 +  // accrued_fees
        8 +  // lockers_created
        1;   // bump

    pub fn initialize(&mut self, owner: Pubkey, fee: u64, bump: u8) {
        self.owner = owner;
        self.fee = fee;
        self.accrued_fees = 0;
        self.lockers_created = 0;
        self.bump = bump;
    }

    pub fn set_fee(&mut self, caller: Pubkey, fee: u64) -> Result<()> {
        require_keys_eq!(caller, self.owner, IdoError::Unauthorized);
        self.fee = fee;
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Pubkey, new_owner: Pubkey) -> Result<()> {
        require_keys_eq!(caller, self.owner, IdoError::Unauthorized);
        require_keys_neq!(new_owner, Pubkey::default(), IdoError::InvalidParameter);
        self.owner = new_owner;
        Ok(())
    }

    /// Charge the configured fee against `offered` lamports.
    ///
    /// Returns the new locker's id and the fee actually taken; only the
    /// configured fee is taken even when more is offered.
    pub fn charge(&mut self, offered: u64) -> Result<(u64, u64)> {
        require!(offered >= self.fee, IdoError::InsufficientFee);

        let id = self.lockers_created;
        self.accrued_fees = self
            .accrued_fees
            .checked_add(self.fee)
            .ok_or(IdoError::MathOverflow)?;
        self.lockers_created = id.checked_add(1).ok_or(IdoError::MathOverflow)?;
        Ok((id, self.fee))
    }

    /// Drain the accrued fees for the owner
    pub fn take_fees(&mut self, caller: Pubkey) -> Result<u64> {
        require_keys_eq!(caller, self.owner, IdoError::Unauthorized);
        let amount = self.accrued_fees;
        require!(amount > 0, IdoError::NothingToClaim);
        self.accrued_fees = 0;
        Ok(amount)
    }
}

/// Escrow of a liquidity position until `unlock_time`
#[account]
pub struct Locker {
    pub id: u64,
    pub factory: Pubkey,
    pub beneficiary: Pubkey,
    pub lp_mint: Pubkey,
    /// Token account (PDA) holding the locked position
    pub vault: Pubkey,
    pub amount: u64,
    pub unlock_time: i64,
    pub created_at: i64,
    pub withdrawn: bool,
    pub bump: u8,
    pub vault_bump: u8,
}

impl Locker {
    pub const SIZE: usize = 8 + // discriminator
        8 +  // id
        32 + // factory
        32 + // beneficiary
        32 + // lp_mint
        32 + // vault
        8 +  // amount
        8 +  // unlock_time
        8 +  // created_at
        1 +  // withdrawn
        1 +  // bump
        1;   // vault_bump

    /// Check a stand-alone lock request
    pub fn validate_request(amount: u64, unlock_time: i64, now: i64) -> Result<()> {
        require!(amount > 0, IdoError::InvalidAmount);
        require!(unlock_time > now, IdoError::InvalidParameter);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        id: u64,
        factory: Pubkey,
        beneficiary: Pubkey,
        lp_mint: Pubkey,
        vault: Pubkey,
        amount: u64,
        unlock_time: i64,
        clock: &Clock,
        bump: u8,
        vault_bump: u8,
    ) {
        self.id = id;
        self.factory = factory;
        self.beneficiary = beneficiary;
        self.lp_mint = lp_mint;
        self.vault = vault;
        self.amount = amount;
        self.unlock_time = unlock_time;
        self.created_at = clock.unix_timestamp;
        self.withdrawn = false;
        self.bump = bump;
        self.vault_bump = vault_bump;
    }

    /// Release the position to the beneficiary once unlocked
    pub fn release(&mut self, caller: Pubkey, now: i64) -> Result<u64> {
        require_keys_eq!(caller, self.beneficiary, IdoError::Unauthorized);
        require!(now >= self.unlock_time, IdoError::StillLocked);
        require!(!self.withdrawn, IdoError::AlreadyWithdrawn);

        self.withdrawn = true;
        Ok(self.amount)
    }
}
