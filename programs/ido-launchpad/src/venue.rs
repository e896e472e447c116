//! Cross-program call into the liquidity venue.
//!
//! The venue exposes an Anchor-style `add_liquidity(amount_a, amount_b)`
//! instruction. Its fixed accounts come first, in this order:
//!
//! 0. authority (signer) owning both sources
//! 1. source of asset A (wrapped base)
//! 2. source of asset B (reward asset)
//! 3. recipient of the minted liquidity position
//! 4. liquidity position mint
//! 5. mint of asset A
//! 6. mint of asset B
//! 7. venue factory / configuration
//! 8. token program of asset A
//! 9. token program of asset B
//! 10. token program of the position mint
//!
//! Venue-specific accounts (pool state, reserves, ...) follow as passed by the
//! caller.

use anchor_lang::prelude::*;
use solana_program::hash::hash;
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::program::invoke_signed;

pub const ADD_LIQUIDITY_IX: &[u8] = b"global:add_liquidity";

pub struct AddLiquidity<'info> {
    pub venue_program: AccountInfo<'info>,
    pub authority: AccountInfo<'info>,
    pub base_source: AccountInfo<'info>,
    pub reward_source: AccountInfo<'info>,
    pub lp_recipient: AccountInfo<'info>,
    pub lp_mint: AccountInfo<'info>,
    pub base_mint: AccountInfo<'info>,
    pub reward_mint: AccountInfo<'info>,
    pub venue_factory: AccountInfo<'info>,
    pub base_token_program: AccountInfo<'info>,
    pub reward_token_program: AccountInfo<'info>,
    pub lp_token_program: AccountInfo<'info>,
}

impl<'info> AddLiquidity<'info> {
    fn fixed_accounts(&self) -> [&AccountInfo<'info>; 11] {
        [
            &self.authority,
            &self.base_source,
            &self.reward_source,
            &self.lp_recipient,
            &self.lp_mint,
            &self.base_mint,
            &self.reward_mint,
            &self.venue_factory,
            &self.base_token_program,
            &self.reward_token_program,
            &self.lp_token_program,
        ]
    }

    fn account_metas(&self, remaining: &[AccountInfo<'info>]) -> Vec<AccountMeta> {
        let mut metas = vec![
            AccountMeta::new_readonly(*self.authority.key, true),
            AccountMeta::new(*self.base_source.key, false),
            AccountMeta::new(*self.reward_source.key, false),
            AccountMeta::new(*self.lp_recipient.key, false),
            AccountMeta::new(*self.lp_mint.key, false),
            AccountMeta::new_readonly(*self.base_mint.key, false),
            AccountMeta::new_readonly(*self.reward_mint.key, false),
            AccountMeta::new_readonly(*self.venue_factory.key, false),
            AccountMeta::new_readonly(*self.base_token_program.key, false),
            AccountMeta::new_readonly(*self.reward_token_program.key, false),
            AccountMeta::new_readonly(*self.lp_token_program.key, false),
        ];
        metas.extend(remaining.iter().map(|account| {
            if account.is_writable {
                AccountMeta::new(*account.key, account.is_signer)
            } else {
                AccountMeta::new_readonly(*account.key, account.is_signer)
            }
        }));
        metas
    }
}

/// First 8 bytes of `sha256("global:add_liquidity")`
pub fn add_liquidity_discriminator() -> [u8; 8] {
    let digest = hash(ADD_LIQUIDITY_IX).to_bytes();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

pub fn add_liquidity_data(amount_base: u64, amount_reward: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(24);
    data.extend_from_slice(&add_liquidity_discriminator());
    data.extend_from_slice(&amount_base.to_le_bytes());
    data.extend_from_slice(&amount_reward.to_le_bytes());
    data
}

/// Provision `amount_base` / `amount_reward` to the venue.
///
/// Any venue failure aborts the calling instruction.
pub fn add_liquidity<'info>(
    accounts: AddLiquidity<'info>,
    remaining: &[AccountInfo<'info>],
    amount_base: u64,
    amount_reward: u64,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    let ix = Instruction {
        program_id: *accounts.venue_program.key,
        accounts: accounts.account_metas(remaining),
        data: add_liquidity_data(amount_base, amount_reward),
    };

    let mut infos: Vec<AccountInfo<'info>> = accounts
        .fixed_accounts()
        .into_iter()
        .cloned()
        .collect();
    infos.extend_from_slice(remaining);
    infos.push(accounts.venue_program.clone());

    msg!(
        "Venue add_liquidity: base={}, reward={}",
        amount_base,
        amount_reward
    );
    invoke_signed(&ix, &infos, signer_seeds)?;
    Ok(())
}
