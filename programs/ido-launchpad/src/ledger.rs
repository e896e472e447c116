use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token_2022::spl_token_2022::{
    self,
    extension::{transfer_fee::TransferFeeConfig, BaseStateWithExtensions, StateWithExtensions},
    state::Mint as MintState,
};
use anchor_spl::token_interface::{self, TransferChecked};

use crate::errors::IdoError;

/// Move lamports out of an account owned by this program.
///
/// Only the debited account needs to be program-owned; any writable account
/// can be credited.
pub fn transfer_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let remaining = from
        .lamports()
        .checked_sub(amount)
        .ok_or(IdoError::TransferFailed)?;
    let credited = to
        .lamports()
        .checked_add(amount)
        .ok_or(IdoError::MathOverflow)?;

    **from.try_borrow_mut_lamports()? = remaining;
    **to.try_borrow_mut_lamports()? = credited;
    Ok(())
}

/// Pull lamports from a signer through the System program
pub fn collect_lamports<'info>(
    system_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    system_program::transfer(
        CpiContext::new(system_program, system_program::Transfer { from, to }),
        amount,
    )
}

/// `transfer_checked` through whichever token program owns the mint.
///
/// Pass empty `signer_seeds` when `authority` signs the outer transaction.
#[allow(clippy::too_many_arguments)]
pub fn transfer_tokens<'info>(
    token_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    amount: u64,
    decimals: u8,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    token_interface::transfer_checked(
        CpiContext::new_with_signer(
            token_program,
            TransferChecked {
                from,
                mint,
                to,
                authority,
            },
            signer_seeds,
        ),
        amount,
        decimals,
    )
}

/// Refuse mints whose transfers can deliver less than the amount sent.
///
/// Escrows and entitlements are exact amounts, so a Token-2022 mint carrying a
/// transfer fee cannot back them.
pub fn require_exact_transfers(mint: &AccountInfo) -> Result<()> {
    if *mint.owner != spl_token_2022::ID {
        return Ok(());
    }
    let data = mint.try_borrow_data()?;
    check_mint_extensions(&data)
}

fn check_mint_extensions(data: &[u8]) -> Result<()> {
    let mint = StateWithExtensions::<MintState>::unpack(data)?;
    require!(
        mint.get_extension::<TransferFeeConfig>().is_err(),
        IdoError::UnsupportedMint
    );
    Ok(())
}
