// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::linera_base_types::{AccountOwner, Amount};
use linera_sdk::views::{linera_views, MapView, RegisterView, RootView, ViewStorageContext};
use reward_token::TokenError;

/// The application state for the Reward Token.
#[derive(RootView)]
#[view(context = ViewStorageContext)]
pub struct RewardTokenState {
    /// Account allowed to mint, set at instantiation
    pub minter: RegisterView<Option<AccountOwner>>,
    /// Registered accounts and their balances. An entry exists once the account is registered.
    pub accounts: MapView<AccountOwner, Amount>,
}

impl RewardTokenState {
    /// Registers `owner` with a zero balance. Returns `false` if it was already registered.
    pub async fn register(&mut self, owner: AccountOwner) -> Result<bool, TokenError> {
        if self.accounts.get(&owner).await?.is_some() {
            return Ok(false);
        }
        self.accounts.insert(&owner, Amount::ZERO)?;
        Ok(true)
    }

    pub async fn is_registered(&self, owner: &AccountOwner) -> Result<bool, TokenError> {
        Ok(self.accounts.get(owner).await?.is_some())
    }

    pub async fn balance(&self, owner: &AccountOwner) -> Result<Amount, TokenError> {
        Ok(self.accounts.get(owner).await?.unwrap_or(Amount::ZERO))
    }

    pub async fn mint(
        &mut self,
        caller: AccountOwner,
        owner: AccountOwner,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if self.minter.get().as_ref() != Some(&caller) {
            return Err(TokenError::Unauthorized);
        }
        let balance = self.balance(&owner).await?;
        let balance = balance.try_add(amount).map_err(|_| TokenError::Overflow)?;
        self.accounts.insert(&owner, balance)?;
        Ok(())
    }

    /// Moves `amount` from `from` to `to`. Both accounts must be registered; nothing
    /// changes if any check fails.
    pub async fn transfer(
        &mut self,
        from: AccountOwner,
        to: AccountOwner,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let source_balance = self
            .accounts
            .get(&from)
            .await?
            .ok_or(TokenError::SenderNotRegistered)?;
        let target_balance = self
            .accounts
            .get(&to)
            .await?
            .ok_or(TokenError::RecipientNotRegistered)?;

        let source_balance = source_balance.try_sub(amount).map_err(|_| {
            TokenError::InsufficientBalance {
                balance: source_balance,
                amount,
            }
        })?;
        if from == to {
            return Ok(());
        }
        let target_balance = target_balance
            .try_add(amount)
            .map_err(|_| TokenError::Overflow)?;

        self.accounts.insert(&from, source_balance)?;
        self.accounts.insert(&to, target_balance)?;
        Ok(())
    }

    pub async fn entries(&self) -> Result<Vec<(AccountOwner, Amount)>, TokenError> {
        let owners = self.accounts.indices().await?;
        let mut entries = Vec::with_capacity(owners.len());
        for owner in owners {
            if let Some(amount) = self.accounts.get(&owner).await? {
                entries.push((owner, amount));
            }
        }
        Ok(entries)
    }
}
