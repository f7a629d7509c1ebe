// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! ABI of the Reward Token Application

A fungible token where an account has to be registered (see
[`TokenOperation::StorageDeposit`]) before it can hold a balance. The lottery
pays its winners in this token.
*/

use async_graphql::{Request, Response, SimpleObject};
use linera_sdk::linera_base_types::{AccountOwner, Amount, ContractAbi, ServiceAbi};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TICKER_SYMBOL: &str = "RWD";

pub struct RewardTokenAbi;

impl ContractAbi for RewardTokenAbi {
    type Operation = TokenOperation;
    type Response = Result<TokenResponse, TokenError>;
}

impl ServiceAbi for RewardTokenAbi {
    type Query = Request;
    type QueryResponse = Response;
}

/// Instantiation argument.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RewardTokenConfig {
    /// The only account allowed to mint.
    pub minter: AccountOwner,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum TokenOperation {
    /// Register an account so it can receive tokens. Defaults to the caller.
    StorageDeposit { account: Option<AccountOwner> },
    /// Mint new tokens to an account, registering it if needed (minter only)
    Mint { owner: AccountOwner, amount: Amount },
    /// Move tokens from the caller to a registered account
    Transfer { to: AccountOwner, amount: Amount },
    /// Get the balance of an account (zero when unregistered)
    Balance { owner: AccountOwner },
    /// Check whether an account is registered
    IsRegistered { owner: AccountOwner },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum TokenResponse {
    Ok,
    /// `true` if the account was not registered before
    Registered(bool),
    Balance(Amount),
    IsRegistered(bool),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("operation requires an authenticated caller")]
    Unauthenticated,
    #[error("caller is not the minter")]
    Unauthorized,
    #[error("sender account is not registered")]
    SenderNotRegistered,
    #[error("recipient account is not registered")]
    RecipientNotRegistered,
    #[error("insufficient balance: {balance} available, {amount} requested")]
    InsufficientBalance { balance: Amount, amount: Amount },
    #[error("balance overflow")]
    Overflow,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<linera_sdk::views::ViewError> for TokenError {
    fn from(error: linera_sdk::views::ViewError) -> Self {
        TokenError::Storage(error.to_string())
    }
}

#[derive(SimpleObject)]
pub struct AccountEntry {
    pub key: AccountOwner,
    pub value: Amount,
}
