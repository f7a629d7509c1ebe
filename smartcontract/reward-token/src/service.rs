// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Request, Response, Schema};
use linera_sdk::{
    linera_base_types::{AccountOwner, Amount, WithServiceAbi},
    views::View,
    Service, ServiceRuntime,
};
use reward_token::{AccountEntry, RewardTokenAbi, TokenOperation, TICKER_SYMBOL};
use self::state::RewardTokenState;

pub struct RewardTokenService {
    state: Arc<RewardTokenState>,
    runtime: Arc<ServiceRuntime<Self>>,
}

linera_sdk::service!(RewardTokenService);

impl WithServiceAbi for RewardTokenService {
    type Abi = RewardTokenAbi;
}

impl Service for RewardTokenService {
    type Parameters = ();

    async fn new(runtime: ServiceRuntime<Self>) -> Self {
        let state = RewardTokenState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        RewardTokenService {
            state: Arc::new(state),
            runtime: Arc::new(runtime),
        }
    }

    async fn handle_query(&self, request: Request) -> Response {
        let schema = Schema::build(
            QueryRoot {
                state: self.state.clone(),
            },
            MutationRoot {
                runtime: self.runtime.clone(),
            },
            EmptySubscription,
        )
        .finish();
        schema.execute(request).await
    }
}

struct QueryRoot {
    state: Arc<RewardTokenState>,
}

#[Object]
impl QueryRoot {
    async fn ticker_symbol(&self) -> String {
        String::from(TICKER_SYMBOL)
    }

    /// Balance of an account, zero when unregistered
    async fn balance(&self, owner: AccountOwner) -> Result<Amount, async_graphql::Error> {
        Ok(self.state.balance(&owner).await?)
    }

    async fn is_registered(&self, owner: AccountOwner) -> Result<bool, async_graphql::Error> {
        Ok(self.state.is_registered(&owner).await?)
    }

    /// All registered accounts
    async fn accounts(&self) -> Result<Vec<AccountEntry>, async_graphql::Error> {
        Ok(self
            .state
            .entries()
            .await?
            .into_iter()
            .map(|(key, value)| AccountEntry { key, value })
            .collect())
    }
}

struct MutationRoot {
    runtime: Arc<ServiceRuntime<RewardTokenService>>,
}

#[Object]
impl MutationRoot {
    async fn storage_deposit(&self, account: Option<AccountOwner>) -> String {
        self.runtime
            .schedule_operation(&TokenOperation::StorageDeposit { account });
        "StorageDeposit operation scheduled".to_string()
    }

    async fn transfer(&self, to: AccountOwner, amount: Amount) -> String {
        self.runtime
            .schedule_operation(&TokenOperation::Transfer { to, amount });
        "Transfer operation scheduled".to_string()
    }

    async fn mint(&self, owner: AccountOwner, amount: Amount) -> String {
        self.runtime
            .schedule_operation(&TokenOperation::Mint { owner, amount });
        "Mint operation scheduled".to_string()
    }
}
