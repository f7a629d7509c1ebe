// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Object, Request, Response, Schema};
use linera_sdk::{
    linera_base_types::{AccountOwner, Amount, ApplicationId, WithServiceAbi},
    views::View,
    Service, ServiceRuntime,
};
use lottery::{ClaimInfo, ExcessDeposit, LotteryAbi, LotteryParameters, Operation, Phase};
use self::state::LotteryState;

pub struct LotteryService {
    state: Arc<LotteryState>,
    runtime: Arc<ServiceRuntime<Self>>,
}

linera_sdk::service!(LotteryService);

impl WithServiceAbi for LotteryService {
    type Abi = LotteryAbi;
}

impl Service for LotteryService {
    type Parameters = LotteryParameters;

    async fn new(runtime: ServiceRuntime<Self>) -> Self {
        let state = LotteryState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        LotteryService {
            state: Arc::new(state),
            runtime: Arc::new(runtime),
        }
    }

    async fn handle_query(&self, request: Request) -> Response {
        let schema = Schema::build(
            QueryRoot {
                state: self.state.clone(),
                runtime: self.runtime.clone(),
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
    state: Arc<LotteryState>,
    runtime: Arc<ServiceRuntime<LotteryService>>,
}

#[Object]
impl QueryRoot {
    /// One entry per ticket, in purchase order
    async fn players(&self) -> Result<Vec<AccountOwner>, async_graphql::Error> {
        Ok(self.state.players().await?)
    }

    /// Winners in draw order, empty before the draw
    async fn winners(&self) -> Vec<AccountOwner> {
        self.state.winners()
    }

    async fn phase(&self) -> Phase {
        *self.state.phase.get()
    }

    async fn owner(&self) -> Result<AccountOwner, async_graphql::Error> {
        Ok(self.state.config()?.owner)
    }

    async fn ticket_price(&self) -> Result<Amount, async_graphql::Error> {
        Ok(self.state.config()?.ticket_price)
    }

    async fn excess_deposit(&self) -> Result<ExcessDeposit, async_graphql::Error> {
        Ok(self.state.config()?.excess_deposit)
    }

    /// Native tokens collected from ticket sales
    async fn ticket_revenue(&self) -> Amount {
        *self.state.ticket_revenue.get()
    }

    /// Reward paid to each winner, fixed by the draw
    async fn reward_per_winner(&self) -> Amount {
        *self.state.reward_per_winner.get()
    }

    async fn draw_seed(&self) -> Option<u64> {
        *self.state.draw_seed.get()
    }

    /// Number of tickets held by `owner`
    async fn ticket_count(&self, owner: AccountOwner) -> Result<u64, async_graphql::Error> {
        Ok(self.state.ticket_count(&owner).await?)
    }

    /// Claim status of `owner`, none if they did not win
    async fn claim_status(
        &self,
        owner: AccountOwner,
    ) -> Result<Option<ClaimInfo>, async_graphql::Error> {
        let status = self.state.claim_status(&owner).await?;
        Ok(status.map(|status| ClaimInfo::new(owner, &status)))
    }

    async fn claims(&self) -> Result<Vec<ClaimInfo>, async_graphql::Error> {
        Ok(self
            .state
            .claims()
            .await?
            .into_iter()
            .map(|(owner, status)| ClaimInfo::new(owner, &status))
            .collect())
    }

    async fn reward_token_id(&self) -> ApplicationId {
        self.runtime.application_parameters().reward_token_id
    }
}

struct MutationRoot {
    runtime: Arc<ServiceRuntime<LotteryService>>,
}

#[Object]
impl MutationRoot {
    /// Buy one ticket with `deposit` native tokens
    async fn buy_ticket(&self, deposit: Amount) -> String {
        self.runtime
            .schedule_operation(&Operation::BuyTicket { deposit });
        "BuyTicket operation scheduled".to_string()
    }

    /// Draw `n` winners and close ticket sales
    async fn draw(&self, n: u64) -> String {
        self.runtime.schedule_operation(&Operation::Draw { n });
        format!("Draw operation scheduled for {n} winners")
    }

    async fn claim(&self) -> String {
        self.runtime.schedule_operation(&Operation::Claim);
        "Claim operation scheduled".to_string()
    }

    /// Roll back a payout request stuck in flight
    async fn release_claim(&self, account: AccountOwner) -> String {
        self.runtime
            .schedule_operation(&Operation::ReleaseClaim { account });
        format!("ReleaseClaim operation scheduled for {account}")
    }
}
