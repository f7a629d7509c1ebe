// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use linera_sdk::{
    linera_base_types::{Account, AccountOwner, Amount, WithContractAbi},
    views::{RootView, View},
    Contract, ContractRuntime,
};
use lottery::{
    draw, LotteryAbi, LotteryConfig, LotteryError, LotteryParameters, LotteryResponse, Message,
    Operation,
};
use reward_token::{RewardTokenAbi, TokenError, TokenOperation, TokenResponse};
use self::state::LotteryState;

pub struct LotteryContract {
    state: LotteryState,
    runtime: ContractRuntime<Self>,
}

linera_sdk::contract!(LotteryContract);

impl WithContractAbi for LotteryContract {
    type Abi = LotteryAbi;
}

impl Contract for LotteryContract {
    type Message = Message;
    type Parameters = LotteryParameters;
    type InstantiationArgument = LotteryConfig;
    type EventValue = ();

    async fn load(runtime: ContractRuntime<Self>) -> Self {
        let state = LotteryState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        LotteryContract { state, runtime }
    }

    async fn instantiate(&mut self, config: Self::InstantiationArgument) {
        // Validate params access
        let _ = self.runtime.application_parameters();
        assert!(
            config.ticket_price > Amount::ZERO,
            "Ticket price must be positive"
        );
        log::info!(
            "Lottery created by {} with ticket price {}",
            config.owner,
            config.ticket_price
        );
        self.state.config.set(Some(config));
    }

    async fn execute_operation(&mut self, operation: Self::Operation) -> Self::Response {
        match operation {
            Operation::BuyTicket { deposit } => {
                let buyer = self.signer();
                let receipt = self
                    .state
                    .buy_ticket(buyer, deposit)
                    .unwrap_or_else(|error| panic!("Failed to buy ticket: {error}"));

                let lottery_account = self.lottery_account();
                self.runtime.transfer(buyer, lottery_account, receipt.charged);

                log::info!("New player added: {buyer} (ticket {})", receipt.ticket_number);
                if receipt.refunded > Amount::ZERO {
                    log::debug!("Left {} of the deposit with {buyer}", receipt.refunded);
                }
                LotteryResponse::TicketBought {
                    ticket_number: receipt.ticket_number,
                    charged: receipt.charged,
                    refunded: receipt.refunded,
                }
            }

            Operation::Draw { n } => {
                let caller = self.signer();
                // Rejected draws must not reach the reward token.
                self.state
                    .authorize_draw(caller)
                    .unwrap_or_else(|error| panic!("Failed to draw: {error}"));
                let timestamp = self.runtime.system_time().micros();
                let block_height: u64 = self.runtime.block_height().into();
                let seed = draw::seed_from(timestamp, block_height);
                let reward_balance = self.reward_balance();

                let winners = self
                    .state
                    .draw(caller, n, seed, reward_balance)
                    .await
                    .unwrap_or_else(|error| panic!("Failed to draw: {error}"));

                log::info!("Drew {} winners with seed {seed}: {winners:?}", winners.len());
                LotteryResponse::Winners(winners)
            }

            Operation::Claim => {
                let caller = self.signer();
                let payout = self
                    .state
                    .begin_claim(caller)
                    .await
                    .unwrap_or_else(|error| panic!("Failed to claim: {error}"));

                let chain_id = self.runtime.chain_id();
                self.runtime
                    .prepare_message(Message::Payout {
                        recipient: payout.recipient,
                        amount: payout.amount,
                        attempt: payout.attempt,
                    })
                    .with_tracking()
                    .send_to(chain_id);

                log::info!(
                    "{caller} claimed {} (attempt {})",
                    payout.amount,
                    payout.attempt
                );
                LotteryResponse::ClaimSubmitted {
                    amount: payout.amount,
                    attempt: payout.attempt,
                }
            }

            Operation::ReleaseClaim { account } => {
                let caller = self.signer();
                self.state
                    .release_claim(caller, account)
                    .await
                    .unwrap_or_else(|error| panic!("Failed to release claim: {error}"));
                log::warn!("Payout request of {account} released by the owner");
                LotteryResponse::Ok
            }

            Operation::GetPlayers => {
                let players = self
                    .state
                    .players()
                    .await
                    .unwrap_or_else(|error| panic!("Failed to get players: {error}"));
                LotteryResponse::Players(players)
            }

            Operation::GetWinners => LotteryResponse::Winners(self.state.winners()),
        }
    }

    async fn execute_message(&mut self, message: Self::Message) {
        match message {
            Message::Payout {
                recipient,
                amount,
                attempt,
            } => {
                let chain_id = self.runtime.chain_id();
                if self.runtime.message_origin_chain_id() != Some(chain_id) {
                    log::warn!("Ignoring payout request {attempt} for {recipient} from another chain");
                    return;
                }

                if self.runtime.message_is_bouncing() == Some(true) {
                    self.settle_payout(
                        recipient,
                        attempt,
                        Err("payout request was rejected".to_string()),
                    )
                    .await;
                    return;
                }

                let in_flight = self
                    .state
                    .is_pending(&recipient, attempt)
                    .await
                    .unwrap_or_else(|error| panic!("Failed to read claim: {error}"));
                if !in_flight {
                    log::warn!("Ignoring stale payout request {attempt} for {recipient}");
                    return;
                }

                let outcome = self
                    .transfer_reward(recipient, amount)
                    .map_err(|error| error.to_string());
                self.settle_payout(recipient, attempt, outcome).await;
            }
        }
    }

    async fn store(mut self) {
        self.state.save().await.expect("Failed to save state");
    }
}

impl LotteryContract {
    fn signer(&mut self) -> AccountOwner {
        self.runtime
            .authenticated_signer()
            .unwrap_or_else(|| panic!("{}", LotteryError::MissingSigner))
    }

    /// The lottery application's own account on this chain.
    fn lottery_account(&mut self) -> Account {
        Account {
            chain_id: self.runtime.chain_id(),
            owner: AccountOwner::from(self.runtime.application_id().forget_abi()),
        }
    }

    fn reward_token(&mut self) -> linera_sdk::linera_base_types::ApplicationId<RewardTokenAbi> {
        self.runtime
            .application_parameters()
            .reward_token_id
            .with_abi::<RewardTokenAbi>()
    }

    /// Reward tokens held by the lottery.
    fn reward_balance(&mut self) -> Amount {
        let token = self.reward_token();
        let owner = self.lottery_account().owner;
        match self
            .runtime
            .call_application(true, token, &TokenOperation::Balance { owner })
        {
            Ok(TokenResponse::Balance(balance)) => balance,
            response => panic!("Unexpected reward token response: {response:?}"),
        }
    }

    fn transfer_reward(&mut self, to: AccountOwner, amount: Amount) -> Result<(), TokenError> {
        let token = self.reward_token();
        self.runtime
            .call_application(true, token, &TokenOperation::Transfer { to, amount })
            .map(|_| ())
    }

    async fn settle_payout(
        &mut self,
        recipient: AccountOwner,
        attempt: u32,
        outcome: Result<(), String>,
    ) {
        match self.state.finish_claim(recipient, attempt, outcome).await {
            Ok(status) => log::info!("Payout {attempt} to {recipient} settled: {status:?}"),
            Err(LotteryError::PayoutTransferFailed { reason }) => {
                log::warn!("Payout {attempt} to {recipient} failed, claim rolled back: {reason}")
            }
            Err(error) => panic!("Failed to settle payout: {error}"),
        }
    }
}
