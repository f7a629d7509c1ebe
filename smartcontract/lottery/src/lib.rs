// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! ABI of the Lottery Application

A single-round lottery: players buy tickets with native tokens while the round is
open, the owner draws the winners, and each winner claims a reward paid by the
reward-token application. Payouts are asynchronous: a claim sends a tracked
[`Message::Payout`] that is processed in a later block and either commits or
rolls back the claim.
*/

pub mod draw;

use async_graphql::{Request, Response, SimpleObject};
use linera_sdk::{
    linera_base_types::{AccountOwner, Amount, ApplicationId, ContractAbi, ServiceAbi},
    views::ViewError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub struct LotteryAbi;

impl ContractAbi for LotteryAbi {
    type Operation = Operation;
    type Response = LotteryResponse;
}

impl ServiceAbi for LotteryAbi {
    type Query = Request;
    type QueryResponse = Response;
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LotteryParameters {
    /// The reward-token application paying the winners
    pub reward_token_id: ApplicationId,
}

/// Instantiation argument. Never modified afterwards.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LotteryConfig {
    pub owner: AccountOwner,
    pub ticket_price: Amount,
    pub reward: RewardPolicy,
    pub excess_deposit: ExcessDeposit,
}

/// How much reward token each winner receives.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RewardPolicy {
    /// Every winner receives `amount`.
    Fixed { amount: Amount },
    /// Ticket revenue split evenly between the winners, rounded down.
    ShareOfRevenue,
}

/// What happens to the part of a deposit above the ticket price.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, async_graphql::Enum)]
pub enum ExcessDeposit {
    /// Only the ticket price is taken from the buyer.
    Refund,
    /// The whole deposit is taken.
    Forfeit,
}

#[derive(
    Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, async_graphql::Enum,
)]
pub enum Phase {
    /// Accepting tickets
    #[default]
    Open,
    /// Winners fixed, claims allowed
    Drawn,
}

/// Claim state of a single winner.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub enum ClaimStatus {
    Unclaimed,
    /// A payout request is in flight.
    Pending { attempt: u32 },
    /// The reward was transferred.
    Claimed { attempt: u32 },
    /// The last payout request failed and was rolled back; the winner may claim again.
    Failed { attempt: u32, reason: String },
}

impl ClaimStatus {
    pub fn attempt(&self) -> u32 {
        match self {
            ClaimStatus::Unclaimed => 0,
            ClaimStatus::Pending { attempt }
            | ClaimStatus::Claimed { attempt }
            | ClaimStatus::Failed { attempt, .. } => *attempt,
        }
    }

    pub fn state(&self) -> ClaimState {
        match self {
            ClaimStatus::Unclaimed => ClaimState::Unclaimed,
            ClaimStatus::Pending { .. } => ClaimState::Pending,
            ClaimStatus::Claimed { .. } => ClaimState::Claimed,
            ClaimStatus::Failed { .. } => ClaimState::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, async_graphql::Enum)]
pub enum ClaimState {
    Unclaimed,
    Pending,
    Claimed,
    Failed,
}

/// Claim status of a winner, as exposed by the service.
#[derive(Debug, Clone, SimpleObject)]
pub struct ClaimInfo {
    pub owner: AccountOwner,
    pub state: ClaimState,
    pub attempt: u32,
    pub failure_reason: Option<String>,
}

impl ClaimInfo {
    pub fn new(owner: AccountOwner, status: &ClaimStatus) -> Self {
        let failure_reason = match status {
            ClaimStatus::Failed { reason, .. } => Some(reason.clone()),
            _ => None,
        };
        ClaimInfo {
            owner,
            state: status.state(),
            attempt: status.attempt(),
            failure_reason,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub enum Operation {
    /// Buy one ticket, paying `deposit` native tokens (at least the ticket price)
    BuyTicket { deposit: Amount },
    /// Draw `n` winners (owner only)
    Draw { n: u64 },
    /// Request the caller's reward
    Claim,
    /// Roll back a payout request that never completed (owner only)
    ReleaseClaim { account: AccountOwner },
    GetPlayers,
    GetWinners,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum LotteryResponse {
    Ok,
    TicketBought {
        ticket_number: u64,
        charged: Amount,
        refunded: Amount,
    },
    Players(Vec<AccountOwner>),
    Winners(Vec<AccountOwner>),
    ClaimSubmitted { amount: Amount, attempt: u32 },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub enum Message {
    /// Transfer `amount` reward tokens to `recipient` for claim `attempt`.
    Payout {
        recipient: AccountOwner,
        amount: Amount,
        attempt: u32,
    },
}

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("operation not allowed while the lottery is {actual:?} (expected {expected:?})")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("only the owner can do this")]
    Unauthorized,

    #[error("deposit {deposit} is below the ticket price {price}")]
    InsufficientDeposit { deposit: Amount, price: Amount },

    #[error("cannot draw {requested} winners from {eligible} distinct players")]
    InvalidDrawSize { requested: u64, eligible: u64 },

    #[error("rewards need {required} tokens but only {available} are available")]
    InsufficientRewardFunds { required: Amount, available: Amount },

    #[error("caller is not a winner")]
    NotAWinner,

    #[error("reward already claimed")]
    AlreadyClaimed,

    #[error("claim already in progress")]
    ClaimInProgress,

    #[error("no payout request in flight for this account")]
    ClaimNotPending,

    #[error("payout transfer failed: {reason}")]
    PayoutTransferFailed { reason: String },

    #[error("operation requires an authenticated signer")]
    MissingSigner,

    #[error("lottery has not been instantiated")]
    NotInstantiated,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error(transparent)]
    View(#[from] ViewError),
}
