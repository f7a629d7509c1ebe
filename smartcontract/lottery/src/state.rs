// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use linera_sdk::linera_base_types::{AccountOwner, Amount};
use linera_sdk::views::{linera_views, LogView, MapView, RegisterView, RootView, ViewStorageContext};
use lottery::{
    draw, ClaimStatus, ExcessDeposit, LotteryConfig, LotteryError, Phase, RewardPolicy,
};

/// The application state for the Lottery.
#[derive(RootView)]
#[view(context = ViewStorageContext)]
pub struct LotteryState {
    /// Owner, ticket price and policies, set at instantiation
    pub config: RegisterView<Option<LotteryConfig>>,
    pub phase: RegisterView<Phase>,
    /// One entry per ticket, in purchase order
    pub players: LogView<AccountOwner>,
    /// Native tokens taken for tickets
    pub ticket_revenue: RegisterView<Amount>,
    /// Winners in draw order, empty until the draw
    pub winners: RegisterView<Vec<AccountOwner>>,
    /// Claim status of every winner
    pub claims: MapView<AccountOwner, ClaimStatus>,
    pub reward_per_winner: RegisterView<Amount>,
    /// Seed used by the draw, kept for audit
    pub draw_seed: RegisterView<Option<u64>>,
}

/// Result of an accepted ticket purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketReceipt {
    /// 1-based position of the ticket in the players list
    pub ticket_number: u64,
    /// Amount to take from the buyer
    pub charged: Amount,
    /// Part of the deposit that is not taken
    pub refunded: Amount,
}

/// A payout the contract has to request from the reward token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutTicket {
    pub recipient: AccountOwner,
    pub amount: Amount,
    pub attempt: u32,
}

impl LotteryState {
    pub fn config(&self) -> Result<&LotteryConfig, LotteryError> {
        self.config.get().as_ref().ok_or(LotteryError::NotInstantiated)
    }

    fn ensure_phase(&self, expected: Phase) -> Result<(), LotteryError> {
        let actual = *self.phase.get();
        if actual != expected {
            return Err(LotteryError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: AccountOwner) -> Result<(), LotteryError> {
        if self.config()?.owner != caller {
            return Err(LotteryError::Unauthorized);
        }
        Ok(())
    }

    /// Records a ticket for `buyer`. Nothing changes if the purchase is rejected.
    pub fn buy_ticket(
        &mut self,
        buyer: AccountOwner,
        deposit: Amount,
    ) -> Result<TicketReceipt, LotteryError> {
        self.ensure_phase(Phase::Open)?;
        let config = self.config()?;
        let price = config.ticket_price;
        if deposit < price {
            return Err(LotteryError::InsufficientDeposit { deposit, price });
        }

        let (charged, refunded) = match config.excess_deposit {
            ExcessDeposit::Refund => (price, deposit.saturating_sub(price)),
            ExcessDeposit::Forfeit => (deposit, Amount::ZERO),
        };
        let revenue = self
            .ticket_revenue
            .get()
            .try_add(charged)
            .map_err(|_| LotteryError::ArithmeticOverflow)?;

        self.players.push(buyer);
        self.ticket_revenue.set(revenue);

        Ok(TicketReceipt {
            ticket_number: self.players.count() as u64,
            charged,
            refunded,
        })
    }

    pub async fn players(&self) -> Result<Vec<AccountOwner>, LotteryError> {
        Ok(self.players.read(0..self.players.count()).await?)
    }

    pub async fn ticket_count(&self, owner: &AccountOwner) -> Result<u64, LotteryError> {
        let players = self.players().await?;
        Ok(players.iter().filter(|player| *player == owner).count() as u64)
    }

    /// Checks that `caller` may draw now: the owner, while sales are open.
    pub fn authorize_draw(&self, caller: AccountOwner) -> Result<(), LotteryError> {
        self.ensure_owner(caller)?;
        self.ensure_phase(Phase::Open)
    }

    /// Draws `n` winners with `seed`, closing ticket sales.
    ///
    /// `reward_balance` is the reward-token balance held by the lottery; the draw is
    /// rejected if it cannot pay every winner.
    pub async fn draw(
        &mut self,
        caller: AccountOwner,
        n: u64,
        seed: u64,
        reward_balance: Amount,
    ) -> Result<Vec<AccountOwner>, LotteryError> {
        self.authorize_draw(caller)?;

        let entries = draw::tally(&self.players().await?);
        let eligible = entries.len() as u64;
        if n == 0 || n > eligible {
            return Err(LotteryError::InvalidDrawSize {
                requested: n,
                eligible,
            });
        }

        let reward_per_winner = match self.config()?.reward {
            RewardPolicy::Fixed { amount } => amount,
            RewardPolicy::ShareOfRevenue => {
                Amount::from_attos(u128::from(*self.ticket_revenue.get()) / u128::from(n))
            }
        };
        let required = u128::from(reward_per_winner)
            .checked_mul(u128::from(n))
            .map(Amount::from_attos)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        if required > reward_balance {
            return Err(LotteryError::InsufficientRewardFunds {
                required,
                available: reward_balance,
            });
        }

        let winners = draw::sample_weighted(&entries, n as usize, seed);
        for winner in &winners {
            self.claims.insert(winner, ClaimStatus::Unclaimed)?;
        }
        self.winners.set(winners.clone());
        self.reward_per_winner.set(reward_per_winner);
        self.draw_seed.set(Some(seed));
        self.phase.set(Phase::Drawn);

        Ok(winners)
    }

    pub fn winners(&self) -> Vec<AccountOwner> {
        self.winners.get().clone()
    }

    pub async fn claim_status(
        &self,
        owner: &AccountOwner,
    ) -> Result<Option<ClaimStatus>, LotteryError> {
        Ok(self.claims.get(owner).await?)
    }

    /// Marks the caller's claim as in flight and returns the payout to request.
    pub async fn begin_claim(&mut self, caller: AccountOwner) -> Result<PayoutTicket, LotteryError> {
        // Claim entries only exist after the draw.
        let status = self
            .claims
            .get(&caller)
            .await?
            .ok_or(LotteryError::NotAWinner)?;

        let attempt = match status {
            ClaimStatus::Claimed { .. } => return Err(LotteryError::AlreadyClaimed),
            ClaimStatus::Pending { .. } => return Err(LotteryError::ClaimInProgress),
            ClaimStatus::Unclaimed | ClaimStatus::Failed { .. } => status.attempt() + 1,
        };
        self.claims
            .insert(&caller, ClaimStatus::Pending { attempt })?;

        Ok(PayoutTicket {
            recipient: caller,
            amount: *self.reward_per_winner.get(),
            attempt,
        })
    }

    /// Whether `attempt` is still the payout in flight for `recipient`.
    pub async fn is_pending(
        &self,
        recipient: &AccountOwner,
        attempt: u32,
    ) -> Result<bool, LotteryError> {
        Ok(self.claims.get(recipient).await? == Some(ClaimStatus::Pending { attempt }))
    }

    /// Reconciles a payout request once its outcome is known.
    ///
    /// Outcomes for requests that are no longer in flight are ignored. A failed transfer
    /// rolls the claim back to `Failed` and is reported as `PayoutTransferFailed`.
    pub async fn finish_claim(
        &mut self,
        recipient: AccountOwner,
        attempt: u32,
        outcome: Result<(), String>,
    ) -> Result<ClaimStatus, LotteryError> {
        if !self.is_pending(&recipient, attempt).await? {
            return Ok(self
                .claims
                .get(&recipient)
                .await?
                .ok_or(LotteryError::NotAWinner)?);
        }

        match outcome {
            Ok(()) => {
                let status = ClaimStatus::Claimed { attempt };
                self.claims.insert(&recipient, status.clone())?;
                Ok(status)
            }
            Err(reason) => {
                self.claims.insert(
                    &recipient,
                    ClaimStatus::Failed {
                        attempt,
                        reason: reason.clone(),
                    },
                )?;
                Err(LotteryError::PayoutTransferFailed { reason })
            }
        }
    }

    /// Rolls back a stuck payout request so the winner can claim again.
    pub async fn release_claim(
        &mut self,
        caller: AccountOwner,
        account: AccountOwner,
    ) -> Result<ClaimStatus, LotteryError> {
        self.ensure_owner(caller)?;
        let status = self
            .claims
            .get(&account)
            .await?
            .ok_or(LotteryError::NotAWinner)?;
        let ClaimStatus::Pending { attempt } = status else {
            return Err(LotteryError::ClaimNotPending);
        };

        let released = ClaimStatus::Failed {
            attempt,
            reason: "released by owner".to_string(),
        };
        self.claims.insert(&account, released.clone())?;
        Ok(released)
    }

    pub async fn claims(&self) -> Result<Vec<(AccountOwner, ClaimStatus)>, LotteryError> {
        let mut claims = Vec::new();
        for winner in self.winners.get() {
            if let Some(status) = self.claims.get(winner).await? {
                claims.push((*winner, status));
            }
        }
        Ok(claims)
    }
}
