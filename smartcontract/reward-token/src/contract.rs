// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(target_arch = "wasm32", no_main)]

mod state;

use linera_sdk::{
    linera_base_types::{AccountOwner, WithContractAbi},
    views::{RootView, View},
    Contract, ContractRuntime,
};
use reward_token::{RewardTokenAbi, RewardTokenConfig, TokenError, TokenOperation, TokenResponse};
use self::state::RewardTokenState;

pub struct RewardTokenContract {
    state: RewardTokenState,
    runtime: ContractRuntime<Self>,
}

linera_sdk::contract!(RewardTokenContract);

impl WithContractAbi for RewardTokenContract {
    type Abi = RewardTokenAbi;
}

impl Contract for RewardTokenContract {
    type Message = ();
    type Parameters = ();
    type InstantiationArgument = RewardTokenConfig;
    type EventValue = ();

    async fn load(runtime: ContractRuntime<Self>) -> Self {
        let state = RewardTokenState::load(runtime.root_view_storage_context())
            .await
            .expect("Failed to load state");
        RewardTokenContract { state, runtime }
    }

    async fn instantiate(&mut self, config: Self::InstantiationArgument) {
        let _ = self.runtime.application_parameters();
        self.state.minter.set(Some(config.minter));
    }

    async fn execute_operation(&mut self, operation: Self::Operation) -> Self::Response {
        match operation {
            TokenOperation::StorageDeposit { account } => {
                let owner = match account {
                    Some(owner) => owner,
                    None => self.caller()?,
                };
                let registered = self.state.register(owner).await?;
                if registered {
                    log::info!("Registered account {owner}");
                }
                Ok(TokenResponse::Registered(registered))
            }

            TokenOperation::Mint { owner, amount } => {
                let caller = self.caller()?;
                self.state.mint(caller, owner, amount).await?;
                log::info!("Minted {amount} to {owner}");
                Ok(TokenResponse::Ok)
            }

            TokenOperation::Transfer { to, amount } => {
                let from = self.caller()?;
                match self.state.transfer(from, to, amount).await {
                    Ok(()) => {
                        log::info!("Transferred {amount} from {from} to {to}");
                        Ok(TokenResponse::Ok)
                    }
                    Err(error) => {
                        log::warn!("Transfer of {amount} from {from} to {to} rejected: {error}");
                        Err(error)
                    }
                }
            }

            TokenOperation::Balance { owner } => {
                Ok(TokenResponse::Balance(self.state.balance(&owner).await?))
            }

            TokenOperation::IsRegistered { owner } => {
                Ok(TokenResponse::IsRegistered(self.state.is_registered(&owner).await?))
            }
        }
    }

    async fn execute_message(&mut self, _message: Self::Message) {
        // No messages
    }

    async fn store(mut self) {
        self.state.save().await.expect("Failed to save state");
    }
}

impl RewardTokenContract {
    /// The calling application when invoked through `call_application`, otherwise the signer.
    fn caller(&mut self) -> Result<AccountOwner, TokenError> {
        if let Some(application_id) = self.runtime.authenticated_caller_id() {
            return Ok(AccountOwner::from(application_id));
        }
        self.runtime
            .authenticated_signer()
            .ok_or(TokenError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use linera_sdk::{
        linera_base_types::{AccountOwner, Amount, CryptoHash},
        util::BlockingWait,
        views::View,
        ContractRuntime,
    };
    use reward_token::TokenError;

    use super::{state::RewardTokenState, RewardTokenContract};

    fn account(name: &str) -> AccountOwner {
        AccountOwner::from(CryptoHash::test_hash(name))
    }

    fn token_with_minter(minter: AccountOwner) -> RewardTokenState {
        let runtime = ContractRuntime::<RewardTokenContract>::new();
        let mut state = RewardTokenState::load(runtime.root_view_storage_context())
            .blocking_wait()
            .expect("Failed to read from mock key value store");
        state.minter.set(Some(minter));
        state
    }

    #[test]
    fn registration_is_idempotent() {
        let alice = account("alice");
        let mut state = token_with_minter(account("minter"));

        assert!(!state.is_registered(&alice).blocking_wait().unwrap());
        assert!(state.register(alice).blocking_wait().unwrap());
        assert!(!state.register(alice).blocking_wait().unwrap());
        assert!(state.is_registered(&alice).blocking_wait().unwrap());
        assert_eq!(state.balance(&alice).blocking_wait().unwrap(), Amount::ZERO);
    }

    #[test]
    fn only_minter_can_mint() {
        let minter = account("minter");
        let alice = account("alice");
        let mut state = token_with_minter(minter);

        assert_matches!(
            state.mint(alice, alice, Amount::from_tokens(5)).blocking_wait(),
            Err(TokenError::Unauthorized)
        );
        state
            .mint(minter, alice, Amount::from_tokens(5))
            .blocking_wait()
            .unwrap();
        assert_eq!(
            state.balance(&alice).blocking_wait().unwrap(),
            Amount::from_tokens(5)
        );
    }

    #[test]
    fn transfer_to_unregistered_recipient_changes_nothing() {
        let minter = account("minter");
        let lottery = account("lottery");
        let winner = account("winner");
        let mut state = token_with_minter(minter);
        state
            .mint(minter, lottery, Amount::from_tokens(5))
            .blocking_wait()
            .unwrap();

        assert_matches!(
            state
                .transfer(lottery, winner, Amount::from_tokens(1))
                .blocking_wait(),
            Err(TokenError::RecipientNotRegistered)
        );
        assert_eq!(
            state.balance(&lottery).blocking_wait().unwrap(),
            Amount::from_tokens(5)
        );
        assert!(!state.is_registered(&winner).blocking_wait().unwrap());

        state.register(winner).blocking_wait().unwrap();
        state
            .transfer(lottery, winner, Amount::from_tokens(1))
            .blocking_wait()
            .unwrap();
        assert_eq!(
            state.balance(&lottery).blocking_wait().unwrap(),
            Amount::from_tokens(4)
        );
        assert_eq!(
            state.balance(&winner).blocking_wait().unwrap(),
            Amount::from_tokens(1)
        );
    }

    #[test]
    fn transfer_checks_sender() {
        let minter = account("minter");
        let alice = account("alice");
        let bob = account("bob");
        let mut state = token_with_minter(minter);
        state.register(bob).blocking_wait().unwrap();

        assert_matches!(
            state.transfer(alice, bob, Amount::from_tokens(1)).blocking_wait(),
            Err(TokenError::SenderNotRegistered)
        );

        state.mint(minter, alice, Amount::from_tokens(1)).blocking_wait().unwrap();
        assert_matches!(
            state
                .transfer(alice, bob, Amount::from_tokens(2))
                .blocking_wait(),
            Err(TokenError::InsufficientBalance { .. })
        );
        assert_eq!(state.balance(&alice).blocking_wait().unwrap(), Amount::from_tokens(1));
    }
}
