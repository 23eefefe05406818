use commonware_codec::Encode;
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};
use commonware_runtime::{Clock, Metrics, Spawner, Storage};
use commonware_storage::{adb::any::variable::Any, translator::Translator};
use std::{collections::HashMap, future::Future};
use tictactoe_types::execution::{Account, Key, Value};
use tracing::warn;

pub type Adb<E, T> = Any<E, Digest, Value, Sha256, T>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareError {
    NonceMismatch { expected: u64, got: u64 },
}

pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = ()>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = ()>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = ()> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await,
                    Status::Delete => self.delete(&key).await,
                }
            }
        }
    }
}

impl<E: Spawner + Metrics + Clock + Storage, T: Translator> State for Adb<E, T> {
    async fn get(&self, key: &Key) -> Option<Value> {
        let key = Sha256::hash(&key.encode());
        match self.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Database error during get operation: {:?}", e);
                None
            }
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        let key = Sha256::hash(&key.encode());
        if let Err(e) = self.update(key, value).await {
            warn!("Database error during insert operation: {:?}", e);
        }
    }

    async fn delete(&mut self, key: &Key) {
        let key = Sha256::hash(&key.encode());
        if let Err(e) = self.delete(key).await {
            warn!("Database error during delete operation: {:?}", e);
        }
    }
}

#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Option<Value> {
        self.state.get(key).cloned()
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.state.insert(key, value);
    }

    async fn delete(&mut self, key: &Key) {
        self.state.remove(key);
    }
}

#[derive(Clone)]
pub enum Status {
    Update(Value),
    Delete,
}

pub async fn nonce<S: State>(state: &S, public: &PublicKey) -> u64 {
    load_account(state, public).await.nonce
}

/// Returns the account of `public` (zeroed if it has never been touched).
pub async fn account<S: State>(state: &S, public: &PublicKey) -> Account {
    load_account(state, public).await
}

/// Adds `amount` to the balance of `public`.
///
/// Only used to seed genesis allocations: no instruction mints funds.
pub async fn credit<S: State>(state: &mut S, public: &PublicKey, amount: u64) {
    let mut account = load_account(state, public).await;
    account.balance = account.balance.saturating_add(amount);
    state
        .insert(Key::Account(public.clone()), Value::Account(account))
        .await;
}

pub(crate) async fn load_account<S: State>(state: &S, public: &PublicKey) -> Account {
    match state.get(&Key::Account(public.clone())).await {
        Some(Value::Account(account)) => account,
        _ => Account::default(),
    }
}

pub(crate) fn validate_and_increment_nonce(
    account: &mut Account,
    provided_nonce: u64,
) -> Result<(), PrepareError> {
    if account.nonce != provided_nonce {
        return Err(PrepareError::NonceMismatch {
            expected: account.nonce,
            got: provided_nonce,
        });
    }
    account.nonce += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use commonware_runtime::{deterministic::Runner, Runner as _};

    #[test]
    fn test_apply_updates_and_deletes() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            state.insert(Key::GameCounter, Value::GameCounter(1)).await;

            state
                .apply(vec![(Key::GameCounter, Status::Update(Value::GameCounter(3)))])
                .await;
            assert!(matches!(
                state.get(&Key::GameCounter).await,
                Some(Value::GameCounter(3))
            ));

            state.apply(vec![(Key::GameCounter, Status::Delete)]).await;
            assert!(state.get(&Key::GameCounter).await.is_none());
        });
    }

    #[test]
    fn test_credit_and_nonce() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (_, public) = create_account_keypair(1);
            assert_eq!(account(&state, &public).await, Account::default());

            credit(&mut state, &public, 500).await;
            credit(&mut state, &public, 250).await;
            let loaded = account(&state, &public).await;
            assert_eq!(loaded.balance, 750);
            assert_eq!(nonce(&state, &public).await, 0);
        });
    }

    #[test]
    fn test_nonce_increment() {
        let mut account = Account::default();
        assert_eq!(
            validate_and_increment_nonce(&mut account, 1),
            Err(PrepareError::NonceMismatch {
                expected: 0,
                got: 1
            })
        );
        assert!(validate_and_increment_nonce(&mut account, 0).is_ok());
        assert_eq!(account.nonce, 1);
    }
}
