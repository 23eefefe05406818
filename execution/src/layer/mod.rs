use commonware_cryptography::ed25519::PublicKey;
use std::collections::BTreeMap;
use tictactoe_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    tictactoe::GameError,
};
use tracing::debug;

use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

/// Result of an accepted operation: its value plus every event it emitted, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt<T> {
    pub value: T,
    pub events: Vec<Event>,
}

impl<T> Receipt<T> {
    pub fn new(value: T, events: Vec<Event>) -> Self {
        Self { value, events }
    }
}

/// Staging area over a [State].
///
/// Writes are buffered in `pending` and only reach the underlying state through
/// [Layer::commit]. Every game operation validates before it writes, so a
/// rejected operation leaves `pending` untouched.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    /// Custodian of escrowed funds and the recorded winner of drawn games.
    house: PublicKey,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, house: PublicKey) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            house,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public).await;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn apply(&mut self, transaction: &Transaction) -> Vec<Event> {
        let public = &transaction.public;
        let (game_id, result) = match transaction.instruction {
            Instruction::CreateGame {
                bet_amount,
                move_index,
                mark,
            } => (
                None,
                self.create_game(public, bet_amount, move_index, mark)
                    .await
                    .map(|receipt| receipt.events),
            ),
            Instruction::JoinGame {
                game_id,
                move_index,
                mark,
            } => (
                Some(game_id),
                self.join_game(public, game_id, move_index, mark)
                    .await
                    .map(|receipt| receipt.events),
            ),
            Instruction::Play {
                game_id,
                move_index,
                mark,
            } => (
                Some(game_id),
                self.play(public, game_id, move_index, mark)
                    .await
                    .map(|receipt| receipt.events),
            ),
        };

        result.unwrap_or_else(|err| vec![Self::error_event(public, game_id, err)])
    }

    fn error_event(player: &PublicKey, game_id: Option<u64>, err: GameError) -> Event {
        debug!(?game_id, code = err.code(), %err, "instruction rejected");
        Event::GameError {
            player: player.clone(),
            game_id,
            error_code: err.code(),
            message: err.to_string(),
        }
    }

    /// Executes transactions in order.
    ///
    /// Transactions with a stale or future nonce are skipped without output.
    /// Every other transaction consumes its nonce and yields its events (a single
    /// `GameError` if the instruction was rejected) followed by the transaction itself.
    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> (Vec<Output>, BTreeMap<PublicKey, u64>) {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if let Err(err) = self.prepare(&tx).await {
                debug!(?err, "skipping transaction");
                continue;
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        (outputs, processed_nonces)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}
