use crate::{Adb, Layer, State};
use anyhow::{bail, Context};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest, Sha256};
use commonware_runtime::{Clock, Metrics, Spawner, Storage};
use commonware_storage::{adb::keyless, mmr::hasher::Standard, translator::Translator};
use std::collections::BTreeMap;
use tictactoe_types::execution::{Output, Transaction, Value};
use tracing::{debug, info};

/// Result of executing a block's state transition
pub struct StateTransitionResult {
    pub state_root: Digest,
    pub state_start_op: u64,
    pub state_end_op: u64,
    pub events_root: Digest,
    pub events_start_op: u64,
    pub events_end_op: u64,
    /// Map of public keys to their next expected nonce after processing
    pub processed_nonces: BTreeMap<PublicKey, u64>,
}

/// Execute state transition for a block
///
/// Processes all transactions of the block at `height`, appending every output to
/// `events` before applying the staged changes to `state`. Only the next expected
/// height is executed: re-submitting the current height returns the current roots
/// untouched, and any other height is an error.
pub async fn execute_state_transition<S: Spawner + Storage + Clock + Metrics, T: Translator>(
    state: &mut Adb<S, T>,
    events: &mut keyless::Keyless<S, Output, Sha256>,
    house: PublicKey,
    height: u64,
    transactions: Vec<Transaction>,
) -> anyhow::Result<StateTransitionResult> {
    // Check if this is the next expected height for state
    let (state_height, mut state_start_op) = state
        .get_metadata()
        .await
        .context("failed to read state metadata")?
        .and_then(|(_, v)| match v {
            Some(Value::Commit { height, start }) => Some((height, start)),
            _ => None,
        })
        .unwrap_or((0, 0));
    if height != state_height && height != state_height + 1 {
        bail!("unexpected height {height} (state at {state_height})");
    }

    // Get events metadata
    let (events_height, mut events_start_op) = events
        .get_metadata()
        .await
        .context("failed to read events metadata")?
        .and_then(|(_, v)| match v {
            Some(Output::Commit { height, start }) => Some((height, start)),
            _ => None,
        })
        .unwrap_or((0, 0));

    // Only process if this is the next block
    let mut processed_nonces = BTreeMap::new();
    if height == state_height + 1 {
        state_start_op = state.op_count();
        let mut layer = Layer::new(state, house);
        let (outputs, nonces) = layer.execute(transactions).await;
        processed_nonces.extend(nonces);
        let changes = layer.commit();

        // Apply events if this is the next block
        if height == events_height + 1 {
            events_start_op = events.op_count();
            let count = outputs.len();
            for output in outputs.into_iter() {
                events
                    .append(output)
                    .await
                    .context("failed to append output")?;
            }
            events
                .commit(Some(Output::Commit {
                    height,
                    start: events_start_op,
                }))
                .await
                .context("failed to commit events")?;
            debug!(height, outputs = count, "events committed");
        }

        // Apply state once we've committed events (can't regenerate after state updated)
        state.apply(changes).await;
        state
            .commit(Some(Value::Commit {
                height,
                start: state_start_op,
            }))
            .await
            .context("failed to commit state")?;
        info!(height, accounts = processed_nonces.len(), "block executed");
    }

    // Compute roots
    let mut mmr_hasher = Standard::<Sha256>::new();
    let state_root = state.root(&mut mmr_hasher);
    let state_end_op = state.op_count();
    let events_root = events.root(&mut mmr_hasher);
    let events_end_op = events.op_count();

    Ok(StateTransitionResult {
        state_root,
        state_start_op,
        state_end_op,
        events_root,
        events_start_op,
        events_end_op,
        processed_nonces,
    })
}
