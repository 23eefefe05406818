use crate::{state_transition, Adb};
use anyhow::Context;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::{Digest, Sha256},
    PrivateKeyExt, Signer,
};
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{
    adb::{self, keyless},
    translator::EightCap,
};
use commonware_utils::{NZUsize, NZU64};
use rand::{rngs::StdRng, SeedableRng};
use tictactoe_types::execution::{Output, Transaction, Value};

const TEST_BUFFER_POOL_PAGES: usize = 1024;
const TEST_BUFFER_POOL_PAGE_SIZE: usize = 1024;
const TEST_MMR_ITEMS_PER_BLOB: u64 = 1024;
const TEST_MMR_WRITE_BUFFER: usize = 1024;
const TEST_LOG_ITEMS_PER_SECTION: u64 = 1024;
const TEST_LOG_WRITE_BUFFER: usize = 1024;
const TEST_LOCATIONS_ITEMS_PER_BLOB: u64 = 1024;
const TEST_LOCATIONS_WRITE_BUFFER: usize = 1024;

/// Seed reserved for the house keypair.
pub const HOUSE_SEED: u64 = 0;

/// Creates an account keypair for Ed25519 signatures used by players
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Creates the house address holding escrowed stakes
pub fn create_house() -> PublicKey {
    create_account_keypair(HOUSE_SEED).1
}

/// Creates state and events databases for testing
pub async fn create_adbs_result<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> anyhow::Result<(Adb<E, EightCap>, keyless::Keyless<E, Output, Sha256>)> {
    let buffer_pool = PoolRef::new(
        NZUsize!(TEST_BUFFER_POOL_PAGES),
        NZUsize!(TEST_BUFFER_POOL_PAGE_SIZE),
    );

    let state = Adb::init(
        context.with_label("state"),
        adb::any::variable::Config {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(TEST_MMR_ITEMS_PER_BLOB),
            mmr_write_buffer: NZUsize!(TEST_MMR_WRITE_BUFFER),
            log_journal_partition: String::from("state-log-journal"),
            log_items_per_section: NZU64!(TEST_LOG_ITEMS_PER_SECTION),
            log_write_buffer: NZUsize!(TEST_LOG_WRITE_BUFFER),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("state-locations-journal"),
            locations_items_per_blob: NZU64!(TEST_LOCATIONS_ITEMS_PER_BLOB),
            translator: EightCap,
            thread_pool: None,
            buffer_pool: buffer_pool.clone(),
        },
    )
    .await
    .context("failed to initialize state ADB")?;

    let events = keyless::Keyless::<_, Output, Sha256>::init(
        context.with_label("events"),
        keyless::Config {
            mmr_journal_partition: String::from("events-mmr-journal"),
            mmr_metadata_partition: String::from("events-mmr-metadata"),
            mmr_items_per_blob: NZU64!(TEST_MMR_ITEMS_PER_BLOB),
            mmr_write_buffer: NZUsize!(TEST_MMR_WRITE_BUFFER),
            log_journal_partition: String::from("events-log-journal"),
            log_items_per_section: NZU64!(TEST_LOG_ITEMS_PER_SECTION),
            log_write_buffer: NZUsize!(TEST_LOG_WRITE_BUFFER),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("events-locations-journal"),
            locations_items_per_blob: NZU64!(TEST_LOCATIONS_ITEMS_PER_BLOB),
            locations_write_buffer: NZUsize!(TEST_LOCATIONS_WRITE_BUFFER),
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .context("failed to initialize events Keyless")?;

    Ok((state, events))
}

pub async fn create_adbs<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> (Adb<E, EightCap>, keyless::Keyless<E, Output, Sha256>) {
    create_adbs_result(context)
        .await
        .expect("failed to initialize test databases")
}

/// Roots and operation ranges produced by one executed block
#[derive(Clone, Debug)]
pub struct BlockSummary {
    pub height: u64,
    pub state_root: Digest,
    pub state_ops: (u64, u64),
    pub events_root: Digest,
    pub events_ops: (u64, u64),
}

/// Executes `txs` as the next block on top of `state` and `events`, then syncs both
pub async fn execute_block_result<E: Spawner + Metrics + Storage + Clock>(
    state: &mut Adb<E, EightCap>,
    events: &mut keyless::Keyless<E, Output, Sha256>,
    house: PublicKey,
    txs: Vec<Transaction>,
) -> anyhow::Result<BlockSummary> {
    // Get height from state
    let current_height = state
        .get_metadata()
        .await
        .context("failed to read state metadata")?
        .and_then(|(_, v)| match v {
            Some(Value::Commit { height, start: _ }) => Some(height),
            _ => None,
        })
        .unwrap_or(0);
    let height = current_height + 1;

    // Execute state transition
    let result =
        state_transition::execute_state_transition(state, events, house, height, txs)
            .await
            .context("state transition failed")?;

    // Sync results
    state.sync().await.context("failed to sync state")?;
    events.sync().await.context("failed to sync events")?;

    Ok(BlockSummary {
        height,
        state_root: result.state_root,
        state_ops: (result.state_start_op, result.state_end_op),
        events_root: result.events_root,
        events_ops: (result.events_start_op, result.events_end_op),
    })
}

pub async fn execute_block<E: Spawner + Metrics + Storage + Clock>(
    state: &mut Adb<E, EightCap>,
    events: &mut keyless::Keyless<E, Output, Sha256>,
    house: PublicKey,
    txs: Vec<Transaction>,
) -> BlockSummary {
    execute_block_result(state, events, house, txs)
        .await
        .expect("execute_block failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account, credit, query};
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use tictactoe_types::execution::Instruction;

    #[test]
    fn test_block_persists_game() {
        let executor = Runner::default();
        executor.start(|context| async move {
            let (mut state, mut events) = create_adbs(&context).await;
            let (private, public) = create_account_keypair(1);
            credit(&mut state, &public, 1_000).await;
            state.commit(None).await.unwrap();

            let tx = Transaction::sign(
                &private,
                0,
                Instruction::CreateGame {
                    bet_amount: 100,
                    move_index: 4,
                    mark: 1,
                },
            );
            let summary = execute_block(&mut state, &mut events, create_house(), vec![tx]).await;
            assert_eq!(summary.height, 1);
            assert!(summary.state_ops.1 > summary.state_ops.0);
            // created + transfer + tx, then the commit marker
            assert!(summary.events_ops.1 - summary.events_ops.0 >= 3);

            let game = query::get_game(&state, 0).await.expect("game missing");
            assert_eq!(game.player_one, public);
            assert_eq!(game.bet_amount, 100);
            assert_eq!(account(&state, &create_house()).await.balance, 100);
            assert_eq!(account(&state, &public).await.nonce, 1);

            // An empty block still advances the height
            let summary = execute_block(&mut state, &mut events, create_house(), vec![]).await;
            assert_eq!(summary.height, 2);
        });
    }
}
