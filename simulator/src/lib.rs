use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Path, State as AxumState},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use commonware_codec::{DecodeExt, Encode};
use commonware_cryptography::{
    ed25519::{Batch, PublicKey},
    BatchVerifier,
};
use commonware_utils::hex;
use futures::executor::block_on;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tictactoe_execution::{account, credit, query, Layer, Memory, State};
use tictactoe_types::{
    api::Submission,
    execution::{Account, Event, Output, Transaction},
    tictactoe::{Game, Phase, PlayerStats},
};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};

pub mod config;

pub use config::{parse_public_key, Config, ConfigError, ValidatedConfig};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid transaction signature")]
    InvalidSignature,
    #[error("ledger state unavailable")]
    Unavailable,
}

/// Single-process ledger host.
///
/// Submissions execute one batch at a time against an in-memory state, so every
/// batch observes the committed result of the previous one.
pub struct Simulator {
    house: PublicKey,
    state: RwLock<Memory>,
}

impl Simulator {
    /// Creates a ledger with the given genesis balances already credited.
    pub fn new(house: PublicKey, allocations: &[(PublicKey, u64)]) -> Self {
        let mut state = Memory::default();
        block_on(async {
            for (public, balance) in allocations {
                credit(&mut state, public, *balance).await;
            }
        });
        tracing::info!(allocations = allocations.len(), "genesis applied");

        Self {
            house,
            state: RwLock::new(state),
        }
    }

    pub fn house(&self) -> &PublicKey {
        &self.house
    }

    /// Verifies every signature, then executes the batch and commits its changes.
    ///
    /// Returns the outputs of the batch (events and included transactions, in order).
    pub fn submit(&self, transactions: Vec<Transaction>) -> Result<Vec<Output>, SubmitError> {
        let mut batcher = Batch::new();
        for tx in &transactions {
            tx.verify_batch(&mut batcher);
        }
        if !batcher.verify(&mut rand::thread_rng()) {
            return Err(SubmitError::InvalidSignature);
        }

        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Failed to acquire write lock in submit: {}", e);
                return Err(SubmitError::Unavailable);
            }
        };
        let submitted = transactions.len();
        let outputs = block_on(async {
            let mut layer = Layer::new(&*state, self.house.clone());
            let (outputs, _) = layer.execute(transactions).await;
            let changes = layer.commit();
            state.apply(changes).await;
            outputs
        });
        tracing::info!(submitted, outputs = outputs.len(), "executed submission");
        Ok(outputs)
    }

    fn read<T: Default>(&self, name: &str, f: impl FnOnce(&Memory) -> T) -> T {
        match self.state.read() {
            Ok(state) => f(&state),
            Err(e) => {
                tracing::error!("Failed to acquire read lock in {}: {}", name, e);
                T::default()
            }
        }
    }

    pub fn get_game(&self, game_id: u64) -> Option<Game> {
        self.read("get_game", |state| block_on(query::get_game(state, game_id)))
    }

    pub fn get_all_games(&self) -> Vec<(u64, Game)> {
        self.read("get_all_games", |state| block_on(query::get_all_games(state)))
    }

    pub fn latest_game_id(&self) -> Option<u64> {
        self.read("latest_game_id", |state| {
            block_on(query::latest_game_id(state))
        })
    }

    pub fn get_player_stats(&self, player: &PublicKey) -> PlayerStats {
        self.read("get_player_stats", |state| {
            block_on(query::get_player_stats(state, player))
        })
    }

    pub fn account(&self, public: &PublicKey) -> Account {
        self.read("account", |state| block_on(account(state, public)))
    }
}

fn address(public: &PublicKey) -> String {
    hex(&public.encode())
}

#[derive(Debug, Serialize)]
pub struct GameView {
    pub game_id: u64,
    pub player_one: String,
    pub player_two: Option<String>,
    pub bet_amount: u64,
    pub board: Vec<u8>,
    pub player_one_mark: u8,
    pub is_player_one_turn: bool,
    pub winner: Option<String>,
    pub phase: &'static str,
}

impl GameView {
    pub fn new(game_id: u64, game: &Game) -> Self {
        Self {
            game_id,
            player_one: address(&game.player_one),
            player_two: game.player_two.as_ref().map(address),
            bet_amount: game.bet_amount,
            board: game.board.to_codes().to_vec(),
            player_one_mark: game.player_one_mark as u8,
            is_player_one_turn: game.is_player_one_turn,
            winner: game.winner.as_ref().map(address),
            phase: match game.phase() {
                Phase::Waiting => "waiting",
                Phase::Active => "active",
                Phase::Finished => "finished",
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsView {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub total_games: u64,
    pub win_rate_bps: u64,
}

impl From<PlayerStats> for StatsView {
    fn from(stats: PlayerStats) -> Self {
        Self {
            wins: stats.wins,
            losses: stats.losses,
            draws: stats.draws,
            total_games: stats.total_games,
            win_rate_bps: stats.win_rate_bps(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub nonce: u64,
    pub balance: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventView {
    GameCreated {
        game: GameView,
    },
    GameJoined {
        game: GameView,
    },
    MovePlayed {
        player: String,
        move_index: u8,
        mark: u8,
        game: GameView,
    },
    Transfer {
        sender: String,
        recipient: String,
        amount: u64,
    },
    GameError {
        player: String,
        game_id: Option<u64>,
        error_code: u8,
        message: String,
    },
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        match event {
            Event::GameCreated { game_id, game } => Self::GameCreated {
                game: GameView::new(*game_id, game),
            },
            Event::GameJoined { game_id, game } => Self::GameJoined {
                game: GameView::new(*game_id, game),
            },
            Event::MovePlayed {
                game_id,
                player,
                move_index,
                mark,
                game,
            } => Self::MovePlayed {
                player: address(player),
                move_index: *move_index,
                mark: *mark as u8,
                game: GameView::new(*game_id, game),
            },
            Event::Transfer {
                sender,
                recipient,
                amount,
            } => Self::Transfer {
                sender: address(sender),
                recipient: address(recipient),
                amount: *amount,
            },
            Event::GameError {
                player,
                game_id,
                error_code,
                message,
            } => Self::GameError {
                player: address(player),
                game_id: *game_id,
                error_code: *error_code,
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Transactions whose nonce matched and were therefore included.
    pub included: usize,
    pub events: Vec<EventView>,
}

impl SubmitResponse {
    pub fn new(outputs: &[Output]) -> Self {
        let mut included = 0;
        let mut events = Vec::new();
        for output in outputs {
            match output {
                Output::Event(event) => events.push(EventView::from(event)),
                Output::Transaction(_) => included += 1,
                Output::Commit { .. } => {}
            }
        }
        Self { included, events }
    }
}

pub struct Api {
    simulator: Arc<Simulator>,
}

impl Api {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        // Configure Rate Limiting
        // Effectively unlimited for a local host
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_nanosecond(1)
                .burst_size(2_000_000)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .context("invalid rate limit configuration")?,
        );

        Ok(Router::new()
            .route("/submit", post(submit))
            .route("/game/:id", get(get_game))
            .route("/games", get(get_games))
            .route("/games/latest", get(get_latest_game))
            .route("/stats/:address", get(get_stats))
            .route("/account/:address", get(get_account))
            .layer(cors)
            .layer(GovernorLayer {
                config: governor_conf,
            })
            .with_state(self.simulator.clone()))
    }
}

async fn submit(AxumState(simulator): AxumState<Arc<Simulator>>, body: Bytes) -> impl IntoResponse {
    let submission = match Submission::decode(body.as_ref()) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::debug!(?e, "rejected malformed submission");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match simulator.submit(submission.transactions) {
        Ok(outputs) => Json(SubmitResponse::new(&outputs)).into_response(),
        Err(SubmitError::InvalidSignature) => StatusCode::BAD_REQUEST.into_response(),
        Err(SubmitError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn get_game(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Path(game_id): Path<u64>,
) -> impl IntoResponse {
    match simulator.get_game(game_id) {
        Some(game) => Json(GameView::new(game_id, &game)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_games(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    let games = simulator
        .get_all_games()
        .iter()
        .map(|(game_id, game)| GameView::new(*game_id, game))
        .collect::<Vec<_>>();
    Json(games)
}

async fn get_latest_game(AxumState(simulator): AxumState<Arc<Simulator>>) -> impl IntoResponse {
    let latest = simulator
        .latest_game_id()
        .and_then(|game_id| Some(GameView::new(game_id, &simulator.get_game(game_id)?)));
    match latest {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_stats(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Some(player) = parse_public_key(&address) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    Json(StatsView::from(simulator.get_player_stats(&player))).into_response()
}

async fn get_account(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Some(public) = parse_public_key(&address) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let account = simulator.account(&public);
    Json(AccountView {
        nonce: account.nonce,
        balance: account.balance,
    })
    .into_response()
}
