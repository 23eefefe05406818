//! Read-only views over committed [State].

use crate::State;
use commonware_cryptography::ed25519::PublicKey;
use tictactoe_types::{
    execution::{Key, Value},
    tictactoe::{Game, PlayerStats},
};

/// Returns the game stored under `game_id`, if any.
pub async fn get_game<S: State>(state: &S, game_id: u64) -> Option<Game> {
    match state.get(&Key::Game(game_id)).await {
        Some(Value::Game(game)) => Some(game),
        _ => None,
    }
}

/// Number of games ever created (also the id the next game will receive).
pub async fn game_count<S: State>(state: &S) -> u64 {
    match state.get(&Key::GameCounter).await {
        Some(Value::GameCounter(count)) => count,
        _ => 0,
    }
}

/// Returns the id of the most recently created game.
pub async fn latest_game_id<S: State>(state: &S) -> Option<u64> {
    game_count(state).await.checked_sub(1)
}

/// Returns every stored game in ascending id order.
pub async fn get_all_games<S: State>(state: &S) -> Vec<(u64, Game)> {
    let count = game_count(state).await;
    let mut games = Vec::new();
    for game_id in 0..count {
        if let Some(game) = get_game(state, game_id).await {
            games.push((game_id, game));
        }
    }
    games
}

/// Returns the stats of `player` (all zero if they never finished a game).
pub async fn get_player_stats<S: State>(state: &S, player: &PublicKey) -> PlayerStats {
    match state.get(&Key::PlayerStats(player.clone())).await {
        Some(Value::PlayerStats(stats)) => stats,
        _ => PlayerStats::default(),
    }
}
