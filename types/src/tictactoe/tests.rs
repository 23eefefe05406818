use super::*;
use crate::execution::{Event, Instruction, Key, Value};
use commonware_codec::{DecodeExt, Encode, ReadExt};
use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};
use rand::{rngs::StdRng, SeedableRng};

fn public_key(seed: u64) -> commonware_cryptography::ed25519::PublicKey {
    let mut rng = StdRng::seed_from_u64(seed);
    PrivateKey::from_rng(&mut rng).public_key()
}

fn cell(index: usize) -> Cell {
    Cell::new(index).unwrap()
}

#[test]
fn test_mark_domain() {
    assert_eq!(Mark::try_from(1), Ok(Mark::X));
    assert_eq!(Mark::try_from(2), Ok(Mark::O));
    assert_eq!(Mark::try_from(0), Err(0));
    assert_eq!(Mark::try_from(3), Err(3));
    assert_eq!(Mark::X.opponent(), Mark::O);
    assert_eq!(Mark::O.opponent(), Mark::X);
}

#[test]
fn test_board_rejects_unknown_cell_code() {
    let encoded = [1u8, 2, 0, 0, 0, 0, 0, 0, 3];
    assert!(Board::read(&mut &encoded[..]).is_err());
}

#[test]
fn test_board_codes() {
    let mut board = Board::with_opening(cell(0), Mark::X);
    board.place(cell(4), Mark::O);
    assert_eq!(board.to_codes(), [1, 0, 0, 0, 2, 0, 0, 0, 0]);
    assert!(board.is_empty_at(8));
    assert!(!board.is_empty_at(4));
    assert!(!board.is_empty_at(9));
    assert_eq!(board.get(9), None);
}

#[test]
fn test_cell_rejects_out_of_board_index() {
    assert_eq!(Cell::new(8).map(Cell::index), Some(8));
    assert_eq!(Cell::new(BOARD_CELLS), None);
    assert_eq!(Cell::new(usize::MAX), None);
}

#[test]
fn test_game_lifecycle_phases() {
    let alice = public_key(1);
    let bob = public_key(2);
    let mut game = Game::new(alice.clone(), 100, cell(0), Mark::O);
    assert_eq!(game.phase(), Phase::Waiting);
    assert_eq!(game.escrowed(), 100);
    assert_eq!(game.player_to_move(), None);
    assert_eq!(game.player_two_mark(), Mark::X);

    game.player_two = Some(bob.clone());
    game.is_player_one_turn = true;
    assert_eq!(game.phase(), Phase::Active);
    assert_eq!(game.escrowed(), 200);
    assert_eq!(game.player_to_move(), Some(&alice));
    assert_eq!(game.owner_of(Mark::X), Some(&bob));
    assert_eq!(game.owner_of(Mark::O), Some(&alice));

    game.winner = Some(bob);
    assert_eq!(game.phase(), Phase::Finished);
    assert_eq!(game.escrowed(), 0);
    assert_eq!(game.player_to_move(), None);
}

#[test]
fn test_game_value_roundtrip() {
    let mut game = Game::new(public_key(1), 250, cell(4), Mark::X);
    game.player_two = Some(public_key(2));
    game.board.place(cell(0), Mark::O);
    let value = Value::Game(game);
    let decoded = Value::decode(value.encode().as_ref()).unwrap();
    assert_eq!(value, decoded);
}

#[test]
fn test_instruction_keeps_raw_mark() {
    let instruction = Instruction::Play {
        game_id: 7,
        move_index: 10,
        mark: 3,
    };
    let decoded = Instruction::decode(instruction.encode().as_ref()).unwrap();
    assert_eq!(instruction, decoded);
}

#[test]
fn test_key_tags_are_distinct() {
    let pk = public_key(1);
    assert_ne!(
        Key::Account(pk.clone()).encode(),
        Key::PlayerStats(pk).encode()
    );
    assert_eq!(Key::GameCounter.encode().len(), 1);
}

#[test]
fn test_error_event_message_limit() {
    let event = Event::GameError {
        player: public_key(1),
        game_id: Some(0),
        error_code: ERROR_INVALID_MOVE,
        message: "x".repeat(MAX_ERROR_MESSAGE_LENGTH + 1),
    };
    assert!(Event::decode(event.encode().as_ref()).is_err());
}

#[test]
fn test_error_codes_are_stable() {
    assert_eq!(GameError::InvalidBet.code(), 100);
    assert_eq!(GameError::InvalidMove("occupied").code(), 101);
    assert_eq!(GameError::GameNotFound.code(), 102);
    assert_eq!(GameError::AlreadyJoined.code(), 103);
    assert_eq!(GameError::GameNotActive.code(), 104);
    assert_eq!(
        GameError::InsufficientFunds { have: 1, need: 2 }.code(),
        105
    );
}

#[test]
fn test_stats_totals() {
    let mut stats = PlayerStats::default();
    assert_eq!(stats.win_rate_bps(), 0);
    stats.record_win();
    stats.record_loss();
    stats.record_draw();
    stats.record_win();
    assert_eq!(stats.total_games, stats.wins + stats.losses + stats.draws);
    assert_eq!(stats.win_rate_bps(), 5_000);
}
