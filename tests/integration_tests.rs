//! Integration tests for the elo-board leaderboard
//!
//! These tests drive the leaderboard end to end over both storage backends:
//! - Registration, match recording and standings
//! - Draw handling and counter bookkeeping
//! - Error handling and all-or-nothing match commits
//! - Persistence across reopening a SQLite database

mod fixtures;

use elo_board::config::{AppConfig, RatingPrecision};
use elo_board::error::LeaderboardError;
use elo_board::rating::expected_score;
use elo_board::storage::{InMemoryLedger, SqliteLedger};
use elo_board::types::{Outcome, PlayerRecord};
use elo_board::Leaderboard;
use std::sync::Arc;
use std::time::Duration;

use fixtures::{
    all_backends, error_kind, memory_leaderboard, rating_sum, register_all, store_unavailable,
    FlakyLedger, MockLedger,
};

#[tokio::test]
async fn test_complete_match_workflow() {
    for (backend, board) in all_backends() {
        register_all(&board, &["alice", "bob"]);

        let applied = board
            .record_result("alice", "bob", Outcome::AWins)
            .await
            .unwrap();

        let alice = board.player("alice").unwrap();
        let bob = board.player("bob").unwrap();

        assert_eq!(alice.rating, 1016.0, "{}", backend);
        assert_eq!(bob.rating, 984.0, "{}", backend);
        assert_eq!((alice.games_played, alice.wins, alice.losses), (1, 1, 0));
        assert_eq!((bob.games_played, bob.wins, bob.losses), (1, 0, 1));

        let games = board.recent_games(None).unwrap();
        assert_eq!(games.len(), 1, "{}", backend);
        assert_eq!(games[0], applied.game);
        assert_eq!(games[0].winner.as_deref(), Some("alice"));
        assert_eq!(games[0].player1, "alice");
        assert_eq!(games[0].player2, "bob");
    }
}

#[tokio::test]
async fn test_draw_updates_draw_counters_only() {
    for (backend, board) in all_backends() {
        board.register_player("strong", Some(1400.0)).unwrap();
        board.register_player("weak", Some(1000.0)).unwrap();

        let applied = board
            .record_result("strong", "weak", Outcome::Draw)
            .await
            .unwrap();

        for player in applied.players() {
            assert_eq!(player.games_played, 1, "{}", backend);
            assert_eq!(player.draws, 1, "{}", backend);
            assert_eq!(player.wins + player.losses, 0, "{}", backend);
        }

        // The favourite gives up points on a draw
        let strong = board.player("strong").unwrap();
        let weak = board.player("weak").unwrap();
        assert!(strong.rating < 1400.0);
        assert!(weak.rating > 1000.0);
        assert_eq!(strong.rating - 1400.0, -(weak.rating - 1000.0));

        assert!(applied.game.is_draw());
        assert_eq!(applied.game.winner_label(), "draw");
    }
}

#[tokio::test]
async fn test_upset_costs_favourite_full_expectation() {
    let mut config = AppConfig::default();
    config.rating.precision = RatingPrecision::Float;
    let board = Leaderboard::new(Arc::new(InMemoryLedger::new()), &config).unwrap();

    board.register_player("favourite", Some(1400.0)).unwrap();
    board.register_player("underdog", Some(1000.0)).unwrap();

    board
        .record_result("favourite", "underdog", Outcome::BWins)
        .await
        .unwrap();

    let favourite = board.player("favourite").unwrap();
    let expected_delta = 32.0 * (0.0 - expected_score(1400.0, 1000.0));
    assert!(favourite.rating < 1400.0);
    assert!((favourite.rating - 1400.0 - expected_delta).abs() < 1e-9);
}

#[tokio::test]
async fn test_many_matches_keep_counters_and_total_rating() {
    for (backend, board) in all_backends() {
        let names = ["ann", "ben", "cat", "dan"];
        register_all(&board, &names);
        let initial_total = rating_sum(&board);

        let outcomes = [Outcome::AWins, Outcome::BWins, Outcome::Draw];
        for round in 0..24 {
            let a = names[round % names.len()];
            let b = names[(round + 1 + round / names.len()) % names.len()];
            if a == b {
                continue;
            }
            board
                .record_result(a, b, outcomes[round % outcomes.len()])
                .await
                .unwrap();
        }

        let players = board.standings().unwrap();
        assert!(players.iter().all(PlayerRecord::counters_consistent));
        assert_eq!(rating_sum(&board), initial_total, "{}", backend);

        let games_played: u32 = players.iter().map(|p| p.games_played).sum();
        let recorded = board.recent_games(Some(1000)).unwrap().len() as u32;
        assert_eq!(games_played, recorded * 2, "{}", backend);

        // Standings are ordered by rating
        assert!(players.windows(2).all(|w| w[0].rating >= w[1].rating));
    }
}

#[tokio::test]
async fn test_history_is_most_recent_first_and_capped() {
    for (backend, board) in all_backends() {
        register_all(&board, &["alice", "bob"]);

        for _ in 0..12 {
            board
                .record_result("alice", "bob", Outcome::AWins)
                .await
                .unwrap();
        }
        board
            .record_result("bob", "alice", Outcome::AWins)
            .await
            .unwrap();

        let games = board.recent_games(None).unwrap();
        assert_eq!(games.len(), 10, "{}: default history limit", backend);
        assert_eq!(games[0].winner.as_deref(), Some("bob"));
        assert!(games.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

        assert_eq!(board.recent_games(Some(3)).unwrap().len(), 3);
        assert_eq!(board.recent_games(Some(100)).unwrap().len(), 13);
    }
}

#[tokio::test]
async fn test_rejected_matches_change_nothing() {
    for (backend, board) in all_backends() {
        register_all(&board, &["alice", "bob"]);

        assert!(matches!(
            error_kind(board.record_result("alice", "alice", Outcome::AWins).await),
            LeaderboardError::SamePlayer { .. }
        ));
        assert!(matches!(
            error_kind(board.record_result(" alice ", "alice", Outcome::Draw).await),
            LeaderboardError::SamePlayer { .. }
        ));
        assert_eq!(
            error_kind(board.record_result("alice", "carol", Outcome::AWins).await),
            LeaderboardError::UnknownPlayer {
                name: "carol".to_string()
            },
            "{}",
            backend
        );

        for player in board.standings().unwrap() {
            assert_eq!(player.rating, 1000.0);
            assert_eq!(player.games_played, 0);
        }
        assert!(board.recent_games(None).unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_draws_can_be_disabled() {
    let mut config = AppConfig::default();
    config.rating.allow_draws = false;
    let board = Leaderboard::new(Arc::new(InMemoryLedger::new()), &config).unwrap();
    register_all(&board, &["alice", "bob"]);

    assert!(matches!(
        error_kind(board.record_result("alice", "bob", Outcome::Draw).await),
        LeaderboardError::InvalidOutcome { .. }
    ));
    assert!(board.recent_games(None).unwrap().is_empty());

    board
        .record_result("alice", "bob", Outcome::BWins)
        .await
        .unwrap();
}

#[test]
fn test_outcome_parsing_at_the_boundary() {
    assert_eq!("a_wins".parse::<Outcome>().unwrap(), Outcome::AWins);
    assert_eq!("p2_wins".parse::<Outcome>().unwrap(), Outcome::BWins);
    assert!(matches!(
        error_kind("tie".parse::<Outcome>().map_err(anyhow::Error::from)),
        LeaderboardError::InvalidOutcome { .. }
    ));
}

#[tokio::test]
async fn test_removed_player_keeps_history() {
    for (backend, board) in all_backends() {
        register_all(&board, &["alice", "bob"]);
        board
            .record_result("alice", "bob", Outcome::BWins)
            .await
            .unwrap();

        board.remove_player("bob").await.unwrap();

        assert!(matches!(
            error_kind(board.player("bob")),
            LeaderboardError::UnknownPlayer { .. }
        ));
        let games = board.recent_games(None).unwrap();
        assert_eq!(games.len(), 1, "{}", backend);
        assert_eq!(games[0].winner.as_deref(), Some("bob"));

        // The name can be registered again from scratch
        let bob = board.register_player("bob", None).unwrap();
        assert_eq!(bob.games_played, 0);
        assert_eq!(bob.rating, 1000.0);
    }
}

#[tokio::test]
async fn test_failed_commit_leaves_no_partial_state() {
    let ledger = Arc::new(FlakyLedger::new());
    let board = Leaderboard::new(ledger.clone(), &AppConfig::default()).unwrap();
    register_all(&board, &["alice", "bob"]);

    ledger.set_failing(true);
    assert!(matches!(
        error_kind(board.record_result("alice", "bob", Outcome::AWins).await),
        LeaderboardError::StoreUnavailable { .. }
    ));
    assert_eq!(ledger.commit_attempts(), 1);

    for player in board.standings().unwrap() {
        assert_eq!(player.rating, 1000.0);
        assert_eq!(player.games_played, 0);
    }
    assert!(board.recent_games(None).unwrap().is_empty());

    // A retry once the store recovers applies the match exactly once
    ledger.set_failing(false);
    board
        .record_result("alice", "bob", Outcome::AWins)
        .await
        .unwrap();
    assert_eq!(board.player("alice").unwrap().games_played, 1);
    assert_eq!(board.recent_games(None).unwrap().len(), 1);
}

#[tokio::test]
async fn test_match_is_written_only_through_commit() {
    let mut ledger = MockLedger::new();
    ledger.expect_get_by_name().returning(|name| {
        let id = if name == "alice" { 1 } else { 2 };
        Ok(PlayerRecord::new(id, name, 1000.0))
    });
    ledger
        .expect_commit_match()
        .times(1)
        .returning(|_| Err(store_unavailable()));
    ledger.expect_upsert().never();
    ledger.expect_append().never();

    let board = Leaderboard::new(Arc::new(ledger), &AppConfig::default()).unwrap();

    assert!(matches!(
        error_kind(board.record_result("alice", "bob", Outcome::Draw).await),
        LeaderboardError::StoreUnavailable { .. }
    ));
}

#[tokio::test]
async fn test_commit_receives_fresh_ratings() {
    let mut ledger = MockLedger::new();
    ledger.expect_get_by_name().returning(|name| {
        let (id, rating) = if name == "alice" {
            (1, 1200.0)
        } else {
            (2, 1200.0)
        };
        Ok(PlayerRecord::new(id, name, rating))
    });
    ledger
        .expect_commit_match()
        .withf(|applied| {
            applied.player_a.rating == 1216.0
                && applied.player_b.rating == 1184.0
                && applied.game.winner.as_deref() == Some("alice")
        })
        .times(1)
        .returning(|_| Ok(()));

    let board = Leaderboard::new(Arc::new(ledger), &AppConfig::default()).unwrap();
    board
        .record_result("alice", "bob", Outcome::AWins)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sqlite_ledger_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!("elo-board-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("leaderboard.db");
    let config = AppConfig::default();

    {
        let ledger = SqliteLedger::open(&path, Duration::from_secs(1)).unwrap();
        let board = Leaderboard::new(Arc::new(ledger), &config).unwrap();
        register_all(&board, &["alice", "bob"]);
        board
            .record_result("alice", "bob", Outcome::AWins)
            .await
            .unwrap();
    }

    let ledger = SqliteLedger::open(&path, Duration::from_secs(1)).unwrap();
    let board = Leaderboard::new(Arc::new(ledger), &config).unwrap();

    assert_eq!(board.player("alice").unwrap().rating, 1016.0);
    assert_eq!(board.player("bob").unwrap().losses, 1);
    assert_eq!(board.recent_games(None).unwrap().len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_memory_leaderboard_calculate_is_stateless() {
    let board = memory_leaderboard();
    register_all(&board, &["alice"]);

    let (a, b) = board.calculate(1200.0, 1200.0, 1.0, None).unwrap();
    assert_eq!((a, b), (1216.0, 1184.0));

    assert_eq!(board.player("alice").unwrap().rating, 1000.0);
    assert!(board.recent_games(None).unwrap().is_empty());
}
