//! Integration tests for match coordination.
//!
//! These drive the coordinator directly and observe what each connection's
//! outgoing channel receives.

use reef_core::{
    region, ActionChoice, Color, GameError, GameState, HexCoord, Move, RuleConfig, SharkKind,
    TurnPhase,
};
use reef_server::server::handle_message;
use reef_server::{
    ClientMessage, MatchId, MatchSettings, RoomCoordinator, RoomError, Seat, ServerMessage,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

fn hex(q: i32, r: i32) -> HexCoord {
    HexCoord::new(q, r)
}

fn fish(a: HexCoord, b: HexCoord) -> Move {
    Move::PlaceFish { coords: [a, b] }
}

/// Everything queued for a connection so far
fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn updates(msgs: &[ServerMessage]) -> Vec<GameState> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerMessage::GameUpdate { state, .. } => Some(state.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_full_match_flow() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (white, mut white_rx) = coordinator.connect();
    let (black, mut black_rx) = coordinator.connect();
    let (watcher, mut watcher_rx) = coordinator.connect();

    let (match_id, state) = coordinator.create_match(white).await.unwrap();
    assert_eq!(state, GameState::default());

    let (seat, _) = coordinator.join_match(&match_id, black).await.unwrap();
    assert_eq!(seat, Seat::Black);
    let (seat, _) = coordinator.join_match(&match_id, watcher).await.unwrap();
    assert_eq!(seat, Seat::Spectator);

    let joined: Vec<Seat> = drain(&mut white_rx)
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::PlayerJoined { color, .. } => Some(color),
            _ => None,
        })
        .collect();
    assert_eq!(joined, vec![Seat::Black, Seat::Spectator]);
    drain(&mut black_rx);
    drain(&mut watcher_rx);

    let applied = coordinator
        .submit_move(&match_id, white, fish(hex(0, 0), hex(1, -1)))
        .await
        .unwrap();
    assert_eq!(applied.current_player, Color::Black);
    assert_eq!(applied.reserves_of(Color::White).fish, 12);

    // Exactly one update per member, carrying the applied state
    for rx in [&mut white_rx, &mut black_rx, &mut watcher_rx] {
        let msgs = drain(rx);
        assert_eq!(msgs.len(), 1);
        assert_eq!(updates(&msgs), vec![applied.clone()]);
    }

    coordinator
        .submit_move(&match_id, black, fish(hex(0, 1), hex(-1, 1)))
        .await
        .unwrap();
    let captured = coordinator
        .submit_move(
            &match_id,
            white,
            Move::PlaceShark {
                coord: hex(-1, 0),
                rotation: 2,
                shark_kind: SharkKind::Small,
            },
        )
        .await
        .unwrap();

    assert_eq!(captured.reserves_of(Color::Black).fish, 13);
    assert_eq!(captured.board.piece_at(&hex(-1, 1)), None);
    assert_eq!(updates(&drain(&mut watcher_rx)).len(), 2);
    assert_eq!(coordinator.snapshot(&match_id).await.unwrap(), captured);
}

#[tokio::test]
async fn test_rejections_leave_state_untouched() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (white, mut white_rx) = coordinator.connect();
    let (black, mut black_rx) = coordinator.connect();
    let (watcher, _watcher_rx) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator.join_match(&match_id, black).await.unwrap();
    coordinator.join_match(&match_id, watcher).await.unwrap();
    drain(&mut white_rx);
    drain(&mut black_rx);

    let before = coordinator.snapshot(&match_id).await.unwrap();
    let mv = fish(hex(0, 0), hex(1, 0));

    assert_eq!(
        coordinator.submit_move(&match_id, black, mv).await,
        Err(RoomError::NotYourTurn)
    );
    assert_eq!(
        coordinator.submit_move(&match_id, watcher, mv).await,
        Err(RoomError::NotSeated)
    );
    assert_eq!(
        coordinator
            .submit_move(&match_id, white, fish(hex(0, 0), hex(0, 0)))
            .await,
        Err(RoomError::InvalidMove(GameError::SameCell))
    );
    assert_eq!(
        coordinator
            .submit_move(&match_id, white, fish(hex(5, 0), hex(0, 0)))
            .await,
        Err(RoomError::InvalidMove(GameError::OutOfBoard(hex(5, 0))))
    );

    assert_eq!(coordinator.snapshot(&match_id).await.unwrap(), before);
    assert!(drain(&mut white_rx).is_empty());
    assert!(drain(&mut black_rx).is_empty());
}

#[tokio::test]
async fn test_unknown_and_full_matches() {
    let coordinator = RoomCoordinator::new(MatchSettings {
        allow_spectators: false,
        ..MatchSettings::default()
    });
    let (white, _) = coordinator.connect();
    let (black, _) = coordinator.connect();
    let (late, _) = coordinator.connect();

    let missing = MatchId::from("ZZZZZZ");
    assert_eq!(
        coordinator
            .submit_move(&missing, white, fish(hex(0, 0), hex(1, 0)))
            .await,
        Err(RoomError::NotFound)
    );

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator.join_match(&match_id, black).await.unwrap();
    assert_eq!(
        coordinator.join_match(&match_id, late).await,
        Err(RoomError::Full)
    );

    // Match codes are case-insensitive
    let lower = MatchId::from(match_id.as_str().to_lowercase());
    let (seat, _) = coordinator
        .join_match(&lower, black)
        .await
        .unwrap();
    assert_eq!(seat, Seat::Black);
}

#[tokio::test]
async fn test_moves_after_win_are_refused() {
    let coordinator = RoomCoordinator::new(MatchSettings {
        rules: RuleConfig {
            winning_chain: 2,
            ..RuleConfig::default()
        },
        ..MatchSettings::default()
    });
    let (white, _) = coordinator.connect();
    let (black, _) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator.join_match(&match_id, black).await.unwrap();

    let won = coordinator
        .submit_move(&match_id, white, fish(hex(0, 0), hex(1, 0)))
        .await
        .unwrap();
    assert!(won.is_finished());

    assert_eq!(
        coordinator
            .submit_move(&match_id, black, fish(hex(-2, 0), hex(-3, 0)))
            .await,
        Err(RoomError::GameOver)
    );
}

#[tokio::test]
async fn test_selection_is_private_and_enforced() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (white, mut white_rx) = coordinator.connect();
    let (black, mut black_rx) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator.join_match(&match_id, black).await.unwrap();
    drain(&mut white_rx);
    drain(&mut black_rx);

    coordinator
        .select_action(&match_id, white, Some(ActionChoice::Shark(SharkKind::Big)))
        .await
        .unwrap();
    assert!(drain(&mut black_rx).is_empty());

    assert!(matches!(
        coordinator
            .submit_move(&match_id, white, fish(hex(0, 0), hex(1, 0)))
            .await,
        Err(RoomError::InvalidMove(GameError::SelectionMismatch { .. }))
    ));

    coordinator.select_action(&match_id, white, None).await.unwrap();
    coordinator
        .submit_move(&match_id, white, fish(hex(0, 0), hex(1, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_matches_are_independent() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (a, mut a_rx) = coordinator.connect();
    let (b, mut b_rx) = coordinator.connect();

    let (first, _) = coordinator.create_match(a).await.unwrap();
    let (second, _) = coordinator.create_match(b).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(coordinator.match_count(), 2);

    coordinator
        .submit_move(&first, a, fish(hex(0, 0), hex(1, 0)))
        .await
        .unwrap();

    assert_eq!(updates(&drain(&mut a_rx)).len(), 1);
    assert!(drain(&mut b_rx).is_empty());
    assert_eq!(
        coordinator.snapshot(&second).await.unwrap(),
        GameState::default()
    );
}

#[tokio::test]
async fn test_disconnect_keeps_player_seat() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (white, _white_rx) = coordinator.connect();
    let (black, _) = coordinator.connect();
    let (watcher, _) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator.join_match(&match_id, black).await.unwrap();
    coordinator.join_match(&match_id, watcher).await.unwrap();

    coordinator.disconnect(black).await;
    coordinator.disconnect(watcher).await;

    let (newcomer, _) = coordinator.connect();
    let (seat, _) = coordinator.join_match(&match_id, newcomer).await.unwrap();
    assert_eq!(seat, Seat::Spectator);

    coordinator
        .submit_move(&match_id, white, fish(hex(0, 0), hex(1, 0)))
        .await
        .unwrap();
    assert_eq!(
        coordinator.snapshot(&match_id).await.unwrap().current_player,
        Color::Black
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_are_linearized() {
    let coordinator = Arc::new(RoomCoordinator::new(MatchSettings {
        rules: RuleConfig {
            winning_chain: 100,
            ..RuleConfig::default()
        },
        ..MatchSettings::default()
    }));
    let (white, _) = coordinator.connect();
    let (black, _) = coordinator.connect();
    let (watcher, mut watcher_rx) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator.join_match(&match_id, black).await.unwrap();
    coordinator.join_match(&match_id, watcher).await.unwrap();
    drain(&mut watcher_rx);

    // Both colors fire every pair at once, so the same cells are contested
    let cells = region(4);
    let mut tasks = Vec::new();
    for (i, pair) in cells.windows(2).step_by(2).enumerate() {
        for (connection, color) in [(white, Color::White), (black, Color::Black)] {
            let coordinator = Arc::clone(&coordinator);
            let match_id = match_id.clone();
            let mv = fish(pair[0], pair[1]);
            tasks.push(tokio::spawn(async move {
                if i % 3 == 0 {
                    tokio::task::yield_now().await;
                }
                (color, mv, coordinator.submit_move(&match_id, connection, mv).await)
            }));
        }
    }

    let mut applied = Vec::new();
    for task in tasks {
        let (color, mv, result) = task.await.unwrap();
        match result {
            Ok(state) => applied.push((color, mv, state)),
            Err(RoomError::NotYourTurn) | Err(RoomError::InvalidMove(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert!(!applied.is_empty());

    applied.sort_by_key(|(_, _, state)| state.turn_number);
    let turns: Vec<u32> = applied.iter().map(|(_, _, s)| s.turn_number).collect();
    let expected: Vec<u32> = (1..=applied.len() as u32).collect();
    assert_eq!(turns, expected);

    // Replaying the applied moves in order reproduces every state
    let mut replay = GameState::new(coordinator.settings().rules);
    for (color, mv, state) in &applied {
        replay.apply_move(*color, *mv).unwrap();
        assert_eq!(&replay, state);
    }
    assert_eq!(coordinator.snapshot(&match_id).await.unwrap(), replay);

    // The spectator saw each applied state once, in order
    let seen = updates(&drain(&mut watcher_rx));
    let states: Vec<GameState> = applied.into_iter().map(|(_, _, s)| s).collect();
    assert_eq!(seen, states);
}

#[tokio::test]
async fn test_extreme_coordinates_are_rejected_cleanly() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (white, mut white_rx) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();

    let far = HexCoord::new(i32::MIN, 0);
    handle_message(
        white,
        ClientMessage::SubmitMove {
            match_id: match_id.clone(),
            mv: fish(far, hex(0, 0)),
        },
        &coordinator,
    )
    .await;

    let msgs = drain(&mut white_rx);
    assert_eq!(msgs.len(), 1);
    match &msgs[0] {
        ServerMessage::MoveRejected { reason, .. } => {
            assert!(reason.contains("-2147483648"), "{reason}")
        }
        other => panic!("unexpected reply {other:?}"),
    }

    // The same coordinate never makes it through the wire format
    let raw = r#"{"type":"SubmitMove","payload":{"match_id":"ABCDEF","move":{"kind":"place_fish","coords":[{"q":-2147483648,"r":0},{"q":0,"r":0}]}}}"#;
    assert!(serde_json::from_str::<ClientMessage>(raw).is_err());

    coordinator.disconnect(white).await;
    assert!(coordinator.connections().is_empty());
}

#[tokio::test]
async fn test_late_joiner_does_not_see_pending_selection() {
    let coordinator = RoomCoordinator::new(MatchSettings::default());
    let (white, _) = coordinator.connect();
    let (black, _) = coordinator.connect();
    let (watcher, _) = coordinator.connect();

    let (match_id, _) = coordinator.create_match(white).await.unwrap();
    coordinator
        .select_action(&match_id, white, Some(ActionChoice::Fish))
        .await
        .unwrap();

    let (_, seen_by_black) = coordinator.join_match(&match_id, black).await.unwrap();
    let (_, seen_by_watcher) = coordinator.join_match(&match_id, watcher).await.unwrap();
    assert_eq!(seen_by_black.turn_phase, TurnPhase::SelectAction);
    assert_eq!(seen_by_watcher.turn_phase, TurnPhase::SelectAction);

    let (_, seen_by_white) = coordinator.join_match(&match_id, white).await.unwrap();
    assert_eq!(
        seen_by_white.turn_phase,
        TurnPhase::Acting {
            choice: ActionChoice::Fish
        }
    );
}
