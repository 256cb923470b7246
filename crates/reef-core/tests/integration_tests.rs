//! Integration tests for the Reef game engine.
//!
//! These tests drive complete games through the public API only.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reef_core::*;

fn hex(q: i32, r: i32) -> HexCoord {
    HexCoord::new(q, r)
}

fn fish(a: HexCoord, b: HexCoord) -> Move {
    Move::PlaceFish { coords: [a, b] }
}

fn shark(coord: HexCoord, rotation: u8, shark_kind: SharkKind) -> Move {
    Move::PlaceShark {
        coord,
        rotation,
        shark_kind,
    }
}

/// Pick a random legal move for the current player, if there is one
fn random_move(game: &GameState, rng: &mut StdRng) -> Option<Move> {
    let color = game.current_player;
    let sharks = game.legal_shark_placements(color);

    let vacant: Vec<HexCoord> = game
        .board
        .cells()
        .into_iter()
        .filter(|c| c.is_empty())
        .map(|c| c.coord)
        .collect();
    let can_fish = game.reserves_of(color).fish >= 2 && vacant.len() >= 2;

    if !sharks.is_empty() && (!can_fish || rng.gen_bool(0.3)) {
        return sharks.choose(rng).copied();
    }
    if can_fish {
        let picks: Vec<HexCoord> = vacant.choose_multiple(rng, 2).copied().collect();
        return Some(fish(picks[0], picks[1]));
    }
    None
}

#[test]
fn test_scenario_fish_then_capture() {
    let mut game = GameState::default();

    game.apply_move(Color::White, fish(hex(0, 0), hex(1, -1)))
        .unwrap();
    assert_eq!(game.reserves_of(Color::White).fish, 12);

    game.apply_move(Color::Black, fish(hex(0, 1), hex(-1, 1)))
        .unwrap();
    assert_eq!(game.reserves_of(Color::Black).fish, 12);

    // From (0,-1), rotation 2 (SouthEast) points at white's own fish on (0,0)
    assert_eq!(
        Direction::between(hex(0, -1), hex(0, 0)),
        Some(Direction::SouthEast)
    );
    let before = game.clone();
    assert_eq!(
        game.apply_move(Color::White, shark(hex(0, -1), 2, SharkKind::Small)),
        Err(GameError::NoCapture)
    );
    assert_eq!(game, before);

    // From (-1,0), rotation 2 points at black's fish on (-1,1)
    let events = game
        .apply_move(Color::White, shark(hex(-1, 0), 2, SharkKind::Small))
        .unwrap();

    assert_eq!(game.board.piece_at(&hex(-1, 1)), None);
    assert_eq!(game.reserves_of(Color::Black).fish, 13);
    assert_eq!(game.reserves_of(Color::White).fish, 12);
    assert_eq!(game.reserves_of(Color::White).small_shark, 2);
    assert_eq!(
        game.board.piece_at(&hex(-1, 0)),
        Some(Piece::shark(SharkKind::Small, Color::White, 2))
    );
    assert_eq!(game.current_player, Color::Black);
    assert!(events.contains(&GameEvent::FishCaptured {
        owner: Color::Black,
        coord: hex(-1, 1),
    }));
    assert_eq!(
        game.last_move.as_ref().map(|m| m.captured.clone()),
        Some(vec![hex(-1, 1)])
    );
}

#[test]
fn test_placements_outside_region_are_rejected() {
    let mut game = GameState::default();
    game.apply_move(Color::White, fish(hex(0, 0), hex(1, 0)))
        .unwrap();
    let before = game.clone();

    let outside: Vec<HexCoord> = region(6)
        .into_iter()
        .filter(|c| !game.board.contains(c))
        .collect();
    assert_eq!(outside.len(), 127 - 61);

    for coord in outside {
        assert_eq!(
            game.apply_move(Color::Black, fish(coord, hex(2, 0))),
            Err(GameError::OutOfBoard(coord))
        );
        for rotation in 0..6 {
            assert_eq!(
                game.apply_move(Color::Black, shark(coord, rotation, SharkKind::Big)),
                Err(GameError::OutOfBoard(coord))
            );
        }
        assert_eq!(game, before);
    }
}

#[test]
fn test_shark_validity_matches_capture_targets() {
    let mut game = GameState::default();
    game.apply_move(Color::White, fish(hex(0, 0), hex(2, -2)))
        .unwrap();
    game.apply_move(Color::Black, fish(hex(-2, 2), hex(3, 1)))
        .unwrap();

    let rules = game.rules;
    for cell in game.board.cells() {
        for kind in SharkKind::ALL {
            for rotation in 0..6u8 {
                let under = cell
                    .piece
                    .is_some_and(|p| p.color == Color::Black && p.is_fish());
                let blocked = cell.piece.is_some() && !under;
                let in_mouth = rules.mouths(kind, rotation).into_iter().any(|dir| {
                    game.board
                        .piece_at(&cell.coord.neighbor(dir))
                        .is_some_and(|p| p.color == Color::Black && p.is_fish())
                });

                let result = game.validate_shark_placement(Color::White, cell.coord, rotation, kind);
                assert_eq!(
                    result.is_ok(),
                    !blocked && (under || in_mouth),
                    "{:?} {kind:?} rotation {rotation}",
                    cell.coord
                );
            }
        }
    }
}

#[test]
fn test_random_games_preserve_invariants() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let rules = RuleConfig {
            fish_must_be_adjacent: seed % 2 == 0,
            big_shark_mouths: match seed % 3 {
                0 => MouthLayout::Adjacent,
                1 => MouthLayout::Spread,
                _ => MouthLayout::Opposite,
            },
            ..RuleConfig::default()
        };
        let mut game = GameState::new(rules);

        for _ in 0..200 {
            let Some(mv) = random_move(&game, &mut rng) else {
                break;
            };
            let mover = game.current_player;
            let before = game.clone();

            match game.apply_move(mover, mv) {
                Ok(events) => {
                    if let Move::PlaceFish { .. } = mv {
                        assert_eq!(
                            game.reserves_of(mover).fish + 2,
                            before.reserves_of(mover).fish
                        );
                        assert_eq!(
                            game.board.occupied_count(),
                            before.board.occupied_count() + 2
                        );
                    }

                    for event in &events {
                        if let GameEvent::FishCaptured { owner, .. } = event {
                            assert_eq!(*owner, mover.opponent());
                        }
                    }

                    if game.is_finished() {
                        assert_eq!(game.turn_phase, TurnPhase::Finished);
                        assert_eq!(game.check_victory(), game.winner);
                    } else {
                        assert_eq!(game.current_player, mover.opponent());
                        assert_eq!(game.turn_phase, TurnPhase::SelectAction);
                    }
                }
                Err(_) => assert_eq!(game, before),
            }

            assert!(game.is_consistent(), "seed {seed}");
            if game.is_finished() {
                break;
            }
        }
    }
}

#[test]
fn test_captured_fish_return_to_owner() {
    let mut game = GameState::default();
    game.apply_move(Color::White, fish(hex(0, 0), hex(-3, 0)))
        .unwrap();
    game.apply_move(Color::Black, fish(hex(1, 0), hex(1, -1)))
        .unwrap();
    game.apply_move(Color::White, fish(hex(-3, 1), hex(-3, 2)))
        .unwrap();

    // Black big shark on white's fish at (0,0), mouths NE (0) and E (1)
    // sit on black's own fish and eat nothing
    let before = game.clone();
    game.apply_move(Color::Black, shark(hex(0, 0), 0, SharkKind::Big))
        .unwrap();

    assert_eq!(game.reserves_of(Color::White).fish, before.reserves_of(Color::White).fish + 1);
    assert_eq!(game.reserves_of(Color::Black).fish, before.reserves_of(Color::Black).fish);
    assert_eq!(game.board.piece_at(&hex(1, 0)), Some(Piece::fish(Color::Black)));
    assert_eq!(game.board.piece_at(&hex(1, -1)), Some(Piece::fish(Color::Black)));
}

#[test]
fn test_turns_alternate_strictly() {
    let mut game = GameState::default();
    let mut expected = Color::White;
    let pairs = [
        (hex(0, 0), hex(0, 1)),
        (hex(2, 0), hex(2, 1)),
        (hex(-2, 0), hex(-2, 1)),
        (hex(0, 3), hex(1, 3)),
        (hex(-4, 4), hex(-3, 4)),
        (hex(4, -4), hex(3, -4)),
    ];

    for (a, b) in pairs {
        assert_eq!(game.current_player, expected);
        assert_eq!(
            game.apply_move(expected.opponent(), fish(a, b)),
            Err(GameError::NotYourTurn)
        );
        game.apply_move(expected, fish(a, b)).unwrap();
        expected = expected.opponent();
    }
    assert_eq!(game.turn_number, 6);
}

#[test]
fn test_game_played_to_a_win() {
    let mut game = GameState::default();

    // White builds along r = 0, black along r = 3, well apart
    let white = [(-4, 0), (-3, 0), (-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (3, -1)];
    let black = [(-3, 3), (-2, 3), (-1, 3), (0, 3), (1, 3), (-4, 4), (-3, 4), (-2, 4)];

    let mut black_pairs = black.chunks(2);
    for pair in white.chunks(2) {
        game.apply_move(Color::White, fish(hex(pair[0].0, pair[0].1), hex(pair[1].0, pair[1].1)))
            .unwrap();
        if game.is_finished() {
            break;
        }
        let b = black_pairs.next().unwrap();
        game.apply_move(Color::Black, fish(hex(b[0].0, b[0].1), hex(b[1].0, b[1].1)))
            .unwrap();
    }

    assert_eq!(game.winner, Some(Winner::White));
    assert_eq!(game.board.largest_chain(Color::White), 10);
    assert_eq!(
        game.apply_move(Color::Black, fish(hex(0, -3), hex(1, -3))),
        Err(GameError::GameOver)
    );
}
