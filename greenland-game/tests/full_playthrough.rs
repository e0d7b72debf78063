use std::hash::Hasher;

use greenland_game::{
    GameKind, GameState, SessionConfig, SessionId, SessionRegistry, SessionState,
    StrategyPhase, TriviaPhase, WalkPhase, share_text,
};
use twox_hash::XxHash64;

fn registry() -> SessionRegistry {
    SessionRegistry::with_defaults().unwrap()
}

/// Drive one session to its end with a fixed, simple policy, collecting every snapshot.
fn play(registry: &mut SessionRegistry, id: SessionId) -> Vec<SessionState> {
    let mut states = vec![registry.state(id).unwrap()];
    for _ in 0..200 {
        let state = states.last().unwrap().clone();
        let next = match &state.game {
            GameState::Decide(walk) => match &walk.phase {
                WalkPhase::InProgress { node } => {
                    let node = registry.scenario().node(node).unwrap();
                    let choice = node.choices[walk.step % node.choices.len()].id.clone();
                    registry.apply_choice(id, &choice).unwrap()
                }
                _ => break,
            },
            GameState::Strategy(strategy) => match &strategy.phase {
                StrategyPhase::Playing => {
                    let affordable = registry
                        .policies()
                        .iter()
                        .map(|policy| policy.id.clone())
                        .find(|policy| registry.can_enact(id, policy).unwrap());
                    match affordable {
                        Some(policy) => registry.enact_policy(id, &policy).unwrap(),
                        None => registry.end_turn(id).unwrap(),
                    }
                }
                StrategyPhase::EventPending { event } => {
                    let option = first_option(registry, event);
                    registry.resolve_event(id, &option).unwrap()
                }
                _ => break,
            },
            GameState::Trivia(trivia) => match &trivia.phase {
                TriviaPhase::Asking => {
                    if trivia.index % 3 == 2 {
                        registry.tick(id).unwrap()
                    } else {
                        registry.answer(id, trivia.index % 2).unwrap()
                    }
                }
                TriviaPhase::Revealed { .. } => registry.next_question(id).unwrap(),
                _ => break,
            },
            GameState::MapBuilder(map) => {
                if map.placements.len() >= 4 {
                    break;
                }
                let building = registry.buildings()[map.placements.len()].id.clone();
                let x = u32::try_from(map.placements.len()).unwrap();
                registry.place_building(id, &building, x, 0).unwrap()
            }
        };
        states.push(next);
    }
    states
}

fn first_option(registry: &SessionRegistry, event: &str) -> String {
    let event = registry.events().iter().find(|e| e.id == event).unwrap();
    event.options[0].id.clone()
}

fn transcript_hash(states: &[SessionState]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for state in states {
        hasher.write(serde_json::to_string(state).unwrap().as_bytes());
    }
    hasher.finish()
}

#[test]
fn every_game_plays_to_completion() {
    let mut registry = registry();
    for game in GameKind::ALL {
        let id = registry
            .start_session(SessionConfig::new(game).with_seed(0x00C0_FFEE))
            .unwrap();
        let states = play(&mut registry, id);
        let last = states.last().unwrap();
        match &last.game {
            GameState::Decide(walk) => {
                assert!(matches!(walk.phase, WalkPhase::Terminal { .. }));
                assert_eq!(walk.step, 5);
            }
            GameState::Strategy(strategy) => {
                assert!(matches!(strategy.phase, StrategyPhase::Finished { .. }));
                assert_eq!(strategy.turn, strategy.horizon + 1);
            }
            GameState::Trivia(trivia) => {
                assert!(matches!(trivia.phase, TriviaPhase::Finished { .. }));
                assert_eq!(trivia.history.len(), 10);
            }
            GameState::MapBuilder(map) => {
                assert_eq!(map.placements.len(), 4);
            }
        }
        for state in &states {
            let stats = match &state.game {
                GameState::Decide(walk) => walk.stats,
                GameState::Strategy(strategy) => strategy.stats,
                GameState::MapBuilder(map) => map.stats,
                GameState::Trivia(_) => continue,
            };
            assert!(stats.is_within_bounds());
        }
        if game != GameKind::Trivia {
            assert!(registry.get_outcome(id).is_ok());
        }
        assert!(!share_text(last).is_empty());
    }
}

#[test]
fn same_seed_same_transcript() {
    for game in GameKind::ALL {
        let mut first = registry();
        let mut second = registry();
        let cfg = SessionConfig::new(game).with_seed(0xFACE_B00C);
        let a = first.start_session(cfg).unwrap();
        let b = second.start_session(cfg).unwrap();
        assert_eq!(
            transcript_hash(&play(&mut first, a)),
            transcript_hash(&play(&mut second, b)),
            "{game} diverged"
        );
    }
}

#[test]
fn reset_replays_the_same_transcript() {
    let mut registry = registry();
    for game in [GameKind::Strategy, GameKind::Trivia] {
        let id = registry
            .start_session(SessionConfig::new(game).with_seed(42))
            .unwrap();
        let before = transcript_hash(&play(&mut registry, id));
        registry.reset_session(id).unwrap();
        let after = transcript_hash(&play(&mut registry, id));
        assert_eq!(before, after, "{game} replay diverged");
    }
}

#[test]
fn trivia_share_text_reports_grade() {
    let mut registry = registry();
    let id = registry
        .start_session(SessionConfig::new(GameKind::Trivia).with_seed(8))
        .unwrap();
    let states = play(&mut registry, id);
    let last = states.last().unwrap();
    let GameState::Trivia(trivia) = &last.game else {
        panic!("not trivia");
    };
    let TriviaPhase::Finished { grade } = &trivia.phase else {
        panic!("round did not finish");
    };
    let text = share_text(last);
    assert!(text.contains(&format!("grade {grade}")));
    assert!(text.contains(&last.share_code));
}
