//! Scripted players that pick the next operation from a session snapshot.
use greenland_game::{
    GameState, MapState, SessionRegistry, SessionState, StrategyPhase, TriviaPhase, WalkPhase,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid cells a map bot will fill before it stops building.
const MAP_TARGET_PLACEMENTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotStrategy {
    /// First listed option everywhere, cheapest purchases
    Steady,
    /// Maximizes immediate stat gains, spends freely
    Greedy,
    /// Seeded random play, including timeouts and demolitions
    Chaotic,
}

impl BotStrategy {
    pub const ALL: [Self; 3] = [Self::Steady, Self::Greedy, Self::Chaotic];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Greedy => "greedy",
            Self::Chaotic => "chaotic",
        }
    }
}

impl fmt::Display for BotStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operation a bot wants to perform next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BotMove {
    Choose { choice: String },
    Enact { policy: String },
    EndTurn,
    Resolve { option: String },
    Answer { option: usize },
    Tick,
    NextQuestion,
    Place { building: String, x: u32, y: u32 },
    Remove { x: u32, y: u32 },
    Stop,
}

pub struct Bot {
    strategy: BotStrategy,
    rng: ChaCha8Rng,
}

impl Bot {
    /// The bot's own randomness is derived from the session seed so runs replay exactly.
    #[must_use]
    pub fn new(strategy: BotStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: ChaCha8Rng::seed_from_u64(seed ^ 0xB07_5EED),
        }
    }

    pub fn next_move(&mut self, registry: &SessionRegistry, state: &SessionState) -> BotMove {
        match &state.game {
            GameState::Decide(walk) => match &walk.phase {
                WalkPhase::InProgress { node } => self.decide_move(registry, node),
                _ => BotMove::Stop,
            },
            GameState::Strategy(strategy) => match &strategy.phase {
                StrategyPhase::Playing => {
                    self.strategy_move(registry, strategy.budget, &strategy.enacted)
                }
                StrategyPhase::EventPending { event } => self.event_move(registry, event),
                _ => BotMove::Stop,
            },
            GameState::Trivia(trivia) => match &trivia.phase {
                TriviaPhase::Asking => {
                    let options = trivia
                        .question
                        .as_ref()
                        .map_or(2, |q| q.options.len().max(1));
                    self.trivia_move(trivia.index, options)
                }
                TriviaPhase::Revealed { .. } => BotMove::NextQuestion,
                _ => BotMove::Stop,
            },
            GameState::MapBuilder(map) => self.map_move(registry, map),
        }
    }

    fn decide_move(&mut self, registry: &SessionRegistry, node_id: &str) -> BotMove {
        let Some(node) = registry.scenario().node(node_id) else {
            return BotMove::Stop;
        };
        let choice = match self.strategy {
            BotStrategy::Steady => node.choices.first(),
            BotStrategy::Greedy => node
                .choices
                .iter()
                .max_by_key(|c| c.effect.stats.values().sum::<i32>()),
            BotStrategy::Chaotic => {
                let idx = self.rng.gen_range(0..node.choices.len().max(1));
                node.choices.get(idx)
            }
        };
        choice.map_or(BotMove::Stop, |c| BotMove::Choose {
            choice: c.id.clone(),
        })
    }

    fn strategy_move(
        &mut self,
        registry: &SessionRegistry,
        budget: i64,
        enacted: &[String],
    ) -> BotMove {
        let affordable = registry
            .policies()
            .iter()
            .filter(|p| p.cost <= budget && !enacted.contains(&p.id));
        let pick = match self.strategy {
            BotStrategy::Steady => affordable.min_by_key(|p| p.cost),
            BotStrategy::Greedy => affordable.max_by_key(|p| p.cost),
            BotStrategy::Chaotic => {
                let candidates: Vec<_> = affordable.collect();
                if candidates.is_empty() || self.rng.gen_bool(0.4) {
                    None
                } else {
                    candidates.get(self.rng.gen_range(0..candidates.len())).copied()
                }
            }
        };
        pick.map_or(BotMove::EndTurn, |p| BotMove::Enact {
            policy: p.id.clone(),
        })
    }

    fn event_move(&mut self, registry: &SessionRegistry, event_id: &str) -> BotMove {
        let Some(event) = registry.events().iter().find(|e| e.id == event_id) else {
            return BotMove::Stop;
        };
        let option = match self.strategy {
            BotStrategy::Steady => event.options.first(),
            BotStrategy::Greedy => event
                .options
                .iter()
                .max_by_key(|o| o.effect.stats.values().sum::<i32>()),
            BotStrategy::Chaotic => {
                let idx = self.rng.gen_range(0..event.options.len().max(1));
                event.options.get(idx)
            }
        };
        option.map_or(BotMove::Stop, |o| BotMove::Resolve {
            option: o.id.clone(),
        })
    }

    fn trivia_move(&mut self, index: usize, options: usize) -> BotMove {
        match self.strategy {
            BotStrategy::Steady => BotMove::Answer { option: 0 },
            BotStrategy::Greedy => BotMove::Answer {
                option: index % options,
            },
            BotStrategy::Chaotic => {
                if self.rng.gen_bool(0.2) {
                    BotMove::Tick
                } else {
                    BotMove::Answer {
                        option: self.rng.gen_range(0..options),
                    }
                }
            }
        }
    }

    fn map_move(&mut self, registry: &SessionRegistry, map: &MapState) -> BotMove {
        if map.placements.len() >= MAP_TARGET_PLACEMENTS {
            return BotMove::Stop;
        }
        if self.strategy == BotStrategy::Chaotic
            && !map.placements.is_empty()
            && self.rng.gen_bool(0.25)
        {
            let idx = self.rng.gen_range(0..map.placements.len());
            if let Some(p) = map.placements.get(idx) {
                return BotMove::Remove { x: p.x, y: p.y };
            }
        }

        let affordable = registry
            .buildings()
            .iter()
            .filter(|b| b.cost <= map.budget);
        let pick = match self.strategy {
            BotStrategy::Steady => affordable.min_by_key(|b| b.cost),
            BotStrategy::Greedy => {
                affordable.max_by_key(|b| b.effect.stats.values().sum::<i32>())
            }
            BotStrategy::Chaotic => {
                let candidates: Vec<_> = affordable.collect();
                if candidates.is_empty() {
                    None
                } else {
                    candidates.get(self.rng.gen_range(0..candidates.len())).copied()
                }
            }
        };
        let Some(building) = pick else {
            return BotMove::Stop;
        };
        let free = (0..map.height)
            .flat_map(|y| (0..map.width).map(move |x| (x, y)))
            .find(|&(x, y)| !map.placements.iter().any(|p| p.x == x && p.y == y));
        free.map_or(BotMove::Stop, |(x, y)| BotMove::Place {
            building: building.id.clone(),
            x,
            y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenland_game::{GameKind, SessionConfig};

    fn start(game: GameKind, seed: u64) -> (SessionRegistry, SessionState) {
        let mut registry = SessionRegistry::with_defaults().unwrap();
        let id = registry
            .start_session(SessionConfig::new(game).with_seed(seed))
            .unwrap();
        let state = registry.state(id).unwrap();
        (registry, state)
    }

    #[test]
    fn steady_bot_takes_first_choice() {
        let (registry, state) = start(GameKind::Decide, 1);
        let mut bot = Bot::new(BotStrategy::Steady, 1);
        let root = registry.scenario().node(registry.scenario().root()).unwrap();
        assert_eq!(
            bot.next_move(&registry, &state),
            BotMove::Choose {
                choice: root.choices[0].id.clone()
            }
        );
    }

    #[test]
    fn strategy_bots_buy_within_budget() {
        let (registry, state) = start(GameKind::Strategy, 2);
        for strategy in [BotStrategy::Steady, BotStrategy::Greedy] {
            let mut bot = Bot::new(strategy, 2);
            let BotMove::Enact { policy } = bot.next_move(&registry, &state) else {
                panic!("{strategy} did not enact");
            };
            let cost = registry
                .policies()
                .iter()
                .find(|p| p.id == policy)
                .unwrap()
                .cost;
            assert!(cost <= registry.config().strategy.starting_budget);
        }
    }

    #[test]
    fn map_bot_targets_free_cells() {
        let (registry, state) = start(GameKind::MapBuilder, 3);
        let mut bot = Bot::new(BotStrategy::Steady, 3);
        assert!(matches!(
            bot.next_move(&registry, &state),
            BotMove::Place { x: 0, y: 0, .. }
        ));
    }

    #[test]
    fn chaotic_bot_is_reproducible() {
        let (registry, state) = start(GameKind::Trivia, 4);
        let mut a = Bot::new(BotStrategy::Chaotic, 4);
        let mut b = Bot::new(BotStrategy::Chaotic, 4);
        for _ in 0..10 {
            assert_eq!(a.next_move(&registry, &state), b.next_move(&registry, &state));
        }
    }
}
