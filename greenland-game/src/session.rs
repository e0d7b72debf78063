//! Session registry: the library surface a presentation layer drives.
//!
//! Every operation looks a session up by id, forwards to its engine, and
//! returns a fresh [`SessionState`] snapshot. Rejected operations return an
//! error and leave the session untouched.
use log::{debug, info};
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::CatalogLoader;
use crate::catalog::ContentCatalog;
use crate::config::GameConfig;
use crate::decide::{DecideGame, DecideState, ScenarioGraph};
use crate::error::{CatalogError, GameError};
use crate::map_builder::{Building, MapBuilder, MapState};
use crate::outcome::{Outcome, OutcomeRules};
use crate::rng::SessionRng;
use crate::share::ShareCode;
use crate::strategy::{Policy, RandomEvent, StrategyGame, StrategyState};
use crate::trivia::{Question, TriviaRound, TriviaState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Decide,
    Strategy,
    Trivia,
    MapBuilder,
}

impl GameKind {
    pub const ALL: [Self; 4] = [Self::Decide, Self::Strategy, Self::Trivia, Self::MapBuilder];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decide => "decide",
            Self::Strategy => "strategy",
            Self::Trivia => "trivia",
            Self::MapBuilder => "map_builder",
        }
    }

    /// Two-letter share-code prefix.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Decide => "DT",
            Self::Strategy => "PS",
            Self::Trivia => "TQ",
            Self::MapBuilder => "MB",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(code))
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Decide => "Decide Greenland's Future",
            Self::Strategy => "Policy Simulator",
            Self::Trivia => "Greenland Trivia",
            Self::MapBuilder => "Map Builder",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized || kind.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown game `{s}`"))
    }
}

/// How to start a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub game: GameKind,
    /// Fixed seed for reproducible play; `None` draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SessionConfig {
    #[must_use]
    pub const fn new(game: GameKind) -> Self {
        Self { game, seed: None }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replay the game and seed named by a share code.
    #[must_use]
    pub fn from_share_code(code: &ShareCode) -> Self {
        Self::new(code.game()).with_seed(code.seed())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", content = "state", rename_all = "snake_case")]
pub enum GameState {
    Decide(DecideState),
    Strategy(StrategyState),
    Trivia(TriviaState),
    MapBuilder(MapState),
}

/// Snapshot handed to a presentation layer after every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub seed: u64,
    pub share_code: String,
    #[serde(flatten)]
    pub game: GameState,
}

impl SessionState {
    #[must_use]
    pub const fn kind(&self) -> GameKind {
        match self.game {
            GameState::Decide(_) => GameKind::Decide,
            GameState::Strategy(_) => GameKind::Strategy,
            GameState::Trivia(_) => GameKind::Trivia,
            GameState::MapBuilder(_) => GameKind::MapBuilder,
        }
    }
}

#[derive(Debug, Clone)]
enum Engine {
    Decide(DecideGame),
    Strategy(StrategyGame),
    Trivia(TriviaRound),
    Map(MapBuilder),
}

#[derive(Debug, Clone)]
struct Session {
    id: SessionId,
    kind: GameKind,
    rng: SessionRng,
    engine: Engine,
}

impl Session {
    /// Put the engine in its first playable phase.
    fn begin(&mut self) -> Result<(), GameError> {
        match &mut self.engine {
            Engine::Decide(game) => game.start(),
            Engine::Strategy(game) => game.start(),
            Engine::Trivia(round) => round.start(self.rng.questions()),
            Engine::Map(_) => Ok(()),
        }
    }

    fn restart(&mut self) -> Result<(), GameError> {
        self.rng.rewind();
        match &mut self.engine {
            Engine::Decide(game) => game.restart(),
            Engine::Strategy(game) => game.restart(),
            Engine::Trivia(round) => round.restart(),
            Engine::Map(map) => map.clear(),
        }
        self.begin()
    }

    fn snapshot(&self) -> SessionState {
        let game = match &self.engine {
            Engine::Decide(game) => GameState::Decide(game.snapshot()),
            Engine::Strategy(game) => GameState::Strategy(game.snapshot()),
            Engine::Trivia(round) => GameState::Trivia(round.snapshot()),
            Engine::Map(map) => GameState::MapBuilder(map.snapshot()),
        };
        SessionState {
            id: self.id,
            seed: self.rng.seed(),
            share_code: ShareCode::from_seed(self.kind, self.rng.seed()).to_string(),
            game,
        }
    }
}

const fn wrong_game(action: &'static str, actual: GameKind) -> GameError {
    GameError::WrongGame { action, actual }
}

/// Owns every live session and the read-only catalog they share.
#[derive(Debug)]
pub struct SessionRegistry {
    cfg: GameConfig,
    scenario: Arc<ScenarioGraph>,
    outcomes: Arc<OutcomeRules>,
    policies: Arc<Vec<Policy>>,
    events: Arc<Vec<RandomEvent>>,
    questions: Arc<Vec<Question>>,
    buildings: Arc<Vec<Building>>,
    sessions: BTreeMap<SessionId, Session>,
    next_id: u64,
}

impl SessionRegistry {
    /// Validate the catalog against the configuration and take ownership of both.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog fails validation.
    pub fn new(catalog: ContentCatalog, cfg: GameConfig) -> Result<Self, CatalogError> {
        catalog.validate(&cfg)?;
        let ContentCatalog {
            scenario,
            policies,
            events,
            questions,
            buildings,
        } = catalog;
        Ok(Self {
            outcomes: Arc::new(cfg.outcomes.clone()),
            cfg,
            scenario: Arc::new(scenario),
            policies: Arc::new(policies),
            events: Arc::new(events),
            questions: Arc::new(questions),
            buildings: Arc::new(buildings),
            sessions: BTreeMap::new(),
            next_id: 1,
        })
    }

    /// Registry over the embedded catalog and default tuning.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the embedded assets are invalid.
    pub fn with_defaults() -> Result<Self, CatalogError> {
        Self::new(ContentCatalog::load_default()?, GameConfig::default())
    }

    /// Build a registry from a platform-specific loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails or the loaded catalog is invalid.
    pub fn from_loader<L: CatalogLoader>(loader: &L) -> anyhow::Result<Self> {
        let catalog = loader.load_catalog()?;
        let cfg = loader.load_config()?;
        Ok(Self::new(catalog, cfg)?)
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.cfg
    }

    #[must_use]
    pub fn outcome_rules(&self) -> &OutcomeRules {
        &self.outcomes
    }

    #[must_use]
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    #[must_use]
    pub fn events(&self) -> &[RandomEvent] {
        &self.events
    }

    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    #[must_use]
    pub fn scenario(&self) -> &ScenarioGraph {
        &self.scenario
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    /// Create a session and put it in its first playable phase.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the engine refuses to start, which a validated catalog prevents.
    pub fn start_session(&mut self, session_cfg: SessionConfig) -> Result<SessionId, GameError> {
        let game = session_cfg.game;
        // Sessions only run on canonical seeds so the displayed share code replays them.
        let code = match session_cfg.seed {
            Some(seed) => ShareCode::from_seed(game, seed),
            None => ShareCode::from_entropy(game, SmallRng::from_entropy().next_u64()),
        };
        let seed = code.seed();
        let engine = match game {
            GameKind::Decide => Engine::Decide(DecideGame::new(
                Arc::clone(&self.scenario),
                Arc::clone(&self.outcomes),
                &self.cfg.decide,
            )),
            GameKind::Strategy => Engine::Strategy(StrategyGame::new(
                Arc::clone(&self.policies),
                Arc::clone(&self.events),
                &self.cfg.strategy,
            )),
            GameKind::Trivia => {
                Engine::Trivia(TriviaRound::new(Arc::clone(&self.questions), &self.cfg.trivia))
            }
            GameKind::MapBuilder => {
                Engine::Map(MapBuilder::new(Arc::clone(&self.buildings), &self.cfg.map))
            }
        };
        let id = SessionId(self.next_id);
        let mut session = Session {
            id,
            kind: game,
            rng: SessionRng::from_user_seed(seed),
            engine,
        };
        session.begin()?;
        self.next_id += 1;
        info!("session {id}: started {game} ({code})");
        self.sessions.insert(id, session);
        Ok(id)
    }

    fn session(&self, id: SessionId) -> Result<&Session, GameError> {
        self.sessions.get(&id).ok_or(GameError::UnknownSession(id))
    }

    fn update<T>(
        &mut self,
        id: SessionId,
        op: impl FnOnce(&mut Session) -> Result<T, GameError>,
    ) -> Result<SessionState, GameError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(GameError::UnknownSession(id))?;
        if let Err(err) = op(session) {
            debug!("session {id}: rejected: {err}");
            return Err(err);
        }
        Ok(session.snapshot())
    }

    /// Current snapshot of a session.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownSession`] for an unknown id.
    pub fn state(&self, id: SessionId) -> Result<SessionState, GameError> {
        self.session(id).map(Session::snapshot)
    }

    /// Pick a choice on the current decision node and complete the transition.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the session is not a decision walk or rejects the choice.
    pub fn apply_choice(
        &mut self,
        id: SessionId,
        choice_id: &str,
    ) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Decide(game) => game.apply_choice(choice_id),
            _ => Err(wrong_game("apply a choice", session.kind)),
        })
    }

    /// First half of a two-step choice: records the pick and locks input.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Locked`] while a transition is pending.
    pub fn select_choice(
        &mut self,
        id: SessionId,
        choice_id: &str,
    ) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Decide(game) => game.select_choice(choice_id),
            _ => Err(wrong_game("select a choice", session.kind)),
        })
    }

    /// Second half of a two-step choice: applies the pick and unlocks.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] when nothing is pending.
    pub fn complete_transition(&mut self, id: SessionId) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Decide(game) => game.complete_transition(),
            _ => Err(wrong_game("complete a transition", session.kind)),
        })
    }

    /// Whether a policy could be enacted right now.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] for an unknown session or a session that is not a policy simulation.
    pub fn can_enact(&self, id: SessionId, policy_id: &str) -> Result<bool, GameError> {
        let session = self.session(id)?;
        match &session.engine {
            Engine::Strategy(game) => Ok(game.can_enact(policy_id)),
            _ => Err(wrong_game("enact a policy", session.kind)),
        }
    }

    /// # Errors
    ///
    /// Returns [`GameError`] when the policy is unknown, unaffordable or already enacted.
    pub fn enact_policy(
        &mut self,
        id: SessionId,
        policy_id: &str,
    ) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Strategy(game) => game.enact_policy(policy_id),
            _ => Err(wrong_game("enact a policy", session.kind)),
        })
    }

    /// End the turn; the returned state may carry a pending event.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] outside regular play.
    pub fn end_turn(&mut self, id: SessionId) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Strategy(game) => game.end_turn(session.rng.events()),
            _ => Err(wrong_game("end a turn", session.kind)),
        })
    }

    /// # Errors
    ///
    /// Returns [`GameError`] when no event is pending or the option is unknown.
    pub fn resolve_event(
        &mut self,
        id: SessionId,
        option_id: &str,
    ) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Strategy(game) => game.resolve_event(option_id),
            _ => Err(wrong_game("resolve an event", session.kind)),
        })
    }

    /// # Errors
    ///
    /// Returns [`GameError`] when input is locked or the option index is out of range.
    pub fn answer(&mut self, id: SessionId, option: usize) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Trivia(round) => round.answer(option).map(|_| ()),
            _ => Err(wrong_game("answer a question", session.kind)),
        })
    }

    /// One second of the trivia countdown.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] when no question is being asked.
    pub fn tick(&mut self, id: SessionId) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Trivia(round) => round.tick(),
            _ => Err(wrong_game("tick a countdown", session.kind)),
        })
    }

    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] unless the current question is resolved.
    pub fn next_question(&mut self, id: SessionId) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Trivia(round) => round.next_question(),
            _ => Err(wrong_game("move to the next question", session.kind)),
        })
    }

    /// # Errors
    ///
    /// Returns [`GameError`] for out-of-bounds or occupied cells and for unknown or
    /// unaffordable buildings.
    pub fn place_building(
        &mut self,
        id: SessionId,
        building_id: &str,
        x: u32,
        y: u32,
    ) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Map(map) => map.place(building_id, x, y),
            _ => Err(wrong_game("place a building", session.kind)),
        })
    }

    /// # Errors
    ///
    /// Returns [`GameError`] for out-of-bounds or empty cells.
    pub fn remove_building(
        &mut self,
        id: SessionId,
        x: u32,
        y: u32,
    ) -> Result<SessionState, GameError> {
        self.update(id, |session| match &mut session.engine {
            Engine::Map(map) => map.remove(x, y),
            _ => Err(wrong_game("remove a building", session.kind)),
        })
    }

    /// Classified result of a finished session. Map sessions can be assessed at any time.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotFinished`] before the end, or [`GameError::WrongGame`] for
    /// trivia rounds, which end in a grade rather than an outcome.
    pub fn get_outcome(&self, id: SessionId) -> Result<Outcome, GameError> {
        let session = self.session(id)?;
        match &session.engine {
            Engine::Decide(game) => game.outcome().cloned().ok_or(GameError::NotFinished),
            Engine::Strategy(game) if game.is_finished() => {
                Ok(self.outcomes.classify(&game.stats()))
            }
            Engine::Strategy(_) => Err(GameError::NotFinished),
            Engine::Map(map) => Ok(map.assess(&self.outcomes)),
            Engine::Trivia(_) => Err(wrong_game("produce an outcome", session.kind)),
        }
    }

    /// Replay: rewind the session's random streams and start over with the same seed.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownSession`] for an unknown id.
    pub fn reset_session(&mut self, id: SessionId) -> Result<SessionState, GameError> {
        let state = self.update(id, Session::restart)?;
        info!("session {id}: reset");
        Ok(state)
    }

    /// Discard a session, returning its final snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownSession`] for an unknown id.
    pub fn end_session(&mut self, id: SessionId) -> Result<SessionState, GameError> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(GameError::UnknownSession(id))?;
        info!("session {id}: ended");
        Ok(session.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decide::WalkPhase;
    use crate::strategy::StrategyPhase;
    use crate::trivia::TriviaPhase;

    fn registry() -> SessionRegistry {
        SessionRegistry::with_defaults().unwrap()
    }

    fn first_choice(registry: &SessionRegistry, state: &SessionState) -> String {
        let GameState::Decide(walk) = &state.game else {
            panic!("not a decision walk");
        };
        let WalkPhase::InProgress { node } = &walk.phase else {
            panic!("walk is not in progress");
        };
        registry.scenario().node(node).unwrap().choices[0].id.clone()
    }

    #[test]
    fn decide_session_reaches_an_outcome() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::Decide).with_seed(9))
            .unwrap();
        assert_eq!(registry.get_outcome(id), Err(GameError::NotFinished));
        let mut state = registry.state(id).unwrap();
        for _ in 0..5 {
            let choice = first_choice(&registry, &state);
            state = registry.apply_choice(id, &choice).unwrap();
        }
        let outcome = registry.get_outcome(id).unwrap();
        let GameState::Decide(walk) = &state.game else {
            panic!("not a decision walk");
        };
        assert_eq!(walk.phase, WalkPhase::Terminal { outcome });
    }

    #[test]
    fn operations_check_the_game_kind() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::Trivia).with_seed(1))
            .unwrap();
        assert_eq!(
            registry.enact_policy(id, "language-act"),
            Err(GameError::WrongGame {
                action: "enact a policy",
                actual: GameKind::Trivia
            })
        );
        assert!(registry.get_outcome(id).is_err());
    }

    #[test]
    fn unknown_session_is_reported() {
        let mut registry = registry();
        let missing = SessionId(404);
        assert_eq!(registry.tick(missing), Err(GameError::UnknownSession(missing)));
        assert!(registry.state(missing).is_err());
    }

    #[test]
    fn rejected_operations_do_not_change_state() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::Strategy).with_seed(3))
            .unwrap();
        registry.enact_policy(id, "language-act").unwrap();
        let before = registry.state(id).unwrap();
        assert!(registry.enact_policy(id, "language-act").is_err());
        assert!(registry.resolve_event(id, "refuse-firmly").is_err());
        assert_eq!(registry.state(id).unwrap(), before);
    }

    #[test]
    fn seeded_sessions_replay_identically() {
        let mut registry = registry();
        let cfg = SessionConfig::new(GameKind::Trivia).with_seed(0x5EED);
        let a = registry.start_session(cfg).unwrap();
        let b = registry.start_session(cfg).unwrap();
        let question = |state: SessionState| match state.game {
            GameState::Trivia(trivia) => trivia.question.map(|q| q.id),
            _ => None,
        };
        assert_eq!(
            question(registry.state(a).unwrap()),
            question(registry.state(b).unwrap())
        );
    }

    #[test]
    fn reset_replays_the_same_draws() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::Trivia).with_seed(77))
            .unwrap();
        let first = registry.state(id).unwrap();
        registry.answer(id, 0).unwrap();
        registry.next_question(id).unwrap();
        let reset = registry.reset_session(id).unwrap();
        assert_eq!(reset, first);
        let GameState::Trivia(trivia) = reset.game else {
            panic!("not trivia");
        };
        assert_eq!(trivia.phase, TriviaPhase::Asking);
    }

    #[test]
    fn strategy_outcome_waits_for_the_horizon() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::Strategy).with_seed(12))
            .unwrap();
        let mut finished = false;
        for _ in 0..40 {
            let state = registry.state(id).unwrap();
            let GameState::Strategy(strategy) = &state.game else {
                panic!("not a strategy session");
            };
            match &strategy.phase {
                StrategyPhase::Playing => {
                    assert_eq!(registry.get_outcome(id), Err(GameError::NotFinished));
                    registry.end_turn(id).unwrap();
                }
                StrategyPhase::EventPending { event } => {
                    let option = registry
                        .events
                        .iter()
                        .find(|e| &e.id == event)
                        .map(|e| e.options[0].id.clone())
                        .unwrap();
                    registry.resolve_event(id, &option).unwrap();
                }
                StrategyPhase::Finished { .. } => {
                    finished = true;
                    break;
                }
                StrategyPhase::Setup => panic!("session should have started"),
            }
        }
        assert!(finished);
        assert!(registry.get_outcome(id).is_ok());
    }

    #[test]
    fn share_code_restarts_the_same_game() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::MapBuilder))
            .unwrap();
        let state = registry.state(id).unwrap();
        let code: ShareCode = state.share_code.parse().unwrap();
        assert_eq!(code.game(), GameKind::MapBuilder);
        assert_eq!(code.seed(), state.seed);
        let replay = registry
            .start_session(SessionConfig::from_share_code(&code))
            .unwrap();
        assert_eq!(registry.state(replay).unwrap().seed, state.seed);
    }

    #[test]
    fn arbitrary_seed_replays_from_its_share_code() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::Trivia).with_seed(1337))
            .unwrap();
        let state = registry.state(id).unwrap();
        let code: ShareCode = state.share_code.parse().unwrap();
        assert_eq!(code.seed(), state.seed);

        let replay = registry
            .start_session(SessionConfig::from_share_code(&code))
            .unwrap();
        let replayed = registry.state(replay).unwrap();
        assert_eq!(replayed.share_code, state.share_code);
        let (GameState::Trivia(first), GameState::Trivia(second)) = (&state.game, &replayed.game)
        else {
            panic!("not trivia");
        };
        assert_eq!(first.question, second.question);
    }

    #[test]
    fn end_session_removes_it() {
        let mut registry = registry();
        let id = registry
            .start_session(SessionConfig::new(GameKind::MapBuilder).with_seed(4))
            .unwrap();
        registry.place_building(id, "harbor", 0, 0).unwrap();
        let last = registry.end_session(id).unwrap();
        assert_eq!(last.kind(), GameKind::MapBuilder);
        assert!(registry.is_empty());
        assert!(registry.end_session(id).is_err());
    }

    #[test]
    fn game_kind_parses_names_and_codes() {
        assert_eq!("map-builder".parse::<GameKind>(), Ok(GameKind::MapBuilder));
        assert_eq!("TQ".parse::<GameKind>(), Ok(GameKind::Trivia));
        assert!("chess".parse::<GameKind>().is_err());
    }
}
