//! Reversible share codes and one-line result summaries.
//!
//! Code format: `<GAME>-<WORD><NN>`, e.g. `DT-ICEBERG42`, `TQ-NARWHAL07`.
use std::fmt;
use std::str::FromStr;

use crate::decide::WalkPhase;
use crate::error::ShareCodeError;
use crate::session::{GameKind, GameState, SessionState};
use crate::strategy::StrategyPhase;
use crate::trivia::TriviaPhase;

pub const WORD_LIST: [&str; 64] = [
    "ICEBERG", "NARWHAL", "KAYAK", "QAJAQ", "FJORD", "GLACIER", "AURORA", "TUNDRA", "MUSKOX",
    "WALRUS", "SEAL", "ORCA", "BELUGA", "PTARMIG", "RAVEN", "FALCON", "HUSKY", "SLED", "IGLOO",
    "ANORAK", "KAMIK", "DRUM", "TUPILAK", "NUUK", "DISKO", "THULE", "NANOK", "SERMEQ", "UMIAQ",
    "HARBOR", "TRAWLER", "SHRIMP", "HALIBUT", "CHAR", "CAPELIN", "CRYSTAL", "BASALT", "GARNET",
    "RUBY", "ZINC", "COPPER", "HYDRO", "SOLSTIC", "MIDNITE", "POLAR", "NORTH", "SNOW", "FIRN",
    "MORAINE", "CREVASS", "CALVING", "MELT", "CURRENT", "TIDE", "STORM", "HARPOON", "ANCHOR",
    "BEACON", "HORIZON", "COMPASS", "SUMMIT", "VALLEY", "HERITAG", "FUTURE",
];

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

const fn pack(word_index: u16, number: u8) -> u16 {
    (word_index & 0x01FF) | ((number as u16 & 0x7F) << 9)
}

#[allow(clippy::cast_possible_truncation)]
const fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

/// Replayable identifier for a session: game kind plus a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareCode {
    game: GameKind,
    word_index: u16,
    number: u8,
}

impl ShareCode {
    /// Code for an arbitrary seed. Only the low 16 bits take part, so
    /// [`ShareCode::seed`] returns the canonical seed for the code rather than `seed`.
    #[must_use]
    pub fn from_seed(game: GameKind, seed: u64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let (word_index, number) = unpack((seed & 0xFFFF) as u16);
        Self::from_parts(game, usize::from(word_index), u64::from(number))
    }

    /// Fresh code from an entropy value.
    #[must_use]
    pub fn from_entropy(game: GameKind, entropy: u64) -> Self {
        let word_index = usize::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
        Self::from_parts(game, word_index, entropy >> 17)
    }

    fn from_parts(game: GameKind, word_index: usize, number: u64) -> Self {
        let word_index = u16::try_from(word_index % WORD_LIST.len()).unwrap_or(0);
        let number = u8::try_from(number % 100).unwrap_or(0);
        Self {
            game,
            word_index,
            number,
        }
    }

    #[must_use]
    pub const fn game(&self) -> GameKind {
        self.game
    }

    #[must_use]
    pub fn word(&self) -> &'static str {
        WORD_LIST
            .get(usize::from(self.word_index))
            .copied()
            .unwrap_or(WORD_LIST[0])
    }

    /// Canonical seed for this code. Encoding the returned seed yields the same code.
    #[must_use]
    pub fn seed(&self) -> u64 {
        let packed = pack(self.word_index, self.number);
        let prefix = self.game.code().as_bytes();
        let mut buf = [0u8; 11];
        buf[..6].copy_from_slice(b"GRNLD-");
        buf[6] = prefix[0];
        buf[7] = prefix[1];
        buf[8..10].copy_from_slice(&packed.to_le_bytes());
        buf[10] = 0xA5;
        (fnv1a64(&buf) & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{:02}", self.game.code(), self.word(), self.number)
    }
}

impl FromStr for ShareCode {
    type Err = ShareCodeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let code = code.trim();
        let (prefix, rest) = code
            .split_once('-')
            .ok_or_else(|| ShareCodeError::Malformed(code.to_string()))?;
        let game = GameKind::from_code(prefix)
            .ok_or_else(|| ShareCodeError::UnknownGame(prefix.to_string()))?;
        if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 2) {
            return Err(ShareCodeError::Malformed(code.to_string()));
        }
        let (word_part, number_part) = rest.split_at(rest.len() - 2);
        if !number_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ShareCodeError::Malformed(code.to_string()));
        }
        let number: u8 = number_part
            .parse()
            .map_err(|_| ShareCodeError::Malformed(code.to_string()))?;
        let word = sanitize_word(word_part);
        let word_index = WORD_LIST
            .iter()
            .position(|w| *w == word)
            .ok_or_else(|| ShareCodeError::UnknownWord(word_part.to_string()))?;
        Ok(Self::from_parts(game, word_index, u64::from(number)))
    }
}

/// One-line summary of a session suitable for a clipboard or share sheet.
#[must_use]
pub fn share_text(state: &SessionState) -> String {
    let code = &state.share_code;
    match &state.game {
        GameState::Decide(walk) => match &walk.phase {
            WalkPhase::Terminal { outcome } => format!(
                "I decided Greenland's future: {} ({}). Replay with {code}.",
                outcome.title,
                stat_line(&outcome.stats)
            ),
            _ => format!(
                "I'm {} choices into deciding Greenland's future. Play along with {code}.",
                walk.step
            ),
        },
        GameState::Strategy(strategy) => match &strategy.phase {
            StrategyPhase::Finished { achievements } => {
                let badges = if achievements.is_empty() {
                    String::from("no achievements")
                } else {
                    achievements
                        .iter()
                        .map(|a| a.title.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                format!(
                    "I governed Greenland for {} turns with {} in the treasury \
                     and earned {badges} ({}). Replay with {code}.",
                    strategy.horizon,
                    strategy.budget,
                    stat_line(&strategy.stats)
                )
            }
            _ => format!(
                "Turn {} of {} governing Greenland. Play along with {code}.",
                strategy.turn, strategy.horizon
            ),
        },
        GameState::Trivia(trivia) => match &trivia.phase {
            TriviaPhase::Finished { grade } => format!(
                "I scored {} points on the Greenland quiz: {}/{} correct, \
                 grade {grade}, best streak {}. Try {code}.",
                trivia.score, trivia.correct_count, trivia.total, trivia.best_streak
            ),
            _ => format!(
                "{} points so far on the Greenland quiz. Try {code}.",
                trivia.score
            ),
        },
        GameState::MapBuilder(map) => format!(
            "I built a Greenland of {} buildings with {} left to spend ({}). \
             Build yours with {code}.",
            map.placements.len(),
            map.budget,
            stat_line(&map.stats)
        ),
    }
}

fn stat_line(stats: &crate::stats::StatVector) -> String {
    stats
        .iter()
        .map(|(axis, value)| format!("{} {value}", axis.label()))
        .collect::<Vec<_>>()
        .join(", ")
}
