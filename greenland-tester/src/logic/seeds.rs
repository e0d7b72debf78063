use anyhow::{Result, bail};
use greenland_game::{GameKind, ShareCode};
use greenland_game::share::WORD_LIST;
use std::collections::HashMap;

/// Seed requested on the command line, with the share code it came from if any.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_game: Option<GameKind>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_game: None,
        }
    }

    #[must_use]
    pub fn from_share_code(code: &ShareCode) -> Self {
        Self {
            seed: code.seed(),
            code: Some(code.to_string()),
            source_game: Some(code.game()),
        }
    }

    /// Share codes only replay the game they were issued for.
    #[must_use]
    pub fn matches_game(&self, game: GameKind) -> bool {
        self.source_game.is_none_or(|source| source == game)
    }

    #[must_use]
    pub fn share_code_for(&self, game: GameKind) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_game)
            && source == game
        {
            return code.clone();
        }
        ShareCode::from_seed(game, self.seed).to_string()
    }
}

/// Resolve CLI seed tokens into seeds.
///
/// Accepts integers (negative values use their magnitude), share codes such
/// as `DT-ICEBERG42`, and `all` which expands to every share code of every game.
///
/// # Errors
///
/// Returns an error for a token that is neither a number nor a valid share code.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }
        match token.parse::<ShareCode>() {
            Ok(code) => pending.push(SeedInfo::from_share_code(&code)),
            Err(err) => bail!("Unrecognized seed token {token}: {err}"),
        }
    }

    if request_all {
        pending.extend(all_share_code_seeds());
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<GameKind>), usize> = HashMap::new();
    for info in pending {
        let key = (info.seed, info.source_game);
        if let Some(&existing) = index.get(&key) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }
    Ok(deduped)
}

fn all_share_code_seeds() -> Vec<SeedInfo> {
    let mut seeds = Vec::with_capacity(GameKind::ALL.len() * WORD_LIST.len() * 100);
    for game in GameKind::ALL {
        for word in WORD_LIST {
            for number in 0..100 {
                let raw = format!("{}-{word}{number:02}", game.code());
                if let Ok(code) = raw.parse::<ShareCode>() {
                    seeds.push(SeedInfo::from_share_code(&code));
                }
            }
        }
    }
    seeds
}
