use anyhow::Result;
use colored::Colorize;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::seeds::SeedInfo;
use super::simulation::{GameSimulator, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub share_code: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Ending of the first iteration, for the report tables.
    pub ending: String,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct LogicTester {
    simulator: GameSimulator,
    verbose: bool,
    check_replay: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(simulator: GameSimulator, verbose: bool) -> Self {
        Self {
            simulator,
            verbose,
            check_replay: true,
        }
    }

    #[must_use]
    pub const fn with_replay_check(mut self, check_replay: bool) -> Self {
        self.check_replay = check_replay;
        self
    }

    /// Run a plan once per seed. Share-code seeds issued for another game are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a session cannot be started.
    pub fn run_plan(
        &mut self,
        plan: &SimulationPlan,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Result<Vec<ScenarioResult>> {
        let mut results = Vec::new();
        for seed in seeds.iter().filter(|s| s.matches_game(plan.game)) {
            if self.verbose {
                println!(
                    "🧪 Testing {} (seed {} / {})",
                    plan.name().bright_white(),
                    seed.seed,
                    seed.share_code_for(plan.game)
                );
            }
            results.push(self.run_single(plan, seed, iterations)?);
        }
        Ok(results)
    }

    fn run_single(
        &mut self,
        plan: &SimulationPlan,
        seed: &SeedInfo,
        iterations: usize,
    ) -> Result<ScenarioResult> {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut ending = String::new();

        for i in 0..iterations {
            let iteration_seed = seed
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let start = Instant::now();
            let summary = self.simulator.run(plan, iteration_seed)?;
            let duration = start.elapsed();
            if i == 0 {
                ending = summary.ending();
            }

            match self.evaluate(plan, &summary)? {
                None => {
                    successes += 1;
                    durations.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) steps:{} ending:{}",
                            i + 1,
                            iterations,
                            summary.steps,
                            summary.ending()
                        );
                    }
                }
                Some(err) => {
                    let failure = format!(
                        "Iteration {} (seed {}, code {}, steps {}, ending '{}'): {} \
                         | last moves: {}",
                        i + 1,
                        summary.seed,
                        summary.share_code,
                        summary.steps,
                        summary.ending(),
                        err,
                        last_moves(&summary)
                    );
                    warn!("{}: {failure}", plan.name());
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.red()
                        );
                    }
                    failures.push(failure);
                }
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        Ok(ScenarioResult {
            scenario_name: plan.name(),
            seed: seed.seed,
            share_code: seed.share_code_for(plan.game),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            ending,
            average_duration,
        })
    }

    fn evaluate(
        &mut self,
        plan: &SimulationPlan,
        summary: &SimulationSummary,
    ) -> Result<Option<String>> {
        if let Some(violation) = summary.violations.first() {
            return Ok(Some(violation.to_string()));
        }
        if !summary.passed() {
            return Ok(Some(format!(
                "session did not finish within {} steps",
                plan.max_steps
            )));
        }
        if self.check_replay {
            let replay = self.simulator.run(plan, summary.seed)?;
            if replay.transcript_hash != summary.transcript_hash {
                return Ok(Some(format!(
                    "replay diverged: {:016x} vs {:016x}",
                    summary.transcript_hash, replay.transcript_hash
                )));
            }
        }
        Ok(None)
    }
}

fn last_moves(summary: &SimulationSummary) -> String {
    if summary.moves.is_empty() {
        return "none".to_string();
    }
    summary
        .moves
        .iter()
        .rev()
        .take(3)
        .map(|m| format!("{m:?}"))
        .collect::<Vec<_>>()
        .join(" <- ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::bots::BotStrategy;
    use greenland_game::{GameKind, ShareCode};

    fn tester() -> LogicTester {
        LogicTester::new(GameSimulator::with_defaults().unwrap(), false)
    }

    #[test]
    fn plan_passes_for_every_seed() {
        let mut tester = tester();
        let plan = SimulationPlan::new(GameKind::Strategy, BotStrategy::Greedy);
        let seeds = [SeedInfo::from_numeric(1), SeedInfo::from_numeric(2)];
        let results = tester.run_plan(&plan, &seeds, 3).unwrap();
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 3);
            assert!(result.share_code.starts_with("PS-"));
        }
    }

    #[test]
    fn foreign_share_codes_are_skipped() {
        let mut tester = tester();
        let code: ShareCode = "TQ-NARWHAL07".parse().unwrap();
        let seeds = [SeedInfo::from_share_code(&code)];
        let decide = SimulationPlan::new(GameKind::Decide, BotStrategy::Steady);
        assert!(tester.run_plan(&decide, &seeds, 1).unwrap().is_empty());
        let trivia = SimulationPlan::new(GameKind::Trivia, BotStrategy::Steady);
        let results = tester.run_plan(&trivia, &seeds, 1).unwrap();
        assert_eq!(results[0].share_code, "TQ-NARWHAL07");
    }

    #[test]
    fn unfinished_runs_are_failures() {
        let mut tester = tester().with_replay_check(false);
        let plan = SimulationPlan::new(GameKind::Trivia, BotStrategy::Steady).with_max_steps(3);
        let results = tester
            .run_plan(&plan, &[SeedInfo::from_numeric(5)], 2)
            .unwrap();
        assert!(!results[0].passed);
        assert_eq!(results[0].failures.len(), 2);
        assert!(results[0].failures[0].contains("did not finish"));
        let line = &results[0].failures[0];
        assert!(line.contains("): session did not finish within 3 steps | last moves: "));
        assert_eq!(results[0].average_duration, Duration::ZERO);
    }

    #[test]
    fn results_serialize_durations_as_micros() {
        let result = ScenarioResult {
            scenario_name: "decide/steady".to_string(),
            seed: 1,
            share_code: "DT-ICEBERG00".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            ending: "Sovereign Nation".to_string(),
            average_duration: Duration::from_micros(1500),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 1500);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_micros(1500));
    }
}
