mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use greenland_game::{GameKind, SessionRegistry};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::simulation::DEFAULT_MAX_STEPS;
use logic::{
    BotStrategy, FileCatalog, GameSimulator, LogicTester, ScenarioResult, SimulationPlan,
    resolve_seed_inputs,
};

#[derive(Debug, Parser)]
#[command(name = "greenland-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs and invariant checks for the Greenland game engines")]
struct Args {
    /// Games to run (comma-separated: decide, strategy, trivia, map-builder, or all)
    #[arg(long, default_value = "all")]
    games: String,

    /// Bot strategies to play with (comma-separated: steady, greedy, chaotic, or all)
    #[arg(long, default_value = "all")]
    bots: String,

    /// List games and bot strategies and exit
    #[arg(long)]
    list: bool,

    /// Seeds to run (comma-separated integers, share codes like DT-ICEBERG42, or all)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per game, bot and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Abort a playthrough after this many operations
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Skip replaying each run to check determinism
    #[arg(long)]
    no_replay: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Content catalog JSON to test instead of the embedded one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine tuning JSON to test instead of the defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let games = expand_games(&args.games)?;
    let bots = expand_bots(&args.bots)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let loader = FileCatalog {
        catalog: args.catalog.clone(),
        config: args.config.clone(),
    };
    let registry = SessionRegistry::from_loader(&loader).context("failed to load game content")?;
    let simulator = GameSimulator::new(registry);
    info!(
        "loaded {} scenario nodes, {} policies, {} events, {} buildings",
        simulator.registry().scenario().len(),
        simulator.registry().policies().len(),
        simulator.registry().events().len(),
        simulator.registry().buildings().len()
    );
    let mut tester =
        LogicTester::new(simulator, args.verbose).with_replay_check(!args.no_replay);

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results: Vec<ScenarioResult> = Vec::new();
    for &game in &games {
        for &bot in &bots {
            let plan = SimulationPlan::new(game, bot).with_max_steps(args.max_steps);
            results.extend(tester.run_plan(&plan, &seeds, args.iterations)?);
        }
    }

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list(args: &Args) -> Result<bool> {
    if !args.list {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available games:")?;
    for game in GameKind::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} {} - {}",
            game.as_str(),
            game.code(),
            game.label()
        )?;
    }
    writeln!(output_target.writer(), "Available bots:")?;
    for bot in BotStrategy::ALL {
        writeln!(output_target.writer(), "  {}", bot.label())?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🧊 Greenland Automated Tester".bright_cyan().bold());
    println!("{}", "=================================".cyan());
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn expand_games(raw: &str) -> Result<Vec<GameKind>> {
    let mut games = Vec::new();
    for token in split_csv(raw) {
        if token.eq_ignore_ascii_case("all") {
            games.extend(GameKind::ALL);
            continue;
        }
        match token.parse::<GameKind>() {
            Ok(game) => games.push(game),
            Err(err) => bail!(err),
        }
    }
    games.dedup();
    Ok(games)
}

fn expand_bots(raw: &str) -> Result<Vec<BotStrategy>> {
    let mut bots = Vec::new();
    for token in split_csv(raw) {
        if token.eq_ignore_ascii_case("all") {
            bots.extend(BotStrategy::ALL);
            continue;
        }
        match BotStrategy::ALL
            .into_iter()
            .find(|bot| bot.label().eq_ignore_ascii_case(&token))
        {
            Some(bot) => bots.push(bot),
            None => bail!("unknown bot strategy `{token}`"),
        }
    }
    bots.dedup();
    Ok(bots)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_expand_and_parse_codes() {
        assert_eq!(expand_games("all").unwrap(), GameKind::ALL.to_vec());
        assert_eq!(
            expand_games("trivia, MB").unwrap(),
            vec![GameKind::Trivia, GameKind::MapBuilder]
        );
        assert!(expand_games("chess").is_err());
    }

    #[test]
    fn bots_expand() {
        assert_eq!(expand_bots("all").unwrap(), BotStrategy::ALL.to_vec());
        assert_eq!(expand_bots("Greedy").unwrap(), vec![BotStrategy::Greedy]);
        assert!(expand_bots("lazy").is_err());
    }

    #[test]
    fn csv_skips_blanks() {
        assert_eq!(split_csv(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn output_target_writes_file() {
        let path = std::env::temp_dir().join(format!("greenland-output-{}", std::process::id()));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello\n");
    }
}
