use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::PathBuf;
use tapewalk::{
    analyze, analyze_input, EngineConfig, Limits, Machine, MoveConvention, RuleTable, Status,
    StepResult, Symbol, TableLoader, TableManager, Tape,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs a single-tape Turing machine rule table until it halts.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tapewalk-cli tables/busy-beaver-3.tm --trace
  tapewalk-cli --builtin \"Busy beaver 2\" --input 1,0,1
  cat table.json | tapewalk-cli --json")]
struct Cli {
    /// Path to a rule table file (.tm or .json).
    /// If not provided, the table is read from piped stdin, or the first built-in table is used.
    table: Option<PathBuf>,

    /// Run a built-in table by name
    #[clap(short, long, conflicts_with = "table")]
    builtin: Option<String>,

    /// List the built-in tables and exit
    #[clap(short, long)]
    list: bool,

    /// Initial tape contents, placed from index 0
    #[clap(short, long, value_delimiter = ',')]
    input: Vec<Symbol>,

    /// JSON file with engine settings; flags below override it
    #[clap(long)]
    config: Option<PathBuf>,

    /// Stop with an error after this many steps
    #[clap(long)]
    max_steps: Option<u64>,

    /// Stop with an error when the tape would exceed this many cells
    #[clap(long)]
    max_cells: Option<usize>,

    /// Disable both step and tape limits
    #[clap(long, conflicts_with_all = ["max_steps", "max_cells"])]
    unbounded: bool,

    /// Blank cells shown around the final configuration
    #[clap(short, long)]
    margin: Option<usize>,

    /// How left/right moves change the head index
    #[clap(long, value_enum)]
    convention: Option<Convention>,

    /// Print each step of the execution
    #[clap(short, long)]
    trace: bool,

    /// Print one JSON snapshot per step instead of text
    #[clap(long, conflicts_with = "trace")]
    json: bool,

    /// Analyze the table and input without running it
    #[clap(long)]
    check: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Convention {
    /// Left increments the head index, right decrements it
    TapeShift,
    /// Left decrements the head index, right increments it
    HeadMove,
}

impl From<Convention> for MoveConvention {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::TapeShift => MoveConvention::TapeShift,
            Convention::HeadMove => MoveConvention::HeadMove,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list {
        list_tables()?;
        return Ok(());
    }

    let table = load_table(&cli)?;
    let tape = Tape::from_symbols(0, &cli.input);

    if cli.check {
        check_table(&table, &tape);
        return Ok(());
    }

    for warning in analyze(&table).into_iter().chain(analyze_input(&table, &tape)) {
        warn!(%warning, "Table analysis");
    }

    let config = load_config(&cli)?;
    info!(table = table.name(), ?config, "Starting machine");

    let mut machine = Machine::with_tape(table, tape, config);
    run(&mut machine, &cli)?;
    report(&machine, cli.json)
}

/// Installs the log subscriber. `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn list_tables() -> anyhow::Result<()> {
    for index in 0..TableManager::count() {
        let info = TableManager::info(index)?;
        println!(
            "{:>2}  {:<20} {} states, {} symbols",
            info.index, info.name, info.state_count, info.symbol_count
        );
    }
    Ok(())
}

/// Loads the table from `--builtin`, a file path, piped stdin, or the default
/// built-in table, in that order.
fn load_table(cli: &Cli) -> anyhow::Result<RuleTable> {
    if let Some(name) = &cli.builtin {
        return Ok(TableManager::by_name(name)?);
    }

    if let Some(path) = &cli.table {
        return TableLoader::load_table(path)
            .with_context(|| format!("Failed to load table '{}'", path.display()));
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;

        let table = if buffer.trim_start().starts_with('{') {
            TableLoader::load_table_from_json(&buffer)
        } else {
            TableLoader::load_table_from_string(&buffer)
        };
        return table.context("Failed to load table from stdin");
    }

    Ok(TableManager::by_index(0)?)
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config '{}'", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if cli.unbounded {
        config.limits = Limits::unbounded();
    }
    if let Some(max_steps) = cli.max_steps {
        config.limits.max_steps = Some(max_steps);
    }
    if let Some(max_cells) = cli.max_cells {
        config.limits.max_tape_cells = Some(max_cells);
    }
    if let Some(margin) = cli.margin {
        config.margin = margin;
    }
    if let Some(convention) = cli.convention {
        config.convention = convention.into();
    }

    Ok(config)
}

fn check_table(table: &RuleTable, tape: &Tape) {
    let warnings = analyze(table)
        .into_iter()
        .chain(analyze_input(table, tape))
        .collect::<Vec<_>>();

    println!(
        "{}: {} states, {} symbols",
        table.name(),
        table.state_count(),
        table.symbol_count()
    );

    if warnings.is_empty() {
        println!("No issues found.");
    }
    for warning in warnings {
        println!("warning: {warning}");
    }
}

fn run(machine: &mut Machine, cli: &Cli) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string(&machine.snapshot())?);
    }

    loop {
        let result = machine
            .step()
            .with_context(|| format!("Machine stopped after {} steps", machine.step_count()))?;

        if cli.trace {
            print_step(&result);
        } else if cli.json {
            println!("{}", serde_json::to_string(&machine.snapshot())?);
        }

        if result.status == Status::Halted {
            return Ok(());
        }
    }
}

fn print_step(result: &StepResult) {
    println!(
        "Step {}: read {}, wrote {}, moved {}, head {}, state {}",
        result.step, result.read, result.written, result.direction, result.head, result.state
    );
}

fn report(machine: &Machine, json: bool) -> anyhow::Result<()> {
    let extraction = machine.extract_result()?;

    if json {
        println!("{}", serde_json::to_string(&extraction)?);
        return Ok(());
    }

    println!("\nHalted after {} steps.", machine.step_count());
    println!("Final configuration:");
    match extraction {
        Some(extraction) => println!(
            "{}  (cells {}..={}, {} marked)",
            extraction,
            extraction.start,
            extraction.end(),
            extraction.marked()
        ),
        None => println!("(empty tape)"),
    }

    Ok(())
}
