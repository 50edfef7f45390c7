use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lotmap::render::{render_map, CancelToken, RenderOutcome};
use lotmap::rules::{read_rules, rules_to_text, write_rules};
use lotmap::{GridFlavor, RecentPaths, RuleSet, RunConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lotmap")]
#[command(about = "Render an overview image of a lot map directory")]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the map to a PNG
    Render {
        /// Directory holding .lotheader and .lotpack files
        #[arg(long)]
        map: Option<PathBuf>,

        /// Rule file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output PNG
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Cell layout: 256 or 300 squares per side
        #[arg(long, default_value = "256")]
        grid: GridFlavor,

        /// Don't read or update remembered paths
        #[arg(long)]
        no_recent: bool,
    },
    /// Work with rule files
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Parse a rule file and report errors
    Check { file: PathBuf },
    /// Print a rule file in canonical form
    Fmt {
        file: PathBuf,
        /// Rewrite the file instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Write the built-in palette to a new rule file
    Init {
        file: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Render { map, rules, output, grid, no_recent } => {
            render(map, rules, output, grid, no_recent)
        }
        Command::Rules { command } => rules_command(command),
    }
}

fn render(
    map: Option<PathBuf>,
    rules: Option<PathBuf>,
    output: Option<PathBuf>,
    grid: GridFlavor,
    no_recent: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let recent_path = if no_recent { None } else { RecentPaths::default_path() };
    let mut recent = match &recent_path {
        Some(path) => RecentPaths::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable recent paths");
            RecentPaths::default()
        }),
        None => RecentPaths::default(),
    };
    let config = RunConfig::resolve(map, rules, output, grid, &recent)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;

    let outcome = render_map(&config, &cancel, |p| {
        tracing::debug!(cell = %p.cell, "cell {}/{}", p.index + 1, p.total);
    })?;

    match outcome {
        RenderOutcome::Rendered { stats, .. } => {
            eprintln!(
                "Wrote {} ({} cells, {} missing, {} failed)",
                config.output_path.display(),
                stats.cells_rendered,
                stats.cells_missing,
                stats.cells_failed
            );
            if let Some(path) = &recent_path {
                recent.remember(&config);
                if let Err(e) = recent.save(path) {
                    tracing::warn!(error = %e, "could not save recent paths");
                }
            }
        }
        RenderOutcome::Empty => eprintln!("No cells in {}", config.map_dir.display()),
        RenderOutcome::Cancelled { .. } => {
            eprintln!("Cancelled");
            std::process::exit(130);
        }
    }
    Ok(())
}

fn rules_command(command: RulesCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        RulesCommand::Check { file } => {
            let rules = read_rules(&file)?;
            println!("{}: {} rules, version {}", file.display(), rules.len(), rules.version);
        }
        RulesCommand::Fmt { file, write } => {
            let rules = read_rules(&file)?;
            if write {
                write_rules(&file, &rules)?;
            } else {
                print!("{}", rules_to_text(&rules)?);
            }
        }
        RulesCommand::Init { file, force } => {
            if file.exists() && !force {
                return Err(format!("{} already exists (use --force to overwrite)", file.display()).into());
            }
            write_rules(&file, &RuleSet::builtin())?;
            eprintln!("Wrote {}", file.display());
        }
    }
    Ok(())
}
