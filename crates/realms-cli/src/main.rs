use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "realms-cli", version, about = "Eternal Realms CLI")]
struct Cli {
    /// Act as this character instead of the configured one
    #[arg(long, global = true)]
    character: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gathering session control
    Gather {
        #[command(subcommand)]
        action: commands::gather::GatherAction,
    },
    /// Skill levels and experience
    Skills {
        #[command(subcommand)]
        action: commands::skills::SkillsAction,
    },
    /// Collected materials
    Inventory,
    /// Material catalog
    Materials {
        /// Only materials the character can start right now
        #[arg(long)]
        available: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("REALMS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let character = cli.character;
    let result = match cli.command {
        Commands::Gather { action } => commands::gather::run(action, character),
        Commands::Skills { action } => commands::skills::run(action, character),
        Commands::Inventory => commands::skills::inventory(character),
        Commands::Materials { available } => commands::materials::run(available, character),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "realms-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
