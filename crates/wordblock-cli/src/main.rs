use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wordblock_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "wordblock", version, about = "WordBlock CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vocabulary management
    Word {
        #[command(subcommand)]
        action: commands::word::WordAction,
    },
    /// Learning sessions
    Study {
        #[command(subcommand)]
        action: commands::study::StudyAction,
    },
    /// Blocking settings and checks
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Usage samples and screen visits
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },
    /// Run the usage poller in the foreground, printing events as JSON lines
    Monitor(commands::monitor::MonitorArgs),
    /// Learning statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Export, import or clear stored data
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

/// `WORDBLOCK_LOG` wins over `logging.level`. Logs go to stderr so stdout
/// stays valid JSON.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("WORDBLOCK_LOG").unwrap_or_else(|_| {
        let level = Config::load_or_default().logging.level;
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "wordblock", &mut std::io::stdout());
        return;
    }

    init_tracing();
    let result = match cli.command {
        Commands::Word { action } => commands::word::run(action),
        Commands::Study { action } => commands::study::run(action),
        Commands::Block { action } => commands::block::run(action),
        Commands::Usage { action } => commands::usage::run(action),
        Commands::Monitor(args) => commands::monitor::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Data { action } => commands::data::run(action),
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
