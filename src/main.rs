use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "smile")]
#[command(version)]
#[command(about = "I Need A Smile - one click, one silly picture")]
#[command(long_about = "Picks a scene from weighted inspiration tags, asks an image-generation\n\
    API to paint it, and learns from 1-5 star ratings which tags make people smile.\n\n\
    Configuration comes from the environment: SMILE_IMAGE_API_KEY or OPENAI_API_KEY,\n\
    SMILE_SECRET, SMILE_IMAGE_API_URL, SMILE_IMAGE_MODEL, SMILE_IMAGE_SIZE,\n\
    SMILE_ROOT and SMILE_BIND.")]
#[command(after_help = "EXAMPLES:\n    \
    smile init                                   Create static/ and smiles.db\n    \
    smile serve                                  Listen on 127.0.0.1:8000\n    \
    smile serve --socket run/smile.sock          Listen on a Unix socket\n    \
    smile apache --server-name smile.example.com Print a matching Apache vhost\n    \
    smile stats --category actors                Show the best-loved actors\n\n\
    For more information about a command, run 'smile <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    #[command(long_about = "Serves the site over TCP or a Unix domain socket until Ctrl+C\n\
        or SIGTERM. Creates the static/ layout and database on first start.")]
    Serve(commands::serve::Args),

    /// Create the directory layout and seed the database
    Init(commands::init::Args),

    /// Generate one picture from the terminal
    #[command(long_about = "Runs the same pipeline as the web endpoint: picks tags, logs the\n\
        prompt, calls the images API and saves the fitted PNG under\n\
        static/generated/.")]
    Generate(commands::generate::Args),

    /// Show tag scores and recent ratings
    Stats(commands::stats::Args),

    /// Show the resolved configuration
    Config(commands::config::Args),

    /// Print an Apache reverse-proxy vhost for this server
    #[command(long_about = "Prints a <VirtualHost> block whose ProxyPass target matches the\n\
        server's bind address or socket. A proxy pointing somewhere the\n\
        server is not listening answers with 503.")]
    Apache(commands::apache::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve(args) => args.log_file.as_deref(),
        _ => None,
    };
    let _guard = cli::init_logging(cli.verbose, log_file)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Init(args) => commands::init::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Apache(args) => commands::apache::run(args),
    }
}
