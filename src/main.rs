use clap::Parser;
use clap::Subcommand;

use git_testament::git_testament;
use git_testament::render_testament;
use markdup::duplicates;

git_testament!(TESTAMENT);

//===============//
// Command setup //
//===============//

#[derive(Parser)]
#[command(name = "markdup", version = render_testament!(TESTAMENT), propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only errors are printed to the stderr stream.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// All available information, including debug information, is printed to
    /// stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Marks duplicate reads and pairs within a BAM file.
    Mark(duplicates::command::MarkArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Mark(args) => duplicates::command::mark(args),
    }
}
