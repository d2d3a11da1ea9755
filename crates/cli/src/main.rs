//! Taggr CLI - taggr command

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

mod cmd;
mod util;

/// Taggr - tag anything with hierarchical tags and key/value pairs
#[derive(Parser)]
#[command(name = "taggr")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Metadata database to work with
    #[arg(required_unless_present = "config_example")]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Separator between hierarchical tag components (default: ".")
    #[arg(long, global = true, value_name = "SEP")]
    separator: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print an example configuration file and exit
    #[arg(long, exclusive = true)]
    config_example: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert data or metadata into the database
    #[command(subcommand)]
    Insert(InsertCommands),
    /// Associate stored content with tags, optionally with values
    Tag {
        /// Content identity
        data: i64,
        /// Tags to apply, as TAG or TAG=VALUE
        #[arg(required = true, value_name = "TAG[=VALUE]")]
        tags: Vec<String>,
    },
    /// Show a content item and its associations
    Show {
        /// Content identity
        data: i64,
    },
    /// List tags by full hierarchical name
    Tags {
        /// Only tags without a parent
        #[arg(long)]
        roots: bool,
    },
    /// List a tag and everything below it
    Descendants {
        /// Existing hierarchical tag
        tag: String,
    },
    /// List content carrying a tag
    Find {
        /// Existing hierarchical tag
        tag: String,
        /// Also match content tagged with any descendant
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show row counts
    Stats,
}

#[derive(Subcommand)]
enum InsertCommands {
    /// Insert one or more hierarchical tags
    #[command(visible_alias = "tags")]
    Tag {
        /// Tags to insert
        #[arg(required = true, value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Insert data from a file or standard input
    Data {
        /// Path to a file or "-" for standard input
        file: String,
        /// I/O buffer size in bytes
        #[arg(long, value_name = "SIZE")]
        buffer_size: Option<usize>,
        /// Hash function to apply to the data (repeatable)
        #[arg(short = 'H', long = "hash", value_name = "FUNCTION")]
        hashes: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::from(util::exit_code(&err))
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if cli.config_example {
        print!("{}", taggr_core::StoreConfig::example());
        return Ok(());
    }

    let (Some(database), Some(command)) = (cli.database, cli.command) else {
        anyhow::bail!("a database and a command are required (see --help)");
    };
    let config = util::load_config(&database, cli.config.as_deref(), cli.separator)?;

    match command {
        Commands::Insert(InsertCommands::Tag { tags }) => cmd::insert_tags::run(config, &tags),
        Commands::Insert(InsertCommands::Data {
            file,
            buffer_size,
            hashes,
        }) => cmd::insert_data::run(config, &file, buffer_size, &hashes),
        Commands::Tag { data, tags } => cmd::tag::run(config, data, &tags),
        Commands::Show { data } => cmd::show::run(config, data),
        Commands::Tags { roots } => cmd::tags::run(config, roots),
        Commands::Descendants { tag } => cmd::descendants::run(config, &tag),
        Commands::Find { tag, recursive } => cmd::find::run(config, &tag, recursive),
        Commands::Stats => cmd::stats::run(config),
    }
}
