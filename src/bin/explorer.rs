//! Proto Explorer CLI
//!
//! Browse compiled protobuf schemas from the terminal.
//!
//! Usage:
//!   proto-explorer root path/to/schema.proto
//!   proto-explorer show Order --proto path/to/schema.proto --pattern currency --filter
//!   proto-explorer messages --descriptor-set out.pb

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use proto_explorer::{DescriptorPool, Explorer, ExplorerConfig, RootResolver};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "proto-explorer")]
#[command(about = "Browse and search protobuf message hierarchies")]
#[command(version)]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where descriptors come from
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Schema source file, compiled with protoc
    #[arg(short, long)]
    proto: Option<PathBuf>,

    /// Prebuilt descriptor set (protoc --descriptor_set_out)
    #[arg(short, long)]
    descriptor_set: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected import root of a schema file
    Root {
        file: PathBuf,

        /// Ancestor directories to consider
        #[arg(long)]
        max_levels: Option<usize>,
    },

    /// Print the detected import root of every schema file under a directory
    Roots {
        dir: PathBuf,
    },

    /// List the top-level messages of a module
    Messages {
        #[command(flatten)]
        source: Source,
    },

    /// Render a message tree
    Show {
        /// Message full name, simple name, or close match
        message: String,

        #[command(flatten)]
        source: Source,

        /// Regex search pattern
        #[arg(short = 'e', long, default_value = "")]
        pattern: String,

        /// Show only matching branches
        #[arg(short, long)]
        filter: bool,

        /// Output directives as JSON
        #[arg(long)]
        json: bool,
    },

    /// List groups of mutually recursive messages
    Cycles {
        #[command(flatten)]
        source: Source,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match ExplorerConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: ExplorerConfig) -> anyhow::Result<()> {
    let mut explorer = Explorer::new(config);

    match command {
        Commands::Root { file, max_levels } => {
            let root = match max_levels {
                Some(levels) => RootResolver::from_config(&explorer.config().resolver)
                    .with_max_levels(levels)
                    .resolve(&file)?,
                None => explorer.resolve_root(&file)?,
            };
            println!("{}", root.display());
        }

        Commands::Roots { dir } => {
            let resolver = RootResolver::from_config(&explorer.config().resolver);
            let mut failures = 0;

            for entry in WalkDir::new(&dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                let is_schema = path.is_file()
                    && path
                        .extension()
                        .map(|ext| ext == resolver.extension())
                        .unwrap_or(false);
                if !is_schema {
                    continue;
                }

                match resolver.resolve(path) {
                    Ok(root) => println!("{} -> {}", path.display(), root.display()),
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "root resolution failed");
                        eprintln!("{}: {}", path.display(), e);
                        failures += 1;
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{} schema file(s) could not be resolved", failures);
            }
        }

        Commands::Messages { source } => {
            let pool = load(&mut explorer, &source)?;
            let messages = pool.list_top_level_messages();
            if messages.is_empty() {
                println!("No messages found.");
            }
            for name in messages.keys() {
                println!("{}", name);
            }
        }

        Commands::Show {
            message,
            source,
            pattern,
            filter,
            json,
        } => {
            let pool = load(&mut explorer, &source)?;
            let report = explorer.render(&pool, &message, &pattern, Some(filter))?;

            if let Some(err) = &report.pattern_error {
                eprintln!("Warning: {}; showing the unfiltered tree", err);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report.output)?);
            } else {
                print!("{}", explorer.format_text(&report));
            }
        }

        Commands::Cycles { source } => {
            let pool = load(&mut explorer, &source)?;
            let groups = pool.recursive_groups();
            if groups.is_empty() {
                println!("No recursive messages.");
            }
            for group in groups {
                println!("{}", group.join(" <-> "));
            }
        }
    }

    Ok(())
}

fn load(explorer: &mut Explorer, source: &Source) -> anyhow::Result<Arc<DescriptorPool>> {
    match (&source.proto, &source.descriptor_set) {
        (Some(proto), _) => explorer
            .load_schema(proto)
            .with_context(|| format!("loading {}", proto.display())),
        (None, Some(set)) => explorer
            .load_descriptor_set(set)
            .with_context(|| format!("reading descriptor set {}", set.display())),
        (None, None) => anyhow::bail!("either --proto or --descriptor-set is required"),
    }
}
