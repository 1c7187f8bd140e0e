//! Explorer Config CLI
//!
//! View and manage proto-explorer configuration.

use clap::{Parser, Subcommand};
use proto_explorer::{ExplorerConfig, RootResolver};

#[derive(Parser)]
#[command(name = "proto-explorer-config")]
#[command(about = "View and manage proto-explorer configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: proto-explorer.toml)
        #[arg(short, long, default_value = "proto-explorer.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = ExplorerConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("Proto Explorer Configuration\n");
                println!("Resolver:");
                println!("  Max levels: {}", cfg.resolver.max_levels);
                println!("  Extension: .{}", cfg.resolver.extension);

                println!("\nCompiler:");
                println!("  Program: {}", cfg.compiler.program);
                println!("  Include imports: {}", cfg.compiler.include_imports);
                if !cfg.compiler.include_paths.is_empty() {
                    println!("  Include paths:");
                    for path in &cfg.compiler.include_paths {
                        println!("    - {}", path.display());
                    }
                }

                println!("\nRender:");
                println!("  Filter mode: {}", cfg.render.filter_mode);
                println!("  Indent width: {}", cfg.render.indent_width);
                println!("  Repeated marker: {:?}", cfg.render.repeated_marker);
                println!(
                    "  Highlight: {:?} ... {:?}",
                    cfg.render.highlight_open, cfg.render.highlight_close
                );

                println!("\nLogging:");
                println!("  Level: {}", cfg.logging.level);
            }
        }

        Commands::Init { output } => {
            let cfg = ExplorerConfig::default();
            cfg.save(&output)?;
            println!("Created config file: {}", output);
        }

        Commands::Validate { config } => match ExplorerConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                if cfg.resolver.max_levels == 0 {
                    eprintln!("Warning: resolver.max_levels is 0; one level is always searched");
                }
                if cfg.resolver.extension.trim_start_matches('.').is_empty() {
                    return Err("resolver.extension must not be empty".into());
                }
                if tracing_subscriber::EnvFilter::try_new(&cfg.logging.level).is_err() {
                    return Err(format!("logging.level is not a valid filter: {}", cfg.logging.level).into());
                }

                let resolver = RootResolver::from_config(&cfg.resolver);
                println!("Configuration is valid");
                println!("   Compiler: {}", cfg.compiler.program);
                println!("   Levels searched: {}", resolver.max_levels());
                println!("   Include paths: {}", cfg.compiler.include_paths.len());
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
