//! `ncosearch`: build occupation snapshots and run one-off searches.
//!
//! ```bash
//! ncosearch build data/nco_occupations.txt data/nco_embeddings.snap onnx
//! ncosearch search data/nco_embeddings.snap "sewing machine operator" 5
//! ncosearch serve
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ncosearch::{build_snapshot_file, NcoConfig, SearchService, SemanticConfig};

/// Semantic occupation search
#[derive(Parser, Debug)]
#[command(name = "ncosearch", version)]
#[command(about = "Build occupation embedding snapshots and search them")]
struct Args {
    /// YAML configuration file (encoder, search and build settings).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `matcher=debug`.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode an occupation list into a snapshot.
    Build {
        /// Text file with occupations separated by blank lines.
        input: PathBuf,
        /// Output snapshot: `.json`, or compressed binary for any other extension.
        output: PathBuf,
        /// Encoder mode (`fast`, `onnx`, `api`); overrides the configuration.
        mode: Option<String>,
    },
    /// Search a snapshot once and print the ranked occupations.
    Search {
        snapshot: PathBuf,
        query: String,
        top_k: Option<usize>,
        /// Encoder mode used for the query; must match the one that built the snapshot.
        #[arg(long)]
        mode: Option<String>,
        /// Print the HTTP response shape as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP server (configured through `server.*` and `NCO_SERVER__*`).
    #[cfg(feature = "server")]
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NcoConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NcoConfig {
            semantic: SemanticConfig::stub("balanced"),
            ..NcoConfig::default()
        },
    };

    match args.command {
        Command::Build {
            input,
            output,
            mode,
        } => {
            init_tracing(&args.log_level);
            if let Some(mode) = mode {
                config.semantic = std::mem::take(&mut config.semantic).with_mode(&mode);
            }

            let summary =
                build_snapshot_file(&input, &output, &config.semantic, config.build.batch_size)
                    .await?;
            println!(
                "wrote {} occupations ({} dims, {}) to {}",
                summary.occupations,
                summary.dimension,
                summary.model_name,
                summary.output.display()
            );
        }
        Command::Search {
            snapshot,
            query,
            top_k,
            mode,
            json,
        } => {
            init_tracing(&args.log_level);
            if let Some(mode) = mode {
                config.semantic = std::mem::take(&mut config.semantic).with_mode(&mode);
            }
            config.snapshot_path = snapshot;

            let service = SearchService::from_config(&config.service_config()).await?;
            let top_k = service.config().validate_top_k(top_k)?;
            let results = service.search(&query, top_k).await?;

            if json {
                let hits: Vec<_> = results
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "name": r.occupation.display_text,
                            "confidence": r.confidence_percent,
                            "full_description": r.occupation.full_text,
                        })
                    })
                    .collect();
                let body = serde_json::json!({ "query": query, "results": hits });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                for (rank, hit) in results.iter().enumerate() {
                    println!(
                        "{:>2}. {:>6.2}%  {}",
                        rank + 1,
                        hit.confidence_percent,
                        hit.occupation.display_text
                    );
                }
            }
        }
        #[cfg(feature = "server")]
        Command::Serve => {
            let server_config = ncosearch::ServerConfig::load()?;
            ncosearch::start_server(server_config).await?;
        }
    }

    Ok(())
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
