use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dedupx_core::{hash, FileIndex, FileRecord, ProximitySearch, Table};
use dedupx_similarity::{
    index_files, media_type_for_path, rank_similar_files, DedupConfig, DuplicateReport,
    MatchAttribution, RowClusterer,
};
use dedupx_storage::LmdbFileIndex;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Find duplicate files and duplicate records in tabular datasets
#[derive(Parser, Debug)]
#[command(name = "dedupx")]
#[command(about = "Duplicate detection for tabular datasets", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster duplicate rows of a JSON table
    Rows {
        /// Table as JSON: {"headers": [...], "rows": [...]} or an array of row objects
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Similarity threshold in (0, 1]
        #[arg(short, long)]
        threshold: Option<f64>,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Matched-field attribution: last-pair or union
        #[arg(long)]
        attribution: Option<MatchAttribution>,

        /// Score pairs on the calling thread only
        #[arg(long)]
        sequential: bool,

        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Whole-file duplicate detection against a persistent index
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FilesCommand {
    /// Hash files, report their duplicates, then add them to the index
    Add {
        /// Index directory
        #[arg(long, value_name = "DIR")]
        index: PathBuf,

        /// Media type for all files (default: inferred from extension)
        #[arg(long)]
        media_type: Option<String>,

        /// Minimum metadata similarity for size-window matches
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,

        #[arg(required = true, value_name = "FILE")]
        paths: Vec<PathBuf>,
    },

    /// Report duplicates of a file without indexing it
    Scan {
        /// Index directory
        #[arg(long, value_name = "DIR")]
        index: PathBuf,

        /// Media type of the file (default: inferred from extension)
        #[arg(long)]
        media_type: Option<String>,

        /// Minimum metadata similarity for size-window matches
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,

        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Soft-delete a file from the index
    Remove {
        /// Index directory
        #[arg(long, value_name = "DIR")]
        index: PathBuf,

        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Rows {
            input,
            threshold,
            config,
            attribution,
            sequential,
            output,
        } => {
            let mut config = match config {
                Some(path) => DedupConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {:?}", path))?,
                None => DedupConfig::default(),
            };
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(attribution) = attribution {
                config.attribution = attribution;
            }
            if sequential {
                config.parallel = false;
            }

            let data = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read table {:?}", input))?;
            let table = Table::from_json_str(&data)
                .with_context(|| format!("Invalid table in {:?}", input))?;
            info!("Loaded {} rows from {:?}", table.len(), input);

            let groups = RowClusterer::new(config)?.cluster(&table)?;
            let report = DuplicateReport::assemble(&table, groups, &config);
            info!(
                "Found {} duplicate group(s) covering {} row(s)",
                report.groups.len(),
                report.duplicate_rows
            );
            emit(&report.to_json_pretty()?, output.as_deref())?;
        }

        Command::Files { command } => run_files(command)?,
    }

    Ok(())
}

fn run_files(command: FilesCommand) -> anyhow::Result<()> {
    match command {
        FilesCommand::Add {
            index,
            media_type,
            min_score,
            paths,
        } => {
            let index = LmdbFileIndex::open(&index)?;
            let added = index_files(&index, &paths, media_type.as_deref(), min_score)?;
            for file in &added {
                info!(
                    "Indexed {:?} as {} ({} similar)",
                    file.path,
                    file.record.id,
                    file.similar.len()
                );
            }
            emit(&serde_json::to_string_pretty(&added)?, None)?;
        }

        FilesCommand::Scan {
            index,
            media_type,
            min_score,
            path,
        } => {
            let index = LmdbFileIndex::open(&index)?;
            let (digest, size) =
                hash::hash_file(&path).with_context(|| format!("Failed to hash {:?}", path))?;
            let candidates = ProximitySearch::new(&index).search(&digest, size)?;

            let kind = media_type.unwrap_or_else(|| media_type_for_path(&path));
            let query = FileRecord::new(String::new(), size, digest.clone(), kind).metadata();
            let similar = rank_similar_files(&query, candidates.clone(), min_score);

            let out = json!({
                "digest": digest,
                "size": size,
                "exact": candidates.exact,
                "similarBySize": candidates.similar_by_size,
                "similar": similar,
            });
            emit(&serde_json::to_string_pretty(&out)?, None)?;
        }

        FilesCommand::Remove { index, id } => {
            let index = LmdbFileIndex::open(&index)?;
            if !index.mark_deleted(&id)? {
                bail!("No file with id {} in the index", id);
            }
            info!("Removed {}", id);
        }
    }

    Ok(())
}

fn emit(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Report written to {:?}", path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
        }
    }
    Ok(())
}
