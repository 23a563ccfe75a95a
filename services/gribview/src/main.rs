//! Headless GRIB viewer.
//!
//! Drives the viewer core from the command line: list and sort records,
//! render one to PNG, extract marker time series to CSV, and save a
//! selection of messages to a new file.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use message_store::GribFileStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use viewer_core::{AppState, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "gribview")]
#[command(about = "Inspect, render and sample GRIB2 files")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "GRIBVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Colormap name (overrides configuration)
    #[arg(long)]
    colormap: Option<String>,

    /// Fixed colour range as MIN,MAX; disables auto-fit
    #[arg(long, value_parser = commands::parse_pair)]
    range: Option<(f64, f64)>,

    /// Log level
    #[arg(long, default_value = "warn", env = "GRIBVIEW_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the record table
    List {
        /// GRIB files to load, in order
        #[arg(required = true)]
        files: Vec<String>,

        /// Sort by this column
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Extra columns to show, comma separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Print the available column keys instead of the table
        #[arg(long)]
        keys: bool,
    },

    /// Print every attribute of one record
    Inspect {
        #[arg(required = true)]
        files: Vec<String>,

        /// 1-based record index
        #[arg(short, long, default_value = "1")]
        record: usize,
    },

    /// Render one record to an RGBA PNG
    Render {
        #[arg(required = true)]
        files: Vec<String>,

        /// 1-based record index
        #[arg(short, long, default_value = "1")]
        record: usize,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Sample marker positions across every record and write CSV
    Extract {
        #[arg(required = true)]
        files: Vec<String>,

        /// Marker as LAT,LON; repeat for more markers
        #[arg(short, long = "marker", required = true, value_parser = commands::parse_pair)]
        markers: Vec<(f64, f64)>,

        /// Sort by this column before extracting
        #[arg(long)]
        sort: Option<String>,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the selected messages to a new GRIB file
    Save {
        #[arg(required = true)]
        files: Vec<String>,

        /// Records to keep, e.g. "1,3-5"
        #[arg(short, long)]
        select: String,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    config.apply_env();

    if let Some(colormap) = &cli.colormap {
        config.colormap = colormap.clone();
    }
    if let Some((min, max)) = cli.range {
        config.value_min = min;
        config.value_max = max;
        config.auto_fit = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    let config = load_config(&cli)?;
    info!(colormap = %config.colormap, auto_fit = config.auto_fit, "Loaded configuration");

    let mut state = AppState::new(GribFileStore::new(), config);

    match cli.command {
        Commands::List {
            files,
            sort,
            desc,
            columns,
            keys,
        } => {
            commands::load(&mut state, &files)?;
            if keys {
                for key in state.available_columns() {
                    println!("{}", key);
                }
                return Ok(());
            }
            for column in &columns {
                if !state.columns().contains(column) {
                    state.toggle_column(column);
                }
            }
            if let Some(column) = sort {
                state.sort_by(&column, !desc);
            }
            print!("{}", commands::format_table(&state));
        }

        Commands::Inspect { files, record } => {
            commands::load(&mut state, &files)?;
            let position = commands::position(&state, record)?;
            state.inspect(position);
            if let Some(record) = state.records().get(position) {
                for (key, value) in record.attributes.iter() {
                    println!("{} = {}", key, value);
                }
            }
        }

        Commands::Render {
            files,
            record,
            output,
        } => {
            commands::load(&mut state, &files)?;
            commands::select(&mut state, record)?;
            state.export_png(&output)?;
            let range = state.value_range();
            println!(
                "Wrote {} (range {} .. {})",
                output.display(),
                range.min,
                range.max
            );
        }

        Commands::Extract {
            files,
            markers,
            sort,
            output,
        } => {
            commands::load(&mut state, &files)?;
            if let Some(column) = sort {
                state.sort_by(&column, true);
            }
            let rows = commands::extract(&mut state, &markers, &output)?;
            println!("{} ({} rows)", state.extraction().status(), rows);
        }

        Commands::Save {
            files,
            select,
            output,
        } => {
            commands::load(&mut state, &files)?;
            commands::select_ranges(&mut state, &select)?;
            let status = state.save_selection(&output);
            println!("{}", status.message);
            if !status.success {
                anyhow::bail!("save failed");
            }
        }
    }

    Ok(())
}
