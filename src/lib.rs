//! Labelshift: convert object-detection labels between COCO, VOC and YOLO.
//!
//! Every conversion goes through one canonical record per image
//! ([`ir::UnifiedLabel`]), so each format needs only a reader and a writer.
//! Format names are resolved through an immutable [`registry::Registry`].
//!
//! # Modules
//!
//! - [`ir`]: canonical model, coordinate codecs and the format codecs
//! - [`registry`]: format name → reader/writer constructors
//! - [`conversion`]: the conversion driver and its report
//! - [`error`]: error types

pub mod conversion;
pub mod error;
pub mod ir;
pub mod registry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::{ErrorKind, LabelError};

use conversion::ConvertRequest;
use ir::CategoryMap;
use registry::Registry;

/// The labelshift CLI application.
#[derive(Parser)]
#[command(name = "labelshift")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a labeled dataset from one format to another.
    Convert(ConvertArgs),
    /// List the registered reader and writer formats.
    Formats,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Source format name (see `labelshift formats`).
    #[arg(long, alias = "src-fmt")]
    source_format: String,

    /// Source label file or directory.
    #[arg(long, alias = "src-label")]
    source_label_path: PathBuf,

    /// Directory holding the source images (default: `images/` beside the labels).
    #[arg(long, alias = "src-image")]
    source_image_path: Option<PathBuf>,

    /// Destination format name.
    #[arg(long, alias = "dst-fmt")]
    destination_format: String,

    /// Output file or directory.
    #[arg(long, alias = "dst-path")]
    destination_path: PathBuf,

    /// YAML file mapping class ids to names.
    #[arg(long, alias = "category-map")]
    category_map_path: Option<PathBuf>,

    /// Do not draw a progress bar.
    #[arg(long)]
    no_progress: bool,
}

/// Run the labelshift CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();
    let registry = Registry::builtin();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(&registry, args),
        Some(Commands::Formats) => {
            println!("readers: {}", registry.reader_names().join(", "));
            println!("writers: {}", registry.writer_names().join(", "));
            Ok(())
        }
        None => {
            println!("labelshift {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert object-detection labels between COCO, VOC and YOLO.");
            println!();
            println!("Run 'labelshift --help' for usage information.");
            Ok(())
        }
    }
}

fn run_convert(registry: &Registry, args: ConvertArgs) -> Result<(), LabelError> {
    let categories = match &args.category_map_path {
        Some(path) => CategoryMap::load(path)?,
        None => CategoryMap::new(),
    };

    let request = ConvertRequest {
        source_format: args.source_format,
        label_path: args.source_label_path,
        image_path: args.source_image_path,
        destination_format: args.destination_format,
        destination_path: args.destination_path,
        categories,
        progress: !args.no_progress,
    };

    let report = conversion::convert(registry, &request)?;
    print!("{}", report);
    Ok(())
}
