use chroma_signature::{collect_images, process_collection, BatchConfig, ColorMode, DEFAULT_EXTENSIONS};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chroma-signature")]
#[command(version, about = "Extract color signatures from a collection of images", long_about = None)]
struct Cli {
    /// Folder to crawl for images
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// JSON batch configuration; command line options override it
    #[cfg(feature = "serde")]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Label for the rows and the output folder
    #[arg(short, long)]
    label: Option<String>,

    /// Color rendering: "hex" or "rgb"
    #[arg(long, value_name = "MODE")]
    color_mode: Option<String>,

    /// Number of dominant colors per image
    #[arg(short = 'n', long, value_name = "N")]
    colors: Option<usize>,

    /// Quantization levels per channel
    #[arg(short, long, value_name = "N")]
    bins: Option<u32>,

    /// Height of the ratio-preserving resize
    #[arg(long, value_name = "PIXELS")]
    resize_height: Option<u32>,

    /// Side of the square the colors are extracted from
    #[arg(long, value_name = "PIXELS")]
    square_size: Option<u32>,

    /// Seed for the color clustering
    #[arg(long)]
    seed: Option<u64>,

    /// File extensions to pick up, comma separated
    #[arg(long, value_delimiter = ',', value_name = "EXT")]
    extensions: Vec<String>,

    /// Save the normalized images and the feature table
    #[arg(short, long)]
    save: bool,

    /// Folder to create the output folder in
    #[arg(long, value_name = "DIR")]
    save_path: Option<PathBuf>,

    /// Process images in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Number of worker threads for parallel processing
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// Print per-image progress
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    #[cfg(feature = "serde")]
    fn base_config(&self) -> chroma_signature::Result<BatchConfig> {
        match &self.config {
            Some(path) => BatchConfig::from_json_file(path),
            None => Ok(BatchConfig::default()),
        }
    }

    #[cfg(not(feature = "serde"))]
    fn base_config(&self) -> chroma_signature::Result<BatchConfig> {
        Ok(BatchConfig::default())
    }

    fn batch_config(&self) -> chroma_signature::Result<BatchConfig> {
        let mut config = self.base_config()?;

        if let Some(label) = &self.label {
            config.label = label.clone();
        }
        if let Some(mode) = &self.color_mode {
            config.extraction.color_mode = mode.parse::<ColorMode>()?;
        }
        if let Some(colors) = self.colors {
            config.extraction.num_of_colors = colors;
        }
        if let Some(bins) = self.bins {
            config.extraction.bins = bins;
        }
        if let Some(height) = self.resize_height {
            config.extraction.resize_height = height;
        }
        if let Some(size) = self.square_size {
            config.extraction.square_size = size;
        }
        if let Some(seed) = self.seed {
            config.extraction.seed = seed;
        }
        if let Some(save_path) = &self.save_path {
            config.save_path = Some(save_path.clone());
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }

        config.save |= self.save;
        config.parallel |= self.parallel || self.threads.is_some();

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> chroma_signature::Result<()> {
    let config = cli.batch_config()?;

    let extensions: Vec<&str> = if cli.extensions.is_empty() {
        DEFAULT_EXTENSIONS.to_vec()
    } else {
        cli.extensions.iter().map(|ext| ext.trim_start_matches('.')).collect()
    };

    let collection = collect_images(&cli.input, &extensions)?;
    let report = process_collection(&collection, &config)?;

    println!(
        "{} images processed, {} exceptions raised",
        report.rows.len(),
        report.failures()
    );
    for id in &report.errors_log {
        println!("  failed: {}", id);
    }
    if let Some(dir) = &report.output_dir {
        println!("results saved to {}", dir.display());
    }

    Ok(())
}
