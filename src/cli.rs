use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Upper bound on each remote image fetch, in seconds
    #[arg(long = "timeout-secs", default_value_t = 10)]
    pub timeout_secs: u64,
    /// CORS relay prefix used to retry unreliable image hosts
    #[arg(long = "cors-relay", env = fitting::ENV_CORS_RELAY)]
    pub cors_relay: Option<String>,
    /// Fail on any photo quality rejection instead of using the default body layout
    #[arg(long = "strict-photo")]
    pub strict_photo: bool,
    /// Filter used when scaling the garment into its placement rectangle
    #[arg(long = "garment-filter", value_enum, default_value_t = ResampleFilter::Triangle)]
    pub garment_filter: ResampleFilter,
    /// Log pipeline diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Composite a product (every variant, or one) onto a photo
    Render(RenderCommand),
    /// Print what the detectors find in a photo
    Inspect(InspectCommand),
    /// Export the synthesized stand-in garment for a product
    Placeholder(PlaceholderCommand),
}

/// Resampling filters for image resizing.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// User photo: file path, http(s) URL, or data URI
    pub photo: String,
    /// Product JSON file
    #[arg(short, long)]
    pub product: PathBuf,
    /// Render only the variant with this color, name, or id
    #[arg(long)]
    pub variant: Option<String>,
    /// Directory for `<photo>-<variant>.png` outputs (defaults to the photo's directory)
    #[arg(short = 'd', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectCommand {
    /// User photo: file path, http(s) URL, or data URI
    pub photo: String,
}

#[derive(Args, Debug)]
pub struct PlaceholderCommand {
    /// Product JSON file
    #[arg(short, long)]
    pub product: PathBuf,
    /// Use this variant's color and name
    #[arg(long)]
    pub variant: Option<String>,
    /// Output PNG path (defaults to `<product-id>-placeholder.png`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
