use crate::core::crop::{Aspect, OutputFormat, DEFAULT_JPEG_QUALITY, DEFAULT_OUTPUT_WIDTH};
use crate::domain::Locale;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-cms")]
#[command(about = "Content server and editing tools for the trilingual site")]
pub struct Cli {
    /// site.toml; defaults apply when absent
    #[arg(short, long, global = true, default_value = "site.toml")]
    pub config: PathBuf,

    /// Edit a running site through its API instead of the local store
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Email sent as the access header on remote writes
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Dev admin token for remote writes (falls back to DEV_ADMIN_TOKEN)
    #[arg(long, global = true)]
    pub dev_token: Option<String>,

    /// Local copy of the remote bundle
    #[arg(long, global = true, default_value = ".site-cms/content.cache.json")]
    pub cache: PathBuf,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        /// Overrides PORT and site.toml
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print or write the bundle as pretty JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the bundle with a JSON file, then save
    Import { file: PathBuf },

    /// Align service cards across locales
    Normalize,

    /// Edit service cards
    Service {
        #[command(subcommand)]
        action: ServiceCommand,
    },

    /// Crop a photo to a fixed aspect
    Crop(CropArgs),

    /// Upload a file to a running site
    Upload { file: PathBuf },

    /// Render one locale's page to HTML
    Render {
        #[arg(short, long, default_value = "en")]
        locale: Locale,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch the remote bundle into the cache
    Pull,
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    /// Add a card to every locale
    Add(ServiceFields),

    /// Change one card in one locale
    Update {
        id: String,
        #[arg(short, long, default_value = "en")]
        locale: Locale,
        #[command(flatten)]
        fields: ServiceFields,
    },

    /// Remove a card from every locale
    Delete { id: String },

    /// Move a card to a position in every locale
    Move { id: String, index: usize },
}

#[derive(Args, Debug, Default)]
pub struct ServiceFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub short: Option<String>,
    #[arg(long)]
    pub full: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    /// Empty string clears the image
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args, Debug)]
pub struct CropArgs {
    pub input: PathBuf,

    /// 4:5, 1:1 or 16:9
    #[arg(short, long, default_value = "4:5")]
    pub aspect: Aspect,

    #[arg(short, long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Horizontal pan in viewport pixels
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan_x: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan_y: f64,

    /// Viewport width the pan is expressed in
    #[arg(long, default_value_t = 520)]
    pub view_width: u32,

    #[arg(short, long, default_value_t = DEFAULT_OUTPUT_WIDTH)]
    pub width: u32,

    /// jpeg, webp or png
    #[arg(short, long, default_value = "jpeg")]
    pub format: OutputFormat,

    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY)]
    pub quality: u8,

    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// POST the result to the remote upload endpoint instead of writing a file
    #[arg(long)]
    pub upload: bool,
}
