use clap::{Args, Parser, Subcommand};
use press_core::{AssetKind, CachingStrategy};
use std::path::PathBuf;


#[derive(Parser, Debug)]
#[command(
    name = "press",
    version,
    about = "Bundle and minify scripts and stylesheets into cached artifacts"
)]
pub struct Cli {
    /// YAML config file (PRESS_* environment variables override it)
    #[arg(long, global = true, env = "PRESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Caching strategy: always, never or change
    #[arg(long, global = true)]
    pub cache: Option<CachingStrategy>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Precompile a static group and print the artifact path
    Build(BuildArgs),
    /// Bundle an ad-hoc list of files through a render-time key
    Bundle(BundleArgs),
    /// Print the content fingerprint of a list of files
    Fingerprint(FingerprintArgs),
    /// Remove every cached artifact of one kind
    Clear(ClearArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Asset kind: js or css
    #[arg(long)]
    pub kind: AssetKind,

    /// Static group list name (default: js.conf / css.conf)
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    /// Asset kind: js or css
    #[arg(long)]
    pub kind: AssetKind,

    /// Concatenate without minifying
    #[arg(long)]
    pub no_minify: bool,

    /// Files relative to the kind's source directory, in bundle order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FingerprintArgs {
    /// Asset kind: js or css
    #[arg(long)]
    pub kind: AssetKind,

    /// Fingerprint as if the files were not minified
    #[arg(long)]
    pub no_minify: bool,

    /// Also print the hashed components
    #[arg(long, short)]
    pub verbose: bool,

    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    /// Asset kind: js or css
    #[arg(long)]
    pub kind: AssetKind,
}
