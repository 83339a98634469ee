use std::fmt::Debug;
use std::path::PathBuf;

use press_core::{
    AssetCompressor, AssetKind, BundleManager, FileGroup, PressConfig, PressResult,
    ScriptCompressor, StyleCompressor,
};

use super::report;
use crate::cli::args::FingerprintArgs;

pub async fn run(args: FingerprintArgs, config: PressConfig) -> anyhow::Result<i32> {
    let compress = !args.no_minify;
    let result = match args.kind {
        AssetKind::Script => {
            print_fingerprint(
                BundleManager::from_config(config, ScriptCompressor),
                args.files,
                compress,
                args.verbose,
            )
            .await
        }
        AssetKind::Style => {
            print_fingerprint(
                BundleManager::from_config(config, StyleCompressor),
                args.files,
                compress,
                args.verbose,
            )
            .await
        }
    };
    Ok(report(result))
}

async fn print_fingerprint<C: AssetCompressor + Debug>(
    manager: BundleManager<C>,
    files: Vec<PathBuf>,
    compress: bool,
    verbose: bool,
) -> PressResult<()> {
    let mut refs = Vec::with_capacity(files.len());
    for file in files {
        refs.push(manager.source_file(file, compress).await?);
    }
    let group = FileGroup::new(manager.kind(), refs);

    let fp = manager.content_fingerprint(&group).await?;

    println!("{}", fp.hex);
    if verbose {
        for component in &fp.components {
            println!("  {component}");
        }
    }
    Ok(())
}
