use std::fmt::Debug;
use std::path::PathBuf;

use press_core::{
    AssetCompressor, AssetKind, BundleManager, PressConfig, PressResult, ScriptCompressor,
    StyleCompressor,
};

use super::report;
use crate::cli::args::BundleArgs;

pub async fn run(args: BundleArgs, config: PressConfig) -> anyhow::Result<i32> {
    let compress = !args.no_minify;
    let result = match args.kind {
        AssetKind::Script => {
            bundle(
                BundleManager::from_config(config, ScriptCompressor),
                args.files,
                compress,
            )
            .await
        }
        AssetKind::Style => {
            bundle(
                BundleManager::from_config(config, StyleCompressor),
                args.files,
                compress,
            )
            .await
        }
    };
    Ok(report(result))
}

/// Same path a page render and its follow-up request take.
async fn bundle<C: AssetCompressor + Debug>(
    manager: BundleManager<C>,
    files: Vec<PathBuf>,
    compress: bool,
) -> PressResult<()> {
    let key = manager
        .register_files(files.into_iter().map(|f| (f, compress)))
        .await?;
    let handle = manager.get_artifact(&key).await?;

    println!("key: {key}");
    println!(
        "artifact: {}",
        manager.config().artifact_root.join(handle.path()).display()
    );
    Ok(())
}
