use std::fmt::Debug;

use press_core::{
    AssetCompressor, AssetKind, AssetResponse, BundleManager, PressConfig, PressResult,
    ScriptCompressor, StyleCompressor,
};

use super::report;
use crate::cli::args::ClearArgs;

pub async fn run(args: ClearArgs, config: PressConfig) -> anyhow::Result<i32> {
    let result = match args.kind {
        AssetKind::Script => clear(BundleManager::from_config(config, ScriptCompressor)).await,
        AssetKind::Style => clear(BundleManager::from_config(config, StyleCompressor)).await,
    };
    Ok(report(result))
}

async fn clear<C: AssetCompressor + Debug>(manager: BundleManager<C>) -> PressResult<()> {
    let removed = manager.clear_cache().await?;
    let response = AssetResponse::cleared(manager.kind(), removed);
    println!("{}", String::from_utf8_lossy(&response.body));
    Ok(())
}
