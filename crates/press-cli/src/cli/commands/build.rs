use std::fmt::Debug;

use press_core::{
    AssetCompressor, AssetKind, BundleManager, PressConfig, PressResult, ScriptCompressor,
    StyleCompressor,
};

use super::report;
use crate::cli::args::BuildArgs;

pub async fn run(args: BuildArgs, config: PressConfig) -> anyhow::Result<i32> {
    let result = match args.kind {
        AssetKind::Script => {
            build(BundleManager::from_config(config, ScriptCompressor), args.group).await
        }
        AssetKind::Style => {
            build(BundleManager::from_config(config, StyleCompressor), args.group).await
        }
    };
    Ok(report(result))
}

async fn build<C: AssetCompressor + Debug>(
    manager: BundleManager<C>,
    group: Option<String>,
) -> PressResult<()> {
    let handle = manager
        .get_artifact_for_static_group(group.as_deref())
        .await?;
    println!("{}", manager.config().artifact_root.join(handle.path()).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::test_support::{artifacts, site};
    use crate::exit_codes;

    #[tokio::test]
    async fn builds_default_static_group() {
        let (dir, config) = site();
        let args = BuildArgs {
            kind: AssetKind::Script,
            group: None,
        };

        assert_eq!(run(args, config).await.unwrap(), exit_codes::SUCCESS);
        assert_eq!(artifacts(&dir, "js"), 1);
    }

    #[tokio::test]
    async fn missing_list_is_user_error() {
        let (_dir, config) = site();
        let args = BuildArgs {
            kind: AssetKind::Style,
            group: None,
        };

        assert_eq!(run(args, config).await.unwrap(), exit_codes::USER_ERROR);
    }
}
