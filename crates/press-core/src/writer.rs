//! Builds artifacts and writes them atomically.
//!
//! Builders of the same artifact name queue on a per-name gate; builders of
//! different names never wait on each other. Each build runs on its own
//! task, so a caller that stops waiting does not stop the build.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::compressor::{AssetCompressor, GroupSources};
use crate::error::{PressError, PressResult};
use crate::handle::ArtifactHandle;
use crate::types::CachingStrategy;

type Gate = Arc<tokio::sync::Mutex<()>>;
type Gates = Arc<Mutex<HashMap<String, Gate>>>;

#[derive(Debug, Default)]
pub struct ArtifactWriter {
    gates: Gates,
}

impl ArtifactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `sources` into the artifact named by `handle`.
    ///
    /// A build that waited on the gate reuses the file its predecessor
    /// wrote, unless `strategy` is `Never`. Failures leave nothing behind,
    /// so the next request retries.
    pub async fn write_artifact<C: AssetCompressor>(
        &self,
        compressor: Arc<C>,
        sources: GroupSources,
        handle: ArtifactHandle,
        strategy: CachingStrategy,
    ) -> PressResult<ArtifactHandle> {
        let name = handle.name().to_string();
        let guard = GateGuard::acquire(&self.gates, &name);
        let task = tokio::spawn(build_gated(guard, compressor, sources, handle, strategy));

        task.await
            .map_err(|e| PressError::build(name, format!("build task failed: {e}")))?
    }

    /// Names with a build in flight or queued.
    pub fn in_flight(&self) -> usize {
        lock_gates(&self.gates).len()
    }
}

async fn build_gated<C: AssetCompressor>(
    guard: GateGuard,
    compressor: Arc<C>,
    sources: GroupSources,
    handle: ArtifactHandle,
    strategy: CachingStrategy,
) -> PressResult<ArtifactHandle> {
    let gate = guard.gate();
    let _permit = gate.lock().await;

    if strategy.reuses_artifacts() && handle.exists().await? {
        debug!(artifact = %handle.name(), "artifact completed by concurrent builder");
        return Ok(handle);
    }
    build(compressor, sources, handle).await
}

async fn build<C: AssetCompressor>(
    compressor: Arc<C>,
    sources: GroupSources,
    handle: ArtifactHandle,
) -> PressResult<ArtifactHandle> {
    let started = Instant::now();
    let files = sources.group().len();

    let compressed =
        tokio::task::spawn_blocking(move || sources.compress(compressor.as_ref())).await;
    let bytes = match compressed {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            warn!(artifact = %handle.name(), error = %e, "build failed");
            return Err(e);
        }
        Err(e) => {
            warn!(artifact = %handle.name(), error = %e, "build task failed");
            return Err(PressError::build(
                handle.name(),
                format!("compression task failed: {e}"),
            ));
        }
    };

    handle
        .storage()
        .write_atomic(&handle.path(), &bytes)
        .await
        .map_err(|e| {
            warn!(artifact = %handle.name(), error = %e, "artifact write failed");
            PressError::build(handle.name(), format!("failed to write artifact: {e}"))
        })?;

    info!(
        artifact = %handle.name(),
        files,
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "built artifact"
    );
    Ok(handle)
}

fn lock_gates(gates: &Gates) -> MutexGuard<'_, HashMap<String, Gate>> {
    gates.lock().unwrap_or_else(|e| e.into_inner())
}

/// One builder's claim on a name's gate. Dropping it removes the map entry
/// once no other builder holds or waits on the gate.
struct GateGuard {
    gates: Gates,
    name: String,
    gate: Option<Gate>,
}

impl GateGuard {
    fn acquire(gates: &Gates, name: &str) -> Self {
        let gate = lock_gates(gates)
            .entry(name.to_string())
            .or_default()
            .clone();
        Self {
            gates: Arc::clone(gates),
            name: name.to_string(),
            gate: Some(gate),
        }
    }

    fn gate(&self) -> Gate {
        self.gate.clone().unwrap_or_default()
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        drop(self.gate.take());
        let mut gates = lock_gates(&self.gates);
        if gates
            .get(&self.name)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&self.name);
        }
    }
}
