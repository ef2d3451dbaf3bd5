// clickn-translate/src/runtime.rs

// ============================================================================
// THREADS E RUNTIME ASSÍNCRONO
// ============================================================================

pub mod config_watcher;
pub mod hotkeys;
pub mod pipeline;

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Executa um future no runtime Tokio compartilhado pelo processo
///
/// O runtime é criado na primeira chamada e reaproveitado depois (as
/// threads do pipeline chamam isto em paralelo).
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.block_on(future));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("clickn-async")
        .enable_all()
        .build()
        .context("Falha ao criar runtime Tokio")?;

    let runtime = RUNTIME.get_or_init(|| runtime);
    Ok(runtime.block_on(future))
}
