// clickn-translate/src/runtime/config_watcher.rs

// ============================================================================
// THREAD DE CONFIG WATCHER (monitora mudanças no data/config.json)
// ============================================================================

use notify::{RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::thread;
use std::time::{Duration, Instant};

use crate::app_state::{AppCommand, UiDispatcher};

/// Intervalo mínimo entre dois recarregamentos
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Observa o diretório do config e pede o re-registro das hotkeys
///
/// O diretório é observado (e não o arquivo) porque editores costumam
/// substituir o arquivo inteiro ao salvar.
pub fn start_config_watcher(config_path: PathBuf, dispatcher: UiDispatcher) {
    let spawned = thread::Builder::new()
        .name("config-watcher".to_string())
        .spawn(move || {
            info!("👁️  Thread de monitoramento do config.json iniciada");

            let Some(dir) = config_path.parent().map(PathBuf::from) else {
                error!("❌ Caminho de config inválido: {}", config_path.display());
                return;
            };

            let (tx, rx) = channel();
            let mut watcher = match notify::recommended_watcher(tx) {
                Ok(w) => w,
                Err(e) => {
                    error!("❌ Erro ao criar watcher: {}", e);
                    return;
                }
            };

            if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                error!("❌ Erro ao monitorar {}: {}", dir.display(), e);
                return;
            }

            info!("✅ Monitorando {} para mudanças...", config_path.display());

            let mut last_reload: Option<Instant> = None;

            for event_result in rx {
                let event = match event_result {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("⚠️  Erro do watcher: {}", e);
                        continue;
                    }
                };

                let touches_config = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == config_path.file_name());
                let is_write = matches!(
                    event.kind,
                    notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                );
                if !touches_config || !is_write {
                    continue;
                }

                if last_reload.is_some_and(|t| t.elapsed() < DEBOUNCE) {
                    continue;
                }
                last_reload = Some(Instant::now());

                info!("🔄 config.json modificado, recarregando hotkeys");

                // Dá tempo do editor terminar de gravar
                thread::sleep(Duration::from_millis(100));
                dispatcher.send_command(AppCommand::ReloadHotkeys);
            }

            info!("👁️  Watcher do config.json encerrado");
        });

    if let Err(e) = spawned {
        error!("❌ Erro ao criar thread do watcher: {}", e);
    }
}
