// clickn-translate/src/main.rs

// ============================================================================
// CLICK'N'TRANSLATE - Seleciona uma região da tela, reconhece e traduz
// ============================================================================

#[macro_use]
extern crate log;

// ============================================================================
// DECLARAÇÃO DE MÓDULOS
// ============================================================================
mod app_state;
mod config;
mod dialogs;
mod history;
mod hotkey;
mod i18n;
mod ocr;
mod overlay;
mod platform;
mod preprocess;
mod router;
mod runtime;
mod screenshot;
mod translator;
mod tray;

// ============================================================================
// IMPORTS
// ============================================================================
use anyhow::Result;
use clap::Parser;
use eframe::egui;
use std::sync::Arc;

use app_state::{CaptureMode, UiDispatcher, UiReceivers};
use dialogs::DialogStack;
use history::{HistoryPaths, HistoryWriter};
use i18n::Strings;
use ocr::OcrDispatcher;
use overlay::pool::OverlayPool;
use overlay::CaptureOverlay;
use runtime::hotkeys::HotkeyService;
use runtime::pipeline::Pipeline;
use screenshot::ScreenRasterizer;
use tray::Tray;

// ============================================================================
// LINHA DE COMANDO
// ============================================================================

/// Captura de texto da tela com OCR e tradução
#[derive(Debug, Parser)]
#[command(name = "clickn-translate", version)]
struct Cli {
    /// Roda só a captura deste modo e sai quando o overlay fechar
    #[arg(value_enum)]
    mode: Option<CaptureMode>,
}

// ============================================================================
// APLICAÇÃO (roda na main thread)
// ============================================================================

struct ClicknApp {
    dispatcher: UiDispatcher,
    receivers: UiReceivers,
    hotkeys: HotkeyService,
    /// Combinações registradas (ocr, copy, translate)
    hotkey_combos: Vec<String>,
    pool: OverlayPool<CaptureOverlay>,
    dialogs: DialogStack,
    pipeline: Arc<Pipeline>,
    history: HistoryWriter,
    strings: &'static Strings,
    /// Incrementado a cada abertura de overlay
    generation: u64,
    /// Modo da linha de comando (sai quando terminar)
    cli_mode: Option<CaptureMode>,
    cli_exit_pending: bool,
    exiting: bool,
    _tray: Option<Tray>,
}

/// Combinações atuais na ordem de `CaptureMode::ALL`
fn hotkey_combos(config: &config::AppConfig) -> Vec<String> {
    CaptureMode::ALL
        .iter()
        .map(|mode| config.hotkey_for(*mode).trim().to_string())
        .collect()
}

/// Overlay novo, ainda escondido
fn new_overlay(mode: CaptureMode) -> CaptureOverlay {
    CaptureOverlay::new(mode, overlay::current_desktop())
}

impl ClicknApp {
    /// Fecha tudo e encerra o loop do eframe
    fn request_exit(&mut self, ctx: &egui::Context) {
        if self.exiting {
            return;
        }
        info!("👋 Encerrando...");
        self.exiting = true;
        self.hotkeys.shutdown();
        self.history.flush();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// No modo linha de comando, sai quando não sobrar overlay nem diálogo
    fn check_cli_exit(&mut self, ctx: &egui::Context) {
        if self.cli_mode.is_none() || self.pool.has_active() || !self.dialogs.is_empty() {
            self.cli_exit_pending = false;
            return;
        }
        // Um frame extra para a área de transferência ser gravada
        if self.cli_exit_pending {
            self.request_exit(ctx);
        } else {
            self.cli_exit_pending = true;
            ctx.request_repaint();
        }
    }
}

impl eframe::App for ClicknApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ====================================================================
        // PROCESSA COMANDOS E EVENTOS RECEBIDOS
        // ====================================================================
        self.process_pending_commands(ctx);
        self.process_pipeline_events(ctx);

        // ====================================================================
        // OVERLAYS ATIVOS
        // ====================================================================
        for mode in self.pool.active_modes() {
            let events = match self.pool.active_mut(mode) {
                Some(overlay) => overlay.show(ctx),
                None => continue,
            };
            for event in events {
                self.handle_overlay_event(ctx, mode, event);
            }
        }

        // ====================================================================
        // DIÁLOGOS
        // ====================================================================
        self.dialogs.show(ctx, self.strings);

        // ====================================================================
        // JANELA PRINCIPAL: 1x1 pixel e transparente
        // ====================================================================
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |_ui| {});

        self.check_cli_exit(ctx);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.hotkeys.shutdown();
        self.history.flush();
        info!("✅ Encerrado");
    }
}

// ============================================================================
// FUNÇÃO PRINCIPAL
// ============================================================================
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    platform::windows::enable_dpi_awareness();

    info!("🔤 ============================================");
    info!("🔤 CLICK'N'TRANSLATE - OCR e tradução da tela");
    info!("🔤 ============================================");

    // Carrega configurações
    let store = config::store();
    let config = store.get();
    let strings = i18n::strings(&config.interface_language);

    info!("📋 Configurações:");
    info!("   🔍 OCR: {:?}", config.engine_preference());
    info!("   🌐 Tradução: {:?}", config.translator_provider());
    info!("   ⌨️  Copiar: {}", config.copy_hotkey);
    info!("   ⌨️  Traduzir: {}", config.translate_hotkey);
    if !config.ocr_hotkey.trim().is_empty() {
        info!("   ⌨️  OCR: {}", config.ocr_hotkey);
    }

    let (dispatcher, receivers) = UiDispatcher::new();

    let history = HistoryWriter::spawn(HistoryPaths::in_dir(&config::data_dir()));
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(ScreenRasterizer),
        Arc::new(OcrDispatcher::system()),
    ));

    // Engines de russo e inglês antes da primeira captura
    ocr::native::warm_up();

    let mut hotkeys = HotkeyService::new(dispatcher.clone());
    match cli.mode {
        Some(mode) => info!("🎯 Modo linha de comando: {}", mode.as_str()),
        None => {
            hotkeys.register_all(&config);
            runtime::config_watcher::start_config_watcher(store.path().to_path_buf(), dispatcher.clone());
        }
    }

    info!("✅ Sistema pronto!");

    // ========================================================================
    // JANELA PRINCIPAL (invisível) NA MAIN THREAD
    // ========================================================================
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1.0, 1.0])
            .with_position([0.0, 0.0])
            .with_always_on_top()
            .with_decorations(false)
            .with_resizable(false)
            .with_transparent(true)
            .with_taskbar(false),

        ..Default::default()
    };

    let theme = config.theme.clone();
    let cli_mode = cli.mode;

    eframe::run_native(
        "Click'n'Translate",
        options,
        Box::new(move |cc| {
            dispatcher.attach(&cc.egui_ctx);
            overlay::fonts::install_system_font(&cc.egui_ctx);
            cc.egui_ctx.set_visuals(dialogs::theme_visuals(&theme));

            let tray = match cli_mode {
                Some(_) => None,
                None => match Tray::start(strings, dispatcher.clone()) {
                    Ok(tray) => Some(tray),
                    Err(e) => {
                        warn!("⚠️  Bandeja indisponível: {:#}", e);
                        None
                    }
                },
            };

            let mut pool = OverlayPool::default();
            for mode in CaptureMode::ALL {
                pool.prewarm(mode, new_overlay);
            }

            if let Some(mode) = cli_mode {
                dispatcher.send_command(app_state::AppCommand::ToggleCapture(mode));
            }

            Ok(Box::new(ClicknApp {
                dispatcher,
                receivers,
                hotkeys,
                hotkey_combos: hotkey_combos(&config),
                pool,
                dialogs: DialogStack::default(),
                pipeline,
                history,
                strings,
                generation: 0,
                cli_mode,
                cli_exit_pending: false,
                exiting: false,
                _tray: tray,
            }) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| anyhow::anyhow!("Erro no eframe: {}", e))?;

    Ok(())
}
