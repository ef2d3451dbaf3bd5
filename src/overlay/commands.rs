// clickn-translate/src/overlay/commands.rs

// ============================================================================
// PROCESSAMENTO DE COMANDOS, EVENTOS DO PIPELINE E EVENTOS DO OVERLAY
// ============================================================================

use eframe::egui;
use std::sync::Arc;

use crate::app_state::{AppCommand, CaptureMode, PipelineEvent};
use crate::config;
use crate::dialogs::{self, Dialog, DialogStack};
use crate::history::HistoryWriter;
use crate::i18n;
use crate::overlay::pool::Toggle;
use crate::overlay::{self, OverlayEvent, OverlayPhase};
use crate::platform;
use crate::router::{self, ResultSink, RoutePrefs};
use crate::runtime::pipeline::{CaptureRequest, CaptureSettings, OVERLAY_SETTLE};
use crate::screenshot::ScreenRect;
use crate::translator::HttpTranslator;
use crate::{hotkey_combos, new_overlay, ClicknApp};

/// Destino real do roteamento: clipboard do egui, diálogos e histórico
struct UiSink<'a> {
    ctx: &'a egui::Context,
    dialogs: &'a mut DialogStack,
    history: &'a HistoryWriter,
}

impl ResultSink for UiSink<'_> {
    fn copy_to_clipboard(&mut self, text: &str) {
        let text = text.to_string();
        self.ctx.output_mut(|o| o.copied_text = text);
    }

    fn show_dialog(&mut self, dialog: Dialog) {
        self.dialogs.push(dialog);
    }

    fn record_copy(&mut self, text: &str) {
        self.history.append_copy(text);
    }

    fn record_translation(&mut self, original: &str, translated: &str, target: &str) {
        self.history.append_translation(original, translated, target);
    }
}

impl ClicknApp {
    /// Processa comandos pendentes enviados para a thread principal
    pub(crate) fn process_pending_commands(&mut self, ctx: &egui::Context) {
        while let Ok(command) = self.receivers.commands.try_recv() {
            match command {
                AppCommand::ToggleCapture(mode) => self.toggle_capture(mode),

                AppCommand::HotkeyRegistrationFailed(combo) => {
                    warn!("⚠️  Hotkey indisponível: {}", combo);
                    self.dialogs.push(Dialog::HotkeyUnavailable { combo });
                }

                AppCommand::ReloadHotkeys => {
                    let config = config::store().get();
                    self.strings = i18n::strings(&config.interface_language);
                    ctx.set_visuals(dialogs::theme_visuals(&config.theme));

                    let combos = hotkey_combos(&config);
                    if combos == self.hotkey_combos {
                        debug!("Hotkeys inalteradas, nada a re-registrar");
                        continue;
                    }
                    info!("⌨️  Re-registrando hotkeys: {:?}", combos);
                    self.hotkeys.register_all(&config);
                    self.hotkey_combos = combos;
                }

                AppCommand::Exit => self.request_exit(ctx),
            }
        }
    }

    /// Abre o overlay do modo ou cancela o que está aberto
    fn toggle_capture(&mut self, mode: CaptureMode) {
        let config = config::store().get();
        self.strings = i18n::strings(&config.interface_language);

        self.generation += 1;
        let generation = self.generation;
        let saved = config.last_language();
        let cursor = platform::windows::cursor_position();
        let desktop = overlay::current_desktop();

        let result = self.pool.toggle(mode, new_overlay, |overlay| {
            overlay.activate(generation, desktop, &saved, config.no_screen_dimming, cursor)
        });

        debug!("Slot {}: {:?}", mode.as_str(), self.pool.state(mode));
        if result == Toggle::Opened {
            info!("🎯 ============================================");
            info!("🎯 CAPTURA {} (#{})", mode.as_str().to_uppercase(), generation);
            info!("🎯 ============================================");
        }
    }

    /// Aplica o progresso e o resultado das capturas
    pub(crate) fn process_pipeline_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.receivers.events.try_recv() {
            match event {
                PipelineEvent::Status { ticket, message } => {
                    match self.pool.active_mut(ticket.mode) {
                        Some(overlay) if overlay.ticket() == ticket => overlay.set_status(message),
                        _ => trace!("Status de captura antiga ignorado"),
                    }
                }

                PipelineEvent::Finished { ticket, outcome } => {
                    if !self.pool.owns(&ticket) {
                        info!("🗑️  Resultado descartado: overlay {} já fechado", ticket.mode.as_str());
                        continue;
                    }

                    self.pool.close(ticket.mode, new_overlay);

                    let prefs = RoutePrefs::from(&config::store().get());
                    let mut sink = UiSink {
                        ctx,
                        dialogs: &mut self.dialogs,
                        history: &self.history,
                    };
                    info!("📤 [4/4] Entregando resultado ({})", ticket.mode.as_str());
                    router::route(ticket.mode, outcome, prefs, &mut sink);
                }
            }
        }
    }

    /// Reage ao que o overlay pediu neste frame
    pub(crate) fn handle_overlay_event(&mut self, ctx: &egui::Context, mode: CaptureMode, event: OverlayEvent) {
        match event {
            OverlayEvent::Cancelled => {
                info!("❌ Seleção cancelada");
                self.pool.close(mode, new_overlay);
            }

            OverlayEvent::ExitRequested => self.request_exit(ctx),

            OverlayEvent::LanguageChanged(language) => {
                if let Err(e) = config::store().save_last_language(&language) {
                    error!("❌ Erro ao salvar idioma: {:#}", e);
                }
            }

            OverlayEvent::Selected(region) => self.start_capture(mode, region),
        }
    }

    fn start_capture(&mut self, mode: CaptureMode, region: ScreenRect) {
        if region.is_empty() {
            info!("❌ Seleção vazia, nada a capturar");
            self.pool.close(mode, new_overlay);
            return;
        }

        let Some(overlay) = self.pool.active_mut(mode) else {
            return;
        };
        if *overlay.phase() != OverlayPhase::Selecting {
            debug!("Seleção repetida ignorada");
            return;
        }
        overlay.begin_recognition();

        let config = config::store().get();
        let request = CaptureRequest {
            ticket: overlay.ticket(),
            language: overlay.language().clone(),
            region,
        };
        let settings = CaptureSettings {
            engine: config.engine_preference(),
            preprocess: config.preprocess.clone(),
            translator: Arc::new(HttpTranslator::new(
                config.translator_provider(),
                config.deepl_api_key.clone(),
            )),
            strings: self.strings,
            settle: OVERLAY_SETTLE,
        };

        self.pipeline.spawn(request, settings, self.dispatcher.clone());
    }
}
