// clickn-translate/src/router.rs

// ============================================================================
// MÓDULO ROUTER - Destino do resultado de uma captura
// ============================================================================
//
// copy / ocr  → área de transferência (+ histórico de cópias)
// translate   → diálogo com a tradução (+ históricos)
// sem texto   → diálogo "não foi possível reconhecer"
//
// ============================================================================

use crate::app_state::CaptureMode;
use crate::config::AppConfig;
use crate::dialogs::Dialog;
use crate::ocr::EngineKind;

/// Resultado final do pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Texto reconhecido (modos copy / ocr)
    Recognized { text: String, engine: EngineKind },
    /// Texto reconhecido e traduzido
    Translated {
        original: String,
        translated: String,
        /// Idioma de destino
        target: String,
    },
    /// Nenhum motor encontrou texto
    NothingRecognized,
    /// O texto foi reconhecido mas a tradução falhou
    TranslationFailed { original: String, error: String },
    /// Seleção vazia ou captura impossível (nada a mostrar)
    Aborted,
}

/// Preferências que afetam o roteamento
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutePrefs {
    pub copy_translated_text: bool,
    pub copy_history: bool,
    pub translation_history: bool,
}

impl From<&AppConfig> for RoutePrefs {
    fn from(config: &AppConfig) -> Self {
        RoutePrefs {
            copy_translated_text: config.copy_translated_text,
            copy_history: config.copy_history,
            translation_history: config.history,
        }
    }
}

/// Efeitos colaterais do roteamento (UI, clipboard, histórico)
pub trait ResultSink {
    fn copy_to_clipboard(&mut self, text: &str);
    fn show_dialog(&mut self, dialog: Dialog);
    fn record_copy(&mut self, text: &str);
    fn record_translation(&mut self, original: &str, translated: &str, target: &str);
}

/// Entrega o resultado ao destino do modo
pub fn route(mode: CaptureMode, outcome: PipelineOutcome, prefs: RoutePrefs, sink: &mut dyn ResultSink) {
    match outcome {
        PipelineOutcome::Aborted => {
            debug!("Captura abortada, nada a entregar ({})", mode.as_str());
        }

        PipelineOutcome::NothingRecognized => {
            info!("🤷 Nenhum texto reconhecido");
            sink.show_dialog(Dialog::RecognitionFailed);
        }

        PipelineOutcome::Recognized { text, engine } => {
            info!("📋 Copiando {} caracteres ({:?})", text.chars().count(), engine);
            sink.copy_to_clipboard(&text);
            if prefs.copy_history {
                sink.record_copy(&text);
            }
        }

        PipelineOutcome::Translated {
            original,
            translated,
            target,
        } => {
            info!("🌐 Tradução pronta ({})", target);
            if prefs.copy_translated_text {
                sink.copy_to_clipboard(&translated);
                if prefs.copy_history {
                    sink.record_copy(&translated);
                }
            }
            if prefs.translation_history {
                sink.record_translation(&original, &translated, &target);
            }
            sink.show_dialog(Dialog::Translation { original, translated });
        }

        PipelineOutcome::TranslationFailed { original, error } => {
            warn!("⚠️  Tradução falhou para {} caracteres: {}", original.chars().count(), error);
            sink.show_dialog(Dialog::TranslationError { message: error });
        }
    }
}
