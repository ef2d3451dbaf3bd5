// clickn-translate/src/runtime/pipeline.rs

// ============================================================================
// PIPELINE DE CAPTURA (uma thread por seleção)
// ============================================================================
// captura → pré-processamento → OCR → (tradução) → evento para a UI
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::app_state::{CaptureMode, CaptureTicket, LanguageSelection, PipelineEvent, UiDispatcher};
use crate::config::{EnginePreference, PreprocessConfig};
use crate::i18n::Strings;
use crate::ocr::OcrDispatcher;
use crate::preprocess;
use crate::router::PipelineOutcome;
use crate::screenshot::{CaptureError, Rasterizer, ScreenRect};
use crate::translator::{self, Translator};

/// Tempo para o overlay sumir da tela antes da captura
pub const OVERLAY_SETTLE: Duration = Duration::from_millis(120);

/// Uma seleção pronta para processar
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub ticket: CaptureTicket,
    pub language: LanguageSelection,
    pub region: ScreenRect,
}

/// Configuração lida no momento da seleção
#[derive(Clone)]
pub struct CaptureSettings {
    pub engine: EnginePreference,
    pub preprocess: PreprocessConfig,
    pub translator: Arc<dyn Translator>,
    pub strings: &'static Strings,
    /// Espera antes da captura
    pub settle: Duration,
}

/// Serviços usados pelo pipeline
pub struct Pipeline {
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<OcrDispatcher>,
}

impl Pipeline {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, ocr: Arc<OcrDispatcher>) -> Self {
        Pipeline { rasterizer, ocr }
    }

    /// Executa a captura inteira de forma síncrona
    ///
    /// # Argumentos
    /// * `request` - Região, modo e idioma
    /// * `settings` - Motor, constantes e tradutor
    /// * `on_status` - Mensagens de progresso para o overlay
    pub fn run(
        &self,
        request: &CaptureRequest,
        settings: &CaptureSettings,
        on_status: &mut dyn FnMut(&str),
    ) -> PipelineOutcome {
        let mode = request.ticket.mode;

        if request.region.is_empty() {
            info!("❌ Seleção vazia, captura cancelada");
            return PipelineOutcome::Aborted;
        }

        if !settings.settle.is_zero() {
            thread::sleep(settings.settle);
        }

        let started = Instant::now();
        info!(
            "📸 [1/4] Capturando {}x{} em ({}, {})...",
            request.region.width, request.region.height, request.region.x, request.region.y
        );
        let image = match self.rasterizer.capture(request.region) {
            Ok(image) => image,
            Err(CaptureError::EmptyRegion) => return PipelineOutcome::Aborted,
            Err(e) => {
                error!("❌ Erro na captura: {}", e);
                return PipelineOutcome::Aborted;
            }
        };

        on_status(settings.strings.recognizing);
        let prepared = preprocess::prepare(image, &settings.preprocess);
        info!(
            "🖼️  [2/4] Pré-processado: {}x{} → {}x{} (escala {:.2})",
            prepared.original.width(),
            prepared.original.height(),
            prepared.normalized.width(),
            prepared.normalized.height(),
            prepared.scale
        );

        info!("🔍 [3/4] Reconhecendo texto ({})...", request.language.code());

        let recognition = match self.ocr.recognize(&prepared, &request.language, settings.engine) {
            Ok(recognition) if !recognition.is_empty() => recognition,
            Ok(_) => {
                info!("⏱️  OCR sem texto em {:?}", started.elapsed());
                return PipelineOutcome::NothingRecognized;
            }
            Err(e) => {
                error!("❌ Erro no OCR: {}", e);
                return PipelineOutcome::NothingRecognized;
            }
        };

        info!(
            "✅ OCR ({:?}): {} caracteres em {:?}",
            recognition.engine,
            recognition.text.chars().count(),
            started.elapsed()
        );

        if mode != CaptureMode::Translate {
            return PipelineOutcome::Recognized {
                text: recognition.text,
                engine: recognition.engine,
            };
        }

        let source = match &request.language {
            LanguageSelection::Explicit(code) => code.as_str(),
            LanguageSelection::Universal => "en",
        };
        let target = translator::target_for(source);

        on_status(settings.strings.translating);
        info!("🌐 [4/4] Traduzindo {} → {}...", source, target);

        match settings
            .translator
            .translate(&recognition.text, source, target, on_status)
        {
            Ok(translated) => PipelineOutcome::Translated {
                original: recognition.text,
                translated,
                target: target.to_string(),
            },
            Err(e) => {
                error!("❌ Erro na tradução: {:#}", e);
                PipelineOutcome::TranslationFailed {
                    original: recognition.text,
                    error: format!("{:#}", e),
                }
            }
        }
    }

    /// Executa a captura numa thread nova e avisa a UI pelo dispatcher
    pub fn spawn(self: &Arc<Self>, request: CaptureRequest, settings: CaptureSettings, ui: UiDispatcher) {
        let pipeline = Arc::clone(self);
        let ticket = request.ticket;

        let spawned = thread::Builder::new()
            .name(format!("capture-{}", ticket.generation))
            .spawn(move || {
                let status_ui = ui.clone();
                let mut on_status = |message: &str| {
                    status_ui.send_event(PipelineEvent::Status {
                        ticket,
                        message: message.to_string(),
                    });
                };

                let outcome = pipeline.run(&request, &settings, &mut on_status);
                ui.send_event(PipelineEvent::Finished { ticket, outcome });
            });

        if let Err(e) = spawned {
            error!("❌ Erro ao criar thread de captura: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n;
    use crate::ocr::{EngineKind, OcrBackend, OcrError};
    use crate::router::{self, tests::RecordingSink, RoutePrefs};
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::sync::Mutex;

    struct FakeScreen {
        captured: Mutex<Vec<ScreenRect>>,
    }

    impl Rasterizer for FakeScreen {
        fn capture(&self, rect: ScreenRect) -> Result<RgbaImage, CaptureError> {
            self.captured.lock().unwrap().push(rect);
            Ok(RgbaImage::from_pixel(rect.width, rect.height, Rgba([255, 255, 255, 255])))
        }
    }

    struct FakeOcr {
        text: &'static str,
        seen: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl OcrBackend for FakeOcr {
        fn kind(&self) -> EngineKind {
            EngineKind::Native
        }
        fn recognize(&self, image: &DynamicImage, _language: &LanguageSelection) -> Result<String, OcrError> {
            self.seen.lock().unwrap().push((image.width(), image.height()));
            Ok(self.text.to_string())
        }
    }

    struct Unavailable;

    impl OcrBackend for Unavailable {
        fn kind(&self) -> EngineKind {
            EngineKind::Offline
        }
        fn recognize(&self, _image: &DynamicImage, _language: &LanguageSelection) -> Result<String, OcrError> {
            Err(OcrError::EngineUnavailable("test".to_string()))
        }
    }

    struct FailingTranslator;

    impl Translator for FailingTranslator {
        fn translate(&self, _: &str, _: &str, _: &str, on_status: &mut dyn FnMut(&str)) -> anyhow::Result<String> {
            on_status("Connecting to translator…");
            anyhow::bail!("network unreachable")
        }
    }

    struct EchoTranslator;

    impl Translator for EchoTranslator {
        fn translate(&self, text: &str, _: &str, target: &str, _: &mut dyn FnMut(&str)) -> anyhow::Result<String> {
            Ok(format!("{}:{}", target, text))
        }
    }

    fn pipeline(text: &'static str) -> (Pipeline, Arc<Mutex<Vec<(u32, u32)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ocr = OcrDispatcher::new(Box::new(FakeOcr { text, seen: seen.clone() }), Box::new(Unavailable));
        let screen = FakeScreen {
            captured: Mutex::new(Vec::new()),
        };
        (Pipeline::new(Arc::new(screen), Arc::new(ocr)), seen)
    }

    fn settings(translator: Arc<dyn Translator>) -> CaptureSettings {
        CaptureSettings {
            engine: EnginePreference::Native,
            preprocess: PreprocessConfig::default(),
            translator,
            strings: i18n::strings("en"),
            settle: Duration::ZERO,
        }
    }

    fn request(mode: CaptureMode, language: LanguageSelection, region: ScreenRect) -> CaptureRequest {
        CaptureRequest {
            ticket: CaptureTicket { mode, generation: 1 },
            language,
            region,
        }
    }

    #[test]
    fn copy_capture_end_to_end() {
        let (pipeline, seen) = pipeline("HELLO");
        let mut statuses = Vec::new();

        let outcome = pipeline.run(
            &request(CaptureMode::Copy, LanguageSelection::Universal, ScreenRect::new(100, 100, 300, 80)),
            &settings(Arc::new(EchoTranslator)),
            &mut |m: &str| statuses.push(m.to_string()),
        );

        // 300x80 → escala 2.5 → 750x200 + borda de 20
        assert_eq!(seen.lock().unwrap().as_slice(), &[(790, 240)]);
        assert_eq!(statuses, vec!["Recognizing…"]);

        let mut sink = RecordingSink::default();
        let prefs = RoutePrefs {
            copy_history: true,
            ..RoutePrefs::default()
        };
        router::route(CaptureMode::Copy, outcome, prefs, &mut sink);
        assert_eq!(sink.clipboard, vec!["HELLO"]);
        assert_eq!(sink.copies, vec!["HELLO"]);
    }

    #[test]
    fn translate_failure_end_to_end() {
        let (pipeline, _) = pipeline("Привет");
        let mut statuses = Vec::new();

        let outcome = pipeline.run(
            &request(CaptureMode::Translate, LanguageSelection::russian(), ScreenRect::new(0, 0, 200, 50)),
            &settings(Arc::new(FailingTranslator)),
            &mut |m: &str| statuses.push(m.to_string()),
        );

        assert!(matches!(outcome, PipelineOutcome::TranslationFailed { .. }));
        assert_eq!(
            statuses,
            vec!["Recognizing…", "Translating…", "Connecting to translator…"]
        );

        let mut sink = RecordingSink::default();
        let prefs = RoutePrefs {
            copy_translated_text: true,
            copy_history: true,
            translation_history: true,
        };
        router::route(CaptureMode::Translate, outcome, prefs, &mut sink);
        assert!(sink.clipboard.is_empty());
        assert!(sink.copies.is_empty());
        assert!(sink.translations.is_empty());
        assert_eq!(sink.dialogs.len(), 1);
    }

    #[test]
    fn translation_direction_follows_selection() {
        let (pipeline, _) = pipeline("Hello");
        let outcome = pipeline.run(
            &request(CaptureMode::Translate, LanguageSelection::english(), ScreenRect::new(0, 0, 200, 50)),
            &settings(Arc::new(EchoTranslator)),
            &mut |_: &str| {},
        );
        assert_eq!(
            outcome,
            PipelineOutcome::Translated {
                original: "Hello".to_string(),
                translated: "ru:Hello".to_string(),
                target: "ru".to_string(),
            }
        );
    }

    #[test]
    fn empty_selection_is_aborted_before_capture() {
        let (pipeline, seen) = pipeline("HELLO");
        let outcome = pipeline.run(
            &request(CaptureMode::Copy, LanguageSelection::english(), ScreenRect::new(10, 10, 0, 0)),
            &settings(Arc::new(EchoTranslator)),
            &mut |_: &str| {},
        );
        assert_eq!(outcome, PipelineOutcome::Aborted);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn blank_text_everywhere_is_nothing_recognized() {
        let (pipeline, _) = pipeline("   ");
        let outcome = pipeline.run(
            &request(CaptureMode::Ocr, LanguageSelection::english(), ScreenRect::new(0, 0, 120, 40)),
            &settings(Arc::new(EchoTranslator)),
            &mut |_: &str| {},
        );
        assert_eq!(outcome, PipelineOutcome::NothingRecognized);
    }

    #[test]
    fn spawned_capture_reports_to_ui() {
        let (pipeline, _) = pipeline("HELLO");
        let pipeline = Arc::new(pipeline);
        let (ui, receivers) = UiDispatcher::new();
        let req = request(CaptureMode::Copy, LanguageSelection::english(), ScreenRect::new(0, 0, 100, 100));
        let ticket = req.ticket;

        pipeline.spawn(req, settings(Arc::new(EchoTranslator)), ui);

        let finished = loop {
            match receivers.events.recv_timeout(Duration::from_secs(10)).unwrap() {
                PipelineEvent::Finished { ticket: t, outcome } => break (t, outcome),
                PipelineEvent::Status { .. } => continue,
            }
        };
        assert_eq!(finished.0, ticket);
        assert!(matches!(finished.1, PipelineOutcome::Recognized { .. }));
    }
}
