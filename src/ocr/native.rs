// clickn-translate/src/ocr/native.rs

// ============================================================================
// OCR NATIVO DO WINDOWS (Windows.Media.Ocr)
// ============================================================================
//
// Uma thread dedicada é dona dos OcrEngine (um por idioma, criados sob
// demanda e reaproveitados). Os pedidos chegam por canal e são
// atendidos em ordem, então cada engine só é usado por uma chamada de
// cada vez.
//
// ============================================================================

use crossbeam_channel::{bounded, unbounded, Sender};
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::thread;

use super::{EngineKind, OcrBackend, OcrError};
use crate::app_state::LanguageSelection;

// ============================================================================
// RESOLUÇÃO DE IDIOMA
// ============================================================================

/// Chave do cache de engines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineKey {
    /// Entrada própria do modo universal
    Universal,
    /// Tag BCP-47 ("ru-RU")
    Tag(String),
}

/// Converte o código curto para a tag do Windows
pub fn windows_tag(code: &str) -> String {
    match code {
        "en" => "en-US".to_string(),
        "ru" => "ru-RU".to_string(),
        other => other.to_string(),
    }
}

/// Decide qual engine usar para a seleção
///
/// # Argumentos
/// * `selection` - Idioma do overlay
/// * `is_supported` - Se o Windows tem o pacote de OCR da tag
/// * `first_available` - Primeiro idioma de OCR instalado
///
/// # Retorna
/// * `(chave do cache, tag usada)` ou `None` se não houver nenhum idioma
pub fn resolve_language(
    selection: &LanguageSelection,
    is_supported: impl Fn(&str) -> bool,
    first_available: impl Fn() -> Option<String>,
) -> Option<(EngineKey, String)> {
    match selection {
        LanguageSelection::Universal => {
            let tag = if is_supported("en-US") {
                "en-US".to_string()
            } else {
                first_available()?
            };
            Some((EngineKey::Universal, tag))
        }
        LanguageSelection::Explicit(code) => {
            let wanted = windows_tag(code);
            if is_supported(&wanted) {
                return Some((EngineKey::Tag(wanted.clone()), wanted));
            }
            let fallback = first_available()?;
            warn!("⚠️  Idioma '{}' sem OCR instalado, usando '{}'", wanted, fallback);
            Some((EngineKey::Tag(fallback.clone()), fallback))
        }
    }
}

/// Cache de engines criados sob demanda
pub struct EngineCache<E> {
    engines: HashMap<EngineKey, E>,
}

impl<E> Default for EngineCache<E> {
    fn default() -> Self {
        EngineCache {
            engines: HashMap::new(),
        }
    }
}

impl<E> EngineCache<E> {
    /// Retorna o engine da chave, criando na primeira vez
    pub fn get_or_create(
        &mut self,
        key: EngineKey,
        create: impl FnOnce() -> Result<E, OcrError>,
    ) -> Result<&E, OcrError> {
        if !self.engines.contains_key(&key) {
            let engine = create()?;
            self.engines.insert(key.clone(), engine);
        }
        self.engines
            .get(&key)
            .ok_or_else(|| OcrError::Backend("engine ausente do cache".to_string()))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }
}

/// Monta o texto final: palavras separadas por espaço, linhas por '\n'
///
/// Linhas sem palavras usam o texto da própria linha.
pub fn join_lines(lines: &[(Vec<String>, String)]) -> String {
    lines
        .iter()
        .map(|(words, line_text)| {
            if words.is_empty() {
                line_text.clone()
            } else {
                words.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// SERVIÇO (thread dedicada)
// ============================================================================

enum NativeJob {
    Recognize {
        image: DynamicImage,
        language: LanguageSelection,
        reply: Sender<Result<String, OcrError>>,
    },
    WarmUp,
}

/// Fila da thread do OCR nativo
struct NativeService {
    jobs: Option<Sender<NativeJob>>,
}

impl NativeService {
    fn spawn() -> Self {
        let (tx, rx) = unbounded::<NativeJob>();
        let spawned = thread::Builder::new()
            .name("native-ocr".to_string())
            .spawn(move || {
                info!("🧠 Thread do OCR nativo iniciada");
                let mut cache = EngineCache::default();
                for job in rx {
                    match job {
                        NativeJob::Recognize { image, language, reply } => {
                            let result = backend::recognize(&mut cache, &image, &language);
                            let _ = reply.send(result);
                        }
                        NativeJob::WarmUp => backend::warm_up(&mut cache),
                    }
                }
            });

        match spawned {
            Ok(_) => NativeService { jobs: Some(tx) },
            Err(e) => {
                error!("❌ Erro ao criar thread do OCR nativo: {}", e);
                NativeService { jobs: None }
            }
        }
    }

    fn shared() -> &'static NativeService {
        static SERVICE: OnceLock<NativeService> = OnceLock::new();
        SERVICE.get_or_init(NativeService::spawn)
    }

    fn sender(&self) -> Result<&Sender<NativeJob>, OcrError> {
        self.jobs
            .as_ref()
            .ok_or_else(|| OcrError::EngineUnavailable("thread do OCR nativo não iniciou".to_string()))
    }
}

/// Pré-cria os engines de russo e inglês em background
pub fn warm_up() {
    match NativeService::shared().sender() {
        Ok(jobs) => {
            let _ = jobs.send(NativeJob::WarmUp);
        }
        Err(e) => warn!("⚠️  {}", e),
    }
}

/// Backend nativo usando a thread compartilhada do processo
pub struct SharedNativeOcr;

impl OcrBackend for SharedNativeOcr {
    fn kind(&self) -> EngineKind {
        EngineKind::Native
    }

    fn recognize(&self, image: &DynamicImage, language: &LanguageSelection) -> Result<String, OcrError> {
        let jobs = NativeService::shared().sender()?;
        let (reply, response) = bounded(1);
        jobs.send(NativeJob::Recognize {
            image: image.clone(),
            language: language.clone(),
            reply,
        })
        .map_err(|_| OcrError::EngineUnavailable("thread do OCR nativo encerrada".to_string()))?;

        response
            .recv()
            .map_err(|_| OcrError::EngineUnavailable("thread do OCR nativo encerrada".to_string()))?
    }
}

// ============================================================================
// CHAMADAS WINRT
// ============================================================================

#[cfg(windows)]
mod backend {
    use image::DynamicImage;
    use std::io::Cursor;
    use windows::{
        core::HSTRING,
        Globalization::Language,
        Graphics::Imaging::BitmapDecoder,
        Media::Ocr::OcrEngine,
        Storage::Streams::{DataWriter, InMemoryRandomAccessStream},
    };

    use super::{join_lines, resolve_language, EngineCache, EngineKey};
    use crate::app_state::LanguageSelection;
    use crate::ocr::OcrError;

    fn winrt(e: windows::core::Error) -> OcrError {
        OcrError::Backend(e.message().to_string())
    }

    fn is_supported(tag: &str) -> bool {
        Language::CreateLanguage(&HSTRING::from(tag))
            .and_then(|lang| OcrEngine::IsLanguageSupported(&lang))
            .unwrap_or(false)
    }

    fn first_available() -> Option<String> {
        let languages = OcrEngine::AvailableRecognizerLanguages().ok()?;
        if languages.Size().ok()? == 0 {
            return None;
        }
        let tag = languages.GetAt(0).ok()?.LanguageTag().ok()?;
        Some(tag.to_string_lossy())
    }

    fn create_engine(tag: &str) -> Result<OcrEngine, OcrError> {
        info!("🧠 Criando engine de OCR para '{}'", tag);
        let lang = Language::CreateLanguage(&HSTRING::from(tag)).map_err(winrt)?;
        OcrEngine::TryCreateFromLanguage(&lang).map_err(winrt)
    }

    pub(super) fn warm_up(cache: &mut EngineCache<OcrEngine>) {
        for tag in ["ru-RU", "en-US"] {
            if !is_supported(tag) {
                continue;
            }
            if let Err(e) = cache.get_or_create(EngineKey::Tag(tag.to_string()), || create_engine(tag)) {
                warn!("⚠️  Aquecimento do OCR '{}' falhou: {}", tag, e);
            }
        }
        info!("🧠 OCR nativo aquecido ({} engine(s))", cache.len());
    }

    pub(super) fn recognize(
        cache: &mut EngineCache<OcrEngine>,
        image: &DynamicImage,
        language: &LanguageSelection,
    ) -> Result<String, OcrError> {
        let (key, tag) = resolve_language(language, is_supported, first_available)
            .ok_or_else(|| OcrError::EngineUnavailable("nenhum idioma de OCR instalado".to_string()))?;
        let engine = cache.get_or_create(key, || create_engine(&tag))?;

        // O Windows OCR recusa imagens acima de MaxImageDimension
        let max_dimension = OcrEngine::MaxImageDimension().map_err(winrt)?;
        let image = if image.width().max(image.height()) > max_dimension {
            image.resize(max_dimension, max_dimension, image::imageops::FilterType::Lanczos3)
        } else {
            image.clone()
        };

        // PNG em memória → stream → SoftwareBitmap
        let mut png_bytes: Vec<u8> = Vec::new();
        DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)?;

        let stream = InMemoryRandomAccessStream::new().map_err(winrt)?;
        {
            let writer = DataWriter::CreateDataWriter(&stream).map_err(winrt)?;
            writer.WriteBytes(&png_bytes).map_err(winrt)?;
            writer.StoreAsync().map_err(winrt)?.get().map_err(winrt)?;
            writer.DetachStream().map_err(winrt)?;
        }
        stream.Seek(0).map_err(winrt)?;

        let decoder = BitmapDecoder::CreateAsync(&stream).map_err(winrt)?.get().map_err(winrt)?;
        let bitmap = decoder
            .GetSoftwareBitmapAsync()
            .map_err(winrt)?
            .get()
            .map_err(winrt)?;

        let result = engine.RecognizeAsync(&bitmap).map_err(winrt)?.get().map_err(winrt)?;

        let ocr_lines = result.Lines().map_err(winrt)?;
        let mut lines = Vec::new();
        for i in 0..ocr_lines.Size().map_err(winrt)? {
            let line = ocr_lines.GetAt(i).map_err(winrt)?;
            let words = line.Words().map_err(winrt)?;
            let mut word_texts = Vec::new();
            for j in 0..words.Size().map_err(winrt)? {
                let word = words.GetAt(j).map_err(winrt)?;
                word_texts.push(word.Text().map_err(winrt)?.to_string_lossy());
            }
            let line_text = line.Text().map_err(winrt)?.to_string_lossy();
            lines.push((word_texts, line_text));
        }

        Ok(join_lines(&lines))
    }
}

#[cfg(not(windows))]
mod backend {
    use image::DynamicImage;

    use super::EngineCache;
    use crate::app_state::LanguageSelection;
    use crate::ocr::OcrError;

    pub(super) fn warm_up(_cache: &mut EngineCache<()>) {
        debug!("OCR nativo indisponível nesta plataforma");
    }

    pub(super) fn recognize(
        _cache: &mut EngineCache<()>,
        _image: &DynamicImage,
        _language: &LanguageSelection,
    ) -> Result<String, OcrError> {
        Err(OcrError::EngineUnavailable(
            "Windows OCR só existe no Windows".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn short_codes_map_to_windows_tags() {
        assert_eq!(windows_tag("en"), "en-US");
        assert_eq!(windows_tag("ru"), "ru-RU");
        assert_eq!(windows_tag("de-DE"), "de-DE");
    }

    #[test]
    fn unsupported_language_falls_back_to_first_available() {
        let resolved = resolve_language(
            &LanguageSelection::russian(),
            |tag| tag == "en-US",
            || Some("en-US".to_string()),
        );
        assert_eq!(resolved, Some((EngineKey::Tag("en-US".to_string()), "en-US".to_string())));
    }

    #[test]
    fn universal_has_its_own_cache_entry() {
        let resolved = resolve_language(&LanguageSelection::Universal, |_| true, || None);
        assert_eq!(resolved, Some((EngineKey::Universal, "en-US".to_string())));

        let resolved = resolve_language(&LanguageSelection::Universal, |_| false, || Some("pt-BR".to_string()));
        assert_eq!(resolved, Some((EngineKey::Universal, "pt-BR".to_string())));
    }

    #[test]
    fn no_installed_language_resolves_to_none() {
        assert_eq!(resolve_language(&LanguageSelection::english(), |_| false, || None), None);
    }

    #[test]
    fn engines_are_created_once_per_key() {
        let created = Cell::new(0);
        let mut cache: EngineCache<u32> = EngineCache::default();

        for _ in 0..3 {
            let engine = cache
                .get_or_create(EngineKey::Tag("ru-RU".to_string()), || {
                    created.set(created.get() + 1);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*engine, 7);
        }
        cache.get_or_create(EngineKey::Universal, || {
            created.set(created.get() + 1);
            Ok(8)
        })
        .unwrap();

        assert_eq!(created.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_creation_is_not_cached() {
        let mut cache: EngineCache<u32> = EngineCache::default();
        let failed = cache.get_or_create(EngineKey::Universal, || Err(OcrError::Backend("x".to_string())));
        assert!(failed.is_err());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn lines_join_words_with_spaces() {
        let lines = vec![
            (vec!["HELLO".to_string(), "WORLD".to_string()], "HELLO WORLD".to_string()),
            (vec![], "fallback".to_string()),
        ];
        assert_eq!(join_lines(&lines), "HELLO WORLD\nfallback");
    }
}
