// clickn-translate/src/ocr.rs

// ============================================================================
// MÓDULO OCR - Despacho entre o OCR nativo e o Tesseract
// ============================================================================
//
// Preferência nativa: tenta o Windows OCR com a imagem normalizada; se o
// resultado vier vazio (ou der erro) roda o Tesseract UMA vez com a
// captura original.
// Preferência offline: vai direto para o Tesseract com a captura original.
//
// ============================================================================

pub mod native;
pub mod offline;

use image::DynamicImage;
use thiserror::Error;

use crate::app_state::LanguageSelection;
use crate::config::{self, EnginePreference};
use crate::preprocess::PreparedImage;

/// Erros de OCR
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("motor de OCR indisponível: {0}")]
    EngineUnavailable(String),
    #[error("erro no motor de OCR: {0}")]
    Backend(String),
    #[error("erro de imagem: {0}")]
    Image(#[from] image::ImageError),
    #[error("erro de I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Motor que produziu o texto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Native,
    Offline,
}

/// Texto reconhecido
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub text: String,
    pub engine: EngineKind,
}

impl Recognition {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Um motor de OCR
pub trait OcrBackend: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Reconhece o texto da imagem (linhas separadas por '\n')
    fn recognize(&self, image: &DynamicImage, language: &LanguageSelection) -> Result<String, OcrError>;
}

/// Escolhe o motor e aplica o fallback
pub struct OcrDispatcher {
    native: Box<dyn OcrBackend>,
    offline: Box<dyn OcrBackend>,
}

impl OcrDispatcher {
    pub fn new(native: Box<dyn OcrBackend>, offline: Box<dyn OcrBackend>) -> Self {
        OcrDispatcher { native, offline }
    }

    /// Windows OCR + Tesseract ao lado do executável
    pub fn system() -> Self {
        OcrDispatcher::new(
            Box::new(native::SharedNativeOcr),
            Box::new(offline::TesseractOcr::new(config::app_dir())),
        )
    }

    /// Reconhece o texto da captura
    ///
    /// # Argumentos
    /// * `prepared` - Captura original + versão normalizada
    /// * `language` - Idioma escolhido no overlay
    /// * `preference` - Motor configurado
    ///
    /// # Retorna
    /// * `Recognition` (pode vir vazio se nenhum motor achou texto)
    /// * `OcrError` se o motor offline falhar
    pub fn recognize(
        &self,
        prepared: &PreparedImage,
        language: &LanguageSelection,
        preference: EnginePreference,
    ) -> Result<Recognition, OcrError> {
        if preference == EnginePreference::Native {
            info!("🔍 Executando OCR nativo ({})...", language.code());
            match self.native.recognize(&prepared.normalized, language) {
                Ok(text) if !text.trim().is_empty() => {
                    info!("✅ OCR nativo: {} caracteres", text.chars().count());
                    return Ok(Recognition {
                        text,
                        engine: self.native.kind(),
                    });
                }
                Ok(_) => warn!("⚠️  OCR nativo não encontrou texto, tentando Tesseract"),
                Err(e) => warn!("⚠️  OCR nativo falhou ({}), tentando Tesseract", e),
            }
        }

        info!("🔍 Executando Tesseract ({})...", language.code());
        let text = self.offline.recognize(&prepared.original, language)?;
        info!("✅ Tesseract: {} caracteres", text.chars().count());

        Ok(Recognition {
            text,
            engine: self.offline.kind(),
        })
    }
}
