// clickn-translate/src/ocr/offline.rs

// ============================================================================
// OCR OFFLINE (Tesseract)
// ============================================================================
//
// O executável é procurado nesta ordem:
// 1. <app>/ocr/tesseract/tesseract.exe
// 2. Busca recursiva dentro de <app>/ocr/tesseract
// 3. Instalações padrão (Program Files, AppData\Local)
// 4. PATH
//
// O caminho encontrado fica em cache pelo resto do processo. O tessdata
// fica ao lado do executável; modelos eng/rus faltando são baixados.
//
// ============================================================================

use anyhow::{Context, Result};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{EngineKind, OcrBackend, OcrError};
use crate::app_state::LanguageSelection;
use crate::runtime;

/// Modelos necessários no tessdata
const REQUIRED_MODELS: [&str; 2] = ["eng", "rus"];

/// Profundidade máxima da busca recursiva
const SEARCH_DEPTH: usize = 4;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

fn executable_name() -> &'static str {
    if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    }
}

/// Idioma do Tesseract para a seleção do overlay
pub fn tesseract_language(selection: &LanguageSelection) -> &'static str {
    match selection {
        LanguageSelection::Universal => "eng+rus",
        LanguageSelection::Explicit(code) if code == "en" => "eng",
        LanguageSelection::Explicit(_) => "rus",
    }
}

// ============================================================================
// LOCALIZAÇÃO DO EXECUTÁVEL
// ============================================================================

fn find_recursive(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|f| f.eq_ignore_ascii_case(name)) {
            return Some(path);
        }
    }

    if depth == 0 {
        return None;
    }
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| find_recursive(sub, name, depth - 1))
}

/// Instalações padrão do Tesseract
fn standard_locations() -> Vec<PathBuf> {
    let name = executable_name();
    let mut locations = Vec::new();
    if cfg!(windows) {
        locations.push(PathBuf::from(r"C:\Program Files\Tesseract-OCR").join(name));
        locations.push(PathBuf::from(r"C:\Program Files (x86)\Tesseract-OCR").join(name));
        if let Some(local) = dirs::data_local_dir() {
            locations.push(local.join("Tesseract-OCR").join(name));
        }
    } else {
        locations.push(PathBuf::from("/usr/bin").join(name));
        locations.push(PathBuf::from("/usr/local/bin").join(name));
    }
    locations
}

fn search_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Procura o executável do Tesseract
///
/// # Argumentos
/// * `app_dir` - Diretório do executável da aplicação
/// * `standard` - Instalações padrão a verificar
pub fn locate_tesseract(app_dir: &Path, standard: &[PathBuf]) -> Option<PathBuf> {
    let name = executable_name();
    let bundled_dir = app_dir.join("ocr").join("tesseract");

    let bundled = bundled_dir.join(name);
    if bundled.is_file() {
        return Some(bundled);
    }

    if let Some(found) = find_recursive(&bundled_dir, name, SEARCH_DEPTH) {
        return Some(found);
    }

    if let Some(found) = standard.iter().find(|p| p.is_file()) {
        return Some(found.clone());
    }

    search_path(name)
}

/// Diretório tessdata ao lado do executável (ou um nível acima)
pub fn tessdata_dir(executable: &Path) -> Option<PathBuf> {
    let exe_dir = executable.parent()?;
    [exe_dir.join("tessdata"), exe_dir.join("..").join("tessdata")]
        .into_iter()
        .find(|dir| dir.is_dir())
}

/// Modelos que ainda não existem no tessdata
pub fn missing_models(tessdata: &Path) -> Vec<&'static str> {
    REQUIRED_MODELS
        .iter()
        .copied()
        .filter(|lang| !tessdata.join(format!("{}.traineddata", lang)).is_file())
        .collect()
}

// ============================================================================
// DOWNLOAD DOS MODELOS
// ============================================================================

async fn download_model(client: &reqwest::Client, lang: &str, tessdata: &Path) -> Result<()> {
    let url = format!(
        "https://github.com/tesseract-ocr/tessdata/raw/main/{}.traineddata",
        lang
    );
    info!("📥 Baixando modelo '{}' do Tesseract...", lang);

    let response = client
        .get(&url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("Falha ao baixar {}", url))?
        .error_for_status()
        .with_context(|| format!("Download de {} recusado", url))?;

    let bytes = response.bytes().await.context("Falha ao ler download")?;

    // Grava num .tmp e só renomeia no fim
    let target = tessdata.join(format!("{}.traineddata", lang));
    let temp = tessdata.join(format!("{}.traineddata.tmp", lang));
    tokio::fs::write(&temp, &bytes)
        .await
        .with_context(|| format!("Falha ao gravar {}", temp.display()))?;
    tokio::fs::rename(&temp, &target)
        .await
        .with_context(|| format!("Falha ao renomear {}", temp.display()))?;

    info!("✅ Modelo '{}' salvo ({} bytes)", lang, bytes.len());
    Ok(())
}

/// Baixa os modelos faltando; falhas só geram aviso
pub fn ensure_models(tessdata: &Path) {
    let missing = missing_models(tessdata);
    if missing.is_empty() {
        return;
    }

    let result = runtime::block_on(async {
        let client = reqwest::Client::new();
        for lang in missing {
            if let Err(e) = download_model(&client, lang, tessdata).await {
                warn!("⚠️  {:#}", e);
            }
        }
    });

    if let Err(e) = result {
        warn!("⚠️  Download de modelos não executado: {:#}", e);
    }
}

/// Lembra quando o tessdata ficou completo
///
/// Enquanto faltar algum modelo o download é tentado de novo a cada
/// chamada do Tesseract.
#[derive(Default)]
pub struct ModelCheck {
    ready: AtomicBool,
}

impl ModelCheck {
    /// Garante os modelos do tessdata
    ///
    /// # Argumentos
    /// * `tessdata` - Diretório dos modelos
    /// * `download` - Baixa o que estiver faltando
    ///
    /// # Retorna
    /// * `true` se todos os modelos estão presentes
    pub fn ensure(&self, tessdata: &Path, download: impl FnOnce(&Path)) -> bool {
        if self.ready.load(Ordering::Acquire) {
            return true;
        }
        download(tessdata);
        let ready = missing_models(tessdata).is_empty();
        if ready {
            self.ready.store(true, Ordering::Release);
        } else {
            warn!("⚠️  Modelos do Tesseract incompletos, nova tentativa na próxima captura");
        }
        ready
    }
}

// ============================================================================
// BACKEND
// ============================================================================

/// Tesseract como processo externo
pub struct TesseractOcr {
    app_dir: PathBuf,
    executable: Mutex<Option<PathBuf>>,
    models: ModelCheck,
}

impl TesseractOcr {
    pub fn new(app_dir: PathBuf) -> Self {
        TesseractOcr {
            app_dir,
            executable: Mutex::new(None),
            models: ModelCheck::default(),
        }
    }

    /// Caminho do executável (procurado uma vez, depois em cache)
    fn executable(&self) -> Option<PathBuf> {
        let mut cached = match self.executable.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if cached.is_none() {
            *cached = locate_tesseract(&self.app_dir, &standard_locations());
            match cached.as_ref() {
                Some(path) => info!("🔎 Tesseract encontrado: {}", path.display()),
                None => warn!("⚠️  Tesseract não encontrado"),
            }
        }
        cached.clone()
    }

    fn run(&self, executable: &Path, image: &DynamicImage, lang: &str) -> Result<String, OcrError> {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let input = std::env::temp_dir().join(format!(
            "clickn-ocr-{}-{}.png",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        image.save_with_format(&input, image::ImageFormat::Png)?;

        let mut command = Command::new(executable);
        command.arg(&input).arg("stdout").args(["-l", lang, "--oem", "3", "--psm", "6"]);

        if let Some(tessdata) = tessdata_dir(executable) {
            self.models.ensure(&tessdata, ensure_models);
            command.env("TESSDATA_PREFIX", &tessdata);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);
        }

        let output = command.output();
        if let Err(e) = fs::remove_file(&input) {
            debug!("Arquivo temporário não removido: {}", e);
        }
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Backend(format!(
                "tesseract saiu com {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl OcrBackend for TesseractOcr {
    fn kind(&self) -> EngineKind {
        EngineKind::Offline
    }

    fn recognize(&self, image: &DynamicImage, language: &LanguageSelection) -> Result<String, OcrError> {
        let executable = self
            .executable()
            .ok_or_else(|| OcrError::EngineUnavailable("Tesseract não encontrado".to_string()))?;
        self.run(&executable, image, tesseract_language(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn language_mapping() {
        assert_eq!(tesseract_language(&LanguageSelection::english()), "eng");
        assert_eq!(tesseract_language(&LanguageSelection::russian()), "rus");
        assert_eq!(tesseract_language(&LanguageSelection::Universal), "eng+rus");
    }

    #[test]
    fn bundled_executable_wins() {
        let app = tempfile::tempdir().unwrap();
        let bundled = app.path().join("ocr").join("tesseract").join(executable_name());
        touch(&bundled);
        let standard = app.path().join("standard").join(executable_name());
        touch(&standard);

        assert_eq!(locate_tesseract(app.path(), &[standard]), Some(bundled));
    }

    #[test]
    fn nested_bundle_is_found_recursively() {
        let app = tempfile::tempdir().unwrap();
        let nested = app
            .path()
            .join("ocr")
            .join("tesseract")
            .join("5.3")
            .join("bin")
            .join(executable_name());
        touch(&nested);

        assert_eq!(locate_tesseract(app.path(), &[]), Some(nested));
    }

    #[test]
    fn standard_install_is_used_without_bundle() {
        let app = tempfile::tempdir().unwrap();
        let standard = app.path().join("Tesseract-OCR").join(executable_name());
        touch(&standard);
        let missing = app.path().join("nowhere").join(executable_name());

        assert_eq!(
            locate_tesseract(app.path(), &[missing, standard.clone()]),
            Some(standard)
        );
    }

    #[test]
    fn tessdata_next_to_or_above_executable() {
        let root = tempfile::tempdir().unwrap();
        let exe = root.path().join("bin").join(executable_name());
        touch(&exe);
        assert_eq!(tessdata_dir(&exe), None);

        fs::create_dir_all(root.path().join("tessdata")).unwrap();
        assert_eq!(
            tessdata_dir(&exe),
            Some(root.path().join("bin").join("..").join("tessdata"))
        );

        fs::create_dir_all(root.path().join("bin").join("tessdata")).unwrap();
        assert_eq!(tessdata_dir(&exe), Some(root.path().join("bin").join("tessdata")));
    }

    #[test]
    fn failed_download_is_retried_until_models_exist() {
        let tessdata = tempfile::tempdir().unwrap();
        let check = ModelCheck::default();
        let attempts = std::cell::Cell::new(0);

        // Primeira tentativa sem rede
        assert!(!check.ensure(tessdata.path(), |_| attempts.set(attempts.get() + 1)));

        assert!(check.ensure(tessdata.path(), |dir| {
            attempts.set(attempts.get() + 1);
            touch(&dir.join("eng.traineddata"));
            touch(&dir.join("rus.traineddata"));
        }));
        assert!(check.ensure(tessdata.path(), |_| attempts.set(attempts.get() + 1)));

        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn missing_models_are_listed() {
        let tessdata = tempfile::tempdir().unwrap();
        assert_eq!(missing_models(tessdata.path()), vec!["eng", "rus"]);

        touch(&tessdata.path().join("rus.traineddata"));
        assert_eq!(missing_models(tessdata.path()), vec!["eng"]);
    }
}
