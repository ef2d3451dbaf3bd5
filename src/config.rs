// clickn-translate/src/config.rs

// ============================================================================
// MÓDULO CONFIG - Configurações da aplicação (data/config.json)
// ============================================================================
//
// O arquivo é relido sob demanda: cada leitura compara o mtime do arquivo
// com o da última carga. Chaves desconhecidas são preservadas ao salvar.
//
// ============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::SystemTime;

use crate::app_state::{CaptureMode, LanguageSelection};

// ============================================================================
// PRÉ-PROCESSAMENTO
// ============================================================================

/// Constantes do pré-processamento de imagem para OCR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Abaixo disso (largura ou altura) a imagem recebe padding
    pub min_side: u32,
    /// Padding de cada lado ao expandir
    pub pad: u32,
    /// Tamanho mínimo do canvas após o padding
    pub pad_floor: u32,
    /// Altura-alvo do texto em pixels
    pub target_text_height: f32,
    /// Limites do fator de escala
    pub min_scale: f32,
    pub max_scale: f32,
    /// Fator de contraste (1.0 = normal)
    pub contrast: f32,
    /// Fator de nitidez (1.0 = normal)
    pub sharpness: f32,
    /// Borda branca final
    pub border: u32,
    /// Imagens com menor dimensão abaixo disso são binarizadas
    pub binarize_below: u32,
    /// Threshold da binarização (pixel < threshold vira preto)
    pub threshold: u8,
    /// Tabela (menor dimensão < limite, altura estimada do texto)
    pub text_height_steps: Vec<(u32, f32)>,
    /// Altura estimada quando nenhum degrau da tabela se aplica
    pub text_height_fallback: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            min_side: 64,
            pad: 8,
            pad_floor: 80,
            target_text_height: 45.0,
            min_scale: 1.0,
            max_scale: 10.0,
            contrast: 2.5,
            sharpness: 2.0,
            border: 20,
            binarize_below: 100,
            threshold: 128,
            text_height_steps: vec![(25, 8.0), (50, 12.0), (100, 18.0), (150, 25.0)],
            text_height_fallback: 30.0,
        }
    }
}

// ============================================================================
// MOTORES
// ============================================================================

/// Motor de OCR preferido
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePreference {
    /// OCR nativo do Windows (com fallback para o Tesseract)
    Native,
    /// Tesseract direto
    Offline,
}

impl EnginePreference {
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tesseract" | "offline" => EnginePreference::Offline,
            _ => EnginePreference::Native,
        }
    }
}

/// Provedor de tradução
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorProvider {
    Google,
    DeepL,
}

impl TranslatorProvider {
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "deepl" => TranslatorProvider::DeepL,
            "google" => TranslatorProvider::Google,
            other => {
                warn!("⚠️  Provedor '{}' não reconhecido, usando Google", other);
                TranslatorProvider::Google
            }
        }
    }
}

// ============================================================================
// ESTRUTURA PRINCIPAL
// ============================================================================

/// Conteúdo do data/config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: String,
    pub interface_language: String,
    pub autostart: bool,
    pub copy_hotkey: String,
    pub translate_hotkey: String,
    /// Vazio = desativado
    pub ocr_hotkey: String,
    /// Histórico de traduções
    pub history: bool,
    pub copy_history: bool,
    pub copy_translated_text: bool,
    /// "Windows" ou "Tesseract"
    pub ocr_engine: String,
    /// "Google" ou "DeepL"
    pub translator_engine: String,
    pub deepl_api_key: String,
    pub keep_visible_on_ocr: bool,
    pub last_ocr_language: String,
    pub no_screen_dimming: bool,
    pub start_minimized: bool,
    pub preprocess: PreprocessConfig,
    /// Chaves que esta versão não conhece (mantidas ao salvar)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            theme: "Темная".to_string(),
            interface_language: "en".to_string(),
            autostart: false,
            copy_hotkey: "Ctrl+Alt+C".to_string(),
            translate_hotkey: "Ctrl+Alt+T".to_string(),
            ocr_hotkey: String::new(),
            history: false,
            copy_history: false,
            copy_translated_text: false,
            ocr_engine: "Windows".to_string(),
            translator_engine: "Google".to_string(),
            deepl_api_key: String::new(),
            keep_visible_on_ocr: false,
            last_ocr_language: "ru".to_string(),
            no_screen_dimming: false,
            start_minimized: false,
            preprocess: PreprocessConfig::default(),
            extra: serde_json::Map::new(),
        }
    }
}

impl AppConfig {
    pub fn engine_preference(&self) -> EnginePreference {
        EnginePreference::from_config(&self.ocr_engine)
    }

    pub fn translator_provider(&self) -> TranslatorProvider {
        TranslatorProvider::from_config(&self.translator_engine)
    }

    pub fn last_language(&self) -> LanguageSelection {
        LanguageSelection::from_code(&self.last_ocr_language)
    }

    /// Combinação configurada para o modo (vazia = sem hotkey)
    pub fn hotkey_for(&self, mode: CaptureMode) -> &str {
        match mode {
            CaptureMode::Ocr => &self.ocr_hotkey,
            CaptureMode::Copy => &self.copy_hotkey,
            CaptureMode::Translate => &self.translate_hotkey,
        }
    }

    fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Falha ao ler {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Falha ao parsear {}", path.display()))
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Falha ao criar diretório de dados")?;
        }
        let json = serde_json::to_string_pretty(self).context("Falha ao serializar configurações")?;
        fs::write(path, json).with_context(|| format!("Falha ao escrever {}", path.display()))
    }
}

// ============================================================================
// STORE COM CACHE POR MTIME
// ============================================================================

struct CachedConfig {
    modified: Option<SystemTime>,
    config: AppConfig,
}

/// Acesso ao config.json com cache invalidado pelo mtime do arquivo
pub struct ConfigStore {
    path: PathBuf,
    cache: Mutex<Option<CachedConfig>>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Retorna a configuração atual
    ///
    /// Cria o arquivo com os valores padrão se ele não existir. Um arquivo
    /// corrompido mantém a última configuração válida (ou os padrões).
    pub fn get(&self) -> AppConfig {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();

        if modified.is_none() {
            if let Some(cached) = cache.as_ref() {
                if cached.modified.is_none() {
                    return cached.config.clone();
                }
            }
            warn!("⚠️  {} não encontrado, criando arquivo padrão...", self.path.display());
            let config = AppConfig::default();
            if let Err(e) = config.write_to(&self.path) {
                error!("❌ Erro ao criar config padrão: {:#}", e);
            }
            let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
            *cache = Some(CachedConfig {
                modified,
                config: config.clone(),
            });
            return config;
        }

        if let Some(cached) = cache.as_ref() {
            let stale = match (cached.modified, modified) {
                (Some(old), Some(new)) => new > old,
                _ => true,
            };
            if !stale {
                return cached.config.clone();
            }
        }

        match AppConfig::read_from(&self.path) {
            Ok(config) => {
                debug!("📋 Configurações carregadas de {}", self.path.display());
                *cache = Some(CachedConfig {
                    modified,
                    config: config.clone(),
                });
                config
            }
            Err(e) => {
                error!("❌ Erro ao carregar config: {:#}", e);
                let config = cache
                    .as_ref()
                    .map(|c| c.config.clone())
                    .unwrap_or_default();
                *cache = Some(CachedConfig {
                    modified,
                    config: config.clone(),
                });
                config
            }
        }
    }

    /// Aplica uma alteração e salva imediatamente
    ///
    /// Um arquivo corrompido não é sobrescrito: a alteração é recusada até
    /// o arquivo voltar a ser um JSON válido.
    pub fn update(&self, apply: impl FnOnce(&mut AppConfig)) -> Result<()> {
        if self.path.exists() {
            if let Err(e) = AppConfig::read_from(&self.path) {
                anyhow::bail!("{} corrompido, alteração não salva: {:#}", self.path.display(), e);
            }
        }

        let mut config = self.get();
        apply(&mut config);
        config.write_to(&self.path)?;

        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cache = Some(CachedConfig { modified, config });
        Ok(())
    }

    /// Salva a última escolha de idioma do overlay
    pub fn save_last_language(&self, language: &LanguageSelection) -> Result<()> {
        let code = language.code().to_string();
        self.update(|config| config.last_ocr_language = code)?;
        info!("💾 Idioma do OCR salvo: {}", language.code());
        Ok(())
    }
}

// ============================================================================
// CAMINHOS
// ============================================================================

/// Diretório do executável
pub fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Diretório de dados (config + históricos)
pub fn data_dir() -> PathBuf {
    app_dir().join("data")
}

/// Store global do processo
pub fn store() -> &'static ConfigStore {
    static STORE: OnceLock<ConfigStore> = OnceLock::new();
    STORE.get_or_init(|| ConfigStore::new(data_dir().join("config.json")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("config.json");
        let store = ConfigStore::new(&path);

        let config = store.get();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(config.copy_hotkey, "Ctrl+Alt+C");
        assert_eq!(config.translate_hotkey, "Ctrl+Alt+T");
    }

    #[test]
    fn partial_file_fills_missing_keys_and_keeps_unknown_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"copy_history": true, "window_pos": [10, 20]}"#).unwrap();
        let store = ConfigStore::new(&path);

        let config = store.get();
        assert!(config.copy_history);
        assert_eq!(config.last_ocr_language, "ru");

        store.update(|c| c.no_screen_dimming = true).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["window_pos"], serde_json::json!([10, 20]));
        assert_eq!(saved["no_screen_dimming"], serde_json::json!(true));
    }

    #[test]
    fn corrupt_file_keeps_last_good_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::new(&path);
        store.update(|c| c.history = true).unwrap();

        fs::write(&path, "{ not json").unwrap();
        // Força o mtime a ser considerado novo
        let last_good = store.get_cached_for_test();
        *store.cache.lock().unwrap() = Some(CachedConfig {
            modified: Some(SystemTime::UNIX_EPOCH),
            config: last_good,
        });

        assert!(store.get().history);
    }

    #[test]
    fn corrupt_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);

        assert_eq!(store.get(), AppConfig::default());
        assert!(store.save_last_language(&LanguageSelection::english()).is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn saved_language_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        store.save_last_language(&LanguageSelection::Universal).unwrap();
        assert_eq!(store.get().last_language(), LanguageSelection::Universal);
    }

    #[test]
    fn engine_preference_parses_config_names() {
        assert_eq!(EnginePreference::from_config("Windows"), EnginePreference::Native);
        assert_eq!(EnginePreference::from_config("Tesseract"), EnginePreference::Offline);
    }

    impl ConfigStore {
        fn get_cached_for_test(&self) -> AppConfig {
            self.cache
                .lock()
                .unwrap()
                .as_ref()
                .map(|c| c.config.clone())
                .unwrap_or_default()
        }
    }
}
