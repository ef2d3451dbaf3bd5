// clickn-translate/src/translator.rs

// ============================================================================
// MÓDULO TRANSLATOR - Tradução RU ↔ EN
// ============================================================================
//
// Provedores suportados:
// - Google Translate (grátis, sem API key)
// - DeepL (requer API key)
//
// ============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use crate::config::TranslatorProvider;
use crate::runtime;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Serviço de tradução usado pelo pipeline
pub trait Translator: Send + Sync {
    /// Traduz o texto
    ///
    /// # Argumentos
    /// * `text` - Texto reconhecido
    /// * `source` - Código curto de origem ("ru", "en")
    /// * `target` - Código curto de destino
    /// * `on_status` - Recebe mensagens de progresso (zero ou mais vezes)
    fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        on_status: &mut dyn FnMut(&str),
    ) -> Result<String>;
}

/// Destino da tradução para cada origem
pub fn target_for(source: &str) -> &'static str {
    if source == "en" {
        "ru"
    } else {
        "en"
    }
}

// ============================================================================
// ESTRUTURAS DE DADOS - DeepL
// ============================================================================

#[derive(Debug, Serialize)]
struct DeepLRequest {
    text: Vec<String>,
    target_lang: String,
    source_lang: String,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

// ============================================================================
// TRADUTOR HTTP
// ============================================================================

/// Tradutor que chama o provedor configurado
pub struct HttpTranslator {
    provider: TranslatorProvider,
    deepl_api_key: String,
}

impl HttpTranslator {
    pub fn new(provider: TranslatorProvider, deepl_api_key: String) -> Self {
        HttpTranslator {
            provider,
            deepl_api_key,
        }
    }
}

/// Cliente HTTP do processo (criado no primeiro uso)
fn client(on_status: &mut dyn FnMut(&str)) -> Result<&'static reqwest::Client> {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }

    on_status("Connecting to translator…");
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Falha ao criar cliente HTTP")?;
    Ok(CLIENT.get_or_init(|| client))
}

impl Translator for HttpTranslator {
    fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        on_status: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let client = client(on_status)?;
        let provider = self.provider;
        let api_key = self.deepl_api_key.as_str();

        runtime::block_on(async move {
            match provider {
                TranslatorProvider::Google => translate_google(client, text, source, target).await,
                TranslatorProvider::DeepL => translate_deepl(client, text, api_key, source, target).await,
            }
        })?
    }
}

// ============================================================================
// DeepL
// ============================================================================

async fn translate_deepl(
    client: &reqwest::Client,
    text: &str,
    api_key: &str,
    source_lang: &str,
    target_lang: &str,
) -> Result<String> {
    info!("🌐 [DeepL] Traduzindo {} → {}...", source_lang, target_lang);

    if api_key.trim().is_empty() {
        anyhow::bail!("DeepL API key não configurada");
    }

    let request_body = DeepLRequest {
        text: vec![text.to_string()],
        target_lang: convert_lang_code_to_deepl(target_lang),
        source_lang: convert_lang_code_to_deepl(source_lang),
    };

    let response = client
        .post("https://api-free.deepl.com/v2/translate")
        .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
        .json(&request_body)
        .send()
        .await
        .context("Falha ao enviar requisição para DeepL")?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        error!("❌ DeepL API erro: {} - {}", status, error_text);
        anyhow::bail!("DeepL API erro {}: {}", status, error_text);
    }

    let deepl_response: DeepLResponse = response
        .json()
        .await
        .context("Falha ao parsear resposta DeepL")?;

    let translated = deepl_response
        .translations
        .into_iter()
        .next()
        .map(|t| t.text)
        .context("DeepL não retornou tradução")?;

    info!("✅ [DeepL] Tradução concluída!");
    Ok(translated)
}

// ============================================================================
// GOOGLE TRANSLATE (GRÁTIS, SEM API KEY)
// ============================================================================

async fn translate_google(
    client: &reqwest::Client,
    text: &str,
    source: &str,
    target: &str,
) -> Result<String> {
    info!("🌐 [Google] Traduzindo {} → {}...", source, target);

    let url = format!(
        "https://translate.googleapis.com/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
        source,
        target,
        urlencoding::encode(text)
    );

    let response = client
        .get(&url)
        .header(
            "User-Agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
        )
        .send()
        .await
        .context("Falha ao enviar requisição para Google Translate")?;

    if !response.status().is_success() {
        let status = response.status();
        error!("❌ Google Translate erro: {}", status);
        anyhow::bail!("Google Translate erro: {}", status);
    }

    let response_text = response.text().await?;
    let translated = parse_google_response(&response_text)?;

    info!("✅ [Google] Tradução concluída!");
    Ok(translated)
}

/// Parseia a resposta JSON do Google Translate
/// O formato é um array aninhado: [[["texto traduzido","texto original",...],...],...]
fn parse_google_response(response: &str) -> Result<String> {
    let json: serde_json::Value =
        serde_json::from_str(response).context("Falha ao parsear resposta do Google")?;

    let translated: String = json
        .get(0)
        .and_then(|sentences| sentences.as_array())
        .map(|sentences| {
            sentences
                .iter()
                .filter_map(|sentence| sentence.get(0).and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if translated.is_empty() {
        anyhow::bail!("Não foi possível extrair tradução da resposta");
    }

    Ok(translated)
}

/// Converte o código curto para o formato do DeepL
fn convert_lang_code_to_deepl(lang: &str) -> String {
    match lang.to_lowercase().as_str() {
        "en" => "EN".to_string(),
        "ru" => "RU".to_string(),
        code => code.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_ru_en_or_en_ru() {
        assert_eq!(target_for("ru"), "en");
        assert_eq!(target_for("en"), "ru");
    }

    #[test]
    fn google_sentences_are_concatenated() {
        let body = r#"[[["Hello. ","Привет. ",null,null,10],["How are you?","Как дела?",null,null,10]],null,"ru"]"#;
        assert_eq!(parse_google_response(body).unwrap(), "Hello. How are you?");
    }

    #[test]
    fn google_multiline_text_keeps_newlines() {
        let body = r#"[[["line one\n","строка один\n"],["line two","строка два"]],null,"ru"]"#;
        assert_eq!(parse_google_response(body).unwrap(), "line one\nline two");
    }

    #[test]
    fn empty_google_response_is_an_error() {
        assert!(parse_google_response("[null]").is_err());
        assert!(parse_google_response("not json").is_err());
    }

    #[test]
    fn deepl_codes_are_uppercase() {
        assert_eq!(convert_lang_code_to_deepl("ru"), "RU");
        assert_eq!(convert_lang_code_to_deepl("en"), "EN");
    }
}
