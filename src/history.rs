// clickn-translate/src/history.rs

// ============================================================================
// MÓDULO HISTORY - Histórico de cópias e de traduções (JSON)
// ============================================================================
//
// Cada arquivo é um array JSON. Uma única thread grava os registros na
// ordem em que chegam; cada gravação trava o arquivo, lê, acrescenta e
// reescreve. Sem lock disponível a gravação segue sem ele.
//
// ============================================================================

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, unbounded, Sender};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Registro do histórico de cópias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyRecord {
    pub timestamp: String,
    pub text: String,
}

/// Registro do histórico de traduções
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub timestamp: String,
    /// Idioma de destino
    pub language: String,
    pub original: String,
    pub translated: String,
}

impl CopyRecord {
    pub fn now(text: &str) -> Self {
        CopyRecord {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            text: text.to_string(),
        }
    }
}

impl TranslationRecord {
    pub fn now(original: &str, translated: &str, language: &str) -> Self {
        TranslationRecord {
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            language: language.to_string(),
            original: original.to_string(),
            translated: translated.to_string(),
        }
    }
}

// ============================================================================
// LOCK DO ARQUIVO
// ============================================================================

#[cfg(windows)]
mod file_lock {
    use std::fs::File;
    use std::os::windows::io::AsRawHandle;
    use winapi::um::fileapi::{LockFileEx, UnlockFileEx};
    use winapi::um::minwinbase::{LOCKFILE_EXCLUSIVE_LOCK, OVERLAPPED};

    /// Trava o arquivo inteiro (exclusivo, bloqueante)
    pub fn lock(file: &File) -> bool {
        unsafe {
            let mut overlapped: OVERLAPPED = std::mem::zeroed();
            LockFileEx(
                file.as_raw_handle() as _,
                LOCKFILE_EXCLUSIVE_LOCK,
                0,
                u32::MAX,
                u32::MAX,
                &mut overlapped,
            ) != 0
        }
    }

    pub fn unlock(file: &File) {
        unsafe {
            let mut overlapped: OVERLAPPED = std::mem::zeroed();
            UnlockFileEx(file.as_raw_handle() as _, 0, u32::MAX, u32::MAX, &mut overlapped);
        }
    }
}

#[cfg(not(windows))]
mod file_lock {
    use std::fs::File;

    pub fn lock(_file: &File) -> bool {
        false
    }

    pub fn unlock(_file: &File) {}
}

fn read_records(file: &mut File) -> Result<Vec<serde_json::Value>> {
    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut contents)?;
    // Arquivo vazio, inválido ou fora de UTF-8 recomeça como lista vazia
    Ok(serde_json::from_slice(&contents).unwrap_or_default())
}

fn rewrite(file: &mut File, records: &[serde_json::Value]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("Falha ao serializar histórico")?;
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Acrescenta um registro ao array JSON do arquivo
///
/// # Argumentos
/// * `path` - Arquivo de histórico (criado se não existir)
/// * `record` - Registro a acrescentar no fim
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Falha ao criar diretório do histórico")?;
    }

    let value = serde_json::to_value(record).context("Falha ao serializar registro")?;

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Falha ao abrir {}", path.display()))?;

    let locked = file_lock::lock(&file);
    if !locked {
        debug!("Lock indisponível para {}, gravando sem lock", path.display());
    }

    let result = read_records(&mut file).and_then(|mut records| {
        records.push(value);
        rewrite(&mut file, &records)
    });

    if locked {
        file_lock::unlock(&file);
    }

    result.with_context(|| format!("Falha ao gravar {}", path.display()))
}

// ============================================================================
// THREAD DE GRAVAÇÃO
// ============================================================================

enum HistoryJob {
    Copy(CopyRecord),
    Translation(TranslationRecord),
    Flush(Sender<()>),
}

/// Caminhos dos arquivos de histórico
#[derive(Debug, Clone)]
pub struct HistoryPaths {
    pub copies: PathBuf,
    pub translations: PathBuf,
}

impl HistoryPaths {
    pub fn in_dir(dir: &Path) -> Self {
        HistoryPaths {
            copies: dir.join("copy_history.json"),
            translations: dir.join("translation_history.json"),
        }
    }
}

/// Grava registros em background, na ordem de chegada
#[derive(Clone)]
pub struct HistoryWriter {
    jobs: Sender<HistoryJob>,
}

impl HistoryWriter {
    pub fn spawn(paths: HistoryPaths) -> Self {
        let (jobs, rx) = unbounded::<HistoryJob>();

        let spawned = thread::Builder::new()
            .name("history-writer".to_string())
            .spawn(move || {
                for job in rx {
                    let result = match job {
                        HistoryJob::Copy(record) => append_record(&paths.copies, &record),
                        HistoryJob::Translation(record) => append_record(&paths.translations, &record),
                        HistoryJob::Flush(done) => {
                            let _ = done.send(());
                            Ok(())
                        }
                    };
                    if let Err(e) = result {
                        error!("❌ Erro ao salvar histórico: {:#}", e);
                    }
                }
            });

        if let Err(e) = spawned {
            error!("❌ Erro ao criar thread do histórico: {}", e);
        }

        HistoryWriter { jobs }
    }

    pub fn append_copy(&self, text: &str) {
        self.submit(HistoryJob::Copy(CopyRecord::now(text)));
    }

    pub fn append_translation(&self, original: &str, translated: &str, language: &str) {
        self.submit(HistoryJob::Translation(TranslationRecord::now(
            original, translated, language,
        )));
    }

    /// Aguarda todos os registros enviados até agora serem gravados
    pub fn flush(&self) {
        let (done, wait) = bounded(1);
        self.submit(HistoryJob::Flush(done));
        let _ = wait.recv();
    }

    fn submit(&self, job: HistoryJob) {
        if self.jobs.send(job).is_err() {
            warn!("⚠️  Thread do histórico encerrada, registro descartado");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back<T: for<'de> Deserialize<'de>>(path: &Path) -> Vec<T> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn records_keep_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HistoryPaths::in_dir(dir.path());
        let writer = HistoryWriter::spawn(paths.clone());

        for i in 0..20 {
            writer.append_copy(&format!("text {}", i));
        }
        writer.flush();

        let records: Vec<CopyRecord> = read_back(&paths.copies);
        let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
        let expected: Vec<String> = (0..20).map(|i| format!("text {}", i)).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn corrupt_file_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy_history.json");
        fs::write(&path, "{ broken").unwrap();

        append_record(&path, &CopyRecord::now("HELLO")).unwrap();

        let records: Vec<CopyRecord> = read_back(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "HELLO");
    }

    #[test]
    fn non_utf8_file_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy_history.json");
        fs::write(&path, [0xFF, 0xFE, 0x00, 0x5B]).unwrap();

        append_record(&path, &CopyRecord::now("HELLO")).unwrap();

        let records: Vec<CopyRecord> = read_back(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "HELLO");
    }

    #[test]
    fn shorter_rewrite_leaves_no_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy_history.json");
        let padding = format!("[{}]", " ".repeat(4096));
        fs::write(&path, padding).unwrap();

        append_record(&path, &CopyRecord::now("x")).unwrap();

        let records: Vec<CopyRecord> = read_back(&path);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn translation_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HistoryPaths::in_dir(dir.path());
        let writer = HistoryWriter::spawn(paths.clone());

        writer.append_translation("Привет", "Hello", "en");
        writer.flush();

        let records: Vec<TranslationRecord> = read_back(&paths.translations);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original, "Привет");
        assert_eq!(records[0].translated, "Hello");
        assert_eq!(records[0].language, "en");
        assert!(records[0].timestamp.contains('T'));
        assert!(!paths.copies.exists());
    }

    #[test]
    fn copy_timestamp_format() {
        let record = CopyRecord::now("x");
        assert!(chrono::NaiveDateTime::parse_from_str(&record.timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
