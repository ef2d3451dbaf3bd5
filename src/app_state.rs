// clickn-translate/src/app_state.rs

// ============================================================================
// MÓDULO APP STATE - Tipos compartilhados entre threads
// ============================================================================
// - CaptureMode: ocr / copy / translate
// - LanguageSelection: idioma escolhido no overlay
// - AppCommand: comandos para a thread da UI
// - PipelineEvent: progresso e resultado de uma captura
// - UiDispatcher: envia comandos/eventos e acorda a UI
// ============================================================================

use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, OnceLock};

use crate::router::PipelineOutcome;

// ============================================================================
// MODO DE CAPTURA
// ============================================================================

/// Modo de captura (define o que acontece com o texto reconhecido)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum CaptureMode {
    /// Só reconhece e copia (sem idioma universal)
    Ocr,
    /// Reconhece e copia, com reconhecimento universal disponível
    Copy,
    /// Reconhece e traduz (RU ↔ EN)
    Translate,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 3] = [CaptureMode::Ocr, CaptureMode::Copy, CaptureMode::Translate];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Ocr => "ocr",
            CaptureMode::Copy => "copy",
            CaptureMode::Translate => "translate",
        }
    }
}

// ============================================================================
// IDIOMA DO RECONHECIMENTO
// ============================================================================

/// Idioma escolhido no seletor do overlay
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageSelection {
    /// Reconhecimento universal (só no modo copy)
    Universal,
    /// Código curto explícito ("ru", "en")
    Explicit(String),
}

impl LanguageSelection {
    pub fn russian() -> Self {
        LanguageSelection::Explicit("ru".to_string())
    }

    pub fn english() -> Self {
        LanguageSelection::Explicit("en".to_string())
    }

    /// Converte o código salvo no config.json
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "universal" | "auto" => LanguageSelection::Universal,
            "" => LanguageSelection::russian(),
            other => LanguageSelection::Explicit(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            LanguageSelection::Universal => "universal",
            LanguageSelection::Explicit(code) => code,
        }
    }

    /// Opções do seletor para cada modo, na ordem exibida
    pub fn options_for(mode: CaptureMode) -> Vec<LanguageSelection> {
        match mode {
            CaptureMode::Copy => vec![
                LanguageSelection::Universal,
                LanguageSelection::russian(),
                LanguageSelection::english(),
            ],
            CaptureMode::Ocr | CaptureMode::Translate => {
                vec![LanguageSelection::russian(), LanguageSelection::english()]
            }
        }
    }

    /// Ajusta a última escolha salva às opções do modo
    ///
    /// Fora do modo copy o universal vira inglês; códigos desconhecidos
    /// caem na primeira opção do modo.
    pub fn for_mode(saved: &LanguageSelection, mode: CaptureMode) -> LanguageSelection {
        let options = Self::options_for(mode);
        if options.contains(saved) {
            return saved.clone();
        }
        match saved {
            LanguageSelection::Universal => LanguageSelection::english(),
            LanguageSelection::Explicit(_) => options[0].clone(),
        }
    }
}

// ============================================================================
// COMANDOS ENTRE THREADS
// ============================================================================

/// Comandos executados na thread da UI
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Abre (ou fecha, se já estiver aberto) o overlay do modo
    ToggleCapture(CaptureMode),
    /// RegisterHotKey falhou para a combinação informada
    HotkeyRegistrationFailed(String),
    /// config.json mudou, re-registra as hotkeys
    ReloadHotkeys,
    /// Encerra a aplicação
    Exit,
}

/// Identifica uma captura em andamento (modo + geração do overlay)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTicket {
    pub mode: CaptureMode,
    pub generation: u64,
}

/// Eventos enviados pela thread do pipeline para a UI
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Mensagem de progresso para a linha de status do overlay
    Status { ticket: CaptureTicket, message: String },
    /// Resultado final da captura
    Finished { ticket: CaptureTicket, outcome: PipelineOutcome },
}

// ============================================================================
// DISPATCHER PARA A UI
// ============================================================================

/// Envia comandos e eventos para a thread da UI e pede um repaint
///
/// O contexto do egui só existe depois que a janela é criada, por isso
/// fica num `OnceLock` preenchido por `attach`.
#[derive(Clone)]
pub struct UiDispatcher {
    command_sender: Sender<AppCommand>,
    event_sender: Sender<PipelineEvent>,
    ctx: Arc<OnceLock<egui::Context>>,
}

/// Lado receptor, fica com a aplicação
pub struct UiReceivers {
    pub commands: Receiver<AppCommand>,
    pub events: Receiver<PipelineEvent>,
}

impl UiDispatcher {
    pub fn new() -> (Self, UiReceivers) {
        let (command_sender, commands) = crossbeam_channel::unbounded();
        let (event_sender, events) = crossbeam_channel::unbounded();
        let dispatcher = UiDispatcher {
            command_sender,
            event_sender,
            ctx: Arc::new(OnceLock::new()),
        };
        (dispatcher, UiReceivers { commands, events })
    }

    /// Conecta o contexto do egui (chamado uma vez, na criação da app)
    pub fn attach(&self, ctx: &egui::Context) {
        let _ = self.ctx.set(ctx.clone());
    }

    pub fn send_command(&self, command: AppCommand) {
        if let Err(e) = self.command_sender.send(command) {
            error!("❌ Erro ao enviar comando: {}", e);
            return;
        }
        self.wake();
    }

    pub fn send_event(&self, event: PipelineEvent) {
        if let Err(e) = self.event_sender.send(event) {
            // A UI já foi encerrada
            debug!("Evento descartado: {}", e);
            return;
        }
        self.wake();
    }

    fn wake(&self) {
        if let Some(ctx) = self.ctx.get() {
            ctx.request_repaint();
        }
    }
}
