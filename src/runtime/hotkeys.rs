// clickn-translate/src/runtime/hotkeys.rs

// ============================================================================
// THREADS DE HOTKEYS (uma por combinação, em background)
// ============================================================================
//
// Cada listener registra sua combinação com RegisterHotKey na própria
// thread e bombeia a fila de mensagens dela com espera de 50 ms, para
// poder verificar o pedido de parada. O disparo vira um AppCommand
// executado na thread da UI.
//
// ============================================================================

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::app_state::{AppCommand, CaptureMode, UiDispatcher};
use crate::config::AppConfig;
use crate::hotkey::{self, HotkeyCombo, HotkeyError};

/// Intervalo máximo de espera por mensagens antes de checar a parada
#[cfg_attr(not(windows), allow(dead_code))]
const POLL_INTERVAL_MS: u32 = 50;

/// Tempo máximo aguardando cada thread encerrar
pub const JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Listener de uma combinação global
pub struct HotkeyListener {
    combo: String,
    stop: Arc<AtomicBool>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl HotkeyListener {
    /// Inicia o listener
    ///
    /// # Argumentos
    /// * `combo` - Texto da combinação ("Ctrl+Alt+C")
    /// * `id` - Identificador do RegisterHotKey
    /// * `command` - Comando enviado para a UI a cada disparo
    /// * `dispatcher` - Canal para a thread da UI
    ///
    /// # Retorna
    /// * `None` se a combinação for inválida (a UI recebe
    ///   `HotkeyRegistrationFailed`) ou se a thread não puder ser criada
    pub fn start(
        combo: &str,
        id: i32,
        command: AppCommand,
        dispatcher: UiDispatcher,
    ) -> Option<Self> {
        let parsed = match hotkey::parse_hotkey(combo) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("❌ Hotkey inválida: {}", e);
                dispatcher.send_command(AppCommand::HotkeyRegistrationFailed(combo.to_string()));
                return None;
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = bounded::<()>(1);
        let thread_stop = stop.clone();
        let thread_combo = combo.to_string();

        let spawned = thread::Builder::new()
            .name(format!("hotkey-{}", id))
            .spawn(move || {
                info!("⌨️  Thread de hotkey iniciada: {}", thread_combo);

                let trigger_dispatcher = dispatcher.clone();
                let on_trigger = move || {
                    info!("⌨️  Hotkey pressionada: {:?}", command);
                    trigger_dispatcher.send_command(command.clone());
                };

                if let Err(e) = run_message_loop(id, parsed, &thread_combo, &thread_stop, &on_trigger) {
                    error!("❌ {}", e);
                    dispatcher.send_command(AppCommand::HotkeyRegistrationFailed(thread_combo.clone()));
                }

                info!("⌨️  Thread de hotkey encerrada: {}", thread_combo);
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(handle) => Some(HotkeyListener {
                combo: combo.to_string(),
                stop,
                done,
                handle: Some(handle),
            }),
            Err(e) => {
                error!("❌ Erro ao criar thread de hotkey: {}", e);
                None
            }
        }
    }

    /// Pede a parada (pode ser chamado várias vezes)
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Aguarda a thread encerrar por no máximo `timeout`
    ///
    /// Se o prazo estourar a thread é abandonada.
    pub fn join(&mut self, timeout: Duration) {
        self.stop();
        let Some(handle) = self.handle.take() else {
            return;
        };

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("⚠️  Thread de hotkey '{}' terminou com panic", self.combo);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("⚠️  Thread de hotkey '{}' não encerrou a tempo", self.combo);
            }
        }
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// LOOP DE MENSAGENS
// ============================================================================

#[cfg(windows)]
fn run_message_loop(
    id: i32,
    combo: HotkeyCombo,
    combo_text: &str,
    stop: &AtomicBool,
    on_trigger: &dyn Fn(),
) -> Result<(), HotkeyError> {
    use std::ptr;
    use winapi::um::winuser::{
        DispatchMessageW, MsgWaitForMultipleObjects, PeekMessageW, RegisterHotKey,
        TranslateMessage, UnregisterHotKey, MSG, PM_REMOVE, QS_ALLINPUT, WM_HOTKEY,
    };

    // Sem janela: as mensagens WM_HOTKEY vão para a fila desta thread
    let registered = unsafe { RegisterHotKey(ptr::null_mut(), id, combo.modifiers, combo.vk) };
    if registered == 0 {
        return Err(HotkeyError::RegistrationFailed(combo_text.to_string()));
    }
    info!("✅ Hotkey registrada: {}", combo_text);

    while !stop.load(Ordering::SeqCst) {
        unsafe {
            MsgWaitForMultipleObjects(0, ptr::null(), 0, POLL_INTERVAL_MS, QS_ALLINPUT);
        }

        let mut msg: MSG = unsafe { std::mem::zeroed() };
        while unsafe { PeekMessageW(&mut msg, ptr::null_mut(), 0, 0, PM_REMOVE) } != 0 {
            if msg.message == WM_HOTKEY && msg.wParam as i32 == id {
                on_trigger();
            } else {
                unsafe {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }

    unsafe {
        UnregisterHotKey(ptr::null_mut(), id);
    }
    Ok(())
}

#[cfg(not(windows))]
fn run_message_loop(
    _id: i32,
    _combo: HotkeyCombo,
    combo_text: &str,
    _stop: &AtomicBool,
    _on_trigger: &dyn Fn(),
) -> Result<(), HotkeyError> {
    warn!("⚠️  Hotkeys globais só estão disponíveis no Windows");
    Err(HotkeyError::RegistrationFailed(combo_text.to_string()))
}

// ============================================================================
// CONJUNTO DE HOTKEYS DA APLICAÇÃO
// ============================================================================

/// Identificador do RegisterHotKey para cada modo
fn hotkey_id(mode: CaptureMode) -> i32 {
    match mode {
        CaptureMode::Ocr => 1,
        CaptureMode::Copy => 2,
        CaptureMode::Translate => 3,
    }
}

/// Listeners de todos os modos com combinação configurada
pub struct HotkeyService {
    dispatcher: UiDispatcher,
    listeners: Vec<HotkeyListener>,
}

impl HotkeyService {
    pub fn new(dispatcher: UiDispatcher) -> Self {
        HotkeyService {
            dispatcher,
            listeners: Vec::new(),
        }
    }

    /// (Re)registra as hotkeys a partir da configuração
    pub fn register_all(&mut self, config: &AppConfig) {
        self.shutdown();

        for mode in CaptureMode::ALL {
            let combo = config.hotkey_for(mode).trim();
            if combo.is_empty() {
                continue;
            }
            if let Some(listener) = HotkeyListener::start(
                combo,
                hotkey_id(mode),
                AppCommand::ToggleCapture(mode),
                self.dispatcher.clone(),
            ) {
                self.listeners.push(listener);
            }
        }

        info!("⌨️  {} hotkey(s) ativas", self.listeners.len());
    }

    /// Para todas as threads e aguarda cada uma com prazo limitado
    pub fn shutdown(&mut self) {
        for listener in &self.listeners {
            listener.stop();
        }
        for listener in &mut self.listeners {
            listener.join(JOIN_TIMEOUT);
        }
        self.listeners.clear();
    }
}
