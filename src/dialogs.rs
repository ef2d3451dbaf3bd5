// clickn-translate/src/dialogs.rs

// ============================================================================
// MÓDULO DIALOGS - Janelas de aviso e de tradução
// ============================================================================
//
// Cada diálogo aberto é um viewport imediato do egui (janela própria,
// sempre no topo). Os textos vêm do i18n no momento da renderização.
//
// ============================================================================

use eframe::egui;

use crate::i18n::Strings;

/// Nome do tema escuro no config.json
const DARK_THEME: &str = "Темная";

/// Diálogos que a aplicação pode mostrar
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    /// Nenhum motor encontrou texto
    RecognitionFailed,
    /// A tradução falhou
    TranslationError { message: String },
    /// Resultado da tradução
    Translation { original: String, translated: String },
    /// RegisterHotKey falhou
    HotkeyUnavailable { combo: String },
}

impl Dialog {
    pub fn title<'a>(&self, strings: &'a Strings) -> &'a str {
        match self {
            Dialog::RecognitionFailed => strings.recognition_failed_title,
            Dialog::TranslationError { .. } => strings.translation_error_title,
            Dialog::Translation { .. } => strings.translation_title,
            Dialog::HotkeyUnavailable { .. } => strings.hotkey_unavailable_title,
        }
    }

    pub fn body(&self, strings: &Strings) -> String {
        match self {
            Dialog::RecognitionFailed => strings.recognition_failed(),
            Dialog::TranslationError { message } => message.clone(),
            Dialog::Translation { translated, .. } => translated.clone(),
            Dialog::HotkeyUnavailable { combo } => strings.hotkey_unavailable(combo),
        }
    }

    /// Texto do botão "Copiar" (só no diálogo de tradução)
    pub fn copy_text(&self) -> Option<&str> {
        match self {
            Dialog::Translation { translated, .. } => Some(translated),
            _ => None,
        }
    }

    fn size(&self) -> [f32; 2] {
        match self {
            Dialog::Translation { .. } => [460.0, 320.0],
            _ => [380.0, 150.0],
        }
    }
}

/// Visual do egui para o tema salvo
pub fn theme_visuals(theme: &str) -> egui::Visuals {
    if theme.trim() == DARK_THEME {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    }
}

struct OpenDialog {
    id: u64,
    dialog: Dialog,
    copied: bool,
}

/// Diálogos abertos, do mais antigo ao mais novo
#[derive(Default)]
pub struct DialogStack {
    open: Vec<OpenDialog>,
    next_id: u64,
}

impl DialogStack {
    pub fn push(&mut self, dialog: Dialog) {
        // O mesmo aviso de hotkey não abre duas vezes
        if matches!(dialog, Dialog::HotkeyUnavailable { .. })
            && self.open.iter().any(|d| d.dialog == dialog)
        {
            return;
        }

        self.next_id += 1;
        debug!("Abrindo diálogo #{}: {:?}", self.next_id, dialog);
        self.open.push(OpenDialog {
            id: self.next_id,
            dialog,
            copied: false,
        });
        debug!("{} diálogo(s) na tela", self.len());
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Renderiza todos os diálogos e remove os que foram fechados
    pub fn show(&mut self, ctx: &egui::Context, strings: &Strings) {
        self.open.retain_mut(|open| show_dialog(ctx, open, strings));
    }
}

/// Renderiza um diálogo; retorna false quando ele deve fechar
fn show_dialog(ctx: &egui::Context, open: &mut OpenDialog, strings: &Strings) -> bool {
    let mut keep = true;
    let title = open.dialog.title(strings).to_string();
    let body = open.dialog.body(strings);

    let viewport_id = egui::ViewportId::from_hash_of(("dialog", open.id));
    let builder = egui::ViewportBuilder::default()
        .with_title(title.clone())
        .with_inner_size(open.dialog.size())
        .with_always_on_top()
        .with_resizable(true);

    ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
        if ctx.input(|i| i.viewport().close_requested() || i.key_pressed(egui::Key::Escape)) {
            keep = false;
        }

        egui::TopBottomPanel::bottom("dialog_buttons").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if let Some(text) = open.dialog.copy_text() {
                    if ui.button(strings.copy_button).clicked() {
                        ctx.output_mut(|o| o.copied_text = text.to_string());
                        open.copied = true;
                    }
                    if open.copied {
                        ui.label(strings.copied);
                    }
                }
                if ui.button(strings.close_button).clicked() {
                    keep = false;
                }
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&title);
            ui.add_space(6.0);
            egui::ScrollArea::vertical().show(ui, |ui| {
                if open.dialog.copy_text().is_some() {
                    // Texto selecionável, mas somente leitura
                    let mut text = body.as_str();
                    ui.add(
                        egui::TextEdit::multiline(&mut text)
                            .desired_width(f32::INFINITY)
                            .desired_rows(8),
                    );
                } else {
                    ui.label(&body);
                }
            });
        });
    });

    if !keep {
        debug!("Diálogo #{} fechado", open.id);
    }
    keep
}
