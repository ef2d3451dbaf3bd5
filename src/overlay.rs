// clickn-translate/src/overlay.rs

// ============================================================================
// MÓDULO OVERLAY - Janela de seleção sobre toda a área de trabalho
// ============================================================================
//
// Hidden       → pré-aquecido, nenhuma janela
// Selecting    → janela translúcida cobrindo todos os monitores
// Recognizing  → janela escondida (a captura não pode pegar o overlay),
//                só uma linha de status perto do seletor de idioma
//
// ============================================================================

pub mod commands;
pub mod fonts;
pub mod pool;
pub mod selection;

use eframe::egui::{self, Pos2, Rect, Vec2};

use crate::app_state::{CaptureMode, CaptureTicket, LanguageSelection};
use crate::screenshot::{self, Display, ScreenRect, VirtualDesktop};
use selection::DragState;

/// Fase do overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayPhase {
    Hidden,
    Selecting,
    /// `status` vazio enquanto a captura ainda não aconteceu
    Recognizing { status: Option<String> },
}

/// O que o overlay pede à aplicação
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// Escape ou janela fechada
    Cancelled,
    /// Botão direito: encerra a aplicação
    ExitRequested,
    LanguageChanged(LanguageSelection),
    /// Seleção finalizada, em coordenadas globais (pode ser vazia)
    Selected(ScreenRect),
}

/// Entrada do mouse/teclado de um frame
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerInput {
    /// Posição local do ponteiro
    pub pos: Option<Pos2>,
    pub pressed: bool,
    pub released: bool,
    pub secondary: bool,
    pub escape: bool,
    /// Clique sobre o seletor de idioma ou com popup aberto
    pub blocked: bool,
}

/// Tamanho do seletor de idioma
pub fn selector_size(mode: CaptureMode) -> Vec2 {
    match mode {
        CaptureMode::Translate => egui::vec2(180.0, 56.0),
        CaptureMode::Copy | CaptureMode::Ocr => egui::vec2(160.0, 56.0),
    }
}

/// Texto de cada opção do seletor
pub fn language_label(mode: CaptureMode, language: &LanguageSelection) -> String {
    match (mode, language) {
        (_, LanguageSelection::Universal) => "AUTO".to_string(),
        (CaptureMode::Translate, LanguageSelection::Explicit(code)) if code == "en" => "EN → RU".to_string(),
        (CaptureMode::Translate, LanguageSelection::Explicit(_)) => "RU → EN".to_string(),
        (_, LanguageSelection::Explicit(code)) => code.to_uppercase(),
    }
}

/// Área de trabalho atual (um monitor padrão se a consulta falhar)
pub fn current_desktop() -> VirtualDesktop {
    match screenshot::virtual_desktop() {
        Ok(desktop) => desktop,
        Err(e) => {
            warn!("⚠️  Não foi possível listar os monitores ({}), usando 1920x1080", e);
            VirtualDesktop {
                bounds: ScreenRect::new(0, 0, 1920, 1080),
                displays: vec![Display {
                    rect: ScreenRect::new(0, 0, 1920, 1080),
                    scale: 1.0,
                }],
            }
        }
    }
}

/// Overlay de captura de um modo
pub struct CaptureOverlay {
    mode: CaptureMode,
    generation: u64,
    desktop: VirtualDesktop,
    language: LanguageSelection,
    drag: DragState,
    phase: OverlayPhase,
    no_dimming: bool,
    /// Canto superior esquerdo do seletor, em coordenadas locais
    selector_pos: Pos2,
    selector_rect: Option<Rect>,
    needs_focus: bool,
}

impl CaptureOverlay {
    pub fn new(mode: CaptureMode, desktop: VirtualDesktop) -> Self {
        let languages = LanguageSelection::options_for(mode);
        CaptureOverlay {
            mode,
            generation: 0,
            desktop,
            language: languages[0].clone(),
            drag: DragState::default(),
            phase: OverlayPhase::Hidden,
            no_dimming: false,
            selector_pos: Pos2::ZERO,
            selector_rect: None,
            needs_focus: false,
        }
    }

    /// Prepara o overlay para aparecer
    ///
    /// # Argumentos
    /// * `generation` - Identificador desta abertura
    /// * `desktop` - Monitores atuais
    /// * `saved` - Último idioma salvo
    /// * `no_dimming` - Preferência "sem escurecer a tela"
    /// * `cursor` - Posição global do cursor (escolhe o monitor do seletor)
    pub fn activate(
        &mut self,
        generation: u64,
        desktop: VirtualDesktop,
        saved: &LanguageSelection,
        no_dimming: bool,
        cursor: Option<(i32, i32)>,
    ) {
        let size = selector_size(self.mode);
        let (x, y) = desktop.selector_position(cursor, size.x);

        self.generation = generation;
        self.desktop = desktop;
        self.language = LanguageSelection::for_mode(saved, self.mode);
        self.drag.reset();
        self.phase = OverlayPhase::Selecting;
        self.no_dimming = no_dimming;
        self.selector_pos = egui::pos2(x, y);
        self.selector_rect = None;
        self.needs_focus = true;

        info!(
            "🎯 Overlay {} aberto ({}x{} em {}, {}), idioma {}",
            self.mode.as_str(),
            self.desktop.bounds.width,
            self.desktop.bounds.height,
            self.desktop.bounds.x,
            self.desktop.bounds.y,
            self.language.code()
        );
    }

    pub fn ticket(&self) -> CaptureTicket {
        CaptureTicket {
            mode: self.mode,
            generation: self.generation,
        }
    }

    pub fn language(&self) -> &LanguageSelection {
        &self.language
    }

    pub fn phase(&self) -> &OverlayPhase {
        &self.phase
    }

    fn origin(&self) -> (i32, i32) {
        (self.desktop.bounds.x, self.desktop.bounds.y)
    }

    /// Esconde a janela de seleção até o resultado chegar
    pub fn begin_recognition(&mut self) {
        self.drag.reset();
        self.phase = OverlayPhase::Recognizing { status: None };
    }

    pub fn set_status(&mut self, message: String) {
        if let OverlayPhase::Recognizing { status } = &mut self.phase {
            *status = Some(message);
        }
    }

    /// Aplica a entrada de um frame
    pub fn handle_pointer(&mut self, input: &PointerInput) -> Option<OverlayEvent> {
        if self.phase != OverlayPhase::Selecting {
            return None;
        }

        if input.escape {
            return Some(OverlayEvent::Cancelled);
        }
        if input.secondary {
            return Some(OverlayEvent::ExitRequested);
        }

        if input.pressed && !input.blocked && !self.drag.is_dragging() {
            if let Some(pos) = input.pos {
                self.drag.press(pos);
            }
        }

        if let Some(pos) = input.pos {
            self.drag.motion(pos);
        }

        if input.released && self.drag.is_dragging() {
            let end = input.pos.or(self.drag.current())?;
            let local = self.drag.release(end)?;
            let global = selection::to_global(local, self.origin());
            info!(
                "✅ Região selecionada: {}x{} na posição ({}, {})",
                global.width, global.height, global.x, global.y
            );
            return Some(OverlayEvent::Selected(global));
        }

        None
    }

    fn viewport_id(&self, part: &str) -> egui::ViewportId {
        egui::ViewportId::from_hash_of(("capture_overlay", self.mode.as_str(), part))
    }

    /// Renderiza a fase atual e devolve os eventos do frame
    pub fn show(&mut self, ctx: &egui::Context) -> Vec<OverlayEvent> {
        let mut events = Vec::new();
        match self.phase.clone() {
            OverlayPhase::Selecting => self.show_selection(ctx, &mut events),
            OverlayPhase::Recognizing { status: Some(status) } => self.show_status(ctx, &status),
            // Nada na tela até a captura terminar
            OverlayPhase::Recognizing { status: None } | OverlayPhase::Hidden => {}
        }
        events
    }

    fn show_selection(&mut self, ctx: &egui::Context, events: &mut Vec<OverlayEvent>) {
        let bounds = self.desktop.bounds;
        let builder = egui::ViewportBuilder::default()
            .with_title(format!("Click'n'Translate {}", self.mode.as_str()))
            .with_position([bounds.x as f32, bounds.y as f32])
            .with_inner_size([bounds.width as f32, bounds.height as f32])
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_resizable(false)
            .with_taskbar(false);

        ctx.show_viewport_immediate(self.viewport_id("selection"), builder, |ctx, _class| {
            if self.needs_focus {
                self.needs_focus = false;
                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
            }

            egui::CentralPanel::default()
                .frame(egui::Frame::none())
                .show(ctx, |ui| {
                    selection::paint(ui.painter(), ctx.screen_rect(), self.drag.rect(), self.no_dimming);
                });

            let area = egui::Area::new(egui::Id::new(("language_selector", self.mode.as_str())))
                .fixed_pos(self.selector_pos)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| self.language_selector(ui, events));
            self.selector_rect = Some(area.response.rect);

            let popup_open = ctx.memory(|m| m.any_popup_open());
            let mut input = ctx.input(|i| PointerInput {
                pos: i.pointer.interact_pos(),
                pressed: i.pointer.primary_pressed(),
                released: i.pointer.primary_released(),
                secondary: i.pointer.secondary_pressed(),
                escape: i.key_pressed(egui::Key::Escape),
                blocked: false,
            });
            let over_selector = match (self.selector_rect, input.pos) {
                (Some(rect), Some(pos)) => rect.contains(pos),
                _ => false,
            };
            input.blocked = popup_open || over_selector;

            if ctx.input(|i| i.viewport().close_requested()) {
                events.push(OverlayEvent::Cancelled);
            } else if let Some(event) = self.handle_pointer(&input) {
                events.push(event);
            }

            if !over_selector {
                ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
            }
        });
    }

    fn language_selector(&mut self, ui: &mut egui::Ui, events: &mut Vec<OverlayEvent>) {
        let size = selector_size(self.mode);
        let mode = self.mode;
        let mut selected = self.language.clone();

        egui::Frame::popup(ui.style()).show(ui, |ui| {
            ui.set_min_size(size - egui::vec2(16.0, 16.0));
            ui.centered_and_justified(|ui| {
                egui::ComboBox::from_id_source(("language", mode.as_str()))
                    .width(size.x - 32.0)
                    .selected_text(language_label(mode, &selected))
                    .show_ui(ui, |ui| {
                        for option in LanguageSelection::options_for(mode) {
                            let label = language_label(mode, &option);
                            ui.selectable_value(&mut selected, option, label);
                        }
                    });
            });
        });

        if selected != self.language {
            info!("🌐 Idioma do overlay {}: {}", mode.as_str(), selected.code());
            self.language = selected.clone();
            events.push(OverlayEvent::LanguageChanged(selected));
        }
    }

    fn show_status(&mut self, ctx: &egui::Context, status: &str) {
        let size = selector_size(self.mode);
        let x = self.desktop.bounds.x as f32 + self.selector_pos.x;
        let y = self.desktop.bounds.y as f32 + self.selector_pos.y;

        let builder = egui::ViewportBuilder::default()
            .with_title("Click'n'Translate")
            .with_position([x, y])
            .with_inner_size([size.x + 60.0, 40.0])
            .with_decorations(false)
            .with_always_on_top()
            .with_resizable(false)
            .with_taskbar(false);

        ctx.show_viewport_immediate(self.viewport_id("status"), builder, |ctx, _class| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.spinner();
                    ui.label(status);
                });
            });
        });
    }
}

impl pool::Ticketed for CaptureOverlay {
    fn ticket(&self) -> CaptureTicket {
        CaptureOverlay::ticket(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> VirtualDesktop {
        VirtualDesktop::from_displays(vec![
            Display {
                rect: ScreenRect::new(-1920, 0, 1920, 1080),
                scale: 1.0,
            },
            Display {
                rect: ScreenRect::new(0, 0, 2560, 1440),
                scale: 1.0,
            },
        ])
        .unwrap()
    }

    fn active(mode: CaptureMode) -> CaptureOverlay {
        let mut overlay = CaptureOverlay::new(mode, desktop());
        overlay.activate(7, desktop(), &LanguageSelection::Universal, false, Some((100, 100)));
        overlay
    }

    fn at(x: f32, y: f32) -> Option<Pos2> {
        Some(egui::pos2(x, y))
    }

    #[test]
    fn drag_produces_global_rect() {
        let mut overlay = active(CaptureMode::Copy);

        let press = PointerInput {
            pos: at(2020.0, 100.0),
            pressed: true,
            ..Default::default()
        };
        assert_eq!(overlay.handle_pointer(&press), None);

        let release = PointerInput {
            pos: at(2320.0, 180.0),
            released: true,
            ..Default::default()
        };
        assert_eq!(
            overlay.handle_pointer(&release),
            Some(OverlayEvent::Selected(ScreenRect::new(100, 100, 300, 80)))
        );
    }

    #[test]
    fn press_on_selector_does_not_start_a_drag() {
        let mut overlay = active(CaptureMode::Copy);
        let press = PointerInput {
            pos: at(10.0, 10.0),
            pressed: true,
            blocked: true,
            ..Default::default()
        };
        overlay.handle_pointer(&press);
        let release = PointerInput {
            pos: at(50.0, 50.0),
            released: true,
            ..Default::default()
        };
        assert_eq!(overlay.handle_pointer(&release), None);
    }

    #[test]
    fn escape_cancels_and_right_click_exits() {
        let mut overlay = active(CaptureMode::Translate);
        let escape = PointerInput {
            escape: true,
            ..Default::default()
        };
        assert_eq!(overlay.handle_pointer(&escape), Some(OverlayEvent::Cancelled));

        let right = PointerInput {
            secondary: true,
            ..Default::default()
        };
        assert_eq!(overlay.handle_pointer(&right), Some(OverlayEvent::ExitRequested));
    }

    #[test]
    fn input_is_ignored_while_recognizing() {
        let mut overlay = active(CaptureMode::Copy);
        overlay.begin_recognition();
        let escape = PointerInput {
            escape: true,
            ..Default::default()
        };
        assert_eq!(overlay.handle_pointer(&escape), None);

        overlay.set_status("Recognizing…".to_string());
        assert_eq!(
            overlay.phase(),
            &OverlayPhase::Recognizing {
                status: Some("Recognizing…".to_string())
            }
        );
    }

    #[test]
    fn activation_adapts_saved_language_and_places_selector() {
        let overlay = active(CaptureMode::Translate);
        assert_eq!(overlay.language(), &LanguageSelection::english());
        assert_eq!(overlay.ticket().generation, 7);
        // Monitor principal (0..2560) dentro do overlay que começa em -1920
        assert_eq!(overlay.selector_pos, egui::pos2(1920.0 + 1280.0 - 90.0, 50.0));

        let overlay = active(CaptureMode::Copy);
        assert_eq!(overlay.language(), &LanguageSelection::Universal);
    }

    #[test]
    fn labels_per_mode() {
        assert_eq!(language_label(CaptureMode::Copy, &LanguageSelection::Universal), "AUTO");
        assert_eq!(language_label(CaptureMode::Ocr, &LanguageSelection::russian()), "RU");
        assert_eq!(language_label(CaptureMode::Translate, &LanguageSelection::russian()), "RU → EN");
        assert_eq!(language_label(CaptureMode::Translate, &LanguageSelection::english()), "EN → RU");
    }
}
