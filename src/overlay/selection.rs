// clickn-translate/src/overlay/selection.rs

// ============================================================================
// SELEÇÃO - Arrasto do mouse, conversão de coordenadas e desenho
// ============================================================================

use eframe::egui::{self, Color32, Pos2, Rect, Stroke};

use crate::screenshot::ScreenRect;

/// Escurecimento fora da seleção
pub const DIM_COLOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 150);

/// Fundo quase transparente quando o escurecimento está desligado
/// (a janela ainda precisa receber os cliques)
pub const NO_DIM_COLOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 5);

/// Interior da seleção com o escurecimento desligado
pub const NO_DIM_SELECTION: Color32 = Color32::from_rgba_premultiplied(30, 30, 30, 30);

const GLOW: Color32 = Color32::from_rgba_premultiplied(19, 38, 60, 60);
const FRAME: Color32 = Color32::from_rgb(80, 160, 255);
const INNER: Color32 = Color32::from_rgba_premultiplied(78, 90, 100, 100);

// ============================================================================
// ARRASTO
// ============================================================================

/// Estado do arrasto, em coordenadas locais do overlay
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DragState {
    start: Option<Pos2>,
    current: Option<Pos2>,
}

impl DragState {
    pub fn press(&mut self, pos: Pos2) {
        self.start = Some(pos);
        self.current = Some(pos);
    }

    pub fn motion(&mut self, pos: Pos2) {
        if self.start.is_some() {
            self.current = Some(pos);
        }
    }

    /// Finaliza o arrasto e devolve o retângulo normalizado
    pub fn release(&mut self, pos: Pos2) -> Option<Rect> {
        self.motion(pos);
        let rect = self.rect();
        self.reset();
        rect
    }

    pub fn current(&self) -> Option<Pos2> {
        self.current
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Retângulo atual (largura/altura nunca negativas)
    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::from_two_pos(self.start?, self.current?))
    }

    pub fn reset(&mut self) {
        *self = DragState::default();
    }
}

/// Converte a seleção local em retângulo global da área de trabalho
///
/// # Argumentos
/// * `local` - Retângulo relativo ao canto do overlay
/// * `origin` - Posição global do canto do overlay (pode ser negativa)
pub fn to_global(local: Rect, origin: (i32, i32)) -> ScreenRect {
    let corner = |p: Pos2| (origin.0 + p.x.round() as i32, origin.1 + p.y.round() as i32);
    ScreenRect::from_corners(corner(local.min), corner(local.max))
}

// ============================================================================
// DESENHO
// ============================================================================

/// As quatro faixas escurecidas ao redor do furo (cima, baixo, esquerda, direita)
pub fn dim_rects(surface: Rect, hole: Rect) -> [Rect; 4] {
    let hole = hole.intersect(surface);
    [
        Rect::from_min_max(surface.min, egui::pos2(surface.max.x, hole.min.y)),
        Rect::from_min_max(egui::pos2(surface.min.x, hole.max.y), surface.max),
        Rect::from_min_max(egui::pos2(surface.min.x, hole.min.y), egui::pos2(hole.min.x, hole.max.y)),
        Rect::from_min_max(egui::pos2(hole.max.x, hole.min.y), egui::pos2(surface.max.x, hole.max.y)),
    ]
}

/// Pinta o fundo e a seleção do frame atual
pub fn paint(painter: &egui::Painter, surface: Rect, selection: Option<Rect>, no_dimming: bool) {
    let fill = if no_dimming { NO_DIM_COLOR } else { DIM_COLOR };

    let Some(selection) = selection else {
        painter.rect_filled(surface, 0.0, fill);
        return;
    };

    if no_dimming {
        painter.rect_filled(surface, 0.0, fill);
        painter.rect_filled(selection, 0.0, NO_DIM_SELECTION);
    } else {
        for band in dim_rects(surface, selection) {
            if band.is_positive() {
                painter.rect_filled(band, 0.0, fill);
            }
        }
    }

    // Brilho externo, borda principal e realce interno
    painter.rect_stroke(selection.expand(2.0), 0.0, Stroke::new(5.0, GLOW));
    painter.rect_stroke(selection, 0.0, Stroke::new(1.0, FRAME));
    if selection.width() > 2.0 && selection.height() > 2.0 {
        painter.rect_stroke(selection.shrink(1.0), 0.0, Stroke::new(1.0, INNER));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_drag_direction_normalizes() {
        let mut drag = DragState::default();
        drag.press(egui::pos2(200.0, 150.0));
        drag.motion(egui::pos2(120.0, 300.0));
        let rect = drag.release(egui::pos2(50.0, 100.0)).unwrap();

        assert_eq!(rect.min, egui::pos2(50.0, 100.0));
        assert_eq!(rect.max, egui::pos2(200.0, 150.0));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn click_without_motion_is_empty() {
        let mut drag = DragState::default();
        drag.press(egui::pos2(10.0, 10.0));
        let rect = drag.release(egui::pos2(10.0, 10.0)).unwrap();
        assert!(to_global(rect, (0, 0)).is_empty());
    }

    #[test]
    fn motion_before_press_is_ignored() {
        let mut drag = DragState::default();
        drag.motion(egui::pos2(10.0, 10.0));
        assert_eq!(drag.rect(), None);
    }

    #[test]
    fn negative_origin_is_added() {
        // Overlay começa num monitor à esquerda do principal
        let local = Rect::from_min_max(egui::pos2(1900.0, 20.0), egui::pos2(2020.0, 60.0));
        let global = to_global(local, (-1920, 0));
        assert_eq!(global, ScreenRect::new(-20, 20, 120, 40));
    }

    #[test]
    fn dim_bands_surround_the_hole() {
        let surface = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 100.0));
        let hole = Rect::from_min_max(egui::pos2(20.0, 30.0), egui::pos2(60.0, 70.0));
        let [top, bottom, left, right] = dim_rects(surface, hole);

        assert_eq!(top, Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 30.0)));
        assert_eq!(bottom, Rect::from_min_max(egui::pos2(0.0, 70.0), egui::pos2(100.0, 100.0)));
        assert_eq!(left, Rect::from_min_max(egui::pos2(0.0, 30.0), egui::pos2(20.0, 70.0)));
        assert_eq!(right, Rect::from_min_max(egui::pos2(60.0, 30.0), egui::pos2(100.0, 70.0)));

        let covered: f32 = [top, bottom, left, right].iter().map(|r| r.area()).sum();
        assert_eq!(covered + hole.area(), surface.area());
    }
}
