// clickn-translate/src/screenshot.rs

// ============================================================================
// MÓDULO SCREENSHOT - Rasterização de uma região da área de trabalho
// ============================================================================
//
// As coordenadas de tela seguem o espaço da área de trabalho virtual (a
// união de todos os monitores, podendo ter origem negativa). A região
// selecionada pode cruzar vários monitores: cada monitor captura sua
// parte e as partes são montadas num único bitmap.
//
// ============================================================================

use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

/// Erros de captura
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("região vazia")]
    EmptyRegion,
    #[error("nenhum monitor cobre a região")]
    NoDisplay,
    #[error("captura de tela não suportada nesta plataforma")]
    Unsupported,
    #[error("falha ao capturar a tela: {0}")]
    Grab(String),
}

// ============================================================================
// GEOMETRIA
// ============================================================================

/// Retângulo em coordenadas da área de trabalho
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        ScreenRect {
            x,
            y,
            width,
            height,
        }
    }

    /// Retângulo entre dois cantos quaisquer (ordem não importa)
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        ScreenRect {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: a.0.abs_diff(b.0),
            height: a.1.abs_diff(b.1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(&self, point: (i32, i32)) -> bool {
        point.0 >= self.x && point.0 < self.right() && point.1 >= self.y && point.1 < self.bottom()
    }

    pub fn intersect(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(ScreenRect::new(left, top, (right - left) as u32, (bottom - top) as u32))
    }

    /// Menor retângulo que contém os dois
    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        ScreenRect::new(left, top, (right - left) as u32, (bottom - top) as u32)
    }
}

/// Um monitor da área de trabalho
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Display {
    pub rect: ScreenRect,
    /// Pixels físicos por unidade de coordenada
    pub scale: f32,
}

/// União de todos os monitores
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualDesktop {
    pub bounds: ScreenRect,
    pub displays: Vec<Display>,
}

impl VirtualDesktop {
    pub fn from_displays(displays: Vec<Display>) -> Option<Self> {
        let first = displays.first()?.rect;
        let bounds = displays.iter().fold(first, |acc, d| acc.union(&d.rect));
        Some(VirtualDesktop { bounds, displays })
    }

    /// Monitor sob o ponto (ou o primeiro, se o ponto estiver fora de todos)
    pub fn display_at(&self, point: Option<(i32, i32)>) -> Display {
        point
            .and_then(|p| self.displays.iter().find(|d| d.rect.contains(p)))
            .or_else(|| self.displays.first())
            .copied()
            .unwrap_or(Display {
                rect: self.bounds,
                scale: 1.0,
            })
    }

    /// Posição do seletor de idioma, relativa à origem do overlay
    ///
    /// Centralizado horizontalmente no monitor do cursor, 50 unidades
    /// abaixo do topo desse monitor.
    pub fn selector_position(&self, cursor: Option<(i32, i32)>, widget_width: f32) -> (f32, f32) {
        let display = self.display_at(cursor).rect;
        let center_x = display.x as f32 + display.width as f32 / 2.0;
        let x = center_x - self.bounds.x as f32 - widget_width / 2.0;
        let y = (display.y - self.bounds.y) as f32 + 50.0;
        (x, y)
    }
}

/// Lista os monitores conectados
#[cfg(windows)]
pub fn virtual_desktop() -> Result<VirtualDesktop, CaptureError> {
    let screens = screenshots::Screen::all().map_err(|e| CaptureError::Grab(e.to_string()))?;
    let displays = screens
        .iter()
        .map(|screen| {
            let info = screen.display_info;
            Display {
                rect: ScreenRect::new(info.x, info.y, info.width, info.height),
                scale: info.scale_factor,
            }
        })
        .collect();
    VirtualDesktop::from_displays(displays).ok_or(CaptureError::NoDisplay)
}

#[cfg(not(windows))]
pub fn virtual_desktop() -> Result<VirtualDesktop, CaptureError> {
    Err(CaptureError::Unsupported)
}

// ============================================================================
// RASTERIZAÇÃO
// ============================================================================

/// Captura uma região da tela como bitmap
pub trait Rasterizer: Send + Sync {
    fn capture(&self, rect: ScreenRect) -> Result<RgbaImage, CaptureError>;
}

/// Parte da região capturada por um monitor
pub struct Tile {
    /// Parte da região coberta pelo monitor
    pub rect: ScreenRect,
    pub image: RgbaImage,
}

/// Monta as partes num bitmap do tamanho da região
///
/// # Argumentos
/// * `rect` - Região completa
/// * `scale` - Pixels por unidade do bitmap final
/// * `tiles` - Partes capturadas (redimensionadas se a escala diferir)
///
/// Áreas sem monitor ficam pretas.
pub fn compose(rect: ScreenRect, scale: f32, tiles: &[Tile]) -> RgbaImage {
    let to_px = |units: u32| ((units as f32 * scale).round() as u32).max(1);
    let mut canvas = RgbaImage::from_pixel(
        to_px(rect.width),
        to_px(rect.height),
        Rgba([0, 0, 0, 255]),
    );

    for tile in tiles {
        let target_w = to_px(tile.rect.width);
        let target_h = to_px(tile.rect.height);
        let offset_x = ((tile.rect.x - rect.x) as f32 * scale).round() as i64;
        let offset_y = ((tile.rect.y - rect.y) as f32 * scale).round() as i64;

        if tile.image.dimensions() == (target_w, target_h) {
            imageops::replace(&mut canvas, &tile.image, offset_x, offset_y);
        } else {
            let resized = imageops::resize(
                &tile.image,
                target_w,
                target_h,
                imageops::FilterType::Triangle,
            );
            imageops::replace(&mut canvas, &resized, offset_x, offset_y);
        }
    }

    canvas
}

/// Rasterizador que usa o crate `screenshots`
pub struct ScreenRasterizer;

#[cfg(windows)]
impl Rasterizer for ScreenRasterizer {
    fn capture(&self, rect: ScreenRect) -> Result<RgbaImage, CaptureError> {
        if rect.is_empty() {
            return Err(CaptureError::EmptyRegion);
        }

        info!("📸 Capturando região...");
        info!("   Posição: ({}, {})", rect.x, rect.y);
        info!("   Tamanho: {}x{}", rect.width, rect.height);

        let screens = screenshots::Screen::all().map_err(|e| CaptureError::Grab(e.to_string()))?;

        let mut tiles = Vec::new();
        let mut scale: Option<f32> = None;

        for screen in &screens {
            let info = screen.display_info;
            let display_rect = ScreenRect::new(info.x, info.y, info.width, info.height);
            let Some(part) = rect.intersect(&display_rect) else {
                continue;
            };

            let buffer = screen
                .capture_area(part.x - info.x, part.y - info.y, part.width, part.height)
                .map_err(|e| CaptureError::Grab(e.to_string()))?;

            scale.get_or_insert(info.scale_factor);
            tiles.push(Tile {
                rect: part,
                image: buffer_to_image(&buffer)?,
            });
        }

        let scale = scale.ok_or(CaptureError::NoDisplay)?;
        let image = compose(rect, scale, &tiles);

        info!(
            "✅ Região capturada: {}x{} ({} monitor(es))",
            image.width(),
            image.height(),
            tiles.len()
        );
        Ok(image)
    }
}

#[cfg(not(windows))]
impl Rasterizer for ScreenRasterizer {
    fn capture(&self, rect: ScreenRect) -> Result<RgbaImage, CaptureError> {
        if rect.is_empty() {
            return Err(CaptureError::EmptyRegion);
        }
        Err(CaptureError::Unsupported)
    }
}

/// Converte o buffer da screenshot para RgbaImage
#[cfg(windows)]
fn buffer_to_image(buffer: &screenshots::Image) -> Result<RgbaImage, CaptureError> {
    RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.rgba().to_vec())
        .ok_or_else(|| CaptureError::Grab("buffer com tamanho inválido".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([value, value, value, 255]))
    }

    fn display(x: i32, y: i32, width: u32, height: u32) -> Display {
        Display {
            rect: ScreenRect::new(x, y, width, height),
            scale: 1.0,
        }
    }

    fn tile(rect: ScreenRect, value: u8) -> Tile {
        Tile {
            rect,
            image: solid(rect.width, rect.height, value),
        }
    }

    #[test]
    fn corners_are_normalized_in_any_drag_direction() {
        let forward = ScreenRect::from_corners((10, 20), (110, 70));
        let backward = ScreenRect::from_corners((110, 70), (10, 20));
        let mixed = ScreenRect::from_corners((110, 20), (10, 70));
        assert_eq!(forward, ScreenRect::new(10, 20, 100, 50));
        assert_eq!(forward, backward);
        assert_eq!(forward, mixed);
    }

    #[test]
    fn same_point_gives_empty_rect() {
        assert!(ScreenRect::from_corners((5, 5), (5, 5)).is_empty());
    }

    #[test]
    fn desktop_bounds_cover_negative_origin() {
        let desktop = VirtualDesktop::from_displays(vec![
            display(0, 0, 1920, 1080),
            display(-1280, 0, 1280, 1024),
        ])
        .unwrap();
        assert_eq!(desktop.bounds, ScreenRect::new(-1280, 0, 3200, 1080));
    }

    #[test]
    fn selector_sits_under_cursor_display() {
        let desktop = VirtualDesktop::from_displays(vec![
            display(0, 0, 1920, 1080),
            display(-1280, 0, 1280, 1024),
        ])
        .unwrap();

        // Cursor no monitor da esquerda: centro em -640, origem em -1280
        let (x, y) = desktop.selector_position(Some((-100, 300)), 160.0);
        assert_eq!((x, y), (640.0 - 80.0, 50.0));

        // Cursor fora de tudo: primeiro monitor
        let (x, _) = desktop.selector_position(None, 180.0);
        assert_eq!(x, 1280.0 + 960.0 - 90.0);
    }

    #[test]
    fn compose_stitches_tiles_across_displays() {
        let rect = ScreenRect::new(-10, 0, 20, 5);
        let tiles = [
            tile(ScreenRect::new(-10, 0, 10, 5), 50),
            tile(ScreenRect::new(0, 0, 10, 5), 200),
        ];

        let image = compose(rect, 1.0, &tiles);

        assert_eq!(image.dimensions(), (20, 5));
        assert_eq!(image.get_pixel(0, 0)[0], 50);
        assert_eq!(image.get_pixel(19, 4)[0], 200);
    }

    #[test]
    fn compose_rescales_tiles_to_canvas_scale() {
        let rect = ScreenRect::new(0, 0, 10, 10);
        let tiles = [tile(rect, 90)];

        let image = compose(rect, 2.0, &tiles);

        assert_eq!(image.dimensions(), (20, 20));
        assert_eq!(image.get_pixel(10, 10)[0], 90);
    }

    #[test]
    fn empty_region_is_rejected() {
        let result = ScreenRasterizer.capture(ScreenRect::new(0, 0, 0, 10));
        assert!(matches!(result, Err(CaptureError::EmptyRegion)));
    }
}
