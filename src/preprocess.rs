// clickn-translate/src/preprocess.rs

// ============================================================================
// MÓDULO PREPROCESS - Normalização da imagem antes do OCR
// ============================================================================
//
// Sequência:
// 1. Padding quando a captura é pequena demais
// 2. Upscale para o texto ficar perto da altura-alvo
// 3. Escala de cinza, contraste e nitidez
// 4. Borda branca
// 5. Binarização (só imagens pequenas)
//
// A imagem original é mantida junto para o fallback offline.
//
// ============================================================================

use image::{imageops, DynamicImage, GrayImage, Luma, RgbaImage};

use crate::config::PreprocessConfig;

/// Resultado do pré-processamento
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Captura sem alterações
    pub original: DynamicImage,
    /// Imagem normalizada para o OCR nativo
    pub normalized: DynamicImage,
    /// Fator de escala aplicado (1.0 = sem upscale)
    pub scale: f32,
}

/// Estima a altura do texto a partir da menor dimensão da imagem
pub fn estimate_text_height(min_dimension: u32, config: &PreprocessConfig) -> f32 {
    config
        .text_height_steps
        .iter()
        .find(|(limit, _)| min_dimension < *limit)
        .map(|(_, height)| *height)
        .unwrap_or(config.text_height_fallback)
}

/// Fator de escala para levar o texto à altura-alvo
pub fn scale_factor(min_dimension: u32, config: &PreprocessConfig) -> f32 {
    let estimated = estimate_text_height(min_dimension, config);
    (config.target_text_height / estimated).clamp(config.min_scale, config.max_scale)
}

/// Expande imagens pequenas com a cor do pixel (0, 0)
fn pad_small(image: RgbaImage, config: &PreprocessConfig) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w >= config.min_side && h >= config.min_side {
        return image;
    }

    let new_w = (w + config.pad * 2).max(config.pad_floor);
    let new_h = (h + config.pad * 2).max(config.pad_floor);
    let fill = *image.get_pixel(0, 0);

    let mut canvas = RgbaImage::from_pixel(new_w, new_h, fill);
    imageops::replace(&mut canvas, &image, config.pad as i64, config.pad as i64);
    debug!("   📐 Padding: {}x{} → {}x{}", w, h, new_w, new_h);
    canvas
}

/// Contraste: interpola entre a média de luminância e a imagem
fn enhance_contrast(gray: &GrayImage, factor: f32) -> GrayImage {
    let count = (gray.width() as u64 * gray.height() as u64).max(1);
    let sum: u64 = gray.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f32 / count as f32 + 0.5).floor();

    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        let value = mean + factor * (pixel[0] as f32 - mean);
        pixel[0] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Nitidez: interpola entre uma versão suavizada e a imagem
///
/// Suavização 3x3 com peso 5 no centro e 1 nos vizinhos (soma 13).
/// A borda de 1 pixel fica inalterada.
fn enhance_sharpness(gray: &GrayImage, factor: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut out = gray.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = 0u32;
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5 } else { 1 };
                    acc += weight * gray.get_pixel(x + dx - 1, y + dy - 1)[0] as u32;
                }
            }
            let smooth = acc as f32 / 13.0;
            let value = smooth + factor * (gray.get_pixel(x, y)[0] as f32 - smooth);
            out.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

fn add_border(gray: &GrayImage, border: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut canvas = GrayImage::from_pixel(w + border * 2, h + border * 2, Luma([255]));
    imageops::replace(&mut canvas, gray, border as i64, border as i64);
    canvas
}

fn binarize(gray: &mut GrayImage, threshold: u8) {
    for pixel in gray.pixels_mut() {
        pixel[0] = if pixel[0] < threshold { 0 } else { 255 };
    }
}

/// Normaliza a captura para o OCR
///
/// # Argumentos
/// * `image` - Captura da região selecionada
/// * `config` - Constantes do pré-processamento
///
/// # Retorna
/// * `PreparedImage` com a original e a versão normalizada
pub fn prepare(image: RgbaImage, config: &PreprocessConfig) -> PreparedImage {
    let original = DynamicImage::ImageRgba8(image.clone());

    let padded = pad_small(image, config);
    let (w, h) = padded.dimensions();
    let min_dimension = w.min(h);
    let scale = scale_factor(min_dimension, config);

    let scaled = if scale > 1.0 {
        let new_w = ((w as f32 * scale) as u32).max(1);
        let new_h = ((h as f32 * scale) as u32).max(1);
        debug!("   🔍 Upscale: {}x{} → {}x{} (fator {:.2}x)", w, h, new_w, new_h, scale);
        imageops::resize(&padded, new_w, new_h, imageops::FilterType::Lanczos3)
    } else {
        padded
    };

    let gray = DynamicImage::ImageRgba8(scaled).to_luma8();
    let gray = enhance_contrast(&gray, config.contrast);
    let gray = enhance_sharpness(&gray, config.sharpness);
    let mut gray = add_border(&gray, config.border);

    if min_dimension < config.binarize_below {
        binarize(&mut gray, config.threshold);
    }

    info!(
        "🧼 Pré-processamento: {}x{} → {}x{} (escala {:.2})",
        original.width(),
        original.height(),
        gray.width(),
        gray.height(),
        scale
    );

    PreparedImage {
        original,
        normalized: DynamicImage::ImageLuma8(gray),
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn small_capture_is_padded_to_floor_before_scaling() {
        let config = PreprocessConfig::default();
        let prepared = prepare(white(30, 20), &config);

        // 30x20 → 80x80 → escala 2.5 → 200x200 + borda de 20
        assert_eq!(prepared.scale, 2.5);
        assert_eq!(prepared.normalized.width(), 240);
        assert_eq!(prepared.normalized.height(), 240);
        assert_eq!(prepared.original.width(), 30);
    }

    #[test]
    fn padding_uses_top_left_pixel_color() {
        let mut image = white(10, 10);
        image.put_pixel(0, 0, Rgba([7, 7, 7, 255]));
        let padded = pad_small(image, &PreprocessConfig::default());

        assert_eq!(padded.dimensions(), (80, 80));
        assert_eq!(padded.get_pixel(79, 79)[0], 7);
        assert_eq!(padded.get_pixel(9, 9)[0], 255);
    }

    #[test]
    fn text_height_estimate_follows_steps() {
        let config = PreprocessConfig::default();
        assert_eq!(estimate_text_height(24, &config), 8.0);
        assert_eq!(estimate_text_height(80, &config), 18.0);
        assert_eq!(estimate_text_height(149, &config), 25.0);
        assert_eq!(estimate_text_height(150, &config), 30.0);
    }

    #[test]
    fn scale_is_clamped() {
        let config = PreprocessConfig {
            target_text_height: 200.0,
            ..PreprocessConfig::default()
        };
        assert_eq!(scale_factor(10, &config), 10.0);

        let config = PreprocessConfig {
            target_text_height: 10.0,
            ..PreprocessConfig::default()
        };
        assert_eq!(scale_factor(1000, &config), 1.0);
    }

    #[test]
    fn large_capture_is_not_binarized() {
        let image = RgbaImage::from_pixel(200, 200, Rgba([120, 120, 120, 255]));
        let prepared = prepare(image, &PreprocessConfig::default());
        let gray = prepared.normalized.to_luma8();

        let has_mid_tone = gray.pixels().any(|p| p[0] > 0 && p[0] < 255);
        assert!(has_mid_tone);
    }

    #[test]
    fn small_capture_is_binarized() {
        let mut image = white(300, 80);
        for x in 20..280 {
            for y in 30..50 {
                image.put_pixel(x, y, Rgba([40, 40, 40, 255]));
            }
        }
        let prepared = prepare(image, &PreprocessConfig::default());
        let gray = prepared.normalized.to_luma8();

        assert_eq!(prepared.scale, 2.5);
        assert_eq!(gray.dimensions(), (750 + 40, 200 + 40));
        assert!(gray.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert!(gray.pixels().any(|p| p[0] == 0));
    }

    #[test]
    fn contrast_pushes_values_away_from_mean() {
        let mut gray = GrayImage::from_pixel(2, 1, Luma([100]));
        gray.put_pixel(1, 0, Luma([200]));
        let out = enhance_contrast(&gray, 2.0);
        // média 150: 100 → 50, 200 → 250
        assert_eq!(out.get_pixel(0, 0)[0], 50);
        assert_eq!(out.get_pixel(1, 0)[0], 250);
    }
}
