// clickn-translate/src/overlay/fonts.rs

// ============================================================================
// FONTES DA INTERFACE
// ============================================================================

use eframe::egui;
use std::path::PathBuf;

/// Fontes do sistema com cirílico e setas, em ordem de preferência
const SYSTEM_FONTS: [&str; 3] = ["segoeui.ttf", "arial.ttf", "tahoma.ttf"];

fn fonts_dir() -> PathBuf {
    std::env::var_os("WINDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Windows"))
        .join("Fonts")
}

/// Coloca a primeira fonte do sistema encontrada na frente da fonte padrão
pub fn install_system_font(ctx: &egui::Context) {
    let dir = fonts_dir();
    let found = SYSTEM_FONTS
        .iter()
        .map(|name| dir.join(name))
        .find_map(|path| std::fs::read(&path).ok().map(|data| (path, data)));

    let Some((path, data)) = found else {
        info!("🔤 Fonte do sistema não encontrada, usando a padrão do egui");
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("system".to_owned(), egui::FontData::from_owned(data));
    if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
        family.insert(0, "system".to_owned());
    }

    ctx.set_fonts(fonts);
    info!("🔤 Fonte da interface: {}", path.display());
}
