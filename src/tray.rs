// clickn-translate/src/tray.rs

// ============================================================================
// MÓDULO TRAY - Ícone na bandeja do sistema
// ============================================================================
// Menu: OCR / Copiar texto / Traduzir / Sair
// Os cliques viram AppCommand e seguem pelo mesmo canal das hotkeys.
// ============================================================================

use crate::app_state::UiDispatcher;
use crate::i18n::Strings;

#[cfg_attr(not(windows), allow(dead_code))]
const ICON_SIZE: u32 = 32;

#[cfg_attr(not(windows), allow(dead_code))]
/// Ícone 32x32: quadrado azul com um "T" branco
fn icon_rgba() -> Vec<u8> {
    let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let border = x < 2 || y < 2 || x >= ICON_SIZE - 2 || y >= ICON_SIZE - 2;
            let bar = (7..11).contains(&y) && (7..25).contains(&x);
            let stem = (11..26).contains(&y) && (14..18).contains(&x);
            let pixel = if bar || stem {
                [255, 255, 255, 255]
            } else if border {
                [40, 90, 170, 255]
            } else {
                [80, 160, 255, 255]
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    rgba
}

#[cfg(windows)]
pub struct Tray {
    _icon: tray_icon::TrayIcon,
}

#[cfg(windows)]
impl Tray {
    /// Cria o ícone e liga o menu ao dispatcher
    ///
    /// Precisa rodar na thread da UI (a que tem o loop de eventos).
    pub fn start(strings: &Strings, dispatcher: UiDispatcher) -> anyhow::Result<Self> {
        use crate::app_state::{AppCommand, CaptureMode};
        use anyhow::Context;
        use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
        use tray_icon::{Icon, TrayIconBuilder};

        let ocr = MenuItem::new(strings.tray_ocr, true, None);
        let copy = MenuItem::new(strings.tray_copy, true, None);
        let translate = MenuItem::new(strings.tray_translate, true, None);
        let exit = MenuItem::new(strings.tray_exit, true, None);

        let menu = Menu::new();
        menu.append_items(&[&ocr, &copy, &translate, &PredefinedMenuItem::separator(), &exit])
            .context("Falha ao montar o menu da bandeja")?;

        let routes = vec![
            (ocr.id().clone(), AppCommand::ToggleCapture(CaptureMode::Ocr)),
            (copy.id().clone(), AppCommand::ToggleCapture(CaptureMode::Copy)),
            (translate.id().clone(), AppCommand::ToggleCapture(CaptureMode::Translate)),
            (exit.id().clone(), AppCommand::Exit),
        ];

        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            if let Some((_, command)) = routes.iter().find(|(id, _)| *id == event.id) {
                debug!("Menu da bandeja: {:?}", command);
                dispatcher.send_command(command.clone());
            }
        }));

        let icon = Icon::from_rgba(icon_rgba(), ICON_SIZE, ICON_SIZE).context("Ícone inválido")?;
        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip("Click'n'Translate")
            .with_icon(icon)
            .build()
            .context("Falha ao criar o ícone da bandeja")?;

        info!("📌 Ícone da bandeja criado");
        Ok(Tray { _icon: tray })
    }
}

#[cfg(not(windows))]
pub struct Tray;

#[cfg(not(windows))]
impl Tray {
    pub fn start(_strings: &Strings, _dispatcher: UiDispatcher) -> anyhow::Result<Self> {
        debug!("Bandeja do sistema disponível só no Windows");
        Ok(Tray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_buffer_matches_size() {
        let rgba = icon_rgba();
        assert_eq!(rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
        // Canto é borda, centro da barra do "T" é branco
        assert_eq!(&rgba[0..4], &[40, 90, 170, 255]);
        let center = ((8 * ICON_SIZE + 16) * 4) as usize;
        assert_eq!(&rgba[center..center + 4], &[255, 255, 255, 255]);
    }
}
