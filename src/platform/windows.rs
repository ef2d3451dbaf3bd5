// clickn-translate/src/platform/windows.rs

// ============================================================================
// CURSOR E DPI (WINDOWS)
// ============================================================================

/// Marca o processo como DPI-aware por monitor
///
/// Precisa rodar antes de criar qualquer janela, senão as coordenadas
/// dos monitores chegam escaladas pelo Windows.
#[cfg(windows)]
pub fn enable_dpi_awareness() {
    use winapi::shared::winerror::{E_ACCESSDENIED, S_OK};
    use winapi::um::shellscalingapi::{SetProcessDpiAwareness, PROCESS_PER_MONITOR_DPI_AWARE};

    let result = unsafe { SetProcessDpiAwareness(PROCESS_PER_MONITOR_DPI_AWARE) };
    match result {
        S_OK => debug!("DPI awareness: por monitor"),
        // Já definido (manifesto ou chamada anterior)
        E_ACCESSDENIED => debug!("DPI awareness já definido"),
        other => warn!("⚠️  SetProcessDpiAwareness falhou: 0x{:08X}", other),
    }
}

#[cfg(not(windows))]
pub fn enable_dpi_awareness() {}

/// Posição global do cursor
#[cfg(windows)]
pub fn cursor_position() -> Option<(i32, i32)> {
    use winapi::shared::windef::POINT;
    use winapi::um::winuser::GetCursorPos;

    let mut point = POINT { x: 0, y: 0 };
    if unsafe { GetCursorPos(&mut point) } == 0 {
        trace!("GetCursorPos falhou");
        return None;
    }
    Some((point.x, point.y))
}

#[cfg(not(windows))]
pub fn cursor_position() -> Option<(i32, i32)> {
    None
}
