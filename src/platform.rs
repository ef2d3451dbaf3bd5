// clickn-translate/src/platform.rs

// ============================================================================
// MÓDULO PLATFORM - Chamadas diretas à API do Windows
// ============================================================================

pub mod windows;
