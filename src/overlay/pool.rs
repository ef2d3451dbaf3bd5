// clickn-translate/src/overlay/pool.rs

// ============================================================================
// POOL DE OVERLAYS - Um pré-aquecido e no máximo um ativo por modo
// ============================================================================

use std::collections::HashMap;

use crate::app_state::{CaptureMode, CaptureTicket};

/// Overlay que sabe qual captura está mostrando
pub trait Ticketed {
    fn ticket(&self) -> CaptureTicket;
}

/// Estado do modo no pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    PreWarmed,
    Active,
}

/// Resultado de um toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// O overlay do modo foi aberto
    Opened,
    /// O overlay já estava visível e foi fechado
    Cancelled,
}

/// Overlays prontos e ativos, por modo
pub struct OverlayPool<T> {
    warm: HashMap<CaptureMode, T>,
    active: HashMap<CaptureMode, T>,
}

impl<T> Default for OverlayPool<T> {
    fn default() -> Self {
        OverlayPool {
            warm: HashMap::new(),
            active: HashMap::new(),
        }
    }
}

impl<T> OverlayPool<T> {
    /// Prepara um overlay escondido para o modo (se ainda não houver)
    pub fn prewarm(&mut self, mode: CaptureMode, create: impl FnOnce(CaptureMode) -> T) {
        if !self.warm.contains_key(&mode) {
            debug!("Pré-aquecendo overlay {}", mode.as_str());
            self.warm.insert(mode, create(mode));
        }
    }

    /// Abre o overlay do modo, ou fecha se ele já estiver visível
    ///
    /// # Argumentos
    /// * `mode` - Modo acionado pela hotkey/bandeja
    /// * `create` - Cria um overlay novo quando não há um pré-aquecido
    /// * `activate` - Prepara o overlay para aparecer (posição, idioma...)
    pub fn toggle(
        &mut self,
        mode: CaptureMode,
        create: impl Fn(CaptureMode) -> T,
        activate: impl FnOnce(&mut T),
    ) -> Toggle {
        if self.active.contains_key(&mode) {
            self.close(mode, create);
            info!("❌ Overlay {} cancelado", mode.as_str());
            return Toggle::Cancelled;
        }

        let mut overlay = match self.warm.remove(&mode) {
            Some(overlay) => overlay,
            None => create(mode),
        };
        activate(&mut overlay);
        self.active.insert(mode, overlay);
        Toggle::Opened
    }

    /// Fecha o overlay ativo e deixa outro pré-aquecido no lugar
    pub fn close(&mut self, mode: CaptureMode, create: impl FnOnce(CaptureMode) -> T) -> Option<T> {
        let closed = self.active.remove(&mode);
        if closed.is_some() {
            self.prewarm(mode, create);
        }
        closed
    }

    pub fn state(&self, mode: CaptureMode) -> SlotState {
        if self.active.contains_key(&mode) {
            SlotState::Active
        } else if self.warm.contains_key(&mode) {
            SlotState::PreWarmed
        } else {
            SlotState::Empty
        }
    }

    pub fn active(&self, mode: CaptureMode) -> Option<&T> {
        self.active.get(&mode)
    }

    pub fn active_mut(&mut self, mode: CaptureMode) -> Option<&mut T> {
        self.active.get_mut(&mode)
    }

    /// Modos com overlay ativo, em ordem fixa
    pub fn active_modes(&self) -> Vec<CaptureMode> {
        CaptureMode::ALL
            .into_iter()
            .filter(|mode| self.active.contains_key(mode))
            .collect()
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }
}

impl<T: Ticketed> OverlayPool<T> {
    /// Se o resultado da captura ainda pertence ao overlay visível
    ///
    /// Falso quando o overlay foi cancelado ou reaberto (geração nova)
    /// depois que a captura começou.
    pub fn owns(&self, ticket: &CaptureTicket) -> bool {
        self.active(ticket.mode).is_some_and(|overlay| overlay.ticket() == *ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn second_toggle_cancels() {
        let mut pool: OverlayPool<u32> = OverlayPool::default();
        let mut activations = 0;

        assert_eq!(pool.toggle(CaptureMode::Copy, |_| 1, |_| activations += 1), Toggle::Opened);
        assert_eq!(pool.state(CaptureMode::Copy), SlotState::Active);

        assert_eq!(pool.toggle(CaptureMode::Copy, |_| 1, |_| activations += 1), Toggle::Cancelled);
        assert_eq!(pool.state(CaptureMode::Copy), SlotState::PreWarmed);
        assert_eq!(activations, 1);
        assert!(!pool.has_active());
    }

    #[test]
    fn prewarmed_instance_is_reused() {
        let created = Cell::new(0);
        let create = |_| {
            created.set(created.get() + 1);
            created.get()
        };
        let mut pool = OverlayPool::default();

        pool.prewarm(CaptureMode::Translate, create);
        pool.prewarm(CaptureMode::Translate, create);
        assert_eq!(created.get(), 1);

        pool.toggle(CaptureMode::Translate, create, |_| {});
        assert_eq!(created.get(), 1);
        assert_eq!(pool.active(CaptureMode::Translate), Some(&1));
    }

    /// Overlay falso que guarda a geração recebida na ativação
    struct Stub(CaptureTicket);

    impl Ticketed for Stub {
        fn ticket(&self) -> CaptureTicket {
            self.0
        }
    }

    fn stub(mode: CaptureMode) -> Stub {
        Stub(CaptureTicket { mode, generation: 0 })
    }

    fn open(pool: &mut OverlayPool<Stub>, mode: CaptureMode, generation: u64) -> CaptureTicket {
        pool.toggle(mode, stub, |overlay| overlay.0.generation = generation);
        CaptureTicket { mode, generation }
    }

    #[test]
    fn cancelled_capture_loses_its_result() {
        let mut pool = OverlayPool::default();
        let ticket = open(&mut pool, CaptureMode::Copy, 1);
        assert!(pool.owns(&ticket));

        assert_eq!(pool.toggle(CaptureMode::Copy, stub, |_| {}), Toggle::Cancelled);

        assert!(!pool.owns(&ticket));
    }

    #[test]
    fn reopened_overlay_only_accepts_its_own_generation() {
        let mut pool = OverlayPool::default();
        let old = open(&mut pool, CaptureMode::Translate, 1);
        pool.toggle(CaptureMode::Translate, stub, |_| {});
        let new = open(&mut pool, CaptureMode::Translate, 2);

        assert!(pool.owns(&new));
        assert!(!pool.owns(&old));
        assert!(!pool.owns(&CaptureTicket {
            mode: CaptureMode::Copy,
            generation: 2,
        }));
    }

    #[test]
    fn modes_are_independent() {
        let mut pool: OverlayPool<&str> = OverlayPool::default();
        pool.toggle(CaptureMode::Copy, |_| "copy", |_| {});
        pool.toggle(CaptureMode::Translate, |_| "translate", |_| {});
        assert_eq!(pool.active_modes(), vec![CaptureMode::Copy, CaptureMode::Translate]);

        assert_eq!(pool.close(CaptureMode::Copy, |_| "copy"), Some("copy"));
        assert_eq!(pool.active_modes(), vec![CaptureMode::Translate]);
        assert_eq!(pool.close(CaptureMode::Copy, |_| "copy"), None);
    }
}
