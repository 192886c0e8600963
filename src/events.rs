use crate::backend::DispatchError;
use uuid::Uuid;

/// Terminal events multiplexed into the main loop
#[derive(Debug)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Terminal resize
    Resize(u16, u16),

    /// Periodic tick driving animations (scroll easing)
    Tick,
}

/// Outcome of one dispatched query, posted back to the owning session.
///
/// `generation` snapshots the store generation at submission time so a
/// response that resolves after the history was retired can be discarded
/// instead of mutating it.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub request_id: Uuid,
    pub generation: u64,
    pub result: Result<String, DispatchError>,
}
