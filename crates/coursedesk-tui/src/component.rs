//! Component trait: the building block for every screen.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use crate::action::Action;

/// Every screen implements Component.
///
/// Lifecycle: `mount` → (`handle_key_event` | `update` | `render`)* → `unmount`.
/// A screen may be mounted and unmounted many times; only the visible
/// screen is mounted.
pub trait Component: Send {
    /// Called when the screen becomes visible.
    fn mount(&mut self) {}

    /// Called when the screen is hidden or replaced.
    fn unmount(&mut self) {}

    /// Handle a keyboard event. Return an Action to dispatch, or None.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect);

    /// Whether the screen is capturing text input (global keys are
    /// suspended while it is).
    fn captures_input(&self) -> bool {
        false
    }

    /// Key hints for the status bar.
    fn hints(&self) -> &'static str {
        ""
    }
}
