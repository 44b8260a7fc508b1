//! Debounced popup listing the elementary dependencies behind a line.
//!
//! Hovering a line shows the popup after a delay, leaving it hides the popup
//! after another delay. A pending change is cancelled when the opposite
//! request arrives before its delay has elapsed. A fixed popup ignores hover
//! changes until it is unfixed.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Hidden,
    /// Will show at the given time
    PendingShow(Duration),
    Shown,
    /// Will hide at the given time
    PendingHide(Duration),
    Fixed,
}

/// A visibility change reported by [`DetailPopup::advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupChange {
    Shown { from: String, to: String },
    Hidden,
}

/// Text and size of the popup for one dependency
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct DetailPopup {
    show_delay: Duration,
    hide_delay: Duration,
    now: Duration,
    state: PopupState,
    dependency: Option<(String, String)>,
}

impl DetailPopup {
    pub fn new(show_delay: Duration, hide_delay: Duration) -> Self {
        Self {
            show_delay,
            hide_delay,
            now: Duration::ZERO,
            state: PopupState::Hidden,
            dependency: None,
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    /// The dependency the popup shows or is about to show
    pub fn dependency(&self) -> Option<(&str, &str)> {
        self.dependency.as_ref().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, PopupState::Shown | PopupState::PendingHide(_) | PopupState::Fixed)
    }

    /// The pointer entered the line of `from -> to`.
    pub fn hover(&mut self, from: &str, to: &str) {
        if self.state == PopupState::Fixed {
            return;
        }
        let same = self.dependency() == Some((from, to));
        self.state = match self.state {
            PopupState::Shown | PopupState::PendingHide(_) if same => PopupState::Shown,
            PopupState::PendingShow(at) if same => PopupState::PendingShow(at),
            _ => PopupState::PendingShow(self.now + self.show_delay),
        };
        self.dependency = Some((from.to_string(), to.to_string()));
    }

    /// The pointer entered the popup itself; keeps it open.
    pub fn hover_popup(&mut self) {
        if let PopupState::PendingHide(_) = self.state {
            self.state = PopupState::Shown;
        }
    }

    /// The pointer left the line or the popup.
    pub fn leave(&mut self) {
        self.state = match self.state {
            PopupState::PendingShow(_) => PopupState::Hidden,
            PopupState::Shown => PopupState::PendingHide(self.now + self.hide_delay),
            other => other,
        };
    }

    /// Keep the popup open regardless of the pointer.
    pub fn fix(&mut self) {
        if self.dependency.is_some() && self.state != PopupState::Hidden {
            self.state = PopupState::Fixed;
        }
    }

    pub fn unfix(&mut self) {
        if self.state == PopupState::Fixed {
            self.state = PopupState::PendingHide(self.now + self.hide_delay);
        }
    }

    /// Let time pass; reports when the popup appears or disappears.
    pub fn advance(&mut self, elapsed: Duration) -> Option<PopupChange> {
        self.now += elapsed;
        match self.state {
            PopupState::PendingShow(at) if at <= self.now => {
                self.state = PopupState::Shown;
                self.dependency.as_ref().map(|(from, to)| PopupChange::Shown {
                    from: from.clone(),
                    to: to.clone(),
                })
            }
            PopupState::PendingHide(at) if at <= self.now => {
                self.state = PopupState::Hidden;
                self.dependency = None;
                Some(PopupChange::Hidden)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popup() -> DetailPopup {
        DetailPopup::new(Duration::from_millis(300), Duration::from_millis(200))
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_shows_after_delay() {
        let mut popup = popup();
        popup.hover("a", "b");
        assert_eq!(popup.advance(ms(299)), None);
        assert_eq!(
            popup.advance(ms(1)),
            Some(PopupChange::Shown {
                from: "a".to_string(),
                to: "b".to_string()
            })
        );
        assert!(popup.is_visible());
    }

    #[test]
    fn test_leaving_before_delay_cancels_showing() {
        let mut popup = popup();
        popup.hover("a", "b");
        popup.advance(ms(100));
        popup.leave();
        assert_eq!(popup.advance(ms(500)), None);
        assert_eq!(popup.state(), PopupState::Hidden);
    }

    #[test]
    fn test_hides_after_delay_unless_hovered_again() {
        let mut popup = popup();
        popup.hover("a", "b");
        popup.advance(ms(300));
        popup.leave();
        popup.advance(ms(100));
        popup.hover_popup();
        assert_eq!(popup.advance(ms(500)), None);
        assert!(popup.is_visible());

        popup.leave();
        assert_eq!(popup.advance(ms(200)), Some(PopupChange::Hidden));
        assert_eq!(popup.dependency(), None);
    }

    #[test]
    fn test_fixed_popup_ignores_hover() {
        let mut popup = popup();
        popup.hover("a", "b");
        popup.advance(ms(300));
        popup.fix();
        popup.leave();
        popup.hover("c", "d");
        assert_eq!(popup.advance(ms(1000)), None);
        assert_eq!(popup.dependency(), Some(("a", "b")));

        popup.unfix();
        assert_eq!(popup.advance(ms(200)), Some(PopupChange::Hidden));
    }

    #[test]
    fn test_hover_other_line_restarts_delay() {
        let mut popup = popup();
        popup.hover("a", "b");
        popup.advance(ms(200));
        popup.hover("c", "d");
        assert_eq!(popup.advance(ms(200)), None);
        assert_eq!(
            popup.advance(ms(100)),
            Some(PopupChange::Shown {
                from: "c".to_string(),
                to: "d".to_string()
            })
        );
    }
}
