/// Pointer-driven selection over the marker collection.
///
/// The machine moves between Idle, Hovering and Clicked, with an animating
/// flag raised while a camera focus flight is in progress. While animating,
/// pointer-move hit-testing is suspended so the info panel cannot flicker
/// during camera transit. A clicked marker keeps the panel visible over
/// hover misses; clicking empty space clears it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    hovered: Option<usize>,
    clicked: Option<usize>,
    animating: bool,
}

/// What a click resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A marker was hit; the camera should fly to it.
    Focus(usize),
    /// Empty space; the selection was cleared.
    Cleared,
}

impl SelectionState {
    /// Feeds the per-frame hover hit. Returns whether the panel content or
    /// visibility changed.
    pub fn pointer_moved(&mut self, hit: Option<usize>) -> bool {
        if self.animating {
            return false;
        }

        match hit {
            Some(marker) => {
                if self.hovered == Some(marker) {
                    return false;
                }
                // A fresh hover takes over the panel, including from a
                // previously clicked marker.
                self.hovered = Some(marker);
                self.clicked = None;
                true
            }
            None => {
                if self.clicked.is_some() {
                    // Clicked markers persist over hover misses.
                    return false;
                }
                self.hovered.take().is_some()
            }
        }
    }

    pub fn click(&mut self, hit: Option<usize>) -> ClickOutcome {
        match hit {
            Some(marker) => {
                self.clicked = Some(marker);
                ClickOutcome::Focus(marker)
            }
            None => {
                self.clicked = None;
                self.hovered = None;
                ClickOutcome::Cleared
            }
        }
    }

    pub fn begin_animation(&mut self) {
        self.animating = true;
    }

    pub fn finish_animation(&mut self) {
        self.animating = false;
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// The marker whose details the info panel should show, if any.
    /// A clicked marker wins over a hovered one.
    pub fn panel(&self) -> Option<usize> {
        self.clicked.or(self.hovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_shows_and_hides_the_panel() {
        let mut selection = SelectionState::default();
        assert!(selection.pointer_moved(Some(2)));
        assert_eq!(selection.panel(), Some(2));

        assert!(selection.pointer_moved(None));
        assert_eq!(selection.panel(), None);
    }

    #[test]
    fn repeated_hover_over_the_same_marker_reports_no_change() {
        let mut selection = SelectionState::default();
        assert!(selection.pointer_moved(Some(1)));
        assert!(!selection.pointer_moved(Some(1)));
    }

    #[test]
    fn clicked_marker_persists_over_hover_miss() {
        let mut selection = SelectionState::default();
        assert_eq!(selection.click(Some(3)), ClickOutcome::Focus(3));
        assert!(!selection.pointer_moved(None));
        assert_eq!(selection.panel(), Some(3));
    }

    #[test]
    fn clicking_empty_space_clears_selection_and_hides_panel() {
        let mut selection = SelectionState::default();
        selection.click(Some(3));
        assert_eq!(selection.click(None), ClickOutcome::Cleared);
        assert_eq!(selection.panel(), None);
    }

    #[test]
    fn hovering_a_different_marker_replaces_a_clicked_one() {
        let mut selection = SelectionState::default();
        selection.click(Some(3));
        assert!(selection.pointer_moved(Some(5)));
        assert_eq!(selection.panel(), Some(5));

        // The click is gone, so the next hover miss hides the panel.
        assert!(selection.pointer_moved(None));
        assert_eq!(selection.panel(), None);
    }

    #[test]
    fn hover_detection_is_suspended_while_animating() {
        let mut selection = SelectionState::default();
        selection.click(Some(1));
        selection.begin_animation();

        assert!(!selection.pointer_moved(Some(4)));
        assert!(!selection.pointer_moved(None));
        assert_eq!(selection.panel(), Some(1));

        selection.finish_animation();
        assert!(selection.pointer_moved(Some(4)));
        assert_eq!(selection.panel(), Some(4));
    }
}
