use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;

/// Listing card lifecycle: a skeleton until its image resolves, then visible
/// for good. Expiry is a filtering decision, not a card state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    Loading,
    Visible,
}

#[derive(Debug, Default)]
pub struct CardStates {
    states: RefCell<HashMap<i64, CardState>>,
}

impl CardStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: i64) -> CardState {
        self.states
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or(CardState::Loading)
    }

    /// Returns true when this call moved the card out of `Loading`.
    pub fn image_loaded(&self, id: i64) -> bool {
        let previous = self.states.borrow_mut().insert(id, CardState::Visible);
        previous != Some(CardState::Visible)
    }

    /// Forgets cards for listings no longer in the catalog.
    pub fn retain(&self, ids: &[i64]) {
        self.states.borrow_mut().retain(|id, _| ids.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_then_visible_and_stays_visible() {
        let cards = CardStates::new();
        assert_eq!(cards.state(1), CardState::Loading);
        assert!(cards.image_loaded(1));
        assert!(!cards.image_loaded(1));
        assert_eq!(cards.state(1), CardState::Visible);

        cards.retain(&[1, 2]);
        assert_eq!(cards.state(1), CardState::Visible);
        cards.retain(&[2]);
        assert_eq!(cards.state(1), CardState::Loading);
    }
}
