/// Состояние согласования одного линка.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    New,
    Negotiating,
    Stable,
    Closed,
}

impl LinkState {
    pub fn can_transition_to(self, next: LinkState) -> bool {
        use LinkState::*;

        matches!(
            (self, next),
            (New, Negotiating) | (Negotiating, Stable) | (Stable, Negotiating)
        ) || (next == Closed && self != Closed)
    }

    pub fn is_closed(self) -> bool {
        self == LinkState::Closed
    }
}
