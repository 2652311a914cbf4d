use crate::store::{Record, Scope};

/// Where a record sits in its lifecycle. `Purged` is never stored; it is the
/// absence of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Trashed,
    Purged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SoftDelete,
    Restore,
    Purge,
}

impl LifecycleState {
    pub fn of(record: &Record) -> Self {
        match record.scope() {
            Scope::Active => LifecycleState::Active,
            Scope::Trashed => LifecycleState::Trashed,
        }
    }

    /// The state reached by `transition`, or `None` if it is not allowed from
    /// here.
    pub fn apply(self, transition: Transition) -> Option<LifecycleState> {
        match (self, transition) {
            (LifecycleState::Active, Transition::SoftDelete) => Some(LifecycleState::Trashed),
            (LifecycleState::Trashed, Transition::Restore) => Some(LifecycleState::Active),
            (LifecycleState::Trashed, Transition::Purge) => Some(LifecycleState::Purged),
            _ => None,
        }
    }
}

impl Transition {
    /// The only state this transition starts from.
    pub fn source(self) -> LifecycleState {
        match self {
            Transition::SoftDelete => LifecycleState::Active,
            Transition::Restore | Transition::Purge => LifecycleState::Trashed,
        }
    }
}
