use crate::error::ActionError;

/// Application state that the runtime replaces wholesale on every update.
pub trait State: Clone + 'static {
    /// A partial state produced by an action.
    type Patch: 'static;

    fn merge(&self, patch: Self::Patch) -> Self;
}

/// Maps the current state to a patch. Invoked at most once.
pub type Action<S> = Box<dyn FnOnce(&S) -> Result<<S as State>::Patch, ActionError>>;
