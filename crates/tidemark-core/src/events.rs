/// Notifications emitted by the engine after store-visible changes.
///
/// Consumers subscribe through [`crate::SyncEngine::subscribe_changes`] and
/// re-read the store on receipt; events carry keys, not data.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    /// A refresh pass for the named scope landed in the store.
    ScopeRefreshed { scope: String },
}
