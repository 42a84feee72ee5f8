use crate::Result;

/// A capability for assigning new record keys, one call per record.
///
/// This is the seam between ID generation and a persistence layer: a
/// repository or key-assignment hook holds an `Arc<dyn IdAssigner>` and asks
/// for the next key of a given entity kind, without knowing how the IDs are
/// produced.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use seqid::{IdAssigner, NodeId, Registry};
///
/// struct UserRepository {
///     ids: Arc<dyn IdAssigner>,
/// }
///
/// impl UserRepository {
///     fn insert(&self, _name: &str) -> seqid::Result<u64> {
///         self.ids.assign_id("User")
///     }
/// }
///
/// let repository = UserRepository {
///     ids: Arc::new(Registry::new(NodeId::DEFAULT)),
/// };
/// let first = repository.insert("ada").unwrap();
/// let second = repository.insert("grace").unwrap();
/// assert!(first < second);
/// ```
pub trait IdAssigner: Send + Sync {
    /// Returns the next key for a record of kind `entity_key`.
    ///
    /// # Errors
    ///
    /// Propagates generation failures such as a clock regression.
    fn assign_id(&self, entity_key: &str) -> Result<u64>;
}
