//! Per-entity generator registry.
//!
//! A [`Registry`] maps an entity key (for example a record type name) to
//! exactly one [`LockSequenceGenerator`]. Generators are created on first use
//! and live as long as the registry. Every generator shares the registry's
//! node ID and clock but owns its own `(timestamp, sequence)` state, so
//! streams for different keys never interact.
//!
//! The registry is an ordinary value: build it once at the composition root
//! and hand out `Arc<Registry>` (or `Arc<dyn IdAssigner>`) to whoever needs
//! IDs.

mod interface;
#[cfg(test)]
mod tests;

pub use interface::*;

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    LockSequenceGenerator, NodeId, Result,
    mutex::{RwLock, acquire},
    time::{TimeSource, WallClock},
};

type Generators<T> = HashMap<String, Arc<LockSequenceGenerator<T>>>;

/// Lazily populated map from entity key to its generator.
///
/// # Example
///
/// ```
/// use seqid::{NodeId, Registry, SequenceId};
///
/// let registry = Registry::new(NodeId::new(3).unwrap());
///
/// let order = SequenceId::from_raw(registry.generate("Order").unwrap());
/// let invoice = SequenceId::from_raw(registry.generate("Invoice").unwrap());
///
/// assert_eq!(order.node_id(), 3);
/// assert_eq!(invoice.sequence(), 0);
/// assert_eq!(registry.len(), 2);
/// ```
pub struct Registry<T = WallClock>
where
    T: TimeSource + Clone,
{
    node_id: NodeId,
    time: T,
    generators: RwLock<Generators<T>>,
}

impl Registry<WallClock> {
    /// Creates an empty registry reading the system clock against
    /// [`EPOCH`](crate::EPOCH).
    pub fn new(node_id: NodeId) -> Self {
        Self::with_time(node_id, WallClock::default())
    }
}

impl<T> Registry<T>
where
    T: TimeSource + Clone,
{
    /// Creates an empty registry; each generator gets a clone of `time`.
    pub fn with_time(node_id: NodeId, time: T) -> Self {
        Self {
            node_id,
            time,
            generators: RwLock::new(HashMap::new()),
        }
    }

    /// The node ID shared by every generator in this registry.
    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Generates the next ID for `entity_key`, creating its generator on
    /// first use.
    ///
    /// # Errors
    ///
    /// Propagates [`LockSequenceGenerator::next_id`] errors.
    pub fn generate(&self, entity_key: &str) -> Result<u64> {
        Ok(self.generator(entity_key)?.next_id()?.to_raw())
    }

    /// Generates the next ID keyed by the short type name of `E`.
    ///
    /// `Registry::generate_for::<app::model::User>()` uses the key `"User"`.
    ///
    /// # Errors
    ///
    /// See [`Registry::generate`].
    pub fn generate_for<E: ?Sized>(&self) -> Result<u64> {
        self.generate(entity_key::<E>())
    }

    /// Returns the generator for `entity_key`, creating it if absent.
    ///
    /// Racing callers for an unseen key converge on a single instance: the
    /// fast path only takes the read lock, and creation re-checks under the
    /// write lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`](crate::Error) if the map lock was
    /// poisoned (std lock only).
    pub fn generator(&self, entity_key: &str) -> Result<Arc<LockSequenceGenerator<T>>> {
        {
            let generators = acquire!(self.generators, read);
            if let Some(generator) = generators.get(entity_key) {
                return Ok(Arc::clone(generator));
            }
        }

        let mut generators = acquire!(self.generators, write);
        let generator = generators
            .entry(entity_key.to_owned())
            .or_insert_with(|| {
                #[cfg(feature = "tracing")]
                tracing::debug!(entity_key, node_id = %self.node_id, "creating generator");
                Arc::new(LockSequenceGenerator::with_node_id(
                    self.node_id,
                    self.time.clone(),
                ))
            });
        Ok(Arc::clone(generator))
    }

    /// Returns true if a generator exists for `entity_key`.
    pub fn contains(&self, entity_key: &str) -> bool {
        self.with_generators(|generators| generators.contains_key(entity_key))
    }

    /// Number of entity keys with a generator.
    pub fn len(&self) -> usize {
        self.with_generators(HashMap::len)
    }

    /// Returns true if no generator has been created yet.
    pub fn is_empty(&self) -> bool {
        self.with_generators(HashMap::is_empty)
    }

    // Inspection reads through a poisoned std lock: the map is only written
    // by a single `insert`, so it is never left half-updated.
    fn with_generators<R>(&self, f: impl FnOnce(&Generators<T>) -> R) -> R {
        #[cfg(feature = "parking-lot")]
        let generators = self.generators.read();
        #[cfg(not(feature = "parking-lot"))]
        let generators = self
            .generators
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&generators)
    }
}

impl<T> IdAssigner for Registry<T>
where
    T: TimeSource + Clone + Send + Sync,
{
    fn assign_id(&self, entity_key: &str) -> Result<u64> {
        self.generate(entity_key)
    }
}

impl<T> core::fmt::Debug for Registry<T>
where
    T: TimeSource + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("node_id", &self.node_id)
            .field("entities", &self.len())
            .finish_non_exhaustive()
    }
}

/// Short type name of `E`, with module path and generic arguments removed.
///
/// ```
/// mod model {
///     pub struct Invoice;
/// }
///
/// assert_eq!(seqid::entity_key::<model::Invoice>(), "Invoice");
/// assert_eq!(seqid::entity_key::<Vec<model::Invoice>>(), "Vec");
/// ```
pub fn entity_key<E: ?Sized>() -> &'static str {
    let full = core::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
