use crate::SequenceId;

/// Represents the result of one locked attempt to generate an ID.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was generated.
/// - [`IdGenStatus::Pending`] means the sequence for the current millisecond
///   is exhausted and no ID can be issued until the clock reaches
///   `yield_until`.
///
/// # Example
///
/// ```
/// use seqid::{IdGenStatus, LockSequenceGenerator, SequenceId, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator =
///     LockSequenceGenerator::from_components(1, 0, SequenceId::MAX_SEQUENCE, FixedTime).unwrap();
/// match generator.poll_id().unwrap() {
///     IdGenStatus::Ready { id } => println!("ID: {}", id.timestamp()),
///     IdGenStatus::Pending { yield_until } => println!("Back off until: {yield_until}"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SequenceId,
    },
    /// The sequence for the current millisecond is exhausted.
    Pending {
        /// The first timestamp (inclusive) at which an ID can be issued.
        yield_until: u64,
    },
}
