use core::num::ParseIntError;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `seqid` can emit.
///
/// None of these are recovered internally. Configuration errors
/// ([`Error::InvalidNodeId`], [`Error::Parse`]) are meant to stop the process
/// at startup; runtime errors ([`Error::ClockMovedBackwards`],
/// [`Error::ClockBeforeEpoch`], [`Error::TimestampOverflow`]) are fatal to
/// the call that observed them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The node id does not fit in the 10-bit node field.
    #[error("node id {node_id} is out of range (expected 0..={max})", max = crate::SequenceId::MAX_NODE_ID)]
    InvalidNodeId {
        /// The rejected value.
        node_id: i64,
    },

    /// The clock returned a time earlier than the last issued timestamp.
    ///
    /// Ordering of previously issued ids can no longer be guaranteed, so the
    /// call fails instead of waiting for the clock to catch up.
    #[error("clock moved backwards: now {now}ms, last issued {last}ms")]
    ClockMovedBackwards {
        /// Current reading, in milliseconds since the epoch.
        now: u64,
        /// Timestamp of the last issued id.
        last: u64,
    },

    /// The configured node id is not a decimal integer.
    #[error("invalid node id {value:?}: {source}")]
    Parse {
        /// The raw configuration value.
        value: String,
        /// Underlying integer parse failure.
        source: ParseIntError,
    },

    /// The system clock reads earlier than the configured epoch.
    ///
    /// No valid timestamp exists, and waiting for the clock to pass zero
    /// would never end.
    #[error("clock reads {unix_millis}ms since 1970, before the epoch at {epoch_millis}ms")]
    ClockBeforeEpoch {
        /// Wall-clock reading, in milliseconds since the Unix epoch.
        unix_millis: u64,
        /// The configured epoch, in milliseconds since the Unix epoch.
        epoch_millis: u64,
    },

    /// The clock is past the last millisecond representable in 41 bits.
    #[error("timestamp {now}ms exceeds the 41-bit range")]
    TimestampOverflow {
        /// Current reading, in milliseconds since the epoch.
        now: u64,
    },

    /// A generator or registry lock was poisoned by a panicking thread.
    ///
    /// Only reachable with std mutexes; `parking-lot` mutexes do not poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}
