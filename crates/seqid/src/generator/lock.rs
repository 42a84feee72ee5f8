use core::cmp::Ordering;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, IdGenStatus, NodeId, Result, SequenceId,
    mutex::{Mutex, acquire},
    time::{TimeSource, WallClock},
};

/// A lock-based sequence ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID is kept behind a [`Mutex`] scoped to this instance, so
/// two generators never contend with each other. The clock is sampled while
/// the lock is held: every caller observes a serialized view of
/// `(last timestamp, sequence)`, which keeps IDs from one instance strictly
/// increasing in issue order.
///
/// A clock that steps backwards is reported as
/// [`Error::ClockMovedBackwards`] rather than waited out.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fails fast on clock regression
/// - ✅ At most 4096 IDs per millisecond; the next caller spins until the
///   clock advances
///
/// [`Mutex`]: std::sync::Mutex
pub struct LockSequenceGenerator<T = WallClock>
where
    T: TimeSource,
{
    last: Mutex<Option<SequenceId>>,
    node_id: NodeId,
    time: T,
}

impl LockSequenceGenerator<WallClock> {
    /// Creates a generator reading the system clock against [`EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node_id` is outside `0..=1023`.
    ///
    /// [`EPOCH`]: crate::EPOCH
    pub fn with_wall_clock(node_id: i64) -> Result<Self> {
        Self::new(node_id, WallClock::default())
    }
}

impl<T> LockSequenceGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockSequenceGenerator`] for the given node.
    ///
    /// No ID has been issued yet, so the first call to
    /// [`next_id`](Self::next_id) always starts at sequence zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node_id` is negative or does not
    /// fit in 10 bits.
    ///
    /// # Example
    /// ```
    /// use seqid::{Error, LockSequenceGenerator, WallClock};
    ///
    /// let generator = LockSequenceGenerator::new(5, WallClock::default()).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.node_id(), 5);
    ///
    /// assert!(matches!(
    ///     LockSequenceGenerator::new(1024, WallClock::default()),
    ///     Err(Error::InvalidNodeId { node_id: 1024 })
    /// ));
    /// ```
    pub fn new(node_id: i64, time: T) -> Result<Self> {
        Ok(Self::with_node_id(NodeId::new(node_id)?, time))
    }

    /// Creates a generator from an already validated [`NodeId`].
    pub fn with_node_id(node_id: NodeId, time: T) -> Self {
        Self {
            last: Mutex::new(None),
            node_id,
            time,
        }
    }

    /// Creates a generator whose last issued ID had the given components.
    ///
    /// Useful for restoring state or for controlling the starting point in
    /// tests. Timestamp and sequence are masked to their field widths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node_id` is out of range.
    pub fn from_components(timestamp: u64, node_id: i64, sequence: u64, time: T) -> Result<Self> {
        let node_id = NodeId::new(node_id)?;
        let last = SequenceId::from_components(timestamp, node_id.into(), sequence);
        Ok(Self {
            last: Mutex::new(Some(last)),
            node_id,
            time,
        })
    }

    /// The node ID embedded in every ID from this generator.
    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Generates the next ID, spinning while the current millisecond's
    /// sequence is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the clock reads earlier than the
    ///   last issued timestamp
    /// - [`Error::ClockBeforeEpoch`] if the wall clock reads before the
    ///   epoch
    /// - [`Error::TimestampOverflow`] if the clock is past the 41-bit range
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   lock (std mutex only)
    ///
    /// # Example
    /// ```
    /// use seqid::LockSequenceGenerator;
    ///
    /// let generator = LockSequenceGenerator::with_wall_clock(1).unwrap();
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(a < b);
    /// ```
    pub fn next_id(&self) -> Result<SequenceId> {
        loop {
            match self.poll_id()? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { .. } => core::hint::spin_loop(),
            }
        }
    }

    /// Makes one locked attempt at generating an ID.
    ///
    /// Returns [`IdGenStatus::Pending`] instead of waiting when the sequence
    /// for the current millisecond is exhausted. Errors are the same as for
    /// [`next_id`](Self::next_id).
    ///
    /// # Errors
    ///
    /// See [`next_id`](Self::next_id).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(node_id = %self.node_id)))]
    pub fn poll_id(&self) -> Result<IdGenStatus> {
        let mut last = acquire!(self.last, lock);
        let now = self.time.try_current_millis().map_err(Self::cold_clock_unusable)?;
        if now > SequenceId::MAX_TIMESTAMP {
            return Err(Self::cold_timestamp_overflow(now));
        }

        let Some(current) = *last else {
            let id = SequenceId::from_components(now, self.node_id.into(), 0);
            *last = Some(id);
            return Ok(IdGenStatus::Ready { id });
        };

        let current_ts = current.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if current.has_sequence_room() {
                    let id = current.increment_sequence();
                    *last = Some(id);
                    Ok(IdGenStatus::Ready { id })
                } else {
                    Ok(IdGenStatus::Pending {
                        yield_until: current_ts + 1,
                    })
                }
            }
            Ordering::Greater => {
                let id = current.rollover_to_timestamp(now);
                *last = Some(id);
                Ok(IdGenStatus::Ready { id })
            }
            Ordering::Less => Err(Self::cold_clock_behind(now, current_ts)),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!(now, last, "clock moved backwards by {}ms", last - now);
        Error::ClockMovedBackwards { now, last }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_unusable(err: Error) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!("clock cannot be read against the epoch: {err}");
        err
    }

    #[cold]
    #[inline(never)]
    fn cold_timestamp_overflow(now: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!(now, "clock is past the last representable timestamp");
        Error::TimestampOverflow { now }
    }
}

impl<T> core::fmt::Debug for LockSequenceGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockSequenceGenerator")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}
