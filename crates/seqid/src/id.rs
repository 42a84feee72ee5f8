use core::fmt;

/// A 64-bit, time-ordered identifier.
///
/// - 1 bit reserved (always zero, so the id stays positive as an `i64`)
/// - 41 bits timestamp (ms since [`EPOCH`])
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21             12 11             0
///              +--------------+----------------+-----------------+---------------+
///  Field:      | reserved (1) | timestamp (41) |   node ID (10)  | sequence (12) |
///              +--------------+----------------+-----------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// Ordering on [`SequenceId`] is ordering on the raw `u64`, which is
/// lexicographic ordering on `(timestamp, node_id, sequence)`.
///
/// # Example
///
/// ```
/// use seqid::SequenceId;
///
/// let id = SequenceId::from_components(1000, 5, 7);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.node_id(), 5);
/// assert_eq!(id.sequence(), 7);
/// assert_eq!(SequenceId::from_raw(id.to_raw()), id);
/// ```
///
/// [`EPOCH`]: crate::EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId {
    id: u64,
}

impl SequenceId {
    /// Bitmask for the 41-bit timestamp field. Occupies bits 22 through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for the 10-bit node ID field. Occupies bits 12 through 21.
    pub const NODE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the node ID to its position (bit 12).
    pub const NODE_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Largest timestamp, in milliseconds since the epoch.
    pub const MAX_TIMESTAMP: u64 = Self::TIMESTAMP_MASK;

    /// Largest node ID.
    pub const MAX_NODE_ID: u64 = Self::NODE_ID_MASK;

    /// Largest sequence value within one millisecond.
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Packs the three fields. Out-of-range bits are masked off.
    pub const fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Wraps a raw identifier without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw packed identifier.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID from the packed ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns true if the sequence can be incremented within the same
    /// millisecond.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::MAX_SEQUENCE
    }

    /// Returns a new ID with the sequence incremented.
    pub(crate) const fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.node_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with the sequence reset to zero.
    pub(crate) const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.node_id(), 0)
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<SequenceId> for u64 {
    fn from(id: SequenceId) -> Self {
        id.id
    }
}

impl From<u64> for SequenceId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("timestamp", 41, self.timestamp()),
            ("node ID", 10, self.node_id()),
            ("sequence", 12, self.sequence()),
        ];

        // Column width: widest of label, decimal and hex, plus padding
        let columns: Vec<usize> = fields
            .iter()
            .map(|(name, bits, value)| {
                let label_len = format!("{name} ({bits})").len();
                let dec_len = value.to_string().len();
                let hex_len = format!("0x{value:x}").len();
                label_len.max(dec_len).max(hex_len) + 2
            })
            .collect();

        let border = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            write!(f, "        +")?;
            for &w in &columns {
                write!(f, "{}+", "-".repeat(w))?;
            }
            writeln!(f)
        };

        writeln!(f, "SequenceId {{")?;
        writeln!(f, "    raw id     : 0x{:016x} ({})", self.id, self.id)?;
        writeln!(f, "    padded     : {}", self.to_padded_string())?;
        writeln!(f, "    layout     :")?;
        border(f)?;
        write!(f, "        |")?;
        for ((name, bits, _), &w) in fields.iter().zip(&columns) {
            write!(f, "{:^w$}|", format!("{name} ({bits})"))?;
        }
        writeln!(f)?;
        border(f)?;
        write!(f, "        |")?;
        for ((_, _, value), &w) in fields.iter().zip(&columns) {
            write!(f, "{value:^w$}|")?;
        }
        writeln!(f)?;
        write!(f, "        |")?;
        for ((_, _, value), &w) in fields.iter().zip(&columns) {
            write!(f, "{:^w$}|", format!("0x{value:x}"))?;
        }
        writeln!(f)?;
        border(f)?;
        write!(f, "}}")
    }
}
