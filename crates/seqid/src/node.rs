use core::fmt;

use crate::{Error, Result, SequenceId};

/// Environment variable consulted by [`NodeId::from_env`].
pub const NODE_ID_ENV: &str = "NODE_ID";

/// A validated node ID, guaranteed to fit in the 10-bit node field.
///
/// Node IDs must be unique across cooperating processes; assigning them is
/// left to whatever deploys those processes.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u16);

impl NodeId {
    /// Used when no node ID is configured.
    pub const DEFAULT: Self = Self(1);

    /// Validates `node_id` against the node field width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] if `node_id` is negative or greater
    /// than [`SequenceId::MAX_NODE_ID`].
    ///
    /// ```
    /// use seqid::{Error, NodeId};
    ///
    /// assert_eq!(NodeId::new(1023).unwrap().get(), 1023);
    /// assert_eq!(NodeId::new(1024), Err(Error::InvalidNodeId { node_id: 1024 }));
    /// ```
    pub fn new(node_id: i64) -> Result<Self> {
        match u16::try_from(node_id) {
            Ok(value) if u64::from(value) <= SequenceId::MAX_NODE_ID => Ok(Self(value)),
            _ => Err(Error::InvalidNodeId { node_id }),
        }
    }

    /// Resolves a node ID from a raw configuration value.
    ///
    /// An absent or all-whitespace value resolves to [`NodeId::DEFAULT`].
    /// Anything else must be exactly a decimal integer, with no surrounding
    /// whitespace, within the node field range.
    ///
    /// # Errors
    ///
    /// - [`Error::Parse`] if the value is not an integer
    /// - [`Error::InvalidNodeId`] if it is out of range
    ///
    /// ```
    /// use seqid::NodeId;
    ///
    /// assert_eq!(NodeId::resolve(None).unwrap(), NodeId::DEFAULT);
    /// assert_eq!(NodeId::resolve(Some("  ")).unwrap(), NodeId::DEFAULT);
    /// assert_eq!(NodeId::resolve(Some("42")).unwrap().get(), 42);
    /// assert!(NodeId::resolve(Some("node-1")).is_err());
    /// assert!(NodeId::resolve(Some(" 7 ")).is_err());
    /// ```
    pub fn resolve(value: Option<&str>) -> Result<Self> {
        let raw = match value {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    "{NODE_ID_ENV} is not set. Using default node id: {}",
                    Self::DEFAULT
                );
                return Ok(Self::DEFAULT);
            }
        };

        let parsed = raw.parse::<i64>().map_err(|source| Error::Parse {
            value: raw.to_owned(),
            source,
        })?;
        Self::new(parsed)
    }

    /// Resolves the node ID from the `NODE_ID` environment variable.
    ///
    /// A value that is not valid unicode is treated as malformed.
    ///
    /// # Errors
    ///
    /// See [`NodeId::resolve`].
    pub fn from_env() -> Result<Self> {
        match std::env::var(NODE_ID_ENV) {
            Ok(value) => Self::resolve(Some(&value)),
            Err(std::env::VarError::NotPresent) => Self::resolve(None),
            // The lossy form keeps a U+FFFD, which never parses
            Err(std::env::VarError::NotUnicode(raw)) => Self::resolve(Some(&raw.to_string_lossy())),
        }
    }

    /// Returns the raw node ID.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for NodeId {
    type Error = Error;

    fn try_from(node_id: i64) -> Result<Self> {
        Self::new(node_id)
    }
}

impl From<NodeId> for u64 {
    fn from(node_id: NodeId) -> Self {
        u64::from(node_id.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_field_bounds() {
        assert_eq!(NodeId::new(0).unwrap().get(), 0);
        assert_eq!(NodeId::new(1023).unwrap().get(), 1023);
    }

    #[test]
    fn rejects_out_of_range() {
        for node_id in [-1, 1024, i64::from(u16::MAX) + 1, i64::MIN, i64::MAX] {
            assert_eq!(NodeId::new(node_id), Err(Error::InvalidNodeId { node_id }));
        }
    }

    #[test]
    fn blank_resolves_to_default() {
        assert_eq!(NodeId::resolve(None).unwrap(), NodeId::DEFAULT);
        assert_eq!(NodeId::resolve(Some("")).unwrap(), NodeId::DEFAULT);
        assert_eq!(NodeId::resolve(Some(" \t\n")).unwrap(), NodeId::DEFAULT);
        assert_eq!(NodeId::DEFAULT.get(), 1);
    }

    #[test]
    fn parses_and_validates_once() {
        assert_eq!(NodeId::resolve(Some("7")).unwrap().get(), 7);
        assert_eq!(
            NodeId::resolve(Some("1024")),
            Err(Error::InvalidNodeId { node_id: 1024 })
        );
        assert_eq!(
            NodeId::resolve(Some("-1")),
            Err(Error::InvalidNodeId { node_id: -1 })
        );
    }

    #[test]
    fn malformed_value_is_parse_error() {
        for raw in ["abc", "1.5", "0x10", "99999999999999999999", " 7 ", "7\n"] {
            match NodeId::resolve(Some(raw)) {
                Err(Error::Parse { value, .. }) => assert_eq!(value, raw),
                other => panic!("expected parse error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_env_resolves_node_id_variable() {
        // SAFETY: no other test in this crate reads or writes NODE_ID
        unsafe { std::env::remove_var(NODE_ID_ENV) };
        assert_eq!(NodeId::from_env().unwrap(), NodeId::DEFAULT);

        unsafe { std::env::set_var(NODE_ID_ENV, "  ") };
        assert_eq!(NodeId::from_env().unwrap(), NodeId::DEFAULT);

        unsafe { std::env::set_var(NODE_ID_ENV, "abc") };
        assert!(matches!(
            NodeId::from_env(),
            Err(Error::Parse { value, .. }) if value == "abc"
        ));

        unsafe { std::env::set_var(NODE_ID_ENV, "42") };
        assert_eq!(NodeId::from_env().unwrap().get(), 42);

        unsafe { std::env::remove_var(NODE_ID_ENV) };
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn default_node_id_is_logged() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            NodeId::resolve(Some("3")).unwrap();
            assert!(captured.0.lock().unwrap().is_empty());
            NodeId::resolve(None).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("INFO"));
        assert!(output.contains("NODE_ID is not set. Using default node id: 1"));
    }
}
