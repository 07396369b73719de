//! Broadcast payloads.

use std::fmt;
use std::sync::Arc;

/// Normalizes an inbound text payload before it is broadcast.
///
/// Each `\n` becomes a single space, then leading and trailing whitespace is
/// trimmed, so embedded line breaks never reach downstream displays.
pub fn normalize(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

/// An immutable message fanned out by the hub.
///
/// Cloning is cheap: every recipient queue shares one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelayMessage(Arc<str>);

impl RelayMessage {
    /// Wraps text verbatim.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Builds a message from raw inbound text, applying [`normalize`].
    pub fn from_inbound(raw: &str) -> Self {
        Self(Arc::from(normalize(raw)))
    }

    /// Returns the message text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the message length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the message is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RelayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelayMessage {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RelayMessage {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for RelayMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_newlines() {
        assert_eq!(normalize("hello\nworld"), "hello world");
    }

    #[test]
    fn test_normalize_trims_after_replacing() {
        assert_eq!(normalize("\n  hi there \n"), "hi there");
        assert_eq!(normalize("  \t "), "");
    }

    #[test]
    fn test_normalize_keeps_each_newline_as_a_space() {
        assert_eq!(normalize("a\n\nb"), "a  b");
    }

    #[test]
    fn test_from_inbound_normalizes() {
        let msg = RelayMessage::from_inbound(" line one\nline two ");
        assert_eq!(msg.as_str(), "line one line two");
        assert_eq!(msg.len(), 17);
    }

    #[test]
    fn test_new_is_verbatim() {
        let msg = RelayMessage::new(" keep\nme ");
        assert_eq!(msg.as_str(), " keep\nme ");
    }

    #[test]
    fn test_clones_share_storage() {
        let a = RelayMessage::from("shared");
        let b = a.clone();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }
}
