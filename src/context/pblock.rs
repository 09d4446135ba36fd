use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum inline name/value pairs before a block spills to the heap.
pub const MAX_INLINE_PARAMS: usize = 16;

/// Stack-allocated storage for a parameter block.
///
/// Names are `Arc<str>` because the same few names (`uri`, `content-type`, ...)
/// repeat across every request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Ordered name/value block, the host's unit of request metadata.
///
/// Duplicate names are allowed; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBlock {
    entries: ParamVec,
}

impl ParamBlock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ParamBlock::nvinsert`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.nvinsert(name, value);
        self
    }

    /// First value stored under `name`.
    #[inline]
    #[must_use]
    pub fn findval(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append a pair.
    pub fn nvinsert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((Arc::from(name), value.into()));
    }

    /// Remove every pair named `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k.as_ref() != name);
        before - self.entries.len()
    }

    /// Every value stored under `name`, in insertion order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ParamBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut block = ParamBlock::new();
        for (k, v) in iter {
            block.nvinsert(k.as_ref(), v);
        }
        block
    }
}

/// Renders the host's textual form: `name="value" name="value"`.
impl fmt::Display for ParamBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (k, v)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{k}=\"{v}\"")?;
        }
        Ok(())
    }
}

/// Error parsing the textual block form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBlockParseError {
    pub offset: usize,
    pub reason: &'static str,
}

impl fmt::Display for ParamBlockParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parameter block at byte {}: {}", self.offset, self.reason)
    }
}

impl std::error::Error for ParamBlockParseError {}

impl FromStr for ParamBlock {
    type Err = ParamBlockParseError;

    /// Parses `name="value"` pairs separated by whitespace, as found on a
    /// server directive line. Values cannot contain `"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut block = ParamBlock::new();
        let mut rest = s.trim_start();
        while !rest.is_empty() {
            let offset = s.len() - rest.len();
            let eq = rest.find('=').ok_or(ParamBlockParseError {
                offset,
                reason: "expected '='",
            })?;
            let (name, after_name) = rest.split_at(eq);
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ParamBlockParseError {
                    offset,
                    reason: "invalid parameter name",
                });
            }
            let quoted = after_name[1..].strip_prefix('"').ok_or(ParamBlockParseError {
                offset: offset + eq + 1,
                reason: "expected opening quote",
            })?;
            let close = quoted.find('"').ok_or(ParamBlockParseError {
                offset: offset + eq + 2,
                reason: "unterminated value",
            })?;
            block.nvinsert(name, &quoted[..close]);
            rest = quoted[close + 1..].trim_start();
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_findval_returns_first_match() {
        let block = ParamBlock::new().with("a", "1").with("a", "2");
        assert_eq!(block.findval("a"), Some("1"));
        assert_eq!(block.values("a").collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(block.findval("b"), None);
    }

    #[test]
    fn test_remove_drops_all_pairs() {
        let mut block = ParamBlock::new()
            .with("content-type", "x")
            .with("location", "/")
            .with("content-type", "y");
        assert_eq!(block.remove("content-type"), 2);
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_directive_text_parses() {
        let block: ParamBlock = r#"fn="nsd_init" logname="/var/log/nsd"  criticalonly="x""#
            .parse()
            .unwrap();
        assert_eq!(block.findval("fn"), Some("nsd_init"));
        assert_eq!(block.findval("logname"), Some("/var/log/nsd"));
        assert_eq!(block.findval("criticalonly"), Some("x"));
        assert_eq!(
            block.to_string(),
            r#"fn="nsd_init" logname="/var/log/nsd" criticalonly="x""#
        );
    }

    #[test]
    fn test_directive_text_rejects_garbage() {
        assert!("novalue".parse::<ParamBlock>().is_err());
        assert!(r#"name=unquoted"#.parse::<ParamBlock>().is_err());
        assert!(r#"name="open"#.parse::<ParamBlock>().is_err());
        assert!("".parse::<ParamBlock>().unwrap().is_empty());
    }
}
