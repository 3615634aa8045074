use std::fmt;

/// A parsed document path.
///
/// Paths address nodes in the document tree, one segment per map key (or
/// list index). Dots separate segments, and consecutive dots fold onto the
/// following segment as its leading-dot prefix, so `"users.alice..greeting"`
/// parses to `["users", "alice", ".greeting"]` and addresses the expression
/// key `.greeting` under `users.alice`. A literal dot inside a key is
/// written `\.`.
///
/// `Display` serializes back to the same string form, which is also the
/// form used for cache keys and available-path listings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        KeyPath::default()
    }

    /// Parse a path string.
    ///
    /// Separator dots with no segment before them accumulate and attach to
    /// the next segment. Trailing separator dots are dropped.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut has_content = false;
        let mut pending_dots = 0usize;
        let mut chars = path.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    // Escape: the next character is literal.
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                        has_content = true;
                    }
                }
                '.' => {
                    if has_content {
                        segments.push(prefixed(pending_dots, &current));
                        current.clear();
                        has_content = false;
                        pending_dots = 0;
                    } else {
                        pending_dots += 1;
                    }
                }
                _ => {
                    current.push(ch);
                    has_content = true;
                }
            }
        }
        if has_content {
            segments.push(prefixed(pending_dots, &current));
        }
        KeyPath { segments }
    }

    /// Build a path from pre-split segments.
    pub fn from_segments(segments: Vec<String>) -> Self {
        KeyPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Everything up to (but not including) the final segment.
    pub fn parent(&self) -> &[String] {
        match self.segments.len() {
            0 => &[],
            n => &self.segments[..n - 1],
        }
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        KeyPath { segments }
    }

    /// This path extended by all of `other`'s segments.
    pub fn join(&self, other: &KeyPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        KeyPath { segments }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            let dots = leading_dots(segment);
            for _ in 0..dots {
                write!(f, ".")?;
            }
            for ch in segment[dots..].chars() {
                match ch {
                    '.' => write!(f, "\\.")?,
                    '\\' => write!(f, "\\\\")?,
                    _ => write!(f, "{ch}")?,
                }
            }
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        KeyPath::parse(path)
    }
}

fn prefixed(dots: usize, name: &str) -> String {
    let mut segment = ".".repeat(dots);
    segment.push_str(name);
    segment
}

/// Number of leading dots on a segment. Non-zero means an expression key.
pub fn leading_dots(segment: &str) -> usize {
    segment.chars().take_while(|ch| *ch == '.').count()
}

/// Whether a segment names an expression key (has a dot prefix).
pub fn is_expression_key(segment: &str) -> bool {
    segment.starts_with('.')
}

/// A segment with its dot prefix stripped: the name of the materialized
/// twin of an expression key. Variant suffixes are retained.
pub fn materialized_key(segment: &str) -> &str {
    segment.trim_start_matches('.')
}
