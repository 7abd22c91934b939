//! Tokens produced by [`super::TokenReader`].

use compact_str::CompactString;

use crate::grammar::END_OF_FILE;
use crate::text::{TextRange, TextSize};

/// A token read from the source.
///
/// Created fresh per successful `read_token` call, owned by the caller and
/// immutable afterwards. Exactly one end-of-file token is produced per
/// exhausted stream; calls after it keep returning an equivalent
/// end-of-file token.
///
/// # Example
///
/// ```rust
/// use sylex::Grammar;
///
/// let mut grammar = Grammar::new();
/// grammar.define_symbol(Some("word"), "[a-z]+", None, None)?;
/// let mut reader = grammar.reader("hello")?;
///
/// let token = reader.read_token().unwrap();
/// assert_eq!(token.id.as_deref(), Some("word"));
/// assert_eq!(token.text, "hello");
/// assert!(!token.eof);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Display id of the matched symbol; `Some("<<EOF>>")` for the
    /// end-of-file token.
    pub id: Option<CompactString>,
    /// Definition order of the matched symbol; `u32::MAX` for the default
    /// end-of-file token.
    pub order: u32,
    /// The matched slice, trimmed of any trailing lookahead.
    pub text: CompactString,
    /// Byte range of `text` in the source.
    pub range: TextRange,
    /// End-of-file flag.
    pub eof: bool,
}

impl Token {
    pub(crate) fn new(
        id: Option<CompactString>,
        order: u32,
        text: &str,
        range: TextRange,
    ) -> Self {
        Self {
            id,
            order,
            text: text.into(),
            range,
            eof: false,
        }
    }

    /// The default end-of-file token, anchored at the end of the source.
    pub(crate) fn end_of_file(at: TextSize) -> Self {
        Self {
            id: Some(END_OF_FILE.into()),
            order: u32::MAX,
            text: CompactString::default(),
            range: TextRange::empty(at),
            eof: true,
        }
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// Start offset in the source.
    #[must_use]
    pub const fn start(&self) -> TextSize {
        self.range.start()
    }

    /// End offset in the source.
    #[must_use]
    pub const fn end(&self) -> TextSize {
        self.range.end()
    }
}
