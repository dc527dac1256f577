//! Constants used in the programmatic representation of coral code.

use std::ops::Range;

pub type SourceOffset = u32;

pub const SOURCE_OFFSET_INVALID: SourceOffset = SourceOffset::MAX;

/// An index of a node within a node tree.
pub type NodeOffset = u32;

pub const NODE_OFFSET_INVALID: NodeOffset = NodeOffset::MAX;

/// A range of source code.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SourceRange {
    pub start: SourceOffset,
    pub length: SourceOffset,
}

impl SourceRange {
    pub fn new(start: usize, length: usize) -> Self {
        SourceRange {
            start: start.try_into().unwrap(),
            length: length.try_into().unwrap(),
        }
    }
    pub fn start(&self) -> usize {
        self.start.try_into().unwrap()
    }
    pub fn length(&self) -> usize {
        self.length.try_into().unwrap()
    }
    pub fn end(&self) -> usize {
        self.start
            .checked_add(self.length)
            .expect("Overflow")
            .try_into()
            .unwrap()
    }

    // \return true if a location is in this range, including one-past-the-end.
    pub fn contains_inclusive(&self, loc: usize) -> bool {
        self.start() <= loc && loc - self.start() <= self.length()
    }
}

impl From<SourceRange> for Range<usize> {
    fn from(value: SourceRange) -> Self {
        value.start()..value.end()
    }
}

/// The grammar symbol a parse node carries. Terminal types (strings, redirection primitives and
/// the end symbol) match a single token; the rest are productions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParseNodeType {
    /// Job lists are right-recursive: an optional job followed by a continuation list.
    JobList,
    /// A job: a statement, a pipeline continuation, and an optional background marker.
    Job,
    /// The rest of a pipeline: pipe, newlines, statement, continuation.
    JobContinuation,
    Statement,
    BooleanStatement,
    DecoratedStatement,
    PlainStatement,
    ArgumentList,
    ArgumentsOrRedirectionsList,
    Argument,
    Redirection,
    OptionalBackground,
    OptionalNewlines,
    FreestandingArgumentList,
    /// Terminal: a string token.
    TokString,
    /// Terminal: a pipe token.
    TokPipe,
    /// Terminal: a redirection primitive token like "2>".
    TokRedirection,
    /// Terminal: a background token.
    TokBackground,
    /// Terminal: a statement terminator.
    TokEnd,
    /// Terminal: the end of the token stream.
    Terminate,
    /// A comment node. Never a child in a production; it hangs off the node that witnessed it.
    Comment,
    /// An error node, holding the range of the token that failed to scan.
    TokenizerError,
}

impl ParseNodeType {
    /// Return whether this node type matches a single token.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ParseNodeType::TokString
                | ParseNodeType::TokPipe
                | ParseNodeType::TokRedirection
                | ParseNodeType::TokBackground
                | ParseNodeType::TokEnd
                | ParseNodeType::Terminate
        )
    }
}

/// Statement decorations, like 'command' or 'builtin'.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum StatementDecoration {
    #[default]
    None,
    Command,
    Builtin,
    Exec,
}

/// The kind of a boolean statement.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BoolStatementType {
    And,
    Or,
    Not,
}

/// The tag payload of a parse node, interpreted according to the node's type. A decorated
/// statement carries its decoration, a boolean statement its kind, and an optional-background
/// node whether the background token was present.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum NodeTag {
    #[default]
    None,
    Decoration(StatementDecoration),
    BoolStatement(BoolStatementType),
    Background(bool),
}
