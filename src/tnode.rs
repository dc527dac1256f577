//! Type-safe access to the parse tree.
//!
//! A TNode is a handle on a node within a tree, remembering the grammar symbol the node is
//! expected to carry. Binding a node of the wrong type, or no node at all, produces an empty
//! handle; missing structure is always an empty handle or None, never an error.

use crate::parse_constants::{
    BoolStatementType, NodeOffset, NodeTag, ParseNodeType, SourceRange, StatementDecoration,
};
use crate::parse_tree::{ParseNode, ParseNodeTree};
use crate::redirection::{RedirectionMode, RedirectionSpec};
use crate::tokenizer::redirection_type_for_string;
use crate::wchar::prelude::*;
use std::marker::PhantomData;

/// A grammar symbol: the static type a TNode expects its node to carry.
pub trait Symbol: Copy {
    const TYPE: ParseNodeType;
}

macro_rules! define_symbol {
    ( $( $name:ident => $typ:ident ),* $(,)? ) => {
        $(
            #[derive(Clone, Copy, Debug)]
            pub struct $name;
            impl Symbol for $name {
                const TYPE: ParseNodeType = ParseNodeType::$typ;
            }
        )*
    };
}

/// Marker types for the grammar symbols the navigation layer names.
pub mod grammar {
    use super::Symbol;
    use crate::parse_constants::ParseNodeType;

    define_symbol!(
        JobList => JobList,
        Job => Job,
        JobContinuation => JobContinuation,
        Statement => Statement,
        BooleanStatement => BooleanStatement,
        DecoratedStatement => DecoratedStatement,
        PlainStatement => PlainStatement,
        ArgumentList => ArgumentList,
        ArgumentsOrRedirectionsList => ArgumentsOrRedirectionsList,
        Argument => Argument,
        Redirection => Redirection,
        OptionalBackground => OptionalBackground,
        TokString => TokString,
        TokRedirection => TokRedirection,
        Comment => Comment,
    );
}

/// A handle on a node of a given type within a tree.
pub struct TNode<'t, T: Symbol> {
    tree: &'t ParseNodeTree,
    node: Option<NodeOffset>,
    marker: PhantomData<T>,
}

impl<'t, T: Symbol> Clone for TNode<'t, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'t, T: Symbol> Copy for TNode<'t, T> {}

impl<'t, T: Symbol> TNode<'t, T> {
    /// An empty handle over `tree`.
    pub fn empty(tree: &'t ParseNodeTree) -> Self {
        TNode {
            tree,
            node: None,
            marker: PhantomData,
        }
    }

    /// Bind `node` if it exists in the tree and carries our symbol; otherwise empty.
    pub fn try_new(tree: &'t ParseNodeTree, node: Option<NodeOffset>) -> Self {
        let node = node.filter(|&idx| tree.try_at(idx).map_or(false, |n| n.typ == T::TYPE));
        TNode {
            tree,
            node,
            marker: PhantomData,
        }
    }

    pub fn tree(&self) -> &'t ParseNodeTree {
        self.tree
    }

    pub fn offset(&self) -> Option<NodeOffset> {
        self.node
    }

    pub fn is_some(&self) -> bool {
        self.node.is_some()
    }

    pub fn is_none(&self) -> bool {
        self.node.is_none()
    }

    /// The underlying generic node, if bound.
    pub fn get(&self) -> Option<&'t ParseNode> {
        self.node.map(|idx| self.tree.at(idx))
    }

    pub fn source_range(&self) -> Option<SourceRange> {
        self.get()?.try_source_range()
    }

    pub fn has_source(&self) -> bool {
        self.source_range().is_some()
    }

    /// The source text this node matched, if any.
    pub fn get_source<'s>(&self, src: &'s wstr) -> Option<&'s wstr> {
        let range = self.source_range()?;
        Some(&src[range.start()..range.end()])
    }

    /// The tag payload, or NodeTag::None for an empty handle.
    pub fn tag(&self) -> NodeTag {
        self.get().map_or(NodeTag::None, |n| n.tag)
    }

    /// The `which`th child, bound as `U`. Empty if we are empty, the child is absent, or its
    /// type does not match.
    pub fn child<U: Symbol>(&self, which: usize) -> TNode<'t, U> {
        let child = self.node.and_then(|idx| self.tree.get_child(idx, which));
        TNode::try_new(self.tree, child)
    }

    /// The parent, bound as `U`. Empty if the parent is absent or of another type.
    pub fn try_get_parent<U: Symbol>(&self) -> TNode<'t, U> {
        let parent = self.node.and_then(|idx| self.tree.get_parent(idx));
        TNode::try_new(self.tree, parent)
    }

    /// Given that we are a right-recursive list, return the next entry of type `E`, advancing
    /// this handle to the list tail. Repeated calls walk the whole list; once the tail runs
    /// out every further call returns an empty handle.
    pub fn next_in_list<E: Symbol>(&mut self) -> TNode<'t, E> {
        let Some(list) = self.node else {
            return TNode::empty(self.tree);
        };
        let (entry, tail) = self.tree.next_node_in_node_list(list, E::TYPE);
        self.node = tail;
        TNode::try_new(self.tree, entry)
    }
}

impl ParseNodeTree {
    /// Return the comment nodes hanging off of `parent`. Callers pay for the scan only if the
    /// node witnessed a comment during construction.
    pub fn comment_nodes_for_node(&self, parent: NodeOffset) -> Vec<TNode<'_, grammar::Comment>> {
        let mut result = vec![];
        if self
            .try_at(parent)
            .map_or(false, |node| node.has_comments())
        {
            for idx in 0..self.len() as NodeOffset {
                let node = self.at(idx);
                if node.typ == ParseNodeType::Comment && node.parent == parent {
                    result.push(TNode::try_new(self, Some(idx)));
                }
            }
        }
        result
    }
}

/// A list symbol whose entries are arguments.
pub trait ArgumentListSymbol: Symbol {}
impl ArgumentListSymbol for grammar::ArgumentList {}
impl ArgumentListSymbol for grammar::ArgumentsOrRedirectionsList {}

/// Collect the arguments of an argument-bearing list, in order, up to `max` of them.
pub fn get_argument_nodes<'t, L: ArgumentListSymbol>(
    mut list: TNode<'t, L>,
    max: usize,
) -> Vec<TNode<'t, grammar::Argument>> {
    let mut result = vec![];
    while result.len() < max {
        let entry = list.next_in_list::<grammar::Argument>();
        if entry.is_none() {
            break;
        }
        result.push(entry);
    }
    result
}

/// Return the command of a plain statement, if it has one.
pub fn command_for_plain_statement<'s>(
    stmt: TNode<'_, grammar::PlainStatement>,
    src: &'s wstr,
) -> Option<&'s wstr> {
    stmt.child::<grammar::TokString>(0).get_source(src)
}

/// Return the decoration of a plain statement, consulting the enclosing decorated statement.
pub fn get_decoration(stmt: TNode<'_, grammar::PlainStatement>) -> StatementDecoration {
    let decorated = stmt.try_get_parent::<grammar::DecoratedStatement>();
    match decorated.tag() {
        NodeTag::Decoration(d) => d,
        _ => StatementDecoration::None,
    }
}

/// Return the kind of a boolean statement, if the node carries one.
pub fn bool_statement_type(stmt: TNode<'_, grammar::BooleanStatement>) -> Option<BoolStatementType> {
    match stmt.tag() {
        NodeTag::BoolStatement(t) => Some(t),
        _ => None,
    }
}

/// Decode a redirection node into an fd, a mode and a target. The first child is the operator
/// token like "2>", the second the target like "1" or a file path. Returns None if the operator
/// does not decode (for example a node inferred during error recovery, with no source).
pub fn decode_redirection(
    redirection: TNode<'_, grammar::Redirection>,
    src: &wstr,
) -> Option<RedirectionSpec> {
    let prim = redirection.child::<grammar::TokRedirection>(0); // like 2>
    let (tok_type, fd) = redirection_type_for_string(prim.get_source(src)?)?;
    let mode = RedirectionMode::try_from(tok_type).ok()?;
    // The target may be absent, e.g. in an unfinished line.
    let target = redirection.child::<grammar::TokString>(1);
    let target = target
        .get_source(src)
        .map_or(WString::new(), |s| s.to_owned());
    Some(RedirectionSpec::new(fd, mode, target))
}

/// Return whether the job is marked to run in the background, per its optional-background
/// child.
pub fn job_node_is_background(job: TNode<'_, grammar::Job>) -> bool {
    let bg = job.child::<grammar::OptionalBackground>(2);
    matches!(bg.tag(), NodeTag::Background(true))
}

/// Return whether the statement is part of a pipeline. If `include_first` is set, the first
/// statement of a job with a nonempty continuation also counts.
pub fn statement_is_in_pipeline(
    st: TNode<'_, grammar::Statement>,
    include_first: bool,
) -> bool {
    if st.is_none() {
        return false;
    }
    // If we're part of a job continuation, we're definitely in a pipeline.
    if st.try_get_parent::<grammar::JobContinuation>().is_some() {
        return true;
    }
    // If include_first is set, check if we're the beginning of a job, and if so, whether that
    // job has a non-empty continuation.
    if include_first {
        let continuation = st
            .try_get_parent::<grammar::Job>()
            .child::<grammar::JobContinuation>(1);
        // A nonempty continuation carries a statement at index 2, after the pipe and the
        // newlines.
        if continuation.child::<grammar::Statement>(2).is_some() {
            return true;
        }
    }
    false
}
