//! Programmatic representation of coral code: the generic, untyped parse tree.

use crate::parse_constants::{
    NodeOffset, NodeTag, ParseNodeType, SourceRange, NODE_OFFSET_INVALID, SOURCE_OFFSET_INVALID,
};
use bitflags::bitflags;
use std::ops::Range;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct ParseNodeFlags: u8 {
        /// Whether any comment nodes point at this node as their parent. Precomputed by the
        /// tree builder, so that comment queries can skip the scan in the common case.
        const HAS_COMMENTS = 1;
    }
}

/// One node in a parse tree. Nodes are held in a flat array; children occupy a contiguous
/// index range.
#[derive(Clone, Debug)]
pub struct ParseNode {
    /// The grammar symbol of this node.
    pub typ: ParseNodeType,

    /// Tag payload, interpreted per the node type.
    pub tag: NodeTag,

    /// Node flags.
    pub flags: ParseNodeFlags,

    /// Productions are short; a byte is enough for a child count.
    pub child_count: u8,

    /// Index of the first child, meaningless if child_count is 0.
    pub child_start: NodeOffset,

    /// Index of the parent, or NODE_OFFSET_INVALID for the root.
    pub parent: NodeOffset,

    /// Start of the range of the source matched by this node, or SOURCE_OFFSET_INVALID if the
    /// node matched no source (an empty production, or a node inferred during error recovery).
    source_start: u32,

    /// Length of the range of the source matched by this node.
    source_length: u32,
}

impl ParseNode {
    pub fn new(typ: ParseNodeType) -> Self {
        ParseNode {
            typ,
            tag: NodeTag::None,
            flags: ParseNodeFlags::empty(),
            child_count: 0,
            child_start: 0,
            parent: NODE_OFFSET_INVALID,
            source_start: SOURCE_OFFSET_INVALID,
            source_length: 0,
        }
    }

    pub fn set_source_range(&mut self, range: SourceRange) {
        self.source_start = range.start;
        self.source_length = range.length;
    }

    pub fn clear_source_range(&mut self) {
        self.source_start = SOURCE_OFFSET_INVALID;
        self.source_length = 0;
    }

    pub fn has_source(&self) -> bool {
        self.source_start != SOURCE_OFFSET_INVALID
    }

    pub fn try_source_range(&self) -> Option<SourceRange> {
        if self.has_source() {
            Some(SourceRange {
                start: self.source_start,
                length: self.source_length,
            })
        } else {
            None
        }
    }

    pub fn has_comments(&self) -> bool {
        self.flags.contains(ParseNodeFlags::HAS_COMMENTS)
    }

    /// The index range occupied by this node's children.
    pub fn child_range(&self) -> Range<usize> {
        if self.child_count == 0 {
            return 0..0;
        }
        let start = self.child_start as usize;
        start..start + usize::from(self.child_count)
    }
}

/// The parse tree itself: a flat array of nodes indexed by NodeOffset.
#[derive(Clone, Debug, Default)]
pub struct ParseNodeTree {
    nodes: Vec<ParseNode>,
}

impl ParseNodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node, returning its index.
    pub fn push(&mut self, node: ParseNode) -> NodeOffset {
        let offset = self.nodes.len() as NodeOffset;
        assert!(offset != NODE_OFFSET_INVALID, "tree is full");
        self.nodes.push(node);
        offset
    }

    pub fn at(&self, idx: NodeOffset) -> &ParseNode {
        &self.nodes[idx as usize]
    }

    pub fn at_mut(&mut self, idx: NodeOffset) -> &mut ParseNode {
        &mut self.nodes[idx as usize]
    }

    pub fn try_at(&self, idx: NodeOffset) -> Option<&ParseNode> {
        self.nodes.get(idx as usize)
    }

    /// Return the index of the `which`th child of `parent`, if it exists.
    pub fn get_child(&self, parent: NodeOffset, which: usize) -> Option<NodeOffset> {
        let node = self.try_at(parent)?;
        if which >= usize::from(node.child_count) {
            return None;
        }
        Some(node.child_start + which as NodeOffset)
    }

    /// Return the index of the parent of `node`, if it has one.
    pub fn get_parent(&self, node: NodeOffset) -> Option<NodeOffset> {
        let node = self.try_at(node)?;
        if node.parent == NODE_OFFSET_INVALID {
            None
        } else {
            Some(node.parent)
        }
    }

    /// Find the first entry node of type `entry_type` in a right-recursive list rooted at
    /// `node_list`, returning (entry, tail). The entry is the list element if found; the tail
    /// is the next list node to search, or None when the list ends. Either may independently
    /// be absent: some list nodes contain nothing, e.g. a job list matching a blank line.
    pub fn next_node_in_node_list(
        &self,
        node_list: NodeOffset,
        entry_type: ParseNodeType,
    ) -> (Option<NodeOffset>, Option<NodeOffset>) {
        let list_type = self.at(node_list).typ;
        // Paranoia - it doesn't make sense for a list type to contain itself.
        assert!(list_type != entry_type, "a list cannot contain itself");

        let mut list_cursor = Some(node_list);
        let mut list_entry = None;

        // Loop while we don't have an item but do have a list.
        while list_entry.is_none() {
            let Some(cursor) = list_cursor else {
                break;
            };
            let mut next_cursor = None;
            // Walk through the children.
            for child_idx in self.at(cursor).child_range() {
                let child = &self.nodes[child_idx];
                if child.typ == entry_type {
                    // This is the list entry.
                    list_entry = Some(child_idx as NodeOffset);
                } else if child.typ == list_type {
                    // This is the next in the list.
                    next_cursor = Some(child_idx as NodeOffset);
                }
            }
            // Go to the next cursor, even if it's absent.
            list_cursor = next_cursor;
        }

        debug_assert!(
            list_cursor.map_or(true, |c| self.at(c).typ == list_type),
            "tail must be a list node"
        );
        debug_assert!(
            list_entry.map_or(true, |e| self.at(e).typ == entry_type),
            "entry must have the entry type"
        );
        (list_entry, list_cursor)
    }
}
