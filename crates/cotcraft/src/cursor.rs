//! Iteration state over a repeated structure.

use crate::{compiled::AttrPath, event::NodePath};

/// Position within an array walk, optionally bound to existing detail nodes.
///
/// A plain field list is walked with a single-element cursor. Arrays nest a new
/// cursor under the current one.
#[derive(Debug)]
pub struct Cursor<'p> {
    index: usize,
    size: usize,
    nodes: Option<Vec<NodePath>>,
    parent_node: Option<NodePath>,
    array: Option<&'p AttrPath>,
    parent: Option<&'p Cursor<'p>>,
}

impl<'p> Cursor<'p> {
    /// A top-level cursor over one element.
    pub fn single() -> Self {
        Self::sized(1, None)
    }

    /// A cursor over `size` elements below `parent`.
    pub fn nested(size: usize, parent: &'p Cursor<'p>) -> Self {
        Self::sized(size, Some(parent))
    }

    fn sized(size: usize, parent: Option<&'p Cursor<'p>>) -> Self {
        Self {
            index: 0,
            size,
            nodes: None,
            parent_node: None,
            array: None,
            parent,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn first(&mut self) {
        self.index = 0;
    }

    pub fn next(&mut self) {
        self.index += 1;
    }

    pub fn in_bounds(&self) -> bool {
        self.index < self.size
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.size
    }

    /// Binds the cursor to existing nodes; the size follows the node count.
    pub fn bind_nodes(&mut self, nodes: Vec<NodePath>) {
        self.size = nodes.len();
        self.nodes = Some(nodes);
    }

    /// Node at the current index, if the cursor is bound and in bounds.
    pub fn current_node(&self) -> Option<&NodePath> {
        if !self.in_bounds() {
            return None;
        }
        self.nodes.as_ref()?.get(self.index)
    }

    pub fn bind_parent(&mut self, node: NodePath) {
        self.parent_node = Some(node);
    }

    pub fn parent_node(&self) -> Option<&NodePath> {
        self.parent_node.as_ref()
    }

    pub fn parent(&self) -> Option<&Cursor<'p>> {
        self.parent
    }

    /// Marks the cursor as walking the elements of the array at `path`.
    pub fn bind_array(&mut self, path: &'p AttrPath) {
        self.array = Some(path);
    }

    pub fn array(&self) -> Option<&'p AttrPath> {
        self.array
    }

    /// Indices from the outermost cursor inwards, e.g. `[0][3]`.
    pub fn trail(&self) -> String {
        let outer = self.parent.map(Cursor::trail).unwrap_or_default();
        format!("{outer}[{}]", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        let mut cursor = Cursor::single();
        assert!(cursor.in_bounds());
        assert!(cursor.is_first());
        assert!(cursor.is_last());

        cursor.next();
        assert!(!cursor.in_bounds());
    }

    #[test]
    fn test_walk() {
        let mut cursor = Cursor::single();
        cursor.size = 3;

        let mut seen = Vec::new();
        cursor.first();
        while cursor.in_bounds() {
            seen.push((cursor.index(), cursor.is_first(), cursor.is_last()));
            cursor.next();
        }

        assert_eq!(
            seen,
            vec![(0, true, false), (1, false, false), (2, false, true)]
        );
    }

    #[test]
    fn test_empty_is_never_in_bounds() {
        let root = Cursor::single();
        let cursor = Cursor::nested(0, &root);
        assert!(!cursor.in_bounds());
        assert!(cursor.current_node().is_none());
    }

    #[test]
    fn test_bind_nodes() {
        let root = Cursor::single();
        let mut cursor = Cursor::nested(5, &root);
        cursor.bind_nodes(vec![NodePath::root().child(1), NodePath::root().child(4)]);

        assert_eq!(cursor.size(), 2);
        assert_eq!(cursor.current_node(), Some(&NodePath::root().child(1)));
        cursor.next();
        assert_eq!(cursor.current_node(), Some(&NodePath::root().child(4)));
        cursor.next();
        assert_eq!(cursor.current_node(), None);
    }

    #[test]
    fn test_nesting() {
        let mut root = Cursor::single();
        root.next();
        let root = root;
        let mut inner = Cursor::nested(4, &root);
        inner.next();
        inner.next();

        assert_eq!(inner.trail(), "[1][2]");
        assert!(inner.parent().is_some_and(|parent| parent.parent().is_none()));
        assert!(inner.array().is_none());
    }
}
