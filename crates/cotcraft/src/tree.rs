//! Locating and creating detail nodes for an [AttrPath] at a cursor position.
//!
//! A path below the element path of an enclosing array walk resolves under the
//! element that array's cursor is on, innermost array first. Remaining segments
//! resolve to the first child of that name. Outside any array element the leaf
//! resolves to the match at the cursor index.

use crate::{
    compiled::AttrPath,
    cursor::Cursor,
    errors::DecodeError,
    event::{Event, Node, NodePath},
    filler::Filler,
};

/// Auto-fill context; decoding without one fails on missing nodes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fill<'a> {
    pub message_type: &'a str,
}

/// Which sibling the last segment resolves to, and how many siblings must exist.
#[derive(Debug, Clone, Copy)]
struct Leaf {
    index: usize,
    count: usize,
}

const FIRST: Leaf = Leaf { index: 0, count: 1 };

/// Innermost cursor in the chain walking an array whose element path prefixes `nodes`.
fn enclosing<'c, 'p>(cursor: &'c Cursor<'p>, nodes: &[String]) -> Option<(&'c Cursor<'p>, &'p AttrPath)> {
    let mut current = Some(cursor);
    while let Some(cursor) = current {
        if let Some(array) = cursor.array().filter(|array| nodes.starts_with(&array.nodes)) {
            return Some((cursor, array));
        }
        current = cursor.parent();
    }

    None
}

fn field_leaf(cursor: &Cursor<'_>, nodes: &[String]) -> Leaf {
    if enclosing(cursor, nodes).is_some() {
        return FIRST;
    }

    Leaf {
        index: if cursor.size() <= 1 { 0 } else { cursor.index() },
        count: cursor.size().max(1),
    }
}

/// Walks (and with `fill`, creates) the nodes above an element.
pub(crate) fn resolve_parent(
    event: &mut Event,
    nodes: &[String],
    cursor: &Cursor<'_>,
    fill: Option<Fill<'_>>,
) -> Result<NodePath, DecodeError> {
    resolve_nodes(event, nodes, Some(cursor), FIRST, fill)
}

/// Resolves the leaf node of `path` for the cursor position.
pub(crate) fn resolve_element(
    event: &mut Event,
    path: &AttrPath,
    cursor: &Cursor<'_>,
    fill: Option<Fill<'_>>,
) -> Result<NodePath, DecodeError> {
    let leaf = field_leaf(cursor, &path.nodes);
    resolve_nodes(event, &path.nodes, Some(cursor), leaf, fill)
}

fn resolve_nodes(
    event: &mut Event,
    nodes: &[String],
    scope: Option<&Cursor<'_>>,
    leaf: Leaf,
    fill: Option<Fill<'_>>,
) -> Result<NodePath, DecodeError> {
    let (mut path, rest) = match scope.and_then(|cursor| enclosing(cursor, nodes)) {
        Some((outer, array)) => (
            resolve_current(event, outer, array, fill)?,
            &nodes[array.nodes.len()..],
        ),
        None => {
            if event.detail.is_none() {
                if fill.is_none() {
                    return Err(DecodeError::MissingNode("detail".to_string()));
                }
                event.detail = Some(Node::new("detail"));
            }
            (NodePath::root(), nodes)
        }
    };

    let last = rest.len().saturating_sub(1);
    for (i, name) in rest.iter().enumerate() {
        let at = if i == last { leaf } else { FIRST };
        path = child_or_fill(event, &path, name, at, fill)?;
    }

    Ok(path)
}

/// The element `cursor` is on; decoding creates it and its siblings up to the cursor size.
fn resolve_current(
    event: &mut Event,
    cursor: &Cursor<'_>,
    array: &AttrPath,
    fill: Option<Fill<'_>>,
) -> Result<NodePath, DecodeError> {
    if let Some(node) = cursor.current_node() {
        return Ok(node.clone());
    }

    let leaf = Leaf {
        index: cursor.index(),
        count: cursor.size(),
    };
    resolve_nodes(event, &array.nodes, cursor.parent(), leaf, fill)
}

fn child_or_fill(
    event: &mut Event,
    parent: &NodePath,
    name: &str,
    leaf: Leaf,
    fill: Option<Fill<'_>>,
) -> Result<NodePath, DecodeError> {
    let missing = || DecodeError::MissingNode(name.to_string());

    let count = event.node(parent).map_or(0, |node| node.count_children(name));
    if count < leaf.count {
        let fill = fill.ok_or_else(missing)?;
        let filler = Filler::for_node(name);
        for _ in count..leaf.count {
            filler.fill(event, parent, name, fill.message_type)?;
        }
    }

    event
        .node(parent)
        .and_then(|node| node.nth_child_index(name, leaf.index))
        .map(|index| parent.child(index))
        .ok_or_else(missing)
}

/// Writes `value` into the attribute (or text content) `path` names.
pub(crate) fn insert_attr(
    event: &mut Event,
    path: &AttrPath,
    cursor: &Cursor<'_>,
    value: String,
    fill: Option<Fill<'_>>,
) -> Result<(), DecodeError> {
    let element = resolve_element(event, path, cursor, fill)?;
    let node = event
        .node_mut(&element)
        .ok_or_else(|| DecodeError::MissingNode(path.leaf().to_string()))?;

    if path.attr.is_empty() {
        node.content = value;
    } else {
        node.set_attr(&path.attr, value);
    }

    Ok(())
}

fn find_nodes(event: &Event, nodes: &[String], scope: Option<&Cursor<'_>>, leaf: Leaf) -> Option<NodePath> {
    let (mut path, rest) = match scope.and_then(|cursor| enclosing(cursor, nodes)) {
        Some((outer, array)) => (find_current(event, outer, array)?, &nodes[array.nodes.len()..]),
        None => {
            event.detail.as_ref()?;
            (NodePath::root(), nodes)
        }
    };

    let last = rest.len().saturating_sub(1);
    for (i, name) in rest.iter().enumerate() {
        let n = if i == last { leaf.index } else { 0 };
        let index = event.node(&path)?.nth_child_index(name, n)?;
        path = path.child(index);
    }

    Some(path)
}

fn find_current(event: &Event, cursor: &Cursor<'_>, array: &AttrPath) -> Option<NodePath> {
    if let Some(node) = cursor.current_node() {
        return Some(node.clone());
    }

    let leaf = Leaf {
        index: cursor.index(),
        count: cursor.size(),
    };
    find_nodes(event, &array.nodes, cursor.parent(), leaf)
}

/// Read-only lookup of the leaf node of `path` at the cursor position.
pub(crate) fn find_element(event: &Event, path: &AttrPath, cursor: &Cursor<'_>) -> Option<NodePath> {
    find_nodes(event, &path.nodes, Some(cursor), field_leaf(cursor, &path.nodes))
}

/// Every node matching the leaf of `path` below its parent at the cursor position,
/// in document order.
pub(crate) fn find_elements(event: &Event, path: &AttrPath, cursor: &Cursor<'_>) -> Vec<NodePath> {
    let Some(parent) = find_nodes(event, path.parents(), Some(cursor), FIRST) else {
        return Vec::new();
    };

    event
        .node(&parent)
        .map(|node| {
            node.child_indices(path.leaf())
                .into_iter()
                .map(|index| parent.child(index))
                .collect()
        })
        .unwrap_or_default()
}

/// Attribute (or text content) at `path`; `None` when the node is absent, `""` when
/// only the attribute is.
pub(crate) fn read_attr(event: &Event, path: &AttrPath, cursor: &Cursor<'_>) -> Option<String> {
    let element = find_element(event, path, cursor)?;
    Some(read_node_attr(event.node(&element)?, &path.attr))
}

pub(crate) fn read_node_attr(node: &Node, attr: &str) -> String {
    if attr.is_empty() {
        node.content.clone()
    } else {
        node.attr(attr).unwrap_or_default().to_string()
    }
}
