//! Stable CSS path generation for arbitrary document nodes.

use std::fmt::Write as _;

/// Minimal view of a document node needed to derive a selector path.
///
/// Adapters implement this for their node handles; the generator never
/// touches the document directly.
pub trait DomNode: Sized {
    /// Lowercase tag name.
    fn tag(&self) -> String;

    /// The `id` attribute, when present.
    fn id_attr(&self) -> Option<String>;

    /// Parent element; `None` at the root or for a detached node.
    fn parent(&self) -> Option<Self>;

    /// 1-based position among same-tag preceding siblings.
    fn nth_of_type(&self) -> usize;
}

/// Derive a stable CSS path for `node`.
///
/// Walks ancestors root-ward, one segment per element: `tag#id` terminates
/// the walk (ids are assumed globally unique), otherwise `tag` plus
/// `:nth-of-type(n)` when the node is not the first of its tag among its
/// siblings. Segments join root-most first with `" > "`. A detached node
/// with no parent yields a one-segment path. Applying the generator to the
/// element its own output selects re-selects the same element as long as
/// the document is unchanged.
#[must_use]
pub fn generate_selector<N: DomNode>(node: N) -> String {
    let mut path = Vec::new();
    let mut current = node;

    loop {
        let mut segment = current.tag();

        if let Some(id) = current.id_attr() {
            segment.push('#');
            segment.push_str(&id);
            path.push(segment);
            break;
        }

        let nth = current.nth_of_type();
        if nth != 1 {
            let _ = write!(segment, ":nth-of-type({nth})");
        }
        path.push(segment);

        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    path.reverse();
    path.join(" > ")
}
