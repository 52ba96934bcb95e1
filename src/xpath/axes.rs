//! XPath Axes Implementation
//!
//! Tree axes return nodes in proximity order: document order for forward
//! axes, nearest-first for `ancestor`, `preceding` and `preceding-sibling`.
//! Attributes are not tree nodes; the evaluator handles `attribute::`
//! itself, and `namespace::` is always empty.

use super::compiler::CompiledNodeTest;
use super::parser::Axis;
use crate::dom::{DocumentAccess, NodeId, NodeKind};

/// Navigate along an axis from a context node
pub fn navigate<D: DocumentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children_vec(context),
        Axis::Descendant => doc.descendants_vec(context),
        Axis::DescendantOrSelf => descendant_or_self_axis(doc, context),
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Ancestor => ancestor_axis(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestor_axis(doc, context));
            result
        }
        Axis::FollowingSibling => following_sibling_axis(doc, context),
        Axis::PrecedingSibling => preceding_sibling_axis(doc, context),
        Axis::Following => following_axis(doc, context),
        Axis::Preceding => preceding_axis(doc, context),
        Axis::Self_ => vec![context],
        Axis::Attribute | Axis::Namespace => Vec::new(),
    }
}

/// Whether the axis runs against document order
pub fn is_reverse(axis: Axis) -> bool {
    matches!(
        axis,
        Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
    )
}

fn descendant_or_self_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let descendants = doc.descendants_vec(context);
    let mut result = Vec::with_capacity(1 + descendants.len());
    result.push(context);
    result.extend(descendants);
    result
}

fn ancestor_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;

    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }

    result
}

fn following_sibling_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    let mut sibling = doc.next_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        sibling = doc.next_sibling_of(sib_id);
    }

    result
}

fn preceding_sibling_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();

    let mut sibling = doc.prev_sibling_of(context);
    while let Some(sib_id) = sibling {
        result.push(sib_id);
        sibling = doc.prev_sibling_of(sib_id);
    }

    result
}

/// following:: axis - all nodes after the context subtree, ancestors excluded
fn following_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = Some(context);

    while let Some(node) = current {
        let mut sibling = doc.next_sibling_of(node);
        while let Some(sib_id) = sibling {
            result.push(sib_id);
            result.extend(doc.descendants_vec(sib_id));
            sibling = doc.next_sibling_of(sib_id);
        }
        current = doc.parent_of(node);
    }

    result
}

/// preceding:: axis - all nodes before the context, ancestors excluded,
/// nearest first
fn preceding_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = Some(context);

    while let Some(node) = current {
        let mut sibling = doc.prev_sibling_of(node);
        while let Some(sib_id) = sibling {
            result.extend(doc.descendants_vec(sib_id).into_iter().rev());
            result.push(sib_id);
            sibling = doc.prev_sibling_of(sib_id);
        }
        current = doc.parent_of(node);
    }

    result
}

/// Check if a tree node matches a node test. Names compare in full,
/// prefix included.
pub fn matches_node_test<D: DocumentAccess>(
    doc: &D,
    node_id: NodeId,
    node_test: &CompiledNodeTest,
) -> bool {
    let Some(kind) = doc.node_kind_of(node_id) else {
        return false;
    };

    match node_test {
        CompiledNodeTest::Any => kind == NodeKind::Element,
        CompiledNodeTest::Name(name) => {
            kind == NodeKind::Element && doc.node_name(node_id) == Some(name.as_str())
        }
        CompiledNodeTest::QName(prefix, local) => {
            kind == NodeKind::Element
                && doc
                    .node_name(node_id)
                    .and_then(|n| n.split_once(':'))
                    .is_some_and(|(p, l)| p == prefix && l == local)
        }
        CompiledNodeTest::PrefixWildcard(prefix) => {
            kind == NodeKind::Element
                && doc
                    .node_name(node_id)
                    .and_then(|n| n.split_once(':'))
                    .is_some_and(|(p, _)| p == prefix)
        }
        CompiledNodeTest::Node => true,
        CompiledNodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        CompiledNodeTest::Comment => kind == NodeKind::Comment,
        CompiledNodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target
                    .as_deref()
                    .map_or(true, |t| doc.node_name(node_id) == Some(t))
        }
    }
}

/// Check if an attribute name matches a node test on the attribute axis
pub fn matches_attribute_test(name: &str, node_test: &CompiledNodeTest) -> bool {
    match node_test {
        CompiledNodeTest::Any | CompiledNodeTest::Node => true,
        CompiledNodeTest::Name(n) => name == n,
        CompiledNodeTest::QName(prefix, local) => name
            .split_once(':')
            .is_some_and(|(p, l)| p == prefix && l == local),
        CompiledNodeTest::PrefixWildcard(prefix) => {
            name.split_once(':').is_some_and(|(p, _)| p == prefix)
        }
        _ => false,
    }
}
