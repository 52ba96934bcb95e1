//! XPath Evaluation Engine
//!
//! Evaluates compiled XPath expressions against any `DocumentAccess`.
//! Node sets leaving a step, a filter or a union are in document order,
//! which is recomputed per evaluation since the tree is mutable.

use std::collections::{HashMap, HashSet};

use super::axes::{matches_attribute_test, matches_node_test, navigate};
use super::compiler::{CompiledExpr, Op};
use super::functions;
use super::parser::{Axis, BinaryOp};
use super::value::{parse_number, XPathValue};
use crate::dom::{node_string_value, DocumentAccess, NodeId};

/// Evaluation context - generic over document type
pub struct EvalContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
    order: &'a HashMap<NodeId, usize>,
}

impl<'a, D: DocumentAccess> EvalContext<'a, D> {
    fn with_node(&self, node: NodeId, position: usize, size: usize) -> Self {
        EvalContext {
            doc: self.doc,
            context_node: node,
            context_position: position,
            context_size: size,
            order: self.order,
        }
    }

    fn sort_document_order(&self, nodes: &mut [NodeId]) {
        nodes.sort_by_key(|id| self.order.get(id).copied().unwrap_or(usize::MAX));
    }
}

/// Evaluate an XPath expression with the document node as context
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate<D: DocumentAccess>(doc: &D, xpath: &str) -> Result<XPathValue, String> {
    evaluate_from_node(doc, doc.document_node_id(), xpath)
}

/// Evaluate an XPath expression from a specific context node
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node<D: DocumentAccess>(
    doc: &D,
    context_node: NodeId,
    xpath: &str,
) -> Result<XPathValue, String> {
    let compiled = super::compiler::compile(xpath)?;
    evaluate_compiled_from(doc, context_node, &compiled)
}

/// Evaluate an already compiled expression from a context node
pub fn evaluate_compiled_from<D: DocumentAccess>(
    doc: &D,
    context_node: NodeId,
    expr: &CompiledExpr,
) -> Result<XPathValue, String> {
    let order = doc.document_order();
    let context = EvalContext {
        doc,
        context_node,
        context_position: 1,
        context_size: 1,
        order: &order,
    };
    evaluate_compiled(expr, &context)
}

/// Evaluate a compiled expression
pub fn evaluate_compiled<D: DocumentAccess>(
    expr: &CompiledExpr,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, String> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            Op::Root => {
                stack.push(XPathValue::single_node(ctx.doc.document_node_id()));
            }

            Op::Context => {
                stack.push(XPathValue::single_node(ctx.context_node));
            }

            Op::Parent => {
                let current = stack
                    .pop()
                    .unwrap_or(XPathValue::single_node(ctx.context_node));
                let Some(nodes) = current.into_nodeset() else {
                    stack.push(XPathValue::empty_nodeset());
                    continue;
                };
                let mut seen = HashSet::with_capacity(nodes.len());
                let mut parents = Vec::with_capacity(nodes.len());
                for node in nodes {
                    if let Some(parent) = ctx.doc.parent_of(node) {
                        if seen.insert(parent) {
                            parents.push(parent);
                        }
                    }
                }
                ctx.sort_document_order(&mut parents);
                stack.push(XPathValue::NodeSet(parents));
            }

            Op::Navigate(axis, node_test, predicates) => {
                let current = stack
                    .pop()
                    .unwrap_or(XPathValue::single_node(ctx.context_node));
                let Some(nodes) = current.into_nodeset() else {
                    return Err("Location step applied to a non-node-set value".to_string());
                };

                if *axis == Axis::Attribute {
                    if !predicates.is_empty() {
                        return Err("Predicates on attribute steps are not supported".to_string());
                    }
                    let mut values = Vec::new();
                    for node in nodes {
                        for (name, value) in ctx.doc.get_attribute_values(node) {
                            if matches_attribute_test(name, node_test) {
                                values.push(value.to_string());
                            }
                        }
                    }
                    stack.push(XPathValue::StringList(values));
                    continue;
                }

                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());
                for node in nodes {
                    let mut candidates: Vec<NodeId> = navigate(ctx.doc, node, *axis)
                        .into_iter()
                        .filter(|&candidate| matches_node_test(ctx.doc, candidate, node_test))
                        .collect();
                    for pred in predicates {
                        candidates = apply_predicate(candidates, pred, ctx)?;
                    }
                    for candidate in candidates {
                        if seen.insert(candidate) {
                            result.push(candidate);
                        }
                    }
                }
                ctx.sort_document_order(&mut result);
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Predicate(pred_expr) => {
                let current = stack.pop().unwrap_or_default();
                let Some(nodes) = current.into_nodeset() else {
                    return Err("Predicate applied to a non-node-set value".to_string());
                };
                stack.push(XPathValue::NodeSet(apply_predicate(nodes, pred_expr, ctx)?));
            }

            Op::Union => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();

                match (left, right) {
                    (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
                        let mut seen: HashSet<NodeId> = l.iter().copied().collect();
                        let mut result = l;
                        result.reserve(r.len());
                        for node in r {
                            if seen.insert(node) {
                                result.push(node);
                            }
                        }
                        ctx.sort_document_order(&mut result);
                        stack.push(XPathValue::NodeSet(result));
                    }
                    _ => {
                        return Err("Union requires two node-sets".to_string());
                    }
                }
            }

            Op::Number(n) => {
                stack.push(XPathValue::Number(*n));
            }

            Op::String(s) => {
                stack.push(XPathValue::String(s.clone()));
            }

            Op::Negate => {
                let val = stack.pop().unwrap_or(XPathValue::Number(0.0));
                stack.push(XPathValue::Number(-functions::resolve_number(&val, ctx.doc)));
            }

            Op::Binary(op) => {
                let right = stack.pop().unwrap_or(XPathValue::Number(0.0));
                let left = stack.pop().unwrap_or(XPathValue::Number(0.0));
                let number = |v: &XPathValue| functions::resolve_number(v, ctx.doc);

                let result = match op {
                    BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
                    BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
                    BinaryOp::Eq
                    | BinaryOp::NotEq
                    | BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq => XPathValue::Boolean(compare_values(ctx.doc, &left, &right, *op)),
                    BinaryOp::Add => XPathValue::Number(number(&left) + number(&right)),
                    BinaryOp::Sub => XPathValue::Number(number(&left) - number(&right)),
                    BinaryOp::Mul => XPathValue::Number(number(&left) * number(&right)),
                    BinaryOp::Div => XPathValue::Number(number(&left) / number(&right)),
                    BinaryOp::Mod => XPathValue::Number(number(&left) % number(&right)),
                };

                stack.push(result);
            }

            Op::Call(name, arg_count) => {
                let split = stack.len().saturating_sub(*arg_count);
                let args = stack.split_off(split);

                let result = functions::call(
                    name,
                    args,
                    ctx.doc,
                    ctx.context_node,
                    ctx.context_position,
                    ctx.context_size,
                )?;

                stack.push(result);
            }
        }
    }

    Ok(stack.pop().unwrap_or_default())
}

/// Keep the nodes for which the predicate holds. `nodes` must be in
/// proximity order; a numeric result selects by position.
fn apply_predicate<D: DocumentAccess>(
    nodes: Vec<NodeId>,
    pred: &CompiledExpr,
    ctx: &EvalContext<'_, D>,
) -> Result<Vec<NodeId>, String> {
    let size = nodes.len();
    let mut filtered = Vec::new();

    for (i, node) in nodes.into_iter().enumerate() {
        let pred_ctx = ctx.with_node(node, i + 1, size);
        let include = match evaluate_compiled(pred, &pred_ctx)? {
            XPathValue::Number(n) => (i + 1) as f64 == n,
            other => other.to_boolean(),
        };
        if include {
            filtered.push(node);
        }
    }

    Ok(filtered)
}

/// String values of a node set or attribute list, None for scalars
fn set_strings<D: DocumentAccess>(doc: &D, value: &XPathValue) -> Option<Vec<String>> {
    match value {
        XPathValue::NodeSet(nodes) => Some(nodes.iter().map(|&n| node_string_value(doc, n)).collect()),
        XPathValue::StringList(list) => Some(list.clone()),
        _ => None,
    }
}

/// XPath 1.0 comparison: a set compares true if any member does
fn compare_values<D: DocumentAccess>(
    doc: &D,
    left: &XPathValue,
    right: &XPathValue,
    op: BinaryOp,
) -> bool {
    match (set_strings(doc, left), set_strings(doc, right)) {
        (Some(l), Some(r)) => l
            .iter()
            .any(|a| r.iter().any(|b| compare_strings(a, b, op))),
        (Some(l), None) => compare_set_with_scalar(&l, right, op, false),
        (None, Some(r)) => compare_set_with_scalar(&r, left, op, true),
        (None, None) => compare_scalars(left, right, op),
    }
}

fn compare_set_with_scalar(set: &[String], scalar: &XPathValue, op: BinaryOp, swapped: bool) -> bool {
    match scalar {
        XPathValue::Boolean(b) => {
            let set_value = XPathValue::Boolean(!set.is_empty());
            let scalar_value = XPathValue::Boolean(*b);
            if swapped {
                compare_scalars(&scalar_value, &set_value, op)
            } else {
                compare_scalars(&set_value, &scalar_value, op)
            }
        }
        XPathValue::Number(n) => set.iter().any(|s| {
            let v = parse_number(s);
            if swapped {
                compare_numbers(*n, v, op)
            } else {
                compare_numbers(v, *n, op)
            }
        }),
        other => {
            let o = other.to_string_value();
            set.iter().any(|s| {
                if swapped {
                    compare_strings(&o, s, op)
                } else {
                    compare_strings(s, &o, op)
                }
            })
        }
    }
}

fn compare_strings(a: &str, b: &str, op: BinaryOp) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        _ => compare_numbers(parse_number(a), parse_number(b), op),
    }
}

fn compare_scalars(left: &XPathValue, right: &XPathValue, op: BinaryOp) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let either = |f: fn(&XPathValue) -> bool| f(left) || f(right);
            let equal = if either(|v| matches!(v, XPathValue::Boolean(_))) {
                left.to_boolean() == right.to_boolean()
            } else if either(|v| matches!(v, XPathValue::Number(_))) {
                left.to_number() == right.to_number()
            } else {
                left.to_string_value() == right.to_string_value()
            };
            (op == BinaryOp::Eq) == equal
        }
        _ => compare_numbers(left.to_number(), right.to_number(), op),
    }
}

fn compare_numbers(a: f64, b: f64, op: BinaryOp) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::GtEq => a >= b,
        _ => false,
    }
}
