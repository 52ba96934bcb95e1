//! Query execution against a shared tree cell

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::collection::NodeCollection;
use crate::dom::{NodeId, Tree};
use crate::element::NodeHandle;
use crate::error::{Error, Result};
use crate::selector::SelectorTranslator;
use crate::xpath::{evaluate_compiled_from, XPathValue};

/// Run a query from `context` and wrap the matched nodes, in document order
pub(crate) fn select(
    tree: &Rc<RefCell<Tree>>,
    translator: &Arc<SelectorTranslator>,
    context: NodeId,
    query: &str,
) -> Result<NodeCollection> {
    let compiled = translator.compile(query)?;
    let value = evaluate_compiled_from(&*tree.borrow(), context, &compiled).map_err(|reason| {
        Error::Query {
            query: query.to_string(),
            reason,
        }
    })?;

    let ids = match value {
        XPathValue::NodeSet(ids) => ids,
        other => {
            return Err(Error::Query {
                query: query.to_string(),
                reason: format!("expected a node-set, got {:?}", other),
            })
        }
    };

    let weak = Rc::downgrade(tree);
    Ok(ids
        .into_iter()
        .map(|id| NodeHandle::new(weak.clone(), id, Arc::clone(translator)))
        .collect())
}

/// Translate a selector and run it from `context`
pub(crate) fn select_css(
    tree: &Rc<RefCell<Tree>>,
    translator: &Arc<SelectorTranslator>,
    context: NodeId,
    selector: &str,
) -> Result<NodeCollection> {
    let query = translator.translate(selector)?;
    select(tree, translator, context, &query)
}

/// Position for `index` in a sequence of `len` items; negative counts from the end
pub(crate) fn resolve_index(len: usize, index: isize) -> Option<usize> {
    if index >= 0 {
        let index = index as usize;
        (index < len).then_some(index)
    } else {
        len.checked_sub(index.unsigned_abs())
    }
}
