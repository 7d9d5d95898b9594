//! CFI resolution against a parsed document tree
//!
//! Walks the steps of a CFI from a root element and returns the element it
//! lands on. Every failure (bad syntax, ranges, a step with no match) ends
//! in `None`; nothing here returns an error to the caller.

use roxmltree::Node;

use super::parser::parse;
use super::types::{Cfi, CfiStep, StepType};

/// Counter value before the first element child is visited.
const ORDINAL_BASE: u32 = 2;

/// Resolve a CFI string to an element below `root`.
pub fn resolve<'a, 'input>(root: Node<'a, 'input>, cfi: &str) -> Option<Node<'a, 'input>> {
    match parse(cfi) {
        Ok(parsed) => resolve_parsed(root, &parsed),
        Err(e) => {
            tracing::debug!(cfi, error = %e, "Malformed CFI");
            None
        }
    }
}

/// Resolve an already parsed CFI to an element below `root`.
pub fn resolve_parsed<'a, 'input>(root: Node<'a, 'input>, cfi: &Cfi) -> Option<Node<'a, 'input>> {
    if cfi.is_range() {
        tracing::debug!(cfi = %cfi, "Range CFIs are not supported");
        return None;
    }

    let mut current = root;
    for step in cfi.content_steps() {
        current = match apply_step(current, step) {
            Some(next) => next,
            None => {
                tracing::debug!(cfi = %cfi, step = %step, "CFI step has no match");
                return None;
            }
        };
    }

    Some(current)
}

fn apply_step<'a, 'input>(current: Node<'a, 'input>, step: &CfiStep) -> Option<Node<'a, 'input>> {
    if let Some(ref id) = step.id_assertion {
        return find_by_id(current, id);
    }

    match step.step_type {
        StepType::Element(ordinal) => element_at_ordinal(current, ordinal),
        StepType::Indirection => None,
    }
}

/// First element below `node` (in document order) whose `id` equals `id`.
fn find_by_id<'a, 'input>(node: Node<'a, 'input>, id: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| n.is_element() && n.attribute("id") == Some(id))
}

/// Element child reached when the running counter hits `ordinal`.
///
/// The counter advances by two per element child, text nodes are not
/// counted, so odd ordinals never match.
fn element_at_ordinal<'a, 'input>(node: Node<'a, 'input>, ordinal: u32) -> Option<Node<'a, 'input>> {
    let mut position = ORDINAL_BASE;
    for child in node.children().filter(Node::is_element) {
        position += 2;
        if position == ordinal {
            return Some(child);
        }
        if position > ordinal {
            break;
        }
    }
    None
}
