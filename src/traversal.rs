//! Depth-first path search with spurious-edge pruning (§4.6) — the core of
//! the analysis and its largest single component.
//!
//! The search walks the call graph from a candidate caller looking for any
//! node satisfying the callee predicate, maintaining a global visited set
//! (cycles are skipped, never revisited) and a stack of the edges taken so
//! far. At each step, outgoing edges of the current node are filtered
//! through [`admits`] before being followed, using the stack's last edge as
//! the "incoming" edge that might disqualify them (§4.6's pruning rule only
//! applies once the stack is non-empty — the initial call from the caller
//! itself is never pruned, since there is no incoming edge yet to supply
//! evidence against it).
//!
//! Per §9 Design Notes' cleaner variant, the admit decision is structured
//! as: compute each function-typed parameter's bound value once per node,
//! then admit an edge if *any* parameter's bound-value evidence admits it;
//! prune only when every parameter fails to admit.

use std::collections::HashSet;

use crate::callgraph::{CallGraph, Edge};
use crate::ir::{ArgOperand, CallSite, FunctionId, ParamId, Program};

/// What is statically known, at a call site, about the value bound to one
/// of the callee's function-typed parameters (§4.6 step 2, §9 "tagged
/// variants for argument classification").
#[derive(Debug, Clone, PartialEq, Eq)]
enum BoundValue {
    Function(FunctionId),
    /// Unknown: forwarded from the enclosing function's own parameter, or
    /// any other unclassifiable operand. Can never disqualify an edge.
    Unknown,
}

/// Search the call graph from `start` for any node satisfying `is_callee`.
/// Returns `true` if a path exists. Grounded on §4.6: global visited set,
/// stack-based DFS, pruning applied to each candidate outgoing edge before
/// it is followed.
#[must_use]
pub fn has_path(
    program: &Program,
    graph: &CallGraph,
    start: FunctionId,
    is_callee: &impl Fn(FunctionId) -> bool,
) -> bool {
    crate::instrument_block!("traversal", {
        let mut visited: HashSet<FunctionId> = HashSet::new();
        let mut stack: Vec<Edge> = Vec::new();
        search(program, graph, start, is_callee, &mut visited, &mut stack)
    })
}

fn search(
    program: &Program,
    graph: &CallGraph,
    node: FunctionId,
    is_callee: &impl Fn(FunctionId) -> bool,
    visited: &mut HashSet<FunctionId>,
    stack: &mut Vec<Edge>,
) -> bool {
    if !visited.insert(node) {
        return false;
    }
    if is_callee(node) {
        return true;
    }

    for edge in graph.edges_from(node) {
        let admitted = match stack.last() {
            None => true,
            Some(incoming) => admits(program, graph, incoming, edge),
        };
        if !admitted {
            continue;
        }
        stack.push(edge.clone());
        let found = search(program, graph, edge.callee, is_callee, visited, stack);
        stack.pop();
        if found {
            return true;
        }
    }
    false
}

/// The pruning predicate (§4.6): should outgoing edge `out` (from node `n`,
/// the common callee of `inc` and source of `out`) be admitted given the
/// evidence in `inc`, the edge by which the traversal reached `n`?
fn admits(program: &Program, graph: &CallGraph, inc: &Edge, out: &Edge) -> bool {
    let n = program.function(inc.callee);
    debug_assert_eq!(inc.callee, out.caller);

    // Step 1: no function-typed parameters at all means this node's
    // indirect edges cannot be "the call through one of n's parameters" —
    // admit unconditionally.
    if !n.has_function_typed_param() {
        return true;
    }

    let inc_site = graph.call_site(program, inc.site);
    let out_site = graph.call_site(program, out.site);

    // Step 2: per function-typed parameter of n, compute its bound value at
    // inc's call site and ask whether that evidence admits out.
    let receiver_offset = usize::from(inc_site.is_invoke);
    let mut any_param_admits = false;
    let mut saw_function_typed_param = false;

    for (pos, &param_type_is_fn) in n
        .param_types
        .iter()
        .map(crate::ir::is_function_typed)
        .enumerate()
    {
        if !param_type_is_fn {
            continue;
        }
        saw_function_typed_param = true;
        let param_id = n.params[pos];
        let arg_index = pos + receiver_offset;
        let bound = classify_arg(inc_site, arg_index);

        if admits_for_param(&bound, param_id, out_site, out.callee) {
            any_param_admits = true;
            break;
        }
    }

    if !saw_function_typed_param {
        // Defensive: `has_function_typed_param` said yes but the positional
        // scan found none (param_types/params length mismatch). Admit,
        // matching the "cannot disqualify" default.
        return true;
    }

    any_param_admits
}

/// Classify the argument operand at `index` in `site`, per §4.6 step 2's
/// tagged-variant sum (named function / closure / forwarded parameter /
/// other).
fn classify_arg(site: &CallSite, index: usize) -> BoundValue {
    match site.args.get(index) {
        Some(ArgOperand::NamedFunction(id) | ArgOperand::Closure(id)) => BoundValue::Function(*id),
        Some(ArgOperand::Parameter(_) | ArgOperand::Other) | None => BoundValue::Unknown,
    }
}

/// Whether the evidence for one function-typed parameter of `n` admits the
/// edge to `out_callee` via `out_site` (§4.6 step 2's three admit
/// sub-rules, applied as a disjunction per §9's cleaner restatement).
fn admits_for_param(
    bound: &BoundValue,
    param_id: ParamId,
    out_site: &CallSite,
    out_callee: FunctionId,
) -> bool {
    let BoundValue::Function(bound_fn) = bound else {
        // Unknown at this call site: cannot disqualify, so admit.
        return true;
    };

    // "If the bound function equals the callee of e: admit (this edge is
    // the real call)."
    if *bound_fn == out_callee {
        return true;
    }

    // "If the parameter symbol of n appears by name [identity] among the
    // arguments of the call site of e: admit (the function value is being
    // passed down, not called)."
    let forwarded_by_identity = out_site
        .args
        .iter()
        .any(|a| matches!(a, ArgOperand::Parameter(p) if *p == param_id));
    if forwarded_by_identity {
        return true;
    }

    out_site.args.iter().any(|a| match a {
        ArgOperand::NamedFunction(id) | ArgOperand::Closure(id) => id == bound_fn,
        _ => false,
    })
}
