//! Call graph construction: variant-type-analysis (VTA) over the built
//! [`Program`] (§4.5).
//!
//! Nodes are every function in the program (including synthetics and
//! imports) plus the program's synthetic root; edges carry the originating
//! call site. Direct edges are exact; indirect edges fan out to every
//! function [`Program::signature_compatible`] reports for the call site's
//! declared signature.

use std::collections::HashMap;

use crate::ir::{CallSite, CallTarget, FunctionId, Program};

/// One call-graph edge, carrying the call site that produced it (needed by
/// [`crate::traversal`]'s pruning rule, which inspects the incoming edge's
/// call site to classify its arguments).
#[derive(Debug, Clone)]
pub struct Edge {
    pub caller: FunctionId,
    pub callee: FunctionId,
    /// The call site this edge originates from, shared across every edge
    /// produced by the same indirect call site.
    pub site: CallSiteRef,
}

/// A reference to a call site by its owning function and position within
/// that function's body, avoiding a lifetime on [`Edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSiteRef {
    pub function: FunctionId,
    pub index: usize,
}

/// The built call graph (§4.5): an adjacency list keyed by caller, plus the
/// program it was built over (edges reference the program's functions and
/// call sites rather than owning copies).
#[derive(Debug)]
pub struct CallGraph {
    edges: HashMap<FunctionId, Vec<Edge>>,
}

impl CallGraph {
    /// Outgoing edges of `id`, in the order the call graph produced them
    /// (source order of call sites, then signature-compatibility order for
    /// indirect fan-out) — §4.6 "Tie-breaking: edges are considered in the
    /// order supplied by the call graph."
    #[must_use]
    pub fn edges_from(&self, id: FunctionId) -> &[Edge] {
        self.edges.get(&id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn call_site<'p>(&self, program: &'p Program, site: CallSiteRef) -> &'p CallSite {
        &program.function(site.function).body[site.index]
    }
}

/// Build the call graph over every function in `program` (§4.5).
#[must_use]
pub fn build_call_graph(program: &Program) -> CallGraph {
    crate::instrument_block!("call_graph", {
        let mut edges: HashMap<FunctionId, Vec<Edge>> = HashMap::new();

        for function in program.functions() {
            for (index, site) in function.body.iter().enumerate() {
                let site_ref = CallSiteRef {
                    function: function.id,
                    index,
                };
                match &site.target {
                    CallTarget::Direct(callee) => {
                        edges.entry(function.id).or_default().push(Edge {
                            caller: function.id,
                            callee: *callee,
                            site: site_ref,
                        });
                    }
                    CallTarget::Indirect { declared_signature } => {
                        for callee in program.signature_compatible(declared_signature) {
                            edges.entry(function.id).or_default().push(Edge {
                                caller: function.id,
                                callee,
                                site: site_ref,
                            });
                        }
                    }
                }
            }
        }

        CallGraph { edges }
    })
}
