//! Transition returned by a node after it runs.

/// What the graph does after a node returns.
///
/// `Continue` follows the node's outgoing edge (fixed or conditional). `Node(id)` jumps
/// directly to another node. `End` stops the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next {
    Continue,
    Node(String),
    End,
}
