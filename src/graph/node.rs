use serde::Serialize;

use crate::core::pool::BufferPool;
use crate::core::tensor::NodeId;

/// One computed node of a subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeEntry {
    pub id: NodeId,
    /// Operator name as written in the source text
    pub op: String,
    /// Operand ids, in argument order
    pub inputs: Vec<NodeId>,
    /// Slot receiving the result; always equal to `id`
    pub output: NodeId,
}

/// Named, ordered list of nodes. Stored order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subgraph {
    pub name: String,
    /// Line of the marker that opened this block
    pub line: usize,
    /// Ids declared by `input` lines inside this block, in source order
    pub inputs: Vec<NodeId>,
    pub nodes: Vec<NodeEntry>,
}

impl Subgraph {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            inputs: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Result slot: the output of the last node.
    pub fn output(&self) -> Option<NodeId> {
        self.nodes.last().map(|n| n.output)
    }
}

/// Node id -> operator name, used at run time to pick the kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpTable {
    ops: Vec<Option<String>>,
}

impl OpTable {
    pub fn set(&mut self, id: NodeId, op: &str) {
        if self.ops.len() <= id.index() {
            self.ops.resize(id.index() + 1, None);
        }
        self.ops[id.index()] = Some(op.to_string());
    }

    pub fn get(&self, id: NodeId) -> Option<&str> {
        self.ops.get(id.index()).and_then(|o| o.as_deref())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Everything built from one graph description.
#[derive(Debug)]
pub struct ParsedGraph {
    /// Subgraphs in the order their markers appear
    pub subgraphs: Vec<Subgraph>,
    pub pool: BufferPool,
    pub op_table: OpTable,
    /// Every declared id, in declaration order (first declaration only)
    pub declaration_order: Vec<NodeId>,
}

impl ParsedGraph {
    pub fn subgraph(&self, name: &str) -> Option<&Subgraph> {
        self.subgraphs.iter().find(|s| s.name == name)
    }

    pub fn subgraph_names(&self) -> impl Iterator<Item = &str> {
        self.subgraphs.iter().map(|s| s.name.as_str())
    }
}
