//! Line-oriented graph text parser.
//!
//! ```text
//! subgraph_0
//! input 0 10 10
//! input 1 10 10
//! add 2 inputs: 0 1 shape: 10 10
//! ```
//!
//! A line whose first token *contains* the subgraph marker opens a new block
//! named by that token. Substring matching means a marker-bearing op name or
//! a name nested inside another name is still read as a marker; names are
//! compared exactly once recognized.

use std::collections::HashMap;

use tracing::debug;

use crate::core::config::ParserConfig;
use crate::core::pool::{BufferPool, PoolError};
use crate::core::tensor::{DType, NodeId, Shape};
use crate::engine::operations::OpKind;
use crate::utils::parsing::parse_non_negative;

use super::error::ParseError;
use super::node::{NodeEntry, OpTable, ParsedGraph, Subgraph};

pub const INPUT_KEYWORD: &str = "input";
pub const INPUTS_MARKER: &str = "inputs:";
pub const SHAPE_MARKER: &str = "shape:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Input,
    Op(OpKind),
}

struct ParseState<'a> {
    config: &'a ParserConfig,
    subgraphs: Vec<Subgraph>,
    pool: BufferPool,
    op_table: OpTable,
    declared: HashMap<NodeId, Declared>,
    declaration_order: Vec<NodeId>,
    /// Bumped once per first declaration, independent of any collection size
    next_ordinal: usize,
}

/// Parses with the default subgraph marker.
pub fn parse(text: &str) -> Result<ParsedGraph, ParseError> {
    parse_with(text, &ParserConfig::default())
}

pub fn parse_with(text: &str, config: &ParserConfig) -> Result<ParsedGraph, ParseError> {
    let mut state = ParseState::new(config);
    for (idx, raw_line) in text.lines().enumerate() {
        state.parse_line(raw_line, idx + 1)?;
    }
    state.finish()
}

impl<'a> ParseState<'a> {
    fn new(config: &'a ParserConfig) -> Self {
        Self {
            config,
            subgraphs: Vec::new(),
            pool: BufferPool::new(),
            op_table: OpTable::default(),
            declared: HashMap::new(),
            declaration_order: Vec::new(),
            next_ordinal: 0,
        }
    }

    fn parse_line(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Ok(());
        };

        if head.contains(self.config.subgraph_marker.as_str()) {
            if let Some(extra) = tokens.next() {
                return Err(ParseError::malformed(
                    line_no,
                    format!("unexpected token '{}' after subgraph name", extra),
                ));
            }
            return self.open_subgraph(head, line_no);
        }

        let current = self.subgraphs.len().checked_sub(1).ok_or_else(|| {
            ParseError::malformed(line_no, "node declared before any subgraph marker")
        })?;

        let id_token = tokens
            .next()
            .ok_or_else(|| ParseError::malformed(line_no, format!("missing node id after '{}'", head)))?;
        let id = parse_id(id_token, line_no)?;

        if head == INPUT_KEYWORD {
            let dims = tokens
                .map(|t| parse_dim(t, line_no))
                .collect::<Result<Vec<_>, _>>()?;
            self.declare(id, Declared::Input, Shape::new(dims), line_no)?;
            self.subgraphs[current].inputs.push(id);
            return Ok(());
        }

        let op = OpKind::from_name(head).ok_or_else(|| ParseError::UnknownOperator {
            line: line_no,
            op: head.to_string(),
        })?;

        let mut inputs = Vec::new();
        let mut dims = Vec::new();
        let mut in_shape = false;
        for token in tokens {
            match token {
                SHAPE_MARKER => in_shape = true,
                INPUTS_MARKER if in_shape => {
                    return Err(ParseError::malformed(
                        line_no,
                        format!("'{}' after '{}'", INPUTS_MARKER, SHAPE_MARKER),
                    ));
                }
                INPUTS_MARKER => {}
                _ if in_shape => dims.push(parse_dim(token, line_no)?),
                _ => inputs.push(parse_id(token, line_no)?),
            }
        }

        for input in &inputs {
            if *input == id {
                return Err(ParseError::malformed(
                    line_no,
                    format!("node {} consumes its own output", id),
                ));
            }
            if !self.declared.contains_key(input) {
                return Err(ParseError::malformed(
                    line_no,
                    format!("node {} references undeclared id {}", id, input),
                ));
            }
        }
        if inputs.len() != op.arity() {
            return Err(ParseError::malformed(
                line_no,
                format!(
                    "operator '{}' expects {} inputs, got {}",
                    head,
                    op.arity(),
                    inputs.len()
                ),
            ));
        }

        self.declare(id, Declared::Op(op), Shape::new(dims), line_no)?;
        self.op_table.set(id, head);
        self.subgraphs[current].nodes.push(NodeEntry {
            id,
            op: head.to_string(),
            inputs,
            output: id,
        });
        Ok(())
    }

    fn open_subgraph(&mut self, name: &str, line_no: usize) -> Result<(), ParseError> {
        if let Some(prev) = self.subgraphs.iter().find(|s| s.name == name) {
            return Err(ParseError::malformed(
                line_no,
                format!("subgraph '{}' already declared on line {}", name, prev.line),
            ));
        }
        debug!(subgraph = name, line = line_no, "opening subgraph");
        self.subgraphs.push(Subgraph::new(name, line_no));
        Ok(())
    }

    /// Records `id` and asks the pool for its slot. Repeating a declaration is
    /// accepted only when it is identical.
    fn declare(&mut self, id: NodeId, kind: Declared, shape: Shape, line_no: usize) -> Result<(), ParseError> {
        if id.index() >= self.config.max_slots {
            return Err(ParseError::malformed(
                line_no,
                format!("node id {} exceeds the slot limit {}", id, self.config.max_slots),
            ));
        }
        match shape.checked_num_elements() {
            Some(n) if n <= self.config.max_elements => {}
            _ => {
                return Err(ParseError::malformed(
                    line_no,
                    format!(
                        "shape {} exceeds the element limit {}",
                        shape, self.config.max_elements
                    ),
                ));
            }
        }

        match self.declared.get(&id).copied() {
            Some(prev) if prev != kind => {
                return Err(ParseError::malformed(
                    line_no,
                    format!("id {} redeclared as {:?}, previously {:?}", id, kind, prev),
                ));
            }
            Some(_) => {}
            None => {
                debug!(id = id.index(), ordinal = self.next_ordinal, shape = %shape, "declaring slot");
                self.declared.insert(id, kind);
                self.declaration_order.push(id);
                self.next_ordinal += 1;
            }
        }

        self.pool
            .allocate(id, shape, DType::Float32)
            .map_err(|e| match e {
                PoolError::ShapeConflict {
                    existing, requested, ..
                } => ParseError::malformed(
                    line_no,
                    format!("id {} redeclared with shape {}, previously {}", id, requested, existing),
                ),
                other => ParseError::malformed(line_no, other.to_string()),
            })
    }

    fn finish(self) -> Result<ParsedGraph, ParseError> {
        if let Some(empty) = self.subgraphs.iter().find(|s| s.nodes.is_empty()) {
            return Err(ParseError::malformed(
                empty.line,
                format!("subgraph '{}' has no operator nodes", empty.name),
            ));
        }
        debug!(
            subgraphs = self.subgraphs.len(),
            slots = self.pool.len(),
            declared = self.next_ordinal,
            "parsed graph"
        );
        Ok(ParsedGraph {
            subgraphs: self.subgraphs,
            pool: self.pool,
            op_table: self.op_table,
            declaration_order: self.declaration_order,
        })
    }
}

fn parse_int(token: &str, what: &str, line_no: usize) -> Result<usize, ParseError> {
    parse_non_negative(token).map_err(|msg| ParseError::malformed(line_no, format!("{}: {}", what, msg)))
}

fn parse_id(token: &str, line_no: usize) -> Result<NodeId, ParseError> {
    parse_int(token, "node id", line_no).map(NodeId)
}

fn parse_dim(token: &str, line_no: usize) -> Result<usize, ParseError> {
    parse_int(token, "dimension", line_no)
}
