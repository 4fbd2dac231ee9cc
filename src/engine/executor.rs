use tracing::{debug, warn};

use crate::core::pool::{BufferPool, PoolError};
use crate::core::tensor::{NodeId, Tensor};
use crate::graph::{ParsedGraph, Subgraph};

use super::error::EngineError;
use super::kernels;

/// Runs subgraphs of one parsed description against its shared pool.
///
/// `run` takes `&mut self`: one execution in flight per instance. The pool is
/// global across subgraphs and is never reset between runs.
#[derive(Debug)]
pub struct Executor {
    graph: ParsedGraph,
}

impl Executor {
    pub fn new(graph: ParsedGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &ParsedGraph {
        &self.graph
    }

    pub fn pool(&self) -> &BufferPool {
        &self.graph.pool
    }

    pub fn subgraph(&self, name: &str) -> Result<&Subgraph, EngineError> {
        self.graph
            .subgraph(name)
            .ok_or_else(|| EngineError::UnknownSubgraph(name.to_string()))
    }

    /// Executes `name`.
    ///
    /// `inputs[i]` is copied into slot `i`, whatever ids the subgraph declared
    /// as inputs; callers must pass tensors in declared-id order. Nodes run in
    /// stored order and the last node's output is copied into `output`.
    /// A failure leaves earlier node results in the pool.
    pub fn run(&mut self, name: &str, inputs: &[&Tensor], output: &mut Tensor) -> Result<(), EngineError> {
        let ParsedGraph {
            subgraphs,
            pool,
            op_table,
            ..
        } = &mut self.graph;

        let subgraph = subgraphs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::UnknownSubgraph(name.to_string()))?;

        if inputs.len() != subgraph.inputs.len() {
            warn!(
                subgraph = name,
                supplied = inputs.len(),
                declared = subgraph.inputs.len(),
                "input count differs from declared inputs"
            );
        }

        for (i, input) in inputs.iter().enumerate() {
            copy_into_slot(pool, NodeId(i), input)?;
        }

        for node in &subgraph.nodes {
            let op = op_table
                .get(node.id)
                .ok_or_else(|| EngineError::UnknownOperator(node.op.clone()))?;
            debug!(subgraph = name, id = node.id.index(), op, "dispatching node");

            let mut result = pool.take(node.output)?;
            let outcome = node
                .inputs
                .iter()
                .map(|id| pool.get(*id))
                .collect::<Result<Vec<_>, PoolError>>()
                .map_err(EngineError::from)
                .and_then(|operands| kernels::dispatch(op, &operands, &mut result));
            pool.restore(node.output, result);
            outcome?;
        }

        let out_id = subgraph
            .output()
            .ok_or_else(|| EngineError::EmptySubgraph(name.to_string()))?;
        let result = pool.get(out_id)?;
        if output.shape != result.shape {
            return Err(EngineError::ShapeMismatch {
                context: format!("output of {}", name),
                expected: result.shape.clone(),
                actual: output.shape.clone(),
            });
        }
        output
            .copy_from(result)
            .map_err(|msg| EngineError::Pool(PoolError::InvalidTensor(msg)))
    }
}

fn copy_into_slot(pool: &mut BufferPool, id: NodeId, input: &Tensor) -> Result<(), EngineError> {
    let slot = pool.get(id)?;
    if slot.shape != input.shape {
        return Err(EngineError::ShapeMismatch {
            context: format!("input {}", id.index()),
            expected: slot.shape.clone(),
            actual: input.shape.clone(),
        });
    }
    pool.write(id, input)?;
    Ok(())
}
