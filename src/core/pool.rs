// src/core/pool.rs

use thiserror::Error;

use crate::core::tensor::{DType, NodeId, Shape, Tensor};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("Unknown pool slot: {0}")]
    UnknownSlot(NodeId),

    #[error("Slot {id} already allocated with shape {existing}, requested {requested}")]
    ShapeConflict {
        id: NodeId,
        existing: Shape,
        requested: Shape,
    },

    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),
}

/// Arena of per-node tensors indexed by node id.
///
/// Slot existence and shape are fixed at allocation time; afterwards only the
/// element values change. Ids are global across every subgraph of a parsed
/// description, so the pool is shared by all of them.
#[derive(Debug, Default)]
pub struct BufferPool {
    slots: Vec<Option<Tensor>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Allocates a zeroed tensor for `id`. Idempotent for identical arguments;
    /// a different shape for an already allocated id is rejected.
    pub fn allocate(&mut self, id: NodeId, shape: Shape, dtype: DType) -> Result<(), PoolError> {
        let DType::Float32 = dtype;

        // Ids may arrive out of numeric order; grow instead of failing.
        if self.slots.len() <= id.index() {
            self.slots.resize_with(id.index() + 1, || None);
        }

        match &self.slots[id.index()] {
            Some(existing) if existing.shape == shape => Ok(()),
            Some(existing) => Err(PoolError::ShapeConflict {
                id,
                existing: existing.shape.clone(),
                requested: shape,
            }),
            None => {
                self.slots[id.index()] = Some(Tensor::zeros(shape));
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    pub fn get(&self, id: NodeId) -> Result<&Tensor, PoolError> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(PoolError::UnknownSlot(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Tensor, PoolError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(PoolError::UnknownSlot(id))
    }

    /// Copies `src` into the slot for `id`; the slot keeps its shape.
    pub fn write(&mut self, id: NodeId, src: &Tensor) -> Result<(), PoolError> {
        self.get_mut(id)?
            .copy_from(src)
            .map_err(PoolError::InvalidTensor)
    }

    /// Moves the tensor out of its slot so it can be written while other
    /// slots are borrowed. Must be paired with [`BufferPool::restore`].
    pub(crate) fn take(&mut self, id: NodeId) -> Result<Tensor, PoolError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(PoolError::UnknownSlot(id))
    }

    pub(crate) fn restore(&mut self, id: NodeId, tensor: Tensor) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Some(tensor);
        }
    }

    /// Number of slots, allocated or not (`max(id) + 1`).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Highest-indexed allocated slot.
    pub fn last(&self) -> Option<&Tensor> {
        self.slots.iter().rev().find_map(Option::as_ref)
    }
}
