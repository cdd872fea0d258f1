use super::IoService;
use crate::core::errors::{LifeError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// In-memory I/O collaborator.
///
/// Serves a fixed seed and records every output by name, along with the order
/// in which outputs arrived. Clones share the same recorded state.
#[derive(Clone, Default)]
pub struct MemoryIo {
    seed: Arc<Vec<u8>>,
    outputs: Arc<DashMap<String, Vec<u8>>>,
    order: Arc<Mutex<Vec<String>>>,
}

impl MemoryIo {
    pub fn new(seed: Vec<u8>) -> Self {
        Self {
            seed: Arc::new(seed),
            ..Self::default()
        }
    }

    /// Bytes written under `name`, if any
    pub fn output(&self, name: &str) -> Option<Vec<u8>> {
        self.outputs.get(name).map(|entry| entry.value().clone())
    }

    /// Output names in the order they were written
    pub fn output_names(&self) -> Vec<String> {
        self.order.lock().clone()
    }

    pub fn output_count(&self) -> usize {
        self.output_names().len()
    }
}

#[async_trait]
impl IoService for MemoryIo {
    async fn request_input(&self, width: usize, height: usize) -> Result<Vec<u8>> {
        debug!(width, height, bytes = self.seed.len(), "Serving in-memory seed");
        Ok(self.seed.as_ref().clone())
    }

    async fn request_output(&self, name: &str, width: usize, height: usize, cells: &[u8]) -> Result<()> {
        if cells.len() != width * height {
            return Err(LifeError::io(
                "write_image",
                format!("{} bytes for a {}x{} board", cells.len(), width, height),
            ));
        }
        self.outputs.insert(name.to_string(), cells.to_vec());
        self.order.lock().push(name.to_string());
        debug!(name, "Recorded in-memory image");
        Ok(())
    }
}
