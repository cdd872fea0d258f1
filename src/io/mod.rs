//! Collaborators that supply seed boards, persist images and deliver
//! keyboard commands.

pub mod keyboard;
pub mod memory;
pub mod pgm;

use crate::core::errors::Result;
use async_trait::async_trait;

pub use keyboard::stdin_controls;
pub use memory::MemoryIo;
pub use pgm::PgmIo;

/// Image I/O collaborator
#[async_trait]
pub trait IoService: Send + Sync {
    /// Row-major board of `width * height` cell bytes
    async fn request_input(&self, width: usize, height: usize) -> Result<Vec<u8>>;

    /// Persist a full board under `name`. Returns once the write is complete.
    async fn request_output(&self, name: &str, width: usize, height: usize, cells: &[u8]) -> Result<()>;
}

/// Name of the seed image for a board size
pub fn input_name(width: usize, height: usize) -> String {
    format!("{}x{}", width, height)
}

/// Name of an output image taken at `turn`
pub fn output_name(width: usize, height: usize, turn: usize) -> String {
    format!("{}x{}x{}", width, height, turn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_encode_dimensions_and_turn() {
        assert_eq!(input_name(512, 256), "512x256");
        assert_eq!(output_name(16, 16, 0), "16x16x0");
        assert_eq!(output_name(64, 32, 100), "64x32x100");
    }
}
