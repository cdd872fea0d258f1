//! Binary PGM (P5) file collaborator.

use super::{input_name, IoService};
use crate::core::errors::{LifeError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const MAGIC: &str = "P5";
const MAX_VALUE: usize = 255;

/// Reads seeds from `<input_dir>/<w>x<h>.pgm` and writes outputs to
/// `<output_dir>/<name>.pgm`
#[derive(Debug, Clone)]
pub struct PgmIo {
    input_dir: PathBuf,
    output_dir: PathBuf,
    seed: Option<Arc<Vec<u8>>>,
}

impl PgmIo {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            seed: None,
        }
    }

    /// Serve `seed` instead of reading the input directory
    pub fn with_seed(mut self, seed: Vec<u8>) -> Self {
        self.seed = Some(Arc::new(seed));
        self
    }

    pub fn input_path(&self, width: usize, height: usize) -> PathBuf {
        self.input_dir.join(format!("{}.pgm", input_name(width, height)))
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.pgm", name))
    }
}

#[async_trait]
impl IoService for PgmIo {
    async fn request_input(&self, width: usize, height: usize) -> Result<Vec<u8>> {
        if let Some(seed) = &self.seed {
            if seed.len() != width * height {
                return Err(LifeError::invalid_seed(width * height, seed.len()));
            }
            debug!(width, height, "Serving generated seed");
            return Ok(seed.as_ref().clone());
        }
        let path = self.input_path(width, height);
        debug!(path = %path.display(), "Reading seed image");
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| LifeError::io_with_source(format!("read {}", path.display()), e))?;
        decode(&bytes, width, height)
    }

    async fn request_output(&self, name: &str, width: usize, height: usize, cells: &[u8]) -> Result<()> {
        let encoded = encode(width, height, cells)?;
        ensure_dir(&self.output_dir).await?;
        let path = self.output_path(name);
        tokio::fs::write(&path, encoded)
            .await
            .map_err(|e| LifeError::io_with_source(format!("write {}", path.display()), e))?;
        info!(path = %path.display(), "Image written");
        Ok(())
    }
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| LifeError::io_with_source(format!("create {}", dir.display()), e))
}

/// Serialize a board as P5 with maxval 255
pub fn encode(width: usize, height: usize, cells: &[u8]) -> Result<Vec<u8>> {
    if cells.len() != width * height {
        return Err(LifeError::pgm(format!(
            "{} bytes for a {}x{} image",
            cells.len(),
            width,
            height
        )));
    }
    let header = format!("{}\n{} {}\n{}\n", MAGIC, width, height, MAX_VALUE);
    let mut out = Vec::with_capacity(header.len() + cells.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(cells);
    Ok(out)
}

/// Parse a P5 image, checking it matches the expected dimensions
pub fn decode(bytes: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let mut header = Header { bytes, pos: 0 };

    let magic = header.token()?;
    if magic != MAGIC.as_bytes() {
        return Err(LifeError::pgm(format!(
            "unsupported magic {:?}",
            String::from_utf8_lossy(magic)
        )));
    }
    let file_width = header.number("width")?;
    let file_height = header.number("height")?;
    let max_value = header.number("maxval")?;

    if (file_width, file_height) != (width, height) {
        return Err(LifeError::pgm(format!(
            "image is {}x{}, expected {}x{}",
            file_width, file_height, width, height
        )));
    }
    if max_value != MAX_VALUE {
        return Err(LifeError::pgm(format!("unsupported maxval {}", max_value)));
    }

    // Exactly one whitespace byte separates the header from the raster.
    let start = header.pos + 1;
    let raster = bytes.get(start..).unwrap_or_default();
    if raster.len() != width * height {
        return Err(LifeError::pgm(format!(
            "raster holds {} bytes, expected {}",
            raster.len(),
            width * height
        )));
    }
    Ok(raster.to_vec())
}

struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    fn skip_space_and_comments(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.bytes.get(self.pos) {
                    if c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8]> {
        self.skip_space_and_comments();
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(LifeError::pgm("truncated header"));
        }
        let bytes = self.bytes;
        Ok(&bytes[start..self.pos])
    }

    fn number(&mut self, field: &str) -> Result<usize> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| LifeError::pgm(format!("invalid {} in header", field)))
    }
}
