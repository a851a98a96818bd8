use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::hash::{compute_content_hash, Hash};

/// upper bound on stored chunks for a single piece of content
pub const MAX_CHUNKS: usize = 1024;

/// default chunk size: 50 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 50 * 1024 * 1024;

/// storage name of chunk `index` of content with digest `hash`
///
/// chunk 0 is named by the bare hex digest, chunk i by `<hex>_<i>`.
pub fn chunk_name(hash: &Hash, index: usize) -> String {
    if index == 0 {
        hash.to_hex()
    } else {
        format!("{}_{}", hash.to_hex(), index)
    }
}

/// number of chunks needed for `compressed_len` bytes
///
/// always at least one, and never a trailing empty chunk.
pub fn chunk_count(compressed_len: usize, chunk_size: usize) -> usize {
    compressed_len.div_ceil(chunk_size).max(1)
}

/// compressed content split into storage-sized chunks
#[derive(Clone, Debug)]
pub struct EncodedBlob {
    /// digest of the raw content
    pub hash: Hash,
    /// compressed stream, in order
    pub chunks: Vec<Vec<u8>>,
}

impl EncodedBlob {
    pub fn additional_chunks(&self) -> u32 {
        (self.chunks.len() - 1) as u32
    }

    /// chunks paired with their storage names
    pub fn named_chunks(&self) -> impl Iterator<Item = (String, &[u8])> + '_ {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (chunk_name(&self.hash, i), chunk.as_slice()))
    }
}

/// compress-chunk-hash codec for file content
#[derive(Clone, Copy, Debug)]
pub struct BlobCodec {
    chunk_size: usize,
}

impl BlobCodec {
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// hash, compress and split content
    pub fn encode(&self, content: &[u8]) -> Result<EncodedBlob> {
        let hash = compute_content_hash(content);
        let compressed = deflate(content)?;

        let count = chunk_count(compressed.len(), self.chunk_size);
        if count > MAX_CHUNKS {
            return Err(Error::ChunkLimitExceeded {
                hash,
                chunks: count,
                limit: MAX_CHUNKS,
            });
        }

        let mut chunks: Vec<Vec<u8>> = compressed
            .chunks(self.chunk_size)
            .map(|c| c.to_vec())
            .collect();
        if chunks.is_empty() {
            chunks.push(Vec::new());
        }

        Ok(EncodedBlob { hash, chunks })
    }

    /// fetch chunks through `fetch`, reassemble, inflate and verify
    pub fn decode<F>(&self, mut fetch: F, hash: &Hash, additional_chunks: u32) -> Result<Vec<u8>>
    where
        F: FnMut(&str) -> Result<Vec<u8>>,
    {
        let mut compressed = Vec::new();
        for i in 0..=additional_chunks as usize {
            let chunk = fetch(&chunk_name(hash, i))?;
            compressed.extend_from_slice(&chunk);
        }

        let content = inflate(&compressed, hash);

        let actual = compute_content_hash(&content);
        if actual != *hash {
            return Err(Error::ConsistencyViolation {
                target: hash.to_hex(),
                expected: *hash,
                actual,
            });
        }

        Ok(content)
    }
}

impl Default for BlobCodec {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

fn deflate(content: &[u8]) -> Result<Vec<u8>> {
    let zlib_err = |e| Error::Io {
        path: PathBuf::from("<zlib>"),
        source: e,
    };

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(content.len() / 2), Compression::default());
    encoder.write_all(content).map_err(zlib_err)?;
    encoder.finish().map_err(zlib_err)
}

/// inflate as much as the stream yields
///
/// streams written without their final block end early; whatever was produced
/// is kept and the caller's digest check decides whether it is complete.
fn inflate(compressed: &[u8], hash: &Hash) -> Vec<u8> {
    let mut content = Vec::new();
    if let Err(e) = ZlibDecoder::new(compressed).read_to_end(&mut content) {
        tracing::debug!(%hash, error = %e, "decompressor stopped early");
    }
    content
}
