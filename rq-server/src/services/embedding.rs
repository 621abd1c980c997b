//! Text embedding for semantic search
//!
//! The same embedder must be used at indexing time and at query time.

use sha2::{Digest, Sha256};

/// Dimension of the shipped embedder, matching all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

const BIGRAM_WEIGHT: f32 = 0.5;

pub trait TextEmbedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Encode text into a fixed-length vector; deterministic for equal input
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Feature-hashing embedder
///
/// Lower-cased alphanumeric tokens and adjacent token bigrams are hashed
/// with SHA-256 into signed buckets, then the vector is L2-normalized.
/// Texts sharing vocabulary land close together under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dim as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "feature-hash-sha256"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dim];
        let tokens = tokenize(text);

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        l2_normalize_in_place(&mut vector);
        vector
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Scale to unit length; zero vectors are left untouched
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity; 0.0 when lengths differ or either vector is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
