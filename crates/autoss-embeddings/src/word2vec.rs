//! word2vec model files.
//!
//! Reads the two interchange formats word2vec/gensim export:
//! - text: optional `<count> <dim>` header, then `<token> <v1> ... <vD>` rows
//! - binary (`.bin`): `<count> <dim>` header line, then per token the UTF-8
//!   token, a space and `dim` little-endian f32 values

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::{debug, info};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// On-disk layout of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Text,
    Binary,
}

impl ModelFormat {
    /// `.bin` files are binary; everything else is read as text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => ModelFormat::Binary,
            _ => ModelFormat::Text,
        }
    }
}

/// In-memory word2vec vocabulary.
#[derive(Debug)]
pub struct Word2VecModel {
    vectors: HashMap<String, Vec<f32>>,
    info: ModelInfo,
}

impl Word2VecModel {
    /// Load a model file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, EmbeddingError> {
        if !path.is_file() {
            return Err(EmbeddingError::ModelNotFound(path.display().to_string()));
        }

        let format = ModelFormat::from_path(path);
        info!(path = ?path, ?format, "Loading word2vec model...");

        let reader = BufReader::new(File::open(path)?);
        let entries = match format {
            ModelFormat::Text => read_text(reader)?,
            ModelFormat::Binary => read_binary(reader)?,
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "word2vec".to_string());
        let model = Self::from_entries(name, entries)?;

        info!(
            dim = model.info.dimension,
            vocab = model.info.vocabulary_size,
            "Model loaded successfully"
        );
        Ok(model)
    }

    /// Build a model from `(token, vector)` pairs. All vectors must share
    /// one dimension; a repeated token keeps its last vector.
    pub fn from_entries(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Result<Self, EmbeddingError> {
        let name = name.into();
        let mut vectors = HashMap::new();
        let mut dimension = None;

        for (token, values) in entries {
            match dimension {
                None => dimension = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: values.len(),
                    });
                }
                Some(_) => {}
            }
            vectors.insert(token, values);
        }

        let dimension = dimension.ok_or_else(|| EmbeddingError::Empty(name.clone()))?;

        Ok(Self {
            info: ModelInfo {
                name,
                dimension,
                vocabulary_size: vectors.len(),
            },
            vectors,
        })
    }
}

impl EmbeddingModel for Word2VecModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn lookup(&self, token: &str) -> Option<Embedding> {
        self.vectors.get(token).map(|v| Embedding::new(v.clone()))
    }
}

/// Parse a `<count> <dim>` header.
fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let count = parts.next()?.parse().ok()?;
    let dim = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((count, dim))
}

fn read_text<R: BufRead>(reader: R) -> Result<Vec<(String, Vec<f32>)>, EmbeddingError> {
    let mut entries = Vec::new();
    let mut expected_dim = None;
    let mut first = true;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        if first {
            first = false;
            if let Some((count, dim)) = parse_header(&line) {
                debug!(count, dim, "word2vec text header");
                expected_dim = Some(dim);
                continue;
            }
        }

        let mut parts = line.split_whitespace();
        let token = match parts.next() {
            Some(t) => t.to_string(),
            None => continue,
        };
        let values = parts
            .map(|p| p.parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EmbeddingError::Parse {
                line: line_no,
                message: format!("token {:?}: {}", token, e),
            })?;

        if let Some(expected) = expected_dim {
            if values.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: values.len(),
                });
            }
        }
        entries.push((token, values));
    }

    Ok(entries)
}

fn read_binary<R: BufRead>(mut reader: R) -> Result<Vec<(String, Vec<f32>)>, EmbeddingError> {
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let (count, dim) = parse_header(&header).ok_or_else(|| EmbeddingError::Parse {
        line: 1,
        message: format!("expected '<count> <dim>' header, got {:?}", header.trim()),
    })?;
    debug!(count, dim, "word2vec binary header");

    // Header values are untrusted; buffers grow with what is actually read
    let vector_bytes = dim.checked_mul(4).ok_or_else(|| EmbeddingError::Parse {
        line: 1,
        message: format!("dimension {} is too large", dim),
    })?;

    let mut entries = Vec::new();
    let mut word = Vec::new();
    let mut raw = Vec::new();

    for i in 0..count {
        word.clear();
        reader.read_until(b' ', &mut word)?;
        if word.last() != Some(&b' ') {
            return Err(EmbeddingError::Parse {
                line: i + 2,
                message: format!("unexpected end of file after {} of {} vectors", i, count),
            });
        }
        word.pop();
        let token = String::from_utf8_lossy(&word)
            .trim_start_matches(['\n', '\r'])
            .to_string();

        raw.clear();
        reader
            .by_ref()
            .take(vector_bytes as u64)
            .read_to_end(&mut raw)?;
        if raw.len() != vector_bytes {
            return Err(EmbeddingError::Parse {
                line: i + 2,
                message: format!("truncated vector for token {:?}", token),
            });
        }
        let values = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        entries.push((token, values));
    }

    Ok(entries)
}
