//! Document retrieval for grounding the psychologist's replies.
//!
//! [`Retriever`] is the seam for a real vector store. [`KeywordRetriever`]
//! is the in-memory default: overlapping character chunks scored by how
//! many query terms they contain.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use dg_domain::Result;
use parking_lot::RwLock;
use serde::Serialize;

pub const CHUNK_CHARS: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Top `k` chunks for `query`, restricted to the documents named in
    /// `filter` (all documents when empty). Best match first.
    async fn retrieve(&self, query: &str, filter: &[String], k: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub chunks: usize,
    pub chars: usize,
}

struct Chunk {
    text: String,
    terms: HashMap<String, usize>,
}

/// In-memory keyword retriever, keyed by document name.
pub struct KeywordRetriever {
    // BTreeMap keeps listing and tie-breaking deterministic.
    docs: RwLock<BTreeMap<String, Vec<Chunk>>>,
}

impl KeywordRetriever {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Index `text` under `name`, replacing any previous chunks for it.
    /// Returns the number of chunks stored.
    pub fn add_document(&self, name: &str, text: &str) -> usize {
        let chunks: Vec<Chunk> = split_chunks(text, CHUNK_CHARS, CHUNK_OVERLAP)
            .into_iter()
            .map(|text| Chunk {
                terms: term_counts(&text),
                text,
            })
            .collect();
        let n = chunks.len();
        let replaced = self.docs.write().insert(name.to_owned(), chunks).is_some();
        tracing::debug!(document = name, chunks = n, replaced, "document indexed");
        n
    }

    /// Returns true if the document existed.
    pub fn remove(&self, name: &str) -> bool {
        self.docs.write().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.docs.write().clear();
    }

    pub fn documents(&self) -> Vec<DocumentInfo> {
        self.docs
            .read()
            .iter()
            .map(|(name, chunks)| DocumentInfo {
                name: name.clone(),
                chunks: chunks.len(),
                chars: chunks.iter().map(|c| c.text.chars().count()).sum(),
            })
            .collect()
    }

    /// Synchronous form of [`Retriever::retrieve`].
    pub fn search(&self, query: &str, filter: &[String], k: usize) -> Vec<String> {
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
        if query_terms.is_empty() || k == 0 {
            return Vec::new();
        }

        let docs = self.docs.read();
        let mut scored: Vec<(usize, &str)> = docs
            .iter()
            .filter(|(name, _)| filter.is_empty() || filter.iter().any(|f| f == *name))
            .flat_map(|(_, chunks)| chunks.iter())
            .filter_map(|chunk| {
                let score: usize = query_terms
                    .iter()
                    .filter_map(|t| chunk.terms.get(t))
                    .sum();
                (score > 0).then_some((score, chunk.text.as_str()))
            })
            .collect();

        // Stable sort: equal scores keep document/chunk order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(k)
            .map(|(_, text)| text.to_owned())
            .collect()
    }
}

impl Default for KeywordRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, filter: &[String], k: usize) -> Result<Vec<String>> {
        Ok(self.search(query, filter, k))
    }
}

// ── helpers ──

/// Lowercase alphanumeric words of at least 3 characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .map(String::from)
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in tokenize(text) {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

/// Character-window chunks of `size` chars, each starting `size - overlap`
/// chars after the previous one. Blank text yields no chunks.
fn split_chunks(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_chunks("  hola  ", 1000, 200), vec!["hola".to_string()]);
        assert!(split_chunks("   ", 1000, 200).is_empty());
    }

    #[test]
    fn chunks_overlap() {
        let text: String = "abcdefghij".repeat(250); // 2500 chars
        let chunks = split_chunks(&text, 1000, 200);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        // Second chunk starts 800 chars in.
        assert_eq!(&chunks[0][800..], &chunks[1][..200]);
        assert_eq!(chunks[2].len(), 900);
    }

    #[test]
    fn chunking_respects_multibyte_chars() {
        let text = "ñ".repeat(1500);
        let chunks = split_chunks(&text, 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chars().count(), 700);
    }

    #[test]
    fn tokenize_skips_short_words() {
        assert_eq!(tokenize("La adherencia, de HOY"), vec!["adherencia", "hoy"]);
    }

    #[test]
    fn best_chunk_first() {
        let r = KeywordRetriever::new();
        r.add_document("a.md", "Las alarmas ayudan a recordar la medicación.");
        r.add_document(
            "b.md",
            "Medicación inmunosupresora: tomar la medicación a horario, medicación diaria.",
        );
        let hits = r.search("olvido la medicación", &[], 3);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].starts_with("Medicación inmunosupresora"));
    }

    #[test]
    fn filter_restricts_documents() {
        let r = KeywordRetriever::new();
        r.add_document("a.md", "alarma celular");
        r.add_document("b.md", "alarma pastillero");
        let hits = r.search("alarma", &["b.md".to_string()], 5);
        assert_eq!(hits, vec!["alarma pastillero".to_string()]);
    }

    #[test]
    fn re_adding_replaces_chunks() {
        let r = KeywordRetriever::new();
        r.add_document("guia", "texto viejo");
        r.add_document("guia", "texto nuevo");
        assert_eq!(r.documents().len(), 1);
        assert!(r.search("viejo", &[], 3).is_empty());
        assert_eq!(r.search("nuevo", &[], 3).len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let r = KeywordRetriever::new();
        r.add_document("a", "uno dos tres");
        r.add_document("b", "cuatro cinco");
        assert!(r.remove("a"));
        assert!(!r.remove("a"));
        assert_eq!(r.documents().len(), 1);
        r.clear();
        assert!(r.documents().is_empty());
    }

    #[test]
    fn no_terms_no_results() {
        let r = KeywordRetriever::new();
        r.add_document("a", "contenido");
        assert!(r.search("a y o", &[], 3).is_empty());
        assert!(r.search("contenido", &[], 0).is_empty());
    }

    #[tokio::test]
    async fn trait_delegates_to_search() {
        let r = KeywordRetriever::new();
        r.add_document("a", "rutina matinal con desayuno");
        let hits = r.retrieve("desayuno", &[], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
