//! Context block assembly from retrieved chunks.

use serde::Serialize;

use super::store::ChunkSearchResult;

/// Separator placed between chunk texts in the context block.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// A retrieved chunk as reported to API callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceRef {
    pub chunk_id: String,
    pub source: String,
    pub chunk_index: usize,
    pub score: f32,
}

/// Joins chunk texts in retrieval rank order, most similar first.
pub fn format_context(results: &[ChunkSearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

pub fn sources(results: &[ChunkSearchResult]) -> Vec<SourceRef> {
    results
        .iter()
        .map(|r| SourceRef {
            chunk_id: r.chunk.chunk_id.clone(),
            source: r.chunk.source.clone(),
            chunk_index: r.chunk.chunk_index,
            score: r.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::StoredChunk;

    fn result(index: usize, text: &str, score: f32) -> ChunkSearchResult {
        ChunkSearchResult {
            chunk: StoredChunk {
                chunk_id: format!("kb.txt#{}", index),
                content: text.to_string(),
                source: "kb.txt".to_string(),
                chunk_index: index,
                start_offset: 0,
            },
            score,
        }
    }

    #[test]
    fn joins_in_rank_order_with_blank_line() {
        let results = vec![
            result(3, "Referral fee is 2%.", 0.9),
            result(0, "Fees are paid monthly.", 0.5),
        ];

        assert_eq!(
            format_context(&results),
            "Referral fee is 2%.\n\nFees are paid monthly."
        );
    }

    #[test]
    fn empty_results_give_empty_context() {
        assert_eq!(format_context(&[]), "");
        assert!(sources(&[]).is_empty());
    }

    #[test]
    fn sources_keep_rank_and_scores() {
        let refs = sources(&[result(2, "a", 0.8), result(1, "b", 0.4)]);
        assert_eq!(refs[0].chunk_id, "kb.txt#2");
        assert_eq!(refs[1].chunk_index, 1);
        assert!((refs[0].score - 0.8).abs() < f32::EPSILON);
    }
}
