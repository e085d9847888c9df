//! Prompt context assembly.
//!
//! Retrieved chunks arrive in similarity order, interleaved across
//! candidates. The assembler regroups them by source in first-seen order,
//! each group under a heading naming the candidate.

use crate::models::Chunk;

/// Render the heading line that introduces one candidate's excerpts.
pub fn source_delimiter(source: &str) -> String {
    format!("------The following chunk belongs to {}------", source)
}

/// Group chunks by source and render them as one text block.
///
/// Sources appear in the order they are first seen in `chunks`. Within a
/// source, chunk contents keep their input order and are joined by
/// newlines. Groups are separated by a blank line. An empty input renders
/// as an empty string.
pub fn assemble_context<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = &'a Chunk>,
{
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for chunk in chunks {
        match groups.iter_mut().find(|(source, _)| *source == chunk.source) {
            Some((_, contents)) => contents.push(chunk.content.as_str()),
            None => groups.push((chunk.source.as_str(), vec![chunk.content.as_str()])),
        }
    }

    groups
        .iter()
        .map(|(source, contents)| format!("{}\n{}", source_delimiter(source), contents.join("\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn chunk(source: &str, content: &str) -> Chunk {
        Chunk {
            source: source.to_string(),
            index: 0,
            content: content.to_string(),
            hash: String::new(),
            metadata: ChunkMetadata {
                candidate_name: source.to_string(),
            },
        }
    }

    #[test]
    fn test_empty_input_renders_empty() {
        assert_eq!(assemble_context(&Vec::<Chunk>::new()), "");
    }

    #[test]
    fn test_single_source() {
        let chunks = vec![chunk("alice", "Rust at Acme"), chunk("alice", "BSc Cairo University")];
        assert_eq!(
            assemble_context(&chunks),
            "------The following chunk belongs to alice------\nRust at Acme\nBSc Cairo University"
        );
    }

    #[test]
    fn test_interleaved_sources_grouped_in_first_seen_order() {
        let chunks = vec![
            chunk("bob", "b1"),
            chunk("alice", "a1"),
            chunk("bob", "b2"),
            chunk("carol", "c1"),
            chunk("alice", "a2"),
        ];
        let expected = [
            "------The following chunk belongs to bob------\nb1\nb2",
            "------The following chunk belongs to alice------\na1\na2",
            "------The following chunk belongs to carol------\nc1",
        ]
        .join("\n\n");
        assert_eq!(assemble_context(&chunks), expected);
    }

    #[test]
    fn test_accepts_scored_chunk_iterators() {
        let hits = [chunk("x", "one"), chunk("y", "two")];
        let rendered = assemble_context(hits.iter().rev());
        assert!(rendered.starts_with(&source_delimiter("y")));
    }
}
