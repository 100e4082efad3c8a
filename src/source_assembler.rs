//! Stitches block bodies into one compilable source unit while keeping
//! enough bookkeeping to translate assembled-source line numbers back into
//! original script lines for diagnostics.

/// Append-only builder. Source blocks remember the original line their text
/// started on; non-source blocks are synthetic glue (wrapper boilerplate)
/// with no origin.
#[derive(Debug, Clone, Default)]
pub struct SourceAssembler {
    spans: Vec<Span>,
    source: String,
}

#[derive(Debug, Clone)]
struct Span {
    start_line: Option<usize>,
    line_count: usize,
}

fn count_lines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

impl SourceAssembler {
    pub fn add_source_block(&mut self, text: &str, start_line: usize) {
        self.source.push_str(text);
        self.spans.push(Span {
            start_line: Some(start_line),
            line_count: count_lines(text),
        });
    }

    pub fn add_non_source_block(&mut self, text: &str) {
        self.source.push_str(text);
        self.spans.push(Span {
            start_line: None,
            line_count: count_lines(text),
        });
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Map a 1-based assembled-source line back to its original line. Lines
    /// inside non-source glue, and lines past the end, map to `None`.
    pub fn map_line(&self, assembled_line: usize) -> Option<usize> {
        let mut span_start = 1;
        for span in &self.spans {
            if assembled_line < span_start + span.line_count {
                return span
                    .start_line
                    .map(|start| start + (assembled_line - span_start));
            }
            span_start += span.line_count;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_source_lines_back_to_origin() {
        let mut assembler = SourceAssembler::default();
        assembler.add_non_source_block("function main() {\n");
        assembler.add_source_block("first();\nsecond();\n", 10);
        assembler.add_non_source_block("}\n");

        assert_eq!(assembler.map_line(1), None);
        assert_eq!(assembler.map_line(2), Some(10));
        assert_eq!(assembler.map_line(3), Some(11));
        assert_eq!(assembler.map_line(4), None);
        assert_eq!(assembler.map_line(100), None);
    }

    #[test]
    fn consecutive_source_blocks_keep_independent_origins() {
        let mut assembler = SourceAssembler::default();
        assembler.add_source_block("a\nb\n", 3);
        assembler.add_source_block("c\n", 20);

        assert_eq!(assembler.map_line(1), Some(3));
        assert_eq!(assembler.map_line(2), Some(4));
        assert_eq!(assembler.map_line(3), Some(20));
        assert_eq!(assembler.source(), "a\nb\nc\n");
    }

    #[test]
    fn empty_assembler_maps_nothing() {
        let assembler = SourceAssembler::default();
        assert_eq!(assembler.map_line(1), None);
    }
}
