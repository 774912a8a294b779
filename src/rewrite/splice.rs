use std::ops::Range;

/// One textual change against the original source.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub at: usize,
    pub remove: usize,
    pub insert: String,
}

impl Edit {
    pub fn insert(at: usize, text: String) -> Self {
        Self {
            at,
            remove: 0,
            insert: text,
        }
    }

    pub fn replace(range: Range<usize>, text: String) -> Self {
        Self {
            at: range.start,
            remove: range.len(),
            insert: text,
        }
    }
}

/// Insertion point for statements that must run before the statement at
/// `offset`: just after the nearest `;` before it that is outside every
/// protected span, or the start of the source.
pub fn find_anchor(source: &str, offset: usize, protected: &[Range<usize>]) -> usize {
    source[..offset]
        .char_indices()
        .rev()
        .filter(|(_, c)| *c == ';')
        .map(|(i, _)| i)
        .find(|i| !protected.iter().any(|span| span.contains(i)))
        .map_or(0, |i| i + 1)
}

/// Applies non-overlapping edits in one sweep. Edits at the same position keep
/// their order, pure insertions first.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| (edit.at, edit.remove > 0));
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.at < cursor {
            continue;
        }
        output.push_str(&source[cursor..edit.at]);
        output.push_str(&edit.insert);
        cursor = edit.at + edit.remove;
    }
    output.push_str(&source[cursor..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_skips_protected_semicolons() {
        let source = "let a = 1; let s = \"x;y\"; let b = ask(1)";
        let string_span = source.find('"').unwrap()..source.rfind('"').unwrap() + 1;
        let offset = source.find("ask").unwrap();
        assert_eq!(find_anchor(source, offset, &[string_span.clone()]), source.rfind(';').unwrap() + 1);

        let first = "let x = ask(1)";
        assert_eq!(find_anchor(first, 8, &[]), 0);
    }

    #[test]
    fn test_apply_edits_in_one_sweep() {
        let source = "let a = f(1); let b = f(2)";
        let edits = vec![
            Edit::replace(22..26, "t2".to_string()),
            Edit::insert(13, "\nlet t2 = 2;".to_string()),
            Edit::replace(8..12, "t1".to_string()),
            Edit::insert(0, "let t1 = 1;\n".to_string()),
        ];
        assert_eq!(
            apply_edits(source, edits),
            "let t1 = 1;\nlet a = t1;\nlet t2 = 2; let b = t2"
        );
    }
}
