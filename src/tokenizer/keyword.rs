/// Reserved words of the language.
///
/// Words such as `for`, `while`, `cond`, `range`, `init` or `test` are not
/// reserved: they stay identifiers and the grammar recognises them by position,
/// so they remain usable as keyword-argument names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Let,
    And,
    Or,
    Not,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_keyword_round_trip() {
        for keyword in Keyword::iter() {
            let text = keyword.to_string();
            assert_eq!(Keyword::try_from(text.as_str()), Ok(keyword));
        }
    }

    #[test]
    fn test_contextual_words_are_not_keywords() {
        for word in ["for", "while", "cond", "if", "range", "init", "test"] {
            assert!(Keyword::try_from(word).is_err());
        }
    }
}
