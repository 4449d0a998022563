//! Fixed word and key-sequence tables.

/// Words ignored by the word-repetition stage.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "is", "it", "my",
    "i", "me", "we", "you", "he", "she", "they", "this", "that", "was", "are", "be", "been",
    "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "not", "with",
    "from", "by", "as", "so", "if", "up", "out", "no", "just", "about", "into", "than", "then",
    "can", "some", "what", "when", "who", "how", "all", "there", "their", "its", "am", "were",
    "being", "here", "very", "need", "want", "because", "going",
];

/// Five-key runs along keyboard rows, a few reversed, and digit runs.
pub const KEYBOARD_SEQUENCES: &[&str] = &[
    "qwert", "werty", "ertyu", "rtyui", "tyuio", "yuiop", "asdfg", "sdfgh", "dfghj", "fghjk",
    "ghjkl", "zxcvb", "xcvbn", "cvbnm", "trewq", "gfdsa", "bvcxz", "12345", "23456", "34567",
    "45678", "56789", "67890",
];

/// Letters counted as vowels by the real-word stage.
pub const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

/// Punctuation that does not count against Latin script.
pub const LATIN_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '-'];

/// Last code point of Latin Extended-B; everything up to here is Latin-adjacent.
pub const LATIN_UPPER_BOUND: char = '\u{024F}';

/// Whether `c` belongs to the Latin-adjacent range.
#[must_use]
pub fn is_latin_adjacent(c: char) -> bool {
    c <= LATIN_UPPER_BOUND || c.is_whitespace() || c.is_numeric() || LATIN_PUNCTUATION.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_five_keys() {
        for seq in KEYBOARD_SEQUENCES {
            assert_eq!(seq.chars().count(), 5, "{seq}");
        }
    }

    #[test]
    fn test_latin_adjacent() {
        assert!(is_latin_adjacent('a'));
        assert!(is_latin_adjacent('é'));
        assert!(is_latin_adjacent('7'));
        assert!(is_latin_adjacent('\u{3000}'));
        assert!(!is_latin_adjacent('я'));
        assert!(!is_latin_adjacent('漢'));
    }
}
