use std::collections::HashMap;

const SUMMARY_SENTENCES: usize = 2;
const TAG_COUNT: usize = 3;
const MIN_TAG_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "if", "in", "into", "is", "it", "its", "just", "more", "most", "not",
    "of", "on", "one", "only", "or", "other", "our", "out", "over", "she", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "up", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "would", "you", "your",
];

/// Local stand-in for a model call: a short extract and a few topic words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub summary: String,
    pub tags: Vec<String>,
}

pub fn digest(title: &str, content: &str) -> Digest {
    let mut summary = leading_sentences(content, SUMMARY_SENTENCES);
    if summary.is_empty() {
        summary = title.trim().to_string();
    }
    Digest {
        summary,
        tags: top_terms(&format!("{title} {content}"), TAG_COUNT),
    }
}

/// The first `count` sentences, whitespace collapsed.
pub fn leading_sentences(text: &str, count: usize) -> String {
    let mut out = String::new();
    let mut sentences = 0;
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        if word.ends_with(['.', '!', '?']) {
            sentences += 1;
            if sentences == count {
                break;
            }
        }
    }
    out
}

/// Most frequent non-stopword terms; ties go to the term seen first.
pub fn top_terms(text: &str, count: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= MIN_TAG_LEN)
        .filter(|w| !w.chars().all(|c| c.is_numeric()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()));
    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (a_count, a_first)), (_, (b_count, b_first))| {
        b_count.cmp(a_count).then(a_first.cmp(b_first))
    });
    ranked.into_iter().take(count).map(|(word, _)| word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_stops_after_two_sentences() {
        let text = "Rust is fast.  It is also safe! Nobody reads this far.";
        assert_eq!(leading_sentences(text, 2), "Rust is fast. It is also safe!");
    }

    #[test]
    fn text_without_terminator_is_kept_whole() {
        assert_eq!(leading_sentences("no   full stop", 2), "no full stop");
    }

    #[test]
    fn tags_rank_by_frequency_then_first_use() {
        let tags = top_terms(
            "Borrow checker. The borrow checker checks borrows; lifetimes help the checker.",
            3,
        );
        assert_eq!(tags, vec!["checker", "borrow", "checks"]);
    }

    #[test]
    fn stopwords_numbers_and_short_words_are_not_tags() {
        assert!(top_terms("the and of 2024 2024 is it ok", 3).is_empty());
    }

    #[test]
    fn empty_content_falls_back_to_title() {
        let digest = digest("Release notes", "   ");
        assert_eq!(digest.summary, "Release notes");
        assert_eq!(digest.tags, vec!["release", "notes"]);
    }
}
