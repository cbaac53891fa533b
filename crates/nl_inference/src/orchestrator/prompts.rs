pub const SYSTEM: &str = "You are a helpful assistant.";

/// Prefix for answers the question-answering model flags as out of scope.
pub const NOT_COVERED_PREFIX: &str = "The article does not cover that specifically. However: ";

/// Returned instead of an empty answer; the caller can retry through `/gpt-answer`.
pub const DEFERRED_ANSWER: &str =
    "The question-answering model cannot answer. Would you like to connect to the LLM for an answer?";

pub fn bias(text: &str) -> String {
    format!("Analyze the bias in this article: {}", text)
}

pub fn article_question(context: &str, question: &str) -> String {
    format!("Based on the article: {}, answer this question: {}", context, question)
}

pub fn llm_answer(text: &str, question: &str) -> String {
    format!(
        "Answer this question based on the following article: {}\nQuestion: {}",
        text, question
    )
}

pub fn common_questions(text: &str, max_questions: usize) -> String {
    format!(
        "Generate up to {} common questions readers might ask after reading this article: {}",
        max_questions, text
    )
}

pub fn main_topic(text: &str) -> String {
    format!(
        "Identify the main topic of this article in at most five words, suitable as a news search query. Reply with the topic only.\n\n{}",
        text
    )
}

/// Explanation attached to a star-rated bias label.
pub fn bias_explanation(stars: Option<u8>) -> &'static str {
    match stars {
        Some(1) => "Highly biased",
        Some(2) => "Moderately biased",
        Some(3) => "Neutral",
        Some(4) => "Slightly balanced",
        Some(5) => "Balanced and factual",
        _ => "Unknown bias level",
    }
}

/// One question per line; blank lines and list markers are dropped.
pub fn parse_questions(content: &str, max_questions: usize) -> Vec<String> {
    content
        .lines()
        .map(|line| strip_list_marker(line.trim()).to_string())
        .filter(|q| !q.is_empty())
        .take(max_questions)
        .collect()
}

/// Drops a leading `1.`, `2)`, `-`, `*` or `•` marker. Digits that are not
/// followed by `.` or `)` belong to the question.
fn strip_list_marker(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let rest = &line[digits..];
    let stripped = if digits > 0 {
        match rest.strip_prefix(['.', ')']) {
            Some(after) if after.is_empty() || after.starts_with(char::is_whitespace) => after,
            _ => line,
        }
    } else {
        line.trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
    };
    stripped.trim()
}

/// LLM topics often come back quoted or with a trailing period.
pub fn tidy_topic(content: &str) -> String {
    content
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches("Topic:")
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_strips_markers() {
        let content = "1. Who is affected?\n\n2) When does it start?\n- Why now?\n* Extra one?";
        assert_eq!(
            parse_questions(content, 3),
            vec!["Who is affected?", "When does it start?", "Why now?"]
        );
    }

    #[test]
    fn test_parse_questions_keeps_leading_numbers() {
        let content = "3 million jobs lost?\n1. 2024 budget impact?\n3.5 percent growth, really?";
        assert_eq!(
            parse_questions(content, 3),
            vec!["3 million jobs lost?", "2024 budget impact?", "3.5 percent growth, really?"]
        );
    }

    #[test]
    fn test_bias_explanation() {
        assert_eq!(bias_explanation(Some(1)), "Highly biased");
        assert_eq!(bias_explanation(Some(5)), "Balanced and factual");
        assert_eq!(bias_explanation(None), "Unknown bias level");
    }

    #[test]
    fn test_tidy_topic() {
        assert_eq!(tidy_topic("\"Climate policy.\"\nmore"), "Climate policy");
        assert_eq!(tidy_topic("Topic: Elections"), "Elections");
        assert_eq!(tidy_topic(""), "");
    }
}
