use unicode_width::UnicodeWidthStr;

/// Word-wrap `text` to `max_width` display columns. Words wider than a line
/// are split. Always yields at least one line.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();

        if word_width > max_width {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let mut chunks = split_to_width(word, max_width);
            // The last chunk may still take more words
            let last = chunks.pop().unwrap_or_default();
            lines.extend(chunks);
            current_width = last.width();
            current_line = last;
        } else if current_width == 0 {
            current_line = word.to_string();
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            current_width = word_width;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

fn split_to_width(word: &str, max_width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut width = 0;
    for c in word.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            width = 0;
        }
        chunk.push(c);
        width += w;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_text("the quick brown fox", 10), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn empty_text_is_one_blank_line() {
        assert_eq!(wrap_text("   ", 10), vec![String::new()]);
    }

    #[test]
    fn long_words_are_split() {
        assert_eq!(wrap_text("abcdefghij xy", 4), vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(wrap_text("日本語 です", 6), vec!["日本語", "です"]);
    }
}
