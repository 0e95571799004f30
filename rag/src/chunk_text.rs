use crate::config::Config;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub fn chunk_text(text: &str, cfg: &Config) -> Vec<String> {
    let size = cfg.chunk_size;
    let mut overlap = cfg.chunk_overlap;

    if size == 0 {
        let trimmed = text.trim();
        return if trimmed.is_empty() { vec![] } else { vec![trimmed.to_string()] };
    }
    if overlap >= size {
        overlap = size / 4;
    }

    let splitter = Splitter { size, overlap };
    splitter.split(text, &SEPARATORS)
}

struct Splitter {
    size: usize,
    overlap: usize,
}

impl Splitter {
    /// Split on the coarsest separator present, recursing into pieces that
    /// are still too large.
    fn split(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split(&piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    /// Greedily join small pieces into chunks of at most `size` chars,
    /// carrying up to `overlap` chars of trailing pieces into the next chunk.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = if current.is_empty() { 0 } else { sep_len };
            if total + len + joined_len > self.size && !current.is_empty() {
                push_trimmed(&mut chunks, &current.join(separator));
                while total > self.overlap
                    || (total > 0 && total + len + separator_cost(&current, sep_len) > self.size)
                {
                    let dropped = current.remove(0);
                    total -= char_len(dropped) + if current.is_empty() { 0 } else { sep_len };
                }
            }
            if !current.is_empty() {
                total += sep_len;
            }
            current.push(piece);
            total += len;
        }
        push_trimmed(&mut chunks, &current.join(separator));
        chunks
    }
}

fn separator_cost(current: &[&str], sep_len: usize) -> usize {
    if current.is_empty() { 0 } else { sep_len }
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(size: usize, overlap: usize) -> Config {
        let mut cfg = Config::from_lookup(|k| (k == "OPENAI_API_KEY").then(|| "sk".to_string()))
            .unwrap();
        cfg.chunk_size = size;
        cfg.chunk_overlap = overlap;
        cfg
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("  hello world \n", &cfg(1000, 0)), vec!["hello world"]);
        assert!(chunk_text("   ", &cfg(1000, 0)).is_empty());
    }

    #[test]
    fn paragraphs_are_packed_up_to_the_limit() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        assert_eq!(chunk_text(text, &cfg(10, 0)), vec!["aaaa\n\nbbbb", "cccc"]);
    }

    #[test]
    fn oversized_paragraph_falls_back_to_words() {
        let text = "one two three four\n\nfive";
        let chunks = chunk_text(text, &cfg(9, 0));
        assert_eq!(chunks, vec!["one two", "three", "four", "five"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 9));
    }

    #[test]
    fn unbroken_text_splits_by_character() {
        let chunks = chunk_text("abcdefghij", &cfg(4, 0));
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn overlap_carries_trailing_words() {
        let chunks = chunk_text("a b c d e f", &cfg(5, 2));
        assert_eq!(chunks, vec!["a b c", "c d e", "e f"]);
    }

    #[test]
    fn zero_size_keeps_whole_text() {
        assert_eq!(chunk_text(" abc def ", &cfg(0, 0)), vec!["abc def"]);
    }
}
