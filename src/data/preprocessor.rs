// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Prepares free text (an `ask` context, a .docx passage) so it
// looks like the whitespace-tokenised SQuAD files the model was
// trained on.
//
// clean():
//   1. Replace Unicode whitespace variants and control chars with spaces
//   2. Collapse runs of spaces, trim each line
//   3. Collapse more than 2 consecutive newlines
//
// words():
//   Split on whitespace, then peel punctuation off both ends of
//   each word so "Paris," becomes ["Paris", ","]. Punctuation
//   inside a word ("U.S", "o'clock", "1,000") is left alone.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                '\r' => '\n',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        let lines: String = normalised
            .lines()
            .map(|line| line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n");

        let mut result        = String::with_capacity(lines.len());
        let mut newline_count = 0usize;
        for c in lines.chars() {
            if c == '\n' {
                newline_count += 1;
                if newline_count <= 2 {
                    result.push(c);
                }
            } else {
                newline_count = 0;
                result.push(c);
            }
        }

        result.trim().to_string()
    }

    pub fn words(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for raw in text.split_whitespace() {
            let mut word = raw;

            while let Some(c) = word.chars().next().filter(|c| c.is_ascii_punctuation()) {
                out.push(c.to_string());
                word = &word[c.len_utf8()..];
            }

            let mut trailing = Vec::new();
            while let Some(c) = word.chars().next_back().filter(|c| c.is_ascii_punctuation()) {
                trailing.push(c.to_string());
                word = &word[..word.len() - c.len_utf8()];
            }

            if !word.is_empty() {
                out.push(word.to_string());
            }
            out.extend(trailing.into_iter().rev());
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
