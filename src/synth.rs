//! Turns extracted article text into a short sequence of paragraphs.
//!
//! Two paths:
//!
//! - [`Synthesizer::body`] for page text. Structural split first (blank lines,
//!   or a period followed by two or more spaces), short fragments dropped. If
//!   that leaves fewer than `min_paragraphs`, sentences are regrouped into
//!   blocks of roughly `block_chars`.
//! - [`Synthesizer::summary`] for feed summaries, which never carry paragraph
//!   breaks: sentence grouping only, smaller blocks, at most
//!   `summary_max_blocks` of them.
//!
//! Too few paragraphs is not an error; callers get whatever was produced.

use crate::config::SynthesisConfig;
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\u{a0}]*\n").unwrap());
static RUN_ON_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[ \t\u{a0}]{2,}").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: SynthesisConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Paragraphs for full article text.
    pub fn body(&self, text: &str) -> Vec<String> {
        let c = &self.config;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut paragraphs = structural_paragraphs(text, c.min_paragraph_chars);
        if paragraphs.len() < c.min_paragraphs {
            let regrouped = group_sentences(
                text,
                c.block_chars,
                c.min_sentence_chars,
                c.min_paragraph_chars,
            );
            if regrouped.len() > paragraphs.len() {
                paragraphs = regrouped;
            }
        }
        paragraphs.truncate(c.max_paragraphs);
        paragraphs
    }

    /// Paragraphs for a feed summary.
    pub fn summary(&self, text: &str) -> Vec<String> {
        let c = &self.config;
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return Vec::new();
        }

        let mut blocks = group_sentences(&text, c.summary_block_chars, c.summary_min_sentence_chars, 0);
        if blocks.is_empty() {
            return vec![text];
        }
        blocks.truncate(c.summary_max_blocks);
        blocks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on blank lines, then on run-on breaks (`.` + 2 or more spaces),
/// keeping pieces of at least `min_chars` characters.
fn structural_paragraphs(text: &str, min_chars: usize) -> Vec<String> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    BLANK_LINE
        .split(&text)
        .flat_map(split_run_on)
        .map(|p| collapse_whitespace(&p))
        .filter(|p| !p.is_empty() && char_len(p) >= min_chars)
        .collect()
}

/// Split after every period that is followed by two or more spaces.
fn split_run_on(part: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in RUN_ON_BREAK.find_iter(part) {
        // Keep the period with the sentence it ends.
        let cut = m.start() + 1;
        pieces.push(part[start..cut].to_string());
        start = m.end();
    }
    pieces.push(part[start..].to_string());
    pieces
}

/// Sentences of `text` (whitespace collapsed), split after `.`, `!` or `?`.
fn split_sentences(text: &str) -> Vec<String> {
    let text = collapse_whitespace(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(&text) {
        let cut = m.start() + 1;
        sentences.push(text[start..cut].trim().to_string());
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Greedily group sentences longer than `min_sentence` characters into
/// blocks, closing a block once it reaches `target` characters. A trailing
/// block shorter than `min_tail` is merged into the previous block.
fn group_sentences(text: &str, target: usize, min_sentence: usize, min_tail: usize) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut block = String::new();

    for sentence in split_sentences(text) {
        if char_len(&sentence) <= min_sentence {
            continue;
        }
        if !block.is_empty() {
            block.push(' ');
        }
        block.push_str(&sentence);
        if char_len(&block) >= target {
            blocks.push(std::mem::take(&mut block));
        }
    }

    if !block.is_empty() {
        match blocks.last_mut() {
            Some(last) if char_len(&block) < min_tail => {
                last.push(' ');
                last.push_str(&block);
            }
            _ => blocks.push(block),
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> Synthesizer {
        Synthesizer::new(SynthesisConfig::default())
    }

    fn sentence(i: usize) -> String {
        format!(
            "La oración número {i:02} describe con detalle la evolución reciente del crédito otorgado por la banca de desarrollo."
        )
    }

    fn paragraph(i: usize) -> String {
        (0..2).map(|j| sentence(i * 10 + j)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(synth().body("").is_empty());
        assert!(synth().body("   \n\n  ").is_empty());
        assert!(synth().summary("").is_empty());
    }

    #[test]
    fn test_structured_prose_is_truncated_to_max() {
        let text = (0..6).map(paragraph).collect::<Vec<_>>().join("\n\n");
        assert!(text.chars().count() >= 1000);
        let pars = synth().body(&text);
        assert_eq!(pars.len(), 4);
        assert_eq!(pars[0], paragraph(0));
        assert!(pars.iter().all(|p| p.chars().count() >= 80));
    }

    #[test]
    fn test_short_fragments_are_dropped() {
        let text = format!(
            "{}\n\nFoto: Cuartoscuro\n\n{}\n\nPor Redacción\n\n{}",
            paragraph(1),
            paragraph(2),
            paragraph(3)
        );
        let pars = synth().body(&text);
        assert_eq!(pars, vec![paragraph(1), paragraph(2), paragraph(3)]);
    }

    #[test]
    fn test_run_on_text_is_split_on_double_spaces() {
        let text = format!("{}  {}  {}", paragraph(1), paragraph(2), paragraph(3));
        let pars = synth().body(&text);
        assert_eq!(pars.len(), 3);
        assert_eq!(pars[1], paragraph(2));
    }

    #[test]
    fn test_single_block_is_regrouped_by_sentences() {
        let text = (0..12).map(sentence).collect::<Vec<_>>().join(" ");
        assert!(text.chars().count() >= 1000);
        let pars = synth().body(&text);
        assert!((3..=4).contains(&pars.len()), "got {} paragraphs", pars.len());
        assert!(pars.iter().all(|p| p.chars().count() >= 80));
        assert!(pars[0].starts_with("La oración número 00"));
    }

    #[test]
    fn test_short_result_is_returned_as_is() {
        let text = paragraph(1);
        let pars = synth().body(&text);
        assert_eq!(pars, vec![paragraph(1)]);
    }

    #[test]
    fn test_short_tail_is_merged() {
        let blocks = group_sentences(
            "Primera oración bastante larga para contar en el bloque. Segunda oración también larga para el bloque. Tercera breve frase final.",
            60,
            10,
            80,
        );
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].starts_with("Primera oración"));
        assert!(blocks[0].ends_with("Tercera breve frase final."));
    }

    #[test]
    fn test_block_closes_when_reaching_target() {
        let first = "El crédito a pymes creció en el trimestre.";
        let second = "La banca de desarrollo lo atribuye a garantías.";
        let target = first.chars().count();
        let blocks = group_sentences(&format!("{first} {second}"), target, 5, 0);
        assert_eq!(blocks, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn test_summary_groups_into_small_blocks() {
        let text = (0..3).map(sentence).collect::<Vec<_>>().join(" ");
        let pars = synth().summary(&text);
        assert_eq!(pars.len(), 2);
        assert_eq!(pars[0], format!("{} {}", sentence(0), sentence(1)));
        assert_eq!(pars[1], sentence(2));
    }

    #[test]
    fn test_summary_is_capped() {
        let text = (0..20).map(sentence).collect::<Vec<_>>().join(" ");
        assert_eq!(synth().summary(&text).len(), 4);
    }

    #[test]
    fn test_summary_without_long_sentences_is_kept_whole() {
        assert_eq!(synth().summary("  Nafin  El Economista "), vec!["Nafin El Economista".to_string()]);
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("¿Sube el peso? Sí. ¡Claro!  Fin");
        assert_eq!(s, vec!["¿Sube el peso?", "Sí.", "¡Claro!", "Fin"]);
    }
}
