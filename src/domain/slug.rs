//! Deterministic heading anchors.
//!
//! ASCII slugification (`slug` crate) is combined with Chinese
//! transliteration (`pinyin` crate) so a heading like “基线对齐” becomes
//! `ji-xian-dui-qi`. [`AnchorSlugger`] keeps anchors unique within one
//! document.

use std::collections::{HashMap, HashSet};

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

/// Base anchor used for headings whose text yields no slug characters.
pub const FALLBACK_ANCHOR: &str = "section";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a base slug from the provided human-readable text.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single hyphen and trims hyphens from both ends.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let candidate = slugify(&transliterated);

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Generate unique anchor slugs within a single document.
///
/// Headings processed in order receive monotonic suffixes when duplicates
/// occur (`overview`, `overview-2`, `overview-3`). Ids that already exist in
/// the document can be reserved up front; generated anchors skip them.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
    used: HashSet<String>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an id as taken without consuming a suffix for its base.
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    pub fn is_used(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    /// Take `id` as written, or the first free `id-N` when it is already taken.
    pub fn claim(&mut self, id: &str) -> String {
        if self.used.insert(id.to_string()) {
            return id.to_string();
        }
        (2..)
            .map(|n| format!("{id}-{n}"))
            .find(|candidate| self.used.insert(candidate.clone()))
            .unwrap_or_else(|| id.to_string())
    }

    /// Anchor for the given heading text, unique within this slugger.
    pub fn anchor_for(&mut self, heading: &str) -> String {
        let base = derive_slug(heading).unwrap_or_else(|_| FALLBACK_ANCHOR.to_string());
        let count = self.occurrences.entry(base.clone()).or_insert(0);

        loop {
            *count += 1;
            let candidate = if *count == 1 {
                base.clone()
            } else {
                format!("{base}-{}", *count)
            };

            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            // slugify decides what to keep.
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_collapses_separators() {
        assert_eq!(derive_slug("Getting   Started!").expect("slug"), "getting-started");
        assert_eq!(derive_slug("  --API v2.0--  ").expect("slug"), "api-v2-0");
    }

    #[test]
    fn derive_slug_transliterates_chinese() {
        let slug = derive_slug("Rust 基础教程").expect("slug");
        assert_eq!(slug, "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn derive_slug_is_deterministic() {
        assert_eq!(derive_slug("Install & Run"), derive_slug("Install & Run"));
    }

    #[test]
    fn derive_slug_rejects_symbol_only_text() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn anchor_slugger_produces_unique_slugs() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.anchor_for("Overview"), "overview");
        assert_eq!(slugger.anchor_for("Overview"), "overview-2");
        assert_eq!(slugger.anchor_for("Overview"), "overview-3");
        assert_eq!(slugger.anchor_for("深入理解"), "shen-ru-li-jie");
    }

    #[test]
    fn anchor_slugger_falls_back_for_empty_headings() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.anchor_for("???"), FALLBACK_ANCHOR);
        assert_eq!(slugger.anchor_for(""), "section-2");
    }

    #[test]
    fn anchor_slugger_skips_reserved_and_generated_collisions() {
        let mut slugger = AnchorSlugger::new();
        slugger.reserve("setup");

        assert_eq!(slugger.anchor_for("Setup"), "setup-2");
        assert_eq!(slugger.anchor_for("Setup 3"), "setup-3");
        assert_eq!(slugger.anchor_for("Setup"), "setup-4");
    }

    #[test]
    fn claim_keeps_free_ids_and_suffixes_taken_ones() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.claim("dup"), "dup");
        assert_eq!(slugger.claim("dup"), "dup-2");
        assert_eq!(slugger.claim("dup"), "dup-3");
        assert_eq!(slugger.anchor_for("Dup"), "dup-4");
    }
}
