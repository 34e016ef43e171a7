use html_escape::encode_text;
use once_cell::sync::Lazy;
use syntect::{
    dumps::from_uncompressed_data,
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Language token used when a block declares none or an unsupported one.
pub const PLAIN_LANGUAGE: &str = "text";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(|| {
    let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
    from_uncompressed_data(syntax_bytes).expect("syntax pack must be valid")
});

/// Stylesheet matching the class names emitted by [`SyntectHighlighter`].
pub const THEME_CSS: &str = include_str!(env!("SYNTAX_THEME_CSS_FILE"));

/// Capability interface for code highlighting back-ends.
pub trait Highlighter: Send + Sync {
    fn supports_language(&self, language: &str) -> bool;

    /// Returns the inner HTML for a `<code>` element.
    fn highlight(&self, code: &str, language: &str) -> Result<String, RenderError>;
}

/// Syntect back-end emitting `syntax-` prefixed CSS classes.
pub struct SyntectHighlighter {
    syntax_set: &'static SyntaxSet,
    class_style: ClassStyle,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: &SYNTAX_SET,
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn supports_language(&self, language: &str) -> bool {
        !language.eq_ignore_ascii_case(PLAIN_LANGUAGE)
            && find_syntax(self.syntax_set, language).is_some()
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, RenderError> {
        let syntax = find_syntax(self.syntax_set, language)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, self.syntax_set, self.class_style);

        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|err| RenderError::Highlighting {
                    language: language.to_string(),
                    message: err.to_string(),
                })?;
        }

        Ok(generator.finalize())
    }
}

/// Back-end that only escapes code, for hosts that ship no highlighting CSS.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn supports_language(&self, _language: &str) -> bool {
        false
    }

    fn highlight(&self, code: &str, _language: &str) -> Result<String, RenderError> {
        Ok(encode_text(code).into_owned())
    }
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(&lowercase))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}
