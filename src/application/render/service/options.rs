use comrak::options::Options;

/// Comrak options for documentation pages.
///
/// Front matter is stripped by the loader before rendering, so no delimiter is
/// configured here. Code blocks keep the `<pre><code class="language-x">` shape.
pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.description_lists = true;

    let render = &mut options.render;
    render.github_pre_lang = false;
    render.full_info_string = false;
    render.tasklist_classes = true;
    render.r#unsafe = true;
    render.sourcepos = false;

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use comrak::markdown_to_html;

    #[test]
    fn code_blocks_keep_language_class_on_code() {
        let html = markdown_to_html("```rust\nfn x() {}\n```\n", &default_options());
        assert!(html.contains("<pre><code class=\"language-rust\">"));
    }

    #[test]
    fn extended_syntax_is_enabled() {
        let html = markdown_to_html(
            "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n\nhttps://example.com\n",
            &default_options(),
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains("<a href=\"https://example.com\">"));
    }
}
