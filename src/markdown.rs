//! Markdown preview rendering.
//!
//! Builds on pulldown-cmark with two adjustments for files uploaded from a
//! local machine:
//! - images that point at relative paths (which cannot resolve once the file
//!   is served from storage) are replaced by a placeholder
//! - raw HTML inside the document is shown as text
//! - links with a scheme other than http, https, mailto or tel lose their target

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html::push_html};

/// Shown in the preview when the note's content cannot be fetched.
pub const LOAD_FAILED_PLACEHOLDER: &str = "**Failed to load**: could not read the Markdown file.";

const UNAVAILABLE_LABEL: &str = "[Local image unavailable]";

pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, get_options());
    let events = transform_events(parser);
    let mut html_output = String::new();
    push_html(&mut html_output, events.into_iter());
    html_output
}

fn get_options() -> Options {
    Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_TASKLISTS
}

/// Whether an image source can be requested as-is.
pub fn is_displayable_image_src(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://") || src.starts_with('/')
}

const SAFE_LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Whether a link target may be kept in the rendered preview.
///
/// Relative, root-relative and fragment targets have no scheme and are kept.
pub fn is_safe_link_target(dest: &str) -> bool {
    let cleaned: String = dest
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();
    let scheme_end = cleaned.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if cleaned[i..].starts_with(':') => {
            let scheme = cleaned[..i].to_ascii_lowercase();
            SAFE_LINK_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

enum State {
    Normal,
    InUnavailableImage { alt: String, depth: usize },
}

fn transform_events<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut state = State::Normal;

    for event in parser {
        match state {
            State::Normal => match event {
                Event::Start(Tag::Image { ref dest_url, .. }) if !is_displayable_image_src(dest_url) => {
                    state = State::InUnavailableImage { alt: String::new(), depth: 0 };
                }
                Event::Start(Tag::Link { link_type, dest_url, title, id }) => {
                    let dest_url = if is_safe_link_target(&dest_url) {
                        dest_url
                    } else {
                        CowStr::Borrowed("")
                    };
                    events.push(Event::Start(Tag::Link { link_type, dest_url, title, id }));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    events.push(Event::Text(html));
                }
                other => events.push(other),
            },

            State::InUnavailableImage { ref mut alt, ref mut depth } => match event {
                Event::Start(_) => *depth += 1,
                Event::End(TagEnd::Image) if *depth == 0 => {
                    events.push(Event::InlineHtml(CowStr::from(image_placeholder(alt))));
                    state = State::Normal;
                }
                Event::End(_) => *depth = depth.saturating_sub(1),
                Event::Text(t) | Event::Code(t) | Event::InlineHtml(t) => alt.push_str(&t),
                _ => {}
            },
        }
    }

    events
}

fn image_placeholder(alt: &str) -> String {
    let mut html = format!(
        r#"<span class="image-unavailable"><span class="image-unavailable-label">{}</span>"#,
        UNAVAILABLE_LABEL
    );
    if !alt.is_empty() {
        html.push_str(&format!(" <span class=\"image-unavailable-alt\">({})</span>", escape_html(alt)));
    }
    html.push_str("</span>");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
