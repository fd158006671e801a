//! Markdown to HTML for revealed lines and user messages
//!
//! Each revealed line is parsed on its own, so a partially revealed answer
//! never shows a construct that is still waiting for its closing line.
//! Links labelled `[name]` that name one of the answer's sources are turned
//! into links to the served document.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::config::SourcesConfig;
use crate::conversation::Source;

/// A single revealed line and its HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    pub text: String,
    pub html: String,
}

/// Render one line of an assistant answer.
pub fn render_line(line: &str, sources: &[Source], config: &SourcesConfig) -> RenderedLine {
    RenderedLine {
        text: line.to_string(),
        html: render_markdown(line, sources, config),
    }
}

/// Render a complete message, used for user messages which are not animated.
pub fn render_document(text: &str, sources: &[Source], config: &SourcesConfig) -> String {
    render_markdown(text.trim(), sources, config)
}

/// Resolve a link label such as `[brochure]` against the sources.
///
/// Returns the document path and the text to show for the link.
pub fn resolve_citation(
    label: &str,
    sources: &[Source],
    config: &SourcesConfig,
) -> Option<(String, String)> {
    let name = label.strip_prefix('[')?.strip_suffix(']')?;
    let source = sources.iter().find(|s| s.source == name)?;
    let text = match source.page_number() {
        Some(page) => format!("{name} (Page {page})"),
        None => name.to_string(),
    };
    Some((source.resource_path(config), text))
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn render_markdown(input: &str, sources: &[Source], config: &SourcesConfig) -> String {
    let parser = Parser::new_ext(input, options());
    let events = Writer::new(parser, sources, config).run();

    let mut out = String::with_capacity(input.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

struct Writer<'a, 's, I>
where
    I: Iterator<Item = Event<'a>>,
{
    iter: I,
    sources: &'s [Source],
    config: &'s SourcesConfig,
    events: Vec<Event<'a>>,
}

impl<'a, 's, I> Writer<'a, 's, I>
where
    I: Iterator<Item = Event<'a>>,
{
    fn new(iter: I, sources: &'s [Source], config: &'s SourcesConfig) -> Self {
        Self {
            iter,
            sources,
            config,
            events: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Event<'a>> {
        while let Some(ev) = self.iter.next() {
            self.handle_event(ev);
        }
        self.events
    }

    fn handle_event(&mut self, event: Event<'a>) {
        match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                ..
            }) => self.link(link_type, dest_url),
            Event::Start(Tag::CodeBlock(kind)) => self.start_codeblock(kind),
            Event::End(TagEnd::CodeBlock) => self.push_html("</code></pre>\n"),
            Event::Start(Tag::List(start)) => self.start_list(start),
            Event::End(TagEnd::List(ordered)) => {
                self.push_html(if ordered { "</ol>\n" } else { "</ul>\n" })
            }
            Event::Code(code) => self.events.push(Event::InlineHtml(
                format!("<code class=\"inline-code\">{}</code>", escape(&code)).into(),
            )),
            // Raw HTML from the message is shown as text, never interpreted.
            Event::Html(raw) | Event::InlineHtml(raw) => self.events.push(Event::Text(raw)),
            other => self.events.push(other),
        }
    }

    fn push_html(&mut self, html: &'static str) {
        self.events.push(Event::Html(CowStr::Borrowed(html)));
    }

    fn start_codeblock(&mut self, kind: CodeBlockKind<'a>) {
        let lang = match kind {
            CodeBlockKind::Fenced(info) => info
                .split_whitespace()
                .next()
                .map(str::to_string)
                .filter(|lang| !lang.is_empty()),
            CodeBlockKind::Indented => None,
        };
        let open = match lang {
            Some(lang) => format!(
                "<pre class=\"code-block\"><code class=\"language-{}\">",
                escape(&lang)
            ),
            None => "<pre class=\"code-block\"><code>".to_string(),
        };
        self.events.push(Event::Html(open.into()));
    }

    fn start_list(&mut self, start: Option<u64>) {
        let open = match start {
            None => "<ul class=\"list-disc\">\n".to_string(),
            Some(1) => "<ol class=\"list-decimal\">\n".to_string(),
            Some(n) => format!("<ol class=\"list-decimal\" start=\"{n}\">\n"),
        };
        self.events.push(Event::Html(open.into()));
    }

    fn link(&mut self, link_type: LinkType, dest_url: CowStr<'a>) {
        let mut label = String::new();
        let mut inner = Vec::new();
        for ev in self.iter.by_ref() {
            if let Event::Text(text) | Event::Code(text) = &ev {
                label.push_str(text);
            }
            match ev {
                Event::End(TagEnd::Link) => break,
                other => inner.push(other),
            }
        }

        if let Some((href, text)) = resolve_citation(&label, self.sources, self.config) {
            self.events.push(Event::InlineHtml(
                format!(
                    "<a href=\"{}\" class=\"citation\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                    escape(&href),
                    escape(&text)
                )
                .into(),
            ));
            return;
        }

        let href = match link_type {
            LinkType::Email => format!("mailto:{}", &*dest_url),
            _ => dest_url.into_string(),
        };
        if !is_safe_href(&href) {
            tracing::debug!(href = %href, "dropping link with unsupported scheme");
            for ev in inner {
                self.handle_event(ev);
            }
            return;
        }
        self.events.push(Event::InlineHtml(
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                escape(&href)
            )
            .into(),
        ));
        for ev in inner {
            self.handle_event(ev);
        }
        self.events.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
    }
}

/// Relative links and `http`, `https` and `mailto` targets only.
fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    let scheme_end = href.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(end) if href[end..].starts_with(':') => {
            let scheme = href[..end].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
