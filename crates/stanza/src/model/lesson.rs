use anyhow::Context;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Tag};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{
    front_matter::{FrontMatter, Split},
    link::LinkRef,
    slug::Slug,
};
use crate::{
    cmark::{flatten_breaks, CMarkParser, EventIteratorExt as _},
    error::Result,
};

/// A `Lesson` is an in-memory representation of a single lesson file on disk.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// The slug and display order derived from the file name.
    pub slug: Slug,
    /// The location of the lesson relative to the catalog root.
    pub path: PathBuf,
    /// The metadata block at the top of the file.
    pub front_matter: FrontMatter,
    /// The first H1 of the lesson body.
    pub title: Option<String>,
    /// The markdown following the front matter.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    /// Every code block in the body, in document order.
    pub code_blocks: Vec<CodeBlock>,
    /// Every link in the body, in document order.
    pub links: Vec<LinkRef>,
    /// Links listed under a "Resources" heading.
    pub resources: Vec<LinkRef>,
    /// The blockquote closing the lesson that links back to the hosted course page.
    pub attribution: Option<Attribution>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// The language tag, the first word of the info string.
    pub lang: Option<String>,
    /// The full info string of a fenced block.
    pub info: String,
    /// Indented code blocks are not fenced and never carry a language.
    pub fenced: bool,
    pub line: usize,
}

impl CodeBlock {
    fn new(info: &str, fenced: bool, line: usize) -> Self {
        let lang = info
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .find(|part| !part.is_empty())
            .map(String::from);

        Self {
            lang,
            info: info.trim().to_string(),
            fenced,
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    /// The plain text of the blockquote.
    pub text: String,
    /// The first link of the blockquote.
    pub url: String,
    pub line: usize,
}

impl Lesson {
    /// Build a lesson from its already split front matter and body.
    pub fn from_parts(path: PathBuf, front_matter: FrontMatter, split: Split<'_>) -> Result<Lesson> {
        let scan = LessonParser::new(split.body, split.body_line_offset)
            .parse()
            .with_context(|| format!("Failed to parse lesson {}", path.display()))?;

        Ok(Lesson {
            slug: Slug::from_path(&path),
            path,
            front_matter,
            title: scan.title,
            body: split.body.to_string(),
            code_blocks: scan.code_blocks,
            links: scan.links,
            resources: scan.resources,
            attribution: scan.attribution,
        })
    }

    /// The lesson heading, or a title derived from the slug.
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.slug.humanize())
    }
}

#[derive(Default)]
struct Scan {
    title: Option<String>,
    code_blocks: Vec<CodeBlock>,
    links: Vec<LinkRef>,
    resources: Vec<LinkRef>,
    attribution: Option<Attribution>,
}

struct LessonParser<'a> {
    parser: CMarkParser<'a>,
    line_offset: usize,
}

impl<'a> LessonParser<'a> {
    fn new(source: &'a str, line_offset: usize) -> Self {
        Self {
            parser: CMarkParser::new(source),
            line_offset,
        }
    }

    fn line(&self) -> usize {
        self.parser.position().line + self.line_offset
    }

    fn parse(mut self) -> Result<Scan> {
        let mut scan = Scan::default();
        // Depth of open container and inline tags; zero between top-level blocks.
        let mut depth = 0usize;
        let mut resources_level: Option<HeadingLevel> = None;

        while let Some(event) = self.parser.next_event() {
            match event {
                Event::Start(Tag::Heading(level, ..)) => {
                    let heading = self.parse_heading(&mut scan.links)?;

                    if scan.title.is_none() && level == HeadingLevel::H1 {
                        scan.title = Some(heading.clone());
                    }

                    if is_resources_heading(&heading) {
                        resources_level = Some(level);
                    } else if resources_level.is_some_and(|current| level <= current) {
                        resources_level = None;
                    }

                    if depth == 0 {
                        scan.attribution = None;
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let line = self.line();
                    let (info, fenced) = match kind {
                        CodeBlockKind::Fenced(info) => (info.to_string(), true),
                        CodeBlockKind::Indented => (String::new(), false),
                    };

                    self.parser
                        .iter_until_and_consume(|event| {
                            matches!(event, Event::End(Tag::CodeBlock(_)))
                        })
                        .for_each(drop);

                    scan.code_blocks.push(CodeBlock::new(&info, fenced, line));

                    if depth == 0 {
                        scan.attribution = None;
                    }
                }
                Event::Start(Tag::BlockQuote) if depth == 0 => {
                    scan.attribution = self.parse_quote(&mut scan.links)?;
                }
                Event::Start(Tag::Link(_, href, _)) => {
                    let link = self.parse_link(href.to_string())?;

                    if resources_level.is_some() {
                        scan.resources.push(link.clone());
                    }

                    scan.links.push(link);
                }
                Event::Start(_) => {
                    if depth == 0 {
                        scan.attribution = None;
                    }

                    depth += 1;
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => (),
            }
        }

        Ok(scan)
    }

    fn parse_heading(&mut self, links: &mut Vec<LinkRef>) -> Result<String> {
        let mut events = Vec::new();

        loop {
            match self.parser.next_event() {
                Some(Event::End(Tag::Heading(..))) | None => break,
                Some(Event::Start(Tag::Link(_, href, _))) => {
                    let link = self.parse_link(href.to_string())?;
                    events.push(Event::Text(link.text.clone().into()));
                    links.push(link);
                }
                Some(event) => events.push(flatten_breaks(event)),
            }
        }

        events.iter().stringify()
    }

    fn parse_link(&mut self, href: String) -> Result<LinkRef> {
        let line = self.line();
        let column = self.parser.position().column;
        let text = self
            .parser
            .iter_until_and_consume(|event| matches!(event, Event::End(Tag::Link(..))))
            .map(flatten_breaks)
            .stringify()
            .with_context(|| format!("Failed to read link text at line {line}, column {column}"))?;

        Ok(LinkRef::new(text, href, line))
    }

    /// Consume a top-level blockquote, returning it as an attribution if it contains a link.
    fn parse_quote(&mut self, links: &mut Vec<LinkRef>) -> Result<Option<Attribution>> {
        let line = self.line();
        let mut nested = 0usize;
        let mut url = None;
        let mut words: Vec<String> = Vec::new();

        loop {
            match self.parser.next_event() {
                Some(Event::Start(Tag::BlockQuote)) => nested += 1,
                Some(Event::End(Tag::BlockQuote)) if nested == 0 => break,
                Some(Event::End(Tag::BlockQuote)) => nested -= 1,
                Some(Event::Start(Tag::Link(_, href, _))) => {
                    let link = self.parse_link(href.to_string())?;

                    url.get_or_insert_with(|| link.target.clone());
                    words.extend(link.text.split_whitespace().map(String::from));
                    links.push(link);
                }
                Some(Event::Text(text)) | Some(Event::Code(text)) => {
                    words.extend(text.split_whitespace().map(String::from));
                }
                Some(_) => (),
                None => break,
            }
        }

        Ok(url.map(|url| Attribution {
            text: words.join(" "),
            url,
            line,
        }))
    }
}

fn is_resources_heading(heading: &str) -> bool {
    heading
        .trim()
        .trim_end_matches(':')
        .to_lowercase()
        .ends_with("resources")
}
