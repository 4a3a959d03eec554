use anyhow::Context;
use pulldown_cmark::{Event, HeadingLevel, Tag};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::warn;

use super::{
    front_matter::{self, FrontMatterError, IndexFrontMatter},
    link::{local_target, normalize, LinkRef},
};
use crate::{
    cmark::{flatten_breaks, CMarkParser, EventIteratorExt},
    error::{Error, Result},
};

/// A parsed course or section `README.md`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Optional front matter, used by course indexes to name their `source_course`.
    pub front_matter: Option<IndexFrontMatter>,
    /// The first H1 of the document.
    pub title: Option<String>,
    /// The first paragraph that precedes any list.
    pub description: Option<String>,
    /// Linked list items, in document order.
    pub entries: Vec<IndexEntry>,
    /// Items listed under a heading mentioning challenges.
    pub challenges: Vec<ChallengeRef>,
    /// A challenge total stated in a challenge heading, such as `## Challenges (5)`.
    pub declared_challenges: Option<u32>,
    /// Every link in the document.
    pub links: Vec<LinkRef>,
}

impl IndexDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let (front_matter, body, line_offset) = match front_matter::split(&source) {
            Ok(split) => {
                let front_matter = serde_yaml::from_str::<IndexFrontMatter>(split.yaml)
                    .map_err(|error| {
                        warn!(path = %path.display(), %error, "Ignoring malformed index front matter");
                    })
                    .ok();

                (front_matter, split.body, split.body_line_offset)
            }
            Err(FrontMatterError::Missing) => (None, source.as_str(), 0),
            Err(error) => {
                warn!(path = %path.display(), %error, "Ignoring malformed index front matter");
                (None, source.as_str(), 0)
            }
        };

        let mut document = IndexParser::new(body, line_offset)
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        document.front_matter = front_matter;

        Ok(document)
    }

    /// Iterate over all entries, including nested ones, depth first.
    pub fn iter_entries(&self) -> impl Iterator<Item = &IndexEntry> + '_ {
        let mut stack: Vec<&IndexEntry> = self.entries.iter().rev().collect();

        std::iter::from_fn(move || {
            let entry = stack.pop()?;
            stack.extend(entry.nested_entries.iter().rev());

            Some(entry)
        })
    }

    /// Whether any entry links to `path` (relative to the index document).
    /// A link into a directory, such as `1-basics/README.md`, references that directory.
    pub fn references(&self, path: impl AsRef<Path>) -> bool {
        let path = normalize(path);

        self.iter_entries()
            .filter_map(|entry| entry.location.as_ref())
            .any(|location| {
                let location = normalize(location);
                location == path || location.starts_with(&path)
            })
    }

    /// The number of challenges the index accounts for: the listed challenges when there are
    /// any, otherwise the sum of the per-entry counts.
    pub fn challenge_count(&self) -> u32 {
        if !self.challenges.is_empty() {
            return self.challenges.len() as u32;
        }

        self.iter_entries()
            .filter_map(|entry| entry.challenge_count)
            .sum()
    }
}

impl FromStr for IndexDocument {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        IndexParser::new(source, 0).parse()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The link text.
    pub name: String,
    /// The linked file, relative to the index document. Empty, external and anchor links
    /// have no location.
    pub location: Option<PathBuf>,
    /// The challenge count stated after the link, such as `(3 challenges)`.
    pub challenge_count: Option<u32>,
    /// Any entries nested below this one.
    pub nested_entries: Vec<IndexEntry>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeKind {
    MultipleChoice,
    FillInBlank,
    Matching,
    Other(String),
}

impl ChallengeKind {
    pub fn parse(kind: &str) -> Self {
        let normalized: String = kind
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "multiplechoice" | "mcq" => ChallengeKind::MultipleChoice,
            "fillintheblank" | "fillintheblanks" | "fillinblank" | "fillinblanks" => {
                ChallengeKind::FillInBlank
            }
            "matching" => ChallengeKind::Matching,
            _ => ChallengeKind::Other(kind.trim().to_string()),
        }
    }
}

/// A pointer to an interactive challenge hosted outside of the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRef {
    pub title: String,
    pub kind: Option<ChallengeKind>,
    pub line: usize,
}

impl ChallengeRef {
    /// Parse `Title (kind)`, `Title - kind` or a bare `Title`.
    pub fn parse(text: &str, line: usize) -> Self {
        let text = text.trim();
        let clean = |title: &str| {
            title
                .trim()
                .trim_matches(|c| c == '*' || c == '_')
                .trim()
                .to_string()
        };

        let parenthesized = text
            .strip_suffix(')')
            .and_then(|rest| rest.rsplit_once('('));
        let dashed = || {
            ["—", "–", " - "]
                .iter()
                .find_map(|separator| text.rsplit_once(separator))
        };

        match parenthesized.or_else(dashed) {
            Some((title, kind)) if !title.trim().is_empty() && !kind.trim().is_empty() => {
                ChallengeRef {
                    title: clean(title),
                    kind: Some(ChallengeKind::parse(kind)),
                    line,
                }
            }
            _ => ChallengeRef {
                title: clean(text),
                kind: None,
                line,
            },
        }
    }
}

/// Read a count such as `3 challenges` or `(2 interactive challenges)` from `text`.
pub fn parse_challenge_count(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    let position = lowered.find("challenge")?;

    lowered[..position]
        .split_whitespace()
        .rev()
        .find(|token| *token != "interactive")
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
}

fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Entries,
    Challenges,
}

#[derive(Default)]
struct ListFrame {
    entries: Vec<IndexEntry>,
    /// Whether the most recent item of this list became an entry that nested lists attach to.
    open_entry: bool,
}

struct ParsedItem {
    text: String,
    link: Option<(String, String)>,
    trailing: String,
}

struct IndexParser<'a> {
    parser: CMarkParser<'a>,
    line_offset: usize,
}

impl<'a> IndexParser<'a> {
    fn new(source: &'a str, line_offset: usize) -> Self {
        Self {
            parser: CMarkParser::new(source),
            line_offset,
        }
    }

    fn line(&self) -> usize {
        self.parser.position().line + self.line_offset
    }

    fn parse(mut self) -> Result<IndexDocument> {
        let mut document = IndexDocument::default();
        document.title = self.parse_title(&mut document.links)?;

        let mut mode = Mode::Entries;
        let mut lists: Vec<ListFrame> = Vec::new();

        while let Some(event) = self.parser.next_event() {
            match event {
                Event::Start(Tag::Heading(..)) => {
                    let heading = self.parse_inline(
                        |event| matches!(event, Event::End(Tag::Heading(..))),
                        &mut document.links,
                    )?;

                    if heading.to_lowercase().contains("challenge") {
                        mode = Mode::Challenges;
                        document.declared_challenges =
                            first_number(&heading).or(document.declared_challenges);
                    } else {
                        mode = Mode::Entries;
                    }
                }
                Event::Start(Tag::Paragraph) if lists.is_empty() => {
                    let paragraph = self.parse_inline(
                        |event| matches!(event, Event::End(Tag::Paragraph)),
                        &mut document.links,
                    )?;

                    let is_preamble = mode == Mode::Entries
                        && document.description.is_none()
                        && document.entries.is_empty()
                        && document.challenges.is_empty();

                    if is_preamble && !paragraph.trim().is_empty() {
                        document.description = Some(paragraph.trim().to_string());
                    }
                }
                Event::Start(Tag::List(_)) => lists.push(ListFrame::default()),
                Event::End(Tag::List(_)) => {
                    let frame = lists.pop().unwrap_or_default();

                    match lists.last_mut() {
                        Some(parent) if parent.open_entry => {
                            if let Some(entry) = parent.entries.last_mut() {
                                entry.nested_entries.extend(frame.entries);
                            }
                        }
                        Some(parent) => parent.entries.extend(frame.entries),
                        None => document.entries.extend(frame.entries),
                    }
                }
                Event::Start(Tag::Item) => {
                    let line = self.line();
                    let item = self.parse_item(&mut document.links)?;

                    match mode {
                        Mode::Challenges => {
                            if let Some(frame) = lists.last_mut() {
                                frame.open_entry = false;
                            }

                            if !item.text.is_empty() {
                                document.challenges.push(ChallengeRef::parse(&item.text, line));
                            }
                        }
                        Mode::Entries => {
                            let Some(frame) = lists.last_mut() else {
                                continue;
                            };

                            frame.open_entry = item.link.is_some();

                            if let Some((name, href)) = item.link {
                                frame.entries.push(IndexEntry {
                                    name,
                                    location: local_target(&href),
                                    challenge_count: parse_challenge_count(&item.trailing),
                                    nested_entries: Vec::new(),
                                    line,
                                });
                            }
                        }
                    }
                }
                Event::Start(Tag::Link(_, href, _)) => {
                    let line = self.line();
                    let text = self.parse_link_text()?;
                    document.links.push(LinkRef::new(text, href.to_string(), line));
                }
                _ => (),
            }
        }

        Ok(document)
    }

    fn parse_title(&mut self, links: &mut Vec<LinkRef>) -> Result<Option<String>> {
        loop {
            match self.parser.peek_event() {
                Some(Event::Start(Tag::Heading(HeadingLevel::H1, ..))) => {
                    // NOTE: Skip the start tag that was peeked.
                    self.parser.next_event();
                    let heading = self.parse_inline(
                        |event| matches!(event, Event::End(Tag::Heading(HeadingLevel::H1, ..))),
                        links,
                    )?;

                    return Ok(Some(heading));
                }
                Some(Event::Html(_)) => {
                    self.parser.next_event(); // Skip HTML, such as comments.
                }
                _ => return Ok(None),
            }
        }
    }

    /// Stringify inline content up to and including the delimeter, recording any links.
    fn parse_inline(
        &mut self,
        delimeter: impl Fn(&Event<'a>) -> bool,
        links: &mut Vec<LinkRef>,
    ) -> Result<String> {
        let mut events = Vec::new();

        loop {
            match self.parser.next_event() {
                Some(event) if delimeter(&event) => break,
                Some(Event::Start(Tag::Link(_, href, _))) => {
                    let line = self.line();
                    let text = self.parse_link_text()?;
                    events.push(Event::Text(text.clone().into()));
                    links.push(LinkRef::new(text, href.to_string(), line));
                }
                Some(event) => events.push(flatten_breaks(event)),
                None => break,
            }
        }

        events.iter().stringify()
    }

    fn parse_link_text(&mut self) -> Result<String> {
        let line = self.line();
        let column = self.parser.position().column;

        self.parser
            .iter_until_and_consume(|event| matches!(event, Event::End(Tag::Link(..))))
            .map(flatten_breaks)
            .stringify()
            .with_context(|| format!("Failed to read link text at line {line}, column {column}"))
    }

    /// Parse a list item up to its end, or up to a nested list which is left in the stream.
    fn parse_item(&mut self, links: &mut Vec<LinkRef>) -> Result<ParsedItem> {
        let mut events = Vec::new();
        let mut link = None;
        let mut leading = true;
        let mut trailing = String::new();

        loop {
            if matches!(self.parser.peek_event(), Some(Event::Start(Tag::List(_))) | None) {
                break;
            }

            let Some(event) = self.parser.next_event() else {
                break;
            };

            match event {
                Event::End(Tag::Item) => break,
                Event::Start(Tag::Paragraph) | Event::End(Tag::Paragraph) => (),
                Event::Start(Tag::Link(_, href, _)) => {
                    let line = self.line();
                    let text = self.parse_link_text()?;

                    if leading {
                        link = Some((text.clone(), href.to_string()));
                    }

                    leading = false;
                    events.push(Event::Text(text.clone().into()));
                    links.push(LinkRef::new(text, href.to_string(), line));
                }
                other => {
                    match &other {
                        Event::Text(text) | Event::Code(text) if link.is_some() => {
                            trailing.push_str(text)
                        }
                        _ => (),
                    }

                    if !matches!(&other, Event::Text(text) if text.trim().is_empty()) {
                        leading = false;
                    }

                    events.push(flatten_breaks(other));
                }
            }
        }

        let text = events.iter().stringify()?.trim().to_string();

        Ok(ParsedItem {
            text,
            link,
            trailing,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(source: &str) -> IndexDocument {
        source.parse().expect("index failed to parse")
    }

    fn entry(name: &str, location: &str, line: usize) -> IndexEntry {
        IndexEntry {
            name: String::from(name),
            location: Some(PathBuf::from(location)),
            challenge_count: None,
            nested_entries: Vec::new(),
            line,
        }
    }

    #[test]
    fn parses_title() {
        let document = parse("# Routing Basics");

        assert_eq!(Some(String::from("Routing Basics")), document.title);
    }

    #[test]
    fn skips_comments_and_parses_title() {
        let input = r"<!-- # Section Title -->
# Actual Title
";
        let document = parse(input);

        assert_eq!(Some(String::from("Actual Title")), document.title);
    }

    #[test]
    fn parses_description_before_lessons() {
        let input = r#"# Routing

Learn how requests reach your controllers.

* [Intro](1-intro.md)

A trailing paragraph.
"#;
        let document = parse(input);

        assert_eq!(
            Some(String::from("Learn how requests reach your controllers.")),
            document.description
        );
    }

    #[test]
    fn lists_all_linked_lessons() {
        let input = r#"# Routing

1. [Intro](1-intro.md)
2. [Route Parameters](2-route-parameters.md)
"#;
        let document = parse(input);
        let expected = vec![
            entry("Intro", "1-intro.md", 3),
            entry("Route Parameters", "2-route-parameters.md", 4),
        ];

        assert_eq!(expected, document.entries);
    }

    #[test]
    fn nests_entries_below_their_parent() {
        let input = r#"
* [Basics](1-basics/README.md)
  * [Intro](1-basics/1-intro.md)
* [Advanced](2-advanced/README.md)
"#;
        let document = parse(input);

        assert_eq!(2, document.entries.len());
        assert_eq!(
            vec![entry("Intro", "1-basics/1-intro.md", 3)],
            document.entries[0].nested_entries
        );
        assert_eq!(3, document.iter_entries().count());
    }

    #[test]
    fn nested_entries_of_unlinked_items_are_flattened() {
        let input = r#"
* Basics
  * [Intro](1-intro.md)
"#;
        let document = parse(input);

        assert_eq!(vec![entry("Intro", "1-intro.md", 3)], document.entries);
    }

    #[test]
    fn reads_challenge_counts_after_links() {
        let input = r#"
* [Intro](1-intro.md) (3 challenges)
* [Params](2-params.md) - 1 interactive challenge
* [Groups](3-groups.md)
"#;
        let document = parse(input);
        let counts: Vec<_> = document
            .entries
            .iter()
            .map(|entry| entry.challenge_count)
            .collect();

        assert_eq!(vec![Some(3), Some(1), None], counts);
        assert_eq!(4, document.challenge_count());
    }

    #[test]
    fn lists_challenges_under_challenge_heading() {
        let input = r#"# Routing

* [Intro](1-intro.md)

## Interactive Challenges (3)

- Route Basics (multiple choice)
- **Named Routes** - Fill in the blank
- Verbs and handlers (Matching)
- Freeform
"#;
        let document = parse(input);
        let expected = vec![
            ChallengeRef {
                title: String::from("Route Basics"),
                kind: Some(ChallengeKind::MultipleChoice),
                line: 7,
            },
            ChallengeRef {
                title: String::from("Named Routes"),
                kind: Some(ChallengeKind::FillInBlank),
                line: 8,
            },
            ChallengeRef {
                title: String::from("Verbs and handlers"),
                kind: Some(ChallengeKind::Matching),
                line: 9,
            },
            ChallengeRef {
                title: String::from("Freeform"),
                kind: None,
                line: 10,
            },
        ];

        assert_eq!(expected, document.challenges);
        assert_eq!(Some(3), document.declared_challenges);
        assert_eq!(1, document.entries.len());
        assert_eq!(4, document.challenge_count());
    }

    #[test]
    fn records_every_link() {
        let input = r#"# Course

See the [setup guide](setup.md) first.

* [Basics](1-basics/README.md)
"#;
        let document = parse(input);
        let targets: Vec<_> = document
            .links
            .iter()
            .map(|link| (link.target.as_str(), link.line))
            .collect();

        assert_eq!(vec![("setup.md", 3), ("1-basics/README.md", 5)], targets);
    }

    #[test]
    fn references_directories_through_their_readme() {
        let document = parse("* [Basics](./1-basics/README.md)");

        assert!(document.references("1-basics"));
        assert!(!document.references("2-advanced"));
    }

    #[test]
    fn locations_drop_fragments_and_queries() {
        let input = r#"
1. [Unions](1-unions.md#overview)
2. [Generics](./2-generics.md?plain=1)
3. [Mapped Types](3-mapped%20types.md)
4. [Handbook](https://www.typescriptlang.org/docs/)
"#;
        let document = parse(input);
        let locations: Vec<_> = document
            .entries
            .iter()
            .map(|entry| entry.location.clone())
            .collect();

        assert_eq!(
            vec![
                Some(PathBuf::from("1-unions.md")),
                Some(PathBuf::from("2-generics.md")),
                Some(PathBuf::from("3-mapped types.md")),
                None,
            ],
            locations
        );
        assert!(document.references("1-unions.md"));
    }

    #[test]
    fn link_titles_with_breaks_are_converted_to_spaces() {
        let document = parse("* [Lesson\n1](lesson1.md)");

        assert_eq!("Lesson 1", document.entries[0].name);
    }

    #[test]
    fn parses_challenge_counts() {
        assert_eq!(Some(3), parse_challenge_count(" (3 challenges)"));
        assert_eq!(Some(2), parse_challenge_count("— 2 interactive challenges"));
        assert_eq!(None, parse_challenge_count("no challenges here"));
        assert_eq!(None, parse_challenge_count(" (beginner)"));
    }
}
