use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

const DELIMITER: &str = "---";
const CLOSING_DELIMITERS: [&str; 2] = ["---", "..."];

/// Metadata stored in the YAML block at the top of every lesson.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// The identifier of the hosted course the lesson belongs to.
    pub source_course: String,
    /// The identifier of the lesson on the hosting platform.
    pub source_lesson: String,
    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("document does not start with a `---` front matter block")]
    Missing,
    #[error("front matter block opened on line 1 is never closed")]
    Unterminated,
    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter field `{0}` is empty")]
    EmptyField(&'static str),
}

/// A document split into its front matter and the markdown that follows it.
#[derive(Debug)]
pub struct Split<'a> {
    /// The raw YAML between the delimiters.
    pub yaml: &'a str,
    /// The markdown following the closing delimiter.
    pub body: &'a str,
    /// Number of lines preceding `body` in the source file.
    pub body_line_offset: usize,
}

/// Separate the front matter block from the rest of `source` without parsing it.
pub fn split(source: &str) -> Result<Split<'_>, FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => (),
        _ => return Err(FrontMatterError::Missing),
    }

    let yaml_start = source.find('\n').map(|index| index + 1).unwrap_or(source.len());
    let mut consumed = yaml_start;
    let mut line_count = 1;

    for line in lines {
        line_count += 1;

        if CLOSING_DELIMITERS.contains(&line.trim_end()) {
            let yaml = &source[yaml_start..consumed];
            let body = &source[consumed + line.len()..];

            return Ok(Split {
                yaml,
                body,
                body_line_offset: line_count,
            });
        }

        consumed += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

impl FrontMatter {
    /// Parse the front matter of `source`, returning it along with the split document.
    pub fn parse(source: &str) -> Result<(FrontMatter, Split<'_>), FrontMatterError> {
        let split = split(source)?;
        let front_matter = FrontMatter::from_yaml(split.yaml)?;

        Ok((front_matter, split))
    }

    pub fn from_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
        let front_matter: FrontMatter = serde_yaml::from_str(yaml)?;

        if front_matter.source_course.trim().is_empty() {
            return Err(FrontMatterError::EmptyField("source_course"));
        }

        if front_matter.source_lesson.trim().is_empty() {
            return Err(FrontMatterError::EmptyField("source_lesson"));
        }

        Ok(front_matter)
    }
}

/// Course READMEs may carry front matter naming only the course.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFrontMatter {
    pub source_course: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}
