use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

const EXTERNAL_SCHEMES: [&str; 3] = ["mailto:", "tel:", "data:"];

/// A markdown link along with the line it appears on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub text: String,
    pub target: String,
    pub line: usize,
}

impl LinkRef {
    pub fn new(text: impl Into<String>, target: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
            line,
        }
    }

    pub fn is_external(&self) -> bool {
        is_external(self.target.trim())
    }

    /// The file this link points to, relative to the document containing it.
    /// External links, same-page anchors and absolute paths have no local target.
    pub fn local_target(&self) -> Option<PathBuf> {
        local_target(&self.target)
    }
}

/// Resolve an href to a relative file path: fragment and query dropped, `%20` decoded,
/// `.` components removed.
pub fn local_target(target: &str) -> Option<PathBuf> {
    let target = target.trim();

    if target.is_empty() || target.starts_with('#') || target.starts_with('/') {
        return None;
    }

    if is_external(target) {
        return None;
    }

    let end = target.find(['#', '?']).unwrap_or(target.len());
    let path = target[..end].replace("%20", " ");

    if path.is_empty() {
        None
    } else {
        Some(normalize(path))
    }
}

fn is_external(target: &str) -> bool {
    target.contains("://")
        || EXTERNAL_SCHEMES
            .iter()
            .any(|scheme| target.starts_with(scheme))
}

/// Drop `.` components so `./1-intro.md` and `1-intro.md` compare equal.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref()
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relative_links_have_local_targets() {
        let link = LinkRef::new("Intro", "./1-intro.md#setup", 3);

        assert_eq!(Some(PathBuf::from("1-intro.md")), link.local_target());
    }

    #[test]
    fn encoded_spaces_are_decoded() {
        let link = LinkRef::new("Intro", "my%20lesson.md", 1);

        assert_eq!(Some(PathBuf::from("my lesson.md")), link.local_target());
    }

    #[test]
    fn external_links_and_anchors_are_skipped() {
        for target in [
            "https://stanza.dev/course/laravel",
            "mailto:team@stanza.dev",
            "#resources",
            "/absolute/path.md",
            "",
        ] {
            assert_eq!(None, LinkRef::new("x", target, 1).local_target(), "{target}");
        }
    }
}
