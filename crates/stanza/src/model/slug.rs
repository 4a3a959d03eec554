use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, path::Path};

/// The identity of a course, section or lesson derived from its file or directory name.
/// A leading numeric prefix (`3-`, `03_`) sets the display order and is not part of the slug.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug {
    /// The name without its numeric prefix and extension.
    pub name: String,
    /// The numeric display order, if the name carried one.
    pub order: Option<u32>,
}

impl Slug {
    /// Derive the slug from the last component of `path`, dropping a `.md` extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let is_markdown = path
            .extension()
            .map(|extension| extension.eq_ignore_ascii_case("md"))
            .unwrap_or(false);

        let name = if is_markdown {
            path.file_stem()
        } else {
            path.file_name()
        };

        Slug::parse(&name.map(|name| name.to_string_lossy()).unwrap_or_default())
    }

    pub fn parse(name: &str) -> Self {
        let digits = name.bytes().take_while(u8::is_ascii_digit).count();
        let (prefix, rest) = name.split_at(digits);

        let unprefixed = rest
            .strip_prefix('-')
            .or_else(|| rest.strip_prefix('_'))
            .filter(|rest| !prefix.is_empty() && !rest.is_empty());

        match (unprefixed, prefix.parse()) {
            (Some(rest), Ok(order)) => Slug {
                name: rest.to_lowercase(),
                order: Some(order),
            },
            _ => Slug {
                name: name.to_lowercase(),
                order: None,
            },
        }
    }

    /// A display title for content without an explicit heading: `route-basics` → `Route Basics`.
    pub fn humanize(&self) -> String {
        self.name
            .split(['-', '_'])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Order content by numeric prefix, placing unprefixed entries last, and then by file name.
pub fn display_order(left: (&Slug, &Path), right: (&Slug, &Path)) -> Ordering {
    let key = |(slug, path): (&Slug, &Path)| {
        (
            slug.order.is_none(),
            slug.order,
            path.file_name().map(|name| name.to_os_string()),
        )
    };

    key(left).cmp(&key(right))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn strips_numeric_prefix() {
        let slug = Slug::from_path("1-intro-to-routing.md");

        assert_eq!(Some(1), slug.order);
        assert_eq!("intro-to-routing", slug.name);
    }

    #[test]
    fn accepts_zero_padded_underscore_prefix() {
        let slug = Slug::parse("07_Queues");

        assert_eq!(Some(7), slug.order);
        assert_eq!("queues", slug.name);
    }

    #[test]
    fn names_without_separator_keep_their_digits() {
        let slug = Slug::parse("2024");

        assert_eq!(None, slug.order);
        assert_eq!("2024", slug.name);
    }

    #[test]
    fn names_without_prefix_have_no_order() {
        let slug = Slug::from_path(PathBuf::from("course/appendix.md"));

        assert_eq!(None, slug.order);
        assert_eq!("appendix", slug.name);
    }

    #[test]
    fn directory_names_keep_dots() {
        let slug = Slug::from_path("3-vue.js");

        assert_eq!(Some(3), slug.order);
        assert_eq!("vue.js", slug.name);
    }

    #[test]
    fn humanizes_slug() {
        assert_eq!("Route Basics", Slug::parse("2-route-basics").humanize());
    }

    #[test]
    fn orders_prefixed_before_unprefixed() {
        let mut names = vec!["appendix.md", "10-ten.md", "2-two.md", "1-one.md"];
        names.sort_by(|left, right| {
            let (left, right) = (Path::new(left), Path::new(right));
            display_order(
                (&Slug::from_path(left), left),
                (&Slug::from_path(right), right),
            )
        });

        assert_eq!(vec!["1-one.md", "2-two.md", "10-ten.md", "appendix.md"], names);
    }
}
