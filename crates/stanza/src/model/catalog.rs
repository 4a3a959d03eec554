use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use super::{display_order, Course, FrontMatter, IndexDocument, Lesson, Section, Slug};
use crate::{config::Config, error::Result};

/// The loaded content tree: every course found in the catalog directory.
#[non_exhaustive]
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Optional title for the catalog from the configuration.
    pub title: Option<String>,
    /// Optional description for the catalog from the configuration.
    pub description: Option<String>,
    /// Absolute location of the catalog directory.
    pub root: PathBuf,
    /// Courses in display order.
    pub courses: Vec<Course>,
    /// Markdown files that were found but could not be loaded as lessons.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The front matter block was missing or malformed.
    FrontMatter,
    /// The file sits directly in a course directory instead of a section.
    OutsideSection,
    /// The file sits in a directory below a section.
    NestedInSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// The location of the file relative to the catalog root.
    pub path: PathBuf,
    pub reason: SkipReason,
    pub message: String,
}

impl Catalog {
    /// Load the catalog found below `root` according to `config`.
    pub fn load(root: impl AsRef<Path>, config: &Config) -> Result<Catalog> {
        let root = root.as_ref();
        let source = config.source_dir(root);

        if !source.is_dir() {
            bail!("Content source {} is not a directory", source.display());
        }

        let mut loader = CatalogLoader {
            root: source.clone(),
            readme: &config.content.readme,
            ignored: vec![root.join(&config.build.build_dir)],
            skipped: Vec::new(),
        };

        let courses = loader.load_courses()?;

        Ok(Catalog {
            title: config.content.title.clone(),
            description: config.content.description.clone(),
            root: source,
            courses,
            skipped: loader.skipped,
        })
    }

    pub fn find_course(&self, source_course: &str) -> Option<&Course> {
        self.courses
            .iter()
            .find(|course| course.source_course == source_course)
    }

    pub fn lesson_count(&self) -> usize {
        self.courses.iter().map(|course| course.lessons().count()).sum()
    }

    /// Absolute location of a path stored relative to the catalog root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }
}

struct DirEntry {
    path: PathBuf,
    slug: Slug,
    is_dir: bool,
}

struct CatalogLoader<'a> {
    root: PathBuf,
    readme: &'a str,
    ignored: Vec<PathBuf>,
    skipped: Vec<SkippedFile>,
}

impl<'a> CatalogLoader<'a> {
    fn load_courses(&mut self) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = Vec::new();

        for entry in self.read_dir(&self.root.clone())? {
            if entry.is_dir && contains_markdown(&entry.path, 2)? {
                let course = self.load_course(entry)?;

                if let Some(previous) = courses
                    .iter()
                    .find(|previous| previous.source_course == course.source_course)
                {
                    bail!(
                        "Course `{}` is defined by both {} and {}",
                        course.source_course,
                        previous.path.display(),
                        course.path.display()
                    );
                }

                courses.push(course);
            }
        }

        Ok(courses)
    }

    fn load_course(&mut self, course: DirEntry) -> Result<Course> {
        debug!(path = %course.path.display(), "Loading course");

        let index = self.load_index(&course.path)?;
        let mut sections = Vec::new();

        for entry in self.read_dir(&course.path)? {
            if entry.is_dir {
                if contains_markdown(&entry.path, 1)? {
                    sections.push(self.load_section(entry)?);
                }
            } else if self.is_lesson_file(&entry.path) {
                let path = self.relative(&entry.path);
                warn!(path = %path.display(), "Skipping markdown file outside of a section");

                self.skipped.push(SkippedFile {
                    path,
                    reason: SkipReason::OutsideSection,
                    message: String::from("markdown files must live inside a section directory"),
                });
            }
        }

        let path = self.relative(&course.path);
        ensure_unique_lessons(&path, &sections)?;

        let source_course = index
            .as_ref()
            .and_then(|index| index.front_matter.as_ref())
            .and_then(|front_matter| front_matter.source_course.clone())
            .or_else(|| {
                sections
                    .iter()
                    .flat_map(|section| section.lessons.iter())
                    .map(|lesson| lesson.front_matter.source_course.clone())
                    .next()
            })
            .unwrap_or_else(|| course.slug.name.clone());

        let (title, description) = titles(&index, &course.slug);

        Ok(Course {
            slug: course.slug,
            path,
            source_course,
            title,
            description,
            index,
            sections,
        })
    }

    fn load_section(&mut self, section: DirEntry) -> Result<Section> {
        debug!(path = %section.path.display(), "Loading section");

        let index = self.load_index(&section.path)?;
        let mut lessons = Vec::new();

        for entry in self.read_dir(&section.path)? {
            if entry.is_dir {
                self.skip_nested(&entry.path)?;
            } else if self.is_lesson_file(&entry.path) {
                if let Some(lesson) = self.load_lesson(&entry.path)? {
                    lessons.push(lesson);
                }
            }
        }

        let (title, description) = titles(&index, &section.slug);

        Ok(Section {
            slug: section.slug,
            path: self.relative(&section.path),
            title,
            description,
            index,
            lessons,
        })
    }

    /// Load a single lesson. Lessons with missing or malformed front matter are skipped.
    fn load_lesson(&mut self, file: &Path) -> Result<Option<Lesson>> {
        let path = self.relative(file);
        debug!(path = %path.display(), "Loading lesson");

        let source = fs::read_to_string(file)
            .with_context(|| format!("Failed to open lesson {}", file.display()))?;

        match FrontMatter::parse(&source) {
            Ok((front_matter, split)) => Lesson::from_parts(path, front_matter, split).map(Some),
            Err(error) => {
                warn!(path = %path.display(), %error, "Skipping lesson with malformed front matter");

                self.skipped.push(SkippedFile {
                    path,
                    reason: SkipReason::FrontMatter,
                    message: error.to_string(),
                });

                Ok(None)
            }
        }
    }

    /// Record every markdown file below a directory nested in a section.
    fn skip_nested(&mut self, dir: &Path) -> Result<()> {
        for entry in self.read_dir(dir)? {
            if entry.is_dir {
                self.skip_nested(&entry.path)?;
            } else if is_markdown(&entry.path) {
                let path = self.relative(&entry.path);
                warn!(path = %path.display(), "Skipping markdown file nested below a section");

                self.skipped.push(SkippedFile {
                    path,
                    reason: SkipReason::NestedInSection,
                    message: String::from("lessons must sit directly in their section directory"),
                });
            }
        }

        Ok(())
    }

    fn load_index(&self, dir: &Path) -> Result<Option<IndexDocument>> {
        match self.find_readme(dir)? {
            Some(readme) => IndexDocument::load(readme).map(Some),
            None => Ok(None),
        }
    }

    /// The index document of `dir`, matched the same way `is_readme` matches. An exact
    /// name match wins over other casings.
    fn find_readme(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let exact = dir.join(self.readme);

        if exact.is_file() {
            return Ok(Some(exact));
        }

        let found = self
            .read_dir(dir)?
            .into_iter()
            .find(|entry| !entry.is_dir && self.is_readme(&entry.path))
            .map(|entry| entry.path);

        Ok(found)
    }

    /// List a directory in display order, leaving out hidden and ignored entries.
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let listing = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in listing {
            let entry =
                entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
            let path = entry.path();

            if is_hidden(&path) || self.ignored.iter().any(|ignored| *ignored == path) {
                continue;
            }

            entries.push(DirEntry {
                slug: Slug::from_path(&path),
                is_dir: path.is_dir(),
                path,
            });
        }

        entries.sort_by(|left, right| {
            display_order((&left.slug, &left.path), (&right.slug, &right.path))
        });

        Ok(entries)
    }

    fn is_lesson_file(&self, path: &Path) -> bool {
        is_markdown(path) && !self.is_readme(path)
    }

    fn is_readme(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().eq_ignore_ascii_case(self.readme))
            .unwrap_or(false)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// A course's `source_lesson` values must be unique.
fn ensure_unique_lessons(course: &Path, sections: &[Section]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();

    for lesson in sections.iter().flat_map(|section| section.lessons.iter()) {
        let source_lesson = lesson.front_matter.source_lesson.as_str();

        if let Some(previous) = seen.insert(source_lesson, &lesson.path) {
            bail!(
                "Duplicate source_lesson `{}` in course {}: {} and {}",
                source_lesson,
                course.display(),
                previous.display(),
                lesson.path.display()
            );
        }
    }

    Ok(())
}

fn titles(index: &Option<IndexDocument>, slug: &Slug) -> (String, Option<String>) {
    let title = index
        .as_ref()
        .and_then(|index| index.title.clone())
        .unwrap_or_else(|| slug.humanize());
    let description = index.as_ref().and_then(|index| index.description.clone());

    (title, description)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
        && path.is_file()
}

/// Whether `dir` holds a markdown file within `depth` levels.
fn contains_markdown(dir: &Path, depth: usize) -> Result<bool> {
    let listing = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    for entry in listing {
        let path = entry
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .path();

        if is_hidden(&path) {
            continue;
        }

        if is_markdown(&path) {
            return Ok(true);
        }

        if depth > 0 && path.is_dir() && contains_markdown(&path, depth - 1)? {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, contents: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().expect("path has a parent")).expect("create dirs");
        fs::write(path, contents).expect("write file");
    }

    fn lesson(course: &str, lesson: &str) -> String {
        format!("---\nsource_course: {course}\nsource_lesson: {lesson}\n---\n# {lesson}\n")
    }

    #[test]
    fn loads_courses_sections_and_lessons_in_order() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "laravel/README.md", "# Laravel\n\nBuild apps.\n");
        write(root, "laravel/2-eloquent/1-models.md", &lesson("laravel", "models"));
        write(root, "laravel/1-routing/README.md", "# Routing\n");
        write(root, "laravel/1-routing/10-groups.md", &lesson("laravel", "groups"));
        write(root, "laravel/1-routing/2-params.md", &lesson("laravel", "params"));
        write(root, "laravel/1-routing/1-intro.md", &lesson("laravel", "intro"));

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");

        assert_eq!(1, catalog.courses.len());
        let course = &catalog.courses[0];
        assert_eq!("laravel", course.source_course);
        assert_eq!("Laravel", course.title);
        assert_eq!(Some(String::from("Build apps.")), course.description);

        let sections: Vec<_> = course.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(vec!["Routing", "Eloquent"], sections);

        let lessons: Vec<_> = course.sections[0]
            .lessons
            .iter()
            .map(|lesson| lesson.front_matter.source_lesson.as_str())
            .collect();
        assert_eq!(vec!["intro", "params", "groups"], lessons);
        assert_eq!(
            PathBuf::from("laravel/1-routing/1-intro.md"),
            course.sections[0].lessons[0].path
        );
        assert_eq!(4, catalog.lesson_count());
    }

    #[test]
    fn skips_lessons_with_malformed_front_matter() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "redis/1-basics/1-strings.md", &lesson("redis", "strings"));
        write(root, "redis/1-basics/2-broken.md", "---\nsource_course: redis\n");
        write(root, "redis/1-basics/3-bare.md", "# No front matter\n");

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");

        assert_eq!(1, catalog.lesson_count());
        assert_eq!(2, catalog.skipped.len());
        assert!(catalog
            .skipped
            .iter()
            .all(|skipped| skipped.reason == SkipReason::FrontMatter));
    }

    #[test]
    fn fails_on_duplicate_source_lesson() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "vue/1-basics/1-refs.md", &lesson("vue", "refs"));
        write(root, "vue/2-advanced/1-refs-again.md", &lesson("vue", "refs"));

        let error = Catalog::load(root, &Config::default()).expect_err("duplicates should fail");

        assert!(error.to_string().contains("Duplicate source_lesson `refs`"));
    }

    #[test]
    fn allows_same_source_lesson_in_different_courses() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "react/1-basics/1-intro.md", &lesson("react", "intro"));
        write(root, "vue/1-basics/1-intro.md", &lesson("vue", "intro"));

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");

        assert_eq!(2, catalog.courses.len());
        assert!(catalog.find_course("vue").is_some());
    }

    #[test]
    fn records_files_outside_sections_and_ignores_other_directories() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "rust/1-basics/1-ownership.md", &lesson("rust", "ownership"));
        write(root, "rust/notes.md", "stray");
        write(root, "rust/images/logo.svg", "<svg/>");
        write(root, ".git/HEAD", "ref");
        write(root, "build/json/manifest.md", "generated");

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");

        assert_eq!(1, catalog.courses.len());
        assert_eq!(1, catalog.courses[0].sections.len());
        assert_eq!(
            vec![SkippedFile {
                path: PathBuf::from("rust/notes.md"),
                reason: SkipReason::OutsideSection,
                message: String::from("markdown files must live inside a section directory"),
            }],
            catalog.skipped
        );
    }

    #[test]
    fn records_lessons_nested_below_a_section() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "ts/1-types/README.md", "# Types\n");
        write(root, "ts/1-types/extra/1-deep.md", &lesson("ts", "deep"));
        write(root, "ts/1-types/extra/more/2-deeper.md", &lesson("ts", "deeper"));

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");
        let skipped: Vec<_> = catalog
            .skipped
            .iter()
            .map(|skipped| (skipped.path.as_path(), skipped.reason))
            .collect();

        assert_eq!(0, catalog.lesson_count());
        assert_eq!(
            vec![
                (Path::new("ts/1-types/extra/1-deep.md"), SkipReason::NestedInSection),
                (
                    Path::new("ts/1-types/extra/more/2-deeper.md"),
                    SkipReason::NestedInSection
                ),
            ],
            skipped
        );
    }

    #[test]
    fn fails_when_two_directories_share_a_course() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "laravel/1-a/1-x.md", &lesson("laravel", "routing"));
        write(root, "laravel-2/1-a/1-x.md", &lesson("laravel", "routing"));

        let error = Catalog::load(root, &Config::default()).expect_err("shared course should fail");

        assert!(error.to_string().contains("Course `laravel` is defined by both"));
    }

    #[test]
    fn readme_lookup_ignores_case() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "go/1-basics/readme.md", "# Basics\n\n- [Hello](1-hello.md)\n");
        write(root, "go/1-basics/1-hello.md", &lesson("go", "hello"));

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");
        let section = &catalog.courses[0].sections[0];

        assert_eq!("Basics", section.title);
        assert!(section.index.is_some());
        assert_eq!(1, section.lessons.len());
        assert!(catalog.skipped.is_empty());
    }

    #[test]
    fn carries_configured_title_and_description() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "go/1-basics/1-hello.md", &lesson("go", "hello"));
        let config: Config = "[content]\ntitle = \"Stanza\"\ndescription = \"Course notes\"\n"
            .parse()
            .expect("config should parse");

        let catalog = Catalog::load(root, &config).expect("catalog should load");

        assert_eq!(Some(String::from("Stanza")), catalog.title);
        assert_eq!(Some(String::from("Course notes")), catalog.description);
    }

    #[test]
    fn course_readme_front_matter_names_the_course() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        write(root, "pg/README.md", "---\nsource_course: postgresql\n---\n# PostgreSQL\n");
        write(root, "pg/1-basics/1-select.md", &lesson("postgres", "select"));

        let catalog = Catalog::load(root, &Config::default()).expect("catalog should load");

        assert_eq!("postgresql", catalog.courses[0].source_course);
    }

    #[test]
    fn missing_source_directory_is_an_error() {
        let dir = TempDir::new().expect("temp dir");

        assert!(Catalog::load(dir.path().join("missing"), &Config::default()).is_err());
    }
}
