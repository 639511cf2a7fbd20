use chrono::NaiveDate;
use color_eyre::eyre::Context as _;
use include_dir::{include_dir, Dir};
use serde::Deserialize;

// Projects and articles ship inside the binary; there is no CMS to reach for
// at request time.
static CONTENT_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/content");

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub year: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub summary: String,
    /// Pre-rendered body; there is deliberately no markdown pipeline here
    pub body_html: String,
    pub tags: Vec<String>,
    pub published_at: NaiveDate,
}

/// How an article listing is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleSort {
    #[default]
    Newest,
    Oldest,
    Title,
}

impl ArticleSort {
    /// Parse a `?sort=` value; anything unrecognized falls back to the default
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("oldest") => ArticleSort::Oldest,
            Some("title") => ArticleSort::Title,
            _ => ArticleSort::Newest,
        }
    }
}

/// How a project listing is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectSort {
    #[default]
    Recent,
    Name,
}

impl ProjectSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("name") => ProjectSort::Name,
            _ => ProjectSort::Recent,
        }
    }
}

/// Everything the content pages serve, parsed once at startup
#[derive(Debug, Clone)]
pub struct SiteContent {
    projects: Vec<Project>,
    articles: Vec<Article>,
}

impl SiteContent {
    pub fn load() -> cja::Result<Self> {
        let projects = parse_json_file(&CONTENT_DIR, "projects.json")?;
        let mut articles: Vec<Article> = parse_json_file(&CONTENT_DIR, "articles.json")?;

        // Canonical order is newest first; list operations re-sort copies
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        Ok(Self { projects, articles })
    }

    pub fn article_by_slug(&self, slug: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.slug == slug)
    }

    pub fn recent_articles(&self, count: usize) -> &[Article] {
        &self.articles[..self.articles.len().min(count)]
    }

    /// Articles matching `tag` (all of them when None), in `sort` order
    pub fn articles_filtered(&self, tag: Option<&str>, sort: ArticleSort) -> Vec<&Article> {
        let mut articles: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| matches_tag(&a.tags, tag))
            .collect();

        match sort {
            ArticleSort::Newest => {}
            ArticleSort::Oldest => articles.reverse(),
            ArticleSort::Title => articles.sort_by(|a, b| a.title.cmp(&b.title)),
        }

        articles
    }

    /// Projects matching `tag` (all of them when None), in `sort` order
    pub fn projects_filtered(&self, tag: Option<&str>, sort: ProjectSort) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self
            .projects
            .iter()
            .filter(|p| matches_tag(&p.tags, tag))
            .collect();

        match sort {
            ProjectSort::Recent => projects.sort_by(|a, b| b.year.cmp(&a.year)),
            ProjectSort::Name => projects.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        projects
    }

    /// Distinct article tags, sorted, for the filter links
    pub fn article_tags(&self) -> Vec<&str> {
        distinct_tags(self.articles.iter().flat_map(|a| &a.tags))
    }

    /// Distinct project tags, sorted, for the filter links
    pub fn project_tags(&self) -> Vec<&str> {
        distinct_tags(self.projects.iter().flat_map(|p| &p.tags))
    }
}

fn matches_tag(tags: &[String], wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => tags.iter().any(|t| t == wanted),
        None => true,
    }
}

fn distinct_tags<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut tags: Vec<&str> = tags.map(String::as_str).collect();
    tags.sort_unstable();
    tags.dedup();
    tags
}

fn parse_json_file<T: serde::de::DeserializeOwned>(dir: &Dir<'_>, path: &str) -> cja::Result<T> {
    let file = dir
        .get_file(path)
        .ok_or_else(|| cja::color_eyre::eyre::eyre!("Missing content file: {path}"))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| cja::color_eyre::eyre::eyre!("Content file is not UTF-8: {path}"))?;

    serde_json::from_str(contents).wrap_err_with(|| format!("Failed to parse {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(slug: &str, title: &str, tags: &[&str], published_at: &str) -> Article {
        Article {
            slug: slug.to_string(),
            title: title.to_string(),
            summary: String::new(),
            body_html: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            published_at: published_at.parse().unwrap(),
        }
    }

    fn project(name: &str, tags: &[&str], year: i32) -> Project {
        Project {
            slug: name.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            url: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            year,
        }
    }

    fn sample_content() -> SiteContent {
        // Stored newest-first, like load() leaves them
        SiteContent {
            articles: vec![
                article("c", "Charlie", &["notes"], "2024-03-05"),
                article("b", "Bravo", &["rust", "web"], "2024-02-20"),
                article("a", "Alpha", &["rust"], "2024-01-10"),
            ],
            projects: vec![
                project("Zeph", &["tools"], 2025),
                project("Anvil", &["rust", "web"], 2024),
            ],
        }
    }

    #[test]
    fn test_embedded_content_parses() {
        let content = SiteContent::load().unwrap();

        assert!(!content.articles_filtered(None, ArticleSort::Newest).is_empty());
        assert!(!content.projects_filtered(None, ProjectSort::Recent).is_empty());
    }

    #[test]
    fn test_embedded_articles_are_newest_first() {
        let content = SiteContent::load().unwrap();
        let articles = content.articles_filtered(None, ArticleSort::Newest);

        for pair in articles.windows(2) {
            assert!(pair[0].published_at >= pair[1].published_at);
        }
    }

    #[test]
    fn test_article_filter_by_tag() {
        let content = sample_content();

        let rust: Vec<&str> = content
            .articles_filtered(Some("rust"), ArticleSort::Newest)
            .iter()
            .map(|a| a.slug.as_str())
            .collect();

        assert_eq!(rust, vec!["b", "a"]);
    }

    #[test]
    fn test_article_filter_unknown_tag_is_empty() {
        let content = sample_content();
        assert!(content
            .articles_filtered(Some("no-such-tag"), ArticleSort::Newest)
            .is_empty());
    }

    #[test]
    fn test_article_sort_oldest() {
        let content = sample_content();

        let slugs: Vec<&str> = content
            .articles_filtered(None, ArticleSort::Oldest)
            .iter()
            .map(|a| a.slug.as_str())
            .collect();

        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_article_sort_title() {
        let content = sample_content();

        let titles: Vec<&str> = content
            .articles_filtered(None, ArticleSort::Title)
            .iter()
            .map(|a| a.title.as_str())
            .collect();

        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn test_unknown_sort_falls_back_to_default() {
        assert_eq!(ArticleSort::parse(Some("sideways")), ArticleSort::Newest);
        assert_eq!(ArticleSort::parse(None), ArticleSort::Newest);
        assert_eq!(ProjectSort::parse(Some("stars")), ProjectSort::Recent);
    }

    #[test]
    fn test_known_sorts_parse() {
        assert_eq!(ArticleSort::parse(Some("oldest")), ArticleSort::Oldest);
        assert_eq!(ArticleSort::parse(Some("title")), ArticleSort::Title);
        assert_eq!(ProjectSort::parse(Some("name")), ProjectSort::Name);
    }

    #[test]
    fn test_projects_sorted_by_recency_by_default() {
        let content = sample_content();

        let names: Vec<&str> = content
            .projects_filtered(None, ProjectSort::Recent)
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        assert_eq!(names, vec!["Zeph", "Anvil"]);
    }

    #[test]
    fn test_projects_sorted_by_name() {
        let content = sample_content();

        let names: Vec<&str> = content
            .projects_filtered(None, ProjectSort::Name)
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        assert_eq!(names, vec!["Anvil", "Zeph"]);
    }

    #[test]
    fn test_article_by_slug() {
        let content = sample_content();

        assert_eq!(content.article_by_slug("b").unwrap().title, "Bravo");
        assert!(content.article_by_slug("nope").is_none());
    }

    #[test]
    fn test_recent_articles_caps_at_available() {
        let content = sample_content();

        assert_eq!(content.recent_articles(2).len(), 2);
        assert_eq!(content.recent_articles(10).len(), 3);
        assert_eq!(content.recent_articles(2)[0].slug, "c");
    }

    #[test]
    fn test_tags_are_distinct_and_sorted() {
        let content = sample_content();

        assert_eq!(content.article_tags(), vec!["notes", "rust", "web"]);
        assert_eq!(content.project_tags(), vec!["rust", "tools", "web"]);
    }
}
