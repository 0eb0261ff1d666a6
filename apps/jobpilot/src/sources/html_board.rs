//! Scraped job boards. A board is described by a JSON definition: a search URL
//! template plus CSS selectors for the listing markup.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Job, JobSourceKind};
use crate::sources::text::collapse_whitespace;
use crate::sources::{JobSource, SearchQuery, SourceError};

/// How to query and scrape one board.
///
/// `search_url` may contain `{query}` and `{location}` placeholders; both are
/// percent-encoded before substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDefinition {
    pub name: String,
    pub search_url: String,
    pub item_selector: String,
    pub title_selector: String,
    pub company_selector: Option<String>,
    pub location_selector: Option<String>,
    pub description_selector: Option<String>,
    /// Defaults to the first `a[href]` inside the item.
    pub link_selector: Option<String>,
    /// Boards that only list remote roles.
    #[serde(default)]
    pub remote: bool,
}

pub fn load_definitions(path: &Path) -> Result<Vec<BoardDefinition>, SourceError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SourceError::InvalidBoard(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| SourceError::InvalidBoard(format!("{}: {e}", path.display())))
}

pub struct HtmlBoardSource {
    client: Client,
    board: BoardDefinition,
}

impl HtmlBoardSource {
    /// Validates every selector up front so a typo fails at startup, not mid-run.
    pub fn new(client: Client, board: BoardDefinition) -> Result<Self, SourceError> {
        let selectors = [
            Some(&board.item_selector),
            Some(&board.title_selector),
            board.company_selector.as_ref(),
            board.location_selector.as_ref(),
            board.description_selector.as_ref(),
            board.link_selector.as_ref(),
        ];
        for selector in selectors.into_iter().flatten() {
            Selector::parse(selector).map_err(|e| {
                SourceError::InvalidBoard(format!("{}: bad selector '{selector}': {e}", board.name))
            })?;
        }
        if !board.search_url.starts_with("http") {
            return Err(SourceError::InvalidBoard(format!(
                "{}: search_url must be absolute",
                board.name
            )));
        }
        Ok(Self { client, board })
    }

    fn build_url(&self, query: &SearchQuery) -> String {
        self.board
            .search_url
            .replace("{query}", &urlencoding::encode(&query.keywords))
            .replace(
                "{location}",
                &urlencoding::encode(query.location.as_deref().unwrap_or("")),
            )
    }

    /// Parses a listing page. Kept synchronous: `Html` is not `Send` and must
    /// not live across an await.
    fn parse_listing(&self, html: &str, page_url: &str) -> Vec<Job> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        // Selectors were validated in `new`.
        let Ok(item_sel) = Selector::parse(&self.board.item_selector) else {
            return Vec::new();
        };
        let Ok(title_sel) = Selector::parse(&self.board.title_selector) else {
            return Vec::new();
        };
        let optional = |s: &Option<String>| s.as_deref().and_then(|s| Selector::parse(s).ok());
        let company_sel = optional(&self.board.company_selector);
        let location_sel = optional(&self.board.location_selector);
        let description_sel = optional(&self.board.description_selector);
        let link_sel = optional(&self.board.link_selector)
            .or_else(|| Selector::parse("a[href]").ok());

        let mut jobs = Vec::new();
        for item in document.select(&item_sel) {
            let Some(title) = first_text(item, &title_sel) else {
                continue;
            };
            let company = company_sel
                .as_ref()
                .and_then(|s| first_text(item, s))
                .unwrap_or_default();
            let location = location_sel
                .as_ref()
                .and_then(|s| first_text(item, s))
                .unwrap_or_default();
            let description = description_sel
                .as_ref()
                .and_then(|s| first_text(item, s))
                .unwrap_or_default();
            let href = link_sel
                .as_ref()
                .and_then(|s| item.select(s).next())
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default();
            let url = match &base {
                Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };

            jobs.push(
                Job::new(JobSourceKind::HtmlBoard, title, company, location, url)
                    .with_description(description)
                    .with_tags(vec![self.board.name.clone()])
                    .with_remote(self.board.remote),
            );
        }
        jobs
    }
}

fn first_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl JobSource for HtmlBoardSource {
    fn name(&self) -> &str {
        &self.board.name
    }

    fn kind(&self) -> JobSourceKind {
        JobSourceKind::HtmlBoard
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
        let url = self.build_url(query);
        debug!("Scraping {} at {url}", self.board.name);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.board.name.clone(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;

        let jobs = self.parse_listing(&html, &url);
        if jobs.is_empty() {
            warn!("{}: no listings matched '{}'", self.board.name, self.board.item_selector);
        }
        Ok(jobs.into_iter().take(query.max_results).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"
        <html><body>
          <ul>
            <li class="job">
              <a class="title" href="/jobs/1">  Platform   Engineer </a>
              <span class="company">Hooli</span>
              <span class="loc">Remote</span>
              <p class="summary">Kubernetes and Go</p>
            </li>
            <li class="job">
              <a class="title" href="https://other.example/jobs/2">Site Reliability Engineer</a>
              <span class="company">Pied Piper</span>
            </li>
            <li class="job"><span class="company">No title here</span></li>
          </ul>
        </body></html>"#;

    fn board(search_url: String) -> BoardDefinition {
        BoardDefinition {
            name: "Example Board".into(),
            search_url,
            item_selector: "li.job".into(),
            title_selector: "a.title".into(),
            company_selector: Some(".company".into()),
            location_selector: Some(".loc".into()),
            description_selector: Some(".summary".into()),
            link_selector: None,
            remote: false,
        }
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut def = board("https://example.com/?q={query}".into());
        def.item_selector = "li[".into();
        assert!(matches!(
            HtmlBoardSource::new(Client::new(), def),
            Err(SourceError::InvalidBoard(_))
        ));
    }

    #[test]
    fn test_relative_search_url_rejected() {
        assert!(HtmlBoardSource::new(Client::new(), board("/jobs?q={query}".into())).is_err());
    }

    #[test]
    fn test_build_url_encodes_placeholders() {
        let source = HtmlBoardSource::new(
            Client::new(),
            board("https://example.com/search?q={query}&l={location}".into()),
        )
        .unwrap();
        let mut query = SearchQuery::new("c++ developer");
        query.location = Some("New York".into());
        assert_eq!(
            source.build_url(&query),
            "https://example.com/search?q=c%2B%2B%20developer&l=New%20York"
        );
    }

    #[tokio::test]
    async fn test_search_scrapes_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "engineer"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;

        let def = board(format!("{}/search?q={{query}}", server.uri()));
        let source = HtmlBoardSource::new(Client::new(), def).unwrap();
        let jobs = source.search(&SearchQuery::new("engineer")).await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Platform Engineer");
        assert_eq!(jobs[0].company, "Hooli");
        assert!(jobs[0].remote);
        assert_eq!(jobs[0].url, format!("{}/jobs/1", server.uri()));
        assert_eq!(jobs[0].description, "Kubernetes and Go");
        assert_eq!(jobs[1].url, "https://other.example/jobs/2");
        assert_eq!(jobs[1].tags, vec!["Example Board"]);
    }

    #[test]
    fn test_load_definitions_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let defs = vec![board("https://example.com/?q={query}".into())];
        write!(file, "{}", serde_json::to_string(&defs).unwrap()).unwrap();

        let loaded = load_definitions(file.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].item_selector, "li.job");
    }
}
