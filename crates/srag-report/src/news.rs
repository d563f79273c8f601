//! Real-time news context for the SRAG report
//!
//! Queries the GDELT document API for recent Portuguese-language coverage
//! of severe acute respiratory syndrome. News is contextual color for the
//! report, never load-bearing: callers treat an empty result as a valid
//! outcome and the report renders without the section.

use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Search expression sent to the news API
const NEWS_QUERY: &str = "(SRAG OR \"sindrome respiratoria aguda grave\") sourcelang:por";

/// How far back to search
const NEWS_TIMESPAN: &str = "3months";

/// Records requested before trusted-source filtering
const FETCH_RECORDS: usize = 20;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Domains given priority when selecting articles
const TRUSTED_DOMAINS: &[&str] = &[
    "g1.globo.com",
    "folha.uol.com.br",
    "estadao.com.br",
    "cnnbrasil.com.br",
    "agenciabrasil.ebc.com.br",
    "fiocruz.br",
    "gov.br",
];

/// One news article selected for the report
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: String,
    /// Publication date as `YYYY-MM-DD` when the API provides one
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GdeltResponse {
    #[serde(default)]
    articles: Vec<GdeltArticle>,
}

#[derive(Debug, Deserialize)]
struct GdeltArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    seendate: String,
}

/// Fetches recent SRAG news coverage
pub struct NewsClient {
    client: reqwest::Client,
    endpoint: String,
    max_items: usize,
}

impl NewsClient {
    /// Create a client against the given endpoint
    pub fn new(endpoint: impl Into<String>, max_items: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            max_items,
        }
    }

    /// Fetch recent articles, trusted sources first
    pub async fn fetch(&self) -> Result<Vec<NewsItem>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", NEWS_QUERY),
                ("mode", "ArtList"),
                ("format", "json"),
                ("maxrecords", &FETCH_RECORDS.to_string()),
                ("sort", "DateDesc"),
                ("timespan", NEWS_TIMESPAN),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: GdeltResponse = response.json().await?;
        let items = select_articles(body.articles, self.max_items);
        info!(count = items.len(), "Notícias obtidas");
        Ok(items)
    }

    /// Fetch articles, absorbing failures into an empty list
    ///
    /// The report must render even when the news service is unreachable.
    pub async fn fetch_or_empty(&self) -> Vec<NewsItem> {
        match self.fetch().await {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "Falha ao buscar notícias, seguindo sem contexto de notícias");
                Vec::new()
            }
        }
    }
}

/// Pick up to `max_items` articles, preferring trusted domains
fn select_articles(articles: Vec<GdeltArticle>, max_items: usize) -> Vec<NewsItem> {
    let mut trusted = Vec::new();
    let mut other = Vec::new();

    for article in articles {
        if article.title.is_empty() || article.url.is_empty() {
            continue;
        }
        let item = NewsItem {
            title: article.title,
            url: article.url,
            source: article.domain.clone(),
            published_at: parse_seen_date(&article.seendate),
        };
        if is_trusted(&article.domain) {
            trusted.push(item);
        } else {
            other.push(item);
        }
    }

    trusted.extend(other);
    trusted.truncate(max_items);
    trusted
}

fn is_trusted(domain: &str) -> bool {
    TRUSTED_DOMAINS
        .iter()
        .any(|t| domain == *t || domain.ends_with(&format!(".{t}")))
}

/// GDELT dates come as `YYYYMMDDTHHMMSSZ`
fn parse_seen_date(raw: &str) -> Option<String> {
    if raw.len() < 8 || !raw.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8]))
}

/// Portuguese text block summarizing the articles, for the agent loop
pub fn format_news(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "Nenhuma notícia recente sobre SRAG foi encontrada.".to_string();
    }

    let mut lines = vec!["=== NOTÍCIAS RECENTES SOBRE SRAG ===".to_string()];
    for (i, item) in items.iter().enumerate() {
        let date = item.published_at.as_deref().unwrap_or("data desconhecida");
        lines.push(format!(
            "{}. {} ({}, {})\n   {}",
            i + 1,
            item.title,
            item.source,
            date,
            item.url
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, domain: &str, seendate: &str) -> GdeltArticle {
        GdeltArticle {
            title: title.to_string(),
            url: format!("https://{domain}/x"),
            domain: domain.to_string(),
            seendate: seendate.to_string(),
        }
    }

    #[test]
    fn test_trusted_domains_come_first() {
        let articles = vec![
            article("outro", "blogqualquer.com", "20240310T080000Z"),
            article("oficial", "g1.globo.com", "20240309T080000Z"),
        ];

        let items = select_articles(articles, 3);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "g1.globo.com");
    }

    #[test]
    fn test_subdomains_of_trusted_are_trusted() {
        assert!(is_trusted("www.gov.br"));
        assert!(is_trusted("saude.gov.br"));
        assert!(is_trusted("portal.fiocruz.br"));
        assert!(!is_trusted("notgov.br"));
        assert!(!is_trusted("gov.br.fake.com"));
    }

    #[test]
    fn test_truncates_to_max_items() {
        let articles = (0..10)
            .map(|i| article(&format!("t{i}"), "example.com", "20240310T080000Z"))
            .collect();
        let items = select_articles(articles, 3);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_skips_incomplete_articles() {
        let mut missing_title = article("", "example.com", "20240310T080000Z");
        missing_title.title = String::new();
        let items = select_articles(vec![missing_title], 3);
        assert!(items.is_empty());
    }

    #[test]
    fn test_seen_date_parsing() {
        assert_eq!(
            parse_seen_date("20240315T120000Z").as_deref(),
            Some("2024-03-15")
        );
        assert_eq!(parse_seen_date(""), None);
        assert_eq!(parse_seen_date("hoje"), None);
    }

    #[test]
    fn test_format_news_empty() {
        let text = format_news(&[]);
        assert!(text.contains("Nenhuma notícia"));
    }

    #[test]
    fn test_format_news_numbers_items() {
        let items = vec![
            NewsItem {
                title: "Casos de SRAG em alta".to_string(),
                url: "https://g1.globo.com/x".to_string(),
                source: "g1.globo.com".to_string(),
                published_at: Some("2024-03-15".to_string()),
            },
            NewsItem {
                title: "Vacinação avança".to_string(),
                url: "https://gov.br/y".to_string(),
                source: "gov.br".to_string(),
                published_at: None,
            },
        ];

        let text = format_news(&items);
        assert!(text.contains("1. Casos de SRAG em alta"));
        assert!(text.contains("2. Vacinação avança"));
        assert!(text.contains("data desconhecida"));
    }
}
