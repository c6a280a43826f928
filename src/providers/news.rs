//! Google News RSS search for local pollution headlines.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::debug;

use super::NewsProvider;
use crate::models::NewsItem;

// ---

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Date,
    Source,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::Date),
            b"source" => Some(Field::Source),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: String,
    link: String,
    date: String,
    source: String,
}

impl ItemBuilder {
    fn push(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Date => &mut self.date,
            Field::Source => &mut self.source,
        };
        target.push_str(text);
    }

    fn build(self) -> NewsItem {
        // ---
        let source = non_empty(self.source).unwrap_or_else(|| "Google News".to_string());
        let title = match non_empty(self.title) {
            // Google appends " - Publisher" to every headline
            Some(t) => match t.rsplit_once(" - ") {
                Some((headline, _)) if !headline.trim().is_empty() => headline.trim().to_string(),
                _ => t,
            },
            None => "No Title".to_string(),
        };

        NewsItem {
            title,
            link: non_empty(self.link).unwrap_or_else(|| "#".to_string()),
            source,
            date: self.date.trim().to_string(),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse up to `limit` `<item>` entries out of an RSS document.
///
/// Malformed XML ends the scan; items read so far are kept.
fn parse_rss(xml: &str, limit: usize) -> Vec<NewsItem> {
    // ---
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<ItemBuilder> = None;
    let mut field: Option<Field> = None;

    while items.len() < limit {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    current = Some(ItemBuilder::default());
                } else if current.is_some() {
                    field = Field::from_tag(name.as_ref());
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    match t.unescape() {
                        Ok(text) => item.push(f, &text),
                        Err(e) => debug!("Skipping undecodable RSS text: {}", e),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    item.push(f, &String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item.build());
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("RSS parse stopped at {}: {}", reader.buffer_position(), e);
                break;
            }
        }
    }

    items
}

/// Headlines from the Google News RSS search endpoint.
#[derive(Clone)]
pub struct GoogleNewsClient {
    client: Client,
    base_url: String,
}

impl GoogleNewsClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl NewsProvider for GoogleNewsClient {
    async fn headlines(&self, city: &str, limit: usize) -> Result<Vec<NewsItem>> {
        // ---
        let city = city.trim();
        if city.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query = format!("{} air pollution air quality", city);
        let url = format!("{}/rss/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("hl", "en-IN"), ("gl", "IN"), ("ceid", "IN:en")])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            bail!("News feed failed with status: {}", response.status());
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        let items = parse_rss(&body, limit);
        debug!("Parsed {} headlines for {}", items.len(), city);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>"Delhi air pollution" - Google News</title>
  <item>
    <title>Delhi AQI slips to &quot;severe&quot; as stubble fires rise - Hindustan Times</title>
    <link>https://news.example/1</link>
    <pubDate>Mon, 06 Jan 2025 04:00:00 GMT</pubDate>
    <source url="https://hindustantimes.com">Hindustan Times</source>
  </item>
  <item>
    <title><![CDATA[GRAP stage 3 invoked]]></title>
    <link>https://news.example/2</link>
  </item>
  <item>
    <title>Third story - The Hindu</title>
  </item>
</channel></rss>"#;

    #[test]
    fn test_parse_rss_items() {
        // ---
        let items = parse_rss(FEED, 10);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "Delhi AQI slips to \"severe\" as stubble fires rise");
        assert_eq!(items[0].link, "https://news.example/1");
        assert_eq!(items[0].source, "Hindustan Times");
        assert_eq!(items[0].date, "Mon, 06 Jan 2025 04:00:00 GMT");

        assert_eq!(items[1].title, "GRAP stage 3 invoked");
        assert_eq!(items[1].source, "Google News");
        assert_eq!(items[1].date, "");

        assert_eq!(items[2].link, "#");
    }

    #[test]
    fn test_parse_rss_respects_limit() {
        // ---
        let items = parse_rss(FEED, 2);
        assert_eq!(items.len(), 2);
        assert!(parse_rss(FEED, 0).is_empty());
    }

    #[test]
    fn test_channel_title_is_not_an_item() {
        assert!(parse_rss("<rss><channel><title>Only channel</title></channel></rss>", 5).is_empty());
    }

    #[test]
    fn test_empty_item_gets_defaults() {
        // ---
        let items = parse_rss("<rss><channel><item></item></channel></rss>", 5);
        assert_eq!(
            items,
            vec![NewsItem {
                title: "No Title".to_string(),
                link: "#".to_string(),
                source: "Google News".to_string(),
                date: String::new(),
            }]
        );
    }

    #[test]
    fn test_malformed_feed_keeps_earlier_items() {
        let xml = "<rss><item><title>First</title></item><item><title>Broken</wrong></item></rss>";
        let items = parse_rss(xml, 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "First");
    }

    #[tokio::test]
    async fn test_blank_city_skips_request() {
        // ---
        let client = GoogleNewsClient::new(Client::new(), "http://127.0.0.1:9");
        let items = client.headlines("   ", 5).await.unwrap();
        assert!(items.is_empty());
    }
}
