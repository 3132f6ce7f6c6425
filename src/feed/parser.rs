// src/feed/parser.rs
//! RSS item extraction for the review feed.
//!
//! Vendor extension elements (`letterboxd:filmTitle` and friends) are matched
//! by local name so the namespace prefix the feed happens to use is irrelevant.

use crate::error::{ReviewError, Result};
use crate::store::Review;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

static REVIEW_GUID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^letterboxd-review-[0-9]+").expect("valid review guid regex"));

// Optional poster paragraph, then exactly one text paragraph.
static BODY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(<p><img src=".*"\s*/></p>\s*)?<p>(.*)</p>$"#).expect("valid body regex")
});

const MISSING_TITLE: &str = "Missing title";
const MISSING_YEAR: &str = "No year";
const MISSING_WATCHED_DATE: &str = "Date missing";

/// Raw fields of one `<item>`, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub guid: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub film_title: Option<String>,
    pub film_year: Option<String>,
    pub member_rating: Option<String>,
    pub rewatch: Option<String>,
    pub watched_date: Option<String>,
}

impl FeedEntry {
    fn set_field(&mut self, local_name: &[u8], value: String) {
        let slot = match local_name {
            b"guid" => &mut self.guid,
            b"link" => &mut self.link,
            b"description" => &mut self.description,
            b"filmTitle" => &mut self.film_title,
            b"filmYear" => &mut self.film_year,
            b"memberRating" => &mut self.member_rating,
            b"rewatch" => &mut self.rewatch,
            b"watchedDate" => &mut self.watched_date,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Whether this entry is a review rather than a list update or other activity.
    pub fn is_review(&self) -> bool {
        self.guid.as_deref().map(is_review_guid).unwrap_or(false)
    }

    /// Builds the candidate review for this entry.
    ///
    /// Fails with `FeedParseError` when the description is missing or not in
    /// the expected paragraph shape, or when a rating is present but not numeric.
    pub fn to_review(&self) -> Result<Review> {
        let description = self.description.as_deref().ok_or_else(|| {
            ReviewError::FeedParseError(format!(
                "Entry {:?} has no description",
                self.guid.as_deref().unwrap_or_default()
            ))
        })?;
        let body = extract_body(description)?;

        let rating = match self.member_rating.as_deref() {
            None => None,
            Some(raw) => Some(raw.trim().parse::<f64>().map_err(|e| {
                ReviewError::FeedParseError(format!("Invalid member rating {:?}: {}", raw, e))
            })?),
        };

        Ok(Review {
            watched_date: self
                .watched_date
                .clone()
                .unwrap_or_else(|| MISSING_WATCHED_DATE.to_string()),
            name: self.film_title.clone().unwrap_or_else(|| MISSING_TITLE.to_string()),
            year: self.film_year.clone().unwrap_or_else(|| MISSING_YEAR.to_string()),
            source_uri: self.link.clone().unwrap_or_default(),
            rating,
            is_rewatch: self.rewatch.as_deref() == Some("Yes"),
            body,
            tags: String::new(),
            logged_date: String::new(),
        })
    }
}

pub fn is_review_guid(guid: &str) -> bool {
    REVIEW_GUID_REGEX.is_match(guid)
}

/// Pulls the review text out of an item description.
pub fn extract_body(description: &str) -> Result<String> {
    let trimmed = description.trim();
    BODY_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ReviewError::FeedParseError(format!(
                "Description does not match the review body shape: {:.80}",
                trimmed
            ))
        })
}

/// Reads every `<item>` of an RSS document, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Vec<u8>> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name();
                if local.as_ref() == b"item" {
                    current = Some(FeedEntry::default());
                    field = None;
                } else if current.is_some() {
                    field = Some(local.as_ref().to_vec());
                    text.clear();
                }
            }
            Event::Text(t) if field.is_some() => {
                text.push_str(&t.unescape()?);
            }
            Event::CData(c) if field.is_some() => {
                let raw = c.into_inner();
                let cdata = std::str::from_utf8(&raw).map_err(|e| {
                    ReviewError::FeedParseError(format!("CDATA is not UTF-8: {}", e))
                })?;
                text.push_str(cdata);
            }
            Event::End(e) => {
                let local = e.local_name();
                if local.as_ref() == b"item" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    field = None;
                } else if let (Some(entry), Some(name)) = (current.as_mut(), field.take()) {
                    if name == local.as_ref() {
                        entry.set_field(&name, text.trim().to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:letterboxd="https://letterboxd.com" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Letterboxd - someone</title>
    <item>
      <title>Paddington, 2014 - ★★★★½</title>
      <link>https://letterboxd.com/someone/film/paddington/</link>
      <guid isPermaLink="false">letterboxd-review-111</guid>
      <letterboxd:watchedDate>2024-01-01</letterboxd:watchedDate>
      <letterboxd:rewatch>No</letterboxd:rewatch>
      <letterboxd:filmTitle>Paddington</letterboxd:filmTitle>
      <letterboxd:filmYear>2014</letterboxd:filmYear>
      <letterboxd:memberRating>4.5</letterboxd:memberRating>
      <description><![CDATA[ <p><img src="https://a.ltrbxd.com/poster.jpg"/></p> <p>Lovely.</p> ]]></description>
      <dc:creator>someone</dc:creator>
    </item>
    <item>
      <title>Favourites</title>
      <link>https://letterboxd.com/someone/list/favourites/</link>
      <guid isPermaLink="false">letterboxd-list-222</guid>
      <description><![CDATA[<p>A list.</p><ul><li>Heat</li></ul>]]></description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_reads_items_in_order() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].guid.as_deref(), Some("letterboxd-review-111"));
        assert_eq!(entries[0].film_title.as_deref(), Some("Paddington"));
        assert_eq!(entries[0].member_rating.as_deref(), Some("4.5"));
        assert_eq!(entries[0].watched_date.as_deref(), Some("2024-01-01"));
        assert_eq!(entries[1].guid.as_deref(), Some("letterboxd-list-222"));
    }

    #[test]
    fn test_review_guid_pattern() {
        assert!(is_review_guid("letterboxd-review-12345"));
        assert!(is_review_guid("letterboxd-review-12345-extra"));
        assert!(!is_review_guid("letterboxd-review-"));
        assert!(!is_review_guid("letterboxd-list-12345"));
        assert!(!is_review_guid("x-letterboxd-review-1"));
    }

    #[test]
    fn test_entry_to_review() {
        let entries = parse_feed(FEED).unwrap();
        assert!(entries[0].is_review());
        assert!(!entries[1].is_review());

        let review = entries[0].to_review().unwrap();
        assert_eq!(
            review,
            Review {
                watched_date: "2024-01-01".to_string(),
                name: "Paddington".to_string(),
                year: "2014".to_string(),
                source_uri: "https://letterboxd.com/someone/film/paddington/".to_string(),
                rating: Some(4.5),
                is_rewatch: false,
                body: "Lovely.".to_string(),
                tags: String::new(),
                logged_date: String::new(),
            }
        );
    }

    #[test]
    fn test_entry_defaults_for_missing_fields() {
        let entry = FeedEntry {
            guid: Some("letterboxd-review-1".to_string()),
            description: Some("<p>Fine.</p>".to_string()),
            rewatch: Some("Yes".to_string()),
            ..Default::default()
        };
        let review = entry.to_review().unwrap();
        assert_eq!(review.name, "Missing title");
        assert_eq!(review.year, "No year");
        assert_eq!(review.watched_date, "Date missing");
        assert_eq!(review.rating, None);
        assert!(review.is_rewatch);
        assert_eq!(review.source_uri, "");
    }

    #[test]
    fn test_entry_with_bad_rating_fails() {
        let entry = FeedEntry {
            guid: Some("letterboxd-review-1".to_string()),
            description: Some("<p>Fine.</p>".to_string()),
            member_rating: Some("great".to_string()),
            ..Default::default()
        };
        assert!(matches!(entry.to_review(), Err(ReviewError::FeedParseError(_))));
    }

    #[test]
    fn test_extract_body_with_image_paragraph() {
        let body = extract_body(r#"<p><img src="x"/></p> <p>Great film.</p>"#).unwrap();
        assert_eq!(body, "Great film.");
        let body = extract_body(r#"<p><img src="x" /></p> <p>Great film.</p>"#).unwrap();
        assert_eq!(body, "Great film.");
    }

    #[test]
    fn test_extract_body_single_paragraph() {
        assert_eq!(extract_body("<p>Great film.</p>").unwrap(), "Great film.");
    }

    #[test]
    fn test_extract_body_rejects_other_shapes() {
        for bad in ["Great film.", "<div>Great film.</div>", "<p>Great film.", ""] {
            assert!(
                matches!(extract_body(bad), Err(ReviewError::FeedParseError(_))),
                "expected failure for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_feed_rejects_broken_xml() {
        let err = parse_feed("<rss><channel><item><guid>x</item></channel></rss>").unwrap_err();
        assert!(matches!(err, ReviewError::FeedParseError(_)));
    }
}
