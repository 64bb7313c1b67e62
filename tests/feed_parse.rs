// tests/feed_parse.rs
use chrono::{TimeZone, Utc};
use tech_news_digest::feed::parse_feed;

const HN_XML: &str = include_str!("fixtures/hn_rss.xml");
const CNCF_XML: &str = include_str!("fixtures/cncf_atom.xml");
const NOT_A_FEED: &str = include_str!("fixtures/not_a_feed.html");
const TNS_XML: &str = include_str!("fixtures/tns_wordpress.xml");
const LWN_RDF: &str = include_str!("fixtures/lwn_rdf.xml");

#[test]
fn rss_fixture_yields_every_item_in_order() {
    let items = parse_feed(HN_XML, None).expect("hn parse ok");
    assert_eq!(items.len(), 5);
    assert_eq!(items[0].title, "Kubernetes 1.30 released");
    assert_eq!(items[0].link.as_deref(), Some("https://hn.example/k8s-130"));
    assert_eq!(
        items[0].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 6, 10, 0, 0).unwrap())
    );
    // no pubDate in the fixture
    assert_eq!(items[3].published, None);
    assert_eq!(items[4].title, "Platform Engineering & SRE roundup");
}

#[test]
fn atom_fixture_falls_back_to_updated() {
    let items = parse_feed(CNCF_XML, None).expect("cncf parse ok");
    assert_eq!(items.len(), 3);

    // published wins over updated
    assert_eq!(
        items[0].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap())
    );
    assert_eq!(items[0].title, "Platform engineering & SRE roundup");

    assert_eq!(items[1].link.as_deref(), Some("https://cncf.example/audit"));
    assert_eq!(
        items[1].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 6, 6, 0, 0).unwrap())
    );
}

#[test]
fn per_source_limit_applies_before_filtering() {
    let items = parse_feed(HN_XML, Some(2)).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].title, "Election results");
}

#[test]
fn html_error_page_is_a_parse_error() {
    assert!(parse_feed(NOT_A_FEED, None).is_err());
}

#[test]
fn plain_text_body_is_a_parse_error() {
    assert!(parse_feed("Service temporarily unavailable", None).is_err());
}

#[test]
fn wordpress_feed_with_namespaced_elements() {
    let items = parse_feed(TNS_XML, None).expect("wordpress parse ok");
    assert_eq!(items.len(), 3);

    // atom:link and media:title next to the plain elements do not shadow them
    assert_eq!(items[0].title, "Kubernetes Gateway API goes GA");
    assert_eq!(items[0].link.as_deref(), Some("https://tns.example/gateway-api-ga/"));
    assert_eq!(
        items[0].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 6, 9, 15, 0).unwrap())
    );

    // dated only by dc:date
    assert_eq!(items[1].title, "Platform engineering survey results");
    assert_eq!(items[1].link.as_deref(), Some("https://tns.example/pe-survey/"));
    assert_eq!(
        items[1].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 6, 8, 0, 0).unwrap())
    );

    // pubDate without an offset reads as UTC
    assert_eq!(
        items[2].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 5, 22, 0, 0).unwrap())
    );
}

#[test]
fn rss_item_with_atom_self_link_keeps_its_link() {
    let xml = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom"><channel><title>t</title>
<item>
  <title>k8s one</title>
  <atom:link href="https://a/1/feed" rel="self"/>
  <link>https://a/1</link>
  <pubDate>Sat, 06 Sep 2025 10:00:00 +0000</pubDate>
</item>
</channel></rss>"#;
    let items = parse_feed(xml, None).expect("parse ok");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link.as_deref(), Some("https://a/1"));
}

#[test]
fn rss_1_0_rdf_feed_parses() {
    let items = parse_feed(LWN_RDF, None).expect("rdf parse ok");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "cgroup v2 and Kubernetes memory accounting");
    assert_eq!(items[0].link.as_deref(), Some("https://lwn.example/Articles/1/"));
    assert_eq!(
        items[0].published,
        Some(Utc.with_ymd_and_hms(2025, 9, 6, 7, 30, 0).unwrap())
    );
}

#[test]
fn empty_body_is_a_parse_error() {
    assert!(parse_feed("", None).is_err());
    assert!(parse_feed("   \n", None).is_err());
}
