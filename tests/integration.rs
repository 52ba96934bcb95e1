#![cfg(feature = "css")]

use std::path::PathBuf;
use std::sync::Arc;

use simplehtmldom::{
    file_get_html, str_get_html, Document, Error, NodeCollection, NodeKind, SelectorTranslator,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/testpage.html")
}

fn fixture() -> Document {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    file_get_html(fixture_path().to_str().unwrap()).unwrap()
}

#[test]
fn find_counts() {
    let doc = fixture();
    for (selector, count) in [
        (".fake h2", 0),
        ("article", 2),
        (".radio", 2),
        ("input.radio", 2),
        ("ul li", 5),
        ("fieldset#forms__radio li, ul.nav li", 5),
        ("input[id]", 3),
        ("input[id=in]", 1),
        ("#in", 1),
        ("*[id]", 7),
        ("a[href^='http']", 1),
        ("input:checked", 1),
        ("comment", 2),
    ] {
        assert_eq!(doc.find(selector).unwrap().len(), count, "{}", selector);
    }
}

#[test]
fn text_and_comment_selectors() {
    let doc = fixture();
    let texts = doc.find("text").unwrap();
    assert!(!texts.is_empty());
    assert!(texts.iter().all(|n| n.node_kind() == Some(NodeKind::Text)));

    let comments = doc.find("comment").unwrap();
    assert_eq!(comments.first().unwrap().text(), " page header ");
    assert_eq!(comments.last().unwrap().text(), " footer ");

    let in_article = doc.find("article p text").unwrap();
    assert_eq!(in_article.text(), "Some text & more.Another paragraph.");
}

#[test]
fn negative_indexes() {
    let doc = fixture();
    let all = doc.find("article").unwrap();
    let n = all.len() as isize;
    assert_eq!(doc.find_at("article", -1).unwrap(), doc.find_at("article", n - 1).unwrap());
    assert_eq!(
        doc.find_at("article", -1).unwrap().unwrap().attribute("id").as_deref(),
        Some("second")
    );
    assert!(doc.find_at("article", -(n + 1)).unwrap().is_none());
    assert!(doc.find_at("article", n).unwrap().is_none());
}

#[test]
fn element_lookups() {
    let doc = fixture();
    let root = doc.root().unwrap();
    assert_eq!(root.tag().as_deref(), Some("html"));

    let input = root.get_element_by_id("in").unwrap();
    assert_eq!(input.get("tag").as_deref(), Some("input"));
    assert_eq!(input.get("type").as_deref(), Some("number"));
    assert_eq!(input.get("value").as_deref(), Some("5"));

    let div = root.get_element_by_tag_name("div").unwrap();
    assert_eq!(div.get("id").as_deref(), Some("top"));
    assert_eq!(div.get("class").as_deref(), Some("page"));
    assert_eq!(root.get_elements_by_tag_name("input").len(), 4);
}

#[test]
fn element_with_content_and_attributes() {
    let doc = str_get_html("<input name=\"username\" value=\"John\">User name</input>");
    let input = doc.root().unwrap();
    assert_eq!(input.get("tag").as_deref(), Some("input"));
    assert_eq!(input.get("plaintext").as_deref(), Some("User name"));
    assert_eq!(input.get("name").as_deref(), Some("username"));
    assert_eq!(input.get("value").as_deref(), Some("John"));
}

#[test]
fn document_markup() {
    let doc = str_get_html("<div>foo</div>");
    assert_eq!(doc.serialize(), "<div>foo</div>");
    assert_eq!(doc.to_string(), "<div>foo</div>");
    assert_eq!(doc.text(), "foo");

    let nested = str_get_html("<div><div>foo</div></div>");
    assert_eq!(nested.inner_markup(), "<div>foo</div>");

    let page = fixture();
    let html = page.serialize();
    assert!(html.starts_with("<!DOCTYPE html><html lang=\"en\">"), "{}", html);
    let reparsed = str_get_html(&html).serialize();
    assert_eq!(str_get_html(&reparsed).serialize(), reparsed);
}

#[test]
fn outer_replacement_cycle() {
    let doc = str_get_html("<div>foo</div>");
    let mut root = doc.root().unwrap();

    root.set_outer_markup("<h1>bar</h1>").unwrap();
    assert_eq!(doc.serialize(), "<h1>bar</h1>");
    assert_eq!(root.outer_markup(), "<h1>bar</h1>");

    assert!(matches!(
        root.set_outer_markup("foo<h1>bar</h1>"),
        Err(Error::InvalidFragment)
    ));
    assert_eq!(doc.serialize(), "<h1>bar</h1>");

    assert!(root.set_outer_markup("").unwrap().is_none());
    assert_ne!(doc.serialize(), "<h1>bar</h1>");
}

#[test]
fn mutations_inside_loaded_page() {
    let doc = fixture();
    let mut active = doc.find_at("li.active", 0).unwrap().unwrap();
    active.set_inner_markup("<span>changed</span>").unwrap();
    assert_eq!(doc.find("ul.nav li span").unwrap().text(), "changed");

    let mut footer = doc.find_at("p.footer", 0).unwrap().unwrap();
    footer.set_text("a < b").unwrap();
    assert!(doc.serialize().contains("a &lt; b"));
    assert!(doc.find("p.footer").unwrap().is_empty());

    let h1 = doc.find_at("h1", 0).unwrap().unwrap();
    h1.set_attribute("title", "main").unwrap();
    assert_eq!(doc.find("h1[title=main]").unwrap().len(), 1);
    h1.set_attribute("title", "").unwrap();
    assert!(doc.find("h1[title]").unwrap().is_empty());
}

#[test]
fn collection_queries() {
    let doc = fixture();
    let articles = doc.find("article").unwrap();
    let headings = articles.find("h2").unwrap();
    assert_eq!(headings.text(), "First articleSecond article");
    assert_eq!(
        headings.inner_markup(),
        "<h2>First article</h2><h2>Second article</h2>"
    );
    assert!(articles.find("table").unwrap().is_empty());

    let fragment = NodeCollection::from_string("<p>one</p><p>two</p>");
    assert_eq!(fragment.find("p").unwrap().len(), 2);
}

#[test]
fn save_to_file() {
    let doc = str_get_html("<div><p>a</p> <p>b</p></div>");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.html");
    let markup = doc.save(Some(&path)).unwrap();
    assert_eq!(markup, "<p>a</p><p>b</p>");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), markup);
    assert_eq!(doc.save(None).unwrap(), markup);
}

#[test]
fn file_loading_errors() {
    assert!(matches!(file_get_html(""), Err(Error::InvalidArgument(_))));
    assert!(matches!(file_get_html("/path/to/file"), Err(Error::NotFound(_))));

    let mut binary = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut binary, b"<p>\xC3\x28</p>").unwrap();
    assert!(matches!(
        file_get_html(binary.path().to_str().unwrap()),
        Err(Error::InvalidArgument(_))
    ));
}

#[cfg(not(feature = "remote"))]
#[test]
fn remote_loading_needs_feature() {
    assert!(matches!(file_get_html("http://fobar"), Err(Error::Io { .. })));
}

#[test]
fn injected_translator() {
    let translator = Arc::new(SelectorTranslator::with_capacity(8));
    let doc = Document::from_html("<ul><li>a</li><li>b</li></ul>").with_translator(Arc::clone(&translator));
    assert_eq!(doc.find("li").unwrap().len(), 2);
    assert_eq!(doc.find("li").unwrap().len(), 2);
    assert_eq!(translator.cached_len(), 1);

    assert!(matches!(doc.find("li["), Err(Error::InvalidSelector { .. })));
    assert_eq!(translator.cached_len(), 1);
}

#[test]
fn handles_detach_with_document() {
    let doc = str_get_html("<div><p>x</p></div>");
    let p = doc.find_at("p", 0).unwrap().unwrap();
    let copy = p.get_dom().unwrap();
    drop(doc);
    assert!(p.is_detached());
    assert!(p.parent().is_none());
    assert!(matches!(p.set_attribute("a", "b"), Err(Error::Detached)));
    assert_eq!(copy.serialize(), "<p>x</p>");
}

#[test]
fn malformed_table_fragments_keep_rows() {
    let doc = str_get_html("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>");
    let mut row = doc.find_at("tr", 0).unwrap().unwrap();
    assert!(row.set_outer_markup("<tr><td>c<br></td></tr>").unwrap().is_some());
    assert_eq!(doc.find("tr").unwrap().len(), 2);
    assert_eq!(doc.find_at("td", 0).unwrap().unwrap().inner_markup(), "c<br>");

    let mut table = doc.find_at("table", 0).unwrap().unwrap();
    table.set_inner_markup("<tr><td>x&nbsp;</td></tr>").unwrap();
    assert_eq!(doc.find("table > tr > td").unwrap().text(), "x\u{a0}");

    let rows = NodeCollection::from_string("<tr><td>c<br></td></tr>");
    assert_eq!(rows.outer_markup(), "<tr><td>c<br></td></tr>");
}
