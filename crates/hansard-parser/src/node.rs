use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::text::{clean, merge_entities};

static RE_COLUMN_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^column_(\d+[A-Z]*)$").expect("invalid regex: column anchor")
});

const CONTENT_ROOTS: &[&str] = &[
    "div#content-small",
    "div#maincontent1",
    "div#maincontent",
    "body",
];

// Wrappers whose children are spliced into the linear stream.
const TRANSPARENT_TAGS: &[&str] = &[
    "div", "center", "span", "font", "ul", "ol", "dl", "section", "article", "blockquote",
];

const FRAGMENT_PREFIXES: &[(&str, FragmentType)] = &[
    ("hd_", FragmentType::Heading),
    ("place_", FragmentType::Location),
    ("dpthd_", FragmentType::DepartmentHeading),
    ("subhd_", FragmentType::SubjectHeading),
    ("qn_", FragmentType::Question),
    ("st_", FragmentType::Contribution),
    ("divlst_", FragmentType::Division),
];

/// One markup node of a transcript page, with its text already cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub html: String,
    /// Text split at `<br>` boundaries.
    pub lines: Vec<String>,
    /// First bold run, the candidate speaker label.
    pub label: Option<String>,
    /// Text preceding the label (e.g. an oral question number).
    pub lead: String,
    /// Text following the label, or the whole text when there is no label.
    pub body: String,
    pub italic: bool,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn heading(level: u8, text: &str) -> Self {
        let text = clean(text);
        Node {
            tag: format!("h{}", level),
            html: merge_entities(&text),
            lines: vec![text.clone()],
            body: text.clone(),
            text,
            ..Default::default()
        }
    }

    pub fn paragraph(text: &str) -> Self {
        let mut node = Node::heading(1, text);
        node.tag = "p".to_string();
        node
    }
}

/// Semantic role of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Heading(u8),
    Anchor(AnchorKind),
    Table,
    Paragraph,
    Ignorable,
}

/// The kind of content announced by the most recent fragment anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentType {
    Heading,
    Location,
    DepartmentHeading,
    SubjectHeading,
    Question,
    Contribution,
    Division,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorKind {
    Fragment(FragmentType),
    Column(String),
    Plain,
}

pub fn classify_anchor(name: &str) -> AnchorKind {
    if let Some(caps) = RE_COLUMN_ANCHOR.captures(name) {
        return AnchorKind::Column(caps[1].to_string());
    }
    FRAGMENT_PREFIXES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, fragment)| AnchorKind::Fragment(*fragment))
        .unwrap_or(AnchorKind::Plain)
}

/// Classifies nodes and carries the sticky fragment type and the last anchor
/// name between calls.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    fragment: Option<FragmentType>,
    last_anchor: Option<String>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, node: &Node) -> NodeKind {
        match node.tag.as_str() {
            "h1" => NodeKind::Heading(1),
            "h2" => NodeKind::Heading(2),
            "h3" => NodeKind::Heading(3),
            "h4" => NodeKind::Heading(4),
            "h5" => NodeKind::Heading(5),
            "table" => NodeKind::Table,
            "p" | "li" => NodeKind::Paragraph,
            "a" => match node.attr("name").or_else(|| node.attr("id")) {
                Some(name) if !name.is_empty() => {
                    self.last_anchor = Some(name.to_string());
                    let kind = classify_anchor(name);
                    if let AnchorKind::Fragment(fragment) = kind {
                        self.fragment = Some(fragment);
                    }
                    NodeKind::Anchor(kind)
                }
                _ => NodeKind::Ignorable,
            },
            other => {
                log::trace!("Ignoring <{}> node", other);
                NodeKind::Ignorable
            }
        }
    }

    pub fn fragment(&self) -> Option<FragmentType> {
        self.fragment
    }

    /// Back-link to the most recent anchor on the given page.
    pub fn link(&self, page_url: &str) -> String {
        match &self.last_anchor {
            Some(anchor) => format!("{}#{}", page_url, anchor),
            None => page_url.to_string(),
        }
    }
}

/// Flattens a transcript page into the linear node stream.
pub fn parse_nodes(html: &str) -> Vec<Node> {
    let document = Html::parse_document(html);
    let root = CONTENT_ROOTS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next()
    });

    let mut nodes = Vec::new();
    if let Some(root) = root {
        walk(root, &mut nodes);
    }
    nodes
}

fn walk(parent: ElementRef, nodes: &mut Vec<Node>) {
    for child in parent.children() {
        if let Some(text) = child.value().as_text() {
            let text = clean(text);
            if !text.is_empty() {
                nodes.push(Node::paragraph(&text));
            }
            continue;
        }
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };

        let tag = element.value().name().to_lowercase();
        match tag.as_str() {
            t if TRANSPARENT_TAGS.contains(&t) => walk(element, nodes),
            "a" => {
                if has_anchor_name(element) {
                    nodes.push(element_node(element, &tag));
                }
                // Named anchors sometimes wrap the text they mark.
                if !clean(&element.text().collect::<String>()).is_empty() {
                    walk(element, nodes);
                }
            }
            "p" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "table" => {
                push_nested_anchors(element, nodes);
                nodes.push(element_node(element, &tag));
            }
            _ => nodes.push(Node {
                tag,
                ..Default::default()
            }),
        }
    }
}

fn has_anchor_name(element: ElementRef) -> bool {
    let value = element.value();
    value.attr("name").or_else(|| value.attr("id")).is_some()
}

fn push_nested_anchors(element: ElementRef, nodes: &mut Vec<Node>) {
    for descendant in element.descendants().skip(1) {
        if let Some(inner) = ElementRef::wrap(descendant)
            && inner.value().name().eq_ignore_ascii_case("a")
            && has_anchor_name(inner)
        {
            nodes.push(element_node(inner, "a"));
        }
    }
}

fn element_node(element: ElementRef, tag: &str) -> Node {
    let attrs = element
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if tag == "a" {
        return Node {
            tag: tag.to_string(),
            attrs,
            ..Default::default()
        };
    }

    let raw_text = element.text().collect::<String>();
    let text = clean(&raw_text);
    let lines = collect_lines(element);
    let (lead, label, body) = split_label(element, &text);
    let italic = !text.is_empty() && italic_text(element) == text;

    Node {
        tag: tag.to_string(),
        attrs,
        html: merge_entities(element.inner_html().trim()),
        text,
        lines,
        label,
        lead,
        body,
        italic,
    }
}

fn collect_lines(element: ElementRef) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for descendant in element.descendants() {
        if let Some(text) = descendant.value().as_text() {
            current.push_str(text);
        } else if let Some(inner) = ElementRef::wrap(descendant) {
            let name = inner.value().name();
            if name.eq_ignore_ascii_case("br")
                || name.eq_ignore_ascii_case("tr")
                || name.eq_ignore_ascii_case("td")
            {
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    lines.push(current);

    lines
        .iter()
        .map(|line| clean(line))
        .filter(|line| !line.is_empty())
        .collect()
}

fn split_label(element: ElementRef, text: &str) -> (String, Option<String>, String) {
    let bold = element.descendants().skip(1).find_map(|d| {
        let inner = ElementRef::wrap(d)?;
        let name = inner.value().name();
        (name.eq_ignore_ascii_case("b") || name.eq_ignore_ascii_case("strong")).then_some(inner)
    });

    let Some(bold) = bold else {
        return (String::new(), None, text.to_string());
    };
    let mut label = clean(&bold.text().collect::<String>());
    if label.is_empty() {
        return (String::new(), None, text.to_string());
    }

    let Some(pos) = text.find(&label) else {
        return (String::new(), None, text.to_string());
    };
    let lead = text[..pos].trim().to_string();
    let mut body = text[pos + label.len()..].trim_start();

    // "<b>Mr Hanson</b>: text" keeps the colon outside the bold run.
    if !label.ends_with(':')
        && let Some(rest) = body.strip_prefix(':')
    {
        label.push(':');
        body = rest.trim_start();
    }

    (lead, Some(label), body.to_string())
}

fn italic_text(element: ElementRef) -> String {
    let texts: Vec<String> = element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|e| {
            let name = e.value().name();
            name.eq_ignore_ascii_case("i") || name.eq_ignore_ascii_case("em")
        })
        .map(|e| e.text().collect::<String>())
        .collect();
    clean(&texts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(name: &str) -> Node {
        Node {
            tag: "a".to_string(),
            attrs: vec![("name".to_string(), name.to_string())],
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_tags() {
        let mut classifier = Classifier::new();
        assert_eq!(classifier.classify(&Node::heading(3, "Prayers")), NodeKind::Heading(3));
        assert_eq!(classifier.classify(&Node::paragraph("text")), NodeKind::Paragraph);

        let table = Node {
            tag: "table".to_string(),
            ..Default::default()
        };
        assert_eq!(classifier.classify(&table), NodeKind::Table);

        let hr = Node {
            tag: "hr".to_string(),
            ..Default::default()
        };
        assert_eq!(classifier.classify(&hr), NodeKind::Ignorable);

        let link = Node {
            tag: "a".to_string(),
            attrs: vec![("href".to_string(), "/x.htm".to_string())],
            ..Default::default()
        };
        assert_eq!(classifier.classify(&link), NodeKind::Ignorable);
    }

    #[test]
    fn test_classify_anchor_names() {
        assert_eq!(
            classify_anchor("dpthd_0"),
            AnchorKind::Fragment(FragmentType::DepartmentHeading)
        );
        assert_eq!(
            classify_anchor("subhd_3"),
            AnchorKind::Fragment(FragmentType::SubjectHeading)
        );
        assert_eq!(
            classify_anchor("divlst_1"),
            AnchorKind::Fragment(FragmentType::Division)
        );
        assert_eq!(classify_anchor("column_831"), AnchorKind::Column("831".to_string()));
        assert_eq!(
            classify_anchor("column_184WH"),
            AnchorKind::Column("184WH".to_string())
        );
        assert_eq!(classify_anchor("11071984000005"), AnchorKind::Plain);
    }

    #[test]
    fn test_fragment_type_is_sticky() {
        let mut classifier = Classifier::new();
        classifier.classify(&anchor("qn_0"));
        classifier.classify(&Node::paragraph("first"));
        classifier.classify(&anchor("column_12"));
        classifier.classify(&Node::paragraph("second"));
        assert_eq!(classifier.fragment(), Some(FragmentType::Question));
        assert_eq!(classifier.link("p.htm"), "p.htm#column_12");

        classifier.classify(&anchor("st_4"));
        assert_eq!(classifier.fragment(), Some(FragmentType::Contribution));
        assert_eq!(
            classifier.link("https://example.org/debtext/110719-0001.htm"),
            "https://example.org/debtext/110719-0001.htm#st_4"
        );
    }

    #[test]
    fn test_parse_nodes_emits_anchors_before_paragraph() {
        let html = r#"
            <html><body><div id="content-small">
                <a name="column_831"></a>
                <h3 align="center"><a name="hd_2"></a>Backbench Business</h3>
                <p><a name="st_1"></a><b>Natascha Engel (North East Derbyshire) (Lab):</b> I beg to move,</p>
                <hr>
            </div></body></html>
        "#;

        let nodes = parse_nodes(html);
        let tags: Vec<&str> = nodes.iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["a", "a", "h3", "a", "p", "hr"]);

        assert_eq!(nodes[2].text, "Backbench Business");
        let para = &nodes[4];
        assert_eq!(
            para.label.as_deref(),
            Some("Natascha Engel (North East Derbyshire) (Lab):")
        );
        assert_eq!(para.body, "I beg to move,");
        assert!(para.lead.is_empty());
    }

    #[test]
    fn test_question_number_lead() {
        let html = r#"<div id="content-small"><p><a name="qn_o0"></a>1. <b>Mr David Hanson (Delyn) (Lab):</b> What recent discussions he has had on Libya. [66855]</p></div>"#;
        let nodes = parse_nodes(html);
        let para = nodes.last().expect("paragraph");
        assert_eq!(para.lead, "1.");
        assert_eq!(para.label.as_deref(), Some("Mr David Hanson (Delyn) (Lab):"));
        assert_eq!(para.body, "What recent discussions he has had on Libya. [66855]");
    }

    #[test]
    fn test_colon_outside_bold() {
        let html = r#"<div id="content-small"><p><b>Mr Hanson</b>: Will the Minister give way?</p></div>"#;
        let nodes = parse_nodes(html);
        assert_eq!(nodes[0].label.as_deref(), Some("Mr Hanson:"));
        assert_eq!(nodes[0].body, "Will the Minister give way?");
    }

    #[test]
    fn test_lines_split_at_breaks() {
        let html = r#"<div id="content-small"><p>Abbott, Ms Diane<br>Morris, Grahame M.<br>
            (Easington)</p></div>"#;
        let nodes = parse_nodes(html);
        assert_eq!(
            nodes[0].lines,
            vec!["Abbott, Ms Diane", "Morris, Grahame M.", "(Easington)"]
        );
    }

    #[test]
    fn test_italic_paragraph() {
        let html = r#"<div id="content-small"><p><i>Question put and agreed to.</i></p><p>Plain</p></div>"#;
        let nodes = parse_nodes(html);
        assert!(nodes[0].italic);
        assert!(!nodes[1].italic);
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><body><h4>2.44 pm</h4><p>Text &amp; more</p></body></html>";
        let nodes = parse_nodes(html);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].tag, "h4");
        assert_eq!(nodes[1].text, "Text & more");
        assert_eq!(nodes[1].html, "Text &amp; more");
    }
}
