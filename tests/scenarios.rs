//! End-to-end parsing scenarios, driven through the public
//! `parse_str`/`Parser` entrypoints rather than the tokenizer directly.

use pretty_assertions::assert_eq;

use markup_events::buffer::{BufferView, Partition};
use markup_events::config::{Dialect, ElementBalancing, ParseConfig, Presence, RootElementPresence};
use markup_events::handler::{HandlerResult, MarkupHandler};
use markup_events::status::ParseStatus;
use markup_events::{parse_str, Error};

/// Records a compact textual trace of every event a handler method was
/// called with, in call order, so whole scenarios can be asserted in one
/// `assert_eq!` against an expected trace.
#[derive(Default)]
struct Trace {
    events: Vec<String>,
}

impl Trace {
    fn push(&mut self, s: String) {
        self.events.push(s);
    }

    fn text_of(view: BufferView<'_>, p: Partition) -> String {
        String::from_utf8_lossy(view.slice(p)).into_owned()
    }
}

impl MarkupHandler for Trace {
    fn document_start(
        &mut self,
        _status: &mut ParseStatus,
        _started_at: std::time::SystemTime,
        line: u64,
        col: u64,
    ) -> HandlerResult {
        self.push(format!("docStart({},{})", line, col));
        Ok(())
    }

    fn document_end(
        &mut self,
        _status: &mut ParseStatus,
        _started_at: std::time::SystemTime,
        _elapsed: std::time::Duration,
        _line: u64,
        _col: u64,
    ) -> HandlerResult {
        self.push("docEnd".into());
        Ok(())
    }

    fn xml_declaration(
        &mut self,
        _status: &mut ParseStatus,
        view: BufferView<'_>,
        _keyword: Partition,
        version: Partition,
        _encoding: Partition,
        _standalone: Partition,
        _outer: Partition,
    ) -> HandlerResult {
        self.push(format!("xmlDeclaration(version={})", Trace::text_of(view, version)));
        Ok(())
    }

    fn doc_type(
        &mut self,
        _status: &mut ParseStatus,
        view: BufferView<'_>,
        _keyword: Partition,
        element_name: Partition,
        doctype_type: Partition,
        public_id: Partition,
        system_id: Partition,
        internal_subset: Partition,
        _outer: Partition,
    ) -> HandlerResult {
        self.push(format!(
            "docType(name={}, type_empty={}, public_empty={}, system_empty={}, subset_empty={})",
            Trace::text_of(view, element_name),
            doctype_type.is_empty(),
            public_id.is_empty(),
            system_id.is_empty(),
            internal_subset.is_empty(),
        ));
        Ok(())
    }

    fn text(&mut self, _status: &mut ParseStatus, view: BufferView<'_>, span: Partition) -> HandlerResult {
        self.push(format!("text({:?})", Trace::text_of(view, span)));
        Ok(())
    }

    fn cdata_section(
        &mut self,
        _status: &mut ParseStatus,
        view: BufferView<'_>,
        content: Partition,
        _outer: Partition,
    ) -> HandlerResult {
        self.push(format!("cdata({})", Trace::text_of(view, content)));
        Ok(())
    }

    fn standalone_element_start(
        &mut self,
        _status: &mut ParseStatus,
        view: BufferView<'_>,
        name: Partition,
        minimized: bool,
    ) -> HandlerResult {
        self.push(format!("standaloneStart({}, minimized={})", Trace::text_of(view, name), minimized));
        Ok(())
    }
    fn standalone_element_end(
        &mut self,
        _status: &mut ParseStatus,
        view: BufferView<'_>,
        name: Partition,
        minimized: bool,
    ) -> HandlerResult {
        self.push(format!("standaloneEnd({}, minimized={})", Trace::text_of(view, name), minimized));
        Ok(())
    }

    fn open_element_start(&mut self, _status: &mut ParseStatus, view: BufferView<'_>, name: Partition) -> HandlerResult {
        self.push(format!("openStart({})", Trace::text_of(view, name)));
        Ok(())
    }
    fn open_element_end(&mut self, _status: &mut ParseStatus, view: BufferView<'_>, name: Partition) -> HandlerResult {
        self.push(format!("openEnd({})", Trace::text_of(view, name)));
        Ok(())
    }
    fn close_element_start(&mut self, _status: &mut ParseStatus, view: BufferView<'_>, name: Partition) -> HandlerResult {
        self.push(format!("closeStart({})", Trace::text_of(view, name)));
        Ok(())
    }
    fn close_element_end(&mut self, _status: &mut ParseStatus, view: BufferView<'_>, name: Partition) -> HandlerResult {
        self.push(format!("closeEnd({})", Trace::text_of(view, name)));
        Ok(())
    }

    fn auto_close_element_start(&mut self, _status: &mut ParseStatus, name: &[u8]) -> HandlerResult {
        self.push(format!("autoCloseStart({})", String::from_utf8_lossy(name)));
        Ok(())
    }
    fn auto_close_element_end(&mut self, _status: &mut ParseStatus, name: &[u8]) -> HandlerResult {
        self.push(format!("autoCloseEnd({})", String::from_utf8_lossy(name)));
        Ok(())
    }

    fn attribute(
        &mut self,
        _status: &mut ParseStatus,
        view: BufferView<'_>,
        name: Partition,
        operator: Partition,
        value_content: Partition,
        value_outer: Partition,
    ) -> HandlerResult {
        self.push(format!(
            "attribute({}, {}, {}, {})",
            Trace::text_of(view, name),
            Trace::text_of(view, operator),
            Trace::text_of(view, value_content),
            Trace::text_of(view, value_outer),
        ));
        Ok(())
    }

    fn inner_white_space(&mut self, _status: &mut ParseStatus, _view: BufferView<'_>, _span: Partition) -> HandlerResult {
        self.push("innerWhiteSpace".into());
        Ok(())
    }
}

#[test]
fn paragraph_scenario() {
    let mut t = Trace::default();
    parse_str("<p>hi</p>", ParseConfig::html(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "openStart(p)",
            "openEnd(p)",
            "text(\"hi\")",
            "closeStart(p)",
            "closeEnd(p)",
            "docEnd",
        ]
    );
}

#[test]
fn void_element_scenario() {
    let mut t = Trace::default();
    parse_str("<br>", ParseConfig::html(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "standaloneStart(br, minimized=false)",
            "standaloneEnd(br, minimized=false)",
            "docEnd",
        ]
    );
}

#[test]
fn optional_close_list_scenario() {
    let mut t = Trace::default();
    parse_str("<ul><li>a<li>b</ul>", ParseConfig::html(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "openStart(ul)",
            "openEnd(ul)",
            "openStart(li)",
            "openEnd(li)",
            "text(\"a\")",
            "autoCloseStart(li)",
            "autoCloseEnd(li)",
            "openStart(li)",
            "openEnd(li)",
            "text(\"b\")",
            "autoCloseStart(li)",
            "autoCloseEnd(li)",
            "closeStart(ul)",
            "closeEnd(ul)",
            "docEnd",
        ]
    );
}

#[test]
fn script_raw_text_scenario() {
    let mut t = Trace::default();
    parse_str("<script>if (a<b) {}</script>", ParseConfig::html(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "openStart(script)",
            "openEnd(script)",
            "text(\"if (a<b) {}\")",
            "closeStart(script)",
            "closeEnd(script)",
            "docEnd",
        ]
    );
}

#[test]
fn xml_declaration_and_self_closed_root_scenario() {
    let mut t = Trace::default();
    parse_str("<?xml version=\"1.0\"?><r/>", ParseConfig::xml(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "xmlDeclaration(version=1.0)",
            "standaloneStart(r, minimized=true)",
            "standaloneEnd(r, minimized=true)",
            "docEnd",
        ]
    );
}

#[test]
fn doctype_then_element_scenario() {
    let mut t = Trace::default();
    parse_str("<!DOCTYPE html><p>x</p>", ParseConfig::html(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "docType(name=html, type_empty=true, public_empty=true, system_empty=true, subset_empty=true)",
            "openStart(p)",
            "openEnd(p)",
            "text(\"x\")",
            "closeStart(p)",
            "closeEnd(p)",
            "docEnd",
        ]
    );
}

#[test]
fn attribute_quoting_scenario() {
    // `<a ...>` is neither self-closed nor an HTML void element, so it opens
    // an (eventually auto-closed) element rather than standing alone; the
    // scenario itself is only concerned with the attribute/inner-whitespace
    // events in between.
    let mut t = Trace::default();
    parse_str(r#"<a x=1 y='2' z="3 4">"#, ParseConfig::html(), &mut t).unwrap();
    assert_eq!(
        t.events,
        vec![
            "docStart(1,1)",
            "openStart(a)",
            "attribute(x, =, 1, 1)",
            "innerWhiteSpace",
            "attribute(y, =, 2, '2')",
            "innerWhiteSpace",
            "attribute(z, =, 3 4, \"3 4\")",
            "openEnd(a)",
            "autoCloseStart(a)",
            "autoCloseEnd(a)",
            "docEnd",
        ]
    );
}

#[test]
fn well_nesting_holds_for_every_open_element() {
    // Every openStart has a matching close/autoClose with the same name, and
    // no name is left open at docEnd — checked generically rather than via a
    // fixed expected trace, since this scenario exercises several kinds of
    // element together.
    let mut t = Trace::default();
    parse_str(
        "<div><p>one<span>two</span></p><p>three",
        ParseConfig::html(),
        &mut t,
    )
    .unwrap();

    let mut open_stack: Vec<String> = Vec::new();
    for ev in &t.events {
        if let Some(name) = ev.strip_prefix("openStart(").and_then(|s| s.strip_suffix(')')) {
            open_stack.push(name.to_string());
        } else if let Some(name) = ev.strip_prefix("closeEnd(").and_then(|s| s.strip_suffix(')')) {
            assert_eq!(open_stack.pop().as_deref(), Some(name));
        } else if let Some(name) = ev.strip_prefix("autoCloseEnd(").and_then(|s| s.strip_suffix(')')) {
            assert_eq!(open_stack.pop().as_deref(), Some(name));
        }
    }
    assert!(open_stack.is_empty(), "elements left open at docEnd: {:?}", open_stack);
}

#[test]
fn strict_xml_rejects_an_unmatched_close_tag() {
    let mut t = Trace::default();
    let err = parse_str("<r><a></r>", ParseConfig::xml(), &mut t).unwrap_err();
    assert!(matches!(err, Error::UnmatchedCloseElement { .. }));
}

#[test]
fn strict_xml_rejects_a_duplicate_attribute() {
    let mut t = Trace::default();
    let err = parse_str(r#"<r a="1" a="2"/>"#, ParseConfig::xml(), &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn lenient_html_allows_duplicate_attributes() {
    let mut t = Trace::default();
    parse_str(r#"<r a="1" a="2">"#, ParseConfig::html(), &mut t).unwrap();
    assert!(t.events.iter().any(|e| e.contains("attribute(a, =, 1, \"1\")")));
    assert!(t.events.iter().any(|e| e.contains("attribute(a, =, 2, \"2\")")));
}

#[test]
fn html_and_xml_builders_select_the_expected_dialect() {
    let cfg = ParseConfig::builder().xml().build();
    assert_eq!(cfg.dialect, Dialect::Xml);
    assert_eq!(cfg.element_balancing, ElementBalancing::Required);
}

#[test]
fn xml_declaration_forbidden_rejects_a_declaration() {
    let cfg = ParseConfig::builder()
        .xml()
        .xml_declaration_presence(Presence::Forbidden)
        .build();
    let mut t = Trace::default();
    let err = parse_str("<?xml version=\"1.0\"?><r/>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn xml_declaration_required_rejects_its_absence() {
    let cfg = ParseConfig::builder()
        .xml()
        .xml_declaration_presence(Presence::Required)
        .build();
    let mut t = Trace::default();
    let err = parse_str("<r/>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn doctype_forbidden_rejects_a_doctype() {
    let cfg = ParseConfig::builder().doctype_presence(Presence::Forbidden).build();
    let mut t = Trace::default();
    let err = parse_str("<!DOCTYPE html><p>x</p>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn doctype_required_rejects_its_absence() {
    let cfg = ParseConfig::builder().doctype_presence(Presence::Required).build();
    let mut t = Trace::default();
    let err = parse_str("<p>x</p>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn prolog_forbidden_rejects_a_leading_comment() {
    let cfg = ParseConfig::builder().xml().prolog_presence(Presence::Forbidden).build();
    let mut t = Trace::default();
    let err = parse_str("<!-- hi --><r/>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn prolog_required_rejects_a_document_with_no_prolog_at_all() {
    let cfg = ParseConfig::builder().xml().prolog_presence(Presence::Required).build();
    let mut t = Trace::default();
    let err = parse_str("<r/>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn prolog_required_accepts_a_leading_comment_as_prolog_content() {
    let cfg = ParseConfig::builder().xml().prolog_presence(Presence::Required).build();
    let mut t = Trace::default();
    parse_str("<!-- hi --><r/>", cfg, &mut t).unwrap();
}

#[test]
fn cdata_is_plain_text_inside_an_ordinary_html_element() {
    let mut t = Trace::default();
    parse_str("<p><![CDATA[x]]></p>", ParseConfig::html(), &mut t).unwrap();
    assert!(!t.events.iter().any(|e| e.starts_with("cdata(")));
    assert!(t.events.iter().any(|e| e.contains("<![CDATA[x]]>")));
}

#[test]
fn cdata_is_a_real_section_inside_svg_foreign_content() {
    let mut t = Trace::default();
    parse_str("<svg><![CDATA[x]]></svg>", ParseConfig::html(), &mut t).unwrap();
    assert!(t.events.iter().any(|e| e.starts_with("cdata(")));
}

#[test]
fn unique_root_required_rejects_a_second_top_level_element() {
    let cfg = ParseConfig::builder()
        .xml()
        .unique_root_element_presence(RootElementPresence::Required)
        .build();
    let mut t = Trace::default();
    let err = parse_str("<a/><b/>", cfg, &mut t).unwrap_err();
    assert!(matches!(err, Error::ConfigurationViolation { .. }));
}

#[test]
fn html_fragments_tolerate_several_top_level_elements() {
    // `DependsOnPrologDoctype` (the HTML default) places no uniqueness
    // restriction on root-level elements — ordinary HTML fragments.
    let mut t = Trace::default();
    parse_str("<p>a</p><p>b</p>", ParseConfig::html(), &mut t).unwrap();
    assert!(t.events.iter().filter(|e| e.starts_with("openStart(p)")).count() >= 2);
}
