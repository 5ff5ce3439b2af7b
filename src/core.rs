//! The parser core — the driving loop that ties configuration,
//! status, the buffer, the tokenizer, the HTML stack/auto-balancer, and the
//! handler contract together into one `parse` call.
//!
//! `Parser` itself holds nothing but a [`ParseConfig`]; all per-parse state
//! (buffer, status, element stack) is local to one [`Parser::parse`] call, so
//! the same `Parser` can drive any number of concurrent or sequential parses.

use std::io::{Cursor as IoCursor, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crate::buffer::{Buffer, BufferView, Partition};
use crate::config::{AttributeUniqueness, ElementBalancing, ParseConfig, Presence, RootElementPresence};
use crate::errors::{Error, Result};
use crate::handler::{HandlerChainInfo, MarkupHandler, ParseSelection, ParserHandle};
use crate::registry;
use crate::stack::{self, CloseResolution, ElementStack};
use crate::status::ParseStatus;
use crate::text;
use crate::tokenizer::{self, Tag, TagPart, Token};

static NEXT_SELECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks prolog/root-element bookkeeping needed to enforce the presence
/// policies (`prologPresence`, `xmlDeclarationPresence`,
/// `doctypePresence`, `uniqueRootElementPresence`) without the tokenizer or
/// stack needing to know about them.
#[derive(Default)]
struct PrologState {
    saw_xml_declaration: bool,
    saw_doctype: bool,
    /// Becomes `true` the moment any prolog-shaped structure (comment, PI,
    /// XML declaration, DOCTYPE) is seen before the root element starts —
    /// tracked independently of which kind, since `prologPresence::Required`
    /// is satisfied by any of them.
    saw_prolog_content: bool,
    /// Becomes `true` the moment the first root-level element tag is seen;
    /// xmlDeclaration/DOCTYPE/comments/PIs are only "prolog" before this.
    root_started: bool,
    /// Becomes `true` once a root-level element has opened and then fully
    /// closed (or was standalone) — a second one violates
    /// [`RootElementPresence::Required`].
    root_closed: bool,
}

/// Drives one or more parses under a fixed [`ParseConfig`].
pub struct Parser {
    config: ParseConfig,
}

impl Parser {
    pub fn new(config: ParseConfig) -> Self {
        Parser { config }
    }

    /// A parser configured with [`ParseConfig::html`].
    pub fn html() -> Self {
        Self::new(ParseConfig::html())
    }

    /// A parser configured with [`ParseConfig::xml`].
    pub fn xml() -> Self {
        Self::new(ParseConfig::xml())
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parses `source` to completion, reporting every structure to `handler`.
    ///
    /// Returns `Err` as soon as a structural error is found, the configured
    /// invariants are violated, or `handler` itself returns `Err` (at which
    /// point no further input is read — see [`Error::Handler`]).
    pub fn parse<R: Read, H: MarkupHandler>(&self, source: R, handler: &mut H) -> Result<()> {
        let mut buf = Buffer::new(source);
        let mut status = ParseStatus::new();
        let mut stack = ElementStack::new();
        let mut prolog = PrologState::default();

        let selection = ParseSelection {
            id: NEXT_SELECTION_ID.fetch_add(1, Ordering::Relaxed),
        };
        handler.set_parse_configuration(&self.config);
        handler.set_parse_status(&status);
        handler.set_parse_selection(selection);
        handler.set_parser(ParserHandle);
        handler.set_handler_chain(HandlerChainInfo { len: 1, index: 0 });

        let started_at = SystemTime::now();
        handler
            .document_start(&mut status, started_at, 1, 1)
            .map_err(Error::Handler)?;

        loop {
            self.apply_requested_directives(&mut stack, &mut status, handler)?;

            let cdata_allowed = registry::cdata_allowed(stack.top(), self.config.is_html());
            match tokenizer::next_token(&mut buf, &self.config, &mut status, cdata_allowed)? {
                None => break,
                Some(tok) => self.dispatch(&buf, &mut stack, &mut status, &mut prolog, handler, tok)?,
            }
        }

        self.check_required_prolog_presence(&buf, &prolog)?;
        self.finish_document(&buf, &mut stack, &mut status, handler)?;

        let elapsed = started_at.elapsed().unwrap_or_default();
        let end_pos = buf.position();
        handler
            .document_end(&mut status, started_at, elapsed, end_pos.line, end_pos.col)
            .map_err(Error::Handler)?;
        Ok(())
    }

    /// Applies back-channel requests the handler left on `status` during the
    /// previous event, before the next token is even read: synthetic
    /// auto-open/auto-close events always precede the real event they were
    /// requested ahead of.
    fn apply_requested_directives<H: MarkupHandler>(
        &self,
        stack: &mut ElementStack,
        status: &mut ParseStatus,
        handler: &mut H,
    ) -> Result<()> {
        if let Some(name) = status.take_auto_open() {
            stack.push(&name);
            handler
                .auto_open_element_start(status, &name)
                .map_err(Error::Handler)?;
            handler
                .auto_open_element_end(status, &name)
                .map_err(Error::Handler)?;
        }
        if status.take_auto_close_requested() {
            if let Some(name) = stack.pop() {
                handler
                    .auto_close_element_start(status, &name)
                    .map_err(Error::Handler)?;
                handler
                    .auto_close_element_end(status, &name)
                    .map_err(Error::Handler)?;
            }
        }
        Ok(())
    }

    fn dispatch<R: Read, H: MarkupHandler>(
        &self,
        buf: &Buffer<R>,
        stack: &mut ElementStack,
        status: &mut ParseStatus,
        prolog: &mut PrologState,
        handler: &mut H,
        tok: Token,
    ) -> Result<()> {
        match tok {
            Token::Text { span } => handler.text(status, buf.view(), span).map_err(Error::Handler),
            Token::Comment { content, outer } => {
                self.check_prolog_allowed(buf, prolog, "comment")?;
                handler
                    .comment(status, buf.view(), content, outer)
                    .map_err(Error::Handler)
            }
            Token::CData { content, outer } => handler
                .cdata_section(status, buf.view(), content, outer)
                .map_err(Error::Handler),
            Token::XmlDeclaration {
                keyword,
                version,
                encoding,
                standalone,
                outer,
            } => {
                self.check_prolog_allowed(buf, prolog, "XML declaration")?;
                if self.config.xml_declaration_presence == Presence::Forbidden {
                    return Err(Error::ConfigurationViolation {
                        what: "XML declaration present but forbidden",
                        at: buf.position(),
                    });
                }
                prolog.saw_xml_declaration = true;
                handler
                    .xml_declaration(status, buf.view(), keyword, version, encoding, standalone, outer)
                    .map_err(Error::Handler)
            }
            Token::DocType {
                keyword,
                element_name,
                doctype_type,
                public_id,
                system_id,
                internal_subset,
                outer,
            } => {
                self.check_prolog_allowed(buf, prolog, "DOCTYPE")?;
                if self.config.doctype_presence == Presence::Forbidden {
                    return Err(Error::ConfigurationViolation {
                        what: "DOCTYPE present but forbidden",
                        at: buf.position(),
                    });
                }
                prolog.saw_doctype = true;
                handler
                    .doc_type(
                        status,
                        buf.view(),
                        keyword,
                        element_name,
                        doctype_type,
                        public_id,
                        system_id,
                        internal_subset,
                        outer,
                    )
                    .map_err(Error::Handler)
            }
            Token::ProcessingInstruction { target, content, outer } => {
                self.check_prolog_allowed(buf, prolog, "processing instruction")?;
                handler
                    .processing_instruction(status, buf.view(), target, content, outer)
                    .map_err(Error::Handler)
            }
            Token::CloseTag { name, outer } => {
                self.dispatch_close_tag(buf, stack, status, prolog, handler, name, outer)
            }
            Token::Tag(tag) => self.dispatch_open_tag(buf, stack, status, prolog, handler, tag),
        }
    }

    /// Enforces `prologPresence == Forbidden` and records prolog content for
    /// the `Required` check at end-of-input: once the root element has
    /// started, nothing "prolog-shaped" may appear before it, and no prolog
    /// structure is tolerated at all when forbidden outright.
    fn check_prolog_allowed<R: Read>(&self, buf: &Buffer<R>, prolog: &mut PrologState, what: &'static str) -> Result<()> {
        if prolog.root_started {
            return Ok(());
        }
        prolog.saw_prolog_content = true;
        if self.config.prolog_presence != Presence::Forbidden {
            return Ok(());
        }
        Err(Error::ConfigurationViolation {
            what,
            at: buf.position(),
        })
    }

    /// Enforces the `Required` side of `prologPresence`/`xmlDeclarationPresence`/
    /// `doctypePresence` at end of input, once no more prolog content can
    /// possibly arrive.
    fn check_required_prolog_presence<R: Read>(&self, buf: &Buffer<R>, prolog: &PrologState) -> Result<()> {
        if self.config.prolog_presence == Presence::Required && !prolog.saw_prolog_content {
            return Err(Error::ConfigurationViolation {
                what: "prolog required but absent",
                at: buf.position(),
            });
        }
        if self.config.xml_declaration_presence == Presence::Required && !prolog.saw_xml_declaration {
            return Err(Error::ConfigurationViolation {
                what: "XML declaration required but absent",
                at: buf.position(),
            });
        }
        if self.config.doctype_presence == Presence::Required && !prolog.saw_doctype {
            return Err(Error::ConfigurationViolation {
                what: "DOCTYPE required but absent",
                at: buf.position(),
            });
        }
        Ok(())
    }

    /// HTML-dialect open/standalone tag handling:
    /// optional-close fixed point first, then the real start event, then
    /// attributes, then the real end event, then — for a non-standalone
    /// element — pushing the stack and possibly entering raw-text mode.
    fn dispatch_open_tag<R: Read, H: MarkupHandler>(
        &self,
        buf: &Buffer<R>,
        stack: &mut ElementStack,
        status: &mut ParseStatus,
        prolog: &mut PrologState,
        handler: &mut H,
        tag: Tag,
    ) -> Result<()> {
        let view = buf.view();
        let name_bytes = view.slice(tag.name).to_vec();
        let html = self.config.is_html();
        let descriptor = registry::lookup_for_dialect(&name_bytes, html);
        let standalone = tag.self_closed || (html && descriptor.is_void);

        if stack.is_empty() {
            self.check_root_element_uniqueness(buf, &*prolog)?;
            prolog.root_started = true;
            if standalone {
                prolog.root_closed = true;
            }
        }

        if html && !standalone && self.config.element_balancing == ElementBalancing::AutoOpenAndClose {
            for popped in stack::implicit_closes_for_open(stack, &name_bytes) {
                handler
                    .auto_close_element_start(status, &popped)
                    .map_err(Error::Handler)?;
                handler
                    .auto_close_element_end(status, &popped)
                    .map_err(Error::Handler)?;
            }
        }

        if standalone {
            handler
                .standalone_element_start(status, view, tag.name, tag.self_closed)
                .map_err(Error::Handler)?;
        } else {
            handler
                .open_element_start(status, view, tag.name)
                .map_err(Error::Handler)?;
        }

        self.emit_tag_attributes(&tag, view, status, handler)?;

        if standalone {
            handler
                .standalone_element_end(status, view, tag.name, tag.self_closed)
                .map_err(Error::Handler)?;
            return Ok(());
        }

        handler
            .open_element_end(status, view, tag.name)
            .map_err(Error::Handler)?;

        if status.take_avoid_stacking() {
            return Ok(());
        }

        stack.push(&name_bytes);
        if html && (descriptor.is_raw_text || descriptor.is_escapable_raw_text) {
            status.set_limit_sequence(name_bytes.into_boxed_slice());
        }
        Ok(())
    }

    /// Reports every attribute and interleaved inner-whitespace span of a
    /// tag in source order, enforcing
    /// [`AttributeUniqueness::Require`] along the way.
    fn emit_tag_attributes<H: MarkupHandler>(
        &self,
        tag: &Tag,
        view: BufferView<'_>,
        status: &mut ParseStatus,
        handler: &mut H,
    ) -> Result<()> {
        let mut seen: Vec<&[u8]> = Vec::new();
        for part in &tag.parts {
            match part {
                TagPart::Attribute {
                    name,
                    operator,
                    value_content,
                    value_outer,
                } => {
                    let name_bytes = view.slice(*name);
                    if self.config.unique_attributes_in_element == AttributeUniqueness::Require {
                        if seen.iter().any(|s| text::eq_name(s, name_bytes, self.config.case_sensitive)) {
                            return Err(Error::ConfigurationViolation {
                                what: "duplicate attribute name",
                                at: name.position(),
                            });
                        }
                        seen.push(name_bytes);
                    }
                    handler
                        .attribute(status, view, *name, *operator, *value_content, *value_outer)
                        .map_err(Error::Handler)?;
                }
                TagPart::Whitespace { span } => {
                    handler.inner_white_space(status, view, *span).map_err(Error::Handler)?;
                }
            }
        }
        Ok(())
    }

    /// Resolves a close tag against the stack per the configured balancing
    /// policy, then reports the resulting events.
    fn dispatch_close_tag<R: Read, H: MarkupHandler>(
        &self,
        buf: &Buffer<R>,
        stack: &mut ElementStack,
        status: &mut ParseStatus,
        prolog: &mut PrologState,
        handler: &mut H,
        name: Partition,
        _outer: Partition,
    ) -> Result<()> {
        let view = buf.view();
        let name_bytes = view.slice(name).to_vec();
        let case_sensitive = self.config.case_sensitive;

        match self.config.element_balancing {
            ElementBalancing::AutoOpenAndClose => match stack::resolve_close(stack, &name_bytes, case_sensitive) {
                CloseResolution::Matched => {
                    handler.close_element_start(status, view, name).map_err(Error::Handler)?;
                    handler.close_element_end(status, view, name).map_err(Error::Handler)?;
                    stack.pop();
                }
                CloseResolution::AutoClosedThenMatched { popped_above } => {
                    for _ in 0..popped_above {
                        if let Some(popped) = stack.pop() {
                            handler
                                .auto_close_element_start(status, &popped)
                                .map_err(Error::Handler)?;
                            handler
                                .auto_close_element_end(status, &popped)
                                .map_err(Error::Handler)?;
                        }
                    }
                    handler.close_element_start(status, view, name).map_err(Error::Handler)?;
                    handler.close_element_end(status, view, name).map_err(Error::Handler)?;
                    stack.pop();
                }
                CloseResolution::Unmatched => {
                    self.report_unmatched_close(view, status, handler, name)?;
                }
            },
            ElementBalancing::Required | ElementBalancing::None => {
                let matches_top = stack
                    .top()
                    .map(|top| text::eq_name(top, &name_bytes, case_sensitive))
                    .unwrap_or(false);
                if matches_top {
                    handler.close_element_start(status, view, name).map_err(Error::Handler)?;
                    handler.close_element_end(status, view, name).map_err(Error::Handler)?;
                    stack.pop();
                } else {
                    self.report_unmatched_close(view, status, handler, name)?;
                }
            }
        }
        if stack.is_empty() {
            prolog.root_closed = true;
        }
        Ok(())
    }

    /// Enforces [`RootElementPresence::Required`]: a second root-level
    /// element after the first has already opened and closed is a violation.
    /// [`RootElementPresence::DependsOnPrologDoctype`] (the HTML default)
    /// places no such restriction — HTML fragments routinely have several
    /// top-level nodes.
    fn check_root_element_uniqueness<R: Read>(&self, buf: &Buffer<R>, prolog: &PrologState) -> Result<()> {
        if self.config.unique_root_element_presence == RootElementPresence::Required
            && prolog.root_started
            && prolog.root_closed
        {
            return Err(Error::ConfigurationViolation {
                what: "a second root element is present but only one is allowed",
                at: buf.position(),
            });
        }
        Ok(())
    }

    fn report_unmatched_close<H: MarkupHandler>(
        &self,
        view: BufferView<'_>,
        status: &mut ParseStatus,
        handler: &mut H,
        name: Partition,
    ) -> Result<()> {
        if self.config.no_unmatched_close_elements_required {
            return Err(Error::UnmatchedCloseElement {
                name: view.slice(name).to_vec().into_boxed_slice(),
                at: name.position(),
            });
        }
        handler
            .unmatched_close_element_start(status, view, name)
            .map_err(Error::Handler)?;
        handler
            .unmatched_close_element_end(status, view, name)
            .map_err(Error::Handler)?;
        Ok(())
    }

    /// Drains whatever is left on the stack at end of input — the stack
    /// must be empty at document end. Under auto-balancing this
    /// is satisfied by synthesizing closes, innermost first; otherwise it is
    /// itself a structural error.
    fn finish_document<R: Read, H: MarkupHandler>(
        &self,
        buf: &Buffer<R>,
        stack: &mut ElementStack,
        status: &mut ParseStatus,
        handler: &mut H,
    ) -> Result<()> {
        if stack.is_empty() {
            return Ok(());
        }
        if self.config.element_balancing != ElementBalancing::AutoOpenAndClose {
            let name = stack.top().expect("checked non-empty above").to_vec();
            return Err(Error::UnmatchedCloseElement {
                name: name.into_boxed_slice(),
                at: buf.position(),
            });
        }
        while let Some(name) = stack.pop() {
            handler
                .auto_close_element_start(status, &name)
                .map_err(Error::Handler)?;
            handler
                .auto_close_element_end(status, &name)
                .map_err(Error::Handler)?;
        }
        Ok(())
    }
}

/// Parses `input` as a byte slice with no copy beyond what the handler
/// itself retains.
pub fn parse_slice<H: MarkupHandler>(input: &[u8], config: ParseConfig, handler: &mut H) -> Result<()> {
    Parser::new(config).parse(IoCursor::new(input), handler)
}

/// Parses `input` as UTF-8 text.
pub fn parse_str<H: MarkupHandler>(input: &str, config: ParseConfig, handler: &mut H) -> Result<()> {
    parse_slice(input.as_bytes(), config, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferView as BV;
    use crate::handler::HandlerResult;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Recorder {
        fn rec(&mut self, what: &str) {
            self.events.push(what.to_string());
        }

        fn rec_named(&mut self, what: &str, view: BV<'_>, name: Partition) {
            let n = String::from_utf8_lossy(view.slice(name)).into_owned();
            self.events.push(format!("{}:{}", what, n));
        }
    }

    impl MarkupHandler for Recorder {
        fn text(&mut self, _status: &mut ParseStatus, view: BV<'_>, span: Partition) -> HandlerResult {
            self.rec(&format!("text:{:?}", String::from_utf8_lossy(view.slice(span))));
            Ok(())
        }
        fn open_element_start(&mut self, _status: &mut ParseStatus, view: BV<'_>, name: Partition) -> HandlerResult {
            self.rec_named("open_start", view, name);
            Ok(())
        }
        fn open_element_end(&mut self, _status: &mut ParseStatus, view: BV<'_>, name: Partition) -> HandlerResult {
            self.rec_named("open_end", view, name);
            Ok(())
        }
        fn close_element_start(&mut self, _status: &mut ParseStatus, view: BV<'_>, name: Partition) -> HandlerResult {
            self.rec_named("close_start", view, name);
            Ok(())
        }
        fn close_element_end(&mut self, _status: &mut ParseStatus, view: BV<'_>, name: Partition) -> HandlerResult {
            self.rec_named("close_end", view, name);
            Ok(())
        }
        fn standalone_element_start(
            &mut self,
            _status: &mut ParseStatus,
            view: BV<'_>,
            name: Partition,
            _minimized: bool,
        ) -> HandlerResult {
            self.rec_named("standalone_start", view, name);
            Ok(())
        }
        fn standalone_element_end(
            &mut self,
            _status: &mut ParseStatus,
            view: BV<'_>,
            name: Partition,
            _minimized: bool,
        ) -> HandlerResult {
            self.rec_named("standalone_end", view, name);
            Ok(())
        }
        fn auto_close_element_start(&mut self, _status: &mut ParseStatus, name: &[u8]) -> HandlerResult {
            self.rec(&format!("auto_close_start:{}", String::from_utf8_lossy(name)));
            Ok(())
        }
        fn auto_close_element_end(&mut self, _status: &mut ParseStatus, name: &[u8]) -> HandlerResult {
            self.rec(&format!("auto_close_end:{}", String::from_utf8_lossy(name)));
            Ok(())
        }
    }

    #[test]
    fn simple_paragraph_round_trips_open_and_close() {
        let mut rec = Recorder::default();
        parse_str("<p>hi</p>", ParseConfig::html(), &mut rec).unwrap();
        assert_eq!(
            rec.events,
            vec![
                "open_start:p",
                "open_end:p",
                "text:\"hi\"",
                "close_start:p",
                "close_end:p",
            ]
        );
    }

    #[test]
    fn void_element_is_reported_standalone_without_a_slash() {
        let mut rec = Recorder::default();
        parse_str("<br>", ParseConfig::html(), &mut rec).unwrap();
        assert_eq!(rec.events, vec!["standalone_start:br", "standalone_end:br"]);
    }

    #[test]
    fn optional_close_auto_closes_sibling_li() {
        let mut rec = Recorder::default();
        parse_str("<ul><li>a<li>b</ul>", ParseConfig::html(), &mut rec).unwrap();
        assert_eq!(
            rec.events,
            vec![
                "open_start:ul",
                "open_end:ul",
                "open_start:li",
                "open_end:li",
                "text:\"a\"",
                "auto_close_start:li",
                "auto_close_end:li",
                "open_start:li",
                "open_end:li",
                "text:\"b\"",
                "auto_close_start:li",
                "auto_close_end:li",
                "close_start:ul",
                "close_end:ul",
            ]
        );
    }

    #[test]
    fn script_body_is_not_tokenized_as_markup() {
        let mut rec = Recorder::default();
        parse_str("<script>if (a<b) {}</script>", ParseConfig::html(), &mut rec).unwrap();
        assert_eq!(
            rec.events,
            vec![
                "open_start:script",
                "open_end:script",
                "text:\"if (a<b) {}\"",
                "close_start:script",
                "close_end:script",
            ]
        );
    }

    #[test]
    fn unclosed_elements_are_auto_closed_at_document_end() {
        let mut rec = Recorder::default();
        parse_str("<div><p>unclosed", ParseConfig::html(), &mut rec).unwrap();
        assert_eq!(
            rec.events,
            vec![
                "open_start:div",
                "open_end:div",
                "open_start:p",
                "open_end:p",
                "text:\"unclosed\"",
                "auto_close_start:p",
                "auto_close_end:p",
                "auto_close_start:div",
                "auto_close_end:div",
            ]
        );
    }

    #[test]
    fn strict_xml_errors_on_unclosed_root() {
        let mut rec = Recorder::default();
        let err = parse_str("<r><a></r>", ParseConfig::xml(), &mut rec).unwrap_err();
        assert!(matches!(err, Error::UnmatchedCloseElement { .. }));
    }

    #[test]
    fn strict_xml_round_trips_a_self_closed_root() {
        let mut rec = Recorder::default();
        parse_str("<?xml version=\"1.0\"?><r/>", ParseConfig::xml(), &mut rec).unwrap();
        assert_eq!(rec.events, vec!["standalone_start:r", "standalone_end:r"]);
    }
}
