//! The structure tokenizer — recognizes one markup primitive at a
//! time and locates its sub-partitions against the buffer's current window.
//!
//! Every partition below is computed relative to `buf.window()` as it stood
//! when [`next_token`] was called. A structure is never split across two
//! calls: [`next_token`] keeps growing the window (via `Buffer::ensure`)
//! until the whole structure is visible, and a buffer shift only ever
//! renumbers that same window down to a zero base rather than changing its
//! content, so offsets computed here stay valid once the caller advances
//! past them.

use std::io::Read;

use crate::buffer::{advance_position, Buffer, Partition, Position};
use crate::config::ParseConfig;
use crate::errors::{Error, Result};
use crate::status::ParseStatus;
use crate::text;

/// One fully recognized structure.
#[derive(Debug)]
pub enum Token {
    Text {
        span: Partition,
    },
    Comment {
        content: Partition,
        outer: Partition,
    },
    CData {
        content: Partition,
        outer: Partition,
    },
    XmlDeclaration {
        keyword: Partition,
        version: Partition,
        encoding: Partition,
        standalone: Partition,
        outer: Partition,
    },
    DocType {
        keyword: Partition,
        element_name: Partition,
        doctype_type: Partition,
        public_id: Partition,
        system_id: Partition,
        internal_subset: Partition,
        outer: Partition,
    },
    ProcessingInstruction {
        target: Partition,
        content: Partition,
        outer: Partition,
    },
    Tag(Tag),
    CloseTag {
        name: Partition,
        outer: Partition,
    },
}

/// An open or standalone element tag: name plus attributes and whitespace
/// interleaved in source order.
#[derive(Debug)]
pub struct Tag {
    pub name: Partition,
    pub parts: Vec<TagPart>,
    /// True iff the tag was literally terminated by `/>` rather than `>`.
    /// Surfaced to handlers as the `minimized` flag.
    pub self_closed: bool,
    pub outer: Partition,
}

#[derive(Debug)]
pub enum TagPart {
    Attribute {
        name: Partition,
        operator: Partition,
        value_content: Partition,
        value_outer: Partition,
    },
    Whitespace {
        span: Partition,
    },
}

/// One attribute's partitions, as yielded by [`Tag::attributes`].
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    pub name: Partition,
    pub operator: Partition,
    pub value_content: Partition,
    pub value_outer: Partition,
}

impl Tag {
    /// Iterates this tag's attributes in source order, skipping the
    /// interleaved whitespace parts — for handlers that only want attribute
    /// values without re-deriving them from `parts` themselves.
    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.parts.iter().filter_map(|p| match *p {
            TagPart::Attribute {
                name,
                operator,
                value_content,
                value_outer,
            } => Some(Attribute {
                name,
                operator,
                value_content,
                value_outer,
            }),
            TagPart::Whitespace { .. } => None,
        })
    }
}

/// Reads the next token, or `None` at end of input.
///
/// Raw-text mode (`status.limit_sequence()`) is checked first: while set,
/// structure recognition is disabled and this function only ever returns
/// `Text` (scanning up to the terminator) until the terminator is actually
/// reached, at which point it clears the status and falls through to
/// ordinary recognition — the buffer is sitting right at `</name` by then,
/// so the ordinary close-tag path (priority 7) picks it up without any
/// separate raw-text close-tag code path.
pub fn next_token<R: Read>(
    buf: &mut Buffer<R>,
    cfg: &ParseConfig,
    status: &mut ParseStatus,
    cdata_allowed: bool,
) -> Result<Option<Token>> {
    if let Some(name) = status.limit_sequence() {
        let name = name.to_vec();
        if let Some(tok) = read_raw_text(buf, &name, status)? {
            return Ok(Some(tok));
        }
    }
    next_structural_token(buf, cfg, cdata_allowed)
}

fn next_structural_token<R: Read>(
    buf: &mut Buffer<R>,
    cfg: &ParseConfig,
    cdata_allowed: bool,
) -> Result<Option<Token>> {
    if buf.ensure(1)? == 0 {
        return Ok(None);
    }
    if buf.window()[0] != b'<' {
        return read_text(buf).map(Some);
    }
    if starts_with(buf, b"<!--")? {
        return read_comment(buf).map(Some);
    }
    if cdata_allowed && starts_with(buf, b"<![CDATA[")? {
        return read_cdata(buf).map(Some);
    }
    if starts_with_ci(buf, b"<!DOCTYPE")? {
        return read_doctype(buf).map(Some);
    }
    if starts_with_ci(buf, b"<?xml")? && is_xml_decl_boundary(buf)? {
        return read_xml_declaration(buf).map(Some);
    }
    if starts_with(buf, b"<?")? {
        return read_processing_instruction(buf).map(Some);
    }
    if starts_with(buf, b"</")? {
        return read_close_tag(buf).map(Some);
    }
    if is_tag_name_start(buf)? {
        return read_tag(buf).map(Some);
    }
    if cfg.is_html() {
        // Lenient HTML: a `<` that begins nothing recognizable is literal text.
        return read_text(buf).map(Some);
    }
    let at = buf.position();
    Err(Error::UnexpectedStructure {
        what: "'<' does not begin a recognized structure",
        at,
    })
}

/// Tracks a running `(window offset, source position)` pair so partitions
/// mid-structure don't each need their own scan from the structure start.
/// Offsets passed to `partition`/`position_at` must be non-decreasing.
struct Cursor {
    offset: usize,
    pos: Position,
}

impl Cursor {
    fn new(pos: Position) -> Self {
        Cursor { offset: 0, pos }
    }

    fn position_at(&mut self, window: &[u8], idx: usize) -> Position {
        if idx > self.offset {
            self.pos = advance_position(self.pos, &window[self.offset..idx]);
            self.offset = idx;
        }
        self.pos
    }

    fn partition(&mut self, window: &[u8], from: usize, to: usize) -> Partition {
        let p = self.position_at(window, from);
        Partition {
            offset: from,
            length: to - from,
            line: p.line,
            col: p.col,
        }
    }
}

fn outer_partition(start_pos: Position, length: usize) -> Partition {
    Partition {
        offset: 0,
        length,
        line: start_pos.line,
        col: start_pos.col,
    }
}

// --- small scanning primitives, shared by every structure below ---

fn peek_byte<R: Read>(buf: &mut Buffer<R>, at: usize) -> Result<Option<u8>> {
    buf.ensure(at + 1)?;
    Ok(buf.window().get(at).copied())
}

fn skip_ws<R: Read>(buf: &mut Buffer<R>, mut i: usize) -> Result<usize> {
    while let Some(b) = peek_byte(buf, i)? {
        if text::is_whitespace(b) {
            i += 1;
        } else {
            break;
        }
    }
    Ok(i)
}

fn scan_run_until<R: Read>(buf: &mut Buffer<R>, mut i: usize, stop: impl Fn(u8) -> bool) -> Result<usize> {
    while let Some(b) = peek_byte(buf, i)? {
        if stop(b) {
            break;
        }
        i += 1;
    }
    Ok(i)
}

fn matches_ci_at<R: Read>(buf: &mut Buffer<R>, i: usize, lit: &[u8]) -> Result<bool> {
    buf.ensure(i + lit.len())?;
    let window = buf.window();
    Ok(window.len() >= i + lit.len() && window[i..i + lit.len()].eq_ignore_ascii_case(lit))
}

fn starts_with<R: Read>(buf: &mut Buffer<R>, lit: &[u8]) -> Result<bool> {
    buf.ensure(lit.len())?;
    Ok(buf.window().len() >= lit.len() && &buf.window()[..lit.len()] == lit)
}

fn starts_with_ci<R: Read>(buf: &mut Buffer<R>, lit: &[u8]) -> Result<bool> {
    matches_ci_at(buf, 0, lit)
}

fn is_xml_decl_boundary<R: Read>(buf: &mut Buffer<R>) -> Result<bool> {
    buf.ensure(6)?;
    let w = buf.window();
    Ok(w.len() > 5 && (text::is_whitespace(w[5]) || w[5] == b'?'))
}

fn is_tag_name_start<R: Read>(buf: &mut Buffer<R>) -> Result<bool> {
    buf.ensure(2)?;
    let w = buf.window();
    if w.len() < 2 {
        return Ok(false);
    }
    let c = w[1];
    Ok(!text::is_whitespace(c) && c != b'!' && c != b'?' && c != b'/' && c != b'>')
}

/// Parses a `"..."` or `'...'` quoted literal starting at `i`. Returns
/// `(content_start, content_end, index_just_past_the_closing_quote)`.
fn scan_quoted<R: Read>(buf: &mut Buffer<R>, i: usize, start_pos: Position) -> Result<(usize, usize, usize)> {
    match peek_byte(buf, i)? {
        Some(q @ b'"') | Some(q @ b'\'') => {
            let content_start = i + 1;
            let mut j = content_start;
            loop {
                match peek_byte(buf, j)? {
                    Some(b) if b == q => break,
                    Some(_) => j += 1,
                    None => {
                        return Err(Error::MalformedStructure {
                            what: "quoted literal",
                            at: start_pos,
                        })
                    }
                }
            }
            Ok((content_start, j, j + 1))
        }
        _ => Err(Error::MalformedStructure {
            what: "expected quoted literal",
            at: start_pos,
        }),
    }
}

/// Finds the first occurrence of `lit` in `hay` at or after `from`,
/// accelerated by `memchr` on the literal's first byte.
fn find_literal(hay: &[u8], lit: &[u8], from: usize) -> Option<usize> {
    if lit.is_empty() || from > hay.len() || hay.len() - from < lit.len() {
        return None;
    }
    let first = lit[0];
    let mut start = from;
    while let Some(rel) = memchr::memchr(first, &hay[start..]) {
        let i = start + rel;
        if i + lit.len() <= hay.len() && &hay[i..i + lit.len()] == lit {
            return Some(i);
        }
        start = i + 1;
    }
    None
}

/// Grows the buffer's window until `lit` (case-sensitive) is found at or
/// after window offset `from`, returning its start offset, or `None` at EOF.
fn scan_to_literal<R: Read>(buf: &mut Buffer<R>, lit: &[u8], from: usize) -> Result<Option<usize>> {
    let mut search_from = from;
    loop {
        if let Some(pos) = find_literal(buf.window(), lit, search_from) {
            return Ok(Some(pos));
        }
        let window_len = buf.window().len();
        search_from = window_len.saturating_sub(lit.len().saturating_sub(1)).max(from);
        if !buf.fill_more()? {
            return Ok(None);
        }
    }
}

// --- text ---

fn read_text<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    let mut search_from = if buf.window().first() == Some(&b'<') { 1 } else { 0 };
    loop {
        if let Some(rel) = memchr::memchr(b'<', &buf.window()[search_from..]) {
            let idx = search_from + rel;
            let window = buf.window();
            let span = Cursor::new(start_pos).partition(window, 0, idx);
            buf.advance(idx);
            return Ok(Token::Text { span });
        }
        search_from = buf.window().len();
        if !buf.fill_more()? {
            let len = buf.window().len();
            let span = outer_partition(start_pos, len);
            buf.advance(len);
            return Ok(Token::Text { span });
        }
    }
}

// --- raw-text mode ---

fn find_close_tag_start(hay: &[u8], name: &[u8]) -> Option<usize> {
    let mut start = 0;
    while let Some(rel) = memchr::memchr(b'<', &hay[start..]) {
        let i = start + rel;
        if i + 2 + name.len() <= hay.len()
            && hay[i + 1] == b'/'
            && hay[i + 2..i + 2 + name.len()].eq_ignore_ascii_case(name)
        {
            return Some(i);
        }
        start = i + 1;
    }
    None
}

fn scan_for_close_tag<R: Read>(buf: &mut Buffer<R>, name: &[u8]) -> Result<Option<usize>> {
    let mut search_from = 0;
    loop {
        if let Some(idx) = find_close_tag_start(&buf.window()[search_from..], name) {
            return Ok(Some(search_from + idx));
        }
        let keep_back = name.len() + 2;
        search_from = buf.window().len().saturating_sub(keep_back);
        if !buf.fill_more()? {
            return Ok(None);
        }
    }
}

/// Returns `Some(Text)` for non-empty raw text before the terminator (or
/// before EOF, lenient), or `None` once the status has been cleared and
/// there is nothing left to report before falling through to ordinary
/// recognition at the same position.
fn read_raw_text<R: Read>(buf: &mut Buffer<R>, name: &[u8], status: &mut ParseStatus) -> Result<Option<Token>> {
    let start_pos = buf.position();
    match scan_for_close_tag(buf, name)? {
        Some(idx) => {
            status.clear_limit_sequence();
            if idx == 0 {
                return Ok(None);
            }
            let window = buf.window();
            let span = Cursor::new(start_pos).partition(window, 0, idx);
            buf.advance(idx);
            Ok(Some(Token::Text { span }))
        }
        None => {
            status.clear_limit_sequence();
            let len = buf.window().len();
            if len == 0 {
                return Ok(None);
            }
            let span = outer_partition(start_pos, len);
            buf.advance(len);
            Ok(Some(Token::Text { span }))
        }
    }
}

// --- comment / CDATA ---

fn read_comment<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    match scan_to_literal(buf, b"-->", 4)? {
        Some(close_at) => {
            let window = buf.window();
            let content = Cursor::new(start_pos).partition(window, 4, close_at);
            let outer_len = close_at + 3;
            let outer = outer_partition(start_pos, outer_len);
            buf.advance(outer_len);
            Ok(Token::Comment { content, outer })
        }
        None => Err(Error::MalformedStructure {
            what: "comment",
            at: start_pos,
        }),
    }
}

fn read_cdata<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    match scan_to_literal(buf, b"]]>", 9)? {
        Some(close_at) => {
            let window = buf.window();
            let content = Cursor::new(start_pos).partition(window, 9, close_at);
            let outer_len = close_at + 3;
            let outer = outer_partition(start_pos, outer_len);
            buf.advance(outer_len);
            Ok(Token::CData { content, outer })
        }
        None => Err(Error::MalformedStructure {
            what: "CDATA section",
            at: start_pos,
        }),
    }
}

// --- DOCTYPE ---

fn read_doctype<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    let keyword_len = 9; // "<!DOCTYPE"

    let mut i = skip_ws(buf, keyword_len)?;
    let name_start = i;
    i = scan_run_until(buf, i, |b| text::is_whitespace(b) || b == b'>' || b == b'[')?;
    if i == name_start {
        return Err(Error::MalformedStructure {
            what: "DOCTYPE (missing element name)",
            at: start_pos,
        });
    }
    let name_end = i;
    i = skip_ws(buf, i)?;

    let (mut type_start, mut type_end) = (i, i);
    let (mut public_start, mut public_end) = (i, i);
    let (mut system_start, mut system_end) = (i, i);

    if matches_ci_at(buf, i, b"PUBLIC")? {
        type_start = i;
        i += 6;
        type_end = i;
        i = skip_ws(buf, i)?;
        let (s, e, next) = scan_quoted(buf, i, start_pos)?;
        public_start = s;
        public_end = e;
        i = skip_ws(buf, next)?;
        if matches!(peek_byte(buf, i)?, Some(b'"') | Some(b'\'')) {
            let (s2, e2, next2) = scan_quoted(buf, i, start_pos)?;
            system_start = s2;
            system_end = e2;
            i = next2;
        }
    } else if matches_ci_at(buf, i, b"SYSTEM")? {
        type_start = i;
        i += 6;
        type_end = i;
        i = skip_ws(buf, i)?;
        let (s, e, next) = scan_quoted(buf, i, start_pos)?;
        system_start = s;
        system_end = e;
        i = next;
    }

    i = skip_ws(buf, i)?;

    let (mut subset_start, mut subset_end) = (i, i);
    if peek_byte(buf, i)? == Some(b'[') {
        i += 1;
        subset_start = i;
        let mut depth = 1u32;
        loop {
            match peek_byte(buf, i)? {
                Some(b'[') => {
                    depth += 1;
                    i += 1;
                }
                Some(b']') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    i += 1;
                }
                Some(_) => i += 1,
                None => {
                    return Err(Error::MalformedStructure {
                        what: "DOCTYPE internal subset",
                        at: start_pos,
                    })
                }
            }
        }
        subset_end = i;
        i += 1; // consume ']'
    }

    i = skip_ws(buf, i)?;
    if peek_byte(buf, i)? != Some(b'>') {
        return Err(Error::MalformedStructure {
            what: "DOCTYPE (missing terminating '>')",
            at: start_pos,
        });
    }
    let outer_len = i + 1;

    let window = buf.window();
    let mut cur = Cursor::new(start_pos);
    let keyword = cur.partition(window, 0, keyword_len);
    let element_name = cur.partition(window, name_start, name_end);
    let doctype_type = cur.partition(window, type_start, type_end);
    let public_id = cur.partition(window, public_start, public_end);
    let system_id = cur.partition(window, system_start, system_end);
    let internal_subset = cur.partition(window, subset_start, subset_end);
    let outer = outer_partition(start_pos, outer_len);

    buf.advance(outer_len);
    Ok(Token::DocType {
        keyword,
        element_name,
        doctype_type,
        public_id,
        system_id,
        internal_subset,
        outer,
    })
}

// --- XML declaration ---

fn read_xml_declaration<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    let keyword_len = 5; // "<?xml"
    let mut i = keyword_len;

    let mut version = (i, i);
    let mut encoding = (i, i);
    let mut standalone = (i, i);

    loop {
        i = skip_ws(buf, i)?;
        if matches_ci_at(buf, i, b"?>")? {
            i += 2;
            break;
        }
        let name_start = i;
        i = scan_run_until(buf, i, |b| text::is_whitespace(b) || b == b'=' || b == b'?')?;
        let name_end = i;
        if name_end == name_start {
            return Err(Error::MalformedStructure {
                what: "XML declaration",
                at: start_pos,
            });
        }
        i = skip_ws(buf, i)?;
        if peek_byte(buf, i)? != Some(b'=') {
            return Err(Error::MalformedStructure {
                what: "XML declaration (expected '=')",
                at: start_pos,
            });
        }
        i = skip_ws(buf, i + 1)?;
        let (val_start, val_end, next) = scan_quoted(buf, i, start_pos)?;
        i = next;

        let name_bytes = &buf.window()[name_start..name_end];
        if text::eq_ignore_ascii_case(name_bytes, b"version") {
            version = (val_start, val_end);
        } else if text::eq_ignore_ascii_case(name_bytes, b"encoding") {
            encoding = (val_start, val_end);
        } else if text::eq_ignore_ascii_case(name_bytes, b"standalone") {
            standalone = (val_start, val_end);
        }
    }
    let outer_len = i;

    // Partitions must be built in ascending-offset order for `Cursor`
    // regardless of which attributes were actually present in source order.
    let mut slots = [("version", version), ("encoding", encoding), ("standalone", standalone)];
    slots.sort_by_key(|(_, (s, _))| *s);

    let window = buf.window();
    let mut cur = Cursor::new(start_pos);
    let keyword = cur.partition(window, 0, keyword_len);
    let mut version_p = Partition::EMPTY;
    let mut encoding_p = Partition::EMPTY;
    let mut standalone_p = Partition::EMPTY;
    for (which, (s, e)) in slots.iter() {
        let p = cur.partition(window, *s, *e);
        match *which {
            "version" => version_p = p,
            "encoding" => encoding_p = p,
            "standalone" => standalone_p = p,
            _ => unreachable!(),
        }
    }
    let outer = outer_partition(start_pos, outer_len);

    buf.advance(outer_len);
    Ok(Token::XmlDeclaration {
        keyword,
        version: version_p,
        encoding: encoding_p,
        standalone: standalone_p,
        outer,
    })
}

// --- processing instruction ---

fn read_processing_instruction<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    let mut i = 2; // past "<?"
    let target_start = i;
    i = scan_run_until(buf, i, |b| text::is_whitespace(b) || b == b'?')?;
    let target_end = i;
    if target_end == target_start {
        return Err(Error::MalformedStructure {
            what: "processing instruction (missing target)",
            at: start_pos,
        });
    }
    i = skip_ws(buf, i)?;
    let content_start = i;
    let content_end;
    loop {
        if matches_ci_at(buf, i, b"?>")? {
            content_end = i;
            i += 2;
            break;
        }
        match peek_byte(buf, i)? {
            Some(_) => i += 1,
            None => {
                return Err(Error::MalformedStructure {
                    what: "processing instruction",
                    at: start_pos,
                })
            }
        }
    }
    let outer_len = i;

    let window = buf.window();
    let mut cur = Cursor::new(start_pos);
    let target = cur.partition(window, target_start, target_end);
    let content = cur.partition(window, content_start, content_end);
    let outer = outer_partition(start_pos, outer_len);

    buf.advance(outer_len);
    Ok(Token::ProcessingInstruction { target, content, outer })
}

// --- close tag ---

fn read_close_tag<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    let mut i = 2; // past "</"
    let name_start = i;
    i = scan_run_until(buf, i, |b| text::is_whitespace(b) || b == b'>')?;
    let name_end = i;
    if name_end == name_start {
        return Err(Error::MalformedStructure {
            what: "close tag (missing name)",
            at: start_pos,
        });
    }
    i = skip_ws(buf, i)?;
    if peek_byte(buf, i)? != Some(b'>') {
        return Err(Error::MalformedStructure {
            what: "close tag (missing '>')",
            at: start_pos,
        });
    }
    let outer_len = i + 1;

    let window = buf.window();
    let name = Cursor::new(start_pos).partition(window, name_start, name_end);
    let outer = outer_partition(start_pos, outer_len);

    buf.advance(outer_len);
    Ok(Token::CloseTag { name, outer })
}

// --- open / standalone tag, with attributes ---

enum RawTagPart {
    Whitespace(usize, usize),
    Attribute {
        name: (usize, usize),
        operator: (usize, usize),
        value_content: (usize, usize),
        value_outer: (usize, usize),
    },
}

fn read_tag<R: Read>(buf: &mut Buffer<R>) -> Result<Token> {
    let start_pos = buf.position();
    let mut i = 1; // past '<'
    let name_start = i;
    i = scan_run_until(buf, i, |b| text::is_whitespace(b) || b == b'/' || b == b'>')?;
    let name_end = i;
    if name_end == name_start {
        return Err(Error::MalformedStructure {
            what: "tag (missing name)",
            at: start_pos,
        });
    }

    let mut raw_parts = Vec::new();
    let mut self_closed = false;

    loop {
        let ws_start = i;
        i = skip_ws(buf, i)?;
        if i > ws_start {
            raw_parts.push(RawTagPart::Whitespace(ws_start, i));
        }

        match peek_byte(buf, i)? {
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') => {
                if matches_ci_at(buf, i, b"/>")? {
                    self_closed = true;
                    i += 2;
                    break;
                }
                // A stray '/' outside of a self-close: ignore it, the way
                // lenient HTML tokenizers skip unexpected solidus bytes.
                i += 1;
            }
            None => {
                return Err(Error::MalformedStructure {
                    what: "tag (missing '>')",
                    at: start_pos,
                })
            }
            Some(_) => {
                let attr_name_start = i;
                i = scan_run_until(buf, i, |b| {
                    text::is_whitespace(b) || b == b'=' || b == b'/' || b == b'>'
                })?;
                let attr_name_end = i;
                if attr_name_end == attr_name_start {
                    return Err(Error::MalformedStructure {
                        what: "tag (malformed attribute)",
                        at: start_pos,
                    });
                }

                let op_start = i;
                let ws_end = skip_ws(buf, i)?;
                if peek_byte(buf, ws_end)? == Some(b'=') {
                    i = skip_ws(buf, ws_end + 1)?;
                    let op_end = i;
                    let (value_content, value_outer) = match peek_byte(buf, i)? {
                        Some(b'"') | Some(b'\'') => {
                            let (vs, ve, next) = scan_quoted(buf, i, start_pos)?;
                            let outer = (i, next);
                            i = next;
                            ((vs, ve), outer)
                        }
                        _ => {
                            let unq_start = i;
                            i = scan_run_until(buf, i, |b| {
                                text::is_whitespace(b) || b == b'>' || b == b'/'
                            })?;
                            ((unq_start, i), (unq_start, i))
                        }
                    };
                    raw_parts.push(RawTagPart::Attribute {
                        name: (attr_name_start, attr_name_end),
                        operator: (op_start, op_end),
                        value_content,
                        value_outer,
                    });
                } else {
                    // No '=': the attribute has no value, and the whitespace
                    // we peeked past is left for the next loop iteration to
                    // report as ordinary inner whitespace.
                    raw_parts.push(RawTagPart::Attribute {
                        name: (attr_name_start, attr_name_end),
                        operator: (op_start, op_start),
                        value_content: (op_start, op_start),
                        value_outer: (op_start, op_start),
                    });
                }
            }
        }
    }
    let outer_len = i;

    let window = buf.window();
    let mut cur = Cursor::new(start_pos);
    let name = cur.partition(window, name_start, name_end);
    let mut parts = Vec::with_capacity(raw_parts.len());
    for rp in raw_parts {
        match rp {
            RawTagPart::Whitespace(s, e) => parts.push(TagPart::Whitespace {
                span: cur.partition(window, s, e),
            }),
            RawTagPart::Attribute {
                name: (ns, ne),
                operator: (os, oe),
                value_content: (vcs, vce),
                value_outer: (vos, voe),
            } => {
                let name = cur.partition(window, ns, ne);
                let operator = cur.partition(window, os, oe);
                let value_content = cur.partition(window, vcs, vce);
                let value_outer = cur.partition(window, vos, voe);
                parts.push(TagPart::Attribute {
                    name,
                    operator,
                    value_content,
                    value_outer,
                });
            }
        }
    }
    let outer = outer_partition(start_pos, outer_len);

    buf.advance(outer_len);
    Ok(Token::Tag(Tag {
        name,
        parts,
        self_closed,
        outer,
    }))
}
