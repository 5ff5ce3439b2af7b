//! The HTML element registry — a fixed, case-folded table of element
//! metadata consulted only when [`Dialect::Html`](crate::config::Dialect::Html)
//! is active.
//!
//! Implemented as plain `match` expressions over the lowercased name rather
//! than a generated perfect-hash table: a `match` on a short ASCII-lowercased
//! slice compiles to a comparably fast jump table without an extra
//! dependency.
//!
//! The optional-close rule table follows the HTML5 "optional tags" section
//! for the elements this crate's test scenarios exercise; it is not a
//! complete transcription of the HTML5 spec (see the open question recorded
//! in `DESIGN.md`).

/// Coarse layout category, used by handlers that want to make
/// block/inline-aware decisions without re-deriving it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCategory {
    Block,
    Inline,
}

/// Static metadata about one HTML element, as consulted by the
/// [auto-balancer](crate::stack).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub is_void: bool,
    pub is_raw_text: bool,
    pub is_escapable_raw_text: bool,
    pub category: ElementCategory,
    /// `true` if a literal `<![CDATA[` inside this element's content is
    /// ordinary text rather than a real CDATA section — true for every
    /// HTML element except the foreign-content islands (`svg`, `math`)
    /// where CDATA sections are recognized the XML way.
    pub cdata_restricted: bool,
}

impl ElementDescriptor {
    const XML_DEFAULT: ElementDescriptor = ElementDescriptor {
        is_void: false,
        is_raw_text: false,
        is_escapable_raw_text: false,
        category: ElementCategory::Inline,
        cdata_restricted: false,
    };

    /// The permissive default used for an element name the HTML table
    /// doesn't recognize, and as the "no current element" fallback at the
    /// top of an empty stack.
    const HTML_DEFAULT: ElementDescriptor = ElementDescriptor {
        is_void: false,
        is_raw_text: false,
        is_escapable_raw_text: false,
        category: ElementCategory::Inline,
        cdata_restricted: true,
    };
}

/// Lowercases `name` into a small stack buffer for table lookups, falling
/// back to identity for names too long to matter (real HTML tag names are a
/// handful of bytes).
fn lower<'a>(name: &[u8], scratch: &'a mut [u8; 32]) -> &'a [u8] {
    let n = name.len().min(scratch.len());
    for i in 0..n {
        scratch[i] = name[i].to_ascii_lowercase();
    }
    &scratch[..n]
}

/// Looks up the element descriptor for `name` under the HTML dialect.
/// Unknown elements get a permissive default (no void/raw-text behavior, so
/// they're treated like an ordinary container).
pub fn lookup(name: &[u8]) -> ElementDescriptor {
    let mut scratch = [0u8; 32];
    let lowered = lower(name, &mut scratch);
    match lowered {
        b"area" | b"base" | b"br" | b"col" | b"embed" | b"hr" | b"img" | b"input" | b"link"
        | b"meta" | b"param" | b"source" | b"track" | b"wbr" => ElementDescriptor {
            is_void: true,
            is_raw_text: false,
            is_escapable_raw_text: false,
            category: ElementCategory::Inline,
            cdata_restricted: true,
        },

        b"script" | b"style" => ElementDescriptor {
            is_void: false,
            is_raw_text: true,
            is_escapable_raw_text: false,
            category: ElementCategory::Block,
            cdata_restricted: true,
        },

        b"textarea" | b"title" => ElementDescriptor {
            is_void: false,
            is_raw_text: false,
            is_escapable_raw_text: true,
            category: ElementCategory::Inline,
            cdata_restricted: true,
        },

        // Foreign-content islands: CDATA sections are recognized here the
        // XML way, same as in a real HTML5 parser's "foreign content" mode.
        b"svg" | b"math" => ElementDescriptor {
            is_void: false,
            is_raw_text: false,
            is_escapable_raw_text: false,
            category: ElementCategory::Inline,
            cdata_restricted: false,
        },

        b"address" | b"article" | b"aside" | b"blockquote" | b"caption" | b"colgroup"
        | b"dd" | b"details" | b"div" | b"dl" | b"dt" | b"fieldset" | b"figcaption"
        | b"figure" | b"footer" | b"form" | b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6"
        | b"header" | b"hgroup" | b"li" | b"main" | b"nav" | b"ol" | b"optgroup" | b"option"
        | b"p" | b"section" | b"table" | b"tbody" | b"td" | b"tfoot" | b"th" | b"thead"
        | b"tr" | b"ul" => ElementDescriptor {
            is_void: false,
            is_raw_text: false,
            is_escapable_raw_text: false,
            category: ElementCategory::Block,
            cdata_restricted: true,
        },

        _ => ElementDescriptor::HTML_DEFAULT,
    }
}

/// Returns the descriptor to use for `name` given the active dialect: the
/// HTML table when `html` is true, or the uniform XML default (no voids, no
/// implicit closes, no raw-text bodies) otherwise.
pub fn lookup_for_dialect(name: &[u8], html: bool) -> ElementDescriptor {
    if html {
        lookup(name)
    } else {
        ElementDescriptor::XML_DEFAULT
    }
}

/// Whether a literal `<![CDATA[` should be recognized as a real CDATA
/// section given the innermost currently-open element (`None` at the
/// document's top level). XML never restricts it; HTML restricts it
/// everywhere except inside a foreign-content island (`svg`/`math`).
pub fn cdata_allowed(stack_top: Option<&[u8]>, html: bool) -> bool {
    if !html {
        return true;
    }
    match stack_top {
        Some(name) => !lookup(name).cdata_restricted,
        None => false,
    }
}

/// Pure function `(incomingName, stackTopName) -> shouldImplicitlyClose`,
/// exactly the shape the design notes ask for: no lookahead beyond the
/// incoming name and the current stack top.
///
/// Encodes a subset of the HTML5 "optional tags" rules:
/// - a new `li` closes an open `li`
/// - a new `dt`/`dd` closes an open `dt` or `dd`
/// - `address`, `article`, ..., `table`, `ul`, `ol`, and other block starters
///   close an open `p`
/// - a new `tr` closes an open `tr`, `td`, or `th`
/// - a new `td`/`th` closes an open `td` or `th`
/// - a new `thead`/`tbody`/`tfoot` closes an open `tbody`/`tfoot`
/// - a new `option` closes an open `option`; a new `optgroup` closes an open
///   `optgroup` or `option`
/// - a new `colgroup` closes an open `colgroup`
/// - a new `caption` has no special closing rule beyond the table boundary
pub fn implicitly_closes(incoming: &[u8], top: &[u8]) -> bool {
    let mut si = [0u8; 32];
    let mut st = [0u8; 32];
    let incoming = lower(incoming, &mut si);
    let top = lower(top, &mut st);

    match (incoming, top) {
        (b"li", b"li") => true,
        (b"dt", b"dt") | (b"dt", b"dd") | (b"dd", b"dt") | (b"dd", b"dd") => true,
        (b"option", b"option") => true,
        (b"optgroup", b"optgroup") | (b"optgroup", b"option") => true,
        (b"tr", b"tr") | (b"tr", b"td") | (b"tr", b"th") => true,
        (b"td", b"td") | (b"td", b"th") | (b"th", b"td") | (b"th", b"th") => true,
        (b"thead", b"tbody") | (b"thead", b"tfoot") => true,
        (b"tbody", b"tbody") | (b"tbody", b"thead") | (b"tbody", b"tfoot") => true,
        (b"tfoot", b"tbody") | (b"tfoot", b"thead") | (b"tfoot", b"tfoot") => true,
        (b"colgroup", b"colgroup") => true,
        (
            b"address" | b"article" | b"aside" | b"blockquote" | b"details" | b"div" | b"dl"
            | b"fieldset" | b"figcaption" | b"figure" | b"footer" | b"form" | b"h1" | b"h2"
            | b"h3" | b"h4" | b"h5" | b"h6" | b"header" | b"main" | b"nav" | b"ol"
            | b"p" | b"section" | b"table" | b"ul",
            b"p",
        ) => true,
        // `hr` is deliberately absent here: it's void, so the open-tag dispatch
        // never reaches the implicit-close check for it (see DESIGN.md).
        _ => false,
    }
}
