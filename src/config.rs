//! Parse configuration — dialect switches and strict/lenient policy.
//!
//! A plain data struct plus an independent builder with chained setters.

/// Markup dialect the parser should recognize structure for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// HTML5-flavored parsing: void elements, raw-text elements, optional
    /// close tags, auto-balancing.
    Html,
    /// Strict XML: no implicit closes, no void elements, no raw-text bodies.
    Xml,
}

/// How aggressively the parser repairs unbalanced element structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementBalancing {
    /// No auto-balancing: unmatched closes are reported as-is.
    None,
    /// The stack must already balance; imbalance is a [`crate::errors::Error`].
    Required,
    /// The auto-balancer may synthesize opens and closes.
    AutoOpenAndClose,
}

/// Whether duplicate attribute names within one element are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUniqueness {
    Require,
    Allow,
}

/// Presence policy for an optional structure (prolog, XML declaration,
/// DOCTYPE, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Allowed,
    Forbidden,
}

/// Presence policy specific to the document's single root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootElementPresence {
    Required,
    DependsOnPrologDoctype,
}

/// All recognized configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    pub dialect: Dialect,
    pub case_sensitive: bool,
    pub element_balancing: ElementBalancing,
    pub unique_attributes_in_element: AttributeUniqueness,
    pub prolog_presence: Presence,
    pub xml_declaration_presence: Presence,
    pub doctype_presence: Presence,
    pub unique_root_element_presence: RootElementPresence,
    pub no_unmatched_close_elements_required: bool,
}

impl ParseConfig {
    /// Lenient HTML defaults: case-insensitive names, auto-balancing on,
    /// everything else optional.
    pub fn html() -> Self {
        ParseConfig {
            dialect: Dialect::Html,
            case_sensitive: false,
            element_balancing: ElementBalancing::AutoOpenAndClose,
            unique_attributes_in_element: AttributeUniqueness::Allow,
            prolog_presence: Presence::Allowed,
            xml_declaration_presence: Presence::Allowed,
            doctype_presence: Presence::Allowed,
            unique_root_element_presence: RootElementPresence::DependsOnPrologDoctype,
            no_unmatched_close_elements_required: false,
        }
    }

    /// Strict XML defaults: case-sensitive names, no auto-balancing,
    /// duplicate attributes and unmatched closes are errors.
    pub fn xml() -> Self {
        ParseConfig {
            dialect: Dialect::Xml,
            case_sensitive: true,
            element_balancing: ElementBalancing::Required,
            unique_attributes_in_element: AttributeUniqueness::Require,
            prolog_presence: Presence::Allowed,
            xml_declaration_presence: Presence::Allowed,
            doctype_presence: Presence::Allowed,
            unique_root_element_presence: RootElementPresence::Required,
            no_unmatched_close_elements_required: true,
        }
    }

    #[inline]
    pub fn is_html(&self) -> bool {
        self.dialect == Dialect::Html
    }

    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder::new(ParseConfig::html())
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig::html()
    }
}

/// Builder for [`ParseConfig`], with chained setters ending in [`build`](ParseConfigBuilder::build).
#[derive(Debug, Clone)]
pub struct ParseConfigBuilder {
    inner: ParseConfig,
}

impl ParseConfigBuilder {
    fn new(base: ParseConfig) -> Self {
        Self { inner: base }
    }

    /// Starts from the XML defaults instead of the HTML defaults.
    pub fn xml(mut self) -> Self {
        self.inner = ParseConfig::xml();
        self
    }

    /// Starts from the HTML defaults.
    pub fn html(mut self) -> Self {
        self.inner = ParseConfig::html();
        self
    }

    pub fn case_sensitive(mut self, val: bool) -> Self {
        self.inner.case_sensitive = val;
        self
    }

    pub fn element_balancing(mut self, val: ElementBalancing) -> Self {
        self.inner.element_balancing = val;
        self
    }

    pub fn unique_attributes_in_element(mut self, val: AttributeUniqueness) -> Self {
        self.inner.unique_attributes_in_element = val;
        self
    }

    pub fn prolog_presence(mut self, val: Presence) -> Self {
        self.inner.prolog_presence = val;
        self
    }

    pub fn xml_declaration_presence(mut self, val: Presence) -> Self {
        self.inner.xml_declaration_presence = val;
        self
    }

    pub fn doctype_presence(mut self, val: Presence) -> Self {
        self.inner.doctype_presence = val;
        self
    }

    pub fn unique_root_element_presence(mut self, val: RootElementPresence) -> Self {
        self.inner.unique_root_element_presence = val;
        self
    }

    pub fn no_unmatched_close_elements_required(mut self, val: bool) -> Self {
        self.inner.no_unmatched_close_elements_required = val;
        self
    }

    pub fn build(self) -> ParseConfig {
        self.inner
    }
}
