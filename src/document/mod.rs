//! Typed access to parsed HTML pages.
//!
//! The board code never touches the parser directly. It queries pages
//! through [`Document`] and [`Element`], which are implemented once on top of
//! `scraper` by [`HtmlDocument`]. Tests may provide their own implementations.

use scraper::{ElementRef, Html, Selector};

use crate::error::{BoardError, Result};

/// A parsed page that can be queried with CSS selectors.
pub trait Document {
    /// All elements matching `selector`, in document order.
    fn select(&self, selector: &str) -> Result<Vec<Box<dyn Element + '_>>>;

    /// First element matching `selector`, if any.
    fn select_first(&self, selector: &str) -> Result<Option<Box<dyn Element + '_>>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    /// First element matching `selector`; absence is a malformed page.
    fn select_required(&self, selector: &str) -> Result<Box<dyn Element + '_>> {
        self.select_first(selector)?
            .ok_or_else(|| BoardError::malformed(format!("missing element `{selector}`")))
    }
}

/// One element of a parsed page.
pub trait Element {
    fn attr(&self, name: &str) -> Option<String>;
    fn has_class(&self, class: &str) -> bool;
    /// Concatenated text of all descendant text nodes.
    fn text(&self) -> String;
    fn inner_html(&self) -> String;
    fn first_element_child(&self) -> Option<Box<dyn Element + '_>>;
    fn select(&self, selector: &str) -> Result<Vec<Box<dyn Element + '_>>>;

    fn select_first(&self, selector: &str) -> Result<Option<Box<dyn Element + '_>>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    fn select_required(&self, selector: &str) -> Result<Box<dyn Element + '_>> {
        self.select_first(selector)?
            .ok_or_else(|| BoardError::malformed(format!("missing element `{selector}`")))
    }

    /// Attribute value; absence is a malformed page.
    fn attr_required(&self, name: &str) -> Result<String> {
        self.attr(name)
            .ok_or_else(|| BoardError::malformed(format!("missing attribute `{name}`")))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| BoardError::malformed(format!("bad selector `{selector}`: {e:?}")))
}

/// An HTML page parsed with `scraper`.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        HtmlDocument { html: Html::parse_document(source) }
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument").finish_non_exhaustive()
    }
}

impl Document for HtmlDocument {
    fn select(&self, selector: &str) -> Result<Vec<Box<dyn Element + '_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html
            .select(&sel)
            .map(|el| Box::new(HtmlElement(el)) as Box<dyn Element + '_>)
            .collect())
    }
}

struct HtmlElement<'a>(ElementRef<'a>);

impl<'a> Element for HtmlElement<'a> {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.value().classes().any(|c| c == class)
    }

    fn text(&self) -> String {
        self.0.text().collect()
    }

    fn inner_html(&self) -> String {
        self.0.inner_html()
    }

    fn first_element_child(&self) -> Option<Box<dyn Element + '_>> {
        self.0
            .children()
            .find_map(ElementRef::wrap)
            .map(|el| Box::new(HtmlElement(el)) as Box<dyn Element + '_>)
    }

    fn select(&self, selector: &str) -> Result<Vec<Box<dyn Element + '_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.0
            .select(&sel)
            .map(|el| Box::new(HtmlElement(el)) as Box<dyn Element + '_>)
            .collect())
    }
}
