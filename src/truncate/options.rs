//! Truncation options and the expand control template.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex_lite::Regex;

use crate::dom::{ArenaDom, ArenaNodeId, parse_fragment};
use crate::error::{Error, Result};

/// Default boundary pattern: sentence and clause punctuation, kept at the
/// end of the chunk it closes.
pub const DEFAULT_BOUNDARY: &str = r"(\.|,|-|–|\?|!)";

/// Default expand control markup.
pub const DEFAULT_TEMPLATE_HTML: &str = r#"<a href="" class="read-more">Read more</a>"#;

/// Default marker class.
pub const DEFAULT_MARKER_CLASS: &str = "hideme";

/// Tags whose descendants are left whole by default.
pub const DEFAULT_IGNORE_CHILDREN: &[&str] = &["a", "i", "strong", "h1", "h2", "h3"];

static DEFAULT_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_BOUNDARY).unwrap());

static DEFAULT_TEMPLATE: LazyLock<Template> =
    LazyLock::new(|| Template::parse(DEFAULT_TEMPLATE_HTML).unwrap());

/// A detached node cloned into the document for every expand control.
#[derive(Clone)]
pub struct Template {
    dom: Arc<ArenaDom>,
    root: ArenaNodeId,
}

impl Template {
    /// Parse a template from HTML. The first element of the fragment is used.
    pub fn parse(html: &str) -> Result<Self> {
        let (dom, nodes) = parse_fragment(html);
        let root = nodes
            .into_iter()
            .find(|&n| dom.is_element(n))
            .ok_or_else(|| Error::InvalidTemplate(format!("no element in {html:?}")))?;
        Ok(Self {
            dom: Arc::new(dom),
            root,
        })
    }

    /// Copy the template into `dom`, returning the unattached clone.
    pub fn instantiate(&self, dom: &mut ArenaDom) -> ArenaNodeId {
        dom.import_subtree(&self.dom, self.root)
    }

    /// Tag name of the template's root element.
    pub fn tag(&self) -> &str {
        self.dom
            .element_name(self.root)
            .map(|n| n.as_ref())
            .unwrap_or_default()
    }

    /// Text of the template (its label).
    pub fn label(&self) -> String {
        self.dom.text_of(self.root)
    }
}

impl Default for Template {
    fn default() -> Self {
        DEFAULT_TEMPLATE.clone()
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("html", &crate::dom::serialize(&self.dom, self.root))
            .finish()
    }
}

/// Truncation configuration, shared read-only across roots.
#[derive(Debug, Clone)]
pub struct Options {
    /// Stop hiding once the container is at most this tall.
    pub min_height: f32,
    /// Hide while the container is taller than this.
    pub max_height: f32,
    /// Class applied to every independently hideable element.
    pub marker_class: String,
    /// Tags whose descendants are never split or marked individually.
    pub ignore_children: HashSet<String>,
    /// Tags kept whole; an element directly containing one is kept whole too.
    pub protected_tags: HashSet<String>,
    /// Split rule; capture group 1 is retained at the end of each chunk.
    pub boundary: Regex,
    /// Markup of the "Read more" control.
    pub expand_template: Template,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_height: 50.0,
            max_height: 200.0,
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            ignore_children: tag_set(DEFAULT_IGNORE_CHILDREN.iter().copied()),
            protected_tags: HashSet::new(),
            boundary: DEFAULT_BOUNDARY_RE.clone(),
            expand_template: Template::default(),
        }
    }
}

fn tag_set<'a>(tags: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    tags.into_iter().map(|t| t.trim().to_ascii_lowercase()).collect()
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heights(mut self, min_height: f32, max_height: f32) -> Self {
        self.min_height = min_height;
        self.max_height = max_height;
        self
    }

    pub fn with_min_height(mut self, min_height: f32) -> Self {
        self.min_height = min_height;
        self
    }

    pub fn with_max_height(mut self, max_height: f32) -> Self {
        self.max_height = max_height;
        self
    }

    pub fn with_marker_class(mut self, class: impl Into<String>) -> Self {
        self.marker_class = class.into();
        self
    }

    pub fn with_ignore_children<'a>(mut self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        self.ignore_children = tag_set(tags);
        self
    }

    pub fn with_protected_tags<'a>(mut self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        self.protected_tags = tag_set(tags);
        self
    }

    pub fn with_boundary(mut self, boundary: Regex) -> Self {
        self.boundary = boundary;
        self
    }

    /// Compile and set the boundary pattern.
    pub fn with_boundary_pattern(self, pattern: &str) -> Result<Self> {
        Ok(self.with_boundary(Regex::new(pattern)?))
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.expand_template = template;
        self
    }

    /// Parse and set the expand control template.
    pub fn with_template_html(self, html: &str) -> Result<Self> {
        Ok(self.with_template(Template::parse(html)?))
    }

    /// Reject configurations the hider cannot interpret.
    ///
    /// The pipeline itself accepts anything; this is for configuration
    /// surfaces (config files, the CLI) that should fail loudly.
    pub fn validate(&self) -> Result<()> {
        if !self.min_height.is_finite() || !self.max_height.is_finite() {
            return Err(Error::InvalidConfig("heights must be finite".into()));
        }
        if self.min_height > self.max_height {
            return Err(Error::InvalidConfig(format!(
                "min_height ({}) exceeds max_height ({})",
                self.min_height, self.max_height
            )));
        }
        if self.marker_class.trim().is_empty() || self.marker_class.contains(char::is_whitespace) {
            return Err(Error::InvalidConfig(format!(
                "marker class {:?} must be a single class name",
                self.marker_class
            )));
        }
        if self.boundary.captures_len() < 2 {
            log::warn!(
                "boundary pattern {:?} has no capture group; whole matches are kept as delimiters",
                self.boundary.as_str()
            );
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod file {
    use std::path::Path;

    use serde::Deserialize;

    use super::{Options, Template};
    use crate::error::Result;

    /// Options as written in a JSON config file. Every field is optional.
    ///
    /// ```json
    /// {
    ///   "min_height": 50,
    ///   "max_height": 200,
    ///   "marker_class": "hideme",
    ///   "ignore_children": ["a", "i", "strong", "h1", "h2", "h3"],
    ///   "protected_tags": ["h1", "h2"],
    ///   "boundary": "(\\.|,|-|–|\\?|!)",
    ///   "expand_template": "<a href=\"\" class=\"read-more\">Read more</a>"
    /// }
    /// ```
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub struct OptionsFile {
        pub min_height: Option<f32>,
        pub max_height: Option<f32>,
        pub marker_class: Option<String>,
        pub ignore_children: Option<Vec<String>>,
        pub protected_tags: Option<Vec<String>>,
        pub boundary: Option<String>,
        pub expand_template: Option<String>,
    }

    impl OptionsFile {
        pub fn from_json(json: &str) -> Result<Self> {
            Ok(serde_json::from_str(json)?)
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let json = std::fs::read_to_string(path)?;
            Self::from_json(&json)
        }

        /// Overlay the file onto the defaults and validate the result.
        pub fn into_options(self) -> Result<Options> {
            let mut options = Options::default();
            if let Some(min) = self.min_height {
                options.min_height = min;
            }
            if let Some(max) = self.max_height {
                options.max_height = max;
            }
            if let Some(class) = self.marker_class {
                options.marker_class = class;
            }
            if let Some(tags) = &self.ignore_children {
                options = options.with_ignore_children(tags.iter().map(String::as_str));
            }
            if let Some(tags) = &self.protected_tags {
                options = options.with_protected_tags(tags.iter().map(String::as_str));
            }
            if let Some(pattern) = &self.boundary {
                options = options.with_boundary_pattern(pattern)?;
            }
            if let Some(html) = &self.expand_template {
                options = options.with_template(Template::parse(html)?);
            }
            options.validate()?;
            Ok(options)
        }
    }
}

#[cfg(feature = "serde")]
pub use file::OptionsFile;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.min_height, 50.0);
        assert_eq!(options.max_height, 200.0);
        assert_eq!(options.marker_class, "hideme");
        assert!(options.ignore_children.contains("strong"));
        assert!(options.protected_tags.is_empty());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_default_template() {
        let template = Template::default();
        assert_eq!(template.tag(), "a");
        assert_eq!(template.label(), "Read more");
    }

    #[test]
    fn test_template_without_element() {
        assert!(matches!(
            Template::parse("just text"),
            Err(Error::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_tags_are_normalized() {
        let options = Options::new().with_protected_tags([" H1", "h2"]);
        assert!(options.protected_tags.contains("h1"));
        assert!(options.protected_tags.contains("h2"));
    }

    #[test]
    fn test_validate_rejects_inverted_heights() {
        let options = Options::new().with_heights(300.0, 100.0);
        assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_marker() {
        let options = Options::new().with_marker_class("two words");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        let result = Options::new().with_boundary_pattern("(unclosed");
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_file_overlays_defaults() {
        let file = OptionsFile::from_json(
            r#"{"max_height": 120, "protected_tags": ["h1"], "boundary": "(\\.)"}"#,
        )
        .unwrap();
        let options = file.into_options().unwrap();
        assert_eq!(options.min_height, 50.0);
        assert_eq!(options.max_height, 120.0);
        assert!(options.protected_tags.contains("h1"));
        assert_eq!(options.boundary.as_str(), r"(\.)");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_file_rejects_unknown_fields() {
        assert!(matches!(
            OptionsFile::from_json(r#"{"maxheight": 120}"#),
            Err(Error::Json(_))
        ));
    }
}
