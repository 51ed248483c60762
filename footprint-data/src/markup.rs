//! Classification and attribute tokenising for single tags.

use std::str::FromStr;

use footprint_core::ObjectKind;

use crate::error::MarkupError;

/// Closed set of element names the corpus grammar recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<?xml ...?>` or any other processing instruction.
    Prolog,
    /// The `osm` document root.
    Root,
    /// `bound` or `bounds`.
    Bound,
    /// `node`.
    Node,
    /// `way`.
    Way,
    /// `relation`.
    Relation,
    /// `changeset`.
    Changeset,
    /// A key/value `tag` child.
    Tag,
    /// A way node reference.
    Nd,
    /// A relation member.
    Member,
    /// Anything else, including comments and declarations.
    Unknown,
}

impl ElementKind {
    fn from_name(name: &str) -> Self {
        match name {
            "osm" | "osmChange" => Self::Root,
            "bound" | "bounds" => Self::Bound,
            "node" => Self::Node,
            "way" => Self::Way,
            "relation" => Self::Relation,
            "changeset" => Self::Changeset,
            "tag" => Self::Tag,
            "nd" => Self::Nd,
            "member" => Self::Member,
            _ => Self::Unknown,
        }
    }

    /// The object kind this element starts, if any.
    #[must_use]
    pub const fn object_kind(self) -> Option<ObjectKind> {
        match self {
            Self::Node => Some(ObjectKind::Node),
            Self::Way => Some(ObjectKind::Way),
            Self::Relation => Some(ObjectKind::Relation),
            Self::Changeset => Some(ObjectKind::Changeset),
            _ => None,
        }
    }
}

/// Whether a tag opens, closes, or opens-and-closes an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagForm {
    /// `<name ...>`
    Start,
    /// `<name .../>`
    SelfClosing,
    /// `</name>`
    End,
}

/// A classified tag. Attributes are tokenised on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markup<'a> {
    kind: ElementKind,
    form: TagForm,
    name: &'a str,
    body: &'a str,
}

impl<'a> Markup<'a> {
    /// Classify `text`, which must run from `<` to `>`.
    ///
    /// # Errors
    /// Returns [`MarkupError::MissingOpen`] when the text does not start with
    /// `<`, or [`MarkupError::MissingName`] for `<>` and `</>`.
    ///
    /// # Examples
    /// ```
    /// use footprint_data::markup::{ElementKind, Markup, TagForm};
    ///
    /// let markup = Markup::parse(r#"<nd ref="42"/>"#)?;
    /// assert_eq!(markup.kind(), ElementKind::Nd);
    /// assert_eq!(markup.form(), TagForm::SelfClosing);
    /// assert_eq!(markup.attributes()?.get("ref"), Some("42"));
    /// # Ok::<(), footprint_data::MarkupError>(())
    /// ```
    pub fn parse(text: &'a str) -> Result<Self, MarkupError> {
        let inner = text
            .strip_prefix('<')
            .ok_or(MarkupError::MissingOpen)?;
        let inner = inner.strip_suffix('>').unwrap_or(inner);

        if inner.starts_with('?') {
            return Ok(Self::opaque(ElementKind::Prolog, inner));
        }
        if inner.starts_with('!') {
            return Ok(Self::opaque(ElementKind::Unknown, inner));
        }

        let (form, rest) = if let Some(closing) = inner.strip_prefix('/') {
            (TagForm::End, closing)
        } else if let Some(open) = inner.strip_suffix('/') {
            (TagForm::SelfClosing, open)
        } else {
            (TagForm::Start, inner)
        };

        let rest = rest.trim_start();
        let name_len = rest
            .find(|ch: char| ch.is_whitespace() || ch == '/')
            .unwrap_or(rest.len());
        let (name, body) = rest.split_at(name_len);
        if name.is_empty() {
            return Err(MarkupError::MissingName);
        }
        Ok(Self {
            kind: ElementKind::from_name(name),
            form,
            name,
            body,
        })
    }

    const fn opaque(kind: ElementKind, inner: &'a str) -> Self {
        Self {
            kind,
            form: TagForm::SelfClosing,
            name: "",
            body: inner,
        }
    }

    /// Element classification.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Start, end or self-closing.
    #[must_use]
    pub const fn form(&self) -> TagForm {
        self.form
    }

    /// Raw element name; empty for prologs and declarations.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Tokenise the attribute list in one pass.
    ///
    /// # Errors
    /// Returns [`MarkupError::MalformedAttribute`] when the list is not a
    /// sequence of `name="value"` pairs.
    pub fn attributes(&self) -> Result<Attributes<'a>, MarkupError> {
        Attributes::tokenise(self.body)
    }
}

/// Attributes of one tag, in source order. Values are raw: no entity decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Attributes<'a> {
    fn tokenise(body: &'a str) -> Result<Self, MarkupError> {
        let mut pairs = Vec::new();
        let mut rest = body.trim_start();
        while !rest.is_empty() {
            let malformed = || MarkupError::MalformedAttribute {
                near: rest.chars().take(32).collect(),
            };
            let (name, after_name) = rest.split_once('=').ok_or_else(malformed)?;
            let name = name.trim_end();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(malformed());
            }
            let quoted = after_name
                .trim_start()
                .strip_prefix('"')
                .ok_or_else(malformed)?;
            let (value, after_value) = quoted.split_once('"').ok_or_else(malformed)?;
            pairs.push((name, value));
            rest = after_value.trim_start();
        }
        Ok(Self { pairs })
    }

    /// Value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Value of `name`, or [`MarkupError::MissingAttribute`].
    ///
    /// # Errors
    /// Fails when the attribute is absent.
    pub fn require(&self, name: &'static str) -> Result<&'a str, MarkupError> {
        self.get(name).ok_or(MarkupError::MissingAttribute { name })
    }

    /// Parse a required attribute.
    ///
    /// # Errors
    /// Fails when the attribute is absent or does not parse as `T`.
    pub fn parse<T: FromStr>(&self, name: &'static str) -> Result<T, MarkupError> {
        let raw = self.require(name)?;
        raw.trim().parse().map_err(|_| MarkupError::InvalidValue {
            name,
            value: raw.to_owned(),
        })
    }

    /// Parse an optional attribute.
    ///
    /// # Errors
    /// Fails when the attribute is present but does not parse as `T`.
    pub fn parse_optional<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, MarkupError> {
        if self.get(name).is_none() {
            return Ok(None);
        }
        self.parse(name).map(Some)
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the tag carried no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("<?xml version=\"1.0\"?>", ElementKind::Prolog, TagForm::SelfClosing)]
    #[case("<osm version=\"0.6\">", ElementKind::Root, TagForm::Start)]
    #[case("</osm>", ElementKind::Root, TagForm::End)]
    #[case("<bounds minlat=\"1\"/>", ElementKind::Bound, TagForm::SelfClosing)]
    #[case("<node id=\"1\">", ElementKind::Node, TagForm::Start)]
    #[case("<node id=\"1\"/>", ElementKind::Node, TagForm::SelfClosing)]
    #[case("</way>", ElementKind::Way, TagForm::End)]
    #[case("<changeset id=\"3\" />", ElementKind::Changeset, TagForm::SelfClosing)]
    #[case("<member type=\"way\" ref=\"1\" role=\"\"/>", ElementKind::Member, TagForm::SelfClosing)]
    #[case("<!-- note -->", ElementKind::Unknown, TagForm::SelfClosing)]
    #[case("<note>", ElementKind::Unknown, TagForm::Start)]
    fn tags_are_classified(
        #[case] text: &str,
        #[case] kind: ElementKind,
        #[case] form: TagForm,
    ) {
        let markup = Markup::parse(text).expect("parse");
        assert_eq!(markup.kind(), kind);
        assert_eq!(markup.form(), form);
    }

    #[rstest]
    fn attributes_keep_raw_values() {
        let markup = Markup::parse(r#"<tag k="a>b" v="fish &amp; chips"/>"#).expect("parse");
        let attributes = markup.attributes().expect("tokenise");
        assert_eq!(attributes.get("k"), Some("a>b"));
        assert_eq!(attributes.get("v"), Some("fish &amp; chips"));
        assert_eq!(attributes.len(), 2);
    }

    #[rstest]
    fn spacing_around_equals_is_tolerated() {
        let markup = Markup::parse(r#"<nd ref = "7" />"#).expect("parse");
        let attributes = markup.attributes().expect("tokenise");
        assert_eq!(attributes.parse::<i64>("ref"), Ok(7));
    }

    #[rstest]
    fn missing_attributes_are_explicit() {
        let markup = Markup::parse(r#"<node version="1">"#).expect("parse");
        let attributes = markup.attributes().expect("tokenise");
        assert_eq!(
            attributes.parse::<i64>("id"),
            Err(MarkupError::MissingAttribute { name: "id" })
        );
        assert_eq!(attributes.parse_optional::<f64>("lat"), Ok(None));
    }

    #[rstest]
    fn bad_numbers_are_rejected() {
        let markup = Markup::parse(r#"<node id="x1">"#).expect("parse");
        let attributes = markup.attributes().expect("tokenise");
        assert!(matches!(
            attributes.parse::<i64>("id"),
            Err(MarkupError::InvalidValue { name: "id", .. })
        ));
    }

    #[rstest]
    #[case(r#"<node id=1>"#)]
    #[case(r#"<node id="1>"#)]
    #[case(r#"<node flag>"#)]
    fn malformed_attribute_lists_are_rejected(#[case] text: &str) {
        let markup = Markup::parse(text).expect("parse");
        assert!(matches!(
            markup.attributes(),
            Err(MarkupError::MalformedAttribute { .. })
        ));
    }

    #[rstest]
    #[case("node id=\"1\">", MarkupError::MissingOpen)]
    #[case("<>", MarkupError::MissingName)]
    fn unusable_tags_are_rejected(#[case] text: &str, #[case] expected: MarkupError) {
        assert_eq!(Markup::parse(text), Err(expected));
    }
}
