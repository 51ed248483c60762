//! Builders for small corpora used by tests and documentation.
//!
//! [`CorpusBuilder`] writes markup in the layout of a standard export so
//! tests can describe a corpus object by object instead of hand-writing tags.
//!
//! # Example
//!
//! ```
//! use footprint_data::test_support::CorpusBuilder;
//!
//! let corpus = CorpusBuilder::new()
//!     .node(1, 10.0, 10.0)
//!     .way(10, &[1])
//!     .build();
//! assert!(corpus.contains(r#"<nd ref="1"/>"#));
//! ```

use footprint_core::MemberKind;

/// Incrementally assembled corpus text.
///
/// Dates and changesets apply to every object added after they are set.
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    body: String,
    date: String,
    changeset: i64,
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        Self {
            body: String::new(),
            date: "2010-01-01".to_owned(),
            changeset: 1,
        }
    }
}

impl CorpusBuilder {
    /// An empty corpus dated 2010-01-01 in changeset 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Date (`YYYY-MM-DD`) for subsequent objects.
    #[must_use]
    pub fn on(mut self, date: &str) -> Self {
        date.clone_into(&mut self.date);
        self
    }

    /// Changeset for subsequent objects.
    #[must_use]
    pub const fn in_changeset(mut self, changeset: i64) -> Self {
        self.changeset = changeset;
        self
    }

    fn meta(&self, id: i64, version: u64) -> String {
        format!(
            r#"id="{id}" version="{version}" timestamp="{}T00:00:00Z" changeset="{}" user="tester" uid="1""#,
            self.date, self.changeset
        )
    }

    fn line(&mut self, indent: &str, text: &str) {
        self.body.push_str(indent);
        self.body.push_str(text);
        self.body.push('\n');
    }

    /// A self-closing version-1 node.
    #[must_use]
    pub fn node(self, id: i64, lat: f64, lon: f64) -> Self {
        self.node_version(id, 1, lat, lon)
    }

    /// A self-closing node at a specific version.
    #[must_use]
    pub fn node_version(mut self, id: i64, version: u64, lat: f64, lon: f64) -> Self {
        let text = format!(r#"<node {} lat="{lat}" lon="{lon}"/>"#, self.meta(id, version));
        self.line("  ", &text);
        self
    }

    /// A node with one tag child.
    #[must_use]
    pub fn tagged_node(mut self, id: i64, lat: f64, lon: f64, key: &str, value: &str) -> Self {
        let text = format!(r#"<node {} lat="{lat}" lon="{lon}">"#, self.meta(id, 1));
        self.line("  ", &text);
        self.line("    ", &format!(r#"<tag k="{key}" v="{value}"/>"#));
        self.line("  ", "</node>");
        self
    }

    /// A way referencing `refs`.
    #[must_use]
    pub fn way(mut self, id: i64, refs: &[i64]) -> Self {
        let text = format!("<way {}>", self.meta(id, 1));
        self.line("  ", &text);
        for node_ref in refs {
            self.line("    ", &format!(r#"<nd ref="{node_ref}"/>"#));
        }
        self.line("  ", "</way>");
        self
    }

    /// A relation with typed members.
    #[must_use]
    pub fn relation(mut self, id: i64, members: &[(MemberKind, i64)]) -> Self {
        let text = format!("<relation {}>", self.meta(id, 1));
        self.line("  ", &text);
        for (kind, member) in members {
            let kind_name = match kind {
                MemberKind::Node => "node",
                MemberKind::Way => "way",
                MemberKind::Relation => "relation",
            };
            self.line(
                "    ",
                &format!(r#"<member type="{kind_name}" ref="{member}" role=""/>"#),
            );
        }
        self.line("  ", "</relation>");
        self
    }

    /// A changeset created on the current date.
    #[must_use]
    pub fn changeset(mut self, id: i64) -> Self {
        let text = format!(
            r#"<changeset id="{id}" created_at="{}T00:00:00Z" open="false" user="tester" uid="1"/>"#,
            self.date
        );
        self.line("  ", &text);
        self
    }

    /// Arbitrary markup, appended verbatim on its own line.
    #[must_use]
    pub fn raw(mut self, text: &str) -> Self {
        self.line("  ", text);
        self
    }

    /// Wrap the body in a prolog and document root.
    #[must_use]
    pub fn build(&self) -> String {
        let mut corpus = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        corpus.push_str("<osm version=\"0.6\" generator=\"test\">\n");
        corpus.push_str(r#"  <bounds minlat="-90" minlon="-180" maxlat="90" maxlon="180"/>"#);
        corpus.push('\n');
        corpus.push_str(&self.body);
        corpus.push_str("</osm>\n");
        corpus
    }
}
