//! Command output
//!
//! Every command produces one [`Report`], printed as text or as JSON.

use anyhow::Result;
use isc_core::ReindexSummary;
use isc_index::{Drift, DriftKind, ImagePosts, PostImages};
use isc_meta::{ContentId, ImageId};
use serde::Serialize;
use std::io::Write;

/// One forward index entry
#[derive(Debug, Clone, Serialize)]
pub struct PostRelation {
    /// Content item
    pub content: ContentId,
    /// Images it embeds
    pub images: PostImages,
}

/// One reverse index entry
#[derive(Debug, Clone, Serialize)]
pub struct ImageRelation {
    /// Image
    pub image: ImageId,
    /// Content items embedding it
    pub contents: ImagePosts,
}

/// Result of one command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", content = "result", rename_all = "kebab-case")]
pub enum Report {
    /// `reindex`
    Reindex(ReindexSummary),
    /// `missing`
    Missing {
        /// Initialized but empty sources
        missing: Vec<ImageId>,
        /// Never initialized
        unused: Vec<ImageId>,
    },
    /// `relations --direction posts`
    PostRelations(Vec<PostRelation>),
    /// `relations --direction images`
    ImageRelations(Vec<ImageRelation>),
    /// `clear-index`
    Cleared {
        /// Index entries removed
        removed: usize,
    },
    /// `verify`
    Verify(Vec<Drift>),
    /// `init-fields`
    InitFields {
        /// Assets that received default fields
        assets: usize,
    },
}

impl Report {
    /// Print as JSON or text
    ///
    /// # Errors
    /// Returns error if encoding or the write fails
    pub fn write_to(&self, out: &mut impl Write, json: bool) -> Result<()> {
        if json {
            serde_json::to_writer_pretty(&mut *out, self)?;
            writeln!(out)?;
        } else {
            out.write_all(self.to_text().as_bytes())?;
        }
        Ok(())
    }

    /// Human-readable rendering
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        match self {
            Self::Reindex(summary) => {
                lines.push(format!("Indexed: {}", summary.indexed));
                lines.push(format!("Skipped: {}", summary.skipped));
                lines.push(format!("Image references: {}", summary.images));
                lines.push(format!("Healed: {}", summary.healed));
                if !summary.unclean.is_empty() {
                    lines.push(format!("With failed writes: {}", join(&summary.unclean)));
                }
            }
            Self::Missing { missing, unused } => {
                lines.push(format!("Images without source ({}): {}", missing.len(), join(missing)));
                lines.push(format!("Images never initialized ({}): {}", unused.len(), join(unused)));
            }
            Self::PostRelations(relations) => {
                if relations.is_empty() {
                    lines.push("No indexed posts".to_string());
                }
                for relation in relations {
                    lines.push(format!("Post {}:", relation.content));
                    for (image, reference) in relation.images.iter() {
                        let marker = if reference.thumbnail { " (thumbnail)" } else { "" };
                        lines.push(format!("  {} {}{}", image, reference.src, marker));
                    }
                }
            }
            Self::ImageRelations(relations) => {
                if relations.is_empty() {
                    lines.push("No indexed images".to_string());
                }
                for relation in relations {
                    let contents: Vec<_> = relation.contents.iter().collect();
                    lines.push(format!("Image {}: {}", relation.image, join(&contents)));
                }
            }
            Self::Cleared { removed } => lines.push(format!("Removed {removed} index entries")),
            Self::Verify(drift) => {
                if drift.is_empty() {
                    lines.push("Indexes are consistent".to_string());
                }
                for d in drift {
                    let missing = match d.kind {
                        DriftKind::MissingReverse => "reverse",
                        DriftKind::MissingForward => "forward",
                    };
                    lines.push(format!("Post {} / image {}: missing from {} index", d.content, d.image, missing));
                }
            }
            Self::InitFields { assets } => {
                lines.push(format!("Initialized attribution fields on {assets} images"));
            }
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Check if the report describes a problem the exit code should reflect
    #[must_use]
    pub fn has_failures(&self) -> bool {
        match self {
            Self::Reindex(summary) => !summary.unclean.is_empty(),
            Self::Verify(drift) => !drift.is_empty(),
            _ => false,
        }
    }
}

fn join<T: std::fmt::Display>(ids: &[T]) -> String {
    if ids.is_empty() {
        return "none".into();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_text() {
        let report = Report::Missing {
            missing: vec![ImageId::new(3), ImageId::new(4)],
            unused: vec![],
        };
        assert_eq!(
            report.to_text(),
            "Images without source (2): 3, 4\nImages never initialized (0): none\n"
        );
    }

    #[test]
    fn reindex_text_lists_unclean() {
        let report = Report::Reindex(ReindexSummary {
            indexed: 2,
            skipped: 1,
            images: 3,
            healed: 0,
            unclean: vec![ContentId::new(7)],
        });
        assert_eq!(
            report.to_text(),
            "Indexed: 2\nSkipped: 1\nImage references: 3\nHealed: 0\nWith failed writes: 7\n"
        );
        assert_eq!(Report::PostRelations(vec![]).to_text(), "No indexed posts\n");
    }

    #[test]
    fn json_is_tagged() {
        let mut out = Vec::new();
        Report::Cleared { removed: 2 }.write_to(&mut out, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!({"command": "cleared", "result": {"removed": 2}}));
    }

    #[test]
    fn drift_fails() {
        let report = Report::Verify(vec![Drift {
            content: ContentId::new(1),
            image: ImageId::new(2),
            kind: DriftKind::MissingForward,
        }]);
        assert!(report.has_failures());
        assert_eq!(report.to_text(), "Post 1 / image 2: missing from forward index\n");
    }
}
