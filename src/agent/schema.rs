//! Extraction output contracts.
//!
//! Two contracts are supported and selected by configuration: a free-form
//! labelled outline, and a strict JSON object with four fixed sections. The
//! JSON contract is modelled by [`TenderExtraction`], which always carries
//! every declared field.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Sentinel for a field no chunk supplied.
pub const NOT_MENTIONED: &str = "Not mentioned";

/// Values the model uses to say a field is absent.
const ABSENT_VALUES: [&str; 6] = [
    "not mentioned",
    "not found",
    "not specified",
    "not available",
    "n/a",
    "na",
];

/// Which output contract extraction runs use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractionSchema {
    /// Labelled free-text outline.
    Outline,
    /// Strict JSON object with four fixed sections.
    #[default]
    Json,
}

impl ExtractionSchema {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ExtractionSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared field: JSON key and human label.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// snake_case JSON key.
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
}

/// A declared section and its fields.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    /// snake_case JSON key.
    pub key: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Declared fields in display order.
    pub fields: &'static [FieldSpec],
}

const fn field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label }
}

/// The four sections of the JSON contract, in display order.
pub const TENDER_SECTIONS: [SectionSpec; 4] = [
    SectionSpec {
        key: "basic_information",
        title: "Basic Information",
        fields: &[
            field("tender_number_reference", "Tender Number/Reference"),
            field("name_of_work_project", "Name of Work/Project"),
            field(
                "issuing_department_organization",
                "Issuing Department/Organization",
            ),
        ],
    },
    SectionSpec {
        key: "financial_details",
        title: "Financial Details",
        fields: &[
            field("estimated_contract_value", "Estimated Contract Value"),
            field("emd_earnest_money_deposit", "EMD (Earnest Money Deposit)"),
            field("emd_exemption_if_any", "EMD Exemption (if any)"),
            field("performance_security", "Performance Security"),
        ],
    },
    SectionSpec {
        key: "timeline",
        title: "Timeline",
        fields: &[
            field("bid_submission_deadline", "Bid Submission Deadline"),
            field("technical_bid_opening", "Technical Bid Opening"),
            field("contract_duration", "Contract Duration"),
        ],
    },
    SectionSpec {
        key: "requirements",
        title: "Requirements",
        fields: &[
            field("key_eligibility_criteria", "Key Eligibility Criteria"),
            field("required_documents", "Required Documents"),
            field(
                "technical_specifications_brief",
                "Technical Specifications (Brief)",
            ),
            field("payment_terms", "Payment Terms"),
        ],
    },
];

/// Returns `true` if `value` means "absent".
#[must_use]
pub fn is_absent(value: &str) -> bool {
    let v = value.trim().trim_end_matches('.').trim();
    v.is_empty() || ABSENT_VALUES.iter().any(|a| v.eq_ignore_ascii_case(a))
}

/// Structured result of the JSON contract.
///
/// Holds one value per declared field, in [`TENDER_SECTIONS`] order. A
/// field no source supplied holds [`NOT_MENTIONED`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderExtraction {
    values: Vec<Vec<String>>,
}

impl Default for TenderExtraction {
    fn default() -> Self {
        Self {
            values: TENDER_SECTIONS
                .iter()
                .map(|s| vec![NOT_MENTIONED.to_string(); s.fields.len()])
                .collect(),
        }
    }
}

impl TenderExtraction {
    /// Reads a parsed JSON value defensively.
    ///
    /// A missing or non-object section counts as empty; a missing field or
    /// an absent-meaning value becomes [`NOT_MENTIONED`]. Non-string values
    /// are rendered to text (arrays become `- item` bullet lines).
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut out = Self::default();
        for (si, section) in TENDER_SECTIONS.iter().enumerate() {
            let Some(obj) = value.get(section.key).and_then(Value::as_object) else {
                continue;
            };
            for (fi, spec) in section.fields.iter().enumerate() {
                if let Some(text) = obj.get(spec.key).map(render_value)
                    && !is_absent(&text)
                {
                    out.values[si][fi] = text;
                }
            }
        }
        out
    }

    /// Looks up a field value by section and field key.
    #[must_use]
    pub fn get(&self, section: &str, field: &str) -> Option<&str> {
        let (si, fi) = locate(section, field)?;
        Some(self.values[si][fi].as_str())
    }

    /// Sets a field value. Unknown keys are ignored; absent-meaning values
    /// store [`NOT_MENTIONED`].
    pub fn set(&mut self, section: &str, field: &str, value: &str) {
        if let Some((si, fi)) = locate(section, field) {
            self.values[si][fi] = if is_absent(value) {
                NOT_MENTIONED.to_string()
            } else {
                value.trim().to_string()
            };
        }
    }

    /// Fills every field still [`NOT_MENTIONED`] from `other`.
    ///
    /// Returns the number of fields filled.
    pub fn backfill_from(&mut self, other: &Self) -> usize {
        let mut filled = 0;
        for (mine, theirs) in self.values.iter_mut().zip(&other.values) {
            for (m, t) in mine.iter_mut().zip(theirs) {
                if is_absent(m) && !is_absent(t) {
                    m.clone_from(t);
                    filled += 1;
                }
            }
        }
        filled
    }

    /// Combines several extractions field by field, keeping the longest
    /// (most complete) supplied value.
    #[must_use]
    pub fn most_complete<'a>(items: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut out = Self::default();
        for item in items {
            for (mine, theirs) in out.values.iter_mut().zip(&item.values) {
                for (m, t) in mine.iter_mut().zip(theirs) {
                    if is_absent(t) {
                        continue;
                    }
                    if is_absent(m) || t.chars().count() > m.chars().count() {
                        m.clone_from(t);
                    }
                }
            }
        }
        out
    }

    /// Number of fields holding a real value.
    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.values
            .iter()
            .flatten()
            .filter(|v| !is_absent(v))
            .count()
    }

    /// Iterates sections with `(spec, field values)` in display order.
    pub fn sections(&self) -> impl Iterator<Item = (&SectionSpec, Vec<(&FieldSpec, &str)>)> {
        TENDER_SECTIONS.iter().zip(&self.values).map(|(spec, vals)| {
            let fields = spec
                .fields
                .iter()
                .zip(vals)
                .map(|(f, v)| (f, v.as_str()))
                .collect();
            (spec, fields)
        })
    }
}

impl Serialize for TenderExtraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct SectionMap<'a> {
            spec: &'a SectionSpec,
            values: &'a [String],
        }

        impl Serialize for SectionMap<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.values.len()))?;
                for (f, v) in self.spec.fields.iter().zip(self.values) {
                    map.serialize_entry(f.key, v)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(TENDER_SECTIONS.len()))?;
        for (spec, values) in TENDER_SECTIONS.iter().zip(&self.values) {
            map.serialize_entry(spec.key, &SectionMap { spec, values })?;
        }
        map.end()
    }
}

/// Plain-text rendering: a heading per section, one `- Label: value` line
/// per field, multi-line values indented under their label.
impl std::fmt::Display for TenderExtraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (section, fields)) in self.sections().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", section.title)?;
            for (spec, value) in fields {
                if value.contains('\n') {
                    writeln!(f, "- {}:", spec.label)?;
                    for line in value.lines().filter(|l| !l.trim().is_empty()) {
                        writeln!(f, "    {}", line.trim())?;
                    }
                } else {
                    writeln!(f, "- {}: {value}", spec.label)?;
                }
            }
        }
        Ok(())
    }
}

fn locate(section: &str, field: &str) -> Option<(usize, usize)> {
    let si = TENDER_SECTIONS.iter().position(|s| s.key == section)?;
    let fi = TENDER_SECTIONS[si]
        .fields
        .iter()
        .position(|f| f.key == field)?;
    Some((si, fi))
}

/// Renders any JSON value as field text.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .filter(|s| !s.is_empty())
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", render_value(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
