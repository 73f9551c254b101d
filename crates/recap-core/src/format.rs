use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a report is rendered on stdout.
///
/// Parsed case-insensitively from the `--format` flag; `md` is accepted as
/// shorthand for markdown.
///
/// # Examples
///
/// ```
/// use recap_core::OutputFormat;
///
/// let fmt: OutputFormat = "MD".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// assert!(!fmt.is_structured());
///
/// let err = "yaml".parse::<OutputFormat>().unwrap_err();
/// assert!(err.contains("text, json, markdown"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text report for terminals.
    #[default]
    Text,
    /// Pretty-printed JSON, camelCase keys.
    Json,
    /// GitHub-flavored Markdown tables.
    Markdown,
}

impl OutputFormat {
    /// Every format, in the order shown in help text.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }

    /// Whether the output is meant for other programs rather than people.
    pub fn is_structured(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "md" {
            return Ok(OutputFormat::Markdown);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|f| f.name()).collect();
                format!("unknown output format '{s}' (expected one of: {})", names.join(", "))
            })
    }
}
