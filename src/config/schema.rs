//! KDL schema for config.kdl.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// output-format "human"  // or "json"
/// ssh-timeout-secs 5
/// default-host "github.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhsConfig {
    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Wall-clock budget for the SSH probe, in seconds (1-60)
    pub ssh_timeout_secs: Option<u64>,

    /// Host used for new profiles when none is given
    pub default_host: Option<String>,
}

impl GhsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(secs) = self.ssh_timeout_secs {
            if !(1..=60).contains(&secs) {
                return Err(format!("ssh-timeout-secs must be 1-60, got {}", secs));
            }
        }
        if let Some(host) = &self.default_host {
            if host.is_empty() || host.chars().any(char::is_whitespace) {
                return Err(format!("default-host is not a hostname: {:?}", host));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes and malformed values
    /// are ignored rather than fatal; a hand-edited config should never
    /// brick the tool.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(node) = doc.get("output-format") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    config.output_format = OutputFormat::parse(s);
                }
            }
        }

        if let Some(node) = doc.get("ssh-timeout-secs") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    if (1..=60).contains(&i) {
                        config.ssh_timeout_secs = Some(i as u64);
                    }
                }
            }
        }

        if let Some(node) = doc.get("default-host") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    config.default_host = Some(s.to_string());
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(format) = self.output_format {
            let mut node = KdlNode::new("output-format");
            node.push(KdlEntry::new(KdlValue::String(format.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        if let Some(secs) = self.ssh_timeout_secs {
            let mut node = KdlNode::new("ssh-timeout-secs");
            node.push(KdlEntry::new(KdlValue::Integer(secs as i128)));
            doc.nodes_mut().push(node);
        }

        if let Some(ref host) = self.default_host {
            let mut node = KdlNode::new("default-host");
            node.push(KdlEntry::new(KdlValue::String(host.clone())));
            doc.nodes_mut().push(node);
        }

        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let doc: KdlDocument = "output-format \"human\"\nssh-timeout-secs 10\ndefault-host \"ghe.example.com\"\n"
            .parse()
            .unwrap();
        let config = GhsConfig::from_kdl(&doc);

        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.ssh_timeout_secs, Some(10));
        assert_eq!(config.default_host.as_deref(), Some("ghe.example.com"));
    }

    #[test]
    fn test_parse_empty_document() {
        let doc = KdlDocument::new();
        assert_eq!(GhsConfig::from_kdl(&doc), GhsConfig::default());
    }

    #[test]
    fn test_out_of_range_timeout_ignored() {
        let doc: KdlDocument = "ssh-timeout-secs 9000".parse().unwrap();
        let config = GhsConfig::from_kdl(&doc);
        assert!(config.ssh_timeout_secs.is_none());
    }

    #[test]
    fn test_kdl_round_trip() {
        let config = GhsConfig {
            output_format: Some(OutputFormat::Human),
            ssh_timeout_secs: Some(7),
            default_host: Some("github.com".to_string()),
        };

        let doc = config.to_kdl();
        let reparsed = GhsConfig::from_kdl(&doc.to_string().parse().unwrap());
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_validate() {
        let mut config = GhsConfig::new();
        assert!(config.validate().is_ok());

        config.ssh_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.ssh_timeout_secs = Some(5);
        config.default_host = Some("not a host".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }
}
