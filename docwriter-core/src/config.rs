//! Configuration management for docwriter
//!
//! A config file describes one rule set: the markdown dialect, the ToC
//! settings, and an ordered list of rules.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::RuleSet;
use crate::markdown::MarkdownOptions;
use crate::rules::{
    MarkdownAppenderRule, RegexReplacementRule, Rule, TextReplacementRule, TocInsertionRule,
    TocUpdateRule,
};
use crate::toc::TocSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub markdown: MarkdownConfig,
    pub toc: TocSettings,
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub extensions: MarkdownExtensions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownExtensions {
    #[default]
    Extended,
    Basic,
}

impl MarkdownExtensions {
    pub fn options(self) -> MarkdownOptions {
        match self {
            MarkdownExtensions::Extended => MarkdownOptions::extended(),
            MarkdownExtensions::Basic => MarkdownOptions::basic(),
        }
    }
}

/// One `[[rules]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Replace a text leaf equal to `text`
    Text { text: String, value: String },
    /// Replace a text leaf equal to `$(name)`
    Placeholder { name: String, value: String },
    Regex { pattern: String, value: String },
    /// Append markdown given inline or read from a file
    Markdown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
    },
    TocInsert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    TocUpdate,
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "docwriter")
            .map(|proj_dirs| proj_dirs.config_dir().join("docwriter.toml"))
    }

    /// Load configuration from file, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        check_permissions(path)?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!(
            "Loaded {} rule(s) from {}",
            config.rules.len(),
            path.display()
        );
        Ok(config)
    }

    /// Build the configured rules in order
    ///
    /// Relative markdown file paths are resolved against `base_dir`, normally the
    /// directory holding the config file.
    pub fn rule_set(&self, base_dir: &Path) -> Result<RuleSet> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                self.build_rule(rule, base_dir)
                    .with_context(|| format!("Invalid rule #{}", index + 1))
            })
            .collect()
    }

    fn build_rule(&self, rule: &RuleConfig, base_dir: &Path) -> Result<Rule> {
        let rule: Rule = match rule {
            RuleConfig::Text { text, value } => {
                TextReplacementRule::new(text.as_str(), value.as_str())?.into()
            }
            RuleConfig::Placeholder { name, value } => {
                TextReplacementRule::placeholder(name, value.as_str()).into()
            }
            RuleConfig::Regex { pattern, value } => {
                RegexReplacementRule::new(pattern, value.as_str())?.into()
            }
            RuleConfig::Markdown { content, file } => {
                let markdown = match (content, file) {
                    (Some(content), None) => content.clone(),
                    (None, Some(file)) => {
                        let path = base_dir.join(file);
                        std::fs::read_to_string(&path).with_context(|| {
                            format!("Failed to read markdown file: {}", path.display())
                        })?
                    }
                    _ => anyhow::bail!("markdown rule needs exactly one of `content` or `file`"),
                };
                MarkdownAppenderRule::new(markdown)
                    .with_options(self.markdown.extensions.options())
                    .into()
            }
            RuleConfig::TocInsert { placeholder } => {
                let rule = TocInsertionRule::new().with_settings(self.toc.clone());
                match placeholder {
                    Some(placeholder) => rule.with_placeholder(placeholder.as_str()).into(),
                    None => rule.into(),
                }
            }
            RuleConfig::TocUpdate => TocUpdateRule::new().with_settings(self.toc.clone()).into(),
        };
        Ok(rule)
    }
}

fn check_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        if metadata.permissions().mode() & 0o002 != 0 {
            anyhow::bail!(
                "Config file {} is world-writable (insecure permissions)",
                path.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Document;
    use crate::engine::apply_rules;
    use crate::error::Error;
    use crate::export::to_plain_text;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.markdown.extensions, MarkdownExtensions::Extended);
        assert_eq!(config.toc.heading_text, "Table of Contents");
        assert!(config.toc.skip_page_numbers);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        let toml_content = r##"
[markdown]
extensions = "basic"

[toc]
heading_text = "Contents"
skip_page_numbers = false

[[rules]]
type = "text"
text = "Name"
value = "Ada"

[[rules]]
type = "placeholder"
name = "title"
value = "Report"

[[rules]]
type = "regex"
pattern = '(\d+)-(\d+)'
value = '${2}-${1}'

[[rules]]
type = "markdown"
content = "# Hello"

[[rules]]
type = "toc_insert"
placeholder = "[TOC]"

[[rules]]
type = "toc_update"
"##;
        file.write_all(toml_content.as_bytes())?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.markdown.extensions, MarkdownExtensions::Basic);
        assert_eq!(config.toc.heading_text, "Contents");
        assert!(!config.toc.skip_page_numbers);
        assert_eq!(config.toc.switches, TocSettings::default().switches);
        assert_eq!(
            config.rules,
            vec![
                RuleConfig::Text {
                    text: "Name".to_string(),
                    value: "Ada".to_string()
                },
                RuleConfig::Placeholder {
                    name: "title".to_string(),
                    value: "Report".to_string()
                },
                RuleConfig::Regex {
                    pattern: r"(\d+)-(\d+)".to_string(),
                    value: "${2}-${1}".to_string()
                },
                RuleConfig::Markdown {
                    content: Some("# Hello".to_string()),
                    file: None
                },
                RuleConfig::TocInsert {
                    placeholder: Some("[TOC]".to_string())
                },
                RuleConfig::TocUpdate,
            ]
        );

        let rules = config.rule_set(Path::new("."))?;
        let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "text replacement",
                "text replacement",
                "regex replacement",
                "markdown appender",
                "ToC insertion",
                "ToC update"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml [[[syntax").unwrap();

        let result = Config::load_from(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_rule_type_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[[rules]]\ntype = \"shell\"\n");
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_world_writable_config_is_refused() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let file = NamedTempFile::new()?;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666))?;

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));
        Ok(())
    }

    #[test]
    fn test_invalid_regex_surfaces_invalid_argument() {
        let config = Config {
            rules: vec![RuleConfig::Regex {
                pattern: "([".to_string(),
                value: String::new(),
            }],
            ..Default::default()
        };

        let err = config.rule_set(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Invalid rule #1"));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_text_rule_is_rejected() -> Result<()> {
        let config: Config =
            toml::from_str("[[rules]]\ntype = \"text\"\ntext = \"\"\nvalue = \"INJECTED\"\n")?;

        let err = config.rule_set(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Invalid rule #1"));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidArgument(_))
        ));
        Ok(())
    }

    #[test]
    fn test_markdown_rule_needs_one_source() {
        let config = Config {
            rules: vec![RuleConfig::Markdown {
                content: None,
                file: None,
            }],
            ..Default::default()
        };
        assert!(config.rule_set(Path::new(".")).is_err());
    }

    #[test]
    fn test_markdown_file_relative_to_base_dir() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("intro.md"), "Hello from a file\n")?;

        let config = Config {
            rules: vec![RuleConfig::Markdown {
                content: None,
                file: Some(PathBuf::from("intro.md")),
            }],
            ..Default::default()
        };

        let rules = config.rule_set(dir.path())?;
        let mut doc = Document::new();
        let root = doc.root();
        apply_rules(&rules, &mut doc, root)?;
        assert_eq!(to_plain_text(&doc, root), "Hello from a file\n");

        let missing = config.rule_set(Path::new("/nonexistent"));
        assert!(missing.is_err());
        Ok(())
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        assert!(path.is_some());
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("docwriter"));
            assert!(p.to_string_lossy().ends_with("docwriter.toml"));
        }
    }

    #[test]
    fn test_config_serialization() -> Result<()> {
        let config = Config {
            markdown: MarkdownConfig {
                extensions: MarkdownExtensions::Basic,
            },
            rules: vec![
                RuleConfig::Text {
                    text: "a".to_string(),
                    value: "b".to_string(),
                },
                RuleConfig::TocInsert { placeholder: None },
            ],
            ..Default::default()
        };

        let toml_str = toml::to_string(&config)?;
        assert!(toml_str.contains("basic"));
        assert!(toml_str.contains("toc_insert"));

        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed, config);
        Ok(())
    }
}
