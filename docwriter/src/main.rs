//! docwriter - fill document templates from a rule configuration

use anyhow::{Context, Result};
use clap::Parser;
use docwriter_core::export::{to_plain_text, to_tree_string};
use docwriter_core::markdown::render_markdown;
use docwriter_core::{replace_in_body, Config, DocWriter, Document};
use std::path::{Path, PathBuf};

/// Apply configured rules to a markdown template
#[derive(Parser, Debug)]
#[command(name = "docwriter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Markdown template rendered before the rules run
    #[arg(value_name = "TEMPLATE")]
    template: Option<PathBuf>,

    /// Config file, instead of the one in the platform config directory
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Replace $(KEY) with VALUE once the rules have run
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_variable)]
    variables: Vec<(String, String)>,

    /// Print the document tree instead of its text
    #[arg(long)]
    tree: bool,
}

fn parse_variable(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {arg:?}")),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    // Load configuration
    let (config, base_dir) = match &args.config {
        Some(path) => {
            let config = Config::load_from(path)
                .with_context(|| format!("Failed to load configuration: {}", path.display()))?;
            (config, parent_dir(path))
        }
        None => {
            let config = Config::load().context("Failed to load configuration")?;
            let base_dir = Config::config_path()
                .map(|path| parent_dir(&path))
                .unwrap_or_default();
            (config, base_dir)
        }
    };
    let rules = config.rule_set(&base_dir).context("Failed to build rules")?;

    // Load template
    let input = args
        .template
        .as_deref()
        .map(|path| load_template(path, &config))
        .transpose()?;

    let mut doc = DocWriter::new(rules)
        .write(input)
        .context("Failed to apply rules")?;

    for (key, value) in &args.variables {
        let replaced = replace_in_body(&mut doc, &format!("$({key})"), value)
            .with_context(|| format!("Failed to replace variable {key}"))?;
        log::info!("Replaced $({key}) in {replaced} run(s)");
    }

    let root = doc.root();
    let rendered = if args.tree {
        to_tree_string(&doc, root)
    } else {
        to_plain_text(&doc, root)
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write output: {}", path.display()))?,
        None => print!("{rendered}"),
    }

    Ok(())
}

fn load_template(path: &Path, config: &Config) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template: {}", path.display()))?;

    let mut doc = Document::new();
    let body = doc.body();
    render_markdown(&mut doc, body, &content, &config.markdown.extensions.options())
        .with_context(|| format!("Failed to render template: {}", path.display()))?;
    Ok(doc)
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("name=Ada"),
            Ok(("name".to_string(), "Ada".to_string()))
        );
        assert_eq!(
            parse_variable("eq=a=b"),
            Ok(("eq".to_string(), "a=b".to_string()))
        );
        assert!(parse_variable("novalue").is_err());
        assert!(parse_variable("=x").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "docwriter",
            "template.md",
            "-c",
            "rules.toml",
            "--set",
            "a=1",
            "--set",
            "b=2",
            "--tree",
        ])
        .unwrap();
        assert_eq!(args.template, Some(PathBuf::from("template.md")));
        assert_eq!(args.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(args.variables.len(), 2);
        assert!(args.tree);
        assert!(args.output.is_none());
    }
}
