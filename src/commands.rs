use crate::ExportFormat;
use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use swatch_agent::transform_tokens;
use swatch_scraper::{find_browser_executable, ScrapeConfig, ScrapePhase, ScrapeProgress, Scraper};
use swatch_tokens::presets::{preset_by_label, PRESETS};
use swatch_tokens::{
    apply_levers, css, diff as diff_sets, infer_levers, lever_by_id, CombineRecipe, LeverDef,
    LeverValues, SequentialIds, TokenCategory, TokenSet, Variation, ALL_LEVERS,
};
use tracing::info;

fn load_token_set(path: &Path) -> Result<TokenSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    TokenSet::from_json(&text).with_context(|| format!("{} is not a token set", path.display()))
}

/// Write to `out`, or to stdout when no path is given.
fn emit(out: Option<PathBuf>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn emit_set(out: Option<PathBuf>, set: &TokenSet) -> Result<()> {
    emit(out, &set.to_json_pretty()?)
}

/// Split `key=value`.
fn split_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", raw))
}

fn print_progress(progress: ScrapeProgress) {
    let phase = match progress.phase {
        ScrapePhase::FetchingIndex => "index",
        ScrapePhase::ExtractingStories => "stories",
        ScrapePhase::BuildingTokens => "tokens",
    };
    eprintln!("{} {}/{}", format!("[{}]", phase).cyan(), progress.done, progress.total);
}

pub async fn scrape(
    url: &str,
    chrome: Option<PathBuf>,
    out: Option<PathBuf>,
    result_path: Option<PathBuf>,
    max_stories: usize,
    concurrency: usize,
) -> Result<()> {
    let executable = match chrome {
        Some(path) => path,
        None => find_browser_executable()?,
    };
    let config = ScrapeConfig::default()
        .with_max_stories(max_stories)
        .with_concurrency(concurrency);

    info!("Scraping {} with {}", url, executable.display());
    let result = Scraper::new(config)?
        .run(url, &executable, print_progress)
        .await?;

    for warning in &result.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    eprintln!(
        "{} {} of {} stories, {} tokens, {} components",
        "Scraped".green().bold(),
        result.stats.scraped_stories,
        result.stats.total_stories,
        result.stats.extracted_tokens,
        result.stats.components
    );
    for group in &result.components {
        let names: Vec<&str> = group.components.iter().map(|c| c.name.as_str()).collect();
        eprintln!("  {} {}", group.name.bold(), names.join(", ").dimmed());
    }

    if let Some(path) = result_path {
        emit(Some(path), &serde_json::to_string_pretty(&result)?)?;
    }
    emit_set(out, &result.tokens)
}

pub async fn transform(
    tokens: &Path,
    direction: &str,
    brand: Option<&str>,
    out: Option<PathBuf>,
) -> Result<()> {
    let base = load_token_set(tokens)?;
    let credential = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();

    let transformed = transform_tokens(&credential, &base, direction, brand).await?;
    print_diff(&base, &transformed);
    emit_set(out, &transformed)
}

fn parse_lever_values(raw: &[String], levers: &[&LeverDef]) -> Result<LeverValues> {
    let mut values = LeverValues::defaults(levers);
    for pair in raw {
        let (id, value) = split_pair(pair)?;
        let lever = lever_by_id(id).ok_or_else(|| {
            let known: Vec<&str> = ALL_LEVERS.iter().map(|l| l.id).collect();
            anyhow!("unknown lever {:?} (known: {})", id, known.join(", "))
        })?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("lever {} needs a number, got {:?}", id, value))?;
        if value < lever.min || value > lever.max {
            bail!("lever {} must be within {}..{}", id, lever.min, lever.max);
        }
        values.set(lever.id, value);
    }
    Ok(values)
}

pub fn levers(
    tokens: &Path,
    prompt: Option<&str>,
    raw_values: &[String],
    out: Option<PathBuf>,
) -> Result<()> {
    let base = load_token_set(tokens)?;
    let mut levers: Vec<&'static LeverDef> = match prompt {
        Some(prompt) => infer_levers(prompt),
        None => ALL_LEVERS.to_vec(),
    };
    // an explicit --set brings its lever in even if the prompt did not
    for pair in raw_values {
        if let Some(lever) = split_pair(pair).ok().and_then(|(id, _)| lever_by_id(id)) {
            if !levers.contains(&lever) {
                levers.push(lever);
            }
        }
    }

    let values = parse_lever_values(raw_values, &levers)?;
    for lever in &levers {
        let value = values.get(lever.id).unwrap_or(lever.default_value);
        let marker = if lever.is_default(value) {
            "".normal()
        } else {
            "*".yellow()
        };
        eprintln!("  {:<12} {:>6} {}", lever.label, value, marker);
    }

    let adjusted = TokenSet {
        tokens: apply_levers(&base.tokens, &levers, &values),
        ..base
    };
    emit(out, &css::serialize(&adjusted))
}

fn print_diff(base: &TokenSet, candidate: &TokenSet) {
    let result = diff_sets(base, candidate);
    for (category, entry) in &result.by_category {
        if entry.changed.is_empty() {
            continue;
        }
        eprintln!(
            "{} {} changed, {} unchanged",
            category.as_str().bold(),
            entry.changed.len(),
            entry.unchanged.len()
        );
        for change in &entry.changed {
            eprintln!(
                "  {} {} {} {}",
                change.name,
                change.old_value.red(),
                "->".dimmed(),
                change.new_value.green()
            );
        }
    }
    eprintln!(
        "{} of {} tokens changed",
        result.total_changed.to_string().bold(),
        base.len()
    );
}

pub fn diff(base: &Path, candidate: &Path) -> Result<()> {
    let base = load_token_set(base)?;
    let candidate = load_token_set(candidate)?;
    print_diff(&base, &candidate);
    Ok(())
}

pub fn preset(tokens: Option<PathBuf>, name: Option<&str>, out: Option<PathBuf>) -> Result<()> {
    let (Some(tokens), Some(name)) = (tokens, name) else {
        for preset in &PRESETS {
            println!("{:<16} {}", preset.label.bold(), preset.direction.dimmed());
        }
        return Ok(());
    };

    let base = load_token_set(&tokens)?;
    let preset = preset_by_label(name).ok_or_else(|| anyhow!("no preset named {:?}", name))?;
    let ids = SequentialIds::new();
    let variation = Variation::from_css(&base, preset.direction, preset.css, Some(preset.label), &ids)
        .ok_or_else(|| anyhow!("preset {} has no declarations", preset.label))?;

    print_diff(&base, &variation.token_set);
    emit_set(out, &variation.token_set)
}

pub fn import(css_path: &Path, id: &str, label: Option<String>, out: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(css_path)
        .with_context(|| format!("Failed to read {}", css_path.display()))?;
    let label = label.unwrap_or_else(|| {
        css_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string())
    });

    let set = css::extract_tokens(id, label, &[text], None);
    if set.is_empty() {
        bail!("no custom properties found in {}", css_path.display());
    }
    eprintln!("{} {} tokens", "Imported".green(), set.len());
    emit_set(out, &set)
}

pub fn export(tokens: &Path, format: ExportFormat) -> Result<()> {
    let set = load_token_set(tokens)?;
    let content = match format {
        ExportFormat::Css => css::serialize(&set),
        ExportFormat::Json => serde_json::to_string_pretty(&set.tokens)?,
    };
    emit(None, &content)
}

pub fn combine(base: &Path, picks: &[String], out: Option<PathBuf>) -> Result<()> {
    if picks.is_empty() {
        bail!("at least one --pick CATEGORY=FILE is required");
    }
    let base = load_token_set(base)?;

    let mut recipe = CombineRecipe::new();
    let mut sets: HashMap<String, TokenSet> = HashMap::new();
    let mut labels: HashMap<String, String> = HashMap::new();

    for pick in picks {
        let (category, file) = split_pair(pick)?;
        let category: TokenCategory = category.parse().map_err(|e: String| anyhow!(e))?;
        let set = load_token_set(Path::new(file))?;
        recipe.insert(category, set.id.clone());
        labels.insert(set.id.clone(), set.label.clone());
        sets.insert(set.id.clone(), set);
    }

    let ids = SequentialIds::new();
    let variation = Variation::combined(&recipe, &sets, &labels, &base, &ids);
    eprintln!("{} {}", "Created".green(), variation.direction);
    print_diff(&base, &variation.token_set);
    emit_set(out, &variation.token_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("roundness=150").unwrap(), ("roundness", "150"));
        assert_eq!(split_pair(" color = dark.json ").unwrap(), ("color", "dark.json"));
        assert!(split_pair("roundness").is_err());
        assert!(split_pair("=1").is_err());
    }

    #[test]
    fn test_parse_lever_values() {
        let levers = ALL_LEVERS.to_vec();
        let values = parse_lever_values(&["roundness=150".into()], &levers).unwrap();
        assert_eq!(values.get("roundness"), Some(150.0));
        assert_eq!(values.get("depth"), Some(100.0));

        assert!(parse_lever_values(&["roundness=500".into()], &levers).is_err());
        assert!(parse_lever_values(&["sparkle=1".into()], &levers).is_err());
        assert!(parse_lever_values(&["depth=lots".into()], &levers).is_err());
    }
}
