//! skr config - Show or edit settings

use std::path::{Path, PathBuf};

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::emit_ok;
use crate::config::Config;
use crate::error::{RepoError, Result};
use crate::utils::fs::write_atomic;

const REDACTED: &str = "<redacted>";

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Dotted key, e.g. `scan.max_depth`
    pub key: Option<String>,

    /// Value to write into the settings file
    pub value: Option<String>,

    /// Remove the key from the settings file
    #[arg(long, requires = "key", conflicts_with = "value")]
    pub unset: bool,

    /// Print the settings file path and exit
    #[arg(long)]
    pub path: bool,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    if args.path {
        let path = settings_path(ctx)?;
        if ctx.robot_mode {
            return emit_ok(serde_json::json!({ "path": path }));
        }
        println!("{}", path.display());
        return Ok(());
    }

    match (&args.key, &args.value) {
        (None, _) => show(ctx),
        (Some(key), _) if args.unset => unset_key(ctx, key),
        (Some(key), Some(value)) => set_key(ctx, key, value),
        (Some(key), None) => get_key(ctx, key),
    }
}

fn show(ctx: &AppContext) -> Result<()> {
    let doc = effective_doc(&ctx.config)?;
    if ctx.robot_mode {
        return emit_ok(&doc);
    }
    let rendered =
        toml::to_string_pretty(&doc).map_err(|err| RepoError::Config(format!("render config: {err}")))?;
    print!("{rendered}");
    Ok(())
}

fn get_key(ctx: &AppContext, key: &str) -> Result<()> {
    let doc = effective_doc(&ctx.config)?;
    let value = get_path(&doc, key)?;
    if ctx.robot_mode {
        return emit_ok(serde_json::json!({ "key": key, "value": value }));
    }
    println!("{}", format_value(value));
    Ok(())
}

fn set_key(ctx: &AppContext, key: &str, raw: &str) -> Result<()> {
    get_path(&schema_doc()?, key)?;

    let path = settings_path(ctx)?;
    let mut doc = load_doc(&path)?;
    set_path(&mut doc, key, parse_value(raw))?;
    write_doc(&path, &doc)?;

    if ctx.robot_mode {
        return emit_ok(serde_json::json!({ "key": key, "path": path }));
    }
    println!("{key} updated in {}", path.display());
    Ok(())
}

fn unset_key(ctx: &AppContext, key: &str) -> Result<()> {
    let path = settings_path(ctx)?;
    let mut doc = load_doc(&path)?;
    let removed = unset_path(&mut doc, key);
    if removed {
        write_doc(&path, &doc)?;
    }

    if ctx.robot_mode {
        return emit_ok(serde_json::json!({ "key": key, "removed": removed }));
    }
    if removed {
        println!("{key} removed from {}", path.display());
    } else {
        println!("{key} was not set in {}", path.display());
    }
    Ok(())
}

fn settings_path(ctx: &AppContext) -> Result<PathBuf> {
    ctx.config_path
        .clone()
        .ok_or_else(|| RepoError::Config("no config directory on this system; pass --config".into()))
}

/// The merged settings as TOML. A configured token shows up masked.
fn effective_doc(config: &Config) -> Result<toml::Value> {
    let mut doc =
        toml::Value::try_from(config).map_err(|err| RepoError::Config(format!("serialize config: {err}")))?;
    if config.remote.token.is_some() {
        set_path(&mut doc, "remote.token", toml::Value::String(REDACTED.to_string()))?;
    }
    Ok(doc)
}

/// Every writable key, including optional ones that default to unset.
fn schema_doc() -> Result<toml::Value> {
    let mut config = Config::default();
    config.storage.legacy_root = Some(String::new());
    config.remote.token = Some(String::new());
    effective_doc(&config)
}

fn load_doc(path: &Path) -> Result<toml::Value> {
    if !path.exists() {
        return Ok(toml::Value::Table(toml::map::Map::new()));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|err| RepoError::Config(format!("read config {}: {err}", path.display())))?;
    toml::from_str(&raw).map_err(|err| RepoError::Config(format!("parse config {}: {err}", path.display())))
}

fn write_doc(path: &Path, doc: &toml::Value) -> Result<()> {
    let rendered =
        toml::to_string_pretty(doc).map_err(|err| RepoError::Config(format!("render config: {err}")))?;
    write_atomic(path, rendered.as_bytes())
}

/// TOML literal if it parses as one, else a plain string.
fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn split_key(key: &str) -> Result<(Vec<&str>, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.split_last() {
        Some((last, parents)) if !last.is_empty() && parents.iter().all(|p| !p.is_empty()) => {
            Ok((parents.to_vec(), *last))
        }
        _ => Err(RepoError::Config(format!("invalid key: '{key}'"))),
    }
}

fn get_path<'a>(doc: &'a toml::Value, key: &str) -> Result<&'a toml::Value> {
    let (parents, last) = split_key(key)?;
    parents
        .iter()
        .chain(std::iter::once(&last))
        .try_fold(doc, |current, part| current.get(*part))
        .ok_or_else(|| RepoError::Config(format!("unknown key: {key}")))
}

fn set_path(doc: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, last) = split_key(key)?;
    let mut current = doc;
    for part in parents {
        current = current
            .as_table_mut()
            .ok_or_else(|| RepoError::Config(format!("'{key}' is not inside a table")))?
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    current
        .as_table_mut()
        .ok_or_else(|| RepoError::Config(format!("'{key}' is not inside a table")))?
        .insert(last.to_string(), value);
    Ok(())
}

fn unset_path(doc: &mut toml::Value, key: &str) -> bool {
    let Ok((parents, last)) = split_key(key) else {
        return false;
    };
    let mut current = doc;
    for part in parents {
        match current.get_mut(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    current
        .as_table_mut()
        .is_some_and(|table| table.remove(last).is_some())
}

fn format_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}
