use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};

use super::helpers::parse_localized_decimal;
use crate::models::segment::{truncate_hundredths, SCOREBOARD_SEGMENT_NAME};

pub const CURRENT_RECAP_VERSION: &str = "v1.1";

type Migration = fn(Value) -> Result<Value>;

/// Ordered chain of `(from, to, step)`. Each step only sees documents at
/// `from` and must leave an already-migrated document unchanged.
const MIGRATIONS: &[(&str, &str, Migration)] = &[
    ("v0.2", "v1.0", strip_zero_scoreboard_fields),
    ("v1.0", "v1.1", parse_textual_level_times),
];

const SCOREBOARD_COUNTERS: [&str; 4] = ["hp", "parries", "superMeter", "coins"];

pub fn run_migrations(mut document: Value) -> Result<Value> {
    let current = parse_version(CURRENT_RECAP_VERSION)?;
    let mut version = parse_version(read_version(&document)?)?;

    if version > current {
        bail!(
            "recap version ({}) is newer than supported schema ({})",
            read_version(&document)?,
            CURRENT_RECAP_VERSION
        );
    }

    while version < current {
        let (from, to, migrate) = MIGRATIONS
            .iter()
            .find(|(from, _, _)| parse_version(from).map_or(false, |v| v == version))
            .ok_or_else(|| {
                anyhow!("no migration registered from recap version {version:?}")
            })?;

        document = migrate(document)
            .with_context(|| format!("migration {from} -> {to} failed"))?;
        set_version(&mut document, to)?;
        version = parse_version(to)?;
    }

    Ok(document)
}

/// Parses `v<major>.<minor>` into a comparable pair.
pub fn parse_version(tag: &str) -> Result<(u32, u32)> {
    let digits = tag
        .strip_prefix('v')
        .ok_or_else(|| anyhow!("invalid recap version '{tag}'"))?;
    let (major, minor) = digits
        .split_once('.')
        .ok_or_else(|| anyhow!("invalid recap version '{tag}'"))?;
    let major = major
        .parse()
        .with_context(|| format!("invalid major version in '{tag}'"))?;
    let minor = minor
        .parse()
        .with_context(|| format!("invalid minor version in '{tag}'"))?;
    Ok((major, minor))
}

fn read_version(document: &Value) -> Result<&str> {
    document
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("recap document has no version tag"))
}

fn set_version(document: &mut Value, version: &str) -> Result<()> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| anyhow!("recap document is not an object"))?;
    root.insert("version".into(), Value::String(version.to_string()));
    Ok(())
}

fn for_each_scene<F>(document: &mut Value, mut apply: F) -> Result<()>
where
    F: FnMut(&mut Map<String, Value>),
{
    let attempts = document
        .get_mut("attempts")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| anyhow!("recap document has no attempts array"))?;

    for attempt in attempts {
        let Some(scenes) = attempt.get_mut("scenes").and_then(Value::as_array_mut) else {
            continue;
        };
        for scene in scenes.iter_mut().filter_map(Value::as_object_mut) {
            apply(scene);
        }
    }
    Ok(())
}

/// Older recorders wrote every scoreboard counter, including zeros.
fn strip_zero_scoreboard_fields(mut document: Value) -> Result<Value> {
    for_each_scene(&mut document, |scene| {
        if scene.get("name").and_then(Value::as_str) != Some(SCOREBOARD_SEGMENT_NAME) {
            return;
        }
        for field in SCOREBOARD_COUNTERS {
            let is_zero = scene
                .get(field)
                .and_then(Value::as_f64)
                .map_or(false, |value| value == 0.0);
            if is_zero {
                scene.remove(field);
            }
        }
    })?;
    Ok(document)
}

/// Level times used to be written as text in the writer's locale.
fn parse_textual_level_times(mut document: Value) -> Result<Value> {
    for_each_scene(&mut document, |scene| {
        let parsed = match scene.get("levelTime") {
            Some(Value::String(text)) => parse_localized_decimal(text)
                .map(truncate_hundredths)
                .ok_or_else(|| text.clone()),
            _ => return,
        };
        match parsed {
            Ok(seconds) => {
                scene.insert("levelTime".into(), Value::from(seconds));
            }
            Err(text) => {
                log::warn!("dropping unreadable levelTime {text:?} during migration");
                scene.remove("levelTime");
            }
        }
    })?;
    Ok(document)
}
