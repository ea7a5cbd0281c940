use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use strata_binding::{CyclePolicy, MismatchPolicy};
use strata_checker::CheckerOptions;
use strata_emitter::{ForEachStrategy, LoweringOptions, Target};
use strata_interp::InterpreterOptions;

pub const CONFIG_FILE_NAME: &str = "strata.json";

/// Boolean options accept `true` as well as `"true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StrataConfig {
    /// Path of a base configuration, relative to this file.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub checker: Option<CheckerConfig>,
    #[serde(default)]
    pub lowering: Option<LoweringConfig>,
    #[serde(default)]
    pub binding: Option<BindingConfig>,
    #[serde(default)]
    pub interpreter: Option<InterpreterConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckerConfig {
    /// Warnings fail `check` like errors do.
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub strict: Option<bool>,
    #[serde(default)]
    pub max_expression_depth: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub computed_properties: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoweringConfig {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub for_each: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub rewrite_properties: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub integer_division: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub narrowing_casts: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BindingConfig {
    /// `ignore`, `warn` or `error`.
    #[serde(default)]
    pub context_mismatch: Option<String>,
    #[serde(default)]
    pub max_cycle_depth: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InterpreterConfig {
    #[serde(default)]
    pub max_call_depth: Option<u32>,
}

/// Options for every stage, after defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOptions {
    pub strict: bool,
    pub checker: CheckerOptions,
    pub lowering: LoweringOptions,
    pub cycles: CyclePolicy,
    pub interpreter: InterpreterOptions,
}

pub fn resolve_options(config: &StrataConfig) -> Result<ResolvedOptions> {
    let mut resolved = ResolvedOptions::default();

    if let Some(checker) = &config.checker {
        if let Some(strict) = checker.strict {
            resolved.strict = strict;
        }
        if let Some(depth) = checker.max_expression_depth {
            if depth == 0 {
                bail!("checker.maxExpressionDepth must be greater than zero");
            }
            resolved.checker.max_expression_depth = depth;
        }
        if let Some(computed) = checker.computed_properties {
            resolved.checker.computed_properties = computed;
        }
    }

    if let Some(lowering) = &config.lowering {
        if let Some(target) = lowering.target.as_deref() {
            resolved.lowering.target = parse_target(target)?;
        }
        if let Some(for_each) = lowering.for_each.as_deref() {
            resolved.lowering.for_each = parse_for_each(for_each)?;
        }
        if let Some(rewrite) = lowering.rewrite_properties {
            resolved.lowering.rewrite_properties = rewrite;
        }
        if let Some(division) = lowering.integer_division {
            resolved.lowering.integer_division = division;
        }
        if let Some(casts) = lowering.narrowing_casts {
            resolved.lowering.narrowing_casts = casts;
        }
    }

    if let Some(binding) = &config.binding {
        if let Some(mismatch) = binding.context_mismatch.as_deref() {
            resolved.cycles.mismatch = parse_mismatch(mismatch)?;
        }
        if let Some(depth) = binding.max_cycle_depth {
            resolved.cycles.max_depth = depth;
        }
    }

    if let Some(interpreter) = &config.interpreter
        && let Some(depth) = interpreter.max_call_depth
    {
        resolved.interpreter.max_call_depth = depth;
    }

    Ok(resolved)
}

pub fn parse_config(source: &str) -> Result<StrataConfig> {
    serde_json::from_str(source).context("failed to parse strata.json")
}

/// Load `path`, following `extends` chains.
pub fn load_config(path: &Path) -> Result<StrataConfig> {
    let mut visited = HashSet::new();
    load_config_inner(path, &mut visited)
}

fn load_config_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<StrataConfig> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("config extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let mut config =
        parse_config(&source).with_context(|| format!("in {}", path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_dir = path
            .parent()
            .ok_or_else(|| anyhow!("config has no parent directory"))?;
        let base = load_config_inner(&base_dir.join(extends), visited)?;
        config = merge_configs(base, config);
    }

    visited.remove(&canonical);
    Ok(config)
}

/// `strata.json` in the directory of `program`, if there is one.
pub fn find_config(program: &Path) -> Option<PathBuf> {
    let dir = program.parent()?;
    let candidate = if dir.as_os_str().is_empty() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else {
        dir.join(CONFIG_FILE_NAME)
    };
    candidate.is_file().then_some(candidate)
}

/// Fields set in `child` win over `base`.
fn merge_configs(base: StrataConfig, child: StrataConfig) -> StrataConfig {
    StrataConfig {
        extends: None,
        checker: merge_section(base.checker, child.checker, |base, child| CheckerConfig {
            strict: child.strict.or(base.strict),
            max_expression_depth: child.max_expression_depth.or(base.max_expression_depth),
            computed_properties: child.computed_properties.or(base.computed_properties),
        }),
        lowering: merge_section(base.lowering, child.lowering, |base, child| LoweringConfig {
            target: child.target.or(base.target),
            for_each: child.for_each.or(base.for_each),
            rewrite_properties: child.rewrite_properties.or(base.rewrite_properties),
            integer_division: child.integer_division.or(base.integer_division),
            narrowing_casts: child.narrowing_casts.or(base.narrowing_casts),
        }),
        binding: merge_section(base.binding, child.binding, |base, child| BindingConfig {
            context_mismatch: child.context_mismatch.or(base.context_mismatch),
            max_cycle_depth: child.max_cycle_depth.or(base.max_cycle_depth),
        }),
        interpreter: merge_section(base.interpreter, child.interpreter, |base, child| {
            InterpreterConfig {
                max_call_depth: child.max_call_depth.or(base.max_call_depth),
            }
        }),
    }
}

fn merge_section<T>(base: Option<T>, child: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, child) {
        (Some(base), Some(child)) => Some(merge(base, child)),
        (base, child) => child.or(base),
    }
}

fn parse_target(value: &str) -> Result<Target> {
    Target::from_name(value.trim())
        .ok_or_else(|| anyhow!("unsupported lowering.target '{value}'"))
}

fn parse_for_each(value: &str) -> Result<ForEachStrategy> {
    ForEachStrategy::from_name(value.trim())
        .ok_or_else(|| anyhow!("unsupported lowering.forEach '{value}'"))
}

fn parse_mismatch(value: &str) -> Result<MismatchPolicy> {
    MismatchPolicy::from_name(value.trim())
        .ok_or_else(|| anyhow!("unsupported binding.contextMismatch '{value}'"))
}
