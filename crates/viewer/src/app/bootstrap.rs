use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mapworld::{resolve_asset_root, MapId, WorldConfig, ASSET_ROOT_ENV_VAR};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub(crate) const CONFIG_ENV_VAR: &str = "MAPWORLD_CONFIG";

/// Viewer settings. Layered as defaults, then the JSON config file, then
/// environment variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewerConfig {
    pub(crate) asset_root: Option<PathBuf>,
    pub(crate) map_id: String,
    /// Simulation ticks to run before exiting.
    pub(crate) ticks: u32,
    pub(crate) target_tps: u32,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) metrics_interval_ms: u64,
    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
    pub(crate) world: WorldConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: None,
            map_id: "100000000".to_string(),
            ticks: 600,
            target_tps: 60,
            max_ticks_per_frame: 5,
            max_frame_delta_ms: 250,
            metrics_interval_ms: 1_000,
            viewport_width: 800,
            viewport_height: 600,
            world: WorldConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub(crate) fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    pub(crate) fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CliOptions {
    pub(crate) help: bool,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) asset_root: Option<PathBuf>,
    pub(crate) map_id: Option<String>,
    pub(crate) ticks: Option<u32>,
    pub(crate) target_tps: Option<u32>,
}

pub(crate) struct AppWiring {
    pub(crate) config: ViewerConfig,
    pub(crate) map_id: MapId,
    pub(crate) asset_root: PathBuf,
}

pub(crate) fn build_app(cli: CliOptions) -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Map Viewer Startup ===");

    let config = resolve_config(&cli, |name| env::var(name).ok())?;
    let map_id = config
        .map_id
        .parse::<MapId>()
        .map_err(|error| error.to_string())?;
    let asset_root =
        resolve_asset_root(config.asset_root.as_deref()).map_err(|error| error.to_string())?;
    info!(
        asset_root = %asset_root.display(),
        map_id = %map_id,
        ticks = config.ticks,
        target_tps = config.target_tps,
        "viewer_config"
    );

    Ok(AppWiring {
        config,
        map_id,
        asset_root,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn resolve_config(
    cli: &CliOptions,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ViewerConfig, String> {
    let config_path = cli
        .config_path
        .clone()
        .or_else(|| env_lookup(CONFIG_ENV_VAR).map(PathBuf::from));
    let mut config = match config_path {
        Some(path) => load_config_file(&path)?,
        None => ViewerConfig::default(),
    };

    if let Some(root) = env_lookup(ASSET_ROOT_ENV_VAR).filter(|raw| !raw.trim().is_empty()) {
        config.asset_root = Some(PathBuf::from(root));
    }

    if let Some(root) = &cli.asset_root {
        config.asset_root = Some(root.clone());
    }
    if let Some(map_id) = &cli.map_id {
        config.map_id = map_id.clone();
    }
    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }
    if let Some(target_tps) = cli.target_tps {
        config.target_tps = target_tps;
    }
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<ViewerConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("read config {}: {error}", path.display()))?;
    parse_config_json(&raw).map_err(|error| format!("{}: {error}", path.display()))
}

fn parse_config_json(raw: &str) -> Result<ViewerConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, ViewerConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => {
                options.help = true;
                index += 1;
            }
            "--config" => {
                options.config_path = Some(PathBuf::from(flag_value(args, index, "--config")?));
                index += 2;
            }
            "--asset-root" => {
                options.asset_root = Some(PathBuf::from(flag_value(args, index, "--asset-root")?));
                index += 2;
            }
            "--map" => {
                options.map_id = Some(flag_value(args, index, "--map")?.to_string());
                index += 2;
            }
            "--ticks" => {
                let value = flag_value(args, index, "--ticks")?;
                options.ticks = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| format!("invalid --ticks value '{value}' (expected u32)"))?,
                );
                index += 2;
            }
            "--tps" => {
                let value = flag_value(args, index, "--tps")?;
                options.target_tps = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| format!("invalid --tps value '{value}' (expected u32)"))?,
                );
                index += 2;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(options)
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

pub(crate) fn usage_text() -> String {
    [
        "viewer - headless map world runner",
        "",
        "Usage:",
        "  viewer [--config <file>] [--asset-root <dir>] [--map <id|login>] [--ticks <u32>] [--tps <u32>]",
        "",
        "Environment:",
        "  MAPWORLD_CONFIG      JSON config file (overridden by --config)",
        "  MAPWORLD_ASSET_ROOT  XML asset dump root (overridden by --asset-root)",
        "  RUST_LOG             log filter (default: info)",
        "",
        "Defaults:",
        "  --map 100000000",
        "  --ticks 600",
        "  --tps 60",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_flags() {
        let cli = parse_args(&args(&[
            "--map", "login", "--ticks", "30", "--tps", "120", "--asset-root", "/data",
        ]))
        .expect("cli");
        assert_eq!(cli.map_id.as_deref(), Some("login"));
        assert_eq!(cli.ticks, Some(30));
        assert_eq!(cli.target_tps, Some(120));
        assert_eq!(cli.asset_root, Some(PathBuf::from("/data")));
        assert!(!cli.help);
    }

    #[test]
    fn rejects_bad_and_unknown_flags() {
        assert_eq!(
            parse_args(&args(&["--ticks", "many"])).expect_err("bad ticks"),
            "invalid --ticks value 'many' (expected u32)"
        );
        assert_eq!(
            parse_args(&args(&["--map"])).expect_err("missing value"),
            "missing value for --map"
        );
        assert_eq!(
            parse_args(&args(&["--fullscreen"])).expect_err("unknown"),
            "unknown argument '--fullscreen'"
        );
    }

    #[test]
    fn defaults_apply_without_file_env_or_flags() {
        let config = resolve_config(&CliOptions::default(), no_env).expect("config");
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.world.min_load_duration_ms, 500);
    }

    #[test]
    fn file_then_env_then_flags() {
        let temp = TempDir::new().expect("tempdir");
        let file = temp.path().join("viewer.json");
        fs::write(
            &file,
            r#"{
                "asset_root": "/from/file",
                "map_id": "104040000",
                "ticks": 10,
                "world": { "min_load_duration_ms": 0, "npc_hitbox": { "width": 80.0 } }
            }"#,
        )
        .expect("write config");

        let env = HashMap::from([
            (CONFIG_ENV_VAR, file.display().to_string()),
            (ASSET_ROOT_ENV_VAR, "/from/env".to_string()),
        ]);
        let cli = CliOptions {
            ticks: Some(42),
            ..CliOptions::default()
        };
        let config =
            resolve_config(&cli, |name| env.get(name).cloned()).expect("layered config");

        assert_eq!(config.map_id, "104040000");
        assert_eq!(config.asset_root, Some(PathBuf::from("/from/env")));
        assert_eq!(config.ticks, 42);
        assert_eq!(config.target_tps, 60);
        assert_eq!(config.world.min_load_duration_ms, 0);
        assert_eq!(config.world.npc_hitbox.width, 80.0);
        assert_eq!(config.world.npc_hitbox.height, 70.0);
    }

    #[test]
    fn config_errors_name_the_failing_field() {
        let err = parse_config_json(r#"{ "world": { "taxi_npc_ids": ["a"] } }"#)
            .expect_err("bad id");
        assert!(err.starts_with("parse config json at world.taxi_npc_ids[0]:"), "{err}");

        let err = parse_config_json(r#"{ "tick": 5 }"#).expect_err("unknown field");
        assert!(err.contains("unknown field `tick`"), "{err}");
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = CliOptions {
            config_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..CliOptions::default()
        };
        let err = resolve_config(&cli, no_env).expect_err("missing file");
        assert!(err.starts_with("read config /definitely/not/here.json"), "{err}");
    }
}
