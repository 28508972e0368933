use std::env;
use std::fs;
use std::process;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use engine::{GameManager, LoopConfig, SceneId, SurfaceEvents};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::net::{MemoryTransportFactory, NetConfig, TcpTransportFactory, TransportFactory};
use super::space::{self, LocalIdentity};

const CONFIG_ENV_VAR: &str = "METASPACE_CONFIG";
const SERVER_ENV_VAR: &str = "METASPACE_SERVER";
const OFFLINE_ENV_VAR: &str = "METASPACE_OFFLINE";
const PLAYER_NAME_ENV_VAR: &str = "METASPACE_PLAYER_NAME";
const INITIAL_SCENE: &str = "library";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) manager: GameManager,
    pub(crate) initial_scene: SceneId,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    window_width: Option<u32>,
    window_height: Option<u32>,
    server: Option<String>,
    offline: Option<bool>,
    player_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct AppConfig {
    window_width: u32,
    window_height: u32,
    server: Option<String>,
    offline: bool,
    player_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            server: None,
            offline: false,
            player_name: "Guest".to_string(),
        }
    }
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Metaspace Startup ===");

    let app_config = load_app_config()?;
    let identity = LocalIdentity {
        player_id: generate_player_id(),
        player_name: app_config.player_name.clone(),
    };
    let net_config = NetConfig::default();
    let transport: Rc<dyn TransportFactory> = match (&app_config.server, app_config.offline) {
        (Some(addr), false) => {
            info!(server = %addr, "online_mode");
            Rc::new(TcpTransportFactory {
                addr: addr.clone(),
                connect_timeout: net_config.connect_timeout,
            })
        }
        _ => {
            info!("offline_mode");
            Rc::new(MemoryTransportFactory::default())
        }
    };

    let mut manager = GameManager::new(Box::new(LoggingSurface));
    space::register_scenes(&mut manager, &identity, &transport, &net_config);

    let config = LoopConfig {
        window_width: app_config.window_width,
        window_height: app_config.window_height,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        manager,
        initial_scene: SceneId::new(INITIAL_SCENE),
    })
}

/// Boundary to the embedding application. The LMS host replaces this with
/// hooks that surface scene changes into its own UI.
struct LoggingSurface;

impl SurfaceEvents for LoggingSurface {
    fn game_ready(&mut self) {
        info!("surface_game_ready");
    }

    fn scene_changed(&mut self, scene_id: &SceneId) {
        info!(scene = %scene_id, "surface_scene_changed");
    }
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

fn load_app_config() -> Result<AppConfig, String> {
    let mut config = AppConfig::default();

    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        let raw = fs::read_to_string(&path)
            .map_err(|error| format!("read config '{path}': {error}"))?;
        let file = parse_file_config(&raw).map_err(|error| format!("config '{path}': {error}"))?;
        apply_file_config(&mut config, file);
    }

    if let Ok(server) = env::var(SERVER_ENV_VAR) {
        if !server.is_empty() {
            config.server = Some(server);
        }
    }
    if let Ok(value) = env::var(OFFLINE_ENV_VAR) {
        config.offline = parse_flag(&value);
    }
    if let Ok(name) = env::var(PLAYER_NAME_ENV_VAR) {
        if !name.is_empty() {
            config.player_name = name;
        }
    }

    Ok(config)
}

fn parse_file_config(raw: &str) -> Result<FileConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| error.to_string())
}

fn apply_file_config(config: &mut AppConfig, file: FileConfig) {
    if let Some(width) = file.window_width {
        config.window_width = width.max(1);
    }
    if let Some(height) = file.window_height {
        config.window_height = height.max(1);
    }
    if file.server.is_some() {
        config.server = file.server;
    }
    if let Some(offline) = file.offline {
        config.offline = offline;
    }
    if let Some(name) = file.player_name {
        if !name.is_empty() {
            config.player_name = name;
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

/// Session-unique id; stability is only required for the session lifetime.
fn generate_player_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or(0);
    format!("p{:x}-{:x}", process::id(), nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_overrides_only_present_fields() {
        let file = parse_file_config(
            "{\"window_width\": 800, \"offline\": true, \"player_name\": \"Ada\"}",
        )
        .expect("parse");
        let mut config = AppConfig::default();
        apply_file_config(&mut config, file);

        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 720);
        assert!(config.offline);
        assert_eq!(config.player_name, "Ada");
        assert_eq!(config.server, None);
    }

    #[test]
    fn file_config_rejects_unknown_fields_with_path() {
        let error = parse_file_config("{\"window_widht\": 800}").expect_err("unknown field");
        assert!(error.contains("window_widht"), "{error}");
    }

    #[test]
    fn empty_player_name_keeps_default() {
        let mut config = AppConfig::default();
        apply_file_config(
            &mut config,
            FileConfig {
                player_name: Some(String::new()),
                ..FileConfig::default()
            },
        );
        assert_eq!(config.player_name, "Guest");
    }

    #[test]
    fn flag_parsing_accepts_one_and_true() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn player_ids_are_non_empty_and_prefixed() {
        let id = generate_player_id();
        assert!(id.starts_with('p'));
        assert!(id.len() > 2);
    }
}
