//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::game::physics::Arena;
use crate::game::room::RoomSettings;
use crate::game::HitResolution;

/// Server configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Directory served at the root path
    pub static_dir: PathBuf,
    /// Page served at `/game`
    pub game_page: PathBuf,

    /// Room ticks per second
    pub tick_rate: u32,
    /// Scan for collisions on every tick
    pub server_collisions: bool,
    pub hit_resolution: HitResolution,
    /// Inbound messages per second per connection (0 = unlimited)
    pub input_rate_limit: u32,
    /// Outbound fan-out buffer, in messages
    pub broadcast_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR when a host platform provides it
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let tick_rate: u32 = parse_var("TICK_RATE", 60)?;
        if tick_rate == 0 {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),
            game_page: env::var("GAME_PAGE")
                .unwrap_or_else(|_| "public/game.html".to_string())
                .into(),

            tick_rate,
            server_collisions: parse_flag("SERVER_COLLISIONS", true)?,
            hit_resolution: parse_var("HIT_RESOLUTION", HitResolution::default())?,
            input_rate_limit: parse_var("INPUT_RATE_LIMIT", 0)?,
            broadcast_capacity: parse_var("BROADCAST_CAPACITY", 256)?,
        })
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            tick_rate: self.tick_rate,
            server_collisions: self.server_collisions,
            hit_resolution: self.hit_resolution,
            arena: Arena::default(),
            broadcast_capacity: self.broadcast_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
            static_dir: "public".into(),
            game_page: "public/game.html".into(),
            tick_rate: 60,
            server_collisions: true,
            hit_resolution: HitResolution::default(),
            input_rate_limit: 0,
            broadcast_capacity: 256,
        }
    }
}

/// What the client does when the player asks to play again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Send resetPlayer on the same connection
    #[default]
    Reset,
    /// Drop the connection and join again with a fresh identity
    Reload,
}

impl FromStr for ReplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "reload" => Ok(Self::Reload),
            other => Err(format!("unknown replay mode '{}'", other)),
        }
    }
}

/// Headless client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// WebSocket endpoint of the server
    pub server_url: String,
    pub log_level: String,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Animation frames per second
    pub frame_rate: u32,
    /// Show the game-over affordance only once per death
    pub game_over_once: bool,
    pub replay: ReplayMode,
    /// Ask the server for a collision scan every frame
    pub poll_collisions: bool,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let frame_rate: u32 = parse_var("FRAME_RATE", 60)?;
        if frame_rate == 0 {
            return Err(ConfigError::Invalid("FRAME_RATE"));
        }

        Ok(Self {
            server_url: env::var("ARENA_SERVER_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            canvas_width: parse_var("CANVAS_WIDTH", 900.0)?,
            canvas_height: parse_var("CANVAS_HEIGHT", 600.0)?,
            frame_rate,
            game_over_once: parse_flag("GAME_OVER_ONCE", true)?,
            replay: parse_var("REPLAY_MODE", ReplayMode::default())?,
            poll_collisions: parse_flag("POLL_COLLISIONS", true)?,
        })
    }

    /// The visible play area
    pub fn arena(&self) -> Arena {
        Arena {
            width: self.canvas_width,
            height: self.canvas_height,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3000/ws".to_string(),
            log_level: "info".to_string(),
            canvas_width: 900.0,
            canvas_height: 600.0,
            frame_rate: 60,
            game_over_once: true,
            replay: ReplayMode::default(),
            poll_collisions: true,
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid(name))
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => flag_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn flag_value(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(name)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(flag_value("X", "Yes").unwrap());
        assert!(!flag_value("X", " off ").unwrap());
        assert!(matches!(flag_value("X", "maybe"), Err(ConfigError::Invalid("X"))));
    }

    #[test]
    fn values_parse_through_from_str() {
        assert_eq!(parse_value::<u32>("TICK_RATE", " 30 ").unwrap(), 30);
        assert_eq!(
            parse_value::<HitResolution>("HIT_RESOLUTION", "first_only").unwrap(),
            HitResolution::FirstOnly
        );
        assert_eq!(
            parse_value::<ReplayMode>("REPLAY_MODE", "reload").unwrap(),
            ReplayMode::Reload
        );
        assert!(parse_value::<u32>("TICK_RATE", "fast").is_err());
    }

    #[test]
    fn room_settings_follow_config() {
        let config = Config {
            tick_rate: 20,
            server_collisions: false,
            hit_resolution: HitResolution::FirstOnly,
            ..Config::default()
        };
        let settings = config.room_settings();
        assert_eq!(settings.tick_rate, 20);
        assert!(!settings.server_collisions);
        assert_eq!(settings.hit_resolution, HitResolution::FirstOnly);
    }

    #[test]
    fn client_arena_tracks_canvas() {
        let config = ClientConfig {
            canvas_width: 640.0,
            canvas_height: 480.0,
            ..ClientConfig::default()
        };
        assert_eq!(config.arena().ground_y(), 380.0);
    }
}
