//! Server preferences loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! public eight-player server running the built-in practice mission.
//!
//! ```toml
//! server_name = "Friday Race"
//! max_players = 8
//! private_slots = 2
//! invite_code = "marble"
//! mission = "beginner/learn_the_roll"
//! spawn_points = [[0.0, 0.0, 300.0]]
//!
//! [[missions]]
//! name = "beginner/learn_the_roll"
//! ghost_objects = ["StartPad", "EndPad"]
//!
//! [[bans]]
//! identity = "steam:1234"
//! start_time = 1700000000000
//! duration = 86400000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    AdmissionPolicy, BanEntry, BanList, Identity, Lobby, Mission, MissionCatalog, SlotPool,
    SpawnPoint, Timestamp, ValueObjectError,
};

fn default_server_name() -> String {
    "MissionLink Server".to_string()
}

fn default_max_players() -> u32 {
    8
}

fn default_pc_build() -> bool {
    true
}

fn default_mission() -> Option<String> {
    Some("beginner/learn_the_roll".to_string())
}

fn default_missions() -> Vec<Mission> {
    vec![Mission {
        name: "beginner/learn_the_roll".to_string(),
        paths: vec!["MovingPlatformPath".to_string()],
        ghost_objects: vec![
            "StartPad".to_string(),
            "EndPad".to_string(),
            "GemItem".to_string(),
        ],
        spawn_points: vec![SpawnPoint([0.0, -4.0, 301.0])],
    }]
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_players must be greater than 0")]
    NoPlayers,

    #[error("private_slots ({private_slots}) must not exceed max_players ({max_players})")]
    TooManyPrivateSlots { private_slots: u32, max_players: u32 },

    #[error("startup mission '{0}' is not listed in missions")]
    UnknownMission(String),

    #[error("invalid ban entry: {0}")]
    InvalidBan(#[from] ValueObjectError),
}

/// One `[[bans]]` table; times are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanConfig {
    pub identity: String,
    pub start_time: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Shown as host name until a local client joins
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    #[serde(default)]
    pub private_slots: u32,
    /// Only invited clients may join
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub demo_build: bool,
    #[serde(default = "default_pc_build")]
    pub pc_build: bool,
    /// Mission loaded at startup
    #[serde(default = "default_mission")]
    pub mission: Option<String>,
    #[serde(default = "default_missions")]
    pub missions: Vec<Mission>,
    /// Used for missions that define no spawn points of their own
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
    #[serde(default)]
    pub bans: Vec<BanConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            max_players: default_max_players(),
            private_slots: 0,
            private: false,
            invite_code: None,
            demo_build: false,
            pc_build: default_pc_build(),
            mission: default_mission(),
            missions: default_missions(),
            spawn_points: Vec::new(),
            bans: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load and validate a config file.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_players == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if self.private_slots > self.max_players {
            return Err(ConfigError::TooManyPrivateSlots {
                private_slots: self.private_slots,
                max_players: self.max_players,
            });
        }
        if let Some(mission) = &self.mission
            && !self.missions.iter().any(|m| &m.name == mission)
        {
            return Err(ConfigError::UnknownMission(mission.clone()));
        }
        Ok(())
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            private: self.private,
            invite_code: self.invite_code.clone(),
            demo_build: self.demo_build,
            pc_build: self.pc_build,
        }
    }

    pub fn ban_list(&self) -> Result<BanList, ConfigError> {
        let mut bans = BanList::new();
        for ban in &self.bans {
            let identity = Identity::new(ban.identity.clone())?;
            bans.ban(
                identity,
                BanEntry::new(Timestamp::new(ban.start_time), ban.duration),
            );
        }
        Ok(bans)
    }

    /// Build the initial lobby aggregate.
    pub fn lobby(&self) -> Result<Lobby, ConfigError> {
        Ok(Lobby::new(
            self.server_name.clone(),
            SlotPool::new(self.max_players, self.private_slots),
            self.admission_policy(),
            self.ban_list()?,
        ))
    }

    pub fn catalog(&self) -> MissionCatalog {
        MissionCatalog::new(self.missions.clone())
    }
}
