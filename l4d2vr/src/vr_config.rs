// Typed engine tunables, parsed from a flat `key=value` file.
//
// Every field is parsed on its own: a missing key or an unparsable value is
// reported and replaced by that field's default, without affecting the rest.

use std::{collections::HashMap, fmt, fs, path::Path, sync::Arc};

use cgmath::{vec3, Vector3};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::{
    error::{ConfigError, FieldError},
    math::Angles,
    turn::TurnMode,
};

pub const DEFAULT_CONFIG_FILE: &str = "VR/config.txt";

/// AimMode value that asks the host to draw a laser sight at the aim point
pub const AIM_MODE_LASER_SIGHT: i32 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub snap_turning: bool,
    pub snap_turn_angle: f32,
    /// Smooth turn rate, degrees per millisecond
    pub turn_speed: f32,
    pub left_handed: bool,
    /// World units per metre
    pub vr_scale: f32,
    pub ipd_scale: f32,
    pub six_dof: bool,
    pub aim_mode: i32,
    pub anti_aliasing: i32,
    pub viewmodel_pos_custom_offset: Vector3<f32>,
    pub viewmodel_ang_custom_offset: Angles,

    // Only consulted when the `hud_overlay` experimental feature is on
    pub hud_distance: f32,
    pub hud_size: f32,
    pub hud_always_visible: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            snap_turning: false,
            snap_turn_angle: 45.0,
            turn_speed: 0.15,
            left_handed: false,
            vr_scale: 43.2,
            ipd_scale: 1.0,
            six_dof: true,
            aim_mode: AIM_MODE_LASER_SIGHT,
            anti_aliasing: 0,
            viewmodel_pos_custom_offset: vec3(0.0, 0.0, 0.0),
            viewmodel_ang_custom_offset: Angles::zero(),
            hud_distance: 1.3,
            hud_size: 4.0,
            hud_always_visible: false,
        }
    }
}

impl EngineConfig {
    pub fn turn_mode(&self) -> TurnMode {
        if self.snap_turning {
            TurnMode::Snap {
                angle: self.snap_turn_angle,
            }
        } else {
            TurnMode::Smooth {
                degrees_per_ms: self.turn_speed,
            }
        }
    }

    pub fn draws_laser_sight(&self) -> bool {
        self.aim_mode == AIM_MODE_LASER_SIGHT
    }
}

///
/// Handle to the live configuration. The frame loop takes one snapshot per
/// frame; the watcher replaces the whole config at once, so a snapshot never
/// mixes fields from two reloads.
///
#[derive(Clone, Debug, Default)]
pub struct LiveConfig {
    current: Arc<RwLock<Arc<EngineConfig>>>,
}

impl LiveConfig {
    pub fn new(config: EngineConfig) -> LiveConfig {
        LiveConfig {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn snapshot(&self) -> Arc<EngineConfig> {
        self.current.read().clone()
    }

    pub fn replace(&self, config: EngineConfig) {
        *self.current.write() = Arc::new(config);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldOutcome {
    Parsed,
    Missing,
    Invalid { raw: String, error: FieldError },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldReport {
    pub key: String,
    pub outcome: FieldOutcome,
    /// The value that ended up in the config, formatted for logging
    pub applied: String,
}

#[derive(Clone, Debug)]
pub struct LoadReport {
    pub config: EngineConfig,
    pub fields: Vec<FieldReport>,
}

impl LoadReport {
    /// Fields that fell back to their default
    pub fn diagnostics(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields
            .iter()
            .filter(|f| f.outcome != FieldOutcome::Parsed)
    }

    pub fn field(&self, key: &str) -> Option<&FieldReport> {
        self.fields.iter().find(|f| f.key == key)
    }
}

pub trait ConfigValue: Sized + fmt::Display {
    fn parse_value(raw: &str) -> Result<Self, FieldError>;
}

impl ConfigValue for bool {
    fn parse_value(raw: &str) -> Result<Self, FieldError> {
        match raw {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(FieldError::InvalidBool(raw.to_owned())),
        }
    }
}

impl ConfigValue for f32 {
    fn parse_value(raw: &str) -> Result<Self, FieldError> {
        Ok(raw.parse::<f32>()?)
    }
}

impl ConfigValue for i32 {
    fn parse_value(raw: &str) -> Result<Self, FieldError> {
        Ok(raw.parse::<i32>()?)
    }
}

///
/// Splits config text into raw key/value pairs. Anything after `#` is a
/// comment; lines without `=` are ignored.
///
pub fn parse_config(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();

    for line in text.lines() {
        let Some((key, rest)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() || key.starts_with('#') {
            continue;
        }

        let value = rest.split('#').next().unwrap_or("").trim();
        entries.insert(key.to_owned(), value.to_owned());
    }

    entries
}

struct FieldParser<'a> {
    entries: &'a HashMap<String, String>,
    fields: Vec<FieldReport>,
}

impl<'a> FieldParser<'a> {
    fn new(entries: &'a HashMap<String, String>) -> FieldParser<'a> {
        FieldParser {
            entries,
            fields: Vec::new(),
        }
    }

    fn field<T: ConfigValue>(&mut self, key: &str, default: T) -> T {
        let (value, outcome) = match self.entries.get(key) {
            None => {
                warn!("Config entry with key '{key}' missing -- reverting to default value of '{default}'");
                (default, FieldOutcome::Missing)
            }
            Some(raw) => match T::parse_value(raw) {
                Ok(value) => (value, FieldOutcome::Parsed),
                Err(error) => {
                    warn!("Error parsing config entry with key '{key}' -- reverting to default value of '{default}' -- error: ({error})");
                    (
                        default,
                        FieldOutcome::Invalid {
                            raw: raw.to_owned(),
                            error,
                        },
                    )
                }
            },
        };

        info!("Setting '{key}' to '{value}'");
        self.fields.push(FieldReport {
            key: key.to_owned(),
            outcome,
            applied: value.to_string(),
        });
        value
    }

    /// Three independently defaulted components read from `<prefix>X/Y/Z`
    fn xyz(&mut self, prefix: &str) -> Vector3<f32> {
        vec3(
            self.field(&format!("{prefix}X"), 0.0f32),
            self.field(&format!("{prefix}Y"), 0.0f32),
            self.field(&format!("{prefix}Z"), 0.0f32),
        )
    }
}

pub fn load_from_str(text: &str) -> Result<LoadReport, ConfigError> {
    let entries = parse_config(text);

    if entries.is_empty() {
        return Err(ConfigError::Empty);
    }

    let defaults = EngineConfig::default();
    let mut parser = FieldParser::new(&entries);

    let config = EngineConfig {
        snap_turning: parser.field("SnapTurning", defaults.snap_turning),
        snap_turn_angle: parser.field("SnapTurnAngle", defaults.snap_turn_angle),
        turn_speed: parser.field("TurnSpeed", defaults.turn_speed),
        left_handed: parser.field("LeftHanded", defaults.left_handed),
        vr_scale: parser.field("VRScale", defaults.vr_scale),
        ipd_scale: parser.field("IPDScale", defaults.ipd_scale),
        six_dof: parser.field("6DOF", defaults.six_dof),
        aim_mode: parser.field("AimMode", defaults.aim_mode),
        anti_aliasing: parser.field("AntiAliasing", defaults.anti_aliasing),
        viewmodel_pos_custom_offset: parser.xyz("ViewmodelPosCustomOffset"),
        viewmodel_ang_custom_offset: Angles::from_vec3(parser.xyz("ViewmodelAngCustomOffset")),
        // Optional HUD tunables are only reported when present
        hud_distance: optional_field(&mut parser, "HudDistance", defaults.hud_distance),
        hud_size: optional_field(&mut parser, "HudSize", defaults.hud_size),
        hud_always_visible: optional_field(
            &mut parser,
            "HudAlwaysVisible",
            defaults.hud_always_visible,
        ),
    };

    Ok(LoadReport {
        config,
        fields: parser.fields,
    })
}

fn optional_field<T: ConfigValue>(parser: &mut FieldParser, key: &str, default: T) -> T {
    if parser.entries.contains_key(key) {
        parser.field(key, default)
    } else {
        default
    }
}

pub fn load(path: &Path) -> Result<LoadReport, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&text)
}
