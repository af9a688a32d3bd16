use super::error::MoveError;
use super::moves::angle::BondAngleMove;
use super::moves::bond_length::BondLengthMove;
use super::moves::growth::ChainGrowthMove;
use super::moves::ring_regrow::RingRegrowMove;
use super::moves::rotate::RotateMove;
use super::moves::stretch::StretchMove;
use super::moves::torsion::TorsionMove;
use super::moves::torsion_multi::TorsionMultiMove;
use super::moves::translate::TranslateMove;
use super::moves::MonteCarloMove;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be positive and finite, got {value}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthMode {
    Chain,
    Tree,
    Ring,
}

/// Contact distance between beads `i` and `j`.
#[derive(Clone)]
pub enum PairSigma {
    Uniform(f64),
    Table(Vec<Vec<f64>>),
    Custom(Arc<dyn Fn(usize, usize) -> f64 + Send + Sync>),
}

impl PairSigma {
    pub fn sigma(&self, i: usize, j: usize) -> f64 {
        match self {
            PairSigma::Uniform(sigma) => *sigma,
            PairSigma::Table(table) => table[i][j],
            PairSigma::Custom(f) => f(i, j),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PairSigma::Uniform(sigma) => require_positive("sigma", *sigma),
            PairSigma::Table(table) => {
                let n = table.len();
                for (i, row) in table.iter().enumerate() {
                    if row.len() != n {
                        return Err(invalid("sigma", "pair table must be square"));
                    }
                    for (j, &s) in row.iter().enumerate() {
                        require_positive("sigma", s)?;
                        if s != table[j][i] {
                            return Err(invalid("sigma", format!("pair table is asymmetric at ({i}, {j})")));
                        }
                    }
                }
                Ok(())
            }
            PairSigma::Custom(_) => Ok(()),
        }
    }
}

impl Default for PairSigma {
    fn default() -> Self {
        PairSigma::Uniform(1.0)
    }
}

impl fmt::Debug for PairSigma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairSigma::Uniform(sigma) => f.debug_tuple("Uniform").field(sigma).finish(),
            PairSigma::Table(table) => f.debug_tuple("Table").field(table).finish(),
            PairSigma::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SigmaSpec {
    Uniform(f64),
    Table(Vec<Vec<f64>>),
}

impl<'de> Deserialize<'de> for PairSigma {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match SigmaSpec::deserialize(deserializer)? {
            SigmaSpec::Uniform(sigma) => PairSigma::Uniform(sigma),
            SigmaSpec::Table(table) => PairSigma::Table(table),
        })
    }
}

/// Distribution of one chain or tree bond.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum BondModel {
    /// Uniform inside the sphere of radius `sigma`.
    #[default]
    HardSphere,
    /// Uniform core plus a `(sigma / r)^power` tail.
    PowerTail { power: f64 },
    /// Uniform core plus a uniform attractive shell out to `lambda * sigma`,
    /// weighted by the square-well Mayer function at `temperature`.
    SquareWell { lambda: f64, temperature: f64 },
}

impl BondModel {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            BondModel::HardSphere => Ok(()),
            BondModel::PowerTail { power } => {
                if power.is_finite() && power > 3.0 {
                    Ok(())
                } else {
                    Err(invalid("power", format!("must exceed 3, got {power}")))
                }
            }
            BondModel::SquareWell {
                lambda,
                temperature,
            } => {
                require_positive("temperature", temperature)?;
                if lambda.is_finite() && lambda > 1.0 {
                    Ok(())
                } else {
                    Err(invalid("lambda", format!("must exceed 1, got {lambda}")))
                }
            }
        }
    }
}

/// What a sampled bead position is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTarget {
    /// Every leaf atom of the box is a bead.
    #[default]
    Atoms,
    /// Every molecule is a bead; it is translated rigidly so its first atom
    /// lands on the sampled position.
    Molecules,
}

pub const DEFAULT_MAX_ATTEMPTS: u64 = 1_000_000;

fn default_max_attempts() -> u64 {
    DEFAULT_MAX_ATTEMPTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrowthConfig {
    pub mode: GrowthMode,
    #[serde(default)]
    pub sigma: PairSigma,
    #[serde(default)]
    pub bond: BondModel,
    #[serde(default)]
    pub target: GrowthTarget,
    /// Cap on every rejection loop of a single insertion.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,
}

impl GrowthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sigma.validate()?;
        self.bond.validate()?;
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if self.mode == GrowthMode::Ring {
            if !matches!(self.sigma, PairSigma::Uniform(_)) {
                return Err(invalid("sigma", "ring growth needs a uniform sigma"));
            }
            if self.bond != BondModel::HardSphere {
                return Err(invalid("bond", "ring growth only supports hard-sphere bonds"));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct GrowthConfigBuilder {
    mode: Option<GrowthMode>,
    sigma: Option<PairSigma>,
    bond: Option<BondModel>,
    target: Option<GrowthTarget>,
    max_attempts: Option<u64>,
}

impl GrowthConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: GrowthMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn sigma(mut self, sigma: PairSigma) -> Self {
        self.sigma = Some(sigma);
        self
    }
    pub fn bond(mut self, bond: BondModel) -> Self {
        self.bond = Some(bond);
        self
    }
    pub fn target(mut self, target: GrowthTarget) -> Self {
        self.target = Some(target);
        self
    }
    pub fn max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn build(self) -> Result<GrowthConfig, ConfigError> {
        let config = GrowthConfig {
            mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
            sigma: self.sigma.unwrap_or_default(),
            bond: self.bond.unwrap_or_default(),
            target: self.target.unwrap_or_default(),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_scale() -> f64 {
    1.0
}

/// One move of a move set, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveSpec {
    Translate { step: f64 },
    Rotate { step: f64 },
    BondAngle { step: f64 },
    Stretch { step: f64 },
    Torsion { step: f64 },
    TorsionMulti { step: f64 },
    BondLength { step: f64 },
    ChainGrowth(GrowthConfig),
    RingRegrow {
        spring: f64,
        #[serde(default = "default_scale")]
        scale: f64,
    },
}

impl MoveSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            MoveSpec::Translate { step }
            | MoveSpec::Rotate { step }
            | MoveSpec::BondAngle { step }
            | MoveSpec::Stretch { step }
            | MoveSpec::Torsion { step }
            | MoveSpec::TorsionMulti { step }
            | MoveSpec::BondLength { step } => require_positive("step", *step),
            MoveSpec::ChainGrowth(config) => config.validate(),
            MoveSpec::RingRegrow { spring, scale } => {
                require_positive("spring", *spring)?;
                require_positive("scale", *scale)
            }
        }
    }

    /// Validates the parameters and creates the unbound move.
    pub fn build(&self) -> Result<Box<dyn MonteCarloMove>, MoveError> {
        self.validate()?;
        Ok(match self {
            MoveSpec::Translate { step } => Box::new(TranslateMove::new(*step)),
            MoveSpec::Rotate { step } => Box::new(RotateMove::new(*step)),
            MoveSpec::BondAngle { step } => Box::new(BondAngleMove::new(*step)),
            MoveSpec::Stretch { step } => Box::new(StretchMove::new(*step)),
            MoveSpec::Torsion { step } => Box::new(TorsionMove::new(*step)),
            MoveSpec::TorsionMulti { step } => Box::new(TorsionMultiMove::new(*step)),
            MoveSpec::BondLength { step } => Box::new(BondLengthMove::new(*step)),
            MoveSpec::ChainGrowth(config) => Box::new(ChainGrowthMove::new(config.clone())?),
            MoveSpec::RingRegrow { spring, scale } => Box::new(RingRegrowMove::new(*spring, *scale)),
        })
    }
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightedMoveSpec {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(flatten)]
    pub spec: MoveSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveSetConfig {
    pub moves: Vec<WeightedMoveSpec>,
}

impl MoveSetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.moves.is_empty() {
            return Err(ConfigError::MissingParameter("moves"));
        }
        for entry in &self.moves {
            require_positive("weight", entry.weight)?;
            entry.spec.validate()?;
        }
        Ok(())
    }
}

/// Reads and validates a move set from a TOML file.
pub fn load_move_set(path: &Path) -> Result<MoveSetConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    let config: MoveSetConfig = toml::from_str(&content).map_err(|e| ConfigError::Toml {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    config.validate()?;
    debug!(moves = config.moves.len(), path = %path.display(), "loaded move set");
    Ok(config)
}
