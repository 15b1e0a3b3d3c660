//! Configuration management
//!
//! Every knob of the consensus pipeline lives in [`EngineConfig`], which is
//! passed explicitly into each calculation. [`ActiveConfig`] is the optional
//! call-site toggle for UIs that want a single classic/advanced switch.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub defaults: CalculatorDefaults,
}

impl Config {
    /// Load from a TOML file (optional) with `CONSENSUS__*` env overrides
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = shellexpand::tilde(path).into_owned();
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(&path).required(false))
            .add_source(
                ::config::Environment::with_prefix("CONSENSUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }
}

/// Market-side defaults used by the CLI when flags are omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorDefaults {
    #[serde(default = "default_bankroll")]
    pub bankroll: Decimal,
    #[serde(default = "default_market_price")]
    pub market_price: f64,
}

fn default_bankroll() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_market_price() -> f64 {
    50.0
}

impl Default for CalculatorDefaults {
    fn default() -> Self {
        Self {
            bankroll: default_bankroll(),
            market_price: default_market_price(),
        }
    }
}

/// The classic/advanced switch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Classic,
    Advanced,
}

/// Named pipeline variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// v1: saturating tanh weights, gravity ratio, multi-signal confidence
    Gravity,
    /// v2: softmax with influence cap, Bayesian confidence, moment band, decay
    Bayesian,
    /// Smart-Edge classic: exponential weights, hard edge cutoffs
    Classic,
    /// Smart-Edge advanced: log weights, power-scaled confidence, smoothing
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingStrategy {
    /// exp(score / k), unbounded for large scores
    Exponential,
    /// sign(score) * ln(1 + |score|)
    Logarithmic,
    /// 0.5 + 0.5 * tanh(score / 40) on a log2 position base
    Saturating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    GravityRatio,
    Softmax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceStrategy {
    MultiSignal,
    Bayesian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyStrategy {
    Wilson,
    Moments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayFormula {
    /// c * exp(-days / half_life): e^-1 remains after one "half-life"
    Exponential,
    /// c * exp(-ln2 * days / half_life): true half-life
    HalfLife,
}

/// Per-trader weighting constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightingConfig {
    #[serde(default = "default_weighting_strategy")]
    pub strategy: WeightingStrategy,
    /// k in exp(score / k)
    #[serde(default = "default_exp_scale")]
    pub exp_scale: f64,
    /// Divisor inside the saturating tanh
    #[serde(default = "default_tanh_scale")]
    pub tanh_scale: f64,
    /// Coefficient applied to the entry-price advantage
    #[serde(default = "default_entry_coefficient")]
    pub entry_coefficient: f64,
    /// Ownership fraction at which the whale bonus applies
    #[serde(default = "default_whale_threshold")]
    pub whale_threshold: f64,
    #[serde(default = "default_whale_bonus")]
    pub whale_bonus: f64,
}

fn default_weighting_strategy() -> WeightingStrategy {
    WeightingStrategy::Exponential
}
fn default_exp_scale() -> f64 {
    25.0
}
fn default_tanh_scale() -> f64 {
    40.0
}
fn default_entry_coefficient() -> f64 {
    0.4
}
fn default_whale_threshold() -> f64 {
    0.05
}
fn default_whale_bonus() -> f64 {
    1.2
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            strategy: default_weighting_strategy(),
            exp_scale: default_exp_scale(),
            tanh_scale: default_tanh_scale(),
            entry_coefficient: default_entry_coefficient(),
            whale_threshold: default_whale_threshold(),
            whale_bonus: default_whale_bonus(),
        }
    }
}

/// Softmax temperature heuristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureConfig {
    #[serde(default = "default_base_temperature")]
    pub base: f64,
    /// Multiplies log2(max(2, N))
    #[serde(default = "default_size_weight")]
    pub size_weight: f64,
    /// Multiplies robust_dispersion^0.8
    #[serde(default = "default_dispersion_weight")]
    pub dispersion_weight: f64,
    #[serde(default = "default_min_temperature")]
    pub min: f64,
    #[serde(default = "default_max_temperature")]
    pub max: f64,
}

fn default_base_temperature() -> f64 {
    0.15
}
fn default_size_weight() -> f64 {
    0.05
}
fn default_dispersion_weight() -> f64 {
    0.5
}
fn default_min_temperature() -> f64 {
    0.05
}
fn default_max_temperature() -> f64 {
    2.0
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            base: default_base_temperature(),
            size_weight: default_size_weight(),
            dispersion_weight: default_dispersion_weight(),
            min: default_min_temperature(),
            max: default_max_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_aggregation_strategy")]
    pub strategy: AggregationStrategy,
    /// Keep only the N most influential traders (0 = keep all)
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Maximum influence share of a single trader (softmax only)
    #[serde(default = "default_influence_cap")]
    pub influence_cap: f64,
    #[serde(default)]
    pub temperature: TemperatureConfig,
}

fn default_aggregation_strategy() -> AggregationStrategy {
    AggregationStrategy::GravityRatio
}
fn default_top_n() -> usize {
    200
}
fn default_influence_cap() -> f64 {
    0.12
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            strategy: default_aggregation_strategy(),
            top_n: default_top_n(),
            influence_cap: default_influence_cap(),
            temperature: TemperatureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_confidence_strategy")]
    pub strategy: ConfidenceStrategy,
    /// Traders above this score count as "smart money" for the skew signal
    #[serde(default = "default_smart_threshold")]
    pub smart_threshold: f64,
    #[serde(default = "default_skew_weight")]
    pub skew_weight: f64,
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,
    #[serde(default = "default_concentration_weight")]
    pub concentration_weight: f64,
    /// Exponent applied to the combined signal (advanced mode: 0.6)
    #[serde(default)]
    pub power: Option<f64>,
    /// Bayesian pseudo-count m
    #[serde(default = "default_prior_strength")]
    pub prior_strength: f64,
    #[serde(default = "default_prior_probability")]
    pub prior_probability: f64,
}

fn default_confidence_strategy() -> ConfidenceStrategy {
    ConfidenceStrategy::MultiSignal
}
fn default_smart_threshold() -> f64 {
    70.0
}
fn default_skew_weight() -> f64 {
    0.5
}
fn default_score_weight() -> f64 {
    0.3
}
fn default_concentration_weight() -> f64 {
    0.2
}
fn default_prior_strength() -> f64 {
    10.0
}
fn default_prior_probability() -> f64 {
    0.5
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            strategy: default_confidence_strategy(),
            smart_threshold: default_smart_threshold(),
            skew_weight: default_skew_weight(),
            score_weight: default_score_weight(),
            concentration_weight: default_concentration_weight(),
            power: None,
            prior_strength: default_prior_strength(),
            prior_probability: default_prior_probability(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncertaintyConfig {
    #[serde(default = "default_uncertainty_strategy")]
    pub strategy: UncertaintyStrategy,
    #[serde(default = "default_z")]
    pub z: f64,
    #[serde(default = "default_max_margin")]
    pub max_margin: f64,
    /// Bounds for the Wilson band (the moment band uses [0, 1])
    #[serde(default = "default_range_floor")]
    pub floor: f64,
    #[serde(default = "default_range_ceiling")]
    pub ceiling: f64,
}

fn default_uncertainty_strategy() -> UncertaintyStrategy {
    UncertaintyStrategy::Wilson
}
fn default_z() -> f64 {
    crate::stats::Z_95
}
fn default_max_margin() -> f64 {
    0.20
}
fn default_range_floor() -> f64 {
    0.025
}
fn default_range_ceiling() -> f64 {
    0.975
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            strategy: default_uncertainty_strategy(),
            z: default_z(),
            max_margin: default_max_margin(),
            floor: default_range_floor(),
            ceiling: default_range_ceiling(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,
    #[serde(default = "default_decay_formula")]
    pub formula: DecayFormula,
}

fn default_half_life_days() -> f64 {
    7.0
}
fn default_decay_formula() -> DecayFormula {
    DecayFormula::Exponential
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            half_life_days: default_half_life_days(),
            formula: default_decay_formula(),
        }
    }
}

/// Minimum edge required to bet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeThreshold {
    /// One threshold per confidence tier
    Tiered { high: f64, medium: f64, low: f64 },
    Flat(f64),
}

impl Default for EdgeThreshold {
    fn default() -> Self {
        EdgeThreshold::Tiered {
            high: 0.15,
            medium: 0.20,
            low: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier (0.25 = quarter Kelly)
    #[serde(default = "default_kelly_multiplier")]
    pub multiplier: f64,
    /// Shrink edges below 5% to |edge|^1.5
    #[serde(default)]
    pub edge_scaling: bool,
    #[serde(default)]
    pub edge_threshold: EdgeThreshold,
    /// Confidence needed for each tier
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,
    #[serde(default = "default_medium_confidence")]
    pub medium_confidence: f64,
    #[serde(default = "default_low_confidence")]
    pub low_confidence: f64,
    /// Bankroll cap per tier
    #[serde(default = "default_high_cap")]
    pub high_cap: f64,
    #[serde(default = "default_medium_cap")]
    pub medium_cap: f64,
    #[serde(default = "default_low_cap")]
    pub low_cap: f64,
}

fn default_kelly_multiplier() -> f64 {
    0.25
}
fn default_high_confidence() -> f64 {
    0.7
}
fn default_medium_confidence() -> f64 {
    0.5
}
fn default_low_confidence() -> f64 {
    0.3
}
fn default_high_cap() -> f64 {
    0.10
}
fn default_medium_cap() -> f64 {
    0.05
}
fn default_low_cap() -> f64 {
    0.02
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            multiplier: default_kelly_multiplier(),
            edge_scaling: false,
            edge_threshold: EdgeThreshold::default(),
            high_confidence: default_high_confidence(),
            medium_confidence: default_medium_confidence(),
            low_confidence: default_low_confidence(),
            high_cap: default_high_cap(),
            medium_cap: default_medium_cap(),
            low_cap: default_low_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    #[serde(default = "default_arbitrage_threshold")]
    pub threshold: f64,
    /// Logistic ramp instead of a hard cutoff
    #[serde(default)]
    pub smoothing: bool,
    #[serde(default = "default_steepness")]
    pub steepness: f64,
    #[serde(default = "default_kelly_multiplier")]
    pub kelly_fraction: f64,
}

fn default_arbitrage_threshold() -> f64 {
    0.02
}
fn default_steepness() -> f64 {
    20.0
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            threshold: default_arbitrage_threshold(),
            smoothing: false,
            steepness: default_steepness(),
            kelly_fraction: default_kelly_multiplier(),
        }
    }
}

/// Complete configuration of one consensus evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub weighting: WeightingConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,
    #[serde(default)]
    pub decay: DecayConfig,
    #[serde(default)]
    pub kelly: KellyConfig,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::preset(Preset::Classic)
    }
}

impl EngineConfig {
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            mode: Mode::Classic,
            weighting: WeightingConfig::default(),
            aggregation: AggregationConfig::default(),
            confidence: ConfidenceConfig::default(),
            uncertainty: UncertaintyConfig::default(),
            decay: DecayConfig::default(),
            kelly: KellyConfig::default(),
            arbitrage: ArbitrageConfig::default(),
        };

        match preset {
            Preset::Classic => base,
            Preset::Advanced => base.with_mode(Mode::Advanced),
            Preset::Gravity => {
                let mut cfg = base;
                cfg.weighting.strategy = WeightingStrategy::Saturating;
                cfg.kelly.edge_threshold = EdgeThreshold::Flat(0.01);
                cfg
            }
            Preset::Bayesian => {
                let mut cfg = base;
                cfg.weighting.strategy = WeightingStrategy::Logarithmic;
                cfg.aggregation.strategy = AggregationStrategy::Softmax;
                cfg.confidence.strategy = ConfidenceStrategy::Bayesian;
                cfg.uncertainty.strategy = UncertaintyStrategy::Moments;
                cfg.decay.enabled = true;
                cfg
            }
        }
    }

    /// Apply the classic/advanced toggles on top of this config
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        match mode {
            Mode::Classic => {
                if self.weighting.strategy == WeightingStrategy::Logarithmic {
                    self.weighting.strategy = WeightingStrategy::Exponential;
                }
                self.confidence.power = None;
                self.kelly.edge_scaling = false;
                self.arbitrage.smoothing = false;
            }
            Mode::Advanced => {
                if self.weighting.strategy == WeightingStrategy::Exponential {
                    self.weighting.strategy = WeightingStrategy::Logarithmic;
                }
                self.confidence.power = Some(0.6);
                self.kelly.edge_scaling = true;
                self.arbitrage.smoothing = true;
            }
        }
        self
    }

    /// Reject settings that would break the pipeline's invariants
    pub fn validate(&self) -> Result<()> {
        let cap = self.aggregation.influence_cap;
        if !(cap > 0.0 && cap <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "influence_cap must be in (0, 1], got {}",
                cap
            )));
        }

        let t = &self.aggregation.temperature;
        if !(t.min > 0.0 && t.min <= t.max) {
            return Err(Error::InvalidConfig(format!(
                "temperature bounds must satisfy 0 < min <= max, got [{}, {}]",
                t.min, t.max
            )));
        }

        if self.weighting.exp_scale <= 0.0 || self.weighting.tanh_scale <= 0.0 {
            return Err(Error::InvalidConfig(
                "weighting scales must be positive".to_string(),
            ));
        }

        let c = &self.confidence;
        if c.skew_weight < 0.0 || c.score_weight < 0.0 || c.concentration_weight < 0.0 {
            return Err(Error::InvalidConfig(
                "confidence signal weights must be non-negative".to_string(),
            ));
        }
        if let Some(power) = c.power {
            if power <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "confidence power must be positive, got {}",
                    power
                )));
            }
        }
        if c.prior_strength < 0.0 || !(0.0..=1.0).contains(&c.prior_probability) {
            return Err(Error::InvalidConfig(
                "Bayesian prior must have strength >= 0 and probability in [0, 1]".to_string(),
            ));
        }

        let u = &self.uncertainty;
        if !(0.0 <= u.floor && u.floor < u.ceiling && u.ceiling <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "probability range bounds invalid: [{}, {}]",
                u.floor, u.ceiling
            )));
        }

        let k = &self.kelly;
        if k.multiplier < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "kelly multiplier must be non-negative, got {}",
                k.multiplier
            )));
        }
        for cap in [k.high_cap, k.medium_cap, k.low_cap] {
            if !(0.0..=1.0).contains(&cap) {
                return Err(Error::InvalidConfig(format!(
                    "bankroll caps must be in [0, 1], got {}",
                    cap
                )));
            }
        }
        if !(k.low_confidence <= k.medium_confidence && k.medium_confidence <= k.high_confidence) {
            return Err(Error::InvalidConfig(
                "confidence tiers must satisfy low <= medium <= high".to_string(),
            ));
        }

        if self.arbitrage.threshold < 0.0 || self.arbitrage.kelly_fraction < 0.0 {
            return Err(Error::InvalidConfig(
                "arbitrage threshold and kelly fraction must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Shared, switchable configuration held at the call-site boundary
///
/// Readers take an `Arc` snapshot, so a mode switch never changes the config
/// of a calculation that is already running.
#[derive(Debug, Clone)]
pub struct ActiveConfig {
    inner: Arc<RwLock<Arc<EngineConfig>>>,
}

impl ActiveConfig {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    pub fn snapshot(&self) -> Arc<EngineConfig> {
        self.inner.read().clone()
    }

    pub fn mode(&self) -> Mode {
        self.inner.read().mode
    }

    pub fn set_mode(&self, mode: Mode) {
        let mut guard = self.inner.write();
        let next = (**guard).clone().with_mode(mode);
        *guard = Arc::new(next);
        tracing::info!("Active consensus mode set to {:?}", mode);
    }

    /// Apply an edit; the edit is discarded if the result fails validation
    pub fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut guard = self.inner.write();
        let mut next = (**guard).clone();
        edit(&mut next);
        next.validate()?;
        *guard = Arc::new(next);
        Ok(())
    }
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(EngineConfig::default()))),
        }
    }
}
