//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_engine_config_default_is_classic() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, Mode::Classic);
        assert_eq!(config.weighting.strategy, WeightingStrategy::Exponential);
        assert_eq!(config.aggregation.strategy, AggregationStrategy::GravityRatio);
        assert_eq!(config.confidence.strategy, ConfidenceStrategy::MultiSignal);
        assert_eq!(config.uncertainty.strategy, UncertaintyStrategy::Wilson);
        assert!(!config.decay.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weighting_config_defaults() {
        let config = WeightingConfig::default();
        assert_eq!(config.exp_scale, 25.0);
        assert_eq!(config.tanh_scale, 40.0);
        assert_eq!(config.entry_coefficient, 0.4);
        assert_eq!(config.whale_threshold, 0.05);
        assert_eq!(config.whale_bonus, 1.2);
    }

    #[test]
    fn test_aggregation_config_defaults() {
        let config: AggregationConfig = toml::from_str("").unwrap();
        assert_eq!(config.top_n, 200);
        assert_eq!(config.influence_cap, 0.12);
        assert_eq!(config.temperature.base, 0.15);
        assert_eq!(config.temperature.size_weight, 0.05);
        assert_eq!(config.temperature.dispersion_weight, 0.5);
        assert_eq!(config.temperature.min, 0.05);
        assert_eq!(config.temperature.max, 2.0);
    }

    #[test]
    fn test_kelly_config_defaults() {
        let config = KellyConfig::default();
        assert_eq!(config.multiplier, 0.25);
        assert!(!config.edge_scaling);
        assert_eq!(
            config.edge_threshold,
            EdgeThreshold::Tiered {
                high: 0.15,
                medium: 0.20,
                low: 0.25
            }
        );
        assert_eq!(config.high_cap, 0.10);
        assert_eq!(config.medium_cap, 0.05);
        assert_eq!(config.low_cap, 0.02);
    }

    #[test]
    fn test_confidence_and_uncertainty_defaults() {
        let confidence = ConfidenceConfig::default();
        assert_eq!(confidence.smart_threshold, 70.0);
        assert_eq!(confidence.power, None);
        assert_eq!(confidence.prior_strength, 10.0);

        let uncertainty = UncertaintyConfig::default();
        assert_eq!(uncertainty.z, 1.96);
        assert_eq!(uncertainty.max_margin, 0.2);
        assert_eq!(uncertainty.floor, 0.025);
        assert_eq!(uncertainty.ceiling, 0.975);
    }

    #[test]
    fn test_engine_config_from_toml() {
        let toml_str = r#"
mode = "advanced"

[weighting]
strategy = "logarithmic"

[aggregation]
strategy = "softmax"
influence_cap = 0.2

[aggregation.temperature]
base = 0.3

[kelly]
edge_threshold = { flat = 0.05 }

[decay]
enabled = true
formula = "half_life"
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.mode, Mode::Advanced);
        assert_eq!(config.weighting.strategy, WeightingStrategy::Logarithmic);
        assert_eq!(config.aggregation.strategy, AggregationStrategy::Softmax);
        assert_eq!(config.aggregation.influence_cap, 0.2);
        assert_eq!(config.aggregation.temperature.base, 0.3);
        assert_eq!(config.aggregation.temperature.max, 2.0);
        assert_eq!(config.kelly.edge_threshold, EdgeThreshold::Flat(0.05));
        assert!(config.decay.enabled);
        assert_eq!(config.decay.formula, DecayFormula::HalfLife);
        assert_eq!(config.decay.half_life_days, 7.0);
    }

    #[test]
    fn test_presets() {
        let gravity = EngineConfig::preset(Preset::Gravity);
        assert_eq!(gravity.weighting.strategy, WeightingStrategy::Saturating);
        assert_eq!(gravity.kelly.edge_threshold, EdgeThreshold::Flat(0.01));

        let bayesian = EngineConfig::preset(Preset::Bayesian);
        assert_eq!(bayesian.aggregation.strategy, AggregationStrategy::Softmax);
        assert_eq!(bayesian.confidence.strategy, ConfidenceStrategy::Bayesian);
        assert_eq!(bayesian.uncertainty.strategy, UncertaintyStrategy::Moments);
        assert!(bayesian.decay.enabled);

        let advanced = EngineConfig::preset(Preset::Advanced);
        assert_eq!(advanced.mode, Mode::Advanced);
        assert_eq!(advanced.weighting.strategy, WeightingStrategy::Logarithmic);

        for preset in [Preset::Gravity, Preset::Bayesian, Preset::Classic, Preset::Advanced] {
            assert!(EngineConfig::preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_with_mode_toggles() {
        let advanced = EngineConfig::default().with_mode(Mode::Advanced);
        assert_eq!(advanced.weighting.strategy, WeightingStrategy::Logarithmic);
        assert_eq!(advanced.confidence.power, Some(0.6));
        assert!(advanced.kelly.edge_scaling);
        assert!(advanced.arbitrage.smoothing);

        let classic = advanced.with_mode(Mode::Classic);
        assert_eq!(classic.weighting.strategy, WeightingStrategy::Exponential);
        assert_eq!(classic.confidence.power, None);
        assert!(!classic.kelly.edge_scaling);
        assert!(!classic.arbitrage.smoothing);
    }

    #[test]
    fn test_with_mode_keeps_saturating_weights() {
        let config = EngineConfig::preset(Preset::Gravity).with_mode(Mode::Advanced);
        assert_eq!(config.weighting.strategy, WeightingStrategy::Saturating);
        assert!(config.kelly.edge_scaling);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut EngineConfig)>> = vec![
            Box::new(|c| c.aggregation.influence_cap = 0.0),
            Box::new(|c| c.aggregation.influence_cap = 1.5),
            Box::new(|c| c.aggregation.temperature.min = 0.0),
            Box::new(|c| c.aggregation.temperature.max = 0.01),
            Box::new(|c| c.weighting.exp_scale = 0.0),
            Box::new(|c| c.confidence.skew_weight = -0.1),
            Box::new(|c| c.confidence.power = Some(0.0)),
            Box::new(|c| c.confidence.prior_probability = 1.5),
            Box::new(|c| c.uncertainty.floor = 0.98),
            Box::new(|c| c.kelly.multiplier = -0.25),
            Box::new(|c| c.kelly.high_cap = 1.1),
            Box::new(|c| c.kelly.low_confidence = 0.8),
            Box::new(|c| c.arbitrage.threshold = -0.01),
        ];

        for edit in cases {
            let mut config = EngineConfig::default();
            edit(&mut config);
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_active_config_snapshot_isolation() {
        let active = ActiveConfig::default();
        let before = active.snapshot();

        active.set_mode(Mode::Advanced);
        assert_eq!(before.mode, Mode::Classic);
        assert_eq!(active.mode(), Mode::Advanced);
        assert!(active.snapshot().kelly.edge_scaling);
    }

    #[test]
    fn test_active_config_update_validates() {
        let active = ActiveConfig::new(EngineConfig::default()).unwrap();

        active.update(|c| c.aggregation.top_n = 50).unwrap();
        assert_eq!(active.snapshot().aggregation.top_n, 50);

        let result = active.update(|c| c.aggregation.influence_cap = -1.0);
        assert!(result.is_err());
        assert_eq!(active.snapshot().aggregation.influence_cap, 0.12);
    }

    #[test]
    fn test_active_config_rejects_invalid_initial() {
        let mut config = EngineConfig::default();
        config.kelly.multiplier = -1.0;
        assert!(ActiveConfig::new(config).is_err());
    }

    #[test]
    fn test_calculator_defaults() {
        let defaults = CalculatorDefaults::default();
        assert_eq!(defaults.bankroll, dec!(1000));
        assert_eq!(defaults.market_price, 50.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consensus.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[engine]
mode = "advanced"

[engine.kelly]
multiplier = 0.5

[defaults]
bankroll = 2500
market_price = 35.0
"#
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.engine.mode, Mode::Advanced);
        assert_eq!(config.engine.kelly.multiplier, 0.5);
        assert_eq!(config.defaults.bankroll, dec!(2500));
        assert_eq!(config.defaults.market_price, 35.0);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.engine.mode, Mode::Classic);
        assert_eq!(config.defaults.bankroll, dec!(1000));
    }

    #[test]
    fn test_load_rejects_invalid_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[engine.aggregation]\ninfluence_cap = 2.0\n").unwrap();

        assert!(Config::load(path.to_str().unwrap()).is_err());
    }
}
