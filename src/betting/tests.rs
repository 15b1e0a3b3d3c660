//! Unit tests for Kelly sizing, the basic calculator, arbitrage and hedging

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::{ArbitrageConfig, EdgeThreshold, KellyConfig};
    use crate::types::{to_cents, BetSide, ConfidenceTier};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_confidence_tiers_and_caps() {
        let cfg = KellyConfig::default();
        assert_eq!(confidence_tier(0.85, &cfg), ConfidenceTier::High);
        assert_eq!(confidence_tier(0.7, &cfg), ConfidenceTier::High);
        assert_eq!(confidence_tier(0.6, &cfg), ConfidenceTier::Medium);
        assert_eq!(confidence_tier(0.3, &cfg), ConfidenceTier::Low);
        assert_eq!(confidence_tier(0.29, &cfg), ConfidenceTier::None);

        assert_eq!(tier_cap(ConfidenceTier::High, &cfg), 0.10);
        assert_eq!(tier_cap(ConfidenceTier::Medium, &cfg), 0.05);
        assert_eq!(tier_cap(ConfidenceTier::Low, &cfg), 0.02);
        assert_eq!(tier_cap(ConfidenceTier::None, &cfg), 0.0);
    }

    #[test]
    fn test_edge_thresholds() {
        let tiered = EdgeThreshold::default();
        assert_eq!(edge_threshold(ConfidenceTier::High, &tiered), 0.15);
        assert_eq!(edge_threshold(ConfidenceTier::Medium, &tiered), 0.20);
        assert_eq!(edge_threshold(ConfidenceTier::Low, &tiered), 0.25);

        let flat = EdgeThreshold::Flat(0.01);
        assert_eq!(edge_threshold(ConfidenceTier::High, &flat), 0.01);
        assert_eq!(edge_threshold(ConfidenceTier::Low, &flat), 0.01);
    }

    #[test]
    fn test_relative_edge_sign_convention() {
        let (side, edge) = relative_edge(0.8, 0.5);
        assert_eq!(side, BetSide::Yes);
        assert!((edge - 0.6).abs() < 1e-9);

        let (side, edge) = relative_edge(0.2, 0.5);
        assert_eq!(side, BetSide::No);
        assert!((edge + 0.6).abs() < 1e-9);

        let (side, edge) = relative_edge(0.5, 0.5);
        assert_eq!(side, BetSide::None);
        assert_eq!(edge, 0.0);
    }

    #[test]
    fn test_kelly_fraction_matches_closed_form() {
        // f* = (p - m) / (1 - m)
        let (side, edge) = relative_edge(0.7, 0.4);
        let f = kelly_fraction(side, edge, 0.4, false);
        assert!((f - 0.5).abs() < 1e-9);

        let (side, edge) = relative_edge(0.3, 0.6);
        let f = kelly_fraction(side, edge, 0.6, false);
        // NO side: (m - p) / m
        assert!((f - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_edge_scaling_shrinks_small_edges_only() {
        let plain = kelly_fraction(BetSide::Yes, 0.04, 0.5, false);
        let scaled = kelly_fraction(BetSide::Yes, 0.04, 0.5, true);
        assert!((plain - 0.04).abs() < 1e-12);
        assert!((scaled - 0.008).abs() < 1e-12);

        let big_plain = kelly_fraction(BetSide::Yes, 0.3, 0.5, false);
        let big_scaled = kelly_fraction(BetSide::Yes, 0.3, 0.5, true);
        assert_eq!(big_plain, big_scaled);
    }

    #[test]
    fn test_kelly_at_certain_market_price_is_zero() {
        assert_eq!(kelly_fraction(BetSide::Yes, 0.5, 1.0, false), 0.0);
        assert_eq!(kelly_fraction(BetSide::No, 0.5, 0.0, false), 0.0);
    }

    #[test]
    fn test_recommendation_no_favorable_side() {
        let rec = kelly_recommendation(0.5, 0.5, dec!(1000), 0.9, &KellyConfig::default());
        assert_eq!(rec.bet_side, BetSide::None);
        assert!(!rec.should_bet);
        assert_eq!(rec.recommended_bet_size, dec!(0));
        assert!(rec.reasoning.starts_with("No favorable side"));
    }

    #[test]
    fn test_certain_market_price_has_no_edge() {
        assert_eq!(relative_edge(0.9, 0.0), (BetSide::None, 0.0));
        assert_eq!(relative_edge(0.1, 1.0), (BetSide::None, 0.0));
        assert_eq!(relative_edge(0.1, -0.2), (BetSide::None, 0.0));
        assert!(is_certain_price(1.0));
        assert!(!is_certain_price(0.999));

        for (p, m) in [(0.9, 0.0), (0.1, 1.0)] {
            let rec = kelly_recommendation(p, m, dec!(1000), 0.9, &KellyConfig::default());
            assert_eq!(rec.bet_side, BetSide::None);
            assert_eq!(rec.edge, 0.0);
            assert_eq!(rec.kelly_fraction, 0.0);
            assert!(!rec.should_bet);
            assert_eq!(rec.recommended_bet_size, dec!(0));
            assert!(rec.reasoning.starts_with("Certain market price"));
        }
    }

    #[test]
    fn test_recommendation_low_confidence_blocks_bet() {
        let rec = kelly_recommendation(0.8, 0.5, dec!(1000), 0.2, &KellyConfig::default());
        assert_eq!(rec.bet_side, BetSide::Yes);
        assert_eq!(rec.confidence_tier, ConfidenceTier::None);
        assert!(!rec.should_bet);
        assert_eq!(rec.recommended_bet_size, dec!(0));
        assert!(rec.reasoning.starts_with("Confidence too low"));
    }

    #[test]
    fn test_recommendation_small_edge_blocks_bet() {
        // 10% relative edge under the 15% high-tier threshold
        let rec = kelly_recommendation(0.55, 0.5, dec!(1000), 0.8, &KellyConfig::default());
        assert!(!rec.should_bet);
        assert!(rec.reasoning.starts_with("Edge too small"));
        assert!(rec.kelly_fraction > 0.0);
    }

    #[test]
    fn test_recommendation_capped_by_tier() {
        // f* = 0.6, quarter Kelly 0.15, high tier cap 0.10
        let rec = kelly_recommendation(0.8, 0.5, dec!(1000), 0.8, &KellyConfig::default());
        assert!(rec.should_bet);
        assert_eq!(rec.bet_side, BetSide::Yes);
        assert!((rec.safe_fraction - 0.15).abs() < 1e-9);
        assert_eq!(rec.recommended_bet_size, dec!(100));
        assert!(rec.reasoning.starts_with("Bet YES"));
        assert!(rec.reasoning.contains("capped at 10%"));
    }

    #[test]
    fn test_recommendation_no_side_medium_tier() {
        let rec = kelly_recommendation(0.2, 0.5, dec!(1000), 0.6, &KellyConfig::default());
        assert!(rec.should_bet);
        assert_eq!(rec.bet_side, BetSide::No);
        assert!(rec.edge < 0.0);
        assert_eq!(rec.confidence_tier, ConfidenceTier::Medium);
        assert_eq!(rec.recommended_bet_size, dec!(50));
    }

    #[test]
    fn test_recommendation_uncapped_stake() {
        let cfg = KellyConfig {
            edge_threshold: EdgeThreshold::Flat(0.01),
            ..KellyConfig::default()
        };
        // f* = (0.55 - 0.5) / 0.5 = 0.1, quarter Kelly 0.025, cap 0.10
        let rec = kelly_recommendation(0.55, 0.5, dec!(1000), 0.8, &cfg);
        assert!(rec.should_bet);
        assert_eq!(rec.recommended_bet_size, dec!(25));
        assert!(!rec.reasoning.contains("capped"));
    }

    #[test]
    fn test_zero_multiplier_yields_no_stake() {
        let cfg = KellyConfig {
            multiplier: 0.0,
            ..KellyConfig::default()
        };
        let rec = kelly_recommendation(0.8, 0.5, dec!(1000), 0.8, &cfg);
        assert!(!rec.should_bet);
        assert_eq!(rec.reasoning, "Kelly sizing returned no stake");
    }

    #[test]
    fn test_stake_never_exceeds_tier_cap() {
        let mut rng = StdRng::seed_from_u64(17);
        for scaling in [false, true] {
            let cfg = KellyConfig {
                edge_scaling: scaling,
                edge_threshold: EdgeThreshold::Flat(0.0),
                ..KellyConfig::default()
            };
            for _ in 0..500 {
                let p = rng.random_range(0.0..=1.0);
                let m = rng.random_range(0.01..=0.99);
                let conf = rng.random_range(0.0..=1.0);
                let bankroll = Decimal::from(rng.random_range(0i64..100_000));

                let rec = kelly_recommendation(p, m, bankroll, conf, &cfg);
                let limit = to_cents(rec.tier_cap * bankroll.to_f64().unwrap_or(0.0));
                assert!(rec.recommended_bet_size >= dec!(0));
                assert!(rec.recommended_bet_size <= limit);
                if !rec.should_bet {
                    assert_eq!(rec.recommended_bet_size, dec!(0));
                }
            }
        }
    }

    #[test]
    fn test_basic_kelly_negative_edge_on_yes() {
        // gravity 0.2 -> p = 0.6 against a 63¢ market
        let input = BasicKellyInput {
            market_price_cents: 63.0,
            gravity_score: 0.2,
            bankroll: dec!(1000),
            bet_type: BetSide::Yes,
        };
        let res = basic_kelly(&input, &BasicKellyConfig::default());
        assert!((res.probability - 0.6).abs() < 1e-12);
        assert!((res.edge + 0.047619).abs() < 1e-4);
        assert_eq!(res.final_bet, dec!(0));
        assert!(res.reasoning.contains("below"));
    }

    #[test]
    fn test_basic_kelly_positive_edge_on_no() {
        let input = BasicKellyInput {
            market_price_cents: 63.0,
            gravity_score: 0.2,
            bankroll: dec!(1000),
            bet_type: BetSide::No,
        };
        let res = basic_kelly(&input, &BasicKellyConfig::default());
        assert!((res.edge - 0.081081).abs() < 1e-4);
        assert!((res.kelly_fraction - 0.047619).abs() < 1e-4);
        assert!(!res.high_volatility);
        assert_eq!(res.final_bet, dec!(11.90));
        assert!(res.final_bet <= dec!(50));
    }

    #[test]
    fn test_basic_kelly_volatility_discount_and_cap() {
        let input = BasicKellyInput {
            market_price_cents: 10.0,
            gravity_score: 0.8,
            bankroll: dec!(1000),
            bet_type: BetSide::Yes,
        };
        let res = basic_kelly(&input, &BasicKellyConfig::default());
        assert!(res.high_volatility);
        // raw edge 8.0 halved
        assert!((res.edge - 4.0).abs() < 1e-9);
        assert_eq!(res.final_bet, dec!(50));
    }

    #[test]
    fn test_basic_kelly_minimum_bet() {
        let input = BasicKellyInput {
            market_price_cents: 63.0,
            gravity_score: 0.2,
            bankroll: dec!(10),
            bet_type: BetSide::No,
        };
        let res = basic_kelly(&input, &BasicKellyConfig::default());
        assert_eq!(res.final_bet, dec!(0));
        assert!(res.reasoning.contains("minimum bet"));
    }

    #[test]
    fn test_arbitrage_classic_cutoff() {
        let cfg = ArbitrageConfig::default();

        let hit = arbitrage_signal(0.6, 0.5, dec!(1000), &cfg);
        assert!(hit.has_edge);
        assert_eq!(hit.side, BetSide::Yes);
        assert_eq!(hit.stake, dec!(25));
        assert!((hit.yes_edge + hit.no_edge).abs() < 1e-12);

        let miss = arbitrage_signal(0.51, 0.5, dec!(1000), &cfg);
        assert!(!miss.has_edge);
        assert_eq!(miss.side, BetSide::None);
        assert_eq!(miss.stake, dec!(0));
    }

    #[test]
    fn test_arbitrage_smoothing_has_no_hard_cutoff() {
        let cfg = ArbitrageConfig {
            smoothing: true,
            ..ArbitrageConfig::default()
        };
        let sig = arbitrage_signal(0.51, 0.5, dec!(1000), &cfg);
        assert!(sig.has_edge);
        assert!(sig.effective_edge > 0.0 && sig.effective_edge < 0.01);
        assert_eq!(sig.stake, dec!(1.12));
    }

    #[test]
    fn test_arbitrage_no_side_and_zero_edge() {
        let cfg = ArbitrageConfig::default();
        let no = arbitrage_signal(0.4, 0.5, dec!(1000), &cfg);
        assert_eq!(no.side, BetSide::No);
        assert!(no.no_edge > 0.0);

        for smoothing in [false, true] {
            let cfg = ArbitrageConfig {
                smoothing,
                ..ArbitrageConfig::default()
            };
            let flat = arbitrage_signal(0.5, 0.5, dec!(1000), &cfg);
            assert!(!flat.has_edge);
            assert_eq!(flat.effective_edge, 0.0);
        }
    }

    #[test]
    fn test_hedge_locks_in_profit() {
        let res = hedge(dec!(8), dec!(79), dec!(2.50)).unwrap();
        assert_eq!(res.total_cost, dec!(0.87));
        assert!(res.arbitrage);
        assert_eq!(res.amount_yes + res.amount_no, dec!(2.50));
        assert!(res.net_if_yes > dec!(0));
        assert!(res.net_if_no > dec!(0));
        assert!(res.net_if_yes.min(res.net_if_no) >= dec!(0.35));
    }

    #[test]
    fn test_hedge_without_arbitrage_loses() {
        let res = hedge(dec!(55), dec!(50), dec!(100)).unwrap();
        assert!(!res.arbitrage);
        assert!(res.net_if_yes < dec!(0));
        assert!(res.net_if_no < dec!(0));
        assert!(res.roi < dec!(0));
    }

    #[test]
    fn test_hedge_rejects_invalid_prices() {
        assert!(hedge(dec!(0), dec!(50), dec!(10)).is_err());
        assert!(hedge(dec!(50), dec!(100), dec!(10)).is_err());
        assert!(hedge(dec!(-5), dec!(50), dec!(10)).is_err());
        assert!(hedge(dec!(40), dec!(50), dec!(-1)).is_err());
    }
}
