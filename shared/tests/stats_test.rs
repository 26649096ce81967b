//! Aggregation tests shared by the dashboard, calendar and strategy views

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::stats::{
        format_currency, group_by_day, group_by_emotion, resolve_day_detail, summarize, DayDetail,
        DayTone, ProfitFactor,
    };
    use shared::{EmotionalState, Side, Trade};
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn trade(day: &str, pnl: Option<i64>) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            strategy_id: None,
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            market: Some("crypto".to_string()),
            quantity: Decimal::ONE,
            stop_loss: None,
            take_profit: None,
            pnl: pnl.map(Decimal::from),
            trade_date: date(day),
            entry_time: None,
            exit_time: None,
            emotional_state: None,
            created_at: None,
        }
    }

    fn with_emotion(mut t: Trade, state: Option<EmotionalState>) -> Trade {
        t.emotional_state = state;
        t
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[]);
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.total_pnl, Decimal::ZERO);
        assert_eq!(summary.win_rate.to_string(), "0");
        assert_eq!(summary.profit_factor, ProfitFactor::NoProfit);
        assert_eq!(summary.profit_factor.to_string(), "0");
    }

    #[test]
    fn test_extreme_pnl_saturates() {
        let mut big = trade("2024-03-01", None);
        big.pnl = Some(Decimal::MAX);
        let mut tiny_win = trade("2024-03-02", None);
        tiny_win.pnl = Some(Decimal::new(1, 28));

        let summary = summarize(&[big.clone(), big.clone()]);
        assert_eq!(summary.total_pnl, Decimal::MAX);
        assert_eq!(summary.profit_factor, ProfitFactor::Infinite);

        let mut small = trade("2024-03-02", None);
        small.pnl = Some(-Decimal::new(1, 28));
        let summary = summarize(&[big.clone(), small]);
        assert_eq!(summary.profit_factor, ProfitFactor::Ratio(Decimal::MAX));

        let days = group_by_day(&[big.clone(), big, tiny_win]);
        assert_eq!(days[0].pnl, Decimal::MAX);
    }

    #[test]
    fn test_mixed_trades() {
        let trades = vec![
            trade("2024-03-01", Some(100)),
            trade("2024-03-01", Some(-50)),
            trade("2024-03-02", Some(25)),
        ];
        let summary = summarize(&trades);

        assert_eq!(summary.total_pnl, Decimal::from(75));
        assert_eq!(summary.gross_profit, Decimal::from(125));
        assert_eq!(summary.gross_loss, Decimal::from(50));
        assert_eq!(summary.win_rate.percent(), Decimal::new(667, 1));
        assert_eq!(summary.win_rate.to_string(), "66.7");
        assert_eq!(summary.profit_factor.ratio(), Some(Decimal::new(25, 1)));
        assert_eq!(summary.profit_factor.to_string(), "2.50");
    }

    #[test]
    fn test_missing_pnl_counts_as_zero() {
        let trades = vec![trade("2024-03-01", None), trade("2024-03-01", Some(10))];
        let summary = summarize(&trades);

        assert_eq!(summary.total_pnl, Decimal::from(10));
        assert_eq!(summary.win_rate.wins, 1);
        assert_eq!(summary.win_rate.total, 2);
        assert_eq!(summary.win_rate.to_string(), "50.0");
    }

    #[test]
    fn test_all_losing_trades_never_positive_factor() {
        let trades = vec![
            trade("2024-03-01", Some(-10)),
            trade("2024-03-02", Some(0)),
            trade("2024-03-03", None),
        ];
        let summary = summarize(&trades);

        assert_eq!(summary.profit_factor, ProfitFactor::NoProfit);
        assert_eq!(summary.profit_factor.ratio(), None);
        assert_eq!(summary.win_rate.to_string(), "0.0");
    }

    #[test]
    fn test_only_winners_is_infinite() {
        let trades = vec![trade("2024-03-01", Some(40)), trade("2024-03-02", Some(2))];
        let summary = summarize(&trades);

        assert_eq!(summary.profit_factor, ProfitFactor::Infinite);
        assert_eq!(summary.profit_factor.to_string(), "Infinite");
    }

    #[test]
    fn test_group_by_day() {
        let trades = vec![
            trade("2024-03-02", Some(7)),
            trade("2024-03-01", Some(30)),
            trade("2024-03-01", Some(-12)),
        ];
        let buckets = group_by_day(&trades);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, date("2024-03-01"));
        assert_eq!(buckets[0].trades.len(), 2);
        assert_eq!(buckets[0].pnl, Decimal::from(18));
        assert_eq!(buckets[0].tone, DayTone::Positive);
        // input order is kept inside a bucket
        assert_eq!(buckets[0].trades[0].id, trades[1].id);
        assert_eq!(buckets[0].trades[1].id, trades[2].id);
        assert_eq!(buckets[1].trades.len(), 1);
    }

    #[test]
    fn test_day_tone() {
        assert_eq!(DayTone::from_pnl(Decimal::from(-1)), DayTone::Negative);
        assert_eq!(DayTone::from_pnl(Decimal::ZERO), DayTone::Neutral);

        let buckets = group_by_day(&[trade("2024-03-05", Some(5)), trade("2024-03-05", Some(-5))]);
        assert_eq!(buckets[0].tone, DayTone::Neutral);
    }

    #[test]
    fn test_emotion_shares() {
        let trades = vec![
            with_emotion(trade("2024-03-01", Some(1)), Some(EmotionalState::Fear)),
            with_emotion(trade("2024-03-01", Some(1)), None),
            with_emotion(trade("2024-03-01", Some(1)), Some(EmotionalState::Fear)),
            with_emotion(trade("2024-03-01", Some(1)), Some(EmotionalState::Greed)),
            with_emotion(trade("2024-03-01", Some(1)), Some(EmotionalState::Neutral)),
            with_emotion(trade("2024-03-01", Some(1)), Some(EmotionalState::Confidence)),
        ];
        let shares = group_by_emotion(&trades);

        let states: Vec<EmotionalState> = shares.iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![
                EmotionalState::Fear,
                EmotionalState::Neutral,
                EmotionalState::Greed,
                EmotionalState::Confidence
            ]
        );
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[1].count, 2);
        assert_eq!(shares[0].percent, Decimal::new(333, 1));

        let total: Decimal = shares.iter().map(|s| s.percent).sum();
        assert!((total - Decimal::ONE_HUNDRED).abs() <= Decimal::new(2, 1));
    }

    #[test]
    fn test_emotion_shares_empty() {
        assert!(group_by_emotion(&[]).is_empty());
    }

    #[test]
    fn test_day_detail_resolution() {
        assert_eq!(resolve_day_detail(&[]), DayDetail::None);

        let one = trade("2024-03-01", Some(3));
        assert_eq!(resolve_day_detail(&[one.clone()]), DayDetail::Single(one));

        let many = vec![
            trade("2024-03-01", Some(3)),
            trade("2024-03-01", Some(-1)),
            trade("2024-03-01", None),
        ];
        match resolve_day_detail(&many) {
            DayDetail::Multiple(found) => assert_eq!(found, many),
            other => panic!("expected multiple, got {:?}", other),
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::new(-125, 1)), "-$12.50");
        assert_eq!(format_currency(Decimal::from(3)), "$3.00");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
        assert_eq!(format_currency(Decimal::new(10005, 3)), "$10.01");
    }
}
