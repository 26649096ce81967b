//! Month navigation and grid layout tests

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::calendar::{CalendarGrid, Month};
    use shared::stats::DayTone;
    use shared::{Side, Trade};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trade(day: NaiveDate, pnl: i64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            strategy_id: None,
            symbol: "EURUSD".to_string(),
            side: Side::Sell,
            market: Some("forex".to_string()),
            quantity: Decimal::ONE,
            stop_loss: None,
            take_profit: None,
            pnl: Some(Decimal::from(pnl)),
            trade_date: day,
            entry_time: None,
            exit_time: None,
            emotional_state: None,
            created_at: None,
        }
    }

    #[test]
    fn test_month_bounds() {
        let feb = Month::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert_eq!(feb.days().count(), 29);

        let range = feb.date_range();
        assert!(range.contains(date(2024, 2, 29)));
        assert!(!range.contains(date(2024, 3, 1)));

        assert!(Month::new(2024, 13).is_none());
    }

    #[test]
    fn test_month_navigation_rolls_over_years() {
        let jan = Month::new(2024, 1).unwrap();
        assert_eq!(jan.previous(), Month::new(2023, 12).unwrap());
        assert_eq!(Month::new(2023, 12).unwrap().next(), jan);
        assert_eq!(Month::containing(date(2024, 3, 17)), Month::new(2024, 3).unwrap());
    }

    #[test]
    fn test_month_parse_and_format() {
        let month: Month = "2024-03".parse().unwrap();
        assert_eq!(month.to_string(), "2024-03");
        assert_eq!(month.title(), "March 2024");
        assert!("2024-3x".parse::<Month>().is_err());
        assert!("".parse::<Month>().is_err());
    }

    #[test]
    fn test_grid_layout_is_sunday_first() {
        // 1 March 2024 is a Friday
        let march = Month::new(2024, 3).unwrap();
        let grid = CalendarGrid::build(march, &[], date(2024, 3, 10));

        assert!(grid.weeks.iter().all(|w| w.len() == 7));
        assert_eq!(grid.weeks[0].iter().take_while(|c| c.is_none()).count(), 5);
        assert_eq!(grid.weeks[0][5].as_ref().unwrap().date, date(2024, 3, 1));

        let cells = grid.weeks.iter().flatten().flatten().count();
        assert_eq!(cells, 31);
        assert!(grid.cell(date(2024, 3, 10)).unwrap().is_today);
        assert!(!grid.cell(date(2024, 3, 11)).unwrap().is_today);
    }

    #[test]
    fn test_grid_totals_per_day() {
        let march = Month::new(2024, 3).unwrap();
        let trades = vec![
            trade(date(2024, 3, 1), 40),
            trade(date(2024, 3, 1), -10),
            trade(date(2024, 3, 2), -5),
            trade(date(2024, 4, 1), 1000),
        ];
        let grid = CalendarGrid::build(march, &trades, date(2024, 1, 1));

        let first = grid.cell(date(2024, 3, 1)).unwrap();
        assert_eq!(first.trade_count, 2);
        assert_eq!(first.pnl, Decimal::from(30));
        assert_eq!(first.tone, DayTone::Positive);

        let second = grid.cell(date(2024, 3, 2)).unwrap();
        assert_eq!(second.tone, DayTone::Negative);

        let empty = grid.cell(date(2024, 3, 3)).unwrap();
        assert_eq!(empty.trade_count, 0);
        assert_eq!(empty.tone, DayTone::Neutral);

        assert!(grid.cell(date(2024, 4, 1)).is_none());
    }
}
