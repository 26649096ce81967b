//! DatabaseBackend against an in-memory SQLite database

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use shared::entity::sessions;
    use shared::{
        DatabaseBackend, DateRange, EmotionalState, JournalBackend, JournalError, SessionEvent,
        Side, StrategyDraft, TradeDraft, TradeFilter,
    };

    async fn backend() -> DatabaseBackend {
        DatabaseBackend::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory database")
    }

    fn draft(day: &str, pnl: Option<i64>) -> TradeDraft {
        TradeDraft {
            strategy_id: None,
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            market: Some("stock".to_string()),
            quantity: Decimal::new(25, 1),
            stop_loss: None,
            take_profit: Some(Decimal::new(19050, 2)),
            pnl: pnl.map(Decimal::from),
            trade_date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            entry_time: None,
            exit_time: None,
            emotional_state: EmotionalState::Confidence,
        }
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let backend = backend().await;
        let mut events = backend.subscribe();

        let user_id = backend.sign_up("Trader@Example.com", "secret1").await.unwrap();
        let session = backend.sign_in("trader@example.com", "secret1").await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.email.as_deref(), Some("trader@example.com"));

        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedIn { user_id });

        let resolved = backend.get_session(&session.access_token).await.unwrap();
        assert_eq!(resolved.user_id, user_id);
        assert_eq!(backend.get_current_user(&session.access_token).await, Some(user_id));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let backend = backend().await;
        backend.sign_up("a@example.com", "secret1").await.unwrap();

        let wrong_password = backend.sign_in("a@example.com", "secret2").await;
        assert!(matches!(wrong_password, Err(JournalError::InvalidCredentials)));

        let unknown = backend.sign_in("b@example.com", "secret1").await;
        assert!(matches!(unknown, Err(JournalError::InvalidCredentials)));

        let duplicate = backend.sign_up("A@example.com", "secret1").await;
        assert!(matches!(duplicate, Err(JournalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_token() {
        let backend = backend().await;
        let user_id = backend.sign_up("c@example.com", "secret1").await.unwrap();
        let session = backend.sign_in("c@example.com", "secret1").await.unwrap();
        let mut events = backend.subscribe();

        backend.sign_out(&session).await;

        assert!(backend.get_session(&session.access_token).await.is_none());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut { user_id });
        assert!(backend.get_session("never-issued").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let backend = DatabaseBackend::connect("sqlite::memory:", -1)
            .await
            .expect("in-memory database");
        backend.sign_up("x@example.com", "secret1").await.unwrap();
        let session = backend.sign_in("x@example.com", "secret1").await.unwrap();
        assert_eq!(sessions::Entity::find().count(backend.connection()).await.unwrap(), 1);

        assert!(backend.get_session(&session.access_token).await.is_none());
        assert_eq!(backend.get_current_user(&session.access_token).await, None);
        assert_eq!(sessions::Entity::find().count(backend.connection()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trades_are_scoped_and_ordered() {
        let backend = backend().await;
        backend.sign_up("d@example.com", "secret1").await.unwrap();
        backend.sign_up("e@example.com", "secret1").await.unwrap();
        let owner = backend.sign_in("d@example.com", "secret1").await.unwrap();
        let other = backend.sign_in("e@example.com", "secret1").await.unwrap();

        backend.insert_trade(&owner, draft("2024-03-05", Some(10))).await.unwrap();
        backend.insert_trade(&owner, draft("2024-03-01", Some(-4))).await.unwrap();
        backend.insert_trade(&owner, draft("2024-04-02", None)).await.unwrap();
        backend.insert_trade(&other, draft("2024-03-02", Some(99))).await.unwrap();

        let all = backend.list_trades(&owner, &TradeFilter::all()).await.unwrap();
        let dates: Vec<String> = all.iter().map(|t| t.trade_date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-05", "2024-04-02"]);
        assert!(all.iter().all(|t| t.user_id == owner.user_id));
        assert_eq!(all[0].quantity, Decimal::new(25, 1));
        assert_eq!(all[0].take_profit, Some(Decimal::new(19050, 2)));
        assert_eq!(all[0].emotional_state, Some(EmotionalState::Confidence));
        assert_eq!(all[2].pnl, None);

        let march = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        let in_march = backend
            .list_trades(&owner, &TradeFilter::all().between(march))
            .await
            .unwrap();
        assert_eq!(in_march.len(), 2);

        assert_eq!(backend.count_trades(&owner).await.unwrap(), 3);
        assert_eq!(backend.count_trades(&other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_strategies_lifecycle() {
        let backend = backend().await;
        backend.sign_up("f@example.com", "secret1").await.unwrap();
        backend.sign_up("g@example.com", "secret1").await.unwrap();
        let owner = backend.sign_in("f@example.com", "secret1").await.unwrap();
        let other = backend.sign_in("g@example.com", "secret1").await.unwrap();

        let strategy = backend
            .insert_strategy(
                &owner,
                StrategyDraft {
                    name: "Breakout".to_string(),
                    rules: vec!["Wait for retest".to_string(), "Risk 1%".to_string()],
                },
            )
            .await
            .unwrap();
        assert_eq!(strategy.rules.len(), 2);

        let mut tagged = draft("2024-03-01", Some(5));
        tagged.strategy_id = Some(strategy.id);
        backend.insert_trade(&owner, tagged.clone()).await.unwrap();
        backend.insert_trade(&owner, draft("2024-03-02", Some(1))).await.unwrap();

        let for_strategy = backend
            .list_trades(&owner, &TradeFilter::all().for_strategy(strategy.id))
            .await
            .unwrap();
        assert_eq!(for_strategy.len(), 1);

        // another user can neither tag with nor delete this strategy
        let foreign = backend.insert_trade(&other, tagged).await;
        assert!(matches!(foreign, Err(JournalError::Validation(_))));
        let foreign_delete = backend.delete_strategy(&other, strategy.id).await;
        assert!(matches!(foreign_delete, Err(JournalError::NotFound)));
        assert!(backend.list_strategies(&other).await.unwrap().is_empty());

        let listed = backend.list_strategies(&owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, strategy.id);
        assert_eq!(listed[0].rules, strategy.rules);

        backend.delete_strategy(&owner, strategy.id).await.unwrap();
        assert!(backend.list_strategies(&owner).await.unwrap().is_empty());

        let orphaned = backend.list_trades(&owner, &TradeFilter::all()).await.unwrap();
        assert_eq!(orphaned.len(), 2);
        assert!(orphaned.iter().all(|t| t.strategy_id.is_none()));
    }
}
