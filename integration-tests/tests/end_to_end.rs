//! End-to-end scenarios: strategy commands in, venue events back, engine
//! state observed through the database and the strategy subscriber.

use chrono::Duration;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use exec_core::engine::{
    AmendOrder, CancelOrder, EngineError, ExecutionEvent, SubmitOrder, TradingCommand,
};
use exec_core::indicators::WindowedMinMaxPrices;
use exec_core::orders::{
    Order, OrderError, OrderSide, OrderStatus, PositionSide, TimeInForce,
};

use integration_tests::{
    accepted_event, cl, epoch, fill_event, instrument, px, qty, strategy_id, submitted_event,
    Fixture,
};

fn market(order_id: &str, side: OrderSide, quantity: rust_decimal::Decimal) -> Order {
    Order::market(instrument(), side, qty(quantity))
        .with_strategy_id(strategy_id())
        .with_client_order_id(cl(order_id))
        .with_ts_init(epoch())
        .build()
        .unwrap()
}

/// Scenario: market buy, single fill.
#[tokio::test]
async fn market_buy_single_fill() {
    let mut f = Fixture::new();
    let t = epoch();

    f.engine
        .execute(SubmitOrder::new(market("A", OrderSide::Buy, dec!(100)), t).into())
        .await
        .unwrap();

    // Venue echoes the full lifecycle; the redundant Submitted echo is
    // dropped by the state machine without stalling the stream
    f.engine.process(submitted_event("A", t)).await.unwrap();
    f.engine
        .process(accepted_event("A", "V-100", t + Duration::milliseconds(1)))
        .await
        .unwrap();
    f.engine
        .process(fill_event(
            "A",
            "E-1",
            OrderSide::Buy,
            dec!(100),
            dec!(10.00),
            t + Duration::milliseconds(2),
        ))
        .await
        .unwrap();

    let order = f.database.load_order(&cl("A")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.filled_qty, qty(dec!(100)));
    assert_eq!(order.avg_px, Some(px(dec!(10.00))));

    let positions = f.database.load_positions().await.unwrap();
    assert_eq!(positions.len(), 1);
    let position = positions.values().next().unwrap();
    assert_eq!(position.side, PositionSide::Long);
    assert_eq!(position.quantity, qty(dec!(100)));
    assert_eq!(position.avg_open_px, dec!(10.00));

    // Filled order has left the working index; position is in the open index
    assert!(f.database.load_working_order_ids().await.unwrap().is_empty());
    assert_eq!(f.database.load_open_position_ids().await.unwrap().len(), 1);
}

/// Scenario: partial fill then completion, quantity-weighted average.
#[tokio::test]
async fn partial_then_complete() {
    let mut f = Fixture::new();
    let t = epoch();

    f.engine
        .execute(SubmitOrder::new(market("B", OrderSide::Buy, dec!(100)), t).into())
        .await
        .unwrap();
    f.engine.process(accepted_event("B", "V-2", t)).await.unwrap();

    f.engine
        .process(fill_event("B", "E-1", OrderSide::Buy, dec!(40), dec!(10.00), t))
        .await
        .unwrap();
    let order = f.database.load_order(&cl("B")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::PartiallyFilled);

    f.engine
        .process(fill_event("B", "E-2", OrderSide::Buy, dec!(60), dec!(10.50), t))
        .await
        .unwrap();
    let order = f.database.load_order(&cl("B")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    // (40*10.00 + 60*10.50) / 100 = 10.30
    assert_eq!(order.avg_px, Some(px(dec!(10.30))));
}

/// Scenario: opposing fill larger than the open quantity flips the position.
#[tokio::test]
async fn position_flip() {
    let mut f = Fixture::new();
    let t = epoch();

    f.engine
        .execute(SubmitOrder::new(market("C-1", OrderSide::Buy, dec!(100)), t).into())
        .await
        .unwrap();
    f.engine.process(accepted_event("C-1", "V-1", t)).await.unwrap();
    f.engine
        .process(fill_event("C-1", "E-1", OrderSide::Buy, dec!(100), dec!(10.00), t))
        .await
        .unwrap();

    f.engine
        .execute(SubmitOrder::new(market("C-2", OrderSide::Sell, dec!(150)), t).into())
        .await
        .unwrap();
    f.engine.process(accepted_event("C-2", "V-2", t)).await.unwrap();
    f.engine
        .process(fill_event("C-2", "E-2", OrderSide::Sell, dec!(150), dec!(11.00), t))
        .await
        .unwrap();

    let positions = f.database.load_positions().await.unwrap();
    assert_eq!(positions.len(), 1);
    let position = positions.values().next().unwrap();
    assert_eq!(position.side, PositionSide::Short);
    assert_eq!(position.quantity, qty(dec!(50)));
    assert_eq!(position.avg_open_px, dec!(11.00));
    // (11.00 - 10.00) * 100 closed on the long leg
    assert_eq!(position.realized_pnl, dec!(100.00));
}

/// Scenario: a duplicated fill event is a no-op everywhere.
#[tokio::test]
async fn duplicate_fill_is_noop() {
    let mut f = Fixture::new();
    let t = epoch();

    f.engine
        .execute(SubmitOrder::new(market("D", OrderSide::Buy, dec!(100)), t).into())
        .await
        .unwrap();
    f.engine.process(accepted_event("D", "V-1", t)).await.unwrap();

    let fill = fill_event("D", "X", OrderSide::Buy, dec!(30), dec!(10.00), t);
    f.engine.process(fill.clone()).await.unwrap();
    f.engine.process(fill).await.unwrap();

    let order = f.database.load_order(&cl("D")).await.unwrap().unwrap();
    assert_eq!(order.filled_qty, qty(dec!(30)));
    assert_eq!(order.execution_ids.len(), 1);

    let positions = f.database.load_positions().await.unwrap();
    let position = positions.values().next().unwrap();
    assert_eq!(position.quantity, qty(dec!(30)));
    assert_eq!(position.trade_ids.len(), 1);
}

/// Scenario: amending a market order is refused and state is unchanged.
#[tokio::test]
async fn amend_market_rejected() {
    let mut f = Fixture::new();
    let t = epoch();

    f.engine
        .execute(SubmitOrder::new(market("E", OrderSide::Buy, dec!(100)), t).into())
        .await
        .unwrap();
    let before = f.database.load_order(&cl("E")).await.unwrap().unwrap();

    let result = f
        .engine
        .execute(
            AmendOrder::new(strategy_id(), cl("E"), Some(qty(dec!(50))), None, t).into(),
        )
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Order(OrderError::AmendNotSupported { .. }))
    ));

    let after = f.database.load_order(&cl("E")).await.unwrap().unwrap();
    assert_eq!(after, before);
    // Only the submit reached the venue
    assert_eq!(f.venue.commands().len(), 1);
}

/// Scenario: windowed min/max over a 60s horizon.
#[test]
fn windowed_min_max() {
    let mut window = WindowedMinMaxPrices::new(Duration::seconds(60));
    let t = epoch();
    window.add(t, px(dec!(100)));
    window.add(t + Duration::seconds(20), px(dec!(98)));
    window.add(t + Duration::seconds(40), px(dec!(102)));
    window.add(t + Duration::seconds(70), px(dec!(99)));

    // Cutoff is t+10s: the t+0 observation has expired
    assert_eq!(window.min_price(), Some(px(dec!(98))));
    assert_eq!(window.max_price(), Some(px(dec!(102))));
}

/// A cancel racing the venue ack is held back and emitted on acceptance.
#[tokio::test]
async fn queued_cancel_round_trip() {
    let mut f = Fixture::new();
    let t = epoch();

    f.engine
        .execute(SubmitOrder::new(market("F", OrderSide::Buy, dec!(10)), t).into())
        .await
        .unwrap();
    f.engine
        .execute(CancelOrder::new(strategy_id(), cl("F"), t).into())
        .await
        .unwrap();
    assert_eq!(f.venue.commands().len(), 1);

    f.engine.process(accepted_event("F", "V-9", t)).await.unwrap();
    let commands = f.venue.commands();
    assert_eq!(commands.len(), 2);
    assert!(matches!(commands[1], TradingCommand::Cancel(_)));
}

/// Full wiring: strategies and the venue feed channels, the engine consumes
/// both on a single task.
#[tokio::test]
async fn run_loop_processes_channels() {
    let f = Fixture::new();
    let database = f.database.clone();
    let strategy = f.strategy.clone();
    let t = epoch();

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine_task = tokio::spawn(f.engine.run(command_rx, event_rx));

    command_tx
        .send(SubmitOrder::new(market("G", OrderSide::Buy, dec!(5)), t).into())
        .unwrap();
    // Wait until the engine task has recorded the submission so the venue
    // events find the order
    let mut submitted = false;
    for _ in 0..200 {
        if let Some(order) = database.load_order(&cl("G")).await.unwrap() {
            if order.status == OrderStatus::Submitted {
                submitted = true;
                break;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert!(submitted, "engine did not record the submission in time");
    event_tx.send(accepted_event("G", "V-1", t)).unwrap();
    event_tx
        .send(fill_event("G", "E-1", OrderSide::Buy, dec!(5), dec!(10.00), t))
        .unwrap();

    drop(command_tx);
    drop(event_tx);
    engine_task.await.unwrap();

    let order = database.load_order(&cl("G")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(strategy.kinds(), vec!["Submitted", "Accepted", "Filled"]);
}

/// IOC market orders are accepted by validation; GTD market orders are not.
#[test]
fn market_time_in_force_validation() {
    let ok = Order::market(instrument(), OrderSide::Buy, qty(dec!(1)))
        .with_strategy_id(strategy_id())
        .with_time_in_force(TimeInForce::IOC)
        .with_ts_init(epoch())
        .build();
    assert!(ok.is_ok());

    let bad = Order::market(instrument(), OrderSide::Buy, qty(dec!(1)))
        .with_strategy_id(strategy_id())
        .with_expire_time(epoch() + Duration::hours(1))
        .with_ts_init(epoch())
        .build();
    assert!(bad.is_err());
}

/// Events round-trip through the wire-neutral envelope.
#[test]
fn event_envelope_round_trip() {
    let event = fill_event("H", "E-7", OrderSide::Sell, dec!(2), dec!(99.50), epoch());
    let json = serde_json::to_string(&event).unwrap();
    let back: ExecutionEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}
