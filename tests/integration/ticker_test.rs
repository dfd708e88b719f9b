//! Integration tests for the ticker lifecycle

use commodity_ticker::config::Config;
use commodity_ticker::instrument::{default_instruments, Instrument, PriceBounds, PriceFormat};
use commodity_ticker::ticker::{
    FixedDelta, FluctuationGenerator, ManualScheduler, Snapshot, Ticker, TickerState,
    TokioScheduler, UniformDelta,
};
use parking_lot::Mutex;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn recorder(ticker: &Ticker) -> Arc<Mutex<Vec<Snapshot>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    ticker.subscribe(move |snapshot| s.lock().push(snapshot.clone()));
    seen
}

#[test]
fn test_clamping_invariant_holds_for_default_set() {
    let scheduler = ManualScheduler::new();
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(UniformDelta::seeded(9, 0.02)),
        Arc::new(scheduler.clone()),
    )
    .unwrap();

    ticker.start(Duration::from_millis(5000));
    scheduler.advance(Duration::from_millis(5000 * 2000));

    for instrument in default_instruments() {
        let price = ticker.price(&instrument.symbol).unwrap();
        assert!(
            instrument.bounds.contains(price),
            "{} escaped bounds: {}",
            instrument.symbol,
            price
        );
    }
    assert_eq!(ticker.current_prices().seq, 2001);
}

#[test]
fn test_snapshot_order_matches_configuration() {
    let scheduler = ManualScheduler::new();
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(UniformDelta::seeded(1, 0.02)),
        Arc::new(scheduler.clone()),
    )
    .unwrap();
    let seen = recorder(&ticker);

    ticker.start(Duration::from_secs(1));
    scheduler.advance(Duration::from_secs(3));

    let expected: Vec<String> = default_instruments().into_iter().map(|i| i.symbol).collect();
    let seen = seen.lock();
    assert_eq!(seen.len(), 4);
    for snapshot in seen.iter() {
        let symbols: Vec<String> = snapshot.iter().map(|q| q.symbol.clone()).collect();
        assert_eq!(symbols, expected);
    }
}

#[test]
fn test_gold_is_grouped_and_crude_is_plain() {
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(FixedDelta(0.0)),
        Arc::new(ManualScheduler::new()),
    )
    .unwrap();
    let snapshot = ticker.current_prices();

    assert_eq!(snapshot.quote("GC=F").unwrap().price, "2,341.50");
    assert_eq!(snapshot.quote("ZS=F").unwrap().price, "1,165.00");
    assert_eq!(snapshot.quote("CL=F").unwrap().price, "78.45");
}

#[test]
fn test_unsubscribe_isolation() {
    let scheduler = ManualScheduler::new();
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(FixedDelta(0.001)),
        Arc::new(scheduler.clone()),
    )
    .unwrap();

    let first = Arc::new(Mutex::new(0));
    let f = first.clone();
    let sub = ticker.subscribe(move |_| *f.lock() += 1);
    let second = recorder(&ticker);

    ticker.start(Duration::from_millis(100));
    sub.unsubscribe();
    sub.unsubscribe();
    scheduler.advance(Duration::from_millis(300));

    assert_eq!(*first.lock(), 1);
    assert_eq!(second.lock().len(), 4);
}

#[test]
fn test_panicking_observer_does_not_stop_ticks() {
    let scheduler = ManualScheduler::new();
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(FixedDelta(0.0)),
        Arc::new(scheduler.clone()),
    )
    .unwrap();
    ticker.subscribe(|snapshot| {
        if snapshot.seq == 2 {
            panic!("renderer failed");
        }
    });
    let seen = recorder(&ticker);

    ticker.start(Duration::from_millis(100));
    scheduler.advance(Duration::from_millis(300));

    let seqs: Vec<u64> = seen.lock().iter().map(|s| s.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
    assert_eq!(ticker.state(), TickerState::Running);
}

#[test]
fn test_concurrent_ticks_deliver_in_order() {
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(FixedDelta(0.0)),
        Arc::new(ManualScheduler::new()),
    )
    .unwrap();

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);
    ticker.subscribe(move |snapshot| {
        if snapshot.seq == 1 {
            let _ = entered_tx.lock().send(());
            let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
        }
    });
    let seen = recorder(&ticker);

    let first = {
        let ticker = ticker.clone();
        thread::spawn(move || {
            ticker.tick();
        })
    };
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let second = {
        let ticker = ticker.clone();
        thread::spawn(move || {
            ticker.tick();
        })
    };
    thread::sleep(Duration::from_millis(50));
    release_tx.send(()).unwrap();

    first.join().unwrap();
    second.join().unwrap();

    let seqs: Vec<u64> = seen.lock().iter().map(|s| s.seq).collect();
    assert_eq!(seqs, vec![1, 2]);
}

#[test]
fn test_independent_instances() {
    let instruments = vec![Instrument::new(
        "TST",
        "Test",
        PriceBounds::new(100.0, 90.0, 110.0),
        PriceFormat::Plain,
    )];
    let a = Ticker::new(
        instruments.clone(),
        FluctuationGenerator::new(FixedDelta(0.05)),
        Arc::new(ManualScheduler::new()),
    )
    .unwrap();
    let b = Ticker::new(
        instruments,
        FluctuationGenerator::new(FixedDelta(-0.05)),
        Arc::new(ManualScheduler::new()),
    )
    .unwrap();

    a.tick();
    assert_eq!(a.current_prices().quotes[0].change, 5.0);
    assert_eq!(b.current_prices().quotes[0].change, 0.0);
    assert_eq!(b.tick().quotes[0].price, "95.00");
}

#[test]
fn test_seeded_config_is_reproducible() {
    let mut config = Config::default();
    config.ticker.seed = Some(1234);

    let a = Ticker::from_config(&config, Arc::new(ManualScheduler::new())).unwrap();
    let b = Ticker::from_config(&config, Arc::new(ManualScheduler::new())).unwrap();
    for _ in 0..10 {
        assert_eq!(a.tick().quotes, b.tick().quotes);
    }
}

#[test]
fn test_from_config_rejects_invalid() {
    let config = Config {
        instruments: vec![],
        ..Config::default()
    };
    assert!(Ticker::from_config(&config, Arc::new(ManualScheduler::new())).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_tokio_driven_ticker() {
    let ticker = Ticker::new(
        default_instruments(),
        FluctuationGenerator::new(UniformDelta::seeded(5, 0.02)),
        Arc::new(TokioScheduler::current().unwrap()),
    )
    .unwrap();
    let (mut rx, subscription) = ticker.subscribe_channel(16);

    ticker.start(Duration::from_millis(5000));
    assert_eq!(rx.recv().await.unwrap().seq, 1);
    assert_eq!(rx.recv().await.unwrap().seq, 2);

    ticker.stop();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(rx.try_recv().is_err());
    subscription.unsubscribe();
}
