//! End-to-end pipeline tests: tracker → selector → settlement across
//! decision cycles.

use chrono::NaiveDate;

use pitchedge::bankroll::{BankrollTracker, TrackerStatus};
use pitchedge::config::RiskConfig;
use pitchedge::strategy::{DecisionRecord, PortfolioSelector, RejectionTally};
use pitchedge::types::{Market, Opportunity};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn opp(fixture: &str, market: Market, price: f64, probability: f64, confidence: f64) -> Opportunity {
    Opportunity {
        fixture: fixture.to_string(),
        market,
        price,
        probability,
        confidence,
    }
}

fn date(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, n).unwrap()
}

#[test]
fn full_cycle_select_and_settle() {
    init_tracing();
    let config = RiskConfig::default();
    let mut tracker = BankrollTracker::new(1000.0, config.clone());
    let selector = PortfolioSelector::new(config);

    let candidates = vec![
        opp("Arsenal vs Chelsea", Market::MatchHome, 2.0, 0.55, 0.70),
        opp("Leeds vs Everton", Market::TotalOver(2.5), 2.1, 0.54, 0.75),
        opp("Bayern vs Koln", Market::BttsYes, 1.3, 0.80, 0.90), // 4% edge: skipped
    ];

    tracker.begin_cycle(date(1));
    let (bets, decisions) = selector.select_bets(&candidates, &tracker.snapshot());
    tracker.record_admissions(&bets);

    assert_eq!(bets.len(), 2);
    let tally = RejectionTally::from_decisions(&decisions);
    assert_eq!(tally.selected, 2);
    assert_eq!(tally.low_edge, 1);
    assert_eq!(tracker.state().todays_bet_count, 2);

    // Settle: first wins, second loses.
    let balance_before = tracker.state().current_balance;
    tracker.settle(&bets[0], true);
    tracker.settle(&bets[1], false);
    let expected = balance_before + bets[0].stake_amount * (bets[0].opportunity.price - 1.0)
        - bets[1].stake_amount;
    assert!((tracker.state().current_balance - expected).abs() < 1e-9);
    assert!(tracker.is_active());
}

#[test]
fn daily_cap_admits_exactly_six_of_ten() {
    init_tracing();
    // Ten candidates each sizing to 3% of a $1000 bankroll against a $200
    // daily cap: six admitted (totalling $180), the rest daily-capped.
    let config = RiskConfig {
        max_concurrent_bets: 10,
        max_daily_risk_fraction: 0.20,
        ..Default::default()
    };
    let tracker = BankrollTracker::new(1000.0, config.clone());
    let selector = PortfolioSelector::new(config);

    let candidates: Vec<Opportunity> = (0..10)
        .map(|i| opp(&format!("fixture {i}"), Market::MatchHome, 2.0, 0.56, 0.80))
        .collect();

    let (bets, decisions) = selector.select_bets(&candidates, &tracker.snapshot());
    assert_eq!(bets.len(), 6);
    let total: f64 = bets.iter().map(|b| b.stake_amount).sum();
    assert!((total - 180.0).abs() < 1e-6);
    assert_eq!(RejectionTally::from_decisions(&decisions).daily_cap, 4);
}

#[test]
fn stop_loss_blocks_selection_entirely() {
    init_tracing();
    // Drive the bankroll into a >25% drawdown, then confirm the next cycle
    // admits nothing no matter how good the candidates are.
    let config = RiskConfig {
        max_concurrent_bets: 10,
        ..Default::default()
    };
    let mut tracker = BankrollTracker::new(1000.0, config.clone());
    let selector = PortfolioSelector::new(config);

    let mut day = 1;
    while tracker.is_active() {
        tracker.begin_cycle(date(day));
        let candidates: Vec<Opportunity> = (0..6)
            .map(|i| opp(&format!("d{day} m{i}"), Market::MatchAway, 2.0, 0.56, 0.80))
            .collect();
        let (bets, _) = selector.select_bets(&candidates, &tracker.snapshot());
        tracker.record_admissions(&bets);
        for bet in &bets {
            tracker.settle(bet, false);
        }
        day += 1;
        assert!(day < 60, "stop-loss never triggered");
    }
    assert_eq!(tracker.status(), TrackerStatus::StoppedDrawdown);

    tracker.begin_cycle(date(day));
    let dream = vec![opp("sure thing", Market::MatchHome, 2.0, 0.70, 0.99)];
    let (bets, decisions) = selector.select_bets(&dream, &tracker.snapshot());
    assert!(bets.is_empty());
    assert!(matches!(decisions[0], DecisionRecord::CycleHalted { .. }));

    // Settlements after the halt are ignored.
    let balance = tracker.state().current_balance;
    let stray = pitchedge::types::SelectedBet {
        opportunity: dream[0].clone(),
        kelly_fraction: 0.02,
        expected_value: 0.4,
        stake_amount: 20.0,
    };
    tracker.settle(&stray, true);
    assert_eq!(tracker.state().current_balance, balance);
}

#[test]
fn new_cycle_resets_daily_budget() {
    init_tracing();
    let config = RiskConfig {
        max_concurrent_bets: 10,
        ..Default::default()
    };
    let mut tracker = BankrollTracker::new(1000.0, config.clone());
    let selector = PortfolioSelector::new(config);

    let candidates: Vec<Opportunity> = (0..10)
        .map(|i| opp(&format!("m{i}"), Market::MatchHome, 2.0, 0.56, 0.80))
        .collect();

    tracker.begin_cycle(date(1));
    let (day1, _) = selector.select_bets(&candidates, &tracker.snapshot());
    tracker.record_admissions(&day1);
    assert_eq!(day1.len(), 6);

    // Same cycle, second pass: budget already spent.
    let (again, _) = selector.select_bets(&candidates, &tracker.snapshot());
    assert!(again.is_empty());

    // Next day the budget is fresh.
    tracker.begin_cycle(date(2));
    let (day2, _) = selector.select_bets(&candidates, &tracker.snapshot());
    assert_eq!(day2.len(), 6);
}

#[test]
fn selection_output_is_deterministic_and_ordered() {
    init_tracing();
    let selector = PortfolioSelector::new(RiskConfig::default());
    let tracker = BankrollTracker::new(2000.0, RiskConfig::default());

    let candidates = vec![
        opp("mid", Market::MatchDraw, 3.4, 0.33, 0.70),
        opp("best", Market::MatchHome, 2.0, 0.60, 0.85),
        opp("ok", Market::TotalUnder(2.5), 1.9, 0.57, 0.72),
    ];

    let (first, _) = selector.select_bets(&candidates, &tracker.snapshot());
    let (second, _) = selector.select_bets(&candidates, &tracker.snapshot());

    let order: Vec<&str> = first
        .iter()
        .map(|b| b.opportunity.fixture.as_str())
        .collect();
    assert_eq!(order[0], "best");
    assert_eq!(
        order,
        second
            .iter()
            .map(|b| b.opportunity.fixture.as_str())
            .collect::<Vec<_>>()
    );
    // EVs strictly descending.
    for pair in first.windows(2) {
        assert!(pair[0].expected_value >= pair[1].expected_value);
    }
}
