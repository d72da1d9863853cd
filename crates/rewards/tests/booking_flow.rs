//! End-to-end booking flow: registration, threshold crossings across
//! several visits, redemption, and the expiry sweep.

use chrono::{NaiveDate, Utc};

use fidelity_core::catalog::{CatalogEntry, StaticCatalog};
use fidelity_core::config::EngineConfig;
use fidelity_core::reward::RewardStatus;
use fidelity_core::rules::{RewardKind, RuleRecord, RuleType};
use fidelity_core::types::{Client, ServiceLine};
use fidelity_core::FidelityError;
use fidelity_rewards::BookingPipeline;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        CatalogEntry {
            id: "svc-dep-perna".to_string(),
            name: "Depilação Perna".to_string(),
            category_id: "depilacao".to_string(),
        },
        CatalogEntry {
            id: "svc-limpeza".to_string(),
            name: "Limpeza de Pele".to_string(),
            category_id: "estetica-facial".to_string(),
        },
    ])
}

fn rules() -> Vec<RuleRecord> {
    vec![
        RuleRecord {
            id: "rule-combo".to_string(),
            name: "Cliente Ouro".to_string(),
            description: Some("20% na próxima visita".to_string()),
            rule_type: RuleType::ComboValue,
            category_id: None,
            service_id: None,
            service_name: None,
            threshold_value: Some(50_000),
            threshold_quantity: None,
            reward_type: RewardKind::DiscountPercent,
            reward_value: Some(20),
            reward_service_name: None,
            validity_days: Some(15),
            is_active: true,
        },
        RuleRecord {
            id: "rule-depilacao".to_string(),
            name: "Fidelidade Depilação".to_string(),
            description: None,
            rule_type: RuleType::QuantityAccumulation,
            category_id: Some("depilacao".to_string()),
            service_id: None,
            service_name: None,
            threshold_value: None,
            threshold_quantity: Some(3),
            reward_type: RewardKind::FreeService,
            reward_value: None,
            reward_service_name: Some("Depilação Perna".to_string()),
            validity_days: Some(30),
            is_active: true,
        },
    ]
}

fn new_client(id: &str) -> Client {
    Client {
        id: id.to_string(),
        name: "Beatriz".to_string(),
        phone: "+55 11 98888-0001".to_string(),
        pin: "4321".to_string(),
        email: Some("bia@example.com".to_string()),
        birth_date: None,
        points_balance: 0,
        total_spent_cents: 0,
        total_appointments: 0,
        last_visit: None,
        is_active: true,
        created_at: date(2025, 1, 1),
    }
}

fn depilacao(price_cents: u64) -> ServiceLine {
    ServiceLine {
        name: "Depilação Perna".to_string(),
        price_cents,
    }
}

#[test]
fn booking_flow_issues_redeems_and_expires() {
    let pipeline = BookingPipeline::new(&EngineConfig::default(), catalog(), rules());
    pipeline.register_client(new_client("cli-1"));

    // Visit 1: one depilação at 200.00. No thresholds met yet.
    let first = pipeline
        .complete_appointment("cli-1", "pro-1", date(2025, 2, 1), vec![depilacao(20_000)])
        .unwrap();
    assert!(first.new_rewards.is_empty());

    // Visit 2: two depilações, 400.00 total. Spend reaches 600.00
    // (crosses 500.00) and category count reaches 3: both rules fire.
    let second = pipeline
        .complete_appointment(
            "cli-1",
            "pro-1",
            date(2025, 2, 20),
            vec![depilacao(20_000), depilacao(20_000)],
        )
        .unwrap();
    assert_eq!(second.new_rewards.len(), 2);
    assert_eq!(second.state_after.total_spent_cents, 60_000);
    assert_eq!(second.state_after.total_appointments, 2);
    assert_eq!(second.state_after.last_visit, Some(date(2025, 2, 20)));

    let free_service = second
        .new_rewards
        .iter()
        .find(|r| r.kind == RewardKind::FreeService)
        .unwrap();
    assert_eq!(free_service.service_name.as_deref(), Some("Depilação Perna"));
    assert_eq!(free_service.expires_at, date(2025, 3, 22));

    let discount = second
        .new_rewards
        .iter()
        .find(|r| r.kind == RewardKind::DiscountPercent)
        .unwrap();
    assert_eq!(discount.title, "Cliente Ouro");
    assert_eq!(discount.value, Some(20));
    assert_eq!(discount.expires_at, date(2025, 3, 7));

    // Staff redeems the discount; a second attempt conflicts.
    pipeline.rewards().redeem(discount.id, Utc::now()).unwrap();
    assert!(matches!(
        pipeline.rewards().redeem(discount.id, Utc::now()),
        Err(FidelityError::RewardConflict { .. })
    ));

    // The periodic sweep expires the free service once its window ends.
    assert_eq!(pipeline.rewards().expire_due(date(2025, 3, 22)), 0);
    assert_eq!(pipeline.rewards().expire_due(date(2025, 3, 23)), 1);
    assert_eq!(
        pipeline.rewards().get(free_service.id).unwrap().status,
        RewardStatus::Expired
    );

    // An expired reward cannot be redeemed.
    assert!(matches!(
        pipeline.rewards().redeem(free_service.id, Utc::now()),
        Err(FidelityError::RewardConflict {
            status: RewardStatus::Expired,
            ..
        })
    ));

    // Visit 3: spend keeps growing but the one-shot combo rule stays
    // quiet for good.
    let third = pipeline
        .complete_appointment("cli-1", "pro-1", date(2025, 4, 2), vec![depilacao(30_000)])
        .unwrap();
    assert!(third
        .new_rewards
        .iter()
        .all(|r| r.rule_id.as_deref() != Some("rule-combo")));
}
