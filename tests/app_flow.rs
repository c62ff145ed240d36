//! End-to-end flow over the public surface: open both shipped apps
//! through the registry, run a booking lifecycle, and read the
//! reporting views a dashboard would.

use std::sync::Arc;

use indexmap::IndexMap;

use atrium::aggregate::{breakdown_sum, calendar_series, sum_where};
use atrium::{
    domains, AppRegistry, Engine, MemoryGateway, QuerySpec, Record, SortDir, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn fields(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

async fn open_seeded(registry: &AppRegistry, name: &str) -> Arc<Engine> {
    let schema = match name {
        "coworking" => domains::coworking(),
        _ => domains::real_estate(),
    };
    registry
        .get_or_open(name, Arc::new(schema), Arc::new(MemoryGateway::new()))
        .await
        .unwrap()
}

#[tokio::test]
async fn booking_lifecycle_through_the_public_surface() {
    init_tracing();
    let registry = AppRegistry::new();
    let engine = open_seeded(&registry, "coworking").await;

    // A new member books the cheapest available desk.
    let member = engine
        .create(
            "members",
            fields(&[
                ("name", Value::str("Frida Olsen")),
                ("email", Value::str("frida@example.com")),
                ("plan", Value::str("flex")),
            ]),
        )
        .await
        .unwrap()
        .value;

    let spec = QuerySpec::new()
        .filter_in("status", vec![Value::str("available")])
        .sort("pricePerHour", SortDir::Asc);
    let desks = engine.query("desks", &spec).await.unwrap();
    let cheapest = desks.first().expect("seed has available desks");
    assert_eq!(cheapest.text("label"), Some("B1"));

    let booking = engine
        .create(
            "bookings",
            fields(&[
                ("memberId", Value::str(member.id())),
                ("deskId", Value::str(cheapest.id())),
                (
                    "date",
                    Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()),
                ),
                ("startHour", Value::Number(9.0)),
                ("endHour", Value::Number(13.0)),
                ("status", Value::str("confirmed")),
            ]),
        )
        .await
        .unwrap()
        .value;
    assert_eq!(booking.number("totalPrice"), Some(4.0 * 3.5));

    // Cancelling the membership takes the booking with it.
    engine.delete("members", member.id()).await.unwrap();
    let remaining: Vec<Record> = engine.list("bookings").await.unwrap();
    assert!(remaining.iter().all(|b| b.id() != booking.id()));
}

#[tokio::test]
async fn dashboard_views_over_seeded_real_estate_data() {
    init_tracing();
    let registry = AppRegistry::new();
    let engine = open_seeded(&registry, "real_estate").await;

    let payments = engine.list("payments").await.unwrap();
    let completed = Value::str("completed");
    let collected = sum_where(&payments, "amount", Some(("status", &completed)));
    assert_eq!(collected, 950.0 + 950.0 + 2800.0);

    let monthly = calendar_series(&payments, "date", "amount", 2024);
    assert_eq!(monthly.len(), 12);
    assert_eq!(monthly[1].key, "2024-02");
    assert_eq!(monthly[1].total, 950.0);

    let expenses = engine.list("expenses").await.unwrap();
    let by_category = breakdown_sum(&expenses, "category", "amount");
    let shares: f64 = by_category.iter().map(|s| s.share).sum();
    assert!((shares - 100.0).abs() < 1e-9);

    // The tenant with a pending rent payment shows as unpaid.
    let tenant = engine.get("tenants", "ten-02").await.unwrap();
    assert_eq!(tenant.text("paymentStatus"), Some("unpaid"));
}

#[tokio::test]
async fn both_apps_coexist_in_one_registry() {
    init_tracing();
    let registry = AppRegistry::new();
    let coworking = open_seeded(&registry, "coworking").await;
    let real_estate = open_seeded(&registry, "real_estate").await;

    // Same engine back on repeat lookup; distinct engines per app.
    assert!(Arc::ptr_eq(
        &coworking,
        &registry.get("coworking").unwrap()
    ));
    assert!(!Arc::ptr_eq(&coworking, &real_estate));

    // Export boundary: a dump per app and a schema-only template.
    let dump = coworking.dump().await;
    assert!(dump.get("desks").is_some());
    let template = real_estate.template();
    assert_eq!(template["units"][0]["status"], "text");
}
