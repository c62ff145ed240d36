//! The two shipped schema instances. Both applications run on the same
//! engine; everything specific to them (field layouts, cascade
//! policies, derived-field rules, demo seeds) lives here as data.

use chrono::NaiveDate;

use crate::engine::Store;
use crate::model::{Record, Value};
use crate::schema::{CollectionDef, FieldDef, OnDelete, Schema};

/// Seed dates are literals; a malformed one is a bug in this file.
fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date")
}

// ── Coworking space manager ──────────────────────────────

pub fn coworking() -> Schema {
    Schema::new(
        "coworking",
        vec![
            CollectionDef::new("members")
                .field(FieldDef::text("name").required())
                .field(FieldDef::text("email"))
                .field(FieldDef::text("phone"))
                .field(FieldDef::text("plan"))
                .field(FieldDef::date("joinDate"))
                .field(FieldDef::text("paymentStatus"))
                .field(FieldDef::list("payments"))
                .derived("paymentStatus", &["payments"], member_payment_status)
                .derived("payments", &["payments"], member_payment_history),
            CollectionDef::new("desks")
                .field(FieldDef::text("label").required())
                .field(FieldDef::text("zone"))
                .field(FieldDef::number("pricePerHour").min(0.0))
                .field(FieldDef::text("status")),
            CollectionDef::new("bookings")
                .field(FieldDef::text("memberId"))
                .field(FieldDef::text("deskId"))
                .field(FieldDef::date("date"))
                .field(FieldDef::number("startHour").min(0.0))
                .field(FieldDef::number("endHour").min(0.0))
                .field(FieldDef::text("status"))
                .field(FieldDef::number("totalPrice"))
                .reference("memberId", "members", OnDelete::Cascade)
                .reference("deskId", "desks", OnDelete::Cascade)
                .derived("totalPrice", &["desks"], booking_total_price),
            CollectionDef::new("payments")
                .field(FieldDef::text("memberId"))
                .field(FieldDef::number("amount").required().min(0.0))
                .field(FieldDef::date("date"))
                .field(FieldDef::text("method"))
                .field(FieldDef::text("status"))
                .reference("memberId", "members", OnDelete::Cascade),
            CollectionDef::new("amenities")
                .field(FieldDef::text("name").required())
                .field(FieldDef::text("category"))
                .field(FieldDef::boolean("available")),
        ],
        coworking_seed,
    )
}

/// A member is unpaid while any of their payments is not completed.
fn member_payment_status(store: &Store, record: &Record) -> Value {
    let unpaid = store
        .iter("payments")
        .filter(|p| p.text("memberId") == Some(record.id()))
        .any(|p| p.text("status") != Some("completed"));
    Value::str(if unpaid { "unpaid" } else { "paid" })
}

/// Denormalized copy of the member's payments, in collection order.
fn member_payment_history(store: &Store, record: &Record) -> Value {
    Value::List(
        store
            .iter("payments")
            .filter(|p| p.text("memberId") == Some(record.id()))
            .cloned()
            .collect(),
    )
}

/// Booked hours times the desk's hourly rate.
fn booking_total_price(store: &Store, record: &Record) -> Value {
    let hours = match (record.number("startHour"), record.number("endHour")) {
        (Some(start), Some(end)) if end > start => end - start,
        _ => return Value::Number(0.0),
    };
    let rate = record
        .text("deskId")
        .and_then(|id| store.get("desks", id))
        .and_then(|desk| desk.number("pricePerHour"))
        .unwrap_or(0.0);
    Value::Number(hours * rate)
}

fn coworking_seed() -> Vec<(&'static str, Vec<Record>)> {
    let members = vec![
        member("mem-01", "Ada Lindqvist", "ada@example.com", "flex", d(2024, 1, 8)),
        member("mem-02", "Bruno Keller", "bruno@example.com", "fixed", d(2024, 2, 19)),
        member("mem-03", "Chiara Russo", "chiara@example.com", "flex", d(2024, 4, 2)),
    ];
    let desks = vec![
        desk("desk-01", "A1", "quiet", 5.0, "available"),
        desk("desk-02", "A2", "quiet", 5.0, "available"),
        desk("desk-03", "B1", "open", 3.5, "available"),
        desk("desk-04", "C1", "studio", 8.0, "maintenance"),
    ];
    let bookings = vec![
        booking("bkg-01", "mem-01", "desk-01", d(2024, 5, 6), 9.0, 17.0, "confirmed"),
        booking("bkg-02", "mem-02", "desk-03", d(2024, 5, 6), 13.0, 18.0, "confirmed"),
        booking("bkg-03", "mem-01", "desk-02", d(2024, 5, 7), 10.0, 12.0, "cancelled"),
    ];
    let payments = vec![
        payment("pay-01", "mem-01", 120.0, d(2024, 2, 1), "card", "completed"),
        payment("pay-02", "mem-01", 120.0, d(2024, 3, 1), "card", "completed"),
        payment("pay-03", "mem-02", 250.0, d(2024, 3, 4), "transfer", "completed"),
        payment("pay-04", "mem-03", 120.0, d(2024, 4, 2), "card", "pending"),
    ];
    let amenities = vec![
        amenity("amn-01", "Espresso machine", "kitchen", true),
        amenity("amn-02", "Meeting room beamer", "meetings", true),
        amenity("amn-03", "Phone booth", "quiet", false),
    ];
    vec![
        ("members", members),
        ("desks", desks),
        ("bookings", bookings),
        ("payments", payments),
        ("amenities", amenities),
    ]
}

fn member(id: &str, name: &str, email: &str, plan: &str, join: NaiveDate) -> Record {
    Record::with_id(id)
        .field_value("name", Value::str(name))
        .field_value("email", Value::str(email))
        .field_value("phone", Value::Null)
        .field_value("plan", Value::str(plan))
        .field_value("joinDate", Value::Date(join))
}

fn desk(id: &str, label: &str, zone: &str, price: f64, status: &str) -> Record {
    Record::with_id(id)
        .field_value("label", Value::str(label))
        .field_value("zone", Value::str(zone))
        .field_value("pricePerHour", Value::Number(price))
        .field_value("status", Value::str(status))
}

fn booking(
    id: &str,
    member_id: &str,
    desk_id: &str,
    date: NaiveDate,
    start: f64,
    end: f64,
    status: &str,
) -> Record {
    Record::with_id(id)
        .field_value("memberId", Value::str(member_id))
        .field_value("deskId", Value::str(desk_id))
        .field_value("date", Value::Date(date))
        .field_value("startHour", Value::Number(start))
        .field_value("endHour", Value::Number(end))
        .field_value("status", Value::str(status))
}

fn payment(
    id: &str,
    member_id: &str,
    amount: f64,
    date: NaiveDate,
    method: &str,
    status: &str,
) -> Record {
    Record::with_id(id)
        .field_value("memberId", Value::str(member_id))
        .field_value("amount", Value::Number(amount))
        .field_value("date", Value::Date(date))
        .field_value("method", Value::str(method))
        .field_value("status", Value::str(status))
}

fn amenity(id: &str, name: &str, category: &str, available: bool) -> Record {
    Record::with_id(id)
        .field_value("name", Value::str(name))
        .field_value("category", Value::str(category))
        .field_value("available", Value::Bool(available))
}

// ── Real-estate manager ──────────────────────────────────

pub fn real_estate() -> Schema {
    Schema::new(
        "real_estate",
        vec![
            CollectionDef::new("properties")
                .field(FieldDef::text("name").required())
                .field(FieldDef::text("address"))
                .field(FieldDef::text("kind")),
            CollectionDef::new("tenants")
                .field(FieldDef::text("name").required())
                .field(FieldDef::text("email"))
                .field(FieldDef::text("phone"))
                .field(FieldDef::date("leaseStart"))
                .field(FieldDef::date("leaseEnd"))
                .field(FieldDef::text("paymentStatus"))
                .field(FieldDef::list("payments"))
                .derived("paymentStatus", &["payments"], tenant_payment_status)
                .derived("payments", &["payments"], tenant_payment_history),
            CollectionDef::new("units")
                .field(FieldDef::text("propertyId"))
                .field(FieldDef::text("tenantId"))
                .field(FieldDef::text("label").required())
                .field(FieldDef::number("monthlyRent").min(0.0))
                .field(FieldDef::text("status"))
                .reference("propertyId", "properties", OnDelete::Cascade)
                .reference(
                    "tenantId",
                    "tenants",
                    OnDelete::Nullify {
                        reset: Some(("status", "vacant")),
                    },
                ),
            CollectionDef::new("payments")
                .field(FieldDef::text("tenantId"))
                .field(FieldDef::text("propertyId"))
                .field(FieldDef::text("unitId"))
                .field(FieldDef::number("amount").required().min(0.0))
                .field(FieldDef::date("date"))
                .field(FieldDef::text("kind"))
                .field(FieldDef::text("status"))
                .reference("tenantId", "tenants", OnDelete::Cascade)
                .reference("propertyId", "properties", OnDelete::Cascade)
                .reference("unitId", "units", OnDelete::Cascade),
            CollectionDef::new("maintenance_requests")
                .field(FieldDef::text("propertyId"))
                .field(FieldDef::text("unitId"))
                .field(FieldDef::text("title").required())
                .field(FieldDef::text("priority"))
                .field(FieldDef::text("status"))
                .field(FieldDef::date("reportedOn"))
                .reference("propertyId", "properties", OnDelete::Cascade)
                .reference("unitId", "units", OnDelete::Cascade),
            CollectionDef::new("expenses")
                .field(FieldDef::text("propertyId"))
                .field(FieldDef::text("category"))
                .field(FieldDef::number("amount").min(0.0))
                .field(FieldDef::date("date"))
                .field(FieldDef::text("note"))
                .reference("propertyId", "properties", OnDelete::Cascade),
        ],
        real_estate_seed,
    )
}

fn tenant_payment_status(store: &Store, record: &Record) -> Value {
    let unpaid = store
        .iter("payments")
        .filter(|p| p.text("tenantId") == Some(record.id()))
        .any(|p| p.text("status") != Some("completed"));
    Value::str(if unpaid { "unpaid" } else { "paid" })
}

fn tenant_payment_history(store: &Store, record: &Record) -> Value {
    Value::List(
        store
            .iter("payments")
            .filter(|p| p.text("tenantId") == Some(record.id()))
            .cloned()
            .collect(),
    )
}

fn real_estate_seed() -> Vec<(&'static str, Vec<Record>)> {
    let properties = vec![
        property("prop-01", "Elm Street 12", "Elm Street 12, Springfield", "apartment"),
        property("prop-02", "Dock House", "Harbour Road 3, Springfield", "office"),
    ];
    let tenants = vec![
        tenant("ten-01", "Dana Whitfield", "dana@example.com", d(2023, 9, 1), d(2025, 8, 31)),
        tenant("ten-02", "Elio Marchetti", "elio@example.com", d(2024, 1, 15), d(2024, 12, 31)),
    ];
    let units = vec![
        unit("unit-01", "prop-01", Some("ten-01"), "1A", 950.0, "occupied"),
        unit("unit-02", "prop-01", None, "1B", 875.0, "vacant"),
        unit("unit-03", "prop-02", Some("ten-02"), "Suite 2", 1400.0, "occupied"),
    ];
    let payments = vec![
        rent_payment("rpay-01", "ten-01", "prop-01", "unit-01", 950.0, d(2024, 2, 1), "rent", "completed"),
        rent_payment("rpay-02", "ten-01", "prop-01", "unit-01", 950.0, d(2024, 3, 1), "rent", "completed"),
        rent_payment("rpay-03", "ten-02", "prop-02", "unit-03", 2800.0, d(2024, 1, 15), "deposit", "completed"),
        rent_payment("rpay-04", "ten-02", "prop-02", "unit-03", 1400.0, d(2024, 3, 1), "rent", "pending"),
    ];
    let maintenance = vec![
        maintenance_request("mnt-01", "prop-01", "unit-01", "Leaking radiator", "high", "open", d(2024, 3, 12)),
        maintenance_request("mnt-02", "prop-02", "unit-03", "Flickering hallway light", "low", "resolved", d(2024, 2, 20)),
    ];
    let expenses = vec![
        expense("exp-01", "prop-01", "repairs", 220.0, d(2024, 3, 14), "radiator valve"),
        expense("exp-02", "prop-01", "insurance", 89.0, d(2024, 1, 5), ""),
        expense("exp-03", "prop-02", "cleaning", 140.0, d(2024, 2, 28), "quarterly deep clean"),
    ];
    vec![
        ("properties", properties),
        ("tenants", tenants),
        ("units", units),
        ("payments", payments),
        ("maintenance_requests", maintenance),
        ("expenses", expenses),
    ]
}

fn property(id: &str, name: &str, address: &str, kind: &str) -> Record {
    Record::with_id(id)
        .field_value("name", Value::str(name))
        .field_value("address", Value::str(address))
        .field_value("kind", Value::str(kind))
}

fn tenant(id: &str, name: &str, email: &str, start: NaiveDate, end: NaiveDate) -> Record {
    Record::with_id(id)
        .field_value("name", Value::str(name))
        .field_value("email", Value::str(email))
        .field_value("phone", Value::Null)
        .field_value("leaseStart", Value::Date(start))
        .field_value("leaseEnd", Value::Date(end))
}

fn unit(
    id: &str,
    property_id: &str,
    tenant_id: Option<&str>,
    label: &str,
    rent: f64,
    status: &str,
) -> Record {
    Record::with_id(id)
        .field_value("propertyId", Value::str(property_id))
        .field_value(
            "tenantId",
            tenant_id.map_or(Value::Null, Value::str),
        )
        .field_value("label", Value::str(label))
        .field_value("monthlyRent", Value::Number(rent))
        .field_value("status", Value::str(status))
}

#[allow(clippy::too_many_arguments)]
fn rent_payment(
    id: &str,
    tenant_id: &str,
    property_id: &str,
    unit_id: &str,
    amount: f64,
    date: NaiveDate,
    kind: &str,
    status: &str,
) -> Record {
    Record::with_id(id)
        .field_value("tenantId", Value::str(tenant_id))
        .field_value("propertyId", Value::str(property_id))
        .field_value("unitId", Value::str(unit_id))
        .field_value("amount", Value::Number(amount))
        .field_value("date", Value::Date(date))
        .field_value("kind", Value::str(kind))
        .field_value("status", Value::str(status))
}

#[allow(clippy::too_many_arguments)]
fn maintenance_request(
    id: &str,
    property_id: &str,
    unit_id: &str,
    title: &str,
    priority: &str,
    status: &str,
    reported: NaiveDate,
) -> Record {
    Record::with_id(id)
        .field_value("propertyId", Value::str(property_id))
        .field_value("unitId", Value::str(unit_id))
        .field_value("title", Value::str(title))
        .field_value("priority", Value::str(priority))
        .field_value("status", Value::str(status))
        .field_value("reportedOn", Value::Date(reported))
}

fn expense(id: &str, property_id: &str, category: &str, amount: f64, date: NaiveDate, note: &str) -> Record {
    Record::with_id(id)
        .field_value("propertyId", Value::str(property_id))
        .field_value("category", Value::str(category))
        .field_value("amount", Value::Number(amount))
        .field_value("date", Value::Date(date))
        .field_value("note", Value::str(note))
}
