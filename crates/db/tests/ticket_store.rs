//! Postgres round-trips through `PgTicketStore`. These need a live
//! database (`DATABASE_URL`), so they are ignored by default.

use campusdesk_core::actor::Actor;
use campusdesk_core::clock::{Clock, SystemClock};
use campusdesk_core::error::CoreError;
use campusdesk_core::escalation::auto_escalate;
use campusdesk_core::sla::Category;
use campusdesk_core::state_machine::{assign, transition, AssignmentPolicy};
use campusdesk_core::status::{ActorRole, TicketStatus};
use campusdesk_core::store::{CategoryDirectory, TicketStore};
use campusdesk_core::ticket::{prepare_ticket, CreateTicket};
use campusdesk_core::timeline::EventKind;
use campusdesk_db::repositories::{OutboxRepo, TicketRepo};
use campusdesk_db::models::outbox::CreateOutboxEntry;
use campusdesk_db::{PgCategoryDirectory, PgTicketStore};
use chrono::Duration;
use sqlx::PgPool;

async fn seed_category(pool: &PgPool, status: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO categories (code, name, sla_resolve_hours, default_priority, status) \
         VALUES ('NET', 'Network', 24, 'HIGH', $1) RETURNING id",
    )
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn category(pool: &PgPool, id: i64) -> Category {
    PgCategoryDirectory::new(pool.clone())
        .get_category(id)
        .await
        .unwrap()
        .unwrap()
}

fn student() -> Actor {
    Actor::user(3, "Mika", ActorRole::Student)
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn insert_assigns_code_and_persists_timeline(pool: PgPool) {
    let category_id = seed_category(&pool, "active").await;
    let category = category(&pool, category_id).await;
    let store = PgTicketStore::new(pool.clone());

    let input = CreateTicket {
        category_id,
        priority: None,
        description: "Library wifi keeps dropping".into(),
        location_id: Some(12),
    };
    let new = prepare_ticket(input, &category, &student(), SystemClock.now()).unwrap();
    let ticket = store.insert(new).await.unwrap();

    assert_eq!(ticket.code, format!("NET-{:06}", ticket.id));
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.timeline.len(), 1);
    assert_eq!(ticket.timeline.events()[0].kind, EventKind::Created);

    let loaded = store.find_by_id(ticket.id).await.unwrap().unwrap();
    assert_eq!(loaded.timeline.len(), 1);
    assert_eq!(loaded.timeline.events()[0].id, ticket.timeline.events()[0].id);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn save_appends_only_new_events_and_is_repeatable(pool: PgPool) {
    let category_id = seed_category(&pool, "active").await;
    let category = category(&pool, category_id).await;
    let store = PgTicketStore::new(pool.clone());
    let now = SystemClock.now();

    let input = CreateTicket {
        category_id,
        priority: None,
        description: "Projector in B12 flickers".into(),
        location_id: None,
    };
    let ticket = store
        .insert(prepare_ticket(input, &category, &student(), now).unwrap())
        .await
        .unwrap();

    let staff = Actor::user(8, "Robin", ActorRole::Staff);
    let assigned = assign(&ticket, 8, &staff, AssignmentPolicy::default(), now).unwrap();
    store.save(&assigned).await.unwrap();
    store.save(&assigned).await.unwrap();

    let events = TicketRepo::list_events(&pool, ticket.id).await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2, 3]);

    let started = transition(&assigned, TicketStatus::InProgress, &staff, None, now).unwrap();
    store.save(&started).await.unwrap();
    let loaded = store.find_by_id(ticket.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, TicketStatus::InProgress);
    assert_eq!(loaded.assignee_id, Some(8));
    assert_eq!(loaded.timeline.len(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn load_actionable_matches_legacy_status_spellings(pool: PgPool) {
    let category_id = seed_category(&pool, "active").await;
    let category = category(&pool, category_id).await;
    let store = PgTicketStore::new(pool.clone());
    let created = SystemClock.now() - Duration::hours(30);

    let mut ids = Vec::new();
    for description in ["Heater broken", "Door lock jammed", "Leaking sink"] {
        let input = CreateTicket {
            category_id,
            priority: None,
            description: description.into(),
            location_id: None,
        };
        let ticket = store
            .insert(prepare_ticket(input, &category, &student(), created).unwrap())
            .await
            .unwrap();
        ids.push(ticket.id);
    }

    sqlx::query("UPDATE tickets SET status = 'IN_PROGRESS' WHERE id = $1")
        .bind(ids[1])
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE tickets SET status = 'CLOSED' WHERE id = $1")
        .bind(ids[2])
        .execute(&pool)
        .await
        .unwrap();

    let actionable = store.load_actionable().await.unwrap();
    let found: Vec<_> = actionable.iter().map(|t| t.id).collect();
    assert_eq!(found, vec![ids[0], ids[1]]);
    assert_eq!(actionable[1].status, TicketStatus::InProgress);

    let escalated = auto_escalate(&actionable[0], SystemClock.now()).unwrap();
    store.save(&escalated.ticket).await.unwrap();
    let reloaded = store.find_by_id(ids[0]).await.unwrap().unwrap();
    assert!(reloaded.overdue_hint);
    assert!(reloaded.has_escalation());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn saving_unknown_ticket_is_not_found(pool: PgPool) {
    let category_id = seed_category(&pool, "active").await;
    let category = category(&pool, category_id).await;
    let store = PgTicketStore::new(pool.clone());

    let input = CreateTicket {
        category_id,
        priority: None,
        description: "Vending machine ate coins".into(),
        location_id: None,
    };
    let mut ticket = store
        .insert(prepare_ticket(input, &category, &student(), SystemClock.now()).unwrap())
        .await
        .unwrap();
    ticket.id += 1000;

    let result = store.save(&ticket).await;
    assert!(matches!(result, Err(CoreError::NotFound { entity: "Ticket", .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn outbox_entries_are_listed_until_delivered(pool: PgPool) {
    let category_id = seed_category(&pool, "inactive").await;
    let category = category(&pool, category_id).await;
    assert!(category.validate_for_intake().is_err());

    let store = PgTicketStore::new(pool.clone());
    let active_id = seed_category_with_code(&pool, "HSG").await;
    let active = self::category(&pool, active_id).await;
    let input = CreateTicket {
        category_id: active_id,
        priority: None,
        description: "Room 204 has no hot water".into(),
        location_id: None,
    };
    let ticket = store
        .insert(prepare_ticket(input, &active, &student(), SystemClock.now()).unwrap())
        .await
        .unwrap();

    let id = OutboxRepo::insert(
        &pool,
        &CreateOutboxEntry {
            event_type: "ticket.created".into(),
            ticket_id: ticket.id,
            recipient_role: "admin".into(),
            recipient_user_id: None,
            actor_id: Some(3),
            payload: serde_json::json!({"ticket_code": ticket.code}),
        },
    )
    .await
    .unwrap();

    let pending = OutboxRepo::list_pending(&pool, 10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);
    assert_eq!(pending[0].payload["ticket_code"], ticket.code.as_str());
}

async fn seed_category_with_code(pool: &PgPool, code: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO categories (code, name, sla_resolve_hours) VALUES ($1, 'Housing', 48) \
         RETURNING id",
    )
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn corrupt_row_is_skipped_by_load_actionable(pool: PgPool) {
    let category_id = seed_category(&pool, "active").await;
    let category = category(&pool, category_id).await;
    let store = PgTicketStore::new(pool.clone());
    let created = SystemClock.now() - Duration::hours(30);

    let mut ids = Vec::new();
    for description in ["Broken stair light", "Cracked window"] {
        let input = CreateTicket {
            category_id,
            priority: None,
            description: description.into(),
            location_id: None,
        };
        let ticket = store
            .insert(prepare_ticket(input, &category, &student(), created).unwrap())
            .await
            .unwrap();
        ids.push(ticket.id);
    }
    sqlx::query("UPDATE tickets SET priority = 'critical' WHERE id = $1")
        .bind(ids[0])
        .execute(&pool)
        .await
        .unwrap();

    let actionable = store.load_actionable().await.unwrap();
    assert_eq!(actionable.iter().map(|t| t.id).collect::<Vec<_>>(), vec![ids[1]]);

    let escalated = auto_escalate(&actionable[0], SystemClock.now()).unwrap();
    store.save(&escalated.ticket).await.unwrap();
    assert!(store.find_by_id(ids[1]).await.unwrap().unwrap().has_escalation());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn constraint_violation_is_not_retryable(pool: PgPool) {
    let category_id = seed_category(&pool, "active").await;
    let category = category(&pool, category_id).await;
    let store = PgTicketStore::new(pool.clone());

    let input = CreateTicket {
        category_id,
        priority: None,
        description: "Ghost category".into(),
        location_id: None,
    };
    let mut new = prepare_ticket(input, &category, &student(), SystemClock.now()).unwrap();
    new.category_id = category_id + 9_999;

    let err = store.insert(new).await.unwrap_err();
    assert!(matches!(err, CoreError::Internal(_)), "{err:?}");
    assert!(!err.is_retryable());
}
