//! Full calendar sync: token file, mocked Google endpoint, SQLite store.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use support::{CredentialFiles, TestDatabase};
use ticketdesk_core::{CalendarSyncService, CustomerRepository, SyncRequest};
use ticketdesk_domain::DeskError;
use ticketdesk_infra::database::SqliteCustomerRepository;
use ticketdesk_infra::integrations::calendar::{GoogleCalendarClient, TokenFileCredentialStore};
use ticketdesk_infra::scheduling::{CalendarScheduler, CalendarSchedulerConfig, TickOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    service: Arc<CalendarSyncService>,
    credentials: Arc<TokenFileCredentialStore>,
    repository: Arc<SqliteCustomerRepository>,
    _db: TestDatabase,
    _files: CredentialFiles,
}

async fn mount_events(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/frontdesk@example.com/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "evt-1",
                    "summary": "Mario Rossi",
                    "description": "Telefono: 333 1234567\nIndirizzo: Via Roma 1",
                    "attendees": [{"email": "mario@rossi.it"}]
                },
                {
                    "id": "evt-2",
                    "location": "Sala 2",
                    "attendees": [{"email": "room@resource.calendar.google.com", "resource": true}]
                },
                {
                    "id": "evt-3",
                    "attendees": [{"email": "lucia@verdi.it", "displayName": "Lucia Verdi"}],
                    "location": "Piazza Garibaldi 5"
                }
            ]
        })))
        .mount(server)
        .await;
}

fn stack(server: &MockServer, with_secrets: bool) -> Stack {
    let files = CredentialFiles::new();
    if with_secrets {
        files.write_client_secrets();
    }
    files.write_token(json!({"token": "ya29.valid"}));

    let db = TestDatabase::new();
    let repository = Arc::new(SqliteCustomerRepository::new(Arc::clone(&db.manager)));
    let credentials = Arc::new(
        TokenFileCredentialStore::new(
            files.credentials_path(),
            files.token_path(),
            Vec::new(),
            Duration::from_secs(5),
        )
        .unwrap(),
    );
    let source = Arc::new(
        GoogleCalendarClient::with_base_url(
            Duration::from_secs(5),
            format!("{}/calendar/v3", server.uri()),
        )
        .unwrap(),
    );

    let service = CalendarSyncService::new(credentials.clone(), source, repository.clone())
        .with_default_calendar_id("frontdesk@example.com");

    Stack { service: Arc::new(service), credentials, repository, _db: db, _files: files }
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_imports_customers_once() {
    let server = MockServer::start().await;
    mount_events(&server).await;
    let stack = stack(&server, true);

    let (stats, details) = stack.service.sync(SyncRequest::default()).await.expect("first sync");
    assert_eq!((stats.total, stats.created, stats.updated, stats.skipped), (2, 2, 0, 0));
    assert_eq!(details.calendar_id, "frontdesk@example.com");
    assert_eq!(details.events_count, 3);
    assert_eq!(details.candidates_count, 2);

    let customers = stack.repository.list().await.unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0].code.as_str(), "aaaa");
    assert_eq!(customers[0].name, "Mario Rossi");
    assert_eq!(customers[0].phone.as_deref(), Some("333 1234567"));
    assert_eq!(customers[0].address.as_deref(), Some("Via Roma 1"));
    assert_eq!(customers[1].name, "Lucia Verdi");
    assert_eq!(customers[1].address.as_deref(), Some("Piazza Garibaldi 5"));

    let (again, _) = stack.service.sync(SyncRequest::default()).await.expect("second sync");
    assert_eq!((again.created, again.updated, again.skipped), (0, 0, 2));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_client_secrets_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let stack = stack(&server, false);

    let err = stack.service.sync(SyncRequest::default()).await.unwrap_err();
    assert!(matches!(err, DeskError::Config(_)));
    assert!(stack.repository.list().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn scheduler_drives_the_real_service() {
    let server = MockServer::start().await;
    mount_events(&server).await;
    let stack = stack(&server, true);

    let scheduler = CalendarScheduler::new(
        stack.service.clone(),
        stack.credentials.clone(),
        CalendarSchedulerConfig::default(),
    );

    match scheduler.trigger_now().await {
        TickOutcome::Completed(stats) => assert_eq!(stats.created, 2),
        other => panic!("expected completed tick, got {other:?}"),
    }
    assert_eq!(stack.repository.list().await.unwrap().len(), 2);
}
