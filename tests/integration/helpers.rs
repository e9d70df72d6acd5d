//! Shared integration test harness.
//!
//! Every test gets its own in-memory stores, an inline dispatch scheduler,
//! and the full HTTP router, so nothing outside the process is needed.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use tourhub_api::{AppState, build_app};
use tourhub_core::config::AppConfig;
use tourhub_core::types::UserId;
use tourhub_database::MemoryStores;
use tourhub_entity::notification::{BookingDetails, NotificationChannel, ServiceKind};
use tourhub_entity::user::{UserProfile, UserRole};
use tourhub_service::notification::OutgoingMessage;
use tourhub_service::{
    AuthContext, ChannelSender, InlineScheduler, NotificationPipeline, OrderService,
    PriorityClassifier, SendError, SendReceipt, SenderRegistry, TemplateRegistry,
};

/// A fully wired application over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub mem: MemoryStores,
    pub pipeline: NotificationPipeline,
    pub orders: Arc<OrderService>,
    pub config: AppConfig,
}

/// Response captured from the router.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    /// Default configuration, default senders.
    pub fn new() -> Self {
        Self::with(AppConfig::default(), SenderRegistry::with_defaults())
    }

    /// Default configuration, custom senders.
    pub fn with_senders(senders: SenderRegistry) -> Self {
        Self::with(AppConfig::default(), senders)
    }

    /// Custom configuration and senders.
    pub fn with(config: AppConfig, senders: SenderRegistry) -> Self {
        let mem = MemoryStores::new();
        let stores = mem.stores();
        let pipeline = NotificationPipeline::new(
            &stores,
            senders,
            Arc::new(TemplateRegistry::with_builtin()),
            &config.notification,
        );
        let scheduler = Arc::new(InlineScheduler::new(Arc::clone(&pipeline.dispatcher)));
        let orders = Arc::new(OrderService::new(
            Arc::clone(&stores.orders),
            Arc::clone(&stores.users),
            PriorityClassifier::new(),
            scheduler,
            Arc::clone(&pipeline.dispatcher),
        ));
        let state = AppState::new(config.clone(), None, Arc::clone(&orders), pipeline.clone());

        Self {
            router: build_app(state),
            mem,
            pipeline,
            orders,
            config,
        }
    }

    /// Register a user and return the caller context for them.
    pub fn seed_user(&self, role: UserRole, points: i64) -> AuthContext {
        let profile = UserProfile {
            id: UserId::new(),
            display_name: "Test Traveller".into(),
            points,
            role,
            email: Some("traveller@example.com".into()),
            phone: Some("+15550100".into()),
            push_token: None,
        };
        let ctx = AuthContext::new(profile.id, role);
        self.mem.users.upsert(profile);
        ctx
    }

    /// Send a request as `caller`; `None` sends no identity headers.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        caller: Option<&AuthContext>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(ctx) = caller {
            builder = builder
                .header("x-user-id", ctx.user_id.to_string())
                .header("x-user-role", ctx.role.as_str());
        }

        let body = match body {
            Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str, caller: &AuthContext) -> TestResponse {
        self.request(Method::GET, path, None, Some(caller)).await
    }

    pub async fn post(&self, path: &str, body: Value, caller: &AuthContext) -> TestResponse {
        self.request(Method::POST, path, Some(body), Some(caller))
            .await
    }
}

/// Booking details for a confirmation message.
pub fn booking() -> BookingDetails {
    BookingDetails {
        confirmation_number: "TH-2041".into(),
        service_name: "Old Town Walking Tour".into(),
        service_kind: ServiceKind::Attraction,
        amount: Decimal::from(2500),
        date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        time: Some("09:30".into()),
        guests: Some(2),
        contact_name: "Test Traveller".into(),
        contact_phone: Some("+15550100".into()),
        contact_email: Some("traveller@example.com".into()),
    }
}

/// The JSON form of [`booking`].
pub fn booking_json() -> Value {
    json!({
        "confirmation_number": "TH-2041",
        "service_name": "Old Town Walking Tour",
        "service_kind": "ATTRACTION",
        "amount": "2500",
        "date": "2026-11-02",
        "time": "09:30",
        "guests": 2,
        "contact_name": "Test Traveller",
        "contact_phone": "+15550100",
        "contact_email": "traveller@example.com"
    })
}

/// A sender that replays queued results, then repeats its fallback.
#[derive(Debug)]
pub struct ScriptedSender {
    channel: NotificationChannel,
    script: Mutex<VecDeque<Result<SendReceipt, SendError>>>,
    fallback: Result<SendReceipt, SendError>,
    calls: AtomicUsize,
}

impl ScriptedSender {
    pub fn new(channel: NotificationChannel, fallback: Result<SendReceipt, SendError>) -> Arc<Self> {
        Arc::new(Self {
            channel,
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(channel: NotificationChannel, reason: &str) -> Arc<Self> {
        Self::new(channel, Err(SendError::Transient(reason.to_string())))
    }

    pub fn then(self: &Arc<Self>, result: Result<SendReceipt, SendError>) -> Arc<Self> {
        self.script.lock().unwrap().push_back(result);
        Arc::clone(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelSender for ScriptedSender {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    async fn send(&self, _message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
