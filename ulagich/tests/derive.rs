use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ulagich::async_trait;
use ulagich::prelude::*;

trait Logger: Send + Sync {
    fn prefix(&self) -> &'static str;
}

#[derive(Injectable)]
#[injectable(expose = "dyn Logger")]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn prefix(&self) -> &'static str {
        "console"
    }
}

#[derive(Injectable)]
struct Clock;

struct TraceId(u64);

#[derive(Injectable)]
#[injectable(scope = "request", on_request)]
struct RequestState {
    clock: Arc<Clock>,
    #[inject(skip)]
    trace: AtomicU64,
}

#[async_trait]
impl RequestInitializable for RequestState {
    async fn on_request(&mut self, ctx: &Context) -> std::result::Result<(), BoxError> {
        if let Some(TraceId(id)) = ctx.downcast_ref::<TraceId>() {
            self.trace.store(*id, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[derive(Injectable)]
struct UserService {
    #[inject(token = "Logger")]
    logger: Arc<dyn Logger>,
    state: Arc<RequestState>,
}

#[derive(Injectable)]
struct UserHandler {
    service: Arc<UserService>,
    clock: Arc<Clock>,
}

fn users_unit() -> CompositionUnit {
    CompositionUnit::new("users")
        .provide::<UserService>()
        .bind::<ConsoleLogger>("Logger")
        .provide::<RequestState>()
        .provide::<Clock>()
        .consumer::<UserHandler>()
}

#[tokio::test]
async fn derived_components_bootstrap() {
    let mut injector = Injector::new();
    injector.bootstrap(&users_unit()).await.unwrap();

    let registry = injector.get_all();
    assert_eq!(registry.scope_of(&ComponentKey::of::<Clock>()), Some(Scope::Singleton));
    assert_eq!(registry.scope_of(&ComponentKey::of::<RequestState>()), Some(Scope::Request));
    assert_eq!(registry.scope_of(&ComponentKey::of::<UserService>()), Some(Scope::Request));
    assert_eq!(registry.scope_of(&ComponentKey::of::<UserHandler>()), Some(Scope::Request));
    assert_eq!(registry.scope_of(&ComponentKey::token("Logger")), Some(Scope::Singleton));
}

#[tokio::test]
async fn derived_request_hook_receives_context() {
    let mut injector = Injector::new();
    injector.bootstrap(&users_unit()).await.unwrap();

    let handler = injector
        .resolve::<UserHandler>(Some(Context::new(TraceId(99))))
        .await
        .unwrap();

    assert_eq!(handler.service.logger.prefix(), "console");
    assert_eq!(handler.service.state.trace.load(Ordering::SeqCst), 99);
    assert!(Arc::ptr_eq(&handler.clock, &handler.service.state.clock));
}

#[tokio::test]
async fn derived_request_instances_are_fresh() {
    let mut injector = Injector::new();
    injector.bootstrap(&users_unit()).await.unwrap();

    let a = injector.resolve::<UserHandler>(Some(Context::new(TraceId(1)))).await.unwrap();
    let b = injector.resolve::<UserHandler>(Some(Context::new(TraceId(2)))).await.unwrap();

    assert!(!Arc::ptr_eq(&a.service, &b.service));
    assert_eq!(a.service.state.trace.load(Ordering::SeqCst), 1);
    assert_eq!(b.service.state.trace.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn exposed_view_through_token() {
    let mut injector = Injector::new();
    injector
        .bootstrap(&CompositionUnit::new("logging").bind::<ConsoleLogger>("Logger"))
        .await
        .unwrap();

    let logger: Arc<dyn Logger> = injector.resolve_as("Logger", None).await.unwrap();
    assert_eq!(logger.prefix(), "console");
}

#[tokio::test]
async fn derived_consumer_reports_missing_token() {
    let unit = CompositionUnit::new("users")
        .provide::<Clock>()
        .provide::<RequestState>()
        .consumer::<UserService>();

    let mut injector = Injector::new();
    match injector.bootstrap(&unit).await {
        Err(UlagichError::MissingDependency(err)) => {
            assert_eq!(err.consumer, TypeKey::of::<UserService>());
            assert_eq!(err.dependency, ComponentKey::token("Logger"));
        }
        other => panic!("Expected MissingDependency, got: {other:?}"),
    }
}

struct Users;

impl Module for Users {
    fn declare(&self, unit: &mut dyn Declarations) {
        unit.register_injectable(Constructible::of::<Clock>());
        unit.register_injectable(Constructible::of::<RequestState>());
        unit.register_token(Token::new("Logger"), Constructible::of::<ConsoleLogger>());
        unit.register_injectable(Constructible::of::<UserService>());
        unit.register_consumer(Constructible::of::<UserHandler>());
    }
}

#[tokio::test]
async fn module_declarations_bootstrap() {
    let mut injector = Injector::new();
    injector.bootstrap_module(&Users).await.unwrap();

    assert!(injector.has(ComponentKey::of::<UserHandler>()));
    assert!(injector.is_bootstrapped(Users.name()));
}
