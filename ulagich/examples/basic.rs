//! Basic example of the Ulagich injector.

use std::sync::Arc;

use tracing::info;
use ulagich::async_trait;
use ulagich::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Injectable)]
#[injectable(expose = "dyn Logger")]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
}

#[async_trait]
impl Injectable for Config {
    async fn construct(_args: Arguments) -> std::result::Result<Self, BoxError> {
        Ok(Config {
            database_url: "postgres://localhost/myapp".to_string(),
        })
    }
}

#[derive(Injectable)]
struct Database {
    config: Arc<Config>,
    #[inject(token = "Logger")]
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.config.database_url)
    }
}

struct RequestId(u64);

#[derive(Injectable)]
#[injectable(scope = "request", on_request)]
struct CurrentUser {
    #[inject(skip)]
    id: u64,
}

#[async_trait]
impl RequestInitializable for CurrentUser {
    async fn on_request(&mut self, ctx: &Context) -> std::result::Result<(), BoxError> {
        let RequestId(id) = ctx.downcast_ref::<RequestId>().ok_or("missing request id")?;
        self.id = *id;
        Ok(())
    }
}

// Request-scoped through CurrentUser
#[derive(Injectable)]
struct UserHandler {
    db: Arc<Database>,
    user: Arc<CurrentUser>,
}

impl UserHandler {
    fn handle(&self) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {}", self.user.id))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("basic=info,ulagich_container=debug")
        .init();

    let unit = CompositionUnit::new("users")
        .provide::<Config>()
        .bind::<ConsoleLogger>("Logger")
        .provide::<Database>()
        .provide::<CurrentUser>()
        .consumer::<UserHandler>();

    let mut injector = Injector::new();
    injector.bootstrap_blocking(&unit)?;
    println!("Injector ready: {injector:?}");

    for key in injector.get_all().keys() {
        if let Some(registration) = injector.get_all().registration(&key) {
            println!("  {key} -> {} ({})", registration.concrete_type(), registration.scope());
        }
    }

    // === One lookup per request ===
    for id in [42, 7] {
        info!(request = id, "Handling request");
        let handler = injector
            .get_blocking(ComponentKey::of::<UserHandler>(), Some(Context::new(RequestId(id))))?
            .downcast::<UserHandler>()?;
        println!("{}", handler.handle());
    }

    Ok(())
}
