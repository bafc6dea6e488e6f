/// Example: wiring an application from a composite of containers
///
/// A root container holds the application settings, a services container
/// holds the definitions, and a plugin container adds an override. The
/// services resolve their dependencies through the root, so settings live in
/// one place.

use keyed_di::{
    entry, factory, object_of, register_class_as, BoxError, Callable, Construct, Container, ContainerBuilder,
    ContainerConfig, DiResult, Instance, Invocable, LoggingObserver, MemoryCache, MetricsObserver, Value,
};
use std::sync::Arc;

// ===== Services =====

pub struct Database {
    dsn: String,
    pool_size: i64,
    connected: bool,
}

impl Instance for Database {
    fn has_method(&self, name: &str) -> bool {
        matches!(name, "connect" | "describe")
    }

    fn call_method(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, BoxError> {
        match name {
            "connect" => {
                self.connected = true;
                Ok(Value::Bool(true))
            }
            _ => Ok(Value::from(format!(
                "{} (pool {}, connected: {})",
                self.dsn, self.pool_size, self.connected
            ))),
        }
    }

    fn has_property(&self, name: &str) -> bool {
        name == "pool_size"
    }

    fn set_property(&mut self, _name: &str, value: Value) -> Result<(), BoxError> {
        self.pool_size = value.as_int().ok_or("pool_size must be an integer")?;
        Ok(())
    }
}

impl Construct for Database {
    fn construct(args: Vec<Value>) -> Result<Self, BoxError> {
        let dsn = args.first().and_then(Value::as_str).ok_or("dsn expected")?;
        Ok(Database {
            dsn: dsn.to_string(),
            pool_size: 1,
            connected: false,
        })
    }
}

pub struct UserRepository {
    db: Value,
    table: String,
}

impl Instance for UserRepository {
    fn has_method(&self, name: &str) -> bool {
        name == "find"
    }

    fn call_method(&mut self, _name: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        let id = args.first().and_then(Value::as_int).ok_or("user id expected")?;
        let db = self.db.as_object().ok_or("database expected")?;
        let backend = db.call_method("describe", vec![])?;
        Ok(Value::from(format!(
            "user #{id} from {} via {}",
            self.table,
            backend.as_str().unwrap_or("?")
        )))
    }
}

impl Construct for UserRepository {
    fn construct(mut args: Vec<Value>) -> Result<Self, BoxError> {
        if args.len() != 2 {
            return Err("expected a database and a table name".into());
        }
        let table = args.pop().and_then(|v| v.as_str().map(str::to_string)).ok_or("table expected")?;
        let db = args.pop().ok_or("database expected")?;
        Ok(UserRepository { db, table })
    }
}

// ===== Composition =====

fn settings() -> DiResult<Container> {
    let config = ContainerConfig::from_json_str(
        r#"{
            "values": {
                "db.dsn": "postgres://localhost/app",
                "db.pool_size": 8,
                "users.table": "users"
            }
        }"#,
    )?;
    config.build()
}

fn services(metrics: Arc<MetricsObserver>) -> DiResult<Container> {
    register_class_as::<Database>("app.Database");

    ContainerBuilder::new()
        .self_id("services")
        .observer(metrics)
        .observer(Arc::new(LoggingObserver::with_prefix("[services]")))
        .set(
            "db",
            keyed_di::object("app.Database", vec![entry("db.dsn").into()], true)?
                .property("pool_size", entry("db.pool_size"))
                .method("connect", vec![]),
        )
        .set(
            "users",
            object_of::<UserRepository>(vec![entry("db").into(), entry("users.table").into()], true),
        )
        .set(
            "lookup",
            factory(Invocable::method(entry("users"), "find"), vec![42.into()], false),
        )
        .build()
}

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== keyed-di Composition Root Example ===\n");

    let metrics = Arc::new(MetricsObserver::new());
    let root = ContainerBuilder::new()
        .self_id("app")
        .cache(Arc::new(MemoryCache::new()))
        .build()?;

    root.add_child(&services(metrics.clone())?)?.add_child(&settings()?)?;

    // 1. Lookups fall through to the children; dependencies resolve through the root
    println!("1. Resolving through the composite:");
    println!("   {}", root.get("lookup")?.as_str().unwrap_or("?"));

    // 2. A plugin overrides a setting for everyone resolving through the root
    println!("\n2. Overriding a setting with a prepended child:");
    let overrides = Container::new();
    overrides.set("users.table", "archived_users")?;
    overrides.set(
        "greeting",
        factory(
            Callable::new(|args| Ok(Value::from(format!("hello from {}", args[0].as_str().unwrap_or("?"))))),
            vec![entry("users.table").into()],
            true,
        ),
    )?;
    root.prepend_child(&overrides)?;
    println!("   {}", root.get("greeting")?.as_str().unwrap_or("?"));

    // 3. Registered objects are shared
    println!("\n3. Registered objects are built once:");
    let first = root.get("db")?;
    let second = root.get("db")?;
    println!("   same instance: {}", first == second);

    println!(
        "\nServices built {} definitions ({} failures)",
        metrics.build_count(),
        metrics.failure_count()
    );
    Ok(())
}
