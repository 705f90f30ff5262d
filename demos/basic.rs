//! Minimal burrow example: global middleware, a timed-out login route, nested
//! groups and a deferred service resolved from a handler.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/user/login
//!   curl http://localhost:8080/subject/42
//!   curl -X PUT http://localhost:8080/subject/42
//!   curl http://localhost:8080/subject/list/all
//!   curl http://localhost:8080/subject/info/name

use std::sync::Arc;
use std::time::Duration;

use burrow::{
    BoxError, Container, Context, HandlerResult, NewInstance, Param, Router, Server, Service,
    ServiceProvider, chain, middleware,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), burrow::Error> {
    tracing_subscriber::fmt::init();

    let container = Container::new();
    container.bind(DemoServiceProvider)?;

    let mut router = Router::with_container(container);
    router.middleware(middleware::recovery());
    router.middleware(middleware::cost());

    router.get("/user/login", chain![middleware::timeout(Duration::from_secs(5)), user_login])?;

    let mut subject = router.group("/subject");
    subject
        .delete("/:id", subject_delete)?
        .get("/:id", subject_get)?
        .put("/:id", subject_update)?
        .get("/list/all", subject_list)?;

    let mut info = subject.group("/info");
    info.middleware(|ctx: Context| async move {
        info!(path = ctx.request().path(), "subject info requested");
        ctx.next().await
    });
    info.get("/name", subject_name)?;

    Server::bind("0.0.0.0:8080").serve(router).await
}

async fn user_login(ctx: Context) -> HandlerResult {
    // Pretend to do some work; the timeout middleware cuts in after 5s.
    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx.set_ok_status().json("ok, UserLoginController");
    Ok(())
}

async fn subject_get(ctx: Context) -> HandlerResult {
    let id = ctx.param("id").unwrap_or_default().to_owned();
    ctx.set_ok_status().json(&serde_json::json!({ "id": id }));
    Ok(())
}

async fn subject_update(ctx: Context) -> HandlerResult {
    ctx.set_ok_status().json("ok, SubjectUpdateController");
    Ok(())
}

async fn subject_delete(ctx: Context) -> HandlerResult {
    ctx.set_ok_status().json("ok, SubjectDelController");
    Ok(())
}

async fn subject_list(ctx: Context) -> HandlerResult {
    let demo = ctx.container().make_as::<DemoService>("demo")?;
    ctx.set_ok_status().json(&demo.foo());
    Ok(())
}

async fn subject_name(ctx: Context) -> HandlerResult {
    ctx.set_ok_status().json("ok, SubjectNameController");
    Ok(())
}

#[derive(serde::Serialize)]
struct Foo {
    name: String,
}

struct DemoService {
    /// The container the service was built from.
    _container: Container,
}

impl DemoService {
    fn foo(&self) -> Foo {
        Foo { name: "i am foo".to_owned() }
    }
}

struct DemoServiceProvider;

impl ServiceProvider for DemoServiceProvider {
    fn name(&self) -> &str {
        "demo"
    }

    fn is_defer(&self) -> bool {
        true
    }

    fn boot(&self, _container: &Container) -> Result<(), BoxError> {
        info!("demo service booting");
        Ok(())
    }

    fn params(&self, container: &Container) -> Vec<Param> {
        vec![Arc::new(container.clone())]
    }

    fn register(&self, _container: &Container) -> NewInstance {
        Arc::new(|params: &[Param]| -> Result<Service, BoxError> {
            let container = params
                .first()
                .and_then(|p| p.downcast_ref::<Container>())
                .ok_or("demo service expects a container parameter")?;
            Ok(Arc::new(DemoService { _container: container.clone() }))
        })
    }
}
