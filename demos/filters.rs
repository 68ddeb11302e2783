//! Controllers with scoped before/after filters.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example filters
//!
//! Try:
//!   curl http://localhost:3000/users          # Jack (set by UserFilter)
//!   curl http://localhost:3000/users/1        # {"username":"Hill"} (rendered by RenderFilter)
//!   curl http://localhost:3000/2/users1       # {"changed":true}
//!   curl http://localhost:3000/2/users2       # {}

use castor::{App, BoxError, Context, Controller, ControllerDef, Filter, FilterOptions, Flow};

struct UserFilter;

impl Filter for UserFilter {
    async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
        cx.data_mut().insert("username", "Jack");
        Ok(cx.next())
    }
}

struct RenderFilter;

impl Filter for RenderFilter {
    async fn handle(&self, cx: Context) -> Result<Flow, BoxError> {
        let data = cx.data().clone();
        Ok(cx.respond(data))
    }
}

struct ChangeFilter;

impl Filter for ChangeFilter {
    async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
        cx.data_mut().insert("changed", true);
        Ok(cx.next())
    }
}

struct UsersController;

impl Controller for UsersController {
    fn define(def: &mut ControllerDef<'_, Self>) {
        def.before::<UserFilter>(FilterOptions::all())
            .after::<RenderFilter>(FilterOptions::all())
            .get("/users", "indexAction", index)
            .get("/users/1", "showAction", show);
    }
}

// GET /users: answers directly, so RenderFilter never runs.
async fn index(cx: Context) -> Flow {
    let name = cx.data().get("username").and_then(|v| v.as_str()).unwrap_or_default().to_owned();
    cx.respond(name)
}

// GET /users/1: overwrites the name and hands over to RenderFilter.
async fn show(mut cx: Context) -> Flow {
    cx.data_mut().insert("username", "Hill");
    cx.next()
}

struct Users2Controller;

impl Controller for Users2Controller {
    fn define(def: &mut ControllerDef<'_, Self>) {
        def.prefix("/2")
            .before::<ChangeFilter>(FilterOptions::only(["show1Action"]))
            .get("/users1", "show1Action", render)
            .get("/users2", "show2Action", render);
    }
}

async fn render(cx: Context) -> Flow {
    let data = cx.data().clone();
    cx.respond(data)
}

#[tokio::main]
async fn main() -> Result<(), castor::Error> {
    tracing_subscriber::fmt::init();

    let mut app = App::new();
    app.filter(UserFilter)
        .filter(RenderFilter)
        .filter(ChangeFilter)
        .controller::<UsersController>()
        .controller::<Users2Controller>();

    app.listen(3000).await
}
