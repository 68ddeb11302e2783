//! End-to-end: controllers with before/after filters behind a real socket.

use std::net::SocketAddr;

use castor::{App, BoxError, Context, Controller, ControllerDef, Filter, FilterOptions, Flow, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

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
            .get("/users", "indexAction", index_action)
            .get("/users/1", "showAction", show_action);
    }
}

async fn index_action(cx: Context) -> Flow {
    let name = cx.data().get("username").and_then(|v| v.as_str()).unwrap_or_default().to_owned();
    cx.respond(name)
}

async fn show_action(mut cx: Context) -> Flow {
    cx.data_mut().insert("username", "Hill");
    cx.next()
}

async fn render_data(cx: Context) -> Flow {
    let data = cx.data().clone();
    cx.respond(data)
}

struct Users2Controller;

impl Controller for Users2Controller {
    fn define(def: &mut ControllerDef<'_, Self>) {
        def.prefix("/2")
            .before::<ChangeFilter>(FilterOptions::only(["show1Action"]))
            .get("/users1", "show1Action", render_data)
            .get("/users2", "show2Action", render_data);
    }
}

struct Users3Controller;

impl Controller for Users3Controller {
    fn define(def: &mut ControllerDef<'_, Self>) {
        def.prefix("/3")
            .before::<ChangeFilter>(FilterOptions::except(["show2Action"]))
            .get("/users1", "show1Action", render_data)
            .get("/users2", "show2Action", render_data);
    }
}

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), castor::Error>>,
}

impl TestServer {
    async fn start() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let mut app = App::new();
        app.controller::<UsersController>()
            .controller::<Users2Controller>()
            .controller::<Users3Controller>()
            .filter(UserFilter)
            .filter(RenderFilter)
            .filter(ChangeFilter);
        let router = app.build().expect("bootstrap");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(Server::serve_with_shutdown(listener, router, async {
            let _ = stopped.await;
        }));
        Self { addr, stop, handle }
    }

    async fn get(&self, path: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let req = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        let (head, body) = raw.split_once("\r\n\r\n").expect("complete response");
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .expect("status code");
        (status, body.to_owned())
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn filters_over_http() {
    let server = TestServer::start().await;

    // before-filter feeds an action that responds directly
    assert_eq!(server.get("/users").await, (200, "Jack".to_owned()));

    // action continues, after-filter renders what the action wrote
    assert_eq!(server.get("/users/1").await, (200, r#"{"username":"Hill"}"#.to_owned()));

    // only: ["show1Action"]
    assert_eq!(server.get("/2/users1").await, (200, r#"{"changed":true}"#.to_owned()));
    assert_eq!(server.get("/2/users2").await, (200, "{}".to_owned()));

    // except: ["show2Action"]
    assert_eq!(server.get("/3/users1").await, (200, r#"{"changed":true}"#.to_owned()));
    assert_eq!(server.get("/3/users2").await, (200, "{}".to_owned()));

    assert_eq!(server.get("/missing").await.0, 404);

    server.stop().await;
}

#[tokio::test]
async fn each_request_gets_a_fresh_carrier() {
    let server = TestServer::start().await;

    let (a, b) = tokio::join!(server.get("/2/users1"), server.get("/2/users2"));
    assert_eq!(a.1, r#"{"changed":true}"#);
    assert_eq!(b.1, "{}");
    // a later request to the unscoped route is still untouched
    assert_eq!(server.get("/2/users2").await.1, "{}");

    server.stop().await;
}
