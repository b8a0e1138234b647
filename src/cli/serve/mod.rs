//! Development server with live reload support.
//!
//! ```text
//! bind_server()  root check → watcher → socket → shutdown hook
//!      │
//!      ▼
//! BoundServer::run()
//!      ├── actor thread   FsActor → ReloadActor → Broadcaster
//!      └── request loop   rayon pool → handle_request
//! ```

mod content;
mod lifecycle;
mod path;
mod response;
#[cfg(test)]
mod tests;

use crate::{
    actor::Coordinator,
    config::cfg,
    debug, log,
    reload::{Broadcaster, ENDPOINT},
};
use anyhow::{Context, Result};
use crossbeam::channel;
use lifecycle::InFlight;
use path::{ResolveError, ServedRoot};
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Everything a worker needs to answer a request.
struct ServeContext {
    root: ServedRoot,
    broadcaster: Broadcaster,
    /// Inject the reload snippet into HTML responses
    live_reload: bool,
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    context: ServeContext,
    coordinator: Coordinator,
    workers: usize,
}

/// Bind the HTTP server without starting the request loop
///
/// The served root and the watcher are set up first, so a bad root or a
/// watcher that cannot start fails before the port is taken.
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let serve = &config.serve;

    let root = ServedRoot::new(&serve.root, serve.index.clone())
        .with_context(|| format!("cannot serve `{}`", serve.root.display()))?;

    let broadcaster = Broadcaster::new();
    let mut coordinator = Coordinator::new(broadcaster.clone(), Some(serve.heartbeat_interval()));
    if config.watch.enable {
        coordinator = coordinator.watch(root.path(), &config.watch)?;
    }

    let (server, addr) = lifecycle::bind_with_retry(serve.interface, serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);
    let coordinator = coordinator.with_shutdown_signal(shutdown_rx);

    log!("serve"; "http://{}", addr);
    debug!("serve"; "root {}", root.path().display());

    Ok(BoundServer {
        server,
        context: ServeContext {
            root,
            broadcaster,
            live_reload: coordinator.is_watching(),
        },
        coordinator,
        workers: serve.workers,
    })
}

impl BoundServer {
    /// Start the request loop (blocking until shutdown).
    pub fn run(self) -> Result<()> {
        let actor_handle = lifecycle::spawn_actors(self.coordinator);
        let in_flight = InFlight::default();

        let result = run_request_loop(
            &self.server,
            Arc::new(self.context),
            self.workers,
            &in_flight,
        );

        in_flight.wait_idle();
        lifecycle::wait_for_shutdown(actor_handle);
        result
    }
}

/// Accept requests until the server is unblocked, answering them on a
/// fixed-size worker pool.
fn run_request_loop(
    server: &Server,
    context: Arc<ServeContext>,
    workers: usize,
    in_flight: &InFlight,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("liveserve-http-{i}"))
        .build()
        .context("failed to create worker pool")?;

    for request in server.incoming_requests() {
        let context = Arc::clone(&context);
        let guard = in_flight.enter();
        pool.spawn(move || {
            let _guard = guard;
            if let Err(e) = handle_request(request, &context) {
                debug!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, context: &ServeContext) -> Result<()> {
    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    match request.method() {
        Method::Get | Method::Head => {}
        Method::Options => return response::respond_preflight(request),
        _ => return response::respond_method_not_allowed(request),
    }

    let url = request.url().to_string();
    let path = url.find(['?', '#']).map_or(url.as_str(), |end| &url[..end]);

    if path == ENDPOINT {
        return subscribe(request, context);
    }

    // tiny_http drops the body when answering HEAD, so both go through here.
    match context.root.resolve(&url) {
        Ok(file) => {
            debug!("serve"; "200 {} ({})", url, file.path.display());
            response::respond_file(request, file, context.live_reload)
        }
        Err(ResolveError::NotFound(_)) => {
            debug!("serve"; "404 {}", url);
            response::respond_not_found(request, path, context.live_reload)
        }
        Err(e) => {
            crate::logger::status_error(&format!("500 {url}"), &e.to_string());
            response::respond_server_error(request, &e, context.live_reload)
        }
    }
}

/// Turn the connection into an event stream owned by the broadcaster.
///
/// The worker returns as soon as the stream is registered.
fn subscribe(request: Request, context: &ServeContext) -> Result<()> {
    if *request.method() == Method::Head {
        return response::respond_event_stream_head(request);
    }

    let stream = response::open_event_stream(request)?;
    context.broadcaster.subscribe(stream)?;
    Ok(())
}
