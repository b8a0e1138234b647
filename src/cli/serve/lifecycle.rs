//! Server lifecycle management.

use crate::{actor::Coordinator, core::register_server, log};
use anyhow::{Result, anyhow};
use crossbeam::channel::Sender;
use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// How long shutdown waits for requests that are still being answered.
const IN_FLIGHT_GRACE: Duration = Duration::from_secs(5);

/// How long shutdown waits for the actor thread.
const ACTOR_GRACE: Duration = Duration::from_secs(2);

const POLL_STEP: Duration = Duration::from_millis(50);

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                // Port 0 asks the OS to choose; report what it chose.
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "failed to bind {} after {} attempts (ports {}-{}): {}",
        interface,
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map_or_else(|| "port out of range".to_string(), |e| e.to_string()),
    ))
}

/// Register server for graceful shutdown.
///
/// When Ctrl+C is pressed, the handler set up in main() unblocks the server
/// and notifies the actors.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Run the actor system on its own thread with a small tokio runtime.
pub fn spawn_actors(coordinator: Coordinator) -> Option<JoinHandle<()>> {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("liveserve-actor")
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("actor"; "failed to start runtime: {}", e);
            return None;
        }
    };

    let spawned = thread::Builder::new()
        .name("liveserve-actors".into())
        .spawn(move || runtime.block_on(coordinator.run()));

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            log!("actor"; "failed to spawn actor thread: {}", e);
            None
        }
    }
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    if wait_until(ACTOR_GRACE, || handle.is_finished()) {
        let _ = handle.join();
    } else {
        crate::debug!("actor"; "did not stop within {:?}", ACTOR_GRACE);
    }
}

// ============================================================================
// in-flight request tracking
// ============================================================================

/// Number of requests currently being answered by the worker pool.
///
/// Event streams are not counted: they outlive the request that opened them.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

/// Decrements the counter when dropped.
pub struct InFlightGuard(Arc<AtomicUsize>);

impl InFlight {
    pub fn enter(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.0))
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Wait until no request is in flight (max 5 seconds).
    pub fn wait_idle(&self) -> bool {
        self.wait_idle_for(IN_FLIGHT_GRACE)
    }

    fn wait_idle_for(&self, limit: Duration) -> bool {
        let idle = wait_until(limit, || self.count() == 0);
        if !idle {
            log!("serve"; "{} request(s) still running, not waiting", self.count());
        }
        idle
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Poll `done` until it holds or `limit` elapses.
fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        if done() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_STEP);
    }
}
