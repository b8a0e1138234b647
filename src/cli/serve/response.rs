//! HTTP response handlers.

use super::content::maybe_inject_livereload;
use super::path::{ResolveError, ResolvedFile};
use crate::utils::mime::types::{EVENT_STREAM, HTML, PLAIN};
use anyhow::Result;
use std::io::{self, Write};
use tiny_http::{Header, Request, Response, StatusCode};

/// Applied to every file and error response.
const CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Headers of the event stream, shared by `GET` and `HEAD`.
const EVENT_STREAM_HEADERS: [(&str, &str); 5] = [
    ("Content-Type", EVENT_STREAM),
    ("Cache-Control", "no-cache"),
    ("Connection", "keep-alive"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Cache-Control"),
];

/// Respond with a resolved file, injecting the reload snippet into HTML.
pub fn respond_file(request: Request, file: ResolvedFile, live_reload: bool) -> Result<()> {
    let body = maybe_inject_livereload(file.body, file.content_type, live_reload);
    send_body(request, 200, file.content_type, body)
}

/// Respond to `HEAD` on the event-stream endpoint without subscribing.
pub fn respond_event_stream_head(request: Request) -> Result<()> {
    let response = EVENT_STREAM_HEADERS
        .iter()
        .fold(Response::empty(StatusCode(200)), |response, &(key, value)| {
            response.with_header(make_header(key, value))
        });
    request.respond(response)?;
    Ok(())
}

/// Respond with the 404 page.
pub fn respond_not_found(request: Request, path: &str, live_reload: bool) -> Result<()> {
    use crate::embed::serve::{NOT_FOUND_HTML, NotFoundVars};

    let body = NOT_FOUND_HTML.render(&NotFoundVars { path });
    let body = maybe_inject_livereload(body.into_bytes(), HTML, live_reload);
    send_body(request, 404, HTML, body)
}

/// Respond with the 500 page, showing the cause.
pub fn respond_server_error(
    request: Request,
    error: &ResolveError,
    live_reload: bool,
) -> Result<()> {
    use crate::embed::serve::{SERVER_ERROR_HTML, ServerErrorVars};

    let message = error.to_string();
    let body = SERVER_ERROR_HTML.render(&ServerErrorVars { message: &message });
    let body = maybe_inject_livereload(body.into_bytes(), HTML, live_reload);
    send_body(request, 500, HTML, body)
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    let response = Response::from_data(b"503 Service Unavailable".to_vec())
        .with_status_code(StatusCode(503))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Connection", "close"));
    request.respond(response)?;
    Ok(())
}

/// Respond with 405 for methods other than GET, HEAD and OPTIONS.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Allow", "GET, HEAD, OPTIONS"));
    request.respond(response)?;
    Ok(())
}

/// Answer a CORS preflight.
pub fn respond_preflight(request: Request) -> Result<()> {
    let response = Response::empty(StatusCode(204))
        .with_header(make_header("Access-Control-Allow-Origin", "*"))
        .with_header(make_header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS"))
        .with_header(make_header("Access-Control-Allow-Headers", "Cache-Control"))
        .with_header(make_header("Allow", "GET, HEAD, OPTIONS"));
    request.respond(response)?;
    Ok(())
}

/// Take over the connection and write the event-stream head.
///
/// The head is written by hand because the connection outlives the request
/// and must not be buffered. The returned writer is the raw socket; frames
/// written to it reach the client immediately once flushed.
pub fn open_event_stream(request: Request) -> io::Result<Box<dyn Write + Send>> {
    let mut head = String::from("HTTP/1.1 200 OK\r\n");
    for (key, value) in EVENT_STREAM_HEADERS {
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let mut writer = request.into_writer();
    writer.write_all(head.as_bytes())?;
    writer.flush()?;
    Ok(writer)
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", CACHE_CONTROL));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).expect("static header is valid")
}
