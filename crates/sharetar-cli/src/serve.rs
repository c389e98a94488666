//! Serve command - minimal HTTP front end for share downloads.
//!
//! `GET /download/<share-ref>` with the caller identified by the
//! `X-User-Id` header.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tokio::runtime::Handle;

use sharetar::download::CACHE_CONTROL;
use sharetar::{DownloadResponse, DownloadService};

use crate::config::SharetarConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKERS: usize = 4;
const DOWNLOAD_PREFIX: &str = "/download/";
const USER_HEADER: &str = "X-User-Id";

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of request handling threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Share manifest (JSON)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Download(String),
    NotFound,
    MethodNotAllowed,
}

/// Map a request line to a route. Query strings are ignored and the share
/// reference is percent-decoded.
fn route(method: &Method, url: &str) -> Route {
    let path = url.split('?').next().unwrap_or("");

    let Some(encoded) = path.strip_prefix(DOWNLOAD_PREFIX) else {
        return Route::NotFound;
    };
    if encoded.is_empty() || encoded.contains('/') {
        return Route::NotFound;
    }
    if *method != Method::Get {
        return Route::MethodNotAllowed;
    }

    match urlencoding::decode(encoded) {
        Ok(share_ref) => Route::Download(share_ref.into_owned()),
        Err(_) => Route::NotFound,
    }
}

pub fn execute(args: ServeArgs, config: Option<&SharetarConfig>) -> Result<i32> {
    // CLI flags take precedence over sharetar.toml
    let host = args
        .host
        .or_else(|| config.and_then(|c| c.server.host.clone()))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = args
        .port
        .or_else(|| config.and_then(|c| c.server.port))
        .unwrap_or(DEFAULT_PORT);
    let workers = args
        .workers
        .or_else(|| config.and_then(|c| c.server.workers))
        .unwrap_or(DEFAULT_WORKERS)
        .max(1);
    let manifest = crate::resolve_manifest_path(args.manifest, config);

    let service = crate::build_service(&manifest, config)?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;

    let addr = format!("{}:{}", host, port);
    let server = Server::http(&addr).map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    log::info!("Serving share downloads on http://{} ({} workers)", addr, workers);
    println!("Press Ctrl-C to quit.");

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                for request in server.incoming_requests() {
                    handle_request(runtime.handle(), &service, request);
                }
            });
        }
    });

    Ok(0)
}

fn handle_request(runtime: &Handle, service: &DownloadService, request: tiny_http::Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let status = match route(&method, &url) {
        Route::Download(share_ref) => {
            let user = request
                .headers()
                .iter()
                .find(|h| h.field.equiv(USER_HEADER))
                .map(|h| h.value.as_str().to_string());

            match runtime.block_on(service.handle_download(&share_ref, user.as_deref())) {
                Ok(download) => send_download(request, download),
                Err(e) => send_error(request, e.status_code(), &e.public_message()),
            }
        }
        Route::NotFound => send_error(request, 404, "Not found"),
        Route::MethodNotAllowed => send_error(request, 405, "Method not allowed"),
    };

    log::info!("{} {} - {}", method, url, status);
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn send_download(request: tiny_http::Request, download: DownloadResponse) -> u16 {
    let headers: Vec<Header> = download
        .headers()
        .iter()
        .filter_map(|(name, value)| header(name, value))
        .collect();

    let mut response = Response::from_data(download.body);
    for h in headers {
        response.add_header(h);
    }

    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response: {}", e);
    }
    200
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn send_error(request: tiny_http::Request, status: u16, message: &str) -> u16 {
    let mut response = Response::from_string(error_body(message)).with_status_code(StatusCode(status));
    if let Some(h) = header("Content-Type", "application/json") {
        response.add_header(h);
    }
    if let Some(h) = header("Cache-Control", CACHE_CONTROL) {
        response.add_header(h);
    }

    if let Err(e) = request.respond(response) {
        log::warn!("Failed to send response: {}", e);
    }
    status
}
