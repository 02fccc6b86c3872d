//! Dashboard HTTP server.
//!
//! One connection is handled at a time on the calling thread, so every
//! input-change event runs to completion before the next request is read.
//!
//! Endpoints:
//!   GET /                 - HTML page; `site`, `low`, `high` apply an input change
//!   GET /api/figures      - published figures (same query as `/`)
//!   GET /api/layout       - page view tree
//!   GET /api/pie?site=    - success counts for a selection
//!   GET /api/scatter?site=&low=&high= - filtered points
//!   GET /api/manifest     - dataset manifest
//!   GET /api/health       - health check

use serde_json::json;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use crate::binding::{Dashboard, InputChange, Inputs};
use crate::data::DatasetManifest;
use crate::error::DashError;
use crate::logging::{self, obj, v_num, v_str, Domain};
use crate::model::{PayloadRange, SiteSelection};
use crate::{pie, scatter, view};

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    /// Parses an HTTP request line such as `GET /api/pie?site=ALL HTTP/1.1`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?;
        let url = url::Url::parse(&format!("http://localhost{}", target)).ok()?;
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Some(Self {
            method,
            path: url.path().to_string(),
            query,
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn number(&self, key: &str) -> Result<Option<f64>, DashError> {
        match self.param(key) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| DashError::BadQuery(format!("{} is not a number: {:?}", key, raw))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: "200 OK",
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: "200 OK",
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    pub fn bad_request(err: &DashError) -> Self {
        Self {
            status: "400 BAD REQUEST",
            content_type: "application/json",
            body: json!({ "error": err.to_string() }).to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: "404 NOT FOUND",
            content_type: "text/plain",
            body: "Not Found".to_string(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: "405 METHOD NOT ALLOWED",
            content_type: "text/plain",
            body: "Method Not Allowed".to_string(),
        }
    }

    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Connection: close\r\n\
             Content-Length: {}\r\n\r\n{}",
            self.status,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

/// Input changes carried by a query string. A missing bound keeps its current value.
pub fn changes_from_query(req: &Request, current: &Inputs) -> Result<Vec<InputChange>, DashError> {
    let mut changes = Vec::new();
    if let Some(site) = req.param("site").filter(|s| !s.trim().is_empty()) {
        changes.push(InputChange::Site(SiteSelection::parse(site)));
    }
    let low = req.number("low")?;
    let high = req.number("high")?;
    if low.is_some() || high.is_some() {
        let range = PayloadRange::from_slider(
            low.unwrap_or(current.payload.low()),
            high.unwrap_or(current.payload.high()),
        )?;
        changes.push(InputChange::Payload(range));
    }
    Ok(changes)
}

/// How long a connection may stay silent before it is dropped.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Server {
    dash: Dashboard,
    manifest: Option<DatasetManifest>,
    read_timeout: Duration,
}

impl Server {
    pub fn new(dash: Dashboard, manifest: Option<DatasetManifest>) -> Self {
        Self {
            dash,
            manifest,
            read_timeout: READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dash
    }

    pub fn handle(&mut self, req: &Request) -> Response {
        if req.method != "GET" {
            return Response::method_not_allowed();
        }
        let result = match req.path.as_str() {
            "/" | "/index.html" => self
                .apply_query(req)
                .map(|_| Response::html(view::render_page(&self.dash))),
            "/api/figures" => self.apply_query(req).map(|_| self.figures()),
            "/api/layout" => Ok(Response::json(json!(view::layout(&self.dash)))),
            "/api/pie" => self.pie(req),
            "/api/scatter" => self.scatter(req),
            "/api/manifest" => Ok(match &self.manifest {
                Some(m) => Response::json(json!(m)),
                None => Response::not_found(),
            }),
            "/api/health" => Ok(Response::json(json!({
                "status": "ok",
                "records": self.dash.dataset().len(),
                "events": self.dash.events(),
            }))),
            _ => Ok(Response::not_found()),
        };
        result.unwrap_or_else(|err| Response::bad_request(&err))
    }

    fn apply_query(&mut self, req: &Request) -> Result<(), DashError> {
        let changes = changes_from_query(req, self.dash.inputs())?;
        self.dash.apply(&changes)?;
        Ok(())
    }

    fn figures(&self) -> Response {
        Response::json(json!({
            "inputs": self.dash.inputs(),
            "events": self.dash.events(),
            "outputs": self.dash.slots(),
        }))
    }

    fn pie(&self, req: &Request) -> Result<Response, DashError> {
        let site = SiteSelection::parse(req.param("site").unwrap_or(crate::model::ALL_SITES));
        let slices = pie::aggregate(self.dash.dataset().records(), &site)?;
        Ok(Response::json(json!({
            "title": pie::title(&site),
            "slices": slices,
        })))
    }

    fn scatter(&self, req: &Request) -> Result<Response, DashError> {
        let ds = self.dash.dataset();
        let site = SiteSelection::parse(req.param("site").unwrap_or(crate::model::ALL_SITES));
        let range = PayloadRange::new(
            req.number("low")?.unwrap_or(ds.min_payload()),
            req.number("high")?.unwrap_or(ds.max_payload()),
        )?;
        let points = scatter::filter(ds.records(), &site, range);
        Ok(Response::json(json!({
            "title": scatter::title(&site),
            "range": range,
            "points": points,
        })))
    }

    /// Accept loop. Runs until the listener fails.
    pub fn serve(&mut self, listener: TcpListener) -> io::Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.handle_stream(stream),
                Err(err) => logging::error(
                    Domain::Http,
                    "accept.failed",
                    obj(&[("error", v_str(&err.to_string()))]),
                ),
            }
        }
        Ok(())
    }

    fn handle_stream(&mut self, mut stream: TcpStream) {
        // an idle client must not stall the accept loop
        if let Err(err) = stream.set_read_timeout(Some(self.read_timeout)) {
            logging::warn(
                Domain::Http,
                "timeout.unset",
                obj(&[("error", v_str(&err.to_string()))]),
            );
            return;
        }
        let request_line = match read_head(&stream) {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(err) => {
                let event = match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => "read.timeout",
                    _ => "read.failed",
                };
                let peer = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                logging::warn(
                    Domain::Http,
                    event,
                    obj(&[("peer", v_str(&peer)), ("error", v_str(&err.to_string()))]),
                );
                return;
            }
        };

        let response = match Request::parse_line(request_line.trim()) {
            Some(req) => {
                let response = self.handle(&req);
                logging::info(
                    Domain::Http,
                    "request",
                    obj(&[
                        ("method", v_str(&req.method)),
                        ("path", v_str(&req.path)),
                        ("status", v_str(response.status)),
                        ("bytes", v_num(response.body.len() as f64)),
                    ]),
                );
                response
            }
            None => {
                let err = DashError::BadQuery("malformed request line".to_string());
                Response::bad_request(&err)
            }
        };

        if let Err(err) = stream.write_all(response.to_http().as_bytes()) {
            logging::warn(
                Domain::Http,
                "write.failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }
}

/// Reads the request line and drains the headers. `None` when the peer closed without sending.
fn read_head(stream: &TcpStream) -> io::Result<Option<String>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    let mut header = String::new();
    while reader.read_line(&mut header)? > 0 && !header.trim().is_empty() {
        header.clear();
    }
    Ok(Some(request_line))
}
