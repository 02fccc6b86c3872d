//! Smoke tests: the dashboard's derived charts agree with the raw records.
//!
//! Covers the A/B reference scenario, the counting properties of the pie
//! aggregator, range containment of the scatter filter, and the server
//! request path end to end, both through `handle` and over a real socket.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use launchdash::binding::{Dashboard, Figure, Freshness, InputChange, OutputId};
use launchdash::data::Dataset;
use launchdash::model::{LaunchRecord, PayloadRange, PieSlice, ScatterPoint, SiteSelection};
use launchdash::pie::aggregate;
use launchdash::scatter::filter;
use launchdash::server::{Request, Server};

fn rec(site: &str, payload: f64, outcome: u8, booster: &str) -> LaunchRecord {
    LaunchRecord {
        launch_site: site.to_string(),
        payload_mass_kg: payload,
        outcome,
        booster_category: booster.to_string(),
    }
}

fn scenario() -> Vec<LaunchRecord> {
    vec![
        rec("A", 500.0, 1, "v1"),
        rec("A", 1500.0, 0, "v1"),
        rec("B", 800.0, 1, "v2"),
    ]
}

const SITES: [&str; 4] = ["CCAFS LC-40", "KSC LC-39A", "VAFB SLC-4E", "CCAFS SLC-40"];
const BOOSTERS: [&str; 5] = ["v1.0", "v1.1", "FT", "B4", "B5"];

fn random_records(rng: &mut StdRng, n: usize) -> Vec<LaunchRecord> {
    (0..n)
        .map(|_| {
            rec(
                SITES[rng.gen_range(0..SITES.len())],
                (rng.gen_range(0..=96) * 100) as f64,
                rng.gen_range(0..=1),
                BOOSTERS[rng.gen_range(0..BOOSTERS.len())],
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reference scenario
// ---------------------------------------------------------------------------

#[test]
fn scenario_pie_all_sites() {
    let slices = aggregate(&scenario(), &SiteSelection::All).unwrap();
    assert_eq!(slices, vec![PieSlice::new("A", 1), PieSlice::new("B", 1)]);
}

#[test]
fn scenario_pie_single_site() {
    let slices = aggregate(&scenario(), &SiteSelection::Site("A".into())).unwrap();
    assert_eq!(slices, vec![PieSlice::new("Success", 1), PieSlice::new("Failure", 1)]);
}

#[test]
fn scenario_scatter_window() {
    let range = PayloadRange::new(0.0, 1000.0).unwrap();
    let points = filter(&scenario(), &SiteSelection::All, range);
    assert_eq!(
        points,
        vec![
            ScatterPoint {
                payload_mass_kg: 500.0,
                outcome: 1,
                booster_category: "v1".into(),
            },
            ScatterPoint {
                payload_mass_kg: 800.0,
                outcome: 1,
                booster_category: "v2".into(),
            },
        ]
    );
}

#[test]
fn full_observed_range_returns_everything() {
    let ds = Dataset::from_records(scenario());
    let range = PayloadRange::new(ds.min_payload(), ds.max_payload()).unwrap();
    let points = filter(ds.records(), &SiteSelection::All, range);
    let expected: Vec<ScatterPoint> = ds.records().iter().map(ScatterPoint::from).collect();
    assert_eq!(points, expected);
}

// ---------------------------------------------------------------------------
// Properties over random datasets
// ---------------------------------------------------------------------------

#[test]
fn all_sites_pie_sums_to_total_successes() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let records = random_records(&mut rng, 60);
        let successes = records.iter().filter(|r| r.outcome == 1).count() as u64;
        let slices = aggregate(&records, &SiteSelection::All).unwrap();
        assert_eq!(slices.iter().map(|s| s.value).sum::<u64>(), successes);
    }
}

#[test]
fn site_pie_sums_to_site_launches() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let records = random_records(&mut rng, 40);
        let ds = Dataset::from_records(records);
        for site in ds.sites() {
            let launches = ds.records().iter().filter(|r| &r.launch_site == site).count() as u64;
            let slices = aggregate(ds.records(), &SiteSelection::Site(site.clone())).unwrap();
            assert!(slices.len() <= 2);
            assert_eq!(slices.iter().map(|s| s.value).sum::<u64>(), launches);
        }
    }
}

#[test]
fn scatter_points_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(23);
    let records = random_records(&mut rng, 200);
    for _ in 0..200 {
        let a = rng.gen_range(0.0..10000.0);
        let b = rng.gen_range(0.0..10000.0);
        let range = PayloadRange::new(a, b).unwrap();
        let site = if rng.gen_bool(0.5) {
            SiteSelection::All
        } else {
            SiteSelection::Site(SITES[rng.gen_range(0..SITES.len())].to_string())
        };
        let points = filter(&records, &site, range);
        assert!(points
            .iter()
            .all(|p| range.low() <= p.payload_mass_kg && p.payload_mass_kg <= range.high()));
        let expected = records
            .iter()
            .filter(|r| range.contains(r.payload_mass_kg) && site.matches(&r.launch_site))
            .count();
        assert_eq!(points.len(), expected);
    }
}

#[test]
fn repeated_calls_are_identical() {
    let mut rng = StdRng::seed_from_u64(42);
    let records = random_records(&mut rng, 80);
    let site = SiteSelection::Site("KSC LC-39A".into());
    let range = PayloadRange::new(2000.0, 7000.0).unwrap();
    assert_eq!(aggregate(&records, &SiteSelection::All), aggregate(&records, &SiteSelection::All));
    assert_eq!(filter(&records, &site, range), filter(&records, &site, range));
}

// ---------------------------------------------------------------------------
// Binding layer and server
// ---------------------------------------------------------------------------

#[test]
fn binding_publishes_fresh_figures() {
    let mut dash = Dashboard::new(Dataset::from_records(scenario())).unwrap();
    dash.apply(&[
        InputChange::Site(SiteSelection::Site("A".into())),
        InputChange::Payload(PayloadRange::new(1000.0, 2000.0).unwrap()),
    ])
    .unwrap();
    for slot in dash.slots().values() {
        assert_eq!(slot.freshness, Freshness::Fresh);
    }
    match dash.figure(OutputId::PayloadScatterChart).unwrap() {
        Figure::Scatter { points, .. } => {
            assert_eq!(points.len(), 1);
            assert_eq!(points[0].payload_mass_kg, 1500.0);
        }
        other => panic!("unexpected figure {:?}", other),
    }
}

fn server() -> Server {
    Server::new(Dashboard::new(Dataset::from_records(scenario())).unwrap(), None)
}

fn get(server: &mut Server, target: &str) -> (String, serde_json::Value) {
    let req = Request::parse_line(&format!("GET {} HTTP/1.1", target)).unwrap();
    let resp = server.handle(&req);
    let body = serde_json::from_str(&resp.body).unwrap_or(serde_json::Value::Null);
    (resp.status.to_string(), body)
}

#[test]
fn server_pie_and_scatter_endpoints() {
    let mut srv = server();
    let (status, body) = get(&mut srv, "/api/pie?site=A");
    assert_eq!(status, "200 OK");
    assert_eq!(body["title"], "Success for A site");
    assert_eq!(body["slices"][0]["label"], "Success");

    let (status, body) = get(&mut srv, "/api/scatter?low=1000&high=0");
    assert_eq!(status, "200 OK");
    // inverted bounds are swapped
    assert_eq!(body["points"].as_array().unwrap().len(), 2);
}

#[test]
fn server_rejects_unknown_site_and_keeps_state() {
    let mut srv = server();
    let (status, body) = get(&mut srv, "/api/figures?site=Nowhere");
    assert_eq!(status, "400 BAD REQUEST");
    assert!(body["error"].as_str().unwrap().contains("Nowhere"));
    assert_eq!(srv.dashboard().inputs().site, SiteSelection::All);
    assert_eq!(srv.dashboard().events(), 0);

    let (status, _) = get(&mut srv, "/api/pie?site=Nowhere");
    assert_eq!(status, "400 BAD REQUEST");

    // the scatter filter degrades to empty rather than failing
    let (status, body) = get(&mut srv, "/api/scatter?site=Nowhere");
    assert_eq!(status, "200 OK");
    assert!(body["points"].as_array().unwrap().is_empty());
}

#[test]
fn server_figures_follow_query() {
    let mut srv = server();
    let (status, body) = get(&mut srv, "/api/figures?site=B&low=0&high=1000");
    assert_eq!(status, "200 OK");
    assert_eq!(body["events"], 1);
    let pie = &body["outputs"]["success-pie-chart"];
    assert_eq!(pie["freshness"], "fresh");
    assert_eq!(pie["revision"], 2);
    assert_eq!(pie["figure"]["kind"], "pie");
    let scatter = &body["outputs"]["success-payload-scatter-chart"]["figure"];
    assert_eq!(scatter["points"].as_array().unwrap().len(), 1);
    assert_eq!(scatter["points"][0]["booster_category"], "v2");
}

#[test]
fn server_page_and_misc_routes() {
    let mut srv = server();
    let req = Request::parse_line("GET /?site=A HTTP/1.1").unwrap();
    let resp = srv.handle(&req);
    assert_eq!(resp.status, "200 OK");
    assert!(resp.content_type.starts_with("text/html"));
    assert!(resp.body.contains("<option value=\"A\" selected>A</option>"));
    assert!(resp.body.contains("Success for A site"));

    let (status, body) = get(&mut srv, "/api/health");
    assert_eq!(status, "200 OK");
    assert_eq!(body["records"], 3);

    let (status, body) = get(&mut srv, "/api/layout");
    assert_eq!(status, "200 OK");
    assert_eq!(body["node"], "container");

    let (status, _) = get(&mut srv, "/api/manifest");
    assert_eq!(status, "404 NOT FOUND");
    let (status, _) = get(&mut srv, "/nope");
    assert_eq!(status, "404 NOT FOUND");

    let req = Request::parse_line("POST /api/pie HTTP/1.1").unwrap();
    assert_eq!(srv.handle(&req).status, "405 METHOD NOT ALLOWED");
}

// ---------------------------------------------------------------------------
// Server over a socket
// ---------------------------------------------------------------------------

fn spawn_server(read_timeout: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let mut srv = server().with_read_timeout(read_timeout);
    thread::spawn(move || srv.serve(listener));
    addr
}

fn exchange(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw.as_bytes()).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

fn split_response(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n").unwrap()
}

#[test]
fn socket_round_trip_drains_headers() {
    let addr = spawn_server(Duration::from_secs(5));
    let raw = exchange(
        addr,
        "GET /api/pie?site=A HTTP/1.1\r\n\
         Host: localhost\r\n\
         User-Agent: smoke\r\n\
         Accept: application/json\r\n\r\n",
    );
    let (head, body) = split_response(&raw);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: application/json"));
    assert!(head.contains("Connection: close"));
    assert!(head.contains(&format!("Content-Length: {}", body.len())));

    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["title"], "Success for A site");
}

#[test]
fn socket_malformed_request_line_is_400() {
    let addr = spawn_server(Duration::from_secs(5));
    let raw = exchange(addr, "garbage\r\nHost: localhost\r\n\r\n");
    let (head, body) = split_response(&raw);
    assert!(head.starts_with("HTTP/1.1 400 BAD REQUEST\r\n"));
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("malformed request line"));
}

#[test]
fn idle_connection_does_not_block_next_client() {
    let addr = spawn_server(Duration::from_millis(200));
    // connects first and never sends a byte
    let _idle = TcpStream::connect(addr).unwrap();

    let raw = exchange(addr, "GET /api/health HTTP/1.1\r\nHost: localhost\r\n\r\n");
    let (head, body) = split_response(&raw);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["status"], "ok");
}
