use anyhow::{Context, Result};
use std::net::TcpListener;

use launchdash::binding::Dashboard;
use launchdash::config::Config;
use launchdash::data::{self, DatasetManifest};
use launchdash::logging::{self, obj, v_num, v_str, Domain, Level};
use launchdash::server::Server;

fn main() -> Result<()> {
    let mut cfg = Config::from_env();
    cfg.apply_args(std::env::args().skip(1))?;
    if cfg.debug {
        logging::set_min_level(Level::Debug);
    }

    let dataset = match data::load(&cfg.data_path) {
        Ok(ds) => ds,
        Err(err) => {
            logging::log(
                Level::Fatal,
                Domain::Data,
                "load.failed",
                obj(&[
                    ("path", v_str(&cfg.data_path.display().to_string())),
                    ("error", v_str(&err.to_string())),
                ]),
            );
            return Err(err).context("launch dataset is required to start the dashboard");
        }
    };
    logging::info(
        Domain::Data,
        "load.ok",
        obj(&[
            ("path", v_str(&cfg.data_path.display().to_string())),
            ("records", v_num(dataset.len() as f64)),
            ("sites", v_num(dataset.sites().len() as f64)),
            ("min_payload", v_num(dataset.min_payload())),
            ("max_payload", v_num(dataset.max_payload())),
        ]),
    );

    let manifest = DatasetManifest::build(&cfg.data_path, &dataset)
        .map_err(|err| {
            logging::warn(
                Domain::Data,
                "manifest.failed",
                obj(&[("error", v_str(&err.to_string()))]),
            )
        })
        .ok();

    let dash = Dashboard::new(dataset).context("initial chart computation failed")?;
    let listener = TcpListener::bind(cfg.bind_addr())
        .with_context(|| format!("failed to bind {}", cfg.bind_addr()))?;

    logging::info(
        Domain::System,
        "server.start",
        obj(&[
            ("url", v_str(&format!("http://{}", cfg.bind_addr()))),
            ("debug", serde_json::Value::Bool(cfg.debug)),
        ]),
    );

    let mut server = Server::new(dash, manifest);
    server.serve(listener).context("server loop failed")?;
    Ok(())
}
