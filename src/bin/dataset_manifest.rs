use launchdash::data::{default_manifest_path, load, DatasetManifest, REQUIRED_COLUMNS};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let path = PathBuf::from(
        env::args()
            .nth(1)
            .unwrap_or_else(|| "spacex_launch_dash.csv".to_string()),
    );

    let dataset = match load(&path) {
        Ok(ds) => ds,
        Err(err) => {
            eprintln!("load failed: {}", err);
            eprintln!("required columns: {:?}", REQUIRED_COLUMNS);
            std::process::exit(1);
        }
    };

    let manifest = match DatasetManifest::build(&path, &dataset) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("manifest failed: {}", err);
            std::process::exit(2);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = match serde_json::to_string_pretty(&manifest) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("serialize failed: {}", err);
            std::process::exit(3);
        }
    };
    if let Err(err) = fs::write(&out_path, payload) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!(
        "wrote manifest {} ({} rows, {} sites)",
        out_path.display(),
        manifest.row_count,
        manifest.sites.len()
    );
}
