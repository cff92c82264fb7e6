use chartographer_core::{BmpCodec, CanvasStore, RasterCodec};
use std::path::{Path, PathBuf};

use crate::server::config::AppConfig;
use crate::server::load_config;

pub async fn run(data_dir: Option<&Path>) -> anyhow::Result<()> {
    println!("🏥 Chartographer Doctor\n");

    let mut all_ok = true;

    let config = check_config();
    all_ok &= config.is_some();

    if let Some(config) = config {
        match check_data_dir(&config, data_dir) {
            Some(dir) => all_ok &= check_canvases(&dir),
            None => all_ok = false,
        }
    }

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to run Chartographer.");
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
        std::process::exit(1);
    }

    Ok(())
}

fn check_config() -> Option<AppConfig> {
    print!("Checking configuration... ");

    match load_config() {
        Ok(config) => {
            println!("✅ Loaded");
            println!(
                "  ℹ️  Listening address: {}:{}",
                config.server.host, config.server.port
            );
            Some(config)
        }
        Err(e) => {
            println!("❌ {:#}", e);
            None
        }
    }
}

fn check_data_dir(config: &AppConfig, data_dir: Option<&Path>) -> Option<PathBuf> {
    print!("Checking data directory... ");

    let dir = match config.storage.resolve_data_dir(data_dir) {
        Ok(dir) => dir,
        Err(e) => {
            println!("❌ {:#}", e);
            return None;
        }
    };

    match tempfile::tempfile_in(&dir) {
        Ok(_) => {
            println!("✅ {} (writable)", dir.display());
            Some(dir)
        }
        Err(e) => {
            println!("❌ {} is not writable: {}", dir.display(), e);
            None
        }
    }
}

fn check_canvases(dir: &Path) -> bool {
    print!("Checking stored canvases... ");

    let store = match CanvasStore::new(dir, BmpCodec::new().extension()) {
        Ok(store) => store,
        Err(e) => {
            println!("❌ {}", e);
            return false;
        }
    };

    match store.ids() {
        Ok(ids) if ids.is_empty() => {
            println!("ℹ️  No canvases yet");
            true
        }
        Ok(ids) => {
            println!("✅ {} canvas file(s)", ids.len());
            true
        }
        Err(e) => {
            println!("❌ {}", e);
            false
        }
    }
}
