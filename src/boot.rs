use log::{error, info};
use std::fs;
use std::path::Path;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "website",
    "website/db",
    "website/uploads",
];

/// Run boot checks before Rocket launches: create missing directories,
/// log anything that could not be created.
pub fn run() {
    info!("Utku Store boot check starting...");

    for dir in REQUIRED_DIRS {
        let path = Path::new(dir);
        if !path.exists() {
            match fs::create_dir_all(path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => error!("  FAILED to create directory {}: {}", dir, e),
            }
        }
    }

    info!("Boot check complete.");
}
