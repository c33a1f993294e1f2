mod config;
mod enrollments;
mod grid;
mod ipc;
mod notifications;
mod occupancy;
mod roster;
mod session;
mod slots;
mod week;

use std::io::{self, BufRead, Write};

fn main() {
    // stdout carries the protocol; logs must stay on stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let startup = match config::config_path(std::env::args().skip(1), std::env::var(config::CONFIG_ENV).ok()) {
        Some(path) => match config::load_config_file(&path) {
            Ok(c) => {
                log::info!("loaded config from {}", path.display());
                c
            }
            Err(e) => {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        },
        None => config::StartupConfig::default(),
    };

    let mut state = ipc::AppState::new(startup, chrono::Local::now().naive_local());
    log::info!(
        "academyd {} ready with {} slot(s)",
        env!("CARGO_PKG_VERSION"),
        state.registry.len()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
