//! Developer CLI over the bridge logic.
//!
//! Examples:
//!   timer-bridge-cli flags 'https://timer.example/?fg=%23ab12cd&init=5'
//!   timer-bridge-cli rewrite 'https://timer.example/app?init=1' '?init=2'
//!   timer-bridge-cli event '{"category":"timer","action":"start","value":25}'
//!   timer-bridge-cli --survey-url https://survey.example/p event '{...}'
//!
//! `--unbounded` disables the [-30, 30] range check on `init`.
//! Log verbosity follows `RUST_LOG` (stderr).
//!
//! Build with `--features cli`.

use std::process;

use timer_bridge::flags::{parse_init_flags, InitRange};
use timer_bridge::{AnalyticsEvent, BridgeConfig, PageLocation};
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: timer-bridge-cli [--survey-url URL] [--unbounded] <command>\n\
         \n\
         Commands:\n\
         \x20 flags <url>            Print the init flags decoded from a page URL\n\
         \x20 rewrite <url> <query>  Print the address after a query string update\n\
         \x20 event <json>           Print the analytics payload (and survey ping)"
    );
    process::exit(2);
}

fn parse_args() -> (BridgeConfig, Vec<String>) {
    let mut config = BridgeConfig::default()
        .with_env_survey_url(std::env::var(timer_bridge::config::SURVEY_URL_ENV).ok().as_deref());
    let mut args = Vec::new();

    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--survey-url" => {
                let v = it.next().unwrap_or_else(|| usage());
                config.survey_url = Some(v);
            }
            "--unbounded" => config.init_range = None,
            "-h" | "--help" => usage(),
            _ => args.push(a),
        }
    }

    if args.is_empty() {
        usage();
    }

    (config, args)
}

fn run(config: &BridgeConfig, args: &[String]) -> Result<(), String> {
    match args[0].as_str() {
        "flags" => {
            let url = args.get(1).ok_or("flags: missing url")?;
            let range: Option<InitRange> = config.init_range;
            let flags = parse_init_flags(url, range);
            let out = serde_json::to_string_pretty(&flags).map_err(|e| format!("serialize: {e}"))?;
            println!("{out}");
        }
        "rewrite" => {
            let (Some(url), Some(query)) = (args.get(1), args.get(2)) else {
                return Err("rewrite: expected <url> <query>".into());
            };
            let loc = PageLocation::parse(url).map_err(|e| e.to_string())?;
            println!("{}", loc.with_query(query));
        }
        "event" => {
            let raw = args.get(1).ok_or("event: missing json")?;
            let event = AnalyticsEvent::decode(raw).map_err(|e| e.to_string())?;
            let payload = serde_json::to_string_pretty(&event.payload())
                .map_err(|e| format!("serialize: {e}"))?;
            println!("event: {}", event.action);
            println!("{payload}");

            let survey = config.survey_endpoint().map_err(|e| e.to_string())?;
            match survey.and_then(|s| s.ping_url(&event)) {
                Some(url) => println!("survey ping: GET {url}"),
                None => println!("survey ping: none"),
            }
        }
        _ => usage(),
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (config, args) = parse_args();
    if let Err(e) = run(&config, &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
