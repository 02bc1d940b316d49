//! fleet-runner: headless runner for the CashCycle fleet simulation.
//!
//! Usage:
//!   fleet-runner --seed 42 --days 30 --db fleet.db
//!   fleet-runner --seed 42 --db fleet.db --ipc-mode

use anyhow::Result;
use cashcycle_core::config::ConfigUpdate;
use cashcycle_core::predictor::SeasonalBaseline;
use cashcycle_core::service::CashService;
use cashcycle_core::store::HistoryStore;
use cashcycle_core::types::{MachineId, ShockEvent};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetStatus,
    Forecast,
    Advance { days: Option<u32> },
    Reset,
    InjectEvent { kind: String },
    SetConfig { config: ConfigUpdate },
    MachineDetail { machine_id: MachineId },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 0u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or("fleet.db");

    if !ipc_mode {
        println!("CashCycle — fleet-runner");
        println!("  seed: {seed}");
        println!("  days: {days}");
        println!("  db:   {db}");
        println!();
    }

    let store = if db == ":memory:" {
        HistoryStore::in_memory()?
    } else {
        HistoryStore::open(db)?
    };
    let mut service = CashService::new(store, seed, Box::new(SeasonalBaseline))?;

    if ipc_mode {
        run_ipc_loop(&mut service)?;
    } else {
        for _ in 0..days {
            service.advance_day()?;
        }
        print_summary(&service)?;
    }

    Ok(())
}

fn run_ipc_loop(service: &mut CashService) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                reply(&mut stdout, &serde_json::json!({ "error": e.to_string() }))?;
                continue;
            }
        };

        let response = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetStatus => serde_json::to_value(service.network_status()?)?,
            IpcCommand::Forecast => match service.forecast() {
                Ok(plan) => serde_json::to_value(plan)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            IpcCommand::Advance { days } => {
                let mut new_date = None;
                for _ in 0..days.unwrap_or(1) {
                    new_date = Some(service.advance_day()?);
                }
                serde_json::json!({ "message": "Simulation advanced", "new_date": new_date })
            }
            IpcCommand::Reset => {
                service.reset()?;
                serde_json::json!({ "message": "Simulation reset" })
            }
            IpcCommand::InjectEvent { kind } => match ShockEvent::parse(&kind) {
                Some(event) => {
                    service.inject_event(event);
                    serde_json::json!({
                        "message": format!("Event '{}' scheduled for next simulation step", event.name())
                    })
                }
                None => serde_json::json!({ "error": format!("unknown event '{kind}'") }),
            },
            IpcCommand::SetConfig { config } => {
                let updated = service.update_config(config);
                serde_json::json!({ "message": "Config updated", "config": updated })
            }
            IpcCommand::MachineDetail { machine_id } => match service.machine_detail(machine_id) {
                Ok(detail) => serde_json::to_value(detail)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
        };
        reply(&mut stdout, &response)?;
    }
    Ok(())
}

fn reply(stdout: &mut io::Stdout, value: &serde_json::Value) -> Result<()> {
    writeln!(stdout, "{value}")?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(service: &CashService) -> Result<()> {
    let status = service.network_status()?;

    println!("=== FLEET SUMMARY ===");
    println!("  latest day:      {}", status.date);
    println!("  fleet net flow:  {}", status.total_cash_flow);
    println!(
        "  thresholds:      min {} / max {} ({:?})",
        status.config.min_cash_threshold,
        status.config.max_cash_threshold,
        status.config.risk_tolerance
    );

    println!();
    println!("=== NEXT-DAY FORECAST ===");
    let plan = service.forecast()?;
    for machine in &plan.network_status {
        println!(
            "  machine {} | predicted {:>9} | {:?}",
            machine.machine_id, machine.net_flow, machine.status
        );
    }
    if plan.rebalancing_schedule.is_empty() {
        println!("  (no rebalancing needed)");
    } else {
        for action in &plan.rebalancing_schedule {
            println!("  {}", serde_json::to_string(action)?);
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
