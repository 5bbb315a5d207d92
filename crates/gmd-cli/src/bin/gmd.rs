//! Command line driver for the GMD simulation server.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use gmd_cli::{threat_board, GmdClient};
use gmd_core::models::{LaunchRequest, MissileClass};

/// Drive a running GMD server from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// GMD Server URL
    #[arg(long, default_value = "http://localhost:3000", env = "GMD_URL")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch a single missile
    Launch {
        /// Missile name (server picks one when omitted)
        #[arg(long)]
        name: Option<String>,

        /// ICBM, IRBM, SRBM or Hypersonic (server picks one when omitted)
        #[arg(long = "type", value_parser = parse_class)]
        missile_type: Option<MissileClass>,

        #[arg(long, allow_hyphen_values = true)]
        launch_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        launch_lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        target_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        target_lon: f64,
    },

    /// Order an intercept against an in-flight missile
    Intercept {
        missile_id: String,

        /// Interceptor site id (e.g. norfolk, yokosuka)
        #[arg(long)]
        site: String,
    },

    /// Launch the four-missile demonstration attack
    MassAttack,

    /// List tracked missiles
    Missiles,

    /// List interceptor sites
    Sites,

    /// Poll the server and print a ranked threat board
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 2.0)]
        interval: f64,

        /// Number of polls (0 = until interrupted)
        #[arg(long, default_value_t = 0)]
        count: u32,
    },
}

fn parse_class(value: &str) -> Result<MissileClass, String> {
    MissileClass::LAUNCHABLE
        .iter()
        .copied()
        .find(|class| class.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("unknown missile type '{value}'"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let client = GmdClient::new(&args.url);

    match args.command {
        Command::Launch {
            name,
            missile_type,
            launch_lat,
            launch_lon,
            target_lat,
            target_lon,
        } => {
            let request = LaunchRequest {
                name,
                missile_type,
                launch_lat: Some(launch_lat),
                launch_lon: Some(launch_lon),
                target_lat: Some(target_lat),
                target_lon: Some(target_lon),
            };
            let resp = client.launch(&request)?;
            println!("{}: {}", resp.message, resp.missile_id);
        }
        Command::Intercept { missile_id, site } => {
            let resp = client.intercept(&missile_id, &site)?;
            println!("{}", resp.message);
            match (resp.interceptor_expended, resp.remaining_interceptors) {
                (true, Some(left)) => {
                    println!("  {} expended one interceptor, {} ready", resp.interceptor_site_id, left)
                }
                _ => println!("  No interceptor expended at {}", resp.interceptor_site_id),
            }
        }
        Command::MassAttack => {
            let resp = client.mass_attack()?;
            println!("{}", resp.message);
            for id in resp.missiles {
                println!("  {}", id);
            }
        }
        Command::Missiles => {
            let missiles = client.missiles()?;
            if missiles.is_empty() {
                println!("No missiles tracked.");
            }
            for m in missiles {
                println!(
                    "{}  {:<18} {:<10} {:<11} ({:.4}, {:.4}) alt {:.1} km",
                    m.id,
                    m.name,
                    m.class.as_str(),
                    m.status.as_str(),
                    m.current.lat,
                    m.current.lon,
                    m.altitude_m / 1000.0
                );
            }
        }
        Command::Sites => {
            for site in client.sites()? {
                println!(
                    "{:<10} {:<22} {:<8} range {:>5.0} km  ready {:>2}  {:?}",
                    site.id,
                    site.name,
                    site.interceptor_type.to_string(),
                    site.range_km,
                    site.ready_interceptors,
                    site.status
                );
            }
        }
        Command::Watch { interval, count } => {
            watch(&client, Duration::from_secs_f64(interval.max(0.1)), count)?;
        }
    }

    Ok(())
}

fn watch(client: &GmdClient, interval: Duration, count: u32) -> Result<()> {
    let mut polls = 0u32;
    loop {
        let sites = client.sites()?;
        match client.missiles() {
            Ok(missiles) => {
                let rows = threat_board(&missiles, &sites);
                println!("\n[{}] {} active threat(s)", Utc::now().format("%H:%M:%S"), rows.len());
                for row in rows {
                    println!("  {}", row.render());
                }
            }
            Err(e) => eprintln!("Error polling missiles: {}", e),
        }

        polls += 1;
        if count > 0 && polls >= count {
            break;
        }
        thread::sleep(interval);
    }
    Ok(())
}
