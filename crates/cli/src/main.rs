use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use careconnect_client::{ApiClient, ClientConfig};
use careconnect_core::{
    classify, distance_km, lookup_city, needs_guardian_verification, parse_age, AgeRecord,
    Coordinate, FixedLocator, FlowStage, GuardianChoice, LocationResolver, ServiceCategory,
    ServiceRecord, Step, VerificationConfig,
};
use careconnect_observability::{init_tracing, FlowMetrics};
use careconnect_sessions::{
    load_service_detail, resolve_device_location, resolve_manual_location, ChatFlow, Intake,
    ServiceDiscoveryGate, SessionError,
};
use careconnect_storage::{Catalog, ServiceCatalog};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "careconnect")]
#[command(about = "CareConnect AI terminal client")]
struct Cli {
    #[arg(long)]
    api_base_url: Option<String>,

    #[arg(long, default_value_t = 2000)]
    advisory_dwell_ms: u64,

    #[arg(long)]
    catalog_db: Option<String>,

    #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
    device_position: Option<FixedLocator>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Discover,
    Chat,
    Service {
        id: String,
    },
    Age {
        age: String,
    },
    Locate {
        city: String,
    },
    #[command(allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("careconnect_cli");
    let cli = Cli::parse();

    let metrics = FlowMetrics::shared();
    let config = VerificationConfig {
        advisory_dwell: Duration::from_millis(cli.advisory_dwell_ms),
    };
    let resolver = LocationResolver::new(cli.device_position.clone());

    match &cli.command {
        Command::Discover => {
            let catalog = match cli.catalog_db.as_deref() {
                Some(url) => Catalog::sqlite(url).await?,
                None => Catalog::fixtures(),
            };
            let gate = ServiceDiscoveryGate::new(Arc::new(catalog), config, metrics.clone());
            run_discover(gate, &resolver).await?;
        }
        Command::Chat => {
            let api = Arc::new(build_client(&cli)?);
            let flow = ChatFlow::new(api, config, metrics.clone());
            run_chat(flow, &resolver).await?;
        }
        Command::Service { id } => {
            let api = build_client(&cli)?;
            let record = load_service_detail(&api, id, &metrics).await?;
            print_service(&record);
        }
        Command::Age { age } => {
            let value = parse_age(age)?;
            let category = classify(value);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "age": value,
                    "ageCategory": category,
                    "label": category.label(),
                    "description": category.description(),
                    "needsGuardian": needs_guardian_verification(value),
                }))?
            );
        }
        Command::Locate { city } => {
            let coordinate = lookup_city(city)?;
            println!("{}", serde_json::to_string_pretty(&coordinate)?);
        }
        Command::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => {
            println!("{:.3} km", distance_km(*lat1, *lon1, *lat2, *lon2));
        }
    }

    tracing::info!(metrics = ?metrics.snapshot(), "careconnect finished");
    Ok(())
}

fn build_client(cli: &Cli) -> Result<ApiClient> {
    match cli.api_base_url.as_deref() {
        Some(url) => ApiClient::new(&ClientConfig::new(url))
            .with_context(|| format!("failed to configure API client for {url}")),
        None => ApiClient::from_env().context("failed to configure API client from environment"),
    }
}

async fn run_discover(
    mut gate: ServiceDiscoveryGate<Catalog>,
    resolver: &LocationResolver<FixedLocator>,
) -> Result<()> {
    println!("CareConnect discover mode. type 'exit' to quit.");

    loop {
        if gate.intake().age().is_none() {
            println!("\nStep 1: Verify Your Age");
            if !verify_age(gate.intake_mut()).await? {
                break;
            }
        }
        if let Some(record) = gate.intake().age() {
            print_age(record);
        }

        if gate.intake().location().is_none() {
            println!("\nStep 2: Select Your Location");
            match choose_location(resolver).await? {
                Some(location) => gate.set_location(location),
                None => break,
            }
        }
        if let Some(location) = gate.intake().location() {
            println!("Location set: {}", location.display_name());
        }

        println!("\nWhat kind of help are you looking for?");
        for (index, category) in ServiceCategory::ALL.iter().enumerate() {
            println!("  {}) {}", index + 1, category.label());
        }
        let Some(line) = prompt("category number, 'age' or 'location' to change, 'exit'")? else {
            break;
        };

        match line.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "age" => gate.reset_age(),
            "location" => gate.reset_location(),
            other => {
                let Some(category) = parse_category(other) else {
                    eprintln!("unknown category: {other}");
                    continue;
                };
                gate.select_category(category)?;
                search_category(&mut gate).await;
            }
        }
    }

    Ok(())
}

// catalog failures are reported and the gate stays usable for another attempt
async fn search_category<C: ServiceCatalog>(gate: &mut ServiceDiscoveryGate<C>) -> Option<usize> {
    match gate.search().await {
        Ok(results) => {
            println!("\nFound {} service(s) near you", results.len());
            for record in results {
                print_service(record);
            }
            Some(results.len())
        }
        Err(error) => {
            eprintln!("{error}");
            None
        }
    }
}

async fn run_chat(
    mut flow: ChatFlow<ApiClient>,
    resolver: &LocationResolver<FixedLocator>,
) -> Result<()> {
    println!("CareConnect chat mode. type 'exit' to quit.");

    if !verify_age(flow.intake_mut()).await? {
        return Ok(());
    }
    if let Some(record) = flow.intake().age() {
        print_age(record);
    }

    let Some(location) = choose_location(resolver).await? else {
        return Ok(());
    };
    let session = flow.set_location(location)?;
    for entry in session.transcript() {
        println!("\n{}\n", entry.content);
    }

    loop {
        let Some(message) = prompt(">")? else {
            break;
        };
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        match flow.send(&message).await {
            Ok(entry) => println!("\n{}\n", entry.content),
            Err(SessionError::EmptyMessage) => continue,
            Err(error) => eprintln!("{error}"),
        }
    }

    Ok(())
}

async fn verify_age(intake: &mut Intake) -> Result<bool> {
    loop {
        match intake.stage() {
            FlowStage::Verified => return Ok(true),
            FlowStage::Advising => {
                intake.await_advisory().await;
                return Ok(true);
            }
            FlowStage::CollectingAge => {
                let Some(input) = prompt("What is your age?")? else {
                    return Ok(false);
                };
                match intake.submit_age(&input) {
                    Ok(Step::Verified(_)) => return Ok(true),
                    Ok(_) => {}
                    Err(error) => eprintln!("{error}"),
                }
            }
            FlowStage::CollectingGuardianStatus => {
                println!(
                    "Since you're under 18, we want to make sure you have support. Do you have a parent or guardian helping you?"
                );
                let Some(input) = prompt("yes / no / back")? else {
                    return Ok(false);
                };
                if input.eq_ignore_ascii_case("back") {
                    intake.go_back()?;
                    continue;
                }
                let Some(choice) = GuardianChoice::parse(&input) else {
                    eprintln!("please answer yes or no");
                    continue;
                };

                intake.select_guardian(choice)?;
                if let Step::Advising { message, .. } = intake.confirm_guardian(Instant::now())? {
                    println!("{message}");
                }
            }
        }
    }
}

async fn choose_location(
    resolver: &LocationResolver<FixedLocator>,
) -> Result<Option<Coordinate>> {
    if resolver.has_device() {
        let answer = prompt("Use my location? [Y/n]")?;
        let use_device = answer
            .as_deref()
            .map(|value| value.is_empty() || value.eq_ignore_ascii_case("y"))
            .unwrap_or(false);
        if use_device {
            match resolve_device_location(resolver).await {
                Ok(location) => return Ok(Some(location)),
                Err(_) => {
                    eprintln!("Unable to get your location. Please enable location services.")
                }
            }
        }
    }

    loop {
        let Some(city) = prompt("Enter city (e.g., Bangalore)")? else {
            return Ok(None);
        };
        if city.is_empty() {
            continue;
        }
        match resolve_manual_location(resolver, &city) {
            Ok(location) => return Ok(Some(location)),
            Err(error) => eprintln!("{error}"),
        }
    }
}

fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label} ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_category(value: &str) -> Option<ServiceCategory> {
    match value.parse::<usize>() {
        Ok(index) if index >= 1 => ServiceCategory::ALL.get(index - 1).copied(),
        Ok(_) => None,
        Err(_) => ServiceCategory::parse(value),
    }
}

fn parse_position(value: &str) -> Result<FixedLocator, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| "expected LAT,LON".to_string())?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude: {e}"))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err("coordinates out of range".to_string());
    }
    Ok(FixedLocator::new(lat, lon))
}

fn print_age(record: &AgeRecord) {
    match record.has_guardian() {
        Some(has_guardian) => println!(
            "Age: {} ({}) Guardian present: {}",
            record.age(),
            record.age_category(),
            if has_guardian { "Yes" } else { "No" }
        ),
        None => println!("Age: {} ({})", record.age(), record.age_category()),
    }
}

fn print_service(record: &ServiceRecord) {
    println!("\n{} [{}]", record.name, record.category.label());
    println!(
        "  {} | {:.1} km away",
        record.availability.as_code(),
        record.distance_km
    );
    println!("  {}", record.address);
    if let Some(phone) = &record.phone {
        println!("  phone: {phone}");
    }
    if let Some(email) = &record.email {
        println!("  email: {email}");
    }
    if let Some(description) = &record.description {
        println!("  {description}");
    }
}
