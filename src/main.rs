#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use travelsure::{
    bridge::{HostAdapter, MiniAppBridge},
    pricing::destinations_by_zone,
    storage::open_store,
    TravelInsuranceApp, TravelSettings, TripDetails,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads .env and Settings.toml, applies env overrides and initializes the logger
    let settings = TravelSettings::load()
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {e}"))?;

    let store = open_store(&settings.storage).context("Failed to open storage")?;

    // No host runtime outside the Mini App container
    let bridge = MiniAppBridge::new(HostAdapter::detect(None), &settings);
    let mut app = TravelInsuranceApp::new(settings, bridge, store);
    app.initialize().await;

    print_session_info(&app);
    print_zones();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [destination, start_date, end_date] = args.as_slice() {
        print_quote(
            &app,
            &TripDetails {
                destination: destination.clone(),
                start_date: start_date.clone(),
                end_date: end_date.clone(),
            },
        );
    } else if !args.is_empty() {
        println!("Usage: travelsure [<destination> <start-date> <end-date>]");
    }

    app.shutdown();
    Ok(())
}

fn print_session_info(app: &TravelInsuranceApp) {
    let session = app.session();
    println!("Travelsure v{}", travelsure::VERSION);
    println!(
        "Host runtime: {}",
        if session.is_host_runtime() { "yes" } else { "no" }
    );
    match app.current_user() {
        Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
        None => println!("Not signed in"),
    }
    println!("Documents: {}", app.documents().len());
    for document in app.documents() {
        println!(
            "  {}  {}  {} ({} days)  {}",
            document.document_number,
            document.details.traveler_name,
            document.details.destination,
            document.details.duration,
            document.status.label()
        );
    }
    println!();
}

fn print_zones() {
    println!("Destination zones:");
    for (zone, destinations) in destinations_by_zone() {
        println!(
            "  {zone:<14} {}/day, minimum {}: {}",
            zone.daily_rate(),
            zone.minimum_charge(),
            destinations.join("، ")
        );
    }
    println!();
}

fn print_quote(app: &TravelInsuranceApp, trip: &TripDetails) {
    match app.quote(trip) {
        Some(quote) => {
            println!("Quote for {}:", trip.destination);
            println!("  Zone:     {}", quote.zone);
            println!("  Duration: {} days", quote.duration);
            println!("  Base:     {}", quote.base_price);
            println!("  Minimum:  {}", quote.minimum_price);
            println!("  Premium:  {} IQD", quote.price);
        }
        None => println!(
            "Cannot price {} from {} to {}: expected YYYY-MM-DD dates",
            trip.destination, trip.start_date, trip.end_date
        ),
    }
}
