//! Terminal UI for zonar: capture a delivery address, watch the zone and time
//! resolution, and see whether the order could be submitted.

mod app;
mod input;
mod ui;

use std::{collections::VecDeque, io, sync::Arc, time::Duration as StdDuration};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use zonar_core::{
    CaptureEvent, Coordinates, DeliveryResolver, Effect, HINT_RESOLVE_FAILED, ProviderRegistry,
    ResolutionResult, ZonarService,
};
use zonar_provider_addressbook as addressbook;
use zonar_provider_dgis as dgis;
use zonar_provider_yandex as yandex;
use zonar_storefront::{ShopResolver, fetch_zones};

use crate::app::App;
use crate::input::Action;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // HTTP + service setup
    let client = Client::builder().user_agent("zonar/0.1").build()?;

    let base_url =
        std::env::var("ZONAR_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
    let basket_total = std::env::var("ZONAR_BASKET")
        .ok()
        .and_then(|raw| raw.parse::<Decimal>().ok())
        .unwrap_or_else(|| Decimal::from(1000));

    let mut plugins = Vec::new();
    if let Ok(key) = std::env::var("ZONAR_DGIS_KEY") {
        plugins.push(dgis::plugin(client.clone(), key));
    }
    if let Ok(key) = std::env::var("ZONAR_YANDEX_KEY") {
        plugins.push(yandex::plugin(client.clone(), key));
    }
    // Always available, even with no API keys configured.
    plugins.push(addressbook::plugin(Vec::new()));
    let registry = Arc::new(ProviderRegistry::new(plugins));

    let zones = fetch_zones(&client, &base_url).await?;
    tracing::info!(%base_url, zones = zones.len(), "zonar starting");
    let shop = Arc::new(ShopResolver::new(client, &base_url));
    let resolver = DeliveryResolver::new(Arc::new(zones), shop);
    let service = Arc::new(ZonarService::new(registry, resolver));

    // App state; a saved address from a previous session restores on start.
    let app = App::new(service, basket_total);
    let restore = saved_address_from_env();

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, restore).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

/// Parse `ZONAR_SAVED` ("display address@lat,lon") into a restore event.
fn saved_address_from_env() -> Option<CaptureEvent> {
    let raw = std::env::var("ZONAR_SAVED").ok()?;
    let (label, coords) = raw.rsplit_once('@')?;
    let coordinates = Coordinates::from_wire(coords)?;
    Some(CaptureEvent::RestoreSaved {
        address: label.trim().to_owned(),
        coordinates,
    })
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    restore: Option<CaptureEvent>,
) -> Result<()> {
    if let Some(capture_event) = restore {
        dispatch(terminal, &mut app, capture_event).await?;
    }

    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::Capture(capture_event) => {
                    dispatch(terminal, &mut app, capture_event).await?;
                }
            }
        }
    }

    Ok(())
}

/// Feed one event into the machine and drain the resulting effect queue.
///
/// Effects can cascade: a suggestion fetch completes with new machine events,
/// which may emit further effects.
async fn dispatch(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    capture_event: CaptureEvent,
) -> Result<()> {
    let mut queue: VecDeque<Effect> = app.machine.handle(capture_event).into();

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::ClearSuggestions => {
                app.suggestion_index = 0;
            }
            Effect::FetchSuggestions { query } => {
                let follow = match app.service.suggest(&app.provider, &query, 10).await {
                    Ok(candidates) => app
                        .machine
                        .handle(CaptureEvent::SuggestionsLoaded(candidates)),
                    Err(error) => app
                        .machine
                        .handle(CaptureEvent::GeocodeFailed(error.hint().to_owned())),
                };
                queue.extend(follow);
            }
            Effect::ResolveCandidate { candidate } => {
                let follow = match app.service.resolve_candidate(&app.provider, &candidate).await
                {
                    Ok(located) => app.machine.handle(CaptureEvent::CandidateLocated(located)),
                    Err(error) => app
                        .machine
                        .handle(CaptureEvent::GeocodeFailed(error.hint().to_owned())),
                };
                queue.extend(follow);
            }
            Effect::Resolve(ticket) => {
                app.is_loading = true;
                terminal.draw(|frame| ui::draw(frame, app))?;

                let method = app.machine.method();
                let outcome = app.service.resolve(&ticket, app.basket_total).await;
                app.is_loading = false;

                let snapshot = outcome.as_ref().ok().cloned();
                let follow = app.machine.apply_resolution(ticket.token, outcome);
                // An empty follow-up means the response was stale; leave the
                // map and totals alone.
                if !follow.is_empty() {
                    match snapshot {
                        Some(result) => {
                            app.min_order_met = result.min_order_met;
                            app.map.apply_result(&result, method);
                            app.last_result = Some(result);
                        }
                        None => {
                            app.map.apply_result(
                                &ResolutionResult::rejected(HINT_RESOLVE_FAILED),
                                method,
                            );
                        }
                    }
                }
                queue.extend(follow);
            }
            Effect::ReverseGeocode { coordinates } => {
                match app.service.reverse_geocode(&app.provider, coordinates).await {
                    Ok(located) => {
                        queue.extend(app.machine.handle(CaptureEvent::ReverseGeocoded(located)));
                    }
                    // The pin and its resolution stand on their own; the
                    // display line stays empty until the server echoes one.
                    Err(error) => tracing::debug!(error = %error, "reverse geocoding failed"),
                }
            }
            Effect::PlacemarkLoading(coordinates) => {
                app.map.set_loading(coordinates);
            }
            Effect::RemovePlacemark => {
                let home = app.home_center;
                app.map.remove_placemark(home);
                app.last_result = None;
                app.min_order_met = true;
            }
            Effect::Revalidate => {
                app.revalidate();
            }
            Effect::ShippingCharge(zone) => {
                app.current_zone = zone;
            }
        }
    }

    // Keep the text buffer in step with the slot: captures rewrite it with the
    // normalized address and locked slots ignore keystrokes entirely.
    app.address_input.clone_from(&app.machine.slot().raw_text);

    Ok(())
}
