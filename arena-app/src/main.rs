use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_checkout::{BookingFlow, CheckoutOutcome, FlowStep};
use arena_client::app_config::Config;
use arena_core::{CancelSignal, SystemClock};
use arena_shared::{ClubId, PaymentMode};

const USAGE: &str = "usage:
  arena-app active [club_id]
  arena-app resume <intent_id> [ONLINE|CASH] [club_id]
  arena-app cancel <club_id> <intent_id>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "arena_app=debug,arena_checkout=debug,arena_booking=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    let identity = config.identity.identity();
    tracing::info!("Acting as {} ({:?})", identity.user_id, identity.role);

    let services = arena_client::connect(&config.services, &identity)?;
    let mut flow = BookingFlow::new(
        identity,
        services,
        Arc::new(SystemClock),
        config.checkout.settings(),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("active") => list_active(&mut flow, parse_club(args.get(1))?).await,
        Some("resume") => {
            let intent_id = args.get(1).context(USAGE)?;
            let mode = match args.get(2) {
                Some(mode) => mode.parse::<PaymentMode>().map_err(anyhow::Error::msg)?,
                None => PaymentMode::Online,
            };
            resume(&mut flow, intent_id, mode, parse_club(args.get(3))?).await
        }
        Some("cancel") => {
            let club_id = parse_club(args.get(1))?.context(USAGE)?;
            let intent_id = args.get(2).context(USAGE)?;
            flow.cancel_intent(club_id, intent_id).await?;
            println!("Cancelled intent {}", intent_id);
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

fn parse_club(arg: Option<&String>) -> anyhow::Result<Option<ClubId>> {
    arg.map(|raw| raw.parse::<ClubId>().with_context(|| format!("invalid club id: {}", raw)))
        .transpose()
}

async fn list_active(flow: &mut BookingFlow, club_id: Option<ClubId>) -> anyhow::Result<()> {
    let count = flow.refresh_active(club_id).await?;
    if count == 0 {
        println!("No active intents");
        return Ok(());
    }

    for intent in flow.registry().by_expiry() {
        let left = flow
            .countdown(&intent.intent_id)
            .map(|view| view.label())
            .unwrap_or_default();
        let amount = intent
            .amount()
            .map(|amount| amount.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  club {}  {} x{} ({} players)  {} -> {}  amount {}  expires in {}",
            intent.intent_id,
            intent.club_id,
            intent.station_type,
            intent.stations.len(),
            intent.player_total(),
            intent.start_time,
            intent.end_time,
            amount,
            left
        );
    }
    Ok(())
}

async fn resume(
    flow: &mut BookingFlow,
    intent_id: &str,
    mode: PaymentMode,
    club_id: Option<ClubId>,
) -> anyhow::Result<()> {
    flow.refresh_active(club_id).await?;
    flow.resume(intent_id)?;

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, leaving payment pending");
            on_interrupt.cancel();
        }
    });

    // Expiry is advisory; an in-flight poll keeps going until the provider settles.
    let countdown = flow.watch_expiry(
        intent_id,
        |view| tracing::debug!("Hold expires in {}", view.label()),
        |id| tracing::warn!("Hold on intent {} has lapsed", id),
        cancel.clone(),
    )?;

    let result = flow.checkout(mode, &cancel).await;
    countdown.stop();

    match result {
        Ok(CheckoutOutcome::Confirmed(booking)) => {
            println!("Booking {} confirmed ({})", booking.booking_id, booking.status);
        }
        Ok(CheckoutOutcome::Abandoned { payment_id }) => {
            println!(
                "Payment {} left pending; run `arena-app resume {}` to continue",
                payment_id.unwrap_or_default(),
                intent_id
            );
        }
        Err(e) => match flow.step() {
            FlowStep::AwaitingConfirmation { .. } => {
                println!("Paid, but the booking could not be fetched yet: {}", e);
            }
            _ => return Err(e.into()),
        },
    }
    Ok(())
}
