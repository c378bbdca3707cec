//! rental-lifecycle walkthrough.
//!
//! Seeds a handful of mock jobs and drives one of them through the
//! pickup & return flow, logging every domain event.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use rental_lifecycle::app_state::AppState;
use rental_lifecycle::config::RentalConfig;
use rental_lifecycle::domain::{
    ActorId, CaptureKind, ConditionSnapshot, ExtensionOrigin, FuelLevel, JobId, PhotoCategory,
    RentalJob,
};
use rental_lifecycle::pricing::PricingStrategy;
use rental_lifecycle::service::{StaffRoleCheck, StaffRoster};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RentalConfig::from_env()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("loading configuration")?;
    tracing::info!(
        peak = %config.hourly_rates.peak(),
        low = %config.hourly_rates.low(),
        "starting rental-lifecycle walkthrough"
    );

    let staff = ActorId::from("staff-amir");
    let roles: Arc<dyn StaffRoleCheck> = Arc::new(StaffRoster::new([staff.clone()]));
    let state = AppState::new(&config, roles);

    let mut events = state.event_bus.subscribe();
    tracing::debug!(
        listeners = state.event_bus.receiver_count(),
        "event listener subscribed"
    );
    let listener = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(event = %json, "domain event"),
                Err(e) => tracing::warn!(error = %e, "unserializable event"),
            }
        }
    });

    for job in seed_jobs()? {
        state.lifecycle.register(job).await?;
    }

    let job_id = JobId::from("JOB-2025-001");
    let job = state.identity.verify(&job_id, "+60123456789").await?;
    tracing::info!(%job_id, customer = %job.customer_name, "holder verified");

    let picked = state
        .lifecycle
        .process_pickup(&job_id, capture(CaptureKind::Pickup, &staff, 42_100), staff.clone())
        .await?;
    if let Some(payload) = &picked.access_payload {
        tracing::info!(%job_id, payload = %payload, "access payload issued");
        state.identity.verify_payload(payload.as_str()).await?;
    }

    // A second pickup is refused; surface it the way a UI would.
    if let Err(err) = state
        .lifecycle
        .process_pickup(&job_id, capture(CaptureKind::Pickup, &staff, 42_100), staff.clone())
        .await
    {
        let body = serde_json::to_string(&err.to_body())?;
        tracing::info!(%job_id, error = %body, "duplicate pickup refused");
    }

    let request = state
        .extensions
        .submit(
            &job_id,
            picked.ordered_end + Duration::hours(16),
            ExtensionOrigin::Customer,
            ActorId::from("customer-aisyah"),
        )
        .await?;
    state.extensions.approve(request.id, staff.clone()).await?;
    state
        .extensions
        .record_payment(request.id, request.calculation.fee, staff.clone())
        .await?;

    let late = state
        .extensions
        .record_staff_extension(
            &job_id,
            request.requested_return_time + Duration::hours(3),
            staff.clone(),
            Decimal::new(15, 0),
            PricingStrategy::DayPlusHour,
        )
        .await?;
    tracing::info!(%job_id, fee = %late.calculation.fee, "counter extension charged");

    let returned = state
        .lifecycle
        .process_return(&job_id, capture(CaptureKind::Return, &staff, 42_480), staff.clone())
        .await?;
    tracing::info!(
        %job_id,
        extension_fees = %returned.approved_extension_fees(),
        effective_return = %returned.effective_return_time(),
        "walkthrough complete"
    );

    let confirmation = state
        .lifecycle
        .view_confirmation(&job_id, CaptureKind::Return)
        .await?;
    tracing::info!(%job_id, odometer = ?confirmation.odometer, "return confirmation");

    for summary in state.registry.search("JOB-2025").await {
        tracing::info!(job_id = %summary.id, state = %summary.state, "job summary");
    }

    drop(state);
    listener.await.context("event listener")?;
    Ok(())
}

fn at(month: u32, day: u32, hour: u32) -> anyhow::Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2025, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .context("invalid seed timestamp")
}

fn seed_jobs() -> anyhow::Result<Vec<RentalJob>> {
    Ok(vec![
        RentalJob::new(
            JobId::from("JOB-2025-001"),
            "Aisyah Rahman",
            "+60123456789",
            "WXY 1234",
            at(1, 12, 9)?,
            at(1, 15, 18)?,
            Decimal::new(200, 0),
        )?,
        RentalJob::new(
            JobId::from("JOB-2025-002"),
            "Brandon Lee",
            "+60198765432",
            "VBN 5678",
            at(1, 14, 10)?,
            at(1, 14, 20)?,
            Decimal::new(150, 0),
        )?,
        RentalJob::new(
            JobId::from("JOB-2025-003"),
            "Chandra Devi",
            "+60111222333",
            "JKL 9012",
            at(1, 20, 8)?,
            at(1, 27, 8)?,
            Decimal::new(500, 0),
        )?,
    ])
}

fn capture(kind: CaptureKind, staff: &ActorId, odometer: i64) -> ConditionSnapshot {
    ConditionSnapshot::new(kind, staff.clone())
        .with_odometer(odometer)
        .with_fuel_level(FuelLevel::Full)
        .with_photo(PhotoCategory::Agreement, format!("{kind}/agreement-1.jpg"))
        .with_photo(PhotoCategory::IdentityDocument, format!("{kind}/ic-front.jpg"))
        .with_photo(PhotoCategory::ExteriorPanels, format!("{kind}/front.jpg"))
        .with_photo(PhotoCategory::ExteriorPanels, format!("{kind}/rear.jpg"))
        .with_agreement_reference("AGR-7781")
}
