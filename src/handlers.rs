use crate::balance::bowler_balance;
use crate::errors::AppError;
use crate::models::{AttendanceRecord, CellKey, CellStatus, UpdateRequest, UpdateResponse};
use crate::state::AppState;
use crate::stats::{build_league_stats, LeagueStatsResponse};
use crate::storage::persist_book;
use crate::ui;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Json,
};
use chrono::Local;
use tracing::info;

pub async fn home(State(state): State<AppState>) -> Html<String> {
    let book = state.book.lock().await;
    Html(ui::render_home(&book))
}

pub async fn grid_page(
    State(state): State<AppState>,
    Path(league_id): Path<u64>,
) -> Result<Html<String>, AppError> {
    let book = state.book.lock().await;
    let league = book
        .leagues
        .get(&league_id)
        .ok_or_else(|| AppError::not_found("no such league"))?;
    Ok(Html(ui::render_grid(league_id, league, &book)))
}

/// The grid's update endpoint: find or create the record for the cell, apply
/// the new status, recompute the bowler's balance, and hand it back.
pub async fn update_attendance(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    let key = CellKey::new(payload.bowler_id, payload.league_id, payload.week_number);
    let mut book = state.book.lock().await;

    match book.record_mut(key) {
        Some(record) => {
            record.status = payload.status;
            // Click-path updates carry no amount; the stored figure stands.
            if let Some(amount) = payload.amount {
                record.amount_paid = amount;
            }
            match payload.status {
                CellStatus::Fixed => record.fine_paid = true,
                CellStatus::Missed => record.fine_paid = false,
                CellStatus::Paid | CellStatus::None => {}
            }
        }
        None => book.attendance.push(AttendanceRecord {
            bowler_id: payload.bowler_id,
            league_id: payload.league_id,
            week_number: payload.week_number,
            status: payload.status,
            amount_paid: payload.amount.unwrap_or(0.0),
            fine_paid: payload.status == CellStatus::Fixed,
        }),
    }

    persist_book(&state.data_path, &book).await?;

    let balance = bowler_balance(&book, payload.bowler_id, payload.league_id);
    info!(
        "attendance update: bowler {} league {} week {} -> {}",
        payload.bowler_id, payload.league_id, payload.week_number, payload.status
    );

    Ok(Json(UpdateResponse {
        success: true,
        balance: Some(balance),
    }))
}

/// Re-verify every bowler's TBA registration. Verification is currently a
/// stamp-as-valid pass; the page reloads after the redirect.
pub async fn verify_tba(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let mut book = state.book.lock().await;
    let checked_at = Local::now().to_rfc3339();
    let mut count = 0usize;
    for bowler in book.bowlers.values_mut() {
        bowler.tba_status = "valid".to_string();
        bowler.tba_last_checked = Some(checked_at.clone());
        count += 1;
    }

    persist_book(&state.data_path, &book).await?;
    info!("verified {count} TBA registrations");

    Ok(Redirect::to("/"))
}

pub async fn league_stats(
    State(state): State<AppState>,
    Path(league_id): Path<u64>,
) -> Result<Json<LeagueStatsResponse>, AppError> {
    let book = state.book.lock().await;
    let stats = build_league_stats(&book, league_id)
        .ok_or_else(|| AppError::not_found("no such league"))?;
    Ok(Json(stats))
}
