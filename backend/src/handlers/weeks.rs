use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use shared::{ApiError, ApiSuccess, PublishedCheckResponse, ShiftResponse, WeekWithShifts};

use crate::models::AppState;
use crate::services::weeks::{self as weeks_service, WeekError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/weeks")
            .route("/by-date/{date}", web::get().to(get_week_by_date))
            .route("/check-published/{date}", web::get().to(check_date_published))
            .route("/{week_id}/publish", web::post().to(publish_week))
            .route("/{week_id}/unpublish", web::post().to(unpublish_week)),
    );
}

fn invalid_input(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: "validation_error".to_string(),
        message: message.to_string(),
    })
}

fn week_error_response(context: &str, err: WeekError) -> HttpResponse {
    match err {
        WeekError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Week not found".to_string(),
        }),
        WeekError::AlreadyPublished => HttpResponse::Conflict().json(ApiError {
            error: "invalid_state".to_string(),
            message: "Week is already published".to_string(),
        }),
        WeekError::NotPublished => HttpResponse::Conflict().json(ApiError {
            error: "invalid_state".to_string(),
            message: "Week is not published".to_string(),
        }),
        err => {
            log::error!("Error {}: {:?}", context, err);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {}", context),
            })
        }
    }
}

async fn get_week_by_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let date = match path.into_inner().parse::<NaiveDate>() {
        Ok(date) => date,
        Err(_) => return Ok(invalid_input("Invalid date, expected YYYY-MM-DD")),
    };

    match weeks_service::resolve_week_for_date(&state.db, date).await {
        Ok(week) => Ok(HttpResponse::Ok().json(ApiSuccess::new(week))),
        Err(err) => Ok(week_error_response("resolve week", err)),
    }
}

async fn publish_week(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let week_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_input("Invalid week ID format")),
    };

    match weeks_service::publish_week(&state.db, &week_id).await {
        Ok(_) => week_with_shifts_response(&state, &week_id, "publish week").await,
        Err(err) => Ok(week_error_response("publish week", err)),
    }
}

async fn unpublish_week(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let week_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_input("Invalid week ID format")),
    };

    match weeks_service::unpublish_week(&state.db, &week_id).await {
        Ok(_) => week_with_shifts_response(&state, &week_id, "unpublish week").await,
        Err(err) => Ok(week_error_response("unpublish week", err)),
    }
}

/// The updated week plus its shifts, so the UI sees the cascaded flags.
async fn week_with_shifts_response(
    state: &web::Data<AppState>,
    week_id: &Uuid,
    context: &str,
) -> Result<HttpResponse> {
    match weeks_service::find_week_with_shifts(&state.db, week_id).await {
        Ok((week, shifts)) => {
            let response = WeekWithShifts {
                week,
                shifts: shifts.iter().map(ShiftResponse::from).collect(),
            };
            Ok(HttpResponse::Ok().json(ApiSuccess::new(response)))
        }
        Err(err) => Ok(week_error_response(context, err)),
    }
}

async fn check_date_published(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let date = match path.into_inner().parse::<NaiveDate>() {
        Ok(date) => date,
        Err(_) => return Ok(invalid_input("Invalid date, expected YYYY-MM-DD")),
    };

    match weeks_service::is_date_published(&state.db, date).await {
        Ok(is_published) => {
            Ok(HttpResponse::Ok().json(PublishedCheckResponse { is_published }))
        }
        Err(err) => Ok(week_error_response("check published week", err)),
    }
}
