use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use shared::{
    ApiError, ApiSuccess, ClashCheckRequest, ClashCheckResponse, CreateShiftRequest,
    ShiftListQuery, ShiftResponse, UpdateShiftRequest,
};

use crate::models::AppState;
use crate::services::overlap;
use crate::services::shifts::{self as shifts_service, NewShift, ShiftChanges, ShiftError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shifts")
            .route("", web::get().to(list_shifts))
            .route("", web::post().to(create_shift))
            .route("/check-clash", web::post().to(check_clash))
            .route("/{shift_id}", web::get().to(get_shift))
            .route("/{shift_id}", web::put().to(update_shift))
            .route("/{shift_id}", web::delete().to(delete_shift)),
    );
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    input.parse::<NaiveDate>().ok()
}

fn invalid_input(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: "validation_error".to_string(),
        message: message.to_string(),
    })
}

fn shift_error_response(context: &str, err: ShiftError) -> HttpResponse {
    match err {
        ShiftError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Shift not found".to_string(),
        }),
        ShiftError::Clash(conflict) => HttpResponse::Conflict().json(ApiError {
            error: "shift_clash".to_string(),
            message: format!("Shift overlaps with existing shift \"{}\"", conflict.name),
        }),
        ShiftError::WeekPublished => HttpResponse::Conflict().json(ApiError {
            error: "week_published".to_string(),
            message: "The week containing this shift is published and cannot be edited".to_string(),
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

async fn list_shifts(
    state: web::Data<AppState>,
    query: web::Query<ShiftListQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();

    // Filter only applies when both bounds are present, like the admin UI sends
    let date_range = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (Some(start), Some(end)) => {
            let start = match parse_date(start) {
                Some(date) => date,
                None => return Ok(invalid_input("Invalid startDate, expected YYYY-MM-DD")),
            };
            let end = match parse_date(end) {
                Some(date) => date,
                None => return Ok(invalid_input("Invalid endDate, expected YYYY-MM-DD")),
            };
            Some((start, end))
        }
        _ => None,
    };

    match shifts_service::list_shifts(&state.db, date_range).await {
        Ok(shifts) => {
            let mapped: Vec<ShiftResponse> = shifts.iter().map(ShiftResponse::from).collect();
            Ok(HttpResponse::Ok().json(ApiSuccess::new(mapped)))
        }
        Err(err) => Ok(shift_error_response("list shifts", err)),
    }
}

async fn get_shift(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let shift_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_input("Invalid shift ID format")),
    };

    match shifts_service::get_shift(&state.db, &shift_id).await {
        Ok(Some(shift)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(ShiftResponse::from(&shift)))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Shift not found".to_string(),
        })),
        Err(err) => Ok(shift_error_response("fetch shift", err)),
    }
}

async fn create_shift(
    state: web::Data<AppState>,
    body: web::Json<CreateShiftRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    if request.name.trim().is_empty() {
        return Ok(invalid_input("Shift name is required"));
    }
    let date = match parse_date(&request.date) {
        Some(date) => date,
        None => return Ok(invalid_input("Invalid date, expected YYYY-MM-DD")),
    };
    let start_time = match overlap::parse_time_of_day(&request.start_time) {
        Some(time) => time,
        None => return Ok(invalid_input("Invalid startTime, expected HH:MM or HH:MM:SS")),
    };
    let end_time = match overlap::parse_time_of_day(&request.end_time) {
        Some(time) => time,
        None => return Ok(invalid_input("Invalid endTime, expected HH:MM or HH:MM:SS")),
    };

    let new = NewShift {
        name: request.name,
        date,
        start_time,
        end_time,
        ignore_clash: request.ignore_clash,
    };

    match shifts_service::create_shift(&state.db, &new).await {
        Ok(shift) => {
            Ok(HttpResponse::Created().json(ApiSuccess::new(ShiftResponse::from(&shift))))
        }
        Err(err) => Ok(shift_error_response("create shift", err)),
    }
}

async fn update_shift(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateShiftRequest>,
) -> Result<HttpResponse> {
    let shift_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_input("Invalid shift ID format")),
    };

    let request = body.into_inner();

    if let Some(ref name) = request.name {
        if name.trim().is_empty() {
            return Ok(invalid_input("Shift name cannot be empty"));
        }
    }

    let date = match request.date.as_deref() {
        Some(raw) => match parse_date(raw) {
            Some(date) => Some(date),
            None => return Ok(invalid_input("Invalid date, expected YYYY-MM-DD")),
        },
        None => None,
    };
    let start_time = match request.start_time.as_deref() {
        Some(raw) => match overlap::parse_time_of_day(raw) {
            Some(time) => Some(time),
            None => return Ok(invalid_input("Invalid startTime, expected HH:MM or HH:MM:SS")),
        },
        None => None,
    };
    let end_time = match request.end_time.as_deref() {
        Some(raw) => match overlap::parse_time_of_day(raw) {
            Some(time) => Some(time),
            None => return Ok(invalid_input("Invalid endTime, expected HH:MM or HH:MM:SS")),
        },
        None => None,
    };

    let changes = ShiftChanges {
        name: request.name,
        date,
        start_time,
        end_time,
        ignore_clash: request.ignore_clash,
    };

    match shifts_service::update_shift(&state.db, &shift_id, &changes).await {
        Ok(shift) => Ok(HttpResponse::Ok().json(ApiSuccess::new(ShiftResponse::from(&shift)))),
        Err(err) => Ok(shift_error_response("update shift", err)),
    }
}

async fn delete_shift(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let shift_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_input("Invalid shift ID format")),
    };

    match shifts_service::delete_shift(&state.db, &shift_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(err) => Ok(shift_error_response("delete shift", err)),
    }
}

async fn check_clash(
    state: web::Data<AppState>,
    body: web::Json<ClashCheckRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    let date = match parse_date(&request.date) {
        Some(date) => date,
        None => return Ok(invalid_input("Invalid date, expected YYYY-MM-DD")),
    };
    let start_time = match overlap::parse_time_of_day(&request.start_time) {
        Some(time) => time,
        None => return Ok(invalid_input("Invalid startTime, expected HH:MM or HH:MM:SS")),
    };
    let end_time = match overlap::parse_time_of_day(&request.end_time) {
        Some(time) => time,
        None => return Ok(invalid_input("Invalid endTime, expected HH:MM or HH:MM:SS")),
    };

    match shifts_service::check_clash(
        &state.db,
        date,
        start_time,
        end_time,
        request.exclude_shift_id,
    )
    .await
    {
        Ok(clashes) => {
            let response = ClashCheckResponse {
                has_clash: !clashes.is_empty(),
                conflicting_shift: clashes.first().map(ShiftResponse::from),
            };
            Ok(HttpResponse::Ok().json(response))
        }
        Err(err) => Ok(shift_error_response("check shift clash", err)),
    }
}
