use actix_web::{web, HttpResponse, Result};
use askama::Template;
use serde::Deserialize;

use crate::{
    booking::{BookingError, BookingRequest},
    catalog::{merge_showcase, ServiceCard},
    models::{format_price, Appointment, Master},
    schedule::{generate_slots, SLOT_STEP_MINUTES},
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct MasterOption {
    id: i64,
    name: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct ServiceOption {
    id: i64,
    name: String,
    price_text: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct SlotOption {
    value: String,
    selected: bool,
}

#[derive(Clone, Debug, Default)]
struct FieldErrors {
    master: String,
    service: String,
    slot: String,
    name: String,
    phone: String,
    summary: String,
}

#[derive(Clone, Debug, Default)]
struct BookingView {
    name: String,
    phone: String,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    cards: Vec<ServiceCard>,
    masters: Vec<Master>,
}

#[derive(Template)]
#[template(path = "book.html")]
struct BookTemplate {
    masters: Vec<MasterOption>,
    services: Vec<ServiceOption>,
    slots: Vec<SlotOption>,
    has_selection: bool,
    form: BookingView,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "book_success.html")]
struct BookSuccessTemplate {
    client_name: String,
    master_name: String,
    service_name: String,
    date_str: String,
    time_str: String,
    price_text: String,
}

#[derive(Deserialize)]
struct BookQuery {
    master: Option<String>,
    service: Option<String>,
}

#[derive(Deserialize)]
struct BookingForm {
    master_id: String,
    service_id: String,
    slot: Option<String>,
    name: Option<String>,
    phone: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(
            web::resource("/book")
                .route(web::get().to(show_booking))
                .route(web::post().to(create_booking)),
        )
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn home(state: web::Data<AppState>) -> Result<HttpResponse> {
    let services = state.services().all().await;
    Ok(render(HomeTemplate {
        cards: merge_showcase(&services),
        masters: state.masters(),
    }))
}

async fn show_booking(
    state: web::Data<AppState>,
    query: web::Query<BookQuery>,
) -> Result<HttpResponse> {
    let request = BookingRequest {
        master_id: query.master.clone().unwrap_or_default(),
        service_id: query.service.clone().unwrap_or_default(),
        ..BookingRequest::default()
    };
    let template =
        booking_form(&state, &request, BookingView::default(), FieldErrors::default()).await;
    Ok(render(template))
}

async fn create_booking(
    state: web::Data<AppState>,
    form: web::Form<BookingForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let request = BookingRequest {
        master_id: form.master_id,
        service_id: form.service_id,
        slot: form.slot.unwrap_or_default(),
        name: form.name.unwrap_or_default(),
        phone: form.phone.unwrap_or_default(),
    };
    let masters = state.masters();
    let services = state.services().all().await;

    match state.appointments().create(&request, &masters, &services).await {
        Ok(appointment) => Ok(render(success_view(appointment))),
        Err(BookingError::Invalid(errors)) => {
            let view = BookingView {
                name: request.name.clone(),
                phone: request.phone.clone(),
            };
            let errors = FieldErrors {
                master: errors.field("master").unwrap_or_default().to_string(),
                service: errors.field("service").unwrap_or_default().to_string(),
                slot: errors.field("slot").unwrap_or_default().to_string(),
                name: errors.field("name").unwrap_or_default().to_string(),
                phone: errors.field("phone").unwrap_or_default().to_string(),
                summary: errors.summary.to_string(),
            };
            let template = booking_form(&state, &request, view, errors).await;
            Ok(render(template))
        }
        Err(BookingError::Store(err)) => {
            log::error!("Saving booking failed: {err}");
            let view = BookingView {
                name: request.name.clone(),
                phone: request.phone.clone(),
            };
            let errors = FieldErrors {
                summary: "Ошибка сохранения".to_string(),
                ..FieldErrors::default()
            };
            let template = booking_form(&state, &request, view, errors).await;
            Ok(render(template))
        }
    }
}

async fn booking_form(
    state: &web::Data<AppState>,
    request: &BookingRequest,
    form: BookingView,
    errors: FieldErrors,
) -> BookTemplate {
    let selected_master = request.master_id();
    let selected_service = request.service_id();

    let masters = state
        .masters()
        .into_iter()
        .map(|master| MasterOption {
            selected: selected_master == Some(master.id),
            id: master.id,
            name: master.name,
        })
        .collect();

    let services = state
        .services()
        .all()
        .await
        .into_iter()
        .map(|service| ServiceOption {
            selected: selected_service == Some(service.id),
            id: service.id,
            price_text: service.price_text(),
            name: service.name,
        })
        .collect();

    let has_selection = selected_master.is_some() && selected_service.is_some();
    let slots = match selected_master {
        Some(master_id) if has_selection => {
            let schedule = state
                .schedules()
                .for_master(&state.master_ids(), master_id)
                .await;
            generate_slots(&schedule, SLOT_STEP_MINUTES)
                .into_iter()
                .map(|value| SlotOption {
                    selected: value == request.slot,
                    value,
                })
                .collect()
        }
        _ => Vec::new(),
    };

    BookTemplate {
        masters,
        services,
        slots,
        has_selection,
        form,
        errors,
    }
}

fn success_view(appointment: Appointment) -> BookSuccessTemplate {
    BookSuccessTemplate {
        price_text: appointment
            .total_price
            .and_then(format_price)
            .unwrap_or_else(|| "—".to_string()),
        client_name: appointment.name,
        master_name: appointment.barber_name,
        service_name: appointment.service_name,
        date_str: appointment.date_str,
        time_str: appointment.time_str,
    }
}
