use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use askama::Template;
use serde::Deserialize;

use crate::{
    auth::{grant_cookie, is_authorized, revoke_cookie, verify_password},
    models::{format_price, Appointment, AppointmentStatus, Master},
    schedule::{Schedule, TimeField, ALL_DAYS},
    state::AppState,
    store::StoreError,
    templates::{render, see_other},
    timeutil::{StepDirection, StepMode},
};

#[derive(Clone, Debug)]
struct AppointmentView {
    id: i64,
    name: String,
    phone: String,
    barber_name: String,
    service_name: String,
    date_str: String,
    time_str: String,
    price_text: String,
    status_label: String,
    note: String,
}

#[derive(Clone, Debug)]
struct ServiceView {
    id: i64,
    name: String,
    price_text: String,
}

#[derive(Clone, Debug, Default)]
struct ServiceFormView {
    id: String,
    name: String,
    price: String,
}

#[derive(Clone, Debug)]
struct DayOption {
    token: &'static str,
    label: &'static str,
    active: bool,
}

#[derive(Clone, Debug)]
struct ScheduleRow {
    master: Master,
    days: Vec<DayOption>,
    start_time: String,
    end_time: String,
    hours_text: String,
}

#[derive(Template)]
#[template(path = "admin_login.html")]
struct AdminLoginTemplate {
    error: String,
}

#[derive(Template)]
#[template(path = "admin_records.html")]
struct AdminRecordsTemplate {
    items: Vec<AppointmentView>,
    query: String,
    flash: String,
}

#[derive(Template)]
#[template(path = "admin_inbox.html")]
struct AdminInboxTemplate {
    items: Vec<AppointmentView>,
    flash: String,
}

#[derive(Template)]
#[template(path = "admin_services.html")]
struct AdminServicesTemplate {
    services: Vec<ServiceView>,
    form: ServiceFormView,
    flash: String,
}

#[derive(Template)]
#[template(path = "admin_schedules.html")]
struct AdminSchedulesTemplate {
    rows: Vec<ScheduleRow>,
    flash: String,
}

#[derive(Deserialize)]
struct LoginForm {
    password: String,
}

#[derive(Deserialize)]
struct RecordsQuery {
    q: Option<String>,
    flash: Option<String>,
}

#[derive(Deserialize)]
struct FlashQuery {
    flash: Option<String>,
}

#[derive(Deserialize)]
struct ServicesQuery {
    edit: Option<i64>,
    flash: Option<String>,
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

#[derive(Deserialize)]
struct NoteForm {
    note: String,
}

#[derive(Deserialize)]
struct ClearForm {
    confirm: Option<String>,
}

#[derive(Deserialize)]
struct ServiceSaveForm {
    id: Option<String>,
    name: String,
    price: String,
}

#[derive(Deserialize)]
struct ToggleDayForm {
    day: String,
}

#[derive(Deserialize)]
struct HoursForm {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct StepForm {
    field: String,
    dir: String,
    mode: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(web::resource("").route(web::get().to(index)))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/logout").route(web::get().to(logout)))
            .service(web::resource("/records").route(web::get().to(records)))
            .service(web::resource("/records/clear").route(web::post().to(clear_records)))
            .service(web::resource("/records/{id}/status").route(web::post().to(set_record_status)))
            .service(web::resource("/records/{id}/note").route(web::post().to(save_note)))
            .service(web::resource("/records/{id}/remove").route(web::post().to(remove_record)))
            .service(web::resource("/inbox").route(web::get().to(inbox)))
            .service(web::resource("/inbox/{id}/status").route(web::post().to(set_inbox_status)))
            .service(web::resource("/services").route(web::get().to(services_tab)))
            .service(web::resource("/services/save").route(web::post().to(save_service)))
            .service(web::resource("/services/{id}/delete").route(web::post().to(delete_service)))
            .service(web::resource("/schedules").route(web::get().to(schedules_tab)))
            .service(web::resource("/schedules/{id}/toggle").route(web::post().to(toggle_day)))
            .service(web::resource("/schedules/{id}/hours").route(web::post().to(set_hours)))
            .service(web::resource("/schedules/{id}/step").route(web::post().to(step_hours))),
    );
}

fn deny(req: &HttpRequest) -> Option<HttpResponse> {
    if is_authorized(req) {
        None
    } else {
        Some(render(AdminLoginTemplate {
            error: String::new(),
        }))
    }
}

fn flash_text(code: &str) -> String {
    match code {
        "saved" => "Сохранено".to_string(),
        "save_failed" => "Ошибка сохранения".to_string(),
        "cleared" => "Все записи удалены".to_string(),
        "confirm_required" => "Подтвердите удаление всех записей".to_string(),
        "invalid_service" => "Укажите название и неотрицательную цену".to_string(),
        _ => String::new(),
    }
}

fn flash_from(code: &Option<String>) -> String {
    code.as_deref().map(flash_text).unwrap_or_default()
}

// Mutations redirect back with a flash code; a failed save surfaces as the
// generic message without rolling anything back.
fn after_save(result: Result<(), StoreError>, target: &str) -> HttpResponse {
    match result {
        Ok(()) => see_other(format!("{target}?flash=saved")),
        Err(err) => {
            log::error!("Save failed: {err}");
            see_other(format!("{target}?flash=save_failed"))
        }
    }
}

async fn index(req: HttpRequest) -> Result<HttpResponse> {
    if is_authorized(&req) {
        return Ok(see_other("/admin/records"));
    }
    Ok(render(AdminLoginTemplate {
        error: String::new(),
    }))
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    if verify_password(&state.admin_pass, &form.password) {
        return Ok(HttpResponse::SeeOther()
            .append_header((header::LOCATION, "/admin/records"))
            .cookie(grant_cookie(&req))
            .finish());
    }
    Ok(render(AdminLoginTemplate {
        error: "Неверный пароль".to_string(),
    }))
}

async fn logout(req: HttpRequest) -> Result<HttpResponse> {
    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(revoke_cookie(&req))
        .finish())
}

async fn records(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<RecordsQuery>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let q = query.q.clone().unwrap_or_default();
    let items = state.appointments().search(&q).await;
    Ok(render(AdminRecordsTemplate {
        items: items.into_iter().map(to_view).collect(),
        query: q,
        flash: flash_from(&query.flash),
    }))
}

async fn set_record_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<StatusForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let status = AppointmentStatus::parse(&form.status);
    let result = state.appointments().set_status(path.into_inner(), status).await;
    Ok(after_save(result, "/admin/records"))
}

async fn save_note(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<NoteForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let result = state.appointments().update_note(path.into_inner(), &form.note).await;
    Ok(after_save(result, "/admin/records"))
}

// "Mark done" and "cancel" both land here; neither keeps a terminal record.
async fn remove_record(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let result = state.appointments().remove(path.into_inner()).await;
    Ok(after_save(result, "/admin/records"))
}

async fn clear_records(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ClearForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    if form.confirm.as_deref() != Some("yes") {
        return Ok(see_other("/admin/records?flash=confirm_required"));
    }
    match state.appointments().clear_all().await {
        Ok(()) => Ok(see_other("/admin/records?flash=cleared")),
        Err(err) => {
            log::error!("Clearing appointments failed: {err}");
            Ok(see_other("/admin/records?flash=save_failed"))
        }
    }
}

async fn inbox(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlashQuery>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let items = state.appointments().inbox().await;
    Ok(render(AdminInboxTemplate {
        items: items.into_iter().map(to_view).collect(),
        flash: flash_from(&query.flash),
    }))
}

async fn set_inbox_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<StatusForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let status = AppointmentStatus::parse(&form.status);
    let result = state.appointments().set_status(path.into_inner(), status).await;
    Ok(after_save(result, "/admin/inbox"))
}

async fn services_tab(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ServicesQuery>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let services = match state.services().seed_if_empty().await {
        Ok(services) => services,
        Err(err) => {
            log::error!("Seeding services failed: {err}");
            state.services().all().await
        }
    };
    let form = query
        .edit
        .and_then(|id| services.iter().find(|s| s.id == id))
        .map(|service| ServiceFormView {
            id: service.id.to_string(),
            name: service.name.clone(),
            price: if service.price.is_finite() {
                format!("{}", service.price)
            } else {
                String::new()
            },
        })
        .unwrap_or_default();
    Ok(render(AdminServicesTemplate {
        services: services
            .into_iter()
            .map(|service| ServiceView {
                id: service.id,
                price_text: service.price_text(),
                name: service.name,
            })
            .collect(),
        form,
        flash: flash_from(&query.flash),
    }))
}

async fn save_service(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ServiceSaveForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let name = form.name.trim();
    let price = form
        .price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0);
    let Some(price) = price else {
        return Ok(see_other("/admin/services?flash=invalid_service"));
    };
    if name.is_empty() {
        return Ok(see_other("/admin/services?flash=invalid_service"));
    }

    let id = form.id.as_deref().unwrap_or("").trim().parse::<i64>().ok();
    let result = match id {
        Some(id) => state.services().update(id, name, price).await,
        None => state.services().add(name, price).await.map(|_| ()),
    };
    Ok(after_save(result, "/admin/services"))
}

async fn delete_service(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let result = state.services().delete(path.into_inner()).await;
    Ok(after_save(result, "/admin/services"))
}

async fn schedules_tab(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlashQuery>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let mut schedules = state.schedules().reconciled(&state.master_ids()).await;
    let rows = state
        .masters()
        .into_iter()
        .map(|master| {
            let schedule = schedules
                .remove(&master.id)
                .unwrap_or_else(|| Schedule::default_for(master.id));
            to_schedule_row(master, schedule)
        })
        .collect();
    Ok(render(AdminSchedulesTemplate {
        rows,
        flash: flash_from(&query.flash),
    }))
}

async fn toggle_day(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<ToggleDayForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let result = state
        .schedules()
        .toggle_work_day(&state.master_ids(), path.into_inner(), &form.day)
        .await;
    Ok(after_save(result, "/admin/schedules"))
}

async fn set_hours(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<HoursForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let result = state
        .schedules()
        .set_hours(&state.master_ids(), path.into_inner(), &form.start, &form.end)
        .await;
    Ok(after_save(result, "/admin/schedules"))
}

async fn step_hours(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<StepForm>,
) -> Result<HttpResponse> {
    if let Some(resp) = deny(&req) {
        return Ok(resp);
    }
    let field = match form.field.as_str() {
        "end" => TimeField::End,
        _ => TimeField::Start,
    };
    let direction = match form.dir.as_str() {
        "down" => StepDirection::Down,
        _ => StepDirection::Up,
    };
    let mode = match form.mode.as_str() {
        "hour" => StepMode::Hour,
        "minute-big" => StepMode::Minute { big: true },
        _ => StepMode::Minute { big: false },
    };
    let result = state
        .schedules()
        .step_time(&state.master_ids(), path.into_inner(), field, direction, mode)
        .await;
    Ok(after_save(result, "/admin/schedules"))
}

fn to_view(appointment: Appointment) -> AppointmentView {
    AppointmentView {
        id: appointment.id,
        price_text: appointment
            .total_price
            .and_then(format_price)
            .unwrap_or_else(|| "—".to_string()),
        status_label: appointment.status.label().to_string(),
        name: appointment.name,
        phone: appointment.phone,
        barber_name: appointment.barber_name,
        service_name: appointment.service_name,
        date_str: appointment.date_str,
        time_str: appointment.time_str,
        note: appointment.note,
    }
}

fn to_schedule_row(master: Master, schedule: Schedule) -> ScheduleRow {
    let days = ALL_DAYS
        .iter()
        .map(|day| DayOption {
            token: day.as_str(),
            label: day.label(),
            active: schedule.works_on(*day),
        })
        .collect();
    ScheduleRow {
        master,
        days,
        hours_text: schedule.hours_text(),
        start_time: schedule.start_time,
        end_time: schedule.end_time,
    }
}
