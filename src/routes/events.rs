use actix_web::{http::header, web, HttpResponse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;
use crate::store::StoreKey;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/events").route(web::get().to(stream_changes)));
}

// Republishes store-change keys so other open views can re-read the store
// that changed. Receivers get the key and nothing else.
async fn stream_changes(state: web::Data<AppState>) -> HttpResponse {
    let rx = state.bus.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(key) => Some(Ok::<web::Bytes, actix_web::Error>(change_to_bytes(key))),
        Err(_) => None,
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

fn change_to_bytes(key: StoreKey) -> web::Bytes {
    let payload = serde_json::json!({ "key": key }).to_string();
    web::Bytes::from(format!("event: change\ndata: {payload}\n\n"))
}
