use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, Utc};
use thiserror::Error;

use crate::models::{Appointment, AppointmentStatus, Master, Service};
use crate::store::{self, ChangeBus, KvStore, StoreError, StoreKey};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub fields: BTreeMap<&'static str, &'static str>,
    pub summary: &'static str,
}

impl ValidationErrors {
    pub fn field(&self, name: &str) -> Option<&'static str> {
        self.fields.get(name).copied()
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{}", .0.summary)]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Clone)]
pub struct BookingRequest {
    pub master_id: String,
    pub service_id: String,
    pub slot: String,
    pub name: String,
    pub phone: String,
}

impl BookingRequest {
    pub fn master_id(&self) -> Option<i64> {
        self.master_id.trim().parse().ok()
    }

    pub fn service_id(&self) -> Option<i64> {
        self.service_id.trim().parse().ok()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut fields = BTreeMap::new();
        if self.master_id().is_none() {
            fields.insert("master", "Выберите мастера");
        }
        if self.service_id().is_none() {
            fields.insert("service", "Выберите услугу");
        }
        if self.slot.trim().is_empty() {
            fields.insert("slot", "Выберите время");
        }
        if self.name.trim().is_empty() {
            fields.insert("name", "Введите имя");
        }
        if self.phone.trim().is_empty() {
            fields.insert("phone", "Введите телефон");
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                fields,
                summary: "Заполните обязательные поля",
            })
        }
    }
}

pub fn matches_query(appointment: &Appointment, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    [
        &appointment.name,
        &appointment.barber_name,
        &appointment.service_name,
        &appointment.date_str,
        &appointment.time_str,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&q))
}

pub struct AppointmentBook {
    store: Arc<dyn KvStore>,
    bus: ChangeBus,
}

impl AppointmentBook {
    pub fn new(store: Arc<dyn KvStore>, bus: ChangeBus) -> Self {
        Self { store, bus }
    }

    pub async fn all(&self) -> Vec<Appointment> {
        store::read_list(self.store.as_ref(), StoreKey::Appointments).await
    }

    pub async fn search(&self, query: &str) -> Vec<Appointment> {
        self.all()
            .await
            .into_iter()
            .filter(|appointment| matches_query(appointment, query))
            .collect()
    }

    pub async fn inbox(&self) -> Vec<Appointment> {
        self.all()
            .await
            .into_iter()
            .filter(|appointment| appointment.status == AppointmentStatus::New)
            .collect()
    }

    // Display names and the price are copied out of the catalog here and
    // never updated afterwards.
    pub async fn create(
        &self,
        request: &BookingRequest,
        masters: &[Master],
        services: &[Service],
    ) -> Result<Appointment, BookingError> {
        request.validate().map_err(BookingError::Invalid)?;
        let master_id = request.master_id().unwrap_or_default();
        let service_id = request.service_id().unwrap_or_default();
        let master = masters.iter().find(|m| m.id == master_id);
        let service = services.iter().find(|s| s.id == service_id);

        let appointment = Appointment {
            id: Utc::now().timestamp_millis(),
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            barber_id: master_id,
            barber_name: master.map(|m| m.name.clone()).unwrap_or_default(),
            service_id,
            service_name: service.map(|s| s.name.clone()).unwrap_or_default(),
            date_str: Local::now().format("%d.%m.%Y").to_string(),
            time_str: request.slot.trim().to_string(),
            total_price: service.map(|s| s.price),
            status: AppointmentStatus::New,
            note: String::new(),
        };

        let mut items = self.all().await;
        items.push(appointment.clone());
        self.save(&items).await?;
        Ok(appointment)
    }

    pub async fn set_status(&self, id: i64, status: AppointmentStatus) -> Result<(), StoreError> {
        let mut items = self.all().await;
        for item in items.iter_mut().filter(|item| item.id == id) {
            item.status = status;
        }
        self.save(&items).await
    }

    pub async fn update_note(&self, id: i64, note: &str) -> Result<(), StoreError> {
        let mut items = self.all().await;
        for item in items.iter_mut().filter(|item| item.id == id) {
            item.note = note.to_string();
        }
        self.save(&items).await
    }

    pub async fn remove(&self, id: i64) -> Result<(), StoreError> {
        let mut items = self.all().await;
        items.retain(|item| item.id != id);
        self.save(&items).await
    }

    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.store.remove(StoreKey::Appointments).await?;
        self.bus.publish(StoreKey::Appointments);
        Ok(())
    }

    async fn save(&self, items: &[Appointment]) -> Result<(), StoreError> {
        store::write_list(self.store.as_ref(), &self.bus, StoreKey::Appointments, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    fn book() -> AppointmentBook {
        AppointmentBook::new(Arc::new(MemoryKvStore::new()), ChangeBus::new())
    }

    fn masters() -> Vec<Master> {
        vec![Master {
            id: 1,
            name: "Анна".to_string(),
            role: "мастер".to_string(),
            specialty: "Окрашивание и стрижка".to_string(),
            photo: "anna.jpg".to_string(),
        }]
    }

    fn services() -> Vec<Service> {
        vec![Service {
            id: 2,
            name: "Окрашивание".to_string(),
            price: 3000.0,
        }]
    }

    fn request() -> BookingRequest {
        BookingRequest {
            master_id: "1".to_string(),
            service_id: "2".to_string(),
            slot: "10:30".to_string(),
            name: "Ольга".to_string(),
            phone: "+7 900 000-00-00".to_string(),
        }
    }

    #[actix_web::test]
    async fn create_appends_one_new_record_with_denormalized_names() {
        let book = book();
        let created = book.create(&request(), &masters(), &services()).await.unwrap();

        assert_eq!(created.status, AppointmentStatus::New);
        assert_eq!(created.barber_name, "Анна");
        assert_eq!(created.service_name, "Окрашивание");
        assert_eq!(created.total_price, Some(3000.0));
        assert_eq!(created.time_str, "10:30");

        let all = book.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, created.id);
    }

    #[actix_web::test]
    async fn create_with_missing_fields_reports_each_and_persists_nothing() {
        let book = book();
        let request = BookingRequest {
            master_id: "1".to_string(),
            ..BookingRequest::default()
        };
        let err = book
            .create(&request, &masters(), &services())
            .await
            .unwrap_err();
        let BookingError::Invalid(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.field("master").is_none());
        assert!(errors.field("service").is_some());
        assert!(errors.field("slot").is_some());
        assert!(errors.field("name").is_some());
        assert!(errors.field("phone").is_some());
        assert_eq!(errors.summary, "Заполните обязательные поля");
        assert!(book.all().await.is_empty());
    }

    #[actix_web::test]
    async fn later_catalog_edits_do_not_rewrite_existing_records() {
        let book = book();
        book.create(&request(), &masters(), &services()).await.unwrap();

        let mut renamed = services();
        renamed[0].name = "Окрашивание люкс".to_string();
        renamed[0].price = 9000.0;
        // a second booking against the edited catalog
        book.create(&request(), &masters(), &renamed).await.unwrap();

        let all = book.all().await;
        assert_eq!(all[0].service_name, "Окрашивание");
        assert_eq!(all[0].total_price, Some(3000.0));
        assert_eq!(all[1].service_name, "Окрашивание люкс");
        assert_eq!(all[1].total_price, Some(9000.0));
    }

    #[actix_web::test]
    async fn unknown_ids_are_silent_noops() {
        let book = book();
        let created = book.create(&request(), &masters(), &services()).await.unwrap();

        book.remove(created.id + 1).await.unwrap();
        book.set_status(created.id + 1, AppointmentStatus::Confirmed).await.unwrap();
        book.update_note(created.id + 1, "потерянная заметка").await.unwrap();

        let all = book.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, AppointmentStatus::New);
        assert_eq!(all[0].note, "");
    }

    #[actix_web::test]
    async fn status_and_note_updates_hit_the_matching_record() {
        let book = book();
        let created = book.create(&request(), &masters(), &services()).await.unwrap();

        book.set_status(created.id, AppointmentStatus::Confirmed).await.unwrap();
        book.update_note(created.id, "постоянный клиент").await.unwrap();

        let all = book.all().await;
        assert_eq!(all[0].status, AppointmentStatus::Confirmed);
        assert_eq!(all[0].note, "постоянный клиент");

        book.remove(created.id).await.unwrap();
        assert!(book.all().await.is_empty());
    }

    #[actix_web::test]
    async fn clear_all_wipes_the_store() {
        let book = book();
        book.create(&request(), &masters(), &services()).await.unwrap();
        book.clear_all().await.unwrap();
        assert!(book.all().await.is_empty());
    }

    #[actix_web::test]
    async fn search_matches_master_name_case_insensitively() {
        let book = book();
        book.create(&request(), &masters(), &services()).await.unwrap();
        let mut other = request();
        other.master_id = "5".to_string();
        book.create(&other, &masters(), &services()).await.unwrap();

        let hits = book.search("анна").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].barber_name, "Анна");

        let all = book.search("").await;
        assert_eq!(all.len(), 2);
        assert!(all[0].id <= all[1].id);
    }
}
