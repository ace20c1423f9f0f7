use std::sync::Arc;

use chrono::Utc;

use crate::models::{format_price, Service};
use crate::store::{self, ChangeBus, KvStore, StoreError, StoreKey};

pub fn default_services() -> Vec<Service> {
    [
        (1, "Стрижка", 1500.0),
        (2, "Окрашивание", 3000.0),
        (3, "Укладка", 1200.0),
        (4, "Визаж", 2000.0),
    ]
    .into_iter()
    .map(|(id, name, price)| Service {
        id,
        name: name.to_string(),
        price,
    })
    .collect()
}

pub struct ShowcaseEntry {
    pub id: i64,
    pub name: &'static str,
    pub desc: &'static str,
    pub icon: &'static str,
}

pub const SHOWCASE: [ShowcaseEntry; 4] = [
    ShowcaseEntry {
        id: 1,
        name: "Стрижка",
        desc: "Классическая, мужская, женская, детская",
        icon: "✂️",
    },
    ShowcaseEntry {
        id: 2,
        name: "Окрашивание",
        desc: "Балаяж, мелирование, тонирование",
        icon: "🎨",
    },
    ShowcaseEntry {
        id: 3,
        name: "Укладка",
        desc: "Повседневная, вечерняя, свадебная",
        icon: "💇‍♀️",
    },
    ShowcaseEntry {
        id: 4,
        name: "Визаж",
        desc: "Дневной, вечерний, коррекция бровей",
        icon: "💄",
    },
];

const GENERIC_DESC: &str = "Индивидуальная услуга";
const GENERIC_ICON: &str = "✨";

#[derive(Debug, Clone)]
pub struct ServiceCard {
    pub id: i64,
    pub name: String,
    pub desc: String,
    pub icon: String,
    pub price_text: String,
}

// The public listing shows everything the admin created; known ids borrow
// the showcase description and icon, new ones get the generic placeholder.
// An empty catalog falls back to the showcase itself, without prices.
pub fn merge_showcase(services: &[Service]) -> Vec<ServiceCard> {
    if services.is_empty() {
        return SHOWCASE
            .iter()
            .map(|entry| ServiceCard {
                id: entry.id,
                name: entry.name.to_string(),
                desc: entry.desc.to_string(),
                icon: entry.icon.to_string(),
                price_text: "—".to_string(),
            })
            .collect();
    }
    services
        .iter()
        .map(|service| {
            let entry = SHOWCASE.iter().find(|entry| entry.id == service.id);
            ServiceCard {
                id: service.id,
                name: service.name.clone(),
                desc: entry.map(|e| e.desc).unwrap_or(GENERIC_DESC).to_string(),
                icon: entry.map(|e| e.icon).unwrap_or(GENERIC_ICON).to_string(),
                price_text: format_price(service.price)
                    .map(|text| format!("от {text}"))
                    .unwrap_or_else(|| "—".to_string()),
            }
        })
        .collect()
}

fn sort_by_name(services: &mut [Service]) {
    services.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

pub struct ServiceCatalog {
    store: Arc<dyn KvStore>,
    bus: ChangeBus,
}

impl ServiceCatalog {
    pub fn new(store: Arc<dyn KvStore>, bus: ChangeBus) -> Self {
        Self { store, bus }
    }

    pub async fn all(&self) -> Vec<Service> {
        store::read_list(self.store.as_ref(), StoreKey::Services).await
    }

    // First run writes the default catalog; any other run re-persists the
    // stored set with prices coerced to numbers.
    pub async fn seed_if_empty(&self) -> Result<Vec<Service>, StoreError> {
        let mut items = self.all().await;
        if items.is_empty() {
            items = default_services();
        }
        self.save(&items).await?;
        Ok(items)
    }

    pub async fn add(&self, name: &str, price: f64) -> Result<Service, StoreError> {
        let service = Service {
            id: Utc::now().timestamp_millis(),
            name: name.to_string(),
            price,
        };
        let mut items = self.all().await;
        items.push(service.clone());
        sort_by_name(&mut items);
        self.save(&items).await?;
        Ok(service)
    }

    pub async fn update(&self, id: i64, name: &str, price: f64) -> Result<(), StoreError> {
        let mut items = self.all().await;
        for item in items.iter_mut().filter(|item| item.id == id) {
            item.name = name.to_string();
            item.price = price;
        }
        sort_by_name(&mut items);
        self.save(&items).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut items = self.all().await;
        items.retain(|item| item.id != id);
        self.save(&items).await
    }

    async fn save(&self, items: &[Service]) -> Result<(), StoreError> {
        store::write_list(self.store.as_ref(), &self.bus, StoreKey::Services, items).await
    }
}
