use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    New,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::New => "new",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(text: &str) -> Self {
        match text {
            "confirmed" => AppointmentStatus::Confirmed,
            "cancelled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::New,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AppointmentStatus::New => "новая",
            AppointmentStatus::Confirmed => "подтверждена",
            AppointmentStatus::Cancelled => "отменена",
        }
    }
}

// Stylist and service names are denormalized copies frozen at booking time;
// later catalog edits must not rewrite existing records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub barber_id: i64,
    pub barber_name: String,
    pub service_id: i64,
    pub service_name: String,
    pub date_str: String,
    pub time_str: String,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    #[serde(default = "price_nan", deserialize_with = "coerce_price")]
    pub price: f64,
}

fn price_nan() -> f64 {
    f64::NAN
}

impl Service {
    pub fn price_text(&self) -> String {
        format_price(self.price).unwrap_or_else(|| "—".to_string())
    }
}

pub fn format_price(price: f64) -> Option<String> {
    if !price.is_finite() {
        return None;
    }
    if price.fract() == 0.0 {
        Some(format!("{price:.0} ₽"))
    } else {
        Some(format!("{price} ₽"))
    }
}

// Stored prices may be numbers, numeric strings, or junk; junk becomes NaN
// and renders as a placeholder. serde_json writes NaN back out as null.
fn coerce_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Master {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub specialty: String,
    pub photo: String,
}
