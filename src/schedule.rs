use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{self, ChangeBus, KvStore, StoreError, StoreKey};
use crate::timeutil::{self, StepDirection, StepMode};

pub const DEFAULT_START_TIME: &str = "09:00";
pub const DEFAULT_END_TIME: &str = "18:00";
pub const SLOT_STEP_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayKey {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

pub const ALL_DAYS: [DayKey; 7] = [
    DayKey::Mon,
    DayKey::Tue,
    DayKey::Wed,
    DayKey::Thu,
    DayKey::Fri,
    DayKey::Sat,
    DayKey::Sun,
];

impl DayKey {
    // Accepts the canonical token or the legacy Russian label.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Mon" | "Пн" => Some(DayKey::Mon),
            "Tue" | "Вт" => Some(DayKey::Tue),
            "Wed" | "Ср" => Some(DayKey::Wed),
            "Thu" | "Чт" => Some(DayKey::Thu),
            "Fri" | "Пт" => Some(DayKey::Fri),
            "Sat" | "Сб" => Some(DayKey::Sat),
            "Sun" | "Вс" => Some(DayKey::Sun),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayKey::Mon => "Mon",
            DayKey::Tue => "Tue",
            DayKey::Wed => "Wed",
            DayKey::Thu => "Thu",
            DayKey::Fri => "Fri",
            DayKey::Sat => "Sat",
            DayKey::Sun => "Sun",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayKey::Mon => "Пн",
            DayKey::Tue => "Вт",
            DayKey::Wed => "Ср",
            DayKey::Thu => "Чт",
            DayKey::Fri => "Пт",
            DayKey::Sat => "Сб",
            DayKey::Sun => "Вс",
        }
    }
}

// Tolerant shape for whatever is in the schedules store; entries without a
// stylist id are dropped during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSchedule {
    pub barber_id: Option<i64>,
    pub work_days: Vec<serde_json::Value>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub barber_id: i64,
    pub work_days: Vec<DayKey>,
    pub start_time: String,
    pub end_time: String,
}

impl Schedule {
    pub fn default_for(barber_id: i64) -> Self {
        Self {
            barber_id,
            work_days: Vec::new(),
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: DEFAULT_END_TIME.to_string(),
        }
    }

    pub fn normalize(raw: &RawSchedule) -> Option<Self> {
        let barber_id = raw.barber_id?;
        let mut work_days: Vec<DayKey> = raw
            .work_days
            .iter()
            .filter_map(|value| value.as_str())
            .filter_map(DayKey::from_token)
            .collect();
        work_days.sort();
        work_days.dedup();
        Some(Self {
            barber_id,
            work_days,
            start_time: timeutil::normalize_time(&raw.start_time)
                .unwrap_or_else(|| DEFAULT_START_TIME.to_string()),
            end_time: timeutil::normalize_time(&raw.end_time)
                .unwrap_or_else(|| DEFAULT_END_TIME.to_string()),
        })
    }

    pub fn toggle_work_day(&mut self, token: &str) {
        let Some(day) = DayKey::from_token(token) else {
            return;
        };
        match self.work_days.iter().position(|d| *d == day) {
            Some(idx) => {
                self.work_days.remove(idx);
            }
            None => {
                self.work_days.push(day);
                self.work_days.sort();
            }
        }
    }

    pub fn works_on(&self, day: DayKey) -> bool {
        self.work_days.contains(&day)
    }

    pub fn hours_text(&self) -> String {
        format!("{}–{}", self.start_time, self.end_time)
    }
}

// Every known stylist ends up with exactly one entry; stored entries for
// unknown ids are kept and written back untouched.
pub fn reconcile(stored: &[RawSchedule], master_ids: &[i64]) -> BTreeMap<i64, Schedule> {
    let mut map = BTreeMap::new();
    for schedule in stored.iter().filter_map(Schedule::normalize) {
        map.insert(schedule.barber_id, schedule);
    }
    for id in master_ids {
        map.entry(*id).or_insert_with(|| Schedule::default_for(*id));
    }
    map
}

pub fn generate_slots(schedule: &Schedule, step_minutes: u32) -> Vec<String> {
    let to_minutes = |text: &str| {
        timeutil::parse_hhmm(text).map(|t| t.hour * 60 + t.minute)
    };
    let (Some(start), Some(end)) = (to_minutes(&schedule.start_time), to_minutes(&schedule.end_time))
    else {
        return Vec::new();
    };
    if start >= end || step_minutes == 0 {
        return Vec::new();
    }
    (start..=end)
        .step_by(step_minutes as usize)
        .map(|m| format!("{:02}:{:02}", m / 60, m % 60))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
}

pub struct ScheduleBook {
    store: Arc<dyn KvStore>,
    bus: ChangeBus,
}

impl ScheduleBook {
    pub fn new(store: Arc<dyn KvStore>, bus: ChangeBus) -> Self {
        Self { store, bus }
    }

    pub async fn reconciled(&self, master_ids: &[i64]) -> BTreeMap<i64, Schedule> {
        let stored: Vec<RawSchedule> = store::read_list(self.store.as_ref(), StoreKey::Schedules).await;
        reconcile(&stored, master_ids)
    }

    pub async fn for_master(&self, master_ids: &[i64], barber_id: i64) -> Schedule {
        self.reconciled(master_ids)
            .await
            .remove(&barber_id)
            .unwrap_or_else(|| Schedule::default_for(barber_id))
    }

    pub async fn save_all(&self, schedules: &BTreeMap<i64, Schedule>) -> Result<(), StoreError> {
        let list: Vec<&Schedule> = schedules.values().collect();
        store::write_list(self.store.as_ref(), &self.bus, StoreKey::Schedules, &list).await
    }

    pub async fn toggle_work_day(
        &self,
        master_ids: &[i64],
        barber_id: i64,
        token: &str,
    ) -> Result<(), StoreError> {
        let mut schedules = self.reconciled(master_ids).await;
        schedules
            .entry(barber_id)
            .or_insert_with(|| Schedule::default_for(barber_id))
            .toggle_work_day(token);
        self.save_all(&schedules).await
    }

    pub async fn set_hours(
        &self,
        master_ids: &[i64],
        barber_id: i64,
        start: &str,
        end: &str,
    ) -> Result<(), StoreError> {
        let mut schedules = self.reconciled(master_ids).await;
        let entry = schedules
            .entry(barber_id)
            .or_insert_with(|| Schedule::default_for(barber_id));
        entry.start_time =
            timeutil::normalize_time(start).unwrap_or_else(|| DEFAULT_START_TIME.to_string());
        entry.end_time =
            timeutil::normalize_time(end).unwrap_or_else(|| DEFAULT_END_TIME.to_string());
        self.save_all(&schedules).await
    }

    pub async fn step_time(
        &self,
        master_ids: &[i64],
        barber_id: i64,
        field: TimeField,
        direction: StepDirection,
        mode: StepMode,
    ) -> Result<(), StoreError> {
        let mut schedules = self.reconciled(master_ids).await;
        let entry = schedules
            .entry(barber_id)
            .or_insert_with(|| Schedule::default_for(barber_id));
        let target = match field {
            TimeField::Start => &mut entry.start_time,
            TimeField::End => &mut entry.end_time,
        };
        *target = timeutil::step(target, direction, mode);
        self.save_all(&schedules).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    fn raw(barber_id: i64, days: &[&str], start: &str, end: &str) -> RawSchedule {
        RawSchedule {
            barber_id: Some(barber_id),
            work_days: days.iter().map(|d| serde_json::json!(d)).collect(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn normalize_translates_legacy_labels_and_drops_junk() {
        let schedule = Schedule::normalize(&raw(1, &["Пн", "Mon", "Funday", "Вт", "Sat"], "9:00", "18:30"))
            .unwrap();
        assert_eq!(schedule.work_days, vec![DayKey::Mon, DayKey::Tue, DayKey::Sat]);
        assert_eq!(schedule.start_time, "09:00");
        assert_eq!(schedule.end_time, "18:30");
    }

    #[test]
    fn normalize_falls_back_to_default_hours() {
        let schedule = Schedule::normalize(&raw(2, &[], "", "25:70")).unwrap();
        assert_eq!(schedule.start_time, DEFAULT_START_TIME);
        // components are clamped, not rejected
        assert_eq!(schedule.end_time, "23:59");

        let schedule = Schedule::normalize(&raw(2, &[], "later", "sometime")).unwrap();
        assert_eq!(schedule.start_time, DEFAULT_START_TIME);
        assert_eq!(schedule.end_time, DEFAULT_END_TIME);
    }

    #[test]
    fn normalize_drops_entries_without_id() {
        assert!(Schedule::normalize(&RawSchedule::default()).is_none());
    }

    #[test]
    fn reconcile_yields_one_entry_per_known_master() {
        let stored = vec![
            raw(1, &["Mon"], "10:00", "19:00"),
            raw(1, &["Tue"], "11:00", "20:00"),
            raw(99, &["Sun"], "12:00", "13:00"),
        ];
        let map = reconcile(&stored, &[1, 2, 3]);
        assert_eq!(map.len(), 4);
        // last duplicate wins
        assert_eq!(map[&1].work_days, vec![DayKey::Tue]);
        assert_eq!(map[&2], Schedule::default_for(2));
        assert_eq!(map[&3], Schedule::default_for(3));
        // unknown stored ids survive
        assert_eq!(map[&99].work_days, vec![DayKey::Sun]);
    }

    #[test]
    fn toggle_accepts_either_vocabulary_and_ignores_junk() {
        let mut schedule = Schedule::default_for(1);
        schedule.toggle_work_day("Wed");
        schedule.toggle_work_day("Пн");
        assert_eq!(schedule.work_days, vec![DayKey::Mon, DayKey::Wed]);
        schedule.toggle_work_day("Ср");
        assert_eq!(schedule.work_days, vec![DayKey::Mon]);
        schedule.toggle_work_day("Caturday");
        assert_eq!(schedule.work_days, vec![DayKey::Mon]);
    }

    #[test]
    fn slots_are_inclusive_of_both_endpoints() {
        let mut schedule = Schedule::default_for(1);
        schedule.start_time = "10:00".to_string();
        schedule.end_time = "12:00".to_string();
        assert_eq!(
            generate_slots(&schedule, 30),
            vec!["10:00", "10:30", "11:00", "11:30", "12:00"]
        );
    }

    #[test]
    fn inverted_or_unparseable_hours_yield_no_slots() {
        let mut schedule = Schedule::default_for(1);
        schedule.start_time = "18:00".to_string();
        schedule.end_time = "09:00".to_string();
        assert!(generate_slots(&schedule, 30).is_empty());

        schedule.start_time = "09:00".to_string();
        schedule.end_time = "09:00".to_string();
        assert!(generate_slots(&schedule, 30).is_empty());

        schedule.end_time = "whenever".to_string();
        assert!(generate_slots(&schedule, 30).is_empty());
    }

    #[actix_web::test]
    async fn toggle_persists_whole_collection_and_notifies() {
        let store = Arc::new(MemoryKvStore::new());
        let bus = ChangeBus::new();
        let mut rx = bus.subscribe();
        let book = ScheduleBook::new(store.clone(), bus);

        book.toggle_work_day(&[1, 2], 1, "Fri").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), StoreKey::Schedules);
        let reloaded = book.reconciled(&[1, 2]).await;
        assert_eq!(reloaded[&1].work_days, vec![DayKey::Fri]);
        assert_eq!(reloaded[&2], Schedule::default_for(2));

        let stored: Vec<RawSchedule> = store::read_list(store.as_ref(), StoreKey::Schedules).await;
        assert_eq!(stored.len(), 2);
    }

    #[actix_web::test]
    async fn step_time_moves_persisted_hours() {
        let store = Arc::new(MemoryKvStore::new());
        let book = ScheduleBook::new(store, ChangeBus::new());

        book.step_time(&[1], 1, TimeField::Start, StepDirection::Up, StepMode::Minute { big: true })
            .await
            .unwrap();
        let schedule = book.for_master(&[1], 1).await;
        assert_eq!(schedule.start_time, "09:10");

        book.step_time(&[1], 1, TimeField::End, StepDirection::Down, StepMode::Hour)
            .await
            .unwrap();
        let schedule = book.for_master(&[1], 1).await;
        assert_eq!(schedule.end_time, "17:00");
    }
}
