use std::sync::Arc;

use crate::booking::AppointmentBook;
use crate::catalog::ServiceCatalog;
use crate::models::Master;
use crate::schedule::ScheduleBook;
use crate::staff::StaffDirectory;
use crate::store::{ChangeBus, KvStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub bus: ChangeBus,
    pub staff: Arc<dyn StaffDirectory>,
    pub admin_pass: String,
}

impl AppState {
    pub fn appointments(&self) -> AppointmentBook {
        AppointmentBook::new(self.store.clone(), self.bus.clone())
    }

    pub fn services(&self) -> ServiceCatalog {
        ServiceCatalog::new(self.store.clone(), self.bus.clone())
    }

    pub fn schedules(&self) -> ScheduleBook {
        ScheduleBook::new(self.store.clone(), self.bus.clone())
    }

    pub fn masters(&self) -> Vec<Master> {
        self.staff.list()
    }

    pub fn master_ids(&self) -> Vec<i64> {
        self.staff.ids()
    }
}
