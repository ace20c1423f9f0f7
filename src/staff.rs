use crate::models::Master;

// The roster is the one external collaborator: a small, stable list that is
// assumed to always resolve.
pub trait StaffDirectory: Send + Sync {
    fn list(&self) -> Vec<Master>;

    fn find(&self, id: i64) -> Option<Master> {
        self.list().into_iter().find(|master| master.id == id)
    }

    fn ids(&self) -> Vec<i64> {
        self.list().into_iter().map(|master| master.id).collect()
    }
}

pub struct StaticRoster;

impl StaffDirectory for StaticRoster {
    fn list(&self) -> Vec<Master> {
        [
            (1, "Анна", "Окрашивание и стрижка", "anna.jpg"),
            (2, "Ирина", "Визаж", "irina.jpg"),
            (3, "Елена", "Укладка", "elena.jpg"),
        ]
        .into_iter()
        .map(|(id, name, specialty, photo)| Master {
            id,
            name: name.to_string(),
            role: "мастер".to_string(),
            specialty: specialty.to_string(),
            photo: photo.to_string(),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_lookup_by_id() {
        let roster = StaticRoster;
        assert_eq!(roster.ids(), vec![1, 2, 3]);
        assert_eq!(roster.find(2).unwrap().name, "Ирина");
        assert!(roster.find(42).is_none());
    }
}
