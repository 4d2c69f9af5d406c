use crate::models::Customer;
use chrono::{DateTime, Utc};

/// Change-tracking state of an entity held by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
    Unchanged,
}

/// Entities carrying creation and modification timestamps.
pub trait Auditable {
    fn set_created_date(&mut self, at: DateTime<Utc>);
    fn set_modified_date(&mut self, at: DateTime<Utc>);

    /// `modified_date` moves on every write, `created_date` only when added.
    fn stamp(&mut self, state: EntryState, at: DateTime<Utc>) {
        match state {
            EntryState::Added => {
                self.set_created_date(at);
                self.set_modified_date(at);
            }
            EntryState::Modified => self.set_modified_date(at),
            EntryState::Unchanged => {}
        }
    }
}

impl Auditable for Customer {
    fn set_created_date(&mut self, at: DateTime<Utc>) {
        self.created_date = at;
    }

    fn set_modified_date(&mut self, at: DateTime<Utc>) {
        self.modified_date = at;
    }
}

/// Stamp a whole batch with a single instant.
pub fn stamp_all<T: Auditable>(entities: &mut [T], state: EntryState, at: DateTime<Utc>) {
    for entity in entities {
        entity.stamp(state, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            first_name: "Iris".into(),
            last_name: "Walsh".into(),
            email: "iris.walsh1@example.com".into(),
            contact_number: "555-555-0101".into(),
            address: "12 Marsh Lane".into(),
            created_date: DateTime::<Utc>::default(),
            modified_date: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn added_sets_both_timestamps_equal() {
        let now = Utc::now();
        let mut c = customer();
        c.stamp(EntryState::Added, now);
        assert_eq!(c.created_date, now);
        assert_eq!(c.modified_date, now);
    }

    #[test]
    fn modified_keeps_created_date() {
        let created = Utc::now() - Duration::days(3);
        let now = Utc::now();
        let mut c = customer();
        c.stamp(EntryState::Added, created);
        c.stamp(EntryState::Modified, now);
        assert_eq!(c.created_date, created);
        assert_eq!(c.modified_date, now);
    }

    #[test]
    fn unchanged_is_left_alone() {
        let mut c = customer();
        c.stamp(EntryState::Unchanged, Utc::now());
        assert_eq!(c.modified_date, DateTime::<Utc>::default());
    }

    #[test]
    fn stamp_all_uses_one_instant() {
        let now = Utc::now();
        let mut batch = vec![customer(), customer(), customer()];
        stamp_all(&mut batch, EntryState::Added, now);
        assert!(batch.iter().all(|c| c.created_date == now && c.modified_date == now));
    }
}
