//! Parallel synthesis of customer records.
//!
//! Generation is CPU-bound and runs on a dedicated Rayon pool. Every parallel
//! unit owns a disjoint chunk: new records are built into per-chunk buffers
//! that are concatenated in chunk order once all units finish, and existing
//! records are rewritten through non-overlapping mutable slices. No two units
//! ever touch the same record.

use crate::bulk::config::BulkConfig;
use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::faker::FakeProfile;
use crate::models::Customer;
use chrono::{DateTime, Utc};
use rand::Rng;
use rayon::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

/// Reject quantities outside `1..=max` before any work starts.
pub fn validate_quantity(quantity: i64, max: usize) -> BulkResult<usize> {
    if quantity <= 0 {
        return Err(BulkError::invalid_quantity(quantity));
    }
    match usize::try_from(quantity) {
        Ok(count) if count <= max => Ok(count),
        _ => Err(BulkError::quantity_too_large(quantity, max)),
    }
}

fn new_customer<R: Rng + ?Sized>(rng: &mut R) -> Customer {
    let profile = FakeProfile::generate(rng);
    Customer {
        id: Uuid::new_v4(),
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        contact_number: profile.contact_number,
        address: profile.address,
        // Audit stamping on the write path fills these in.
        created_date: DateTime::<Utc>::default(),
        modified_date: DateTime::<Utc>::default(),
    }
}

/// Overwrite the contact fields, leaving identity and timestamps alone.
fn refresh_customer<R: Rng + ?Sized>(customer: &mut Customer, rng: &mut R) {
    let profile = FakeProfile::generate(rng);
    customer.first_name = profile.first_name;
    customer.last_name = profile.last_name;
    customer.email = profile.email;
    customer.contact_number = profile.contact_number;
    customer.address = profile.address;
}

/// Produces synthetic customers on a Rayon pool.
#[derive(Clone)]
pub struct RecordGenerator {
    pool: Arc<rayon::ThreadPool>,
    create_chunk_size: usize,
    update_chunk_size: usize,
    max_quantity: usize,
}

impl RecordGenerator {
    pub fn new(
        threads: usize,
        create_chunk_size: usize,
        update_chunk_size: usize,
    ) -> BulkResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|idx| format!("record-gen-{idx}"))
            .build()
            .map_err(|e| BulkError::Generator(format!("failed to create thread pool: {e}")))?;

        Ok(Self {
            pool: Arc::new(pool),
            create_chunk_size: create_chunk_size.max(1),
            update_chunk_size: update_chunk_size.max(1),
            max_quantity: usize::MAX,
        })
    }

    /// Refuse to generate more than `max` records in one call.
    pub fn with_max_quantity(mut self, max: usize) -> Self {
        self.max_quantity = max;
        self
    }

    /// Pool sized to the machine, chunk sizes and ceiling from config.
    pub fn from_config(config: &BulkConfig) -> BulkResult<Self> {
        Ok(Self::new(
            num_cpus::get(),
            config.create_chunk_size,
            config.update_chunk_size,
        )?
        .with_max_quantity(config.max_quantity))
    }

    /// Generate exactly `quantity` new customers with unique identifiers.
    pub fn generate(&self, quantity: i64) -> BulkResult<Vec<Customer>> {
        let count = validate_quantity(quantity, self.max_quantity)?;
        let chunk_size = self.create_chunk_size;
        let chunks = count.div_ceil(chunk_size);

        log::debug!(
            "generating {} customers in {} chunks of {} on {} threads",
            count,
            chunks,
            chunk_size,
            self.pool.current_num_threads()
        );

        let buffers: Vec<Vec<Customer>> = self.pool.install(|| {
            (0..chunks)
                .into_par_iter()
                .map(|chunk| {
                    let start = chunk * chunk_size;
                    let len = chunk_size.min(count - start);
                    let mut rng = rand::thread_rng();
                    (0..len).map(|_| new_customer(&mut rng)).collect()
                })
                .collect()
        });

        let mut customers = Vec::with_capacity(count);
        for buffer in buffers {
            customers.extend(buffer);
        }

        Ok(customers)
    }

    /// Refresh the contact fields of existing customers in place.
    pub fn refresh(&self, customers: &mut [Customer]) {
        let chunk_size = self.update_chunk_size;
        self.pool.install(|| {
            customers.par_chunks_mut(chunk_size).for_each(|chunk| {
                let mut rng = rand::thread_rng();
                for customer in chunk {
                    refresh_customer(customer, &mut rng);
                }
            });
        });
    }

    /// Run CPU-bound work against this generator off the async runtime.
    pub async fn spawn<T, F>(&self, work: F) -> BulkResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&RecordGenerator) -> BulkResult<T> + Send + 'static,
    {
        let generator = self.clone();
        tokio::task::spawn_blocking(move || work(&generator))
            .await
            .map_err(|e| BulkError::Generator(format!("generator task failed: {e}")))?
    }

    /// Build a single customer outside the pool, for row-by-row paths.
    pub fn one(&self) -> Customer {
        new_customer(&mut rand::thread_rng())
    }

    /// Refresh a single customer outside the pool.
    pub fn refresh_one(&self, customer: &mut Customer) {
        refresh_customer(customer, &mut rand::thread_rng());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn generator() -> RecordGenerator {
        RecordGenerator::new(4, 500, 100).expect("thread pool")
    }

    #[test]
    fn rejects_non_positive_quantities() {
        let generator = generator();
        for quantity in [0, -1, i64::MIN] {
            assert!(matches!(
                generator.generate(quantity),
                Err(BulkError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn rejects_quantities_above_the_ceiling() {
        let generator = generator().with_max_quantity(100);
        assert_eq!(generator.generate(100).unwrap().len(), 100);
        assert!(matches!(
            generator.generate(101),
            Err(BulkError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_quantity(i64::MAX, 1_000_000),
            Err(BulkError::InvalidArgument(msg)) if msg.contains("at most 1000000")
        ));
    }

    #[test]
    fn produces_exact_count_with_unique_ids() {
        let generator = generator();
        for quantity in [1_i64, 499, 500, 501, 1_000, 2_345] {
            let customers = generator.generate(quantity).unwrap();
            assert_eq!(customers.len(), quantity as usize);
            let ids: HashSet<Uuid> = customers.iter().map(|c| c.id).collect();
            assert_eq!(ids.len(), quantity as usize);
        }
    }

    #[test]
    fn generated_fields_are_populated() {
        let customers = generator().generate(50).unwrap();
        for c in &customers {
            assert!(!c.first_name.is_empty());
            assert!(!c.last_name.is_empty());
            assert!(c.email.contains('@'));
            assert!(!c.contact_number.is_empty());
            assert!(!c.address.is_empty());
        }
    }

    #[test]
    fn refresh_keeps_identity_and_timestamps() {
        let generator = generator();
        let created = Utc::now();
        let mut customers = generator.generate(250).unwrap();
        for c in customers.iter_mut() {
            c.created_date = created;
            c.modified_date = created;
        }
        let before = customers.clone();

        generator.refresh(&mut customers);

        assert_eq!(customers.len(), before.len());
        for (after, before) in customers.iter().zip(&before) {
            assert_eq!(after.id, before.id);
            assert_eq!(after.created_date, before.created_date);
            assert_eq!(after.modified_date, before.modified_date);
        }
        // 250 independent refreshes all producing the same email is not plausible.
        assert!(customers.iter().zip(&before).any(|(a, b)| a.email != b.email));
    }

    #[tokio::test]
    async fn spawned_work_runs_off_the_runtime() {
        let generator = generator();
        let customers = generator.spawn(|g| g.generate(42)).await.unwrap();
        assert_eq!(customers.len(), 42);

        let failed = generator.spawn(|g| g.generate(0)).await;
        assert!(matches!(failed, Err(BulkError::InvalidArgument(_))));
    }

    #[test]
    fn chunk_size_is_clamped_to_one() {
        let generator = RecordGenerator::new(1, 0, 0).unwrap();
        assert_eq!(generator.generate(3).unwrap().len(), 3);
    }
}
