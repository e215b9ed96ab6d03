//! # Customer Repository
//!
//! Registered customers in `customers.csv`. The table only grows: there is
//! no update or delete path.

use std::path::{Path, PathBuf};

use tally_core::validation::{validate_identifier, validate_name, validate_password};
use tally_core::Customer;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::table::{record, Record, RecordStore};

/// Column order of `customers.csv`.
pub const CUSTOMER_FIELDS: [&str; 3] = ["customer_id", "name", "password"];

fn customer_from_record(record: &Record) -> Option<Customer> {
    let id = record.get("customer_id").map(|v| v.trim())?;
    if id.is_empty() {
        return None;
    }
    Some(Customer::new(
        id,
        record.get("name").map(|v| v.trim()).unwrap_or(""),
        record.get("password").cloned().unwrap_or_default(),
    ))
}

/// Customer directory.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    path: PathBuf,
    store: RecordStore,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(path: impl Into<PathBuf>, store: RecordStore) -> Self {
        CustomerRepository {
            path: path.into(),
            store,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All customers, first row per id.
    pub fn list(&self) -> StoreResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = Vec::new();
        for record in self.store.read_table(&self.path)? {
            let Some(customer) = customer_from_record(&record) else {
                warn!(path = %self.path.display(), "Skipping customer row without id");
                continue;
            };
            if customers.iter().any(|c| c.customer_id == customer.customer_id) {
                warn!(customer_id = %customer.customer_id, "Duplicate customer id, keeping first row");
                continue;
            }
            customers.push(customer);
        }
        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    pub fn find(&self, customer_id: &str) -> StoreResult<Customer> {
        self.list()?
            .into_iter()
            .find(|c| c.customer_id == customer_id)
            .ok_or_else(|| StoreError::not_found("Customer", customer_id))
    }

    /// Registers a new customer.
    ///
    /// ## Errors
    /// - `Validation` for an empty or malformed id, empty name or password
    /// - `Duplicate` if the id is already registered
    pub fn register(&self, customer: &Customer) -> StoreResult<()> {
        validate_identifier("customer_id", &customer.customer_id)?;
        validate_name("name", &customer.name)?;
        validate_password(&customer.password)?;

        let guard = self.store.lock(&self.path)?;
        let taken = self
            .store
            .read_table(&self.path)?
            .iter()
            .filter_map(customer_from_record)
            .any(|c| c.customer_id == customer.customer_id.trim());
        if taken {
            return Err(StoreError::duplicate("customer_id", customer.customer_id.trim()));
        }

        let row = record([
            ("customer_id", customer.customer_id.trim()),
            ("name", customer.name.trim()),
            ("password", customer.password.as_str()),
        ]);
        self.store.append_record_locked(&guard, &CUSTOMER_FIELDS, &row)?;

        info!(customer_id = %customer.customer_id.trim(), "Customer registered");
        Ok(())
    }

    /// Checks a customer's credentials.
    ///
    /// Returns `InvalidCredentials` for an unknown id, a wrong password, or
    /// a missing customers file alike.
    pub fn authenticate(&self, customer_id: &str, password: &str) -> StoreResult<Customer> {
        let customer = self
            .list()?
            .into_iter()
            .find(|c| c.customer_id == customer_id.trim() && c.password == password);

        match customer {
            Some(customer) => {
                debug!(customer_id = %customer.customer_id, "Customer authenticated");
                Ok(customer)
            }
            None => {
                warn!(customer_id = %customer_id, "Customer login failed");
                Err(StoreError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn repo(dir: &Path) -> CustomerRepository {
        CustomerRepository::new(dir.join("customers.csv"), RecordStore::default())
    }

    #[test]
    fn test_register_and_authenticate() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());

        repo.register(&Customer::new("C1", "Asha", "secret")).unwrap();

        let customer = repo.authenticate("C1", "secret").unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(
            fs::read_to_string(repo.path()).unwrap(),
            "customer_id,name,password\nC1,Asha,secret\n"
        );
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        repo.register(&Customer::new("C1", "Asha", "secret")).unwrap();

        let err = repo.register(&Customer::new("C1", "Other", "pw")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_register_validates_fields() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());

        assert!(repo.register(&Customer::new("", "Asha", "pw")).is_err());
        assert!(repo.register(&Customer::new("C1", "", "pw")).is_err());
        assert!(repo.register(&Customer::new("C1", "Asha", "")).is_err());
        assert!(repo.register(&Customer::new("C 1", "Asha", "pw")).is_err());
        assert!(!repo.path().exists());
    }

    #[test]
    fn test_authenticate_failures_are_indistinguishable() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());

        assert!(matches!(
            repo.authenticate("C1", "secret"),
            Err(StoreError::InvalidCredentials)
        ));

        repo.register(&Customer::new("C1", "Asha", "secret")).unwrap();
        assert!(matches!(
            repo.authenticate("C1", "wrong"),
            Err(StoreError::InvalidCredentials)
        ));
        assert!(matches!(
            repo.authenticate("C2", "secret"),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_find() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        repo.register(&Customer::new("C1", "Asha", "secret")).unwrap();

        assert_eq!(repo.find("C1").unwrap().name, "Asha");
        assert!(matches!(repo.find("C9"), Err(StoreError::NotFound { .. })));
    }
}
