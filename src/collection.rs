//! Customer Collection Manager.
//!
//! Holds the locally cached customer list and the editor state, and drives
//! every write through the backend. Consistency model: writes return `()`
//! and never touch the cache; after a successful write the whole collection
//! is fetched again and the cache is replaced. The displayed list is
//! therefore exactly what the backend last returned, including the
//! eligibility fields only the backend computes.

use crate::backend_client::CustomerBackend;
use crate::errors::ClientError;
use crate::form::CustomerForm;
use crate::models::{Customer, CustomerFields, CustomerId};
use crate::presentation::{summarize, CustomerSummary};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch customers";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save customer";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete customer";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this customer?";

/// Status of the collection fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    /// Message for the persistent error banner.
    Error(String),
}

/// Add/edit form state. Create and edit are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Create(CustomerForm),
    Edit { id: CustomerId, form: CustomerForm },
}

/// What the list area should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListView<'a> {
    Loading,
    /// Error banner only. Stale rows are not shown next to it.
    Failed(&'a str),
    Ready(&'a [Customer]),
}

/// Blocking alert raised by a failed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// Explicit user confirmation, asked before a destructive call.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Declined at the confirmation step; nothing was sent.
    Cancelled,
}

pub struct CustomerCollectionManager<B> {
    backend: B,
    customers: Vec<Customer>,
    list_state: ListState,
    editor: EditorState,
    notice: Option<Notice>,
}

impl<B: CustomerBackend> CustomerCollectionManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            customers: Vec::new(),
            list_state: ListState::Idle,
            editor: EditorState::Closed,
            notice: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ============ Collection ============

    /// Fetches the whole collection and replaces the cache.
    ///
    /// On failure the previous cache is kept but hidden behind the error
    /// banner until the next successful fetch.
    pub async fn list(&mut self) -> Result<(), ClientError> {
        self.list_state = ListState::Loading;

        match self.backend.fetch_all().await {
            Ok(customers) => {
                tracing::debug!("Customer cache replaced ({} records)", customers.len());
                self.customers = customers;
                self.list_state = ListState::Idle;
                Ok(())
            }
            Err(e) => {
                tracing::error!("{}: {}", FETCH_FAILED_MESSAGE, e);
                self.list_state = ListState::Error(FETCH_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn list_state(&self) -> &ListState {
        &self.list_state
    }

    pub fn is_loading(&self) -> bool {
        self.list_state == ListState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.list_state {
            ListState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn view(&self) -> ListView<'_> {
        match &self.list_state {
            ListState::Loading => ListView::Loading,
            ListState::Error(message) => ListView::Failed(message.as_str()),
            ListState::Idle => ListView::Ready(self.customers.as_slice()),
        }
    }

    /// The cache as last fetched, regardless of the current list state.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn find(&self, id: &CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| &c.id == id)
    }

    pub fn summary(&self) -> CustomerSummary {
        summarize(&self.customers)
    }

    // ============ Writes ============

    /// Submits a new record. The created record is not inserted locally.
    pub async fn create(&mut self, fields: CustomerFields) -> Result<(), ClientError> {
        match self.backend.create(&fields).await {
            Ok(created) => {
                tracing::info!("Customer {} created; refreshing list", created.id);
                self.editor = EditorState::Closed;
                self.refresh_after_write().await;
                Ok(())
            }
            Err(e) => {
                self.raise(SAVE_FAILED_MESSAGE, &e);
                Err(e)
            }
        }
    }

    /// Replaces the editable fields of `id`.
    pub async fn update(
        &mut self,
        id: &CustomerId,
        fields: CustomerFields,
    ) -> Result<(), ClientError> {
        match self.backend.update(id, &fields).await {
            Ok(_) => {
                tracing::info!("Customer {} updated; refreshing list", id);
                self.editor = EditorState::Closed;
                self.refresh_after_write().await;
                Ok(())
            }
            Err(e) => {
                self.raise(SAVE_FAILED_MESSAGE, &e);
                Err(e)
            }
        }
    }

    /// Deletes `id` once `confirmation` agrees. Declining sends nothing.
    pub async fn delete<C>(
        &mut self,
        id: &CustomerId,
        confirmation: &C,
    ) -> Result<DeleteOutcome, ClientError>
    where
        C: Confirmation + ?Sized,
    {
        if !confirmation.confirm(DELETE_PROMPT) {
            tracing::info!("Deletion of customer {} cancelled", id);
            return Ok(DeleteOutcome::Cancelled);
        }

        match self.backend.delete(id).await {
            Ok(()) => {
                self.refresh_after_write().await;
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.raise(DELETE_FAILED_MESSAGE, &e);
                Err(e)
            }
        }
    }

    /// A refresh failure after a successful write shows up in the list
    /// state; the write itself still succeeded.
    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.list().await {
            tracing::warn!("Write succeeded but the list refresh failed: {}", e);
        }
    }

    fn raise(&mut self, message: &str, cause: &ClientError) {
        tracing::error!("{}: {}", message, cause);
        self.notice = Some(Notice {
            message: message.to_string(),
        });
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Dismisses the pending notice.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // ============ Editor ============

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// Opens a blank form, discarding any open editor.
    pub fn open_create(&mut self) {
        self.editor = EditorState::Create(CustomerForm::default());
    }

    /// Opens the form pre-filled from the cached record `id`.
    pub fn open_edit(&mut self, id: &CustomerId) -> Result<(), ClientError> {
        let customer = self
            .find(id)
            .ok_or_else(|| ClientError::NotFound(format!("customer {} is not in the list", id)))?;
        self.editor = EditorState::Edit {
            id: id.clone(),
            form: CustomerForm::from_customer(customer),
        };
        Ok(())
    }

    /// Dismisses the editor without side effects.
    pub fn close_editor(&mut self) {
        self.editor = EditorState::Closed;
    }

    pub fn editor_mut(&mut self) -> Option<&mut CustomerForm> {
        match &mut self.editor {
            EditorState::Closed => None,
            EditorState::Create(form) | EditorState::Edit { form, .. } => Some(form),
        }
    }

    /// Submits the open editor as a create or an update.
    ///
    /// Input that breaks a form constraint is rejected before any call and
    /// leaves the editor as it was.
    pub async fn submit(&mut self) -> Result<(), ClientError> {
        let (target, fields) = match &self.editor {
            EditorState::Closed => {
                return Err(ClientError::InvalidForm("no customer form is open".to_string()))
            }
            EditorState::Create(form) => (None, form.to_fields()?),
            EditorState::Edit { id, form } => (Some(id.clone()), form.to_fields()?),
        };

        match target {
            None => self.create(fields).await,
            Some(id) => self.update(&id, fields).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory backend that assigns ids and computes a stand-in
    /// eligibility so tests can tell server data from local data.
    #[derive(Default)]
    struct InMemoryBackend {
        records: Mutex<Vec<Customer>>,
        next_id: AtomicUsize,
        calls: AtomicUsize,
        fail_writes: bool,
        fail_reads: Mutex<bool>,
    }

    impl InMemoryBackend {
        fn seeded(records: Vec<Customer>) -> Self {
            Self {
                next_id: AtomicUsize::new(records.len() + 1),
                records: Mutex::new(records),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail_reads(&self, fail: bool) {
            *self.fail_reads.lock().unwrap() = fail;
        }

        fn materialize(&self, id: CustomerId, fields: &CustomerFields) -> Customer {
            Customer {
                id,
                name: fields.name.clone(),
                surname: fields.surname.clone(),
                username: fields.username.clone(),
                email: fields.email.clone(),
                phone: fields.phone.clone(),
                address: fields.address.clone(),
                monthly_salary: Some(fields.monthly_salary.clone()),
                credit_score: Some(fields.credit_score),
                employment_status: Some(fields.employment_status.to_string()),
                loan_eligible: Some(true),
                max_loan_amount: Some(BigDecimal::from(99)),
                created_at: None,
                updated_at: None,
            }
        }
    }

    #[async_trait]
    impl CustomerBackend for InMemoryBackend {
        async fn fetch_all(&self) -> Result<Vec<Customer>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_reads.lock().unwrap() {
                return Err(ClientError::ExternalApiError("down".to_string()));
            }
            Ok(self.records.lock().unwrap().clone())
        }

        async fn fetch_one(&self, id: &CustomerId) -> Result<Customer, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|c| &c.id == id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(id.to_string()))
        }

        async fn create(&self, fields: &CustomerFields) -> Result<Customer, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(ClientError::BadRequest("duplicate username".to_string()));
            }
            let id = CustomerId::from(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
            let created = self.materialize(id, fields);
            self.records.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update(
            &self,
            id: &CustomerId,
            fields: &CustomerFields,
        ) -> Result<Customer, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(ClientError::ExternalApiError("500".to_string()));
            }
            let updated = self.materialize(id.clone(), fields);
            let mut records = self.records.lock().unwrap();
            let slot = records
                .iter_mut()
                .find(|c| &c.id == id)
                .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
            *slot = updated.clone();
            Ok(updated)
        }

        async fn delete(&self, id: &CustomerId) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(ClientError::ExternalApiError("500".to_string()));
            }
            self.records.lock().unwrap().retain(|c| &c.id != id);
            Ok(())
        }
    }

    fn record(id: &str, username: &str) -> Customer {
        Customer {
            id: CustomerId::from(id),
            name: "Test".to_string(),
            surname: "Customer".to_string(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            phone: None,
            address: None,
            monthly_salary: None,
            credit_score: Some(700),
            employment_status: None,
            loan_eligible: Some(false),
            max_loan_amount: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn fill(form: &mut CustomerForm, username: &str) {
        form.name = "New".to_string();
        form.surname = "Person".to_string();
        form.username = username.to_string();
        form.email = format!("{}@example.com", username);
        form.monthly_salary = "2500".to_string();
        form.credit_score = "690".to_string();
    }

    #[tokio::test]
    async fn test_list_replaces_cache() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a"), record("2", "b")]);
        let mut manager = CustomerCollectionManager::new(backend);

        manager.list().await.unwrap();
        assert_eq!(manager.list_state(), &ListState::Idle);
        assert_eq!(manager.customers().len(), 2);
        assert!(matches!(manager.view(), ListView::Ready(rows) if rows.len() == 2));
    }

    #[tokio::test]
    async fn test_list_failure_shows_banner_not_stale_rows() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a")]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        manager.backend().fail_reads(true);
        assert!(manager.list().await.is_err());

        assert!(!manager.is_loading());
        assert_eq!(manager.error(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(manager.view(), ListView::Failed(FETCH_FAILED_MESSAGE));
        // Cache kept, just not displayed
        assert_eq!(manager.customers().len(), 1);

        manager.backend().fail_reads(false);
        manager.list().await.unwrap();
        assert_eq!(manager.error(), None);
    }

    #[tokio::test]
    async fn test_create_refetches_instead_of_appending() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a")]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        manager.open_create();
        fill(manager.editor_mut().unwrap(), "fresh");
        manager.submit().await.unwrap();

        assert_eq!(manager.editor(), &EditorState::Closed);
        let server_view = manager.backend().records.lock().unwrap().clone();
        assert_eq!(manager.customers(), server_view.as_slice());
        // Backend-computed values come through the re-fetch
        let created = manager.customers().iter().find(|c| c.username == "fresh").unwrap();
        assert_eq!(created.loan_eligible, Some(true));
        assert_eq!(created.max_loan_amount, Some(BigDecimal::from(99)));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_editor_and_raises_notice() {
        let backend = InMemoryBackend {
            fail_writes: true,
            ..InMemoryBackend::seeded(vec![record("1", "a")])
        };
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        manager.open_create();
        fill(manager.editor_mut().unwrap(), "dup");
        let before = manager.editor().clone();

        assert!(manager.submit().await.is_err());
        assert_eq!(manager.editor(), &before);
        assert_eq!(
            manager.take_notice(),
            Some(Notice {
                message: SAVE_FAILED_MESSAGE.to_string()
            })
        );
        assert_eq!(manager.notice(), None);
        assert_eq!(manager.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let backend = InMemoryBackend::seeded(vec![]);
        let mut manager = CustomerCollectionManager::new(backend);

        manager.open_create();
        let err = manager.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidForm(_)));
        assert_eq!(manager.backend().calls(), 0);
        assert!(matches!(manager.editor(), EditorState::Create(_)));
        assert_eq!(manager.notice(), None);
    }

    #[tokio::test]
    async fn test_edit_prefills_and_updates() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a"), record("2", "b")]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        let id = CustomerId::from("2");
        manager.open_edit(&id).unwrap();
        {
            let form = manager.editor_mut().unwrap();
            assert_eq!(form.username, "b");
            assert_eq!(form.phone, "");
            assert_eq!(form.monthly_salary, "");
            assert_eq!(form.credit_score, "700");
            form.monthly_salary = "8000".to_string();
        }
        manager.submit().await.unwrap();

        let updated = manager.find(&id).unwrap();
        assert_eq!(updated.monthly_salary, Some(BigDecimal::from(8000)));
        assert_eq!(manager.editor(), &EditorState::Closed);
    }

    #[tokio::test]
    async fn test_open_edit_unknown_id() {
        let mut manager = CustomerCollectionManager::new(InMemoryBackend::default());
        assert!(manager.open_edit(&CustomerId::from("404")).is_err());
        assert_eq!(manager.editor(), &EditorState::Closed);
    }

    #[tokio::test]
    async fn test_create_and_edit_are_exclusive() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a")]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        manager.open_edit(&CustomerId::from("1")).unwrap();
        manager.open_create();
        assert_eq!(manager.editor(), &EditorState::Create(CustomerForm::default()));

        let calls = manager.backend().calls();
        manager.close_editor();
        assert_eq!(manager.editor(), &EditorState::Closed);
        assert_eq!(manager.backend().calls(), calls);
    }

    #[tokio::test]
    async fn test_delete_declined_sends_nothing() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a")]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();
        let calls = manager.backend().calls();

        let asked = Mutex::new(Vec::new());
        let decline = |prompt: &str| {
            asked.lock().unwrap().push(prompt.to_string());
            false
        };

        let outcome = manager.delete(&CustomerId::from("1"), &decline).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(manager.backend().calls(), calls);
        assert_eq!(*asked.lock().unwrap(), vec![DELETE_PROMPT.to_string()]);
        assert_eq!(manager.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_confirmed_refetches() {
        let backend = InMemoryBackend::seeded(vec![record("1", "a"), record("2", "b")]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        let outcome = manager
            .delete(&CustomerId::from("1"), &|_: &str| true)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(manager.customers().len(), 1);
        assert!(manager.find(&CustomerId::from("1")).is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_list() {
        let backend = InMemoryBackend {
            fail_writes: true,
            ..InMemoryBackend::seeded(vec![record("1", "a")])
        };
        let mut manager = CustomerCollectionManager::new(backend);
        manager.list().await.unwrap();

        let result = manager.delete(&CustomerId::from("1"), &|_: &str| true).await;
        assert!(result.is_err());
        assert_eq!(manager.customers().len(), 1);
        assert_eq!(
            manager.notice().map(|n| n.message.as_str()),
            Some(DELETE_FAILED_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_after_write_is_not_a_write_failure() {
        let backend = InMemoryBackend::seeded(vec![]);
        let mut manager = CustomerCollectionManager::new(backend);
        manager.backend().fail_reads(true);

        manager.open_create();
        fill(manager.editor_mut().unwrap(), "late");
        manager.submit().await.unwrap();

        assert_eq!(manager.editor(), &EditorState::Closed);
        assert_eq!(manager.notice(), None);
        assert_eq!(manager.error(), Some(FETCH_FAILED_MESSAGE));
    }
}
