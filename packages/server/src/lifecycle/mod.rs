//! The soft-delete resource lifecycle.
//!
//! [`ResourceLifecycle`] drives one resource kind through
//! Active → Trashed → (Active | Purged), validating input against the kind's
//! [`ResourceSchema`] and coordinating media writes with record writes:
//!
//! - all validation, including upload checks, happens before any blob is
//!   written;
//! - blobs are written before the record that references them, and removed
//!   again if the record write fails;
//! - replaced pairs are removed only after the new record state is committed;
//! - purge removes every pair before the record, and stops if it cannot.

mod error;
mod query;
mod state;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

pub use error::LifecycleError;
pub use query::{DEFAULT_PER_PAGE, ListQuery, MAX_PER_PAGE};
pub use state::{LifecycleState, Transition};

use crate::media::{MediaAttachmentManager, MediaError, Upload};
use crate::schema::{FieldKind, MediaSlot, ResourceSchema, SLUG_FIELD};
use crate::store::{
    self, MediaRefs, NewRecord, Page, Record, RecordChanges, RecordStore, Scope, StoreError,
};
use crate::utils::hash;
use crate::utils::slug::slugify;
use crate::validation::{self, FieldErrors};

/// The authenticated user a mutation is performed for. Recorded in the
/// audit columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
}

/// Field values and uploads of a create or update request.
#[derive(Debug, Default, Clone)]
pub struct ResourceInput {
    pub fields: Map<String, Value>,
    /// Media slot name to uploaded file.
    pub uploads: BTreeMap<String, Upload>,
}

/// Validated input, ready to be written.
struct Prepared {
    fields: Map<String, Value>,
    uploads: Vec<(&'static MediaSlot, Upload)>,
}

pub struct ResourceLifecycle {
    schema: &'static ResourceSchema,
    store: Arc<dyn RecordStore>,
    media: MediaAttachmentManager,
}

impl ResourceLifecycle {
    pub fn new(
        schema: &'static ResourceSchema,
        store: Arc<dyn RecordStore>,
        media: MediaAttachmentManager,
    ) -> Self {
        Self {
            schema,
            store,
            media,
        }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Record>, LifecycleError> {
        let spec = query.resolve(self.schema, Scope::Active)?;
        Ok(self.store.query(self.schema.kind, &spec).await?)
    }

    pub async fn list_trashed(&self, query: &ListQuery) -> Result<Page<Record>, LifecycleError> {
        let spec = query.resolve(self.schema, Scope::Trashed)?;
        Ok(self.store.query(self.schema.kind, &spec).await?)
    }

    /// Every Active record sorted by `sort_by`, fetched a full page at a time.
    pub async fn list_all(&self, sort_by: &str) -> Result<Vec<Record>, LifecycleError> {
        let query = ListQuery {
            sort_by: Some(sort_by.to_string()),
            per_page: Some(MAX_PER_PAGE.to_string()),
            ..Default::default()
        };
        let mut spec = query.resolve(self.schema, Scope::Active)?;
        let mut records = Vec::new();
        loop {
            let page = self.store.query(self.schema.kind, &spec).await?;
            let last = page.items.len() < spec.per_page as usize || spec.page >= page.total_pages();
            records.extend(page.items);
            if last {
                return Ok(records);
            }
            spec.page += 1;
        }
    }

    pub async fn get(&self, id: i32) -> Result<Record, LifecycleError> {
        self.store
            .find(self.schema.kind, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    pub async fn create(&self, input: ResourceInput, actor: Actor) -> Result<Record, LifecycleError> {
        let mut prepared = self.prepare(None, input).await?;
        for field in self.schema.fields.iter().filter(|f| f.is_author()) {
            prepared
                .fields
                .insert(field.name.to_string(), Value::from(actor.id));
        }
        let written = self.write_uploads(&prepared).await?;

        let new = NewRecord {
            kind: self.schema.kind.to_string(),
            fields: prepared.fields,
            media: written.clone(),
            actor: Some(actor.id),
        };
        let record = match self.store.insert(new).await {
            Ok(record) => record,
            Err(err) => {
                self.discard(&written).await;
                return Err(self.store_error(err));
            }
        };

        info!(kind = self.schema.kind, id = record.id, actor = actor.id, "Created record");
        Ok(record)
    }

    pub async fn update(
        &self,
        id: i32,
        input: ResourceInput,
        actor: Actor,
    ) -> Result<Record, LifecycleError> {
        let existing = self.get(id).await?;
        let prepared = self.prepare(Some(&existing), input).await?;
        let written = self.write_uploads(&prepared).await?;

        let mut media = existing.media;
        let mut replaced = MediaRefs::new();
        for (slot, pair) in &written {
            if let Some(old) = media.insert(slot.clone(), pair.clone()) {
                replaced.insert(slot.clone(), old);
            }
        }

        let changes = RecordChanges {
            fields: prepared.fields,
            media,
            actor: Some(actor.id),
        };
        let record = match self.store.update_fields(self.schema.kind, id, changes).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.discard(&written).await;
                return Err(self.not_found(id));
            }
            Err(err) => {
                self.discard(&written).await;
                return Err(self.store_error(err));
            }
        };

        self.discard(&replaced).await;
        info!(kind = self.schema.kind, id, actor = actor.id, "Updated record");
        Ok(record)
    }

    pub async fn soft_delete(&self, id: i32) -> Result<(), LifecycleError> {
        self.locate(id, Transition::SoftDelete).await?;
        if !self
            .store
            .soft_delete(self.schema.kind, id, Utc::now())
            .await?
        {
            return Err(self.not_found(id));
        }
        info!(kind = self.schema.kind, id, "Moved record to trash");
        Ok(())
    }

    /// Bring a Trashed record back. Fails validation if an Active record has
    /// taken one of its unique values in the meantime.
    pub async fn restore(&self, id: i32) -> Result<Record, LifecycleError> {
        let record = self.locate(id, Transition::Restore).await?;

        let mut errors = FieldErrors::new();
        self.check_unique(&record.fields, None, &mut errors).await?;
        errors.into_result()?;

        match self.store.restore(self.schema.kind, id).await {
            Ok(true) => {}
            Ok(false) => return Err(self.not_found(id)),
            Err(err) => return Err(self.store_error(err)),
        }
        info!(kind = self.schema.kind, id, "Restored record");
        self.get(id).await
    }

    /// Restore every Trashed record of the kind. Records whose unique values
    /// are now held by an Active record stay in the trash.
    pub async fn restore_all(&self) -> Result<u64, LifecycleError> {
        let mut restored = 0;
        for id in self.store.trashed_ids(self.schema.kind).await? {
            match self.restore(id).await {
                Ok(_) => restored += 1,
                Err(LifecycleError::Validation(errors)) => {
                    warn!(kind = self.schema.kind, id, %errors, "Skipped restore, unique value taken");
                }
                // Purged or restored concurrently.
                Err(LifecycleError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        info!(kind = self.schema.kind, restored, "Restored trash");
        Ok(restored)
    }

    /// Permanently delete a Trashed record and every media pair it holds.
    /// The record is kept if any blob cannot be removed.
    pub async fn purge(&self, id: i32) -> Result<(), LifecycleError> {
        let record = self.locate(id, Transition::Purge).await?;

        let mut failures = Vec::new();
        for pair in record.media.values() {
            if let Err(err) = self.media.remove_pair(pair).await {
                failures.push(err.to_string());
            }
        }
        if !failures.is_empty() {
            error!(kind = self.schema.kind, id, ?failures, "Purge aborted, media removal failed");
            return Err(LifecycleError::Storage(failures.join("; ")));
        }

        if !self.store.hard_delete(self.schema.kind, id).await? {
            return Err(self.not_found(id));
        }
        info!(kind = self.schema.kind, id, "Purged record");
        Ok(())
    }

    fn not_found(&self, id: i32) -> LifecycleError {
        LifecycleError::NotFound {
            label: self.schema.label,
            id,
        }
    }

    /// The record `transition` would move, if it is in the transition's
    /// source state.
    async fn locate(&self, id: i32, transition: Transition) -> Result<Record, LifecycleError> {
        let record = match transition.source() {
            LifecycleState::Active => self.store.find(self.schema.kind, id).await?,
            LifecycleState::Trashed => self.store.find_trashed(self.schema.kind, id).await?,
            LifecycleState::Purged => None,
        };
        record
            .filter(|r| LifecycleState::of(r).apply(transition).is_some())
            .ok_or_else(|| self.not_found(id))
    }

    /// Sanitize, merge over `existing`, derive the slug and run every rule.
    async fn prepare(
        &self,
        existing: Option<&Record>,
        input: ResourceInput,
    ) -> Result<Prepared, LifecycleError> {
        let (mut incoming, mut errors) = validation::sanitize(self.schema, input.fields);

        if existing.is_some() {
            // A blank password on update keeps the current one.
            for name in self.schema.hidden_fields() {
                if incoming
                    .get(name)
                    .is_some_and(|v| v.is_null() || v.as_str() == Some(""))
                {
                    incoming.remove(name);
                }
            }
        }

        let mut uploads = Vec::new();
        for (name, upload) in input.uploads {
            match self.schema.media_slot(&name) {
                Some(slot) => match self.media.check_upload(&upload) {
                    Ok(()) => uploads.push((slot, upload)),
                    Err(message) => errors.add(&name, message),
                },
                None => errors.add(&name, format!("The {name} field is not an accepted upload.")),
            }
        }

        let mut fields = existing.map(|r| r.fields.clone()).unwrap_or_default();
        for (name, value) in &incoming {
            fields.insert(name.clone(), value.clone());
        }

        errors.merge_absent(validation::validate(self.schema, &fields));
        self.derive_slug(&mut fields, &mut errors);
        self.check_unique(&fields, existing.map(|r| r.id), &mut errors)
            .await?;
        self.check_foreign_keys(&incoming, &mut errors).await?;
        errors.into_result()?;

        for spec in self.schema.fields.iter().filter(|f| f.is_hidden()) {
            if let Some(Value::String(plain)) = incoming.get(spec.name) {
                let hashed = hash::hash_password(plain)
                    .map_err(|e| LifecycleError::Hashing(e.to_string()))?;
                fields.insert(spec.name.to_string(), Value::String(hashed));
            }
        }

        Ok(Prepared { fields, uploads })
    }

    fn derive_slug(&self, fields: &mut Map<String, Value>, errors: &mut FieldErrors) {
        let Some(source) = self.schema.slug_source else {
            return;
        };
        let slug = fields
            .get(source)
            .and_then(store::value_text)
            .map(|text| slugify(&text))
            .unwrap_or_default();

        if slug.is_empty() {
            fields.remove(SLUG_FIELD);
            if fields.get(source).is_some_and(|v| !v.is_null()) && !errors.contains(source) {
                errors.add(
                    source,
                    format!("The {} field must contain at least one letter or digit.", self.label_of(source)),
                );
            }
        } else {
            fields.insert(SLUG_FIELD.to_string(), Value::String(slug));
        }
    }

    /// Check every unique field against Active records. A clash on the slug
    /// is reported on its source field.
    async fn check_unique(
        &self,
        fields: &Map<String, Value>,
        exclude: Option<i32>,
        errors: &mut FieldErrors,
    ) -> Result<(), StoreError> {
        for field in self.schema.unique_fields() {
            let reported = self.reported_field(field);
            if errors.contains(reported) {
                continue;
            }
            let Some(value) = fields.get(field).and_then(store::value_text) else {
                continue;
            };
            if self
                .store
                .is_taken(self.schema.kind, field, &value, exclude)
                .await?
            {
                errors.add(reported, self.taken_message(reported));
            }
        }
        Ok(())
    }

    async fn check_foreign_keys(
        &self,
        incoming: &Map<String, Value>,
        errors: &mut FieldErrors,
    ) -> Result<(), StoreError> {
        for spec in self.schema.fields {
            let FieldKind::ForeignKey { kind } = spec.kind else {
                continue;
            };
            if errors.contains(spec.name) {
                continue;
            }
            let Some(raw) = incoming.get(spec.name).and_then(Value::as_i64) else {
                continue;
            };
            let exists = match i32::try_from(raw) {
                Ok(id) => self.store.find(kind, id).await?.is_some(),
                Err(_) => false,
            };
            if !exists {
                errors.add(
                    spec.name,
                    format!("The selected {} is invalid.", spec.label()),
                );
            }
        }
        Ok(())
    }

    fn reported_field(&self, field: &'static str) -> &'static str {
        match self.schema.slug_source {
            Some(source) if field == SLUG_FIELD => source,
            _ => field,
        }
    }

    fn label_of(&self, field: &str) -> String {
        self.schema
            .field(field)
            .map(|f| f.label())
            .unwrap_or_else(|| field.replace('_', " "))
    }

    fn taken_message(&self, field: &str) -> String {
        format!("The {} has already been taken.", self.label_of(field))
    }

    /// Map a unique violation raised by the backend (a lost race against a
    /// concurrent write) back to a field error.
    fn store_error(&self, err: StoreError) -> LifecycleError {
        if let StoreError::UniqueViolation(message) = &err {
            let clashed = self
                .schema
                .unique_fields()
                .into_iter()
                .find(|f| message.contains(&store::unique_index_name(self.schema.kind, f)));
            if let Some(field) = clashed {
                let reported = self.reported_field(field);
                return FieldErrors::single(reported, self.taken_message(reported)).into();
            }
        }
        err.into()
    }

    /// Base name for uploaded files: the slug, else the first non-empty text
    /// field, else the kind.
    fn name_hint(&self, fields: &Map<String, Value>) -> String {
        if let Some(slug) = fields.get(SLUG_FIELD).and_then(Value::as_str) {
            return slug.to_string();
        }
        self.schema
            .fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Text { .. }))
            .find_map(|f| fields.get(f.name).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .unwrap_or(self.schema.kind)
            .to_string()
    }

    /// Store every upload. On failure, pairs already written are removed.
    async fn write_uploads(&self, prepared: &Prepared) -> Result<MediaRefs, LifecycleError> {
        let hint = self.name_hint(&prepared.fields);
        let mut written = MediaRefs::new();

        for (slot, upload) in &prepared.uploads {
            match self
                .media
                .store(upload, &hint, slot.folder, slot.thumbnail)
                .await
            {
                Ok(pair) => {
                    written.insert(slot.name.to_string(), pair);
                }
                Err(err) => {
                    self.discard(&written).await;
                    return Err(match err {
                        MediaError::InvalidImage(reason) => FieldErrors::single(
                            slot.name,
                            format!("The {} must be a valid image ({reason}).", slot.name),
                        )
                        .into(),
                        other => LifecycleError::Storage(other.to_string()),
                    });
                }
            }
        }
        Ok(written)
    }

    /// Remove pairs that are no longer referenced. Failures are logged, not
    /// returned.
    async fn discard(&self, pairs: &MediaRefs) {
        for (slot, pair) in pairs {
            if let Err(err) = self.media.remove_pair(pair).await {
                warn!(kind = self.schema.kind, slot, error = %err, "Failed to remove media pair");
            }
        }
    }
}
