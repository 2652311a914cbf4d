use serde_json::{Map, Value};
use tracing::info;

use crate::schema::SETTING;
use crate::store::{NewRecord, RecordStore, StoreError};

/// Site settings seeded on startup: key, label, initial value.
const DEFAULT_SETTINGS: &[(&str, &str, &str)] = &[
    ("site_name", "Site name", "Folio"),
    ("site_tagline", "Tagline", ""),
    ("contact_email", "Contact email", ""),
    ("contact_phone", "Contact phone", ""),
    ("address", "Address", ""),
    ("facebook_url", "Facebook", ""),
    ("instagram_url", "Instagram", ""),
    ("linkedin_url", "LinkedIn", ""),
];

/// Insert every default setting whose key is not present yet. Existing
/// values are never overwritten.
pub async fn seed_settings(store: &dyn RecordStore) -> Result<u32, StoreError> {
    let mut inserted = 0u32;
    for &(key, label, value) in DEFAULT_SETTINGS {
        if store.is_taken(SETTING.kind, "key", key, None).await? {
            continue;
        }

        let mut fields = Map::new();
        fields.insert("key".into(), Value::from(key));
        fields.insert("label".into(), Value::from(label));
        fields.insert(
            "value".into(),
            if value.is_empty() { Value::Null } else { Value::from(value) },
        );
        let record = NewRecord {
            kind: SETTING.kind.to_string(),
            fields,
            media: Default::default(),
            actor: None,
        };

        match store.insert(record).await {
            Ok(_) => inserted += 1,
            // Another instance seeded the same key first.
            Err(StoreError::UniqueViolation(_)) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new settings", inserted);
    }
    Ok(inserted)
}
