//! Per-resource schema descriptors.
//!
//! A [`ResourceSchema`] tells the generic lifecycle everything that differs
//! between resource kinds: fillable fields and their rules, which fields are
//! searchable, sortable and unique, where the slug comes from, and which media
//! slots exist.

mod resources;

use std::collections::HashMap;

use crate::store::SortField;

pub use resources::{
    ARTICLE, BUILTIN, CATEGORY, CONTACT, PROJECT, SERVICE, SETTING, TAG, TEAM, TESTIMONIAL, USER,
};

/// Computed field holding the slug of [`ResourceSchema::slug_source`].
pub const SLUG_FIELD: &str = "slug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max: usize },
    LongText,
    Email,
    Url,
    Integer { min: i64, max: i64 },
    Boolean,
    /// Id of an Active record of another kind.
    ForeignKey { kind: &'static str },
    Enum { values: &'static [&'static str] },
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Id of the `kind` record that created this one. Taken from the actor on
    /// create, never from input.
    Author { kind: &'static str },
    /// Hashed before persisting, never serialized.
    Password { min: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub searchable: bool,
    pub sortable: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            searchable: false,
            sortable: false,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text { max: 255 })
    }

    pub const fn long_text(name: &'static str) -> Self {
        Self::new(name, FieldKind::LongText)
    }

    pub const fn email(name: &'static str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub const fn url(name: &'static str) -> Self {
        Self::new(name, FieldKind::Url)
    }

    pub const fn integer(name: &'static str, min: i64, max: i64) -> Self {
        Self::new(name, FieldKind::Integer { min, max })
    }

    pub const fn foreign_key(name: &'static str, kind: &'static str) -> Self {
        Self::new(name, FieldKind::ForeignKey { kind })
    }

    pub const fn one_of(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Enum { values })
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub const fn author(name: &'static str, kind: &'static str) -> Self {
        Self::new(name, FieldKind::Author { kind })
    }

    pub const fn password(name: &'static str) -> Self {
        Self::new(name, FieldKind::Password { min: 8 })
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.kind, FieldKind::Password { .. })
    }

    pub fn is_author(&self) -> bool {
        matches!(self.kind, FieldKind::Author { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Integer { .. } | FieldKind::ForeignKey { .. } | FieldKind::Author { .. }
        )
    }

    /// Human-readable name used in validation messages.
    pub fn label(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// Target size of a generated thumbnail. Images are resized to exactly this
/// size; aspect ratio is not preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

/// A named attachment point holding one image and its thumbnail.
#[derive(Debug, Clone, Copy)]
pub struct MediaSlot {
    pub name: &'static str,
    /// Blob key prefix, e.g. `articles/cover`.
    pub folder: &'static str,
    pub thumbnail: ThumbnailSize,
}

/// Permission namespace a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionScope {
    Content,
    Users,
    Settings,
}

impl PermissionScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Users => "users",
            Self::Settings => "settings",
        }
    }

    pub fn read(self) -> String {
        format!("{}:read", self.as_str())
    }

    pub fn write(self) -> String {
        format!("{}:write", self.as_str())
    }

    pub fn purge(self) -> String {
        format!("{}:purge", self.as_str())
    }
}

#[derive(Debug)]
pub struct ResourceSchema {
    /// Stored kind, singular (`article`).
    pub kind: &'static str,
    /// URL segment, plural (`articles`).
    pub route: &'static str,
    pub label: &'static str,
    pub scope: PermissionScope,
    pub fields: &'static [FieldSpec],
    /// Field the computed slug is derived from, if the kind has a slug.
    pub slug_source: Option<&'static str>,
    pub media: &'static [MediaSlot],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn media_slot(&self, name: &str) -> Option<&'static MediaSlot> {
        self.media.iter().find(|m| m.name == name)
    }

    pub fn searchable_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = self
            .fields
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.name)
            .collect();
        if self.slug_source.is_some() {
            fields.push(SLUG_FIELD);
        }
        fields
    }

    /// Fields whose values must be unique among Active records, including the
    /// computed slug.
    pub fn unique_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = self
            .fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| f.name)
            .collect();
        if self.slug_source.is_some() {
            fields.push(SLUG_FIELD);
        }
        fields
    }

    pub fn hidden_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.is_hidden()).map(|f| f.name)
    }

    /// Resolve a client-supplied sort key. `None` for anything not declared
    /// sortable.
    pub fn sort_field(&self, name: &str) -> Option<SortField> {
        match name {
            "id" => Some(SortField::Id),
            "created_at" => Some(SortField::CreatedAt),
            "updated_at" => Some(SortField::UpdatedAt),
            SLUG_FIELD if self.slug_source.is_some() => Some(SortField::Field {
                name: SLUG_FIELD,
                numeric: false,
            }),
            _ => self
                .fields
                .iter()
                .find(|f| f.name == name && f.sortable && !f.is_hidden())
                .map(|f| SortField::Field {
                    name: f.name,
                    numeric: f.is_numeric(),
                }),
        }
    }

    pub fn sortable_names(&self) -> Vec<&'static str> {
        let mut names = vec!["id", "created_at", "updated_at"];
        if self.slug_source.is_some() {
            names.push(SLUG_FIELD);
        }
        names.extend(
            self.fields
                .iter()
                .filter(|f| f.sortable && !f.is_hidden())
                .map(|f| f.name),
        );
        names
    }
}

/// Lookup of schemas by route segment and by kind.
pub struct SchemaRegistry {
    by_route: HashMap<&'static str, &'static ResourceSchema>,
    by_kind: HashMap<&'static str, &'static ResourceSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: &[&'static ResourceSchema]) -> Self {
        Self {
            by_route: schemas.iter().map(|s| (s.route, *s)).collect(),
            by_kind: schemas.iter().map(|s| (s.kind, *s)).collect(),
        }
    }

    /// Registry of every resource the CMS ships with.
    pub fn builtin() -> Self {
        Self::new(BUILTIN)
    }

    pub fn by_route(&self, route: &str) -> Option<&'static ResourceSchema> {
        self.by_route.get(route).copied()
    }

    pub fn by_kind(&self, kind: &str) -> Option<&'static ResourceSchema> {
        self.by_kind.get(kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ResourceSchema> + '_ {
        self.by_kind.values().copied()
    }
}
