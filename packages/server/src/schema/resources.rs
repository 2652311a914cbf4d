use super::{FieldKind, FieldSpec, MediaSlot, PermissionScope, ResourceSchema, ThumbnailSize};

const COVER_THUMBNAIL: ThumbnailSize = ThumbnailSize {
    width: 150,
    height: 93,
};

const AVATAR_THUMBNAIL: ThumbnailSize = ThumbnailSize {
    width: 150,
    height: 150,
};

pub static ARTICLE: ResourceSchema = ResourceSchema {
    kind: "article",
    route: "articles",
    label: "Article",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("title").required().searchable().sortable(),
        FieldSpec::text("excerpt").searchable(),
        FieldSpec::long_text("content").required().searchable(),
        FieldSpec::foreign_key("category_id", "category")
            .required()
            .sortable(),
        FieldSpec::one_of("status", &["draft", "published", "archived"])
            .required()
            .sortable(),
        FieldSpec::date("publication_date").sortable(),
        FieldSpec::author("author_id", "user").sortable(),
    ],
    slug_source: Some("title"),
    media: &[MediaSlot {
        name: "cover",
        folder: "articles/cover",
        thumbnail: COVER_THUMBNAIL,
    }],
};

pub static CATEGORY: ResourceSchema = ResourceSchema {
    kind: "category",
    route: "categories",
    label: "Category",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("name")
            .required()
            .unique()
            .searchable()
            .sortable(),
        FieldSpec::long_text("description").searchable(),
    ],
    slug_source: Some("name"),
    media: &[],
};

pub static TAG: ResourceSchema = ResourceSchema {
    kind: "tag",
    route: "tags",
    label: "Tag",
    scope: PermissionScope::Content,
    fields: &[FieldSpec::text("name")
        .required()
        .unique()
        .searchable()
        .sortable()],
    slug_source: Some("name"),
    media: &[],
};

pub static PROJECT: ResourceSchema = ResourceSchema {
    kind: "project",
    route: "projects",
    label: "Project",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("title").required().searchable().sortable(),
        FieldSpec::long_text("description").required().searchable(),
        FieldSpec::text("client").searchable().sortable(),
        FieldSpec::url("url"),
        FieldSpec::foreign_key("category_id", "category").sortable(),
        FieldSpec::one_of("status", &["planned", "in_progress", "completed"]).sortable(),
    ],
    slug_source: Some("title"),
    media: &[MediaSlot {
        name: "image",
        folder: "projects/image",
        thumbnail: COVER_THUMBNAIL,
    }],
};

pub static SERVICE: ResourceSchema = ResourceSchema {
    kind: "service",
    route: "services",
    label: "Service",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("name")
            .required()
            .unique()
            .searchable()
            .sortable(),
        FieldSpec::long_text("description").required().searchable(),
        FieldSpec::integer("position", 0, 10_000).sortable(),
    ],
    slug_source: Some("name"),
    media: &[MediaSlot {
        name: "icon",
        folder: "services/icon",
        thumbnail: ThumbnailSize {
            width: 64,
            height: 64,
        },
    }],
};

pub static TEAM: ResourceSchema = ResourceSchema {
    kind: "team",
    route: "teams",
    label: "Team member",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("name").required().searchable().sortable(),
        FieldSpec::text("position").required().searchable().sortable(),
        FieldSpec::long_text("bio").searchable(),
        FieldSpec::email("email").unique(),
        FieldSpec::url("linkedin"),
    ],
    slug_source: None,
    media: &[MediaSlot {
        name: "avatar",
        folder: "teams/avatar",
        thumbnail: AVATAR_THUMBNAIL,
    }],
};

pub static TESTIMONIAL: ResourceSchema = ResourceSchema {
    kind: "testimonial",
    route: "testimonials",
    label: "Testimonial",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("client_name")
            .required()
            .searchable()
            .sortable(),
        FieldSpec::text("company").searchable().sortable(),
        FieldSpec::long_text("content").required().searchable(),
        FieldSpec::integer("rating", 1, 5).sortable(),
    ],
    slug_source: None,
    media: &[MediaSlot {
        name: "avatar",
        folder: "testimonials/avatar",
        thumbnail: ThumbnailSize {
            width: 100,
            height: 100,
        },
    }],
};

pub static CONTACT: ResourceSchema = ResourceSchema {
    kind: "contact",
    route: "contacts",
    label: "Contact",
    scope: PermissionScope::Content,
    fields: &[
        FieldSpec::text("name").required().searchable().sortable(),
        FieldSpec::email("email").required().searchable().sortable(),
        FieldSpec::new("phone", FieldKind::Text { max: 32 }),
        FieldSpec::text("subject").searchable().sortable(),
        FieldSpec::long_text("message").required().searchable(),
        FieldSpec::one_of("status", &["new", "read", "replied"]).sortable(),
    ],
    slug_source: None,
    media: &[],
};

pub static USER: ResourceSchema = ResourceSchema {
    kind: "user",
    route: "users",
    label: "User",
    scope: PermissionScope::Users,
    fields: &[
        FieldSpec::text("name").required().searchable().sortable(),
        FieldSpec::email("email")
            .required()
            .unique()
            .searchable()
            .sortable(),
        FieldSpec::password("password").required(),
        FieldSpec::one_of("role", &["admin", "editor"])
            .required()
            .sortable(),
    ],
    slug_source: None,
    media: &[MediaSlot {
        name: "avatar",
        folder: "users/avatar",
        thumbnail: AVATAR_THUMBNAIL,
    }],
};

/// Site-wide key/value settings. Seeded, listed and updated only: settings
/// are not part of the generic resource routes.
pub static SETTING: ResourceSchema = ResourceSchema {
    kind: "setting",
    route: "settings",
    label: "Setting",
    scope: PermissionScope::Settings,
    fields: &[
        FieldSpec::new("key", FieldKind::Text { max: 64 })
            .required()
            .unique()
            .searchable()
            .sortable(),
        FieldSpec::text("label").searchable(),
        FieldSpec::long_text("value").searchable(),
    ],
    slug_source: None,
    media: &[],
};

pub static BUILTIN: &[&ResourceSchema] = &[
    &ARTICLE,
    &CATEGORY,
    &TAG,
    &PROJECT,
    &SERVICE,
    &TEAM,
    &TESTIMONIAL,
    &CONTACT,
    &USER,
];
