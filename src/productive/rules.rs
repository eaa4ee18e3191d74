//! Per-resource-type filtering rules
//!
//! Everything the filter engine knows about a particular resource type lives
//! in the [`RULES`] table. Supporting a new type means adding a row here.

/// Attributes dropped from every resource type
pub const GLOBAL_DENY_ATTRIBUTES: &[&str] = &[
    "creation_method_id",
    "email_key",
    "placement",
    "position",
    "preferences",
    "settings",
];

/// Lightweight attributes used for types without their own row
pub const DEFAULT_LIGHTWEIGHT_ATTRIBUTES: &[&str] = &[
    "name",
    "title",
    "status",
    "due_date",
    "created_at",
    "updated_at",
];

/// Attribute names that are never part of lightweight output
pub const DESCRIPTION_ATTRIBUTES: &[&str] = &["description", "body", "content", "notes"];

/// Path template for the user-facing web link of a resource.
///
/// Paths are relative to `<webapp base>/<organization id>` and may use the
/// `{id}` and `{parent}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct LinkTemplate {
    /// Path used when the resource stands on its own
    pub path: Option<&'static str>,

    /// Relationship naming the parent, and the path used when it resolves
    pub nested: Option<(&'static str, &'static str)>,
}

/// Filtering rules for one resource type
#[derive(Debug, Clone, Copy)]
pub struct ResourceRules {
    pub resource_type: &'static str,

    /// Attributes removed in full mode, on top of [`GLOBAL_DENY_ATTRIBUTES`]
    pub deny_attributes: &'static [&'static str],

    /// Attributes carrying HTML
    pub html_attributes: &'static [&'static str],

    /// Relationships kept in full mode; `None` keeps all of them
    pub relationships: Option<&'static [&'static str]>,

    /// The only attributes kept in lightweight mode
    pub lightweight_attributes: &'static [&'static str],

    pub link: Option<LinkTemplate>,

    /// Relationship to a person whose name becomes the `actor` attribute
    /// in lightweight mode
    pub actor_relationship: Option<&'static str>,

    /// Attributes joined into the lightweight `summary` attribute
    pub summary_attributes: &'static [&'static str],
}

impl ResourceRules {
    const fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            deny_attributes: &[],
            html_attributes: &[],
            relationships: None,
            lightweight_attributes: DEFAULT_LIGHTWEIGHT_ATTRIBUTES,
            link: None,
            actor_relationship: None,
            summary_attributes: &[],
        }
    }

    /// Whether `name` is removed in full mode
    pub fn denies(&self, name: &str) -> bool {
        GLOBAL_DENY_ATTRIBUTES.contains(&name) || self.deny_attributes.contains(&name)
    }

    /// Whether `name` carries HTML
    pub fn is_html(&self, name: &str) -> bool {
        self.html_attributes.contains(&name)
    }

    /// Whether `name` survives lightweight mode
    pub fn keeps_lightweight(&self, name: &str) -> bool {
        self.lightweight_attributes.contains(&name) && !DESCRIPTION_ATTRIBUTES.contains(&name)
    }

    /// Whether relationship `name` survives full mode
    pub fn keeps_relationship(&self, name: &str) -> bool {
        match self.relationships {
            None => true,
            Some(allowed) => allowed.contains(&name),
        }
    }
}

/// Rules for every known resource type
pub static RULES: &[ResourceRules] = &[
    ResourceRules {
        deny_attributes: &["project_color_id", "sample_data", "tag_colors"],
        lightweight_attributes: &[
            "name",
            "project_number",
            "archived_at",
            "last_activity_at",
            "created_at",
        ],
        link: Some(LinkTemplate {
            path: Some("/projects/{id}"),
            nested: None,
        }),
        ..ResourceRules::new("projects")
    },
    ResourceRules {
        deny_attributes: &[
            "task_list_position",
            "repeat_on_interval",
            "repeat_on_monthday",
            "repeat_on_weekday",
            "repeat_on_date",
            "repeat_origin_id",
            "repeat_schedule_id",
            "type_id",
        ],
        html_attributes: &["description"],
        lightweight_attributes: &[
            "title",
            "task_number",
            "status",
            "closed",
            "closed_at",
            "due_date",
            "start_date",
            "last_activity_at",
            "created_at",
        ],
        link: Some(LinkTemplate {
            path: Some("/tasks/task/{id}"),
            nested: Some(("project", "/projects/{parent}/tasks/task/{id}")),
        }),
        ..ResourceRules::new("tasks")
    },
    ResourceRules {
        deny_attributes: &["draft", "hidden"],
        html_attributes: &["body"],
        lightweight_attributes: &["commentable_type", "created_at", "edited_at"],
        link: Some(LinkTemplate {
            path: None,
            nested: Some(("task", "/tasks/task/{parent}")),
        }),
        ..ResourceRules::new("comments")
    },
    ResourceRules {
        html_attributes: &["description"],
        lightweight_attributes: &["closed", "closed_at", "due_date", "created_at"],
        link: Some(LinkTemplate {
            path: None,
            nested: Some(("task", "/tasks/task/{parent}")),
        }),
        ..ResourceRules::new("todos")
    },
    ResourceRules {
        deny_attributes: &["cover_image_meta", "cover_image_url", "version_number"],
        lightweight_attributes: &["title", "created_at", "updated_at", "edited_at"],
        link: Some(LinkTemplate {
            path: Some("/docs/doc/{id}"),
            nested: None,
        }),
        ..ResourceRules::new("pages")
    },
    ResourceRules {
        deny_attributes: &["thumb", "temp_url"],
        lightweight_attributes: &["name", "content_type", "size", "created_at"],
        ..ResourceRules::new("attachments")
    },
    ResourceRules {
        html_attributes: &["body"],
        lightweight_attributes: &[
            "event",
            "item_type",
            "item_id",
            "item_name",
            "parent_type",
            "parent_name",
            "root_type",
            "root_name",
            "created_at",
            "actor",
            "summary",
        ],
        actor_relationship: Some("creator"),
        summary_attributes: &["event", "item_type", "item_name"],
        ..ResourceRules::new("activities")
    },
    ResourceRules {
        lightweight_attributes: &["name"],
        ..ResourceRules::new("organizations")
    },
    ResourceRules {
        deny_attributes: &["avatar_url", "invited_at", "joined_at", "autologin_token"],
        lightweight_attributes: &["first_name", "last_name", "title"],
        link: Some(LinkTemplate {
            path: Some("/people/{id}"),
            nested: None,
        }),
        ..ResourceRules::new("people")
    },
    ResourceRules {
        deny_attributes: &["avatar_url"],
        lightweight_attributes: &["name", "company_code", "created_at"],
        link: Some(LinkTemplate {
            path: Some("/companies/{id}"),
            nested: None,
        }),
        ..ResourceRules::new("companies")
    },
];

static DEFAULT_RULES: ResourceRules = ResourceRules::new("");

/// Look up the rules for a resource type, falling back to permissive defaults
pub fn rules_for(resource_type: &str) -> &'static ResourceRules {
    RULES
        .iter()
        .find(|rules| rules.resource_type == resource_type)
        .unwrap_or(&DEFAULT_RULES)
}
