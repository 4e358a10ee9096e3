//! Model view descriptors.
//!
//! Each entity exposed in the admin gets one static `ModelView` naming its
//! table, which columns are listed, which fields the create/edit form carries
//! and how list cells are rendered. The generic handlers in
//! `handlers::model_handlers` and the queries in `services::model_service`
//! are driven entirely by these descriptors. Table and column names only ever
//! come from here, never from the request.

/// How a list cell is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormatter {
    /// Plain text.
    Text,
    /// Stored file reference shown as an inline `<img>`, nothing when empty.
    Image,
}

/// Form widget for an editable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    /// File upload; the column stores the upload's URL path.
    File,
}

#[derive(Debug, Clone, Copy)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: false,
        }
    }

    const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: true,
        }
    }

    const fn textarea(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::TextArea,
            required: false,
        }
    }

    const fn file(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::File,
            required: false,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FieldKind::File
    }

    pub fn is_textarea(&self) -> bool {
        self.kind == FieldKind::TextArea
    }
}

#[derive(Debug)]
pub struct ModelView {
    /// URL segment under `/admin/`.
    pub name: &'static str,
    /// Menu label.
    pub label: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Columns shown in the list, primary key included when displayed.
    pub column_list: &'static [&'static str],
    pub form_fields: &'static [FormField],
    pub formatters: &'static [(&'static str, ColumnFormatter)],
    pub can_create: bool,
}

impl ModelView {
    pub fn formatter(&self, column: &str) -> ColumnFormatter {
        self.formatters
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, f)| *f)
            .unwrap_or(ColumnFormatter::Text)
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.form_fields.iter().find(|f| f.name == name)
    }
}

pub static BAN_VIEW: ModelView = ModelView {
    name: "ban",
    label: "Bans",
    table: "bans",
    primary_key: "id",
    column_list: &["id", "address", "reason", "created_at"],
    form_fields: &[FormField::required("address"), FormField::text("reason")],
    formatters: &[],
    can_create: true,
};

pub static USER_VIEW: ModelView = ModelView {
    name: "user",
    label: "Users",
    table: "users",
    primary_key: "id",
    column_list: &["id", "login", "email"],
    form_fields: &[FormField::required("login"), FormField::text("email")],
    formatters: &[],
    can_create: false,
};

pub static CONFIG_VIEW: ModelView = ModelView {
    name: "configpair",
    label: "Config",
    table: "config_pairs",
    primary_key: "key",
    column_list: &["key", "value"],
    form_fields: &[FormField::required("value")],
    formatters: &[],
    can_create: false,
};

pub static VERIFIED_TRIPCODE_VIEW: ModelView = ModelView {
    name: "verifiedtripcode",
    label: "Verified tripcodes",
    table: "verified_tripcodes",
    primary_key: "id",
    column_list: &["id", "tripcode"],
    form_fields: &[FormField::required("tripcode")],
    formatters: &[],
    can_create: true,
};

pub static POST_VIEW: ModelView = ModelView {
    name: "post",
    label: "Posts",
    table: "posts",
    primary_key: "id",
    column_list: &["id", "name", "message", "thumbnail", "created_at"],
    form_fields: &[
        FormField::text("name"),
        FormField::textarea("message"),
        FormField::text("thumbnail"),
        FormField::file("image"),
    ],
    formatters: &[("thumbnail", ColumnFormatter::Image)],
    can_create: true,
};

pub static BANNER_VIEW: ModelView = ModelView {
    name: "banner",
    label: "Banners",
    table: "banners",
    primary_key: "id",
    column_list: &["id", "src"],
    form_fields: &[FormField::file("src")],
    formatters: &[("src", ColumnFormatter::Image)],
    can_create: true,
};

/// Every view, in menu order.
pub static VIEWS: [&ModelView; 6] = [
    &BAN_VIEW,
    &USER_VIEW,
    &CONFIG_VIEW,
    &VERIFIED_TRIPCODE_VIEW,
    &POST_VIEW,
    &BANNER_VIEW,
];

pub fn find_view(name: &str) -> Option<&'static ModelView> {
    VIEWS.iter().copied().find(|v| v.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_formatters_are_per_column() {
        assert_eq!(BANNER_VIEW.formatter("src"), ColumnFormatter::Image);
        assert_eq!(POST_VIEW.formatter("thumbnail"), ColumnFormatter::Image);
        assert_eq!(POST_VIEW.formatter("message"), ColumnFormatter::Text);
        assert_eq!(BAN_VIEW.formatter("address"), ColumnFormatter::Text);
    }

    #[test]
    fn config_view_only_edits_value() {
        assert!(!CONFIG_VIEW.can_create);
        assert_eq!(CONFIG_VIEW.column_list, &["key", "value"]);
        let names: Vec<_> = CONFIG_VIEW.form_fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["value"]);
    }

    #[test]
    fn registry_names_are_unique_and_resolvable() {
        for view in VIEWS {
            assert!(std::ptr::eq(find_view(view.name).unwrap(), view));
            assert!(
                view.column_list.contains(&view.primary_key),
                "{} hides its primary key",
                view.name
            );
        }
        assert!(find_view("sessions").is_none());
    }
}
