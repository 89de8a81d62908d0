use askama::Template;

pub mod error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormKind {
    #[default]
    Registration,
    Authorization,
}

impl FormKind {
    /// Anything but `authorization` renders the registration form.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("authorization") => FormKind::Authorization,
            _ => FormKind::Registration,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormKind::Registration => "Registration",
            FormKind::Authorization => "Authorization",
        }
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, FormKind::Registration)
    }
}

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormTemplate {
    pub kind: FormKind,
}
