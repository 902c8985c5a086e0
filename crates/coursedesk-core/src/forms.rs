// ── Edit forms ──
//
// One form per entity kind. A form is built blank or from a fetched
// entity, edited field by field, validated locally, and finally turned
// into the mutations that persist it.

use chrono::NaiveDateTime;
use serde_json::{Value, json};
use strum::IntoEnumIterator;

use coursedesk_api::Mutation;

use crate::error::CoreError;
use crate::model::{EntityKind, Role, Subject, Task, User, UserStatus};

/// `datetime-local` layout used for due dates.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// One editable field, for generic rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    /// Allowed values; empty for free text.
    pub choices: Vec<String>,
}

impl FormField {
    fn text(name: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            label,
            value: value.into(),
            choices: Vec::new(),
        }
    }

    fn choice<E: IntoEnumIterator + AsRef<str>>(
        name: &'static str,
        label: &'static str,
        value: Option<E>,
    ) -> Self {
        Self {
            name,
            label,
            value: value.map(|v| v.as_ref().to_owned()).unwrap_or_default(),
            choices: E::iter().map(|v| v.as_ref().to_owned()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectForm {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub subject_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub requirements: String,
    /// `YYYY-MM-DDTHH:MM`.
    pub due_date: String,
    pub max_score: Option<u32>,
}

/// Form for whichever kind the open modal edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditForm {
    User(UserForm),
    Subject(SubjectForm),
    Task(TaskForm),
}

impl EditForm {
    pub fn blank(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Users => Self::User(UserForm::default()),
            EntityKind::Subjects => Self::Subject(SubjectForm::default()),
            EntityKind::Tasks => Self::Task(TaskForm::default()),
        }
    }

    /// Prefill from a fetched entity.
    pub fn from_entity(kind: EntityKind, entity: &Value) -> Result<Self, CoreError> {
        let malformed =
            |e: serde_json::Error| CoreError::Internal(format!("malformed {}: {e}", kind.singular()));
        Ok(match kind {
            EntityKind::Users => {
                let user: User = serde_json::from_value(entity.clone()).map_err(malformed)?;
                Self::User(UserForm {
                    role: user.role,
                    status: user.status,
                })
            }
            EntityKind::Subjects => {
                let subject: Subject = serde_json::from_value(entity.clone()).map_err(malformed)?;
                Self::Subject(SubjectForm {
                    name: subject.name,
                    description: subject.description,
                })
            }
            EntityKind::Tasks => {
                let task: Task = serde_json::from_value(entity.clone()).map_err(malformed)?;
                Self::Task(TaskForm {
                    subject_id: task.subject_id,
                    title: task.title,
                    description: task.description,
                    requirements: task.requirements,
                    due_date: task.due_date.as_deref().map(due_date_input).unwrap_or_default(),
                    max_score: task.max_score,
                })
            }
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::Users,
            Self::Subject(_) => EntityKind::Subjects,
            Self::Task(_) => EntityKind::Tasks,
        }
    }

    pub fn fields(&self) -> Vec<FormField> {
        match self {
            Self::User(f) => vec![
                FormField::choice("role", "Role", f.role),
                FormField::choice("status", "Status", f.status),
            ],
            Self::Subject(f) => vec![
                FormField::text("name", "Name", &f.name),
                FormField::text("description", "Description", &f.description),
            ],
            Self::Task(f) => vec![
                FormField::text("subject_id", "Subject ID", opt_text(f.subject_id)),
                FormField::text("title", "Title", &f.title),
                FormField::text("description", "Description", &f.description),
                FormField::text("requirements", "Requirements", &f.requirements),
                FormField::text("due_date", "Due Date", &f.due_date),
                FormField::text("max_score", "Max Score", opt_text(f.max_score)),
            ],
        }
    }

    /// Set one field from its textual value. Empty text clears optional
    /// fields; unknown names and unparseable values are rejected.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        let value = value.trim();
        match self {
            Self::User(f) => match name {
                "role" => f.role = parse_choice(name, value)?,
                "status" => f.status = parse_choice(name, value)?,
                _ => return Err(unknown_field(name)),
            },
            Self::Subject(f) => match name {
                "name" => value.clone_into(&mut f.name),
                "description" => value.clone_into(&mut f.description),
                _ => return Err(unknown_field(name)),
            },
            Self::Task(f) => match name {
                "subject_id" => f.subject_id = parse_number(name, value)?,
                "title" => value.clone_into(&mut f.title),
                "description" => value.clone_into(&mut f.description),
                "requirements" => value.clone_into(&mut f.requirements),
                "due_date" => value.clone_into(&mut f.due_date),
                "max_score" => f.max_score = parse_number(name, value)?,
                _ => return Err(unknown_field(name)),
            },
        }
        Ok(())
    }

    /// Check required fields. Every field of every form is required.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = self
            .fields()
            .into_iter()
            .filter(|field| field.value.trim().is_empty())
            .map(|field| field.label)
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::validation(format!(
                "required: {}",
                missing.join(", ")
            )));
        }
        if let Self::Task(f) = self {
            NaiveDateTime::parse_from_str(&f.due_date, DUE_DATE_FORMAT).map_err(|_| {
                CoreError::validation(format!(
                    "due date must look like 2024-05-01T09:30, got {:?}",
                    f.due_date
                ))
            })?;
        }
        Ok(())
    }

    /// Validate, then build the writes that persist this form. `id` is
    /// `None` for a create.
    pub fn mutations(&self, id: Option<u64>) -> Result<Vec<Mutation>, CoreError> {
        self.validate()?;
        let family = self.kind().family();
        let save = |body: Value| match id {
            Some(id) => Mutation::update(family, id, body),
            None => Mutation::create(family, body),
        };

        match self {
            Self::User(f) => {
                let Some(id) = id else {
                    return Err(CoreError::InvalidState(
                        "users cannot be created from the console".into(),
                    ));
                };
                // validate() guarantees both are set.
                let role = f.role.map(|r| r.as_ref().to_owned()).unwrap_or_default();
                let status = f.status.map(|s| s.as_ref().to_owned()).unwrap_or_default();
                Ok(vec![
                    Mutation::user_role(id, &role),
                    Mutation::user_status(id, &status),
                ])
            }
            Self::Subject(f) => Ok(vec![save(json!({
                "name": f.name,
                "description": f.description,
            }))]),
            Self::Task(f) => Ok(vec![save(json!({
                "subject_id": f.subject_id,
                "title": f.title,
                "description": f.description,
                "requirements": f.requirements,
                "due_date": f.due_date,
                "max_score": f.max_score,
            }))]),
        }
    }
}

/// Server timestamps (`2024-05-01T09:30:00.000Z`) trimmed to the input
/// layout.
fn due_date_input(raw: &str) -> String {
    raw.chars().take(16).collect()
}

fn opt_text<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_choice<E: std::str::FromStr>(name: &str, value: &str) -> Result<Option<E>, CoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| CoreError::validation(format!("{value:?} is not a valid {name}")))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<Option<T>, CoreError> {
    parse_choice(name, value)
}

fn unknown_field(name: &str) -> CoreError {
    CoreError::InvalidInput(format!("unknown field {name:?}"))
}
