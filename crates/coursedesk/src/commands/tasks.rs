//! Task command handlers.

use tabled::Tabled;

use coursedesk_core::{EditForm, EntityKind, Task, encode, view::format_date};

use crate::cli::{GlobalOpts, TaskFields, TasksArgs, TasksCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, entity};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Due Date")]
    due: String,
    #[tabled(rename = "Score")]
    score: String,
}

impl From<&Task> for TaskRow {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id,
            token: encode(t.id).to_string(),
            title: t.title.clone(),
            subject: t.subject_name.clone().unwrap_or_default(),
            due: t.due_date.as_deref().map(format_date).unwrap_or_default(),
            score: t.max_score.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

fn detail(t: &Task) -> String {
    let dash = || "-".to_owned();
    output::detail_lines(&[
        ("ID", t.id.to_string()),
        ("Token", encode(t.id).to_string()),
        ("Title", t.title.clone()),
        (
            "Subject",
            match (&t.subject_name, t.subject_id) {
                (Some(name), Some(id)) => format!("{name} (#{id})"),
                (Some(name), None) => name.clone(),
                (None, Some(id)) => format!("#{id}"),
                (None, None) => dash(),
            },
        ),
        ("Due Date", t.due_date.as_deref().map_or_else(dash, format_date)),
        ("Max Score", t.max_score.map_or_else(dash, |s| s.to_string())),
        ("Description", t.description.clone()),
        ("Requirements", t.requirements.clone()),
    ])
}

fn field_values(fields: TaskFields) -> [(&'static str, Option<String>); 6] {
    [
        ("subject_id", fields.subject_id.map(|v| v.to_string())),
        ("title", fields.title),
        ("description", fields.description),
        ("requirements", fields.requirements),
        ("due_date", fields.due_date),
        ("max_score", fields.max_score.map(|v| v.to_string())),
    ]
}

pub async fn handle(ctx: &Context, args: TasksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TasksCommand::List(list) => {
            let page = entity::list::<Task>(ctx, EntityKind::Tasks, &list, global).await?;
            let out = output::render_list(&global.output, &page.rows, |t| TaskRow::from(t), |t| {
                t.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            entity::footer(&page.view, global);
            Ok(())
        }

        TasksCommand::Get { task } => {
            let found: Task = entity::get(ctx, EntityKind::Tasks, &task).await?;
            let out = output::render_single(&global.output, &found, detail, |t| t.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TasksCommand::Create(fields) => {
            let mut form = EditForm::blank(EntityKind::Tasks);
            entity::set_fields(&mut form, &field_values(fields))?;
            entity::save(ctx, &form, None).await?;
            output::success(global, "Task created");
            Ok(())
        }

        TasksCommand::Update { task, fields } => {
            let (id, mut form) = entity::edit_form(ctx, EntityKind::Tasks, &task).await?;
            entity::set_fields(&mut form, &field_values(fields))?;
            entity::save(ctx, &form, Some(id)).await?;
            output::success(global, &format!("Task {task} updated"));
            Ok(())
        }

        TasksCommand::Delete { task } => {
            if entity::delete(ctx, EntityKind::Tasks, &task, global).await? {
                output::success(global, &format!("Task {task} deleted"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_skipped() {
        let values = field_values(TaskFields {
            subject_id: Some(3),
            title: None,
            description: None,
            requirements: None,
            due_date: Some("2025-01-02T10:00".into()),
            max_score: None,
        });
        assert_eq!(values[0], ("subject_id", Some("3".to_owned())));
        assert_eq!(values[1], ("title", None));
        assert_eq!(values[4].1.as_deref(), Some("2025-01-02T10:00"));
    }
}
