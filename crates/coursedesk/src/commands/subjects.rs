//! Subject command handlers.

use tabled::Tabled;

use coursedesk_core::{EditForm, EntityKind, Subject, encode};

use crate::cli::{GlobalOpts, SubjectsArgs, SubjectsCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, entity};

#[derive(Tabled)]
struct SubjectRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Created By")]
    created_by: String,
}

impl From<&Subject> for SubjectRow {
    fn from(s: &Subject) -> Self {
        Self {
            id: s.id,
            token: encode(s.id).to_string(),
            name: s.name.clone(),
            description: s.description.clone(),
            created_by: s.created_by_name.clone().unwrap_or_default(),
        }
    }
}

fn detail(s: &Subject) -> String {
    output::detail_lines(&[
        ("ID", s.id.to_string()),
        ("Token", encode(s.id).to_string()),
        ("Name", s.name.clone()),
        ("Description", s.description.clone()),
        (
            "Created By",
            s.created_by_name.clone().unwrap_or_else(|| "-".into()),
        ),
    ])
}

pub async fn handle(
    ctx: &Context,
    args: SubjectsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SubjectsCommand::List(list) => {
            let page = entity::list::<Subject>(ctx, EntityKind::Subjects, &list, global).await?;
            let out = output::render_list(&global.output, &page.rows, |s| SubjectRow::from(s), |s| {
                s.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            entity::footer(&page.view, global);
            Ok(())
        }

        SubjectsCommand::Get { subject } => {
            let found: Subject = entity::get(ctx, EntityKind::Subjects, &subject).await?;
            let out = output::render_single(&global.output, &found, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SubjectsCommand::Create { name, description } => {
            let mut form = EditForm::blank(EntityKind::Subjects);
            entity::set_fields(
                &mut form,
                &[("name", Some(name)), ("description", Some(description))],
            )?;
            entity::save(ctx, &form, None).await?;
            output::success(global, "Subject created");
            Ok(())
        }

        SubjectsCommand::Update {
            subject,
            name,
            description,
        } => {
            let (id, mut form) = entity::edit_form(ctx, EntityKind::Subjects, &subject).await?;
            entity::set_fields(&mut form, &[("name", name), ("description", description)])?;
            entity::save(ctx, &form, Some(id)).await?;
            output::success(global, &format!("Subject {subject} updated"));
            Ok(())
        }

        SubjectsCommand::Delete { subject } => {
            if entity::delete(ctx, EntityKind::Subjects, &subject, global).await? {
                output::success(global, &format!("Subject {subject} deleted"));
            }
            Ok(())
        }
    }
}
