//! User command handlers.

use tabled::Tabled;

use coursedesk_core::{EntityKind, User, encode, view::format_date};

use crate::cli::{GlobalOpts, RoleArg, StatusArg, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, entity};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            token: encode(u.id).to_string(),
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.map(|r| r.to_string()).unwrap_or_default(),
            status: u.status.map(|s| s.to_string()).unwrap_or_default(),
            created: u.created_at.as_deref().map(format_date).unwrap_or_default(),
        }
    }
}

fn detail(u: &User, color: bool) -> String {
    let badge = |value: Option<String>| {
        value.map_or_else(|| "-".into(), |v| output::paint_status(&v, color))
    };
    output::detail_lines(&[
        ("ID", u.id.to_string()),
        ("Token", encode(u.id).to_string()),
        ("Name", format!("{} ({})", u.name, u.initial())),
        ("Email", u.email.clone()),
        ("Role", badge(u.role.map(|r| r.to_string()))),
        ("Status", badge(u.status.map(|s| s.to_string()))),
        (
            "Created",
            u.created_at.as_deref().map_or_else(|| "-".into(), format_date),
        ),
        ("Avatar", u.avatar_url.clone().unwrap_or_else(|| "-".into())),
    ])
}

fn role_value(role: RoleArg) -> &'static str {
    match role {
        RoleArg::Admin => "admin",
        RoleArg::Trainee => "trainee",
    }
}

fn status_value(status: StatusArg) -> &'static str {
    match status {
        StatusArg::Approved => "approved",
        StatusArg::Pending => "pending",
        StatusArg::Rejected => "rejected",
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List(list) => {
            let page = entity::list::<User>(ctx, EntityKind::Users, &list, global).await?;
            let out = output::render_list(&global.output, &page.rows, |u| UserRow::from(u), |u| {
                u.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            entity::footer(&page.view, global);
            Ok(())
        }

        UsersCommand::Get { user } => {
            let found: User = entity::get(ctx, EntityKind::Users, &user).await?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &found,
                |u| detail(u, color),
                |u| u.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Update { user, role, status } => {
            if role.is_none() && status.is_none() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass --role and/or --status".into(),
                });
            }
            let (id, mut form) = entity::edit_form(ctx, EntityKind::Users, &user).await?;
            entity::set_fields(
                &mut form,
                &[
                    ("role", role.map(|r| role_value(r).to_owned())),
                    ("status", status.map(|s| status_value(s).to_owned())),
                ],
            )?;
            entity::save(ctx, &form, Some(id)).await?;
            output::success(global, &format!("User {user} updated"));
            Ok(())
        }

        UsersCommand::Delete { user } => {
            if entity::delete(ctx, EntityKind::Users, &user, global).await? {
                output::success(global, &format!("User {user} deleted"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursedesk_core::{Role, UserStatus};

    fn user() -> User {
        User {
            id: 42,
            name: "ana".into(),
            email: "ana@example.com".into(),
            role: Some(Role::Trainee),
            status: Some(UserStatus::Pending),
            avatar_url: None,
            created_at: None,
        }
    }

    #[test]
    fn row_carries_route_token() {
        let row = UserRow::from(&user());
        assert_eq!(row.token, "NDI=");
        assert_eq!(row.role, "trainee");
        assert_eq!(row.created, "");
    }

    #[test]
    fn detail_shows_initial() {
        let text = detail(&user(), false);
        assert!(text.contains("ana (A)"));
        assert!(text.contains("Status: pending"));
    }
}
