//! Operations shared by the users, subjects and tasks handlers.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use coursedesk_core::{
    EditForm, EntityKind, FilterDiscipline, Listing, Location, MemoryLocation, Mutation, Payload,
    TableStatePatch, TableView, parse_id_or_token,
};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;

use super::{Context, util};

/// One fetched page, typed, plus the view it was rendered from.
pub struct Page<T> {
    pub rows: Vec<T>,
    pub view: TableView,
}

// ── List ─────────────────────────────────────────────────────────────

/// Fetch one page of `kind` the way its listing screen would.
pub async fn list<T: DeserializeOwned>(
    ctx: &Context,
    kind: EntityKind,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<Page<T>, CliError> {
    let location = args.query.as_deref().map(|q| {
        let route = format!("{}?{}", kind.route(), q.trim_start_matches('?'));
        Arc::new(MemoryLocation::parse(&route)) as Arc<dyn Location>
    });
    let discipline = if args.client_side {
        FilterDiscipline::Client
    } else {
        ctx.config.discipline
    };
    let page_size = args.page_size.unwrap_or(ctx.config.page_size);
    let listing = Listing::new(kind, ctx.client.clone(), discipline, page_size, location);

    let patch = list_patch(args)?;
    let bar = util::spinner(global, format!("Loading {}", kind.family()));
    let result = listing.apply(patch).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    if let Some(err) = result.error {
        return Err(err.into());
    }

    let view = listing.view();
    let rows = view
        .rows
        .iter()
        .map(|row| serde_json::from_value(row.raw.clone()))
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page { rows, view })
}

/// Flags on top of whatever `--query` set. New filters start over at page 1
/// unless `--page` says otherwise.
fn list_patch(args: &ListArgs) -> Result<TableStatePatch, CliError> {
    let mut patch = TableStatePatch::default();
    if !args.filter.is_empty() {
        let filters = args
            .filter
            .iter()
            .map(|f| util::parse_filter(f))
            .collect::<Result<Vec<_>, _>>()?;
        patch.filters = Some(filters);
        patch.page = Some(1);
    }
    if !args.sort.is_empty() {
        let sorters = args
            .sort
            .iter()
            .map(|s| util::parse_sort(s))
            .collect::<Result<Vec<_>, _>>()?;
        patch.sorters = Some(sorters);
    }
    if let Some(page) = args.page {
        patch.page = Some(page);
    }
    Ok(patch)
}

/// Paging summary on stderr, or the empty message, for table output.
pub fn footer(view: &TableView, global: &GlobalOpts) {
    if global.quiet || !matches!(global.output, OutputFormat::Table) {
        return;
    }
    if view.is_empty() {
        eprintln!("{}", view.empty_message());
    } else {
        eprintln!(
            "Page {} of {} ({} {})",
            view.current_page(),
            view.last_page(),
            view.total_records(),
            view.kind.family()
        );
    }
}

// ── Single entity ────────────────────────────────────────────────────

/// `GET /admin/{family}/{id}` for an id or token.
pub async fn get_raw(
    ctx: &Context,
    kind: EntityKind,
    identifier: &str,
) -> Result<(u64, serde_json::Value), CliError> {
    let id = parse_id_or_token(identifier)?;
    let normalized = ctx
        .client
        .fetch(&kind.entity_endpoint(id), None)
        .await
        .map_err(coursedesk_core::CoreError::from)?;
    match normalized.data {
        Some(Payload::Single(value)) => Ok((id, value)),
        _ => Err(CliError::NotFound {
            message: format!("{} {identifier} not found", kind.singular()),
            list_command: format!("{} list", kind.family()),
        }),
    }
}

pub async fn get<T: DeserializeOwned>(
    ctx: &Context,
    kind: EntityKind,
    identifier: &str,
) -> Result<T, CliError> {
    let (_, value) = get_raw(ctx, kind, identifier).await?;
    Ok(serde_json::from_value(value)?)
}

/// Load the current entity into its edit form.
pub async fn edit_form(
    ctx: &Context,
    kind: EntityKind,
    identifier: &str,
) -> Result<(u64, EditForm), CliError> {
    let (id, value) = get_raw(ctx, kind, identifier).await?;
    Ok((id, EditForm::from_entity(kind, &value)?))
}

// ── Writes ───────────────────────────────────────────────────────────

/// Validate the form and send its writes. `id` is `None` for a create.
pub async fn save(ctx: &Context, form: &EditForm, id: Option<u64>) -> Result<(), CliError> {
    let mutations = form.mutations(id)?;
    ctx.mutator.mutate_all(&mutations).await?;
    Ok(())
}

/// Confirm, then delete. Returns `false` if the user declined.
pub async fn delete(
    ctx: &Context,
    kind: EntityKind,
    identifier: &str,
    global: &GlobalOpts,
) -> Result<bool, CliError> {
    let id = parse_id_or_token(identifier)?;
    if !util::confirm(&format!("Delete {} {identifier}?", kind.singular()), global.yes)? {
        return Ok(false);
    }
    ctx.mutator
        .mutate(&Mutation::delete(kind.family(), id))
        .await?;
    Ok(true)
}

/// Apply `(field, value)` pairs, skipping the ones not given.
pub fn set_fields(form: &mut EditForm, fields: &[(&str, Option<String>)]) -> Result<(), CliError> {
    for (name, value) in fields {
        if let Some(value) = value {
            form.set_field(name, value)?;
        }
    }
    Ok(())
}
