//! Query, export and single-record lookup.
//!
//! These drive the same store actions and thunks as the interactive
//! explorer: select the entity, load its attributes and default columns,
//! attach filters and sort, then submit.

use std::fs::File;
use std::io::{self, BufWriter};

use arronax_core::display::raw_value;
use arronax_core::{EntityKind, Explorer, Filter, StoreAction, selectors};

use crate::cli::{ExportArgs, GetArgs, GlobalOpts, OutputFormat, QueryArgs, QueryOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Shared preparation ──────────────────────────────────────────────

/// Load `entity` into the store and run the query described by `opts`.
async fn submit(
    explorer: &Explorer,
    entity: EntityKind,
    opts: &QueryOpts,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    explorer.dispatch(StoreAction::SetEntity(entity));
    explorer.fetch_attributes().await?;
    explorer.fetch_columns();
    let attributes = explorer
        .store()
        .select(|s| s.entity(entity).attributes.clone());

    // 1. Projection
    if opts.all_fields {
        explorer.dispatch(StoreAction::SetColumns {
            entity,
            columns: attributes.to_vec(),
        });
    } else if !opts.fields.is_empty() {
        let columns = opts
            .fields
            .iter()
            .map(|name| util::require_attribute(&attributes, entity, name).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        explorer.dispatch(StoreAction::SetColumns { entity, columns });
    }

    // 2. Filters, one per attribute
    let specs = opts
        .filter
        .iter()
        .map(|raw| util::parse_filter(raw, false))
        .chain(opts.not_filter.iter().map(|raw| util::parse_filter(raw, true)))
        .collect::<Result<Vec<_>, _>>()?;
    for spec in specs {
        util::require_attribute(&attributes, entity, &spec.attribute)?;
        let taken = explorer.store().select(|s| {
            selectors::selected_filters(s)
                .iter()
                .any(|f| f.attribute == spec.attribute)
        });
        if taken {
            return Err(CliError::Validation {
                field: "--filter".into(),
                reason: format!(
                    "'{}' is filtered twice; use between or in for ranges and sets",
                    spec.attribute
                ),
            });
        }

        explorer.dispatch(StoreAction::AddFilter {
            entity,
            filter: Filter {
                attribute: spec.attribute.clone(),
                operator: spec.operator,
                inverse: spec.inverse,
            },
        });
        if !spec.values.is_empty() {
            explorer.dispatch(StoreAction::SetSelectedValue {
                entity,
                attribute: spec.attribute,
                values: spec.values,
            });
        }
    }

    // 3. Sort
    if let Some(ref raw) = opts.sort {
        let sort = util::parse_sort(raw)?;
        util::require_attribute(&attributes, entity, &sort.order_by)?;
        explorer.dispatch(StoreAction::SetSort { entity, sort });
    }

    // 4. Limit
    let limit = opts.limit.unwrap_or(explorer.config().row_count);
    if limit == 0 {
        return Err(CliError::Validation {
            field: "--limit".into(),
            reason: "must be at least 1".into(),
        });
    }
    explorer.dispatch(StoreAction::SetRowCount(limit));

    let spinner = util::spinner(&format!("Querying {entity}..."), global.quiet);
    let result = explorer.submit_query().await;
    spinner.finish_and_clear();
    Ok(result?)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn query(
    explorer: &Explorer,
    args: QueryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity = util::entity_kind(args.entity);
    submit(explorer, entity, &args.query, global).await?;

    let state = explorer.snapshot();
    let items = selectors::items(&state);
    let out = output::render_records(
        global.output,
        selectors::columns(&state),
        items,
        &selectors::primary_key(&state),
    )?;
    output::print_output(&out, global.quiet);

    if global.output == OutputFormat::Table && !global.quiet {
        let more = if selectors::is_full_loaded(&state) {
            ""
        } else {
            " (more available, raise --limit)"
        };
        eprintln!("{} row(s){more}", items.len());
    }
    Ok(())
}

pub async fn export(
    explorer: &Explorer,
    args: ExportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity = util::entity_kind(args.entity);
    submit(explorer, entity, &args.query, global).await?;

    match args.file {
        Some(path) => {
            let rows = explorer.export_csv(BufWriter::new(File::create(&path)?))?;
            if !global.quiet {
                eprintln!("✓ Exported {rows} row(s) to {}", path.display());
            }
        }
        None => {
            explorer.export_csv(io::stdout().lock())?;
        }
    }
    Ok(())
}

pub async fn get(explorer: &Explorer, args: &GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let entity = util::entity_kind(args.entity);
    explorer.dispatch(StoreAction::SetEntity(entity));
    let attributes = explorer.attributes(entity).await?;
    util::require_attribute(&attributes, entity, &args.key)?;

    let item = explorer
        .get_item_by_primary_key(&args.key, &args.value)
        .await?;

    let out = output::render_single(
        global.output,
        &item,
        |i| output::render_record_detail(&attributes, i),
        |i| i.get(&args.key).map(raw_value).unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
