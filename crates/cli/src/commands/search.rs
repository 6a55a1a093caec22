use anyhow::Context;
use clap::Args;

use techshop_core::config::{ConfigOverrides, LoadOptions};
use techshop_core::render::{RenderSettings, ReplyFormat, ReplyRenderer};
use techshop_core::search::{
    FilterResolver, FilterSet, PlanError, PlanOptions, SearchPlan, SlotInput, UnparsedSpec,
};
use techshop_db::{CatalogRepository, SqlCatalogRepository};

use crate::commands::{load_config, migrated_pool, runtime, CommandResult, StepFailure};

/// Filters accepted by `techshop search`. Values go through the same parsing
/// as chat slots, so `--max-price "5 triệu"` and `--min-storage 1TB` work.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub min_price: Option<String>,
    #[arg(long)]
    pub max_price: Option<String>,
    #[arg(long)]
    pub min_ram: Option<String>,
    #[arg(long)]
    pub max_ram: Option<String>,
    #[arg(long)]
    pub min_storage: Option<String>,
    #[arg(long)]
    pub max_storage: Option<String>,
    #[arg(long)]
    pub min_battery: Option<String>,
    /// cheap, expensive, low_ram, high_ram, high_storage or high_battery. Repeatable.
    #[arg(long = "qualifier")]
    pub qualifiers: Vec<String>,
    #[arg(long)]
    pub limit: Option<usize>,
    /// How variants with an unreadable spec face an active bound.
    #[arg(long, value_parser = parse_unparsed)]
    pub unparsed: Option<UnparsedSpec>,
    /// Append the query pipeline to the output.
    #[arg(long)]
    pub explain: bool,
}

impl SearchArgs {
    fn slot_input(&self) -> SlotInput {
        SlotInput {
            category: self.category.clone(),
            brand: self.brand.clone(),
            min_price: self.min_price.clone(),
            max_price: self.max_price.clone(),
            min_ram: self.min_ram.clone(),
            max_ram: self.max_ram.clone(),
            min_storage: self.min_storage.clone(),
            max_storage: self.max_storage.clone(),
            min_battery: self.min_battery.clone(),
            qualifiers: self.qualifiers.clone(),
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            result_limit: self.limit,
            unparsed_spec: self.unparsed,
            reply_format: Some(ReplyFormat::Text),
            ..ConfigOverrides::default()
        }
    }
}

fn parse_unparsed(value: &str) -> Result<UnparsedSpec, String> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "exclude" => Ok(UnparsedSpec::Exclude),
        "include" => Ok(UnparsedSpec::Include),
        "treat_as_zero" => Ok(UnparsedSpec::TreatAsZero),
        other => Err(format!("`{other}` is not one of exclude, include, treat_as_zero")),
    }
}

struct SearchReport {
    reply: String,
    unresolved_brand: Option<String>,
    pipeline: Option<String>,
}

impl SearchReport {
    fn message(&self) -> String {
        let mut sections = vec![self.reply.clone()];
        if let Some(brand) = &self.unresolved_brand {
            sections.push(format!("note: brand `{brand}` was not found and was ignored"));
        }
        if let Some(pipeline) = &self.pipeline {
            sections.push(format!("pipeline:\n{pipeline}"));
        }
        sections.join("\n\n")
    }
}

pub fn run(args: &SearchArgs) -> CommandResult {
    let options = LoadOptions { overrides: args.overrides(), ..LoadOptions::default() };
    let config = match load_config("search", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("search") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let renderer = match ReplyRenderer::new(RenderSettings::from(&config)) {
        Ok(renderer) => renderer,
        Err(error) => return CommandResult::failure("search", "render_init", error.to_string(), 3),
    };
    let resolver = FilterResolver::new(config.search.thresholds.clone());
    let plan_options =
        PlanOptions { limit: config.search.result_limit, unparsed: config.search.unparsed_spec };

    let filters = resolver.resolve(&args.slot_input());
    if filters.is_empty() {
        return plan_failure(PlanError::InsufficientFilter);
    }

    let result: Result<_, StepFailure> = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let catalog = SqlCatalogRepository::new(pool.clone());
        let outcome = execute(&catalog, &renderer, &filters, &plan_options, args.explain).await;
        pool.close().await;
        outcome.map_err(|error| ("search_execution", format!("{error:#}"), 5u8))
    });

    match result {
        Ok(Ok(report)) => CommandResult::success("search", report.message()),
        Ok(Err(plan_error)) => plan_failure(plan_error),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("search", error_class, message, exit_code)
        }
    }
}

/// Resolve, plan, query and render. A plan error is an expected outcome, not a failure.
async fn execute(
    catalog: &dyn CatalogRepository,
    renderer: &ReplyRenderer,
    filters: &FilterSet,
    options: &PlanOptions,
    explain: bool,
) -> anyhow::Result<Result<SearchReport, PlanError>> {
    let resolution = catalog.resolve_names(filters).await.context("resolving category and brand")?;
    let plan = match SearchPlan::from_filters(filters, &resolution, options) {
        Ok(plan) => plan,
        Err(error) => return Ok(Err(error)),
    };

    let records = catalog.search(&plan).await.context("querying the catalog")?;
    let reply = renderer.render_variants(&records).context("rendering the reply")?;
    let pipeline =
        if explain { Some(serde_json::to_string_pretty(&plan.to_pipeline())?) } else { None };

    Ok(Ok(SearchReport {
        reply,
        unresolved_brand: plan.unresolved_brand().map(str::to_string),
        pipeline,
    }))
}

fn plan_failure(error: PlanError) -> CommandResult {
    let error_class = match error {
        PlanError::InsufficientFilter => "insufficient_filter",
        PlanError::CategoryNotFound { .. } => "category_not_found",
        PlanError::BrandNotFound { .. } => "brand_not_found",
    };
    CommandResult::failure("search", error_class, error.to_string(), 2)
}
