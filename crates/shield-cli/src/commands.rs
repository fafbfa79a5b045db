//! Subcommand implementations (SPEC_FULL.md §2.4), grounded in
//! `cybertop.py::getMSPLs`'s per-attack pipeline:
//! parse -> select -> synthesize -> optimize -> project -> emit.

use anyhow::{bail, Context};
use rand::SeedableRng;
use shield_core::{
    config::Config,
    ingest::{file::load_attack, watch_directory},
    load_landscape, load_recipe_directory, project, select_recipe,
    sink::{DashboardContent, DashboardSink, FileSink},
    NodeResolver, Registry,
};
use shield_policy::{optimize, Attack, HsplSet, Landscape, MsplSet, OptimizeConfig, Recipe};
use tracing::{error, info, warn};

use crate::args::{OnceArgs, RunArgs, ValidateArgs};

/// Runs one attack through the full pipeline (parse already done by the
/// caller), returning the emitted HSPL/MSPL pair, or `None` if no recipe or
/// no enforcer could be found for it.
fn process_attack(
    attack: &Attack,
    recipes: &[Recipe],
    landscape: &Landscape,
    registry: &Registry,
    optimize_config: OptimizeConfig,
    limit_config: &shield_core::config::LimitConfig,
    rng: &mut impl rand::Rng,
) -> shield_core::Result<Option<(HsplSet, MsplSet)>> {
    shield_metrics::record_attack_ingested();

    let Some(recipe) = select_recipe(attack, recipes, landscape, registry, |_, _| 0) else {
        warn!(r#type = %attack.r#type, severity = attack.severity, "no recipe mitigates this attack");
        shield_metrics::record_recipe_unmatched();
        return Ok(None);
    };
    shield_metrics::record_recipe_matched();

    let Some(mut hspl_set) = shield_policy::hspl::synthesize(attack, recipe, |tag, value, event| {
        match registry.filter_by_tag(tag) {
            Some(plugin) => plugin.filter(value, event),
            None => {
                if shield_metrics::should_warn_unknown_filter_tag(&recipe.name, tag) {
                    warn!(recipe = %recipe.name, tag, "recipe references unknown filter tag");
                }
                false
            }
        }
    }) else {
        shield_metrics::record_hspl_suppressed_by_filters(1);
        return Ok(None);
    };
    shield_metrics::record_hspl_synthesized(hspl_set.hspls.len() as u64);

    let stats = optimize(&mut hspl_set, optimize_config);
    shield_metrics::record_optimizer_pass(
        stats.included_removed as u64,
        stats.any_port_merged as u64,
        stats.subnet_merged as u64,
    );
    info!(
        initial = stats.initial_count,
        included_removed = stats.included_removed,
        any_port_merged = stats.any_port_merged,
        subnet_merged = stats.subnet_merged,
        final_count = stats.final_count,
        "optimized HSPL set"
    );

    let mspl_set = match project(
        &hspl_set,
        &attack.anomaly_name,
        landscape,
        registry,
        None::<&dyn NodeResolver>,
        limit_config,
        rng,
    ) {
        Ok(mspl_set) => mspl_set,
        Err(shield_core::ShieldError::NoEnforcer) => {
            warn!(r#type = %attack.r#type, severity = attack.severity, "no enforcement node satisfies this HSPL set");
            shield_metrics::record_mspl_no_enforcer();
            return Ok(None);
        }
        Err(err) => return Err(err),
    };
    shield_metrics::record_mspl_projected();

    Ok(Some((hspl_set, mspl_set)))
}

fn build_sink(config: &Config) -> Option<FileSink> {
    config.global.dashboard_file.as_ref().map(|path| FileSink::new(path.clone()))
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = Config::from_file(&args.config).context("loading configuration")?;
    let registry = Registry::with_builtins();
    let recipes = load_recipe_directory(&config.global.recipe_directory).context("loading recipe library")?;
    let landscape = load_landscape(&config.global.landscape_file).context("loading landscape")?;
    let optimize_config = config.optimize_config();
    let sink = build_sink(&config);
    let mut rng = rand::rngs::StdRng::from_entropy();

    let Some(watched_directory) = config.global.watched_directory.clone() else {
        bail!("`watchedDirectory` must be set to run the file watcher");
    };

    info!(directory = %watched_directory.display(), "starting file watcher");
    watch_directory(&watched_directory, move |path| {
        let attack = match load_attack(path, &registry) {
            Ok(attack) => attack,
            Err(err) => {
                shield_metrics::record_attack_parse_failed();
                error!(error = %err, path = %path.display(), "failed to load attack file");
                return true;
            }
        };

        match process_attack(&attack, &recipes, &landscape, &registry, optimize_config, &config.limit, &mut rng) {
            Ok(Some((hspl_set, mspl_set))) => {
                if let Some(sink) = &sink {
                    match sink.publish(DashboardContent::Both(&hspl_set, &mspl_set)) {
                        Ok(()) => shield_metrics::record_dashboard_publish(true),
                        Err(err) => {
                            shield_metrics::record_dashboard_publish(false);
                            error!(error = %err, "failed to publish to dashboard");
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(err) => error!(error = %err, path = %path.display(), "failed to process attack"),
        }
        true
    })?;

    Ok(())
}

pub fn once(args: OnceArgs) -> anyhow::Result<()> {
    let config = Config::from_file(&args.config).context("loading configuration")?;
    let registry = Registry::with_builtins();
    let recipes = load_recipe_directory(&config.global.recipe_directory).context("loading recipe library")?;
    let landscape = load_landscape(&config.global.landscape_file).context("loading landscape")?;
    let optimize_config = config.optimize_config();

    let attack = load_attack(&args.attack_file, &registry).context("loading attack file")?;

    let mut rng = match args.seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_entropy(),
    };

    match process_attack(&attack, &recipes, &landscape, &registry, optimize_config, &config.limit, &mut rng)? {
        Some((hspl_set, mspl_set)) => {
            let hspl_xml = quick_xml::se::to_string(&hspl_set).context("serializing HSPL set")?;
            let mspl_xml = quick_xml::se::to_string(&mspl_set).context("serializing MSPL set")?;
            println!("{hspl_xml}");
            println!("{mspl_xml}");
        }
        None => {
            println!("this attack could not be mitigated (no recipe or no enforcer)");
        }
    }

    Ok(())
}

pub fn validate(args: ValidateArgs) -> anyhow::Result<()> {
    let config = Config::from_file(&args.config).context("loading configuration")?;

    let recipes = load_recipe_directory(&config.global.recipe_directory).context("loading recipe library")?;
    println!("recipe library: {} recipe(s) loaded and schema-validated", recipes.len());

    let landscape = load_landscape(&config.global.landscape_file).context("loading landscape")?;
    println!("landscape: {} IT resource(s) loaded", landscape.len());

    if let Some(watched) = &config.global.watched_directory {
        if !watched.exists() {
            bail!("configured watchedDirectory '{}' does not exist", watched.display());
        }
    }

    Ok(())
}
