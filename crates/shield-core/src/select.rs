//! Recipe selection (spec §4.2 steps 1-6), grounded in
//! `original_source/cybertop/recipes.py::__getBestRecipe` for steps 2-3/5-6
//! and in spec.md's textual algorithm for the over-restrictiveness filter
//! (step 4), which the retrieved `recipes.py` does not show.

use shield_policy::{Attack, Landscape, Recipe};

use crate::registry::Registry;

/// One recipe still in play, paired with the best-scoring eligible action
/// plug-in found for it in step 3 (spec §4.2 step 5: "pick the recipe whose
/// matching plug-in has the maximum score").
struct Candidate<'a> {
    recipe: &'a Recipe,
    score: u32,
    declaration_order: usize,
}

/// Picks the single recipe that mitigates `attack`, or `None` if no recipe
/// survives every filter (spec §4.2 step 6).
///
/// `scores` looks up the declared score for `(recipe-name, action-plugin-id)`
/// pairs; recipes/plug-ins without a declared score fall back to `0`, the
/// same default the original's ini-backed `pluginScore` option uses.
pub fn select_recipe<'a>(
    attack: &Attack,
    recipes: &'a [Recipe],
    landscape: &Landscape,
    registry: &Registry,
    score_of: impl Fn(&str, &str) -> u32,
) -> Option<&'a Recipe> {
    let mut candidates = Vec::new();

    for (declaration_order, recipe) in recipes.iter().enumerate() {
        // Step 2: candidate set.
        if !recipe.matches(&attack.r#type, attack.severity) {
            continue;
        }

        // Step 3: enforceability filter.
        let best_eligible_score = registry
            .actions_for(&recipe.action)
            .filter(|plugin| landscape.has_node_satisfying(plugin.capabilities()))
            .map(|plugin| score_of(&recipe.name, plugin.id()))
            .max();
        let Some(score) = best_eligible_score else {
            continue;
        };

        // Step 4: over-restrictiveness filter.
        if is_over_restrictive(recipe, attack, registry) {
            continue;
        }

        candidates.push(Candidate {
            recipe,
            score,
            declaration_order,
        });
    }

    // Step 5: pick by score, ties broken by declaration order.
    candidates
        .into_iter()
        .max_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then(b.declaration_order.cmp(&a.declaration_order))
        })
        .map(|c| c.recipe)
}

/// A recipe is over-restrictive (and must be dropped) iff *every* event
/// would be rejected by its filters — i.e. no event survives to be
/// mitigated (spec §4.2 step 4: "survives iff at least one event ... fails
/// its filters block").
///
/// A `<filters>` element with zero predicate children is a reachable recipe
/// shape; `all()`/`any()` over an empty predicate list vacuously agree with
/// `hspl.rs::event_passes_filters`'s explicit empty-predicates case (`and`
/// passes every event, `or` passes none), so this must not special-case
/// emptiness separately — doing so let `select_recipe` and `synthesize`
/// disagree about whether an empty-`or`-filters recipe can ever fire.
fn is_over_restrictive(recipe: &Recipe, attack: &Attack, registry: &Registry) -> bool {
    let Some(filters) = &recipe.filters else {
        return false;
    };
    attack.events.iter().all(|event| {
        let passes = match recipe.filters.as_ref().map(|f| f.evaluation) {
            Some(shield_policy::Evaluation::And) => filters.predicates.iter().all(|(tag, value)| {
                apply_filter(registry, &recipe.name, tag, value, event)
            }),
            _ => filters.predicates.iter().any(|(tag, value)| {
                apply_filter(registry, &recipe.name, tag, value, event)
            }),
        };
        !passes
    })
}

/// Looks up `tag`'s filter plug-in and applies it, warning once per
/// (recipe, tag) the first time a recipe references a tag with no
/// registered plug-in (an unknown tag otherwise fails silently).
fn apply_filter(
    registry: &Registry,
    recipe_name: &str,
    tag: &str,
    value: &str,
    event: &shield_policy::AttackEvent,
) -> bool {
    match registry.filter_by_tag(tag) {
        Some(plugin) => plugin.filter(value, event),
        None => {
            if shield_metrics::should_warn_unknown_filter_tag(recipe_name, tag) {
                tracing::warn!(recipe = recipe_name, tag, "recipe references unknown filter tag");
            }
            false
        }
    }
}
