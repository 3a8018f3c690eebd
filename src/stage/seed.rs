//! Seed resolution for the TIPO node.

use rand::Rng;

/// Reserved sentinel: draw a fresh seed, independent of the image seed.
pub const SEED_RANDOM: i64 = -1;

/// Reserved sentinel: mirror the main image seed.
pub const SEED_USE_MAIN: i64 = -2;

/// How the requested TIPO seed is turned into the node's seed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Full sentinel resolution: untoggled mirrors the image seed, `-1`
    /// draws fresh, `-2` mirrors the image seed (drawing fresh when that is
    /// itself random), anything else is used verbatim.
    #[default]
    Resolve,
    /// Forward the requested value untouched and let the backend interpret
    /// its own sentinels.
    Passthrough,
}

/// A resolved seed plus whether the backend should treat it as pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSeed {
    pub value: i64,
    /// When set, the node carries `control_after_generate = "fixed"` so the
    /// backend does not redraw the seed on every queue submission.
    pub locked: bool,
}

/// Resolves the effective TIPO seed.
///
/// `requested` is the raw TIPO seed parameter, `None` when the parameter was
/// left untoggled. Pure over the injected `rng`, so callers can pin the
/// randomness in tests.
pub fn resolve_seed(
    policy: SeedPolicy,
    requested: Option<i64>,
    main_seed: i64,
    rng: &mut impl Rng,
) -> ResolvedSeed {
    match policy {
        SeedPolicy::Passthrough => ResolvedSeed {
            value: requested.unwrap_or(main_seed),
            locked: false,
        },
        SeedPolicy::Resolve => match requested {
            None => ResolvedSeed {
                value: main_seed,
                locked: true,
            },
            Some(SEED_RANDOM) => ResolvedSeed {
                value: fresh(rng),
                locked: false,
            },
            Some(SEED_USE_MAIN) if main_seed == SEED_RANDOM => ResolvedSeed {
                value: fresh(rng),
                locked: true,
            },
            Some(SEED_USE_MAIN) => ResolvedSeed {
                value: main_seed,
                locked: true,
            },
            Some(explicit) => ResolvedSeed {
                value: explicit,
                locked: true,
            },
        },
    }
}

fn fresh(rng: &mut impl Rng) -> i64 {
    rng.random_range(0..i64::from(i32::MAX))
}
