use alephium_multisig_coordinator_domain::{descriptor::MultisigDescriptor, tx::UnlockScript};

/// More than one known descriptor could have produced an unlock script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unlock script matches several multisig descriptors: {}", candidates.join(", "))]
pub struct AmbiguousMatch {
    /// The names of every matching descriptor.
    pub candidates: Vec<String>,
}

/// Finds the descriptor that produced `script` among `known`.
///
/// Returns `Ok(None)` when no descriptor matches.
///
/// # Errors
///
/// [`AmbiguousMatch`] when several descriptors match.
pub fn match_descriptor<'a, AUX>(
    script: &UnlockScript,
    known: &'a [MultisigDescriptor<AUX>],
) -> Result<Option<&'a MultisigDescriptor<AUX>>, AmbiguousMatch> {
    let mut matches = known.iter().filter(|descriptor| descriptor.matches_unlock_script(script));

    let Some(first) = matches.next() else {
        return Ok(None);
    };

    let rest: Vec<_> = matches.map(|d| d.name().to_owned()).collect();
    if rest.is_empty() {
        return Ok(Some(first));
    }

    let candidates = core::iter::once(first.name().to_owned()).chain(rest).collect();
    tracing::warn!(?candidates, "ambiguous multisig descriptor match");

    Err(AmbiguousMatch { candidates })
}
