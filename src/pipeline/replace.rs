//! Ordered literal substitutions.
//!
//! Each pair is a plain (non-regex) replace-all over the result of the
//! previous pair, so later substitutions see what earlier ones produced.

use crate::error::Md2RwError;

/// Replace every `originals[i]` with `replacements[i]`, in list order.
///
/// # Errors
/// [`Md2RwError::SubstitutionMismatch`] when the lists differ in length.
/// Nothing is replaced in that case.
pub fn batch_replace<O, R>(
    text: &str,
    originals: &[O],
    replacements: &[R],
) -> Result<String, Md2RwError>
where
    O: AsRef<str>,
    R: AsRef<str>,
{
    if originals.len() != replacements.len() {
        return Err(Md2RwError::SubstitutionMismatch {
            originals: originals.len(),
            replacements: replacements.len(),
        });
    }

    Ok(originals
        .iter()
        .zip(replacements)
        .fold(text.to_string(), |acc, (from, to)| {
            let from = from.as_ref();
            if from.is_empty() {
                acc
            } else {
                acc.replace(from, to.as_ref())
            }
        }))
}
