//! Ordering, truncation and tweaking of the clustered palette.
//!
//! Entries are kept in ascending order of whatever key was sorted last, so a
//! limit always keeps the tail. The final list is flipped so the most
//! significant entry comes first.

use std::cmp::Ordering;

use log::info;
use strum::{Display, EnumString};

use crate::error::{ExtractError, Result};
use crate::quantize::PaletteEntry;

/// Top of the saturation and value range.
const MAX_COMPONENT: f32 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "kebab-case")]
pub enum SortKey {
    Frequency,
    Saturation,
    #[strum(to_string = "value", serialize = "brightness")]
    Value,
    /// Saturation times value.
    Chroma,
}

impl SortKey {
    fn compare(self, a: &PaletteEntry, b: &PaletteEntry) -> Ordering {
        match self {
            SortKey::Frequency => a.count.cmp(&b.count),
            SortKey::Saturation => a.color.saturation.total_cmp(&b.color.saturation),
            SortKey::Value => a.color.value.total_cmp(&b.color.value),
            SortKey::Chroma => {
                let ca = a.color.saturation * a.color.value;
                let cb = b.color.saturation * b.color.value;
                ca.total_cmp(&cb)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Modification {
    #[strum(to_string = "max-sat")]
    MaxSaturation,
    #[strum(to_string = "max-val")]
    MaxValue,
}

impl Modification {
    fn apply(self, entry: &mut PaletteEntry) {
        match self {
            Modification::MaxSaturation => entry.color.saturation = MAX_COMPONENT,
            Modification::MaxValue => entry.color.value = MAX_COMPONENT,
        }
    }
}

/// One post-processing operation, in the order the user asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sort(SortKey),
    Limit(usize),
    Modify(Modification),
}

/// Run `steps` over `entries` (least frequent first, as returned by
/// [`quantize`](crate::quantize::quantize)) and return the survivors most
/// significant first.
///
/// `reverse` flips every explicit [`Step::Sort`]; the initial frequency order
/// is always ascending, so without a sort the most frequent entries survive.
/// If no [`Step::Limit`] is present, `default_limit` is applied after all
/// steps.
pub fn apply_steps(
    mut entries: Vec<PaletteEntry>,
    steps: &[Step],
    reverse: bool,
    default_limit: usize,
) -> Result<Vec<PaletteEntry>> {
    sort_entries(&mut entries, SortKey::Frequency, false);

    let mut limited = false;
    for step in steps {
        match *step {
            Step::Sort(key) => {
                info!("Sorting by {key}..");
                sort_entries(&mut entries, key, reverse);
            }
            Step::Limit(n) => {
                info!("Limiting to {n} colors..");
                limit_entries(&mut entries, n)?;
                limited = true;
            }
            Step::Modify(m) => {
                info!("Applying mod: {m}");
                entries.iter_mut().for_each(|e| m.apply(e));
            }
        }
    }

    if !limited {
        info!("Limiting to {default_limit} colors..");
        limit_entries(&mut entries, default_limit)?;
    }

    entries.reverse();
    Ok(entries)
}

fn sort_entries(entries: &mut [PaletteEntry], key: SortKey, reverse: bool) {
    if reverse {
        entries.sort_by(|a, b| key.compare(b, a));
    } else {
        entries.sort_by(|a, b| key.compare(a, b));
    }
}

/// Keep the last `n` entries, or all of them if there are fewer.
fn limit_entries(entries: &mut Vec<PaletteEntry>, n: usize) -> Result<()> {
    if n == 0 {
        return Err(ExtractError::InvalidArgument(
            "Desired number of colors must be a positive integer.".to_string(),
        ));
    }
    let start = entries.len().saturating_sub(n);
    entries.drain(..start);
    Ok(())
}
