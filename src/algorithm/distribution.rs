//! Spatial distribution binning
//!
//! Bins object coordinates along anatomical axes into fixed-width bins,
//! optionally re-centered on the animal's injection site, and normalizes the
//! bin counts so that distributions are comparable across animals.
//!
//! Bins are half-open `[start, end)` except the last one, which is closed.
//! Derived ranges are snapped to multiples of the bin width, so the bins of
//! different animals line up and can be averaged. Every channel gets bins on
//! every side the animal can be reported under, all-zero where it has no
//! object.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::config::{DistributionNormalization, MAX_BINS_PER_AXIS, QuantConfig};
use crate::diagnostics::{Diagnostics, DropReason};
use crate::error::{QuantError, Result};
use crate::models::{Axis, AxisDistribution, Coordinates, DistributionBin, Hemisphere, ResolvedObject};

/// Bin edges of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    /// Start of the first bin
    pub start: f64,
    /// End of the last bin
    pub end: f64,
    /// Bin width
    pub width: f64,
    /// Number of bins
    pub n_bins: usize,
}

impl BinLayout {
    /// Layout covering exactly `[start, end]`
    ///
    /// The last bin is shortened if the range is not a multiple of `width`.
    #[must_use]
    pub fn fixed(start: f64, end: f64, width: f64) -> Self {
        let n_bins = ((end - start) / width - 1e-9).ceil().max(1.0) as usize;
        Self {
            start,
            end,
            width,
            n_bins,
        }
    }

    /// Layout covering `[lo, hi]`, snapped outward to multiples of `width`
    #[must_use]
    pub fn snapped(lo: f64, hi: f64, width: f64) -> Self {
        let start = (lo / width).floor() * width;
        let mut end = (hi / width).ceil() * width;
        if end <= start {
            end = start + width;
        }
        Self::fixed(start, end, width)
    }

    /// Whether `[start, end]` splits into at most [`MAX_BINS_PER_AXIS`] bins
    #[must_use]
    pub fn fits(start: f64, end: f64, width: f64) -> bool {
        let n_bins = (end - start) / width;
        n_bins.is_finite() && n_bins <= MAX_BINS_PER_AXIS as f64
    }

    /// Bin containing `value`, `None` outside the layout
    #[must_use]
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !(self.start..=self.end).contains(&value) {
            return None;
        }
        let idx = ((value - self.start) / self.width).floor() as usize;
        Some(idx.min(self.n_bins - 1))
    }

    /// Edges of bin `idx`
    #[must_use]
    pub fn edges(&self, idx: usize) -> (f64, f64) {
        let lo = self.start + idx as f64 * self.width;
        let hi = if idx + 1 == self.n_bins {
            self.end
        } else {
            self.start + (idx + 1) as f64 * self.width
        };
        (lo, hi)
    }
}

/// Coordinate of one object on one axis, ready for binning
#[derive(Debug, Clone, Copy)]
struct AxisValue {
    channel: usize,
    hemisphere: usize,
    value: f64,
}

/// Per-channel shift applied before binning
fn injection_offsets(
    config: &QuantConfig,
    channels: &[String],
    injection_sites: &BTreeMap<String, Coordinates>,
    diagnostics: &mut Diagnostics,
) -> Vec<Option<Coordinates>> {
    if !config.distributions.center_on_injection {
        return vec![None; channels.len()];
    }
    channels
        .iter()
        .map(|channel| match injection_sites.get(channel) {
            Some(site) => Some(*site),
            None => {
                log::warn!("No injection site for channel {channel}, distribution not centered");
                diagnostics.missing_injection_sites.insert(channel.clone());
                None
            }
        })
        .collect()
}

/// Value of a bin without any object under the configured normalization
#[must_use]
pub fn empty_bin_value(config: &QuantConfig) -> f64 {
    match config.distributions.normalization {
        DistributionNormalization::ReferenceChannel => config.zero_reference.ratio(0.0, 0.0),
        _ => 0.0,
    }
}

/// Bin the resolved objects of one animal along every configured axis
///
/// One [`AxisDistribution`] is returned per configured axis, in configuration
/// order. `sides` are the hemispheres the animal can be reported under; every
/// channel gets bins for each of them, all-zero when the channel has no
/// object there. Hemispheres observed outside `sides` are appended.
///
/// # Errors
///
/// Returns [`QuantError::AnimalProcessingFailure`] if the coordinates span
/// more than [`MAX_BINS_PER_AXIS`] bins on an axis.
pub fn bin_distributions(
    config: &QuantConfig,
    animal_id: &str,
    sides: &[Hemisphere],
    injection_sites: &BTreeMap<String, Coordinates>,
    objects: &[ResolvedObject],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<AxisDistribution>> {
    let settings = &config.distributions;
    let channels = config.channels();
    let hemispheres: Vec<Hemisphere> = if settings.per_hemisphere {
        sides
            .iter()
            .copied()
            .chain(objects.iter().map(|o| o.hemisphere))
            .unique()
            .collect()
    } else {
        vec![Hemisphere::Both]
    };
    let offsets = injection_offsets(config, &channels, injection_sites, diagnostics);

    settings
        .axes
        .iter()
        .map(|&axis| {
            bin_axis(
                config,
                animal_id,
                axis,
                &channels,
                &hemispheres,
                &offsets,
                objects,
                diagnostics,
            )
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn bin_axis(
    config: &QuantConfig,
    animal_id: &str,
    axis: Axis,
    channels: &[String],
    hemispheres: &[Hemisphere],
    offsets: &[Option<Coordinates>],
    objects: &[ResolvedObject],
    diagnostics: &mut Diagnostics,
) -> Result<AxisDistribution> {
    let settings = &config.distributions;
    let mut distribution = AxisDistribution::new(axis);
    let Some(&width) = settings.bin_widths.get(&axis) else {
        return Ok(distribution);
    };

    // Shift of each channel along this axis; `None` means not centered
    let shifts: Vec<Option<f64>> = offsets
        .iter()
        .map(|site| site.as_ref().and_then(|s| axis.component(s)))
        .collect();
    for (channel, (offset, shift)) in channels.iter().zip(offsets.iter().zip(&shifts)) {
        if offset.is_some() && shift.is_none() {
            log::warn!("Injection site of channel {channel} has no {axis} coordinate");
            diagnostics.missing_injection_sites.insert(channel.clone());
        }
    }

    let values: Vec<AxisValue> = objects
        .iter()
        .filter_map(|object| {
            let channel = channels.iter().position(|c| *c == object.channel)?;
            let hemisphere = if settings.per_hemisphere {
                hemispheres.iter().position(|&h| h == object.hemisphere)?
            } else {
                0
            };
            let raw = axis.component(&object.coords)?;
            Some(AxisValue {
                channel,
                hemisphere,
                value: raw - shifts[channel].unwrap_or(0.0),
            })
        })
        .collect();

    let layout = match settings.ranges.get(&axis) {
        Some(range) => BinLayout::fixed(range.min, range.max, width),
        None => {
            let centered = shifts.iter().any(Option::is_some);
            let bounds = values
                .iter()
                .map(|v| v.value)
                .chain(centered.then_some(0.0))
                .minmax()
                .into_option();
            match bounds {
                Some((lo, hi)) if BinLayout::fits(lo, hi, width) => BinLayout::snapped(lo, hi, width),
                Some((lo, hi)) => {
                    return Err(QuantError::AnimalProcessingFailure {
                        animal: animal_id.to_string(),
                        reason: format!(
                            "{axis} coordinates span [{lo}, {hi}], more than {MAX_BINS_PER_AXIS} bins of width {width}"
                        ),
                    });
                }
                None => return Ok(distribution),
            }
        }
    };

    let n_hemispheres = hemispheres.len();
    let group = |channel: usize, hemisphere: usize| channel * n_hemispheres + hemisphere;
    let mut counts = vec![vec![0u64; layout.n_bins]; channels.len() * n_hemispheres];
    let mut channel_totals = vec![0u64; channels.len()];

    for value in &values {
        match layout.index_of(value.value) {
            Some(bin) => {
                counts[group(value.channel, value.hemisphere)][bin] += 1;
                channel_totals[value.channel] += 1;
            }
            None => diagnostics.record(DropReason::OutOfRange),
        }
    }

    let reference = config
        .reference_channel
        .as_deref()
        .and_then(|r| channels.iter().position(|c| c == r));

    for (ch, channel) in channels.iter().enumerate() {
        for (h, &hemisphere) in hemispheres.iter().enumerate() {
            let bins = &counts[group(ch, h)];
            for (bin, &count) in bins.iter().enumerate() {
                let (bin_start, bin_end) = layout.edges(bin);
                let value = match settings.normalization {
                    DistributionNormalization::None => count as f64,
                    DistributionNormalization::TotalCount => {
                        if channel_totals[ch] == 0 {
                            0.0
                        } else {
                            count as f64 / channel_totals[ch] as f64
                        }
                    }
                    DistributionNormalization::VolumeSlice => {
                        let shift = shifts[ch].unwrap_or(0.0);
                        let volume = settings
                            .slice_profiles
                            .get(&axis)
                            .map_or(f64::NAN, |p| p.volume_between(bin_start + shift, bin_end + shift));
                        config.zero_reference.ratio(count as f64, volume)
                    }
                    DistributionNormalization::ReferenceChannel => {
                        let reference_count = reference
                            .map_or(f64::NAN, |r| counts[group(r, h)][bin] as f64);
                        config.zero_reference.ratio(count as f64, reference_count)
                    }
                };
                distribution.bins.push(DistributionBin {
                    animal_id: animal_id.to_string(),
                    axis,
                    channel: channel.clone(),
                    hemisphere,
                    bin_start,
                    bin_end,
                    count,
                    value,
                });
            }
        }
    }

    Ok(distribution)
}
