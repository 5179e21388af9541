use common_base::channel::Channel;
use common_base::timeseries::Timeseries;
use common_base::{Error, Result};

use crate::channel_set::{ChannelSeries, ChannelSet};

/// VectorLayout names the vector channels a total field is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorLayout {
    /// geographic north, east and vertical
    Xyz,
    /// horizontal intensity and vertical, with no cross term
    Hdz,
}

/// Reconciliation resolves what the fourth channel of a record holds. It is
/// chosen once per decode session from the first record's header and applied
/// to every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// keep the channels as decoded
    NoOp,
    /// remove the fourth channel
    DropChannel(Channel),
    /// compute the scalar total field F from the vector total field and the
    /// stored delta F channel G, appending F and keeping G
    SynthesizeScalar(VectorLayout),
}

impl Reconciliation {
    /// select picks the rule for a format version and channel set.
    ///
    /// - `[1.0, 1.1)` with `version1_compat`: the fourth channel is dropped
    /// - `[1.1, 2.0)`: the fourth channel already is scalar F
    /// - `>= 2.0` with `XYZG` or `HDZG`: F is synthesized from G
    ///
    /// Anything else passes through unchanged, unless `strict` is set and the
    /// fourth channel is a delta F that no rule resolves.
    pub fn select(
        version: f64,
        channels: &ChannelSet,
        version1_compat: bool,
        strict: bool,
    ) -> Result<Self> {
        let fourth = channels.fourth();

        if (1.0..1.1).contains(&version) && version1_compat {
            return Ok(match fourth {
                Some(channel) => Self::DropChannel(channel),
                None => Self::NoOp,
            });
        }
        if (1.1..2.0).contains(&version) {
            return Ok(Self::NoOp);
        }

        if version >= 2.0 && fourth == Some(Channel::G) {
            match channels.vector() {
                [Some(Channel::X), Some(Channel::Y), Some(Channel::Z)] => {
                    return Ok(Self::SynthesizeScalar(VectorLayout::Xyz))
                }
                [Some(Channel::H), Some(Channel::D), Some(Channel::Z)] => {
                    return Ok(Self::SynthesizeScalar(VectorLayout::Hdz))
                }
                _ => {}
            }
        }

        if strict && fourth == Some(Channel::G) {
            return Err(Error::UnsupportedReconciliation {
                version,
                channels: channels.code(),
            });
        }
        Ok(Self::NoOp)
    }

    /// derived returns the synthesized channel and the channel it came from.
    pub fn derived(&self) -> Option<(Channel, Channel)> {
        match self {
            Self::SynthesizeScalar(_) => Some((Channel::F, Channel::G)),
            _ => None,
        }
    }

    pub fn apply(&self, series: &mut ChannelSeries) -> Result<()> {
        match self {
            Self::NoOp => {}
            Self::DropChannel(channel) => {
                series.remove(*channel);
            }
            Self::SynthesizeScalar(layout) => synthesize_scalar(*layout, series)?,
        }
        Ok(())
    }
}

fn required<'a>(series: &'a ChannelSeries, channel: Channel) -> Result<&'a Vec<f64>> {
    series.get(channel).ok_or_else(|| Error::MissingChannel {
        channel,
        available: series.channels(),
    })
}

/// vector_intensity returns the total field of three orthogonal components.
pub fn vector_intensity(a: f64, b: f64, z: f64) -> f64 {
    (a * a + b * b + z * z).sqrt()
}

fn synthesize_scalar(layout: VectorLayout, series: &mut ChannelSeries) -> Result<()> {
    let z = required(series, Channel::Z)?;
    let fv: Vec<f64> = match layout {
        VectorLayout::Xyz => {
            let x = required(series, Channel::X)?;
            let y = required(series, Channel::Y)?;
            x.iter()
                .zip(y)
                .zip(z)
                .map(|((x, y), z)| vector_intensity(*x, *y, *z))
                .collect()
        }
        VectorLayout::Hdz => {
            let h = required(series, Channel::H)?;
            h.iter()
                .zip(z)
                .map(|(h, z)| vector_intensity(*h, 0.0, *z))
                .collect()
        }
    };

    let mut g = required(series, Channel::G)?.clone();
    let mut fs: Vec<f64> = fv.iter().zip(&g).map(|(fv, g)| fv - g).collect();

    // G only carries a difference where both fields exist
    for i in 0..fs.len().min(g.len()) {
        if g[i].is_nan() && !fv[i].is_nan() {
            fs[i] = -g[i];
            g[i] = f64::NAN;
        }
    }

    series.insert(Channel::G, g);
    series.insert(Channel::F, fs);
    Ok(())
}

/// reconciled_channels returns the stored channels of `timeseries` that a
/// decode consumed to synthesize another channel.
pub fn reconciled_channels(timeseries: &Timeseries) -> Vec<Channel> {
    let mut channels: Vec<Channel> = vec![];
    let consumed = timeseries
        .iter()
        .filter_map(|t| t.stats.derived_from)
        .chain(
            timeseries
                .iter()
                .filter(|t| t.stats.reconciled)
                .map(|t| t.channel()),
        );
    for channel in consumed {
        if !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    channels
}

/// prepare_encode blanks a delta F channel whose scalar F was synthesized on
/// decode, so stale derived values are never written back.
pub fn prepare_encode(timeseries: &mut Timeseries) {
    for channel in reconciled_channels(timeseries) {
        if let Some(trace) = timeseries.select_mut(channel) {
            trace.data.iter_mut().for_each(|v| *v = f64::NAN);
        }
    }
}
